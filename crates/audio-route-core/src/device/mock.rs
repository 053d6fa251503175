//! Recording doubles for the platform collaborators
//!
//! Each mock records what it was asked to do so tests can assert on call
//! order. The peripheral sources also keep their registered listeners and
//! let a test push events through them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{BluetoothRouteObserver, DeviceCatalog, RingtoneNotifier};
use crate::events::{
    BluetoothStateEvent, BluetoothStateListener, DockListener, DockStateSource, WiredHeadsetListener,
    WiredHeadsetSource,
};
use crate::types::{BluetoothAddress, BluetoothDeviceKind, DeviceDescriptor};

/// A call made against [`MockDeviceCatalog`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCall {
    ListDevices,
    SetActive(DeviceDescriptor),
    ClearActive,
}

/// Device catalog backed by an in-memory device list
#[derive(Debug, Default)]
pub struct MockDeviceCatalog {
    devices: Mutex<Vec<DeviceDescriptor>>,
    active: Mutex<Option<DeviceDescriptor>>,
    decline: AtomicBool,
    calls: Mutex<Vec<CatalogCall>>,
}

impl MockDeviceCatalog {
    pub fn new(devices: Vec<DeviceDescriptor>) -> Self {
        Self {
            devices: Mutex::new(devices),
            ..Default::default()
        }
    }

    /// Replace the list of available devices
    pub fn set_devices(&self, devices: Vec<DeviceDescriptor>) {
        *self.devices.lock() = devices;
    }

    /// Make subsequent `set_active` calls fail
    pub fn decline_activation(&self, decline: bool) {
        self.decline.store(decline, Ordering::SeqCst);
    }

    /// Device the platform currently has active
    pub fn platform_active(&self) -> Option<DeviceDescriptor> {
        self.active.lock().clone()
    }

    pub fn calls(&self) -> Vec<CatalogCall> {
        self.calls.lock().clone()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }

    /// Descriptors passed to `set_active`, in order
    pub fn set_active_calls(&self) -> Vec<DeviceDescriptor> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                CatalogCall::SetActive(device) => Some(device.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, CatalogCall::ClearActive))
            .count()
    }
}

impl DeviceCatalog for MockDeviceCatalog {
    fn available_devices(&self) -> Vec<DeviceDescriptor> {
        self.calls.lock().push(CatalogCall::ListDevices);
        self.devices.lock().clone()
    }

    fn set_active(&self, device: &DeviceDescriptor) -> bool {
        self.calls.lock().push(CatalogCall::SetActive(device.clone()));
        if self.decline.load(Ordering::SeqCst) {
            return false;
        }
        *self.active.lock() = Some(device.clone());
        true
    }

    fn clear_active(&self) {
        self.calls.lock().push(CatalogCall::ClearActive);
        *self.active.lock() = None;
    }
}

/// Notification sent to [`MockBluetoothRouteObserver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BluetoothAudioNotification {
    AudioOn(BluetoothAddress),
    AudioLost(BluetoothAddress),
}

/// Bluetooth observer with scripted classification
#[derive(Default)]
pub struct MockBluetoothRouteObserver {
    notifications: Mutex<Vec<BluetoothAudioNotification>>,
    kinds: Mutex<HashMap<BluetoothAddress, BluetoothDeviceKind>>,
    listeners: Mutex<Vec<Arc<dyn BluetoothStateListener>>>,
}

impl MockBluetoothRouteObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<BluetoothAudioNotification> {
        self.notifications.lock().clone()
    }

    /// Classification returned for `address`; unknown addresses are `Other`
    pub fn set_kind(&self, address: BluetoothAddress, kind: BluetoothDeviceKind) {
        self.kinds.lock().insert(address, kind);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Deliver `event` to every registered listener
    pub fn emit(&self, event: BluetoothStateEvent) {
        let listeners = self.listeners.lock().clone();
        for listener in listeners {
            event.deliver(listener.as_ref());
        }
    }
}

impl BluetoothRouteObserver for MockBluetoothRouteObserver {
    fn notify_audio_on(&self, address: &BluetoothAddress) {
        self.notifications
            .lock()
            .push(BluetoothAudioNotification::AudioOn(address.clone()));
    }

    fn notify_audio_lost(&self, address: &BluetoothAddress) {
        self.notifications
            .lock()
            .push(BluetoothAudioNotification::AudioLost(address.clone()));
    }

    fn is_connected_or_pending(&self) -> bool {
        false
    }

    fn classify(&self, address: &BluetoothAddress) -> BluetoothDeviceKind {
        self.kinds
            .lock()
            .get(address)
            .copied()
            .unwrap_or(BluetoothDeviceKind::Other)
    }

    fn add_listener(&self, listener: Arc<dyn BluetoothStateListener>) {
        self.listeners.lock().push(listener);
    }
}

/// Ringtone hook recording every Bluetooth-active update
#[derive(Debug, Default)]
pub struct MockRingtoneNotifier {
    updates: Mutex<Vec<bool>>,
}

impl MockRingtoneNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<bool> {
        self.updates.lock().clone()
    }
}

impl RingtoneNotifier for MockRingtoneNotifier {
    fn set_bluetooth_active(&self, active: bool) {
        self.updates.lock().push(active);
    }
}

/// Wired headset jack that forwards every raw notification
#[derive(Default)]
pub struct MockWiredHeadsetSource {
    listeners: Mutex<Vec<Arc<dyn WiredHeadsetListener>>>,
}

impl MockWiredHeadsetSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the jack state, redundant or not
    pub fn report_plugged(&self, plugged: bool) {
        let listeners = self.listeners.lock().clone();
        for listener in listeners {
            listener.on_wired_headset_changed(plugged);
        }
    }
}

impl WiredHeadsetSource for MockWiredHeadsetSource {
    fn add_listener(&self, listener: Arc<dyn WiredHeadsetListener>) {
        self.listeners.lock().push(listener);
    }
}

/// Dock that forwards every raw notification
#[derive(Default)]
pub struct MockDockStateSource {
    listeners: Mutex<Vec<Arc<dyn DockListener>>>,
}

impl MockDockStateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report_docked(&self, docked: bool) {
        let listeners = self.listeners.lock().clone();
        for listener in listeners {
            listener.on_dock_changed(docked);
        }
    }
}

impl DockStateSource for MockDockStateSource {
    fn add_listener(&self, listener: Arc<dyn DockListener>) {
        self.listeners.lock().push(listener);
    }
}
