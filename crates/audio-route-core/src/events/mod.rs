//! Peripheral event sources and their translation into routing messages
//!
//! Bluetooth, wired headset and dock callbacks arrive on threads this crate
//! does not control. The [`PeripheralEventTranslator`] turns each one into a
//! [`RouteMessage`](crate::routing::RouteMessage) on the routing queue and
//! does nothing else on the calling thread.

pub mod translator;

pub use translator::PeripheralEventTranslator;

use std::sync::Arc;

/// Bluetooth audio state callbacks
pub trait BluetoothStateListener: Send + Sync {
    fn on_device_list_changed(&self);
    fn on_active_device_present(&self);
    fn on_active_device_gone(&self);
    fn on_audio_connected(&self);
    fn on_audio_connecting(&self);
    fn on_audio_disconnected(&self);
    /// The Bluetooth stack reached a state the routing engine did not ask for
    fn on_unexpected_state_change(&self);
}

/// One Bluetooth state callback, as a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BluetoothStateEvent {
    DeviceListChanged,
    ActiveDevicePresent,
    ActiveDeviceGone,
    AudioConnected,
    AudioConnecting,
    AudioDisconnected,
    UnexpectedStateChange,
}

impl BluetoothStateEvent {
    /// Invoke the matching callback on `listener`
    pub fn deliver(self, listener: &dyn BluetoothStateListener) {
        match self {
            BluetoothStateEvent::DeviceListChanged => listener.on_device_list_changed(),
            BluetoothStateEvent::ActiveDevicePresent => listener.on_active_device_present(),
            BluetoothStateEvent::ActiveDeviceGone => listener.on_active_device_gone(),
            BluetoothStateEvent::AudioConnected => listener.on_audio_connected(),
            BluetoothStateEvent::AudioConnecting => listener.on_audio_connecting(),
            BluetoothStateEvent::AudioDisconnected => listener.on_audio_disconnected(),
            BluetoothStateEvent::UnexpectedStateChange => listener.on_unexpected_state_change(),
        }
    }
}

/// Wired headset jack callbacks. Sources may repeat the current state.
pub trait WiredHeadsetListener: Send + Sync {
    fn on_wired_headset_changed(&self, plugged: bool);
}

/// Dock state callbacks
pub trait DockListener: Send + Sync {
    fn on_dock_changed(&self, docked: bool);
}

/// Something that reports wired headset plug state
pub trait WiredHeadsetSource: Send + Sync {
    fn add_listener(&self, listener: Arc<dyn WiredHeadsetListener>);
}

/// Something that reports dock state
pub trait DockStateSource: Send + Sync {
    fn add_listener(&self, listener: Arc<dyn DockListener>);
}
