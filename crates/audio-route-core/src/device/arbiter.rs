//! Communication Device Arbiter
//!
//! Single owner of "which device did we last ask the platform to use for
//! the call". Every set or clear of the platform communication device goes
//! through here, and only from the routing worker, so the state needs no
//! locking.
//!
//! Two identity rules shape the matching:
//!
//! - A request for a wired headset is satisfied by a USB headset.
//! - A request carrying a Bluetooth address other than the tracked one is
//!   always a switch, even when the device type is unchanged. This is what
//!   lets one LE audio headset take over from another.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{BluetoothRouteObserver, DeviceCatalog};
use crate::types::{BluetoothAddress, DeviceDescriptor, DeviceType};

/// Copy of the arbiter state, for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbiterSnapshot {
    pub device_type: Option<DeviceType>,
    pub bluetooth_address: Option<BluetoothAddress>,
}

impl fmt::Display for ArbiterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.device_type, &self.bluetooth_address) {
            (None, _) => f.write_str("NONE"),
            (Some(device_type), None) => write!(f, "{}", device_type),
            (Some(device_type), Some(address)) => write!(f, "{}[{}]", device_type, address),
        }
    }
}

/// Decides which communication device carries the call's voice path
pub struct CommunicationDeviceArbiter {
    /// `None` once the platform audio subsystem has detached
    catalog: Option<Arc<dyn DeviceCatalog>>,
    bluetooth: Arc<dyn BluetoothRouteObserver>,
    active_device_type: Option<DeviceType>,
    /// Only set while `active_device_type` is a Bluetooth kind
    active_bluetooth_address: Option<BluetoothAddress>,
}

impl CommunicationDeviceArbiter {
    /// Create an arbiter with nothing active
    pub fn new(catalog: Arc<dyn DeviceCatalog>, bluetooth: Arc<dyn BluetoothRouteObserver>) -> Self {
        Self {
            catalog: Some(catalog),
            bluetooth,
            active_device_type: None,
            active_bluetooth_address: None,
        }
    }

    /// Drop the device catalog, e.g. when the platform audio subsystem
    /// shuts down.
    ///
    /// Requests fail from then on. Clears still reset local state but make
    /// no downstream call.
    pub fn detach_catalog(&mut self) {
        if self.catalog.take().is_some() {
            info!("Device catalog detached");
        }
    }

    pub fn has_catalog(&self) -> bool {
        self.catalog.is_some()
    }

    /// Device type currently believed to be active
    pub fn active_device_type(&self) -> Option<DeviceType> {
        self.active_device_type
    }

    /// Address of the active Bluetooth device, if the active device is one
    pub fn active_bluetooth_address(&self) -> Option<&BluetoothAddress> {
        self.active_bluetooth_address.as_ref()
    }

    /// Whether a request for `device_type` is already satisfied
    pub fn is_device_active(&self, device_type: DeviceType) -> bool {
        self.active_device_type
            .is_some_and(|active| device_type.is_satisfied_by(active))
    }

    pub fn snapshot(&self) -> ArbiterSnapshot {
        ArbiterSnapshot {
            device_type: self.active_device_type,
            bluetooth_address: self.active_bluetooth_address.clone(),
        }
    }

    /// Make a device of `requested` type the active communication device.
    ///
    /// `bt_address` names the Bluetooth device wanted when several share the
    /// same type. Returns `true` only if the platform device changed; a
    /// request that is already satisfied returns `false`.
    pub fn request_device(
        &mut self,
        requested: DeviceType,
        bt_address: Option<&BluetoothAddress>,
    ) -> bool {
        let is_le_switch =
            bt_address.is_some_and(|address| self.active_bluetooth_address.as_ref() != Some(address));

        if self.is_device_active(requested) && !is_le_switch {
            debug!(device = %requested, "Communication device already active");
            return false;
        }

        let Some(catalog) = self.catalog.clone() else {
            info!(device = %requested, "Device catalog unavailable, cannot set communication device");
            return false;
        };

        let devices = catalog.available_devices();
        if devices.is_empty() {
            info!(device = %requested, "No communication devices available");
            return false;
        }

        // Never re-select the Bluetooth device being switched away from.
        let selected = devices.into_iter().find(|device| {
            debug!(available = %device, "Available communication device");
            requested.is_satisfied_by(device.device_type)
                && !self.is_tracked_address(device.address.as_ref())
        });

        let Some(selected) = selected else {
            info!(device = %requested, "Requested communication device is unavailable");
            return false;
        };

        if let Some(active) = self.active_device_type {
            self.clear_device(active);
        }

        if !catalog.set_active(&selected) {
            warn!(device = %selected, "Platform declined communication device");
            return false;
        }

        self.active_device_type = Some(selected.device_type);
        if selected.device_type.is_bluetooth() {
            self.active_bluetooth_address = selected.address.clone();
            if selected.device_type == DeviceType::BluetoothLeHeadset {
                if let Some(address) = &self.active_bluetooth_address {
                    self.bluetooth.notify_audio_on(address);
                }
            }
        }

        info!(device = %selected, "Communication device set");
        true
    }

    /// Request the Bluetooth device at `address`, using the Bluetooth
    /// stack's classification to pick the device type.
    pub fn request_bluetooth_device(&mut self, address: &BluetoothAddress) -> bool {
        let device_type = self.bluetooth.classify(address).device_type();
        debug!(%address, device = %device_type, "Classified Bluetooth device");
        self.request_device(device_type, Some(address))
    }

    /// Clear the active communication device if it is of `device_type`.
    ///
    /// Clearing a type that is not the tracked one is a no-op: a newer
    /// request may already have replaced it.
    pub fn clear_device(&mut self, device_type: DeviceType) {
        if !self.is_device_active(device_type) {
            info!(
                device = %device_type,
                active = %self.snapshot(),
                "Not clearing communication device that is not active"
            );
            return;
        }

        if device_type.is_bluetooth() {
            if let Some(address) = self.active_bluetooth_address.take() {
                self.bluetooth.notify_audio_lost(&address);
            }
        }

        match &self.catalog {
            Some(catalog) => catalog.clear_active(),
            None => info!(device = %device_type, "Device catalog unavailable, resetting locally"),
        }

        self.active_device_type = None;
        debug!(device = %device_type, "Communication device cleared");
    }

    /// Clear whichever Bluetooth device is active, if any
    pub fn clear_bluetooth_device(&mut self) {
        if self.active_bluetooth_address.is_none() {
            info!("No Bluetooth communication device to clear");
            return;
        }
        if let Some(active) = self.active_device_type {
            self.clear_device(active);
        }
    }

    fn is_tracked_address(&self, address: Option<&BluetoothAddress>) -> bool {
        match (&self.active_bluetooth_address, address) {
            (Some(tracked), Some(address)) => tracked == address,
            _ => false,
        }
    }
}

impl fmt::Debug for CommunicationDeviceArbiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommunicationDeviceArbiter")
            .field("active_device_type", &self.active_device_type)
            .field("active_bluetooth_address", &self.active_bluetooth_address)
            .field("catalog_attached", &self.catalog.is_some())
            .finish()
    }
}
