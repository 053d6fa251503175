//! Communication device arbitration
//!
//! This module defines the platform collaborators the arbiter talks to and
//! the [`CommunicationDeviceArbiter`] itself.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐    ┌──────────────────────────┐    ┌─────────────────────┐
//! │  RouteStateMachine   │    │ CommunicationDeviceArbiter│    │   DeviceCatalog     │
//! │  (routing worker)    │───▶│  request_device()         │───▶│ available_devices() │
//! │                      │    │  clear_device()           │    │ set_active()        │
//! └──────────────────────┘    └──────────────────────────┘    │ clear_active()      │
//!                                         │                    └─────────────────────┘
//!                                         ▼
//!                             ┌──────────────────────────┐
//!                             │  BluetoothRouteObserver  │
//!                             │  notify_audio_on/lost()  │
//!                             └──────────────────────────┘
//! ```

pub mod arbiter;
pub mod mock;

pub use arbiter::{ArbiterSnapshot, CommunicationDeviceArbiter};

use std::sync::Arc;

use crate::events::BluetoothStateListener;
use crate::types::{BluetoothAddress, BluetoothDeviceKind, DeviceDescriptor};

/// Platform audio subsystem view of communication devices.
///
/// Calls are synchronous and expected to return quickly; they are only made
/// from the routing worker.
pub trait DeviceCatalog: Send + Sync {
    /// Devices currently available for communication. May be empty.
    fn available_devices(&self) -> Vec<DeviceDescriptor>;

    /// Make `device` the active communication device. Returns `false` if the
    /// platform declined.
    fn set_active(&self, device: &DeviceDescriptor) -> bool;

    /// Clear the active communication device. Idempotent.
    fn clear_active(&self);
}

/// View of the Bluetooth stack's audio connection state
pub trait BluetoothRouteObserver: Send + Sync {
    /// Audio has been turned on for `address` by this layer
    fn notify_audio_on(&self, address: &BluetoothAddress);

    /// Audio for `address` was torn down by this layer
    fn notify_audio_lost(&self, address: &BluetoothAddress);

    /// Whether a Bluetooth audio connection is up or being set up
    fn is_connected_or_pending(&self) -> bool;

    /// Profile the device at `address` is exposed under
    fn classify(&self, address: &BluetoothAddress) -> BluetoothDeviceKind;

    /// Register for Bluetooth state callbacks
    fn add_listener(&self, listener: Arc<dyn BluetoothStateListener>);
}

/// Ringtone player hook; only told whether Bluetooth audio is active
pub trait RingtoneNotifier: Send + Sync {
    fn set_bluetooth_active(&self, active: bool);
}
