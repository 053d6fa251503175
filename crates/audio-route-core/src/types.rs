//! Core types shared by the arbiter, the translator and the routing worker

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a call holding call audio focus
pub type CallId = uuid::Uuid;

/// Kind of communication device the call's voice path can be routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// Built-in earpiece
    Earpiece,
    /// Built-in loudspeaker
    Speaker,
    /// Analog wired headset
    WiredHeadset,
    /// USB-class headset
    UsbHeadset,
    /// Classic Bluetooth SCO headset
    BluetoothSco,
    /// Bluetooth hearing aid
    BluetoothHearingAid,
    /// Bluetooth LE audio headset
    BluetoothLeHeadset,
}

impl DeviceType {
    /// All device types, in declaration order
    pub const ALL: [DeviceType; 7] = [
        DeviceType::Earpiece,
        DeviceType::Speaker,
        DeviceType::WiredHeadset,
        DeviceType::UsbHeadset,
        DeviceType::BluetoothSco,
        DeviceType::BluetoothHearingAid,
        DeviceType::BluetoothLeHeadset,
    ];

    /// Whether this is one of the Bluetooth device kinds
    pub fn is_bluetooth(self) -> bool {
        matches!(
            self,
            DeviceType::BluetoothSco | DeviceType::BluetoothHearingAid | DeviceType::BluetoothLeHeadset
        )
    }

    /// Whether a device of type `candidate` satisfies a request for `self`.
    ///
    /// A wired headset request is satisfied by a USB headset; the reverse
    /// does not hold.
    pub fn is_satisfied_by(self, candidate: DeviceType) -> bool {
        self == candidate
            || (self == DeviceType::WiredHeadset && candidate == DeviceType::UsbHeadset)
    }

    /// Stable name used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceType::Earpiece => "EARPIECE",
            DeviceType::Speaker => "SPEAKER",
            DeviceType::WiredHeadset => "WIRED_HEADSET",
            DeviceType::UsbHeadset => "USB_HEADSET",
            DeviceType::BluetoothSco => "BLUETOOTH_SCO",
            DeviceType::BluetoothHearingAid => "BLUETOOTH_HEARING_AID",
            DeviceType::BluetoothLeHeadset => "BLUETOOTH_LE_HEADSET",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bluetooth hardware address as reported by the Bluetooth stack
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BluetoothAddress(String);

impl BluetoothAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BluetoothAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BluetoothAddress {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for BluetoothAddress {
    fn from(address: String) -> Self {
        Self(address)
    }
}

/// Profile a Bluetooth device address is classified under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BluetoothDeviceKind {
    HearingAid,
    LeAudio,
    Other,
}

impl BluetoothDeviceKind {
    /// Communication device type a device of this kind is exposed as
    pub fn device_type(self) -> DeviceType {
        match self {
            BluetoothDeviceKind::HearingAid => DeviceType::BluetoothHearingAid,
            BluetoothDeviceKind::LeAudio => DeviceType::BluetoothLeHeadset,
            BluetoothDeviceKind::Other => DeviceType::BluetoothSco,
        }
    }
}

/// One available communication device, as listed by the device catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub device_type: DeviceType,
    pub address: Option<BluetoothAddress>,
}

impl DeviceDescriptor {
    /// Descriptor for a device without an address (earpiece, speaker, wired)
    pub fn new(device_type: DeviceType) -> Self {
        Self {
            device_type,
            address: None,
        }
    }

    /// Descriptor carrying a Bluetooth address
    pub fn with_address(device_type: DeviceType, address: impl Into<BluetoothAddress>) -> Self {
        Self {
            device_type,
            address: Some(address.into()),
        }
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Some(address) => write!(f, "{}[{}]", self.device_type, address),
            None => write!(f, "{}", self.device_type),
        }
    }
}

/// High level audio route as seen by the call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioRoute {
    Earpiece,
    WiredHeadset,
    Speaker,
    Bluetooth,
    Streaming,
}

/// Resolved call audio state reported by the routing engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallAudioState {
    pub route: AudioRoute,
    pub supported_routes: Vec<AudioRoute>,
    pub is_muted: bool,
    pub active_bluetooth_device: Option<BluetoothAddress>,
}

impl Default for CallAudioState {
    fn default() -> Self {
        Self {
            route: AudioRoute::Earpiece,
            supported_routes: vec![AudioRoute::Earpiece, AudioRoute::Speaker],
            is_muted: false,
            active_bluetooth_device: None,
        }
    }
}

impl fmt::Display for CallAudioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "route={:?} supported={:?} muted={}",
            self.route, self.supported_routes, self.is_muted
        )?;
        if let Some(device) = &self.active_bluetooth_device {
            write!(f, " bt={}", device)?;
        }
        Ok(())
    }
}
