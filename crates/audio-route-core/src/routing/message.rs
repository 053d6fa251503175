//! Symbolic routing messages and the session context they carry

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Call audio focus values carried by [`RouteMessage::SwitchFocus`]
pub mod focus {
    pub const NO_FOCUS: i32 = 1;
    pub const ACTIVE_FOCUS: i32 = 2;
    pub const RINGING_FOCUS: i32 = 3;
}

/// Message understood by the routing state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteMessage {
    // Peripheral changes
    ConnectWiredHeadset,
    DisconnectWiredHeadset,
    ConnectDock,
    DisconnectDock,
    BluetoothDeviceListChanged,
    BtActiveDevicePresent,
    BtActiveDeviceGone,
    BtAudioConnected,
    BtAudioDisconnected,
    UpdateSystemAudioRoute,

    // User intents
    UserSwitchEarpiece,
    UserSwitchBluetooth,
    UserSwitchHeadset,
    UserSwitchSpeaker,
    UserSwitchBaseline,
    SpeakerOn,
    SpeakerOff,

    // Mute and focus
    MuteOn,
    MuteOff,
    SwitchFocus,
}

impl RouteMessage {
    /// Stable integer code
    pub fn code(self) -> i32 {
        match self {
            RouteMessage::ConnectWiredHeadset => 1,
            RouteMessage::DisconnectWiredHeadset => 2,
            RouteMessage::ConnectDock => 5,
            RouteMessage::DisconnectDock => 6,
            RouteMessage::BluetoothDeviceListChanged => 7,
            RouteMessage::BtActiveDevicePresent => 8,
            RouteMessage::BtActiveDeviceGone => 9,
            RouteMessage::SpeakerOn => 1006,
            RouteMessage::SpeakerOff => 1007,
            RouteMessage::UserSwitchEarpiece => 1101,
            RouteMessage::UserSwitchBluetooth => 1102,
            RouteMessage::UserSwitchHeadset => 1103,
            RouteMessage::UserSwitchSpeaker => 1104,
            RouteMessage::UserSwitchBaseline => 1105,
            RouteMessage::UpdateSystemAudioRoute => 1201,
            RouteMessage::BtAudioDisconnected => 1301,
            RouteMessage::BtAudioConnected => 1302,
            RouteMessage::MuteOn => 3001,
            RouteMessage::MuteOff => 3002,
            RouteMessage::SwitchFocus => 4001,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RouteMessage::ConnectWiredHeadset => "CONNECT_WIRED_HEADSET",
            RouteMessage::DisconnectWiredHeadset => "DISCONNECT_WIRED_HEADSET",
            RouteMessage::ConnectDock => "CONNECT_DOCK",
            RouteMessage::DisconnectDock => "DISCONNECT_DOCK",
            RouteMessage::BluetoothDeviceListChanged => "BLUETOOTH_DEVICE_LIST_CHANGED",
            RouteMessage::BtActiveDevicePresent => "BT_ACTIVE_DEVICE_PRESENT",
            RouteMessage::BtActiveDeviceGone => "BT_ACTIVE_DEVICE_GONE",
            RouteMessage::BtAudioConnected => "BT_AUDIO_CONNECTED",
            RouteMessage::BtAudioDisconnected => "BT_AUDIO_DISCONNECTED",
            RouteMessage::UpdateSystemAudioRoute => "UPDATE_SYSTEM_AUDIO_ROUTE",
            RouteMessage::UserSwitchEarpiece => "USER_SWITCH_EARPIECE",
            RouteMessage::UserSwitchBluetooth => "USER_SWITCH_BLUETOOTH",
            RouteMessage::UserSwitchHeadset => "USER_SWITCH_HEADSET",
            RouteMessage::UserSwitchSpeaker => "USER_SWITCH_SPEAKER",
            RouteMessage::UserSwitchBaseline => "USER_SWITCH_BASELINE_ROUTE",
            RouteMessage::SpeakerOn => "SPEAKER_ON",
            RouteMessage::SpeakerOff => "SPEAKER_OFF",
            RouteMessage::MuteOn => "MUTE_ON",
            RouteMessage::MuteOff => "MUTE_OFF",
            RouteMessage::SwitchFocus => "SWITCH_FOCUS",
        }
    }
}

impl fmt::Display for RouteMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and when a routing submission originated.
///
/// Captured on the submitting thread so the worker can log against the
/// originating session even though it runs the work later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    pub id: Uuid,
    /// Name of the tracing span active at capture time
    pub origin: &'static str,
    pub captured_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn capture() -> Self {
        let origin = tracing::Span::current()
            .metadata()
            .map(|metadata| metadata.name())
            .unwrap_or("unattributed");
        Self {
            id: Uuid::new_v4(),
            origin,
            captured_at: Utc::now(),
        }
    }
}

impl fmt::Display for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.origin, self.id)
    }
}

/// A message as delivered to the routing state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutedMessage {
    pub message: RouteMessage,
    pub arg: Option<i32>,
    pub payload: Option<String>,
    pub session: SessionContext,
}

impl RoutedMessage {
    pub fn new(message: RouteMessage) -> Self {
        Self {
            message,
            arg: None,
            payload: None,
            session: SessionContext::capture(),
        }
    }

    pub fn with_arg(mut self, arg: i32) -> Self {
        self.arg = Some(arg);
        self
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }
}

impl fmt::Display for RoutedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(arg) = self.arg {
            write!(f, " arg={}", arg)?;
        }
        if let Some(payload) = &self.payload {
            write!(f, " payload={}", payload)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routed_message_display() {
        let message = RoutedMessage::new(RouteMessage::UserSwitchBluetooth)
            .with_arg(0)
            .with_payload("AA:BB");
        assert_eq!(message.to_string(), "USER_SWITCH_BLUETOOTH arg=0 payload=AA:BB");
        assert_eq!(RoutedMessage::new(RouteMessage::ConnectDock).to_string(), "CONNECT_DOCK");
    }

    #[test]
    fn test_bt_audio_codes() {
        assert_eq!(RouteMessage::BtAudioConnected.code(), 1302);
        assert_eq!(RouteMessage::BtAudioDisconnected.code(), 1301);
        assert_ne!(RouteMessage::ConnectDock.code(), RouteMessage::DisconnectDock.code());
    }

    #[test]
    fn test_session_without_span_is_unattributed() {
        let first = SessionContext::capture();
        let second = SessionContext::capture();
        assert_eq!(first.origin, "unattributed");
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_message_serde_name() {
        let json = serde_json::to_string(&RouteMessage::BtActiveDeviceGone).unwrap();
        assert_eq!(json, "\"BT_ACTIVE_DEVICE_GONE\"");
    }
}
