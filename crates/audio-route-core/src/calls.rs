//! Call audio routing composition
//!
//! [`CallAudioRouting`] wires the translator to the routing adapter and keeps
//! the set of calls that currently hold call audio. Routing focus follows
//! that set: the first call in takes focus, the last call out releases it
//! and clears whatever communication device is still active.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::device::{BluetoothRouteObserver, CommunicationDeviceArbiter, RingtoneNotifier};
use crate::error::Result;
use crate::events::{DockStateSource, PeripheralEventTranslator, WiredHeadsetSource};
use crate::routing::{focus, RouteMessage, RoutingAdapter, SessionContext};
use crate::types::{AudioRoute, BluetoothAddress, CallId};

/// Composition root for call audio routing
pub struct CallAudioRouting {
    routing: Arc<dyn RoutingAdapter>,
    translator: Arc<PeripheralEventTranslator>,
    calls: Mutex<HashMap<CallId, SessionContext>>,
}

impl CallAudioRouting {
    /// Build the translator on top of `routing` and attach it to the
    /// peripheral sources
    pub fn new(
        routing: Arc<dyn RoutingAdapter>,
        ringtone: Arc<dyn RingtoneNotifier>,
        bluetooth: &dyn BluetoothRouteObserver,
        wired_headset: &dyn WiredHeadsetSource,
        dock: &dyn DockStateSource,
    ) -> Self {
        let translator = Arc::new(PeripheralEventTranslator::new(routing.clone(), ringtone));
        translator.attach(bluetooth, wired_headset, dock);
        Self {
            routing,
            translator,
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn routing(&self) -> &Arc<dyn RoutingAdapter> {
        &self.routing
    }

    pub fn translator(&self) -> &Arc<PeripheralEventTranslator> {
        &self.translator
    }

    pub fn has_active_calls(&self) -> bool {
        !self.calls.lock().is_empty()
    }

    pub fn active_call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Track a call holding call audio. Adding a tracked call again is a no-op.
    ///
    /// Focus messages are enqueued while the registry lock is held, so the
    /// routing queue sees focus changes in the same order as the registry.
    /// If the first call's focus message cannot be enqueued the call is not
    /// tracked and the add can be retried.
    pub fn on_call_added(&self, call_id: CallId) -> Result<()> {
        let mut calls = self.calls.lock();
        if calls.contains_key(&call_id) {
            debug!(%call_id, "Call already tracked");
            return Ok(());
        }

        let first = calls.is_empty();
        if first {
            self.routing
                .send_message_with_arg(RouteMessage::SwitchFocus, focus::ACTIVE_FOCUS)?;
        }
        calls.insert(call_id, SessionContext::capture());

        info!(%call_id, first, "Call added to audio routing");
        Ok(())
    }

    /// Stop tracking a call. Removing the last call releases focus and
    /// clears the communication device.
    ///
    /// Both the focus release and the clear are always attempted. If either
    /// cannot be enqueued the call stays tracked so the removal can be
    /// retried, and the first failure is returned.
    pub fn on_call_removed(&self, call_id: &CallId) -> Result<()> {
        let mut calls = self.calls.lock();
        if !calls.contains_key(call_id) {
            debug!(%call_id, "Call not tracked");
            return Ok(());
        }

        if calls.len() == 1 {
            info!(%call_id, "Last call removed, releasing call audio");
            let released = self
                .routing
                .send_message_with_arg(RouteMessage::SwitchFocus, focus::NO_FOCUS);
            let cleared = self.routing.submit_task(Box::new(|arbiter: &mut CommunicationDeviceArbiter| {
                if let Some(active) = arbiter.active_device_type() {
                    arbiter.clear_device(active);
                }
            }));
            if let Err(e) = released.and(cleared) {
                warn!(%call_id, "Failed to release call audio, keeping call tracked: {}", e);
                return Err(e);
            }
        }

        if let Some(session) = calls.remove(call_id) {
            debug!(%call_id, session = %session, "Call removed from audio routing");
        }
        Ok(())
    }

    /// Ask the routing engine for a user-selected route
    pub fn request_route(&self, route: AudioRoute, bt_address: Option<BluetoothAddress>) -> Result<()> {
        let message = match route {
            AudioRoute::Earpiece => RouteMessage::UserSwitchEarpiece,
            AudioRoute::WiredHeadset => RouteMessage::UserSwitchHeadset,
            AudioRoute::Speaker => RouteMessage::UserSwitchSpeaker,
            AudioRoute::Bluetooth => RouteMessage::UserSwitchBluetooth,
            AudioRoute::Streaming => {
                warn!("Streaming route cannot be selected by the user");
                return Ok(());
            }
        };

        match bt_address {
            Some(address) if route == AudioRoute::Bluetooth => {
                self.routing
                    .send_message_with_payload(message, 0, address.to_string())
            }
            _ => self.routing.send_message(message),
        }
    }

    pub fn set_muted(&self, muted: bool) -> Result<()> {
        self.routing.send_message(if muted {
            RouteMessage::MuteOn
        } else {
            RouteMessage::MuteOff
        })
    }
}
