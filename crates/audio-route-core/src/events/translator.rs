//! Peripheral Event Translator

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use super::{BluetoothStateListener, DockListener, DockStateSource, WiredHeadsetListener, WiredHeadsetSource};
use crate::device::{BluetoothRouteObserver, RingtoneNotifier};
use crate::routing::{RouteMessage, RoutingAdapter};

/// Maps peripheral callbacks onto routing messages.
///
/// Stateless apart from the last seen wired headset state: plug and unplug
/// messages are only sent on an actual transition. Dock and Bluetooth
/// callbacks always produce exactly one message.
pub struct PeripheralEventTranslator {
    routing: Arc<dyn RoutingAdapter>,
    ringtone: Arc<dyn RingtoneNotifier>,
    wired_headset_plugged: AtomicBool,
}

impl PeripheralEventTranslator {
    pub fn new(routing: Arc<dyn RoutingAdapter>, ringtone: Arc<dyn RingtoneNotifier>) -> Self {
        Self {
            routing,
            ringtone,
            wired_headset_plugged: AtomicBool::new(false),
        }
    }

    /// Register with all three event sources
    pub fn attach(
        self: &Arc<Self>,
        bluetooth: &dyn BluetoothRouteObserver,
        wired_headset: &dyn WiredHeadsetSource,
        dock: &dyn DockStateSource,
    ) {
        bluetooth.add_listener(self.clone());
        wired_headset.add_listener(self.clone());
        dock.add_listener(self.clone());
        debug!("Peripheral event translator attached");
    }

    /// Last wired headset state seen
    pub fn is_wired_headset_plugged(&self) -> bool {
        self.wired_headset_plugged.load(Ordering::SeqCst)
    }

    fn forward(&self, message: RouteMessage) {
        if let Err(e) = self.routing.send_message(message) {
            warn!(%message, "Failed to forward peripheral event: {}", e);
        }
    }
}

impl BluetoothStateListener for PeripheralEventTranslator {
    #[instrument(level = "debug", skip_all)]
    fn on_device_list_changed(&self) {
        self.forward(RouteMessage::BluetoothDeviceListChanged);
    }

    #[instrument(level = "debug", skip_all)]
    fn on_active_device_present(&self) {
        self.forward(RouteMessage::BtActiveDevicePresent);
    }

    #[instrument(level = "debug", skip_all)]
    fn on_active_device_gone(&self) {
        self.forward(RouteMessage::BtActiveDeviceGone);
    }

    #[instrument(level = "debug", skip_all)]
    fn on_audio_connected(&self) {
        self.forward(RouteMessage::BtAudioConnected);
        self.ringtone.set_bluetooth_active(true);
    }

    // Routing treats connecting as connected; only the ringtone hears the difference.
    #[instrument(level = "debug", skip_all)]
    fn on_audio_connecting(&self) {
        self.forward(RouteMessage::BtAudioConnected);
        self.ringtone.set_bluetooth_active(false);
    }

    #[instrument(level = "debug", skip_all)]
    fn on_audio_disconnected(&self) {
        self.forward(RouteMessage::BtAudioDisconnected);
        self.ringtone.set_bluetooth_active(false);
    }

    #[instrument(level = "debug", skip_all)]
    fn on_unexpected_state_change(&self) {
        self.forward(RouteMessage::UpdateSystemAudioRoute);
    }
}

impl WiredHeadsetListener for PeripheralEventTranslator {
    #[instrument(level = "debug", skip(self))]
    fn on_wired_headset_changed(&self, plugged: bool) {
        let was_plugged = self.wired_headset_plugged.swap(plugged, Ordering::SeqCst);
        if was_plugged == plugged {
            debug!(plugged, "Wired headset state unchanged");
            return;
        }
        self.forward(if plugged {
            RouteMessage::ConnectWiredHeadset
        } else {
            RouteMessage::DisconnectWiredHeadset
        });
    }
}

impl DockListener for PeripheralEventTranslator {
    #[instrument(level = "debug", skip(self))]
    fn on_dock_changed(&self, docked: bool) {
        self.forward(if docked {
            RouteMessage::ConnectDock
        } else {
            RouteMessage::DisconnectDock
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::mock::{MockBluetoothRouteObserver, MockDockStateSource, MockRingtoneNotifier, MockWiredHeadsetSource};
    use crate::events::BluetoothStateEvent;
    use crate::routing::mock::RecordingRoutingAdapter;
    use proptest::prelude::*;

    fn translator() -> (Arc<PeripheralEventTranslator>, Arc<RecordingRoutingAdapter>, Arc<MockRingtoneNotifier>) {
        let routing = Arc::new(RecordingRoutingAdapter::new());
        let ringtone = Arc::new(MockRingtoneNotifier::new());
        let translator = Arc::new(PeripheralEventTranslator::new(routing.clone(), ringtone.clone()));
        (translator, routing, ringtone)
    }

    #[test]
    fn test_bluetooth_event_mapping() {
        let cases = [
            (BluetoothStateEvent::DeviceListChanged, RouteMessage::BluetoothDeviceListChanged),
            (BluetoothStateEvent::ActiveDevicePresent, RouteMessage::BtActiveDevicePresent),
            (BluetoothStateEvent::ActiveDeviceGone, RouteMessage::BtActiveDeviceGone),
            (BluetoothStateEvent::AudioConnected, RouteMessage::BtAudioConnected),
            (BluetoothStateEvent::AudioConnecting, RouteMessage::BtAudioConnected),
            (BluetoothStateEvent::AudioDisconnected, RouteMessage::BtAudioDisconnected),
            (BluetoothStateEvent::UnexpectedStateChange, RouteMessage::UpdateSystemAudioRoute),
        ];

        for (event, expected) in cases {
            let (translator, routing, _) = translator();
            event.deliver(translator.as_ref());
            assert_eq!(routing.messages(), vec![expected], "event {:?}", event);
        }
    }

    #[test]
    fn test_ringtone_follows_bluetooth_audio() {
        let (translator, _, ringtone) = translator();

        translator.on_audio_connected();
        translator.on_audio_connecting();
        translator.on_audio_disconnected();
        translator.on_device_list_changed();

        assert_eq!(ringtone.updates(), vec![true, false, false]);
    }

    #[test]
    fn test_redundant_plug_is_filtered() {
        let (translator, routing, _) = translator();

        translator.on_wired_headset_changed(true);
        translator.on_wired_headset_changed(true);
        translator.on_wired_headset_changed(false);
        translator.on_wired_headset_changed(false);

        assert_eq!(
            routing.messages(),
            vec![RouteMessage::ConnectWiredHeadset, RouteMessage::DisconnectWiredHeadset]
        );
    }

    #[test]
    fn test_initial_unplug_is_filtered() {
        let (translator, routing, _) = translator();
        translator.on_wired_headset_changed(false);
        assert!(routing.messages().is_empty());
        assert!(!translator.is_wired_headset_plugged());
    }

    #[test]
    fn test_dock_is_not_filtered() {
        let (translator, routing, _) = translator();

        translator.on_dock_changed(true);
        translator.on_dock_changed(true);
        translator.on_dock_changed(false);

        assert_eq!(
            routing.messages(),
            vec![RouteMessage::ConnectDock, RouteMessage::ConnectDock, RouteMessage::DisconnectDock]
        );
    }

    #[test]
    fn test_attach_registers_with_sources() {
        let (translator, routing, _) = translator();
        let bluetooth = MockBluetoothRouteObserver::new();
        let wired = MockWiredHeadsetSource::new();
        let dock = MockDockStateSource::new();

        translator.attach(&bluetooth, &wired, &dock);
        assert_eq!(bluetooth.listener_count(), 1);

        bluetooth.emit(BluetoothStateEvent::ActiveDevicePresent);
        wired.report_plugged(true);
        dock.report_docked(false);

        assert_eq!(
            routing.messages(),
            vec![
                RouteMessage::BtActiveDevicePresent,
                RouteMessage::ConnectWiredHeadset,
                RouteMessage::DisconnectDock
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_wired_messages_match_transitions(reports in proptest::collection::vec(any::<bool>(), 0..64)) {
            let (translator, routing, _) = translator();
            let mut previous = false;
            let mut expected = Vec::new();
            for plugged in &reports {
                if *plugged != previous {
                    expected.push(if *plugged {
                        RouteMessage::ConnectWiredHeadset
                    } else {
                        RouteMessage::DisconnectWiredHeadset
                    });
                    previous = *plugged;
                }
                translator.on_wired_headset_changed(*plugged);
            }
            prop_assert_eq!(routing.messages(), expected);
        }
    }
}
