//! Peripheral events flowing through the routing worker to the arbiter

use std::sync::Arc;
use std::time::Duration;

use callroute_audio_route_core::device::mock::{
    BluetoothAudioNotification, MockBluetoothRouteObserver, MockDeviceCatalog, MockDockStateSource,
    MockRingtoneNotifier, MockWiredHeadsetSource,
};
use callroute_audio_route_core::routing::mock::{RecordedMessages, RecordingRouteStateMachine};
use callroute_audio_route_core::{
    focus, AudioRoute, BluetoothAddress, BluetoothDeviceKind, BluetoothStateEvent, CallAudioRouting,
    CommunicationDeviceArbiter, DeviceDescriptor, DeviceType, RouteError, RouteMessage, RoutingAdapter,
    RoutingConfig, RoutingController,
};
use tokio_test::assert_ok;
use uuid::Uuid;

struct Pipeline {
    controller: Arc<RoutingController>,
    calls: CallAudioRouting,
    recorded: RecordedMessages,
    catalog: Arc<MockDeviceCatalog>,
    bluetooth: Arc<MockBluetoothRouteObserver>,
    ringtone: Arc<MockRingtoneNotifier>,
    wired: MockWiredHeadsetSource,
    dock: MockDockStateSource,
}

/// A minimal routing policy: follow the wired headset, honour explicit
/// Bluetooth selections and fall back to the earpiece.
fn pipeline(config: RoutingConfig) -> Pipeline {
    let catalog = Arc::new(MockDeviceCatalog::new(vec![
        DeviceDescriptor::new(DeviceType::Earpiece),
        DeviceDescriptor::new(DeviceType::Speaker),
        DeviceDescriptor::new(DeviceType::UsbHeadset),
        DeviceDescriptor::with_address(DeviceType::BluetoothLeHeadset, "LE:01"),
    ]));
    let bluetooth = Arc::new(MockBluetoothRouteObserver::new());
    bluetooth.set_kind(BluetoothAddress::from("LE:01"), BluetoothDeviceKind::LeAudio);
    let arbiter = CommunicationDeviceArbiter::new(catalog.clone(), bluetooth.clone());

    let (machine, recorded) = RecordingRouteStateMachine::new();
    let machine = machine
        .with_hfp_available(true)
        .on_message(|routed, arbiter, state| match routed.message {
            RouteMessage::ConnectWiredHeadset => {
                if arbiter.request_device(DeviceType::WiredHeadset, None) {
                    state.route = AudioRoute::WiredHeadset;
                }
            }
            RouteMessage::DisconnectWiredHeadset => {
                arbiter.clear_device(DeviceType::WiredHeadset);
                state.route = AudioRoute::Earpiece;
            }
            RouteMessage::UserSwitchBluetooth => {
                if let Some(address) = routed.payload.as_deref() {
                    if arbiter.request_bluetooth_device(&BluetoothAddress::from(address)) {
                        state.route = AudioRoute::Bluetooth;
                        state.active_bluetooth_device = Some(BluetoothAddress::from(address));
                    }
                }
            }
            RouteMessage::SwitchFocus if routed.arg == Some(focus::NO_FOCUS) => {
                state.route = AudioRoute::Earpiece;
                state.active_bluetooth_device = None;
            }
            RouteMessage::MuteOn => state.is_muted = true,
            RouteMessage::MuteOff => state.is_muted = false,
            _ => {}
        });

    let controller = RoutingController::start(config, arbiter, machine).expect("controller starts");

    let ringtone = Arc::new(MockRingtoneNotifier::new());
    let wired = MockWiredHeadsetSource::new();
    let dock = MockDockStateSource::new();
    let calls = CallAudioRouting::new(controller.clone(), ringtone.clone(), bluetooth.as_ref(), &wired, &dock);

    Pipeline {
        controller,
        calls,
        recorded,
        catalog,
        bluetooth,
        ringtone,
        wired,
        dock,
    }
}

#[tokio::test]
async fn test_wired_headset_follows_jack() {
    let p = pipeline(RoutingConfig::default());
    let call = Uuid::new_v4();

    assert_ok!(p.calls.on_call_added(call));
    p.wired.report_plugged(true);
    p.wired.report_plugged(true);
    assert_ok!(p.controller.flush().await);

    assert_eq!(
        p.recorded.names(),
        vec![RouteMessage::SwitchFocus, RouteMessage::ConnectWiredHeadset]
    );
    let snapshot = p.controller.snapshot();
    assert_eq!(snapshot.communication_device.device_type, Some(DeviceType::UsbHeadset));
    assert_eq!(snapshot.audio_state.route, AudioRoute::WiredHeadset);
    assert!(p.controller.is_hfp_device_available());

    p.wired.report_plugged(false);
    assert_ok!(p.controller.flush().await);

    assert_eq!(p.controller.current_route_state().route, AudioRoute::Earpiece);
    assert_eq!(p.catalog.platform_active(), None);

    assert_ok!(p.controller.shutdown().await);
}

#[tokio::test]
async fn test_bluetooth_selection_and_last_call_release() {
    let p = pipeline(RoutingConfig::default());
    let call = Uuid::new_v4();
    let address = BluetoothAddress::from("LE:01");

    assert_ok!(p.calls.on_call_added(call));
    p.bluetooth.emit(BluetoothStateEvent::AudioConnecting);
    assert_ok!(p.calls.request_route(AudioRoute::Bluetooth, Some(address.clone())));
    assert_ok!(p.controller.flush().await);

    assert_eq!(
        p.controller.snapshot().communication_device.bluetooth_address,
        Some(address.clone())
    );
    assert_eq!(p.ringtone.updates(), vec![false]);

    let switch = p.recorded.messages().into_iter().last().expect("bluetooth switch recorded");
    assert_eq!(switch.message, RouteMessage::UserSwitchBluetooth);
    assert_eq!(switch.arg, Some(0));
    assert_eq!(switch.payload.as_deref(), Some("LE:01"));

    assert_ok!(p.calls.on_call_removed(&call));
    assert_ok!(p.controller.flush().await);

    assert_eq!(p.catalog.platform_active(), None);
    assert_eq!(p.controller.snapshot().communication_device.device_type, None);
    assert_eq!(
        p.bluetooth.notifications(),
        vec![
            BluetoothAudioNotification::AudioOn(address.clone()),
            BluetoothAudioNotification::AudioLost(address),
        ]
    );
    assert_eq!(
        p.recorded.names(),
        vec![
            RouteMessage::SwitchFocus,
            RouteMessage::BtAudioConnected,
            RouteMessage::UserSwitchBluetooth,
            RouteMessage::SwitchFocus,
        ]
    );
}

#[tokio::test]
async fn test_snapshots_are_published() {
    let p = pipeline(RoutingConfig::default());
    let mut updates = p.controller.subscribe();

    assert_ok!(p.calls.set_muted(true));
    tokio::time::timeout(Duration::from_secs(1), updates.changed())
        .await
        .expect("snapshot published in time")
        .expect("worker alive");

    let snapshot = updates.borrow().clone();
    assert!(snapshot.audio_state.is_muted);
    assert_eq!(snapshot.processed, 1);
}

#[tokio::test]
async fn test_dock_events_after_shutdown_are_dropped() {
    let p = pipeline(RoutingConfig::default().with_worker_name("dock-test"));

    p.dock.report_docked(true);
    assert_ok!(p.controller.shutdown().await);
    assert!(!p.controller.is_running());

    // The translator logs and drops; the call surface reports the failure.
    p.dock.report_docked(false);
    assert!(matches!(p.calls.set_muted(false), Err(RouteError::WorkerStopped)));
    assert_eq!(p.recorded.names(), vec![RouteMessage::ConnectDock]);

    let dump = p.controller.dump();
    assert!(dump.starts_with("RoutingController[dock-test]"));
    assert!(dump.contains("CONNECT_DOCK"));
}
