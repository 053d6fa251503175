//! # Call Audio Routing Core
//!
//! Communication device arbitration and peripheral event routing for call
//! audio. Hardware callbacks are translated into routing messages, the
//! messages are processed one at a time by a single worker, and the worker
//! asks the arbiter to put exactly one platform device into communication
//! mode.
//!
//! ```text
//! ┌────────────────────┐   ┌──────────────────────────┐
//! │ Bluetooth / wired  │──▶│ PeripheralEventTranslator │
//! │ headset / dock     │   └─────────────┬────────────┘
//! └────────────────────┘                 │ RouteMessage
//!           ┌────────────────┐           ▼
//!           │ CallAudioRouting│──▶ RoutingAdapter (RoutingController)
//!           └────────────────┘           │ bounded FIFO, one worker
//!                                        ▼
//!                              RouteStateMachine::process
//!                                        │
//!                                        ▼
//!                          CommunicationDeviceArbiter ──▶ DeviceCatalog
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use callroute_audio_route_core::device::mock::{MockBluetoothRouteObserver, MockDeviceCatalog};
//! use callroute_audio_route_core::routing::mock::RecordingRouteStateMachine;
//! use callroute_audio_route_core::{
//!     CommunicationDeviceArbiter, DeviceDescriptor, DeviceType, RoutingAdapter, RoutingConfig, RoutingController,
//! };
//!
//! # async fn example() -> callroute_audio_route_core::Result<()> {
//! let catalog = Arc::new(MockDeviceCatalog::new(vec![DeviceDescriptor::new(DeviceType::Speaker)]));
//! let bluetooth = Arc::new(MockBluetoothRouteObserver::new());
//! let arbiter = CommunicationDeviceArbiter::new(catalog.clone(), bluetooth);
//! let (machine, _recorded) = RecordingRouteStateMachine::new();
//!
//! let controller = RoutingController::start(RoutingConfig::default(), arbiter, machine)?;
//! controller.send_message(callroute_audio_route_core::RouteMessage::UserSwitchSpeaker)?;
//! controller.flush().await?;
//! println!("{}", controller.dump());
//! controller.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod calls;
pub mod config;
pub mod device;
pub mod error;
pub mod events;
pub mod logging;
pub mod routing;
pub mod types;

pub use calls::CallAudioRouting;
pub use config::RoutingConfig;
pub use device::{
    ArbiterSnapshot, BluetoothRouteObserver, CommunicationDeviceArbiter, DeviceCatalog, RingtoneNotifier,
};
pub use error::{Result, RouteError};
pub use events::{
    BluetoothStateEvent, BluetoothStateListener, DockListener, DockStateSource, PeripheralEventTranslator,
    WiredHeadsetListener, WiredHeadsetSource,
};
pub use logging::{parse_log_level, setup_logging, LoggingConfig};
pub use routing::{
    focus, RouteMessage, RouteSnapshot, RouteStateMachine, RouteTask, RoutedMessage, RoutingAdapter,
    RoutingController, SessionContext,
};
pub use types::{
    AudioRoute, BluetoothAddress, BluetoothDeviceKind, CallAudioState, CallId, DeviceDescriptor, DeviceType,
};
