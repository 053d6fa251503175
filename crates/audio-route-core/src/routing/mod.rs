//! Routing message dispatch
//!
//! The contract between the peripheral event translator (and any other
//! producer) and the routing state machine. Every submission ends up on one
//! bounded FIFO queue drained by a single worker, so routing transitions
//! never run concurrently and the communication device arbiter needs no
//! locks.

pub mod controller;
pub mod message;
pub mod mock;

pub use controller::RoutingController;
pub use message::{focus, RouteMessage, RoutedMessage, SessionContext};

use async_trait::async_trait;
use serde::Serialize;

use crate::device::{ArbiterSnapshot, CommunicationDeviceArbiter};
use crate::error::Result;
use crate::types::CallAudioState;

/// Deferred work run on the routing worker with exclusive access to the
/// arbiter
pub type RouteTask = Box<dyn FnOnce(&mut CommunicationDeviceArbiter) + Send + 'static>;

/// Submission side of the routing engine.
///
/// All methods are callable from any thread and never block.
pub trait RoutingAdapter: Send + Sync {
    /// Enqueue a message, capturing the caller's session context
    fn send_message(&self, message: RouteMessage) -> Result<()>;

    fn send_message_with_arg(&self, message: RouteMessage, arg: i32) -> Result<()>;

    fn send_message_with_payload(&self, message: RouteMessage, arg: i32, payload: String) -> Result<()>;

    /// Enqueue arbitrary work behind any already queued messages
    fn submit_task(&self, task: RouteTask) -> Result<()>;

    /// Last audio state published by the routing engine
    fn current_route_state(&self) -> CallAudioState;

    /// Whether a hands-free profile device is available
    fn is_hfp_device_available(&self) -> bool;

    /// Human-readable diagnostic dump
    fn dump(&self) -> String;
}

/// The routing state machine driven by the worker.
///
/// Implementations decide which device the arbiter should request next; the
/// arbiter is handed in mutably for the duration of each message.
#[async_trait]
pub trait RouteStateMachine: Send + 'static {
    async fn process(&mut self, message: &RoutedMessage, arbiter: &mut CommunicationDeviceArbiter);

    fn current_state(&self) -> CallAudioState;

    fn is_hfp_device_available(&self) -> bool;

    fn dump(&self) -> String {
        String::new()
    }
}

/// State published by the worker after every processed item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteSnapshot {
    pub audio_state: CallAudioState,
    pub hfp_device_available: bool,
    pub communication_device: ArbiterSnapshot,
    pub processed: u64,
    pub machine_dump: String,
}
