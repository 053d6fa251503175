//! Recording doubles for the routing side

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{RouteMessage, RouteStateMachine, RouteTask, RoutedMessage, RoutingAdapter};
use crate::device::CommunicationDeviceArbiter;
use crate::error::{Result, RouteError};
use crate::types::CallAudioState;

type MessageHandler = Box<dyn FnMut(&RoutedMessage, &mut CommunicationDeviceArbiter, &mut CallAudioState) + Send>;

/// Shared view of the messages a [`RecordingRouteStateMachine`] processed
#[derive(Clone, Default)]
pub struct RecordedMessages {
    inner: Arc<Mutex<Vec<RoutedMessage>>>,
}

impl RecordedMessages {
    pub fn messages(&self) -> Vec<RoutedMessage> {
        self.inner.lock().clone()
    }

    pub fn names(&self) -> Vec<RouteMessage> {
        self.inner.lock().iter().map(|routed| routed.message).collect()
    }
}

/// State machine that records every message and optionally runs a handler
pub struct RecordingRouteStateMachine {
    recorded: RecordedMessages,
    state: CallAudioState,
    hfp_available: bool,
    handler: Option<MessageHandler>,
}

impl RecordingRouteStateMachine {
    /// Create the machine and a handle to what it records
    pub fn new() -> (Self, RecordedMessages) {
        let recorded = RecordedMessages::default();
        let machine = Self {
            recorded: recorded.clone(),
            state: CallAudioState::default(),
            hfp_available: false,
            handler: None,
        };
        (machine, recorded)
    }

    pub fn with_hfp_available(mut self, available: bool) -> Self {
        self.hfp_available = available;
        self
    }

    /// Run `handler` for every message after recording it
    pub fn on_message<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&RoutedMessage, &mut CommunicationDeviceArbiter, &mut CallAudioState) + Send + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }
}

#[async_trait]
impl RouteStateMachine for RecordingRouteStateMachine {
    async fn process(&mut self, message: &RoutedMessage, arbiter: &mut CommunicationDeviceArbiter) {
        self.recorded.inner.lock().push(message.clone());
        if let Some(handler) = self.handler.as_mut() {
            handler(message, arbiter, &mut self.state);
        }
    }

    fn current_state(&self) -> CallAudioState {
        self.state.clone()
    }

    fn is_hfp_device_available(&self) -> bool {
        self.hfp_available
    }

    fn dump(&self) -> String {
        format!("recorded {} messages", self.recorded.inner.lock().len())
    }
}

/// A submission captured by [`RecordingRoutingAdapter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Message(RouteMessage),
    WithArg(RouteMessage, i32),
    WithPayload(RouteMessage, i32, String),
    Task,
}

/// Routing adapter that records submissions instead of running them
#[derive(Default)]
pub struct RecordingRoutingAdapter {
    submissions: Mutex<Vec<Submission>>,
    state: Mutex<CallAudioState>,
    rejections: Mutex<usize>,
}

impl RecordingRoutingAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` submissions as if the queue were full
    pub fn reject_next(&self, count: usize) {
        *self.rejections.lock() = count;
    }

    fn record(&self, submission: Submission) -> Result<()> {
        let mut rejections = self.rejections.lock();
        if *rejections > 0 {
            *rejections -= 1;
            return Err(RouteError::queue_full(format!("{:?}", submission)));
        }
        self.submissions.lock().push(submission);
        Ok(())
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().clone()
    }

    /// Only the message names, whatever form they were sent in
    pub fn messages(&self) -> Vec<RouteMessage> {
        self.submissions
            .lock()
            .iter()
            .filter_map(|submission| match submission {
                Submission::Message(message)
                | Submission::WithArg(message, _)
                | Submission::WithPayload(message, _, _) => Some(*message),
                Submission::Task => None,
            })
            .collect()
    }
}

impl RoutingAdapter for RecordingRoutingAdapter {
    fn send_message(&self, message: RouteMessage) -> Result<()> {
        self.record(Submission::Message(message))
    }

    fn send_message_with_arg(&self, message: RouteMessage, arg: i32) -> Result<()> {
        self.record(Submission::WithArg(message, arg))
    }

    fn send_message_with_payload(&self, message: RouteMessage, arg: i32, payload: String) -> Result<()> {
        self.record(Submission::WithPayload(message, arg, payload))
    }

    fn submit_task(&self, _task: RouteTask) -> Result<()> {
        self.record(Submission::Task)
    }

    fn current_route_state(&self) -> CallAudioState {
        self.state.lock().clone()
    }

    fn is_hfp_device_available(&self) -> bool {
        false
    }

    fn dump(&self) -> String {
        format!("RecordingRoutingAdapter: {} submissions", self.submissions.lock().len())
    }
}
