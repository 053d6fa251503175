//! Serialized routing worker
//!
//! [`RoutingController`] owns the only queue into the routing state machine.
//! A single tokio task drains it in FIFO order and holds the communication
//! device arbiter, so every set/clear of the platform device happens on that
//! task and never concurrently with another routing operation. Callers only
//! ever see the snapshot the worker publishes after each item.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use super::{RouteMessage, RouteSnapshot, RouteStateMachine, RouteTask, RoutedMessage, RoutingAdapter, SessionContext};
use crate::config::RoutingConfig;
use crate::device::CommunicationDeviceArbiter;
use crate::error::{Result, RouteError};
use crate::types::CallAudioState;

enum RouteCommand {
    Message(RoutedMessage),
    Task { task: RouteTask, session: SessionContext },
    Flush(oneshot::Sender<()>),
    Shutdown,
}

impl RouteCommand {
    fn name(&self) -> String {
        match self {
            RouteCommand::Message(routed) => routed.message.to_string(),
            RouteCommand::Task { .. } => "task".to_string(),
            RouteCommand::Flush(_) => "flush".to_string(),
            RouteCommand::Shutdown => "shutdown".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    at: DateTime<Utc>,
    session: SessionContext,
    description: String,
}

/// Routing message dispatch backed by one serialized worker task
pub struct RoutingController {
    config: RoutingConfig,
    tx: mpsc::Sender<RouteCommand>,
    /// Cleared by `shutdown` before the stop marker is queued
    accepting: RwLock<bool>,
    snapshot_rx: watch::Receiver<RouteSnapshot>,
    history: Arc<Mutex<VecDeque<HistoryEntry>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RoutingController {
    /// Spawn the routing worker on the current tokio runtime.
    ///
    /// The worker takes ownership of `arbiter` and `machine`; from here on
    /// they are only touched from the worker task.
    pub fn start<M>(config: RoutingConfig, arbiter: CommunicationDeviceArbiter, machine: M) -> Result<Arc<Self>>
    where
        M: RouteStateMachine,
    {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let initial = RouteSnapshot {
            audio_state: machine.current_state(),
            hfp_device_available: machine.is_hfp_device_available(),
            communication_device: arbiter.snapshot(),
            processed: 0,
            machine_dump: machine.dump(),
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let history = Arc::new(Mutex::new(VecDeque::with_capacity(config.history_size)));

        let worker = RouteWorker {
            name: config.worker_name.clone(),
            rx,
            arbiter,
            machine: Box::new(machine),
            snapshot_tx,
            history: history.clone(),
            history_size: config.history_size,
            processed: 0,
        };
        let handle = tokio::spawn(worker.run());

        info!(worker = %config.worker_name, capacity = config.queue_capacity, "Routing controller started");

        Ok(Arc::new(Self {
            config,
            tx,
            accepting: RwLock::new(true),
            snapshot_rx,
            history,
            worker: Mutex::new(Some(handle)),
        }))
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Full snapshot last published by the worker
    pub fn snapshot(&self) -> RouteSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Watch snapshots as the worker publishes them
    pub fn subscribe(&self) -> watch::Receiver<RouteSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Number of submissions waiting in the queue
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_running(&self) -> bool {
        *self.accepting.read() && !self.tx.is_closed()
    }

    /// Wait until everything submitted before this call has been processed
    pub async fn flush(&self) -> Result<()> {
        let accepting = *self.accepting.read();
        if !accepting {
            return Err(RouteError::WorkerStopped);
        }
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(RouteCommand::Flush(done_tx))
            .await
            .map_err(|_| RouteError::WorkerStopped)?;
        done_rx.await.map_err(|_| RouteError::WorkerStopped)
    }

    /// Stop the worker after it drains what is already queued.
    ///
    /// Submissions racing with this call either land before the stop marker
    /// or fail with `WorkerStopped`; none are accepted and then dropped.
    pub async fn shutdown(&self) -> Result<()> {
        {
            let mut accepting = self.accepting.write();
            if !*accepting {
                return Err(RouteError::WorkerStopped);
            }
            *accepting = false;
        }
        self.tx
            .send(RouteCommand::Shutdown)
            .await
            .map_err(|_| RouteError::WorkerStopped)?;

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(worker = %self.config.worker_name, "Routing worker ended abnormally: {}", e);
            }
        }
        Ok(())
    }

    fn enqueue(&self, command: RouteCommand) -> Result<()> {
        let accepting = self.accepting.read();
        if !*accepting {
            debug!(message = %command.name(), "Routing controller shut down, rejecting submission");
            return Err(RouteError::WorkerStopped);
        }
        match self.tx.try_send(command) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(command)) => {
                let name = command.name();
                warn!(worker = %self.config.worker_name, message = %name, "Routing queue full, dropping submission");
                Err(RouteError::queue_full(name))
            }
            Err(TrySendError::Closed(command)) => {
                debug!(message = %command.name(), "Routing worker stopped, rejecting submission");
                Err(RouteError::WorkerStopped)
            }
        }
    }
}

impl RoutingAdapter for RoutingController {
    fn send_message(&self, message: RouteMessage) -> Result<()> {
        self.enqueue(RouteCommand::Message(RoutedMessage::new(message)))
    }

    fn send_message_with_arg(&self, message: RouteMessage, arg: i32) -> Result<()> {
        self.enqueue(RouteCommand::Message(RoutedMessage::new(message).with_arg(arg)))
    }

    fn send_message_with_payload(&self, message: RouteMessage, arg: i32, payload: String) -> Result<()> {
        self.enqueue(RouteCommand::Message(
            RoutedMessage::new(message).with_arg(arg).with_payload(payload),
        ))
    }

    fn submit_task(&self, task: RouteTask) -> Result<()> {
        self.enqueue(RouteCommand::Task {
            task,
            session: SessionContext::capture(),
        })
    }

    fn current_route_state(&self) -> CallAudioState {
        self.snapshot_rx.borrow().audio_state.clone()
    }

    fn is_hfp_device_available(&self) -> bool {
        self.snapshot_rx.borrow().hfp_device_available
    }

    fn dump(&self) -> String {
        let snapshot = self.snapshot();
        let mut out = String::new();

        let _ = writeln!(out, "RoutingController[{}]", self.config.worker_name);
        let _ = writeln!(
            out,
            "  running: {}, queue: {}/{}",
            self.is_running(),
            self.pending(),
            self.config.queue_capacity
        );
        let _ = writeln!(out, "  audio state: {}", snapshot.audio_state);
        let _ = writeln!(out, "  hfp device available: {}", snapshot.hfp_device_available);
        let _ = writeln!(out, "  communication device: {}", snapshot.communication_device);
        let _ = writeln!(out, "  processed: {}", snapshot.processed);
        if !snapshot.machine_dump.is_empty() {
            let _ = writeln!(out, "  state machine:");
            for line in snapshot.machine_dump.lines() {
                let _ = writeln!(out, "    {}", line);
            }
        }
        let _ = writeln!(out, "  history:");
        for entry in self.history.lock().iter() {
            let _ = writeln!(
                out,
                "    {} {} ({})",
                entry.at.format("%H:%M:%S%.3f"),
                entry.description,
                entry.session
            );
        }
        out
    }
}

struct RouteWorker {
    name: String,
    rx: mpsc::Receiver<RouteCommand>,
    arbiter: CommunicationDeviceArbiter,
    machine: Box<dyn RouteStateMachine>,
    snapshot_tx: watch::Sender<RouteSnapshot>,
    history: Arc<Mutex<VecDeque<HistoryEntry>>>,
    history_size: usize,
    processed: u64,
}

impl RouteWorker {
    async fn run(mut self) {
        info!(worker = %self.name, "Routing worker started");

        while let Some(command) = self.rx.recv().await {
            match command {
                RouteCommand::Message(routed) => {
                    let span = info_span!(
                        "route_message",
                        message = %routed.message,
                        session = %routed.session.id,
                        origin = routed.session.origin
                    );
                    let outcome = AssertUnwindSafe(self.machine.process(&routed, &mut self.arbiter))
                        .catch_unwind()
                        .instrument(span)
                        .await;
                    if let Err(cause) = outcome {
                        warn!(
                            worker = %self.name,
                            message = %routed.message,
                            "Routing state machine panicked: {}",
                            panic_message(cause.as_ref())
                        );
                    }
                    self.record(routed.session.clone(), routed.to_string());
                }
                RouteCommand::Task { task, session } => {
                    let span = info_span!("route_task", session = %session.id, origin = session.origin);
                    let outcome = {
                        let _entered = span.enter();
                        let arbiter = &mut self.arbiter;
                        panic::catch_unwind(AssertUnwindSafe(move || task(arbiter)))
                    };
                    if let Err(cause) = outcome {
                        warn!(worker = %self.name, "Routing task panicked: {}", panic_message(cause.as_ref()));
                    }
                    self.record(session, "task".to_string());
                }
                RouteCommand::Flush(done) => {
                    let _ = done.send(());
                    continue;
                }
                RouteCommand::Shutdown => break,
            }
            self.publish();
        }

        self.rx.close();
        info!(worker = %self.name, processed = self.processed, "Routing worker stopped");
    }

    fn record(&mut self, session: SessionContext, description: String) {
        self.processed += 1;
        debug!(worker = %self.name, item = %description, "Routing item processed");

        if self.history_size == 0 {
            return;
        }
        let mut history = self.history.lock();
        if history.len() == self.history_size {
            history.pop_front();
        }
        history.push_back(HistoryEntry {
            at: Utc::now(),
            session,
            description,
        });
    }

    fn publish(&self) {
        let snapshot = RouteSnapshot {
            audio_state: self.machine.current_state(),
            hfp_device_available: self.machine.is_hfp_device_available(),
            communication_device: self.arbiter.snapshot(),
            processed: self.processed,
            machine_dump: self.machine.dump(),
        };
        // Receivers may all be gone during teardown.
        let _ = self.snapshot_tx.send(snapshot);
    }
}

fn panic_message(cause: &(dyn Any + Send)) -> &str {
    cause
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| cause.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
