// src/engine/runtime.rs

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::executor::{TaskOutcome, run_sequence};
use crate::engine::queue::PendingTriggers;
use crate::pipeline::PipelineSession;
use crate::serve::DevServerBridge;

pub type TaskName = String;

/// Events driving the runtime loop.
#[derive(Debug)]
pub enum RuntimeEvent {
    /// A watched path changed and matched a binding's patterns.
    BindingTriggered { binding: usize, path: String },
    /// A spawned binding sequence finished.
    SequenceFinished { binding: usize },
    /// Ctrl-C (or equivalent).
    ShutdownRequested,
}

/// The watch-mode event loop.
///
/// One sequence per binding runs at a time; triggers that arrive mid-run are
/// queued and coalesced, and replayed when the sequence finishes. Different
/// bindings run concurrently.
pub struct Runtime {
    session: Arc<PipelineSession>,
    bridge: Option<DevServerBridge>,
    events_tx: mpsc::Sender<RuntimeEvent>,
    events_rx: mpsc::Receiver<RuntimeEvent>,
    pending: PendingTriggers,
    active: HashSet<usize>,
}

impl Runtime {
    pub fn new(session: Arc<PipelineSession>, bridge: Option<DevServerBridge>) -> Self {
        let (events_tx, events_rx) = mpsc::channel(64);
        Self {
            session,
            bridge,
            events_tx,
            events_rx,
            pending: PendingTriggers::default(),
            active: HashSet::new(),
        }
    }

    /// Sender half for the watcher and the signal handler.
    pub fn events_tx(&self) -> mpsc::Sender<RuntimeEvent> {
        self.events_tx.clone()
    }

    /// Run the loop until shutdown is requested.
    pub async fn run(mut self) {
        info!("watching for changes (ctrl-c to stop)");

        while let Some(event) = self.events_rx.recv().await {
            match event {
                RuntimeEvent::BindingTriggered { binding, path } => {
                    self.trigger(binding, Some(path));
                }
                RuntimeEvent::SequenceFinished { binding } => {
                    self.active.remove(&binding);
                    if let Some(path) = self.pending.take(binding) {
                        debug!(binding, "replaying queued trigger");
                        self.trigger(binding, path);
                    }
                }
                RuntimeEvent::ShutdownRequested => {
                    info!("shutting down");
                    break;
                }
            }
        }
    }

    fn trigger(&mut self, binding: usize, path: Option<String>) {
        let Some(profile) = self.session.profiles().get(binding) else {
            warn!(binding, "trigger for unknown binding; ignoring");
            return;
        };

        if self.active.contains(&binding) {
            debug!(binding, "sequence already running; queueing trigger");
            self.pending.note(binding, path);
            return;
        }

        let sequence = self.session.registry().sequence_order(profile.run());
        if sequence.is_empty() {
            return;
        }
        let reload = profile.reload();

        self.active.insert(binding);

        let session = Arc::clone(&self.session);
        let bridge = self.bridge.clone();
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            debug!(binding, tasks = ?sequence, "running binding sequence");
            let outcome =
                run_sequence(&session, bridge.as_ref(), &sequence, path.as_deref(), true).await;

            if reload
                && outcome == TaskOutcome::Success
                && let Some(bridge) = &bridge
            {
                bridge.reload();
            }

            // The loop owning the receiver only exits at shutdown; a closed
            // channel just means there's nobody left to notify.
            let _ = events_tx
                .send(RuntimeEvent::SequenceFinished { binding })
                .await;
        });
    }
}
