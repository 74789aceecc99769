//! Background runner driving the worker loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{stream, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::WorkflowConfig;
use crate::lead::AgentRole;
use crate::scheduler::WorkScheduler;

use super::Coordinator;

/// Runs one polling loop per coordinator.
///
/// Each loop asks the scheduler for a claimed batch and fans it out to the
/// coordinator with bounded concurrency. A failing lead is logged and
/// dropped; the loop never dies over it.
pub struct AgentRunner {
    scheduler: Arc<WorkScheduler>,
    coordinators: Vec<Arc<dyn Coordinator>>,
    config: WorkflowConfig,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl AgentRunner {
    pub fn new(
        scheduler: Arc<WorkScheduler>,
        coordinators: Vec<Arc<dyn Coordinator>>,
        config: WorkflowConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            scheduler,
            coordinators,
            config,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn the worker loops. Idempotent; a second call is a no-op.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Agent runner already running");
            return;
        }

        for coordinator in &self.coordinators {
            self.spawn_worker_loop(coordinator.clone());
        }
        info!(workers = self.coordinators.len(), "Agent runner started");
    }

    /// Signal all worker loops to stop. In-flight leads finish their
    /// current action first.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.shutdown_tx.send(());
        info!("Agent runner stopping");
    }

    fn max_concurrent(&self, role: AgentRole) -> usize {
        match role {
            AgentRole::Voice => self.config.max_concurrent_voice,
            AgentRole::Entry => self.config.max_concurrent_entry,
        }
    }

    fn spawn_worker_loop(&self, coordinator: Arc<dyn Coordinator>) {
        let role = coordinator.role();
        let scheduler = self.scheduler.clone();
        let running = self.running.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let poll_interval = Duration::from_secs(self.config.poll_interval_secs);
        let max_concurrent = self.max_concurrent(role).max(1);

        tokio::spawn(async move {
            info!(%role, "Worker loop started");

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = tokio::time::sleep(poll_interval) => {}
                }
                if !running.load(Ordering::SeqCst) {
                    break;
                }

                let batch = match scheduler.next_batch(role) {
                    Ok(batch) => batch,
                    Err(e) => {
                        warn!(%role, error = %e, "Failed to schedule a batch");
                        continue;
                    }
                };
                if batch.is_empty() {
                    continue;
                }

                debug!(%role, count = batch.len(), "Working a batch");
                stream::iter(batch)
                    .for_each_concurrent(max_concurrent, |lead| {
                        let coordinator = coordinator.clone();
                        async move {
                            let lead_id = lead.id.clone();
                            if let Err(e) = coordinator.process(lead).await {
                                warn!(%role, lead_id = %lead_id, error = %e, "Lead processing failed");
                            }
                        }
                    })
                    .await;
            }

            info!(%role, "Worker loop stopped");
        });
    }
}
