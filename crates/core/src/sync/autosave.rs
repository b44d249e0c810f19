//! Auto-save scheduling.
//!
//! Each schedule is an owned [`AutoSaveHandle`]; schedules for different
//! pages coexist without shared global state. Ticks are serialized per
//! page: a tick that fires while a save is still in flight is dropped,
//! never queued. Stopping is idempotent, prevents any further ticks, and
//! lets an in-flight save finish.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::document::PageDocument;
use crate::store::PageStore;

use super::SyncOrchestrator;

/// Interval used by editing surfaces that do not pick their own.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Owned handle to a running auto-save schedule.
pub struct AutoSaveHandle {
    page_name: String,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl AutoSaveHandle {
    pub fn page_name(&self) -> &str {
        &self.page_name
    }

    /// Stop scheduling ticks. Idempotent; once this returns no further
    /// tick will fire. A save already in flight runs to completion.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Stop the schedule and wait for the worker (including any in-flight
    /// save) to finish.
    pub async fn stopped(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for AutoSaveHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

impl<S: PageStore + 'static> SyncOrchestrator<S> {
    /// Begin periodically saving `provider()` as a draft of `page_name`.
    ///
    /// A tick that finds a save for this page already in flight is
    /// skipped. Tick errors are logged and the schedule continues.
    pub fn start_auto_save<P>(
        &self,
        page_name: &str,
        mut provider: P,
        interval: Duration,
    ) -> AutoSaveHandle
    where
        P: FnMut() -> PageDocument + Send + 'static,
    {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let sync = self.clone();
        let page = page_name.to_string();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick of a tokio interval is immediate; the schedule
            // starts one interval after the editor opens.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        sync.autosave_tick(&page, &mut provider).await;
                    }
                }
            }
            debug!(page = %page, "auto-save schedule stopped");
        });

        AutoSaveHandle {
            page_name: page_name.to_string(),
            shutdown,
            task: Some(task),
        }
    }

    async fn autosave_tick<P>(&self, page_name: &str, provider: &mut P)
    where
        P: FnMut() -> PageDocument,
    {
        let lock = self.page_lock(page_name);
        let Ok(_guard) = lock.try_lock() else {
            debug!(page = page_name, "save in flight, skipping auto-save tick");
            return;
        };

        let document = provider();
        if let Err(err) = self.save_locked(page_name, &document, false).await {
            warn!(page = page_name, error = %err, "auto-save tick failed");
        } else {
            debug!(page = page_name, "auto-saved draft");
        }
    }
}
