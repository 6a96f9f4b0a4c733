// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler: the periodic tick driving the dispatcher.

use crate::dispatcher::Dispatcher;
use accord_adapters::{AgentBackend, SyncTransport};
use accord_core::{Clock, HubEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct Scheduler<A, T, C: Clock> {
    dispatcher: Arc<Dispatcher<A, T, C>>,
    interval: Duration,
    ticking: AtomicBool,
    stop_tx: watch::Sender<bool>,
}

impl<A, T, C> Scheduler<A, T, C>
where
    A: AgentBackend,
    T: SyncTransport,
    C: Clock,
{
    pub fn new(dispatcher: Arc<Dispatcher<A, T, C>>) -> Self {
        let interval = dispatcher
            .ctx()
            .config
            .dispatch
            .poll_interval()
            .max(Duration::from_millis(100));
        let (stop_tx, _) = watch::channel(false);
        Self {
            dispatcher,
            interval,
            ticking: AtomicBool::new(false),
            stop_tx,
        }
    }

    /// Run one tick: pull, scan, dispatch.
    ///
    /// Non-reentrant: a tick that starts while another is running returns 0
    /// without doing anything.
    pub async fn tick(&self) -> usize {
        if self
            .ticking
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("tick already in progress, skipping");
            return 0;
        }
        let processed = self.tick_inner().await;
        self.ticking.store(false, Ordering::SeqCst);
        processed
    }

    async fn tick_inner(&self) -> usize {
        let ctx = self.dispatcher.ctx();
        let root = ctx.layout.root().to_path_buf();

        // Pull failures never abort processing
        {
            let _gate = ctx.sync_gate.lock().await;
            if let Err(e) = ctx.sync.pull(&root).await {
                tracing::warn!(error = %e, "sync pull failed");
            }
        }
        ctx.bus.emit(&HubEvent::SyncPull { dir: root });

        let all = accord_store::scan_all(&ctx.layout);
        let mut pending = accord_store::dispatchable(&all);
        accord_store::sort_by_priority(&mut pending);
        let pending_count = pending.len();

        let processed_count = self.dispatcher.dispatch(pending, false).await;

        ctx.bus.emit(&HubEvent::SchedulerTick {
            pending_count,
            processed_count,
            timestamp: ctx.clock.epoch_ms(),
        });
        processed_count
    }

    /// Run a tick on demand, bypassing the timer.
    pub async fn trigger_now(&self) -> usize {
        self.tick().await
    }

    /// Tick immediately, then on every interval until [`Self::stop`].
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        let mut stop_rx = self.stop_tx.subscribe();
        tokio::spawn(async move {
            scheduler.tick().await;
            let mut ticker = tokio::time::interval(scheduler.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The interval's first tick is immediate and already ran above
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        scheduler.tick().await;
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!("scheduler stopped");
        })
    }

    /// Stop the polling loop. In-flight ticks finish on their own.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
