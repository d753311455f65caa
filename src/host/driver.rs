// src/host/driver.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::player::PlayerActivityManager;
use crate::registry::ActivityRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverEvent {
    /// Periodic trigger: rollover detection, registry sync and login sign.
    Tick,
    ShutdownRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverStep {
    pub keep_running: bool,
}

/// Periodic driver for a set of player managers.
///
/// `step` holds the semantics and is synchronous; `run` is the async shell
/// that feeds it events from a channel.
pub struct Driver {
    registry: Arc<ActivityRegistry>,
    managers: Vec<PlayerActivityManager>,
    event_rx: mpsc::Receiver<DriverEvent>,
    last_tick: i64,
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("players", &self.managers.len())
            .field("last_tick", &self.last_tick)
            .finish_non_exhaustive()
    }
}

impl Driver {
    pub fn new(
        registry: Arc<ActivityRegistry>,
        managers: Vec<PlayerActivityManager>,
        event_rx: mpsc::Receiver<DriverEvent>,
    ) -> Self {
        let last_tick = registry.now();
        Self {
            registry,
            managers,
            event_rx,
            last_tick,
        }
    }

    pub fn managers(&self) -> &[PlayerActivityManager] {
        &self.managers
    }

    pub fn managers_mut(&mut self) -> &mut [PlayerActivityManager] {
        &mut self.managers
    }

    pub fn step(&mut self, event: DriverEvent) -> DriverStep {
        match event {
            DriverEvent::Tick => {
                self.tick();
                DriverStep { keep_running: true }
            }
            DriverEvent::ShutdownRequested => {
                info!("shutdown requested");
                DriverStep {
                    keep_running: false,
                }
            }
        }
    }

    fn tick(&mut self) {
        let now = self.registry.now();
        let policy = self.registry.time_policy();
        let new_day = policy.is_differ_day(now, self.last_tick);
        let new_week = policy.is_differ_week(now, self.last_tick);
        self.last_tick = now;

        for manager in self.managers.iter_mut() {
            if new_day {
                manager.on_new_day();
            }
            if new_week {
                manager.on_new_week();
            }
            manager.check_new_and_delete();
            manager.login();
        }
        debug!(now, new_day, new_week, players = self.managers.len(), "tick done");
    }

    pub async fn run(&mut self) -> Result<()> {
        info!(players = self.managers.len(), "activity driver started");

        loop {
            let Some(event) = self.event_rx.recv().await else {
                info!("driver event channel closed; exiting");
                break;
            };
            debug!(?event, "driver received event");

            if !self.step(event).keep_running {
                break;
            }
        }

        info!("activity driver exiting");
        Ok(())
    }
}
