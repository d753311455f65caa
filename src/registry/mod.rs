// src/registry/mod.rs

//! Global activity registry shared by every player manager.
//!
//! Backed by a sharded `DashMap`, so point reads and writes from different
//! threads do not serialize on a single lock. Iteration works on a snapshot of
//! `Arc<ActivityConfig>` values and may or may not observe concurrent adds.
//!
//! Only absolute-time activities expire here: once `now >= end_time` they are
//! evicted lazily by the next `get` or `range_all` and listeners see a
//! `Delete`. Relative-time activities expire per player.

pub mod listener;

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{ActivityConfig, validate_activity};
use crate::errors::{ActivityError, Result};
use crate::time::TimePolicy;
use crate::types::{ActivityId, AreaId, DataCmd};

pub use listener::RegistryListener;

/// Host lookup of an area's server-open time.
pub type AreaOpenTimeFn = Arc<dyn Fn(AreaId) -> i64 + Send + Sync>;

pub struct ActivityRegistry {
    activities: DashMap<ActivityId, Arc<ActivityConfig>>,
    listener: RwLock<Option<Arc<dyn RegistryListener>>>,
    area_open_time: RwLock<Option<AreaOpenTimeFn>>,
    policy: RwLock<TimePolicy>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ActivityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityRegistry")
            .field("len", &self.activities.len())
            .field("policy", &self.time_policy())
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for ActivityRegistry {
    fn default() -> Self {
        Self::new(TimePolicy::default())
    }
}

impl ActivityRegistry {
    pub fn new(policy: TimePolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: TimePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            activities: DashMap::new(),
            listener: RwLock::new(None),
            area_open_time: RwLock::new(None),
            policy: RwLock::new(policy),
            clock,
        }
    }

    /// Load the initial activity set and install the host callbacks.
    ///
    /// Initial entries are inserted without `Add` notifications. Entries that
    /// are already expired are dropped and reported as `Delete`. Invalid or
    /// duplicate entries are logged and skipped.
    pub fn init(
        &self,
        initial: Vec<ActivityConfig>,
        listener: Option<Arc<dyn RegistryListener>>,
        area_open_time: Option<AreaOpenTimeFn>,
    ) {
        *self.listener.write().unwrap_or_else(PoisonError::into_inner) = listener;
        *self
            .area_open_time
            .write()
            .unwrap_or_else(PoisonError::into_inner) = area_open_time;

        let now = self.now();
        for config in initial {
            let id = config.id;
            if let Err(e) = validate_activity(&config) {
                warn!(activity_id = id, error = %e, "skipping invalid activity at init");
                continue;
            }
            if is_registry_expired(&config, now) {
                debug!(activity_id = id, "activity already expired at init");
                self.notify(&config, DataCmd::Delete);
                continue;
            }
            if self.activities.insert(id, Arc::new(config)).is_some() {
                warn!(activity_id = id, "duplicate activity at init; last one wins");
            }
        }
        info!(count = self.activities.len(), "activity registry initialised");
    }

    pub fn set_listener(&self, listener: Arc<dyn RegistryListener>) {
        *self.listener.write().unwrap_or_else(PoisonError::into_inner) = Some(listener);
    }

    pub fn set_area_open_time(&self, lookup: AreaOpenTimeFn) {
        *self
            .area_open_time
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(lookup);
    }

    /// Add a new activity. Never overwrites an existing id.
    pub fn add(&self, config: ActivityConfig) -> Result<()> {
        validate_activity(&config)?;
        let id = config.id;
        let config = Arc::new(config);
        match self.activities.entry(id) {
            Entry::Occupied(_) => {
                warn!(activity_id = id, "activity already exists");
                return Err(ActivityError::ActivityExists(id));
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&config));
            }
        }
        info!(activity_id = id, name = %config.name, "activity added");
        self.notify(&config, DataCmd::Add);
        Ok(())
    }

    /// Remove an activity. Returns whether something was removed; listeners
    /// are notified only in that case.
    pub fn delete(&self, id: ActivityId) -> bool {
        match self.activities.remove(&id) {
            Some((_, config)) => {
                info!(activity_id = id, "activity deleted");
                self.notify(&config, DataCmd::Delete);
                true
            }
            None => false,
        }
    }

    /// Look up an activity, evicting it first if it has expired.
    pub fn get(&self, id: ActivityId) -> Option<Arc<ActivityConfig>> {
        let config = self.activities.get(&id).map(|entry| Arc::clone(entry.value()))?;
        if is_registry_expired(&config, self.now()) {
            self.evict(id);
            return None;
        }
        Some(config)
    }

    /// Visit every live activity. Expired entries met on the way are evicted.
    ///
    /// `f` runs without any registry lock held.
    pub fn range_all<F>(&self, mut f: F)
    where
        F: FnMut(&Arc<ActivityConfig>),
    {
        let snapshot: Vec<Arc<ActivityConfig>> = self
            .activities
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let now = self.now();
        for config in snapshot.iter() {
            if is_registry_expired(config, now) {
                self.evict(config.id);
                continue;
            }
            f(config);
        }
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn time_policy(&self) -> TimePolicy {
        *self.policy.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_timezone(&self, offset_hours: i32) {
        let mut policy = self.policy.write().unwrap_or_else(PoisonError::into_inner);
        policy.timezone_offset_hours = offset_hours;
        info!(offset_hours, "registry timezone updated");
    }

    pub fn set_daily_rollover_hour(&self, hour: i32) {
        let mut policy = self.policy.write().unwrap_or_else(PoisonError::into_inner);
        policy.daily_rollover_hour = hour;
        info!(hour, "registry daily rollover hour updated");
    }

    /// Server-open time of `area`; "now" when the host installed no lookup.
    pub fn area_open_time(&self, area: AreaId) -> i64 {
        let lookup = self
            .area_open_time
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match lookup {
            Some(lookup) => lookup(area),
            None => self.now(),
        }
    }

    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    fn evict(&self, id: ActivityId) {
        // Re-check under the shard lock so a fresh re-add is not evicted.
        let now = self.now();
        if let Some((_, config)) = self
            .activities
            .remove_if(&id, |_, config| is_registry_expired(config, now))
        {
            info!(activity_id = id, "activity expired");
            self.notify(&config, DataCmd::Delete);
        }
    }

    fn notify(&self, config: &ActivityConfig, cmd: DataCmd) {
        let listener = self
            .listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(listener) = listener {
            listener.on_change(config, cmd);
        }
    }
}

fn is_registry_expired(config: &ActivityConfig, now: i64) -> bool {
    config.is_absolute() && now >= config.end_time
}
