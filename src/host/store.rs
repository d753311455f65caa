// src/host/store.rs

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use crate::player::ProgressSink;
use crate::progress::{ActivityProgress, ProgressChange};
use crate::types::{ActivityId, PlayerId};

/// Persistence stand-in: keeps one progress record per (player, activity)
/// and applies changes the way a database layer would.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    records: Mutex<BTreeMap<(PlayerId, ActivityId), ActivityProgress>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, player_id: PlayerId, activity_id: ActivityId) -> Option<ActivityProgress> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(player_id, activity_id))
            .cloned()
    }

    /// Every stored record of `player_id`, for `PlayerActivityManager::init_data`.
    pub fn load_player(&self, player_id: PlayerId) -> Vec<ActivityProgress> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .range((player_id, ActivityId::MIN)..=(player_id, ActivityId::MAX))
            .map(|(_, progress)| progress.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProgressSink for MemoryProgressStore {
    fn on_change(&self, player_id: PlayerId, activity_id: ActivityId, change: ProgressChange) {
        let cmd = change.cmd();
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        match change {
            ProgressChange::Add(progress) => {
                records.insert((player_id, activity_id), progress);
            }
            ProgressChange::Update(diff) => match records.get_mut(&(player_id, activity_id)) {
                Some(progress) => progress.apply(&diff),
                None => {
                    warn!(player_id, activity_id, "update for unknown progress record");
                    let mut progress = ActivityProgress::new(activity_id);
                    progress.apply(&diff);
                    records.insert((player_id, activity_id), progress);
                }
            },
            ProgressChange::Delete => {
                records.remove(&(player_id, activity_id));
            }
        }
        debug!(player_id, activity_id, ?cmd, "progress stored");
    }
}
