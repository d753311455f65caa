use std::sync::{Arc, Mutex};

use opactivity::player::ProgressSink;
use opactivity::progress::{ActivityProgress, ProgressChange, ProgressDiff};
use opactivity::types::{ActivityId, DataCmd, PlayerId};

/// `ProgressSink` that keeps every change it receives, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    changes: Arc<Mutex<Vec<(PlayerId, ActivityId, ProgressChange)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc(&self) -> Arc<dyn ProgressSink> {
        Arc::new(self.clone())
    }

    pub fn changes(&self) -> Vec<(PlayerId, ActivityId, ProgressChange)> {
        self.changes.lock().unwrap().clone()
    }

    pub fn cmds(&self) -> Vec<(ActivityId, DataCmd)> {
        self.changes()
            .iter()
            .map(|(_, activity_id, change)| (*activity_id, change.cmd()))
            .collect()
    }

    pub fn count(&self, cmd: DataCmd) -> usize {
        self.cmds().iter().filter(|(_, c)| *c == cmd).count()
    }

    /// Last full snapshot sent for `activity_id`.
    pub fn last_add(&self, activity_id: ActivityId) -> Option<ActivityProgress> {
        self.changes().into_iter().rev().find_map(|(_, id, change)| match change {
            ProgressChange::Add(progress) if id == activity_id => Some(progress),
            _ => None,
        })
    }

    pub fn updates(&self, activity_id: ActivityId) -> Vec<ProgressDiff> {
        self.changes()
            .into_iter()
            .filter_map(|(_, id, change)| match change {
                ProgressChange::Update(diff) if id == activity_id => Some(diff),
                _ => None,
            })
            .collect()
    }

    /// Replay Add/Update/Delete for `activity_id` the way a store would.
    pub fn replay(&self, activity_id: ActivityId) -> Option<ActivityProgress> {
        let mut state: Option<ActivityProgress> = None;
        for (_, id, change) in self.changes() {
            if id != activity_id {
                continue;
            }
            match change {
                ProgressChange::Add(progress) => state = Some(progress),
                ProgressChange::Update(diff) => {
                    if let Some(progress) = state.as_mut() {
                        progress.apply(&diff);
                    }
                }
                ProgressChange::Delete => state = None,
            }
        }
        state
    }

    pub fn clear(&self) {
        self.changes.lock().unwrap().clear();
    }
}

impl ProgressSink for RecordingSink {
    fn on_change(&self, player_id: PlayerId, activity_id: ActivityId, change: ProgressChange) {
        self.changes
            .lock()
            .unwrap()
            .push((player_id, activity_id, change));
    }
}
