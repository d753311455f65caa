// src/player/rollover.rs

//! Day/week/month rollover handlers.
//!
//! Free functions over the manager's instance map so the manager can emit the
//! returned diffs after the mutable borrow ends.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::activity::ActivityInstance;
use crate::player::PlayerCapability;
use crate::progress::ProgressDiff;
use crate::types::{ActivityId, ItemData, RefreshType};

/// Reset every task refreshed by `refresh`.
///
/// Rewards of tasks that were finished but never claimed are mailed in one
/// batch per activity before the reset. A failed mail is logged and the reset
/// still happens.
pub fn reset_tasks_by_refresh(
    activities: &mut BTreeMap<ActivityId, ActivityInstance>,
    player: &dyn PlayerCapability,
    refresh: RefreshType,
) -> Vec<ProgressDiff> {
    let mut diffs = Vec::new();
    for (activity_id, instance) in activities.iter_mut() {
        let mut unclaimed: Vec<ItemData> = Vec::new();
        let Some(diff) = instance.reset_tasks(refresh, &mut unclaimed) else {
            continue;
        };

        if !unclaimed.is_empty() {
            match player.send_mail(*activity_id, &unclaimed) {
                Ok(()) => info!(
                    player_id = player.id(),
                    activity_id = *activity_id,
                    items = unclaimed.len(),
                    ?refresh,
                    "mailed unclaimed task rewards before reset"
                ),
                Err(e) => warn!(
                    player_id = player.id(),
                    activity_id = *activity_id,
                    error = %e,
                    "failed to mail unclaimed task rewards"
                ),
            }
        }
        diffs.push(diff);
    }
    diffs
}

pub fn reset_daily_repair_counts(
    activities: &mut BTreeMap<ActivityId, ActivityInstance>,
) -> Vec<ProgressDiff> {
    activities
        .values_mut()
        .filter_map(|instance| instance.reset_every_day_repair_count())
        .collect()
}
