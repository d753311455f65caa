// src/time/resolver.rs

use serde::Serialize;
use tracing::warn;

use crate::config::ActivityConfig;
use crate::errors::{ActivityError, Result};
use crate::types::{AreaId, TimeMode};

/// The four instants of an activity, resolved for one player.
///
/// Always satisfies `prediction <= start <= end <= close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedWindow {
    /// Visible to the player (announced) from here on.
    pub prediction: i64,
    /// Progress may be made from here on.
    pub start: i64,
    /// Progress stops; rewards remain claimable.
    pub end: i64,
    /// Instance is torn down.
    pub close: i64,
}

impl ResolvedWindow {
    pub fn is_progress_time(&self, now: i64) -> bool {
        self.start <= now && now <= self.end
    }

    pub fn is_visible(&self, now: i64) -> bool {
        self.prediction <= now && now <= self.close
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.close
    }
}

/// Resolve `config`'s time fields against the player's anchors.
///
/// `area_open_time` is only consulted for server-open-relative activities.
pub fn resolve_window<F>(
    config: &ActivityConfig,
    register_time: i64,
    area_id: AreaId,
    area_open_time: F,
) -> Result<ResolvedWindow>
where
    F: FnOnce(AreaId) -> i64,
{
    let base = match config.time_mode {
        TimeMode::Absolute => 0,
        TimeMode::RegisterRelative => register_time,
        TimeMode::ServerOpenRelative => area_open_time(area_id),
        TimeMode::Unknown => {
            warn!(activity_id = config.id, "invalid activity time mode");
            return Err(ActivityError::UnknownTimeMode(config.id));
        }
    };

    let window = ResolvedWindow {
        prediction: config.prediction_time + base,
        start: config.start_time + base,
        end: config.end_time + base,
        close: config.close_time + base,
    };

    if !(window.prediction <= window.start
        && window.start <= window.end
        && window.end <= window.close)
    {
        warn!(activity_id = config.id, ?window, "activity time window is not ordered");
        return Err(ActivityError::InvalidTimeWindow {
            activity_id: config.id,
            detail: format!(
                "prediction={} start={} end={} close={}",
                window.prediction, window.start, window.end, window.close
            ),
        });
    }

    Ok(window)
}
