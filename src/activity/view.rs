// src/activity/view.rs

use serde::Serialize;

use crate::activity::ActivityState;
use crate::config::ActivityConfig;
use crate::progress::ActivityProgress;
use crate::time::ResolvedWindow;
use crate::types::ActivityId;

/// Client-facing packing of one activity instance.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityView {
    pub activity_id: ActivityId,
    pub name: String,
    pub state: ActivityState,
    pub open_day: i64,
    pub window: ResolvedWindow,
    pub config: ActivityConfig,
    pub progress: ActivityProgress,
}
