// src/progress.rs

//! Persisted per-player progress and the sparse diffs used to update it.
//!
//! Layout: activity id -> day -> template index -> [`TemplateProgress`].
//! A [`ProgressDiff`] carries the same nesting but only the entries that
//! changed; [`ActivityProgress::apply`] merges it back so that
//! `snapshot_before.apply(diff) == snapshot_after`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{ActivityId, DataCmd, TaskState, TemplateKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub state: TaskState,
    /// Counter owned by the host's trigger predicate.
    pub value: i64,
}

impl TaskProgress {
    pub fn is_doing(&self) -> bool {
        self.state == TaskState::Doing
    }

    pub fn is_default(&self) -> bool {
        *self == TaskProgress::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionProgress {
    pub tasks: Vec<TaskProgress>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInProgress {
    pub signed_day: u32,
    /// Unix seconds of the last sign (manual or automatic); 0 when never signed.
    pub last_sign_time: i64,
    pub repair_count: u32,
    pub every_day_repair_count: u32,
    /// Days (1-indexed) whose reward has been taken. Only ever grows.
    pub claimed_days: BTreeSet<u32>,
    /// Task progress per repair rule, aligned with the configured rules.
    pub repair_tasks: Vec<Vec<TaskProgress>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopProgress {
    /// Purchases per goods index.
    pub buy_counts: BTreeMap<usize, u32>,
}

impl ShopProgress {
    pub fn bought(&self, goods_index: usize) -> u32 {
        self.buy_counts.get(&goods_index).copied().unwrap_or(0)
    }
}

/// Progress of one template, tagged by template type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateProgress {
    Condition(ConditionProgress),
    SignIn(SignInProgress),
    Shop(ShopProgress),
}

impl TemplateProgress {
    pub fn kind(&self) -> TemplateKind {
        match self {
            TemplateProgress::Condition(_) => TemplateKind::Condition,
            TemplateProgress::SignIn(_) => TemplateKind::SignIn,
            TemplateProgress::Shop(_) => TemplateKind::Shop,
        }
    }
}

pub type DayProgress = BTreeMap<u32, BTreeMap<usize, TemplateProgress>>;

/// Full persisted state of one (player, activity) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityProgress {
    pub activity_id: ActivityId,
    pub days: DayProgress,
    pub pre_tasks: Vec<TaskProgress>,
    pub claimed_scores: BTreeSet<usize>,
}

impl ActivityProgress {
    pub fn new(activity_id: ActivityId) -> Self {
        Self {
            activity_id,
            ..Default::default()
        }
    }

    pub fn template(&self, day: u32, index: usize) -> Option<&TemplateProgress> {
        self.days.get(&day).and_then(|templates| templates.get(&index))
    }

    /// Merge a sparse diff into this snapshot.
    ///
    /// Template entries in the diff replace the stored ones; the activity-level
    /// header fields are replaced only when the diff carries them.
    pub fn apply(&mut self, diff: &ProgressDiff) {
        for (day, templates) in diff.days.iter() {
            let stored = self.days.entry(*day).or_default();
            for (index, progress) in templates.iter() {
                stored.insert(*index, progress.clone());
            }
        }
        if let Some(pre_tasks) = &diff.pre_tasks {
            self.pre_tasks = pre_tasks.clone();
        }
        if let Some(claimed_scores) = &diff.claimed_scores {
            self.claimed_scores = claimed_scores.clone();
        }
    }
}

/// Minimal changed fragment of an [`ActivityProgress`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressDiff {
    pub activity_id: ActivityId,
    pub days: DayProgress,
    pub pre_tasks: Option<Vec<TaskProgress>>,
    pub claimed_scores: Option<BTreeSet<usize>>,
}

impl ProgressDiff {
    pub fn new(activity_id: ActivityId) -> Self {
        Self {
            activity_id,
            ..Default::default()
        }
    }

    pub fn for_template(
        activity_id: ActivityId,
        day: u32,
        index: usize,
        progress: TemplateProgress,
    ) -> Self {
        let mut diff = Self::new(activity_id);
        diff.insert_template(day, index, progress);
        diff
    }

    /// Diff carrying only the activity-level fields.
    pub fn header(
        activity_id: ActivityId,
        pre_tasks: Vec<TaskProgress>,
        claimed_scores: BTreeSet<usize>,
    ) -> Self {
        Self {
            activity_id,
            days: BTreeMap::new(),
            pre_tasks: Some(pre_tasks),
            claimed_scores: Some(claimed_scores),
        }
    }

    pub fn insert_template(&mut self, day: u32, index: usize, progress: TemplateProgress) {
        self.days.entry(day).or_default().insert(index, progress);
    }

    /// Fold a later diff of the same activity into this one.
    pub fn merge(&mut self, later: ProgressDiff) {
        for (day, templates) in later.days {
            self.days.entry(day).or_default().extend(templates);
        }
        if later.pre_tasks.is_some() {
            self.pre_tasks = later.pre_tasks;
        }
        if later.claimed_scores.is_some() {
            self.claimed_scores = later.claimed_scores;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty() && self.pre_tasks.is_none() && self.claimed_scores.is_none()
    }
}

/// What a progress sink receives: full snapshot on add, sparse diff on
/// update, nothing on delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressChange {
    Add(ActivityProgress),
    Update(ProgressDiff),
    Delete,
}

impl ProgressChange {
    pub fn cmd(&self) -> DataCmd {
        match self {
            ProgressChange::Add(_) => DataCmd::Add,
            ProgressChange::Update(_) => DataCmd::Update,
            ProgressChange::Delete => DataCmd::Delete,
        }
    }
}
