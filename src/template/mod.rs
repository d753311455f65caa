// src/template/mod.rs

//! Template subsystem: the closed set of sub-features an activity is built
//! from, and the table used to construct them.
//!
//! Every variant implements [`TemplateBehaviour`]. Variant-specific commands
//! (sign, buy, claim task) live on the concrete types and are reached through
//! [`Template::as_sign_in_mut`] and friends.

pub mod condition;
pub mod shop;
pub mod sign_in;
pub mod table;

use crate::config::ConditionConfig;
use crate::player::PlayerCapability;
use crate::progress::{ProgressDiff, TaskProgress, TemplateProgress};
use crate::time::TimePolicy;
use crate::types::{ActivityId, ItemData, RefreshType, TemplateKind};

pub use condition::ConditionTemplate;
pub use shop::ShopTemplate;
pub use sign_in::SignInTemplate;
pub use table::{TemplateCtor, TemplateTable};

/// Where a template lives inside its activity's progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateSlot {
    pub day: u32,
    pub index: usize,
}

impl TemplateSlot {
    pub fn new(day: u32, index: usize) -> Self {
        Self { day, index }
    }
}

/// Everything a template command needs besides its own state.
pub struct TemplateCtx<'a> {
    pub activity_id: ActivityId,
    pub player: &'a dyn PlayerCapability,
    pub now: i64,
    pub policy: TimePolicy,
    /// 1-indexed day since the activity's start (0 or less before start).
    pub open_day: i64,
}

/// Predicate handed in by the host to advance tasks. Returns `true` when it
/// changed the task.
pub type TaskPredicate<'f> = dyn FnMut(&ConditionConfig, &mut TaskProgress) -> bool + 'f;

pub trait TemplateBehaviour {
    fn slot(&self) -> TemplateSlot;

    fn kind(&self) -> TemplateKind;

    fn progress(&self) -> TemplateProgress;

    /// Offer every task of this template to `f`. Returns whether any task
    /// changed.
    fn range_tasks(&mut self, _f: &mut TaskPredicate<'_>) -> bool {
        false
    }

    /// Rewards the player has earned but not yet taken.
    fn claimable_rewards(&self) -> Vec<ItemData>;

    /// Reset tasks refreshed by `refresh`. Rewards of finished but unclaimed
    /// tasks are pushed to `unclaimed`. Returns whether anything changed.
    fn reset_tasks(&mut self, _refresh: RefreshType, _unclaimed: &mut Vec<ItemData>) -> bool {
        false
    }

    fn diff(&self, activity_id: ActivityId) -> ProgressDiff {
        let slot = self.slot();
        ProgressDiff::for_template(activity_id, slot.day, slot.index, self.progress())
    }
}

#[derive(Debug, Clone)]
pub enum Template {
    Condition(ConditionTemplate),
    SignIn(SignInTemplate),
    Shop(ShopTemplate),
}

impl Template {
    pub fn as_condition_mut(&mut self) -> Option<&mut ConditionTemplate> {
        match self {
            Template::Condition(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_sign_in_mut(&mut self) -> Option<&mut SignInTemplate> {
        match self {
            Template::SignIn(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_shop_mut(&mut self) -> Option<&mut ShopTemplate> {
        match self {
            Template::Shop(t) => Some(t),
            _ => None,
        }
    }

    fn behaviour(&self) -> &dyn TemplateBehaviour {
        match self {
            Template::Condition(t) => t,
            Template::SignIn(t) => t,
            Template::Shop(t) => t,
        }
    }

    fn behaviour_mut(&mut self) -> &mut dyn TemplateBehaviour {
        match self {
            Template::Condition(t) => t,
            Template::SignIn(t) => t,
            Template::Shop(t) => t,
        }
    }
}

impl TemplateBehaviour for Template {
    fn slot(&self) -> TemplateSlot {
        self.behaviour().slot()
    }

    fn kind(&self) -> TemplateKind {
        self.behaviour().kind()
    }

    fn progress(&self) -> TemplateProgress {
        self.behaviour().progress()
    }

    fn range_tasks(&mut self, f: &mut TaskPredicate<'_>) -> bool {
        self.behaviour_mut().range_tasks(f)
    }

    fn claimable_rewards(&self) -> Vec<ItemData> {
        self.behaviour().claimable_rewards()
    }

    fn reset_tasks(&mut self, refresh: RefreshType, unclaimed: &mut Vec<ItemData>) -> bool {
        self.behaviour_mut().reset_tasks(refresh, unclaimed)
    }
}

/// Resize stored task progress to match the configured task list.
pub(crate) fn align_tasks(tasks: &mut Vec<TaskProgress>, configured: usize) {
    tasks.resize(configured, TaskProgress::default());
}

/// Offer `tasks` to `f` pairwise with their configs.
pub(crate) fn offer_tasks(
    configs: &[ConditionConfig],
    tasks: &mut [TaskProgress],
    f: &mut TaskPredicate<'_>,
) -> bool {
    let mut changed = false;
    for (config, task) in configs.iter().zip(tasks.iter_mut()) {
        if f(config, task) {
            changed = true;
        }
    }
    changed
}

/// Reset every task whose refresh type matches. Shared by condition
/// templates, sign-in repair tasks and activity pre-conditions.
pub(crate) fn reset_task_list(
    configs: &[ConditionConfig],
    tasks: &mut [TaskProgress],
    refresh: RefreshType,
    unclaimed: &mut Vec<ItemData>,
) -> bool {
    let mut changed = false;
    for (config, task) in configs.iter().zip(tasks.iter_mut()) {
        if config.refresh != refresh {
            continue;
        }
        if task.state == crate::types::TaskState::Finished {
            unclaimed.extend_from_slice(&config.rewards);
        }
        if !task.is_default() {
            *task = TaskProgress::default();
            changed = true;
        }
    }
    changed
}
