// src/activity/mod.rs

//! One activity as seen by one player: the config snapshot, its resolved
//! time window, pre-condition and score progress, and the materialized
//! templates.

pub mod view;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::ActivityConfig;
use crate::errors::{ActivityError, Result};
use crate::player::PlayerCapability;
use crate::progress::{ActivityProgress, ProgressDiff, TaskProgress};
use crate::template::{
    TaskPredicate, Template, TemplateBehaviour, TemplateCtx, TemplateSlot, TemplateTable,
    align_tasks, offer_tasks, reset_task_list,
};
use crate::time::{ResolvedWindow, TimePolicy};
use crate::types::{ActivityId, ItemData, RefreshType};

pub use view::ActivityView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    /// Before start, or pre-conditions unmet.
    Ineligible,
    /// Within `[start, end]` with pre-conditions satisfied.
    Open,
    /// Within `(end, close)`: rewards claimable, no new progress.
    ClosedClaimable,
    /// At or past close.
    Expired,
}

#[derive(Debug, Clone)]
pub struct ActivityInstance {
    config: Arc<ActivityConfig>,
    window: ResolvedWindow,
    pre_tasks: Vec<TaskProgress>,
    claimed_scores: BTreeSet<usize>,
    templates: BTreeMap<u32, Vec<Template>>,
}

impl ActivityInstance {
    /// Materialize an instance from config and (optionally) stored progress.
    ///
    /// Template entries missing from `progress` start from their zero value.
    pub fn new(
        config: Arc<ActivityConfig>,
        window: ResolvedWindow,
        progress: Option<ActivityProgress>,
        table: &TemplateTable,
    ) -> Result<Self> {
        let mut progress = progress.unwrap_or_else(|| ActivityProgress::new(config.id));

        let mut templates = BTreeMap::new();
        for day in config.days.iter() {
            let mut built = Vec::with_capacity(day.templates.len());
            for (index, template) in day.templates.iter().enumerate() {
                let stored = progress
                    .days
                    .get_mut(&day.day)
                    .and_then(|stored| stored.remove(&index));
                built.push(table.build(TemplateSlot::new(day.day, index), template, stored)?);
            }
            templates.insert(day.day, built);
        }

        let mut pre_tasks = std::mem::take(&mut progress.pre_tasks);
        align_tasks(&mut pre_tasks, config.pre_conditions.len());

        Ok(Self {
            window,
            pre_tasks,
            claimed_scores: std::mem::take(&mut progress.claimed_scores),
            templates,
            config,
        })
    }

    pub fn id(&self) -> ActivityId {
        self.config.id
    }

    pub fn config(&self) -> &Arc<ActivityConfig> {
        &self.config
    }

    pub fn window(&self) -> ResolvedWindow {
        self.window
    }

    pub fn pre_tasks(&self) -> &[TaskProgress] {
        &self.pre_tasks
    }

    /// Empty pre-condition lists are always satisfied.
    pub fn finished_pre_condition(&self) -> bool {
        if self.pre_tasks.is_empty() {
            return true;
        }
        if self.config.need_all_pre_conditions_finished {
            self.pre_tasks.iter().all(|task| !task.is_doing())
        } else {
            self.pre_tasks.iter().any(|task| !task.is_doing())
        }
    }

    pub fn state(&self, now: i64) -> ActivityState {
        if self.window.is_expired(now) {
            ActivityState::Expired
        } else if !self.finished_pre_condition() || now < self.window.start {
            ActivityState::Ineligible
        } else if now <= self.window.end {
            ActivityState::Open
        } else {
            ActivityState::ClosedClaimable
        }
    }

    /// Gate for progress-mutating commands: `Ok` only when open.
    pub fn invalid(&self, now: i64) -> Result<()> {
        if !self.finished_pre_condition() {
            return Err(ActivityError::PreConditionUnmet(self.id()));
        }
        if !self.window.is_progress_time(now) {
            return Err(ActivityError::NotOpen(self.id()));
        }
        Ok(())
    }

    /// Gate for claim commands: open or closed-but-claimable.
    pub fn check_claimable(&self, now: i64) -> Result<()> {
        match self.state(now) {
            ActivityState::Open | ActivityState::ClosedClaimable => Ok(()),
            _ if !self.finished_pre_condition() => {
                Err(ActivityError::PreConditionUnmet(self.id()))
            }
            _ => Err(ActivityError::NotOpen(self.id())),
        }
    }

    pub fn is_expire(&self, now: i64) -> bool {
        self.window.is_expired(now)
    }

    /// 1-indexed game day since start; 0 or negative before start.
    pub fn open_day(&self, now: i64, policy: TimePolicy) -> i64 {
        policy.diff_days(now, self.window.start) + 1
    }

    pub fn ctx<'a>(
        &self,
        player: &'a dyn PlayerCapability,
        now: i64,
        policy: TimePolicy,
    ) -> TemplateCtx<'a> {
        TemplateCtx {
            activity_id: self.id(),
            player,
            now,
            policy,
            open_day: self.open_day(now, policy),
        }
    }

    /// Templates visible on `open_day`: that day's set for nested activities,
    /// every day's set (in day order) otherwise.
    pub fn templates(&self, open_day: i64) -> Vec<&Template> {
        if self.config.nested {
            u32::try_from(open_day)
                .ok()
                .and_then(|day| self.templates.get(&day))
                .map(|day| day.iter().collect())
                .unwrap_or_default()
        } else {
            self.templates.values().flatten().collect()
        }
    }

    fn templates_mut(&mut self, open_day: i64) -> Vec<&mut Template> {
        if self.config.nested {
            u32::try_from(open_day)
                .ok()
                .and_then(|day| self.templates.get_mut(&day))
                .map(|day| day.iter_mut().collect())
                .unwrap_or_default()
        } else {
            self.templates.values_mut().flatten().collect()
        }
    }

    /// Template at `index` among those visible on `open_day`.
    pub fn template_mut(&mut self, open_day: i64, index: usize) -> Result<&mut Template> {
        let activity_id = self.id();
        self.templates_mut(open_day)
            .into_iter()
            .nth(index)
            .ok_or(ActivityError::TemplateNotExist { activity_id, index })
    }

    /// Offer pre-condition tasks (always) and visible template tasks (only
    /// while open) to `f`. Returns the combined diff when anything changed.
    pub fn range_all_conditions(
        &mut self,
        now: i64,
        policy: TimePolicy,
        f: &mut TaskPredicate<'_>,
    ) -> Option<ProgressDiff> {
        let activity_id = self.id();
        let mut diff = ProgressDiff::new(activity_id);

        if offer_tasks(&self.config.pre_conditions, &mut self.pre_tasks, f) {
            diff.merge(self.header_diff());
        }

        if self.invalid(now).is_ok() {
            let open_day = self.open_day(now, policy);
            for template in self.templates_mut(open_day) {
                if template.range_tasks(f) {
                    diff.merge(template.diff(activity_id));
                }
            }
        }

        (!diff.is_empty()).then_some(diff)
    }

    pub fn get_score_reward(
        &mut self,
        player: &dyn PlayerCapability,
        score_index: usize,
    ) -> Result<()> {
        let entry = self
            .config
            .score_system
            .get(score_index)
            .ok_or(ActivityError::ScoreEntryNotExist(score_index))?;
        if self.claimed_scores.contains(&score_index) {
            return Err(ActivityError::ScoreRewardClaimed(score_index));
        }

        // The score is a threshold, never debited.
        player.check_cost(std::slice::from_ref(&entry.score))?;
        player.add_reward(self.config.id, &entry.rewards)?;
        self.claimed_scores.insert(score_index);
        Ok(())
    }

    /// Every reward earned but not taken, across all days and the score
    /// system. Used for the mailbox fallback on teardown.
    pub fn claimable_rewards(&self, player: &dyn PlayerCapability) -> Vec<ItemData> {
        let mut rewards: Vec<ItemData> = self
            .templates
            .values()
            .flatten()
            .flat_map(|template| template.claimable_rewards())
            .collect();

        for (index, entry) in self.config.score_system.iter().enumerate() {
            if self.claimed_scores.contains(&index) {
                continue;
            }
            if player.check_cost(std::slice::from_ref(&entry.score)).is_ok() {
                rewards.extend_from_slice(&entry.rewards);
            }
        }
        rewards
    }

    /// Auto-sign every visible login-triggered sign-in template.
    pub fn auto_sign(&mut self, ctx: &TemplateCtx<'_>) -> Option<ProgressDiff> {
        let activity_id = self.id();
        let mut diff = ProgressDiff::new(activity_id);
        for template in self.templates_mut(ctx.open_day) {
            let Some(sign_in) = template.as_sign_in_mut() else {
                continue;
            };
            if !sign_in.is_login_trigger() {
                continue;
            }
            match sign_in.sign(ctx) {
                Ok(()) => diff.merge(sign_in.diff(activity_id)),
                Err(e) => debug!(activity_id, error = %e, "login sign skipped"),
            }
        }
        (!diff.is_empty()).then_some(diff)
    }

    /// Reset tasks refreshed by `refresh` in pre-conditions and every
    /// template.
    pub fn reset_tasks(
        &mut self,
        refresh: RefreshType,
        unclaimed: &mut Vec<ItemData>,
    ) -> Option<ProgressDiff> {
        let activity_id = self.id();
        let mut diff = ProgressDiff::new(activity_id);

        if reset_task_list(&self.config.pre_conditions, &mut self.pre_tasks, refresh, unclaimed) {
            diff.merge(self.header_diff());
        }
        for template in self.templates.values_mut().flatten() {
            if template.reset_tasks(refresh, unclaimed) {
                diff.merge(template.diff(activity_id));
            }
        }
        (!diff.is_empty()).then_some(diff)
    }

    pub fn reset_every_day_repair_count(&mut self) -> Option<ProgressDiff> {
        let activity_id = self.id();
        let mut diff = ProgressDiff::new(activity_id);
        for template in self.templates.values_mut().flatten() {
            if let Some(sign_in) = template.as_sign_in_mut() {
                if sign_in.reset_every_day_repair_count() {
                    diff.merge(sign_in.diff(activity_id));
                }
            }
        }
        (!diff.is_empty()).then_some(diff)
    }

    /// Full progress record, as persisted.
    pub fn snapshot(&self) -> ActivityProgress {
        let mut progress = ActivityProgress::new(self.id());
        for template in self.templates.values().flatten() {
            let slot = template.slot();
            progress
                .days
                .entry(slot.day)
                .or_default()
                .insert(slot.index, template.progress());
        }
        progress.pre_tasks = self.pre_tasks.clone();
        progress.claimed_scores = self.claimed_scores.clone();
        progress
    }

    /// Activity-level fields only (pre-conditions and claimed scores).
    pub fn header_diff(&self) -> ProgressDiff {
        ProgressDiff::header(self.id(), self.pre_tasks.clone(), self.claimed_scores.clone())
    }

    pub fn view(&self, now: i64, policy: TimePolicy) -> ActivityView {
        ActivityView {
            activity_id: self.id(),
            name: self.config.name.clone(),
            state: self.state(now),
            open_day: self.open_day(now, policy),
            window: self.window,
            config: self.config.as_ref().clone(),
            progress: self.snapshot(),
        }
    }
}
