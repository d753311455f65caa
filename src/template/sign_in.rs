// src/template/sign_in.rs

use tracing::{info, warn};

use crate::config::{RepairRule, SignInConfig};
use crate::errors::{ActivityError, Result};
use crate::progress::{SignInProgress, TemplateProgress};
use crate::template::{
    TaskPredicate, TemplateBehaviour, TemplateCtx, TemplateSlot, align_tasks, offer_tasks,
    reset_task_list,
};
use crate::types::{ItemData, RefreshType, TaskState, TemplateKind};

/// Sign-in calendar: one sign per game day, rewards claimable per signed day,
/// missed days recoverable through repair.
#[derive(Debug, Clone)]
pub struct SignInTemplate {
    slot: TemplateSlot,
    config: SignInConfig,
    progress: SignInProgress,
}

impl SignInTemplate {
    pub fn new(slot: TemplateSlot, config: SignInConfig, progress: Option<SignInProgress>) -> Self {
        let mut progress = progress.unwrap_or_default();
        progress
            .repair_tasks
            .resize_with(config.repair_rules.len(), Vec::new);
        for (rule, tasks) in config
            .repair_rules
            .iter()
            .zip(progress.repair_tasks.iter_mut())
        {
            align_tasks(tasks, rule.conditions.len());
        }
        Self {
            slot,
            config,
            progress,
        }
    }

    pub fn config(&self) -> &SignInConfig {
        &self.config
    }

    pub fn state(&self) -> &SignInProgress {
        &self.progress
    }

    /// Signed automatically on login instead of by explicit command.
    pub fn is_login_trigger(&self) -> bool {
        self.config.login_trigger
    }

    pub fn signed_today(&self, ctx: &TemplateCtx<'_>) -> bool {
        self.progress.last_sign_time != 0
            && !ctx.policy.is_differ_day(ctx.now, self.progress.last_sign_time)
    }

    /// Days that may be signed so far: one per elapsed day, at most the
    /// configured count.
    fn sign_cap(&self, ctx: &TemplateCtx<'_>) -> u32 {
        clamp_day(ctx.open_day).min(self.config.sign_in_count)
    }

    fn repair_cap(&self, ctx: &TemplateCtx<'_>) -> u32 {
        clamp_day(ctx.open_day - 1).min(self.config.repair_sign_in_count)
    }

    pub fn sign(&mut self, ctx: &TemplateCtx<'_>) -> Result<()> {
        if self.signed_today(ctx) {
            return Err(ActivityError::TodaySigned);
        }
        if self.progress.signed_day >= self.sign_cap(ctx) {
            return Err(ActivityError::SignCountLimit);
        }

        self.progress.signed_day += 1;
        self.progress.last_sign_time = ctx.now;

        info!(
            player_id = ctx.player.id(),
            activity_id = ctx.activity_id,
            signed_day = self.progress.signed_day,
            "signed in"
        );
        Ok(())
    }

    /// Claim the reward of signed day `day` (1-indexed).
    pub fn get_reward(&mut self, ctx: &TemplateCtx<'_>, day: u32) -> Result<()> {
        if day == 0 || day > self.progress.signed_day {
            return Err(ActivityError::NotSigned(day));
        }
        if self.progress.claimed_days.contains(&day) {
            return Err(ActivityError::SignRewardClaimed(day));
        }
        let reward = self
            .reward_for_day(day)
            .ok_or(ActivityError::SignRewardMissing(day))?;

        ctx.player.add_reward(ctx.activity_id, reward)?;
        self.progress.claimed_days.insert(day);

        info!(
            player_id = ctx.player.id(),
            activity_id = ctx.activity_id,
            day,
            "sign reward claimed"
        );
        Ok(())
    }

    /// Retroactively sign the next missed day.
    ///
    /// The repaired day is `signed_day + 1`; its rule either costs items or
    /// requires its repair tasks to be done. A day without a rule repairs for
    /// free.
    pub fn repair(&mut self, ctx: &TemplateCtx<'_>) -> Result<()> {
        if let Err(e) = self.check_repair(ctx) {
            warn!(
                player_id = ctx.player.id(),
                activity_id = ctx.activity_id,
                signed_day = self.progress.signed_day,
                error = %e,
                "repair sign rejected"
            );
            return Err(e);
        }

        let rule_index = self.progress.signed_day as usize;
        let day = self.progress.signed_day + 1;
        if let Some(rule) = self.config.repair_rules.get(rule_index) {
            if !rule.cost.is_empty() {
                ctx.player.check_cost(&rule.cost)?;
                ctx.player.sub_cost(ctx.activity_id, &rule.cost)?;
            }
        }

        self.progress.signed_day += 1;
        self.progress.repair_count += 1;
        self.progress.every_day_repair_count += 1;
        if let Some(tasks) = self.progress.repair_tasks.get_mut(rule_index) {
            for task in tasks.iter_mut() {
                task.state = TaskState::Claimed;
            }
        }

        info!(
            player_id = ctx.player.id(),
            activity_id = ctx.activity_id,
            day,
            repair_count = self.progress.repair_count,
            "repair sign succeeded"
        );
        Ok(())
    }

    fn check_repair(&self, ctx: &TemplateCtx<'_>) -> Result<()> {
        if self.progress.repair_count >= self.repair_cap(ctx) {
            return Err(ActivityError::RepairCountLimit);
        }
        if self.progress.every_day_repair_count >= self.config.every_day_repair_limit {
            return Err(ActivityError::DailyRepairCountLimit);
        }
        if self.progress.signed_day >= self.config.sign_in_count {
            return Err(ActivityError::SignCountLimit);
        }

        // Today is owed only once it has been signed normally.
        let owed = clamp_day(ctx.open_day - 1) + u32::from(self.signed_today(ctx));
        if self.progress.signed_day >= owed {
            return Err(ActivityError::NothingToRepair);
        }

        let rule_index = self.progress.signed_day as usize;
        if let Some(rule) = self.config.repair_rules.get(rule_index) {
            if rule.cost.is_empty() && !self.repair_tasks_done(rule, rule_index) {
                return Err(ActivityError::RepairTasksUnfinished(
                    self.progress.signed_day + 1,
                ));
            }
        }
        Ok(())
    }

    fn repair_tasks_done(&self, rule: &RepairRule, rule_index: usize) -> bool {
        if rule.conditions.is_empty() {
            return true;
        }
        self.progress
            .repair_tasks
            .get(rule_index)
            .is_some_and(|tasks| tasks.iter().all(|task| !task.is_doing()))
    }

    /// Returns whether the counter was non-zero.
    pub fn reset_every_day_repair_count(&mut self) -> bool {
        let changed = self.progress.every_day_repair_count != 0;
        self.progress.every_day_repair_count = 0;
        changed
    }

    fn reward_for_day(&self, day: u32) -> Option<&[ItemData]> {
        let index = usize::try_from(day.checked_sub(1)?).ok()?;
        self.config
            .rewards
            .get(index)
            .map(|reward| reward.items.as_slice())
    }
}

impl TemplateBehaviour for SignInTemplate {
    fn slot(&self) -> TemplateSlot {
        self.slot
    }

    fn kind(&self) -> TemplateKind {
        TemplateKind::SignIn
    }

    fn progress(&self) -> TemplateProgress {
        TemplateProgress::SignIn(self.progress.clone())
    }

    /// Repair-rule tasks are the only tasks a sign-in template owns.
    fn range_tasks(&mut self, f: &mut TaskPredicate<'_>) -> bool {
        let mut changed = false;
        for (rule, tasks) in self
            .config
            .repair_rules
            .iter()
            .zip(self.progress.repair_tasks.iter_mut())
        {
            if offer_tasks(&rule.conditions, tasks, f) {
                changed = true;
            }
        }
        changed
    }

    fn claimable_rewards(&self) -> Vec<ItemData> {
        (1..=self.progress.signed_day)
            .filter(|day| !self.progress.claimed_days.contains(day))
            .filter_map(|day| self.reward_for_day(day))
            .flat_map(|items| items.iter().copied())
            .collect()
    }

    fn reset_tasks(&mut self, refresh: RefreshType, unclaimed: &mut Vec<ItemData>) -> bool {
        let mut changed = false;
        for (rule, tasks) in self
            .config
            .repair_rules
            .iter()
            .zip(self.progress.repair_tasks.iter_mut())
        {
            if reset_task_list(&rule.conditions, tasks, refresh, unclaimed) {
                changed = true;
            }
        }
        changed
    }
}

fn clamp_day(day: i64) -> u32 {
    u32::try_from(day.max(0)).unwrap_or(u32::MAX)
}
