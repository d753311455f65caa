// src/player/manager.rs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::activity::{ActivityInstance, ActivityView};
use crate::config::{ActivityConfig, ConditionConfig};
use crate::errors::{ActivityError, Result};
use crate::player::{PlayerCapability, PlayerProfile, ProgressSink, rollover};
use crate::progress::{ActivityProgress, ProgressChange, ProgressDiff, TaskProgress};
use crate::registry::ActivityRegistry;
use crate::template::{
    ConditionTemplate, ShopTemplate, SignInTemplate, Template, TemplateBehaviour, TemplateCtx,
    TemplateTable,
};
use crate::time::{ResolvedWindow, TimePolicy, resolve_window};
use crate::types::{ActivityId, PlayerId, RefreshType};

/// Which state an instance must be in for a command to run.
#[derive(Debug, Clone, Copy)]
enum Gate {
    /// Progress-mutating commands: open only.
    Progress,
    /// Reward claims: open or closed-but-claimable.
    Claim,
}

impl Gate {
    fn check(self, instance: &ActivityInstance, now: i64) -> Result<()> {
        match self {
            Gate::Progress => instance.invalid(now),
            Gate::Claim => instance.check_claimable(now),
        }
    }
}

/// All activity instances of one player plus the command surface over them.
///
/// Not shared between threads: the host serializes access per player.
pub struct PlayerActivityManager {
    player: Arc<dyn PlayerCapability>,
    profile: PlayerProfile,
    registry: Arc<ActivityRegistry>,
    sink: Arc<dyn ProgressSink>,
    table: TemplateTable,
    activities: BTreeMap<ActivityId, ActivityInstance>,
}

impl fmt::Debug for PlayerActivityManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerActivityManager")
            .field("player_id", &self.player.id())
            .field("profile", &self.profile)
            .field("activities", &self.activities.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PlayerActivityManager {
    pub fn new(
        player: Arc<dyn PlayerCapability>,
        profile: PlayerProfile,
        registry: Arc<ActivityRegistry>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            player,
            profile,
            registry,
            sink,
            table: TemplateTable::default(),
            activities: BTreeMap::new(),
        }
    }

    /// Replace the template constructor table.
    pub fn with_table(mut self, table: TemplateTable) -> Self {
        self.table = table;
        self
    }

    pub fn player_id(&self) -> PlayerId {
        self.player.id()
    }

    pub fn profile(&self) -> PlayerProfile {
        self.profile
    }

    /// Restore persisted progress, then sync with the registry.
    ///
    /// Saved records whose activity is gone or unusable are reported as
    /// `Delete` so the host can drop them.
    pub fn init_data(&mut self, saved: Vec<ActivityProgress>) {
        for progress in saved {
            let activity_id = progress.activity_id;
            let Some(config) = self.registry.get(activity_id) else {
                info!(
                    player_id = self.player_id(),
                    activity_id, "saved activity no longer registered"
                );
                self.emit(activity_id, ProgressChange::Delete);
                continue;
            };

            let restored = self.resolve(&config).and_then(|window| {
                ActivityInstance::new(Arc::clone(&config), window, Some(progress), &self.table)
            });
            match restored {
                Ok(instance) => {
                    self.activities.insert(activity_id, instance);
                }
                Err(e) => {
                    warn!(
                        player_id = self.player_id(),
                        activity_id,
                        error = %e,
                        "dropping saved activity"
                    );
                    self.emit(activity_id, ProgressChange::Delete);
                }
            }
        }
        self.check_new_and_delete();
    }

    /// Periodic sync: tear down withdrawn or closed instances, then add every
    /// newly eligible registry entry.
    pub fn check_new_and_delete(&mut self) {
        self.check_delete();
        self.check_new();
    }

    fn check_delete(&mut self) {
        let now = self.registry.now();
        let stale: Vec<ActivityId> = self
            .activities
            .iter()
            .filter(|(id, instance)| instance.is_expire(now) || self.registry.get(**id).is_none())
            .map(|(id, _)| *id)
            .collect();
        for activity_id in stale {
            self.remove_instance(activity_id);
        }
    }

    fn check_new(&mut self) {
        let mut fresh = Vec::new();
        self.registry.range_all(|config| {
            if !self.activities.contains_key(&config.id) {
                fresh.push(Arc::clone(config));
            }
        });
        for config in fresh {
            self.add(config);
        }
    }

    /// Evaluate one config for this player and instantiate it when eligible.
    pub fn add(&mut self, config: Arc<ActivityConfig>) -> bool {
        let activity_id = config.id;
        if self.activities.contains_key(&activity_id) {
            return false;
        }
        let Some(window) = self.eligible_window(&config) else {
            return false;
        };

        let instance = match ActivityInstance::new(config, window, None, &self.table) {
            Ok(instance) => instance,
            Err(e) => {
                warn!(
                    player_id = self.player_id(),
                    activity_id,
                    error = %e,
                    "cannot build activity"
                );
                return false;
            }
        };
        let snapshot = instance.snapshot();
        self.activities.insert(activity_id, instance);

        info!(player_id = self.player_id(), activity_id, "activity added for player");
        self.emit(activity_id, ProgressChange::Add(snapshot));
        true
    }

    /// Tear down an instance, mailing whatever is still claimable.
    ///
    /// Returns `false` without notifying when the player has no such
    /// instance.
    pub fn delete(&mut self, activity_id: ActivityId) -> bool {
        if !self.activities.contains_key(&activity_id) {
            return false;
        }
        self.remove_instance(activity_id);
        true
    }

    fn remove_instance(&mut self, activity_id: ActivityId) {
        let Some(instance) = self.activities.remove(&activity_id) else {
            return;
        };

        let rewards = instance.claimable_rewards(self.player.as_ref());
        if !rewards.is_empty() {
            if let Err(e) = self.player.send_mail(activity_id, &rewards) {
                warn!(
                    player_id = self.player_id(),
                    activity_id,
                    error = %e,
                    "failed to mail unclaimed rewards"
                );
            }
        }

        info!(player_id = self.player_id(), activity_id, "activity deleted for player");
        self.emit(activity_id, ProgressChange::Delete);
    }

    fn eligible_window(&self, config: &ActivityConfig) -> Option<ResolvedWindow> {
        if !config.accepts_area(self.profile.area_id) {
            return None;
        }
        if !config.accepts_channel(self.profile.channel) {
            return None;
        }
        let window = self.resolve(config).ok()?;
        let now = self.registry.now();
        if !window.is_visible(now) || window.is_expired(now) {
            debug!(
                player_id = self.player_id(),
                activity_id = config.id,
                now,
                ?window,
                "activity not visible yet or already closed"
            );
            return None;
        }
        Some(window)
    }

    fn resolve(&self, config: &ActivityConfig) -> Result<ResolvedWindow> {
        resolve_window(
            config,
            self.profile.register_time,
            self.profile.area_id,
            |area| self.registry.area_open_time(area),
        )
    }

    fn moment(&self) -> (i64, TimePolicy) {
        (self.registry.now(), self.registry.time_policy())
    }

    fn emit(&self, activity_id: ActivityId, change: ProgressChange) {
        self.sink.on_change(self.player.id(), activity_id, change);
    }

    fn emit_updates(&self, diffs: Vec<ProgressDiff>) {
        for diff in diffs {
            let activity_id = diff.activity_id;
            self.emit(activity_id, ProgressChange::Update(diff));
        }
    }

    /// Run `f` against template `index` of `activity_id` and persist its diff
    /// on success.
    fn with_template<T>(
        &mut self,
        activity_id: ActivityId,
        index: usize,
        gate: Gate,
        f: impl FnOnce(&mut Template, &TemplateCtx<'_>) -> Result<T>,
    ) -> Result<T> {
        let (now, policy) = self.moment();
        let instance = self
            .activities
            .get_mut(&activity_id)
            .ok_or(ActivityError::ActivityNotExist(activity_id))?;
        if let Err(e) = gate.check(instance, now) {
            warn!(
                player_id = self.player.id(),
                activity_id,
                error = %e,
                "activity unavailable"
            );
            return Err(e);
        }

        let ctx = instance.ctx(self.player.as_ref(), now, policy);
        let template = instance.template_mut(ctx.open_day, index)?;
        let out = f(template, &ctx)?;
        let diff = template.diff(activity_id);

        self.emit(activity_id, ProgressChange::Update(diff));
        Ok(out)
    }

    pub fn sign(&mut self, activity_id: ActivityId, index: usize) -> Result<()> {
        self.with_template(activity_id, index, Gate::Progress, |template, ctx| {
            let sign_in = as_sign_in(template, activity_id, index)?;
            if sign_in.is_login_trigger() {
                return Err(ActivityError::SignTriggerMismatch);
            }
            sign_in.sign(ctx)
        })
    }

    pub fn sign_get_reward(
        &mut self,
        activity_id: ActivityId,
        index: usize,
        day: u32,
    ) -> Result<()> {
        self.with_template(activity_id, index, Gate::Claim, |template, ctx| {
            as_sign_in(template, activity_id, index)?.get_reward(ctx, day)
        })
    }

    pub fn sign_repair(&mut self, activity_id: ActivityId, index: usize) -> Result<()> {
        self.with_template(activity_id, index, Gate::Progress, |template, ctx| {
            as_sign_in(template, activity_id, index)?.repair(ctx)
        })
    }

    pub fn get_task_reward(
        &mut self,
        activity_id: ActivityId,
        index: usize,
        task_index: usize,
    ) -> Result<()> {
        self.with_template(activity_id, index, Gate::Claim, |template, ctx| {
            as_condition(template, activity_id, index)?.finish_task(ctx, task_index)
        })
    }

    pub fn shop_buy_goods(
        &mut self,
        activity_id: ActivityId,
        index: usize,
        goods_index: usize,
    ) -> Result<()> {
        self.with_template(activity_id, index, Gate::Progress, |template, ctx| {
            as_shop(template, activity_id, index)?.buy(ctx, goods_index)
        })
    }

    pub fn get_score_reward(&mut self, activity_id: ActivityId, score_index: usize) -> Result<()> {
        let now = self.registry.now();
        let instance = self
            .activities
            .get_mut(&activity_id)
            .ok_or(ActivityError::ActivityNotExist(activity_id))?;
        instance.check_claimable(now)?;
        instance.get_score_reward(self.player.as_ref(), score_index)?;
        let diff = instance.header_diff();

        info!(
            player_id = self.player.id(),
            activity_id, score_index, "score reward claimed"
        );
        self.emit(activity_id, ProgressChange::Update(diff));
        Ok(())
    }

    /// Auto-sign every open login-triggered sign-in template.
    pub fn login(&mut self) {
        let (now, policy) = self.moment();
        let mut diffs = Vec::new();
        for instance in self.activities.values_mut() {
            if instance.invalid(now).is_err() {
                continue;
            }
            let ctx = instance.ctx(self.player.as_ref(), now, policy);
            if let Some(diff) = instance.auto_sign(&ctx) {
                diffs.push(diff);
            }
        }
        self.emit_updates(diffs);
    }

    /// Offer every task of every instance to the host predicate `f`.
    ///
    /// Pre-condition tasks are always offered; template tasks only while the
    /// instance is open. `f` returns `true` when it changed the task.
    pub fn trigger_condition<F>(&mut self, mut f: F)
    where
        F: FnMut(&ConditionConfig, &mut TaskProgress) -> bool,
    {
        let (now, policy) = self.moment();
        let diffs: Vec<ProgressDiff> = self
            .activities
            .values_mut()
            .filter_map(|instance| instance.range_all_conditions(now, policy, &mut f))
            .collect();
        self.emit_updates(diffs);
    }

    pub fn on_new_day(&mut self) {
        let mut diffs = rollover::reset_tasks_by_refresh(
            &mut self.activities,
            self.player.as_ref(),
            RefreshType::Day,
        );
        diffs.extend(rollover::reset_daily_repair_counts(&mut self.activities));
        self.emit_updates(diffs);
        self.login();
    }

    pub fn on_new_week(&mut self) {
        let diffs = rollover::reset_tasks_by_refresh(
            &mut self.activities,
            self.player.as_ref(),
            RefreshType::Week,
        );
        self.emit_updates(diffs);
    }

    pub fn on_new_month(&mut self) {
        let diffs = rollover::reset_tasks_by_refresh(
            &mut self.activities,
            self.player.as_ref(),
            RefreshType::Month,
        );
        self.emit_updates(diffs);
    }

    /// Views of every instance that has not expired yet.
    pub fn pack_all_open_activity(&self) -> Vec<ActivityView> {
        let (now, policy) = self.moment();
        self.activities
            .values()
            .filter(|instance| !instance.is_expire(now))
            .map(|instance| instance.view(now, policy))
            .collect()
    }

    pub fn pack_one_activity(&self, activity_id: ActivityId) -> Option<ActivityView> {
        let (now, policy) = self.moment();
        self.activities
            .get(&activity_id)
            .map(|instance| instance.view(now, policy))
    }

    pub fn activity_ids(&self) -> Vec<ActivityId> {
        self.activities.keys().copied().collect()
    }

    pub fn instance(&self, activity_id: ActivityId) -> Option<&ActivityInstance> {
        self.activities.get(&activity_id)
    }
}

fn as_sign_in(
    template: &mut Template,
    activity_id: ActivityId,
    index: usize,
) -> Result<&mut SignInTemplate> {
    template
        .as_sign_in_mut()
        .ok_or(ActivityError::TemplateNotExist { activity_id, index })
}

fn as_condition(
    template: &mut Template,
    activity_id: ActivityId,
    index: usize,
) -> Result<&mut ConditionTemplate> {
    template
        .as_condition_mut()
        .ok_or(ActivityError::TemplateNotExist { activity_id, index })
}

fn as_shop(
    template: &mut Template,
    activity_id: ActivityId,
    index: usize,
) -> Result<&mut ShopTemplate> {
    template
        .as_shop_mut()
        .ok_or(ActivityError::TemplateNotExist { activity_id, index })
}
