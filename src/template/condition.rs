// src/template/condition.rs

use tracing::info;

use crate::config::ConditionTemplateConfig;
use crate::errors::{ActivityError, Result};
use crate::progress::{ConditionProgress, TemplateProgress};
use crate::template::{
    TaskPredicate, TemplateBehaviour, TemplateCtx, TemplateSlot, align_tasks, offer_tasks,
    reset_task_list,
};
use crate::types::{ItemData, RefreshType, TaskState, TemplateKind};

/// Ordered list of tasks; each pays its reward once it is finished and
/// claimed.
#[derive(Debug, Clone)]
pub struct ConditionTemplate {
    slot: TemplateSlot,
    config: ConditionTemplateConfig,
    progress: ConditionProgress,
}

impl ConditionTemplate {
    pub fn new(
        slot: TemplateSlot,
        config: ConditionTemplateConfig,
        progress: Option<ConditionProgress>,
    ) -> Self {
        let mut progress = progress.unwrap_or_default();
        align_tasks(&mut progress.tasks, config.tasks.len());
        Self {
            slot,
            config,
            progress,
        }
    }

    pub fn config(&self) -> &ConditionTemplateConfig {
        &self.config
    }

    pub fn state(&self) -> &ConditionProgress {
        &self.progress
    }

    /// Claim the reward of a finished task.
    pub fn finish_task(&mut self, ctx: &TemplateCtx<'_>, task_index: usize) -> Result<()> {
        let (config, task) = self
            .config
            .tasks
            .get(task_index)
            .zip(self.progress.tasks.get_mut(task_index))
            .ok_or(ActivityError::TaskNotExist(task_index))?;

        if task.state != TaskState::Finished {
            return Err(ActivityError::TaskNotFinished(task_index));
        }

        ctx.player.add_reward(ctx.activity_id, &config.rewards)?;
        task.state = TaskState::Claimed;

        info!(
            player_id = ctx.player.id(),
            activity_id = ctx.activity_id,
            task_index,
            task_id = config.id,
            "task reward claimed"
        );
        Ok(())
    }
}

impl TemplateBehaviour for ConditionTemplate {
    fn slot(&self) -> TemplateSlot {
        self.slot
    }

    fn kind(&self) -> TemplateKind {
        TemplateKind::Condition
    }

    fn progress(&self) -> TemplateProgress {
        TemplateProgress::Condition(self.progress.clone())
    }

    fn range_tasks(&mut self, f: &mut TaskPredicate<'_>) -> bool {
        offer_tasks(&self.config.tasks, &mut self.progress.tasks, f)
    }

    fn claimable_rewards(&self) -> Vec<ItemData> {
        self.config
            .tasks
            .iter()
            .zip(self.progress.tasks.iter())
            .filter(|(_, task)| task.state == TaskState::Finished)
            .flat_map(|(config, _)| config.rewards.iter().copied())
            .collect()
    }

    fn reset_tasks(&mut self, refresh: RefreshType, unclaimed: &mut Vec<ItemData>) -> bool {
        reset_task_list(&self.config.tasks, &mut self.progress.tasks, refresh, unclaimed)
    }
}
