// src/template/shop.rs

use tracing::info;

use crate::config::ShopConfig;
use crate::errors::{ActivityError, Result};
use crate::progress::{ShopProgress, TemplateProgress};
use crate::template::{TemplateBehaviour, TemplateCtx, TemplateSlot};
use crate::types::{ItemData, TemplateKind};

#[derive(Debug, Clone)]
pub struct ShopTemplate {
    slot: TemplateSlot,
    config: ShopConfig,
    progress: ShopProgress,
}

impl ShopTemplate {
    pub fn new(slot: TemplateSlot, config: ShopConfig, progress: Option<ShopProgress>) -> Self {
        Self {
            slot,
            config,
            progress: progress.unwrap_or_default(),
        }
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }

    pub fn state(&self) -> &ShopProgress {
        &self.progress
    }

    /// Buy one unit of `goods_index`.
    ///
    /// Order matters: limit, affordability, debit, credit, and only then the
    /// counter. Any host failure leaves the counter untouched.
    pub fn buy(&mut self, ctx: &TemplateCtx<'_>, goods_index: usize) -> Result<()> {
        let goods = self
            .config
            .goods
            .get(goods_index)
            .ok_or(ActivityError::GoodsNotExist(goods_index))?;

        let bought = self.progress.bought(goods_index);
        if goods.is_limit && bought >= goods.limit_count {
            return Err(ActivityError::GoodsLimit(goods_index));
        }

        let cost = goods.discounted_cost();
        ctx.player.check_cost(&cost)?;
        ctx.player.sub_cost(ctx.activity_id, &cost)?;
        ctx.player.add_reward(ctx.activity_id, &goods.items)?;

        *self.progress.buy_counts.entry(goods_index).or_insert(0) += 1;

        info!(
            player_id = ctx.player.id(),
            activity_id = ctx.activity_id,
            goods_index,
            bought = bought + 1,
            "goods bought"
        );
        Ok(())
    }
}

impl TemplateBehaviour for ShopTemplate {
    fn slot(&self) -> TemplateSlot {
        self.slot
    }

    fn kind(&self) -> TemplateKind {
        TemplateKind::Shop
    }

    fn progress(&self) -> TemplateProgress {
        TemplateProgress::Shop(self.progress.clone())
    }

    fn claimable_rewards(&self) -> Vec<ItemData> {
        Vec::new()
    }
}
