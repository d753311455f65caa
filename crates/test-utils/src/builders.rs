#![allow(dead_code)]

use opactivity::config::{
    ActivityConfig, ConditionConfig, ConditionTemplateConfig, DayTemplates, GoodsConfig,
    RepairRule, ScoreEntry, ShopConfig, SignInConfig, SignInReward, TemplateConfig,
};
use opactivity::types::{ActivityId, AreaId, ChannelId, ItemData, RefreshType, TimeMode};

pub const DAY: i64 = 86_400;
pub const HOUR: i64 = 3_600;

/// Builder for `ActivityConfig` to simplify test setup.
///
/// Defaults to an absolute-time activity with an empty window at 0 and no
/// templates.
pub struct ActivityConfigBuilder {
    config: ActivityConfig,
}

impl ActivityConfigBuilder {
    pub fn new(id: ActivityId) -> Self {
        Self {
            config: ActivityConfig {
                id,
                name: format!("activity-{id}"),
                time_mode: TimeMode::Absolute,
                prediction_time: 0,
                start_time: 0,
                end_time: 0,
                close_time: 0,
                areas: Vec::new(),
                channels: Vec::new(),
                nested: false,
                need_all_pre_conditions_finished: false,
                pre_conditions: Vec::new(),
                score_system: Vec::new(),
                days: Vec::new(),
            },
        }
    }

    pub fn time_mode(mut self, mode: TimeMode) -> Self {
        self.config.time_mode = mode;
        self
    }

    /// Window with prediction == start.
    pub fn window(mut self, start: i64, end: i64, close: i64) -> Self {
        self.config.prediction_time = start;
        self.config.start_time = start;
        self.config.end_time = end;
        self.config.close_time = close;
        self
    }

    pub fn prediction(mut self, prediction: i64) -> Self {
        self.config.prediction_time = prediction;
        self
    }

    pub fn areas(mut self, areas: &[AreaId]) -> Self {
        self.config.areas = areas.to_vec();
        self
    }

    pub fn channels(mut self, channels: &[ChannelId]) -> Self {
        self.config.channels = channels.to_vec();
        self
    }

    pub fn nested(mut self, nested: bool) -> Self {
        self.config.nested = nested;
        self
    }

    pub fn pre_condition(mut self, condition: ConditionConfig) -> Self {
        self.config.pre_conditions.push(condition);
        self
    }

    pub fn need_all_pre_conditions(mut self, need_all: bool) -> Self {
        self.config.need_all_pre_conditions_finished = need_all;
        self
    }

    pub fn score(mut self, score: ItemData, rewards: &[ItemData]) -> Self {
        self.config.score_system.push(ScoreEntry {
            score,
            rewards: rewards.to_vec(),
        });
        self
    }

    /// Append `template` to day `day`, creating the day if needed.
    pub fn template(mut self, day: u32, template: TemplateConfig) -> Self {
        match self.config.days.iter_mut().find(|d| d.day == day) {
            Some(existing) => existing.templates.push(template),
            None => self.config.days.push(DayTemplates {
                day,
                templates: vec![template],
            }),
        }
        self
    }

    pub fn build(self) -> ActivityConfig {
        self.config
    }
}

/// Builder for `ConditionConfig`.
pub struct ConditionBuilder {
    condition: ConditionConfig,
}

impl ConditionBuilder {
    pub fn new(id: i32) -> Self {
        Self {
            condition: ConditionConfig {
                id,
                kind: "count".to_string(),
                params: Vec::new(),
                target: 1,
                refresh: RefreshType::None,
                rewards: Vec::new(),
            },
        }
    }

    pub fn kind(mut self, kind: &str) -> Self {
        self.condition.kind = kind.to_string();
        self
    }

    pub fn target(mut self, target: i64) -> Self {
        self.condition.target = target;
        self
    }

    pub fn refresh(mut self, refresh: RefreshType) -> Self {
        self.condition.refresh = refresh;
        self
    }

    pub fn reward(mut self, id: i32, num: i64) -> Self {
        self.condition.rewards.push(ItemData::new(id, num));
        self
    }

    pub fn build(self) -> ConditionConfig {
        self.condition
    }
}

pub fn condition_template(tasks: Vec<ConditionConfig>) -> TemplateConfig {
    TemplateConfig::Condition(ConditionTemplateConfig { tasks })
}

/// Builder for `SignInConfig`.
pub struct SignInConfigBuilder {
    config: SignInConfig,
}

impl SignInConfigBuilder {
    pub fn new(sign_in_count: u32) -> Self {
        Self {
            config: SignInConfig {
                sign_in_count,
                login_trigger: false,
                rewards: Vec::new(),
                repair_sign_in_count: 0,
                every_day_repair_limit: 0,
                repair_rules: Vec::new(),
            },
        }
    }

    pub fn login_trigger(mut self, login_trigger: bool) -> Self {
        self.config.login_trigger = login_trigger;
        self
    }

    /// One reward per day: day `n` gives `num * n` of item `id`.
    pub fn daily_rewards(mut self, id: i32, num: i64) -> Self {
        self.config.rewards = (1..=i64::from(self.config.sign_in_count))
            .map(|day| SignInReward {
                items: vec![ItemData::new(id, num * day)],
            })
            .collect();
        self
    }

    pub fn repair_limits(mut self, total: u32, per_day: u32) -> Self {
        self.config.repair_sign_in_count = total;
        self.config.every_day_repair_limit = per_day;
        self
    }

    pub fn repair_cost(mut self, cost: &[ItemData]) -> Self {
        self.config.repair_rules.push(RepairRule {
            cost: cost.to_vec(),
            conditions: Vec::new(),
        });
        self
    }

    pub fn repair_conditions(mut self, conditions: Vec<ConditionConfig>) -> Self {
        self.config.repair_rules.push(RepairRule {
            cost: Vec::new(),
            conditions,
        });
        self
    }

    pub fn build(self) -> TemplateConfig {
        TemplateConfig::SignIn(self.config)
    }
}

/// Builder for `ShopConfig`.
pub struct ShopConfigBuilder {
    config: ShopConfig,
}

impl ShopConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ShopConfig { goods: Vec::new() },
        }
    }

    pub fn goods(
        mut self,
        items: &[ItemData],
        cost: &[ItemData],
        discount: u32,
        limit: Option<u32>,
    ) -> Self {
        self.config.goods.push(GoodsConfig {
            items: items.to_vec(),
            cost: cost.to_vec(),
            discount,
            is_limit: limit.is_some(),
            limit_count: limit.unwrap_or(0),
        });
        self
    }

    pub fn build(self) -> TemplateConfig {
        TemplateConfig::Shop(self.config)
    }
}

impl Default for ShopConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
