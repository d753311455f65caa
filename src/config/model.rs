// src/config/model.rs

use serde::{Deserialize, Serialize};

use crate::time::TimePolicy;
use crate::types::{
    ActivityId, AreaId, ChannelId, ItemData, PlayerId, RefreshType, TemplateKind, TimeMode,
};

/// Top-level host configuration as read from a TOML file.
///
/// ```toml
/// [engine]
/// timezone_offset_hours = 8
/// daily_rollover_hour = 5
///
/// [[player]]
/// id = 1
/// area_id = 101
///
/// [[activity]]
/// id = 1
/// time_mode = "register_relative"
/// start_time = 0
/// end_time = 604800
/// close_time = 864000
///
/// [[activity.day]]
/// day = 1
///
/// [[activity.day.template]]
/// type = "sign_in"
/// sign_in_count = 7
/// ```
///
/// Only `[[activity]]` entries are meaningful to the engine itself; `[engine]`
/// and `[[player]]` drive the bundled host simulator.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub player: Vec<PlayerSeed>,

    #[serde(default)]
    pub activity: Vec<ActivityConfig>,
}

/// Validated configuration. Build it through `ConfigFile::try_from`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub engine: EngineSection,
    pub player: Vec<PlayerSeed>,
    pub activity: Vec<ActivityConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        engine: EngineSection,
        player: Vec<PlayerSeed>,
        activity: Vec<ActivityConfig>,
    ) -> Self {
        Self {
            engine,
            player,
            activity,
        }
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// Hours east of UTC used for day boundaries.
    #[serde(default = "default_timezone_offset_hours")]
    pub timezone_offset_hours: i32,

    /// Local hour at which a new game day starts.
    #[serde(default = "default_daily_rollover_hour")]
    pub daily_rollover_hour: i32,

    /// Period of the simulator's check-new/check-delete sweep.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_timezone_offset_hours() -> i32 {
    TimePolicy::default().timezone_offset_hours
}

fn default_daily_rollover_hour() -> i32 {
    TimePolicy::default().daily_rollover_hour
}

fn default_tick_interval_ms() -> u64 {
    1000
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            timezone_offset_hours: default_timezone_offset_hours(),
            daily_rollover_hour: default_daily_rollover_hour(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl EngineSection {
    pub fn time_policy(&self) -> TimePolicy {
        TimePolicy::new(self.timezone_offset_hours, self.daily_rollover_hour)
    }
}

/// `[[player]]` section: a simulated player for the host binary.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSeed {
    pub id: PlayerId,
    #[serde(default)]
    pub area_id: AreaId,
    #[serde(default)]
    pub channel: ChannelId,
    /// Registration time; `None` means "registered when the simulator starts".
    #[serde(default)]
    pub register_time: Option<i64>,
    /// Starting inventory.
    #[serde(default, rename = "item")]
    pub items: Vec<ItemData>,
}

/// One operational activity as configured by operations tooling.
///
/// Time fields are absolute timestamps or offsets depending on `time_mode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityConfig {
    pub id: ActivityId,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub time_mode: TimeMode,

    #[serde(default)]
    pub prediction_time: i64,
    pub start_time: i64,
    pub end_time: i64,
    pub close_time: i64,

    /// Areas the activity applies to; empty means all.
    #[serde(default)]
    pub areas: Vec<AreaId>,

    /// Channels the activity applies to; empty means all.
    #[serde(default)]
    pub channels: Vec<ChannelId>,

    /// Templates are scoped per day since start; only the current day's set is
    /// exposed.
    #[serde(default)]
    pub nested: bool,

    /// `true`: every pre-condition must complete. `false`: any one suffices.
    #[serde(default)]
    pub need_all_pre_conditions_finished: bool,

    #[serde(default, rename = "pre_condition")]
    pub pre_conditions: Vec<ConditionConfig>,

    #[serde(default, rename = "score")]
    pub score_system: Vec<ScoreEntry>,

    #[serde(default, rename = "day")]
    pub days: Vec<DayTemplates>,
}

impl ActivityConfig {
    pub fn is_absolute(&self) -> bool {
        self.time_mode == TimeMode::Absolute
    }

    pub fn accepts_area(&self, area: AreaId) -> bool {
        self.areas.is_empty() || self.areas.contains(&area)
    }

    pub fn accepts_channel(&self, channel: ChannelId) -> bool {
        self.channels.is_empty() || self.channels.contains(&channel)
    }
}

/// Templates of one day (`day` is 1-indexed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTemplates {
    pub day: u32,
    #[serde(default, rename = "template")]
    pub templates: Vec<TemplateConfig>,
}

/// Per-template configuration, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateConfig {
    Condition(ConditionTemplateConfig),
    SignIn(SignInConfig),
    Shop(ShopConfig),
}

impl TemplateConfig {
    pub fn kind(&self) -> TemplateKind {
        match self {
            TemplateConfig::Condition(_) => TemplateKind::Condition,
            TemplateConfig::SignIn(_) => TemplateKind::SignIn,
            TemplateConfig::Shop(_) => TemplateKind::Shop,
        }
    }
}

/// One task definition. `kind`/`params`/`target` are opaque to the engine and
/// interpreted by the host's trigger predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionConfig {
    pub id: i32,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub params: Vec<i64>,
    #[serde(default)]
    pub target: i64,
    #[serde(default)]
    pub refresh: RefreshType,
    #[serde(default, rename = "reward")]
    pub rewards: Vec<ItemData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionTemplateConfig {
    #[serde(default, rename = "task")]
    pub tasks: Vec<ConditionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignInConfig {
    /// Maximum number of signed days.
    pub sign_in_count: u32,

    /// Signed automatically on login / new day instead of by explicit command.
    #[serde(default)]
    pub login_trigger: bool,

    /// Reward per signed day; entry `n - 1` belongs to day `n`.
    #[serde(default, rename = "reward")]
    pub rewards: Vec<SignInReward>,

    /// Total number of repairs over the activity's lifetime.
    #[serde(default)]
    pub repair_sign_in_count: u32,

    /// Number of repairs allowed per game day.
    #[serde(default)]
    pub every_day_repair_limit: u32,

    /// Rule for repairing day `n` is entry `n - 1`; days without a rule repair
    /// unconditionally.
    #[serde(default, rename = "repair_rule")]
    pub repair_rules: Vec<RepairRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignInReward {
    #[serde(default, rename = "item")]
    pub items: Vec<ItemData>,
}

/// Precondition for repairing one day: an item cost, or a set of tasks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RepairRule {
    #[serde(default)]
    pub cost: Vec<ItemData>,
    #[serde(default, rename = "condition")]
    pub conditions: Vec<ConditionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopConfig {
    #[serde(default)]
    pub goods: Vec<GoodsConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodsConfig {
    /// Items credited per purchase.
    #[serde(default, rename = "item")]
    pub items: Vec<ItemData>,

    /// Undiscounted price.
    #[serde(default)]
    pub cost: Vec<ItemData>,

    /// Percentage of `cost` actually charged.
    #[serde(default = "default_discount")]
    pub discount: u32,

    #[serde(default)]
    pub is_limit: bool,

    #[serde(default)]
    pub limit_count: u32,
}

fn default_discount() -> u32 {
    100
}

impl GoodsConfig {
    pub fn discounted_cost(&self) -> Vec<ItemData> {
        self.cost
            .iter()
            .map(|item| ItemData::new(item.id, item.num * i64::from(self.discount) / 100))
            .collect()
    }
}

/// Score threshold and its reward. The score is checked, never debited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub score: ItemData,
    #[serde(default, rename = "reward")]
    pub rewards: Vec<ItemData>,
}
