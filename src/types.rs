use serde::{Deserialize, Serialize};

pub type ActivityId = i64;
pub type PlayerId = i32;
pub type AreaId = i32;
pub type ChannelId = i32;

/// One stack of items: a reward, a cost, or a goods entry.
///
/// The engine never interprets item ids; it only hands lists of these to the
/// host's cost/reward callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemData {
    pub id: i32,
    pub num: i64,
}

impl ItemData {
    pub fn new(id: i32, num: i64) -> Self {
        Self { id, num }
    }
}

/// How an activity's raw time fields are anchored.
///
/// - `Absolute`: fields are unix timestamps already.
/// - `RegisterRelative`: offsets from the player's registration time.
/// - `ServerOpenRelative`: offsets from the player's area (server) open time.
///
/// Any other value in a config file deserializes to `Unknown`, which the time
/// resolver rejects for every player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMode {
    Absolute,
    RegisterRelative,
    ServerOpenRelative,
    #[serde(other)]
    Unknown,
}

impl Default for TimeMode {
    fn default() -> Self {
        TimeMode::Absolute
    }
}

/// Closed set of template variants an activity can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Condition,
    SignIn,
    Shop,
}

/// Lifecycle of one task (a condition, a pre-condition or a repair condition).
///
/// `Doing -> Finished` is driven by host trigger predicates, `Finished ->
/// Claimed` by a reward claim (or a sign-in repair settling the day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Doing,
    Finished,
    Claimed,
}

impl Default for TaskState {
    fn default() -> Self {
        TaskState::Doing
    }
}

/// When a task's progress is wiped by the rollover hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshType {
    None,
    Day,
    Week,
    Month,
}

impl Default for RefreshType {
    fn default() -> Self {
        RefreshType::None
    }
}

/// Kind of change reported to registry listeners and progress sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataCmd {
    Add,
    Update,
    Delete,
}
