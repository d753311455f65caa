// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Variants are grouped the way callers need to react to them:
//! configuration problems make one activity unusable, state and business-rule
//! errors go back to the player command that caused them, and host callback
//! failures abort the command before any progress is mutated.

use thiserror::Error;

use crate::types::{ActivityId, TemplateKind};

#[derive(Error, Debug)]
pub enum ActivityError {
    // -- configuration -----------------------------------------------------
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("activity {0} has an unknown time mode")]
    UnknownTimeMode(ActivityId),

    #[error("activity {activity_id} resolves to an unordered time window: {detail}")]
    InvalidTimeWindow {
        activity_id: ActivityId,
        detail: String,
    },

    #[error("no constructor registered for template kind {0:?}")]
    UnregisteredTemplate(TemplateKind),

    #[error("activity {0} already exists in the registry")]
    ActivityExists(ActivityId),

    // -- state -------------------------------------------------------------
    #[error("activity not exist: {0}")]
    ActivityNotExist(ActivityId),

    #[error("template not exist: activity {activity_id}, index {index}")]
    TemplateNotExist { activity_id: ActivityId, index: usize },

    #[error("activity {0} is not open")]
    NotOpen(ActivityId),

    #[error("activity {0} pre-conditions are not satisfied")]
    PreConditionUnmet(ActivityId),

    // -- business rules ----------------------------------------------------
    #[error("sign trigger mismatch: template is signed automatically on login")]
    SignTriggerMismatch,

    #[error("today signed")]
    TodaySigned,

    #[error("sign count limit")]
    SignCountLimit,

    #[error("day {0} not signed")]
    NotSigned(u32),

    #[error("sign reward for day {0} already claimed")]
    SignRewardClaimed(u32),

    #[error("no sign reward configured for day {0}")]
    SignRewardMissing(u32),

    #[error("repair sign count limit")]
    RepairCountLimit,

    #[error("every day repair sign count limit")]
    DailyRepairCountLimit,

    #[error("repair condition task not finished for day {0}")]
    RepairTasksUnfinished(u32),

    #[error("no missed day to repair")]
    NothingToRepair,

    #[error("task {0} not exist")]
    TaskNotExist(usize),

    #[error("task {0} is not in finished state")]
    TaskNotFinished(usize),

    #[error("goods {0} not exist")]
    GoodsNotExist(usize),

    #[error("goods {0} purchase limit reached")]
    GoodsLimit(usize),

    #[error("score entry {0} not exist")]
    ScoreEntryNotExist(usize),

    #[error("score reward {0} already claimed")]
    ScoreRewardClaimed(usize),

    // -- host / io ---------------------------------------------------------
    #[error("host callback failed: {0}")]
    HostCallback(#[from] anyhow::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ActivityError>;
