// src/config/validate.rs

use std::collections::HashSet;

use tracing::warn;

use crate::config::model::{ActivityConfig, ConfigFile, RawConfigFile, TemplateConfig};
use crate::errors::{ActivityError, Result};
use crate::types::TimeMode;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::ActivityError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.engine, raw.player, raw.activity))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_engine(cfg)?;
    validate_players(cfg)?;
    validate_activities(cfg)?;
    Ok(())
}

fn validate_engine(cfg: &RawConfigFile) -> Result<()> {
    let engine = &cfg.engine;
    if !(0..24).contains(&engine.daily_rollover_hour) {
        return Err(ActivityError::ConfigError(format!(
            "[engine].daily_rollover_hour must be in 0..=23 (got {})",
            engine.daily_rollover_hour
        )));
    }
    if !(-12..=14).contains(&engine.timezone_offset_hours) {
        return Err(ActivityError::ConfigError(format!(
            "[engine].timezone_offset_hours must be in -12..=14 (got {})",
            engine.timezone_offset_hours
        )));
    }
    if engine.tick_interval_ms == 0 {
        return Err(ActivityError::ConfigError(
            "[engine].tick_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_players(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for player in cfg.player.iter() {
        if !seen.insert(player.id) {
            return Err(ActivityError::ConfigError(format!(
                "duplicate [[player]] id {}",
                player.id
            )));
        }
    }
    Ok(())
}

fn validate_activities(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for activity in cfg.activity.iter() {
        if !seen.insert(activity.id) {
            return Err(ActivityError::ConfigError(format!(
                "duplicate [[activity]] id {}",
                activity.id
            )));
        }
        validate_activity(activity)?;
    }
    Ok(())
}

/// Semantic checks for a single activity.
///
/// Used both for config files and by the registry on every `add`.
pub fn validate_activity(activity: &ActivityConfig) -> Result<()> {
    let id = activity.id;

    if activity.time_mode == TimeMode::Unknown {
        // Kept: the time resolver rejects it per player.
        warn!(activity_id = id, "activity has an unknown time mode");
    } else if !(activity.prediction_time <= activity.start_time
        && activity.start_time <= activity.end_time
        && activity.end_time <= activity.close_time)
    {
        return Err(ActivityError::ConfigError(format!(
            "activity {id}: expected prediction_time <= start_time <= end_time <= close_time"
        )));
    }

    let mut days = HashSet::new();
    for day in activity.days.iter() {
        if day.day == 0 {
            return Err(ActivityError::ConfigError(format!(
                "activity {id}: template days are 1-indexed (got day 0)"
            )));
        }
        if !days.insert(day.day) {
            return Err(ActivityError::ConfigError(format!(
                "activity {id}: day {} declared twice",
                day.day
            )));
        }
        if day.templates.is_empty() {
            return Err(ActivityError::ConfigError(format!(
                "activity {id}: day {} has no templates",
                day.day
            )));
        }
        for template in day.templates.iter() {
            validate_template(id, day.day, template)?;
        }
    }

    Ok(())
}

fn validate_template(id: i64, day: u32, template: &TemplateConfig) -> Result<()> {
    match template {
        TemplateConfig::Condition(cfg) => {
            if cfg.tasks.is_empty() {
                return Err(ActivityError::ConfigError(format!(
                    "activity {id}, day {day}: condition template has no tasks"
                )));
            }
        }
        TemplateConfig::SignIn(cfg) => {
            if cfg.sign_in_count == 0 {
                return Err(ActivityError::ConfigError(format!(
                    "activity {id}, day {day}: sign_in_count must be >= 1"
                )));
            }
        }
        TemplateConfig::Shop(cfg) => {
            for (index, goods) in cfg.goods.iter().enumerate() {
                if goods.discount > 100 {
                    return Err(ActivityError::ConfigError(format!(
                        "activity {id}, day {day}: goods {index} discount must be <= 100 (got {})",
                        goods.discount
                    )));
                }
                if goods.is_limit && goods.limit_count == 0 {
                    return Err(ActivityError::ConfigError(format!(
                        "activity {id}, day {day}: goods {index} is limited but limit_count is 0"
                    )));
                }
            }
        }
    }
    Ok(())
}
