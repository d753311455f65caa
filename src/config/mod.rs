// src/config/mod.rs

//! Activity configuration as supplied by operations tooling.
//!
//! Responsibilities:
//! - Define the serde-backed data model (`model.rs`).
//! - Load a host config file from disk (`loader.rs`).
//! - Validate activities before they reach the registry (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_from_str};
pub use model::{
    ActivityConfig, ConditionConfig, ConditionTemplateConfig, ConfigFile, DayTemplates,
    EngineSection, GoodsConfig, PlayerSeed, RawConfigFile, RepairRule, ScoreEntry, ShopConfig,
    SignInConfig, SignInReward, TemplateConfig,
};
pub use validate::validate_activity;
