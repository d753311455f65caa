// src/player/mod.rs

//! Per-player side of the engine.
//!
//! - [`PlayerCapability`] is what the host lends the engine to touch a
//!   player's inventory and mailbox.
//! - [`ProgressSink`] receives every progress mutation for persistence and
//!   client notification.
//! - [`PlayerActivityManager`] owns one player's activity instances.

pub mod manager;
pub mod rollover;

use anyhow::Result;

use crate::progress::ProgressChange;
use crate::types::{ActivityId, AreaId, ChannelId, ItemData, PlayerId};

pub use manager::PlayerActivityManager;

/// Host capabilities the engine needs from a player.
///
/// Any failure aborts the command that triggered the call; the engine never
/// retries.
pub trait PlayerCapability: Send + Sync {
    fn id(&self) -> PlayerId;

    /// Fails if the player cannot afford `items`.
    fn check_cost(&self, items: &[ItemData]) -> Result<()>;

    fn add_reward(&self, activity_id: ActivityId, items: &[ItemData]) -> Result<()>;

    fn sub_cost(&self, activity_id: ActivityId, items: &[ItemData]) -> Result<()>;

    /// Fallback delivery for rewards the player never claimed.
    fn send_mail(&self, activity_id: ActivityId, items: &[ItemData]) -> Result<()>;
}

/// Persistence / notification callback for player-scoped progress.
pub trait ProgressSink: Send + Sync {
    fn on_change(&self, player_id: PlayerId, activity_id: ActivityId, change: ProgressChange);
}

impl<F> ProgressSink for F
where
    F: Fn(PlayerId, ActivityId, ProgressChange) + Send + Sync,
{
    fn on_change(&self, player_id: PlayerId, activity_id: ActivityId, change: ProgressChange) {
        self(player_id, activity_id, change)
    }
}

/// Player attributes used for eligibility and time resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerProfile {
    pub area_id: AreaId,
    pub channel: ChannelId,
    pub register_time: i64,
}

impl PlayerProfile {
    pub fn new(area_id: AreaId, channel: ChannelId, register_time: i64) -> Self {
        Self {
            area_id,
            channel,
            register_time,
        }
    }
}
