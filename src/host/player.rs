// src/host/player.rs

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use anyhow::{Result, bail};
use tracing::info;

use crate::config::PlayerSeed;
use crate::player::PlayerCapability;
use crate::types::{ActivityId, ItemData, PlayerId};

/// Player backed by an in-memory item bag and mailbox.
#[derive(Debug, Default)]
pub struct SimulatedPlayer {
    id: PlayerId,
    bag: Mutex<BTreeMap<i32, i64>>,
    mailbox: Mutex<Vec<(ActivityId, Vec<ItemData>)>>,
}

impl SimulatedPlayer {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn from_seed(seed: &PlayerSeed) -> Self {
        let player = Self::new(seed.id);
        player.grant(&seed.items);
        player
    }

    pub fn item_count(&self, item_id: i32) -> i64 {
        self.bag
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&item_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn mailbox(&self) -> Vec<(ActivityId, Vec<ItemData>)> {
        self.mailbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn grant(&self, items: &[ItemData]) {
        let mut bag = self.bag.lock().unwrap_or_else(PoisonError::into_inner);
        for item in items {
            *bag.entry(item.id).or_insert(0) += item.num;
        }
    }
}

impl PlayerCapability for SimulatedPlayer {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn check_cost(&self, items: &[ItemData]) -> Result<()> {
        let bag = self.bag.lock().unwrap_or_else(PoisonError::into_inner);
        for item in items {
            let have = bag.get(&item.id).copied().unwrap_or(0);
            if have < item.num {
                bail!("item {} not enough: have {have}, need {}", item.id, item.num);
            }
        }
        Ok(())
    }

    fn add_reward(&self, activity_id: ActivityId, items: &[ItemData]) -> Result<()> {
        self.grant(items);
        info!(player_id = self.id, activity_id, ?items, "reward granted");
        Ok(())
    }

    fn sub_cost(&self, activity_id: ActivityId, items: &[ItemData]) -> Result<()> {
        self.check_cost(items)?;
        let mut bag = self.bag.lock().unwrap_or_else(PoisonError::into_inner);
        for item in items {
            *bag.entry(item.id).or_insert(0) -= item.num;
        }
        info!(player_id = self.id, activity_id, ?items, "cost deducted");
        Ok(())
    }

    fn send_mail(&self, activity_id: ActivityId, items: &[ItemData]) -> Result<()> {
        self.mailbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((activity_id, items.to_vec()));
        info!(player_id = self.id, activity_id, ?items, "rewards mailed");
        Ok(())
    }
}
