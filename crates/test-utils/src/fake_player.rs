use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use opactivity::player::PlayerCapability;
use opactivity::types::{ActivityId, ItemData, PlayerId};

/// In-memory `PlayerCapability` that records every call.
///
/// Clones share state, so a test can hand one clone to the manager and
/// inspect another.
#[derive(Debug, Clone, Default)]
pub struct FakePlayer {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    id: PlayerId,
    bag: Mutex<BTreeMap<i32, i64>>,
    rewards: Mutex<Vec<(ActivityId, Vec<ItemData>)>>,
    costs: Mutex<Vec<(ActivityId, Vec<ItemData>)>>,
    mails: Mutex<Vec<(ActivityId, Vec<ItemData>)>>,
    fail_add_reward: AtomicBool,
    fail_sub_cost: AtomicBool,
    fail_send_mail: AtomicBool,
}

impl FakePlayer {
    pub fn new(id: PlayerId) -> Self {
        Self {
            inner: Arc::new(Inner {
                id,
                ..Default::default()
            }),
        }
    }

    pub fn with_items(self, items: &[(i32, i64)]) -> Self {
        {
            let mut bag = self.inner.bag.lock().unwrap();
            for (id, num) in items {
                *bag.entry(*id).or_insert(0) += num;
            }
        }
        self
    }

    pub fn arc(&self) -> Arc<dyn PlayerCapability> {
        Arc::new(self.clone())
    }

    pub fn item_count(&self, item_id: i32) -> i64 {
        self.inner.bag.lock().unwrap().get(&item_id).copied().unwrap_or(0)
    }

    pub fn rewards(&self) -> Vec<(ActivityId, Vec<ItemData>)> {
        self.inner.rewards.lock().unwrap().clone()
    }

    pub fn costs(&self) -> Vec<(ActivityId, Vec<ItemData>)> {
        self.inner.costs.lock().unwrap().clone()
    }

    pub fn mails(&self) -> Vec<(ActivityId, Vec<ItemData>)> {
        self.inner.mails.lock().unwrap().clone()
    }

    /// All mailed items, flattened.
    pub fn mailed_items(&self) -> Vec<ItemData> {
        self.mails().into_iter().flat_map(|(_, items)| items).collect()
    }

    pub fn fail_add_reward(&self, fail: bool) {
        self.inner.fail_add_reward.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sub_cost(&self, fail: bool) {
        self.inner.fail_sub_cost.store(fail, Ordering::SeqCst);
    }

    pub fn fail_send_mail(&self, fail: bool) {
        self.inner.fail_send_mail.store(fail, Ordering::SeqCst);
    }
}

impl PlayerCapability for FakePlayer {
    fn id(&self) -> PlayerId {
        self.inner.id
    }

    fn check_cost(&self, items: &[ItemData]) -> Result<()> {
        let bag = self.inner.bag.lock().unwrap();
        for item in items {
            let have = bag.get(&item.id).copied().unwrap_or(0);
            if have < item.num {
                bail!("item {} not enough: have {have}, need {}", item.id, item.num);
            }
        }
        Ok(())
    }

    fn add_reward(&self, activity_id: ActivityId, items: &[ItemData]) -> Result<()> {
        if self.inner.fail_add_reward.load(Ordering::SeqCst) {
            bail!("add_reward failure injected");
        }
        {
            let mut bag = self.inner.bag.lock().unwrap();
            for item in items {
                *bag.entry(item.id).or_insert(0) += item.num;
            }
        }
        self.inner
            .rewards
            .lock()
            .unwrap()
            .push((activity_id, items.to_vec()));
        Ok(())
    }

    fn sub_cost(&self, activity_id: ActivityId, items: &[ItemData]) -> Result<()> {
        if self.inner.fail_sub_cost.load(Ordering::SeqCst) {
            bail!("sub_cost failure injected");
        }
        self.check_cost(items)?;
        {
            let mut bag = self.inner.bag.lock().unwrap();
            for item in items {
                *bag.entry(item.id).or_insert(0) -= item.num;
            }
        }
        self.inner
            .costs
            .lock()
            .unwrap()
            .push((activity_id, items.to_vec()));
        Ok(())
    }

    fn send_mail(&self, activity_id: ActivityId, items: &[ItemData]) -> Result<()> {
        if self.inner.fail_send_mail.load(Ordering::SeqCst) {
            bail!("send_mail failure injected");
        }
        self.inner
            .mails
            .lock()
            .unwrap()
            .push((activity_id, items.to_vec()));
        Ok(())
    }
}
