use std::sync::Arc;

use opactivity::clock::mock::ManualClock;
use opactivity::config::ActivityConfig;
use opactivity::player::{PlayerActivityManager, PlayerProfile};
use opactivity::progress::{
    ConditionProgress, ShopProgress, SignInProgress, TemplateProgress,
};
use opactivity::registry::ActivityRegistry;
use opactivity::time::TimePolicy;
use opactivity::types::ActivityId;

use crate::{FakePlayer, RecordingSink};

pub const PLAYER_ID: i32 = 7;
pub const AREA: i32 = 101;
pub const CHANNEL: i32 = 1;

/// First second of the game day containing 2023-11-14 (default policy).
pub fn day_aligned_t0() -> i64 {
    TimePolicy::default().start_of_day(1_700_000_000)
}

/// One player manager wired to a manual clock, a fake player and a
/// recording sink.
pub struct Harness {
    pub clock: ManualClock,
    pub registry: Arc<ActivityRegistry>,
    pub player: FakePlayer,
    pub sink: RecordingSink,
    pub manager: PlayerActivityManager,
}

impl Harness {
    /// Player registered at `now`, activities loaded, first sweep done.
    pub fn new(now: i64, activities: Vec<ActivityConfig>) -> Self {
        Self::with_player(now, activities, FakePlayer::new(PLAYER_ID))
    }

    pub fn with_player(now: i64, activities: Vec<ActivityConfig>, player: FakePlayer) -> Self {
        Self::with_profile(
            now,
            activities,
            player,
            PlayerProfile::new(AREA, CHANNEL, now),
        )
    }

    pub fn with_profile(
        now: i64,
        activities: Vec<ActivityConfig>,
        player: FakePlayer,
        profile: PlayerProfile,
    ) -> Self {
        let clock = ManualClock::new(now);
        let registry = Arc::new(ActivityRegistry::with_clock(
            TimePolicy::default(),
            Arc::new(clock.clone()),
        ));
        registry.init(activities, None, None);

        let sink = RecordingSink::new();
        let mut manager =
            PlayerActivityManager::new(player.arc(), profile, Arc::clone(&registry), sink.arc());
        manager.check_new_and_delete();

        Self {
            clock,
            registry,
            player,
            sink,
            manager,
        }
    }

    /// Template progress at (`day`, `index`) as the store would see it.
    pub fn template_progress(
        &self,
        activity_id: ActivityId,
        day: u32,
        index: usize,
    ) -> Option<TemplateProgress> {
        self.sink
            .replay(activity_id)
            .and_then(|progress| progress.template(day, index).cloned())
    }

    pub fn sign_in(&self, activity_id: ActivityId, day: u32, index: usize) -> SignInProgress {
        match self.template_progress(activity_id, day, index) {
            Some(TemplateProgress::SignIn(p)) => p,
            other => panic!("expected sign-in progress, got {other:?}"),
        }
    }

    pub fn condition(&self, activity_id: ActivityId, day: u32, index: usize) -> ConditionProgress {
        match self.template_progress(activity_id, day, index) {
            Some(TemplateProgress::Condition(p)) => p,
            other => panic!("expected condition progress, got {other:?}"),
        }
    }

    pub fn shop(&self, activity_id: ActivityId, day: u32, index: usize) -> ShopProgress {
        match self.template_progress(activity_id, day, index) {
            Some(TemplateProgress::Shop(p)) => p,
            other => panic!("expected shop progress, got {other:?}"),
        }
    }
}
