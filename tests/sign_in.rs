// tests/sign_in.rs

use std::collections::BTreeSet;

use opactivity::config::ActivityConfig;
use opactivity::errors::ActivityError;
use opactivity::types::{ItemData, TaskState, TimeMode};
use opactivity_test_utils::builders::{
    ActivityConfigBuilder, ConditionBuilder, DAY, HOUR, SignInConfigBuilder,
};
use opactivity_test_utils::harness::day_aligned_t0;
use opactivity_test_utils::{FakePlayer, Harness, init_tracing};

const ACTIVITY: i64 = 100;
const GOLD: i32 = 1;
const TICKET: i32 = 2;

fn seven_day_activity(sign_in: SignInConfigBuilder) -> ActivityConfig {
    ActivityConfigBuilder::new(ACTIVITY)
        .time_mode(TimeMode::RegisterRelative)
        .window(0, 7 * DAY, 10 * DAY)
        .template(1, sign_in.build())
        .build()
}

#[test]
fn sign_once_per_game_day() {
    init_tracing();
    let t0 = day_aligned_t0();
    let mut h = Harness::new(t0, vec![seven_day_activity(SignInConfigBuilder::new(7))]);

    h.manager.sign(ACTIVITY, 0).unwrap();
    assert_eq!(h.sign_in(ACTIVITY, 1, 0).signed_day, 1);

    h.clock.set(t0 + HOUR);
    let err = h.manager.sign(ACTIVITY, 0).unwrap_err();
    assert!(matches!(err, ActivityError::TodaySigned));

    h.clock.set(t0 + DAY);
    h.manager.sign(ACTIVITY, 0).unwrap();
    assert_eq!(h.sign_in(ACTIVITY, 1, 0).signed_day, 2);
}

#[test]
fn sign_stops_at_configured_count() {
    let t0 = day_aligned_t0();
    let mut h = Harness::new(t0, vec![seven_day_activity(SignInConfigBuilder::new(5))]);

    for day in 0..5 {
        h.clock.set(t0 + day * DAY);
        h.manager.sign(ACTIVITY, 0).unwrap();
    }

    h.clock.set(t0 + 5 * DAY);
    let err = h.manager.sign(ACTIVITY, 0).unwrap_err();
    assert!(matches!(err, ActivityError::SignCountLimit));
    assert_eq!(h.sign_in(ACTIVITY, 1, 0).signed_day, 5);
}

#[test]
fn claimed_day_stays_claimed() {
    let t0 = day_aligned_t0();
    let mut h = Harness::new(
        t0,
        vec![seven_day_activity(
            SignInConfigBuilder::new(7).daily_rewards(GOLD, 10),
        )],
    );

    h.manager.sign(ACTIVITY, 0).unwrap();
    h.manager.sign_get_reward(ACTIVITY, 0, 1).unwrap();
    assert_eq!(h.player.item_count(GOLD), 10);
    let before = h.sign_in(ACTIVITY, 1, 0);

    let err = h.manager.sign_get_reward(ACTIVITY, 0, 1).unwrap_err();
    assert!(matches!(err, ActivityError::SignRewardClaimed(1)));
    assert_eq!(h.sign_in(ACTIVITY, 1, 0), before);
    assert_eq!(before.claimed_days, BTreeSet::from([1]));
    assert_eq!(h.player.item_count(GOLD), 10);
}

#[test]
fn reward_requires_signed_day() {
    let t0 = day_aligned_t0();
    let mut h = Harness::new(
        t0,
        vec![seven_day_activity(
            SignInConfigBuilder::new(7).daily_rewards(GOLD, 10),
        )],
    );
    h.manager.sign(ACTIVITY, 0).unwrap();

    assert!(matches!(
        h.manager.sign_get_reward(ACTIVITY, 0, 2).unwrap_err(),
        ActivityError::NotSigned(2)
    ));
    assert!(matches!(
        h.manager.sign_get_reward(ACTIVITY, 0, 0).unwrap_err(),
        ActivityError::NotSigned(0)
    ));
}

#[test]
fn failed_reward_grant_leaves_day_unclaimed() {
    let t0 = day_aligned_t0();
    let mut h = Harness::new(
        t0,
        vec![seven_day_activity(
            SignInConfigBuilder::new(7).daily_rewards(GOLD, 10),
        )],
    );
    h.manager.sign(ACTIVITY, 0).unwrap();

    h.player.fail_add_reward(true);
    let err = h.manager.sign_get_reward(ACTIVITY, 0, 1).unwrap_err();
    assert!(matches!(err, ActivityError::HostCallback(_)));
    assert!(h.sign_in(ACTIVITY, 1, 0).claimed_days.is_empty());

    h.player.fail_add_reward(false);
    h.manager.sign_get_reward(ACTIVITY, 0, 1).unwrap();
    assert_eq!(h.player.item_count(GOLD), 10);
}

#[test]
fn missing_reward_config_is_reported() {
    let t0 = day_aligned_t0();
    let mut h = Harness::new(t0, vec![seven_day_activity(SignInConfigBuilder::new(7))]);
    h.manager.sign(ACTIVITY, 0).unwrap();

    let err = h.manager.sign_get_reward(ACTIVITY, 0, 1).unwrap_err();
    assert!(matches!(err, ActivityError::SignRewardMissing(1)));
}

#[test]
fn login_trigger_signs_on_login_only() {
    let t0 = day_aligned_t0();
    let mut h = Harness::new(
        t0,
        vec![seven_day_activity(
            SignInConfigBuilder::new(7).login_trigger(true),
        )],
    );

    let err = h.manager.sign(ACTIVITY, 0).unwrap_err();
    assert!(matches!(err, ActivityError::SignTriggerMismatch));

    h.manager.login();
    assert_eq!(h.sign_in(ACTIVITY, 1, 0).signed_day, 1);

    // Second login on the same day changes nothing.
    let before = h.sink.changes().len();
    h.manager.login();
    assert_eq!(h.sink.changes().len(), before);

    h.clock.set(t0 + DAY);
    h.manager.on_new_day();
    assert_eq!(h.sign_in(ACTIVITY, 1, 0).signed_day, 2);
}

#[test]
fn repair_with_item_cost() {
    let t0 = day_aligned_t0();
    let player = FakePlayer::new(7).with_items(&[(TICKET, 15)]);
    let mut h = Harness::with_player(
        t0,
        vec![seven_day_activity(
            SignInConfigBuilder::new(7)
                .repair_limits(3, 1)
                .repair_cost(&[ItemData::new(TICKET, 10)]),
        )],
        player,
    );

    // Day 1 missed entirely; on day 3 two days are owed.
    h.clock.set(t0 + 2 * DAY);
    h.manager.sign_repair(ACTIVITY, 0).unwrap();
    let state = h.sign_in(ACTIVITY, 1, 0);
    assert_eq!(state.signed_day, 1);
    assert_eq!(state.repair_count, 1);
    assert_eq!(state.every_day_repair_count, 1);
    assert_eq!(h.player.item_count(TICKET), 5);

    let err = h.manager.sign_repair(ACTIVITY, 0).unwrap_err();
    assert!(matches!(err, ActivityError::DailyRepairCountLimit));

    h.manager.sign(ACTIVITY, 0).unwrap();
    assert_eq!(h.sign_in(ACTIVITY, 1, 0).signed_day, 2);

    // Next day: counter reset, day 3 has no rule and repairs for free.
    h.clock.set(t0 + 3 * DAY);
    h.manager.on_new_day();
    assert_eq!(h.sign_in(ACTIVITY, 1, 0).every_day_repair_count, 0);
    h.manager.sign_repair(ACTIVITY, 0).unwrap();
    let state = h.sign_in(ACTIVITY, 1, 0);
    assert_eq!(state.signed_day, 3);
    assert_eq!(state.repair_count, 2);
    assert_eq!(h.player.item_count(TICKET), 5);
}

#[test]
fn repair_fails_without_enough_items() {
    let t0 = day_aligned_t0();
    let player = FakePlayer::new(7).with_items(&[(TICKET, 3)]);
    let mut h = Harness::with_player(
        t0,
        vec![seven_day_activity(
            SignInConfigBuilder::new(7)
                .repair_limits(3, 3)
                .repair_cost(&[ItemData::new(TICKET, 10)]),
        )],
        player,
    );

    h.clock.set(t0 + 2 * DAY);
    let err = h.manager.sign_repair(ACTIVITY, 0).unwrap_err();
    assert!(matches!(err, ActivityError::HostCallback(_)));
    assert_eq!(h.sign_in(ACTIVITY, 1, 0).signed_day, 0);
    assert_eq!(h.player.item_count(TICKET), 3);
}

#[test]
fn repair_needs_a_missed_day() {
    let t0 = day_aligned_t0();
    let mut h = Harness::new(
        t0,
        vec![seven_day_activity(
            SignInConfigBuilder::new(7).repair_limits(3, 3),
        )],
    );

    // Day 1: nothing can be owed yet.
    let err = h.manager.sign_repair(ACTIVITY, 0).unwrap_err();
    assert!(matches!(err, ActivityError::RepairCountLimit));

    h.manager.sign(ACTIVITY, 0).unwrap();
    h.clock.set(t0 + DAY);
    let err = h.manager.sign_repair(ACTIVITY, 0).unwrap_err();
    assert!(matches!(err, ActivityError::NothingToRepair));
}

#[test]
fn repair_with_condition_tasks() {
    let t0 = day_aligned_t0();
    let mut h = Harness::new(
        t0,
        vec![seven_day_activity(
            SignInConfigBuilder::new(7)
                .repair_limits(3, 3)
                .repair_conditions(vec![ConditionBuilder::new(500).build()]),
        )],
    );

    h.clock.set(t0 + DAY);
    let err = h.manager.sign_repair(ACTIVITY, 0).unwrap_err();
    assert!(matches!(err, ActivityError::RepairTasksUnfinished(1)));

    h.manager.trigger_condition(|config, task| {
        if config.id == 500 && task.is_doing() {
            task.state = TaskState::Finished;
            return true;
        }
        false
    });
    assert_eq!(
        h.sign_in(ACTIVITY, 1, 0).repair_tasks[0][0].state,
        TaskState::Finished
    );

    h.manager.sign_repair(ACTIVITY, 0).unwrap();
    let state = h.sign_in(ACTIVITY, 1, 0);
    assert_eq!(state.signed_day, 1);
    assert_eq!(state.repair_tasks[0][0].state, TaskState::Claimed);
}

#[test]
fn repaired_day_reward_is_claimable() {
    let t0 = day_aligned_t0();
    let mut h = Harness::new(
        t0,
        vec![seven_day_activity(
            SignInConfigBuilder::new(7)
                .daily_rewards(GOLD, 10)
                .repair_limits(1, 1),
        )],
    );

    h.clock.set(t0 + DAY);
    h.manager.sign_repair(ACTIVITY, 0).unwrap();
    h.manager.sign_get_reward(ACTIVITY, 0, 1).unwrap();
    assert_eq!(h.player.item_count(GOLD), 10);

    let err = h.manager.sign_repair(ACTIVITY, 0).unwrap_err();
    assert!(matches!(err, ActivityError::RepairCountLimit));
}
