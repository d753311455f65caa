// tests/manager.rs

use std::sync::Arc;

use opactivity::activity::ActivityState;
use opactivity::config::{ActivityConfig, ConditionConfig};
use opactivity::errors::ActivityError;
use opactivity::player::{PlayerActivityManager, PlayerProfile};
use opactivity::progress::{ActivityProgress, TaskProgress};
use opactivity::types::{DataCmd, ItemData, RefreshType, TaskState, TimeMode};
use opactivity_test_utils::builders::{
    ActivityConfigBuilder, ConditionBuilder, DAY, HOUR, ShopConfigBuilder, SignInConfigBuilder,
    condition_template,
};
use opactivity_test_utils::harness::{AREA, CHANNEL, day_aligned_t0};
use opactivity_test_utils::{FakePlayer, Harness, RecordingSink, init_tracing};

const SIGN: i64 = 1;
const GOLD: i32 = 1;
const SCORE: i32 = 900;

fn register_relative_sign_in(id: i64, sign_in: SignInConfigBuilder) -> ActivityConfig {
    ActivityConfigBuilder::new(id)
        .time_mode(TimeMode::RegisterRelative)
        .window(0, 7 * DAY, 10 * DAY)
        .template(1, sign_in.build())
        .build()
}

fn finish_all(_: &ConditionConfig, task: &mut TaskProgress) -> bool {
    if task.is_doing() {
        task.state = TaskState::Finished;
        return true;
    }
    false
}

#[test]
fn end_to_end_register_relative_sign_in() {
    init_tracing();
    let t0 = day_aligned_t0();
    let mut h = Harness::new(
        t0,
        vec![register_relative_sign_in(SIGN, SignInConfigBuilder::new(7))],
    );

    assert_eq!(h.manager.activity_ids(), vec![SIGN]);
    assert_eq!(h.sink.cmds(), vec![(SIGN, DataCmd::Add)]);

    h.manager.sign(SIGN, 0).unwrap();
    assert_eq!(h.sign_in(SIGN, 1, 0).signed_day, 1);

    h.clock.set(t0 + HOUR);
    assert!(matches!(
        h.manager.sign(SIGN, 0).unwrap_err(),
        ActivityError::TodaySigned
    ));

    h.clock.set(t0 + DAY);
    h.manager.sign(SIGN, 0).unwrap();
    assert_eq!(h.sign_in(SIGN, 1, 0).signed_day, 2);
}

#[test]
fn area_and_channel_filters_apply() {
    let t0 = day_aligned_t0();
    let other_area = ActivityConfigBuilder::new(2)
        .time_mode(TimeMode::RegisterRelative)
        .window(0, DAY, 2 * DAY)
        .areas(&[AREA + 1])
        .template(1, SignInConfigBuilder::new(1).build())
        .build();
    let other_channel = ActivityConfigBuilder::new(3)
        .time_mode(TimeMode::RegisterRelative)
        .window(0, DAY, 2 * DAY)
        .channels(&[CHANNEL + 1])
        .template(1, SignInConfigBuilder::new(1).build())
        .build();
    let matching = ActivityConfigBuilder::new(4)
        .time_mode(TimeMode::RegisterRelative)
        .window(0, DAY, 2 * DAY)
        .areas(&[AREA])
        .channels(&[CHANNEL])
        .template(1, SignInConfigBuilder::new(1).build())
        .build();

    let h = Harness::new(t0, vec![other_area, other_channel, matching]);
    assert_eq!(h.manager.activity_ids(), vec![4]);
}

#[test]
fn unknown_time_mode_is_skipped_for_the_player() {
    let t0 = day_aligned_t0();
    let broken = ActivityConfigBuilder::new(5)
        .time_mode(TimeMode::Unknown)
        .window(0, DAY, 2 * DAY)
        .template(1, SignInConfigBuilder::new(1).build())
        .build();

    let h = Harness::new(t0, vec![broken, register_relative_sign_in(SIGN, SignInConfigBuilder::new(7))]);
    assert_eq!(h.manager.activity_ids(), vec![SIGN]);
}

#[test]
fn announced_activity_is_visible_but_not_open() {
    let t0 = day_aligned_t0();
    let config = ActivityConfigBuilder::new(6)
        .window(t0 + DAY, t0 + 2 * DAY, t0 + 3 * DAY)
        .prediction(t0 - HOUR)
        .template(1, SignInConfigBuilder::new(3).build())
        .build();
    let mut h = Harness::new(t0, vec![config]);

    assert_eq!(h.manager.activity_ids(), vec![6]);
    let view = h.manager.pack_one_activity(6).unwrap();
    assert_eq!(view.state, ActivityState::Ineligible);
    assert!(matches!(
        h.manager.sign(6, 0).unwrap_err(),
        ActivityError::NotOpen(6)
    ));

    h.clock.set(t0 + DAY);
    h.manager.sign(6, 0).unwrap();
}

#[test]
fn all_pre_conditions_gate_the_activity() {
    let t0 = day_aligned_t0();
    let config = ActivityConfigBuilder::new(7)
        .time_mode(TimeMode::RegisterRelative)
        .window(0, 7 * DAY, 10 * DAY)
        .need_all_pre_conditions(true)
        .pre_condition(ConditionBuilder::new(71).kind("level").build())
        .pre_condition(ConditionBuilder::new(72).kind("vip").build())
        .template(1, SignInConfigBuilder::new(7).build())
        .build();
    let mut h = Harness::new(t0, vec![config]);

    let instance = h.manager.instance(7).unwrap();
    assert!(matches!(
        instance.invalid(t0).unwrap_err(),
        ActivityError::PreConditionUnmet(7)
    ));
    assert!(matches!(
        h.manager.sign(7, 0).unwrap_err(),
        ActivityError::PreConditionUnmet(7)
    ));

    h.manager.trigger_condition(|config, task| {
        if config.id == 71 && task.is_doing() {
            task.state = TaskState::Finished;
            return true;
        }
        false
    });
    assert!(h.manager.instance(7).unwrap().invalid(t0).is_err());
    assert_eq!(
        h.sink.replay(7).unwrap().pre_tasks[0].state,
        TaskState::Finished
    );

    h.manager.trigger_condition(finish_all);
    let instance = h.manager.instance(7).unwrap();
    assert!(instance.invalid(t0).is_ok());
    assert_eq!(instance.state(t0), ActivityState::Open);
    h.manager.sign(7, 0).unwrap();
}

#[test]
fn pre_conditions_are_evaluated_outside_the_window() {
    let t0 = day_aligned_t0();
    let config = ActivityConfigBuilder::new(8)
        .window(t0 + DAY, t0 + 2 * DAY, t0 + 3 * DAY)
        .prediction(t0)
        .pre_condition(ConditionBuilder::new(81).build())
        .pre_condition(ConditionBuilder::new(82).build())
        .template(1, SignInConfigBuilder::new(1).build())
        .build();
    let mut h = Harness::new(t0, vec![config]);

    h.manager.trigger_condition(|config, task| {
        if config.id == 82 && task.is_doing() {
            task.state = TaskState::Finished;
            return true;
        }
        false
    });

    // Any-one policy: satisfied, but the window is not open yet.
    let instance = h.manager.instance(8).unwrap();
    assert!(instance.finished_pre_condition());
    assert!(matches!(
        instance.invalid(t0).unwrap_err(),
        ActivityError::NotOpen(8)
    ));
}

#[test]
fn expiry_mails_unclaimed_rewards_and_deletes() {
    let t0 = day_aligned_t0();
    let mut h = Harness::new(
        t0,
        vec![register_relative_sign_in(
            SIGN,
            SignInConfigBuilder::new(7).daily_rewards(GOLD, 10),
        )],
    );
    h.manager.sign(SIGN, 0).unwrap();
    h.clock.set(t0 + DAY);
    h.manager.sign(SIGN, 0).unwrap();
    h.manager.sign_get_reward(SIGN, 0, 1).unwrap();

    h.clock.set(t0 + 10 * DAY);
    h.manager.check_new_and_delete();

    assert!(h.manager.activity_ids().is_empty());
    assert_eq!(h.sink.cmds().last().copied(), Some((SIGN, DataCmd::Delete)));
    assert!(h.sink.replay(SIGN).is_none());
    // Day 2 was signed but never claimed.
    assert_eq!(h.player.mailed_items(), vec![ItemData::new(GOLD, 20)]);
}

#[test]
fn withdrawn_activity_is_deleted_on_next_sweep() {
    let t0 = day_aligned_t0();
    let mut h = Harness::new(t0, vec![register_relative_sign_in(SIGN, SignInConfigBuilder::new(7))]);

    assert!(h.registry.delete(SIGN));
    h.manager.check_new_and_delete();

    assert!(h.manager.instance(SIGN).is_none());
    assert_eq!(h.sink.count(DataCmd::Delete), 1);
    assert!(h.player.mails().is_empty());
}

#[test]
fn registry_add_is_picked_up_by_sweep_or_add() {
    let t0 = day_aligned_t0();
    let mut h = Harness::new(t0, Vec::new());
    assert!(h.manager.activity_ids().is_empty());

    h.registry
        .add(register_relative_sign_in(SIGN, SignInConfigBuilder::new(7)))
        .unwrap();
    h.manager.check_new_and_delete();
    assert_eq!(h.manager.activity_ids(), vec![SIGN]);

    let second = register_relative_sign_in(2, SignInConfigBuilder::new(7));
    h.registry.add(second).unwrap();
    let config = h.registry.get(2).unwrap();
    assert!(h.manager.add(Arc::clone(&config)));
    assert!(!h.manager.add(config));
    assert_eq!(h.sink.count(DataCmd::Add), 2);
}

#[test]
fn manual_delete_is_silent_when_absent() {
    let t0 = day_aligned_t0();
    let mut h = Harness::new(
        t0,
        vec![register_relative_sign_in(
            SIGN,
            SignInConfigBuilder::new(7).daily_rewards(GOLD, 10),
        )],
    );
    h.manager.sign(SIGN, 0).unwrap();

    h.player.fail_send_mail(true);
    assert!(h.manager.delete(SIGN));
    assert!(h.manager.instance(SIGN).is_none());
    assert_eq!(h.sink.count(DataCmd::Delete), 1);

    assert!(!h.manager.delete(SIGN));
    assert_eq!(h.sink.count(DataCmd::Delete), 1);
}

#[test]
fn new_day_mails_finished_tasks_and_resets() {
    let t0 = day_aligned_t0();
    let config = ActivityConfigBuilder::new(9)
        .time_mode(TimeMode::RegisterRelative)
        .window(0, 7 * DAY, 10 * DAY)
        .template(
            1,
            condition_template(vec![
                ConditionBuilder::new(1).refresh(RefreshType::Day).reward(GOLD, 1).build(),
                ConditionBuilder::new(2).refresh(RefreshType::Day).reward(GOLD, 2).build(),
                ConditionBuilder::new(3).refresh(RefreshType::Day).reward(GOLD, 4).build(),
                ConditionBuilder::new(4).refresh(RefreshType::Week).reward(GOLD, 8).build(),
            ]),
        )
        .build();
    let mut h = Harness::new(t0, vec![config]);

    // Task 1 finished and claimed, task 2 finished only, task 3 untouched.
    h.manager.trigger_condition(|config, task| {
        if config.id != 3 && task.is_doing() {
            task.state = TaskState::Finished;
            task.value = 1;
            return true;
        }
        false
    });
    h.manager.get_task_reward(9, 0, 0).unwrap();

    h.clock.set(t0 + DAY);
    h.manager.on_new_day();

    assert_eq!(h.player.mails(), vec![(9, vec![ItemData::new(GOLD, 2)])]);
    let tasks = h.condition(9, 1, 0).tasks;
    assert_eq!(tasks[0].state, TaskState::Doing);
    assert_eq!(tasks[0].value, 0);
    assert_eq!(tasks[1].state, TaskState::Doing);
    assert_eq!(tasks[2].state, TaskState::Doing);
    assert_eq!(tasks[3].state, TaskState::Finished);

    h.manager.on_new_week();
    assert_eq!(h.condition(9, 1, 0).tasks[3].state, TaskState::Doing);
    assert_eq!(h.player.mailed_items().len(), 2);

    h.manager.on_new_month();
    assert_eq!(h.player.mailed_items().len(), 2);
}

#[test]
fn score_rewards_check_but_never_debit() {
    let t0 = day_aligned_t0();
    let config = ActivityConfigBuilder::new(10)
        .time_mode(TimeMode::RegisterRelative)
        .window(0, 7 * DAY, 10 * DAY)
        .score(ItemData::new(SCORE, 5), &[ItemData::new(GOLD, 100)])
        .score(ItemData::new(SCORE, 50), &[ItemData::new(GOLD, 1_000)])
        .template(1, SignInConfigBuilder::new(7).build())
        .build();
    let player = FakePlayer::new(7).with_items(&[(SCORE, 10)]);
    let mut h = Harness::with_player(t0, vec![config], player);

    h.manager.get_score_reward(10, 0).unwrap();
    assert_eq!(h.player.item_count(GOLD), 100);
    assert_eq!(h.player.item_count(SCORE), 10);

    assert!(matches!(
        h.manager.get_score_reward(10, 0).unwrap_err(),
        ActivityError::ScoreRewardClaimed(0)
    ));
    assert!(matches!(
        h.manager.get_score_reward(10, 1).unwrap_err(),
        ActivityError::HostCallback(_)
    ));
    assert!(matches!(
        h.manager.get_score_reward(10, 2).unwrap_err(),
        ActivityError::ScoreEntryNotExist(2)
    ));

    let stored = h.sink.replay(10).unwrap();
    assert_eq!(stored.claimed_scores.len(), 1);
    assert!(stored.claimed_scores.contains(&0));
}

#[test]
fn replayed_diffs_match_the_live_snapshot() {
    let t0 = day_aligned_t0();
    let config = ActivityConfigBuilder::new(11)
        .time_mode(TimeMode::RegisterRelative)
        .window(0, 7 * DAY, 10 * DAY)
        .pre_condition(ConditionBuilder::new(111).build())
        .score(ItemData::new(SCORE, 1), &[ItemData::new(GOLD, 5)])
        .template(1, SignInConfigBuilder::new(7).daily_rewards(GOLD, 1).build())
        .template(
            1,
            condition_template(vec![ConditionBuilder::new(1).reward(GOLD, 3).build()]),
        )
        .template(
            2,
            ShopConfigBuilder::new()
                .goods(&[ItemData::new(GOLD, 1)], &[], 100, Some(2))
                .build(),
        )
        .build();
    let player = FakePlayer::new(7).with_items(&[(SCORE, 1)]);
    let mut h = Harness::with_player(t0, vec![config], player);

    h.manager.trigger_condition(finish_all);
    h.manager.sign(11, 0).unwrap();
    h.manager.sign_get_reward(11, 0, 1).unwrap();
    h.manager.get_task_reward(11, 1, 0).unwrap();
    h.manager.shop_buy_goods(11, 2, 0).unwrap();
    h.manager.get_score_reward(11, 0).unwrap();
    h.clock.set(t0 + DAY);
    h.manager.on_new_day();
    h.manager.sign(11, 0).unwrap();

    let live = h.manager.instance(11).unwrap().snapshot();
    assert_eq!(h.sink.replay(11), Some(live));
}

#[test]
fn init_data_restores_saved_progress() {
    let t0 = day_aligned_t0();
    let config = register_relative_sign_in(SIGN, SignInConfigBuilder::new(7));
    let mut h = Harness::new(t0, vec![config]);
    h.manager.sign(SIGN, 0).unwrap();
    let saved = h.sink.replay(SIGN).unwrap();

    let sink = RecordingSink::new();
    let mut restored = PlayerActivityManager::new(
        FakePlayer::new(7).arc(),
        PlayerProfile::new(AREA, CHANNEL, t0),
        Arc::clone(&h.registry),
        sink.arc(),
    );
    restored.init_data(vec![saved.clone(), ActivityProgress::new(404)]);

    assert_eq!(restored.activity_ids(), vec![SIGN]);
    assert_eq!(restored.instance(SIGN).unwrap().snapshot(), saved);
    assert_eq!(sink.cmds(), vec![(404, DataCmd::Delete)]);

    // Restored state keeps enforcing the once-per-day rule.
    h.clock.set(t0 + HOUR);
    assert!(matches!(
        restored.sign(SIGN, 0).unwrap_err(),
        ActivityError::TodaySigned
    ));
}

#[test]
fn pack_views_cover_live_instances() {
    let t0 = day_aligned_t0();
    let mut h = Harness::new(
        t0,
        vec![
            register_relative_sign_in(1, SignInConfigBuilder::new(7)),
            register_relative_sign_in(2, SignInConfigBuilder::new(7)),
        ],
    );
    h.manager.sign(2, 0).unwrap();

    let views = h.manager.pack_all_open_activity();
    assert_eq!(views.len(), 2);
    assert!(views.iter().all(|v| v.state == ActivityState::Open && v.open_day == 1));

    let view = h.manager.pack_one_activity(2).unwrap();
    assert_eq!(view.window.start, t0);
    assert_eq!(view.progress, h.manager.instance(2).unwrap().snapshot());
    assert!(h.manager.pack_one_activity(3).is_none());

    h.clock.set(t0 + 8 * DAY);
    let view = h.manager.pack_one_activity(1).unwrap();
    assert_eq!(view.state, ActivityState::ClosedClaimable);
}
