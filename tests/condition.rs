// tests/condition.rs

use opactivity::config::{ActivityConfig, ConditionConfig};
use opactivity::errors::ActivityError;
use opactivity::progress::TaskProgress;
use opactivity::types::{DataCmd, ItemData, TaskState, TimeMode};
use opactivity_test_utils::builders::{
    ActivityConfigBuilder, ConditionBuilder, DAY, ShopConfigBuilder, condition_template,
};
use opactivity_test_utils::harness::day_aligned_t0;
use opactivity_test_utils::{Harness, init_tracing};

const ACTIVITY: i64 = 300;
const GOLD: i32 = 1;

fn task_activity() -> ActivityConfig {
    ActivityConfigBuilder::new(ACTIVITY)
        .time_mode(TimeMode::RegisterRelative)
        .window(0, 3 * DAY, 5 * DAY)
        .template(
            1,
            condition_template(vec![
                ConditionBuilder::new(1).kind("kill").target(3).reward(GOLD, 10).build(),
                ConditionBuilder::new(2).kind("login").reward(GOLD, 20).build(),
            ]),
        )
        .build()
}

/// Host predicate: count `kind` events and finish tasks at their target.
fn progress(
    kind: &'static str,
    amount: i64,
) -> impl FnMut(&ConditionConfig, &mut TaskProgress) -> bool {
    move |config: &ConditionConfig, task: &mut TaskProgress| {
        if config.kind != kind || !task.is_doing() {
            return false;
        }
        task.value += amount;
        if task.value >= config.target {
            task.state = TaskState::Finished;
        }
        true
    }
}

#[test]
fn task_reward_requires_finished_state() {
    init_tracing();
    let t0 = day_aligned_t0();
    let mut h = Harness::new(t0, vec![task_activity()]);

    let err = h.manager.get_task_reward(ACTIVITY, 0, 0).unwrap_err();
    assert!(matches!(err, ActivityError::TaskNotFinished(0)));

    h.manager.trigger_condition(progress("kill", 2));
    assert_eq!(h.condition(ACTIVITY, 1, 0).tasks[0].value, 2);
    assert_eq!(h.condition(ACTIVITY, 1, 0).tasks[0].state, TaskState::Doing);

    h.manager.trigger_condition(progress("kill", 2));
    assert_eq!(h.condition(ACTIVITY, 1, 0).tasks[0].state, TaskState::Finished);

    h.manager.get_task_reward(ACTIVITY, 0, 0).unwrap();
    assert_eq!(h.player.item_count(GOLD), 10);
    assert_eq!(h.condition(ACTIVITY, 1, 0).tasks[0].state, TaskState::Claimed);

    let err = h.manager.get_task_reward(ACTIVITY, 0, 0).unwrap_err();
    assert!(matches!(err, ActivityError::TaskNotFinished(0)));
    assert_eq!(h.player.item_count(GOLD), 10);

    let err = h.manager.get_task_reward(ACTIVITY, 0, 5).unwrap_err();
    assert!(matches!(err, ActivityError::TaskNotExist(5)));
}

#[test]
fn failed_grant_keeps_task_finished() {
    let t0 = day_aligned_t0();
    let mut h = Harness::new(t0, vec![task_activity()]);
    h.manager.trigger_condition(progress("login", 1));

    h.player.fail_add_reward(true);
    assert!(h.manager.get_task_reward(ACTIVITY, 0, 1).is_err());
    assert_eq!(h.condition(ACTIVITY, 1, 0).tasks[1].state, TaskState::Finished);
}

#[test]
fn trigger_emits_only_on_change() {
    let t0 = day_aligned_t0();
    let mut h = Harness::new(t0, vec![task_activity()]);
    let before = h.sink.count(DataCmd::Update);

    h.manager.trigger_condition(|_, _| false);
    assert_eq!(h.sink.count(DataCmd::Update), before);

    h.manager.trigger_condition(progress("kill", 1));
    assert_eq!(h.sink.count(DataCmd::Update), before + 1);
}

#[test]
fn claims_allowed_after_end_but_progress_is_not() {
    let t0 = day_aligned_t0();
    let mut h = Harness::new(t0, vec![task_activity()]);
    h.manager.trigger_condition(progress("login", 1));

    h.clock.set(t0 + 4 * DAY);
    h.manager.trigger_condition(progress("kill", 5));
    assert_eq!(h.condition(ACTIVITY, 1, 0).tasks[0].value, 0);

    h.manager.get_task_reward(ACTIVITY, 0, 1).unwrap();
    assert_eq!(h.player.item_count(GOLD), 20);
}

#[test]
fn nested_activity_exposes_only_current_day() {
    let t0 = day_aligned_t0();
    let config = ActivityConfigBuilder::new(ACTIVITY)
        .time_mode(TimeMode::RegisterRelative)
        .window(0, 3 * DAY, 5 * DAY)
        .nested(true)
        .template(
            1,
            condition_template(vec![ConditionBuilder::new(1).kind("login").build()]),
        )
        .template(
            2,
            ShopConfigBuilder::new()
                .goods(&[ItemData::new(GOLD, 1)], &[], 100, None)
                .build(),
        )
        .build();
    let mut h = Harness::new(t0, vec![config]);

    let err = h.manager.shop_buy_goods(ACTIVITY, 0, 0).unwrap_err();
    assert!(matches!(err, ActivityError::TemplateNotExist { index: 0, .. }));
    let err = h.manager.shop_buy_goods(ACTIVITY, 1, 0).unwrap_err();
    assert!(matches!(err, ActivityError::TemplateNotExist { index: 1, .. }));

    h.clock.set(t0 + DAY);
    h.manager.shop_buy_goods(ACTIVITY, 0, 0).unwrap();
    assert_eq!(h.shop(ACTIVITY, 2, 0).bought(0), 1);

    // Day 1 tasks are no longer offered.
    h.manager.trigger_condition(progress("login", 1));
    assert_eq!(h.condition(ACTIVITY, 1, 0).tasks[0].state, TaskState::Doing);
}

#[test]
fn flat_activity_indexes_across_days() {
    let t0 = day_aligned_t0();
    let config = ActivityConfigBuilder::new(ACTIVITY)
        .time_mode(TimeMode::RegisterRelative)
        .window(0, 3 * DAY, 5 * DAY)
        .template(
            1,
            condition_template(vec![ConditionBuilder::new(1).kind("login").build()]),
        )
        .template(
            2,
            ShopConfigBuilder::new()
                .goods(&[ItemData::new(GOLD, 1)], &[], 100, None)
                .build(),
        )
        .build();
    let mut h = Harness::new(t0, vec![config]);

    h.manager.shop_buy_goods(ACTIVITY, 1, 0).unwrap();
    assert_eq!(h.shop(ACTIVITY, 2, 0).bought(0), 1);
}
