use std::sync::Once;

use chrono::{TimeZone, Utc};
use mirror_core::{update, Effect, Event, Msg, RenderedContent, SyncPhase, SyncState};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(mirror_logging::initialize_for_tests);
}

fn rendered(markup: &str) -> RenderedContent {
    RenderedContent::new(markup, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap())
}

fn started() -> SyncState {
    init_logging();
    let (state, effects) = update(SyncState::new(), Msg::Started);
    assert_eq!(effects, vec![Effect::BeginCycle]);
    state
}

#[test]
fn start_triggers_eager_cycle() {
    let state = started();
    assert_eq!(state.phase(), SyncPhase::Syncing);
    assert_eq!(state.cycle_number(), 1);
}

#[test]
fn tick_while_syncing_is_absorbed() {
    let state = started();

    let (state, effects) = update(state, Msg::Tick);
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::Tick);
    assert!(effects.is_empty());

    assert_eq!(state.phase(), SyncPhase::Syncing);
    assert_eq!(state.absorbed_ticks(), 2);
}

#[test]
fn successful_cycle_replaces_then_broadcasts() {
    let state = started();
    let content = rendered("## Title\n");

    let (state, effects) = update(state, Msg::Rendered(content.clone()));
    assert_eq!(
        effects,
        vec![
            Effect::ReplaceContent(content),
            Effect::Broadcast(Event::ContentUpdated),
        ]
    );
    assert_eq!(state.phase(), SyncPhase::Idle);
    assert_eq!(state.completed_cycles(), 1);

    let (state, effects) = update(state, Msg::Tick);
    assert_eq!(effects, vec![Effect::BeginCycle]);
    assert_eq!(state.cycle_number(), 2);
}

#[test]
fn failed_cycle_only_broadcasts_error() {
    let state = started();

    let (state, effects) = update(state, Msg::FetchFailed("timeout".to_string()));
    assert_eq!(effects, vec![Effect::Broadcast(Event::error("timeout"))]);
    assert_eq!(state.phase(), SyncPhase::Idle);
    assert_eq!(state.failed_cycles(), 1);
    assert_eq!(state.last_error(), Some("timeout"));

    // A later success clears the remembered error.
    let (state, _) = update(state, Msg::Tick);
    let (state, _) = update(state, Msg::Rendered(rendered("ok\n")));
    assert_eq!(state.last_error(), None);
}

#[test]
fn results_outside_a_cycle_are_ignored() {
    init_logging();
    let (state, effects) = update(SyncState::new(), Msg::Rendered(rendered("stray")));
    assert!(effects.is_empty());
    assert_eq!(state.completed_cycles(), 0);

    let (state, effects) = update(state, Msg::FetchFailed("late".to_string()));
    assert!(effects.is_empty());
    assert_eq!(state.failed_cycles(), 0);
}

#[test]
fn stop_while_idle_halts_immediately() {
    let state = started();
    let (state, _) = update(state, Msg::Rendered(rendered("x")));

    let (state, effects) = update(state, Msg::StopRequested);
    assert_eq!(effects, vec![Effect::Halt]);
    assert!(state.is_stopped());

    let (state, effects) = update(state, Msg::Tick);
    assert!(effects.is_empty());
    assert!(state.is_stopped());
}

#[test]
fn stop_during_cycle_lets_it_finish() {
    let state = started();

    let (state, effects) = update(state, Msg::StopRequested);
    assert!(effects.is_empty());
    assert_eq!(state.phase(), SyncPhase::Syncing);

    let content = rendered("final");
    let (state, effects) = update(state, Msg::Rendered(content.clone()));
    assert_eq!(
        effects,
        vec![
            Effect::ReplaceContent(content),
            Effect::Broadcast(Event::ContentUpdated),
            Effect::Halt,
        ]
    );
    assert!(state.is_stopped());
}
