use crate::{Effect, Event, Msg, SyncPhase, SyncState};

/// Pure update function: applies a message to the sync state and returns the
/// effects the driver must execute, in order.
///
/// Cycles never overlap. A tick that arrives while a cycle is running is
/// absorbed, and a stop request during a cycle is latched until the cycle
/// has published its result.
pub fn update(mut state: SyncState, msg: Msg) -> (SyncState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started | Msg::Tick => match state.phase() {
            SyncPhase::Idle if !state.stop_requested() => {
                state.begin_cycle();
                vec![Effect::BeginCycle]
            }
            SyncPhase::Syncing => {
                state.absorb_tick();
                Vec::new()
            }
            SyncPhase::Idle | SyncPhase::Stopped => Vec::new(),
        },
        Msg::FetchFailed(message) => {
            if state.phase() != SyncPhase::Syncing {
                return (state, Vec::new());
            }
            state.record_failure(&message);
            let mut effects = vec![Effect::Broadcast(Event::Error(message))];
            finish_cycle(&mut state, &mut effects);
            effects
        }
        Msg::Rendered(content) => {
            if state.phase() != SyncPhase::Syncing {
                return (state, Vec::new());
            }
            state.record_success();
            let mut effects = vec![
                Effect::ReplaceContent(content),
                Effect::Broadcast(Event::ContentUpdated),
            ];
            finish_cycle(&mut state, &mut effects);
            effects
        }
        Msg::StopRequested => match state.phase() {
            SyncPhase::Idle => {
                state.halt();
                vec![Effect::Halt]
            }
            SyncPhase::Syncing => {
                state.latch_stop();
                Vec::new()
            }
            SyncPhase::Stopped => Vec::new(),
        },
    };

    (state, effects)
}

fn finish_cycle(state: &mut SyncState, effects: &mut Vec<Effect>) {
    if state.stop_requested() {
        state.halt();
        effects.push(Effect::Halt);
    }
}
