#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    Syncing,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncState {
    phase: SyncPhase,
    stop_requested: bool,
    completed_cycles: u64,
    failed_cycles: u64,
    absorbed_ticks: u64,
    last_error: Option<String>,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn is_stopped(&self) -> bool {
        self.phase == SyncPhase::Stopped
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    pub fn completed_cycles(&self) -> u64 {
        self.completed_cycles
    }

    pub fn failed_cycles(&self) -> u64 {
        self.failed_cycles
    }

    /// Number of started cycles, successful or not, including one in flight.
    pub fn cycle_number(&self) -> u64 {
        let finished = self.completed_cycles + self.failed_cycles;
        if self.phase == SyncPhase::Syncing {
            finished + 1
        } else {
            finished
        }
    }

    /// Ticks that fired while a cycle was still running.
    pub fn absorbed_ticks(&self) -> u64 {
        self.absorbed_ticks
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn begin_cycle(&mut self) {
        self.phase = SyncPhase::Syncing;
    }

    pub(crate) fn absorb_tick(&mut self) {
        self.absorbed_ticks += 1;
    }

    pub(crate) fn record_failure(&mut self, message: &str) {
        self.failed_cycles += 1;
        self.last_error = Some(message.to_string());
        self.phase = SyncPhase::Idle;
    }

    pub(crate) fn record_success(&mut self) {
        self.completed_cycles += 1;
        self.last_error = None;
        self.phase = SyncPhase::Idle;
    }

    pub(crate) fn latch_stop(&mut self) {
        self.stop_requested = true;
    }

    pub(crate) fn halt(&mut self) {
        self.stop_requested = true;
        self.phase = SyncPhase::Stopped;
    }
}
