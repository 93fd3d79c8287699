use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Phases whose wall-clock duration is recorded for bottleneck analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimedPhase {
    AccountDetection,
    StrategySelection,
    Preparation,
    IntentCreation,
    SignatureWait,
    Execution,
    Confirmation,
}

/// Bottleneck candidates; preparation and selection are excluded because
/// they never dominate and are not tunable
const BOTTLENECK_PHASES: [TimedPhase; 4] = [
    TimedPhase::IntentCreation,
    TimedPhase::SignatureWait,
    TimedPhase::Execution,
    TimedPhase::Confirmation,
];

/// Per-phase wall-clock durations recorded across one attempt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseTimings {
    durations: HashMap<TimedPhase, Duration>,
}

impl PhaseTimings {
    pub fn record(&mut self, phase: TimedPhase, duration: Duration) {
        // Re-entered phases (recovery restarts) accumulate
        *self.durations.entry(phase).or_default() += duration;
    }

    pub fn get(&self, phase: TimedPhase) -> Option<Duration> {
        self.durations.get(&phase).copied()
    }

    pub fn total(&self) -> Duration {
        self.durations.values().sum()
    }

    /// The slowest of the reportable phases, or None before any completed
    pub fn bottleneck(&self) -> Option<TimedPhase> {
        BOTTLENECK_PHASES
            .iter()
            .filter_map(|p| self.durations.get(p).map(|d| (*p, *d)))
            .max_by_key(|(_, d)| *d)
            .map(|(p, _)| p)
    }

    pub fn merge(&mut self, other: &PhaseTimings) {
        for (phase, duration) in &other.durations {
            self.record(*phase, *duration);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }
}
