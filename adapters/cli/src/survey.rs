//! Batch generation statistics.

use std::fmt;

use log::warn;
use veiled_hollow_system_bootstrap::DungeonGenerator;
use veiled_hollow_world::query;

/// Aggregated outcome of generating a range of seeds.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SurveyReport {
    pub(crate) runs: u64,
    pub(crate) failures: u64,
    pub(crate) min_rooms: Option<usize>,
    pub(crate) max_rooms: Option<usize>,
    total_rooms: u64,
}

impl SurveyReport {
    fn record(&mut self, rooms: usize) {
        self.min_rooms = Some(self.min_rooms.map_or(rooms, |min| min.min(rooms)));
        self.max_rooms = Some(self.max_rooms.map_or(rooms, |max| max.max(rooms)));
        self.total_rooms += rooms as u64;
    }

    /// Mean room count over the successful runs.
    pub(crate) fn mean_rooms(&self) -> Option<f64> {
        let successes = self.runs - self.failures;
        (successes > 0).then(|| self.total_rooms as f64 / successes as f64)
    }
}

impl fmt::Display for SurveyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} runs, {} failed", self.runs, self.failures)?;
        match (self.min_rooms, self.mean_rooms(), self.max_rooms) {
            (Some(min), Some(mean), Some(max)) => {
                write!(f, ", rooms min {min} / mean {mean:.2} / max {max}")
            }
            _ => Ok(()),
        }
    }
}

/// Generates `runs` consecutive seeds starting at `start_seed`.
pub(crate) fn run(generator: &DungeonGenerator, start_seed: u64, runs: u64) -> SurveyReport {
    let mut report = SurveyReport::default();
    for seed in (start_seed..).take(usize::try_from(runs).unwrap_or(usize::MAX)) {
        report.runs += 1;
        match generator.generate(seed) {
            Ok(level) => report.record(query::rooms(&level).len()),
            Err(error) => {
                warn!("seed {seed}: {error}");
                report.failures += 1;
            }
        }
    }
    report
}
