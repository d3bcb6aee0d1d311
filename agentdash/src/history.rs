//! Bounded history buffers: the rolling telemetry window for the chart and
//! the most-recent-first command log.

use std::collections::VecDeque;

use crate::types::{CommandRecord, TelemetrySample};

/// Samples kept for the live chart.
pub const TELEMETRY_WINDOW: usize = 20;
/// Command records kept when a cap is enforced.
pub const COMMAND_HISTORY_CAP: usize = 50;

pub fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    dq.push_back(v);
    while dq.len() > cap {
        dq.pop_front();
    }
}

// Rolling window of the last TELEMETRY_WINDOW samples, oldest first
#[derive(Debug, Clone)]
pub struct TimeSeriesBuffer {
    samples: VecDeque<TelemetrySample>,
    cap: usize,
}

impl TimeSeriesBuffer {
    pub fn new() -> Self {
        Self::with_capacity(TELEMETRY_WINDOW)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(cap),
            cap,
        }
    }

    // Appended as received: no dedup or reordering by timestamp
    pub fn append(&mut self, sample: TelemetrySample) {
        push_capped(&mut self.samples, sample, self.cap);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&TelemetrySample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TelemetrySample> {
        self.samples.iter()
    }

    /// Chart points `(index, value)` for one metric, oldest at x = 0.
    pub fn series(&self, pick: impl Fn(&TelemetrySample) -> f64) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .enumerate()
            .map(|(i, s)| (i as f64, pick(s).clamp(0.0, 100.0)))
            .collect()
    }
}

impl Default for TimeSeriesBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Command log, most recent first.
#[derive(Debug, Clone, Default)]
pub struct CommandHistory {
    records: VecDeque<CommandRecord>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend and drop the oldest entries beyond COMMAND_HISTORY_CAP.
    pub fn push_front_capped(&mut self, record: CommandRecord) -> &CommandRecord {
        self.records.push_front(record);
        self.records.truncate(COMMAND_HISTORY_CAP);
        &self.records[0]
    }

    /// Prepend without enforcing the cap. The local failure path of the
    /// command console uses this, so failures can grow the log past the cap.
    pub fn push_front_uncapped(&mut self, record: CommandRecord) -> &CommandRecord {
        self.records.push_front(record);
        &self.records[0]
    }

    // Replace everything with records already ordered most-recent-first
    pub fn replace(&mut self, records: Vec<CommandRecord>) {
        self.records = records.into();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn front(&self) -> Option<&CommandRecord> {
        self.records.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandRecord> {
        self.records.iter()
    }
}
