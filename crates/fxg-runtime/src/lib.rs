#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

pub const WRITTEN_REASON_CODE: &str = "case_written";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CaseOutcome {
    Written,
    /// A shape or value guard rejected the tuple; no file was written.
    Skipped,
    /// The delegated call failed in a way expected for this input.
    Suppressed,
}

impl CaseOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Written => "written",
            Self::Skipped => "skipped",
            Self::Suppressed => "suppressed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseEvent {
    pub ts_millis: u128,
    pub prefix: String,
    pub op: String,
    pub suffix: String,
    pub outcome: CaseOutcome,
    pub reason_code: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilySummary {
    pub prefix: String,
    pub written: usize,
    pub skipped: usize,
    pub suppressed: usize,
}

impl FamilySummary {
    #[must_use]
    pub fn total(&self) -> usize {
        self.written + self.skipped + self.suppressed
    }
}

#[derive(Debug, Default, Clone)]
pub struct GenerationLedger {
    events: Vec<CaseEvent>,
}

impl GenerationLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: CaseEvent) {
        self.events.push(event);
    }

    /// Timestamp and record one case outcome.
    pub fn record_case(
        &mut self,
        prefix: &str,
        op: &str,
        suffix: &str,
        outcome: CaseOutcome,
        reason_code: &'static str,
    ) -> CaseOutcome {
        let ts_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis());
        self.record(CaseEvent {
            ts_millis,
            prefix: prefix.to_string(),
            op: op.to_string(),
            suffix: suffix.to_string(),
            outcome,
            reason_code,
        });
        outcome
    }

    #[must_use]
    pub fn events(&self) -> &[CaseEvent] {
        &self.events
    }

    #[must_use]
    pub fn last(&self) -> Option<&CaseEvent> {
        self.events.last()
    }

    #[must_use]
    pub fn count(&self, outcome: CaseOutcome) -> usize {
        self.events.iter().filter(|e| e.outcome == outcome).count()
    }

    /// Per-prefix counts, ordered by prefix.
    #[must_use]
    pub fn summary(&self) -> Vec<FamilySummary> {
        let mut by_prefix: BTreeMap<&str, FamilySummary> = BTreeMap::new();
        for event in &self.events {
            let entry = by_prefix
                .entry(event.prefix.as_str())
                .or_insert_with(|| FamilySummary {
                    prefix: event.prefix.clone(),
                    ..FamilySummary::default()
                });
            match event.outcome {
                CaseOutcome::Written => entry.written += 1,
                CaseOutcome::Skipped => entry.skipped += 1,
                CaseOutcome::Suppressed => entry.suppressed += 1,
            }
        }
        by_prefix.into_values().collect()
    }

    /// Reason codes behind skipped and suppressed cases, with counts.
    #[must_use]
    pub fn reason_histogram(&self) -> BTreeMap<&'static str, usize> {
        let mut histogram = BTreeMap::new();
        for event in self
            .events
            .iter()
            .filter(|e| e.outcome != CaseOutcome::Written)
        {
            *histogram.entry(event.reason_code).or_insert(0) += 1;
        }
        histogram
    }
}
