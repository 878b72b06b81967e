// Copyright (c) 2023, 2025 Oracle and/or its affiliates.
// SPDX-License-Identifier: UPL-1.0

//! Per-resource outcomes and the end-of-run report.

use crate::kinds::ResourceKind;
use std::time::{Duration, Instant};

/// What happened to one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeKind {
    /// Tag written (or rewritten).
    Tagged,
    /// Tag already correct; nothing sent.
    Skipped,
    /// Update failed; the run continued.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub region: String,
    pub availability_domain: Option<String>,
    pub compartment: String,
    pub kind: ResourceKind,
    pub name: String,
    pub resource_id: String,
    pub result: OutcomeKind,
}

impl Outcome {
    /// One fixed-width progress line, matching the format operators watch
    /// scroll by: region, AD suffix, compartment, kind, resource name.
    pub fn line(&self) -> String {
        format!(
            "{:<15} {:<6} {:<20} {:<15} {:<20} {}",
            clip(&self.region, 15),
            ad_suffix(self.availability_domain.as_deref()),
            clip(&self.compartment, 18),
            self.kind.label(),
            clip(&self.name, 18),
            match &self.result {
                OutcomeKind::Tagged => "tagged",
                OutcomeKind::Skipped => "ok",
                OutcomeKind::Failed(_) => "FAILED",
            }
        )
    }
}

/// Accumulates outcomes for the whole run.
#[derive(Debug)]
pub struct RunReport {
    started: Instant,
    outcomes: Vec<Outcome>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn tagged(&self) -> usize {
        self.count(|r| matches!(r, OutcomeKind::Tagged))
    }

    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r, OutcomeKind::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|r| matches!(r, OutcomeKind::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, OutcomeKind::Failed(_)))
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Closing summary: totals plus the error block when anything failed.
    pub fn render(&self) -> String {
        let mut out = format!(
            "completed in {}s: {} tagged, {} already correct, {} failed (of {} seen)",
            self.elapsed().as_secs(),
            self.tagged(),
            self.skipped(),
            self.failed(),
            self.outcomes.len(),
        );
        for failure in self.failures() {
            if let OutcomeKind::Failed(reason) = &failure.result {
                out.push_str(&format!(
                    "\n  error: {} {} ({}): {}",
                    failure.kind.label(),
                    failure.name,
                    failure.resource_id,
                    reason
                ));
            }
        }
        out
    }
}

impl RunReport {
    fn count(&self, pred: impl Fn(&OutcomeKind) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.result)).count()
    }
}

/// Last four characters of the availability domain (the `AD-1` part), or
/// blank for regional resources.
pub fn ad_suffix(ad: Option<&str>) -> &str {
    match ad {
        Some(name) => {
            let start = name
                .char_indices()
                .rev()
                .nth(3)
                .map_or(0, |(idx, _)| idx);
            &name[start..]
        }
        None => "",
    }
}

fn clip(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
