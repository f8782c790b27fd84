//! Report model and its renderings.

use serde::{Deserialize, Serialize};

use std::fmt::Write as _;

use crate::{QprofResult, StatementProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Text,
    Json,
}

impl clap::ValueEnum for ReportFormat {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Text, Self::Json]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Text => clap::builder::PossibleValue::new("text"),
            Self::Json => clap::builder::PossibleValue::new("json"),
        })
    }
}

/// Sections rendered in addition to CPU. Both are off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    #[serde(default)]
    pub memory: bool,
    #[serde(default)]
    pub block_io: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportEntry {
    pub statement: String,
    pub profile: StatementProfile,
}

/// Statement text to profile, in order of first occurrence.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Report {
    entries: Vec<ReportEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a profile. A statement already present keeps its position and
    /// takes the new profile.
    pub fn insert(&mut self, statement: String, profile: StatementProfile) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.statement == statement) {
            entry.profile = profile;
            return;
        }
        self.entries.push(ReportEntry { statement, profile });
    }

    pub fn get(&self, statement: &str) -> Option<&StatementProfile> {
        self.entries
            .iter()
            .find(|e| e.statement == statement)
            .map(|e| &e.profile)
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn render(report: &Report, options: RenderOptions) -> String {
    let mut out = String::new();
    for entry in report.entries() {
        render_entry(&mut out, entry, options);
        out.push('\n');
    }
    out
}

pub fn render_json(report: &Report) -> QprofResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn render_as(
    report: &Report,
    format: ReportFormat,
    options: RenderOptions,
) -> QprofResult<String> {
    match format {
        ReportFormat::Text => Ok(render(report, options)),
        ReportFormat::Json => render_json(report),
    }
}

// fmt::Write into a String is infallible.
fn render_entry(out: &mut String, entry: &ReportEntry, options: RenderOptions) {
    let profile = &entry.profile;
    let _ = writeln!(out, "--- Profile: {} ---", entry.statement);

    if profile.cpu_available {
        out.push_str("\n CPU Profiling:\n");
        for row in &profile.cpu_rows {
            let _ = writeln!(
                out,
                "Stage: {}, Duration: {} seconds, CPU_user: {} seconds, CPU_system: {} seconds",
                row.stage, row.duration, row.cpu_user, row.cpu_system
            );
        }
        let _ = writeln!(out, "\nTotal CPU_user: {} seconds", profile.total_cpu_user);
        let _ = writeln!(out, "Total CPU_system: {} seconds", profile.total_cpu_system);
    } else {
        out.push_str("No CPU data available.\n");
    }

    if options.memory {
        if profile.memory_available {
            out.push_str("\n Memory Profiling:\n");
            for row in &profile.memory_rows {
                let Some(allocation) = row.allocation else {
                    continue;
                };
                let _ = writeln!(
                    out,
                    "Stage: {}, Duration: {} seconds, Memory Allocation: {}",
                    row.stage, row.duration, allocation
                );
            }
            let _ = writeln!(out, "\nTotal Memory Allocation: {}", profile.total_memory);
        } else {
            out.push_str("No memory data available.\n");
        }
    }

    if options.block_io {
        if profile.has_block_io() {
            out.push_str("\n Block I/O Profiling:\n");
            for row in &profile.block_io_rows {
                let _ = writeln!(
                    out,
                    "Stage: {}, I/O Time: {} seconds, Read: {}, Write: {}",
                    row.stage,
                    row.io_time(),
                    row.reads,
                    row.writes
                );
            }
        } else {
            out.push_str("No I/O data available.\n");
        }
    }
}
