// THEORY:
// The decision log records what the user did with each set of recommendations.
// Rows are appended in memory and exported as CSV on demand.
//
// Key architectural principles:
// 1.  **Fixed Header**: The first row is always
//     `timestamp,user_decision,prompts,internal_explanations`.
// 2.  **Flattened Lists**: Visible phrases are joined with " | ", hidden reasons
//     with " ; ", so each decision is exactly one row.
// 3.  **Quote Everything**: Every field is wrapped in double quotes with inner
//     quotes doubled; rows are joined by a bare "\n".

use crate::core_modules::recommendation::RecommendationSet;
use crate::error::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const CSV_HEADER: [&str; 4] = ["timestamp", "user_decision", "prompts", "internal_explanations"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Skip,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Accept => "accept",
            Decision::Skip => "skip",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "accept" => Ok(Decision::Accept),
            "skip" => Ok(Decision::Skip),
            other => Err(format!("unknown decision '{other}' (expected accept or skip)")),
        }
    }
}

/// One logged decision.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRow {
    pub timestamp: DateTime<Utc>,
    pub decision: Decision,
    /// Visible phrases joined with " | ".
    pub prompts: String,
    /// Hidden reasons joined with " ; ".
    pub explanations: String,
}

impl DecisionRow {
    pub fn new(timestamp: DateTime<Utc>, decision: Decision, recommendations: &RecommendationSet) -> Self {
        Self {
            timestamp,
            decision,
            prompts: recommendations.phrases.join(" | "),
            explanations: recommendations.reasons.join(" ; "),
        }
    }

    fn fields(&self) -> [String; 4] {
        [
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.decision.to_string(),
            self.prompts.clone(),
            self.explanations.clone(),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct DecisionLog {
    rows: Vec<DecisionRow>,
}

impl DecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row stamped with the current UTC time.
    pub fn record(&mut self, decision: Decision, recommendations: &RecommendationSet) -> &DecisionRow {
        self.push(DecisionRow::new(Utc::now(), decision, recommendations))
    }

    pub fn push(&mut self, row: DecisionRow) -> &DecisionRow {
        self.rows.push(row);
        &self.rows[self.rows.len() - 1]
    }

    pub fn rows(&self) -> &[DecisionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the header and all rows as CSV.
    pub fn to_csv(&self) -> String {
        let header = CSV_HEADER.map(String::from);
        std::iter::once(header)
            .chain(self.rows.iter().map(DecisionRow::fields))
            .map(|fields| fields.iter().map(|f| quote(f)).collect::<Vec<_>>().join(","))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn export(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_csv())?;
        Ok(())
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
