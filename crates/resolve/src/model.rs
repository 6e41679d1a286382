use serde::Serialize;

use crate::table::Table;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// One normalized registry row. `row` is its position in the loaded table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryEntry {
    pub row: usize,
    pub code: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl RegistryEntry {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

// ---------------------------------------------------------------------------
// Per-incident match
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    None,
    Exact,
    Fuzzy,
}

impl std::fmt::Display for MatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Exact => write!(f, "exact"),
            Self::Fuzzy => write!(f, "fuzzy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub source: MatchSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_row: Option<usize>,
    pub code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl MatchResult {
    pub fn none() -> Self {
        Self {
            source: MatchSource::None,
            registry_row: None,
            code: None,
            latitude: None,
            longitude: None,
            similarity: None,
        }
    }

    pub fn exact(entry: &RegistryEntry) -> Self {
        Self {
            source: MatchSource::Exact,
            registry_row: Some(entry.row),
            code: non_empty(&entry.code),
            latitude: entry.latitude,
            longitude: entry.longitude,
            similarity: None,
        }
    }

    pub fn fuzzy(entry: &RegistryEntry, similarity: f64) -> Self {
        Self {
            source: MatchSource::Fuzzy,
            registry_row: Some(entry.row),
            code: non_empty(&entry.code),
            latitude: entry.latitude,
            longitude: entry.longitude,
            similarity: Some(similarity),
        }
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Pipeline state + diagnostics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    ExactOnly,
    ExactPlusFuzzy,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExactOnly => write!(f, "exact_only"),
            Self::ExactPlusFuzzy => write!(f, "exact_plus_fuzzy"),
        }
    }
}

/// A malformed-input condition the pipeline recovered from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolveIssue {
    /// Join key column absent from `table`; no exact matches possible.
    MissingKeyColumn { table: String, column: String },
    /// A non-key registry role column is absent.
    MissingRegistryColumn { role: String, column: String },
    EmptyRegistry,
    /// Registry entries whose coordinates failed numeric coercion.
    NonNumericCoordinate { entries: usize },
    /// Registry rows discarded because an earlier row had the same code.
    DuplicateRegistryKey { discarded: usize },
}

impl std::fmt::Display for ResolveIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingKeyColumn { table, column } => {
                write!(f, "{table}: key column '{column}' not found")
            }
            Self::MissingRegistryColumn { role, column } => {
                write!(f, "registry: {role} column '{column}' not found")
            }
            Self::EmptyRegistry => write!(f, "registry has no rows"),
            Self::NonNumericCoordinate { entries } => {
                write!(f, "{entries} registry entr(ies) without numeric coordinates")
            }
            Self::DuplicateRegistryKey { discarded } => {
                write!(f, "{discarded} duplicate registry code(s) discarded")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Report + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionReport {
    pub state: PipelineState,
    pub total: usize,
    /// Rows whose final coordinates are present.
    pub matched: usize,
    pub exact_matched: usize,
    pub fuzzy_matched: usize,
    pub unmatched: usize,
    pub match_pct: f64,
    /// Exact-join hit rate that drove the fallback decision.
    pub exact_pct: f64,
    pub fuzzy_pct: f64,
    pub fuzzy_attempted: usize,
    /// Eligible incidents left out by `max_fuzzy_incidents`.
    pub fuzzy_skipped: usize,
    pub registry_entries: usize,
    pub duplicate_registry_keys: usize,
    pub non_numeric_coordinates: usize,
    /// Incidents whose key hit a registry code lacking usable coordinates.
    pub key_matched_without_coordinates: usize,
    pub issues: Vec<ResolveIssue>,
}

impl ResolutionReport {
    /// Report for a run that resolved nothing.
    pub fn unresolved(total: usize, issues: Vec<ResolveIssue>) -> Self {
        Self {
            state: PipelineState::ExactOnly,
            total,
            matched: 0,
            exact_matched: 0,
            fuzzy_matched: 0,
            unmatched: total,
            match_pct: 0.0,
            exact_pct: 0.0,
            fuzzy_pct: 0.0,
            fuzzy_attempted: 0,
            fuzzy_skipped: 0,
            registry_entries: 0,
            duplicate_registry_keys: 0,
            non_numeric_coordinates: 0,
            key_matched_without_coordinates: 0,
            issues,
        }
    }
}

/// Enriched incidents plus the run's report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub table: Table,
    pub report: ResolutionReport,
}

pub const RESOLVED_LATITUDE: &str = "resolved_latitude";
pub const RESOLVED_LONGITUDE: &str = "resolved_longitude";
pub const RESOLVED_CODE: &str = "resolved_code";
pub const MATCH_SOURCE: &str = "match_source";
