use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::similarity::SimilarityMetric;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolveConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub incidents: IncidentColumns,
    pub registry: RegistryColumns,
    #[serde(default)]
    pub matching: MatchingConfig,
}

fn default_name() -> String {
    "incident resolution".into()
}

// ---------------------------------------------------------------------------
// Column roles
// ---------------------------------------------------------------------------

/// Column bindings for the incident table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IncidentColumns {
    /// CSV path, relative to the config file. Only used by the CLI loader.
    #[serde(default)]
    pub file: Option<String>,
    /// Location-description column joined against registry codes.
    pub key: String,
    /// Alternate names for the key column, tried in order when `key` is absent.
    #[serde(default)]
    pub key_aliases: Vec<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl IncidentColumns {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            file: None,
            key: key.into(),
            key_aliases: Vec::new(),
            id: None,
            date: None,
        }
    }

    /// `key` followed by its aliases.
    pub fn key_candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.key.as_str()).chain(self.key_aliases.iter().map(String::as_str))
    }
}

/// Column bindings for the registry table's logical roles.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryColumns {
    #[serde(default)]
    pub file: Option<String>,
    pub code: String,
    #[serde(default)]
    pub code_aliases: Vec<String>,
    pub name: String,
    pub latitude: String,
    pub longitude: String,
}

impl RegistryColumns {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
    ) -> Self {
        Self {
            file: None,
            code: code.into(),
            code_aliases: Vec::new(),
            name: name.into(),
            latitude: latitude.into(),
            longitude: longitude.into(),
        }
    }

    pub fn code_candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.code.as_str()).chain(self.code_aliases.iter().map(String::as_str))
    }
}

// ---------------------------------------------------------------------------
// Matching thresholds
// ---------------------------------------------------------------------------

pub const DEFAULT_NAME_CUTOFF: f64 = 0.38;
pub const DEFAULT_CODE_CUTOFF: f64 = 0.6;
pub const DEFAULT_FALLBACK_THRESHOLD_PCT: f64 = 5.0;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    #[serde(default)]
    pub metric: SimilarityMetric,
    /// Minimum similarity for a registry-name match.
    #[serde(default = "default_name_cutoff")]
    pub name_cutoff: f64,
    /// Minimum similarity for a registry-code match.
    #[serde(default = "default_code_cutoff")]
    pub code_cutoff: f64,
    /// Exact-join hit rate (percent) below which fuzzy fallback runs.
    #[serde(default = "default_fallback_threshold_pct")]
    pub fallback_threshold_pct: f64,
    /// Fuzzy-match at most this many incidents per run.
    #[serde(default)]
    pub max_fuzzy_incidents: Option<usize>,
    /// Consider at most this many registry rows as fuzzy candidates.
    #[serde(default)]
    pub max_candidates: Option<usize>,
}

fn default_name_cutoff() -> f64 {
    DEFAULT_NAME_CUTOFF
}

fn default_code_cutoff() -> f64 {
    DEFAULT_CODE_CUTOFF
}

fn default_fallback_threshold_pct() -> f64 {
    DEFAULT_FALLBACK_THRESHOLD_PCT
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            metric: SimilarityMetric::Sequence,
            name_cutoff: DEFAULT_NAME_CUTOFF,
            code_cutoff: DEFAULT_CODE_CUTOFF,
            fallback_threshold_pct: DEFAULT_FALLBACK_THRESHOLD_PCT,
            max_fuzzy_incidents: None,
            max_candidates: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ResolveConfig {
    pub fn new(incidents: IncidentColumns, registry: RegistryColumns) -> Self {
        Self {
            name: default_name(),
            incidents,
            registry,
            matching: MatchingConfig::default(),
        }
    }

    pub fn from_toml(input: &str) -> Result<Self, ResolveError> {
        let config: ResolveConfig =
            toml::from_str(input).map_err(|e| ResolveError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ResolveError> {
        let roles = [
            ("incidents", "key", &self.incidents.key),
            ("registry", "code", &self.registry.code),
            ("registry", "name", &self.registry.name),
            ("registry", "latitude", &self.registry.latitude),
            ("registry", "longitude", &self.registry.longitude),
        ];
        for (table, role, column) in roles {
            if column.trim().is_empty() {
                return Err(ResolveError::MissingRole {
                    table: table.into(),
                    role: role.into(),
                });
            }
        }

        if self.registry.latitude == self.registry.longitude {
            return Err(ResolveError::ConfigValidation(format!(
                "registry latitude and longitude are both bound to '{}'",
                self.registry.latitude
            )));
        }

        for (name, value) in [
            ("name_cutoff", self.matching.name_cutoff),
            ("code_cutoff", self.matching.code_cutoff),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ResolveError::CutoffOutOfRange {
                    name: name.into(),
                    value,
                });
            }
        }

        let threshold = self.matching.fallback_threshold_pct;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(ResolveError::ConfigValidation(format!(
                "fallback_threshold_pct must be within [0, 100], got {threshold}"
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
