use crate::config::MatchingConfig;
use crate::model::MatchResult;
use crate::registry::Registry;
use crate::similarity::{Prepared, SimilarityMetric};

/// A registry string carried with the index of the entry it came from.
#[derive(Debug)]
struct Candidate {
    entry: usize,
    text: Prepared,
}

/// Best-match lookup of free-text keys against registry names, then codes.
///
/// Candidate lists keep registry load order, so a tie on similarity always
/// resolves to the earliest registry row.
pub struct FuzzyResolver<'a> {
    registry: &'a Registry,
    names: Vec<Candidate>,
    codes: Vec<Candidate>,
    metric: SimilarityMetric,
    name_cutoff: f64,
    code_cutoff: f64,
}

impl<'a> FuzzyResolver<'a> {
    pub fn new(registry: &'a Registry, matching: &MatchingConfig) -> Self {
        let limit = matching.max_candidates.unwrap_or(usize::MAX);
        let mut names = Vec::new();
        let mut codes = Vec::new();

        for (idx, entry) in registry.entries.iter().enumerate().take(limit) {
            if !entry.name.is_empty() {
                names.push(Candidate {
                    entry: idx,
                    text: Prepared::new(&entry.name),
                });
            }
            if !entry.code.is_empty() {
                codes.push(Candidate {
                    entry: idx,
                    text: Prepared::new(&entry.code),
                });
            }
        }

        Self {
            registry,
            names,
            codes,
            metric: matching.metric,
            name_cutoff: matching.name_cutoff,
            code_cutoff: matching.code_cutoff,
        }
    }

    pub fn candidate_count(&self) -> usize {
        self.names.len() + self.codes.len()
    }

    /// Resolve one normalized key. Empty keys never match.
    pub fn resolve_one(&self, key: &str) -> MatchResult {
        if key.is_empty() {
            return MatchResult::none();
        }
        let query = Prepared::new(key);

        let best = self
            .best(&self.names, &query, self.name_cutoff)
            .or_else(|| self.best(&self.codes, &query, self.code_cutoff));

        match best {
            Some((entry, score)) => MatchResult::fuzzy(&self.registry.entries[entry], score),
            None => MatchResult::none(),
        }
    }

    pub fn resolve<S: AsRef<str>>(&self, keys: &[S]) -> Vec<MatchResult> {
        keys.iter().map(|k| self.resolve_one(k.as_ref())).collect()
    }

    /// Highest-scoring candidate at or above `cutoff`; the first one wins
    /// a tie.
    fn best(&self, candidates: &[Candidate], query: &Prepared, cutoff: f64) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;

        for candidate in candidates {
            let bound = self.metric.upper_bound(&candidate.text, query);
            let floor = best.map_or(cutoff, |(_, score)| score);
            if bound < floor || (best.is_some() && bound <= floor) {
                continue;
            }

            let score = self.metric.score(&candidate.text, query);
            if score < cutoff {
                continue;
            }
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((candidate.entry, score));
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryColumns;
    use crate::model::MatchSource;
    use crate::table::Table;
    use serde_json::{json, Value};

    fn registry(rows: Vec<Vec<Value>>) -> Registry {
        let table = Table::from_rows(
            vec!["Code".into(), "Airport Name".into(), "Latitude".into(), "Longitude".into()],
            rows,
        );
        Registry::from_table(
            &table,
            &RegistryColumns::new("Code", "Airport Name", "Latitude", "Longitude"),
        )
    }

    fn delhi() -> Registry {
        registry(vec![vec![json!("DEL"), json!("Delhi Airport"), json!(28.5), json!(77.1)]])
    }

    #[test]
    fn name_match_above_cutoff() {
        let reg = delhi();
        let resolver = FuzzyResolver::new(&reg, &MatchingConfig::default());
        let m = resolver.resolve_one("Delhi Arpt");
        assert_eq!(m.source, MatchSource::Fuzzy);
        assert_eq!(m.code.as_deref(), Some("DEL"));
        assert_eq!(m.latitude, Some(28.5));
        assert_eq!(m.longitude, Some(77.1));
        assert!(m.similarity.unwrap() >= 0.38);
    }

    #[test]
    fn unrelated_text_is_none() {
        let reg = delhi();
        let resolver = FuzzyResolver::new(&reg, &MatchingConfig::default());
        assert_eq!(resolver.resolve_one("Unknown Place"), MatchResult::none());
    }

    #[test]
    fn empty_key_is_none() {
        let reg = delhi();
        let resolver = FuzzyResolver::new(&reg, &MatchingConfig::default());
        assert_eq!(resolver.resolve_one(""), MatchResult::none());
    }

    #[test]
    fn falls_back_to_code_list() {
        // "DEL1" shares nothing useful with the name but is close to the code
        let reg = delhi();
        let resolver = FuzzyResolver::new(&reg, &MatchingConfig::default());
        let m = resolver.resolve_one("DEL1");
        assert_eq!(m.source, MatchSource::Fuzzy);
        let score = m.similarity.unwrap();
        assert!((score - 6.0 / 7.0).abs() < 1e-9);
        assert!(score >= 0.6);
    }

    #[test]
    fn code_cutoff_is_stricter() {
        // "DXL" vs "DEL" = 4/6 passes 0.6; "DXX" vs "DEL" = 2/6 does not
        let reg = delhi();
        let resolver = FuzzyResolver::new(&reg, &MatchingConfig::default());
        assert_eq!(resolver.resolve_one("DXL").source, MatchSource::Fuzzy);
        assert_eq!(resolver.resolve_one("DXX").source, MatchSource::None);
    }

    #[test]
    fn tie_resolves_to_first_loaded() {
        let reg = registry(vec![
            vec![json!("AAA"), json!("Port Blair"), json!(11.64), json!(92.71)],
            vec![json!("BBB"), json!("Port Blair"), json!(0.0), json!(0.0)],
        ]);
        let resolver = FuzzyResolver::new(&reg, &MatchingConfig::default());
        let m = resolver.resolve_one("Port Blaire");
        assert_eq!(m.code.as_deref(), Some("AAA"));
        assert_eq!(m.registry_row, Some(0));
    }

    #[test]
    fn best_candidate_wins_over_earlier_weaker() {
        let reg = registry(vec![
            vec![json!("IXC"), json!("Chandigarh Airport"), json!(30.67), json!(76.79)],
            vec![json!("MAA"), json!("Chennai Airport"), json!(12.99), json!(80.17)],
        ]);
        let resolver = FuzzyResolver::new(&reg, &MatchingConfig::default());
        let m = resolver.resolve_one("Chennai");
        assert_eq!(m.code.as_deref(), Some("MAA"));
    }

    #[test]
    fn max_candidates_limits_registry_scan() {
        let reg = registry(vec![
            vec![json!("IXC"), json!("Chandigarh Airport"), json!(30.67), json!(76.79)],
            vec![json!("MAA"), json!("Chennai Airport"), json!(12.99), json!(80.17)],
        ]);
        let matching = MatchingConfig {
            max_candidates: Some(1),
            ..MatchingConfig::default()
        };
        let resolver = FuzzyResolver::new(&reg, &matching);
        assert_eq!(resolver.candidate_count(), 2);
        assert_ne!(resolver.resolve_one("Chennai").code.as_deref(), Some("MAA"));
    }

    #[test]
    fn fuzzy_hit_without_coordinates_keeps_source() {
        let reg = registry(vec![vec![json!("GOI"), json!("Goa Airport"), json!("?"), json!(73.8)]]);
        let resolver = FuzzyResolver::new(&reg, &MatchingConfig::default());
        let m = resolver.resolve_one("Goa Arpt");
        assert_eq!(m.source, MatchSource::Fuzzy);
        assert!(!m.has_coordinates());
    }

    #[test]
    fn deterministic_across_calls() {
        let reg = registry(vec![
            vec![json!("BLR"), json!("Bengaluru Airport"), json!(13.2), json!(77.7)],
            vec![json!("HYD"), json!("Hyderabad Airport"), json!(17.24), json!(78.43)],
            vec![json!("CCU"), json!("Kolkata Airport"), json!(22.65), json!(88.45)],
        ]);
        let resolver = FuzzyResolver::new(&reg, &MatchingConfig::default());
        let keys = ["Bangalore", "Hyderabad Arpt", "Calcutta", "", "BLR"];
        assert_eq!(resolver.resolve(&keys), resolver.resolve(&keys));
    }

    #[test]
    fn levenshtein_metric_selectable() {
        let reg = delhi();
        let matching = MatchingConfig {
            metric: SimilarityMetric::Levenshtein,
            ..MatchingConfig::default()
        };
        let resolver = FuzzyResolver::new(&reg, &matching);
        let m = resolver.resolve_one("Delhi Arpt");
        assert_eq!(m.source, MatchSource::Fuzzy);
        assert!((m.similarity.unwrap() - 10.0 / 13.0).abs() < 1e-9);
    }
}
