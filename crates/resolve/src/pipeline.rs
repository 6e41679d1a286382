use crate::config::ResolveConfig;
use crate::exact::exact_join;
use crate::fuzzy::FuzzyResolver;
use crate::merge::{attach_columns, build_report, merge, percent};
use crate::model::{MatchResult, PipelineState, Resolution, ResolutionReport, ResolveIssue};
use crate::normalize::normalized_column;
use crate::registry::Registry;
use crate::table::Table;

/// Resolve every incident to registry coordinates.
///
/// Never fails on malformed data: missing columns, an empty registry,
/// duplicate codes and non-numeric coordinates are recovered locally and
/// listed in the report. Inputs are read-only; output row order equals
/// input row order.
pub fn resolve(config: &ResolveConfig, incidents: &Table, registry: &Table) -> Resolution {
    let total = incidents.len();
    let mut issues = Vec::new();

    let keys = match incidents.first_present(config.incidents.key_candidates()) {
        Some((idx, column)) => {
            if column != config.incidents.key {
                log::debug!("incident key '{}' found under alias '{column}'", config.incidents.key);
            }
            normalized_column(incidents, idx)
        }
        None => {
            log::warn!("incidents: key column '{}' not found", config.incidents.key);
            issues.push(ResolveIssue::MissingKeyColumn {
                table: "incidents".into(),
                column: config.incidents.key.clone(),
            });
            vec![String::new(); total]
        }
    };

    let registry = Registry::from_table(registry, &config.registry);
    issues.extend(registry.issues.iter().cloned());

    if registry.is_empty() {
        log::warn!("registry missing or empty; returning {total} incident(s) unresolved");
        let merged = vec![MatchResult::none(); total];
        return Resolution {
            table: attach_columns(incidents, &merged),
            report: ResolutionReport::unresolved(total, issues),
        };
    }

    // ExactOnly
    let exact = exact_join(&keys, &registry);
    let exact_pct = percent(exact.matched, total);
    log::info!(
        "exact join matched {} / {} rows ({:.1}%)",
        exact.matched,
        total,
        exact_pct
    );

    let state = if exact.matched == 0 || exact_pct < config.matching.fallback_threshold_pct {
        PipelineState::ExactPlusFuzzy
    } else {
        PipelineState::ExactOnly
    };

    // ExactPlusFuzzy: only incidents without exact coordinates are eligible
    let mut fuzzy_attempted = 0;
    let mut fuzzy_skipped = 0;
    let fuzzy = match state {
        PipelineState::ExactOnly => None,
        PipelineState::ExactPlusFuzzy => {
            log::info!("performing fuzzy matching fallback ({})", config.matching.metric);
            let resolver = FuzzyResolver::new(&registry, &config.matching);
            let limit = config.matching.max_fuzzy_incidents.unwrap_or(usize::MAX);
            let mut results = vec![MatchResult::none(); total];

            for (i, ex) in exact.results.iter().enumerate() {
                if ex.has_coordinates() {
                    continue;
                }
                if fuzzy_attempted >= limit {
                    fuzzy_skipped += 1;
                    continue;
                }
                fuzzy_attempted += 1;
                results[i] = resolver.resolve_one(&keys[i]);
            }

            if fuzzy_skipped > 0 {
                log::warn!("fuzzy matching capped at {limit}; {fuzzy_skipped} incident(s) skipped");
            }
            Some(results)
        }
    };

    let merged = merge(&exact.results, fuzzy.as_deref());

    let mut report = build_report(state, &merged);
    report.exact_pct = exact_pct;
    report.fuzzy_attempted = fuzzy_attempted;
    report.fuzzy_skipped = fuzzy_skipped;
    report.registry_entries = registry.len();
    report.duplicate_registry_keys = registry.duplicate_keys;
    report.non_numeric_coordinates = registry.non_numeric_coordinates;
    report.key_matched_without_coordinates = exact.key_matched_without_coordinates;
    report.issues = issues;

    log::info!(
        "{} / {} rows have coordinates ({:.1}%): {} exact, {} fuzzy",
        report.matched,
        report.total,
        report.match_pct,
        report.exact_matched,
        report.fuzzy_matched
    );

    Resolution {
        table: attach_columns(incidents, &merged),
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IncidentColumns, RegistryColumns};
    use crate::model::{MatchSource, MATCH_SOURCE, RESOLVED_LATITUDE};
    use serde_json::{json, Value};

    fn config() -> ResolveConfig {
        ResolveConfig::new(
            IncidentColumns::new("loc"),
            RegistryColumns::new("code", "name", "lat", "lon"),
        )
    }

    fn registry(rows: Vec<Vec<Value>>) -> Table {
        Table::from_rows(
            vec!["code".into(), "name".into(), "lat".into(), "lon".into()],
            rows,
        )
    }

    fn incidents(locs: &[&str]) -> Table {
        Table::from_rows(
            vec!["id".into(), "loc".into()],
            locs.iter()
                .enumerate()
                .map(|(i, l)| vec![json!(i + 1), json!(l)])
                .collect(),
        )
    }

    fn source_of(res: &Resolution, row: usize) -> &str {
        let col = res.table.column_index(MATCH_SOURCE).unwrap();
        res.table.rows[row][col].as_str().unwrap()
    }

    #[test]
    fn high_exact_rate_skips_fuzzy() {
        let reg = registry(vec![
            vec![json!("DEL"), json!("Delhi Airport"), json!(28.5), json!(77.1)],
            vec![json!("BOM"), json!("Mumbai Airport"), json!(19.09), json!(72.87)],
        ]);
        let res = resolve(&config(), &incidents(&["DEL", "Mumbai Arpt"]), &reg);
        assert_eq!(res.report.state, PipelineState::ExactOnly);
        assert_eq!(res.report.fuzzy_attempted, 0);
        assert_eq!(source_of(&res, 0), "exact");
        // would fuzzy-match, but the exact rate (50%) is above threshold
        assert_eq!(source_of(&res, 1), "none");
    }

    #[test]
    fn low_exact_rate_triggers_fuzzy() {
        let reg = registry(vec![vec![json!("DEL"), json!("Delhi Airport"), json!(28.5), json!(77.1)]]);
        let mut locs = vec!["Delhi Arpt"; 20];
        locs[0] = "DEL"; // 1/20 = 5%: not below threshold
        let res = resolve(&config(), &incidents(&locs), &reg);
        assert_eq!(res.report.state, PipelineState::ExactOnly);

        let mut locs = vec!["Delhi Arpt"; 21];
        locs[0] = "DEL"; // 1/21 < 5%
        let res = resolve(&config(), &incidents(&locs), &reg);
        assert_eq!(res.report.state, PipelineState::ExactPlusFuzzy);
        assert_eq!(res.report.fuzzy_attempted, 20);
        assert_eq!(res.report.exact_matched, 1);
        assert_eq!(res.report.fuzzy_matched, 20);
        assert_eq!(res.report.match_pct, 100.0);
    }

    #[test]
    fn missing_key_column_degrades() {
        let reg = registry(vec![vec![json!("DEL"), json!("Delhi Airport"), json!(28.5), json!(77.1)]]);
        let inc = Table::from_rows(vec!["id".into()], vec![vec![json!(1)], vec![json!(2)]]);
        let res = resolve(&config(), &inc, &reg);
        assert_eq!(res.table.len(), 2);
        assert_eq!(res.report.matched, 0);
        assert_eq!(res.report.fuzzy_attempted, 2);
        assert!(matches!(
            res.report.issues[0],
            ResolveIssue::MissingKeyColumn { ref table, .. } if table == "incidents"
        ));
    }

    #[test]
    fn key_alias_is_used() {
        let reg = registry(vec![vec![json!("DEL"), json!("Delhi Airport"), json!(28.5), json!(77.1)]]);
        let inc = Table::from_rows(vec!["Airport".into()], vec![vec![json!("DEL")]]);
        let mut cfg = config();
        cfg.incidents.key_aliases = vec!["Airport".into()];
        let res = resolve(&cfg, &inc, &reg);
        assert_eq!(res.report.exact_matched, 1);
        assert!(res.report.issues.is_empty());
    }

    #[test]
    fn registry_without_code_column_still_fuzzy_matches_names() {
        let reg = Table::from_rows(
            vec!["name".into(), "lat".into(), "lon".into()],
            vec![vec![json!("Delhi Airport"), json!(28.5), json!(77.1)]],
        );
        let res = resolve(&config(), &incidents(&["Delhi Arpt"]), &reg);
        assert_eq!(res.report.fuzzy_matched, 1);
        let lat = res.table.column_index(RESOLVED_LATITUDE).unwrap();
        assert_eq!(res.table.rows[0][lat], json!(28.5));
    }

    #[test]
    fn empty_registry_returns_unresolved() {
        let res = resolve(&config(), &incidents(&["DEL", "BOM"]), &registry(vec![]));
        assert_eq!(res.report.total, 2);
        assert_eq!(res.report.matched, 0);
        assert_eq!(res.report.unmatched, 2);
        assert_eq!(res.report.issues, vec![ResolveIssue::EmptyRegistry]);
        assert_eq!(source_of(&res, 1), "none");
    }

    #[test]
    fn empty_incidents() {
        let reg = registry(vec![vec![json!("DEL"), json!("Delhi Airport"), json!(28.5), json!(77.1)]]);
        let res = resolve(&config(), &incidents(&[]), &reg);
        assert_eq!(res.report.total, 0);
        assert_eq!(res.report.fuzzy_attempted, 0);
        assert!(res.table.has_column(MATCH_SOURCE));
    }

    #[test]
    fn fuzzy_cap_counts_skipped() {
        let reg = registry(vec![vec![json!("DEL"), json!("Delhi Airport"), json!(28.5), json!(77.1)]]);
        let mut cfg = config();
        cfg.matching.max_fuzzy_incidents = Some(2);
        let res = resolve(&cfg, &incidents(&["Delhi Arpt"; 5]), &reg);
        assert_eq!(res.report.fuzzy_attempted, 2);
        assert_eq!(res.report.fuzzy_skipped, 3);
        assert_eq!(res.report.fuzzy_matched, 2);
        assert_eq!(source_of(&res, 4), "none");
    }

    #[test]
    fn key_hit_without_coordinates_reported() {
        let reg = registry(vec![vec![json!("GOI"), json!("Goa Airport"), json!("n/a"), json!(73.8)]]);
        let res = resolve(&config(), &incidents(&["GOI"]), &reg);
        assert_eq!(res.report.key_matched_without_coordinates, 1);
        assert_eq!(res.report.non_numeric_coordinates, 1);
        assert_eq!(res.report.matched, 0);
        assert_eq!(source_of(&res, 0), MatchSource::None.to_string());
    }

    #[test]
    fn caller_tables_untouched() {
        let reg = registry(vec![vec![json!(" DEL "), json!("Delhi Airport"), json!(28.5), json!(77.1)]]);
        let inc = incidents(&[" DEL"]);
        let (reg_before, inc_before) = (reg.clone(), inc.clone());
        let res = resolve(&config(), &inc, &reg);
        assert_eq!(res.report.exact_matched, 1);
        assert_eq!(reg, reg_before);
        assert_eq!(inc, inc_before);
        // original key text is passed through, not the normalized form
        assert_eq!(res.table.rows[0][1], json!(" DEL"));
    }

    #[test]
    fn ragged_hand_built_tables_do_not_panic() {
        let reg = Table {
            columns: vec!["code".into(), "name".into(), "lat".into(), "lon".into()],
            rows: vec![
                vec![json!("DEL"), json!("Delhi Airport"), json!(28.5), json!(77.1)],
                vec![json!("BOM")],
            ],
        };
        let inc = Table {
            columns: vec!["id".into(), "loc".into()],
            rows: vec![vec![json!(1)], vec![json!(2), json!("DEL")]],
        };
        let res = resolve(&config(), &inc, &reg);
        assert_eq!(res.table.len(), 2);
        assert_eq!(res.table.columns.len(), 6);
        assert_eq!(res.table.rows[0][1], Value::Null);
        assert_eq!(source_of(&res, 0), "none");
        assert_eq!(source_of(&res, 1), "exact");
        assert_eq!(res.report.non_numeric_coordinates, 1);
    }
}
