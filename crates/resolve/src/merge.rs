use serde_json::Value;

use crate::model::{
    MatchResult, MatchSource, PipelineState, ResolutionReport, MATCH_SOURCE, RESOLVED_CODE,
    RESOLVED_LATITUDE, RESOLVED_LONGITUDE,
};
use crate::table::Table;

/// Combine exact and (optional) fuzzy results, positionally aligned.
///
/// Exact coordinates always win; fuzzy coordinates fill in where exact has
/// none; a result without coordinates becomes `none`.
pub fn merge(exact: &[MatchResult], fuzzy: Option<&[MatchResult]>) -> Vec<MatchResult> {
    exact
        .iter()
        .enumerate()
        .map(|(i, ex)| {
            if ex.has_coordinates() {
                return ex.clone();
            }
            match fuzzy.and_then(|f| f.get(i)) {
                Some(fz) if fz.has_coordinates() => fz.clone(),
                _ => MatchResult::none(),
            }
        })
        .collect()
}

pub fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Coverage counts for merged results. Diagnostic fields (registry counts,
/// fuzzy attempts, issues) are filled in by the pipeline.
pub fn build_report(state: PipelineState, merged: &[MatchResult]) -> ResolutionReport {
    let total = merged.len();
    let mut exact_matched = 0;
    let mut fuzzy_matched = 0;
    let mut matched = 0;

    for r in merged {
        if r.has_coordinates() {
            matched += 1;
        }
        match r.source {
            MatchSource::Exact => exact_matched += 1,
            MatchSource::Fuzzy => fuzzy_matched += 1,
            MatchSource::None => {}
        }
    }

    let mut report = ResolutionReport::unresolved(total, Vec::new());
    report.state = state;
    report.matched = matched;
    report.exact_matched = exact_matched;
    report.fuzzy_matched = fuzzy_matched;
    report.unmatched = total - matched;
    report.match_pct = percent(matched, total);
    report.exact_pct = percent(exact_matched, total);
    report.fuzzy_pct = percent(fuzzy_matched, total);
    report
}

/// Copy of `incidents` with the four resolution columns set from `merged`.
pub fn attach_columns(incidents: &Table, merged: &[MatchResult]) -> Table {
    let mut out = incidents.clone();
    let coord = |v: Option<f64>| v.map(Value::from).unwrap_or(Value::Null);

    out.set_column(RESOLVED_LATITUDE, merged.iter().map(|r| coord(r.latitude)).collect());
    out.set_column(RESOLVED_LONGITUDE, merged.iter().map(|r| coord(r.longitude)).collect());
    out.set_column(
        RESOLVED_CODE,
        merged
            .iter()
            .map(|r| r.code.clone().map(Value::String).unwrap_or(Value::Null))
            .collect(),
    );
    out.set_column(
        MATCH_SOURCE,
        merged
            .iter()
            .map(|r| Value::String(r.source.to_string()))
            .collect(),
    );
    out
}
