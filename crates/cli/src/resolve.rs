//! `incimap resolve | validate | inspect`: config-driven coordinate resolution.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use incimap_resolve::exact::exact_join;
use incimap_resolve::loader::{load_csv_table, write_csv_table};
use incimap_resolve::model::MATCH_SOURCE;
use incimap_resolve::normalize::normalized_column;
use incimap_resolve::registry::Registry;
use incimap_resolve::{resolve, ResolutionReport, ResolveConfig, Table};

use crate::CliError;

pub struct ResolveArgs {
    pub config: PathBuf,
    pub incidents: Option<PathBuf>,
    pub registry: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub json: bool,
    pub unmatched: bool,
    pub require_matches: bool,
}

#[derive(Serialize)]
struct OutputMeta {
    config_name: String,
    engine_version: String,
    resolved_at: String,
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    meta: OutputMeta,
    report: &'a ResolutionReport,
    rows: Vec<Map<String, Value>>,
}

fn load_config(path: &Path) -> Result<ResolveConfig, CliError> {
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| CliError::runtime(format!("cannot read config {}: {e}", path.display())))?;
    ResolveConfig::from_toml(&config_str).map_err(|e| CliError::config(e.to_string()))
}

/// CLI override, else the config's file resolved against the config's
/// directory.
fn input_path(
    config_path: &Path,
    cli_path: Option<PathBuf>,
    configured: Option<&str>,
    section: &str,
) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_path {
        return Ok(path);
    }
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    configured
        .map(|file| base_dir.join(file))
        .ok_or_else(|| {
            CliError::usage(format!("no {section} file configured"))
                .with_hint(format!("set [{section}].file in the config or pass --{section}"))
        })
}

fn read_table(path: &Path) -> Result<Table, CliError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| CliError::runtime(format!("cannot read {}: {e}", path.display())))?;
    load_csv_table(&data).map_err(|e| CliError::runtime(format!("{}: {e}", path.display())))
}

/// Load both tables. An unreadable registry is not fatal: resolution then
/// runs against an empty registry and reports every incident unmatched.
fn load_tables(
    config_path: &Path,
    config: &ResolveConfig,
    incidents: Option<PathBuf>,
    registry: Option<PathBuf>,
) -> Result<(Table, Table), CliError> {
    let incidents_path = input_path(config_path, incidents, config.incidents.file.as_deref(), "incidents")?;
    let registry_path = input_path(config_path, registry, config.registry.file.as_deref(), "registry")?;

    log::debug!("loading incidents from {}", incidents_path.display());
    let incidents = read_table(&incidents_path)?;

    log::debug!("loading registry from {}", registry_path.display());
    let registry = match read_table(&registry_path) {
        Ok(table) => table,
        Err(e) => {
            log::warn!("{}; continuing without registry", e.message);
            eprintln!("warning: registry unavailable: {}", e.message);
            Table::default()
        }
    };

    Ok((incidents, registry))
}

fn row_objects(table: &Table) -> Vec<Map<String, Value>> {
    table
        .rows
        .iter()
        .map(|row| {
            table
                .columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect()
        })
        .collect()
}

fn cell_display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn cmd_resolve(args: ResolveArgs) -> Result<(), CliError> {
    let config = load_config(&args.config)?;
    let (incidents, registry) = load_tables(&args.config, &config, args.incidents, args.registry)?;

    let resolution = resolve(&config, &incidents, &registry);
    let report = &resolution.report;

    if let Some(ref path) = args.output {
        let csv = write_csv_table(&resolution.table).map_err(|e| CliError::runtime(e.to_string()))?;
        std::fs::write(path, csv)
            .map_err(|e| CliError::runtime(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref path) = args.report {
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| CliError::runtime(format!("JSON serialization error: {e}")))?;
        std::fs::write(path, json)
            .map_err(|e| CliError::runtime(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }

    if args.json {
        let output = ResolveOutput {
            meta: OutputMeta {
                config_name: config.name.clone(),
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                resolved_at: chrono::Utc::now().to_rfc3339(),
            },
            report,
            rows: row_objects(&resolution.table),
        };
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::runtime(format!("JSON serialization error: {e}")))?;
        println!("{json}");
    } else {
        // Human summary to stderr
        eprintln!(
            "exact join: {} / {} rows ({:.1}%), {}",
            report.exact_matched,
            report.total,
            report.exact_pct,
            report.state,
        );
        if report.fuzzy_attempted > 0 || report.fuzzy_skipped > 0 {
            eprintln!(
                "fuzzy fallback: {} attempted, {} matched, {} skipped",
                report.fuzzy_attempted, report.fuzzy_matched, report.fuzzy_skipped,
            );
        }
        eprintln!(
            "resolved {} / {} incidents ({:.1}%): {} exact, {} fuzzy, {} unmatched",
            report.matched,
            report.total,
            report.match_pct,
            report.exact_matched,
            report.fuzzy_matched,
            report.unmatched,
        );
        for issue in &report.issues {
            eprintln!("warning: {issue}");
        }
    }

    if args.unmatched {
        print_unmatched(&config, &resolution.table);
    }

    if args.require_matches && report.matched == 0 {
        return Err(CliError::no_matches("no incident could be resolved to coordinates"));
    }

    Ok(())
}

fn print_unmatched(config: &ResolveConfig, table: &Table) {
    let Some(source_col) = table.column_index(MATCH_SOURCE) else {
        return;
    };
    let id_col = config.incidents.id.as_deref().and_then(|id| table.column_index(id));
    let key_col = table
        .first_present(config.incidents.key_candidates())
        .map(|(idx, _)| idx);

    eprintln!("unmatched incidents:");
    for (row, cells) in table.rows.iter().enumerate() {
        if cells[source_col].as_str() != Some("none") {
            continue;
        }
        let id = id_col
            .map(|c| cell_display(&cells[c]))
            .unwrap_or_else(|| format!("row {}", row + 1));
        let key = key_col.map(|c| cell_display(&cells[c])).unwrap_or_default();
        eprintln!("  {id}\t{key}");
    }
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let m = &config.matching;
    eprintln!(
        "valid: '{}' ({} -> {}), metric={}, name_cutoff={}, code_cutoff={}, fallback below {}%",
        config.name,
        config.incidents.key,
        config.registry.code,
        m.metric,
        m.name_cutoff,
        m.code_cutoff,
        m.fallback_threshold_pct,
    );
    Ok(())
}

#[derive(Serialize)]
struct TableInspection {
    rows: usize,
    columns: Vec<String>,
    /// role -> bound column, or null when absent
    roles: Map<String, Value>,
}

#[derive(Serialize)]
struct Inspection {
    incidents: TableInspection,
    registry: TableInspection,
    registry_unique_codes: usize,
    duplicate_registry_keys: usize,
    non_numeric_coordinates: usize,
    exact_key_hits: usize,
}

fn role_binding<'a, I>(table: &Table, candidates: I) -> Value
where
    I: IntoIterator<Item = &'a str>,
{
    table
        .first_present(candidates)
        .map(|(_, name)| Value::String(name.to_string()))
        .unwrap_or(Value::Null)
}

pub fn cmd_inspect(
    config_path: PathBuf,
    incidents: Option<PathBuf>,
    registry: Option<PathBuf>,
    json_output: bool,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let (incidents, registry_table) = load_tables(&config_path, &config, incidents, registry)?;

    let mut incident_roles = Map::new();
    incident_roles.insert("key".into(), role_binding(&incidents, config.incidents.key_candidates()));
    for (role, column) in [("id", &config.incidents.id), ("date", &config.incidents.date)] {
        if let Some(column) = column {
            incident_roles.insert(role.into(), role_binding(&incidents, [column.as_str()]));
        }
    }

    let cols = &config.registry;
    let mut registry_roles = Map::new();
    registry_roles.insert("code".into(), role_binding(&registry_table, cols.code_candidates()));
    for (role, column) in [("name", &cols.name), ("latitude", &cols.latitude), ("longitude", &cols.longitude)] {
        registry_roles.insert(role.into(), role_binding(&registry_table, [column.as_str()]));
    }

    let registry = Registry::from_table(&registry_table, cols);
    let keys = incidents
        .first_present(config.incidents.key_candidates())
        .map(|(idx, _)| normalized_column(&incidents, idx))
        .unwrap_or_default();
    let exact = exact_join(&keys, &registry);

    let inspection = Inspection {
        incidents: TableInspection {
            rows: incidents.len(),
            columns: incidents.columns.clone(),
            roles: incident_roles,
        },
        registry: TableInspection {
            rows: registry_table.len(),
            columns: registry_table.columns.clone(),
            roles: registry_roles,
        },
        registry_unique_codes: registry.unique_codes(),
        duplicate_registry_keys: registry.duplicate_keys,
        non_numeric_coordinates: registry.non_numeric_coordinates,
        exact_key_hits: exact.matched + exact.key_matched_without_coordinates,
    };

    if json_output {
        let json = serde_json::to_string_pretty(&inspection)
            .map_err(|e| CliError::runtime(format!("JSON serialization error: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    for (label, t) in [("incidents", &inspection.incidents), ("registry", &inspection.registry)] {
        println!("{label}: {} rows, {} columns", t.rows, t.columns.len());
        for (role, column) in &t.roles {
            match column.as_str() {
                Some(name) => println!("  {role:<10} {name}"),
                None => println!("  {role:<10} (missing)"),
            }
        }
    }
    println!(
        "registry codes: {} unique, {} duplicate, {} without numeric coordinates",
        inspection.registry_unique_codes,
        inspection.duplicate_registry_keys,
        inspection.non_numeric_coordinates,
    );
    println!(
        "exact key hits: {} of {} incidents",
        inspection.exact_key_hits, inspection.incidents.rows,
    );
    Ok(())
}
