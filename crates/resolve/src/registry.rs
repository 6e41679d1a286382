use std::collections::HashMap;

use crate::config::RegistryColumns;
use crate::model::{RegistryEntry, ResolveIssue};
use crate::normalize::{coerce_coordinate, normalize_columns, normalize_value};
use crate::table::Table;

/// Registry entries in load order plus a first-wins code index.
#[derive(Debug, Default)]
pub struct Registry {
    /// Every loaded row, duplicates included, in load order.
    pub entries: Vec<RegistryEntry>,
    by_code: HashMap<String, usize>,
    pub duplicate_keys: usize,
    pub non_numeric_coordinates: usize,
    pub issues: Vec<ResolveIssue>,
}

impl Registry {
    /// Build from the caller's registry table. Reads a normalized copy; the
    /// input table is never modified.
    pub fn from_table(table: &Table, columns: &RegistryColumns) -> Self {
        let mut registry = Registry::default();
        if table.is_empty() {
            registry.issues.push(ResolveIssue::EmptyRegistry);
            return registry;
        }

        let code_col = table.first_present(columns.code_candidates());
        if code_col.is_none() {
            registry.issues.push(ResolveIssue::MissingKeyColumn {
                table: "registry".into(),
                column: columns.code.clone(),
            });
        }
        let mut role_col = |role: &str, column: &str| {
            let idx = table.column_index(column);
            if idx.is_none() {
                registry.issues.push(ResolveIssue::MissingRegistryColumn {
                    role: role.into(),
                    column: column.into(),
                });
            }
            idx
        };
        let name_col = role_col("name", &columns.name);
        let lat_col = role_col("latitude", &columns.latitude);
        let lon_col = role_col("longitude", &columns.longitude);

        let key_columns: Vec<&str> = code_col
            .map(|(_, name)| name)
            .into_iter()
            .chain(name_col.map(|_| columns.name.as_str()))
            .collect();
        let normalized = normalize_columns(table, &key_columns);

        let text = |row: usize, col: Option<usize>| {
            col.map(|c| normalize_value(normalized.cell(row, c)))
                .unwrap_or_default()
        };
        let number = |row: usize, col: Option<usize>| {
            col.and_then(|c| coerce_coordinate(normalized.cell(row, c)))
        };

        for row in 0..normalized.len() {
            let entry = RegistryEntry {
                row,
                code: text(row, code_col.map(|(idx, _)| idx)),
                name: text(row, name_col),
                latitude: number(row, lat_col),
                longitude: number(row, lon_col),
            };

            if lat_col.is_some() && lon_col.is_some() && entry.coordinates().is_none() {
                registry.non_numeric_coordinates += 1;
            }

            if !entry.code.is_empty() {
                let position = registry.entries.len();
                if registry.by_code.contains_key(&entry.code) {
                    registry.duplicate_keys += 1;
                } else {
                    registry.by_code.insert(entry.code.clone(), position);
                }
            }
            registry.entries.push(entry);
        }

        if registry.duplicate_keys > 0 {
            log::debug!(
                "registry: {} duplicate code(s), first occurrence kept",
                registry.duplicate_keys
            );
            registry.issues.push(ResolveIssue::DuplicateRegistryKey {
                discarded: registry.duplicate_keys,
            });
        }
        if registry.non_numeric_coordinates > 0 {
            log::warn!(
                "registry: {} entr(ies) without numeric coordinates",
                registry.non_numeric_coordinates
            );
            registry.issues.push(ResolveIssue::NonNumericCoordinate {
                entries: registry.non_numeric_coordinates,
            });
        }

        registry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Authoritative (first-loaded) entry for an exact code.
    pub fn lookup(&self, code: &str) -> Option<&RegistryEntry> {
        self.by_code.get(code).map(|&idx| &self.entries[idx])
    }

    /// Number of distinct non-empty codes.
    pub fn unique_codes(&self) -> usize {
        self.by_code.len()
    }
}
