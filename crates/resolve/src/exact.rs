use crate::model::MatchResult;
use crate::registry::Registry;

#[derive(Debug)]
pub struct ExactJoin {
    /// One result per incident key, positionally aligned.
    pub results: Vec<MatchResult>,
    /// Results carrying usable coordinates.
    pub matched: usize,
    /// Keys that hit a registry code whose coordinates failed coercion.
    pub key_matched_without_coordinates: usize,
}

/// Join normalized incident keys to registry codes by exact,
/// case-sensitive equality. Many incidents may share one registry entry;
/// duplicate registry codes were already collapsed to their first row.
pub fn exact_join(keys: &[String], registry: &Registry) -> ExactJoin {
    let mut results = Vec::with_capacity(keys.len());
    let mut matched = 0;
    let mut key_matched_without_coordinates = 0;

    for key in keys {
        let hit = if key.is_empty() {
            None
        } else {
            registry.lookup(key)
        };

        match hit {
            Some(entry) if entry.coordinates().is_some() => {
                matched += 1;
                results.push(MatchResult::exact(entry));
            }
            Some(_) => {
                key_matched_without_coordinates += 1;
                results.push(MatchResult::none());
            }
            None => results.push(MatchResult::none()),
        }
    }

    ExactJoin {
        results,
        matched,
        key_matched_without_coordinates,
    }
}
