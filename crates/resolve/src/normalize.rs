use serde_json::Value;

use crate::table::Table;

/// Canonical string form of a key cell: strings trimmed, numbers and
/// booleans rendered, nulls and non-scalars empty.
pub fn normalize_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Normalized copy of one column.
pub fn normalized_column(table: &Table, col: usize) -> Vec<String> {
    table.column(col).map(normalize_value).collect()
}

/// Copy of `table` with every named column normalized to trimmed strings.
/// Names not present in the table are ignored.
pub fn normalize_columns(table: &Table, columns: &[&str]) -> Table {
    let mut out = table.clone();
    for name in columns {
        if let Some(idx) = table.column_index(name) {
            let values = normalized_column(table, idx)
                .into_iter()
                .map(Value::String)
                .collect();
            out.set_column(name, values);
        }
    }
    out
}

/// Numeric coercion for coordinate cells. Anything that is not a finite
/// number (or a string holding one) is absent.
pub fn coerce_coordinate(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_are_trimmed_and_coerced() {
        assert_eq!(normalize_value(&json!("  DEL \t")), "DEL");
        assert_eq!(normalize_value(&json!(42)), "42");
        assert_eq!(normalize_value(&json!(1.5)), "1.5");
        assert_eq!(normalize_value(&json!(true)), "true");
        assert_eq!(normalize_value(&Value::Null), "");
        assert_eq!(normalize_value(&json!(["x"])), "");
    }

    #[test]
    fn only_target_columns_change() {
        let table = Table::from_rows(
            vec!["loc".into(), "remarks".into()],
            vec![
                vec![json!(" BOM "), json!("  keep me  ")],
                vec![Value::Null, json!(7)],
            ],
        );
        let out = normalize_columns(&table, &["loc", "missing"]);
        assert_eq!(out.columns, table.columns);
        assert_eq!(out.len(), 2);
        assert_eq!(out.rows[0], vec![json!("BOM"), json!("  keep me  ")]);
        assert_eq!(out.rows[1], vec![json!(""), json!(7)]);
        // caller's table untouched
        assert_eq!(table.rows[0][0], json!(" BOM "));
    }

    #[test]
    fn coordinates_coerce() {
        assert_eq!(coerce_coordinate(&json!(28.5)), Some(28.5));
        assert_eq!(coerce_coordinate(&json!(" 77.1 ")), Some(77.1));
        assert_eq!(coerce_coordinate(&json!("-12")), Some(-12.0));
        assert_eq!(coerce_coordinate(&json!("N/A")), None);
        assert_eq!(coerce_coordinate(&json!("")), None);
        assert_eq!(coerce_coordinate(&json!("NaN")), None);
        assert_eq!(coerce_coordinate(&json!("inf")), None);
        assert_eq!(coerce_coordinate(&Value::Null), None);
        assert_eq!(coerce_coordinate(&json!(false)), None);
    }
}
