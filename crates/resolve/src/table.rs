use serde::Serialize;
use serde_json::Value;

static NULL: Value = Value::Null;

/// Column-ordered table of JSON scalar cells.
///
/// This is the interchange shape between the data-loading collaborator,
/// the pipeline, and the rendering layer. Row order is row identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from rows, padding short rows with nulls and dropping
    /// cells past the last column.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Index of the first of `names` present in this table.
    pub fn first_present<'a, I>(&self, names: I) -> Option<(usize, &'a str)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .find_map(|name| self.column_index(name).map(|idx| (idx, name)))
    }

    /// Cell at (row, col); out-of-range positions read as null.
    pub fn cell(&self, row: usize, col: usize) -> &Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&NULL)
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = &Value> + '_ {
        (0..self.rows.len()).map(move |row| self.cell(row, col))
    }

    /// Replace the values of `name`, appending the column if it is new.
    /// `values` must have one entry per row. Rows shorter than the header
    /// are padded with nulls first.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());
        let width = self.columns.len();
        for row in &mut self.rows {
            if row.len() < width {
                row.resize(width, Value::Null);
            }
        }
        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.insert(width, Value::Null);
                }
                width
            }
        };
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
    }
}
