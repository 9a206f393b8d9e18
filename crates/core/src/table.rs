use std::fmt;

/// A single fetched cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl CellValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::UInt(_) | Self::Float(_))
    }

    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::UInt(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::Null | Self::Text(_) => None,
        }
    }

    /// Text used by the search filter. Nulls search as the empty string so
    /// they never match a non-empty term.
    #[must_use]
    pub fn search_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Int(value) => write!(f, "{value}"),
            Self::UInt(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Numeric,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

/// Column metadata as reported by the driver, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    pub name: String,
    pub numeric_hint: bool,
}

impl RawColumn {
    #[must_use]
    pub fn new(name: impl Into<String>, numeric_hint: bool) -> Self {
        Self {
            name: name.into(),
            numeric_hint,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResultSet {
    pub columns: Vec<RawColumn>,
    pub rows: Vec<Vec<CellValue>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    columns: Vec<Column>,
    rows: Vec<Vec<CellValue>>,
}

impl ResultTable {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Tags every column once, right after the fetch.
    ///
    /// A column is numeric when none of its non-null values is textual and it
    /// either holds at least one number or the driver declared a numeric type.
    /// Rows are padded or truncated to the column count.
    #[must_use]
    pub fn classify(raw: RawResultSet) -> Self {
        let width = raw.columns.len();
        let rows = raw
            .rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Null);
                row
            })
            .collect::<Vec<_>>();

        let columns = raw
            .columns
            .into_iter()
            .enumerate()
            .map(|(index, raw_column)| {
                let mut saw_number = false;
                let mut saw_text = false;
                for row in &rows {
                    match &row[index] {
                        CellValue::Text(_) => saw_text = true,
                        CellValue::Null => {}
                        _ => saw_number = true,
                    }
                }

                let column_type = if !saw_text && (saw_number || raw_column.numeric_hint) {
                    ColumnType::Numeric
                } else {
                    ColumnType::Text
                };
                Column {
                    name: raw_column.name,
                    column_type,
                }
            })
            .collect();

        Self { columns, rows }
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    #[must_use]
    pub fn schema_key(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = (usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, column)| column.column_type == ColumnType::Numeric)
    }

    /// Observed `(min, max)` of a numeric column; `(0, 0)` when it holds no
    /// numbers at all.
    #[must_use]
    pub fn column_bounds(&self, index: usize) -> (f64, f64) {
        let mut bounds: Option<(f64, f64)> = None;
        for value in self
            .rows
            .iter()
            .filter_map(|row| row.get(index).and_then(CellValue::as_f64))
        {
            bounds = Some(match bounds {
                None => (value, value),
                Some((min, max)) => (min.min(value), max.max(value)),
            });
        }
        bounds.unwrap_or((0.0, 0.0))
    }

    /// Derives a new table holding the rows accepted by `keep`, in order.
    #[must_use]
    pub fn retain_rows(&self, mut keep: impl FnMut(&[CellValue]) -> bool) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row))
                .cloned()
                .collect(),
        }
    }
}
