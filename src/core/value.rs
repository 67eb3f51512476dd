use serde::{Deserialize, Serialize};

/// One cell of an attribute table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// The cell as it is printed in a report
    #[must_use]
    pub fn printable(&self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Float(v) => format_float(*v),
            Self::Text(s) => s.clone(),
        }
    }

    /// Numeric value of the cell. Text that does not parse as a number is `None`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) if v.is_finite() => Some(*v),
            Self::Float(_) => None,
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }

    /// Integer value of the cell; floats are truncated
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            #[allow(clippy::cast_possible_truncation)]
            Self::Float(v) if v.is_finite() => Some(*v as i64),
            Self::Float(_) => None,
            Self::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Integral floats print without a fractional part
fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        #[allow(clippy::cast_possible_truncation)]
        let i = v as i64;
        i.to_string()
    } else {
        v.to_string()
    }
}

/// A rectangular (possibly ragged) table of cells. `null` cells are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    rows: Vec<Vec<Option<Cell>>>,
}

impl Table {
    #[must_use]
    pub fn new(rows: Vec<Vec<Option<Cell>>>) -> Self {
        Self { rows }
    }

    /// A 1x1 table holding a single value
    #[must_use]
    pub fn single(cell: Cell) -> Self {
        Self {
            rows: vec![vec![Some(cell)]],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns in a given row
    #[must_use]
    pub fn columns(&self, row: usize) -> usize {
        self.rows.get(row).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row)?.get(col)?.as_ref()
    }

    #[must_use]
    pub fn printable(&self, row: usize, col: usize) -> Option<String> {
        self.cell(row, col).map(Cell::printable)
    }

    #[must_use]
    pub fn float(&self, row: usize, col: usize) -> Option<f64> {
        self.cell(row, col).and_then(Cell::as_f64)
    }

    #[must_use]
    pub fn int(&self, row: usize, col: usize) -> Option<i64> {
        self.cell(row, col).and_then(Cell::as_i64)
    }

    /// Index of the first row whose first column equals `key`, ignoring case
    #[must_use]
    pub fn find_row(&self, key: &str) -> Option<usize> {
        (0..self.rows.len()).find(|&row| {
            self.printable(row, 0)
                .is_some_and(|name| name.eq_ignore_ascii_case(key))
        })
    }

    /// Indices of all rows whose first column starts with `prefix`
    pub fn rows_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = usize> + 'a {
        (0..self.rows.len()).filter(move |&row| {
            self.printable(row, 0)
                .is_some_and(|name| name.starts_with(prefix))
        })
    }
}

/// The value of one relation of one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribute {
    Table(Table),
    Scalar(Cell),
}

impl Attribute {
    /// Scalar view: a table answers with its first cell
    #[must_use]
    pub fn scalar(&self) -> Option<Cell> {
        match self {
            Self::Scalar(cell) => Some(cell.clone()),
            Self::Table(table) => table.cell(0, 0).cloned(),
        }
    }

    /// Table view: a scalar answers as a 1x1 table
    #[must_use]
    pub fn table(&self) -> Table {
        match self {
            Self::Scalar(cell) => Table::single(cell.clone()),
            Self::Table(table) => table.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_distinguishes_zero() {
        assert_eq!(Cell::Int(0).printable(), "0");
        assert_eq!(Cell::Float(0.0).printable(), "0");
        assert_eq!(Cell::Float(2.5).printable(), "2.5");
        assert_eq!(Cell::Float(12.0).printable(), "12");
        assert_eq!(Cell::Text("polyA".to_string()).printable(), "polyA");
    }

    #[test]
    fn test_numeric_text() {
        assert_eq!(Cell::Text(" 42 ".to_string()).as_f64(), Some(42.0));
        assert_eq!(Cell::Text("n/a".to_string()).as_f64(), None);
        assert_eq!(Cell::Float(7.9).as_i64(), Some(7));
    }

    #[test]
    fn test_attribute_deserialize() {
        let scalar: Attribute = serde_json::from_str("12").unwrap();
        assert_eq!(scalar, Attribute::Scalar(Cell::Int(12)));

        let table: Attribute = serde_json::from_str(r#"[["any", 1.5, null]]"#).unwrap();
        let table = table.table();
        assert_eq!(table.len(), 1);
        assert_eq!(table.printable(0, 0).as_deref(), Some("any"));
        assert_eq!(table.float(0, 1), Some(1.5));
        assert_eq!(table.cell(0, 2), None);
        assert_eq!(table.columns(0), 3);
    }

    #[test]
    fn test_find_row_ignores_case() {
        let table = Table::new(vec![
            vec![Some(Cell::Text("Z_genome".to_string())), Some(Cell::Int(1))],
            vec![Some(Cell::Text("ANY".to_string())), Some(Cell::Int(2))],
        ]);
        assert_eq!(table.find_row("any"), Some(1));
        assert_eq!(table.find_row("mito"), None);
    }

    #[test]
    fn test_rows_with_prefix() {
        let table = Table::new(vec![
            vec![Some(Cell::Text("RNA_AGLR1_A1".to_string()))],
            vec![Some(Cell::Text("RNA_AGLR2_A1".to_string()))],
            vec![Some(Cell::Text("RNA_AGLR1_A2".to_string()))],
        ]);
        let rows: Vec<usize> = table.rows_with_prefix("RNA_AGLR1_A").collect();
        assert_eq!(rows, vec![0, 2]);
    }
}
