//! Table model: cell values, column widths and the per-fetch snapshot.

use std::fmt;

use crate::config::width::{WIDTH_BASE, WIDTH_PER_CHAR};

/// A decoded cell, typed once at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// The single textual form used for both measuring and display.
    pub fn display(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            // `-0` would otherwise print with its sign.
            CellValue::Number(n) if *n == 0.0 => "0".to_string(),
            CellValue::Number(n) => format_number(*n),
        }
    }

    /// Length of [`display`](Self::display) in Unicode scalar values.
    pub fn display_len(&self) -> usize {
        match self {
            CellValue::Text(s) => s.chars().count(),
            CellValue::Number(_) => self.display().chars().count(),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.is_empty())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// Shortest round-trip decimal, switching to exponent form (`1e+21`, `1e-7`)
/// below 1e-6 and from 1e21 up.
fn format_number(n: f64) -> String {
    let magnitude = n.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let exp = format!("{:e}", n);
        if let Some((mantissa, power)) = exp.split_once('e') {
            if !power.starts_with('-') {
                return format!("{}e+{}", mantissa, power);
            }
        }
        return exp;
    }
    n.to_string()
}

pub type Row = Vec<CellValue>;

/// Display width for one cell.
pub fn cell_width(cell: &CellValue) -> u32 {
    let len = u32::try_from(cell.display_len()).unwrap_or(u32::MAX);
    WIDTH_BASE.saturating_add(WIDTH_PER_CHAR.saturating_mul(len))
}

/// Per-column widths: the widest cell of each column across all rows.
///
/// The result has one entry per column of the longest row.
pub fn compute_column_widths(rows: &[Row]) -> Vec<u32> {
    let mut widths: Vec<u32> = Vec::new();
    for row in rows {
        for (col, cell) in row.iter().enumerate() {
            let w = cell_width(cell);
            match widths.get_mut(col) {
                Some(current) => *current = (*current).max(w),
                None => widths.push(w),
            }
        }
    }
    widths
}

/// A row with no cells, or whose cells all display as "".
pub fn is_empty_row(row: &[CellValue]) -> bool {
    row.iter().all(CellValue::is_blank)
}

/// One sheet ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub name: String,
    pub width_arr: Vec<u32>,
    pub rows: Vec<Row>,
}

impl SheetTable {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        let width_arr = compute_column_widths(&rows);
        Self {
            name: name.into(),
            width_arr,
            rows,
        }
    }

    /// Row 0, rendered as the header table.
    pub fn header(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Rows after the header, skipping empty ones.
    pub fn data_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().skip(1).filter(|row| !is_empty_row(row))
    }

    /// Text and width of every column for `row`, padding short rows with "".
    pub fn padded_cells<'a>(&'a self, row: &'a Row) -> impl Iterator<Item = (String, u32)> + 'a {
        self.width_arr.iter().enumerate().map(move |(col, width)| {
            let text = row.get(col).map(CellValue::display).unwrap_or_default();
            (text, *width)
        })
    }
}

/// Sheet name → table, in workbook order. Replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableData {
    sheets: Vec<SheetTable>,
}

impl TableData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a sheet, replacing any earlier sheet of the same name in place.
    pub fn insert(&mut self, table: SheetTable) {
        match self.sheets.iter_mut().find(|s| s.name == table.name) {
            Some(existing) => *existing = table,
            None => self.sheets.push(table),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SheetTable> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SheetTable> {
        self.sheets.iter()
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

impl FromIterator<SheetTable> for TableData {
    fn from_iter<I: IntoIterator<Item = SheetTable>>(iter: I) -> Self {
        let mut data = TableData::new();
        for table in iter {
            data.insert(table);
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| CellValue::from(*c)).collect()
    }

    #[test]
    fn widths_follow_longest_cell_per_column() {
        let rows = vec![row(&["A", "B"]), row(&["x", "yy"])];
        assert_eq!(compute_column_widths(&rows), vec![20, 30]);
    }

    #[test]
    fn width_count_matches_longest_row() {
        let rows = vec![
            row(&["a"]),
            row(&["abc", "de", "f"]),
            vec![],
            row(&["", "longer text"]),
        ];
        let widths = compute_column_widths(&rows);

        assert_eq!(widths.len(), 3);
        assert_eq!(widths, vec![40, 120, 20]);
        for r in &rows {
            for (col, cell) in r.iter().enumerate() {
                assert!(widths[col] >= 10 + 10 * cell.display_len() as u32);
            }
        }
    }

    #[test]
    fn no_rows_means_no_columns() {
        assert!(compute_column_widths(&[]).is_empty());
        assert!(compute_column_widths(&[vec![], vec![]]).is_empty());
    }

    #[test]
    fn numbers_are_measured_by_their_text_form() {
        let rows = vec![vec![
            CellValue::Number(3.0),
            CellValue::Number(1.5),
            CellValue::Number(-0.0),
            CellValue::Number(1234.25),
        ]];
        assert_eq!(rows[0][0].display(), "3");
        assert_eq!(rows[0][1].display(), "1.5");
        assert_eq!(rows[0][2].display(), "0");
        assert_eq!(compute_column_widths(&rows), vec![20, 40, 20, 80]);
    }

    #[test]
    fn very_large_and_small_numbers_use_exponent_form() {
        let rows = vec![vec![
            CellValue::Number(1e21),
            CellValue::Number(1e-7),
            CellValue::Number(-2.5e-9),
            CellValue::Number(1.5e300),
            CellValue::Number(1e20),
            CellValue::Number(0.000001),
        ]];
        let shown: Vec<String> = rows[0].iter().map(CellValue::display).collect();

        assert_eq!(
            shown,
            vec!["1e+21", "1e-7", "-2.5e-9", "1.5e+300", "100000000000000000000", "0.000001"]
        );
        assert_eq!(compute_column_widths(&rows)[..2], [60, 50]);
    }

    #[test]
    fn non_ascii_text_is_measured_in_characters() {
        let rows = vec![row(&["żółw", "日本"])];
        assert_eq!(compute_column_widths(&rows), vec![50, 30]);
    }

    #[test]
    fn data_rows_skip_header_and_empty_rows() {
        let table = SheetTable::new(
            "Sheet1",
            vec![
                row(&["Name", "Score"]),
                row(&["ann", "3"]),
                vec![],
                row(&["", ""]),
                row(&["bob", "5"]),
            ],
        );

        assert_eq!(table.header(), Some(&row(&["Name", "Score"])));
        let data: Vec<&Row> = table.data_rows().collect();
        assert_eq!(data, vec![&row(&["ann", "3"]), &row(&["bob", "5"])]);
    }

    #[test]
    fn short_rows_are_padded_to_the_column_count() {
        let table = SheetTable::new(
            "Sheet1",
            vec![row(&["a", "bb", "c"]), row(&["x"]), vec![CellValue::Number(7.0)]],
        );

        let padded: Vec<(String, u32)> = table.padded_cells(&table.rows[1]).collect();
        assert_eq!(
            padded,
            vec![
                ("x".to_string(), 20),
                (String::new(), 30),
                (String::new(), 20),
            ]
        );

        let full: Vec<String> = table.padded_cells(&table.rows[0]).map(|(text, _)| text).collect();
        assert_eq!(full, vec!["a", "bb", "c"]);
        assert_eq!(table.padded_cells(&table.rows[2]).next(), Some(("7".to_string(), 20)));
    }

    #[test]
    fn table_data_keeps_sheet_order_and_replaces_by_name() {
        let mut data = TableData::new();
        data.insert(SheetTable::new("B", vec![row(&["1"])]));
        data.insert(SheetTable::new("A", vec![row(&["2"])]));
        data.insert(SheetTable::new("B", vec![row(&["333"])]));

        assert_eq!(data.names().collect::<Vec<_>>(), vec!["B", "A"]);
        assert_eq!(data.get("B").map(|t| t.width_arr.clone()), Some(vec![40]));
        assert_eq!(data.len(), 2);
    }
}
