//! XLSX decoding into positional rows of [`CellValue`]s.
//!
//! Only cell values are read; styles, formulas (beyond their cached value),
//! comments and drawings are ignored.

use std::collections::HashMap;
use std::io::{BufReader, Cursor, Read, Seek};

use log::{debug, info};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::{WorkbookError, WorkbookResult};
use crate::table::{CellValue, Row};

/// Largest column index Excel allows (XFD).
const MAX_COL: u32 = 16_383;
/// Largest row index Excel allows.
const MAX_ROW: u32 = 1_048_575;

/// A decoded workbook: its sheets in tab order.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

/// One worksheet as a sparse list of positioned values.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    cells: Vec<PlacedCell>,
}

#[derive(Debug, Clone)]
struct PlacedCell {
    row: u32,
    col: u32,
    value: CellValue,
}

impl Workbook {
    /// Decode an XLSX document held in memory.
    pub fn read(bytes: &[u8]) -> WorkbookResult<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> WorkbookResult<Self> {
        let mut archive = ZipArchive::new(reader)?;

        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(WorkbookError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = read_shared_strings(&mut archive)?;
        let sheet_info = read_workbook_xml(&mut archive)?;
        let sheet_paths = read_workbook_rels(&mut archive)?;

        let mut sheets = Vec::with_capacity(sheet_info.len());
        for (name, r_id) in sheet_info {
            let Some(path) = sheet_paths.get(&r_id) else {
                debug!("Sheet '{}' has no worksheet relationship, skipping", name);
                continue;
            };
            let cells = read_worksheet(&mut archive, path, &shared_strings)?;
            sheets.push(Sheet { name, cells });
        }

        info!("Decoded workbook with {} sheet(s)", sheets.len());
        Ok(Self { sheets })
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }
}

impl Sheet {
    /// Rows with positional columns, from the first used row to the last.
    ///
    /// Column 0 is the leftmost used column. Rows without cells come out
    /// empty; holes inside a row are filled with empty text.
    pub fn to_rows(&self) -> Vec<Row> {
        let (Some(first_row), Some(last_row), Some(first_col)) = (
            self.cells.iter().map(|c| c.row).min(),
            self.cells.iter().map(|c| c.row).max(),
            self.cells.iter().map(|c| c.col).min(),
        ) else {
            return Vec::new();
        };

        let mut rows: Vec<Row> = vec![Vec::new(); (last_row - first_row + 1) as usize];
        for cell in &self.cells {
            let row = &mut rows[(cell.row - first_row) as usize];
            let col = (cell.col - first_col) as usize;
            if row.len() <= col {
                row.resize(col + 1, CellValue::text(""));
            }
            row[col] = cell.value.clone();
        }
        rows
    }
}

/// Read the shared strings table.
fn read_shared_strings<R: Read + Seek>(archive: &mut ZipArchive<R>) -> WorkbookResult<Vec<String>> {
    let mut strings = Vec::new();

    let file = match archive.by_name("xl/sharedStrings.xml") {
        Ok(f) => f,
        Err(_) => return Ok(strings), // No shared strings is valid
    };

    let mut xml_reader = Reader::from_reader(BufReader::new(file));

    let mut buf = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    // Phonetic hints carry their own <t> runs that are not part of the value.
    let mut in_phonetic = false;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_si && !in_phonetic => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(decode_excel_escapes(&current));
                    current.clear();
                    in_si = false;
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_t => {
                current.push_str(&e.unescape()?);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(WorkbookError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// Read workbook.xml to get sheet names and rIds, in tab order.
fn read_workbook_xml<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> WorkbookResult<Vec<(String, String)>> {
    let file = archive
        .by_name("xl/workbook.xml")
        .map_err(|_| WorkbookError::MissingPart("xl/workbook.xml".into()))?;

    let mut xml_reader = Reader::from_reader(BufReader::new(file));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"sheet" => {
                let name = attr_value(&e, b"name");
                let r_id = attr_value(&e, b"r:id");
                if let (Some(name), Some(r_id)) = (name, r_id) {
                    sheets.push((name, r_id));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(WorkbookError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

/// Read workbook.xml.rels to map rIds to worksheet part paths.
fn read_workbook_rels<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> WorkbookResult<HashMap<String, String>> {
    let file = archive
        .by_name("xl/_rels/workbook.xml.rels")
        .map_err(|_| WorkbookError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

    let mut xml_reader = Reader::from_reader(BufReader::new(file));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut rels = HashMap::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let id = attr_value(&e, b"Id");
                let target = attr_value(&e, b"Target");
                let rel_type = attr_value(&e, b"Type");

                if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                    if rel_type.ends_with("/worksheet") {
                        rels.insert(id, resolve_part_path(&target));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(WorkbookError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Targets are relative to `xl/` unless absolute within the package.
fn resolve_part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

/// Cell currently being read from a worksheet.
#[derive(Default)]
struct PendingCell {
    row: u32,
    col: u32,
    cell_type: Option<String>,
    value: Option<String>,
    inline: Option<String>,
}

/// Read one worksheet's cell values.
fn read_worksheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
    shared_strings: &[String],
) -> WorkbookResult<Vec<PlacedCell>> {
    let file = archive
        .by_name(path)
        .map_err(|_| WorkbookError::MissingPart(path.to_string()))?;

    let mut xml_reader = Reader::from_reader(BufReader::new(file));

    let mut buf = Vec::new();
    let mut cells = Vec::new();

    // Positions used when `r` attributes are omitted.
    let mut next_row: u32 = 0;
    let mut current_row: u32 = 0;
    let mut next_col: u32 = 0;

    let mut pending: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_inline_text = false;
    let mut in_phonetic = false;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    current_row = row_position(&e, next_row)?;
                    next_row = current_row + 1;
                    next_col = 0;
                }
                b"c" => {
                    let cell = start_cell(&e, current_row, next_col)?;
                    next_col = cell.col + 1;
                    pending = Some(cell);
                }
                b"v" if pending.is_some() => in_value = true,
                b"rPh" => in_phonetic = true,
                b"t" if !in_phonetic => {
                    if let Some(cell) = pending.as_mut() {
                        cell.inline.get_or_insert_with(String::new);
                        in_inline_text = true;
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"row" => {
                    current_row = row_position(&e, next_row)?;
                    next_row = current_row + 1;
                    next_col = 0;
                }
                // Valueless cell: only advances the column cursor.
                b"c" => {
                    let cell = start_cell(&e, current_row, next_col)?;
                    next_col = cell.col + 1;
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(cell) = pending.as_mut() {
                    if in_value {
                        cell.value
                            .get_or_insert_with(String::new)
                            .push_str(&e.unescape()?);
                    } else if in_inline_text {
                        if let Some(inline) = cell.inline.as_mut() {
                            inline.push_str(&e.unescape()?);
                        }
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" => in_value = false,
                b"t" => in_inline_text = false,
                b"rPh" => in_phonetic = false,
                b"c" => {
                    if let Some(cell) = pending.take() {
                        if let Some(placed) = finish_cell(cell, shared_strings)? {
                            cells.push(placed);
                        }
                    }
                    in_value = false;
                    in_inline_text = false;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(WorkbookError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    debug!("Read {} cell value(s) from {}", cells.len(), path);
    Ok(cells)
}

fn row_position(e: &BytesStart, fallback: u32) -> WorkbookResult<u32> {
    match attr_value(e, b"r") {
        Some(r) => {
            let number: u32 = r
                .parse()
                .map_err(|_| WorkbookError::Parse(format!("Invalid row number '{}'", r)))?;
            check_row(number.checked_sub(1).ok_or_else(|| {
                WorkbookError::Parse(format!("Invalid row number '{}'", r))
            })?)
        }
        None => check_row(fallback),
    }
}

fn start_cell(e: &BytesStart, row: u32, fallback_col: u32) -> WorkbookResult<PendingCell> {
    let (row, col) = match attr_value(e, b"r") {
        Some(reference) => parse_cell_ref(&reference)?,
        None => (row, fallback_col),
    };
    if col > MAX_COL {
        return Err(WorkbookError::Parse(format!("Column {} out of range", col)));
    }
    Ok(PendingCell {
        row,
        col,
        cell_type: attr_value(e, b"t"),
        value: None,
        inline: None,
    })
}

/// Turn the raw text of a cell into a typed value; `None` for holes.
fn finish_cell(cell: PendingCell, shared_strings: &[String]) -> WorkbookResult<Option<PlacedCell>> {
    let value = match (cell.cell_type.as_deref(), cell.value, cell.inline) {
        (Some("inlineStr"), _, Some(inline)) => CellValue::Text(decode_excel_escapes(&inline)),
        (_, None, _) => return Ok(None),
        (Some("s"), Some(v), _) => {
            let idx: usize = v
                .trim()
                .parse()
                .map_err(|_| WorkbookError::Parse(format!("Invalid shared string index: {}", v)))?;
            let s = shared_strings.get(idx).ok_or_else(|| {
                WorkbookError::Parse(format!("Shared string index {} out of bounds", idx))
            })?;
            CellValue::Text(s.clone())
        }
        (Some("b"), Some(v), _) => {
            let truthy = v.trim() == "1" || v.trim().eq_ignore_ascii_case("true");
            CellValue::text(if truthy { "TRUE" } else { "FALSE" })
        }
        (Some("str") | Some("inlineStr"), Some(v), _) => CellValue::Text(decode_excel_escapes(&v)),
        (None | Some("n"), Some(v), _) => match v.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::Text(v),
        },
        // Errors ("e") and unknown types keep their raw text.
        (Some(_), Some(v), _) => CellValue::Text(v),
    };

    Ok(Some(PlacedCell {
        row: cell.row,
        col: cell.col,
        value,
    }))
}

/// Parse an A1-style reference into zero-based (row, col).
fn parse_cell_ref(reference: &str) -> WorkbookResult<(u32, u32)> {
    let invalid = || WorkbookError::Parse(format!("Invalid cell reference '{}'", reference));

    let split = reference
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || letters.len() > 3 {
        return Err(invalid());
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(invalid());
        }
        col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }

    let row: u32 = digits.parse().map_err(|_| invalid())?;
    let row = row.checked_sub(1).ok_or_else(invalid)?;

    Ok((check_row(row)?, col - 1))
}

fn check_row(row: u32) -> WorkbookResult<u32> {
    if row > MAX_ROW {
        return Err(WorkbookError::Parse(format!("Row {} out of range", row + 1)));
    }
    Ok(row)
}

fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|s| s.to_string()))
}

/// Decode Excel's `_xHHHH_` escapes (e.g. `_x000D_` for a carriage return).
fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("_x") {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(c) => {
                out.push(c);
                rest = &candidate[7..];
            }
            None => {
                out.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{build_xlsx, sheet_xml};
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> CellValue {
        CellValue::text(s)
    }

    #[test]
    fn reads_shared_strings_and_numbers() {
        let bytes = build_xlsx(
            &[("Sheet1", sheet_xml(r#"
                <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
                <row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>42</v></c></row>
            "#))],
            &["A", "B", "x"],
        );

        let workbook = Workbook::read(&bytes).expect("workbook decodes");
        assert_eq!(workbook.sheet_names().collect::<Vec<_>>(), vec!["Sheet1"]);
        let rows = workbook.sheet("Sheet1").map(Sheet::to_rows);
        assert_eq!(
            rows,
            Some(vec![
                vec![text("A"), text("B")],
                vec![text("x"), CellValue::Number(42.0)],
            ])
        );
    }

    #[test]
    fn keeps_sheet_tab_order() {
        let bytes = build_xlsx(
            &[
                ("Zeta", sheet_xml(r#"<row r="1"><c r="A1"><v>1</v></c></row>"#)),
                ("Alpha", sheet_xml(r#"<row r="1"><c r="A1"><v>2</v></c></row>"#)),
            ],
            &[],
        );

        let workbook = Workbook::read(&bytes).expect("workbook decodes");
        assert_eq!(
            workbook.sheet_names().collect::<Vec<_>>(),
            vec!["Zeta", "Alpha"]
        );
    }

    #[test]
    fn fills_holes_and_keeps_blank_rows() {
        let bytes = build_xlsx(
            &[("S", sheet_xml(r#"
                <row r="2"><c r="B2" t="inlineStr"><is><t>top</t></is></c></row>
                <row r="4"><c r="B4"><v>1</v></c><c r="C4" s="3"/><c r="D4"><v>2.5</v></c></row>
            "#))],
            &[],
        );

        let rows = Workbook::read(&bytes).expect("workbook decodes").sheets()[0].to_rows();
        assert_eq!(
            rows,
            vec![
                vec![text("top")],
                vec![],
                vec![
                    CellValue::Number(1.0),
                    text(""),
                    CellValue::Number(2.5)
                ],
            ]
        );
    }

    #[test]
    fn decodes_booleans_errors_and_formula_strings() {
        let bytes = build_xlsx(
            &[("S", sheet_xml(r#"
                <row r="1">
                    <c r="A1" t="b"><v>1</v></c>
                    <c r="B1" t="b"><v>0</v></c>
                    <c r="C1" t="e"><v>#DIV/0!</v></c>
                    <c r="D1" t="str"><f>A1&amp;"x"</f><v>TRUEx</v></c>
                    <c r="E1"><f>1+1</f><v>2</v></c>
                </row>
            "#))],
            &[],
        );

        let rows = Workbook::read(&bytes).expect("workbook decodes").sheets()[0].to_rows();
        assert_eq!(
            rows,
            vec![vec![
                text("TRUE"),
                text("FALSE"),
                text("#DIV/0!"),
                text("TRUEx"),
                CellValue::Number(2.0),
            ]]
        );
    }

    #[test]
    fn positions_cells_without_references() {
        let bytes = build_xlsx(
            &[("S", sheet_xml(r#"
                <row><c t="s"><v>0</v></c><c><v>7</v></c></row>
                <row><c><v>8</v></c></row>
            "#))],
            &["a"],
        );

        let rows = Workbook::read(&bytes).expect("workbook decodes").sheets()[0].to_rows();
        assert_eq!(
            rows,
            vec![
                vec![text("a"), CellValue::Number(7.0)],
                vec![CellValue::Number(8.0)],
            ]
        );
    }

    #[test]
    fn empty_sheet_has_no_rows() {
        let bytes = build_xlsx(&[("Empty", sheet_xml(""))], &[]);
        let workbook = Workbook::read(&bytes).expect("workbook decodes");
        assert!(workbook.sheets()[0].to_rows().is_empty());
    }

    #[test]
    fn rejects_non_zip_bytes() {
        let err = Workbook::read(b"<html>not a spreadsheet</html>").unwrap_err();
        assert!(matches!(err, WorkbookError::Zip(_)));
    }

    #[test]
    fn rejects_out_of_range_shared_string() {
        let bytes = build_xlsx(
            &[("S", sheet_xml(r#"<row r="1"><c r="A1" t="s"><v>5</v></c></row>"#))],
            &["only"],
        );
        let err = Workbook::read(&bytes).unwrap_err();
        assert!(matches!(err, WorkbookError::Parse(_)));
    }

    #[test]
    fn parses_cell_references() {
        assert_eq!(parse_cell_ref("A1").ok(), Some((0, 0)));
        assert_eq!(parse_cell_ref("b3").ok(), Some((2, 1)));
        assert_eq!(parse_cell_ref("AA10").ok(), Some((9, 26)));
        assert_eq!(parse_cell_ref("XFD1048576").ok(), Some((1_048_575, 16_383)));
        assert!(parse_cell_ref("A0").is_err());
        assert!(parse_cell_ref("12").is_err());
        assert!(parse_cell_ref("A").is_err());
    }

    #[test]
    fn decodes_excel_escapes() {
        assert_eq!(decode_excel_escapes("a_x000D_b"), "a\rb");
        assert_eq!(decode_excel_escapes("plain"), "plain");
        assert_eq!(decode_excel_escapes("_x12"), "_x12");
        assert_eq!(decode_excel_escapes("_xZZZZ_"), "_xZZZZ_");
    }
}
