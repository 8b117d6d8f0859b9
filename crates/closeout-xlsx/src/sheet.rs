//! Worksheet part model
//!
//! A worksheet part is parsed into three pieces: the XML before `<sheetData>`
//! (kept verbatim as events), the grid rows, and the XML after
//! `</sheetData>`. Only the grid is re-generated on save; everything around
//! it — column widths, merged cells, print setup — passes through untouched.
//! Cell styles are carried as interned style-table indices (`s=` attributes),
//! so copying a style between cells is an index assignment and never mutates
//! a shared style object.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use closeout_core::{CellRef, CellValue};

use crate::error::{XlsxError, XlsxResult};
use crate::escape::decode_excel_escapes;

const DEFAULT_PRELUDE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#;
const DEFAULT_POSTLUDE: &str = "</worksheet>";

/// Content of a single cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    /// No value (the cell may still carry a style)
    Blank,
    /// Numeric value, kept as the raw text from the file to avoid
    /// re-formatting drift on round-trip
    Number(String),
    /// Boolean value
    Boolean(bool),
    /// Error value (#REF!, #VALUE!, ...)
    Error(String),
    /// Text value (shared strings are resolved at parse time)
    Text(String),
    /// Formula (expression without the leading `=`)
    Formula {
        expr: String,
        /// Cached result, verbatim from the file (type attribute + value)
        cached: Option<(Option<String>, String)>,
    },
}

/// A single cell: reference, style index, content
#[derive(Debug, Clone, PartialEq)]
pub struct SheetCell {
    pub r: CellRef,
    /// Index into the workbook's interned style table (`xl/styles.xml`)
    pub style: Option<u32>,
    pub content: CellContent,
}

impl SheetCell {
    /// The cell's text, if it holds a text value
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            CellContent::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Resolve to the engine-facing value
    pub fn value(&self) -> CellValue {
        match &self.content {
            CellContent::Blank => CellValue::Empty,
            CellContent::Number(raw) => match raw.parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::Text(raw.clone()),
            },
            CellContent::Boolean(b) => CellValue::Boolean(*b),
            CellContent::Error(e) => CellValue::Text(e.clone()),
            CellContent::Text(s) => CellValue::Text(s.clone()),
            CellContent::Formula { cached, .. } => match cached {
                Some((t, v)) => match t.as_deref() {
                    None | Some("n") => v
                        .parse::<f64>()
                        .map(CellValue::Number)
                        .unwrap_or(CellValue::Empty),
                    Some("str") => CellValue::Text(v.clone()),
                    Some("b") => CellValue::Boolean(v == "1"),
                    _ => CellValue::Empty,
                },
                None => CellValue::Empty,
            },
        }
    }

    /// Whether the cell counts as blank (no content, or whitespace-only text)
    pub fn is_blank(&self) -> bool {
        match &self.content {
            CellContent::Blank => true,
            CellContent::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

/// A row of cells, 1-based row number, with unknown attributes preserved
#[derive(Debug, Clone, Default)]
pub struct SheetRow {
    /// 1-based row number (as in the `r` attribute)
    pub num: u32,
    /// Row attributes other than `r` (heights, spans, hidden, ...)
    attrs: Vec<(String, String)>,
    pub cells: Vec<SheetCell>,
}

impl SheetRow {
    /// Get the cell in a given 0-based column, if present
    pub fn cell_in_column(&self, col: u16) -> Option<&SheetCell> {
        self.cells.iter().find(|c| c.r.col == col)
    }
}

/// A parsed worksheet part
#[derive(Debug, Clone)]
pub struct Worksheet {
    prelude: Vec<u8>,
    postlude: Vec<u8>,
    rows: Vec<SheetRow>,
}

impl Default for Worksheet {
    fn default() -> Self {
        Self::new()
    }
}

impl Worksheet {
    /// Create an empty worksheet with a minimal XML wrapper
    pub fn new() -> Self {
        Self {
            prelude: DEFAULT_PRELUDE.as_bytes().to_vec(),
            postlude: DEFAULT_POSTLUDE.as_bytes().to_vec(),
            rows: Vec::new(),
        }
    }

    /// Rows in ascending row-number order
    pub fn rows(&self) -> &[SheetRow] {
        &self.rows
    }

    /// Iterate over all cells, row-major
    pub fn iter_cells(&self) -> impl Iterator<Item = &SheetCell> {
        self.rows.iter().flat_map(|r| r.cells.iter())
    }

    /// Highest 1-based row number in use (0 if the sheet is empty)
    pub fn max_row(&self) -> u32 {
        self.rows.last().map(|r| r.num).unwrap_or(0)
    }

    /// Get the row with the given 1-based number
    pub fn row(&self, num: u32) -> Option<&SheetRow> {
        self.rows
            .binary_search_by_key(&num, |r| r.num)
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Get a cell by reference
    pub fn cell(&self, r: CellRef) -> Option<&SheetCell> {
        self.row(r.row + 1).and_then(|row| row.cell_in_column(r.col))
    }

    fn ensure_row(&mut self, num: u32) -> &mut SheetRow {
        let idx = match self.rows.binary_search_by_key(&num, |r| r.num) {
            Ok(i) => i,
            Err(i) => {
                self.rows.insert(
                    i,
                    SheetRow {
                        num,
                        attrs: Vec::new(),
                        cells: Vec::new(),
                    },
                );
                i
            }
        };
        &mut self.rows[idx]
    }

    fn ensure_cell(&mut self, r: CellRef) -> &mut SheetCell {
        let row = self.ensure_row(r.row + 1);
        let idx = match row.cells.binary_search_by_key(&r.col, |c| c.r.col) {
            Ok(i) => i,
            Err(i) => {
                row.cells.insert(
                    i,
                    SheetCell {
                        r,
                        style: None,
                        content: CellContent::Blank,
                    },
                );
                i
            }
        };
        &mut row.cells[idx]
    }

    /// Set a cell's text, keeping its existing style
    pub fn set_text(&mut self, r: CellRef, text: &str) {
        self.ensure_cell(r).content = CellContent::Text(text.to_string());
    }

    /// Set a cell's formula (expression without the leading `=`), keeping
    /// its existing style. Any cached result is discarded so the spreadsheet
    /// application recalculates on open.
    pub fn set_formula(&mut self, r: CellRef, expr: &str) {
        self.ensure_cell(r).content = CellContent::Formula {
            expr: expr.trim_start_matches('=').to_string(),
            cached: None,
        };
    }

    /// Clear a cell's content, keeping its style
    pub fn clear_content(&mut self, r: CellRef) {
        self.ensure_cell(r).content = CellContent::Blank;
    }

    /// Copy cell styles from one row onto another, cell-by-cell by column
    /// position. Styles are interned indices, so this is a value copy.
    pub fn copy_row_style(&mut self, src_num: u32, dst_num: u32) {
        let styled: Vec<(u16, Option<u32>)> = match self.row(src_num) {
            Some(row) => row.cells.iter().map(|c| (c.r.col, c.style)).collect(),
            None => return,
        };
        for (col, style) in styled {
            let cell = self.ensure_cell(CellRef::new(dst_num - 1, col));
            cell.style = style;
        }
    }

    /// Append a record as the next row, starting at column A
    ///
    /// Empty values become blank cells so that column positions stay aligned
    /// with the header schema.
    pub fn append_record(&mut self, values: &[CellValue]) {
        let num = self.max_row() + 1;
        let row = self.ensure_row(num);
        for (i, value) in values.iter().enumerate() {
            let content = match value {
                CellValue::Empty => CellContent::Blank,
                CellValue::Number(n) => CellContent::Number(format_number(*n)),
                CellValue::Boolean(b) => CellContent::Boolean(*b),
                CellValue::Text(s) => {
                    if s.is_empty() {
                        CellContent::Blank
                    } else {
                        CellContent::Text(s.clone())
                    }
                }
            };
            row.cells.push(SheetCell {
                r: CellRef::new(num - 1, i as u16),
                style: None,
                content,
            });
        }
    }

    /// Parse a worksheet part, resolving shared strings as we go
    pub fn parse(xml: &[u8], shared_strings: &[String]) -> XlsxResult<Self> {
        let mut xml_reader = Reader::from_reader(xml);
        xml_reader.trim_text(true);

        let mut prelude = Writer::new(Vec::new());
        let mut postlude = Writer::new(Vec::new());
        let mut rows: Vec<SheetRow> = Vec::new();

        #[derive(PartialEq)]
        enum Section {
            Prelude,
            Grid,
            Postlude,
        }
        let mut section = Section::Prelude;

        // Current cell state
        let mut current_row: Option<SheetRow> = None;
        let mut next_row_num: u32 = 1;
        let mut cell_ref: Option<CellRef> = None;
        let mut cell_type: Option<String> = None;
        let mut cell_style: Option<u32> = None;
        let mut cell_value: Option<String> = None;
        let mut cell_formula: Option<String> = None;
        let mut inline_text = String::new();
        let mut in_cell = false;
        let mut in_value = false;
        let mut in_formula = false;
        let mut in_inline_str = false;
        let mut in_inline_text = false;

        let mut buf = Vec::new();
        loop {
            let event = xml_reader.read_event_into(&mut buf)?;
            match section {
                Section::Prelude => match event {
                    Event::Start(ref e) if e.name().as_ref() == b"sheetData" => {
                        section = Section::Grid;
                    }
                    Event::Empty(ref e) if e.name().as_ref() == b"sheetData" => {
                        section = Section::Postlude;
                    }
                    Event::Eof => break,
                    other => prelude.write_event(other)?,
                },
                Section::Grid => match event {
                    Event::Start(ref e) | Event::Empty(ref e)
                        if e.name().as_ref() == b"row" =>
                    {
                        if let Some(row) = current_row.take() {
                            next_row_num = row.num + 1;
                            rows.push(row);
                        }
                        let mut row = SheetRow::default();
                        row.num = next_row_num;
                        for attr in e.attributes().flatten() {
                            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                            let val = attr
                                .unescape_value()
                                .map(|v| v.to_string())
                                .unwrap_or_default();
                            if key == "r" {
                                if let Ok(n) = val.parse::<u32>() {
                                    row.num = n;
                                }
                            } else {
                                row.attrs.push((key, val));
                            }
                        }
                        if matches!(event, Event::Empty(_)) {
                            next_row_num = row.num + 1;
                            rows.push(row);
                        } else {
                            current_row = Some(row);
                        }
                    }
                    Event::End(ref e) if e.name().as_ref() == b"row" => {
                        if let Some(row) = current_row.take() {
                            next_row_num = row.num + 1;
                            rows.push(row);
                        }
                    }
                    Event::Start(ref e) | Event::Empty(ref e) if e.name().as_ref() == b"c" => {
                        in_cell = true;
                        cell_ref = None;
                        cell_type = None;
                        cell_style = None;
                        cell_value = None;
                        cell_formula = None;
                        inline_text.clear();

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"r" => {
                                    if let Some(v) = attr.unescape_value().ok() {
                                        cell_ref = CellRef::parse(&v).ok();
                                    }
                                }
                                b"t" => {
                                    cell_type =
                                        attr.unescape_value().ok().map(|v| v.to_string());
                                }
                                b"s" => {
                                    cell_style = attr
                                        .unescape_value()
                                        .ok()
                                        .and_then(|v| v.parse::<u32>().ok());
                                }
                                _ => {}
                            }
                        }

                        if matches!(event, Event::Empty(_)) {
                            Self::push_cell(
                                &mut current_row,
                                cell_ref.take(),
                                cell_type.take(),
                                cell_style.take(),
                                None,
                                None,
                                "",
                                shared_strings,
                            )?;
                            in_cell = false;
                        }
                    }
                    Event::End(ref e) if e.name().as_ref() == b"c" => {
                        Self::push_cell(
                            &mut current_row,
                            cell_ref.take(),
                            cell_type.take(),
                            cell_style.take(),
                            cell_value.take(),
                            cell_formula.take(),
                            &inline_text,
                            shared_strings,
                        )?;
                        in_cell = false;
                    }
                    Event::Start(ref e) if e.name().as_ref() == b"v" && in_cell => {
                        in_value = true;
                    }
                    Event::End(ref e) if e.name().as_ref() == b"v" => {
                        in_value = false;
                    }
                    Event::Start(ref e) if e.name().as_ref() == b"f" && in_cell => {
                        in_formula = true;
                        cell_formula = Some(String::new());
                    }
                    Event::Empty(ref e) if e.name().as_ref() == b"f" && in_cell => {
                        cell_formula = Some(String::new());
                    }
                    Event::End(ref e) if e.name().as_ref() == b"f" => {
                        in_formula = false;
                    }
                    Event::Start(ref e) if e.name().as_ref() == b"is" && in_cell => {
                        in_inline_str = true;
                    }
                    Event::End(ref e) if e.name().as_ref() == b"is" => {
                        in_inline_str = false;
                    }
                    Event::Start(ref e) if e.name().as_ref() == b"t" && in_inline_str => {
                        in_inline_text = true;
                    }
                    Event::End(ref e) if e.name().as_ref() == b"t" && in_inline_str => {
                        in_inline_text = false;
                    }
                    Event::Text(e) => {
                        let text = e.unescape()?.to_string();
                        if in_value {
                            cell_value = Some(text);
                        } else if in_formula {
                            if let Some(f) = cell_formula.as_mut() {
                                f.push_str(&text);
                            }
                        } else if in_inline_text {
                            inline_text.push_str(&text);
                        }
                    }
                    Event::End(ref e) if e.name().as_ref() == b"sheetData" => {
                        if let Some(row) = current_row.take() {
                            rows.push(row);
                        }
                        section = Section::Postlude;
                    }
                    Event::Eof => break,
                    _ => {}
                },
                Section::Postlude => match event {
                    Event::Eof => break,
                    other => postlude.write_event(other)?,
                },
            }
            buf.clear();
        }

        rows.sort_by_key(|r| r.num);
        for row in &mut rows {
            row.cells.sort_by_key(|c| c.r.col);
        }

        Ok(Self {
            prelude: prelude.into_inner(),
            postlude: postlude.into_inner(),
            rows,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn push_cell(
        current_row: &mut Option<SheetRow>,
        cell_ref: Option<CellRef>,
        cell_type: Option<String>,
        style: Option<u32>,
        value: Option<String>,
        formula: Option<String>,
        inline_text: &str,
        shared_strings: &[String],
    ) -> XlsxResult<()> {
        let row = match current_row.as_mut() {
            Some(r) => r,
            None => return Ok(()), // cell outside a row; ignore
        };

        let r = match cell_ref {
            Some(r) => r,
            None => {
                // No explicit reference: next free column in this row
                let col = row.cells.last().map(|c| c.r.col + 1).unwrap_or(0);
                CellRef::new(row.num - 1, col)
            }
        };

        let content = if let Some(expr) = formula {
            CellContent::Formula {
                expr,
                cached: value.map(|v| (cell_type.clone(), v)),
            }
        } else if cell_type.as_deref() == Some("inlineStr") {
            CellContent::Text(decode_excel_escapes(inline_text))
        } else if let Some(v) = value {
            match cell_type.as_deref() {
                Some("s") => {
                    let idx: usize = v.parse().map_err(|_| {
                        XlsxError::Parse(format!("Invalid shared string index: {}", v))
                    })?;
                    let s = shared_strings.get(idx).ok_or_else(|| {
                        XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
                    })?;
                    CellContent::Text(s.clone())
                }
                Some("b") => CellContent::Boolean(v == "1" || v.eq_ignore_ascii_case("true")),
                Some("e") => CellContent::Error(v),
                Some("str") => CellContent::Text(decode_excel_escapes(&v)),
                None | Some("n") => CellContent::Number(v),
                Some(_) => CellContent::Text(v),
            }
        } else {
            CellContent::Blank
        };

        row.cells.push(SheetCell {
            r,
            style,
            content,
        });
        Ok(())
    }

    /// Serialize the worksheet back to part XML
    pub fn serialize(&self) -> XlsxResult<Vec<u8>> {
        let mut out = self.prelude.clone();
        let mut writer = Writer::new(&mut out);

        if self.rows.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new("sheetData")))?;
        } else {
            writer.write_event(Event::Start(BytesStart::new("sheetData")))?;
            for row in &self.rows {
                self.write_row(&mut writer, row)?;
            }
            writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
        }

        out.extend_from_slice(&self.postlude);
        Ok(out)
    }

    fn write_row<W: std::io::Write>(
        &self,
        writer: &mut Writer<W>,
        row: &SheetRow,
    ) -> XlsxResult<()> {
        let mut start = BytesStart::new("row");
        let num = row.num.to_string();
        start.push_attribute(("r", num.as_str()));
        for (key, val) in &row.attrs {
            start.push_attribute((key.as_str(), val.as_str()));
        }

        if row.cells.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for cell in &row.cells {
            write_cell(writer, cell)?;
        }
        writer.write_event(Event::End(BytesEnd::new("row")))?;
        Ok(())
    }
}

fn write_cell<W: std::io::Write>(writer: &mut Writer<W>, cell: &SheetCell) -> XlsxResult<()> {
    let mut c = BytesStart::new("c");
    let r = cell.r.to_a1_string();
    c.push_attribute(("r", r.as_str()));
    let style_text;
    if let Some(s) = cell.style {
        style_text = s.to_string();
        c.push_attribute(("s", style_text.as_str()));
    }

    match &cell.content {
        CellContent::Blank => {
            writer.write_event(Event::Empty(c))?;
        }
        CellContent::Number(raw) => {
            writer.write_event(Event::Start(c))?;
            write_text_element(writer, "v", raw)?;
            writer.write_event(Event::End(BytesEnd::new("c")))?;
        }
        CellContent::Boolean(b) => {
            c.push_attribute(("t", "b"));
            writer.write_event(Event::Start(c))?;
            write_text_element(writer, "v", if *b { "1" } else { "0" })?;
            writer.write_event(Event::End(BytesEnd::new("c")))?;
        }
        CellContent::Error(e) => {
            c.push_attribute(("t", "e"));
            writer.write_event(Event::Start(c))?;
            write_text_element(writer, "v", e)?;
            writer.write_event(Event::End(BytesEnd::new("c")))?;
        }
        CellContent::Text(s) => {
            c.push_attribute(("t", "inlineStr"));
            writer.write_event(Event::Start(c))?;
            writer.write_event(Event::Start(BytesStart::new("is")))?;
            let mut t = BytesStart::new("t");
            if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
                t.push_attribute(("xml:space", "preserve"));
            }
            writer.write_event(Event::Start(t))?;
            writer.write_event(Event::Text(BytesText::new(s)))?;
            writer.write_event(Event::End(BytesEnd::new("t")))?;
            writer.write_event(Event::End(BytesEnd::new("is")))?;
            writer.write_event(Event::End(BytesEnd::new("c")))?;
        }
        CellContent::Formula { expr, cached } => {
            if let Some((Some(t), _)) = cached {
                c.push_attribute(("t", t.as_str()));
            }
            writer.write_event(Event::Start(c))?;
            write_text_element(writer, "f", expr)?;
            if let Some((_, v)) = cached {
                write_text_element(writer, "v", v)?;
            }
            writer.write_event(Event::End(BytesEnd::new("c")))?;
        }
    }
    Ok(())
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> XlsxResult<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <cols><col min="1" max="1" width="20" customWidth="1"/></cols>
  <sheetData>
    <row r="1" ht="24" customHeight="1">
      <c r="A1" s="3" t="s"><v>0</v></c>
      <c r="C1"><v>42.5</v></c>
    </row>
    <row r="3">
      <c r="A3" t="inlineStr"><is><t>Subtotal</t></is></c>
      <c r="B3" s="7"/>
      <c r="C3"><f>SUM(C1:C2)</f><v>42.5</v></c>
    </row>
  </sheetData>
  <mergeCells count="1"><mergeCell ref="A5:B5"/></mergeCells>
</worksheet>"#;

    fn shared() -> Vec<String> {
        vec!["Checkouts a pagar".to_string()]
    }

    #[test]
    fn test_parse_resolves_shared_strings() {
        let ws = Worksheet::parse(SHEET.as_bytes(), &shared()).unwrap();
        let cell = ws.cell(CellRef::parse("A1").unwrap()).unwrap();
        assert_eq!(cell.text(), Some("Checkouts a pagar"));
        assert_eq!(cell.style, Some(3));
    }

    #[test]
    fn test_parse_numbers_and_formulas() {
        let ws = Worksheet::parse(SHEET.as_bytes(), &shared()).unwrap();
        let c1 = ws.cell(CellRef::parse("C1").unwrap()).unwrap();
        assert_eq!(c1.value(), CellValue::Number(42.5));

        let c3 = ws.cell(CellRef::parse("C3").unwrap()).unwrap();
        assert!(matches!(
            &c3.content,
            CellContent::Formula { expr, .. } if expr == "SUM(C1:C2)"
        ));
        // Cached value resolves as the effective value
        assert_eq!(c3.value(), CellValue::Number(42.5));
    }

    #[test]
    fn test_blank_cell_keeps_style() {
        let ws = Worksheet::parse(SHEET.as_bytes(), &shared()).unwrap();
        let b3 = ws.cell(CellRef::parse("B3").unwrap()).unwrap();
        assert!(b3.is_blank());
        assert_eq!(b3.style, Some(7));
    }

    #[test]
    fn test_serialize_preserves_surroundings() {
        let ws = Worksheet::parse(SHEET.as_bytes(), &shared()).unwrap();
        let xml = String::from_utf8(ws.serialize().unwrap()).unwrap();

        // Content outside sheetData passes through
        assert!(xml.contains(r#"<col min="1" max="1" width="20" customWidth="1"/>"#));
        assert!(xml.contains(r#"<mergeCell ref="A5:B5"/>"#));
        // Row attributes survive
        assert!(xml.contains(r#"ht="24""#));
        // Styles survive
        assert!(xml.contains(r#"s="7""#));
    }

    #[test]
    fn test_reparse_after_serialize() {
        let ws = Worksheet::parse(SHEET.as_bytes(), &shared()).unwrap();
        let xml = ws.serialize().unwrap();
        // Shared strings were resolved to inline strings on write
        let ws2 = Worksheet::parse(&xml, &[]).unwrap();
        let cell = ws2.cell(CellRef::parse("A1").unwrap()).unwrap();
        assert_eq!(cell.text(), Some("Checkouts a pagar"));
        assert_eq!(ws2.max_row(), 3);
    }

    #[test]
    fn test_set_formula_keeps_style() {
        let mut ws = Worksheet::parse(SHEET.as_bytes(), &shared()).unwrap();
        let r = CellRef::parse("B3").unwrap();
        ws.set_formula(r, "=SUM(C1:C3)");
        let cell = ws.cell(r).unwrap();
        assert_eq!(cell.style, Some(7));
        assert!(matches!(
            &cell.content,
            CellContent::Formula { expr, cached } if expr == "SUM(C1:C3)" && cached.is_none()
        ));
    }

    #[test]
    fn test_copy_row_style() {
        let mut ws = Worksheet::parse(SHEET.as_bytes(), &shared()).unwrap();
        ws.copy_row_style(1, 3);
        let a3 = ws.cell(CellRef::parse("A3").unwrap()).unwrap();
        assert_eq!(a3.style, Some(3));
        // Content untouched
        assert_eq!(a3.text(), Some("Subtotal"));
    }

    #[test]
    fn test_append_record() {
        let mut ws = Worksheet::new();
        ws.append_record(&["ESTABELECIMENTO".into(), "CHECKOUT".into()]);
        ws.append_record(&[CellValue::text("FEE"), CellValue::Empty]);

        assert_eq!(ws.max_row(), 2);
        let a2 = ws.cell(CellRef::parse("A2").unwrap()).unwrap();
        assert_eq!(a2.text(), Some("FEE"));
        let b2 = ws.cell(CellRef::parse("B2").unwrap()).unwrap();
        assert!(b2.is_blank());
    }
}
