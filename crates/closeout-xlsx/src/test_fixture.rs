//! Minimal workbook fixtures for tests
//!
//! Builds a syntactically valid XLSX package from hand-written `sheetData`
//! XML, the same way real template files are laid out. Used by this crate's
//! unit tests and by the engine's integration tests.

use std::io::{Cursor, Write};

/// Builds a minimal XLSX byte buffer with the given sheets
#[derive(Debug, Default)]
pub struct FixtureBuilder {
    sheets: Vec<(String, String)>,
    shared_strings: Vec<String>,
}

impl FixtureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet; `sheet_data` is the inner XML of `<sheetData>`
    pub fn sheet(mut self, name: &str, sheet_data: &str) -> Self {
        self.sheets.push((name.to_string(), sheet_data.to_string()));
        self
    }

    /// Add shared strings (cells may then use `t="s"` with indices)
    pub fn shared_strings(mut self, strings: &[&str]) -> Self {
        self.shared_strings = strings.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Assemble the package
    pub fn build(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = zip::write::SimpleFileOptions::default();

            let mut types = String::from(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
            );
            for i in 1..=self.sheets.len() {
                types.push_str(&format!(
                    r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                    i
                ));
            }
            if !self.shared_strings.is_empty() {
                types.push_str(
                    r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
                );
            }
            types.push_str("</Types>");
            zip.start_file("[Content_Types].xml", options).unwrap();
            zip.write_all(types.as_bytes()).unwrap();

            zip.start_file("_rels/.rels", options).unwrap();
            zip.write_all(br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#).unwrap();

            let mut workbook = String::from(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
            );
            for (i, (name, _)) in self.sheets.iter().enumerate() {
                workbook.push_str(&format!(
                    r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                    name,
                    i + 1,
                    i + 1
                ));
            }
            workbook.push_str("</sheets></workbook>");
            zip.start_file("xl/workbook.xml", options).unwrap();
            zip.write_all(workbook.as_bytes()).unwrap();

            let mut rels = String::from(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            );
            for i in 1..=self.sheets.len() {
                rels.push_str(&format!(
                    r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                    i, i
                ));
            }
            if !self.shared_strings.is_empty() {
                rels.push_str(&format!(
                    r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
                    self.sheets.len() + 1
                ));
            }
            rels.push_str("</Relationships>");
            zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
            zip.write_all(rels.as_bytes()).unwrap();

            if !self.shared_strings.is_empty() {
                let mut sst = format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
                    self.shared_strings.len()
                );
                for s in &self.shared_strings {
                    sst.push_str(&format!("<si><t>{}</t></si>", xml_escape(s)));
                }
                sst.push_str("</sst>");
                zip.start_file("xl/sharedStrings.xml", options).unwrap();
                zip.write_all(sst.as_bytes()).unwrap();
            }

            for (i, (_, sheet_data)) in self.sheets.iter().enumerate() {
                let body = if sheet_data.is_empty() {
                    "<sheetData/>".to_string()
                } else {
                    format!("<sheetData>{}</sheetData>", sheet_data)
                };
                let sheet = format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">{}</worksheet>"#,
                    body
                );
                zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)
                    .unwrap();
                zip.write_all(sheet.as_bytes()).unwrap();
            }

            zip.finish().unwrap();
        }
        buf
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Shorthand for an inline-string cell
pub fn text_cell(r: &str, text: &str) -> String {
    format!(
        r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
        r,
        xml_escape(text)
    )
}

/// Shorthand for a numeric cell
pub fn number_cell(r: &str, n: f64) -> String {
    format!(r#"<c r="{}"><v>{}</v></c>"#, r, n)
}
