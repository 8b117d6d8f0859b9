//! Workbook: sheet registry over a [`Package`]
//!
//! The workbook keeps the raw package plus just enough parsed metadata to
//! find, load, replace, and register worksheets. Sheets are parsed lazily on
//! [`Workbook::load_sheet`]; saving a sheet re-serializes only that part.

use std::io::{Cursor, Read, Seek};

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::error::{XlsxError, XlsxResult};
use crate::escape::decode_excel_escapes;
use crate::package::Package;
use crate::sheet::Worksheet;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

const WORKSHEET_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const WORKSHEET_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";

/// Registry entry for one sheet
#[derive(Debug, Clone)]
struct SheetMeta {
    name: String,
    part_path: String,
}

/// An XLSX workbook loaded whole into memory
#[derive(Debug, Clone)]
pub struct Workbook {
    package: Package,
    shared_strings: Vec<String>,
    sheets: Vec<SheetMeta>,
}

impl Workbook {
    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Self> {
        let package = Package::read(reader)?;

        let shared_strings = match package.part(SHARED_STRINGS_PART) {
            Some(xml) => read_shared_strings(xml)?,
            None => Vec::new(), // no shared strings is valid
        };

        let sheet_refs = read_workbook_xml(
            package
                .part(WORKBOOK_PART)
                .ok_or_else(|| XlsxError::MissingPart(WORKBOOK_PART.into()))?,
        )?;
        let rels = read_workbook_rels(
            package
                .part(WORKBOOK_RELS_PART)
                .ok_or_else(|| XlsxError::MissingPart(WORKBOOK_RELS_PART.into()))?,
        )?;

        let mut sheets = Vec::with_capacity(sheet_refs.len());
        for (name, rel_id) in sheet_refs {
            if let Some(path) = rels
                .iter()
                .find(|r| r.id == rel_id && r.rel_type.ends_with("/worksheet"))
                .map(|r| r.target_path())
            {
                sheets.push(SheetMeta {
                    name,
                    part_path: path,
                });
            }
        }

        debug!(
            "loaded workbook: {} parts, {} sheets, {} shared strings",
            package.len(),
            sheets.len(),
            shared_strings.len()
        );

        Ok(Self {
            package,
            shared_strings,
            sheets,
        })
    }

    /// Read a workbook from a byte buffer
    pub fn from_bytes(bytes: &[u8]) -> XlsxResult<Self> {
        Self::read(Cursor::new(bytes))
    }

    /// Sheet names, in workbook order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Check whether a sheet with this name exists
    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets.iter().any(|s| s.name == name)
    }

    /// Parse the named sheet into a [`Worksheet`]
    pub fn load_sheet(&self, name: &str) -> XlsxResult<Worksheet> {
        let meta = self
            .sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| XlsxError::SheetNotFound(name.to_string()))?;
        let xml = self
            .package
            .part(&meta.part_path)
            .ok_or_else(|| XlsxError::MissingPart(meta.part_path.clone()))?;
        Worksheet::parse(xml, &self.shared_strings)
    }

    /// Serialize a sheet into its part, registering the sheet first if no
    /// sheet with this name exists yet
    pub fn save_sheet(&mut self, name: &str, sheet: &Worksheet) -> XlsxResult<()> {
        if !self.has_sheet(name) {
            self.register_sheet(name)?;
        }
        let path = self
            .sheets
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.part_path.clone())
            .ok_or_else(|| XlsxError::SheetNotFound(name.to_string()))?;
        let xml = sheet.serialize()?;
        debug!("saving sheet '{}' to {} ({} bytes)", name, path, xml.len());
        self.package.set_part(&path, xml);
        Ok(())
    }

    /// Serialize the workbook back to bytes
    pub fn to_bytes(&self) -> XlsxResult<Vec<u8>> {
        let mut out = Vec::new();
        self.package.write(Cursor::new(&mut out))?;
        Ok(out)
    }

    /// Register a brand-new sheet: allocate a part path and relationship id,
    /// then patch workbook.xml, its rels, and the content types
    fn register_sheet(&mut self, name: &str) -> XlsxResult<()> {
        // Next free worksheet part number
        let mut n = self.sheets.len() as u32 + 1;
        let part_path = loop {
            let candidate = format!("xl/worksheets/sheet{}.xml", n);
            if !self.package.has_part(&candidate) {
                break candidate;
            }
            n += 1;
        };

        let rel_id = format!("rId{}", self.max_rel_number()? + 1);
        let sheet_id = self.max_sheet_id()? + 1;

        debug!(
            "registering sheet '{}' as {} ({}, sheetId {})",
            name, part_path, rel_id, sheet_id
        );

        // workbook.xml: add <sheet> before </sheets>
        let workbook_xml = self
            .package
            .part(WORKBOOK_PART)
            .ok_or_else(|| XlsxError::MissingPart(WORKBOOK_PART.into()))?;
        let sheet_id_text = sheet_id.to_string();
        let patched = insert_before_close(workbook_xml, b"sheets", |writer| {
            let mut e = BytesStart::new("sheet");
            e.push_attribute(("name", name));
            e.push_attribute(("sheetId", sheet_id_text.as_str()));
            e.push_attribute(("r:id", rel_id.as_str()));
            writer.write_event(Event::Empty(e))?;
            Ok(())
        })?;
        self.package.set_part(WORKBOOK_PART, patched);

        // workbook.xml.rels: add <Relationship> before </Relationships>
        let rels_xml = self
            .package
            .part(WORKBOOK_RELS_PART)
            .ok_or_else(|| XlsxError::MissingPart(WORKBOOK_RELS_PART.into()))?;
        let target = part_path
            .strip_prefix("xl/")
            .unwrap_or(&part_path)
            .to_string();
        let patched = insert_before_close(rels_xml, b"Relationships", |writer| {
            let mut e = BytesStart::new("Relationship");
            e.push_attribute(("Id", rel_id.as_str()));
            e.push_attribute(("Type", WORKSHEET_REL_TYPE));
            e.push_attribute(("Target", target.as_str()));
            writer.write_event(Event::Empty(e))?;
            Ok(())
        })?;
        self.package.set_part(WORKBOOK_RELS_PART, patched);

        // [Content_Types].xml: add <Override> before </Types>
        let types_xml = self
            .package
            .part(CONTENT_TYPES_PART)
            .ok_or_else(|| XlsxError::MissingPart(CONTENT_TYPES_PART.into()))?;
        let part_name = format!("/{}", part_path);
        let patched = insert_before_close(types_xml, b"Types", |writer| {
            let mut e = BytesStart::new("Override");
            e.push_attribute(("PartName", part_name.as_str()));
            e.push_attribute(("ContentType", WORKSHEET_CONTENT_TYPE));
            writer.write_event(Event::Empty(e))?;
            Ok(())
        })?;
        self.package.set_part(CONTENT_TYPES_PART, patched);

        self.sheets.push(SheetMeta {
            name: name.to_string(),
            part_path,
        });
        Ok(())
    }

    /// Highest rIdN number across workbook relationships
    fn max_rel_number(&self) -> XlsxResult<u32> {
        let rels_xml = self
            .package
            .part(WORKBOOK_RELS_PART)
            .ok_or_else(|| XlsxError::MissingPart(WORKBOOK_RELS_PART.into()))?;
        let max = read_workbook_rels(rels_xml)?
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()))
            .max()
            .unwrap_or(0);
        Ok(max)
    }

    /// Highest sheetId in workbook.xml
    fn max_sheet_id(&self) -> XlsxResult<u32> {
        let xml = self
            .package
            .part(WORKBOOK_PART)
            .ok_or_else(|| XlsxError::MissingPart(WORKBOOK_PART.into()))?;

        let mut xml_reader = Reader::from_reader(xml);
        xml_reader.trim_text(true);
        let mut buf = Vec::new();
        let mut max = 0u32;

        loop {
            match xml_reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"sheet" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"sheetId" {
                            if let Some(id) =
                                attr.unescape_value().ok().and_then(|v| v.parse().ok())
                            {
                                max = max.max(id);
                            }
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        Ok(max)
    }
}

/// One relationship from workbook.xml.rels
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

impl Relationship {
    /// Target resolved to a full part path (targets are relative to xl/)
    fn target_path(&self) -> String {
        if let Some(absolute) = self.target.strip_prefix('/') {
            absolute.to_string()
        } else {
            format!("xl/{}", self.target)
        }
    }
}

/// Read the shared strings table, concatenating rich-text runs
fn read_shared_strings(xml: &[u8]) -> XlsxResult<Vec<String>> {
    let mut xml_reader = Reader::from_reader(xml);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"t" if in_si => {
                    in_t = true;
                }
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"si" => {
                    strings.push(decode_excel_escapes(&current));
                    current.clear();
                    in_si = false;
                }
                b"t" => {
                    in_t = false;
                }
                _ => {}
            },
            Event::Text(e) if in_t => {
                current.push_str(&e.unescape()?);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// Read workbook.xml sheet entries as (name, rId) pairs
fn read_workbook_xml(xml: &[u8]) -> XlsxResult<Vec<(String, String)>> {
    let mut xml_reader = Reader::from_reader(xml);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut rel_id = None;

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => {
                            name = attr.unescape_value().ok().map(|v| v.to_string());
                        }
                        b"r:id" => {
                            rel_id = attr.unescape_value().ok().map(|v| v.to_string());
                        }
                        _ => {}
                    }
                }

                if let (Some(name), Some(rel_id)) = (name, rel_id) {
                    sheets.push((name, rel_id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

/// Read workbook.xml.rels relationships
fn read_workbook_rels(xml: &[u8]) -> XlsxResult<Vec<Relationship>> {
    let mut xml_reader = Reader::from_reader(xml);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut rels = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut target = None;
                let mut rel_type = None;

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => {
                            id = attr.unescape_value().ok().map(|v| v.to_string());
                        }
                        b"Target" => {
                            target = attr.unescape_value().ok().map(|v| v.to_string());
                        }
                        b"Type" => {
                            rel_type = attr.unescape_value().ok().map(|v| v.to_string());
                        }
                        _ => {}
                    }
                }

                if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                    rels.push(Relationship {
                        id,
                        rel_type,
                        target,
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Copy an XML document, inserting new content immediately before the first
/// closing tag with the given name
fn insert_before_close(
    xml: &[u8],
    close_tag: &[u8],
    build: impl FnOnce(&mut Writer<Vec<u8>>) -> XlsxResult<()>,
) -> XlsxResult<Vec<u8>> {
    let mut xml_reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();
    let mut build = Some(build);

    loop {
        let event = xml_reader.read_event_into(&mut buf)?;
        match event {
            Event::End(ref e) if e.name().as_ref() == close_tag => {
                if let Some(build) = build.take() {
                    build(&mut writer)?;
                }
                writer.write_event(event)?;
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
        buf.clear();
    }

    if build.is_some() {
        return Err(XlsxError::Parse(format!(
            "closing tag </{}> not found",
            String::from_utf8_lossy(close_tag)
        )));
    }

    Ok(writer.into_inner())
}
