//! OPC package access
//!
//! An XLSX file is a zip of XML parts. The workbook is loaded whole: every
//! part is kept in memory in archive order, and parts that are never touched
//! are written back byte-for-byte. This is what keeps styling, charts, and
//! anything else we do not model intact across a process run.

use std::io::{Read, Seek, Write};

use crate::error::{XlsxError, XlsxResult};

/// One part (file entry) of the package
#[derive(Debug, Clone)]
pub(crate) struct Part {
    pub name: String,
    pub data: Vec<u8>,
}

/// An in-memory OOXML package, preserving part order
#[derive(Debug, Clone)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    /// Read a package from a zip archive
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;

        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.push(Part {
                name: file.name().to_string(),
                data,
            });
        }

        let package = Self { parts };

        // Verify this is an XLSX file
        if package.part("[Content_Types].xml").is_none() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        Ok(package)
    }

    /// Get a part's data by name
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// Check whether a part exists
    pub fn has_part(&self, name: &str) -> bool {
        self.parts.iter().any(|p| p.name == name)
    }

    /// Replace a part's data, or append a new part at the end
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(Part {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// Write the package back out as a zip archive, in part order
    pub fn write<W: Write + Seek>(&self, writer: W) -> XlsxResult<()> {
        let mut zip = zip::ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default();

        for part in &self.parts {
            zip.start_file(part.name.as_str(), options)?;
            zip.write_all(&part.data)?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Number of parts in the package
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the package has no parts
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Iterate over part names in archive order
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }
}
