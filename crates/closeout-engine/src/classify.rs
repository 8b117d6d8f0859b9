//! Detail-row classification
//!
//! The detail sheet is read as a rectangular table: row 1 is the header
//! schema, every following row is a record aligned to it. Records are
//! partitioned into four disjoint buckets keyed by establishment category
//! and checkout-marker presence; input order is preserved within each
//! bucket.

use closeout_core::{normalize_label, CellValue};
use closeout_xlsx::Worksheet;
use log::debug;

use crate::config::ProcessConfig;
use crate::error::{ProcessError, ProcessResult};

/// The detail sheet as a header schema plus records
#[derive(Debug, Clone)]
pub struct DetailTable {
    headers: Vec<String>,
    records: Vec<Vec<CellValue>>,
}

impl DetailTable {
    /// Read the table out of a worksheet; row 1 is the header row
    pub fn from_sheet(sheet: &Worksheet) -> Self {
        let mut headers: Vec<String> = Vec::new();
        if let Some(row) = sheet.row(1) {
            let width = row.cells.last().map(|c| c.r.col as usize + 1).unwrap_or(0);
            headers = vec![String::new(); width];
            for cell in &row.cells {
                headers[cell.r.col as usize] = cell.value().to_string();
            }
        }

        let mut records = Vec::new();
        for row in sheet.rows() {
            if row.num <= 1 {
                continue;
            }
            let mut values = vec![CellValue::Empty; headers.len()];
            for cell in &row.cells {
                let col = cell.r.col as usize;
                if col < values.len() {
                    values[col] = cell.value();
                }
            }
            records.push(values);
        }

        Self { headers, records }
    }

    /// Header texts, in column order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Records in sheet order, each aligned to the header schema
    pub fn records(&self) -> &[Vec<CellValue>] {
        &self.records
    }

    /// Find a column by header text, matching on normalized labels
    pub fn column_index(&self, header: &str) -> Option<usize> {
        let wanted = normalize_label(header);
        self.headers
            .iter()
            .position(|h| normalize_label(h) == wanted)
    }

    fn require_column(&self, header: &str, sheet: &str) -> ProcessResult<usize> {
        self.column_index(header)
            .ok_or_else(|| ProcessError::MissingColumn {
                column: header.to_string(),
                sheet: sheet.to_string(),
                available: self.headers.clone(),
            })
    }
}

/// Record indices for one classification bucket, in input order
pub type Bucket = Vec<usize>;

/// The four disjoint classification buckets
#[derive(Debug, Clone, Default)]
pub struct Buckets {
    pub fee_no_checkout: Bucket,
    pub fee_checkout: Bucket,
    pub discount_checkout: Bucket,
    pub discount_no_checkout: Bucket,
}

/// Whether a checkout marker counts as present
///
/// Missing cells and whitespace-only text are absent; anything else,
/// including the number zero, is present.
pub fn checkout_present(value: &CellValue) -> bool {
    !value.is_blank()
}

/// Partition the detail records into the four buckets
pub fn classify(table: &DetailTable, config: &ProcessConfig) -> ProcessResult<Buckets> {
    let est_col = table.require_column(&config.establishment_column, &config.detail_sheet)?;
    let chk_col = table.require_column(&config.checkout_column, &config.detail_sheet)?;

    let mut buckets = Buckets::default();
    for (i, record) in table.records.iter().enumerate() {
        let establishment = match &record[est_col] {
            CellValue::Text(s) => s.as_str(),
            _ => continue,
        };
        let present = checkout_present(&record[chk_col]);

        if establishment == config.fee_establishment {
            if present {
                buckets.fee_checkout.push(i);
            } else {
                buckets.fee_no_checkout.push(i);
            }
        } else if establishment == config.discount_establishment {
            if present {
                buckets.discount_checkout.push(i);
            } else {
                buckets.discount_no_checkout.push(i);
            }
        }
    }

    debug!(
        "classified {} records: fee {}/{} (no checkout/checkout), discount {}/{}",
        table.records.len(),
        buckets.fee_no_checkout.len(),
        buckets.fee_checkout.len(),
        buckets.discount_no_checkout.len(),
        buckets.discount_checkout.len(),
    );
    Ok(buckets)
}
