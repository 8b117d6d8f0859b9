//! End-to-end processing
//!
//! One call: load the workbook, classify the detail rows, rebuild the two
//! derived sheets, patch the summary sheet, serialize. Every validation
//! error is raised before the first byte of output is produced.

use closeout_xlsx::Workbook;
use log::info;

use crate::classify::{classify, DetailTable};
use crate::compose::{build_cost_sheet, build_discount_sheet};
use crate::config::ProcessConfig;
use crate::error::{ProcessError, ProcessResult};
use crate::summary::patch_summary;

/// Process a closing workbook with the default configuration
pub fn process(bytes: &[u8]) -> ProcessResult<Vec<u8>> {
    process_with_config(bytes, &ProcessConfig::default())
}

/// Process a closing workbook
pub fn process_with_config(bytes: &[u8], config: &ProcessConfig) -> ProcessResult<Vec<u8>> {
    let mut workbook = Workbook::from_bytes(bytes)?;

    let detail = load_required(&workbook, &config.detail_sheet)?;
    let table = DetailTable::from_sheet(&detail);
    let buckets = classify(&table, config)?;

    let cost = build_cost_sheet(&table, &buckets, config);
    let discount = build_discount_sheet(&table, &buckets);

    let mut summary = load_required(&workbook, &config.summary_sheet)?;
    patch_summary(&mut summary, &cost, &discount, config)?;

    workbook.save_sheet(&config.cost_sheet, &cost)?;
    workbook.save_sheet(&config.discount_sheet, &discount)?;
    workbook.save_sheet(&config.summary_sheet, &summary)?;

    let out = workbook.to_bytes()?;
    info!(
        "processed workbook: {} detail records in, {} bytes out",
        table.records().len(),
        out.len()
    );
    Ok(out)
}

fn load_required(
    workbook: &Workbook,
    name: &str,
) -> ProcessResult<closeout_xlsx::Worksheet> {
    if !workbook.has_sheet(name) {
        return Err(ProcessError::MissingSheet {
            sheet: name.to_string(),
            available: workbook
                .sheet_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        });
    }
    Ok(workbook.load_sheet(name)?)
}
