//! Output sheet assembly
//!
//! The company-cost and payroll-discount sheets are rebuilt from scratch
//! every run: header schema first, then the classified records, with
//! section-divider pseudo-rows between cost sections. Dividers carry their
//! title in the first column and blanks in every other column, so
//! column-letter lookups stay aligned with the detail schema.

use closeout_core::CellValue;
use closeout_xlsx::Worksheet;

use crate::classify::{Bucket, Buckets, DetailTable};
use crate::config::{CostSheetPolicy, ProcessConfig};

/// Divider title above the fee-with-checkout section
pub const DIVIDER_EMPRESA: &str = "Checkouts Empresa";
/// Divider title above the discount-with-checkout section
pub const DIVIDER_FOLHA: &str = "Checkouts Folha colab";

/// Build the company-cost sheet per the configured section policy
pub fn build_cost_sheet(table: &DetailTable, buckets: &Buckets, config: &ProcessConfig) -> Worksheet {
    let mut sheet = Worksheet::new();
    append_headers(&mut sheet, table);

    append_bucket(&mut sheet, table, &buckets.fee_no_checkout);
    append_divider(&mut sheet, table, DIVIDER_EMPRESA);
    append_bucket(&mut sheet, table, &buckets.fee_checkout);

    if config.cost_sheet_policy == CostSheetPolicy::FeeThenDiscountCheckouts {
        append_divider(&mut sheet, table, DIVIDER_FOLHA);
        append_bucket(&mut sheet, table, &buckets.discount_checkout);
    }

    sheet
}

/// Build the payroll-discount sheet: discount rows without checkout, no
/// dividers
pub fn build_discount_sheet(table: &DetailTable, buckets: &Buckets) -> Worksheet {
    let mut sheet = Worksheet::new();
    append_headers(&mut sheet, table);
    append_bucket(&mut sheet, table, &buckets.discount_no_checkout);
    sheet
}

fn append_headers(sheet: &mut Worksheet, table: &DetailTable) {
    let headers: Vec<CellValue> = table
        .headers()
        .iter()
        .map(|h| CellValue::text(h.clone()))
        .collect();
    sheet.append_record(&headers);
}

fn append_bucket(sheet: &mut Worksheet, table: &DetailTable, bucket: &Bucket) {
    for &i in bucket {
        sheet.append_record(&table.records()[i]);
    }
}

fn append_divider(sheet: &mut Worksheet, table: &DetailTable, title: &str) {
    let mut values = vec![CellValue::Empty; table.headers().len().max(1)];
    values[0] = CellValue::text(title);
    sheet.append_record(&values);
}
