//! Summary-sheet patching
//!
//! The summary sheet is never rebuilt; specific cells are located by their
//! visible label text and rewritten in place, so the sheet's layout, row
//! count, and styling survive. Labels are matched through
//! [`normalize_label`], which makes the lookup case- and
//! diacritic-insensitive.

use std::collections::HashMap;

use closeout_core::{normalize_label, CellRef};
use closeout_xlsx::Worksheet;
use log::debug;

use crate::config::ProcessConfig;
use crate::error::{ProcessError, ProcessResult};
use crate::formula::{column_range, FormulaBuilder};

/// Template label for the payroll checkout aggregate
pub const LABEL_FOLHA: &str = "Checkouts a pagar";
/// Template label for the company checkout aggregate
pub const LABEL_EMPRESA: &str = "Taxa administrativa";
/// Template label for the company-cost aggregate
pub const LABEL_CUSTO: &str = "Subsídios";

/// Canonical renamed form of [`LABEL_FOLHA`]
pub const RENAMED_FOLHA: &str = "Checkouts Folha colab.";
/// Canonical renamed form of [`LABEL_EMPRESA`]
pub const RENAMED_EMPRESA: &str = "Checkouts a pagar Empresa";
/// Canonical renamed form of [`LABEL_CUSTO`]
pub const RENAMED_CUSTO: &str = "Custo empresa (Taxa tarifas)";

/// Template label whose cells are blanked when present
pub const LABEL_CREDITS: &str = "Créditos inseridos";

pub const LABEL_TOTAL_EMPRESA: &str = "TOTAL DA EMPRESA";
pub const LABEL_A_DEBITAR: &str = "A debitar em folha";
pub const LABEL_TOTAL_FUNCIONARIO: &str = "TOTAL DO FUNCIONÁRIO";
pub const LABEL_TOTAL_FECHAMENTO: &str = "TOTAL DO FECHAMENTO";

/// Debit-amount header on the rebuilt sheets; normalization also accepts
/// the accented spelling the templates sometimes carry
pub const DEBIT_HEADER: &str = "DEBITO EM FOLHA";

/// Normalized label text to cell coordinate, built once per sheet
///
/// The first occurrence in row-major order wins.
#[derive(Debug, Default)]
pub struct LabelIndex {
    map: HashMap<String, CellRef>,
}

impl LabelIndex {
    pub fn build(sheet: &Worksheet) -> Self {
        let mut map = HashMap::new();
        for cell in sheet.iter_cells() {
            if let Some(text) = cell.text() {
                let key = normalize_label(text);
                if !key.is_empty() {
                    map.entry(key).or_insert(cell.r);
                }
            }
        }
        Self { map }
    }

    pub fn find(&self, label: &str) -> Option<CellRef> {
        self.map.get(&normalize_label(label)).copied()
    }

    /// First label in `labels` that resolves
    pub fn find_any(&self, labels: &[&str]) -> Option<CellRef> {
        labels.iter().find_map(|l| self.find(l))
    }
}

/// The value cell for a label: the nearest non-blank cell strictly to its
/// right on the same row, or the cell immediately to the right when the
/// whole rest of the row is blank
pub fn value_cell(sheet: &Worksheet, label: CellRef) -> CellRef {
    if let Some(row) = sheet.row(label.row + 1) {
        for cell in &row.cells {
            if cell.r.col > label.col && !cell.is_blank() {
                return cell.r;
            }
        }
    }
    CellRef::new(label.row, label.col + 1)
}

/// Find a column on a rebuilt sheet by its row-1 header text
fn header_column(sheet: &Worksheet, header: &str) -> Option<u16> {
    let wanted = normalize_label(header);
    sheet.row(1).and_then(|row| {
        row.cells
            .iter()
            .find(|c| c.text().map(normalize_label) == Some(wanted.clone()))
            .map(|c| c.r.col)
    })
}

fn require_header(sheet: &Worksheet, header: &str, sheet_name: &str) -> ProcessResult<u16> {
    header_column(sheet, header).ok_or_else(|| ProcessError::MissingColumn {
        column: header.to_string(),
        sheet: sheet_name.to_string(),
        available: sheet
            .row(1)
            .map(|row| {
                row.cells
                    .iter()
                    .filter_map(|c| c.text().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default(),
    })
}

fn resolve(index: &LabelIndex, labels: &[&str], sheet: &str) -> ProcessResult<CellRef> {
    index
        .find_any(labels)
        .ok_or_else(|| ProcessError::LabelNotFound {
            label: labels[0].to_string(),
            sheet: sheet.to_string(),
        })
}

/// Patch the summary sheet in place
///
/// All labels and header columns are resolved before the first mutation, so
/// a validation failure leaves nothing half-written. Lookups fall back to
/// the renamed label forms, which keeps a second run over an already
/// processed file resolving the same cells.
pub fn patch_summary(
    summary: &mut Worksheet,
    cost: &Worksheet,
    discount: &Worksheet,
    config: &ProcessConfig,
) -> ProcessResult<()> {
    let sheet_name = config.summary_sheet.as_str();
    let index = LabelIndex::build(summary);

    let folha = resolve(&index, &[LABEL_FOLHA, RENAMED_FOLHA], sheet_name)?;
    let empresa = resolve(&index, &[LABEL_EMPRESA, RENAMED_EMPRESA], sheet_name)?;
    let custo = resolve(&index, &[LABEL_CUSTO, RENAMED_CUSTO], sheet_name)?;
    let total_empresa = resolve(&index, &[LABEL_TOTAL_EMPRESA], sheet_name)?;
    let a_debitar = resolve(&index, &[LABEL_A_DEBITAR], sheet_name)?;
    let total_func = resolve(&index, &[LABEL_TOTAL_FUNCIONARIO], sheet_name)?;
    let fechamento = resolve(&index, &[LABEL_TOTAL_FECHAMENTO], sheet_name)?;

    let est_col = require_header(cost, &config.establishment_column, &config.cost_sheet)?;
    let chk_col = require_header(cost, &config.checkout_column, &config.cost_sheet)?;
    let debit_col = require_header(cost, DEBIT_HEADER, &config.cost_sheet)?;
    let discount_debit_col = require_header(discount, DEBIT_HEADER, &config.discount_sheet)?;

    // Leftover credits cells are blanked, keeping the row in place
    if let Some(credits) = index.find(LABEL_CREDITS) {
        let credits_value = value_cell(summary, credits);
        debug!("clearing credits cells {} and {}", credits, credits_value);
        summary.clear_content(credits);
        summary.clear_content(credits_value);
    }

    summary.set_text(folha, RENAMED_FOLHA);
    summary.set_text(empresa, RENAMED_EMPRESA);
    summary.set_text(custo, RENAMED_CUSTO);
    if empresa.row != folha.row {
        summary.copy_row_style(folha.row + 1, empresa.row + 1);
    }
    if custo.row != folha.row {
        summary.copy_row_style(folha.row + 1, custo.row + 1);
    }

    let f = FormulaBuilder::new(config.arg_separator);
    let debit_range = column_range(&config.cost_sheet, debit_col);
    let est_range = column_range(&config.cost_sheet, est_col);
    let chk_range = column_range(&config.cost_sheet, chk_col);

    let folha_value = value_cell(summary, folha);
    summary.set_formula(
        folha_value,
        &f.sumifs(
            &debit_range,
            &[
                (&est_range, &config.discount_establishment),
                (&chk_range, "<>"),
            ],
        ),
    );

    let empresa_value = value_cell(summary, empresa);
    summary.set_formula(
        empresa_value,
        &f.sumifs(
            &debit_range,
            &[(&est_range, &config.fee_establishment), (&chk_range, "<>")],
        ),
    );

    let custo_value = value_cell(summary, custo);
    summary.set_formula(custo_value, &f.sumifs(&debit_range, &[(&chk_range, "=")]));

    let total_empresa_value = value_cell(summary, total_empresa);
    summary.set_formula(
        total_empresa_value,
        &f.sum(&[
            folha_value.to_a1_string(),
            empresa_value.to_a1_string(),
            custo_value.to_a1_string(),
        ]),
    );

    let a_debitar_value = value_cell(summary, a_debitar);
    summary.set_formula(
        a_debitar_value,
        &f.sum(&[column_range(&config.discount_sheet, discount_debit_col)]),
    );

    let total_func_value = value_cell(summary, total_func);
    summary.set_formula(total_func_value, &a_debitar_value.to_a1_string());

    // The closing total goes one row below its label, in the label's column
    let fechamento_value = CellRef::new(fechamento.row + 1, fechamento.col);
    summary.set_formula(
        fechamento_value,
        &format!(
            "{}+{}",
            total_empresa_value.to_a1_string(),
            total_func_value.to_a1_string()
        ),
    );

    debug!(
        "patched summary: aggregates at {}, {}, {}; totals at {}, {}, {}, {}",
        folha_value,
        empresa_value,
        custo_value,
        total_empresa_value,
        a_debitar_value,
        total_func_value,
        fechamento_value,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use closeout_core::CellValue;
    use closeout_xlsx::CellContent;
    use pretty_assertions::assert_eq;

    fn r(s: &str) -> CellRef {
        CellRef::parse(s).unwrap()
    }

    fn summary_sheet() -> Worksheet {
        let mut ws = Worksheet::new();
        ws.set_text(r("A2"), LABEL_FOLHA);
        ws.set_text(r("A3"), LABEL_EMPRESA);
        ws.set_text(r("A4"), LABEL_CUSTO);
        ws.set_text(r("A5"), LABEL_CREDITS);
        ws.set_text(r("C5"), "123.45");
        ws.set_text(r("A7"), LABEL_TOTAL_EMPRESA);
        ws.set_text(r("A9"), LABEL_A_DEBITAR);
        ws.set_text(r("A10"), LABEL_TOTAL_FUNCIONARIO);
        ws.set_text(r("A12"), LABEL_TOTAL_FECHAMENTO);
        ws
    }

    fn rebuilt_sheet() -> Worksheet {
        let mut ws = Worksheet::new();
        ws.append_record(&[
            CellValue::text("ESTABELECIMENTO"),
            CellValue::text("CHECKOUT"),
            CellValue::text("DÉBITO EM FOLHA"),
        ]);
        ws
    }

    fn formula(ws: &Worksheet, at: &str) -> String {
        match &ws.cell(r(at)).unwrap().content {
            CellContent::Formula { expr, .. } => expr.clone(),
            other => panic!("expected formula at {}, got {:?}", at, other),
        }
    }

    #[test]
    fn test_label_index_is_case_and_diacritic_insensitive() {
        let mut ws = Worksheet::new();
        ws.set_text(r("B4"), "  DÉBITO EM FOLHA  ");
        let index = LabelIndex::build(&ws);
        assert_eq!(index.find("debito em folha"), Some(r("B4")));
        assert_eq!(index.find("outra coisa"), None);
    }

    #[test]
    fn test_label_index_first_occurrence_wins() {
        let mut ws = Worksheet::new();
        ws.set_text(r("B1"), "Total");
        ws.set_text(r("A3"), "total");
        let index = LabelIndex::build(&ws);
        assert_eq!(index.find("TOTAL"), Some(r("B1")));
    }

    #[test]
    fn test_value_cell_nearest_non_blank_right() {
        let mut ws = Worksheet::new();
        ws.set_text(r("A2"), "Label");
        ws.set_text(r("B2"), "   ");
        ws.set_text(r("D2"), "value");
        assert_eq!(value_cell(&ws, r("A2")), r("D2"));
    }

    #[test]
    fn test_value_cell_falls_back_to_immediate_right() {
        let mut ws = Worksheet::new();
        ws.set_text(r("A2"), "Label");
        assert_eq!(value_cell(&ws, r("A2")), r("B2"));
    }

    #[test]
    fn test_patch_writes_aggregates_and_totals() {
        let mut summary = summary_sheet();
        let config = ProcessConfig::default();
        patch_summary(&mut summary, &rebuilt_sheet(), &rebuilt_sheet(), &config).unwrap();

        // Labels renamed in place
        assert_eq!(summary.cell(r("A2")).unwrap().text(), Some(RENAMED_FOLHA));
        assert_eq!(summary.cell(r("A3")).unwrap().text(), Some(RENAMED_EMPRESA));
        assert_eq!(summary.cell(r("A4")).unwrap().text(), Some(RENAMED_CUSTO));

        // The payroll aggregate filters on the discount establishment and a
        // present checkout, never on the fee establishment
        let folha = formula(&summary, "B2");
        assert!(folha.contains("\"RESGATE LIMITE PARA FLEX\""));
        assert!(folha.contains("\"<>\""));
        assert!(!folha.contains("TARIFA"));

        let empresa = formula(&summary, "B3");
        assert!(empresa.contains("\"TARIFA RESGATE LIMITE PARA FLEX\""));

        // The company-cost aggregate filters only on a blank checkout
        let custo = formula(&summary, "B4");
        assert_eq!(
            custo,
            "SUMIFS('Custo empresa'!C:C,'Custo empresa'!B:B,\"=\")"
        );

        assert_eq!(formula(&summary, "B7"), "SUM(B2,B3,B4)");
        assert_eq!(formula(&summary, "B9"), "SUM('Desconto folha'!C:C)");
        assert_eq!(formula(&summary, "B10"), "B9");
        // The closing total lands one row below its label
        assert_eq!(formula(&summary, "A13"), "B7+B10");
    }

    #[test]
    fn test_patch_clears_credits_cells() {
        let mut summary = summary_sheet();
        patch_summary(
            &mut summary,
            &rebuilt_sheet(),
            &rebuilt_sheet(),
            &ProcessConfig::default(),
        )
        .unwrap();

        assert!(summary.cell(r("A5")).unwrap().is_blank());
        assert!(summary.cell(r("C5")).unwrap().is_blank());
    }

    #[test]
    fn test_patch_resolves_renamed_labels() {
        let mut summary = summary_sheet();
        let config = ProcessConfig::default();
        patch_summary(&mut summary, &rebuilt_sheet(), &rebuilt_sheet(), &config).unwrap();
        // Second pass over the already renamed sheet still resolves
        patch_summary(&mut summary, &rebuilt_sheet(), &rebuilt_sheet(), &config).unwrap();

        assert_eq!(summary.cell(r("A2")).unwrap().text(), Some(RENAMED_FOLHA));
        assert_eq!(formula(&summary, "B7"), "SUM(B2,B3,B4)");
    }

    #[test]
    fn test_missing_label_is_validation_error() {
        let mut summary = summary_sheet();
        summary.clear_content(r("A3"));
        let err = patch_summary(
            &mut summary,
            &rebuilt_sheet(),
            &rebuilt_sheet(),
            &ProcessConfig::default(),
        )
        .unwrap_err();
        match &err {
            ProcessError::LabelNotFound { label, sheet } => {
                assert_eq!(label, LABEL_EMPRESA);
                assert_eq!(sheet, "Overview");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.is_validation());
    }

    #[test]
    fn test_missing_debit_header_is_schema_error() {
        let mut cost = Worksheet::new();
        cost.append_record(&[
            CellValue::text("ESTABELECIMENTO"),
            CellValue::text("CHECKOUT"),
        ]);
        let err = patch_summary(
            &mut summary_sheet(),
            &cost,
            &rebuilt_sheet(),
            &ProcessConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ProcessError::MissingColumn { ref column, ref sheet, .. }
                if column == DEBIT_HEADER && sheet == "Custo empresa"
        ));
    }
}
