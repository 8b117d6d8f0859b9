//! End-to-end processing tests over in-memory workbooks

use closeout_engine::{
    process, process_with_config, ArgSeparator, CostSheetPolicy, ProcessConfig, ProcessError,
    Workbook,
};
use closeout_xlsx::test_fixture::{number_cell, text_cell, FixtureBuilder};
use closeout_xlsx::{CellContent, Package, Worksheet};
use pretty_assertions::assert_eq;
use std::io::Cursor;

const FEE: &str = "TARIFA RESGATE LIMITE PARA FLEX";
const DISCOUNT: &str = "RESGATE LIMITE PARA FLEX";

fn detail_sheet_data() -> String {
    let mut data = format!(
        "<row r=\"1\">{}{}{}</row>",
        text_cell("A1", "ESTABELECIMENTO"),
        text_cell("B1", "CHECKOUT"),
        text_cell("C1", "DEBITO EM FOLHA"),
    );
    for (i, (est, chk, debit)) in [
        (FEE, "", 10.0),
        (FEE, "2024-01-01", 20.0),
        (DISCOUNT, "2024-01-02", 30.0),
        (DISCOUNT, "", 40.0),
        ("OUTRO LANCAMENTO", "", 99.0),
    ]
    .iter()
    .enumerate()
    {
        let r = i + 2;
        data.push_str(&format!("<row r=\"{}\">", r));
        data.push_str(&text_cell(&format!("A{}", r), est));
        if !chk.is_empty() {
            data.push_str(&text_cell(&format!("B{}", r), chk));
        }
        data.push_str(&number_cell(&format!("C{}", r), *debit));
        data.push_str("</row>");
    }
    data
}

fn overview_sheet_data() -> String {
    let labeled = |r: usize, label: &str| {
        format!(
            "<row r=\"{0}\">{1}{2}</row>",
            r,
            text_cell(&format!("A{}", r), label),
            number_cell(&format!("B{}", r), 0.0),
        )
    };
    let mut data = String::new();
    data.push_str(&labeled(2, "Checkouts a pagar"));
    data.push_str(&labeled(3, "Taxa administrativa"));
    data.push_str(&labeled(4, "Subsídios"));
    data.push_str(&labeled(5, "Créditos inseridos"));
    data.push_str(&labeled(7, "TOTAL DA EMPRESA"));
    data.push_str(&labeled(9, "A debitar em folha"));
    data.push_str(&labeled(10, "TOTAL DO FUNCIONÁRIO"));
    data.push_str(&format!(
        "<row r=\"12\">{}</row>",
        text_cell("A12", "TOTAL DO FECHAMENTO")
    ));
    data
}

fn fixture() -> Vec<u8> {
    FixtureBuilder::new()
        .sheet("Detalhado", &detail_sheet_data())
        .sheet("Overview", &overview_sheet_data())
        .sheet(
            "Dados",
            &format!("<row r=\"1\">{}</row>", text_cell("A1", "untouched")),
        )
        .build()
}

fn col_texts(sheet: &Worksheet, col: u16) -> Vec<String> {
    sheet
        .rows()
        .iter()
        .map(|row| {
            row.cell_in_column(col)
                .map(|c| c.value().to_string())
                .unwrap_or_default()
        })
        .collect()
}

fn formula_at(sheet: &Worksheet, cell: &str) -> String {
    let r = cell.parse().unwrap();
    match &sheet.cell(r).unwrap().content {
        CellContent::Formula { expr, .. } => expr.clone(),
        other => panic!("expected formula at {}, got {:?}", cell, other),
    }
}

#[test]
fn test_process_rebuilds_cost_and_discount_sheets() {
    let out = process(&fixture()).unwrap();
    let workbook = Workbook::from_bytes(&out).unwrap();
    assert!(workbook.has_sheet("Custo empresa"));
    assert!(workbook.has_sheet("Desconto folha"));

    let cost = workbook.load_sheet("Custo empresa").unwrap();
    assert_eq!(
        col_texts(&cost, 0),
        vec![
            "ESTABELECIMENTO",
            FEE,
            "Checkouts Empresa",
            FEE,
            "Checkouts Folha colab",
            DISCOUNT,
        ]
    );
    assert_eq!(col_texts(&cost, 2), vec!["DEBITO EM FOLHA", "10", "", "20", "", "30"]);

    let discount = workbook.load_sheet("Desconto folha").unwrap();
    assert_eq!(col_texts(&discount, 0), vec!["ESTABELECIMENTO", DISCOUNT]);
    assert_eq!(col_texts(&discount, 2), vec!["DEBITO EM FOLHA", "40"]);
}

#[test]
fn test_process_patches_overview_formulas() {
    let out = process(&fixture()).unwrap();
    let workbook = Workbook::from_bytes(&out).unwrap();
    let overview = workbook.load_sheet("Overview").unwrap();

    // Renamed labels
    // Rows 2-5, 7, 9, 10, 12, plus row 13 created for the closing total
    assert_eq!(
        col_texts(&overview, 0),
        vec![
            "Checkouts Folha colab.",
            "Checkouts a pagar Empresa",
            "Custo empresa (Taxa tarifas)",
            "",
            "TOTAL DA EMPRESA",
            "A debitar em folha",
            "TOTAL DO FUNCIONÁRIO",
            "TOTAL DO FECHAMENTO",
            "",
        ]
    );

    let folha = formula_at(&overview, "B2");
    assert_eq!(
        folha,
        format!(
            "SUMIFS('Custo empresa'!C:C,'Custo empresa'!A:A,\"{}\",'Custo empresa'!B:B,\"<>\")",
            DISCOUNT
        )
    );
    let empresa = formula_at(&overview, "B3");
    assert!(empresa.contains(&format!("\"{}\"", FEE)));
    assert_eq!(
        formula_at(&overview, "B4"),
        "SUMIFS('Custo empresa'!C:C,'Custo empresa'!B:B,\"=\")"
    );
    assert_eq!(formula_at(&overview, "B7"), "SUM(B2,B3,B4)");
    assert_eq!(formula_at(&overview, "B9"), "SUM('Desconto folha'!C:C)");
    assert_eq!(formula_at(&overview, "B10"), "B9");
    assert_eq!(formula_at(&overview, "A13"), "B7+B10");

    // Credits cells blanked, row still present
    let credits_row = overview.row(5).unwrap();
    assert!(credits_row.cells.iter().all(|c| c.is_blank()));
}

#[test]
fn test_untouched_sheets_are_byte_identical() {
    let input = fixture();
    let out = process(&input).unwrap();

    let before = Package::read(Cursor::new(input.clone())).unwrap();
    let after = Package::read(Cursor::new(out)).unwrap();

    // Dados is sheet 3 in the fixture and is never touched
    assert_eq!(
        before.part("xl/worksheets/sheet3.xml"),
        after.part("xl/worksheets/sheet3.xml")
    );
    // The detail sheet is read but never rewritten
    assert_eq!(
        before.part("xl/worksheets/sheet1.xml"),
        after.part("xl/worksheets/sheet1.xml")
    );
}

#[test]
fn test_process_twice_is_stable() {
    let once = process(&fixture()).unwrap();
    let twice = process(&once).unwrap();

    let a = Workbook::from_bytes(&once).unwrap();
    let b = Workbook::from_bytes(&twice).unwrap();
    for name in ["Custo empresa", "Desconto folha"] {
        let sa = a.load_sheet(name).unwrap();
        let sb = b.load_sheet(name).unwrap();
        for col in 0..3 {
            assert_eq!(col_texts(&sa, col), col_texts(&sb, col), "{}", name);
        }
    }

    let overview = b.load_sheet("Overview").unwrap();
    assert_eq!(formula_at(&overview, "B7"), "SUM(B2,B3,B4)");
}

#[test]
fn test_missing_detail_sheet() {
    let bytes = FixtureBuilder::new()
        .sheet("Overview", &overview_sheet_data())
        .build();
    let err = process(&bytes).unwrap_err();
    match err {
        ProcessError::MissingSheet { ref sheet, ref available } => {
            assert_eq!(sheet, "Detalhado");
            assert_eq!(available, &vec!["Overview".to_string()]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_missing_establishment_column_fails_without_output() {
    let data = format!(
        "<row r=\"1\">{}{}</row>",
        text_cell("A1", "LOJA"),
        text_cell("B1", "CHECKOUT"),
    );
    let bytes = FixtureBuilder::new()
        .sheet("Detalhado", &data)
        .sheet("Overview", &overview_sheet_data())
        .build();
    let err = process(&bytes).unwrap_err();
    assert!(matches!(
        err,
        ProcessError::MissingColumn { ref column, .. } if column == "ESTABELECIMENTO"
    ));
    assert!(err.is_validation());
}

#[test]
fn test_fee_only_policy() {
    let config = ProcessConfig {
        cost_sheet_policy: CostSheetPolicy::FeeOnly,
        ..ProcessConfig::default()
    };
    let out = process_with_config(&fixture(), &config).unwrap();
    let workbook = Workbook::from_bytes(&out).unwrap();
    let cost = workbook.load_sheet("Custo empresa").unwrap();
    assert_eq!(
        col_texts(&cost, 0),
        vec!["ESTABELECIMENTO", FEE, "Checkouts Empresa", FEE]
    );
}

#[test]
fn test_semicolon_argument_separator() {
    let config = ProcessConfig {
        arg_separator: ArgSeparator::Semicolon,
        ..ProcessConfig::default()
    };
    let out = process_with_config(&fixture(), &config).unwrap();
    let workbook = Workbook::from_bytes(&out).unwrap();
    let overview = workbook.load_sheet("Overview").unwrap();
    assert_eq!(formula_at(&overview, "B7"), "SUM(B2;B3;B4)");
}
