//! Formula string assembly
//!
//! The engine never evaluates anything; it only writes syntactically correct
//! formula expressions for the spreadsheet application to calculate at open
//! time. The argument separator is the single locale-dependent piece.

use closeout_core::CellRef;

use crate::config::ArgSeparator;

/// Builds formula expressions (without the leading `=`)
#[derive(Debug, Clone, Copy)]
pub struct FormulaBuilder {
    sep: char,
}

impl FormulaBuilder {
    pub fn new(separator: ArgSeparator) -> Self {
        Self {
            sep: separator.as_char(),
        }
    }

    /// `SUMIFS(sum_range, range1, "crit1", range2, "crit2", ...)`
    ///
    /// Criteria are emitted as quoted string literals, with embedded quotes
    /// doubled.
    pub fn sumifs(&self, sum_range: &str, criteria: &[(&str, &str)]) -> String {
        let mut expr = format!("SUMIFS({}", sum_range);
        for (range, criterion) in criteria {
            expr.push(self.sep);
            expr.push_str(range);
            expr.push(self.sep);
            expr.push('"');
            expr.push_str(&criterion.replace('"', "\"\""));
            expr.push('"');
        }
        expr.push(')');
        expr
    }

    /// `SUM(arg1, arg2, ...)`
    pub fn sum(&self, args: &[String]) -> String {
        let mut expr = String::from("SUM(");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                expr.push(self.sep);
            }
            expr.push_str(arg);
        }
        expr.push(')');
        expr
    }
}

/// Whole-column range on another sheet, e.g. `'Custo empresa'!D:D`
pub fn column_range(sheet: &str, col: u16) -> String {
    let letters = CellRef::column_to_letters(col);
    format!("{}!{}:{}", quote_sheet_name(sheet), letters, letters)
}

/// Quote a sheet name for use in a formula when it needs quoting
fn quote_sheet_name(name: &str) -> String {
    let plain = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}
