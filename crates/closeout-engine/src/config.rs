//! Processing configuration
//!
//! Every sheet name, column header, and establishment constant the engine
//! matches against is a configuration field, defaulting to the vocabulary of
//! the production closing template. A TOML file can override any subset of
//! fields.

use serde::Deserialize;

use crate::error::ProcessResult;

/// Separator between formula arguments
///
/// Spreadsheet locales disagree: most use a comma, some (pt-BR among them)
/// use a semicolon when decimals are comma-separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgSeparator {
    #[default]
    Comma,
    Semicolon,
}

impl ArgSeparator {
    pub fn as_char(self) -> char {
        match self {
            Self::Comma => ',',
            Self::Semicolon => ';',
        }
    }
}

/// Which sections make up the rebuilt company-cost sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSheetPolicy {
    /// Fee rows without checkout, then fee rows with checkout, then discount
    /// rows with checkout, each section behind a divider row
    #[default]
    FeeThenDiscountCheckouts,
    /// Fee rows only, split by checkout presence
    FeeOnly,
}

/// Vocabulary and policy for one processing run
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessConfig {
    /// Name of the detail sheet holding one row per transaction
    pub detail_sheet: String,
    /// Header of the establishment-category column on the detail sheet
    pub establishment_column: String,
    /// Header of the checkout-marker column on the detail sheet
    pub checkout_column: String,
    /// Establishment value marking a fee row
    pub fee_establishment: String,
    /// Establishment value marking a discount row
    pub discount_establishment: String,
    /// Name of the rebuilt company-cost sheet
    pub cost_sheet: String,
    /// Name of the rebuilt payroll-discount sheet
    pub discount_sheet: String,
    /// Name of the summary sheet patched in place
    pub summary_sheet: String,
    pub cost_sheet_policy: CostSheetPolicy,
    pub arg_separator: ArgSeparator,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            detail_sheet: "Detalhado".into(),
            establishment_column: "ESTABELECIMENTO".into(),
            checkout_column: "CHECKOUT".into(),
            fee_establishment: "TARIFA RESGATE LIMITE PARA FLEX".into(),
            discount_establishment: "RESGATE LIMITE PARA FLEX".into(),
            cost_sheet: "Custo empresa".into(),
            discount_sheet: "Desconto folha".into(),
            summary_sheet: "Overview".into(),
            cost_sheet_policy: CostSheetPolicy::default(),
            arg_separator: ArgSeparator::default(),
        }
    }
}

impl ProcessConfig {
    /// Parse a TOML override file; unset fields keep their defaults
    pub fn from_toml(text: &str) -> ProcessResult<Self> {
        Ok(toml::from_str(text)?)
    }
}
