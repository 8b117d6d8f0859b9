//! closeout - closing workbook processor

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use closeout_engine::{ProcessConfig, ProcessError, Workbook};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Bad invocation or bad input file, as opposed to an unexpected failure
#[derive(Debug)]
struct UsageError(String);

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for UsageError {}

#[derive(Parser)]
#[command(name = "closeout")]
#[command(author, version, about = "Payroll/benefits closing workbook processor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the detail rows, rebuild the derived sheets, and patch the
    /// summary formulas
    Process {
        /// Input workbook (.xlsx)
        input: PathBuf,

        /// Output file (default: processed_<input name> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML file overriding the default sheet/column vocabulary
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the sheets in a workbook
    Sheets {
        /// Input workbook (.xlsx)
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Process {
            input,
            output,
            config,
        } => run_process(&input, output.as_deref(), config.as_deref()),
        Commands::Sheets { input } => list_sheets(&input),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            // Validation failures get their own exit code so callers can
            // tell bad input from a crash
            let validation = err.downcast_ref::<UsageError>().is_some()
                || err
                    .downcast_ref::<ProcessError>()
                    .map(ProcessError::is_validation)
                    .unwrap_or(false);
            if validation {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run_process(input: &Path, output: Option<&Path>, config: Option<&Path>) -> Result<()> {
    if !has_xlsx_extension(input) {
        return Err(UsageError(format!(
            "input must be an .xlsx workbook: '{}'",
            input.display()
        ))
        .into());
    }

    let config = match config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config '{}'", path.display()))?;
            ProcessConfig::from_toml(&text)
                .with_context(|| format!("Failed to parse config '{}'", path.display()))?
        }
        None => ProcessConfig::default(),
    };

    let bytes = std::fs::read(input)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;

    let out = closeout_engine::process_with_config(&bytes, &config)
        .with_context(|| format!("Failed to process '{}'", input.display()))?;

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => default_output_path(input),
    };
    std::fs::write(&output, &out)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;

    eprintln!("Wrote {} ({} bytes)", output.display(), out.len());
    Ok(())
}

fn list_sheets(input: &Path) -> Result<()> {
    let bytes = std::fs::read(input)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;
    let workbook = Workbook::from_bytes(&bytes)
        .with_context(|| format!("Failed to open '{}'", input.display()))?;
    for name in workbook.sheet_names() {
        println!("{}", name);
    }
    Ok(())
}

fn has_xlsx_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false)
}

/// `processed_<name>` next to the input file
fn default_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.xlsx".to_string());
    input.with_file_name(format!("processed_{}", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xlsx_extension_check() {
        assert!(has_xlsx_extension(Path::new("a/fechamento.xlsx")));
        assert!(has_xlsx_extension(Path::new("FECHAMENTO.XLSX")));
        assert!(!has_xlsx_extension(Path::new("fechamento.xls")));
        assert!(!has_xlsx_extension(Path::new("fechamento")));
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/tmp/fechamento.xlsx")),
            PathBuf::from("/tmp/processed_fechamento.xlsx")
        );
    }

    #[test]
    fn test_run_process_writes_derived_file() {
        use closeout_xlsx::test_fixture::{number_cell, text_cell, FixtureBuilder};

        let detail = format!(
            "<row r=\"1\">{}{}{}</row><row r=\"2\">{}{}</row>",
            text_cell("A1", "ESTABELECIMENTO"),
            text_cell("B1", "CHECKOUT"),
            text_cell("C1", "DEBITO EM FOLHA"),
            text_cell("A2", "TARIFA RESGATE LIMITE PARA FLEX"),
            number_cell("C2", 10.0),
        );
        let overview = [
            (2, "Checkouts a pagar"),
            (3, "Taxa administrativa"),
            (4, "Subsídios"),
            (6, "TOTAL DA EMPRESA"),
            (7, "A debitar em folha"),
            (8, "TOTAL DO FUNCIONÁRIO"),
            (9, "TOTAL DO FECHAMENTO"),
        ]
        .iter()
        .map(|(r, label)| {
            format!(
                "<row r=\"{0}\">{1}</row>",
                r,
                text_cell(&format!("A{}", r), label)
            )
        })
        .collect::<String>();
        let bytes = FixtureBuilder::new()
            .sheet("Detalhado", &detail)
            .sheet("Overview", &overview)
            .build();

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("fechamento.xlsx");
        std::fs::write(&input, bytes).unwrap();

        run_process(&input, None, None).unwrap();

        let output = dir.path().join("processed_fechamento.xlsx");
        let out = std::fs::read(output).unwrap();
        let workbook = Workbook::from_bytes(&out).unwrap();
        assert!(workbook.has_sheet("Custo empresa"));
        assert!(workbook.has_sheet("Desconto folha"));
    }

    #[test]
    fn test_run_process_rejects_other_extensions() {
        let err = run_process(Path::new("book.xls"), None, None).unwrap_err();
        assert!(err.downcast_ref::<UsageError>().is_some());
    }
}
