//! `bank2csv`: bank statement exports to budgeting CSV

use crate::options::DateRangeArgs;
use crate::prelude::{eprintln, *};
use colored::Colorize;
use homecooked_core::bank::{
    convert_records, parse_delimited, render_csv, AmountColumns, BudgetRow, ColumnMap,
    ConversionReport,
};
use homecooked_core::dates::DateRange;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

#[derive(Debug, Clone, clap::Args)]
pub struct App {
    /// Statement export as delimited text. Reads stdin when omitted or "-".
    pub input: Option<PathBuf>,

    /// Field delimiter
    #[arg(long, default_value_t = ';')]
    pub delimiter: char,

    /// Decimal separator used by the amounts
    #[arg(long, default_value_t = ',')]
    pub decimal: char,

    /// Number of leading rows to skip (column headers, account info)
    #[arg(long, default_value_t = 0)]
    pub skip_rows: usize,

    /// 0-indexed column holding the DD/MM/YY date
    #[arg(long, default_value_t = 0)]
    pub date_column: usize,

    /// 0-indexed payee column
    #[arg(long, default_value_t = 1)]
    pub payee_column: usize,

    /// 0-indexed memo column (ignored when it is also the --amount-column)
    #[arg(long, default_value_t = 2)]
    pub memo_column: usize,

    /// Leave the memo column empty
    #[arg(long)]
    pub no_memo: bool,

    /// 0-indexed outflow column
    #[arg(long, default_value_t = 3)]
    pub outflow_column: usize,

    /// 0-indexed inflow column
    #[arg(long, default_value_t = 4)]
    pub inflow_column: usize,

    /// Single signed amount column; negative values become outflows.
    /// Replaces --outflow-column/--inflow-column.
    #[arg(long)]
    pub amount_column: Option<usize>,

    #[command(flatten)]
    pub dates: DateRangeArgs,
}

impl App {
    pub fn columns(&self) -> ColumnMap {
        ColumnMap {
            date: self.date_column,
            payee: self.payee_column,
            // A memo column that is also the signed amount column would copy the amount.
            memo: (!self.no_memo && self.amount_column != Some(self.memo_column))
                .then_some(self.memo_column),
            amounts: match self.amount_column {
                Some(column) => AmountColumns::Signed(column),
                None => AmountColumns::Split {
                    outflow: self.outflow_column,
                    inflow: Some(self.inflow_column),
                },
            },
        }
    }
}

async fn read_input(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) if path.as_os_str() != "-" => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read file '{}': {}", path.display(), e)),
        _ => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .wrap_err("Failed to read statement from stdin")?;
            Ok(text)
        }
    }
}

/// Parse and convert a whole statement, keeping source order.
pub fn convert_statement(app: &App, text: &str, range: &DateRange) -> ConversionReport<BudgetRow> {
    let records = parse_delimited(text.trim_start_matches('\u{feff}'), app.delimiter);
    let records = records.get(app.skip_rows..).unwrap_or(&[]);
    convert_records(records, &app.columns(), app.decimal, range)
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let range = app.dates.parse()?;
    let text = read_input(app.input.as_ref()).await?;

    let report = convert_statement(&app, &text, &range);

    anstream::print!("{}", render_csv(&report.rows));

    eprintln!(
        "{} {} rows",
        "Converted".green().bold(),
        report.rows.len()
    );
    if report.skipped > 0 {
        eprintln!(
            "{} {} rows with an invalid date",
            "Skipped".yellow().bold(),
            report.skipped
        );
    }
    if report.out_of_range > 0 && global.verbose {
        eprintln!("Left out {} rows outside the date range", report.out_of_range);
    }

    Ok(())
}
