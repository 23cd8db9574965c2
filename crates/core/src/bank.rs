//! Bank statement to budgeting CSV conversion
//!
//! Source rows come from a delimited export of a bank statement spreadsheet.
//! Each row is mapped to the fixed `Date,Payee,Memo,Outflow,Inflow` layout.
//! Rows whose date cannot be validated are dropped and counted so callers can
//! report the loss instead of silently producing a shorter file.

use crate::dates::DateRange;
use chrono::NaiveDate;
use serde::Serialize;

/// Output header, in column order.
pub const CSV_HEADER: [&str; 5] = ["Date", "Payee", "Memo", "Outflow", "Inflow"];

// =============================================================================
// Field validation and normalization
// =============================================================================

/// Parse a statement date in the strict `DD/MM/YY` format.
///
/// Two-digit years map to 20YY. Returns `None` for anything that is not a
/// real calendar date, including wrong lengths and non-digit characters.
pub fn parse_statement_date(input: &str) -> Option<NaiveDate> {
    let bytes = input.as_bytes();
    if bytes.len() != 8 || bytes[2] != b'/' || bytes[5] != b'/' {
        return None;
    }

    let digits = [0, 1, 3, 4, 6, 7];
    if !digits.iter().all(|&i| bytes[i].is_ascii_digit()) {
        return None;
    }

    let day: u32 = input[0..2].parse().ok()?;
    let month: u32 = input[3..5].parse().ok()?;
    let year: i32 = input[6..8].parse().ok()?;

    NaiveDate::from_ymd_opt(2000 + year, month, day)
}

/// Normalize a formatted amount into a plain positive decimal string.
///
/// Currency symbols, signs, parentheses and whitespace are dropped. The
/// `decimal` character marks the decimal point; the other of `.`/`,` is a
/// thousands separator and removed. `"-€1.234,56"` with `','` becomes
/// `"1234.56"`. Input without any digit normalizes to an empty string.
pub fn normalize_amount(raw: &str, decimal: char) -> String {
    let mut integer = String::new();
    let mut fraction: Option<String> = None;

    for c in raw.chars() {
        if c.is_ascii_digit() {
            match fraction.as_mut() {
                Some(f) => f.push(c),
                None => integer.push(c),
            }
        } else if c == decimal && fraction.is_none() {
            fraction = Some(String::new());
        }
    }

    if integer.is_empty() && fraction.as_deref().is_none_or(str::is_empty) {
        return String::new();
    }

    let integer = integer.trim_start_matches('0');
    let integer = if integer.is_empty() { "0" } else { integer };

    match fraction {
        Some(f) if !f.is_empty() => format!("{integer}.{f}"),
        _ => integer.to_string(),
    }
}

/// Whether a formatted amount is negative (`-` sign or accounting parentheses).
pub fn is_negative_amount(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.contains('-') || (trimmed.starts_with('(') && trimmed.ends_with(')'))
}

// =============================================================================
// Delimited input parsing
// =============================================================================

/// Split delimited text into records.
///
/// Supports double-quoted fields containing the delimiter, newlines, and `""`
/// escapes. Blank lines are skipped. A trailing `\r` is stripped from lines.
pub fn parse_delimited(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record));
            }
            c if c == delimiter => record.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }

    records
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.iter().all(|f| f.trim().is_empty());
    if !blank {
        records.push(record);
    }
}

// =============================================================================
// Row mapping
// =============================================================================

/// Where each output field lives in the source record (0-indexed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    pub payee: usize,
    pub memo: Option<usize>,
    pub amounts: AmountColumns,
}

/// How amounts are laid out in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountColumns {
    /// Separate outflow and inflow columns.
    Split {
        outflow: usize,
        inflow: Option<usize>,
    },
    /// One signed column: negative values are outflows.
    Signed(usize),
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            date: 0,
            payee: 1,
            memo: Some(2),
            amounts: AmountColumns::Split {
                outflow: 3,
                inflow: Some(4),
            },
        }
    }
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetRow {
    /// ISO `YYYY-MM-DD`.
    pub date: String,
    pub payee: String,
    pub memo: String,
    pub outflow: String,
    pub inflow: String,
}

/// Converted rows plus how many source rows were rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport<R> {
    pub rows: Vec<R>,
    /// Rows dropped because their date failed validation.
    pub skipped: usize,
    /// Valid rows left out because they fall outside the requested date range.
    pub out_of_range: usize,
}

fn field(record: &[String], index: usize) -> &str {
    record.get(index).map(|s| s.trim()).unwrap_or("")
}

/// Map a single record. `None` when its date is invalid.
pub fn convert_record(record: &[String], columns: &ColumnMap, decimal: char) -> Option<(NaiveDate, BudgetRow)> {
    let date = parse_statement_date(field(record, columns.date))?;

    let (outflow, inflow) = match columns.amounts {
        AmountColumns::Split { outflow, inflow } => (
            normalize_amount(field(record, outflow), decimal),
            inflow
                .map(|i| normalize_amount(field(record, i), decimal))
                .unwrap_or_default(),
        ),
        AmountColumns::Signed(index) => {
            let raw = field(record, index);
            let amount = normalize_amount(raw, decimal);
            if is_negative_amount(raw) {
                (amount, String::new())
            } else {
                (String::new(), amount)
            }
        }
    };

    Some((
        date,
        BudgetRow {
            date: date.format("%Y-%m-%d").to_string(),
            payee: field(record, columns.payee).to_string(),
            memo: columns
                .memo
                .map(|m| field(record, m).to_string())
                .unwrap_or_default(),
            outflow,
            inflow,
        },
    ))
}

/// Convert all records, keeping source order.
pub fn convert_records(
    records: &[Vec<String>],
    columns: &ColumnMap,
    decimal: char,
    range: &DateRange,
) -> ConversionReport<BudgetRow> {
    let mut report = ConversionReport {
        rows: Vec::new(),
        skipped: 0,
        out_of_range: 0,
    };

    for record in records {
        match convert_record(record, columns, decimal) {
            Some((date, row)) if range.contains(date) => report.rows.push(row),
            Some(_) => report.out_of_range += 1,
            None => report.skipped += 1,
        }
    }

    report
}

// =============================================================================
// CSV output
// =============================================================================

fn escape_csv(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render rows as CSV with the fixed header.
pub fn render_csv(rows: &[BudgetRow]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');

    for row in rows {
        let fields = [&row.date, &row.payee, &row.memo, &row.outflow, &row.inflow];
        let line: Vec<String> = fields.iter().map(|f| escape_csv(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    out
}
