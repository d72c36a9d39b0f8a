use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use tracing::warn;

use crate::statement::Direction;
use crate::statement::detect::{BankFormat, ColumnHints};
use crate::statement::values::{
    direction_from_type, looks_like_amount, parse_amount, parse_date,
};
use crate::{ClientError, ClientResult};

const HEADER_SCAN_LIMIT: usize = 5;
const MIN_COLUMNS: usize = 3;

const DATE_KEYWORDS: [&str; 3] = ["date", "txn date", "transaction date"];
const DESCRIPTION_KEYWORDS: [&str; 4] = ["description", "narration", "particulars", "details"];
const AMOUNT_KEYWORDS: [&str; 1] = ["amount"];
const DEBIT_KEYWORDS: [&str; 3] = ["debit", "withdrawal", "paid out"];
const CREDIT_KEYWORDS: [&str; 3] = ["credit", "deposit", "received"];
const BALANCE_KEYWORDS: [&str; 2] = ["balance", "closing"];
const TYPE_KEYWORDS: [&str; 5] = ["type", "dr/cr", "dr / cr", "debit/credit", "credit/debit"];

/// One canonical record parsed from a statement row.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub source_row: i64,
    pub date: Option<NaiveDate>,
    pub description: String,
    pub amount: f64,
    pub direction: Direction,
    pub balance: Option<f64>,
}

/// Parser output. Dropped rows are counted, never silently lost.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    pub lines: Vec<ParsedLine>,
    pub skipped_count: i64,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Date,
    Description,
    Debit,
    Credit,
    Balance,
    Kind,
    Amount,
}

impl Role {
    // Resolution order. Kind precedes debit/credit so a `Debit/Credit` type
    // cell is not taken as an amount column. Amount goes last so
    // `Withdrawal Amount` style cells land on debit/credit first.
    const ALL: [Role; 7] = [
        Role::Date,
        Role::Description,
        Role::Kind,
        Role::Debit,
        Role::Credit,
        Role::Balance,
        Role::Amount,
    ];

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Date => &DATE_KEYWORDS,
            Self::Description => &DESCRIPTION_KEYWORDS,
            Self::Amount => &AMOUNT_KEYWORDS,
            Self::Debit => &DEBIT_KEYWORDS,
            Self::Credit => &CREDIT_KEYWORDS,
            Self::Balance => &BALANCE_KEYWORDS,
            Self::Kind => &TYPE_KEYWORDS,
        }
    }

    fn hints(&self, hints: &ColumnHints) -> &'static [&'static str] {
        match self {
            Self::Date => hints.date,
            Self::Description => hints.description,
            Self::Amount => hints.amount,
            Self::Debit => hints.debit,
            Self::Credit => hints.credit,
            Self::Balance => hints.balance,
            Self::Kind => hints.kind,
        }
    }

    fn matches_generic(&self, cell: &str) -> bool {
        if *self == Role::Amount && cell.contains("balance") {
            return false;
        }
        self.keywords().iter().any(|keyword| cell.contains(keyword))
    }

    fn matches_hint(&self, cell: &str, hints: &ColumnHints) -> bool {
        self.hints(hints).iter().any(|hint| cell == *hint)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ColumnMap {
    date: Option<usize>,
    description: Option<usize>,
    amount: Option<usize>,
    debit: Option<usize>,
    credit: Option<usize>,
    balance: Option<usize>,
    kind: Option<usize>,
}

impl ColumnMap {
    fn slot(&mut self, role: Role) -> &mut Option<usize> {
        match role {
            Role::Date => &mut self.date,
            Role::Description => &mut self.description,
            Role::Amount => &mut self.amount,
            Role::Debit => &mut self.debit,
            Role::Credit => &mut self.credit,
            Role::Balance => &mut self.balance,
            Role::Kind => &mut self.kind,
        }
    }

    fn has_amount_source(&self) -> bool {
        self.amount.is_some() || self.debit.is_some() || self.credit.is_some()
    }
}

/// Parses delimited statement text into canonical lines.
///
/// Fails with `NO_TRANSACTIONS_FOUND` when no row survives.
pub fn parse_statement(
    content: &str,
    format: BankFormat,
    file_name: &str,
) -> ClientResult<ParseReport> {
    let hints = format.column_hints();
    let raw_lines = content.lines().collect::<Vec<&str>>();
    let non_empty = raw_lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().trim_start_matches('\u{feff}').is_empty())
        .map(|(index, line)| (index, line.trim_start_matches('\u{feff}')))
        .collect::<Vec<(usize, &str)>>();

    let Some((first_index, first_line)) = non_empty.first().copied() else {
        return Err(ClientError::no_transactions_found(file_name, 0));
    };

    let mut report = ParseReport::default();

    let discovered = non_empty
        .iter()
        .take(HEADER_SCAN_LIMIT)
        .find_map(|(index, line)| {
            let delimiter = sniff_delimiter(line);
            let cells = split_header(line, delimiter);
            qualifies_as_header(&cells, &hints).then_some((*index, delimiter, cells))
        });

    let (header_index, delimiter, header_cells) = match discovered {
        Some(found) => found,
        None => {
            let delimiter = sniff_delimiter(first_line);
            report.warnings.push(format!(
                "No header row with date and amount columns found in the first {HEADER_SCAN_LIMIT} lines; using line {} as the header.",
                first_index + 1
            ));
            (first_index, delimiter, split_header(first_line, delimiter))
        }
    };

    let columns = resolve_columns(&header_cells, &hints);
    if columns.date.is_none() {
        report
            .warnings
            .push("No date column found; lines will have no date.".to_string());
    }

    let body = raw_lines[header_index + 1..].join("\n");
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    for record in reader.records() {
        let record = match record {
            Ok(value) => value,
            Err(error) => {
                report.skipped_count += 1;
                report
                    .warnings
                    .push(format!("Skipped an unreadable row: {error}"));
                continue;
            }
        };

        let source_row = record
            .position()
            .map(|position| position.line() as i64 + header_index as i64 + 1)
            .unwrap_or(0);

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        if record.len() < MIN_COLUMNS {
            report.skipped_count += 1;
            continue;
        }

        match parse_row(&record, &columns, source_row, &mut report.warnings) {
            Some(line) => report.lines.push(line),
            None => {
                report.skipped_count += 1;
                report.warnings.push(format!(
                    "Row {source_row}: no usable amount; row skipped."
                ));
            }
        }
    }

    if report.skipped_count > 0 {
        warn!(
            file_name,
            skipped = report.skipped_count,
            "statement rows skipped during parse"
        );
    }

    if report.lines.is_empty() {
        return Err(ClientError::no_transactions_found(
            file_name,
            report.skipped_count,
        ));
    }

    Ok(report)
}

fn parse_row(
    record: &StringRecord,
    columns: &ColumnMap,
    source_row: i64,
    warnings: &mut Vec<String>,
) -> Option<ParsedLine> {
    let cell = |index: Option<usize>| cell_at(record, index);

    let (amount, direction) = resolve_amount(
        cell(columns.amount),
        cell(columns.debit),
        cell(columns.credit),
        cell(columns.kind),
        columns,
    )?;

    let date_text = cell(columns.date);
    let date = parse_date(date_text);
    if date.is_none() && columns.date.is_some() {
        warnings.push(format!(
            "Row {source_row}: could not parse date `{date_text}`; line kept without a date."
        ));
    }

    let balance_text = cell(columns.balance);
    let balance = looks_like_amount(balance_text).then(|| parse_amount(balance_text));

    Some(ParsedLine {
        source_row,
        date,
        description: cell(columns.description).to_string(),
        amount,
        direction,
        balance,
    })
}

fn cell_at(record: &StringRecord, index: Option<usize>) -> &str {
    index
        .and_then(|value| record.get(value))
        .map(str::trim)
        .unwrap_or("")
}

fn resolve_amount(
    amount_text: &str,
    debit_text: &str,
    credit_text: &str,
    kind_text: &str,
    columns: &ColumnMap,
) -> Option<(f64, Direction)> {
    if columns.amount.is_some() {
        let value = parse_amount(amount_text);
        if value == 0.0 {
            return None;
        }
        let direction = direction_from_type(kind_text).unwrap_or(if value < 0.0 {
            Direction::Debit
        } else {
            Direction::Credit
        });
        return Some((value.abs(), direction));
    }

    let debit = parse_amount(debit_text).abs();
    let credit = parse_amount(credit_text).abs();
    match (debit != 0.0, credit != 0.0) {
        (true, false) => Some((debit, Direction::Debit)),
        (false, true) => Some((credit, Direction::Credit)),
        (true, true) => {
            let net = credit - debit;
            if net == 0.0 {
                None
            } else if net > 0.0 {
                Some((net, Direction::Credit))
            } else {
                Some((net.abs(), Direction::Debit))
            }
        }
        (false, false) => None,
    }
}

fn sniff_delimiter(line: &str) -> u8 {
    if line.contains('\t') {
        b'\t'
    } else if line.contains(';') {
        b';'
    } else {
        b','
    }
}

fn split_header(line: &str, delimiter: u8) -> Vec<String> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => record
            .iter()
            .map(|cell| cell.trim().to_lowercase())
            .collect(),
        _ => Vec::new(),
    }
}

fn qualifies_as_header(cells: &[String], hints: &ColumnHints) -> bool {
    let matches_role = |role: Role| {
        cells
            .iter()
            .any(|cell| role.matches_hint(cell, hints) || role.matches_generic(cell))
    };

    matches_role(Role::Date)
        && (matches_role(Role::Amount) || matches_role(Role::Debit) || matches_role(Role::Credit))
}

fn resolve_columns(cells: &[String], hints: &ColumnHints) -> ColumnMap {
    let mut map = ColumnMap::default();
    let mut taken = vec![false; cells.len()];

    // Hints first across every role, then generic keywords for what is left.
    for use_hints in [true, false] {
        for role in Role::ALL {
            if map.slot(role).is_some() {
                continue;
            }
            let found = cells.iter().enumerate().find(|(index, cell)| {
                !taken[*index]
                    && if use_hints {
                        role.matches_hint(cell, hints)
                    } else {
                        role.matches_generic(cell)
                    }
            });
            if let Some((index, _)) = found {
                taken[index] = true;
                *map.slot(role) = Some(index);
            }
        }
    }

    if !map.has_amount_source() {
        map.amount = None;
    }

    map
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{BankFormat, parse_statement, resolve_columns, split_header};
    use crate::statement::Direction;

    #[test]
    fn unified_amount_with_type_column_parses() {
        let content = "Date,Description,Amount,Type,Balance\n01/03/2024,ACME PAYMENT,5000,credit,15000\n";
        let report = parse_statement(content, BankFormat::Default, "a.csv");
        assert!(report.is_ok());
        if let Ok(value) = report {
            assert_eq!(value.lines.len(), 1);
            assert_eq!(value.skipped_count, 0);
            let line = &value.lines[0];
            assert_eq!(line.date, NaiveDate::from_ymd_opt(2024, 3, 1));
            assert_eq!(line.description, "ACME PAYMENT");
            assert_eq!(line.amount, 5000.0);
            assert_eq!(line.direction, Direction::Credit);
            assert_eq!(line.balance, Some(15000.0));
        }
    }

    #[test]
    fn sign_decides_direction_without_type_column() {
        let content = "Date,Details,Amount\n2024-03-01,Rent,-1200.50\n2024-03-02,Refund,80\n";
        let report = parse_statement(content, BankFormat::Default, "b.csv");
        assert!(report.is_ok());
        if let Ok(value) = report {
            assert_eq!(value.lines.len(), 2);
            assert_eq!(value.lines[0].direction, Direction::Debit);
            assert_eq!(value.lines[0].amount, 1200.5);
            assert_eq!(value.lines[1].direction, Direction::Credit);
        }
    }

    #[test]
    fn split_debit_credit_columns_with_preamble_and_semicolons() {
        let content = "Account Statement\nCustomer: ACME LTD\nTxn Date;Narration;Withdrawal;Deposit;Closing Balance\n05/03/2024;\"NEFT, SUPPLIER\";2,500.00;;10,000.00\n06/03/2024;SALARY;;50,000.00;60,000.00\n";
        let report = parse_statement(content, BankFormat::Default, "c.csv");
        assert!(report.is_ok());
        if let Ok(value) = report {
            assert_eq!(value.lines.len(), 2);
            assert_eq!(value.lines[0].description, "NEFT, SUPPLIER");
            assert_eq!(value.lines[0].direction, Direction::Debit);
            assert_eq!(value.lines[0].amount, 2500.0);
            assert_eq!(value.lines[1].direction, Direction::Credit);
            assert_eq!(value.lines[1].amount, 50000.0);
            assert!(value.warnings.is_empty());
        }
    }

    #[test]
    fn zero_amount_and_short_rows_are_counted_as_skipped() {
        let content = "Date,Description,Amount\n01/03/2024,Fee reversal,0\nshort,row\n02/03/2024,Coffee,4.50\n";
        let report = parse_statement(content, BankFormat::Default, "d.csv");
        assert!(report.is_ok());
        if let Ok(value) = report {
            assert_eq!(value.lines.len(), 1);
            assert_eq!(value.skipped_count, 2);
            assert!(value.warnings.iter().any(|w| w.contains("no usable amount")));
        }
    }

    #[test]
    fn unparseable_date_keeps_line_and_warns() {
        let content = "Date,Description,Amount\nsometime,Coffee,4.50\n";
        let report = parse_statement(content, BankFormat::Default, "e.csv");
        assert!(report.is_ok());
        if let Ok(value) = report {
            assert_eq!(value.lines.len(), 1);
            assert_eq!(value.lines[0].date, None);
            assert!(value.warnings.iter().any(|w| w.contains("could not parse date")));
        }
    }

    #[test]
    fn tab_delimited_input_is_sniffed() {
        let content = "Date\tDescription\tAmount\n01/03/2024\tACME\t10\n";
        let report = parse_statement(content, BankFormat::Default, "f.tsv");
        assert!(report.is_ok());
        if let Ok(value) = report {
            assert_eq!(value.lines.len(), 1);
            assert_eq!(value.lines[0].description, "ACME");
        }
    }

    #[test]
    fn header_without_known_columns_yields_no_transactions() {
        let content = "when,what,how much\n01/03/2024,ACME,10\n";
        let report = parse_statement(content, BankFormat::Default, "g.csv");
        assert!(report.is_err());
        if let Err(error) = report {
            assert_eq!(error.code, "NO_TRANSACTIONS_FOUND");
        }
    }

    #[test]
    fn empty_input_has_no_transactions() {
        let report = parse_statement("\n\n", BankFormat::Default, "empty.csv");
        assert!(report.is_err());
        if let Err(error) = report {
            assert_eq!(error.code, "NO_TRANSACTIONS_FOUND");
        }
    }

    #[test]
    fn hints_resolve_bank_specific_columns_first() {
        let cells = split_header(
            "Sl. No.,Transaction Date,Value Date,Description,Chq / Ref No.,Amount,Dr / Cr,Balance",
            b',',
        );
        let columns = resolve_columns(&cells, &BankFormat::Kotak.column_hints());
        assert_eq!(columns.date, Some(1));
        assert_eq!(columns.description, Some(3));
        assert_eq!(columns.amount, Some(5));
        assert_eq!(columns.kind, Some(6));
        assert_eq!(columns.balance, Some(7));
    }

    #[test]
    fn debit_credit_header_is_the_type_column() {
        let cells = split_header("Date,Description,Amount,Debit/Credit", b',');
        let columns = resolve_columns(&cells, &BankFormat::Default.column_hints());
        assert_eq!(columns.kind, Some(3));
        assert_eq!(columns.amount, Some(2));
        assert_eq!(columns.debit, None);
        assert_eq!(columns.credit, None);

        let content = "Date,Description,Amount,Debit/Credit\n\
                       05/03/2024,RENT MARCH,1200,Dr\n\
                       06/03/2024,NEFT ACME TRADERS,-300,Cr\n";
        let report = parse_statement(content, BankFormat::Default, "ledger.csv");
        assert!(report.is_ok());
        if let Ok(value) = report {
            assert_eq!(value.lines.len(), 2);
            assert_eq!(value.lines[0].direction, Direction::Debit);
            assert_eq!(value.lines[0].amount, 1200.0);
            assert_eq!(value.lines[1].direction, Direction::Credit);
            assert_eq!(value.lines[1].amount, 300.0);
        }
    }

    #[test]
    fn amount_keyword_skips_balance_cells() {
        let cells = split_header("Date,Balance Amount,Narration,Txn Amount", b',');
        let columns = resolve_columns(&cells, &BankFormat::Default.column_hints());
        assert_eq!(columns.balance, Some(1));
        assert_eq!(columns.amount, Some(3));
    }
}
