use serde::Serialize;

use crate::statement::values::{looks_like_amount, parse_date};

pub(crate) const HEADER_HIT_CONFIDENCE: f64 = 0.95;
pub(crate) const SAMPLE_HIT_CONFIDENCE: f64 = 0.7;
pub(crate) const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Known statement layouts. `Default` covers everything unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BankFormat {
    Hdfc,
    Icici,
    Sbi,
    Axis,
    Kotak,
    Default,
}

/// Extra header keywords per column role. Hint keywords match a header cell
/// exactly (case-insensitive), unlike the generic substring keywords.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ColumnHints {
    pub(crate) date: &'static [&'static str],
    pub(crate) description: &'static [&'static str],
    pub(crate) amount: &'static [&'static str],
    pub(crate) debit: &'static [&'static str],
    pub(crate) credit: &'static [&'static str],
    pub(crate) balance: &'static [&'static str],
    pub(crate) kind: &'static [&'static str],
}

impl BankFormat {
    pub const KNOWN: [BankFormat; 5] = [
        BankFormat::Hdfc,
        BankFormat::Icici,
        BankFormat::Sbi,
        BankFormat::Axis,
        BankFormat::Kotak,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hdfc => "hdfc",
            Self::Icici => "icici",
            Self::Sbi => "sbi",
            Self::Axis => "axis",
            Self::Kotak => "kotak",
            Self::Default => "default",
        }
    }

    pub fn from_id(value: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|format| format.as_str() == value)
            .unwrap_or(Self::Default)
    }

    fn identifiers(&self) -> &'static [&'static str] {
        match self {
            Self::Hdfc => &["hdfc", "withdrawal amt", "deposit amt"],
            Self::Icici => &["icici", "transaction remarks"],
            Self::Sbi => &["state bank", "sbi", "ref no./cheque no"],
            Self::Axis => &["axis", "chqno"],
            Self::Kotak => &["kotak", "chq / ref no"],
            Self::Default => &[],
        }
    }

    pub(crate) fn column_hints(&self) -> ColumnHints {
        match self {
            Self::Hdfc => ColumnHints {
                date: &["date"],
                description: &["narration"],
                debit: &["withdrawal amt.", "withdrawal amt"],
                credit: &["deposit amt.", "deposit amt"],
                balance: &["closing balance"],
                ..ColumnHints::default()
            },
            Self::Icici => ColumnHints {
                date: &["transaction date", "value date"],
                description: &["transaction remarks"],
                debit: &["withdrawal amount (inr )", "withdrawal amount (inr)"],
                credit: &["deposit amount (inr )", "deposit amount (inr)"],
                balance: &["balance (inr )", "balance (inr)"],
                ..ColumnHints::default()
            },
            Self::Sbi => ColumnHints {
                date: &["txn date"],
                description: &["description"],
                debit: &["debit"],
                credit: &["credit"],
                balance: &["balance"],
                ..ColumnHints::default()
            },
            Self::Axis => ColumnHints {
                date: &["tran date"],
                description: &["particulars"],
                debit: &["dr"],
                credit: &["cr"],
                balance: &["bal"],
                ..ColumnHints::default()
            },
            Self::Kotak => ColumnHints {
                date: &["transaction date"],
                description: &["description"],
                amount: &["amount"],
                kind: &["dr / cr", "debit / credit"],
                balance: &["balance"],
                ..ColumnHints::default()
            },
            Self::Default => ColumnHints::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatGuess {
    pub format: BankFormat,
    pub confidence: f64,
}

/// Guesses the issuing bank from the header line and the file name.
///
/// Detection is advisory: a low-confidence guess still parses with the
/// generic column keywords.
pub fn detect_format(content: &str, file_name: &str) -> FormatGuess {
    let mut non_empty = content
        .lines()
        .map(|line| line.trim_start_matches('\u{feff}'))
        .filter(|line| !line.trim().is_empty());
    let header = non_empty.next().unwrap_or("").to_lowercase();
    let lowered_name = file_name.to_lowercase();

    for haystack in [header.as_str(), lowered_name.as_str()] {
        if let Some(format) = BankFormat::KNOWN.into_iter().find(|format| {
            format
                .identifiers()
                .iter()
                .any(|needle| haystack.contains(needle))
        }) {
            return FormatGuess {
                format,
                confidence: HEADER_HIT_CONFIDENCE,
            };
        }
    }

    let confidence = match non_empty.next() {
        Some(sample) if sample_looks_tabular(sample) => SAMPLE_HIT_CONFIDENCE,
        _ => FALLBACK_CONFIDENCE,
    };

    FormatGuess {
        format: BankFormat::Default,
        confidence,
    }
}

fn sample_looks_tabular(sample: &str) -> bool {
    let cells = sample.split(',').map(str::trim).collect::<Vec<&str>>();
    let Some(date_index) = cells.iter().position(|cell| parse_date(cell).is_some()) else {
        return false;
    };

    cells
        .iter()
        .enumerate()
        .any(|(index, cell)| index != date_index && looks_like_amount(cell))
}

#[cfg(test)]
mod tests {
    use super::{BankFormat, detect_format};

    #[test]
    fn header_identifier_wins_with_high_confidence() {
        let content = "Date,Narration,Chq./Ref.No.,Value Dt,Withdrawal Amt.,Deposit Amt.,Closing Balance\n01/03/24,UPI,123,01/03/24,100.00,,900.00\n";
        let guess = detect_format(content, "statement.csv");
        assert_eq!(guess.format, BankFormat::Hdfc);
        assert_eq!(guess.confidence, 0.95);
    }

    #[test]
    fn file_name_identifier_counts_as_a_hit() {
        let content = "Date,Description,Amount\n01/03/2024,ACME,5000\n";
        let guess = detect_format(content, "KOTAK_march.csv");
        assert_eq!(guess.format, BankFormat::Kotak);
        assert_eq!(guess.confidence, 0.95);
    }

    #[test]
    fn unknown_layout_with_date_and_amount_sample_is_default_at_point_seven() {
        let content = "Date,Description,Amount,Type,Balance\n01/03/2024,ACME PAYMENT,5000,credit,15000\n";
        let guess = detect_format(content, "export.csv");
        assert_eq!(guess.format, BankFormat::Default);
        assert_eq!(guess.confidence, 0.7);
    }

    #[test]
    fn unrecognizable_content_is_default_at_point_three() {
        let guess = detect_format("hello\nworld\n", "notes.txt");
        assert_eq!(guess.format, BankFormat::Default);
        assert_eq!(guess.confidence, 0.3);

        let empty = detect_format("", "empty.csv");
        assert_eq!(empty.confidence, 0.3);
    }

    #[test]
    fn format_ids_round_trip_through_strings() {
        for format in BankFormat::KNOWN {
            assert_eq!(BankFormat::from_id(format.as_str()), format);
        }
        assert_eq!(BankFormat::from_id("unknown"), BankFormat::Default);
    }
}
