use chrono::NaiveDate;

use crate::statement::Direction;

const CURRENCY_MARKERS: [&str; 8] = ["₹", "$", "€", "£", "inr", "rs.", "rs", "\u{a0}"];

/// Parses a bank amount cell into a signed value.
///
/// Handles currency symbols and codes, thousands separators, parenthesis
/// negatives and trailing `CR`/`DR` markers (`DR` is negative). Anything that
/// still fails to parse yields `0.0`.
pub(crate) fn parse_amount(raw: &str) -> f64 {
    clean_amount_text(raw)
        .and_then(|(text, negative)| {
            text.parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(|value| if negative { -value.abs() } else { value })
        })
        .unwrap_or(0.0)
}

pub(crate) fn looks_like_amount(raw: &str) -> bool {
    if !raw.chars().any(|ch| ch.is_ascii_digit()) {
        return false;
    }
    clean_amount_text(raw)
        .map(|(text, _)| text.parse::<f64>().is_ok())
        .unwrap_or(false)
}

fn clean_amount_text(raw: &str) -> Option<(String, bool)> {
    let mut text = raw.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    for marker in CURRENCY_MARKERS {
        text = text.replace(marker, "");
    }
    text.retain(|ch| ch != ',' && ch != '\'' && !ch.is_whitespace());

    let mut negative = false;
    if let Some(stripped) = text.strip_suffix("dr") {
        negative = true;
        text = stripped.to_string();
    } else if let Some(stripped) = text.strip_suffix("cr") {
        text = stripped.to_string();
    }

    if text.starts_with('(') && text.ends_with(')') && text.len() >= 2 {
        negative = true;
        text = text[1..text.len() - 1].to_string();
    }

    if let Some(stripped) = text.strip_prefix('+') {
        text = stripped.to_string();
    }

    if text.is_empty() {
        return None;
    }

    Some((text, negative))
}

/// Parses day-first and ISO style dates, with two-digit years read as 20xx.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let token = raw.split_whitespace().next()?.trim_matches('"');
    let separator = ['/', '-', '.']
        .into_iter()
        .find(|candidate| token.contains(*candidate))?;

    let parts = token.split(separator).collect::<Vec<&str>>();
    if parts.len() != 3 {
        return None;
    }

    if parts[0].len() == 4 {
        let year = parts[0].parse::<i32>().ok()?;
        let month = parts[1].parse::<u32>().ok()?;
        let day = parts[2].parse::<u32>().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let day = parts[0].parse::<u32>().ok()?;
    let month = parse_month(parts[1])?;
    let year = match parts[2].len() {
        4 => parts[2].parse::<i32>().ok()?,
        2 => 2000 + parts[2].parse::<i32>().ok()?,
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_month(raw: &str) -> Option<u32> {
    if let Ok(value) = raw.parse::<u32>() {
        return Some(value);
    }

    let lowered = raw.to_lowercase();
    let months = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    months
        .iter()
        .position(|month| lowered.starts_with(month))
        .map(|index| index as u32 + 1)
}

/// Reads a direction out of a `Type` / `Dr/Cr` cell.
pub(crate) fn direction_from_type(raw: &str) -> Option<Direction> {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    if matches!(lowered.as_str(), "cr" | "c" | "cr.")
        || lowered.contains("credit")
        || lowered.contains("deposit")
    {
        return Some(Direction::Credit);
    }

    if matches!(lowered.as_str(), "dr" | "d" | "dr.")
        || lowered.contains("debit")
        || lowered.contains("withdrawal")
    {
        return Some(Direction::Debit);
    }

    None
}

pub(crate) fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
