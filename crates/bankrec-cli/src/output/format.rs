use std::cmp;

use chrono::{Local, TimeZone};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    pub name: &'a str,
    pub align: Align,
    /// Cells longer than this are cut and suffixed with `...`.
    pub max_width: Option<usize>,
}

impl<'a> Column<'a> {
    pub const fn left(name: &'a str) -> Self {
        Self {
            name,
            align: Align::Left,
            max_width: None,
        }
    }

    pub const fn right(name: &'a str) -> Self {
        Self {
            name,
            align: Align::Right,
            max_width: None,
        }
    }

    pub const fn capped(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }
}

const INDENT: usize = 2;
const ELLIPSIS: &str = "...";

pub fn key_value_rows(entries: &[(&str, String)], indent: usize) -> Vec<String> {
    let label_width = entries
        .iter()
        .map(|(label, _)| label.len())
        .max()
        .unwrap_or(0);
    let padding = " ".repeat(indent);

    entries
        .iter()
        .map(|(label, value)| format!("{padding}{label:<label_width$}  {value}"))
        .collect()
}

pub fn render_table(columns: &[Column<'_>], rows: &[Vec<String>]) -> Vec<String> {
    if columns.is_empty() {
        return Vec::new();
    }

    let cells = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(index, column)| {
                    let value = row.get(index).map(String::as_str).unwrap_or("");
                    truncate(value, column.max_width)
                })
                .collect::<Vec<String>>()
        })
        .collect::<Vec<_>>();

    let mut widths = columns
        .iter()
        .map(|column| column.name.len())
        .collect::<Vec<usize>>();
    for row in &cells {
        for (slot, value) in widths.iter_mut().zip(row) {
            *slot = cmp::max(*slot, value.chars().count());
        }
    }

    let header = columns
        .iter()
        .map(|column| column.name.to_string())
        .collect::<Vec<_>>();
    let mut output = vec![format_row(columns, &header, &widths)];
    output.extend(cells.iter().map(|row| format_row(columns, row, &widths)));
    output
}

fn format_row(columns: &[Column<'_>], cells: &[String], widths: &[usize]) -> String {
    let pieces = columns
        .iter()
        .zip(cells)
        .zip(widths)
        .map(|((column, value), width)| match column.align {
            Align::Left => format!("{value:<width$}"),
            Align::Right => format!("{value:>width$}"),
        })
        .collect::<Vec<_>>();

    format!("{}{}", " ".repeat(INDENT), pieces.join("  "))
        .trim_end()
        .to_string()
}

fn truncate(value: &str, max_width: Option<usize>) -> String {
    let Some(limit) = max_width else {
        return value.to_string();
    };
    if value.chars().count() <= limit || limit <= ELLIPSIS.len() {
        return value.to_string();
    }
    let kept = value
        .chars()
        .take(limit - ELLIPSIS.len())
        .collect::<String>();
    format!("{kept}{ELLIPSIS}")
}

pub fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

/// Renders a stored epoch-seconds string as local time.
pub fn format_epoch(value: &str) -> String {
    value
        .parse::<i64>()
        .ok()
        .and_then(|secs| Local.timestamp_opt(secs, 0).single())
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| value.to_string())
}

pub fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

pub fn opt_str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string())
}

pub fn i64_field(value: &Value, key: &str) -> i64 {
    value.get(key).and_then(Value::as_i64).unwrap_or(0)
}

pub fn f64_field(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}
