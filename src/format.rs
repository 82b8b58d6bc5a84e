use crate::domain::{jst, Timestamp};
use chrono::{Datelike, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JstFormat {
    /// `01/05(月)`
    Date,
    /// `18:30`
    Time,
    /// `2025/01/05 18:30`
    DateTime,
    /// `2025-01-05T18:30:00`
    Iso8601,
}

fn weekday_ja(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "月",
        Weekday::Tue => "火",
        Weekday::Wed => "水",
        Weekday::Thu => "木",
        Weekday::Fri => "金",
        Weekday::Sat => "土",
        Weekday::Sun => "日",
    }
}

/// Render a timestamp as Japan Standard Time wall-clock text.
pub fn format_jst(dt: &Timestamp, format: JstFormat) -> String {
    let local = dt.with_timezone(&jst());
    match format {
        JstFormat::Date => format!(
            "{}({})",
            local.format("%m/%d"),
            weekday_ja(local.weekday())
        ),
        JstFormat::Time => local.format("%H:%M").to_string(),
        JstFormat::DateTime => local.format("%Y/%m/%d %H:%M").to_string(),
        JstFormat::Iso8601 => local.format("%Y-%m-%dT%H:%M:%S").to_string(),
    }
}

/// Thousands separators for yen amounts: `1234567` → `1,234,567`.
pub fn num_comma(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn yen(amount: u64) -> String {
    format!("{}円", num_comma(i64::try_from(amount).unwrap_or(i64::MAX)))
}
