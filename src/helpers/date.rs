//! Date helper functions

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

use crate::i18n::I18n;

/// Format a date using a date-fns style pattern and the locale's month names
///
/// Supported tokens: `yyyy`, `yy`, `MMMM`, `MMM`, `MM`, `M`, `dd`, `d`,
/// `HH`, `mm`. Text between single quotes is copied verbatim, and any
/// other character passes through unchanged.
///
/// # Examples
/// ```ignore
/// format_date(&date, "dd MMM yyyy", &I18n::new("pt-BR")) // -> "05 Mar 2021"
/// ```
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, pattern: &str, i18n: &I18n) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            // Quoted literal; '' is an escaped quote
            if i + 1 < chars.len() && chars[i + 1] == '\'' {
                out.push('\'');
                i += 2;
                continue;
            }
            let mut j = i + 1;
            while j < chars.len() {
                if chars[j] == '\'' {
                    if j + 1 < chars.len() && chars[j + 1] == '\'' {
                        out.push('\'');
                        j += 2;
                        continue;
                    }
                    break;
                }
                out.push(chars[j]);
                j += 1;
            }
            i = j + 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        match (c, run) {
            ('y', 2) => out.push_str(&format!("{:02}", date.year().rem_euclid(100))),
            ('y', _) => out.push_str(&format!("{:04}", date.year())),
            ('M', 1) => out.push_str(&date.month().to_string()),
            ('M', 2) => out.push_str(&format!("{:02}", date.month())),
            ('M', 3) => out.push_str(&i18n.month_short(date.month())),
            ('M', _) => out.push_str(&i18n.month_long(date.month())),
            ('d', 1) => out.push_str(&date.day().to_string()),
            ('d', _) => out.push_str(&format!("{:02}", date.day())),
            ('H', _) => out.push_str(&format!("{:02}", date.hour())),
            ('m', _) => out.push_str(&format!("{:02}", date.minute())),
            _ => (0..run).for_each(|_| out.push(c)),
        }

        i += run;
    }

    out
}

/// Format a UTC instant for display in the site's timezone
pub fn display_date(
    date: &DateTime<Utc>,
    tz: &chrono_tz::Tz,
    pattern: &str,
    i18n: &I18n,
) -> String {
    format_date(&date.with_timezone(tz), pattern, i18n)
}

/// Formats publication dates the way the site displays them
#[derive(Debug, Clone)]
pub struct DateFormatter {
    tz: chrono_tz::Tz,
    pattern: String,
    i18n: I18n,
}

impl DateFormatter {
    pub fn new(tz: chrono_tz::Tz, pattern: &str, i18n: I18n) -> Self {
        Self {
            tz,
            pattern: pattern.to_string(),
            i18n,
        }
    }

    pub fn format(&self, date: &DateTime<Utc>) -> String {
        display_date(date, &self.tz, &self.pattern, &self.i18n)
    }

    /// Unpublished documents have no date; they display as empty
    pub fn format_opt(&self, date: Option<&DateTime<Utc>>) -> String {
        date.map(|d| self.format(d)).unwrap_or_default()
    }
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self::new(chrono_tz::UTC, "dd MMM yyyy", I18n::default())
    }
}
