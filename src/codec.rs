//! Duration text in both directions.
//!
//! Display text is `[-]MM:SS`, or `[-]H:MM:SS` once there is at least an
//! hour on the clock. Input accepts colon notation (`[[[D:]H:]M:]S`) and
//! unit-suffix notation (`1d2h3m4s`, any field optional, case-insensitive),
//! with one optional leading sign for the whole expression.

use chrono::TimeDelta;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseDurationError {
    #[error("duration text is empty")]
    Empty,
    #[error("`{0}` is not a duration (expected [[[D:]H:]M:]S or 1d2h3m4s)")]
    Malformed(String),
    #[error("`{0}` is too long a duration")]
    OutOfRange(String),
}

enum Reject {
    Shape,
    Overflow,
}

#[derive(Default)]
struct Fields {
    days: i64,
    hours: i64,
    minutes: i64,
    seconds: i64,
}

impl Fields {
    fn total_seconds(&self) -> Option<i64> {
        self.days
            .checked_mul(24)?
            .checked_add(self.hours)?
            .checked_mul(60)?
            .checked_add(self.minutes)?
            .checked_mul(60)?
            .checked_add(self.seconds)
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Whole seconds, rounded toward positive infinity.
///
/// 0.2s left still reads as one second so the display only shows zero once
/// the deadline has really been reached.
pub fn ceil_seconds(span: TimeDelta) -> i64 {
    let whole = span.num_seconds();
    if span.subsec_nanos() > 0 { whole + 1 } else { whole }
}

pub fn format(span: TimeDelta) -> String {
    let total = ceil_seconds(span);
    let sign = if total < 0 { "-" } else { "" };
    let ss = total.unsigned_abs();

    let hours = ss / 3600;
    let minutes = (ss / 60) % 60;
    let seconds = ss % 60;

    if hours > 0 {
        format!("{sign}{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{sign}{minutes:02}:{seconds:02}")
    }
}

// ============================================================================
// Parsing
// ============================================================================

pub fn parse(text: &str) -> Result<TimeDelta, ParseDurationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseDurationError::Empty);
    }

    let (negative, body) = if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        (false, rest)
    } else {
        (false, text)
    };

    let fields = if body.bytes().any(|b| b.is_ascii_alphabetic()) {
        suffix_fields(body)
    } else {
        colon_fields(body)
    };

    let reject = |r: Reject| match r {
        Reject::Shape => ParseDurationError::Malformed(text.to_string()),
        Reject::Overflow => ParseDurationError::OutOfRange(text.to_string()),
    };

    let total = fields
        .map_err(reject)?
        .total_seconds()
        .ok_or_else(|| ParseDurationError::OutOfRange(text.to_string()))?;
    let total = if negative { -total } else { total };

    TimeDelta::try_seconds(total).ok_or_else(|| ParseDurationError::OutOfRange(text.to_string()))
}

/// Parse failures never reach the user: they start a zero-length countdown.
pub fn parse_or_zero(text: &str) -> TimeDelta {
    parse(text).unwrap_or_else(|e| {
        tracing::debug!("{e}, using zero");
        TimeDelta::zero()
    })
}

fn digits(s: &str) -> Result<i64, Reject> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Reject::Shape);
    }
    s.parse::<i64>().map_err(|_| Reject::Overflow)
}

fn colon_fields(body: &str) -> Result<Fields, Reject> {
    let parts: Vec<&str> = body.split(':').collect();
    if parts.len() > 4 {
        return Err(Reject::Shape);
    }

    // seconds, minutes, hours, days
    let mut values = [0i64; 4];
    for (slot, part) in values.iter_mut().zip(parts.iter().rev()) {
        *slot = digits(part)?;
    }

    Ok(Fields {
        days: values[3],
        hours: values[2],
        minutes: values[1],
        seconds: values[0],
    })
}

fn suffix_fields(body: &str) -> Result<Fields, Reject> {
    const UNITS: [char; 4] = ['d', 'h', 'm', 's'];

    let mut fields = Fields::default();
    let mut next_unit = 0;
    let mut start = 0;

    for (idx, c) in body.char_indices() {
        if c.is_ascii_digit() {
            continue;
        }
        let unit = c.to_ascii_lowercase();
        let pos = UNITS[next_unit..]
            .iter()
            .position(|&u| u == unit)
            .ok_or(Reject::Shape)?
            + next_unit;

        let value = digits(&body[start..idx])?;
        match unit {
            'd' => fields.days = value,
            'h' => fields.hours = value,
            'm' => fields.minutes = value,
            _ => fields.seconds = value,
        }

        next_unit = pos + 1;
        start = idx + c.len_utf8();
    }

    // trailing digits without a unit, e.g. "1h30"
    if start != body.len() {
        return Err(Reject::Shape);
    }
    Ok(fields)
}
