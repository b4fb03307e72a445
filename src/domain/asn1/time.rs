//! UTCTime and GeneralizedTime parsing.

use super::error::Asn1Error;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeKind {
    Utc,
    Generalized,
}

impl TimeKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TimeKind::Utc => "UTCTime",
            TimeKind::Generalized => "GeneralizedTime",
        }
    }
}

/// Parses time content into an offset-aware instant.
///
/// UTCTime: `YYMMDDhhmm[ss]` then `Z`, `+hhmm`, `-hhmm` or nothing. Two-digit
/// years of 50 and above map to 19YY.
/// GeneralizedTime: `YYYYMMDDhh[mm[ss[.f+]]]` with an optional zone suffix.
/// A missing zone is read as UTC.
pub fn parse_time(kind: TimeKind, content: &[u8]) -> Result<DateTime<FixedOffset>, Asn1Error> {
    // Digits remaining after the year: MMDDhh, MMDDhhmm, MMDDhhmmss.
    const UTC_LAYOUTS: &[usize] = &[8, 10];
    const GENERALIZED_LAYOUTS: &[usize] = &[6, 8, 10];

    let text = std::str::from_utf8(content)
        .ok()
        .filter(|text| text.is_ascii())
        .ok_or_else(|| invalid(&String::from_utf8_lossy(content), "not ASCII"))?;

    let (body, offset_seconds) = split_zone(text)?;
    let (digits, fraction) = match body.find(['.', ',']) {
        Some(index) => (&body[..index], Some(&body[index + 1..])),
        None => (body, None),
    };
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid(text, "expected decimal digits"));
    }

    let (year, rest, layouts) = match kind {
        TimeKind::Utc => {
            if digits.len() < 2 {
                return Err(invalid(text, "missing year"));
            }
            let short = number(&digits[..2]);
            let year = if short >= 50 { 1900 + short } else { 2000 + short };
            (year, &digits[2..], UTC_LAYOUTS)
        }
        TimeKind::Generalized => {
            if digits.len() < 4 {
                return Err(invalid(text, "missing year"));
            }
            (number(&digits[..4]), &digits[4..], GENERALIZED_LAYOUTS)
        }
    };
    if !layouts.contains(&rest.len()) {
        return Err(invalid(text, "unexpected number of digits"));
    }

    let nanos = match fraction {
        None => 0,
        Some(_) if kind == TimeKind::Utc || rest.len() != 10 => {
            return Err(invalid(text, "fractional seconds not allowed here"));
        }
        Some(fraction) => parse_fraction(fraction).ok_or_else(|| invalid(text, "bad fraction"))?,
    };

    let month = number(&rest[0..2]);
    let day = number(&rest[2..4]);
    let hour = number(&rest[4..6]);
    let minute = rest.get(6..8).map_or(0, number);
    let second = rest.get(8..10).map_or(0, number);

    let naive = NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|date| date.and_hms_nano_opt(hour, minute, second, nanos))
        .ok_or_else(|| invalid(text, "date or time out of range"))?;
    let zone = FixedOffset::east_opt(offset_seconds)
        .ok_or_else(|| invalid(text, "zone offset out of range"))?;
    zone.from_local_datetime(&naive)
        .single()
        .ok_or_else(|| invalid(text, "ambiguous local time"))
}

fn split_zone(text: &str) -> Result<(&str, i32), Asn1Error> {
    if let Some(body) = text.strip_suffix('Z') {
        return Ok((body, 0));
    }
    if text.len() >= 5 {
        let (body, zone) = text.split_at(text.len() - 5);
        let sign = match zone.as_bytes()[0] {
            b'+' => 1,
            b'-' => -1,
            _ => return Ok((text, 0)),
        };
        let digits = &zone[1..];
        if !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(invalid(text, "malformed zone offset"));
        }
        let hours = number(&digits[..2]);
        let minutes = number(&digits[2..]);
        if hours > 23 || minutes > 59 {
            return Err(invalid(text, "zone offset out of range"));
        }
        return Ok((body, sign * (hours * 3600 + minutes * 60) as i32));
    }
    Ok((text, 0))
}

fn parse_fraction(fraction: &str) -> Option<u32> {
    if fraction.is_empty() || !fraction.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let digits: String = fraction.chars().chain(std::iter::repeat('0')).take(9).collect();
    digits.parse().ok()
}

/// Value of a run of ASCII digits already validated by the caller.
fn number(digits: &str) -> u32 {
    digits
        .bytes()
        .fold(0, |acc, byte| acc * 10 + u32::from(byte - b'0'))
}

fn invalid(text: &str, reason: &str) -> Asn1Error {
    Asn1Error::InvalidTime {
        text: text.to_string(),
        reason: reason.to_string(),
    }
}
