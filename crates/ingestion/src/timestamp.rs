//! Time-of-day recovery
//!
//! A sentence carries `HHMMSS[.fff]` as the field right after its talker id:
//! `$` + 2-5 uppercase letters + `,` + six digits. Fractions are truncated.
//! The date is never read from the sentence; it always comes from the
//! reference date, so an interval crossing midnight maps early-morning
//! sentences onto the start day.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const MIN_TALKER_LEN: usize = 2;
const MAX_TALKER_LEN: usize = 5;
const TIME_DIGITS: usize = 6;

/// Resolves sentence timestamps against a fixed reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampResolver {
    reference_date: NaiveDate,
}

impl TimestampResolver {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self { reference_date }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Full timestamp of `sentence`, or `None` when it has no valid time field.
    pub fn resolve(&self, sentence: &str) -> Option<NaiveDateTime> {
        resolve_timestamp(sentence, self.reference_date)
    }
}

/// Combine the sentence time of day with `reference_date`.
pub fn resolve_timestamp(sentence: &str, reference_date: NaiveDate) -> Option<NaiveDateTime> {
    parse_time_of_day(sentence).map(|time| reference_date.and_time(time))
}

/// Extract the `HHMMSS` field that follows the talker id.
///
/// Only the first structurally matching field is considered: if its hour,
/// minute or second is out of range the result is `None`, even when a later
/// frame marker in the same text would have carried a valid time.
pub fn parse_time_of_day(sentence: &str) -> Option<NaiveTime> {
    let bytes = sentence.as_bytes();

    let digits = bytes
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == b'$')
        .find_map(|(marker, _)| time_field_at(bytes, marker))?;

    let hour = two_digits(&digits[0..2]);
    let minute = two_digits(&digits[2..4]);
    let second = two_digits(&digits[4..6]);

    if hour > 23 || minute > 59 || second > 59 {
        return None;
    }
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// Six time digits when a `$TALKER,HHMMSS` field starts at `marker`.
fn time_field_at(bytes: &[u8], marker: usize) -> Option<&[u8]> {
    let talker_start = marker + 1;
    let talker_len = bytes[talker_start..]
        .iter()
        .take_while(|b| b.is_ascii_uppercase())
        .count();

    if !(MIN_TALKER_LEN..=MAX_TALKER_LEN).contains(&talker_len) {
        return None;
    }

    let comma = talker_start + talker_len;
    if bytes.get(comma) != Some(&b',') {
        return None;
    }

    let digits = bytes.get(comma + 1..comma + 1 + TIME_DIGITS)?;
    digits.iter().all(u8::is_ascii_digit).then_some(digits)
}

fn two_digits(pair: &[u8]) -> u32 {
    u32::from(pair[0] - b'0') * 10 + u32::from(pair[1] - b'0')
}
