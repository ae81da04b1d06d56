//! Permissive month-first date-time parsing.
//!
//! [`parse_fuzzy`] pulls one date and at most one time out of loosely
//! formatted text such as `"09/11/2021 2:39"`, `"2021-09-11T00:00:00.000"`,
//! `"Mar-14-2022"` or `"Monday, March 14th 2022 at 3:05 pm"`. Anything it
//! cannot make sense of yields `None`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

#[derive(Debug, Default)]
struct Parsed {
    date: Option<NaiveDate>,
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    time: Option<NaiveTime>,
    iso_time: Option<NaiveTime>,
    meridiem: Option<Meridiem>,
}

/// Parses free-form text into a timestamp, reading ambiguous numeric dates
/// month first.
///
/// Each token first loses a wrapping pair of brackets or quotes and any
/// trailing `.`, `;`, `!` or `?`; tokens left empty are skipped. A trailing
/// UTC offset (`Z`, `+HH:MM`, `-HHMM`) on a clock is dropped without shifting
/// the time.
///
/// Returns `None` when no complete date is found, when a component is out
/// of range, when the text holds two dates or two times, or when a token
/// still contains characters other than letters, digits, `:`, `/`, `.` and
/// `-`. A missing time means midnight.
#[must_use]
pub fn parse_fuzzy(text: &str) -> Option<NaiveDateTime> {
    let mut parsed = Parsed::default();

    for token in text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        parsed.consume(token)?;
    }

    parsed.finish()
}

impl Parsed {
    fn consume(&mut self, token: &str) -> Option<()> {
        let token = strip_offset(strip_punctuation(token));
        if token.is_empty() {
            return Some(());
        }
        if !token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '/' | '.' | '-'))
        {
            return None;
        }

        if let Some((date, time)) = split_iso(token) {
            self.set_date(parse_numeric_date(date)?)?;
            self.iso_time = Some(parse_clock(time)?);
            return Some(());
        }

        let lower = token.to_ascii_lowercase();

        if let Some(meridiem) = parse_meridiem(&lower) {
            return self.set_meridiem(meridiem);
        }

        if lower.contains(':') {
            let (clock, meridiem) = strip_meridiem(&lower);
            if let Some(meridiem) = meridiem {
                self.set_meridiem(meridiem)?;
            }
            return self.set_time(parse_clock(clock)?);
        }

        if lower.contains('/') || lower.contains('-') {
            let date = parse_numeric_date(&lower).or_else(|| parse_named_date(&lower))?;
            return self.set_date(date);
        }

        if lower.bytes().all(|b| b.is_ascii_digit()) {
            return self.push_number(&lower);
        }

        if let Some(day) = strip_ordinal(&lower) {
            return set_once(&mut self.day, day);
        }

        if lower.bytes().all(|b| b.is_ascii_alphabetic()) {
            if let Some(month) = month_from_name(&lower) {
                return set_once(&mut self.month, month);
            }
            // Filler word ("at", "on", "approx", weekday names).
            return Some(());
        }

        None
    }

    fn set_date(&mut self, date: NaiveDate) -> Option<()> {
        if self.date.is_some() {
            return None;
        }
        self.date = Some(date);
        Some(())
    }

    fn set_time(&mut self, time: NaiveTime) -> Option<()> {
        if self.time.is_some() {
            return None;
        }
        self.time = Some(time);
        Some(())
    }

    fn set_meridiem(&mut self, meridiem: Meridiem) -> Option<()> {
        if self.meridiem.is_some() {
            return None;
        }
        self.meridiem = Some(meridiem);
        Some(())
    }

    fn push_number(&mut self, digits: &str) -> Option<()> {
        if digits.len() == 8 {
            let year = digits[..4].parse().ok()?;
            let month = digits[4..6].parse().ok()?;
            let day = digits[6..].parse().ok()?;
            return self.set_date(NaiveDate::from_ymd_opt(year, month, day)?);
        }
        if digits.len() > 4 {
            return None;
        }

        let value: u32 = digits.parse().ok()?;
        if digits.len() > 2 {
            return set_once(&mut self.year, i32::try_from(value).ok()?);
        }
        if self.day.is_none() && (1..=31).contains(&value) {
            self.day = Some(value);
            return Some(());
        }
        set_once(&mut self.year, expand_year(value))
    }

    fn finish(self) -> Option<NaiveDateTime> {
        let has_parts = self.year.is_some() || self.month.is_some() || self.day.is_some();

        let date = match self.date {
            Some(date) if !has_parts => date,
            Some(_) => return None,
            None => NaiveDate::from_ymd_opt(self.year?, self.month?, self.day?)?,
        };

        let time = match (self.time, self.meridiem) {
            (Some(time), Some(meridiem)) => apply_meridiem(time, meridiem)?,
            (Some(time), None) => time,
            (None, Some(_)) => return None,
            (None, None) => self.iso_time.unwrap_or(NaiveTime::MIN),
        };

        Some(date.and_time(time))
    }
}

/// Removes a wrapping `()`, `[]`, `{}` or `""` pair and trailing sentence
/// punctuation. A lone bracket is left in place.
fn strip_punctuation(token: &str) -> &str {
    const PAIRS: [(char, char); 4] = [('(', ')'), ('[', ']'), ('{', '}'), ('"', '"')];

    let mut token = token.trim_end_matches(['.', ';', '!', '?']);
    while let Some(inner) = PAIRS.iter().find_map(|&(open, close)| {
        token
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
    }) {
        token = inner.trim_end_matches(['.', ';', '!', '?']);
    }
    token
}

/// Drops a trailing `Z`, `+HH:MM`, `-HH:MM`, `+HHMM` or `+HH` from a token
/// holding a clock.
fn strip_offset(token: &str) -> &str {
    let Some(colon) = token.find(':') else {
        return token;
    };
    if let Some(clock) = token.strip_suffix(['Z', 'z'])
        && clock.ends_with(|c: char| c.is_ascii_digit())
    {
        return clock;
    }
    let Some(sign) = token[colon..].rfind(['+', '-']).map(|idx| idx + colon) else {
        return token;
    };
    let offset = token[sign + 1..].as_bytes();
    let digits = |bytes: &[u8]| bytes.iter().all(u8::is_ascii_digit);
    let valid = match offset.len() {
        2 | 4 => digits(offset),
        5 => offset[2] == b':' && digits(&offset[..2]) && digits(&offset[3..]),
        _ => false,
    };
    if valid { &token[..sign] } else { token }
}

fn set_once<T>(slot: &mut Option<T>, value: T) -> Option<()> {
    if slot.is_some() {
        return None;
    }
    *slot = Some(value);
    Some(())
}

/// Splits `YYYY-MM-DDTHH:MM...` into its date and time halves.
fn split_iso(token: &str) -> Option<(&str, &str)> {
    let idx = token.find(['T', 't'])?;
    let (date, time) = (&token[..idx], &token[idx + 1..]);
    if date.is_empty() || !date.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
        return None;
    }
    if !time.contains(':') {
        return None;
    }
    Some((date, time.strip_suffix(['Z', 'z']).unwrap_or(time)))
}

/// Parses `M/D/Y`, `M-D-Y`, `Y-M-D` or `Y/M/D`.
fn parse_numeric_date(token: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = token.split(['/', '-']).collect();
    let [a, b, c] = parts.as_slice() else {
        return None;
    };
    if [a, b, c]
        .iter()
        .any(|p| p.is_empty() || p.len() > 4 || !p.bytes().all(|ch| ch.is_ascii_digit()))
    {
        return None;
    }

    let (x, y, z): (u32, u32, u32) = (a.parse().ok()?, b.parse().ok()?, c.parse().ok()?);

    if a.len() == 4 {
        return NaiveDate::from_ymd_opt(i32::try_from(x).ok()?, y, z);
    }

    let year = if c.len() <= 2 {
        expand_year(z)
    } else {
        i32::try_from(z).ok()?
    };
    let (month, day) = if x > 12 && y <= 12 { (y, x) } else { (x, y) };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses `Mon-D-Y` or `D-Mon-Y` with a month name or abbreviation, using
/// `-` or `/` as separator.
fn parse_named_date(lower: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = lower.split(['/', '-']).collect();
    let [a, b, c] = parts.as_slice() else {
        return None;
    };
    let is_word = |p: &str| !p.is_empty() && p.bytes().all(|ch| ch.is_ascii_alphabetic());
    let (month, day) = if is_word(a) {
        (month_from_name(a)?, parse_digits(b)?)
    } else if is_word(b) {
        (month_from_name(b)?, parse_digits(a)?)
    } else {
        return None;
    };

    if c.is_empty() || c.len() > 4 || !c.bytes().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    let value: u32 = c.parse().ok()?;
    let year = if c.len() <= 2 {
        expand_year(value)
    } else {
        i32::try_from(value).ok()?
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Maps a two-digit year: `00–69` to the 2000s, `70–99` to the 1900s.
fn expand_year(value: u32) -> i32 {
    let value = i32::try_from(value).unwrap_or(i32::MAX);
    match value {
        0..=69 => 2000 + value,
        70..=99 => 1900 + value,
        _ => value,
    }
}

/// Parses `H:MM`, `H:MM:SS` or `H:MM:SS.ffffff`.
fn parse_clock(text: &str) -> Option<NaiveTime> {
    let mut parts = text.split(':');
    let hour: u32 = parse_digits(parts.next()?)?;
    let minute: u32 = parse_digits(parts.next()?)?;

    let (second, micros) = match parts.next() {
        None => (0, 0),
        Some(seconds) => {
            let (whole, fraction) = seconds.split_once('.').unwrap_or((seconds, ""));
            (parse_digits(whole)?, parse_fraction(fraction)?)
        }
    };

    if parts.next().is_some() {
        return None;
    }

    NaiveTime::from_hms_micro_opt(hour, minute, second, micros)
}

fn parse_digits(text: &str) -> Option<u32> {
    if text.is_empty() || text.len() > 2 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Converts a fractional-second suffix into microseconds.
fn parse_fraction(text: &str) -> Option<u32> {
    if text.is_empty() {
        return Some(0);
    }
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits: String = text.chars().chain(std::iter::repeat('0')).take(6).collect();
    digits.parse().ok()
}

fn parse_meridiem(lower: &str) -> Option<Meridiem> {
    match lower {
        "am" | "a.m." | "a.m" => Some(Meridiem::Am),
        "pm" | "p.m." | "p.m" => Some(Meridiem::Pm),
        _ => None,
    }
}

/// Splits a trailing `am`/`pm` off a clock token such as `3:05pm`.
fn strip_meridiem(lower: &str) -> (&str, Option<Meridiem>) {
    for (suffix, meridiem) in [
        ("a.m.", Meridiem::Am),
        ("p.m.", Meridiem::Pm),
        ("a.m", Meridiem::Am),
        ("p.m", Meridiem::Pm),
        ("am", Meridiem::Am),
        ("pm", Meridiem::Pm),
    ] {
        if let Some(clock) = lower.strip_suffix(suffix) {
            return (clock, Some(meridiem));
        }
    }
    (lower, None)
}

fn apply_meridiem(time: NaiveTime, meridiem: Meridiem) -> Option<NaiveTime> {
    use chrono::Timelike as _;

    let hour = time.hour();
    if hour == 0 || hour > 12 {
        return None;
    }
    let hour = match meridiem {
        Meridiem::Am => hour % 12,
        Meridiem::Pm => hour % 12 + 12,
    };
    time.with_hour(hour)
}

/// Parses `1st`, `2nd`, `3rd`, `14th`.
fn strip_ordinal(lower: &str) -> Option<u32> {
    let digits = ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| lower.strip_suffix(suffix))?;
    let day = parse_digits(digits)?;
    (1..=31).contains(&day).then_some(day)
}

fn month_from_name(word: &str) -> Option<u32> {
    if word.len() < 3 {
        return None;
    }
    let word = if word == "sept" { "sep" } else { word };
    MONTHS
        .iter()
        .position(|month| month.starts_with(word))
        .and_then(|idx| u32::try_from(idx + 1).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(text: &str) -> String {
        parse_fuzzy(text)
            .unwrap_or_else(|| panic!("failed to parse {text:?}"))
            .format("%Y-%m-%d %H:%M:%S%.f")
            .to_string()
    }

    #[test]
    fn parses_slash_date_with_time() {
        assert_eq!(ts("03/14/2022 10:30"), "2022-03-14 10:30:00");
        assert_eq!(ts("09/11/2021 2:39"), "2021-09-11 02:39:00");
    }

    #[test]
    fn date_alone_is_midnight() {
        assert_eq!(ts("03/14/2022"), "2022-03-14 00:00:00");
    }

    #[test]
    fn iso_time_is_overridden_by_explicit_time() {
        assert_eq!(ts("2021-09-11T00:00:00.000"), "2021-09-11 00:00:00");
        assert_eq!(ts("2021-09-11T00:00:00.000 14:05"), "2021-09-11 14:05:00");
        assert_eq!(ts("2021-09-11T08:15:30"), "2021-09-11 08:15:30");
    }

    #[test]
    fn parses_fractional_seconds() {
        assert_eq!(ts("2022-01-02 03:04:05.25"), "2022-01-02 03:04:05.250");
    }

    #[test]
    fn applies_meridiem() {
        assert_eq!(ts("3/14/22 3:05 PM"), "2022-03-14 15:05:00");
        assert_eq!(ts("3/14/22 12:10am"), "2022-03-14 00:10:00");
        assert_eq!(ts("3/14/22 12:10 p.m."), "2022-03-14 12:10:00");
    }

    #[test]
    fn expands_two_digit_years() {
        assert_eq!(ts("1/2/69"), "2069-01-02 00:00:00");
        assert_eq!(ts("1/2/70"), "1970-01-02 00:00:00");
    }

    #[test]
    fn swaps_day_first_when_month_is_impossible() {
        assert_eq!(ts("14/03/2022"), "2022-03-14 00:00:00");
    }

    #[test]
    fn parses_month_names_and_ordinals() {
        assert_eq!(
            ts("Monday, March 14th 2022 at 3:05 pm"),
            "2022-03-14 15:05:00"
        );
        assert_eq!(ts("Sept. 3 2021"), "2021-09-03 00:00:00");
    }

    #[test]
    fn parses_compact_dates() {
        assert_eq!(ts("20220314"), "2022-03-14 00:00:00");
        assert_eq!(ts("20220314 09:05"), "2022-03-14 09:05:00");
    }

    #[test]
    fn skips_parenthesized_filler() {
        assert_eq!(ts("March 14, 2022 (approx)"), "2022-03-14 00:00:00");
        assert_eq!(ts("[03/14/2022] 10:30"), "2022-03-14 10:30:00");
    }

    #[test]
    fn ignores_trailing_punctuation() {
        assert_eq!(ts("03/14/2022."), "2022-03-14 00:00:00");
        assert_eq!(ts("03/14/2022 10:30; ."), "2022-03-14 10:30:00");
        assert_eq!(ts("3/14/22 12:10a.m."), "2022-03-14 00:10:00");
    }

    #[test]
    fn parses_month_name_with_separators() {
        assert_eq!(ts("Mar-14-2022"), "2022-03-14 00:00:00");
        assert_eq!(ts("14-Mar-2022 08:00"), "2022-03-14 08:00:00");
        assert_eq!(ts("Sep/3/21"), "2021-09-03 00:00:00");
        assert!(parse_fuzzy("Foo-14-2022").is_none());
    }

    #[test]
    fn drops_utc_offsets() {
        assert_eq!(ts("2022-03-14 10:30:00+00:00"), "2022-03-14 10:30:00");
        assert_eq!(ts("2022-03-14T10:30:00-05:00"), "2022-03-14 10:30:00");
        assert_eq!(ts("2022-03-14 10:30Z"), "2022-03-14 10:30:00");
        assert_eq!(ts("2022-03-14 10:30+0530"), "2022-03-14 10:30:00");
        assert!(parse_fuzzy("2022-03-14 10:30+5").is_none());
    }

    #[test]
    fn rejects_junk_tokens() {
        assert!(parse_fuzzy("03/14/2022 [").is_none());
        assert!(parse_fuzzy("03/14/2022 (").is_none());
        assert!(parse_fuzzy("03/14/2022 10:30 #").is_none());
    }

    #[test]
    fn rejects_out_of_range_components() {
        assert!(parse_fuzzy("13/13/2022").is_none());
        assert!(parse_fuzzy("02/30/2022").is_none());
        assert!(parse_fuzzy("03/14/2022 25:00").is_none());
        assert!(parse_fuzzy("03/14/2022 13:00 pm").is_none());
    }

    #[test]
    fn rejects_incomplete_or_repeated_parts() {
        assert!(parse_fuzzy("").is_none());
        assert!(parse_fuzzy("10:30").is_none());
        assert!(parse_fuzzy("March 2022").is_none());
        assert!(parse_fuzzy("03/14/2022 03/15/2022").is_none());
        assert!(parse_fuzzy("03/14/2022 10:30 11:30").is_none());
    }
}
