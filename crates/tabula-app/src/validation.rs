// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;
use time::macros::format_description;

use crate::ParseError;

pub const DATE_LAYOUT: &str = "YYYY-MM-DD";

pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Parses `$1,234.56`, `1234.5`, `.75` and friends into cents.
///
/// Negative amounts are accepted as `-$5.00` or `$-5.00` only when
/// `allow_negative` is set; otherwise they fail with `NegativeMoney`.
pub fn parse_cents(input: &str, allow_negative: bool) -> ParseResult<i64> {
    let clean = input.trim().replace(',', "");
    let (negative, body) = split_sign(&clean)?;
    if negative && !allow_negative {
        return Err(ParseError::NegativeMoney);
    }

    let magnitude = parse_unsigned_cents(body)?;
    if negative {
        return Ok(-magnitude);
    }
    Ok(magnitude)
}

pub fn format_cents(cents: i64) -> String {
    let (sign, cents) = normalize_sign(cents);
    format!("{sign}${}.{:02}", cents / 100, cents % 100)
}

pub fn parse_date(input: &str) -> ParseResult<Date> {
    Date::parse(input.trim(), &format_description!("[year]-[month]-[day]"))
        .map_err(|_| ParseError::InvalidDate)
}

pub fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

/// Fits `input` into an input-mask skeleton where `9` is a required digit
/// and every other character is literal punctuation.
///
/// Input that already matches the skeleton is returned unchanged; bare digits
/// (with any punctuation stripped) are poured into the skeleton.
pub fn apply_mask(skeleton: &str, input: &str) -> ParseResult<String> {
    let trimmed = input.trim();
    if matches_mask(skeleton, trimmed) {
        return Ok(trimmed.to_owned());
    }

    let digits = trimmed
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<Vec<_>>();
    let slots = skeleton.chars().filter(|ch| *ch == '9').count();
    let only_punctuation = trimmed
        .chars()
        .all(|ch| ch.is_ascii_digit() || !ch.is_alphanumeric());
    if digits.len() != slots || !only_punctuation {
        return Err(ParseError::MaskMismatch);
    }

    let mut digits = digits.into_iter();
    let mut output = String::with_capacity(skeleton.len());
    for ch in skeleton.chars() {
        if ch == '9' {
            output.push(digits.next().ok_or(ParseError::MaskMismatch)?);
        } else {
            output.push(ch);
        }
    }
    Ok(output)
}

pub fn matches_mask(skeleton: &str, input: &str) -> bool {
    if skeleton.chars().count() != input.chars().count() {
        return false;
    }
    skeleton
        .chars()
        .zip(input.chars())
        .all(|(slot, ch)| match slot {
            '9' => ch.is_ascii_digit(),
            literal => literal == ch,
        })
}

/// Converts a `*`/`?`/`[...]` glob into an unanchored regular expression.
pub fn wildcard_to_regex(pattern: &str) -> String {
    let mut output = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '*' => output.push_str(".*"),
            '?' => output.push('.'),
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == ']' {
                        closed = true;
                        break;
                    }
                    class.push(inner);
                }
                if closed {
                    output.push('[');
                    if let Some(rest) = class.strip_prefix('!') {
                        output.push('^');
                        output.push_str(&escape_class(rest));
                    } else {
                        output.push_str(&escape_class(&class));
                    }
                    output.push(']');
                } else {
                    output.push_str(&regex::escape("["));
                    output.push_str(&regex::escape(&class));
                }
            }
            other => output.push_str(&regex::escape(&other.to_string())),
        }
    }
    output
}

fn escape_class(class: &str) -> String {
    class.replace('\\', "\\\\").replace('[', "\\[")
}

fn split_sign(input: &str) -> ParseResult<(bool, &str)> {
    if let Some(rest) = input.strip_prefix('-') {
        let rest = rest.strip_prefix('$').unwrap_or(rest);
        return Ok((true, rest));
    }
    if let Some(rest) = input.strip_prefix('$') {
        if let Some(rest) = rest.strip_prefix('-') {
            return Ok((true, rest));
        }
        return Ok((false, rest));
    }
    Ok((false, input))
}

fn parse_unsigned_cents(input: &str) -> ParseResult<i64> {
    if input.is_empty() {
        return Err(ParseError::InvalidMoney);
    }

    let parts = input.split('.').collect::<Vec<_>>();
    if parts.len() > 2 {
        return Err(ParseError::InvalidMoney);
    }

    let whole = parse_digits(parts[0], true)?;
    if whole > i64::MAX / 100 {
        return Err(ParseError::MoneyOutOfRange);
    }

    let mut frac = 0i64;
    if parts.len() == 2 {
        if parts[1].len() > 2 {
            return Err(ParseError::InvalidMoney);
        }
        frac = parse_digits(parts[1], false)?;
        if parts[1].len() == 1 {
            frac *= 10;
        }
    }

    whole
        .checked_mul(100)
        .and_then(|value| value.checked_add(frac))
        .ok_or(ParseError::MoneyOutOfRange)
}

fn parse_digits(input: &str, allow_empty: bool) -> ParseResult<i64> {
    if input.is_empty() {
        if allow_empty {
            return Ok(0);
        }
        return Err(ParseError::InvalidMoney);
    }
    if !input.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ParseError::InvalidMoney);
    }
    input
        .parse::<i64>()
        .map_err(|_| ParseError::MoneyOutOfRange)
}

fn normalize_sign(cents: i64) -> (&'static str, i64) {
    if cents >= 0 {
        return ("", cents);
    }
    if cents == i64::MIN {
        ("-", i64::MAX)
    } else {
        ("-", -cents)
    }
}
