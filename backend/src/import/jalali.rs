//! Jalali (Persian solar) calendar conversion.
//!
//! Uses the 33-year arithmetic leap cycle. Day counts are offset so that they
//! line up with chrono's days-from-CE numbering.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use super::text::normalize_digits;

const CE_OFFSET: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid date")]
pub struct InvalidDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct JalaliDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

fn days_before_year(year: i64) -> i64 {
    let y = year + 1595;
    -355_668 + 365 * y + (y / 33) * 8 + ((y % 33) + 3) / 4
}

fn day_of_year(month: u32, day: u32) -> i64 {
    let (month, day) = (i64::from(month), i64::from(day));
    if month < 7 {
        (month - 1) * 31 + day
    } else {
        (month - 7) * 30 + 186 + day
    }
}

pub fn is_leap_year(year: i32) -> bool {
    let year = i64::from(year);
    days_before_year(year + 1) - days_before_year(year) == 366
}

pub fn month_length(year: i32, month: u32) -> Option<u32> {
    match month {
        1..=6 => Some(31),
        7..=11 => Some(30),
        12 if is_leap_year(year) => Some(30),
        12 => Some(29),
        _ => None,
    }
}

impl JalaliDate {
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, InvalidDate> {
        if year < 1 {
            return Err(InvalidDate);
        }
        let max_day = month_length(year, month).ok_or(InvalidDate)?;
        if day == 0 || day > max_day {
            return Err(InvalidDate);
        }
        Ok(Self { year, month, day })
    }

    pub fn parse(input: &str) -> Result<Self, InvalidDate> {
        let ascii = normalize_digits(input.trim());
        let parts: Vec<&str> = ascii.split(['/', '-', '.']).collect();
        if parts.len() != 3 {
            return Err(InvalidDate);
        }
        if parts
            .iter()
            .any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(InvalidDate);
        }
        let year = parts[0].parse::<i32>().map_err(|_| InvalidDate)?;
        let month = parts[1].parse::<u32>().map_err(|_| InvalidDate)?;
        let day = parts[2].parse::<u32>().map_err(|_| InvalidDate)?;
        Self::new(year, month, day)
    }

    pub fn to_gregorian(self) -> Result<NaiveDate, InvalidDate> {
        let days = days_before_year(i64::from(self.year)) + day_of_year(self.month, self.day)
            - CE_OFFSET;
        let days = i32::try_from(days).map_err(|_| InvalidDate)?;
        NaiveDate::from_num_days_from_ce_opt(days).ok_or(InvalidDate)
    }

    pub fn from_gregorian(date: NaiveDate) -> Self {
        let n = i64::from(date.num_days_from_ce()) + CE_OFFSET;
        let mut year = i64::from(date.year()) - 621;
        while days_before_year(year) + 1 > n {
            year -= 1;
        }
        while days_before_year(year + 1) < n {
            year += 1;
        }
        let doy = n - days_before_year(year);
        let (month, day) = if doy <= 186 {
            ((doy - 1) / 31 + 1, (doy - 1) % 31 + 1)
        } else {
            let rest = doy - 187;
            (rest / 30 + 7, rest % 30 + 1)
        };
        Self {
            year: year as i32,
            month: month as u32,
            day: day as u32,
        }
    }
}

impl fmt::Display for JalaliDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

/// Converts a Jalali date string to an ISO `YYYY-MM-DD` Gregorian date.
pub fn normalize(input: &str) -> Result<String, InvalidDate> {
    if input.trim().is_empty() {
        return Err(InvalidDate);
    }
    let date = JalaliDate::parse(input)?.to_gregorian()?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Renders an ISO date back to its Jalali form; `None` when not ISO.
pub fn iso_to_jalali(iso: &str) -> Option<String> {
    NaiveDate::parse_from_str(iso.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| JalaliDate::from_gregorian(d).to_string())
}
