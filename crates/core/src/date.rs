//! Serial day count to calendar timestamp conversion.
//!
//! Spreadsheets store dates as a count of days from an epoch, with the time
//! of day in the fractional part. Two epochs exist, selected by the workbook's
//! DATEMODE record. The 1900 system reproduces the phantom 1900-02-29 that
//! legacy spreadsheet programs show for serial 60, so the result is a plain
//! field struct rather than a `chrono` date. Serials are counted from
//! 1899-12-30 throughout, so serials 1 to 59 land one day before the date a
//! spreadsheet program shows and 1900-02-28 is never produced.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use std::fmt;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Serial of the non-existent 1900-02-29 in the 1900 date system.
const PHANTOM_LEAP_DAY: i64 = 60;

/// Largest serial accepted (9999-12-31 in the 1900 system).
const MAX_SERIAL: f64 = 2_958_465.0;

/// The epoch a workbook counts date serials from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DateSystem {
    /// Days since 1899-12-30 (DATEMODE 0).
    #[default]
    Epoch1900,
    /// Days since 1904-01-01 (DATEMODE 1).
    Epoch1904,
}

impl DateSystem {
    /// Map a DATEMODE record value to a date system.
    pub fn from_datemode(value: u16) -> Self {
        if value == 1 {
            DateSystem::Epoch1904
        } else {
            DateSystem::Epoch1900
        }
    }
}

/// A calendar timestamp decoded from a date serial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExcelDateTime {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    /// 0 = Sunday.
    weekday: u32,
    /// Total seconds since the epoch, used by elapsed-time tokens.
    elapsed_seconds: i64,
}

impl ExcelDateTime {
    /// Convert a serial day count.
    ///
    /// Returns `None` for negative, non-finite, or out-of-range serials.
    pub fn from_serial(serial: f64, system: DateSystem) -> Option<Self> {
        if !serial.is_finite() || serial < 0.0 || serial > MAX_SERIAL {
            return None;
        }

        let whole = serial.trunc();
        let mut days = whole as i64;
        let mut seconds = ((serial - whole) * SECONDS_PER_DAY).round() as i64;
        if seconds >= SECONDS_PER_DAY as i64 {
            days += 1;
            seconds -= SECONDS_PER_DAY as i64;
        }

        let (year, month, day, weekday) = match system {
            DateSystem::Epoch1900 if days == PHANTOM_LEAP_DAY => {
                (1900, 2, 29, weekday_from(days, 6))
            }
            DateSystem::Epoch1900 => {
                let date = offset_date(NaiveDate::from_ymd_opt(1899, 12, 30)?, days)?;
                (date.year(), date.month(), date.day(), weekday_from(days, 6))
            }
            DateSystem::Epoch1904 => {
                let date = offset_date(NaiveDate::from_ymd_opt(1904, 1, 1)?, days - 1)?;
                (date.year(), date.month(), date.day(), weekday_from(days, 4))
            }
        };

        Some(Self {
            year,
            month,
            day,
            hour: (seconds / 3600) as u32,
            minute: (seconds % 3600 / 60) as u32,
            second: (seconds % 60) as u32,
            weekday,
            elapsed_seconds: days * SECONDS_PER_DAY as i64 + seconds,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn second(&self) -> u32 {
        self.second
    }

    /// Day of the week, 0 = Sunday.
    pub fn weekday(&self) -> u32 {
        self.weekday
    }

    /// Seconds elapsed since the epoch.
    pub fn elapsed_seconds(&self) -> i64 {
        self.elapsed_seconds
    }

    /// Fixed `YYYY-MM-DDTHH:MM:SSZ` rendering.
    pub fn to_iso8601(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ExcelDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

fn offset_date(base: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        base.checked_add_days(Days::new(days as u64))
    } else {
        base.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// Weekday of `days` past an epoch whose day zero falls on `epoch_weekday`.
fn weekday_from(days: i64, epoch_weekday: i64) -> u32 {
    (days + epoch_weekday).rem_euclid(7) as u32
}
