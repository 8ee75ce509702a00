use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

use super::super::error::SchemaValidationError;
use super::schema::TimeWindow;

const LAST_MINUTE_OF_DAY: u16 = 23 * 60 + 59;

/// A [`TimeWindow`] with its zone parsed and bounds converted to minute-of-day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWindow {
    zone: Tz,
    start: u16,
    end: u16,
    days: Vec<u8>,
}

impl ResolvedWindow {
    pub fn resolve(window: &TimeWindow) -> Result<Self, SchemaValidationError> {
        let zone: Tz = window
            .timezone
            .parse()
            .map_err(|_| SchemaValidationError::UnknownTimezone(window.timezone.clone()))?;
        let start = minute_of_day("start", &window.start)?;
        let end = minute_of_day("end", &window.end)?;

        if let Some(day) = window.days.iter().copied().find(|day| *day > 6) {
            return Err(SchemaValidationError::DayOutOfRange(day));
        }

        Ok(Self {
            zone,
            start,
            end,
            days: window.days.clone(),
        })
    }

    pub fn is_overnight(&self) -> bool {
        self.start > self.end
    }

    /// Whether `instant`, read as local time in the window's zone, falls inside the window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let local = instant.with_timezone(&self.zone);
        let day = local.weekday().num_days_from_sunday() as u8;
        if !self.days.is_empty() && !self.days.contains(&day) {
            return false;
        }

        let minute = (local.hour() * 60 + local.minute()) as u16;
        if self.is_overnight() {
            (self.start..=LAST_MINUTE_OF_DAY).contains(&minute) || minute <= self.end
        } else {
            (self.start..=self.end).contains(&minute)
        }
    }
}

fn minute_of_day(field: &'static str, raw: &str) -> Result<u16, SchemaValidationError> {
    let invalid = || SchemaValidationError::InvalidClock {
        field,
        value: raw.to_string(),
    };

    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 5
        && bytes[2] == b':'
        && [0, 1, 3, 4].iter().all(|index| bytes[*index].is_ascii_digit());
    if !shaped {
        return Err(invalid());
    }

    let time = NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| invalid())?;
    Ok((time.hour() * 60 + time.minute()) as u16)
}
