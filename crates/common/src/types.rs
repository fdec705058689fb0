//! Core types for Countdown Wallet

use crate::{Error, Result};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Color used when a countdown does not pick one (indigo)
pub const DEFAULT_COLOR: &str = "#4f46e5";

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Accepted target years
pub const MIN_YEAR: i32 = 1970;
pub const MAX_YEAR: i32 = 9999;

/// Pseudonymous grouping of countdowns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Internal identifier, never shown in URLs
    pub id: Uuid,
    /// Public slug, e.g. `glacier-owl-echo`
    pub wallet_id: String,
    /// SHA-256 of the owner secret
    #[serde(skip_serializing, default)]
    pub owner_secret_hash: String,
    pub created_at: i64,
}

impl Wallet {
    /// Path of the wallet page
    pub fn path(&self) -> String {
        format!("/w/{}", self.wallet_id)
    }
}

/// Repeat schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Default for Repeat {
    fn default() -> Self {
        Self::None
    }
}

impl std::fmt::Display for Repeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Yearly => write!(f, "yearly"),
        }
    }
}

impl std::str::FromStr for Repeat {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(format!("unknown repeat schedule: {}", s)),
        }
    }
}

/// When to remind relative to the target time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemindAt {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "at_time")]
    AtTime,
    #[serde(rename = "1_hour_before")]
    OneHourBefore,
    #[serde(rename = "1_day_before")]
    OneDayBefore,
    #[serde(rename = "1_week_before")]
    OneWeekBefore,
}

impl RemindAt {
    /// Lead time before the target, `None` when no reminder is set
    pub fn lead_time(&self) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::AtTime => Some(Duration::zero()),
            Self::OneHourBefore => Some(Duration::hours(1)),
            Self::OneDayBefore => Some(Duration::days(1)),
            Self::OneWeekBefore => Some(Duration::weeks(1)),
        }
    }
}

impl Default for RemindAt {
    fn default() -> Self {
        Self::None
    }
}

impl std::fmt::Display for RemindAt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::AtTime => write!(f, "at_time"),
            Self::OneHourBefore => write!(f, "1_hour_before"),
            Self::OneDayBefore => write!(f, "1_day_before"),
            Self::OneWeekBefore => write!(f, "1_week_before"),
        }
    }
}

impl std::str::FromStr for RemindAt {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "at_time" => Ok(Self::AtTime),
            "1_hour_before" => Ok(Self::OneHourBefore),
            "1_day_before" => Ok(Self::OneDayBefore),
            "1_week_before" => Ok(Self::OneWeekBefore),
            _ => Err(format!("unknown reminder: {}", s)),
        }
    }
}

/// A persisted countdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub id: Uuid,
    /// Internal id of the owning wallet; stand-alone countdowns have none
    #[serde(skip_serializing)]
    pub wallet_id: Option<Uuid>,
    /// Public sharing token
    pub token: String,
    pub title: String,
    pub description: String,
    pub color: String,
    pub target_time: DateTime<Utc>,
    pub all_day: bool,
    pub repeat: Repeat,
    pub remind_at: RemindAt,
    pub created_at: i64,
}

impl Countdown {
    /// Path of the public countdown page
    pub fn share_path(&self) -> String {
        format!("/c/{}", self.token)
    }

    /// First occurrence at or after `now`.
    ///
    /// Monthly and yearly series keep the original day of month, clamped to
    /// the last day of shorter months.
    pub fn next_occurrence(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let start = self.target_time;
        if start >= now {
            return start;
        }
        match self.repeat {
            Repeat::None => start,
            Repeat::Daily => step_fixed(start, Duration::days(1), now),
            Repeat::Weekly => step_fixed(start, Duration::weeks(1), now),
            Repeat::Monthly => step_months(start, 1, now),
            Repeat::Yearly => step_months(start, 12, now),
        }
    }

    /// Time remaining until the next occurrence
    pub fn time_left(&self, now: DateTime<Utc>) -> TimeLeft {
        TimeLeft::between(now, self.next_occurrence(now))
    }

    /// Reminder instant for the next occurrence
    pub fn reminder_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.remind_at
            .lead_time()
            .and_then(|lead| self.next_occurrence(now).checked_sub_signed(lead))
    }
}

fn step_fixed(start: DateTime<Utc>, period: Duration, now: DateTime<Utc>) -> DateTime<Utc> {
    let periods = (now - start).num_seconds() / period.num_seconds();
    let mut next = i32::try_from(periods)
        .ok()
        .and_then(|n| period.checked_mul(n))
        .and_then(|offset| start.checked_add_signed(offset))
        .unwrap_or(start);
    while next < now {
        match next.checked_add_signed(period) {
            Some(later) => next = later,
            None => return start,
        }
    }
    next
}

fn step_months(start: DateTime<Utc>, months_per_step: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    let months_between = (now.year() - start.year()) * 12 + now.month() as i32 - start.month() as i32;
    let mut steps = months_between.max(0) as u32 / months_per_step;
    loop {
        match start.checked_add_months(Months::new(steps * months_per_step)) {
            Some(candidate) if candidate >= now => return candidate,
            Some(_) => steps += 1,
            None => return start,
        }
    }
}

/// Remaining time split into display units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum TimeLeft {
    Remaining {
        days: i64,
        hours: i64,
        minutes: i64,
        seconds: i64,
    },
    Elapsed,
}

impl TimeLeft {
    pub fn between(now: DateTime<Utc>, target: DateTime<Utc>) -> Self {
        let total = (target - now).num_seconds();
        if total <= 0 {
            return Self::Elapsed;
        }
        Self::Remaining {
            days: total / 86_400,
            hours: (total / 3_600) % 24,
            minutes: (total / 60) % 60,
            seconds: total % 60,
        }
    }
}

impl std::fmt::Display for TimeLeft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remaining {
                days,
                hours,
                minutes,
                seconds,
            } => write!(f, "{}d {}h {}m {}s", days, hours, minutes, seconds),
            Self::Elapsed => write!(f, "Time's up!"),
        }
    }
}

/// Countdown form input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCountdown {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: Option<String>,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`, required unless `all_day`
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default = "default_all_day")]
    pub all_day: bool,
    #[serde(default)]
    pub repeat: Repeat,
    #[serde(default)]
    pub remind_at: RemindAt,
}

fn default_all_day() -> bool {
    true
}

/// Countdown input that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCountdown {
    pub title: String,
    pub description: String,
    pub color: String,
    pub target_time: DateTime<Utc>,
    pub all_day: bool,
    pub repeat: Repeat,
    pub remind_at: RemindAt,
}

impl NewCountdown {
    /// Check the form and resolve its UTC target instant
    pub fn validate(&self) -> Result<ValidCountdown> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::Validation("title is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(Error::Validation(format!(
                "title must be at most {} characters",
                MAX_TITLE_LEN
            )));
        }

        let description = self.description.trim();
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(Error::Validation(format!(
                "description must be at most {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }

        let color = match self.color.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_COLOR.to_string(),
            Some(c) => parse_color(c)?,
        };

        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| Error::Validation(format!("invalid date '{}'", self.date)))?;
        if !(MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
            return Err(Error::Validation(format!(
                "date '{}' must fall between years {} and {}",
                self.date, MIN_YEAR, MAX_YEAR
            )));
        }
        let time = if self.all_day {
            NaiveTime::from_hms_opt(0, 0, 0)
                .ok_or_else(|| Error::Internal("midnight out of range".to_string()))?
        } else {
            let raw = self
                .time
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| Error::Validation("time is required unless all_day".to_string()))?;
            parse_time(raw)?
        };

        Ok(ValidCountdown {
            title: title.to_string(),
            description: description.to_string(),
            color,
            target_time: Utc.from_utc_datetime(&date.and_time(time)),
            all_day: self.all_day,
            repeat: self.repeat,
            remind_at: self.remind_at,
        })
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| Error::Validation(format!("invalid time '{}'", raw)))
}

fn parse_color(raw: &str) -> Result<String> {
    let hex = raw
        .strip_prefix('#')
        .filter(|h| h.len() == 6 && h.chars().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(|| Error::Validation(format!("color must be #rrggbb, got '{}'", raw)))?;
    Ok(format!("#{}", hex.to_ascii_lowercase()))
}
