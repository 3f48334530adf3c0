use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

const FR_MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

const EN_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Language used for month titles and weekday headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    #[default]
    Fr,
}

impl Locale {
    /// Name of `month` (1-based). Out of range values fall back to the
    /// nearest valid month.
    pub fn month_name(self, month: u32) -> &'static str {
        let idx = month.clamp(1, 12) as usize - 1;
        match self {
            Self::En => EN_MONTHS[idx],
            Self::Fr => FR_MONTHS[idx],
        }
    }

    /// Column headers, Monday first.
    pub fn weekday_initials(self) -> [&'static str; 7] {
        match self {
            Self::En => ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"],
            Self::Fr => ["L", "M", "M", "J", "V", "S", "D"],
        }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "fr" | "french" | "français" => Ok(Self::Fr),
            other => Err(anyhow!("unsupported locale: {other} (expected en or fr)")),
        }
    }
}
