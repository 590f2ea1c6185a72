//! One region per day: every code is drawn once before any code repeats.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    NoCodes,
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    NoEntry(NaiveDate),
    Io(String),
    Json(String),
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::NoCodes => write!(f, "no region codes to schedule"),
            ScheduleError::EndBeforeStart { start, end } => {
                write!(f, "schedule end {end} is before start {start}")
            }
            ScheduleError::NoEntry(date) => write!(f, "no region scheduled for {date}"),
            ScheduleError::Io(e) => write!(f, "io error: {e}"),
            ScheduleError::Json(e) => write!(f, "invalid schedule json: {e}"),
        }
    }
}

impl std::error::Error for ScheduleError {}

/// Date-ordered `{ "YYYY-MM-DD": code }` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    days: BTreeMap<NaiveDate, String>,
}

/// December 31 of the year after `start`.
pub fn end_of_next_year(start: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(start.year() + 1, 12, 31)
}

impl Schedule {
    /// Assigns a code to every day from `start` to `end` inclusive. Codes are drawn without
    /// replacement; the pool refills once it runs dry.
    pub fn generate<R: Rng>(
        codes: &[String],
        start: NaiveDate,
        end: NaiveDate,
        rng: &mut R,
    ) -> Result<Self, ScheduleError> {
        if codes.is_empty() {
            return Err(ScheduleError::NoCodes);
        }
        if end < start {
            return Err(ScheduleError::EndBeforeStart { start, end });
        }

        let mut days = BTreeMap::new();
        let mut pool: Vec<String> = Vec::new();
        for day in start.iter_days().take_while(|d| *d <= end) {
            if pool.is_empty() {
                pool = codes.to_vec();
            }
            let pick = rng.random_range(0..pool.len());
            days.insert(day, pool.swap_remove(pick));
        }
        debug!(days = days.len(), codes = codes.len(), "schedule generated");
        Ok(Self { days })
    }

    pub fn from_json_str(payload: &str) -> Result<Self, ScheduleError> {
        serde_json::from_str(payload).map_err(|e| ScheduleError::Json(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScheduleError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ScheduleError::Io(format!("read {}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String, ScheduleError> {
        serde_json::to_string_pretty(self).map_err(|e| ScheduleError::Json(e.to_string()))
    }

    pub fn code_for(&self, date: NaiveDate) -> Result<&str, ScheduleError> {
        self.days
            .get(&date)
            .map(String::as_str)
            .ok_or(ScheduleError::NoEntry(date))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &str)> {
        self.days.iter().map(|(d, c)| (*d, c.as_str()))
    }
}

/// Region codes of the rendered maps in `dir` (`<code>.png`), sorted.
pub fn codes_from_maps_dir(dir: impl AsRef<Path>) -> Result<Vec<String>, ScheduleError> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir)
        .map_err(|e| ScheduleError::Io(format!("read dir {}: {e}", dir.display())))?;
    let mut codes = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ScheduleError::Io(e.to_string()))?.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            codes.push(stem.to_string());
        }
    }
    codes.sort();
    Ok(codes)
}
