use std::{collections::BTreeMap, str::FromStr};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use schema::MoodEntry;
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    misc::days_before,
    trend::{Trend, TrendThresholds, mean, mood_counts, most_common, shift_trend},
};

/// Window selected by the `timeRange` query parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
    All,
}

impl TimeRange {
    pub fn days(&self) -> Option<i64> {
        match self {
            TimeRange::Week => Some(7),
            TimeRange::Month => Some(30),
            TimeRange::Quarter => Some(90),
            TimeRange::Year => Some(365),
            TimeRange::All => None,
        }
    }

    /// Start of the window ending at `now`; `None` is unbounded
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.days().and_then(|days| days_before(now, days))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::Quarter => "quarter",
            TimeRange::Year => "year",
            TimeRange::All => "all",
        }
    }
}

impl FromStr for TimeRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "week" => Ok(TimeRange::Week),
            "month" => Ok(TimeRange::Month),
            "quarter" => Ok(TimeRange::Quarter),
            "year" => Ok(TimeRange::Year),
            "all" => Ok(TimeRange::All),
            _ => Err(Error::InvalidTimeRange(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variability {
    Low,
    Medium,
    High,
}

impl Variability {
    /// `low` below `low_variability`, `high` above `high_variability`.
    /// Both boundaries themselves are `medium`.
    pub fn from_std_dev(std_dev: f64, thresholds: &TrendThresholds) -> Self {
        if std_dev < thresholds.low_variability {
            Variability::Low
        } else if std_dev > thresholds.high_variability {
            Variability::High
        } else {
            Variability::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Variability::Low => "low",
            Variability::Medium => "medium",
            Variability::High => "high",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodPoint {
    pub id: String,
    pub mood: String,
    pub intensity: i64,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodSummary {
    pub most_common_mood: String,
    pub average_intensity: f64,
    pub standard_deviation: f64,
    pub variability: Variability,
    pub trend: Trend,
    pub total_entries: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionEntry {
    pub mood: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// Highest-intensity mood of the day
    pub mood: String,
    pub intensity: i64,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodAnalytics {
    /// Chronological
    pub moods: Vec<MoodPoint>,
    pub summary: MoodSummary,
    pub distribution: Vec<DistributionEntry>,
    pub calendar: Vec<CalendarDay>,
}

/// Summarises every entry in a window.
///
/// `tz` decides which calendar day an entry falls on.
pub fn mood_analytics<Tz: TimeZone>(
    entries: &[MoodEntry],
    tz: &Tz,
    thresholds: &TrendThresholds,
) -> MoodAnalytics {
    let mut chronological: Vec<&MoodEntry> = entries.iter().collect();
    chronological.sort_by_key(|e| e.timestamp);

    let intensities: Vec<i64> = chronological.iter().map(|e| e.intensity).collect();
    let average = mean(&intensities);
    let std_dev = population_std_dev(&intensities, average);

    let counts = mood_counts(chronological.iter().map(|e| e.mood.as_str()));
    let summary = MoodSummary {
        most_common_mood: most_common(&counts).unwrap_or_else(|| "neutral".to_string()),
        average_intensity: round_to(average, 2),
        standard_deviation: round_to(std_dev, 2),
        variability: Variability::from_std_dev(std_dev, thresholds),
        trend: shift_trend(&intensities, thresholds),
        total_entries: chronological.len(),
    };

    let moods = chronological
        .iter()
        .map(|e| MoodPoint {
            id: e.id.to_hex(),
            mood: crate::scale::normalize(&e.mood),
            intensity: e.intensity,
            note: e.note.clone(),
            timestamp: e.timestamp.to_chrono(),
        })
        .collect();

    MoodAnalytics {
        moods,
        summary,
        distribution: distribution(&counts),
        calendar: calendar(&chronological, tz),
    }
}

/// Counts sorted by count descending, then label
pub fn distribution(counts: &BTreeMap<String, usize>) -> Vec<DistributionEntry> {
    let total: usize = counts.values().sum();
    let mut distribution: Vec<DistributionEntry> = counts
        .iter()
        .map(|(mood, &count)| DistributionEntry {
            mood: mood.clone(),
            count,
            percentage: round_to(count as f64 * 100.0 / total as f64, 1),
        })
        .collect();
    // Stable sort keeps the alphabetical order of the map for equal counts
    distribution.sort_by(|a, b| b.count.cmp(&a.count));
    distribution
}

fn calendar<Tz: TimeZone>(chronological: &[&MoodEntry], tz: &Tz) -> Vec<CalendarDay> {
    let mut days: BTreeMap<NaiveDate, CalendarDay> = BTreeMap::new();

    for entry in chronological {
        let date = entry.timestamp.to_chrono().with_timezone(tz).date_naive();
        days.entry(date)
            .and_modify(|day| {
                day.count += 1;
                if entry.intensity > day.intensity {
                    day.mood = crate::scale::normalize(&entry.mood);
                    day.intensity = entry.intensity;
                }
            })
            .or_insert_with(|| CalendarDay {
                date,
                mood: crate::scale::normalize(&entry.mood),
                intensity: entry.intensity,
                count: 1,
            });
    }

    days.into_values().collect()
}

fn population_std_dev(values: &[i64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
