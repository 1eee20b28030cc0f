use std::collections::BTreeMap;

use schema::MoodEntry;
use serde::Serialize;

use crate::scale::{MoodScale, normalize};

/// Number of labels returned in `MoodTrend::recent_moods`
pub const RECENT_MOODS: usize = 5;

/// Direction of a user's mood.
///
/// `Mood` carries the most common label when no direction stands out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum Trend {
    Improving,
    Declining,
    Fluctuating,
    Stable,
    /// No data in the window
    Neutral,
    Mood(String),
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Improving => f.write_str("improving"),
            Trend::Declining => f.write_str("declining"),
            Trend::Fluctuating => f.write_str("fluctuating"),
            Trend::Stable => f.write_str("stable"),
            Trend::Neutral => f.write_str("neutral"),
            Trend::Mood(mood) => f.write_str(mood),
        }
    }
}

impl From<Trend> for String {
    fn from(trend: Trend) -> Self {
        trend.to_string()
    }
}

/// Thresholds shared by every trend and variability classification.
#[derive(Clone, Debug, PartialEq)]
pub struct TrendThresholds {
    /// Minimum rank spread among the three newest entries to call them fluctuating
    pub fluctuation_spread: i64,
    /// Minimum change in mean intensity between window halves to call a direction
    pub shift: f64,
    /// Standard deviations below this are low variability
    pub low_variability: f64,
    /// Standard deviations above this are high variability
    pub high_variability: f64,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        TrendThresholds {
            fluctuation_spread: 3,
            shift: 0.5,
            low_variability: 0.7,
            high_variability: 1.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodTrend {
    pub trend: Trend,
    pub description: String,
    pub most_common_mood: String,
    /// Newest first
    pub recent_moods: Vec<String>,
}

impl MoodTrend {
    pub fn no_data() -> Self {
        MoodTrend {
            trend: Trend::Neutral,
            description: "No recent mood data".to_string(),
            most_common_mood: "neutral".to_string(),
            recent_moods: vec![],
        }
    }
}

/// Classifies the entries of a trailing window.
///
/// Entries may be passed in any order. The three newest entries are ranked on
/// `scale`: strictly rising towards the newest is improving, strictly falling
/// is declining, a spread of at least `fluctuation_spread` is fluctuating.
/// Anything else, or fewer than three entries, reports the most common mood.
pub fn mood_trend(
    entries: &[MoodEntry],
    scale: &MoodScale,
    thresholds: &TrendThresholds,
) -> MoodTrend {
    if entries.is_empty() {
        return MoodTrend::no_data();
    }

    let newest_first = newest_first(entries);
    let counts = mood_counts(entries.iter().map(|e| e.mood.as_str()));
    let most_common_mood = most_common(&counts).unwrap_or_else(|| "neutral".to_string());
    let recent_moods: Vec<String> = newest_first
        .iter()
        .take(RECENT_MOODS)
        .map(|e| normalize(&e.mood))
        .collect();

    let ranks: Vec<i64> = newest_first
        .iter()
        .take(3)
        .map(|e| scale.intensity(&e.mood))
        .collect();

    let (trend, description) = if let [r0, r1, r2] = ranks[..] {
        let spread = r0.max(r1).max(r2) - r0.min(r1).min(r2);
        if r0 > r1 && r1 > r2 {
            (Trend::Improving, "Your mood has been improving".to_string())
        } else if r0 < r1 && r1 < r2 {
            (Trend::Declining, "Your mood has been declining".to_string())
        } else if spread >= thresholds.fluctuation_spread {
            (
                Trend::Fluctuating,
                "Your mood has been up and down".to_string(),
            )
        } else {
            (
                Trend::Mood(most_common_mood.clone()),
                format!("mostly {most_common_mood}"),
            )
        }
    } else {
        (
            Trend::Mood(most_common_mood.clone()),
            format!("recent mood: {most_common_mood}"),
        )
    };

    tracing::trace!(%trend, entries = entries.len(), "classified mood trend");

    MoodTrend {
        trend,
        description,
        most_common_mood,
        recent_moods,
    }
}

/// Compares mean intensity of the older and newer halves of a chronological series.
///
/// The older half is the first `len / 2` values. Fewer than two values are stable.
pub fn shift_trend(chronological: &[i64], thresholds: &TrendThresholds) -> Trend {
    if chronological.len() < 2 {
        return Trend::Stable;
    }
    let (older, newer) = chronological.split_at(chronological.len() / 2);
    let difference = mean(newer) - mean(older);

    if difference > thresholds.shift {
        Trend::Improving
    } else if difference < -thresholds.shift {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Occurrences of each normalised label
pub fn mood_counts<'a>(moods: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for mood in moods {
        *counts.entry(normalize(mood)).or_insert(0) += 1;
    }
    counts
}

/// Label with the highest count; ties go to the alphabetically first label
pub fn most_common(counts: &BTreeMap<String, usize>) -> Option<String> {
    let mut best: Option<(&String, usize)> = None;
    for (mood, &count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((mood, count));
        }
    }
    best.map(|(mood, _)| mood.clone())
}

pub(crate) fn mean(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

fn newest_first(entries: &[MoodEntry]) -> Vec<&MoodEntry> {
    let mut sorted: Vec<&MoodEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted
}
