use std::collections::{BTreeMap, BTreeSet};

use bson::DateTime;
use chrono::{NaiveDate, TimeZone, Timelike};
use schema::{ActivityEvent, ActivityKind, MoodEntry};
use serde::Serialize;

use crate::{
    analytics::{MoodAnalytics, round_to},
    scale::{MoodScale, normalize},
    trend::{Trend, mean},
};

/// Part of the day an entry was logged in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 4] = [
        TimeOfDay::Morning,
        TimeOfDay::Afternoon,
        TimeOfDay::Evening,
        TimeOfDay::Night,
    ];

    /// Morning 05-11, afternoon 12-16, evening 17-20, night 21-04
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    fn phrase(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "in the morning",
            TimeOfDay::Afternoon => "in the afternoon",
            TimeOfDay::Evening => "in the evening",
            TimeOfDay::Night => "at night",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeOfDaySlot {
    pub time: TimeOfDay,
    /// Entries per mood label
    #[serde(flatten)]
    pub counts: BTreeMap<String, usize>,
}

/// Mood counts per part of the day, always all four slots in day order.
pub fn mood_by_time_of_day<Tz: TimeZone>(entries: &[MoodEntry], tz: &Tz) -> Vec<TimeOfDaySlot> {
    let mut slots: Vec<TimeOfDaySlot> = TimeOfDay::ALL
        .iter()
        .map(|&time| TimeOfDaySlot {
            time,
            counts: BTreeMap::new(),
        })
        .collect();

    for entry in entries {
        let hour = entry.timestamp.to_chrono().with_timezone(tz).hour();
        let slot = &mut slots[TimeOfDay::from_hour(hour) as usize];
        *slot.counts.entry(normalize(&entry.mood)).or_insert(0) += 1;
    }
    slots
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityImpact {
    pub name: String,
    /// Percentage of this activity's days whose mean intensity beat the window mean
    pub positive_impact: f64,
    /// Days with both this activity and at least one mood entry
    pub days: usize,
}

// Bookkeeping events that say nothing about what the user did for their mood
fn is_passive(kind: &ActivityKind) -> bool {
    matches!(
        kind,
        ActivityKind::Login | ActivityKind::DashboardVisit | ActivityKind::MoodLog
    )
}

fn day_of<Tz: TimeZone>(timestamp: DateTime, tz: &Tz) -> NaiveDate {
    timestamp.to_chrono().with_timezone(tz).date_naive()
}

/// How often days with a given activity were better than average.
///
/// Sorted by impact descending, then name.
pub fn activity_correlation<Tz: TimeZone>(
    moods: &[MoodEntry],
    activities: &[ActivityEvent],
    tz: &Tz,
) -> Vec<ActivityImpact> {
    let mut by_day: BTreeMap<NaiveDate, Vec<i64>> = BTreeMap::new();
    for entry in moods {
        by_day
            .entry(day_of(entry.timestamp, tz))
            .or_default()
            .push(entry.intensity);
    }
    if by_day.is_empty() {
        return Vec::new();
    }

    let intensities: Vec<i64> = moods.iter().map(|e| e.intensity).collect();
    let overall = mean(&intensities);
    let day_means: BTreeMap<NaiveDate, f64> = by_day
        .into_iter()
        .map(|(day, values)| (day, mean(&values)))
        .collect();

    let mut days_by_kind: BTreeMap<String, BTreeSet<NaiveDate>> = BTreeMap::new();
    for event in activities.iter().filter(|e| !is_passive(&e.activity_type)) {
        let day = day_of(event.timestamp, tz);
        if day_means.contains_key(&day) {
            days_by_kind
                .entry(event.activity_type.to_string())
                .or_default()
                .insert(day);
        }
    }

    let mut impacts: Vec<ActivityImpact> = days_by_kind
        .into_iter()
        .map(|(name, days)| {
            let better = days.iter().filter(|&d| day_means[d] > overall).count();
            ActivityImpact {
                name,
                positive_impact: round_to(better as f64 * 100.0 / days.len() as f64, 1),
                days: days.len(),
            }
        })
        .collect();
    impacts.sort_by(|a, b| b.positive_impact.total_cmp(&a.positive_impact));
    impacts
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    NoData,
    MostCommonMood,
    Trend,
    Variability,
    TimeOfDay,
    Activity,
    NegativeMoods,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
}

impl Insight {
    fn new(kind: InsightKind, message: impl Into<String>) -> Self {
        Insight {
            kind,
            message: message.into(),
        }
    }
}

/// Plain-language observations about a window of moods.
///
/// Moods above the scale default count as positive; moods two or more below
/// it count as negative.
pub fn insights(
    analytics: &MoodAnalytics,
    time_of_day: &[TimeOfDaySlot],
    impacts: &[ActivityImpact],
    scale: &MoodScale,
) -> Vec<Insight> {
    let summary = &analytics.summary;
    if summary.total_entries == 0 {
        return vec![Insight::new(
            InsightKind::NoData,
            "Log a few moods to start seeing insights about your wellbeing.",
        )];
    }

    let mut insights = vec![Insight::new(
        InsightKind::MostCommonMood,
        format!("Your most common mood was {}.", summary.most_common_mood),
    )];

    let trend = match summary.trend {
        Trend::Improving => "Your mood has been improving over this period.",
        Trend::Declining => {
            "Your mood has been declining over this period. Consider reaching out to someone you trust."
        }
        _ => "Your mood has been stable over this period.",
    };
    insights.push(Insight::new(InsightKind::Trend, trend));

    insights.push(Insight::new(
        InsightKind::Variability,
        format!(
            "Your mood variability is {} with an average intensity of {:.1}.",
            summary.variability.as_str(),
            summary.average_intensity
        ),
    ));

    let neutral = scale.default_intensity();
    let best_slot = time_of_day
        .iter()
        .map(|slot| {
            let positive: usize = slot
                .counts
                .iter()
                .filter(|(mood, _)| scale.intensity(mood) > neutral)
                .map(|(_, count)| count)
                .sum();
            (slot.time, positive)
        })
        .filter(|&(_, positive)| positive > 0)
        .fold(None::<(TimeOfDay, usize)>, |best, slot| match best {
            Some(b) if b.1 >= slot.1 => Some(b),
            _ => Some(slot),
        });
    if let Some((time, _)) = best_slot {
        insights.push(Insight::new(
            InsightKind::TimeOfDay,
            format!("Your mood tends to be most positive {}.", time.phrase()),
        ));
    }

    if let Some(impact) = impacts.iter().find(|i| i.positive_impact > 50.0) {
        insights.push(Insight::new(
            InsightKind::Activity,
            format!(
                "Days with {} activity were better than average {}% of the time.",
                impact.name.replace('_', " "),
                impact.positive_impact
            ),
        ));
    }

    let negative: usize = analytics
        .distribution
        .iter()
        .filter(|d| scale.intensity(&d.mood) <= neutral - 2)
        .map(|d| d.count)
        .sum();
    if negative * 3 > summary.total_entries {
        insights.push(Insight::new(
            InsightKind::NegativeMoods,
            "Difficult moods made up more than a third of your entries. Gentle routines like a short walk or a calming video might help.",
        ));
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analytics::mood_analytics, trend::TrendThresholds, trend::tests::entry};
    use bson::oid::ObjectId;
    use chrono::Utc;

    // 2025-03-10 09:46:40 UTC minus `minutes_ago`
    const BASE_MS: i64 = 1_741_600_000_000;

    fn event(kind: ActivityKind, minutes_ago: i64) -> ActivityEvent {
        ActivityEvent {
            id: ObjectId::new(),
            username: "journaler".to_string(),
            activity_type: kind,
            timestamp: DateTime::from_millis(BASE_MS - minutes_ago * 60_000),
        }
    }

    const DAY: i64 = 24 * 60;

    #[test]
    fn hours_map_to_parts_of_day() {
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(21), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(4), TimeOfDay::Night);
    }

    #[test]
    fn moods_are_bucketed_by_local_hour() {
        // 09:46 and 06:46 UTC, then 23:46 UTC the day before
        let entries = [
            entry("happy", 0),
            entry("Happy", 3 * 60),
            entry("sad", 10 * 60),
        ];
        let slots = mood_by_time_of_day(&entries, &Utc);
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0].time, TimeOfDay::Morning);
        assert_eq!(slots[0].counts.get("happy"), Some(&2));
        assert!(slots[1].counts.is_empty());
        assert_eq!(slots[3].counts.get("sad"), Some(&1));

        // Same instants seen from UTC+3 move the morning entries to the afternoon
        let tz = chrono::FixedOffset::east_opt(3 * 3600).unwrap();
        let shifted = mood_by_time_of_day(&entries, &tz);
        assert_eq!(shifted[1].counts.get("happy"), Some(&1));
    }

    #[test]
    fn time_of_day_serializes_flat() {
        let slots = mood_by_time_of_day(&[entry("content", 0)], &Utc);
        let json = serde_json::to_value(&slots[0]).unwrap();
        assert_eq!(json, serde_json::json!({ "time": "Morning", "content": 1 }));
    }

    #[test]
    fn journaling_days_beat_the_average() {
        let moods = [
            entry("happy", 0),
            entry("excited", DAY),
            entry("sad", 2 * DAY),
            entry("angry", 3 * DAY),
        ];
        let activities = [
            event(ActivityKind::Journal, 1),
            event(ActivityKind::Journal, DAY + 1),
            event(ActivityKind::VideoView, 2 * DAY + 1),
            event(ActivityKind::VideoView, DAY + 2),
            event(ActivityKind::Login, 3 * DAY + 1),
            event(ActivityKind::MoodLog, 3 * DAY + 2),
            // No mood that day
            event(ActivityKind::Journal, 9 * DAY),
        ];
        let impacts = activity_correlation(&moods, &activities, &Utc);

        assert_eq!(impacts.len(), 2);
        assert_eq!(impacts[0].name, "journal");
        assert_eq!(impacts[0].positive_impact, 100.0);
        assert_eq!(impacts[0].days, 2);
        assert_eq!(impacts[1].name, "video_view");
        assert_eq!(impacts[1].positive_impact, 50.0);
    }

    #[test]
    fn correlation_without_moods_is_empty() {
        let activities = [event(ActivityKind::Journal, 0)];
        assert!(activity_correlation(&[], &activities, &Utc).is_empty());
    }

    #[test]
    fn empty_window_has_a_single_no_data_insight() {
        let analytics = mood_analytics(&[], &Utc, &TrendThresholds::default());
        let insights = insights(&analytics, &[], &[], &MoodScale::default());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::NoData);
    }

    #[test]
    fn insights_cover_trend_time_and_activity() {
        let moods = [
            entry("sad", 3 * DAY),
            entry("angry", 2 * DAY),
            entry("happy", DAY),
            entry("excited", 0),
        ];
        let scale = MoodScale::default();
        let analytics = mood_analytics(&moods, &Utc, &TrendThresholds::default());
        let slots = mood_by_time_of_day(&moods, &Utc);
        let impacts = activity_correlation(&moods, &[event(ActivityKind::Journal, 1)], &Utc);

        let insights = insights(&analytics, &slots, &impacts, &scale);
        let kinds: Vec<InsightKind> = insights.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            [
                InsightKind::MostCommonMood,
                InsightKind::Trend,
                InsightKind::Variability,
                InsightKind::TimeOfDay,
                InsightKind::Activity,
                InsightKind::NegativeMoods,
            ]
        );
        assert!(insights[1].message.contains("improving"));
        assert!(insights[2].message.contains("high"));
        assert!(insights[3].message.ends_with("in the morning."));
        assert!(insights[4].message.contains("journal"));
    }
}
