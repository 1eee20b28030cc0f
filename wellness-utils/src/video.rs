use std::collections::{BTreeMap, BTreeSet};

use bson::oid::ObjectId;
use chrono::{Days, NaiveDate, TimeZone};
use schema::{InteractionKind, Video, VideoInteraction};
use serde::Serialize;

use crate::{analytics::round_to, scale::normalize};

/// Days covered by `VideoAnalytics::watch_time_by_day`, today included
pub const WATCH_TIME_DAYS: u64 = 7;
/// Categories kept in `VideoAnalytics::most_watched_categories`
pub const TOP_CATEGORIES: usize = 5;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchTime {
    pub date: NaiveDate,
    pub minutes: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAnalytics {
    /// Distinct videos viewed or completed
    pub total_watched: usize,
    /// Percentage of watched videos that were completed
    pub completion_rate: f64,
    pub watch_time_by_day: Vec<WatchTime>,
    pub most_watched_categories: Vec<CategoryCount>,
}

fn video_ids(interactions: &[VideoInteraction], kind: InteractionKind) -> BTreeSet<ObjectId> {
    interactions
        .iter()
        .filter(|i| i.interaction_type == kind)
        .map(|i| i.video_id)
        .collect()
}

/// Summarises a user's watch history.
///
/// `videos` only needs to hold the documents referenced by `interactions`;
/// interactions for deleted videos still count as watched.
pub fn video_analytics<Tz: TimeZone>(
    interactions: &[VideoInteraction],
    videos: &[Video],
    tz: &Tz,
    today: NaiveDate,
) -> VideoAnalytics {
    let completed = video_ids(interactions, InteractionKind::Complete);
    let watched: BTreeSet<ObjectId> = video_ids(interactions, InteractionKind::View)
        .union(&completed)
        .copied()
        .collect();

    let completion_rate = if watched.is_empty() {
        0.0
    } else {
        round_to(completed.len() as f64 * 100.0 / watched.len() as f64, 1)
    };

    let mut seconds_by_day: BTreeMap<NaiveDate, u64> = (0..WATCH_TIME_DAYS)
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|day| (day, 0))
        .collect();
    for interaction in interactions {
        let Some(seconds) = interaction.watch_seconds else {
            continue;
        };
        let day = interaction
            .timestamp
            .to_chrono()
            .with_timezone(tz)
            .date_naive();
        if let Some(total) = seconds_by_day.get_mut(&day) {
            *total += u64::from(seconds);
        }
    }
    let watch_time_by_day = seconds_by_day
        .into_iter()
        .map(|(date, seconds)| WatchTime {
            date,
            minutes: round_to(seconds as f64 / 60.0, 1),
        })
        .collect();

    let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
    for video in videos.iter().filter(|v| watched.contains(&v.id)) {
        let categories: BTreeSet<String> = video.categories.iter().map(|c| normalize(c)).collect();
        for category in categories {
            *category_counts.entry(category).or_insert(0) += 1;
        }
    }
    let mut most_watched_categories: Vec<CategoryCount> = category_counts
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();
    most_watched_categories.sort_by(|a, b| b.count.cmp(&a.count));
    most_watched_categories.truncate(TOP_CATEGORIES);

    VideoAnalytics {
        total_watched: watched.len(),
        completion_rate,
        watch_time_by_day,
        most_watched_categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::DateTime;
    use chrono::Utc;

    // 2025-03-10 09:46:40 UTC
    const BASE_MS: i64 = 1_741_600_000_000;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn video(categories: &[&str]) -> Video {
        Video {
            id: ObjectId::new(),
            title: "Morning Stretch".to_string(),
            description: String::new(),
            youtube_id: "abc123".to_string(),
            thumbnail: String::new(),
            duration: "10:00".to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            tags: Vec::new(),
            mood_tags: Vec::new(),
            view_count: 0,
            like_count: 0,
            completion_count: 0,
            rating: 0.0,
            published_date: DateTime::from_millis(BASE_MS),
            active: true,
            creator: Default::default(),
        }
    }

    fn interaction(
        video: &Video,
        kind: InteractionKind,
        watch_seconds: Option<u32>,
        days_ago: i64,
    ) -> VideoInteraction {
        VideoInteraction {
            id: ObjectId::new(),
            username: "journaler".to_string(),
            video_id: video.id,
            interaction_type: kind,
            watch_seconds,
            timestamp: DateTime::from_millis(BASE_MS - days_ago * 86_400_000),
        }
    }

    #[test]
    fn no_history_is_zeroed_week() {
        let analytics = video_analytics(&[], &[], &Utc, today());
        assert_eq!(analytics.total_watched, 0);
        assert_eq!(analytics.completion_rate, 0.0);
        assert!(analytics.most_watched_categories.is_empty());
        assert_eq!(analytics.watch_time_by_day.len(), 7);
        assert!(analytics.watch_time_by_day.iter().all(|d| d.minutes == 0.0));
        assert_eq!(analytics.watch_time_by_day[6].date, today());
    }

    #[test]
    fn completion_rate_and_watch_time() {
        let calm = video(&["Relaxation", "mindfulness"]);
        let energy = video(&["energy", "relaxation"]);
        let unwatched = video(&["sleep"]);
        let interactions = [
            interaction(&calm, InteractionKind::View, Some(90), 0),
            interaction(&calm, InteractionKind::View, Some(30), 0),
            interaction(&calm, InteractionKind::Complete, None, 0),
            interaction(&energy, InteractionKind::View, Some(300), 2),
            interaction(&energy, InteractionKind::Like, None, 2),
            // Outside the week
            interaction(&energy, InteractionKind::View, Some(600), 20),
        ];
        let videos = [calm, energy, unwatched];
        let analytics = video_analytics(&interactions, &videos, &Utc, today());

        assert_eq!(analytics.total_watched, 2);
        assert_eq!(analytics.completion_rate, 50.0);
        assert_eq!(analytics.watch_time_by_day[6].minutes, 2.0);
        assert_eq!(analytics.watch_time_by_day[4].minutes, 5.0);
        let total: f64 = analytics.watch_time_by_day.iter().map(|d| d.minutes).sum();
        assert_eq!(total, 7.0);

        assert_eq!(
            analytics.most_watched_categories[0],
            CategoryCount {
                category: "relaxation".to_string(),
                count: 2
            }
        );
        assert_eq!(analytics.most_watched_categories.len(), 3);
        assert!(
            analytics
                .most_watched_categories
                .iter()
                .all(|c| c.category != "sleep")
        );
    }

    #[test]
    fn completion_without_a_view_still_counts_as_watched() {
        let calm = video(&["calming"]);
        let interactions = [interaction(&calm, InteractionKind::Complete, None, 1)];
        let analytics = video_analytics(&interactions, &[], &Utc, today());
        assert_eq!(analytics.total_watched, 1);
        assert_eq!(analytics.completion_rate, 100.0);
    }
}
