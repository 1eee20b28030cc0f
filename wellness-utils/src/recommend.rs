use crate::scale::normalize;

/// Categories shown when a mood has no mapping
pub const FALLBACK_CATEGORIES: &[&str] = &["mindfulness", "relaxation"];

const MOOD_CATEGORIES: &[(&str, &[&str])] = &[
    ("excited", &["motivation", "positive", "energy", "inspiration"]),
    ("happy", &["motivation", "positive", "energy", "inspiration"]),
    ("content", &["mindfulness", "nature", "wellbeing", "relaxation"]),
    ("neutral", &["mindfulness", "nature", "wellbeing", "relaxation"]),
    ("tired", &["energy", "relaxation", "sleep", "meditation"]),
    ("anxious", &["calming", "relaxation", "mindfulness", "self-care"]),
    ("sad", &["uplift", "comfort", "self-care", "mindfulness"]),
    (
        "angry",
        &["calming", "emotional-control", "emotional-release", "meditation"],
    ),
];

/// Video categories suited to `mood`
pub fn categories_for_mood(mood: &str) -> &'static [&'static str] {
    let mood = normalize(mood);
    MOOD_CATEGORIES
        .iter()
        .find(|(m, _)| *m == mood)
        .map(|(_, categories)| *categories)
        .unwrap_or(FALLBACK_CATEGORIES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::MoodScale;

    #[test]
    fn every_scale_mood_has_categories() {
        let scale = MoodScale::default();
        for mood in scale.labels() {
            assert_ne!(
                categories_for_mood(mood),
                FALLBACK_CATEGORIES,
                "{mood} has no categories"
            );
        }
    }

    #[test]
    fn sad_maps_to_uplifting_content() {
        assert!(categories_for_mood(" Sad").contains(&"uplift"));
        assert!(categories_for_mood("angry").contains(&"calming"));
    }

    #[test]
    fn unknown_mood_falls_back() {
        assert_eq!(categories_for_mood("bored"), FALLBACK_CATEGORIES);
    }
}
