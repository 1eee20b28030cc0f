use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Ordered mood → intensity table.
///
/// Every ranking and averaging in the crate goes through one `MoodScale`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodScale {
    moods: Vec<ScaleEntry>,
    /// Intensity used for labels missing from `moods`
    default_intensity: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleEntry {
    pub mood: String,
    pub intensity: i64,
}

impl Default for MoodScale {
    fn default() -> Self {
        let moods = [
            ("excited", 5),
            ("happy", 4),
            ("content", 3),
            ("neutral", 2),
            ("tired", 1),
            ("anxious", 0),
            ("sad", -1),
            ("angry", -2),
        ]
        .into_iter()
        .map(|(mood, intensity)| ScaleEntry {
            mood: mood.to_string(),
            intensity,
        })
        .collect();

        MoodScale {
            moods,
            default_intensity: 2,
        }
    }
}

impl MoodScale {
    /// Parses a scale from JSON:
    ///
    /// ```json
    /// { "moods": [{ "mood": "happy", "intensity": 4 }], "defaultIntensity": 2 }
    /// ```
    ///
    /// Labels are normalised; duplicates and empty labels are rejected.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let mut scale: MoodScale = serde_json::from_str(json)?;

        if scale.moods.is_empty() {
            return Err(Error::InvalidScale("mood scale has no moods".into()));
        }

        for entry in scale.moods.iter_mut() {
            entry.mood = normalize(&entry.mood);
        }
        for (i, entry) in scale.moods.iter().enumerate() {
            if entry.mood.is_empty() {
                return Err(Error::InvalidScale(format!(
                    "mood at position {i} has an empty label"
                )));
            }
            if scale.moods[..i].iter().any(|e| e.mood == entry.mood) {
                return Err(Error::InvalidScale(format!(
                    "mood '{}' is listed more than once",
                    entry.mood
                )));
            }
        }

        Ok(scale)
    }

    /// Intensity of `mood`, or the scale default for unknown labels
    pub fn intensity(&self, mood: &str) -> i64 {
        self.lookup(mood).unwrap_or(self.default_intensity)
    }

    pub fn lookup(&self, mood: &str) -> Option<i64> {
        let mood = normalize(mood);
        self.moods
            .iter()
            .find(|e| e.mood == mood)
            .map(|e| e.intensity)
    }

    pub fn contains(&self, mood: &str) -> bool {
        self.lookup(mood).is_some()
    }

    pub fn default_intensity(&self) -> i64 {
        self.default_intensity
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.moods.iter().map(|e| e.mood.as_str())
    }

    /// Lowest to highest intensity the scale can produce, default included
    pub fn bounds(&self) -> RangeInclusive<i64> {
        let intensities = self
            .moods
            .iter()
            .map(|e| e.intensity)
            .chain([self.default_intensity]);
        let min = intensities.clone().min().unwrap_or(self.default_intensity);
        let max = intensities.max().unwrap_or(self.default_intensity);
        min..=max
    }
}

/// Canonical form of a mood label: trimmed and lowercase
pub fn normalize(mood: &str) -> String {
    mood.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scale_orders_excited_to_angry() {
        let scale = MoodScale::default();
        let labels: Vec<&str> = scale.labels().collect();
        assert_eq!(
            labels,
            [
                "excited", "happy", "content", "neutral", "tired", "anxious", "sad", "angry"
            ]
        );
        assert_eq!(scale.intensity("excited"), 5);
        assert_eq!(scale.intensity("angry"), -2);
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        let scale = MoodScale::default();
        assert_eq!(scale.lookup("  Happy "), Some(4));
        assert!(scale.contains("SAD"));
    }

    #[test]
    fn unknown_labels_fall_back_to_neutral_intensity() {
        let scale = MoodScale::default();
        assert_eq!(scale.lookup("melancholic"), None);
        assert_eq!(scale.intensity("melancholic"), 2);
        assert_eq!(scale.intensity("melancholic"), scale.intensity("neutral"));
    }

    #[test]
    fn scale_can_be_loaded_from_json() {
        let scale = MoodScale::from_json(
            r#"{
                "moods": [
                    { "mood": "Happy", "intensity": 2 },
                    { "mood": "calm", "intensity": 1 },
                    { "mood": "sad", "intensity": -2 }
                ],
                "defaultIntensity": 0
            }"#,
        )
        .unwrap();

        assert_eq!(scale.intensity("happy"), 2);
        assert_eq!(scale.intensity("calm"), 1);
        assert_eq!(scale.intensity("excited"), 0);
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let res = MoodScale::from_json(
            r#"{
                "moods": [
                    { "mood": "happy", "intensity": 2 },
                    { "mood": " HAPPY", "intensity": 1 }
                ],
                "defaultIntensity": 0
            }"#,
        );
        assert!(matches!(res, Err(Error::InvalidScale(_))));
    }

    #[test]
    fn bounds_cover_every_intensity() {
        assert_eq!(MoodScale::default().bounds(), -2..=5);

        let scale = MoodScale::from_json(
            r#"{ "moods": [{ "mood": "calm", "intensity": 1 }], "defaultIntensity": 3 }"#,
        )
        .unwrap();
        assert_eq!(scale.bounds(), 1..=3);
        assert!(!scale.bounds().contains(&1000));
    }

    #[test]
    fn empty_scale_is_rejected() {
        let res = MoodScale::from_json(r#"{ "moods": [], "defaultIntensity": 0 }"#);
        assert!(matches!(res, Err(Error::InvalidScale(_))));
    }
}
