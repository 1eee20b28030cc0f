use csv::Writer;

use crate::{analytics::MoodPoint, error::Error};

pub const CSV_HEADER: [&str; 4] = ["timestamp", "mood", "intensity", "note"];

/// Mood points as CSV, one row per entry in the given order
pub fn moods_csv(moods: &[MoodPoint]) -> Result<String, Error> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for point in moods {
        writer.write_record([
            point.timestamp.to_rfc3339(),
            point.mood.clone(),
            point.intensity.to_string(),
            point.note.clone().unwrap_or_default(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Csv(e.into_error().into()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analytics::mood_analytics, trend::TrendThresholds, trend::tests::entry};
    use chrono::Utc;

    #[test]
    fn empty_export_is_just_the_header() {
        assert_eq!(moods_csv(&[]).unwrap(), "timestamp,mood,intensity,note\n");
    }

    #[test]
    fn notes_with_commas_and_quotes_are_escaped() {
        let mut entries = [entry("happy", 1), entry("sad", 0)];
        entries[1].note = Some("long day, \"rough\" meeting".to_string());
        let analytics = mood_analytics(&entries, &Utc, &TrendThresholds::default());

        let csv = moods_csv(&analytics.moods).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with(",happy,4,"));
        assert!(lines[2].ends_with(",sad,-1,\"long day, \"\"rough\"\" meeting\""));
        assert!(lines[1].starts_with("2025-03-10T09:45:40"));
    }
}
