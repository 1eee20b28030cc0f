//! Wellness Analytics Utility Functions
//!
//! ## Current API
//!
//! - Rank mood labels on the canonical intensity scale
//! - Calculate activity streaks
//! - Classify recent mood trends
//! - Summarise mood history (variability, distribution, calendar)
//! - Break moods down by time of day and related activities
//! - Summarise watch history
//! - Export mood history as CSV
//! - Map moods to video categories
//!
pub mod analytics;
pub mod error;
pub mod export;
pub mod insights;
pub mod misc;
pub mod recommend;
pub mod scale;
pub mod streak;
pub mod trend;
pub mod video;
