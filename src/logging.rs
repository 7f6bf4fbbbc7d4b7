use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::models::Category;

pub const LOG_LEVEL_ENV: &str = "PICTOTALK_LOG_LEVEL";

/// Domain event for logging and debugging
#[derive(Debug, Clone)]
pub struct AppEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: AppEventType,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEventType {
    PictogramCreated,
    PictogramDeleted,
    PictogramsRefreshed,
    PlaybackStarted,
    PlaybackPaused,
    PlaybackResumed,
    PlaybackStopped,
    PlaybackCompleted,
    PlaybackSuperseded,
    GenreCreated,
    GenreDeleted,
    SongAdded,
    SongDeleted,
    OperationFailed,
}

impl AppEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppEventType::PictogramCreated => "PICTOGRAM_CREATED",
            AppEventType::PictogramDeleted => "PICTOGRAM_DELETED",
            AppEventType::PictogramsRefreshed => "PICTOGRAMS_REFRESHED",
            AppEventType::PlaybackStarted => "PLAYBACK_STARTED",
            AppEventType::PlaybackPaused => "PLAYBACK_PAUSED",
            AppEventType::PlaybackResumed => "PLAYBACK_RESUMED",
            AppEventType::PlaybackStopped => "PLAYBACK_STOPPED",
            AppEventType::PlaybackCompleted => "PLAYBACK_COMPLETED",
            AppEventType::PlaybackSuperseded => "PLAYBACK_SUPERSEDED",
            AppEventType::GenreCreated => "GENRE_CREATED",
            AppEventType::GenreDeleted => "GENRE_DELETED",
            AppEventType::SongAdded => "SONG_ADDED",
            AppEventType::SongDeleted => "SONG_DELETED",
            AppEventType::OperationFailed => "OPERATION_FAILED",
        }
    }
}

/// Logger for store and playback operations, keeping a ring of recent events
#[derive(Clone)]
pub struct AppLogger {
    events: Arc<Mutex<VecDeque<AppEvent>>>,
    max_events: usize,
}

impl AppLogger {
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            max_events,
        }
    }

    /// Initialize logging system with appropriate log level
    pub fn init() -> Result<(), Box<dyn std::error::Error>> {
        let log_level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "warn".to_string());

        let mut builder = env_logger::Builder::new();

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] [{}] {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        });

        builder.filter_level(parse_level(&log_level));
        builder.try_init()?;

        info!("Logging initialized with level: {}", log_level);
        Ok(())
    }

    fn events(&self) -> MutexGuard<'_, VecDeque<AppEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record an event and forward it to the `log` facade
    pub fn log_event(&self, event_type: AppEventType, details: String) {
        match event_type {
            AppEventType::PlaybackSuperseded | AppEventType::PlaybackCompleted => {
                debug!("[{}] {}", event_type.as_str(), details);
            }
            AppEventType::OperationFailed => {
                error!("[{}] {}", event_type.as_str(), details);
            }
            _ => {
                info!("[{}] {}", event_type.as_str(), details);
            }
        }

        let mut events = self.events();
        events.push_back(AppEvent {
            timestamp: Utc::now(),
            event_type,
            details,
        });
        while events.len() > self.max_events {
            events.pop_front();
        }
    }

    pub fn log_pictogram_created(&self, name: &str, category: Category) {
        self.log_event(
            AppEventType::PictogramCreated,
            format!("Created pictogram '{}' in {}", name, category),
        );
    }

    pub fn log_pictogram_deleted(&self, name: &str) {
        self.log_event(AppEventType::PictogramDeleted, format!("Deleted pictogram '{}'", name));
    }

    pub fn log_pictograms_refreshed(&self, user_count: usize, elapsed: Duration) {
        self.log_event(
            AppEventType::PictogramsRefreshed,
            format!("Found {} user pictograms in {:.2}ms", user_count, elapsed.as_secs_f64() * 1000.0),
        );
    }

    pub fn log_playback_started(&self, source: &str) {
        self.log_event(AppEventType::PlaybackStarted, format!("Started playing: {}", source));
    }

    pub fn log_playback_paused(&self, position: Duration) {
        self.log_event(
            AppEventType::PlaybackPaused,
            format!("Playback paused at position: {:.2}s", position.as_secs_f64()),
        );
    }

    pub fn log_playback_resumed(&self, position: Duration) {
        self.log_event(
            AppEventType::PlaybackResumed,
            format!("Playback resumed at position: {:.2}s", position.as_secs_f64()),
        );
    }

    pub fn log_playback_stopped(&self, reason: &str) {
        self.log_event(AppEventType::PlaybackStopped, format!("Playback stopped: {}", reason));
    }

    pub fn log_playback_completed(&self, source: &str) {
        self.log_event(AppEventType::PlaybackCompleted, format!("Finished playing: {}", source));
    }

    pub fn log_playback_superseded(&self, source: &str) {
        self.log_event(
            AppEventType::PlaybackSuperseded,
            format!("Abandoned load of '{}' after a newer request", source),
        );
    }

    pub fn log_genre_created(&self, genre: &str) {
        self.log_event(AppEventType::GenreCreated, format!("Created genre '{}'", genre));
    }

    pub fn log_genre_deleted(&self, genre: &str, songs: usize) {
        self.log_event(
            AppEventType::GenreDeleted,
            format!("Deleted genre '{}' with {} songs", genre, songs),
        );
    }

    pub fn log_song_added(&self, genre: &str, file_name: &str) {
        self.log_event(AppEventType::SongAdded, format!("Added '{}' to '{}'", file_name, genre));
    }

    pub fn log_song_deleted(&self, genre: &str, file_name: &str) {
        self.log_event(AppEventType::SongDeleted, format!("Removed '{}' from '{}'", file_name, genre));
    }

    pub fn log_operation_failed(&self, operation: &str, error: &dyn std::fmt::Display) {
        self.log_event(AppEventType::OperationFailed, format!("{} failed: {}", operation, error));
    }

    /// Get recent events, oldest first
    pub fn recent_events(&self, count: usize) -> Vec<AppEvent> {
        let events = self.events();
        let skip = events.len().saturating_sub(count);
        events.iter().skip(skip).cloned().collect()
    }

    pub fn count_events(&self, event_type: AppEventType) -> usize {
        self.events().iter().filter(|e| e.event_type == event_type).count()
    }

    pub fn clear_events(&self) {
        self.events().clear();
    }
}

impl Default for AppLogger {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_level(level: &str) -> log::LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        "off" => log::LevelFilter::Off,
        _ => log::LevelFilter::Info,
    }
}

/// Timer utility for measuring operation durations
pub struct OperationTimer {
    start_time: Instant,
    operation_name: &'static str,
}

impl OperationTimer {
    pub fn new(operation_name: &'static str) -> Self {
        Self {
            start_time: Instant::now(),
            operation_name,
        }
    }

    pub fn finish_with_threshold(self, threshold: Duration) -> Duration {
        let duration = self.start_time.elapsed();
        if duration > threshold {
            warn!(
                "Operation '{}' took {:.2}ms (threshold: {}ms)",
                self.operation_name,
                duration.as_secs_f64() * 1000.0,
                threshold.as_millis()
            );
        }
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_creation() {
        let logger = AppLogger::new();
        assert_eq!(logger.max_events, 1000);
        assert!(logger.recent_events(10).is_empty());
    }

    #[test]
    fn test_log_event() {
        let logger = AppLogger::new();
        logger.log_event(AppEventType::PlaybackStarted, "Test playback".to_string());

        let events = logger.recent_events(1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].details, "Test playback");
        assert_eq!(events[0].event_type, AppEventType::PlaybackStarted);
    }

    #[test]
    fn test_event_history_limit() {
        let logger = AppLogger::with_capacity(3);
        for i in 0..5 {
            logger.log_event(AppEventType::SongAdded, format!("Event {}", i));
        }

        let events = logger.recent_events(10);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].details, "Event 2");
        assert_eq!(events[2].details, "Event 4");
    }

    #[test]
    fn test_clones_share_history() {
        let logger = AppLogger::new();
        let clone = logger.clone();
        clone.log_genre_created("Banda");

        assert_eq!(logger.count_events(AppEventType::GenreCreated), 1);
        logger.clear_events();
        assert!(clone.recent_events(5).is_empty());
    }

    #[test]
    fn test_specific_log_methods() {
        let logger = AppLogger::new();

        logger.log_pictogram_created("Hola!", Category::Personalizados);
        logger.log_pictogram_deleted("Hola!");
        logger.log_playback_started("builtin:sounds/si.mp3");
        logger.log_playback_paused(Duration::from_secs(1));
        logger.log_playback_stopped("user request");
        logger.log_genre_deleted("Banda", 2);

        let events = logger.recent_events(10);
        let types: Vec<_> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(
            types,
            vec![
                "PICTOGRAM_CREATED",
                "PICTOGRAM_DELETED",
                "PLAYBACK_STARTED",
                "PLAYBACK_PAUSED",
                "PLAYBACK_STOPPED",
                "GENRE_DELETED",
            ]
        );
        assert!(events[0].details.contains("Personalizados"));
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), log::LevelFilter::Debug);
        assert_eq!(parse_level("warn"), log::LevelFilter::Warn);
        assert_eq!(parse_level("bogus"), log::LevelFilter::Info);
    }
}
