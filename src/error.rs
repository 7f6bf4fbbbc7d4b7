use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::capture::MediaKind;

/// Top-level error type surfaced at the screen boundary
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Pictogram error: {0}")]
    Pictogram(#[from] PictogramError),

    #[error("Music library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Command error: {0}")]
    Parse(#[from] crate::cli::ParseError),
}

impl AppError {
    /// Classify the error into the user-facing taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Pictogram(err) => err.kind(),
            AppError::Library(err) => err.kind(),
            AppError::Audio(_) => ErrorKind::Playback,
            AppError::Capture(err) => err.kind(),
            AppError::Storage(_) => ErrorKind::Storage,
            AppError::Config(_) => ErrorKind::Config,
            AppError::Parse(_) => ErrorKind::Validation,
        }
    }

    /// Get a user-friendly message for the error
    pub fn user_message(&self) -> String {
        match self {
            AppError::Pictogram(err) => err.user_message(),
            AppError::Library(err) => err.user_message(),
            AppError::Audio(err) => err.user_message(),
            AppError::Capture(err) => err.user_message(),
            AppError::Storage(err) => err.user_message(),
            AppError::Config(err) => err.user_message(),
            AppError::Parse(err) => format!("Command error: {}", err),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.kind().severity()
    }
}

/// User-facing error taxonomy shared by every subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Duplicate,
    LimitExceeded,
    ProtectedEntity,
    Storage,
    PermissionDenied,
    Cancelled,
    Playback,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Duplicate => "DUPLICATE",
            ErrorKind::LimitExceeded => "LIMIT_EXCEEDED",
            ErrorKind::ProtectedEntity => "PROTECTED_ENTITY",
            ErrorKind::Storage => "STORAGE",
            ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ErrorKind::Cancelled => "CANCELLED",
            ErrorKind::Playback => "PLAYBACK",
            ErrorKind::Config => "CONFIG",
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorKind::Cancelled => ErrorSeverity::Info,
            ErrorKind::Validation
            | ErrorKind::Duplicate
            | ErrorKind::LimitExceeded
            | ErrorKind::ProtectedEntity
            | ErrorKind::PermissionDenied => ErrorSeverity::Warning,
            ErrorKind::Storage | ErrorKind::Playback | ErrorKind::Config => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
}

impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "INFO",
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
        }
    }

    pub fn log_level(&self) -> log::Level {
        match self {
            ErrorSeverity::Info => log::Level::Info,
            ErrorSeverity::Warning => log::Level::Warn,
            ErrorSeverity::Error => log::Level::Error,
        }
    }
}

/// Filesystem and key-value persistence failures
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record under key '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            StorageError::Io { path, .. } => {
                format!("Could not access '{}' on device storage", path.display())
            }
            StorageError::Serialization { key, .. } => {
                format!("Saved data for '{}' is damaged and could not be read", key)
            }
        }
    }
}

/// Pictogram store errors
#[derive(Debug, Error)]
pub enum PictogramError {
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Name '{name}' has no usable characters for a file name")]
    EmptyStem { name: String },

    #[error("Category '{category}' can only be used as a filter")]
    FilterOnlyCategory { category: String },

    #[error("Pictogram already exists: {name}")]
    AlreadyExists { name: String },

    #[error("Built-in pictogram cannot be deleted: {name}")]
    Protected { name: String },

    #[error("Pictogram not found: {name}")]
    NotFound { name: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl PictogramError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PictogramError::MissingField { .. }
            | PictogramError::EmptyStem { .. }
            | PictogramError::FilterOnlyCategory { .. }
            | PictogramError::NotFound { .. } => ErrorKind::Validation,
            PictogramError::AlreadyExists { .. } => ErrorKind::Duplicate,
            PictogramError::Protected { .. } => ErrorKind::ProtectedEntity,
            PictogramError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            PictogramError::MissingField { field } => {
                format!("Please provide the pictogram {}", field)
            }
            PictogramError::EmptyStem { name } => {
                format!("'{}' must contain at least one letter or number", name)
            }
            PictogramError::FilterOnlyCategory { category } => {
                format!("Choose a specific category instead of '{}'", category)
            }
            PictogramError::AlreadyExists { name } => {
                format!("A pictogram named '{}' already exists", name)
            }
            PictogramError::Protected { name } => {
                format!("'{}' is a built-in pictogram and cannot be deleted", name)
            }
            PictogramError::NotFound { name } => {
                format!("There is no pictogram named '{}'", name)
            }
            PictogramError::Storage(err) => err.user_message(),
        }
    }
}

/// Music library errors
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Genre name is empty")]
    EmptyGenreName,

    #[error("Genre already exists: {name}")]
    GenreExists { name: String },

    #[error("Genre limit reached: at most {max} genres")]
    GenreLimit { max: usize },

    #[error("Genre not found: {name}")]
    GenreNotFound { name: String },

    #[error("Invalid song index: {index}")]
    InvalidIndex { index: usize },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl LibraryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LibraryError::EmptyGenreName
            | LibraryError::GenreNotFound { .. }
            | LibraryError::InvalidIndex { .. } => ErrorKind::Validation,
            LibraryError::GenreExists { .. } => ErrorKind::Duplicate,
            LibraryError::GenreLimit { .. } => ErrorKind::LimitExceeded,
            LibraryError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            LibraryError::EmptyGenreName => "The genre name cannot be empty".to_string(),
            LibraryError::GenreExists { name } => format!("The genre '{}' already exists", name),
            LibraryError::GenreLimit { max } => {
                format!("You cannot create more than {} genres", max)
            }
            LibraryError::GenreNotFound { name } => format!("There is no genre named '{}'", name),
            LibraryError::InvalidIndex { index } => {
                format!("Song number {} does not exist in this genre", index + 1)
            }
            LibraryError::Storage(err) => err.user_message(),
        }
    }
}

/// Audio playback errors
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Unknown built-in asset: {id}")]
    UnknownAsset { id: String },

    #[error("Sound source not found: {path}")]
    SourceNotFound { path: String },

    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Decode failed: {0}")]
    DecodeFailed(String),

    #[error("Output device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Stream error: {0}")]
    StreamError(String),
}

impl AudioError {
    pub fn user_message(&self) -> String {
        match self {
            AudioError::UnknownAsset { id } => {
                format!("The bundled sound '{}' is missing from this installation", id)
            }
            AudioError::SourceNotFound { path } => {
                format!("The sound file '{}' could not be found", path)
            }
            AudioError::UnsupportedFormat { format } => {
                format!("Audio format '{}' is not supported", format)
            }
            AudioError::DecodeFailed(_) => "The sound could not be decoded".to_string(),
            AudioError::DeviceUnavailable(_) => "No audio output is available".to_string(),
            AudioError::StreamError(msg) => format!("Audio playback interrupted: {}", msg),
        }
    }
}

/// Capture pipeline errors (file picker and microphone recorder)
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("No {kind} was selected")]
    Cancelled { kind: MediaKind },

    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),

    #[error("No recording in progress")]
    NotRecording,

    #[error("Recording failed: {0}")]
    RecordingFailed(String),
}

impl CaptureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CaptureError::Cancelled { .. } => ErrorKind::Cancelled,
            CaptureError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            CaptureError::NotRecording => ErrorKind::Validation,
            CaptureError::RecordingFailed(_) => ErrorKind::Storage,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            CaptureError::Cancelled { kind } => format!("No {} was selected", kind),
            CaptureError::PermissionDenied(_) => {
                "Microphone access was not granted".to_string()
            }
            CaptureError::NotRecording => "There is no recording to stop".to_string(),
            CaptureError::RecordingFailed(msg) => format!("The recording failed: {}", msg),
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    ConfigDirNotFound,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] toml::de::Error),
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::ConfigDirNotFound => {
                "Cannot find or create configuration directory".to_string()
            }
            ConfigError::IoError(err) => {
                format!("Cannot access configuration file: {}", err)
            }
            ConfigError::SerializationError(_) => {
                "Failed to save configuration settings".to_string()
            }
            ConfigError::DeserializationError(_) => {
                "Configuration file is corrupted or has invalid format".to_string()
            }
        }
    }
}
