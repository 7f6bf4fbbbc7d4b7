use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Pictogram categories. `Todos` is only ever used as a filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Acciones,
    Emociones,
    RespuestasRapidas,
    Personalizados,
    Todos,
}

impl Category {
    /// Categories in the order they are offered to the user
    pub const ALL: [Category; 5] = [
        Category::Todos,
        Category::Acciones,
        Category::Emociones,
        Category::RespuestasRapidas,
        Category::Personalizados,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Acciones => "Acciones",
            Category::Emociones => "Emociones",
            Category::RespuestasRapidas => "RespuestasRapidas",
            Category::Personalizados => "Personalizados",
            Category::Todos => "Todos",
        }
    }

    /// Parse a category name, ignoring case
    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.as_str().eq_ignore_ascii_case(input.trim()))
    }

    pub fn is_filter_only(&self) -> bool {
        matches!(self, Category::Todos)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifier of a file bundled with the application, relative to the assets directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetId(pub &'static str);

impl AssetId {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to an image or sound: either bundled or a file on device storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetRef {
    BuiltIn(AssetId),
    External(PathBuf),
}

impl AssetRef {
    /// Build an external reference from a URI, accepting `file://` URIs and plain paths
    pub fn from_uri(uri: &str) -> Self {
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        AssetRef::External(PathBuf::from(path))
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, AssetRef::BuiltIn(_))
    }

    pub fn external_path(&self) -> Option<&Path> {
        match self {
            AssetRef::External(path) => Some(path),
            AssetRef::BuiltIn(_) => None,
        }
    }
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetRef::BuiltIn(id) => write!(f, "builtin:{}", id),
            AssetRef::External(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Where a pictogram comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    BuiltIn,
    UserCreated,
}

/// An image + sound pair with a display name and category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pictogram {
    pub name: String,
    pub image: AssetRef,
    pub audio: AssetRef,
    pub category: Category,
}

impl Pictogram {
    pub fn new(name: impl Into<String>, image: AssetRef, audio: AssetRef, category: Category) -> Self {
        Self {
            name: name.into(),
            image,
            audio,
            category,
        }
    }

    /// Built-ins are identified by membership in the static catalog name list
    pub fn origin(&self) -> Origin {
        if crate::catalog::is_builtin_name(&self.name) {
            Origin::BuiltIn
        } else {
            Origin::UserCreated
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.origin() == Origin::BuiltIn
    }
}

/// A song stored in the music library
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Song {
    #[serde(rename = "fileName", alias = "name")]
    pub file_name: String,
    pub uri: String,
    #[serde(default)]
    pub genre: String,
}

impl Song {
    pub fn new(file_name: impl Into<String>, uri: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            uri: uri.into(),
            genre: genre.into(),
        }
    }

    /// Build a song from a file on disk, using the file name as display name
    pub fn from_path(path: &Path, genre: impl Into<String>) -> Self {
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown")
            .to_string();
        Self::new(file_name, path.to_string_lossy(), genre)
    }

    pub fn asset_ref(&self) -> AssetRef {
        AssetRef::from_uri(&self.uri)
    }
}

/// Playback state of the audio session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Paused,
    Playing,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "Idle",
            PlaybackState::Paused => "Paused",
            PlaybackState::Playing => "Playing",
        }
    }

    pub fn is_loaded(&self) -> bool {
        !matches!(self, PlaybackState::Idle)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of the audio session for display
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub state: PlaybackState,
    pub source: Option<AssetRef>,
    pub position: Duration,
    pub duration: Option<Duration>,
}

impl SessionStatus {
    pub fn idle() -> Self {
        Self {
            state: PlaybackState::Idle,
            source: None,
            position: Duration::ZERO,
            duration: None,
        }
    }

    /// Get progress as a fraction (0.0 to 1.0)
    pub fn progress(&self) -> f32 {
        match self.duration {
            Some(duration) if !duration.is_zero() => {
                (self.position.as_secs_f32() / duration.as_secs_f32()).min(1.0)
            }
            _ => 0.0,
        }
    }

    /// Format position as MM:SS
    pub fn position_formatted(&self) -> String {
        format_clock(self.position)
    }

    /// Format duration as MM:SS
    pub fn duration_formatted(&self) -> String {
        self.duration.map(format_clock).unwrap_or_else(|| "00:00".to_string())
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::idle()
    }
}

fn format_clock(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
