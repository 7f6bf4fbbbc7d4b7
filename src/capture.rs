//! Capture pipeline: where new images and sounds come from.
//!
//! The host supplies a `CapturePipeline` (file picker plus microphone
//! recorder). `PictogramDraft` collects its results until the user saves.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::error::{CaptureError, PictogramError};
use crate::kv::KeyValueStore;
use crate::models::{Category, Pictogram};
use crate::pictograms::PictogramStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Audio,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// An in-progress microphone recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingHandle {
    pub id: u64,
    pub started_at: DateTime<Utc>,
}

pub trait CapturePipeline {
    /// Let the user choose a file; `Cancelled` when they dismiss the picker
    fn pick_file(&mut self, kind: MediaKind) -> Result<PathBuf, CaptureError>;

    fn start_recording(&mut self) -> Result<RecordingHandle, CaptureError>;

    /// Finish a recording and return the file it was written to
    fn stop_recording(&mut self, handle: RecordingHandle) -> Result<PathBuf, CaptureError>;
}

/// The "new pictogram" form: a name, a category and whatever media has been
/// picked or recorded so far
#[derive(Debug, Clone, Default)]
pub struct PictogramDraft {
    pub name: String,
    pub category: Option<Category>,
    image: Option<PathBuf>,
    audio: Option<PathBuf>,
    recording: Option<RecordingHandle>,
}

impl PictogramDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn image(&self) -> Option<&Path> {
        self.image.as_deref()
    }

    pub fn audio(&self) -> Option<&Path> {
        self.audio.as_deref()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// A cancelled pick keeps the previous selection
    pub fn pick_image<P: CapturePipeline + ?Sized>(&mut self, pipeline: &mut P) -> Result<(), CaptureError> {
        self.image = Some(pipeline.pick_file(MediaKind::Image)?);
        Ok(())
    }

    pub fn pick_audio<P: CapturePipeline + ?Sized>(&mut self, pipeline: &mut P) -> Result<(), CaptureError> {
        self.audio = Some(pipeline.pick_file(MediaKind::Audio)?);
        Ok(())
    }

    pub fn start_recording<P: CapturePipeline + ?Sized>(&mut self, pipeline: &mut P) -> Result<(), CaptureError> {
        if self.recording.is_some() {
            return Ok(());
        }
        self.recording = Some(pipeline.start_recording()?);
        Ok(())
    }

    /// Stop the active recording and use it as the pictogram's audio
    pub fn stop_recording<P: CapturePipeline + ?Sized>(&mut self, pipeline: &mut P) -> Result<(), CaptureError> {
        let handle = self.recording.take().ok_or(CaptureError::NotRecording)?;
        self.audio = Some(pipeline.stop_recording(handle)?);
        Ok(())
    }

    /// Forget everything picked so far (closing the form)
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Hand the collected media to the store. The draft is cleared only
    /// when the pictogram was created.
    pub fn save<S: KeyValueStore>(&mut self, store: &mut PictogramStore<S>) -> Result<Pictogram, PictogramError> {
        let pictogram = store.create_pictogram(&self.name, self.image(), self.audio(), self.category)?;
        self.clear();
        Ok(pictogram)
    }
}

/// Capture for a terminal host: files are given up front as paths, and
/// recording uses a prepared file when one is configured
#[derive(Debug, Default)]
pub struct PathCapture {
    image: Option<PathBuf>,
    audio: Option<PathBuf>,
    recording_source: Option<PathBuf>,
    next_recording: u64,
    active_recording: Option<u64>,
}

impl PathCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.image = Some(path.into());
        self
    }

    pub fn with_audio(mut self, path: impl Into<PathBuf>) -> Self {
        self.audio = Some(path.into());
        self
    }

    /// File returned by `stop_recording`; without one the microphone is unavailable
    pub fn with_recording(mut self, path: impl Into<PathBuf>) -> Self {
        self.recording_source = Some(path.into());
        self
    }
}

impl CapturePipeline for PathCapture {
    fn pick_file(&mut self, kind: MediaKind) -> Result<PathBuf, CaptureError> {
        let selected = match kind {
            MediaKind::Image => self.image.take(),
            MediaKind::Audio => self.audio.take(),
        };
        selected.ok_or(CaptureError::Cancelled { kind })
    }

    fn start_recording(&mut self) -> Result<RecordingHandle, CaptureError> {
        if self.recording_source.is_none() {
            return Err(CaptureError::PermissionDenied(
                "no microphone is available to this session".to_string(),
            ));
        }

        self.next_recording += 1;
        self.active_recording = Some(self.next_recording);
        Ok(RecordingHandle {
            id: self.next_recording,
            started_at: Utc::now(),
        })
    }

    fn stop_recording(&mut self, handle: RecordingHandle) -> Result<PathBuf, CaptureError> {
        if self.active_recording != Some(handle.id) {
            return Err(CaptureError::NotRecording);
        }
        self.active_recording = None;

        let path = self.recording_source.clone().ok_or(CaptureError::NotRecording)?;
        if !path.is_file() {
            return Err(CaptureError::RecordingFailed(format!(
                "{} was not written",
                path.display()
            )));
        }
        Ok(path)
    }
}
