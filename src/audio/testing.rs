//! Scripted in-memory backend for exercising the session without a device.

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use tempfile::TempDir;

use crate::audio::{AssetResolver, AudioBackend, SoundHandle};
use crate::error::AudioError;
use crate::models::AssetRef;

#[derive(Default)]
struct MockState {
    loads: Vec<PathBuf>,
    live: Vec<PathBuf>,
    playing: Vec<PathBuf>,
    finished: HashSet<PathBuf>,
    failing: HashSet<PathBuf>,
}

/// Yields a few times inside `load` so overlapping calls can interleave
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Rc<RefCell<MockState>>,
}

impl MockBackend {
    pub const CLIP_DURATION: Duration = Duration::from_secs(3);
    const LOAD_YIELDS: usize = 3;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, path: &Path) {
        self.state.borrow_mut().failing.insert(path.to_path_buf());
    }

    /// Mark a loaded sound as having played to its end
    pub fn finish(&self, path: &Path) {
        self.state.borrow_mut().finished.insert(path.to_path_buf());
    }

    pub fn loads(&self) -> Vec<PathBuf> {
        self.state.borrow().loads.clone()
    }

    /// Paths of handles that are loaded and not yet released
    pub fn live(&self) -> Vec<PathBuf> {
        self.state.borrow().live.clone()
    }

    pub fn playing(&self) -> Vec<PathBuf> {
        self.state.borrow().playing.clone()
    }
}

impl AudioBackend for MockBackend {
    type Handle = MockSound;

    async fn load(&self, path: &Path) -> Result<MockSound, AudioError> {
        for _ in 0..Self::LOAD_YIELDS {
            tokio::task::yield_now().await;
        }

        let mut state = self.state.borrow_mut();
        state.loads.push(path.to_path_buf());
        if state.failing.contains(path) {
            return Err(AudioError::DecodeFailed(format!("scripted failure for {}", path.display())));
        }
        state.live.push(path.to_path_buf());
        state.finished.remove(path);

        Ok(MockSound {
            path: path.to_path_buf(),
            state: Rc::clone(&self.state),
            position: Duration::ZERO,
        })
    }
}

pub struct MockSound {
    path: PathBuf,
    state: Rc<RefCell<MockState>>,
    position: Duration,
}

impl MockSound {
    fn set_playing(&self, playing: bool) {
        let mut state = self.state.borrow_mut();
        let index = state.playing.iter().position(|p| *p == self.path);
        match (playing, index) {
            (true, None) => state.playing.push(self.path.clone()),
            (false, Some(i)) => {
                state.playing.remove(i);
            }
            _ => {}
        }
    }
}

impl SoundHandle for MockSound {
    fn play(&mut self) -> Result<(), AudioError> {
        self.set_playing(true);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        self.set_playing(false);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.set_playing(false);
        Ok(())
    }

    fn seek_to_start(&mut self) -> Result<(), AudioError> {
        self.position = Duration::ZERO;
        self.state.borrow_mut().finished.remove(&self.path);
        Ok(())
    }

    fn position(&self) -> Duration {
        if self.is_finished() {
            MockBackend::CLIP_DURATION
        } else {
            self.position
        }
    }

    fn duration(&self) -> Option<Duration> {
        Some(MockBackend::CLIP_DURATION)
    }

    fn is_finished(&self) -> bool {
        self.state.borrow().finished.contains(&self.path)
    }
}

impl Drop for MockSound {
    fn drop(&mut self) {
        self.set_playing(false);
        let mut state = self.state.borrow_mut();
        if let Some(i) = state.live.iter().position(|p| *p == self.path) {
            state.live.remove(i);
        }
    }
}

/// A mock backend plus a temp directory holding the named sound files
pub struct MockFixture {
    pub backend: MockBackend,
    temp_dir: TempDir,
}

impl MockFixture {
    pub fn new(files: &[&str]) -> Self {
        let temp_dir = TempDir::new().unwrap();
        for name in files {
            std::fs::write(temp_dir.path().join(name), b"sound").unwrap();
        }
        Self {
            backend: MockBackend::new(),
            temp_dir,
        }
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub fn source(&self, name: &str) -> AssetRef {
        AssetRef::External(self.path(name))
    }

    pub fn resolver(&self) -> AssetResolver {
        AssetResolver::new(self.temp_dir.path().join("assets"))
    }
}
