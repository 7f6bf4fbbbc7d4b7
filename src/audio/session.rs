//! Process-wide audio session: at most one sound is loaded at any time.
//!
//! Methods take `&self` so one session can be shared by every screen through
//! an `Rc`. Interior state is never borrowed across the `load` await; a
//! generation counter decides which of several overlapping `play` calls wins.

use std::cell::{Cell, RefCell};

use crate::audio::{AssetResolver, AudioBackend, SoundHandle};
use crate::error::AudioError;
use crate::logging::AppLogger;
use crate::models::{AssetRef, PlaybackState, SessionStatus};

/// Result of a `play` call that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Started,
    /// A later `play` or `stop` arrived while this one was loading
    Superseded,
}

struct LoadedSound<H> {
    handle: H,
    source: AssetRef,
    state: PlaybackState,
    completion_reported: bool,
}

pub struct AudioSessionManager<B: AudioBackend> {
    backend: B,
    resolver: AssetResolver,
    current: RefCell<Option<LoadedSound<B::Handle>>>,
    generation: Cell<u64>,
    logger: AppLogger,
}

impl<B: AudioBackend> AudioSessionManager<B> {
    pub fn new(backend: B, resolver: AssetResolver, logger: AppLogger) -> Self {
        Self {
            backend,
            resolver,
            current: RefCell::new(None),
            generation: Cell::new(0),
            logger,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Unload whatever is loaded, then load and start `source`
    pub async fn play(&self, source: &AssetRef) -> Result<PlayOutcome, AudioError> {
        let generation = self.bump_generation();
        self.unload_current("superseded by a new sound");

        let path = self.resolver.resolve(source).map_err(|e| {
            self.logger.log_operation_failed("play", &e);
            e
        })?;

        let loaded = self.backend.load(&path).await;

        if self.generation.get() != generation {
            if let Ok(handle) = loaded {
                handle.unload();
            }
            self.logger.log_playback_superseded(&source.to_string());
            return Ok(PlayOutcome::Superseded);
        }

        let mut handle = loaded.map_err(|e| {
            self.logger.log_operation_failed("load", &e);
            e
        })?;
        if let Err(e) = handle.play() {
            handle.unload();
            self.logger.log_operation_failed("play", &e);
            return Err(e);
        }

        let replaced = self.current.borrow_mut().replace(LoadedSound {
            handle,
            source: source.clone(),
            state: PlaybackState::Playing,
            completion_reported: false,
        });
        if let Some(old) = replaced {
            release(old);
        }

        self.logger.log_playback_started(&source.to_string());
        Ok(PlayOutcome::Started)
    }

    /// Pause a playing sound; does nothing in any other state
    pub fn pause(&self) -> Result<(), AudioError> {
        let mut current = self.current.borrow_mut();
        if let Some(sound) = current.as_mut().filter(|s| s.state == PlaybackState::Playing) {
            sound.handle.pause()?;
            sound.state = PlaybackState::Paused;
            self.logger.log_playback_paused(sound.handle.position());
        }
        Ok(())
    }

    /// Resume a paused sound; does nothing in any other state
    pub fn resume(&self) -> Result<(), AudioError> {
        let mut current = self.current.borrow_mut();
        if let Some(sound) = current.as_mut().filter(|s| s.state == PlaybackState::Paused) {
            sound.handle.play()?;
            sound.state = PlaybackState::Playing;
            self.logger.log_playback_resumed(sound.handle.position());
        }
        Ok(())
    }

    /// Play the loaded sound again from the beginning
    pub fn restart(&self) -> Result<(), AudioError> {
        let mut current = self.current.borrow_mut();
        if let Some(sound) = current.as_mut() {
            sound.handle.seek_to_start()?;
            sound.handle.play()?;
            sound.state = PlaybackState::Playing;
            sound.completion_reported = false;
        }
        Ok(())
    }

    /// Release the loaded sound, if any. Also abandons a `play` still loading.
    pub fn stop(&self) {
        self.bump_generation();
        self.unload_current("stop requested");
    }

    /// Release everything on shutdown
    pub fn teardown(&self) {
        self.bump_generation();
        self.unload_current("session teardown");
    }

    /// Report the source of a sound that just reached its end. Each load is
    /// reported at most once.
    pub fn poll_completion(&self) -> Option<AssetRef> {
        let mut current = self.current.borrow_mut();
        let sound = current.as_mut()?;

        if sound.completion_reported || sound.state != PlaybackState::Playing || !sound.handle.is_finished() {
            return None;
        }

        sound.completion_reported = true;
        self.logger.log_playback_completed(&sound.source.to_string());
        Some(sound.source.clone())
    }

    pub fn state(&self) -> PlaybackState {
        self.current
            .borrow()
            .as_ref()
            .map_or(PlaybackState::Idle, |s| s.state)
    }

    pub fn current_source(&self) -> Option<AssetRef> {
        self.current.borrow().as_ref().map(|s| s.source.clone())
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    pub fn status(&self) -> SessionStatus {
        match self.current.borrow().as_ref() {
            Some(sound) => SessionStatus {
                state: sound.state,
                source: Some(sound.source.clone()),
                position: sound.handle.position(),
                duration: sound.handle.duration(),
            },
            None => SessionStatus::idle(),
        }
    }

    fn bump_generation(&self) -> u64 {
        let next = self.generation.get().wrapping_add(1);
        self.generation.set(next);
        next
    }

    fn unload_current(&self, reason: &str) {
        let previous = self.current.borrow_mut().take();
        if let Some(sound) = previous {
            release(sound);
            self.logger.log_playback_stopped(reason);
        }
    }
}

fn release<H: SoundHandle>(mut sound: LoadedSound<H>) {
    if let Err(e) = sound.handle.stop() {
        log::warn!("Failed to stop {}: {}", sound.source, e);
    }
    sound.handle.unload();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{MockBackend, MockFixture};
    use crate::logging::AppEventType;
    use tokio_test::{assert_ok, assert_err};

    fn create_session() -> (AudioSessionManager<MockBackend>, MockFixture) {
        let fixture = MockFixture::new(&["a.m4a", "b.m4a", "c.m4a"]);
        let session = AudioSessionManager::new(fixture.backend.clone(), fixture.resolver(), AppLogger::new());
        (session, fixture)
    }

    #[tokio::test]
    async fn test_play_transitions_to_playing() {
        let (session, fixture) = create_session();
        assert_eq!(session.state(), PlaybackState::Idle);

        let outcome = assert_ok!(session.play(&fixture.source("a.m4a")).await);
        assert_eq!(outcome, PlayOutcome::Started);
        assert_eq!(session.state(), PlaybackState::Playing);
        assert_eq!(session.current_source(), Some(fixture.source("a.m4a")));
        assert_eq!(fixture.backend.playing(), vec![fixture.path("a.m4a")]);
    }

    #[tokio::test]
    async fn test_sequential_play_unloads_previous() {
        let (session, fixture) = create_session();

        session.play(&fixture.source("a.m4a")).await.unwrap();
        session.play(&fixture.source("b.m4a")).await.unwrap();

        assert_eq!(fixture.backend.live(), vec![fixture.path("b.m4a")]);
        assert_eq!(fixture.backend.playing(), vec![fixture.path("b.m4a")]);
    }

    #[tokio::test]
    async fn test_overlapping_play_last_call_wins() {
        let (session, fixture) = create_session();
        let a = fixture.source("a.m4a");
        let b = fixture.source("b.m4a");

        let (first, second) = tokio::join!(session.play(&a), session.play(&b));

        assert_eq!(first.unwrap(), PlayOutcome::Superseded);
        assert_eq!(second.unwrap(), PlayOutcome::Started);
        assert_eq!(fixture.backend.loads().len(), 2);
        assert_eq!(fixture.backend.live(), vec![fixture.path("b.m4a")]);
        assert_eq!(fixture.backend.playing(), vec![fixture.path("b.m4a")]);
        assert_eq!(session.current_source(), Some(b));
    }

    #[tokio::test]
    async fn test_stop_during_load_abandons_it() {
        let (session, fixture) = create_session();
        let a = fixture.source("a.m4a");

        let stop_soon = async {
            tokio::task::yield_now().await;
            session.stop();
        };
        let (outcome, _) = tokio::join!(session.play(&a), stop_soon);

        assert_eq!(outcome.unwrap(), PlayOutcome::Superseded);
        assert_eq!(session.state(), PlaybackState::Idle);
        assert!(fixture.backend.live().is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_leaves_idle() {
        let (session, fixture) = create_session();
        session.play(&fixture.source("a.m4a")).await.unwrap();
        fixture.backend.fail_on(&fixture.path("b.m4a"));

        let result = session.play(&fixture.source("b.m4a")).await;
        assert!(matches!(result, Err(AudioError::DecodeFailed(_))));
        assert_eq!(session.state(), PlaybackState::Idle);
        assert!(fixture.backend.live().is_empty());

        let missing = session.play(&fixture.source("nope.m4a")).await;
        assert_err!(missing);
        assert_eq!(session.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_pause_resume_are_state_gated() {
        let (session, fixture) = create_session();

        // No-ops while idle
        assert_ok!(session.pause());
        assert_ok!(session.resume());
        assert_eq!(session.state(), PlaybackState::Idle);

        session.play(&fixture.source("a.m4a")).await.unwrap();
        assert_ok!(session.resume());
        assert_eq!(session.state(), PlaybackState::Playing);

        session.pause().unwrap();
        assert_eq!(session.state(), PlaybackState::Paused);
        assert!(fixture.backend.playing().is_empty());
        session.pause().unwrap();
        assert_eq!(session.state(), PlaybackState::Paused);

        session.resume().unwrap();
        assert_eq!(session.state(), PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_completion_fires_once_per_load() {
        let (session, fixture) = create_session();
        let a = fixture.source("a.m4a");
        session.play(&a).await.unwrap();

        assert_eq!(session.poll_completion(), None);
        fixture.backend.finish(&fixture.path("a.m4a"));
        assert_eq!(session.poll_completion(), Some(a.clone()));
        assert_eq!(session.poll_completion(), None);

        // A restart re-arms the completion report
        session.restart().unwrap();
        assert_eq!(session.poll_completion(), None);
        fixture.backend.finish(&fixture.path("a.m4a"));
        assert_eq!(session.poll_completion(), Some(a));
    }

    #[tokio::test]
    async fn test_stop_and_status() {
        let logger = AppLogger::new();
        let fixture = MockFixture::new(&["a.m4a"]);
        let session = AudioSessionManager::new(fixture.backend.clone(), fixture.resolver(), logger.clone());

        assert_eq!(session.status(), SessionStatus::idle());
        session.play(&fixture.source("a.m4a")).await.unwrap();

        let status = session.status();
        assert_eq!(status.state, PlaybackState::Playing);
        assert_eq!(status.duration, Some(MockBackend::CLIP_DURATION));

        session.stop();
        session.stop();
        assert_eq!(session.status(), SessionStatus::idle());
        assert!(fixture.backend.live().is_empty());
        assert_eq!(logger.count_events(AppEventType::PlaybackStopped), 1);
    }

    #[tokio::test]
    async fn test_teardown_releases_sound() {
        let (session, fixture) = create_session();
        session.play(&fixture.source("c.m4a")).await.unwrap();
        session.teardown();
        assert!(fixture.backend.live().is_empty());
        assert_eq!(session.state(), PlaybackState::Idle);
    }
}
