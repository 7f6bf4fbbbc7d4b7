use rand::rngs::StdRng;
use rand::SeedableRng;
use std::rc::Rc;

use crate::audio::{AudioBackend, AudioSessionManager, PlayOutcome};
use crate::capture::{CapturePipeline, MediaKind};
use crate::error::{AppError, LibraryError};
use crate::kv::KeyValueStore;
use crate::library::{MusicLibrary, Playlist};
use crate::models::{PlaybackState, Song};

/// The music screen: genre selection, playlist transport and auto-advance
pub struct MusicPlayer<S: KeyValueStore, B: AudioBackend> {
    library: MusicLibrary<S>,
    session: Rc<AudioSessionManager<B>>,
    selected: Option<String>,
    playlist: Playlist,
    current: Option<usize>,
    now_playing: Option<Song>,
    shuffle: bool,
    rng: StdRng,
}

impl<S: KeyValueStore, B: AudioBackend> MusicPlayer<S, B> {
    pub fn new(library: MusicLibrary<S>, session: Rc<AudioSessionManager<B>>, shuffle: bool) -> Self {
        Self::with_rng(library, session, shuffle, StdRng::from_entropy())
    }

    pub fn with_rng(library: MusicLibrary<S>, session: Rc<AudioSessionManager<B>>, shuffle: bool, rng: StdRng) -> Self {
        Self {
            library,
            session,
            selected: None,
            playlist: Playlist::empty(),
            current: None,
            now_playing: None,
            shuffle,
            rng,
        }
    }

    pub fn library(&self) -> &MusicLibrary<S> {
        &self.library
    }

    pub fn selected_genre(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn now_playing(&self) -> Option<&Song> {
        self.now_playing.as_ref()
    }

    pub fn is_shuffle(&self) -> bool {
        self.shuffle
    }

    /// Select a genre and build a fresh playlist for it
    pub fn select_genre(&mut self, genre: &str) -> Result<(), LibraryError> {
        self.playlist = self.library.build_playlist(genre, self.shuffle, &mut self.rng)?;
        self.selected = Some(genre.to_string());
        self.current = self.locate_now_playing();
        Ok(())
    }

    pub fn deselect_genre(&mut self) {
        self.selected = None;
        self.playlist = Playlist::empty();
        self.current = None;
    }

    /// Toggling shuffle regenerates the playlist order
    pub fn set_shuffle(&mut self, shuffle: bool) -> Result<(), LibraryError> {
        self.shuffle = shuffle;
        self.rebuild_playlist()
    }

    /// Play entry `index` of the playlist. With an empty playlist this does
    /// nothing and returns `None`.
    pub async fn play_index(&mut self, index: usize) -> Result<Option<Song>, AppError> {
        if self.playlist.is_empty() {
            return Ok(None);
        }
        let song = self
            .playlist
            .get(index)
            .cloned()
            .ok_or(LibraryError::InvalidIndex { index })?;

        match self.session.play(&song.asset_ref()).await? {
            PlayOutcome::Started => {
                self.current = Some(index);
                self.now_playing = Some(song.clone());
                Ok(Some(song))
            }
            PlayOutcome::Superseded => Ok(None),
        }
    }

    pub async fn next(&mut self) -> Result<Option<Song>, AppError> {
        match self.playlist.next_index(self.current.unwrap_or(self.playlist.len().saturating_sub(1))) {
            Some(index) => self.play_index(index).await,
            None => Ok(None),
        }
    }

    pub async fn previous(&mut self) -> Result<Option<Song>, AppError> {
        match self.playlist.previous_index(self.current.unwrap_or(0)) {
            Some(index) => self.play_index(index).await,
            None => Ok(None),
        }
    }

    pub async fn random(&mut self) -> Result<Option<Song>, AppError> {
        match self.playlist.random_index(&mut self.rng) {
            Some(index) => self.play_index(index).await,
            None => Ok(None),
        }
    }

    /// Pause when playing, resume when paused, and start the playlist when idle
    pub async fn toggle_pause(&mut self) -> Result<PlaybackState, AppError> {
        match self.session.state() {
            PlaybackState::Playing => self.session.pause()?,
            PlaybackState::Paused => self.session.resume()?,
            PlaybackState::Idle => {
                self.play_index(self.current.unwrap_or(0)).await?;
            }
        }
        Ok(self.session.state())
    }

    /// A finished song advances to the next one, wrapping at the end
    pub async fn on_playback_complete(&mut self) -> Result<Option<Song>, AppError> {
        self.next().await
    }

    pub fn stop(&mut self) {
        self.session.stop();
        self.now_playing = None;
    }

    /// Another screen took over the shared session. The playlist position
    /// is kept so `toggle_pause` can start from it again.
    pub fn release(&mut self) {
        self.now_playing = None;
    }

    pub fn create_genre(&mut self, name: &str) -> Result<String, LibraryError> {
        self.library.create_genre(name)
    }

    /// Delete a genre and its songs, stopping playback if one of them was playing
    pub fn delete_genre(&mut self, name: &str) -> Result<Vec<Song>, LibraryError> {
        let removed = self.library.delete_genre(name)?;

        if self.now_playing.as_ref().is_some_and(|s| s.genre == name) {
            self.stop();
        }
        if self.selected.as_deref() == Some(name) {
            self.deselect_genre();
        }
        Ok(removed)
    }

    /// Delete song `index` (stored order) from `genre`, stopping it if it is playing
    pub fn delete_song(&mut self, genre: &str, index: usize) -> Result<Song, LibraryError> {
        let removed = self.library.delete_song(genre, index)?;

        if self.now_playing.as_ref() == Some(&removed) {
            self.stop();
        }
        if self.selected.as_deref() == Some(genre) {
            self.rebuild_playlist()?;
        }
        Ok(removed)
    }

    /// Pick an audio file and append it to `genre`
    pub fn import_song<P: CapturePipeline + ?Sized>(&mut self, pipeline: &mut P, genre: &str) -> Result<Song, AppError> {
        if !self.library.contains_genre(genre) {
            return Err(LibraryError::GenreNotFound { name: genre.to_string() }.into());
        }

        let path = pipeline.pick_file(MediaKind::Audio)?;
        let song = self.library.add_song(genre, Song::from_path(&path, genre))?;

        if self.selected.as_deref() == Some(genre) {
            self.rebuild_playlist()?;
        }
        Ok(song)
    }

    fn rebuild_playlist(&mut self) -> Result<(), LibraryError> {
        match self.selected.clone() {
            Some(genre) => self.select_genre(&genre),
            None => Ok(()),
        }
    }

    fn locate_now_playing(&self) -> Option<usize> {
        self.now_playing
            .as_ref()
            .and_then(|song| self.playlist.position_of(song))
    }
}
