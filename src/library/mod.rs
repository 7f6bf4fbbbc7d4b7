//! Genre-partitioned music library persisted in the key-value store.

pub mod playlist;

use rand::Rng;
use std::collections::BTreeMap;

use crate::error::{LibraryError, StorageError};
use crate::kv::{load_json, save_json, KeyValueStore};
use crate::logging::AppLogger;
use crate::models::Song;

pub use playlist::Playlist;

/// Canonical key: genre -> `[{fileName, uri, genre}]`
pub const LIBRARY_KEY: &str = "musicLibrary";

/// Older key migrated into `LIBRARY_KEY` on first open
pub const LEGACY_KEY: &str = "genres";

pub const DEFAULT_MAX_GENRES: usize = 5;

type Genres = BTreeMap<String, Vec<Song>>;

pub struct MusicLibrary<S: KeyValueStore> {
    kv: S,
    genres: Genres,
    max_genres: usize,
    logger: AppLogger,
}

impl<S: KeyValueStore> MusicLibrary<S> {
    pub fn open(mut kv: S, max_genres: usize, logger: AppLogger) -> Result<Self, LibraryError> {
        let genres = match read_genres(&kv, LIBRARY_KEY)? {
            Some(genres) => genres,
            None => match read_genres(&kv, LEGACY_KEY)? {
                Some(legacy) => {
                    let migrated = migrate(legacy);
                    save_json(&mut kv, LIBRARY_KEY, &migrated)?;
                    kv.remove(LEGACY_KEY)?;
                    log::info!("Migrated {} genres from '{}' to '{}'", migrated.len(), LEGACY_KEY, LIBRARY_KEY);
                    migrated
                }
                None => Genres::new(),
            },
        };

        Ok(Self {
            kv,
            genres,
            max_genres,
            logger,
        })
    }

    pub fn max_genres(&self) -> usize {
        self.max_genres
    }

    /// Genre names in alphabetical order
    pub fn genre_names(&self) -> Vec<String> {
        self.genres.keys().cloned().collect()
    }

    pub fn genre_count(&self) -> usize {
        self.genres.len()
    }

    pub fn contains_genre(&self, genre: &str) -> bool {
        self.genres.contains_key(genre)
    }

    pub fn songs(&self, genre: &str) -> Option<&[Song]> {
        self.genres.get(genre).map(Vec::as_slice)
    }

    pub fn create_genre(&mut self, name: &str) -> Result<String, LibraryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::EmptyGenreName);
        }
        if self.genres.contains_key(name) {
            return Err(LibraryError::GenreExists { name: name.to_string() });
        }
        if self.genres.len() >= self.max_genres {
            return Err(LibraryError::GenreLimit { max: self.max_genres });
        }

        let mut next = self.genres.clone();
        next.insert(name.to_string(), Vec::new());
        self.commit(next)?;

        self.logger.log_genre_created(name);
        Ok(name.to_string())
    }

    /// Remove a genre and every song in it, returning the removed songs
    pub fn delete_genre(&mut self, name: &str) -> Result<Vec<Song>, LibraryError> {
        let mut next = self.genres.clone();
        let removed = next.remove(name).ok_or_else(|| LibraryError::GenreNotFound {
            name: name.to_string(),
        })?;
        self.commit(next)?;

        self.logger.log_genre_deleted(name, removed.len());
        Ok(removed)
    }

    /// Append a song to a genre; the song's `genre` field is set to match
    pub fn add_song(&mut self, genre: &str, mut song: Song) -> Result<Song, LibraryError> {
        let mut next = self.genres.clone();
        let songs = next.get_mut(genre).ok_or_else(|| LibraryError::GenreNotFound {
            name: genre.to_string(),
        })?;
        song.genre = genre.to_string();
        songs.push(song.clone());
        self.commit(next)?;

        self.logger.log_song_added(genre, &song.file_name);
        Ok(song)
    }

    pub fn delete_song(&mut self, genre: &str, index: usize) -> Result<Song, LibraryError> {
        let mut next = self.genres.clone();
        let songs = next.get_mut(genre).ok_or_else(|| LibraryError::GenreNotFound {
            name: genre.to_string(),
        })?;
        if index >= songs.len() {
            return Err(LibraryError::InvalidIndex { index });
        }
        let removed = songs.remove(index);
        self.commit(next)?;

        self.logger.log_song_deleted(genre, &removed.file_name);
        Ok(removed)
    }

    /// Build a fresh playlist for `genre`; shuffled playlists are reshuffled
    /// on every call.
    pub fn build_playlist<R: Rng + ?Sized>(
        &self,
        genre: &str,
        shuffle: bool,
        rng: &mut R,
    ) -> Result<Playlist, LibraryError> {
        let songs = self
            .songs(genre)
            .ok_or_else(|| LibraryError::GenreNotFound {
                name: genre.to_string(),
            })?
            .to_vec();

        Ok(if shuffle {
            Playlist::shuffled(genre, songs, rng)
        } else {
            Playlist::sequential(genre, songs)
        })
    }

    /// Persist `next`, then adopt it. On failure the in-memory library is unchanged.
    fn commit(&mut self, next: Genres) -> Result<(), StorageError> {
        save_json(&mut self.kv, LIBRARY_KEY, &next)?;
        self.genres = next;
        Ok(())
    }
}

fn read_genres<S: KeyValueStore>(kv: &S, key: &str) -> Result<Option<Genres>, StorageError> {
    match load_json::<Genres, S>(kv, key) {
        Err(StorageError::Serialization { key, source }) => {
            log::warn!("Ignoring damaged music library under '{}': {}", key, source);
            Ok(None)
        }
        other => other,
    }
}

/// Legacy records may lack the `genre` field; the map key is authoritative
fn migrate(mut legacy: Genres) -> Genres {
    for (genre, songs) in legacy.iter_mut() {
        for song in songs.iter_mut() {
            song.genre = genre.clone();
        }
    }
    legacy
}
