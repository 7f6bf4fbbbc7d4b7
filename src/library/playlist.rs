use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::Song;

/// Ordered songs of one genre, as built for playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    genre: String,
    songs: Vec<Song>,
    shuffled: bool,
}

impl Playlist {
    /// Songs in stored order
    pub fn sequential(genre: impl Into<String>, songs: Vec<Song>) -> Self {
        Self {
            genre: genre.into(),
            songs,
            shuffled: false,
        }
    }

    /// Songs in a uniformly random order (Fisher-Yates)
    pub fn shuffled<R: Rng + ?Sized>(genre: impl Into<String>, mut songs: Vec<Song>, rng: &mut R) -> Self {
        songs.shuffle(rng);
        Self {
            genre: genre.into(),
            songs,
            shuffled: true,
        }
    }

    pub fn empty() -> Self {
        Self::sequential(String::new(), Vec::new())
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn get(&self, index: usize) -> Option<&Song> {
        self.songs.get(index)
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    pub fn position_of(&self, song: &Song) -> Option<usize> {
        self.songs.iter().position(|s| s == song)
    }

    pub fn next_index(&self, current: usize) -> Option<usize> {
        next_index(self.len(), current)
    }

    pub fn previous_index(&self, current: usize) -> Option<usize> {
        previous_index(self.len(), current)
    }

    pub fn random_index<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        random_index(self.len(), rng)
    }
}

/// Index after `current`, wrapping from the last entry to the first
pub fn next_index(len: usize, current: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some((current % len + 1) % len)
}

/// Index before `current`, wrapping from the first entry to the last
pub fn previous_index(len: usize, current: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some((current % len + len - 1) % len)
}

pub fn random_index<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(rng.gen_range(0..len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn songs(count: usize) -> Vec<Song> {
        (0..count)
            .map(|i| Song::new(format!("s{}.mp3", i), format!("/music/s{}.mp3", i), "Banda"))
            .collect()
    }

    #[test]
    fn test_navigation_wraps_both_ends() {
        let playlist = Playlist::sequential("Banda", songs(3));

        assert_eq!(playlist.next_index(0), Some(1));
        assert_eq!(playlist.next_index(2), Some(0));
        assert_eq!(playlist.previous_index(0), Some(2));
        assert_eq!(playlist.previous_index(2), Some(1));
    }

    #[test]
    fn test_navigation_empty() {
        let playlist = Playlist::sequential("Banda", Vec::new());
        let mut rng = StdRng::seed_from_u64(1);

        assert!(playlist.is_empty());
        assert_eq!(playlist.next_index(0), None);
        assert_eq!(playlist.previous_index(0), None);
        assert_eq!(playlist.random_index(&mut rng), None);
    }

    #[test]
    fn test_navigation_single_song() {
        assert_eq!(next_index(1, 0), Some(0));
        assert_eq!(previous_index(1, 0), Some(0));
    }

    #[test]
    fn test_out_of_range_current_is_folded() {
        assert_eq!(next_index(3, 7), Some(2));
        assert_eq!(previous_index(3, 3), Some(2));
    }

    #[test]
    fn test_random_index_in_range() {
        let playlist = Playlist::sequential("Banda", songs(4));
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let index = playlist.random_index(&mut rng).unwrap();
            assert!(index < 4);
        }
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let original = songs(10);
        let mut rng = StdRng::seed_from_u64(7);
        let playlist = Playlist::shuffled("Banda", original.clone(), &mut rng);

        assert!(playlist.is_shuffled());
        assert_eq!(playlist.len(), 10);
        let mut sorted = playlist.songs().to_vec();
        sorted.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        assert_eq!(sorted, original);
        assert!(original.iter().all(|s| playlist.position_of(s).is_some()));
    }

    #[test]
    fn test_shuffle_is_regenerated() {
        let original = songs(10);
        let mut rng = StdRng::seed_from_u64(3);

        let first = Playlist::shuffled("Banda", original.clone(), &mut rng);
        let orders: Vec<_> = (0..5)
            .map(|_| Playlist::shuffled("Banda", original.clone(), &mut rng))
            .collect();
        assert!(orders.iter().any(|p| p.songs() != first.songs()));
    }
}
