use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

pub const IMAGES_DIR: &str = "images";
pub const SOUNDS_DIR: &str = "sounds";
pub const IMAGE_EXTENSION: &str = "jpg";
pub const SOUND_EXTENSION: &str = "m4a";

/// Strip every character outside `[A-Za-z0-9_-]`
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// An image file and its matching sound file found on storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPair {
    pub stem: String,
    pub image: PathBuf,
    pub sound: PathBuf,
}

/// On-device layout for user pictograms: `<data>/images` and `<data>/sounds`
#[derive(Debug, Clone)]
pub struct UserFiles {
    images_dir: PathBuf,
    sounds_dir: PathBuf,
}

impl UserFiles {
    /// Use `data_dir` as the root, creating both directories if needed
    pub fn open(data_dir: &Path) -> Result<Self, StorageError> {
        let images_dir = data_dir.join(IMAGES_DIR);
        let sounds_dir = data_dir.join(SOUNDS_DIR);

        fs::create_dir_all(&images_dir).map_err(|e| StorageError::io(&images_dir, e))?;
        fs::create_dir_all(&sounds_dir).map_err(|e| StorageError::io(&sounds_dir, e))?;

        Ok(Self {
            images_dir,
            sounds_dir,
        })
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn sounds_dir(&self) -> &Path {
        &self.sounds_dir
    }

    pub fn image_path(&self, stem: &str) -> PathBuf {
        self.images_dir.join(format!("{}.{}", stem, IMAGE_EXTENSION))
    }

    pub fn sound_path(&self, stem: &str) -> PathBuf {
        self.sounds_dir.join(format!("{}.{}", stem, SOUND_EXTENSION))
    }

    /// Whether either backing file for `stem` is already present
    pub fn stem_exists(&self, stem: &str) -> bool {
        self.image_path(stem).exists() || self.sound_path(stem).exists()
    }

    /// Pair every image with a sound whose stem matches it (exactly, or failing
    /// that by prefix). Images without a sound are skipped.
    pub fn scan(&self) -> Result<Vec<StoredPair>, StorageError> {
        let images = list_files(&self.images_dir)?;
        let sounds = list_files(&self.sounds_dir)?;

        let mut pairs = Vec::new();
        for (stem, image) in images {
            let matched = sounds
                .iter()
                .find(|(sound_stem, _)| *sound_stem == stem)
                .or_else(|| sounds.iter().find(|(sound_stem, _)| sound_stem.starts_with(&stem)));

            match matched {
                Some((_, sound)) => pairs.push(StoredPair {
                    stem,
                    image,
                    sound: sound.clone(),
                }),
                None => log::debug!("Skipping image without sound: {}", image.display()),
            }
        }

        Ok(pairs)
    }

    /// Copy both source files into place under `stem`. Either both files end
    /// up installed or neither does.
    pub fn install(&self, stem: &str, image_src: &Path, sound_src: &Path) -> Result<StoredPair, StorageError> {
        let image_dest = self.image_path(stem);
        let sound_dest = self.sound_path(stem);
        let image_tmp = self.images_dir.join(format!(".{}.{}.tmp", stem, IMAGE_EXTENSION));
        let sound_tmp = self.sounds_dir.join(format!(".{}.{}.tmp", stem, SOUND_EXTENSION));

        let staged = fs::copy(image_src, &image_tmp)
            .map_err(|e| StorageError::io(image_src, e))
            .and_then(|_| fs::copy(sound_src, &sound_tmp).map_err(|e| StorageError::io(sound_src, e)));
        if let Err(e) = staged {
            discard(&image_tmp);
            discard(&sound_tmp);
            return Err(e);
        }

        if let Err(e) = fs::rename(&image_tmp, &image_dest) {
            discard(&image_tmp);
            discard(&sound_tmp);
            return Err(StorageError::io(&image_dest, e));
        }

        if let Err(e) = fs::rename(&sound_tmp, &sound_dest) {
            discard(&image_dest);
            discard(&sound_tmp);
            return Err(StorageError::io(&sound_dest, e));
        }

        Ok(StoredPair {
            stem: stem.to_string(),
            image: image_dest,
            sound: sound_dest,
        })
    }

    /// Whether `path` is a file directly inside the image or sound directory
    pub fn owns(&self, path: &Path) -> bool {
        path.parent()
            .is_some_and(|dir| dir == self.images_dir || dir == self.sounds_dir)
    }

    /// Delete a file, treating an already-missing file as success
    pub fn remove(&self, path: &Path) -> Result<(), StorageError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }
}

/// Visible regular files in `dir` as `(stem, path)`, sorted by file name
fn list_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, StorageError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::io(dir, e)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StorageError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(true, |n| n.starts_with('.'));
        if hidden {
            continue;
        }

        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            files.push((stem.to_string(), path.clone()));
        }
    }

    files.sort_by(|a, b| a.1.file_name().cmp(&b.1.file_name()));
    Ok(files)
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("Could not remove staged file {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_layout() -> (UserFiles, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let files = UserFiles::open(&temp_dir.path().join("appdata")).unwrap();
        (files, temp_dir)
    }

    fn create_source(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("data for {}", name)).unwrap();
        path
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Hola!"), "Hola");
        assert_eq!(sanitize_name("Hola?"), "Hola");
        assert_eq!(sanitize_name("mi casa_2-b"), "micasa_2-b");
        assert_eq!(sanitize_name("Papá"), "Pap");
        assert_eq!(sanitize_name("¡¿!?"), "");
    }

    #[test]
    fn test_open_creates_directories() {
        let (files, _temp_dir) = create_layout();
        assert!(files.images_dir().is_dir());
        assert!(files.sounds_dir().is_dir());
        assert!(files.image_path("Hola").ends_with("images/Hola.jpg"));
        assert!(files.sound_path("Hola").ends_with("sounds/Hola.m4a"));
    }

    #[test]
    fn test_install_and_scan() {
        let (files, temp_dir) = create_layout();
        let image = create_source(temp_dir.path(), "photo.png");
        let sound = create_source(temp_dir.path(), "voice.caf");

        let pair = files.install("Hola", &image, &sound).unwrap();
        assert_eq!(pair.image, files.image_path("Hola"));
        assert_eq!(fs::read_to_string(&pair.sound).unwrap(), "data for voice.caf");

        let pairs = files.scan().unwrap();
        assert_eq!(pairs, vec![pair]);
    }

    #[test]
    fn test_install_failure_leaves_nothing_behind() {
        let (files, temp_dir) = create_layout();
        let image = create_source(temp_dir.path(), "photo.png");
        let missing_sound = temp_dir.path().join("missing.m4a");

        let result = files.install("Hola", &image, &missing_sound);
        assert!(matches!(result, Err(StorageError::Io { .. })));

        assert!(!files.stem_exists("Hola"));
        assert_eq!(fs::read_dir(files.images_dir()).unwrap().count(), 0);
        assert_eq!(fs::read_dir(files.sounds_dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_scan_skips_unpaired_and_hidden_files() {
        let (files, _temp_dir) = create_layout();
        fs::write(files.image_path("Solo"), b"img").unwrap();
        fs::write(files.images_dir().join(".Hidden.jpg"), b"img").unwrap();
        fs::write(files.sounds_dir().join(".Hidden.m4a"), b"snd").unwrap();

        assert!(files.scan().unwrap().is_empty());
    }

    #[test]
    fn test_scan_prefix_match_and_order() {
        let (files, _temp_dir) = create_layout();
        fs::write(files.image_path("Zapato"), b"img").unwrap();
        fs::write(files.image_path("Agua"), b"img").unwrap();
        fs::write(files.sound_path("Zapato"), b"snd").unwrap();
        fs::write(files.sounds_dir().join("Agua_grabacion.m4a"), b"snd").unwrap();

        let pairs = files.scan().unwrap();
        let stems: Vec<_> = pairs.iter().map(|p| p.stem.as_str()).collect();
        assert_eq!(stems, vec!["Agua", "Zapato"]);
        assert!(pairs[0].sound.ends_with("Agua_grabacion.m4a"));
    }

    #[test]
    fn test_owns_only_storage_files() {
        let (files, temp_dir) = create_layout();
        assert!(files.owns(&files.image_path("Hola")));
        assert!(files.owns(&files.sound_path("Hola")));
        assert!(!files.owns(&temp_dir.path().join("notes.txt")));
        assert!(!files.owns(&files.images_dir().join("nested").join("a.jpg")));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (files, _temp_dir) = create_layout();
        let path = files.image_path("Hola");
        fs::write(&path, b"img").unwrap();

        files.remove(&path).unwrap();
        assert!(!path.exists());
        files.remove(&path).unwrap();
    }
}
