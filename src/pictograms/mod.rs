//! Pictogram store: the built-in catalog merged with pictograms the user
//! created, kept in sync with the files under the data directory.

pub mod files;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::catalog;
use crate::error::{PictogramError, StorageError};
use crate::kv::{load_json, save_json, KeyValueStore};
use crate::logging::{AppLogger, OperationTimer};
use crate::models::{AssetRef, Category, Pictogram};

pub use files::{sanitize_name, StoredPair, UserFiles};

/// Key holding display metadata for user pictograms
pub const METADATA_KEY: &str = "pictograms";

/// Display metadata stored per stem, since the stem cannot carry the display name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PictogramMeta {
    pub name: String,
    pub category: Category,
}

type MetadataMap = BTreeMap<String, PictogramMeta>;

pub struct PictogramStore<S: KeyValueStore> {
    files: UserFiles,
    kv: S,
    builtins: Vec<Pictogram>,
    user: Vec<Pictogram>,
    loaded: bool,
    logger: AppLogger,
}

impl<S: KeyValueStore> PictogramStore<S> {
    /// Create a store over `data_dir`. User pictograms are not scanned until
    /// the first `refresh_user_pictograms`.
    pub fn new(data_dir: &Path, kv: S, logger: AppLogger) -> Result<Self, PictogramError> {
        let files = UserFiles::open(data_dir)?;
        Ok(Self {
            files,
            kv,
            builtins: catalog::builtin_pictograms(),
            user: Vec::new(),
            loaded: false,
            logger,
        })
    }

    /// Create a store and scan it right away
    pub fn open(data_dir: &Path, kv: S, logger: AppLogger) -> Result<Self, PictogramError> {
        let mut store = Self::new(data_dir, kv, logger)?;
        store.refresh_user_pictograms()?;
        Ok(store)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn files(&self) -> &UserFiles {
        &self.files
    }

    /// Built-ins in catalog order, then user pictograms in discovery order
    pub fn list_all(&self) -> Vec<Pictogram> {
        self.builtins.iter().chain(self.user.iter()).cloned().collect()
    }

    pub fn list_by_category(&self, category: Category) -> Vec<Pictogram> {
        if category == Category::Todos {
            return self.list_all();
        }

        self.builtins
            .iter()
            .chain(self.user.iter())
            .filter(|p| p.category == category)
            .cloned()
            .collect()
    }

    pub fn user_pictograms(&self) -> &[Pictogram] {
        &self.user
    }

    pub fn find(&self, name: &str) -> Option<&Pictogram> {
        self.builtins.iter().chain(self.user.iter()).find(|p| p.name == name)
    }

    /// Rescan storage and replace the user pictogram list wholesale
    pub fn refresh_user_pictograms(&mut self) -> Result<(), PictogramError> {
        let timer = OperationTimer::new("refresh_user_pictograms");

        let pairs = self.files.scan()?;
        let mut metadata = self.load_metadata_lenient()?;

        let before = metadata.len();
        metadata.retain(|stem, _| pairs.iter().any(|pair| pair.stem == *stem));
        if metadata.len() != before {
            log::debug!("Dropping metadata for {} missing pictogram(s)", before - metadata.len());
            if let Err(e) = save_json(&mut self.kv, METADATA_KEY, &metadata) {
                log::warn!("Could not prune pictogram metadata: {}", e);
            }
        }

        let mut user: Vec<Pictogram> = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let (name, category) = match metadata.get(&pair.stem) {
                Some(meta) => (meta.name.clone(), meta.category),
                None => (pair.stem.clone(), Category::Personalizados),
            };

            if catalog::is_builtin_name(&name) || user.iter().any(|p| p.name == name) {
                log::warn!("Skipping stored pictogram with duplicate name '{}'", name);
                continue;
            }

            user.push(Pictogram::new(
                name,
                AssetRef::External(pair.image),
                AssetRef::External(pair.sound),
                category,
            ));
        }

        self.user = user;
        self.loaded = true;

        let elapsed = timer.finish_with_threshold(Duration::from_millis(250));
        self.logger.log_pictograms_refreshed(self.user.len(), elapsed);
        Ok(())
    }

    /// Copy the supplied image and sound into storage as a new pictogram.
    ///
    /// `category` of `None` files the pictogram under `Personalizados`. The
    /// stem derived from `name` must be unused, and `name` must not match a
    /// built-in pictogram.
    pub fn create_pictogram(
        &mut self,
        name: &str,
        image_source: Option<&Path>,
        audio_source: Option<&Path>,
        category: Option<Category>,
    ) -> Result<Pictogram, PictogramError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PictogramError::MissingField { field: "name" });
        }
        let image_source = non_empty(image_source).ok_or(PictogramError::MissingField { field: "image" })?;
        let audio_source = non_empty(audio_source).ok_or(PictogramError::MissingField { field: "audio" })?;

        let category = category.unwrap_or(Category::Personalizados);
        if category.is_filter_only() {
            return Err(PictogramError::FilterOnlyCategory {
                category: category.to_string(),
            });
        }

        let stem = sanitize_name(name);
        if stem.is_empty() {
            return Err(PictogramError::EmptyStem {
                name: name.to_string(),
            });
        }

        let mut metadata = self.load_metadata_lenient()?;
        if catalog::find_by_name_ignore_case(name).is_some()
            || self.files.stem_exists(&stem)
            || self
                .user
                .iter()
                .any(|p| p.name == name || stem_of(p).is_some_and(|s| s.eq_ignore_ascii_case(&stem)))
        {
            return Err(PictogramError::AlreadyExists {
                name: name.to_string(),
            });
        }

        let pair = self.files.install(&stem, image_source, audio_source)?;

        metadata.insert(
            stem.clone(),
            PictogramMeta {
                name: name.to_string(),
                category,
            },
        );
        if let Err(e) = save_json(&mut self.kv, METADATA_KEY, &metadata) {
            self.discard_pair(&pair);
            return Err(e.into());
        }

        self.refresh_user_pictograms()?;
        self.logger.log_pictogram_created(name, category);

        Ok(self
            .user
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .unwrap_or_else(|| {
                Pictogram::new(
                    name,
                    AssetRef::External(pair.image.clone()),
                    AssetRef::External(pair.sound.clone()),
                    category,
                )
            }))
    }

    /// Delete a user pictogram's files and metadata. Deleting one that is
    /// already gone succeeds.
    pub fn delete_pictogram(&mut self, pictogram: &Pictogram) -> Result<(), PictogramError> {
        if catalog::is_builtin_name(&pictogram.name) {
            return Err(PictogramError::Protected {
                name: pictogram.name.clone(),
            });
        }

        // Only ever touch files under the store's own directories
        let stored = self.user.iter().find(|p| p.name == pictogram.name);
        let stem = stored
            .and_then(stem_of)
            .map(str::to_string)
            .unwrap_or_else(|| sanitize_name(&pictogram.name));
        let targets = match stored {
            Some(p) => [&p.image, &p.audio]
                .into_iter()
                .filter_map(|asset| asset.external_path().map(Path::to_path_buf))
                .collect(),
            None => vec![self.files.image_path(&stem), self.files.sound_path(&stem)],
        };

        for path in targets.iter().filter(|path| self.files.owns(path)) {
            self.files.remove(path)?;
        }

        let mut metadata = self.load_metadata_lenient()?;
        if metadata.remove(&stem).is_some() {
            save_json(&mut self.kv, METADATA_KEY, &metadata)?;
        }

        self.refresh_user_pictograms()?;
        self.logger.log_pictogram_deleted(&pictogram.name);
        Ok(())
    }

    /// Look a pictogram up by display name, then delete it
    pub fn delete_by_name(&mut self, name: &str) -> Result<(), PictogramError> {
        if catalog::is_builtin_name(name) {
            return Err(PictogramError::Protected {
                name: name.to_string(),
            });
        }

        let pictogram = self
            .find(name)
            .cloned()
            .ok_or_else(|| PictogramError::NotFound {
                name: name.to_string(),
            })?;
        self.delete_pictogram(&pictogram)
    }

    /// Damaged metadata is logged and ignored: pictograms then fall back to
    /// their stem as display name.
    fn load_metadata_lenient(&self) -> Result<MetadataMap, StorageError> {
        match load_json::<MetadataMap, S>(&self.kv, METADATA_KEY) {
            Ok(map) => Ok(map.unwrap_or_default()),
            Err(StorageError::Serialization { key, source }) => {
                log::warn!("Ignoring damaged metadata under '{}': {}", key, source);
                Ok(MetadataMap::new())
            }
            Err(e) => Err(e),
        }
    }

    fn discard_pair(&self, pair: &StoredPair) {
        for path in [&pair.image, &pair.sound] {
            if let Err(e) = self.files.remove(path) {
                log::warn!("Could not roll back {}: {}", path.display(), e);
            }
        }
    }
}

/// File stem of a user pictogram's stored image
fn stem_of(pictogram: &Pictogram) -> Option<&str> {
    pictogram
        .image
        .external_path()
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
}

fn non_empty(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !p.as_os_str().is_empty())
}
