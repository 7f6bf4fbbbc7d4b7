pub mod decoder;
pub mod native;
pub mod resampler;
pub mod session;

#[cfg(test)]
pub mod testing;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog;
use crate::error::AudioError;
use crate::models::AssetRef;

pub use native::NativeBackend;
pub use session::{AudioSessionManager, PlayOutcome};

/// A loaded, playable sound. Dropping or unloading it releases its resources.
pub trait SoundHandle {
    /// Start or continue playback from the current position
    fn play(&mut self) -> Result<(), AudioError>;

    fn pause(&mut self) -> Result<(), AudioError>;

    /// Halt output; the handle stays loaded
    fn stop(&mut self) -> Result<(), AudioError>;

    fn seek_to_start(&mut self) -> Result<(), AudioError>;

    fn position(&self) -> Duration;

    fn duration(&self) -> Option<Duration>;

    /// True once playback has reached the end of the sound
    fn is_finished(&self) -> bool;

    fn unload(self)
    where
        Self: Sized,
    {
    }
}

/// Loads sounds from resolved file paths. Loading is the one suspension point
/// of the playback lifecycle.
#[allow(async_fn_in_trait)]
pub trait AudioBackend {
    type Handle: SoundHandle;

    async fn load(&self, path: &Path) -> Result<Self::Handle, AudioError>;
}

/// Turns an `AssetRef` into a loadable file path
#[derive(Debug, Clone)]
pub struct AssetResolver {
    assets_dir: PathBuf,
}

impl AssetResolver {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
        }
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    pub fn resolve(&self, source: &AssetRef) -> Result<PathBuf, AudioError> {
        let path = match source {
            AssetRef::BuiltIn(id) => {
                if !catalog::contains_asset(id.as_str()) {
                    return Err(AudioError::UnknownAsset { id: id.to_string() });
                }
                self.assets_dir.join(id.as_str())
            }
            AssetRef::External(path) => path.clone(),
        };

        if !path.is_file() {
            return Err(AudioError::SourceNotFound {
                path: path.display().to_string(),
            });
        }
        Ok(path)
    }
}
