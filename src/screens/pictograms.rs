use std::rc::Rc;

use crate::audio::{AudioBackend, AudioSessionManager, PlayOutcome};
use crate::capture::PictogramDraft;
use crate::error::{AppError, PictogramError};
use crate::kv::KeyValueStore;
use crate::models::{Category, Pictogram};
use crate::pictograms::PictogramStore;

/// Signals passed when navigating to the pictogram board
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationParams {
    /// Rescan user pictograms before showing the board
    pub refresh: bool,
    /// `Some` switches the delete affordance on or off
    pub edit_mode: Option<bool>,
}

impl NavigationParams {
    pub fn refresh() -> Self {
        Self {
            refresh: true,
            edit_mode: None,
        }
    }

    pub fn edit_mode(enabled: bool) -> Self {
        Self {
            refresh: false,
            edit_mode: Some(enabled),
        }
    }
}

/// The pictogram grid: category filter, tap-to-speak and edit-mode deletes
pub struct PictogramBoard<S: KeyValueStore, B: AudioBackend> {
    store: PictogramStore<S>,
    session: Rc<AudioSessionManager<B>>,
    category: Category,
    edit_mode: bool,
}

impl<S: KeyValueStore, B: AudioBackend> PictogramBoard<S, B> {
    pub fn new(store: PictogramStore<S>, session: Rc<AudioSessionManager<B>>) -> Self {
        Self {
            store,
            session,
            category: Category::Todos,
            edit_mode: false,
        }
    }

    pub fn store(&self) -> &PictogramStore<S> {
        &self.store
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn set_edit_mode(&mut self, enabled: bool) {
        self.edit_mode = enabled;
    }

    pub fn select_category(&mut self, category: Category) {
        self.category = category;
    }

    pub fn on_focus(&mut self, params: NavigationParams) -> Result<(), PictogramError> {
        if let Some(enabled) = params.edit_mode {
            self.edit_mode = enabled;
        }
        if params.refresh || !self.store.is_loaded() {
            self.store.refresh_user_pictograms()?;
        }
        Ok(())
    }

    /// Pictograms shown under the selected category
    pub fn visible(&self) -> Vec<Pictogram> {
        self.store.list_by_category(self.category)
    }

    /// Speak the pictogram named `name`
    pub async fn tap(&self, name: &str) -> Result<PlayOutcome, AppError> {
        let pictogram = self
            .store
            .find(name)
            .cloned()
            .ok_or_else(|| PictogramError::NotFound { name: name.to_string() })?;

        Ok(self.session.play(&pictogram.audio).await?)
    }

    /// Delete a pictogram. Outside edit mode nothing happens and `false` is
    /// returned.
    pub fn delete(&mut self, name: &str) -> Result<bool, PictogramError> {
        if !self.edit_mode {
            return Ok(false);
        }

        let playing = self
            .store
            .find(name)
            .map(|p| Some(&p.audio) == self.session.current_source().as_ref())
            .unwrap_or(false);

        self.store.delete_by_name(name)?;
        if playing {
            self.session.stop();
        }
        Ok(true)
    }

    /// Save a filled-in draft into the board's store
    pub fn create(&mut self, draft: &mut PictogramDraft) -> Result<Pictogram, PictogramError> {
        draft.save(&mut self.store)
    }

    /// Pictogram sounds are one-shot
    pub fn on_playback_complete(&self) {
        self.session.stop();
    }
}
