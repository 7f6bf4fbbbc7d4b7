//! Screen controllers. Each owns its store and shares the process-wide
//! audio session, and decides what a finished sound means for it.

pub mod music;
pub mod pictograms;

pub use music::MusicPlayer;
pub use pictograms::{NavigationParams, PictogramBoard};
