//! Pure roster view-model: member resolution, sorting, filtering, column
//! projection, preference persistence and the reducer that ties them together.
//! Nothing in this crate touches the browser.

pub mod activity;
pub mod colors;
pub mod columns;
pub mod comparison;
pub mod error;
pub mod export;
pub mod filter;
pub mod heroes;
pub mod history;
pub mod insights;
pub mod league;
pub mod model;
pub mod notes;
pub mod permissions;
pub mod preferences;
pub mod resolver;
pub mod roster_diff;
pub mod sort;
pub mod tag;
pub mod view_model;

pub use error::{ExportError, FetchError, StorageError, TagError};
pub use model::*;
pub use view_model::{Action, RosterRow, RosterScope, RosterViewState, derive_rows, reduce};
