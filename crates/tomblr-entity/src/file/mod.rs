//! File domain entities.

pub mod model;
pub mod position;

pub use model::{CreateFile, File, SharedFile};
pub use position::{ItemKind, PositionUpdate};
