//! Input/output helpers.
//!
//! - numeric tables (`table`)
//! - JSON definition records (`records`)
//! - name resolution and batch loading (`loader`)
//! - recast result exports (`export`)

pub mod export;
pub mod loader;
pub mod records;
pub mod table;

pub use export::*;
pub use loader::*;
pub use records::*;
pub use table::*;
