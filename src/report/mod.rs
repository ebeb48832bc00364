//! Reporting utilities: formatted terminal output for recasts, widths and catalogs.

pub mod format;

pub use format::*;
