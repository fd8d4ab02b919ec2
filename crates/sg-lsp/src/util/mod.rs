//! URI handling and other small utilities.

pub mod log;
pub mod project;
pub mod uri;
