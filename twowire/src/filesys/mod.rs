//! Filesystem helpers

pub mod file;

pub use file::File;
