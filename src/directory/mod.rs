//! Directory backends.
//!
//! Two implementations of [`crate::core::DirectoryProvider`]: the Microsoft
//! Graph REST API and an in-memory demo fixture selected at configuration
//! time.

pub mod demo;
pub mod graph;

pub use demo::DemoDirectory;
pub use graph::GraphDirectory;
