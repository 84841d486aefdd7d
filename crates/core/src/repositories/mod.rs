//! Services over the document store.
//!
//! Each service holds the store behind an `Arc` and is cheap to clone, so front ends build them
//! once at startup and share them between handlers.

pub mod assignment;
pub mod documents;
pub mod patients;
pub mod raw_lab;
