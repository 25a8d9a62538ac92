//! Shared scaffolding for bog's binaries.

pub mod common;
