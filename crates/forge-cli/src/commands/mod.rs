//! CLI command implementations.

pub mod common;
pub mod enumerate;
pub mod index;
pub mod init;
pub mod inspect;
pub mod version;
