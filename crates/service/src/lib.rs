//! Service layer for the user directory.
//! - Loads, validates and mutates the user collection.
//! - Keeps persistence behind the `UserStore` trait.
//! - Provides clear error types and documented interfaces.

pub mod errors;
pub mod directory;
pub mod storage;

pub use directory::DirectoryService;
pub use errors::DirectoryError;
