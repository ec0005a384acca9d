//! Directory module: domain records, input rules, password hashing,
//! request dispatch and the service running the five operations.
//!
//! Records are addressed by position. An index is only meaningful against
//! the collection it was read from; every mutation returns the fresh
//! collection and clients are expected to re-read indices from it.

pub mod domain;
pub mod validation;
pub mod password;
pub mod dispatch;
pub mod service;

pub use dispatch::{Action, Command, RequestFields, Verb};
pub use service::{DirectoryConfig, DirectoryService, Reply};
