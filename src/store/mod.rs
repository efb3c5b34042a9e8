//! Persistence collaborators: a REST client, a local JSON database and
//! an in-memory store for tests.

pub mod document;
pub mod file;
pub mod http;
pub mod memory;
pub mod traits;

pub use document::Document;
pub use file::FileCollaborator;
pub use http::HttpCollaborator;
pub use memory::MemoryCollaborator;
pub use traits::{Collaborator, Collection};
