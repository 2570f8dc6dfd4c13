// file: src/repository/mod.rs
// description: Repository operations module exports
// reference: Internal module structure

pub mod git;
pub mod scanner;
pub mod schema;
pub mod source;
pub mod store;

pub use git::GitRepository;
pub use scanner::{FileScanner, ScannedFile};
pub use schema::AdminConfigSchemas;
pub use source::{BlobSource, ChangeStatusSource, NoSchemas, SchemaSource};
pub use store::ArticleStore;
