//! CLI commands implementation

pub mod ask;
pub mod embed;
pub mod ingest;
pub mod init;
pub mod query;
pub mod status;

pub use ask::*;
pub use embed::*;
pub use ingest::*;
pub use init::*;
pub use query::*;
pub use status::*;
