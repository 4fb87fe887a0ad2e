//! CLI commands implementation

pub mod catalog;
pub mod ingest;
pub mod init;
pub mod migrate;
pub mod serve;
pub mod status;

pub use catalog::*;
pub use ingest::*;
pub use init::*;
pub use migrate::*;
pub use serve::*;
pub use status::*;
