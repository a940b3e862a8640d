pub mod client;
pub mod config;
pub mod errors;
pub mod importer;
pub mod loader;
pub mod preparer;
pub mod resolver;
pub mod submitter;
pub mod typemap;
pub mod types;
