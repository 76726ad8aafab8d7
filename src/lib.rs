// Library for tests, demos and the binary to access modules

pub mod config;
pub mod docker_repo;
pub mod engine;
pub mod error;
pub mod history;
pub mod humanize;
pub mod models;
pub mod normalizer;
pub mod source;
pub mod tracker;
pub mod version;
pub mod worker;

pub use engine::Engine;
pub use error::{ConfigError, SourceError};
pub use source::StatsSource;
