//! Database configuration (`SPEC_FULL.md` §7 "Ambient stack": a
//! `DatabaseConfig`/builder pair in the shape of the teacher's
//! `engine::database::config`/`engine::database::builder`, minus the
//! durability-mode and model-endpoint settings this spec's Non-goals
//! exclude).

use std::path::PathBuf;

use ukv_core::Limits;
use ukv_storage::DEFAULT_SHARD_COUNT;

/// Configuration for opening a [`crate::Database`].
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Number of shards partitioning the ordered-set engine
    /// (`SPEC_FULL.md` §4.1).
    pub shard_count: usize,
    /// If set, the engine loads its full image from this file on open and
    /// can flush back to it (`SPEC_FULL.md` §4.1 "Persistence").
    pub persistence_path: Option<PathBuf>,
    /// Size limits enforced by wire-request validation.
    pub limits: Limits,
    /// `true` if the graph modality should treat edges as directed.
    pub directed_graph: bool,
}

impl Default for DatabaseConfig {
    fn default() -> DatabaseConfig {
        DatabaseConfig {
            shard_count: DEFAULT_SHARD_COUNT,
            persistence_path: None,
            limits: Limits::default(),
            directed_graph: true,
        }
    }
}

/// Fluent builder for [`DatabaseConfig`], mirroring the three-ways-to-open
/// pattern the teacher's `DatabaseBuilder` offers (`SPEC_FULL.md` §7).
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfigBuilder {
    config: DatabaseConfig,
}

impl DatabaseConfigBuilder {
    /// Start from the default configuration.
    pub fn new() -> DatabaseConfigBuilder {
        DatabaseConfigBuilder::default()
    }

    /// Override the shard count.
    pub fn shard_count(mut self, shard_count: usize) -> DatabaseConfigBuilder {
        self.config.shard_count = shard_count;
        self
    }

    /// Persist to (and load from, if present) this path.
    pub fn persistence_path(mut self, path: impl Into<PathBuf>) -> DatabaseConfigBuilder {
        self.config.persistence_path = Some(path.into());
        self
    }

    /// Override the size limits.
    pub fn limits(mut self, limits: Limits) -> DatabaseConfigBuilder {
        self.config.limits = limits;
        self
    }

    /// Treat the graph modality's edges as undirected.
    pub fn undirected_graph(mut self) -> DatabaseConfigBuilder {
        self.config.directed_graph = false;
        self
    }

    /// Finish building.
    pub fn build(self) -> DatabaseConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_storage_crate_default_shard_count() {
        let config = DatabaseConfig::default();
        assert_eq!(config.shard_count, DEFAULT_SHARD_COUNT);
        assert!(config.persistence_path.is_none());
        assert!(config.directed_graph);
    }

    #[test]
    fn builder_overrides_apply() {
        let config = DatabaseConfigBuilder::new().shard_count(8).undirected_graph().build();
        assert_eq!(config.shard_count, 8);
        assert!(!config.directed_graph);
    }
}
