//! Configuration structures for CorvidDB.

use crate::error::{CorvidError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Settings applied to secondary indexes.
    pub index: IndexConfig,
    /// Settings for selection snapshots built by updatable views.
    pub snapshot: SnapshotConfig,
    /// Reject commits that leave a non-nullable column null.
    pub enforce_not_null: bool,
}

impl EngineConfig {
    /// Checks the configuration for values the engine cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.snapshot.backing == SnapshotBacking::TempFile {
            if let Some(dir) = &self.snapshot.temp_dir {
                if !dir.is_dir() {
                    return Err(CorvidError::ConfigError(format!(
                        "snapshot temp_dir {} is not a directory",
                        dir.display()
                    )));
                }
            }
        }
        if self.index.read_only && self.index.initial_capacity_items > 0 {
            return Err(CorvidError::ConfigError(
                "read-only indexes cannot reserve capacity".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for sorted indexes created by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Number of elements to reserve room for up front.
    pub initial_capacity_items: usize,
    /// Open indexes read-only (mutations fail with ReadOnly).
    pub read_only: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            initial_capacity_items: 64,
            read_only: false,
        }
    }
}

/// Configuration for selection snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Where the snapshot index keeps its bytes.
    pub backing: SnapshotBacking,
    /// Directory for temp-file snapshots (system temp dir when None).
    pub temp_dir: Option<PathBuf>,
    /// Number of row identifiers to reserve room for up front.
    pub initial_capacity_items: usize,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            backing: SnapshotBacking::Memory,
            temp_dir: None,
            initial_capacity_items: 256,
        }
    }
}

/// Backing store kind for selection snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SnapshotBacking {
    /// Keep the snapshot in memory.
    #[default]
    Memory,
    /// Spill the snapshot to an anonymous temporary file.
    TempFile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.index.initial_capacity_items, 64);
        assert!(!config.index.read_only);
        assert_eq!(config.snapshot.backing, SnapshotBacking::Memory);
        assert!(config.snapshot.temp_dir.is_none());
        assert_eq!(config.snapshot.initial_capacity_items, 256);
        assert!(!config.enforce_not_null);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_engine_config_serde_roundtrip() {
        let original = EngineConfig {
            snapshot: SnapshotConfig {
                backing: SnapshotBacking::TempFile,
                temp_dir: Some(PathBuf::from("/tmp")),
                initial_capacity_items: 16,
            },
            enforce_not_null: true,
            ..Default::default()
        };
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: EngineConfig = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized.snapshot.backing, SnapshotBacking::TempFile);
        assert_eq!(deserialized.snapshot.temp_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(deserialized.snapshot.initial_capacity_items, 16);
        assert!(deserialized.enforce_not_null);
    }

    #[test]
    fn test_validate_rejects_missing_temp_dir() {
        let config = EngineConfig {
            snapshot: SnapshotConfig {
                backing: SnapshotBacking::TempFile,
                temp_dir: Some(PathBuf::from("/definitely/not/a/real/dir")),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CorvidError::ConfigError(_))
        ));
    }

    #[test]
    fn test_validate_ignores_temp_dir_for_memory_backing() {
        let config = EngineConfig {
            snapshot: SnapshotConfig {
                backing: SnapshotBacking::Memory,
                temp_dir: Some(PathBuf::from("/definitely/not/a/real/dir")),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_read_only_with_capacity() {
        let config = EngineConfig {
            index: IndexConfig {
                initial_capacity_items: 10,
                read_only: true,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            index: IndexConfig {
                initial_capacity_items: 0,
                read_only: true,
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_snapshot_backing_serde_roundtrip() {
        for backing in [SnapshotBacking::Memory, SnapshotBacking::TempFile] {
            let serialized = serde_json::to_string(&backing).unwrap();
            let deserialized: SnapshotBacking = serde_json::from_str(&serialized).unwrap();
            assert_eq!(backing, deserialized);
        }
    }
}
