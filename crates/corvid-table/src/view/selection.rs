//! Lazily materialized selection snapshots.

use corvid_common::{CorvidError, Result, SnapshotBacking, SnapshotConfig};
use corvid_storage::{ByteStore, FileStore, ItemCodec, MemoryStore, RowId, RowIdCodec, SortedIndex};
use tracing::{debug, warn};

pub(crate) type SnapshotIndex = SortedIndex<RowIdCodec, Box<dyn ByteStore>>;

/// Row ids of a view in selection order.
///
/// The source iterator is single-pass. It is drained into a positional index
/// the first time the selection is read, and never consulted again once the
/// drain completes. A drain that fails keeps its partial index, the source
/// and the id it could not place, so the next read resumes where it stopped.
pub(crate) struct Selection {
    source: Option<Box<dyn Iterator<Item = RowId> + Send>>,
    snapshot: Option<SnapshotIndex>,
    /// Drawn from the source but not yet stored.
    unplaced: Option<RowId>,
    config: SnapshotConfig,
}

impl Selection {
    pub(crate) fn new<I>(source: I) -> Self
    where
        I: IntoIterator<Item = RowId>,
        I::IntoIter: Send + 'static,
    {
        Self {
            source: Some(Box::new(source.into_iter())),
            snapshot: None,
            unplaced: None,
            config: SnapshotConfig::default(),
        }
    }

    pub(crate) fn set_config(&mut self, config: SnapshotConfig) {
        self.config = config;
    }

    pub(crate) fn is_materialized(&self) -> bool {
        self.snapshot.is_some() && self.source.is_none()
    }

    fn open_store(&self) -> Result<Box<dyn ByteStore>> {
        Ok(match self.config.backing {
            SnapshotBacking::Memory => Box::new(MemoryStore::with_capacity(
                self.config.initial_capacity_items * RowIdCodec.width(),
            )),
            SnapshotBacking::TempFile => {
                Box::new(FileStore::temporary(self.config.temp_dir.as_deref())?)
            }
        })
    }

    /// Returns the snapshot index, draining the source on first use.
    pub(crate) fn snapshot(&mut self) -> Result<&mut SnapshotIndex> {
        if self.snapshot.is_none() {
            self.snapshot = Some(SortedIndex::open(RowIdCodec, self.open_store()?)?);
        }
        let index = self
            .snapshot
            .as_mut()
            .ok_or_else(|| CorvidError::Internal("selection snapshot missing".to_string()))?;

        if let Some(source) = self.source.as_mut() {
            let ids = self.unplaced.take().into_iter();
            for id in ids.chain(source.by_ref()) {
                if let Err(e) = index.add(&id) {
                    warn!(row = %id, stored = index.count(), error = %e, "selection drain interrupted");
                    self.unplaced = Some(id);
                    return Err(e);
                }
            }
            self.source = None;
            debug!(
                rows = index.count(),
                backing = ?self.config.backing,
                "materialized selection snapshot"
            );
        }
        Ok(index)
    }
}

impl std::fmt::Debug for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("materialized", &self.is_materialized())
            .field("rows", &self.snapshot.as_ref().map(|s| s.count()))
            .field("config", &self.config)
            .finish()
    }
}
