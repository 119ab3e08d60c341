use std::path::Path;

use crate::error::Result;
use crate::persist::frame::{Frame, FrameKind};
use crate::persist::metadata::Metadata;
use crate::persist::store::{DataProperty, MetadataStore, TabularStore};
use crate::persist::Persistable;
use crate::table::Table;

/// Metadata only: saving `run` writes `run.info`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataRecord {
    pub metadata: Metadata,
}

impl MetadataStore for MetadataRecord {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

impl Persistable for MetadataRecord {
    fn save(&self, path: &Path) -> Result<()> {
        self.save_metadata(path)?;
        tracing::info!(path = %path.display(), "saved metadata record");
        Ok(())
    }

    fn load(mut self, path: &Path) -> Result<Self> {
        self.load_metadata(path)?;
        tracing::info!(path = %path.display(), "loaded metadata record");
        Ok(self)
    }
}

/// Metadata plus a table: saving `run.csv` writes `run.csv` and `run.csv.info`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularRecord {
    pub metadata: Metadata,
    pub data: Table,
}

impl MetadataStore for TabularRecord {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

impl TabularStore for TabularRecord {
    fn data(&self) -> &Table {
        &self.data
    }

    fn data_mut(&mut self) -> &mut Table {
        &mut self.data
    }
}

impl Persistable for TabularRecord {
    fn save(&self, path: &Path) -> Result<()> {
        self.save_tabular(path)?;
        tracing::info!(path = %path.display(), rows = self.data.len(), "saved tabular record");
        Ok(())
    }

    fn load(mut self, path: &Path) -> Result<Self> {
        self.load_tabular(path)?;
        tracing::info!(path = %path.display(), rows = self.data.len(), "loaded tabular record");
        Ok(self)
    }
}

/// A single frame that must be of the declared kind, without metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameRecord {
    kind: FrameKind,
    data: Frame,
}

impl FrameRecord {
    /// An empty record that accepts frames of `kind`.
    pub fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            data: Frame::default(),
        }
    }

    pub fn with_data(kind: FrameKind, data: impl Into<Frame>) -> Self {
        Self {
            kind,
            data: data.into(),
        }
    }

    #[inline]
    pub fn kind(&self) -> FrameKind {
        self.kind
    }
}

impl DataProperty for FrameRecord {
    fn data(&self) -> &Frame {
        &self.data
    }

    fn set_data(&mut self, frame: Frame) {
        self.data = frame;
    }

    fn frame_kind(&self) -> FrameKind {
        self.kind
    }
}

impl Persistable for FrameRecord {
    fn save(&self, path: &Path) -> Result<()> {
        self.save_frame(path)?;
        tracing::info!(path = %path.display(), kind = %self.kind, "saved frame record");
        Ok(())
    }

    fn load(mut self, path: &Path) -> Result<Self> {
        self.load_frame(path)?;
        tracing::info!(path = %path.display(), kind = %self.kind, "loaded frame record");
        Ok(self)
    }
}
