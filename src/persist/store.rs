use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::{Error, Result};
use crate::persist::frame::{Frame, FrameKind};
use crate::persist::metadata::{Metadata, MetadataPolicy};
use crate::persist::metadata_path;
use crate::persist::staged::StagedFile;
use crate::table::{CsvFormat, Table};

/// An object with a metadata map kept in a `.info` file beside its data.
pub trait MetadataStore {
    fn metadata(&self) -> &Metadata;

    fn metadata_mut(&mut self) -> &mut Metadata;

    fn metadata_policy(&self) -> MetadataPolicy {
        MetadataPolicy::default()
    }

    fn save_metadata(&self, path: &Path) -> Result<()> {
        stage_metadata(self.metadata(), path)?.commit()
    }

    /// Replaces the metadata with the contents of the `.info` file of `path`.
    fn load_metadata(&mut self, path: &Path) -> Result<()> {
        *self.metadata_mut() = read_metadata(path, &self.metadata_policy())?;
        Ok(())
    }
}

fn read_metadata(path: &Path, policy: &MetadataPolicy) -> Result<Metadata> {
    let info = metadata_path(path)?;
    let reader = BufReader::new(File::open(&info)?);
    let metadata = Metadata::read_from(reader, policy)?;
    tracing::debug!(path = %info.display(), keys = metadata.len(), "read metadata");
    Ok(metadata)
}

fn stage_metadata(metadata: &Metadata, path: &Path) -> Result<StagedFile> {
    let mut staged = StagedFile::create(&metadata_path(path)?)?;
    metadata.write_to(BufWriter::new(staged.file_mut()))?;
    Ok(staged)
}

/// A [`MetadataStore`] that also owns a generic table, written verbatim to
/// the data path.
pub trait TabularStore: MetadataStore {
    fn data(&self) -> &Table;

    fn data_mut(&mut self) -> &mut Table;

    fn data_format(&self) -> CsvFormat {
        CsvFormat::default()
    }

    /// Writes both files. Neither is replaced until both have been written
    /// in full, though a failure between the two renames can still leave
    /// new metadata beside old data.
    fn save_tabular(&self, path: &Path) -> Result<()> {
        let info = stage_metadata(self.metadata(), path)?;
        let mut data = StagedFile::create(path)?;
        self.data().write_to(data.file_mut(), &self.data_format())?;
        info.commit()?;
        data.commit()
    }

    /// Reads both files before replacing anything, so a failed load leaves
    /// `self` as it was.
    fn load_tabular(&mut self, path: &Path) -> Result<()> {
        let metadata = read_metadata(path, &self.metadata_policy())?;
        let data = Table::read_with(path, &self.data_format())?;
        *self.metadata_mut() = metadata;
        *self.data_mut() = data;
        Ok(())
    }
}

/// An object exposing its data through a getter/setter pair and declaring
/// which [`FrameKind`] that data must be.
pub trait DataProperty {
    fn data(&self) -> &Frame;

    fn set_data(&mut self, frame: Frame);

    fn frame_kind(&self) -> FrameKind {
        FrameKind::Table
    }

    fn frame_format(&self) -> CsvFormat {
        CsvFormat::default()
    }

    fn save_frame(&self, path: &Path) -> Result<()> {
        let expected = self.frame_kind();
        let found = self.data().kind();
        if found != expected {
            return Err(Error::TypeMismatch {
                expected: expected.name(),
                found: found.name(),
            });
        }
        let mut staged = StagedFile::create(path)?;
        self.data().write_to(staged.file_mut(), &self.frame_format())?;
        staged.commit()
    }

    fn load_frame(&mut self, path: &Path) -> Result<()> {
        let table = Table::read_with(path, &self.frame_format())?;
        self.set_data(Frame::coerce(table, self.frame_kind())?);
        Ok(())
    }
}
