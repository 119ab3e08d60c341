//! Saving and loading objects as a pair of files: a JSON metadata file next to
//! a delimited-text data file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub mod frame;
pub mod metadata;
pub mod records;
mod staged;
pub mod store;

pub use frame::{Frame, FrameKind};
pub use metadata::{MetaValue, Metadata, MetadataPolicy};
pub use records::{FrameRecord, MetadataRecord, TabularRecord};
pub use store::{DataProperty, MetadataStore, TabularStore};

/// Appended to the data file name to get the metadata file name.
pub const METADATA_SUFFIX: &str = ".info";

/// Something that can be written to and restored from a path.
///
/// Both operations fail with [`Error::NotImplemented`] unless overridden.
pub trait Persistable: Sized {
    fn save(&self, _path: &Path) -> Result<()> {
        Err(not_implemented::<Self>("save"))
    }

    /// Replaces the persisted state of `self` with what is stored at `path`.
    fn load(self, _path: &Path) -> Result<Self> {
        Err(not_implemented::<Self>("load"))
    }
}

fn not_implemented<T>(operation: &'static str) -> Error {
    Error::NotImplemented {
        operation,
        type_name: std::any::type_name::<T>(),
    }
}

/// The metadata file belonging to a data file: `run.csv` -> `run.csv.info`.
pub fn metadata_path(path: &Path) -> Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| Error::InvalidPath {
        path: path.to_path_buf(),
    })?;
    let mut name = OsString::from(name);
    name.push(METADATA_SUFFIX);
    Ok(path.with_file_name(name))
}
