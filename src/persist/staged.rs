use std::fs::{File, Permissions};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::Result;

/// A file written under a temporary name in its destination directory and
/// moved into place by [`commit`](Self::commit). Dropping it uncommitted
/// removes the temporary file and leaves the destination untouched.
///
/// The committed file keeps the permissions of the file it replaces, or gets
/// the ones a plain `File::create` would give it.
pub(crate) struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedFile {
    pub(crate) fn create(target: &Path) -> Result<Self> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut builder = tempfile::Builder::new();
        if let Some(permissions) = create_permissions() {
            builder.permissions(permissions);
        }
        let temp = builder.tempfile_in(dir)?;
        if let Ok(existing) = std::fs::metadata(target) {
            temp.as_file().set_permissions(existing.permissions())?;
        }
        Ok(Self {
            temp,
            target: target.to_path_buf(),
        })
    }

    #[inline]
    pub(crate) fn file_mut(&mut self) -> &mut File {
        self.temp.as_file_mut()
    }

    pub(crate) fn commit(self) -> Result<()> {
        self.temp.persist(&self.target)?;
        tracing::debug!(path = %self.target.display(), "committed file");
        Ok(())
    }
}

/// Mode of a newly created file before the umask, as `File::create` uses.
#[cfg(unix)]
fn create_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o666))
}

#[cfg(not(unix))]
fn create_permissions() -> Option<Permissions> {
    None
}
