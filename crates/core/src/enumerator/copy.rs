//! Pass-through copies.

use std::fs::{self, File, FileTimes};
use std::io;
use std::path::Path;
use tracing::debug;

/// Copies a file byte for byte, keeping permissions and access/modification times.
///
/// Returns the number of bytes copied. Copying a file onto itself is
/// refused. Failing to restore the timestamps is logged but does not fail
/// the copy.
pub fn copy_preserving(source: &Path, destination: &Path) -> io::Result<u64> {
    if is_same_file(source, destination) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} and {} are the same file", source.display(), destination.display()),
        ));
    }
    // fs::copy carries the permission bits over.
    let bytes = fs::copy(source, destination)?;

    let metadata = fs::metadata(source)?;
    let mut times = FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Err(e) = File::open(destination).and_then(|f| f.set_times(times)) {
        debug!(destination = %destination.display(), error = %e, "Could not restore file times");
    }

    Ok(bytes)
}

#[cfg(unix)]
fn is_same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
