//! Directory walk producing conversion tasks.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use super::copy::copy_preserving;
use super::error::EnumerateError;
use super::types::{Enumeration, EnumerationOptions};
use crate::converter::ConversionTask;
use crate::fits::FITS_EXTENSION;
use crate::xisf::XISF_EXTENSION;

/// Whether a file is a FITS source, by extension, ignoring case.
pub fn is_convertible(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(FITS_EXTENSION))
}

/// Output path of a source already mirrored under the output root.
pub fn destination_for(mirrored: &Path) -> PathBuf {
    mirrored.with_extension(XISF_EXTENSION)
}

/// `path` relative to `base` for log lines, or the full path outside it.
pub fn relative_display(path: &Path, base: &Path) -> String {
    path.strip_prefix(base).unwrap_or(path).display().to_string()
}

/// Walks the input tree, mirrors directories and copies pass-through files.
///
/// Runs to completion before any conversion is dispatched. Only an
/// unreadable input root, an output directory that cannot be created or
/// one that resolves to the input stops the walk. Each output path is
/// claimed by the first entry that maps to it; later entries are skipped.
pub fn enumerate(options: &EnumerationOptions) -> Result<Enumeration, EnumerateError> {
    let input = &options.input_dir;
    let output = &options.output_dir;

    fs::create_dir_all(output).map_err(|source| EnumerateError::CreateDir {
        path: output.clone(),
        source,
    })?;
    let excluded = fs::canonicalize(output).ok();
    if let (Some(output_root), Ok(input_root)) = (&excluded, fs::canonicalize(input)) {
        if *output_root == input_root {
            return Err(EnumerateError::OutputIsInput { path: output.clone() });
        }
    }

    let mut enumeration = Enumeration::default();
    let mut claimed = HashSet::new();
    let walker = WalkDir::new(input)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_output_root(entry, excluded.as_deref()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(EnumerateError::InputUnreadable {
                    path: input.clone(),
                    source: e,
                })
            }
            Err(e) => {
                warn!(path = ?e.path(), error = %e, "Skipping unreadable entry");
                enumeration.stats.unreadable += 1;
                continue;
            }
        };

        let Ok(relative) = entry.path().strip_prefix(input) else {
            continue;
        };
        let target = output.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|source| EnumerateError::CreateDir {
                path: target.clone(),
                source,
            })?;
            enumeration.stats.directories += 1;
            continue;
        }
        if entry.path_is_symlink() && entry.path().is_dir() {
            debug!(path = %relative.display(), "Not following directory symlink");
            continue;
        }

        if is_convertible(entry.path()) {
            let destination = destination_for(&target);
            if !claimed.insert(destination.clone()) {
                warn!(
                    source = %relative.display(),
                    destination = %relative_display(&destination, output),
                    "Skipping, another file already converts to this output"
                );
                enumeration.stats.collisions += 1;
                continue;
            }
            if options.skip_existing && destination.exists() {
                info!(source = %relative.display(), "Skipping, XISF file already exists");
                enumeration.stats.skipped += 1;
                continue;
            }
            enumeration
                .tasks
                .push(ConversionTask::new(entry.path(), destination));
        } else {
            if !claimed.insert(target.clone()) {
                warn!(file = %relative.display(), "Not copying, a converted file uses this output");
                enumeration.stats.collisions += 1;
                continue;
            }
            match copy_preserving(entry.path(), &target) {
                Ok(bytes) => {
                    debug!(file = %relative.display(), bytes, "Copied");
                    enumeration.stats.copied += 1;
                    enumeration.stats.bytes_copied += bytes;
                }
                Err(e) => {
                    warn!(file = %relative.display(), error = %e, "Failed to copy file");
                    enumeration.stats.copy_failures += 1;
                }
            }
        }
    }

    let stats = &enumeration.stats;
    info!(
        tasks = enumeration.tasks.len(),
        directories = stats.directories,
        skipped = stats.skipped,
        copied = stats.copied,
        copy_failures = stats.copy_failures,
        collisions = stats.collisions,
        "Enumeration complete"
    );
    Ok(enumeration)
}

fn is_output_root(entry: &DirEntry, output: Option<&Path>) -> bool {
    match output {
        Some(output) if entry.depth() > 0 && entry.file_type().is_dir() => fs::canonicalize(entry.path())
            .map(|path| path == output)
            .unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Trees {
        _root: TempDir,
        input: PathBuf,
        output: PathBuf,
    }

    fn trees() -> Trees {
        let root = TempDir::new().unwrap();
        let input = root.path().join("raw");
        let output = root.path().join("xisf");
        fs::create_dir(&input).unwrap();
        Trees {
            input,
            output,
            _root: root,
        }
    }

    fn options(trees: &Trees) -> EnumerationOptions {
        EnumerationOptions {
            input_dir: trees.input.clone(),
            output_dir: trees.output.clone(),
            skip_existing: true,
        }
    }

    fn touch(path: &Path, contents: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_is_convertible() {
        assert!(is_convertible(Path::new("/a/m31.fits")));
        assert!(is_convertible(Path::new("/a/M31.FITS")));
        assert!(is_convertible(Path::new("m31.Fits")));
        assert!(!is_convertible(Path::new("m31.fit")));
        assert!(!is_convertible(Path::new("m31.fits.gz")));
        assert!(!is_convertible(Path::new("fits")));
    }

    #[test]
    fn test_destination_replaces_last_extension() {
        assert_eq!(
            destination_for(Path::new("/out/n1/m31.L.001.FITS")),
            PathBuf::from("/out/n1/m31.L.001.xisf")
        );
    }

    #[test]
    fn test_mirrors_tree_and_copies_other_files() {
        let trees = trees();
        touch(&trees.input.join("night1/m31_001.fits"), b"fits");
        touch(&trees.input.join("night1/M31_002.FITS"), b"fits");
        touch(&trees.input.join("night1/notes.txt"), b"seeing 2.1");
        touch(&trees.input.join("calib/darks/readme.md"), b"# darks");
        fs::create_dir_all(trees.input.join("empty/nested")).unwrap();

        let enumeration = enumerate(&options(&trees)).unwrap();

        let destinations: Vec<_> = enumeration
            .tasks
            .iter()
            .map(|t| t.destination.strip_prefix(&trees.output).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            destinations,
            vec![PathBuf::from("night1/M31_002.xisf"), PathBuf::from("night1/m31_001.xisf")]
        );
        assert_eq!(enumeration.tasks[1].source, trees.input.join("night1/m31_001.fits"));

        assert!(trees.output.join("empty/nested").is_dir());
        assert!(trees.output.join("calib/darks").is_dir());
        assert_eq!(fs::read(trees.output.join("night1/notes.txt")).unwrap(), b"seeing 2.1");
        assert!(!trees.output.join("night1/m31_001.fits").exists());

        let stats = &enumeration.stats;
        assert_eq!(stats.directories, 6);
        assert_eq!(stats.copied, 2);
        assert_eq!(stats.bytes_copied, 17);
        assert_eq!(stats.skipped, 0);
    }

    #[test]
    fn test_existing_outputs_skipped() {
        let trees = trees();
        touch(&trees.input.join("a.fits"), b"fits");
        touch(&trees.input.join("b.fits"), b"fits");
        touch(&trees.output.join("a.xisf"), b"done");

        let enumeration = enumerate(&options(&trees)).unwrap();
        assert_eq!(enumeration.tasks.len(), 1);
        assert_eq!(enumeration.tasks[0].source, trees.input.join("b.fits"));
        assert_eq!(enumeration.stats.skipped, 1);

        let mut overwrite = options(&trees);
        overwrite.skip_existing = false;
        assert_eq!(enumerate(&overwrite).unwrap().tasks.len(), 2);
    }

    #[test]
    fn test_nested_output_not_walked() {
        let trees = trees();
        let nested = Trees {
            output: trees.input.join("converted"),
            input: trees.input.clone(),
            _root: TempDir::new().unwrap(),
        };
        touch(&nested.input.join("a.fits"), b"fits");
        touch(&nested.output.join("old.fits"), b"fits");
        touch(&nested.output.join("a.xisf"), b"xisf");

        let mut opts = options(&nested);
        opts.skip_existing = false;
        let enumeration = enumerate(&opts).unwrap();
        assert_eq!(enumeration.tasks.len(), 1);
        assert_eq!(enumeration.tasks[0].source, nested.input.join("a.fits"));
        assert!(!nested.output.join("converted").exists());
    }

    #[test]
    fn test_colliding_outputs_enqueued_once() {
        let trees = trees();
        touch(&trees.input.join("a.fits"), b"lower");
        touch(&trees.input.join("a.FITS"), b"upper");
        touch(&trees.input.join("a.xisf"), b"stray");
        touch(&trees.input.join("b.fits"), b"fits");

        let enumeration = enumerate(&options(&trees)).unwrap();
        let sources: Vec<_> = enumeration.tasks.iter().map(|t| t.source.clone()).collect();
        assert_eq!(sources, vec![trees.input.join("a.FITS"), trees.input.join("b.fits")]);
        assert_eq!(enumeration.stats.collisions, 2);
        assert_eq!(enumeration.stats.copied, 0);
        assert!(!trees.output.join("a.xisf").exists());
    }

    #[test]
    fn test_output_aliasing_input_is_fatal() {
        let trees = trees();
        touch(&trees.input.join("notes.txt"), b"important observing log");
        let mut opts = options(&trees);
        opts.output_dir = trees.input.join("..").join("raw");

        let err = enumerate(&opts).unwrap_err();
        assert!(matches!(err, EnumerateError::OutputIsInput { .. }));
        assert_eq!(fs::read(trees.input.join("notes.txt")).unwrap(), b"important observing log");
    }

    #[cfg(unix)]
    #[test]
    fn test_output_symlink_to_input_is_fatal() {
        let trees = trees();
        touch(&trees.input.join("notes.txt"), b"log");
        std::os::unix::fs::symlink(&trees.input, &trees.output).unwrap();

        let err = enumerate(&options(&trees)).unwrap_err();
        assert!(matches!(err, EnumerateError::OutputIsInput { .. }));
        assert_eq!(fs::read(trees.input.join("notes.txt")).unwrap(), b"log");
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let trees = trees();
        let mut opts = options(&trees);
        opts.input_dir = trees.input.join("absent");

        let err = enumerate(&opts).unwrap_err();
        assert!(matches!(err, EnumerateError::InputUnreadable { .. }));
    }

    #[test]
    fn test_relative_display() {
        assert_eq!(
            relative_display(Path::new("/raw/n1/a.fits"), Path::new("/raw")),
            "n1/a.fits"
        );
        assert_eq!(relative_display(Path::new("/elsewhere/a.fits"), Path::new("/raw")), "/elsewhere/a.fits");
    }
}
