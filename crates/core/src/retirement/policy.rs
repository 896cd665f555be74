//! Age-based deletion of converted sources.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

use super::error::RetirementError;
use super::types::{RetirementDecision, RetirementPolicy};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Applies the policy to a source whose conversion has succeeded.
pub fn maybe_delete(
    source: &Path,
    policy: RetirementPolicy,
) -> Result<RetirementDecision, RetirementError> {
    maybe_delete_at(source, policy, Utc::now())
}

/// Like [`maybe_delete`], measuring the file's age against `now`.
pub fn maybe_delete_at(
    source: &Path,
    policy: RetirementPolicy,
    now: DateTime<Utc>,
) -> Result<RetirementDecision, RetirementError> {
    match policy {
        RetirementPolicy::Disabled => Ok(RetirementDecision::Disabled),
        RetirementPolicy::Immediate => delete(source),
        RetirementPolicy::OlderThan { days } => {
            let age_days = age_in_days(source, now)?;
            if age_days >= f64::from(days) {
                delete(source)
            } else {
                Ok(RetirementDecision::TooRecent {
                    age_days,
                    threshold_days: days,
                })
            }
        }
    }
}

/// Fractional days since the last modification; negative for future mtimes.
fn age_in_days(source: &Path, now: DateTime<Utc>) -> Result<f64, RetirementError> {
    let modified = fs::metadata(source)
        .and_then(|m| m.modified())
        .map_err(|source_err| RetirementError::Age {
            path: source.to_path_buf(),
            source: source_err,
        })?;
    let modified: DateTime<Utc> = modified.into();
    let age = now.signed_duration_since(modified);
    Ok(age.num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY)
}

fn delete(source: &Path) -> Result<RetirementDecision, RetirementError> {
    fs::remove_file(source).map_err(|e| RetirementError::Delete {
        path: source.to_path_buf(),
        source: e,
    })?;
    Ok(RetirementDecision::Deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::fs::File;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn source_aged(dir: &TempDir, name: &str, days: i64, now: DateTime<Utc>) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, b"SIMPLE").unwrap();
        let mtime: SystemTime = (now - Duration::days(days)).into();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
        path
    }

    #[test]
    fn test_threshold_compares_age() {
        let dir = TempDir::new().unwrap();
        let now = Utc::now();
        let young = source_aged(&dir, "young.fits", 4, now);
        let old = source_aged(&dir, "old.fits", 6, now);
        let policy = RetirementPolicy::OlderThan { days: 5 };

        let decision = maybe_delete_at(&young, policy, now).unwrap();
        match decision {
            RetirementDecision::TooRecent {
                age_days,
                threshold_days,
            } => {
                assert!((age_days - 4.0).abs() < 0.01);
                assert_eq!(threshold_days, 5);
            }
            other => panic!("unexpected decision: {other:?}"),
        }
        assert!(young.exists());

        assert_eq!(maybe_delete_at(&old, policy, now).unwrap(), RetirementDecision::Deleted);
        assert!(!old.exists());
    }

    #[test]
    fn test_disabled_never_touches_file() {
        let dir = TempDir::new().unwrap();
        let now = Utc::now();
        let ancient = source_aged(&dir, "ancient.fits", 10_000, now);

        let decision = maybe_delete_at(&ancient, RetirementPolicy::Disabled, now).unwrap();
        assert_eq!(decision, RetirementDecision::Disabled);
        assert!(ancient.exists());

        // Not even a missing file is an error.
        let missing = dir.path().join("missing.fits");
        assert!(maybe_delete(&missing, RetirementPolicy::Disabled).is_ok());
    }

    #[test]
    fn test_immediate_ignores_age() {
        let dir = TempDir::new().unwrap();
        let now = Utc::now();
        let fresh = source_aged(&dir, "fresh.fits", 0, now);

        assert_eq!(
            maybe_delete(&fresh, RetirementPolicy::Immediate).unwrap(),
            RetirementDecision::Deleted
        );
        assert!(!fresh.exists());
    }

    #[test]
    fn test_future_mtime_is_too_recent() {
        let dir = TempDir::new().unwrap();
        let now = Utc::now();
        let future = source_aged(&dir, "future.fits", -3, now);

        let decision = maybe_delete_at(&future, RetirementPolicy::OlderThan { days: 1 }, now).unwrap();
        assert!(matches!(decision, RetirementDecision::TooRecent { age_days, .. } if age_days < 0.0));
        assert!(future.exists());
    }

    #[test]
    fn test_errors_are_typed() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.fits");

        let err = maybe_delete(&missing, RetirementPolicy::OlderThan { days: 1 }).unwrap_err();
        assert!(matches!(err, RetirementError::Age { .. }));
        assert_eq!(err.path(), &missing);

        let err = maybe_delete(&missing, RetirementPolicy::Immediate).unwrap_err();
        assert!(matches!(err, RetirementError::Delete { .. }));
    }
}
