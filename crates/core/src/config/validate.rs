use std::path::Path;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - input_dir exists and is a directory
/// - output_dir differs from input_dir, also after resolving `..` and symlinks
/// - workers is positive
/// - compression level is within the codec's range
/// - delete_older_than_days is -1 or greater
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let paths = &config.paths;
    if !paths.input_dir.is_dir() {
        return Err(ConfigError::ValidationError(format!(
            "input_dir '{}' is not a folder",
            paths.input_dir.display()
        )));
    }

    if paths.output_dir == paths.input_dir || resolves_to_same(&paths.output_dir, &paths.input_dir) {
        return Err(ConfigError::ValidationError(
            "output_dir must differ from input_dir".to_string(),
        ));
    }

    if config.run.workers == 0 {
        return Err(ConfigError::ValidationError(
            "run.workers must be at least 1".to_string(),
        ));
    }

    if let Some(range) = config.output.codec.level_range() {
        if !range.contains(&config.output.level) {
            return Err(ConfigError::ValidationError(format!(
                "output.level {} is out of range {}..={} for codec {}",
                config.output.level,
                range.start(),
                range.end(),
                config.output.codec
            )));
        }
    }

    if config.retirement_policy().is_none() {
        return Err(ConfigError::ValidationError(format!(
            "retirement.delete_older_than_days must be -1 or greater, got {}",
            config.retirement.delete_older_than_days
        )));
    }

    Ok(())
}

/// Whether two existing paths name the same directory after resolving `..` and symlinks.
fn resolves_to_same(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
