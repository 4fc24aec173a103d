//! Configuration validation
//!
//! Only settings that make a run impossible are rejected here. An invalid
//! distribution or capacity is not a configuration error: the generator
//! tags the table invalid, and the history degrades to unbounded.

use super::*;
use anyhow::Result;

/// Upper bound on generator threads
pub const MAX_THREADS: usize = 1024;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_workers(&config.workers)?;
    validate_output(&config.output)?;
    Ok(())
}

/// Validate worker configuration
pub fn validate_workers(workers: &WorkerConfig) -> Result<()> {
    if workers.threads == 0 || workers.threads > MAX_THREADS {
        anyhow::bail!(
            "threads must be between 1 and {}, got {}",
            MAX_THREADS,
            workers.threads
        );
    }
    Ok(())
}

/// Validate output configuration
pub fn validate_output(output: &OutputConfig) -> Result<()> {
    if let Some(json) = &output.json_output {
        if json == &output.path {
            anyhow::bail!(
                "json_output and output path must differ: {}",
                json.display()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        validate_config(&Config::default()).unwrap();
    }

    #[test]
    fn test_zero_threads_rejected() {
        let mut config = Config::default();
        config.workers.threads = 0;
        assert!(validate_config(&config).is_err());

        config.workers.threads = MAX_THREADS + 1;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_bad_cdf_and_capacity_are_not_rejected() {
        let mut config = Config::default();
        config.cdf.clear();
        config.capacity = CapacitySetting::Length(-1);
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_json_output_collides_with_output_file() {
        let mut config = Config::default();
        config.output.json_output = Some(config.output.path.clone());
        assert!(validate_config(&config).is_err());
    }
}
