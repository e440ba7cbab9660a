//! Configuration validation
//!
//! All checks run before the trace is parsed or the device is opened. Failures
//! are reported as [`ReplayError::Config`].

use super::ReplayConfig;
use crate::error::ReplayError;
use anyhow::Result;

/// Upper bound on the worker pool size
pub const MAX_WORKERS: usize = 4096;

/// Validate complete configuration
pub fn validate_config(config: &ReplayConfig) -> Result<()> {
    validate_geometry(config)?;
    validate_workers(config)?;
    validate_paths(config)?;
    Ok(())
}

fn config_error(msg: String) -> anyhow::Error {
    ReplayError::Config(msg).into()
}

/// Validate block size, transfer bound and alignment
pub fn validate_geometry(config: &ReplayConfig) -> Result<()> {
    if config.block_size_bytes == 0 {
        return Err(config_error("block_size_bytes must be greater than 0".into()));
    }

    if config.alignment_bytes == 0 || !config.alignment_bytes.is_power_of_two() {
        return Err(config_error(format!(
            "alignment_bytes must be a power of 2, got {}",
            config.alignment_bytes
        )));
    }

    if config.max_transfer_size_blocks == 0 {
        return Err(config_error("max_transfer_size_blocks must be greater than 0".into()));
    }

    let max_bytes = config
        .block_size_bytes
        .checked_mul(config.max_transfer_size_blocks)
        .ok_or_else(|| config_error("max transfer size in bytes overflows".into()))?;
    if max_bytes > isize::MAX as u64 {
        return Err(config_error(format!(
            "max transfer size of {} bytes is too large to allocate",
            max_bytes
        )));
    }

    if config.block_size_bytes % config.alignment_bytes as u64 != 0 {
        log::warn!(
            "block size {} is not a multiple of alignment {}; misaligned requests will be rejected",
            config.block_size_bytes,
            config.alignment_bytes
        );
    }

    Ok(())
}

/// Validate worker count and request cap
pub fn validate_workers(config: &ReplayConfig) -> Result<()> {
    if config.worker_count == 0 || config.worker_count > MAX_WORKERS {
        return Err(config_error(format!(
            "worker_count must be between 1 and {}, got {}",
            MAX_WORKERS, config.worker_count
        )));
    }

    if config.max_requests == 0 {
        return Err(config_error("max_requests must be greater than 0".into()));
    }

    Ok(())
}

/// Validate that the trace exists and a device was named
pub fn validate_paths(config: &ReplayConfig) -> Result<()> {
    if config.trace_path.as_os_str().is_empty() {
        return Err(config_error("no trace file specified".into()));
    }
    if !config.trace_path.is_file() {
        return Err(config_error(format!(
            "trace file not found: {}",
            config.trace_path.display()
        )));
    }

    if config.device_path.as_os_str().is_empty() {
        return Err(config_error("no device specified".into()));
    }
    if !config.device_path.exists() {
        return Err(config_error(format!(
            "device not found: {}",
            config.device_path.display()
        )));
    }

    if config.record_latency && config.metrics_path.as_os_str().is_empty() {
        return Err(config_error("metrics_path is empty but latency recording is enabled".into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn assert_config_error(result: Result<()>, needle: &str) {
        let err = result.unwrap_err();
        match err.downcast_ref::<ReplayError>() {
            Some(ReplayError::Config(msg)) => assert!(msg.contains(needle), "{}", msg),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    fn valid_config(dir: &TempDir) -> ReplayConfig {
        let trace = dir.path().join("trace.txt");
        let device = dir.path().join("device.img");
        std::fs::write(&trace, "0.0 0 0 1 0\n").unwrap();
        std::fs::write(&device, vec![0u8; 4096]).unwrap();
        ReplayConfig {
            trace_path: trace,
            device_path: device,
            metrics_path: dir.path().join("metrics.txt"),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        let dir = TempDir::new().unwrap();
        assert!(validate_config(&valid_config(&dir)).is_ok());
    }

    #[test]
    fn test_alignment_must_be_power_of_two() {
        let dir = TempDir::new().unwrap();
        let mut config = valid_config(&dir);
        config.alignment_bytes = 1000;
        assert_config_error(validate_config(&config), "alignment_bytes");
        config.alignment_bytes = 0;
        assert_config_error(validate_config(&config), "alignment_bytes");
    }

    #[test]
    fn test_zero_block_size_and_transfer() {
        let dir = TempDir::new().unwrap();
        let mut config = valid_config(&dir);
        config.block_size_bytes = 0;
        assert_config_error(validate_config(&config), "block_size_bytes");

        let mut config = valid_config(&dir);
        config.max_transfer_size_blocks = 0;
        assert_config_error(validate_config(&config), "max_transfer_size_blocks");
    }

    #[test]
    fn test_worker_bounds() {
        let dir = TempDir::new().unwrap();
        let mut config = valid_config(&dir);
        config.worker_count = 0;
        assert_config_error(validate_config(&config), "worker_count");
        config.worker_count = MAX_WORKERS + 1;
        assert_config_error(validate_config(&config), "worker_count");
        config.worker_count = MAX_WORKERS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_max_requests_zero() {
        let dir = TempDir::new().unwrap();
        let mut config = valid_config(&dir);
        config.max_requests = 0;
        assert_config_error(validate_config(&config), "max_requests");
    }

    #[test]
    fn test_missing_paths() {
        let dir = TempDir::new().unwrap();
        let mut config = valid_config(&dir);
        config.trace_path = dir.path().join("missing.txt");
        assert_config_error(validate_config(&config), "trace file not found");

        let mut config = valid_config(&dir);
        config.device_path = Default::default();
        assert_config_error(validate_config(&config), "no device specified");

        let mut config = valid_config(&dir);
        config.device_path = dir.path().join("nope");
        assert_config_error(validate_config(&config), "device not found");
    }
}
