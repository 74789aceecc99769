use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Batch sizes, attempt limits and poll interval are non-zero
/// - The claim lease outlasts every configured provider timeout
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let wf = &config.workflow;

    if wf.voice_batch_size == 0 || wf.entry_batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "workflow batch sizes must be greater than 0".to_string(),
        ));
    }

    if wf.max_voice_attempts == 0 || wf.max_entry_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "workflow attempt limits must be greater than 0".to_string(),
        ));
    }

    if wf.poll_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "workflow.poll_interval_secs cannot be 0".to_string(),
        ));
    }

    // A lease shorter than the action timeout would let a second worker
    // claim a lead while the first is still working on it.
    let mut max_timeout = 0;
    if let Some(voice) = &config.voice {
        max_timeout = max_timeout.max(voice.timeout_secs);
    }
    if let Some(entry) = &config.entry {
        max_timeout = max_timeout.max(entry.timeout_secs);
    }
    if wf.claim_lease_secs <= max_timeout {
        return Err(ConfigError::ValidationError(format!(
            "workflow.claim_lease_secs ({}) must exceed the provider timeout ({})",
            wf.claim_lease_secs, max_timeout
        )));
    }

    Ok(())
}
