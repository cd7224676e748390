//! Configuration validation.
//!
//! Two layers: derive-level range checks on the settings structs, then
//! semantic rules that cross field boundaries:
//! - wrap_low < wrap_high
//! - replay mode requires a replay_path
//! - upload output directory must be non-empty when enabled

use contracts::{CoreError, PipelineSettings, SourceMode};
use validator::Validate;

/// Validate a PipelineSettings tree.
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(settings: &PipelineSettings) -> Result<(), CoreError> {
    validate_ranges(settings)?;
    validate_assembler(settings)?;
    validate_source(settings)?;
    validate_upload(settings)?;
    Ok(())
}

/// Derive-level range checks.
fn validate_ranges(settings: &PipelineSettings) -> Result<(), CoreError> {
    settings.validate().map_err(|errors| {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "settings".to_string());
        CoreError::config_validation(field, errors.to_string())
    })
}

/// Wrap bounds must describe a real crossing window.
fn validate_assembler(settings: &PipelineSettings) -> Result<(), CoreError> {
    let assembler = &settings.assembler;
    if assembler.wrap_low >= assembler.wrap_high {
        return Err(CoreError::config_validation(
            "assembler.wrap_low / assembler.wrap_high",
            format!(
                "wrap_low ({}) must be < wrap_high ({})",
                assembler.wrap_low, assembler.wrap_high
            ),
        ));
    }
    Ok(())
}

/// Replay mode needs a file to replay.
fn validate_source(settings: &PipelineSettings) -> Result<(), CoreError> {
    let source = &settings.source;
    if source.mode == SourceMode::Replay && source.replay_path.is_none() {
        return Err(CoreError::config_validation(
            "source.replay_path",
            "replay mode requires a replay_path",
        ));
    }
    Ok(())
}

fn validate_upload(settings: &PipelineSettings) -> Result<(), CoreError> {
    let upload = &settings.upload;
    if upload.enabled && upload.output_dir.as_os_str().is_empty() {
        return Err(CoreError::config_validation(
            "upload.output_dir",
            "output_dir cannot be empty when upload is enabled",
        ));
    }
    Ok(())
}
