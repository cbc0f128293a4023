//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::HudBlueprint;
use serde::Serialize;
use tracing::info;

use super::load_blueprint;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    tick_hz: u32,
    wide_camera: bool,
    light_source: String,
    sink_count: usize,
    param_overrides: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    match load_blueprint(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    tick_hz: blueprint.device.tick_hz,
                    wide_camera: blueprint.device.wide_camera,
                    light_source: format!("{:?}", blueprint.device.light_source),
                    sink_count: blueprint.sinks.len(),
                    param_overrides: blueprint.params.overrides.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &HudBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - scene snapshots will be dropped".to_string());
    }

    if blueprint.params.store_dir.is_none() {
        warnings.push("params.store_dir not set - settings live in memory only".to_string());
    }

    let timing = &blueprint.timing;
    if timing.ping_staleness_sec < timing.connectivity_refresh_sec {
        warnings.push(format!(
            "timing.ping_staleness_sec ({}) is shorter than the connectivity refresh ({})",
            timing.ping_staleness_sec, timing.connectivity_refresh_sec
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Tick rate: {} Hz", summary.tick_hz);
            println!("  Wide camera: {}", summary.wide_camera);
            println!("  Light source: {}", summary.light_source);
            println!("  Sinks: {}", summary.sink_count);
            println!("  Param overrides: {}", summary.param_overrides);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_validate_reports_warnings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hud.toml");
        std::fs::write(&path, "[device]\ntick_hz = 20\n").unwrap();

        let result = validate_config(&ValidateArgs {
            config: path,
            json: true,
        });
        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert_eq!(warnings.len(), 2);
        assert_eq!(result.summary.unwrap().tick_hz, 20);
    }

    #[test]
    fn test_validate_invalid_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hud.json");
        std::fs::write(&path, r#"{"display": {"width": 0}}"#).unwrap();

        let args = ValidateArgs {
            config: path,
            json: true,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.is_some());
        assert!(run_validate(&args).is_err());
    }
}
