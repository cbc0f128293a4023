//! Config validation
//!
//! Rules:
//! - tick_hz > 0
//! - framebuffer dimensions > 0, zoom > 0
//! - focal lengths > 0
//! - min_draw_distance <= max_draw_distance
//! - every timing period > 0
//! - sink names non-empty and unique

use std::collections::HashSet;

use contracts::{CameraIntrinsics, ContractError, HudBlueprint};

/// Validate a blueprint, returning the first error found
pub fn validate(blueprint: &HudBlueprint) -> Result<(), ContractError> {
    validate_device(blueprint)?;
    validate_camera(blueprint)?;
    validate_display(blueprint)?;
    validate_geometry(blueprint)?;
    validate_timing(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

fn validate_device(blueprint: &HudBlueprint) -> Result<(), ContractError> {
    if blueprint.device.tick_hz == 0 {
        return Err(ContractError::config_validation(
            "device.tick_hz",
            "tick_hz must be > 0",
        ));
    }
    Ok(())
}

fn validate_camera(blueprint: &HudBlueprint) -> Result<(), ContractError> {
    check_intrinsics("camera.road", &blueprint.camera.road)?;
    check_intrinsics("camera.wide", &blueprint.camera.wide)
}

fn check_intrinsics(field: &str, k: &CameraIntrinsics) -> Result<(), ContractError> {
    if k.fx <= 0.0 || k.fy <= 0.0 {
        return Err(ContractError::config_validation(
            format!("{field}.fx / {field}.fy"),
            format!("focal lengths must be > 0, got fx={} fy={}", k.fx, k.fy),
        ));
    }
    Ok(())
}

fn validate_display(blueprint: &HudBlueprint) -> Result<(), ContractError> {
    let display = &blueprint.display;
    if display.width == 0 || display.height == 0 {
        return Err(ContractError::config_validation(
            "display.width / display.height",
            format!(
                "framebuffer dimensions must be > 0, got {}x{}",
                display.width, display.height
            ),
        ));
    }
    if display.zoom <= 0.0 {
        return Err(ContractError::config_validation(
            "display.zoom",
            format!("zoom must be > 0, got {}", display.zoom),
        ));
    }
    if display.offscreen_margin < 0.0 {
        return Err(ContractError::config_validation(
            "display.offscreen_margin",
            "offscreen_margin cannot be negative",
        ));
    }
    Ok(())
}

fn validate_geometry(blueprint: &HudBlueprint) -> Result<(), ContractError> {
    let geometry = &blueprint.geometry;
    for (field, value) in [
        ("geometry.min_draw_distance", geometry.min_draw_distance),
        ("geometry.max_draw_distance", geometry.max_draw_distance),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ContractError::config_validation(
                field,
                format!("draw distance must be finite and >= 0, got {value}"),
            ));
        }
    }
    if geometry.min_draw_distance > geometry.max_draw_distance {
        return Err(ContractError::config_validation(
            "geometry.min_draw_distance / geometry.max_draw_distance",
            format!(
                "min_draw_distance ({}) must be <= max_draw_distance ({})",
                geometry.min_draw_distance, geometry.max_draw_distance
            ),
        ));
    }
    Ok(())
}

fn validate_timing(blueprint: &HudBlueprint) -> Result<(), ContractError> {
    let timing = &blueprint.timing;
    let periods = [
        ("timing.controls_wait_sec", timing.controls_wait_sec),
        ("timing.controls_timeout_sec", timing.controls_timeout_sec),
        ("timing.link_timeout_sec", timing.link_timeout_sec),
        ("timing.settings_refresh_sec", timing.settings_refresh_sec),
        (
            "timing.connectivity_refresh_sec",
            timing.connectivity_refresh_sec,
        ),
        ("timing.ping_staleness_sec", timing.ping_staleness_sec),
    ];
    for (field, value) in periods {
        if value <= 0.0 {
            return Err(ContractError::config_validation(
                field,
                format!("period must be > 0, got {value}"),
            ));
        }
    }
    if timing.blinker_blink_ticks == 0 {
        return Err(ContractError::config_validation(
            "timing.blinker_blink_ticks",
            "blinker_blink_ticks must be > 0",
        ));
    }
    Ok(())
}

fn validate_sinks(blueprint: &HudBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SinkConfig, SinkType};
    use std::collections::HashMap;

    fn sink(name: &str) -> SinkConfig {
        SinkConfig {
            name: name.into(),
            sink_type: SinkType::Log,
            queue_capacity: 10,
            params: HashMap::new(),
        }
    }

    #[test]
    fn test_valid_defaults() {
        let mut bp = HudBlueprint::default();
        bp.sinks.push(sink("log"));
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_zero_tick_rate() {
        let mut bp = HudBlueprint::default();
        bp.device.tick_hz = 0;
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("tick_hz"));
    }

    #[test]
    fn test_zero_framebuffer() {
        let mut bp = HudBlueprint::default();
        bp.display.height = 0;
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_non_positive_focal_length() {
        let mut bp = HudBlueprint::default();
        bp.camera.wide.fx = 0.0;
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("camera.wide"));
    }

    #[test]
    fn test_draw_distance_order() {
        let mut bp = HudBlueprint::default();
        bp.geometry.min_draw_distance = 120.0;
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("min_draw_distance"));
    }

    #[test]
    fn test_negative_or_nan_draw_distance() {
        let mut bp = HudBlueprint::default();
        bp.geometry.min_draw_distance = -20.0;
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("geometry.min_draw_distance"));

        let mut bp = HudBlueprint::default();
        bp.geometry.max_draw_distance = f32::NAN;
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("geometry.max_draw_distance"));
    }

    #[test]
    fn test_negative_draw_distance_rejected_on_load() {
        let toml = "[geometry]\nmin_draw_distance = -20.0\n";
        let result = crate::ConfigLoader::load_from_str(toml, crate::ConfigFormat::Toml);
        assert!(matches!(result, Err(ContractError::ConfigValidation { .. })));
    }

    #[test]
    fn test_non_positive_period() {
        let mut bp = HudBlueprint::default();
        bp.timing.connectivity_refresh_sec = 0.0;
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("connectivity_refresh_sec"));
    }

    #[test]
    fn test_empty_sink_name() {
        let mut bp = HudBlueprint::default();
        bp.sinks.push(sink(""));
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_duplicate_sink_name() {
        let mut bp = HudBlueprint::default();
        bp.sinks.push(sink("out"));
        bp.sinks.push(sink("out"));
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
