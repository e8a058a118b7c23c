use crate::error::{EngineError, Result};
use std::collections::HashMap;

/// Interpret a numeric parameter as a flag: values >= 0.5 are true
pub fn get_param_bool(params: &HashMap<String, f64>, key: &str, default: bool) -> bool {
    params
        .get(key)
        .copied()
        .filter(|v| v.is_finite())
        .map(|v| v >= 0.5)
        .unwrap_or(default)
}

/// Fail if any of the listed parameter names is absent from the map
pub fn ensure_required_params(params: &HashMap<String, f64>, required: &[&str]) -> Result<()> {
    for key in required {
        if !params.contains_key(*key) {
            return Err(EngineError::MissingParameter(key.to_string()));
        }
    }
    Ok(())
}

/// Extract a parameter that must encode a positive integer. Defaulted when
/// absent; a present value that is non-finite, fractional or non-positive is
/// a configuration error.
pub fn require_positive_int_param(
    params: &HashMap<String, f64>,
    key: &str,
    default: usize,
) -> Result<usize> {
    let raw = match params.get(key) {
        Some(&value) => value,
        None => return Ok(default),
    };

    if !raw.is_finite() || raw.fract() != 0.0 || raw <= 0.0 {
        return Err(EngineError::invalid_parameter(
            key,
            "must be a positive integer",
        ));
    }

    Ok(raw as usize)
}

/// Extract a finite f64 parameter, defaulted when absent.
pub fn require_finite_param(
    params: &HashMap<String, f64>,
    key: &str,
    default: f64,
) -> Result<f64> {
    let raw = match params.get(key) {
        Some(&value) => value,
        None => return Ok(default),
    };

    if !raw.is_finite() {
        return Err(EngineError::invalid_parameter(key, "must be a finite number"));
    }

    Ok(raw)
}
