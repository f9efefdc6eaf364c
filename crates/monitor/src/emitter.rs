//! The gauge submission contract and its `metrics` backed implementation.

use alloy_primitives::I256;
use metrics::Label;
use std::fmt::{Debug, Display};
use thiserror::Error;

/// An error submitting a gauge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    /// A tag was not of the `key:value` form.
    #[error("malformed metric tag `{0}`, expected `key:value`")]
    MalformedTag(String),
    /// The value was NaN or infinite.
    #[error("non-finite value for metric `{0}`")]
    NonFinite(String),
}

/// Submits named gauge values with an unordered set of `key:value` tags.
#[cfg_attr(test, mockall::automock)]
pub trait MetricsEmitter: Debug + Send + Sync {
    /// Sets the gauge `name` to `value`.
    fn gauge(&self, name: &str, value: f64, tags: &[String]) -> Result<(), EmitError>;
}

/// A [`MetricsEmitter`] that records gauges through the global [`metrics`] recorder.
///
/// Tags are translated into labels, so `rollup_id:7` becomes the label `rollup_id="7"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecorderEmitter;

impl MetricsEmitter for RecorderEmitter {
    fn gauge(&self, name: &str, value: f64, tags: &[String]) -> Result<(), EmitError> {
        if !value.is_finite() {
            return Err(EmitError::NonFinite(name.to_owned()));
        }
        let labels = tags.iter().map(|tag| parse_tag(tag)).collect::<Result<Vec<_>, _>>()?;
        metrics::gauge!(name.to_owned(), labels).set(value);
        Ok(())
    }
}

/// Formats a `key:value` tag.
pub fn tag(key: &str, value: impl Display) -> String {
    format!("{key}:{value}")
}

fn parse_tag(tag: &str) -> Result<Label, EmitError> {
    match tag.split_once(':') {
        Some((key, value)) if !key.is_empty() => Ok(Label::new(key.to_owned(), value.to_owned())),
        _ => Err(EmitError::MalformedTag(tag.to_owned())),
    }
}

/// Converts a signed 256-bit integer into a gauge value, losing precision past 2^53.
pub(crate) fn signed_f64(value: I256) -> f64 {
    let magnitude = f64::from(value.unsigned_abs());
    if value.is_negative() { -magnitude } else { magnitude }
}
