//! Generation settings: default sizes, ranges and policies.

use crate::error::GenerationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
}

impl<T> Range<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: PartialOrd + fmt::Display> Range<T> {
    fn check(&self, what: &str) -> Result<(), GenerationError> {
        if self.min > self.max {
            return Err(GenerationError::invalid_configuration(format!(
                "{} min {} is greater than max {}",
                what, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Policy values consulted when no user producer supplies a hint.
///
/// Loaded from YAML by the command-line front end; every key is optional.
///
/// ```
/// use specimen::config::Settings;
///
/// let settings = Settings::default().collection_size(3, 3).max_depth(4);
/// assert_eq!(settings.collection_size.min, 3);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Element count of generated collections
    pub collection_size: Range<usize>,

    /// Entry count of generated maps
    pub map_size: Range<usize>,

    /// Length of generated arrays
    pub array_size: Range<usize>,

    /// Length of generated strings
    pub string_length: Range<usize>,

    /// Values of integral leaves, clamped to each type's own range
    pub integer_range: Range<i64>,

    /// Values of floating point leaves
    pub float_range: Range<f64>,

    /// Nodes deeper than this are produced as the type default
    pub max_depth: usize,

    /// Chance that a nullable position is left null
    pub nullable_probability: f64,

    /// Sets and maps give up after `retry_factor * target` insert attempts
    pub retry_factor: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            collection_size: Range::new(2, 6),
            map_size: Range::new(2, 6),
            array_size: Range::new(2, 6),
            string_length: Range::new(2, 10),
            integer_range: Range::new(1, 10_000),
            float_range: Range::new(1.0, 10_000.0),
            max_depth: 8,
            nullable_probability: 0.5,
            retry_factor: 10,
        }
    }
}

impl Settings {
    pub fn collection_size(mut self, min: usize, max: usize) -> Self {
        self.collection_size = Range::new(min, max);
        self
    }

    pub fn map_size(mut self, min: usize, max: usize) -> Self {
        self.map_size = Range::new(min, max);
        self
    }

    pub fn array_size(mut self, min: usize, max: usize) -> Self {
        self.array_size = Range::new(min, max);
        self
    }

    pub fn string_length(mut self, min: usize, max: usize) -> Self {
        self.string_length = Range::new(min, max);
        self
    }

    pub fn integer_range(mut self, min: i64, max: i64) -> Self {
        self.integer_range = Range::new(min, max);
        self
    }

    pub fn float_range(mut self, min: f64, max: f64) -> Self {
        self.float_range = Range::new(min, max);
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn nullable_probability(mut self, p: f64) -> Self {
        self.nullable_probability = p;
        self
    }

    pub fn retry_factor(mut self, factor: usize) -> Self {
        self.retry_factor = factor;
        self
    }

    /// Reject inverted ranges and out-of-range probabilities.
    pub fn validate(&self) -> Result<(), GenerationError> {
        self.collection_size.check("collection_size")?;
        self.map_size.check("map_size")?;
        self.array_size.check("array_size")?;
        self.string_length.check("string_length")?;
        self.integer_range.check("integer_range")?;
        self.float_range.check("float_range")?;
        if !(0.0..=1.0).contains(&self.nullable_probability) {
            return Err(GenerationError::invalid_configuration(format!(
                "nullable_probability {} is outside [0, 1]",
                self.nullable_probability
            )));
        }
        if self.retry_factor == 0 {
            return Err(GenerationError::invalid_configuration(
                "retry_factor must be at least 1",
            ));
        }
        Ok(())
    }
}
