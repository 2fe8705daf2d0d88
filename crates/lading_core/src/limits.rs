//! Text sizing limits shared by inference and writing.

use serde::{Deserialize, Serialize};

/// How a VARCHAR column's capacity is derived from the longest value seen.
///
/// Capacity is `ceil(len * (100 + headroom_percent) / 100 / step) * step`,
/// clamped to `[min, max]`.
///
/// # Examples
///
/// ```
/// use lading_core::VarcharSizing;
///
/// let sizing = VarcharSizing::default();
/// assert_eq!(sizing.capacity_for(300), 360);
/// assert_eq!(sizing.capacity_for(1), 200);
/// assert_eq!(sizing.capacity_for(10_000), 5000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(deny_unknown_fields)]
pub struct VarcharSizing {
    /// Smallest capacity ever emitted.
    #[serde(default = "default_min_varchar")]
    min: u32,
    /// Largest capacity ever emitted.
    #[serde(default = "default_max_varchar")]
    max: u32,
    /// Extra room added on top of the longest value, in percent.
    #[serde(default = "default_headroom_percent")]
    headroom_percent: u32,
    /// Capacities are rounded up to a multiple of this.
    #[serde(default = "default_step")]
    step: u32,
}

fn default_min_varchar() -> u32 {
    200
}

fn default_max_varchar() -> u32 {
    5000
}

fn default_headroom_percent() -> u32 {
    20
}

fn default_step() -> u32 {
    10
}

impl Default for VarcharSizing {
    fn default() -> Self {
        Self {
            min: default_min_varchar(),
            max: default_max_varchar(),
            headroom_percent: default_headroom_percent(),
            step: default_step(),
        }
    }
}

impl VarcharSizing {
    /// Create sizing rules with explicit bounds and padding.
    pub fn new(min: u32, max: u32, headroom_percent: u32, step: u32) -> Self {
        Self {
            min,
            max,
            headroom_percent,
            step,
        }
    }

    /// Validates that the bounds are ordered and the step is positive.
    pub fn validate(&self) -> Result<(), String> {
        if self.step == 0 {
            return Err("VARCHAR step must be positive".to_string());
        }
        if self.min > self.max {
            return Err(format!(
                "VARCHAR min ({}) must not exceed max ({})",
                self.min, self.max
            ));
        }
        Ok(())
    }

    /// Padded, clamped capacity for a column whose longest value has `max_len` characters.
    pub fn capacity_for(&self, max_len: usize) -> u32 {
        // Integer arithmetic keeps the rounding exact for every length.
        let step = u64::from(self.step.max(1));
        let padded = max_len as u64 * u64::from(100 + self.headroom_percent);
        let denominator = 100 * step;
        let rounded = padded.div_ceil(denominator) * step;
        let clamped = rounded.clamp(u64::from(self.min), u64::from(self.max));
        clamped as u32
    }
}

/// Options applied by the batch writer when serializing values.
///
/// # Examples
///
/// ```
/// use lading_core::WriteOptions;
///
/// let options = WriteOptions::default();
/// assert_eq!(*options.text_cap(), 5000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(deny_unknown_fields)]
pub struct WriteOptions {
    /// Hard cap, in characters, applied to every value written as text.
    ///
    /// Independent of any column's inferred capacity.
    #[serde(default = "default_text_cap")]
    text_cap: usize,
}

fn default_text_cap() -> usize {
    5000
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            text_cap: default_text_cap(),
        }
    }
}

impl WriteOptions {
    /// Create write options with a custom text cap.
    pub fn new(text_cap: usize) -> Self {
        Self { text_cap }
    }
}
