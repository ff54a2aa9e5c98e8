use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Widest mask a `u64` can hold
pub const MAX_SLOTS: usize = 64;

/// Slot count of the reference schedule (six two-hour windows)
pub const DEFAULT_SLOT_COUNT: usize = 6;

/// Errors raised while parsing or combining availability masks
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaskError {
    #[error("Availability mask is empty")]
    Empty,

    #[error("Availability mask has {0} slots, at most {MAX_SLOTS} are supported")]
    TooWide(usize),

    #[error("Invalid character {found:?} at position {position}, expected '0' or '1'")]
    InvalidChar { position: usize, found: char },

    #[error("Mask width mismatch: {left} vs {right}")]
    WidthMismatch { left: usize, right: usize },
}

/// Fixed-width set of free time slots
///
/// Bit `k` is slot `k` of an externally defined, ordered schedule. The
/// textual form lists slot 0 first, so `"101000"` means slots 0 and 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AvailabilityMask {
    bits: u64,
    width: u8,
}

impl AvailabilityMask {
    /// Mask with every slot cleared
    pub fn empty(width: usize) -> Result<Self, MaskError> {
        if width == 0 {
            return Err(MaskError::Empty);
        }
        if width > MAX_SLOTS {
            return Err(MaskError::TooWide(width));
        }
        Ok(Self { bits: 0, width: width as u8 })
    }

    /// Build a mask from per-slot flags
    pub fn from_slots(slots: &[bool]) -> Result<Self, MaskError> {
        let mut mask = Self::empty(slots.len())?;
        for (k, &free) in slots.iter().enumerate() {
            if free {
                mask.bits |= 1 << k;
            }
        }
        Ok(mask)
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    #[inline]
    pub fn is_set(&self, slot: usize) -> bool {
        slot < self.width() && self.bits & (1 << slot) != 0
    }

    /// True when at least one slot is free
    #[inline]
    pub fn has_overlap(&self) -> bool {
        self.bits != 0
    }

    /// Labels of the set slots, in slot order
    ///
    /// Slots past the end of `labels` are skipped.
    pub fn selected_slots<'a>(&self, labels: &'a [String]) -> Vec<&'a str> {
        labels
            .iter()
            .enumerate()
            .filter(|(k, _)| self.is_set(*k))
            .map(|(_, label)| label.as_str())
            .collect()
    }
}

/// No free slot on the reference schedule
impl Default for AvailabilityMask {
    fn default() -> Self {
        Self {
            bits: 0,
            width: DEFAULT_SLOT_COUNT as u8,
        }
    }
}

/// Bitwise AND of two masks of the same width
#[inline]
pub fn intersect(a: &AvailabilityMask, b: &AvailabilityMask) -> Result<AvailabilityMask, MaskError> {
    if a.width != b.width {
        return Err(MaskError::WidthMismatch {
            left: a.width(),
            right: b.width(),
        });
    }

    Ok(AvailabilityMask {
        bits: a.bits & b.bits,
        width: a.width,
    })
}

impl FromStr for AvailabilityMask {
    type Err = MaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let width = s.chars().count();
        let mut mask = Self::empty(width)?;

        for (position, ch) in s.chars().enumerate() {
            match ch {
                '1' => mask.bits |= 1 << position,
                '0' => {}
                found => return Err(MaskError::InvalidChar { position, found }),
            }
        }

        Ok(mask)
    }
}

impl fmt::Display for AvailabilityMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for k in 0..self.width() {
            f.write_str(if self.is_set(k) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl TryFrom<String> for AvailabilityMask {
    type Error = MaskError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AvailabilityMask> for String {
    fn from(mask: AvailabilityMask) -> Self {
        mask.to_string()
    }
}
