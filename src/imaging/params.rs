//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! and the [`backend`](super::backend), which does the pixel work. Keeping
//! them separate lets tests swap in a recording backend without touching the
//! operation logic.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn value(self) -> u8 {
        self.0
    }
}

/// Resized outputs are always encoded at full quality.
impl Default for Quality {
    fn default() -> Self {
        Self(100)
    }
}

/// Parameters for drawing a bitmap at new dimensions and encoding it.
///
/// The bitmap is stretched to exactly `width`×`height`; any aspect handling
/// has already happened by the time these parameters are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterizeParams {
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_default_is_full() {
        assert_eq!(Quality::default().value(), 100);
    }
}
