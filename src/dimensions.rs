//! Aspect-locked dimension resolution.
//!
//! The resize form holds a width and a height field plus an aspect-lock
//! toggle. Editing one field under the lock recomputes the other from the
//! loaded image's intrinsic ratio:
//!
//! ```text
//! edit width  = v   →  height = round(v / r)
//! edit height = v   →  width  = round(v * r)
//! ```
//!
//! `r` is the [`AspectRatio`] captured when the image was loaded. It is never
//! recomputed from the current pair, so a width → height → width sequence
//! cannot accumulate rounding drift.
//!
//! Invalid input is not an error here. An edit whose value is not a
//! positive integer, or that arrives before any image is loaded, is
//! *rejected*: the previous state is kept and [`EditOutcome::Rejected`]
//! says why. Callers decide whether to surface that.
//!
//! [`resolve_edit`] is the pure core; [`ResizeForm`] is the stateful field
//! model built on it that the CLI drives.

use crate::batch::BatchSettings;
use crate::imaging::{AspectRatio, Dimensions};
use serde::Serialize;
use std::fmt;

/// Which form field an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Width,
    Height,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Width => write!(f, "width"),
            Field::Height => write!(f, "height"),
        }
    }
}

/// A consistent, positive (width, height) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedDimensions {
    pub width: u32,
    pub height: u32,
}

impl From<Dimensions> for ResolvedDimensions {
    fn from(dims: Dimensions) -> Self {
        Self {
            width: dims.width,
            height: dims.height,
        }
    }
}

impl fmt::Display for ResolvedDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Why an edit was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The value was not a positive integer.
    NotPositive,
    /// No image has been loaded yet, so there is nothing to resize.
    NoImage,
}

/// Result of applying one field edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied(ResolvedDimensions),
    Rejected(Rejection),
}

/// Parse a raw field value as a positive integer.
///
/// Surrounding whitespace is ignored; anything else that is not a plain
/// decimal number greater than zero yields `None`.
///
/// ```
/// # use qrsize::dimensions::parse_dimension;
/// assert_eq!(parse_dimension(" 400 "), Some(400));
/// assert_eq!(parse_dimension("0"), None);
/// assert_eq!(parse_dimension("abc"), None);
/// ```
pub fn parse_dimension(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|&v| v > 0)
}

/// Apply an edit of `field` to `value`.
///
/// `previous` is `None` until an image has been loaded. With the lock off
/// only the edited field changes; with it on the other field is derived
/// from `ratio`.
pub fn resolve_edit(
    previous: Option<ResolvedDimensions>,
    ratio: AspectRatio,
    field: Field,
    value: i64,
    lock_aspect: bool,
) -> EditOutcome {
    let Some(previous) = previous else {
        return EditOutcome::Rejected(Rejection::NoImage);
    };
    let Some(value) = u32::try_from(value).ok().filter(|&v| v > 0) else {
        return EditOutcome::Rejected(Rejection::NotPositive);
    };

    let resolved = match (field, lock_aspect) {
        (Field::Width, true) => ResolvedDimensions {
            width: value,
            height: ratio.height_for_width(value),
        },
        (Field::Height, true) => ResolvedDimensions {
            width: ratio.width_for_height(value),
            height: value,
        },
        (Field::Width, false) => ResolvedDimensions {
            width: value,
            ..previous
        },
        (Field::Height, false) => ResolvedDimensions {
            height: value,
            ..previous
        },
    };
    EditOutcome::Applied(resolved)
}

/// Final dimensions for one image of a batch.
///
/// Under the lock, the field the user last edited is kept and the other is
/// derived from *this image's* ratio, so files with different proportions
/// each keep their own shape. Otherwise the entered pair is used as-is.
pub fn resolve_for_image(
    entered: ResolvedDimensions,
    ratio: AspectRatio,
    anchor: Option<Field>,
    lock_aspect: bool,
) -> ResolvedDimensions {
    match (lock_aspect, anchor) {
        (true, Some(Field::Width)) => ResolvedDimensions {
            width: entered.width,
            height: ratio.height_for_width(entered.width),
        },
        (true, Some(Field::Height)) => ResolvedDimensions {
            width: ratio.width_for_height(entered.height),
            height: entered.height,
        },
        _ => entered,
    }
}

/// The resize form: two text fields, the lock toggle, and the ratio of the
/// most recently loaded image.
///
/// Fields are kept as text, as a form would, so that an empty or invalid
/// value can reach the batch validation step and be reported there.
#[derive(Debug, Clone)]
pub struct ResizeForm {
    width: String,
    height: String,
    lock_aspect: bool,
    ratio: Option<AspectRatio>,
    last_edited: Option<Field>,
}

impl ResizeForm {
    pub fn new(lock_aspect: bool) -> Self {
        Self {
            width: String::new(),
            height: String::new(),
            lock_aspect,
            ratio: None,
            last_edited: None,
        }
    }

    /// Record a freshly decoded image.
    ///
    /// Under the lock both fields reset to the intrinsic size, discarding
    /// earlier edits. Without it the fields are only seeded if this is the
    /// first image.
    pub fn load_image(&mut self, intrinsic: Dimensions) {
        let Some(ratio) = AspectRatio::from_dimensions(intrinsic.width, intrinsic.height) else {
            return;
        };
        let first_load = self.ratio.is_none();
        self.ratio = Some(ratio);

        if self.lock_aspect || first_load {
            self.width = intrinsic.width.to_string();
            self.height = intrinsic.height.to_string();
            self.last_edited = None;
        }
    }

    /// Apply a raw text edit to one field.
    ///
    /// Rejected edits leave the form untouched.
    pub fn edit(&mut self, field: Field, raw: &str) -> EditOutcome {
        let Some(ratio) = self.ratio else {
            return EditOutcome::Rejected(Rejection::NoImage);
        };
        let value = match parse_dimension(raw) {
            Some(v) => v as i64,
            None => return EditOutcome::Rejected(Rejection::NotPositive),
        };
        let previous = self.current().unwrap_or(ResolvedDimensions {
            width: 1,
            height: 1,
        });

        let outcome = resolve_edit(Some(previous), ratio, field, value, self.lock_aspect);
        if let EditOutcome::Applied(resolved) = outcome {
            match (field, self.lock_aspect) {
                (_, true) => {
                    self.width = resolved.width.to_string();
                    self.height = resolved.height.to_string();
                }
                // The untouched field keeps its text exactly, even if invalid
                (Field::Width, false) => self.width = resolved.width.to_string(),
                (Field::Height, false) => self.height = resolved.height.to_string(),
            }
            self.last_edited = Some(field);
        }
        outcome
    }

    pub fn set_lock(&mut self, lock_aspect: bool) {
        self.lock_aspect = lock_aspect;
    }

    pub fn lock_aspect(&self) -> bool {
        self.lock_aspect
    }

    pub fn width_text(&self) -> &str {
        &self.width
    }

    pub fn height_text(&self) -> &str {
        &self.height
    }

    pub fn last_edited(&self) -> Option<Field> {
        self.last_edited
    }

    pub fn is_loaded(&self) -> bool {
        self.ratio.is_some()
    }

    /// Both fields as numbers, if both currently hold positive integers.
    pub fn current(&self) -> Option<ResolvedDimensions> {
        Some(ResolvedDimensions {
            width: parse_dimension(&self.width)?,
            height: parse_dimension(&self.height)?,
        })
    }

    /// Snapshot of the form for a "resize and download" action.
    pub fn settings(&self) -> BatchSettings {
        BatchSettings {
            width: self.width.clone(),
            height: self.height.clone(),
            lock_aspect: self.lock_aspect,
            anchor: self.last_edited,
        }
    }
}
