//! Sequential application of slot assignments to a document.

use super::marker::MarkerPair;
use super::value::{render, SlotValue};
use crate::AppError;
use similar::{ChangeTag, TextDiff};

/// Whether an absent marker fails the whole patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRequirement {
    /// The slot must exist; absence is a [`AppError::MarkerNotFound`].
    Required,
    /// Absent slots are skipped so partial documents still patch.
    Optional,
}

/// One slot write: which markers, what value, and how strict.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub marker: MarkerPair,
    pub value: SlotValue,
    pub requirement: SlotRequirement,
}

impl Assignment {
    pub fn required(marker: MarkerPair, value: SlotValue) -> Self {
        Self {
            marker,
            value,
            requirement: SlotRequirement::Required,
        }
    }

    pub fn optional(marker: MarkerPair, value: SlotValue) -> Self {
        Self {
            marker,
            value,
            requirement: SlotRequirement::Optional,
        }
    }
}

/// Result of applying a batch of assignments.
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    original: String,
    pub text: String,
    /// Slots that were rewritten, in application order.
    pub applied: Vec<String>,
    /// Optional slots whose markers were absent.
    pub skipped: Vec<String>,
}

impl PatchOutcome {
    /// `true` when the rewritten text is byte-identical to the input.
    pub fn is_unchanged(&self) -> bool {
        self.original == self.text
    }

    /// Number of lines inserted or removed by the patch.
    pub fn changed_lines(&self) -> usize {
        TextDiff::from_lines(&self.original, &self.text)
            .iter_all_changes()
            .filter(|change| change.tag() != ChangeTag::Equal)
            .count()
    }
}

/// Apply `assignments` to `text` in order.
///
/// Each assignment sees the output of the previous one. Replacement is
/// literal: the rendered slot is spliced in by byte range.
///
/// # Arguments
/// - `path`: Document path, used for error messages only.
/// - `text`: Current document text.
/// - `assignments`: Slot writes to perform.
///
/// # Returns
/// The rewritten text with the names of applied and skipped slots.
///
/// # Errors
/// Returns [`AppError::MarkerNotFound`] when a required slot is absent and
/// [`AppError::InvalidValue`] when a value cannot be rendered.
pub fn apply(path: &str, text: &str, assignments: &[Assignment]) -> Result<PatchOutcome, AppError> {
    let mut current = text.to_string();
    let mut applied = Vec::new();
    let mut skipped = Vec::new();

    for assignment in assignments {
        assignment.value.validate()?;
        match assignment.marker.locate(&current) {
            Some(span) => {
                let rendered = render(&assignment.marker, &assignment.value);
                current.replace_range(span.full, &rendered);
                applied.push(assignment.marker.name().to_string());
            }
            None => match assignment.requirement {
                SlotRequirement::Required => {
                    return Err(AppError::MarkerNotFound {
                        marker: assignment.marker.name().to_string(),
                        path: path.to_string(),
                    });
                }
                SlotRequirement::Optional => {
                    tracing::debug!(
                        "Slot {} not present in {}; skipping",
                        assignment.marker.name(),
                        path
                    );
                    skipped.push(assignment.marker.name().to_string());
                }
            },
        }
    }

    Ok(PatchOutcome {
        original: text.to_string(),
        text: current,
        applied,
        skipped,
    })
}

/// Read every slot of `markers` present in `text`.
///
/// # Returns
/// `(name, value)` pairs for slots that exist and parse; absent or
/// unparseable slots are left out.
pub fn read_slots(text: &str, markers: &[MarkerPair]) -> Vec<(String, SlotValue)> {
    markers
        .iter()
        .filter_map(|marker| {
            let span = marker.locate(text)?;
            let value = SlotValue::parse(&text[span.inner])?;
            Some((marker.name().to_string(), value))
        })
        .collect()
}
