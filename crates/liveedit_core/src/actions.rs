//! Live-edit entry points: load a document, patch its slots, persist, and
//! invalidate the affected route.
//!
//! Every entry point converts failures into a [`PatchResult`]; nothing
//! escapes as an error.

use crate::error::ErrorClass;
use crate::invalidate::ViewInvalidator;
use crate::models::{
    ActionCall, DocumentSlots, HeroTextRequest, MissionPositionsRequest, PatchResult, SlotSnapshot,
};
use crate::persist::{BackendKind, Persistence, SaveReceipt};
use crate::slots::{self, Assignment, MarkerPair, Position, SlotValue, Transform};
use crate::{AppError, Config};
use std::fmt;
use std::sync::Arc;

/// Upper bound on mission cards addressed by one request.
pub const MAX_MISSION_CARDS: usize = 12;

/// Slot name of mission card `index` (1-based).
pub fn mission_card_slot(index: usize) -> String {
    format!("CARD_{}", index)
}

pub const HERO_TEXT_SLOT: &str = "HERO_TEXT";
pub const MISSION_VIAL_SLOT: &str = "VIAL";
pub const MEDICAL_VIAL_SLOT: &str = "VIAL_POS";

/// Source document that owns a group of slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EditTarget {
    Hero,
    Mission,
    Vial,
}

impl EditTarget {
    pub const ALL: [EditTarget; 3] = [EditTarget::Hero, EditTarget::Mission, EditTarget::Vial];

    /// Project-relative path of the document.
    pub fn path(self) -> &'static str {
        match self {
            Self::Hero => "src/app/page.tsx",
            Self::Mission => "src/components/MissionSection.tsx",
            Self::Vial => "src/components/MedicalCore.tsx",
        }
    }

    /// Route whose rendered output depends on the document.
    pub fn route(self) -> &'static str {
        "/"
    }

    pub fn commit_message(self) -> &'static str {
        match self {
            Self::Hero => "chore: update hero text [live edit]",
            Self::Mission => "chore: update mission card positions [live edit]",
            Self::Vial => "chore: update medical core vial transformation [live edit]",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Mission => "mission",
            Self::Vial => "vial",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|target| target.slug() == slug)
    }

    fn readable_markers(self) -> Result<Vec<MarkerPair>, AppError> {
        match self {
            Self::Hero => Ok(vec![MarkerPair::named(HERO_TEXT_SLOT)?]),
            Self::Mission => {
                let mut markers = (1..=MAX_MISSION_CARDS)
                    .map(|index| MarkerPair::named(&mission_card_slot(index)))
                    .collect::<Result<Vec<_>, _>>()?;
                markers.push(MarkerPair::named(MISSION_VIAL_SLOT)?);
                Ok(markers)
            }
            Self::Vial => Ok(vec![MarkerPair::named(MEDICAL_VIAL_SLOT)?]),
        }
    }
}

impl fmt::Display for EditTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// One document rewrite: which document, which slots, how to describe it.
#[derive(Debug, Clone)]
pub struct PatchRequest {
    pub path: String,
    pub assignments: Vec<Assignment>,
    pub commit_message: String,
    pub route: String,
}

impl PatchRequest {
    fn for_target(target: EditTarget, assignments: Vec<Assignment>) -> Self {
        Self {
            path: target.path().to_string(),
            assignments,
            commit_message: target.commit_message().to_string(),
            route: target.route().to_string(),
        }
    }
}

/// Normalized result plus the error class for transports that need it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub result: PatchResult,
    pub class: Option<ErrorClass>,
}

impl ActionOutcome {
    fn from_save(action: &str, outcome: Result<SaveReceipt, AppError>) -> Self {
        match outcome {
            Ok(receipt) => Self {
                result: match receipt.message {
                    Some(message) => PatchResult::ok_with_message(message),
                    None => PatchResult::ok(),
                },
                class: None,
            },
            Err(err) => {
                tracing::error!("Failed to {}: {}", action, err);
                Self {
                    result: PatchResult::from_error(&err),
                    class: Some(err.class()),
                }
            }
        }
    }
}

/// Applies live edits against the configured persistence backend.
pub struct SlotEditor {
    persistence: Persistence,
    views: Arc<ViewInvalidator>,
}

impl SlotEditor {
    pub fn new(persistence: Persistence, views: Arc<ViewInvalidator>) -> Self {
        Self { persistence, views }
    }

    /// Build an editor with the backend selected by `config`.
    ///
    /// # Errors
    /// Returns an error when hosted credentials are malformed.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Ok(Self::new(
            Persistence::from_config(config)?,
            Arc::new(ViewInvalidator::default()),
        ))
    }

    pub fn backend(&self) -> BackendKind {
        self.persistence.kind()
    }

    pub fn views(&self) -> &Arc<ViewInvalidator> {
        &self.views
    }

    /// Replace the hero headline.
    ///
    /// The hero document has a single slot, so a missing marker fails.
    pub async fn update_hero_text(&self, text: &str) -> ActionOutcome {
        let outcome = match MarkerPair::named(HERO_TEXT_SLOT) {
            Ok(marker) => {
                let assignment = Assignment::required(marker, SlotValue::Text(text.to_string()));
                self.patch(&PatchRequest::for_target(EditTarget::Hero, vec![assignment]))
                    .await
            }
            Err(err) => Err(err),
        };
        ActionOutcome::from_save("update hero text", outcome)
    }

    /// Move mission cards and, optionally, the mission vial.
    ///
    /// `positions[i]` targets card `i + 1`; `None` entries and cards without
    /// markers in the document are skipped.
    pub async fn update_mission_positions(
        &self,
        positions: &[Option<Position>],
        vial: Option<Transform>,
    ) -> ActionOutcome {
        let outcome = match mission_assignments(positions, vial) {
            Ok(assignments) => {
                self.patch(&PatchRequest::for_target(EditTarget::Mission, assignments))
                    .await
            }
            Err(err) => Err(err),
        };
        ActionOutcome::from_save("update mission positions", outcome)
    }

    /// Set the medical-core vial transform. A missing marker fails.
    pub async fn update_vial_position(&self, transform: Transform) -> ActionOutcome {
        let outcome = match MarkerPair::named(MEDICAL_VIAL_SLOT) {
            Ok(marker) => {
                let assignment = Assignment::required(marker, SlotValue::Transform(transform));
                self.patch(&PatchRequest::for_target(EditTarget::Vial, vec![assignment]))
                    .await
            }
            Err(err) => Err(err),
        };
        ActionOutcome::from_save("update vial position", outcome)
    }

    /// Dispatch a transport-neutral action.
    pub async fn execute(&self, call: &ActionCall) -> ActionOutcome {
        match call {
            ActionCall::HeroText(HeroTextRequest { text }) => self.update_hero_text(text).await,
            ActionCall::MissionPositions(MissionPositionsRequest {
                positions,
                vial_data,
            }) => self.update_mission_positions(positions, *vial_data).await,
            ActionCall::VialPosition(transform) => self.update_vial_position(*transform).await,
        }
    }

    /// Read the current slot values of `target` from durable storage.
    ///
    /// # Errors
    /// Propagates backend load failures.
    pub async fn read_slots(&self, target: EditTarget) -> Result<DocumentSlots, AppError> {
        let document = self.persistence.load(target.path()).await?;
        let markers = target.readable_markers()?;
        let slots = slots::read_slots(&document.text, &markers)
            .into_iter()
            .map(|(name, value)| SlotSnapshot { name, value })
            .collect();
        Ok(DocumentSlots {
            target: target.slug().to_string(),
            path: document.path,
            version: document.version,
            slots,
        })
    }

    /// Load, patch and persist one document, then invalidate its route.
    ///
    /// The document is re-read on every call and written without locking, so
    /// concurrent saves of the same document race and the later one wins.
    ///
    /// # Errors
    /// Returns the first load, patch or save failure. Nothing is written when
    /// patching fails.
    pub async fn patch(&self, request: &PatchRequest) -> Result<SaveReceipt, AppError> {
        let document = self.persistence.load(&request.path).await?;
        let outcome = slots::apply(&request.path, &document.text, &request.assignments)?;

        if !outcome.skipped.is_empty() {
            tracing::debug!(
                "Skipped absent slots in {}: {:?}",
                request.path,
                outcome.skipped
            );
        }
        if outcome.is_unchanged() {
            tracing::info!("{} already up to date; nothing to save", request.path);
            return Ok(SaveReceipt {
                backend: self.persistence.kind(),
                message: None,
            });
        }

        let receipt = self
            .persistence
            .save(&document, &outcome.text, &request.commit_message)
            .await?;
        tracing::info!(
            "Patched {} slot(s) in {} ({} changed line(s), backend {:?})",
            outcome.applied.len(),
            request.path,
            outcome.changed_lines(),
            receipt.backend
        );
        self.views.invalidate(&request.route);
        Ok(receipt)
    }
}

fn mission_assignments(
    positions: &[Option<Position>],
    vial: Option<Transform>,
) -> Result<Vec<Assignment>, AppError> {
    if positions.len() > MAX_MISSION_CARDS {
        return Err(AppError::InvalidValue(format!(
            "at most {} mission cards can be positioned, got {}",
            MAX_MISSION_CARDS,
            positions.len()
        )));
    }
    let mut assignments = Vec::with_capacity(positions.len() + 1);
    for (index, position) in positions.iter().enumerate() {
        if let Some(position) = position {
            let marker = MarkerPair::named(&mission_card_slot(index + 1))?;
            assignments.push(Assignment::optional(marker, SlotValue::Position(*position)));
        }
    }
    if let Some(vial) = vial {
        let marker = MarkerPair::named(MISSION_VIAL_SLOT)?;
        assignments.push(Assignment::optional(marker, SlotValue::Transform(vial)));
    }
    Ok(assignments)
}
