//! Client-side edit session.
//!
//! An [`EditSession`] accumulates slot edits made by an operator, turns them
//! into one [`ActionCall`] per affected document, and folds the per-call
//! results back in. Only sessions created with the admin capability can
//! enter edit mode.

use crate::actions::{EditTarget, MAX_MISSION_CARDS};
use crate::constants::CACHE_BUST_PARAM;
use crate::models::{ActionCall, HeroTextRequest, MissionPositionsRequest, PatchResult};
use crate::slots::{SlotValue, Transform};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Lifecycle of an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Viewing,
    Editing,
    Dirty,
    Saving,
    Saved,
    /// Last save failed. Unsaved slots stay pending and the session accepts
    /// `record`, `begin_save` and `cancel` exactly as in `Dirty`; recording an
    /// edit moves it back to `Dirty`.
    Failed,
}

/// Addressable slot on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotKey {
    HeroText,
    /// Mission card, 1-based.
    MissionCard(usize),
    MissionVial,
    MedicalVial,
}

impl SlotKey {
    /// Document that owns the slot.
    pub fn target(self) -> EditTarget {
        match self {
            Self::HeroText => EditTarget::Hero,
            Self::MissionCard(_) | Self::MissionVial => EditTarget::Mission,
            Self::MedicalVial => EditTarget::Vial,
        }
    }

    fn expected_kind(self) -> &'static str {
        match self {
            Self::HeroText => "text",
            Self::MissionCard(_) => "position",
            Self::MissionVial | Self::MedicalVial => "transform",
        }
    }

    fn accepts(self, value: &SlotValue) -> bool {
        matches!(
            (self, value),
            (Self::HeroText, SlotValue::Text(_))
                | (Self::MissionCard(_), SlotValue::Position(_))
                | (Self::MissionVial | Self::MedicalVial, SlotValue::Transform(_))
        )
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeroText => f.write_str("hero text"),
            Self::MissionCard(index) => write!(f, "mission card {}", index),
            Self::MissionVial => f.write_str("mission vial"),
            Self::MedicalVial => f.write_str("medical vial"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Live edit requires admin access")]
    NotAdmin,

    #[error("A save is in progress; wait for it to finish")]
    SaveInFlight,

    #[error("Cannot {action} while the session is {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },

    #[error("Nothing to save")]
    NothingToSave,

    #[error("{key} expects a {expected} value")]
    ValueMismatch { key: SlotKey, expected: &'static str },

    #[error("Mission card {0} is out of range (1-{max})", max = MAX_MISSION_CARDS)]
    CardOutOfRange(usize),
}

/// One action of a save, with the slots it commits on success.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCall {
    pub action: ActionCall,
    pub keys: Vec<SlotKey>,
}

/// Actions to send for one save, in target order.
#[derive(Debug, Clone, PartialEq)]
pub struct SavePlan {
    pub calls: Vec<PlannedCall>,
}

/// Operator-side accumulation of slot edits.
#[derive(Debug, Clone)]
pub struct EditSession {
    admin: bool,
    state: SessionState,
    baseline: BTreeMap<SlotKey, SlotValue>,
    pending: BTreeMap<SlotKey, SlotValue>,
    message: Option<String>,
    error: Option<String>,
}

impl EditSession {
    /// Create a viewing session.
    ///
    /// # Arguments
    /// - `admin`: Whether the operator may enter edit mode.
    pub fn new(admin: bool) -> Self {
        Self {
            admin,
            state: SessionState::Viewing,
            baseline: BTreeMap::new(),
            pending: BTreeMap::new(),
            message: None,
            error: None,
        }
    }

    /// Seed the last known persisted values.
    pub fn with_baseline(mut self, values: impl IntoIterator<Item = (SlotKey, SlotValue)>) -> Self {
        self.baseline.extend(values);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    /// Edits not yet confirmed by a successful save.
    pub fn pending(&self) -> &BTreeMap<SlotKey, SlotValue> {
        &self.pending
    }

    /// Value shown for `key`: the pending edit, else the baseline.
    pub fn value(&self, key: SlotKey) -> Option<&SlotValue> {
        self.pending.get(&key).or_else(|| self.baseline.get(&key))
    }

    /// Success message of the last save, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Error text of the last failed save, verbatim.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Switch from viewing to editing.
    ///
    /// # Errors
    /// [`SessionError::NotAdmin`] without the admin capability;
    /// [`SessionError::InvalidTransition`] outside `Viewing`.
    pub fn enter_edit(&mut self) -> Result<(), SessionError> {
        if !self.admin {
            return Err(SessionError::NotAdmin);
        }
        if self.state != SessionState::Viewing {
            return Err(self.invalid("enter edit mode"));
        }
        self.state = SessionState::Editing;
        Ok(())
    }

    /// Record a new value for `key`.
    ///
    /// # Errors
    /// [`SessionError::SaveInFlight`] while saving, and validation errors
    /// when the value kind does not fit the slot.
    pub fn record(&mut self, key: SlotKey, value: SlotValue) -> Result<(), SessionError> {
        match self.state {
            SessionState::Saving => return Err(SessionError::SaveInFlight),
            SessionState::Viewing => return Err(self.invalid("record an edit")),
            SessionState::Editing
            | SessionState::Dirty
            | SessionState::Saved
            | SessionState::Failed => {}
        }
        if let SlotKey::MissionCard(index) = key {
            if index == 0 || index > MAX_MISSION_CARDS {
                return Err(SessionError::CardOutOfRange(index));
            }
        }
        if !key.accepts(&value) {
            return Err(SessionError::ValueMismatch {
                key,
                expected: key.expected_kind(),
            });
        }
        self.pending.insert(key, value);
        self.state = SessionState::Dirty;
        Ok(())
    }

    /// Start saving every pending edit.
    ///
    /// # Returns
    /// One planned call per affected target.
    ///
    /// # Errors
    /// [`SessionError::InvalidTransition`] unless `Dirty` or `Failed`.
    pub fn begin_save(&mut self) -> Result<SavePlan, SessionError> {
        if !matches!(self.state, SessionState::Dirty | SessionState::Failed) {
            return Err(self.invalid("save"));
        }
        if self.pending.is_empty() {
            return Err(SessionError::NothingToSave);
        }

        let mut by_target: BTreeMap<EditTarget, Vec<(SlotKey, &SlotValue)>> = BTreeMap::new();
        for (key, value) in &self.pending {
            by_target.entry(key.target()).or_default().push((*key, value));
        }
        let calls = by_target
            .into_iter()
            .filter_map(|(target, entries)| plan_call(target, &entries))
            .collect();

        self.state = SessionState::Saving;
        self.message = None;
        self.error = None;
        Ok(SavePlan { calls })
    }

    /// Fold the results of a save back into the session.
    ///
    /// `results[i]` answers `plan.calls[i]`; a missing result counts as a
    /// failure. Slots of successful calls are committed to the baseline,
    /// those of failed calls stay pending.
    ///
    /// # Returns
    /// The resulting state, `Saved` or `Failed`.
    ///
    /// # Errors
    /// [`SessionError::InvalidTransition`] when no save is in flight.
    pub fn complete_save(
        &mut self,
        plan: SavePlan,
        results: &[PatchResult],
    ) -> Result<SessionState, SessionError> {
        if self.state != SessionState::Saving {
            return Err(self.invalid("complete a save"));
        }

        let mut messages = Vec::new();
        let mut errors = Vec::new();
        for (index, call) in plan.calls.into_iter().enumerate() {
            match results.get(index) {
                Some(result) if result.success => {
                    for key in call.keys {
                        if let Some(value) = self.pending.remove(&key) {
                            self.baseline.insert(key, value);
                        }
                    }
                    if let Some(message) = &result.message {
                        if !messages.contains(message) {
                            messages.push(message.clone());
                        }
                    }
                }
                Some(result) => errors.push(
                    result
                        .error
                        .clone()
                        .unwrap_or_else(|| format!("{} failed", call.action.name())),
                ),
                None => errors.push(format!("{} returned no result", call.action.name())),
            }
        }

        if errors.is_empty() {
            self.state = SessionState::Saved;
            self.message = (!messages.is_empty()).then(|| messages.join(" "));
        } else {
            tracing::warn!("Save failed for {} action(s)", errors.len());
            self.state = SessionState::Failed;
            self.error = Some(errors.join("; "));
        }
        Ok(self.state)
    }

    /// Discard pending edits and return to viewing.
    ///
    /// # Errors
    /// [`SessionError::SaveInFlight`] while saving.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Saving {
            return Err(SessionError::SaveInFlight);
        }
        self.pending.clear();
        self.error = None;
        self.state = SessionState::Viewing;
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            state: self.state,
        }
    }
}

fn plan_call(target: EditTarget, entries: &[(SlotKey, &SlotValue)]) -> Option<PlannedCall> {
    let keys = entries.iter().map(|(key, _)| *key).collect();
    let action = match target {
        EditTarget::Hero => entries.iter().find_map(|(_, value)| match value {
            SlotValue::Text(text) => Some(ActionCall::HeroText(HeroTextRequest {
                text: text.clone(),
            })),
            _ => None,
        })?,
        EditTarget::Mission => {
            let mut positions = Vec::new();
            let mut vial_data: Option<Transform> = None;
            for (key, value) in entries {
                match (key, value) {
                    (SlotKey::MissionCard(index), SlotValue::Position(position)) => {
                        if positions.len() < *index {
                            positions.resize(*index, None);
                        }
                        positions[index - 1] = Some(*position);
                    }
                    (SlotKey::MissionVial, SlotValue::Transform(transform)) => {
                        vial_data = Some(*transform);
                    }
                    _ => {}
                }
            }
            ActionCall::MissionPositions(MissionPositionsRequest {
                positions,
                vial_data,
            })
        }
        EditTarget::Vial => entries.iter().find_map(|(_, value)| match value {
            SlotValue::Transform(transform) => Some(ActionCall::VialPosition(*transform)),
            _ => None,
        })?,
    };
    Some(PlannedCall { action, keys })
}

/// Cache-busted URL for reloading the page after a save.
///
/// Appends `t=<unix millis>` to the query, before any fragment.
pub fn reload_url(base: &str, now: DateTime<Utc>) -> String {
    let (path, fragment) = match base.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (base, None),
    };
    let separator = if path.contains('?') { '&' } else { '?' };
    let mut url = format!(
        "{}{}{}={}",
        path,
        separator,
        CACHE_BUST_PARAM,
        now.timestamp_millis()
    );
    if let Some(fragment) = fragment {
        url.push('#');
        url.push_str(fragment);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::Position;
    use chrono::TimeZone;

    fn editing_session() -> EditSession {
        let mut session = EditSession::new(true);
        session.enter_edit().expect("enter edit");
        session
    }

    #[test]
    fn non_admin_cannot_enter_edit_mode() {
        let mut session = EditSession::new(false);
        assert_eq!(session.enter_edit(), Err(SessionError::NotAdmin));
        assert_eq!(session.state(), SessionState::Viewing);
    }

    #[test]
    fn recording_requires_edit_mode() {
        let mut session = EditSession::new(true);
        let err = session
            .record(SlotKey::HeroText, SlotValue::Text("x".into()))
            .expect_err("viewing");
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
    }

    #[test]
    fn record_rejects_mismatched_values_and_bad_cards() {
        let mut session = editing_session();
        assert_eq!(
            session.record(
                SlotKey::MedicalVial,
                SlotValue::Position(Position::new(1.0, 1.0))
            ),
            Err(SessionError::ValueMismatch {
                key: SlotKey::MedicalVial,
                expected: "transform"
            })
        );
        assert_eq!(
            session.record(
                SlotKey::MissionCard(0),
                SlotValue::Position(Position::new(1.0, 1.0))
            ),
            Err(SessionError::CardOutOfRange(0))
        );
        assert_eq!(session.state(), SessionState::Editing);
    }

    #[test]
    fn save_plan_groups_edits_by_target_and_nulls_untouched_cards() {
        let mut session = editing_session();
        session
            .record(SlotKey::MissionCard(3), SlotValue::Position(Position::new(5.0, 6.0)))
            .expect("card");
        session
            .record(
                SlotKey::MedicalVial,
                SlotValue::Transform(Transform::new(1.0, 2.0, 3.0, 1.5)),
            )
            .expect("vial");
        session
            .record(SlotKey::HeroText, SlotValue::Text("Fresh".into()))
            .expect("hero");

        let plan = session.begin_save().expect("plan");
        assert_eq!(session.state(), SessionState::Saving);
        let actions: Vec<_> = plan.calls.iter().map(|call| call.action.clone()).collect();
        assert_eq!(
            actions,
            vec![
                ActionCall::HeroText(HeroTextRequest {
                    text: "Fresh".into()
                }),
                ActionCall::MissionPositions(MissionPositionsRequest {
                    positions: vec![None, None, Some(Position::new(5.0, 6.0))],
                    vial_data: None,
                }),
                ActionCall::VialPosition(Transform::new(1.0, 2.0, 3.0, 1.5)),
            ]
        );
    }

    #[test]
    fn edits_are_rejected_while_saving() {
        let mut session = editing_session();
        session
            .record(SlotKey::HeroText, SlotValue::Text("One".into()))
            .expect("record");
        let _plan = session.begin_save().expect("plan");
        assert_eq!(
            session.record(SlotKey::HeroText, SlotValue::Text("Two".into())),
            Err(SessionError::SaveInFlight)
        );
        assert_eq!(session.cancel(), Err(SessionError::SaveInFlight));
    }

    #[test]
    fn successful_save_commits_baseline_and_keeps_message() {
        let mut session = editing_session();
        session
            .record(SlotKey::HeroText, SlotValue::Text("Saved".into()))
            .expect("record");
        let plan = session.begin_save().expect("plan");
        let state = session
            .complete_save(plan, &[PatchResult::ok_with_message("Changes pushed.")])
            .expect("complete");

        assert_eq!(state, SessionState::Saved);
        assert!(session.pending().is_empty());
        assert_eq!(session.message(), Some("Changes pushed."));
        assert_eq!(
            session.value(SlotKey::HeroText),
            Some(&SlotValue::Text("Saved".into()))
        );
    }

    #[test]
    fn partial_failure_keeps_failed_slots_pending_for_retry() {
        let mut session = editing_session();
        session
            .record(SlotKey::HeroText, SlotValue::Text("Headline".into()))
            .expect("hero");
        session
            .record(
                SlotKey::MedicalVial,
                SlotValue::Transform(Transform::new(0.0, 0.0, 0.0, 2.0)),
            )
            .expect("vial");
        let plan = session.begin_save().expect("plan");
        let state = session
            .complete_save(
                plan,
                &[
                    PatchResult::ok(),
                    PatchResult::failure("Marker VIAL_POS not found in src/components/MedicalCore.tsx"),
                ],
            )
            .expect("complete");

        assert_eq!(state, SessionState::Failed);
        assert_eq!(
            session.error(),
            Some("Marker VIAL_POS not found in src/components/MedicalCore.tsx")
        );
        assert_eq!(
            session.pending().keys().copied().collect::<Vec<_>>(),
            vec![SlotKey::MedicalVial]
        );

        let retry = session.begin_save().expect("retry plan");
        assert_eq!(retry.calls.len(), 1);
        assert_eq!(retry.calls[0].keys, vec![SlotKey::MedicalVial]);
    }

    #[test]
    fn failed_session_keeps_edits_and_returns_to_dirty() {
        let mut session = editing_session();
        session
            .record(SlotKey::HeroText, SlotValue::Text("First try".into()))
            .expect("record");
        let plan = session.begin_save().expect("plan");
        let state = session
            .complete_save(plan, &[PatchResult::failure("GitHub sync failed: timeout")])
            .expect("complete");
        assert_eq!(state, SessionState::Failed);

        session
            .record(SlotKey::HeroText, SlotValue::Text("Second try".into()))
            .expect("record after failure");
        assert_eq!(session.state(), SessionState::Dirty);
        assert_eq!(
            session.value(SlotKey::HeroText),
            Some(&SlotValue::Text("Second try".into()))
        );
        assert_eq!(session.begin_save().expect("retry").calls.len(), 1);
    }

    #[test]
    fn missing_result_counts_as_failure() {
        let mut session = editing_session();
        session
            .record(SlotKey::HeroText, SlotValue::Text("Lost".into()))
            .expect("record");
        let plan = session.begin_save().expect("plan");
        let state = session.complete_save(plan, &[]).expect("complete");
        assert_eq!(state, SessionState::Failed);
        assert_eq!(session.error(), Some("hero-text returned no result"));
    }

    #[test]
    fn cancel_discards_pending_edits() {
        let mut session = editing_session().with_baseline([(
            SlotKey::HeroText,
            SlotValue::Text("Original".into()),
        )]);
        session
            .record(SlotKey::HeroText, SlotValue::Text("Draft".into()))
            .expect("record");
        session.cancel().expect("cancel");
        assert_eq!(session.state(), SessionState::Viewing);
        assert_eq!(
            session.value(SlotKey::HeroText),
            Some(&SlotValue::Text("Original".into()))
        );
    }

    #[test]
    fn begin_save_requires_dirty_session() {
        let mut session = editing_session();
        assert!(matches!(
            session.begin_save(),
            Err(SessionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn reload_url_appends_cache_bust_timestamp() {
        let now = Utc
            .timestamp_millis_opt(1_700_000_000_123)
            .single()
            .expect("timestamp");
        assert_eq!(
            reload_url("https://shop.example/", now),
            "https://shop.example/?t=1700000000123"
        );
        assert_eq!(
            reload_url("https://shop.example/?ref=nav#mission", now),
            "https://shop.example/?ref=nav&t=1700000000123#mission"
        );
    }
}
