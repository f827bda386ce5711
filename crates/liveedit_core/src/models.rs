//! Request and response payloads for the live-edit actions.

use crate::slots::{Position, SlotValue, Transform};
use crate::AppError;
use serde::{Deserialize, Serialize};

/// Normalized outcome of one action, identical for every backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PatchResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            error: None,
        }
    }

    pub fn ok_with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }

    /// Convert an application error into the operator-facing failure shape.
    pub fn from_error(err: &AppError) -> Self {
        Self::failure(err.to_string())
    }
}

/// Body of `updateHeroText`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroTextRequest {
    pub text: String,
}

/// Body of `updateMissionPositions`.
///
/// `positions[i]` targets card `i + 1`; a `null` entry leaves that card as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionPositionsRequest {
    pub positions: Vec<Option<Position>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vial_data: Option<Transform>,
}

/// One remote action invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionCall {
    HeroText(HeroTextRequest),
    MissionPositions(MissionPositionsRequest),
    VialPosition(Transform),
}

impl ActionCall {
    /// Stable action name used in logs and routes.
    pub fn name(&self) -> &'static str {
        match self {
            Self::HeroText(_) => "hero-text",
            Self::MissionPositions(_) => "mission-positions",
            Self::VialPosition(_) => "vial-position",
        }
    }
}

/// Current value of one slot, as reported by the read endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub name: String,
    #[serde(flatten)]
    pub value: SlotValue,
}

/// All readable slots of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSlots {
    pub target: String,
    pub path: String,
    /// Backend version id of the document that was read.
    pub version: Option<String>,
    pub slots: Vec<SlotSnapshot>,
}
