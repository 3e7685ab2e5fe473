//! The in-progress "log a sticker" session.
//!
//! An explicit value object owned by the caller, stepped through
//! capture → design choice → sticker resolution → submit. Abandoning it at
//! any point before submit discards only in-memory state; nothing has been
//! persisted yet.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pastetrail_common::Point;

use crate::matching::NearbyCandidate;

/// Photo bytes held by the session until submit uploads them.
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Where the session's coordinates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    Device,
    /// Location permission was denied or no fix was available; the
    /// configured fallback coordinate is in use. Degraded, not an error.
    Fallback,
}

/// The design decision: bind an existing design, or stage a new one to be
/// materialized at submit time. One decision replaces the other entirely,
/// so "both set" is unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignChoice {
    Existing(Uuid),
    New(NewDesign),
}

/// Staged fields for a design created on first use. Creating it only at
/// submit avoids orphan designs when the flow is abandoned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDesign {
    pub name: String,
    pub description: String,
    pub text: String,
}

/// The sticker decision: the user confirmed an existing placement, or a new
/// one is created at submit time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StickerChoice {
    Existing(Uuid),
    CreateNew,
}

#[derive(Debug, Clone)]
pub struct LogSession {
    pub photo: CapturedPhoto,
    pub location: Point,
    pub location_source: LocationSource,
    pub design: Option<DesignChoice>,
    pub sticker: Option<StickerChoice>,
    pub location_description: String,
    pub note: String,
}

impl LogSession {
    /// Start a session from a captured photo. `location: None` is the
    /// permission-denied degraded mode; `fallback` is substituted.
    pub fn capture(photo: CapturedPhoto, location: Option<Point>, fallback: Point) -> Self {
        let (location, location_source) = match location {
            Some(p) => (p, LocationSource::Device),
            None => (fallback, LocationSource::Fallback),
        };
        Self {
            photo,
            location,
            location_source,
            design: None,
            sticker: None,
            location_description: String::new(),
            note: String::new(),
        }
    }

    /// Bind the design decision. Replaces any earlier choice, including a
    /// staged new design.
    pub fn choose_design(&mut self, choice: DesignChoice) {
        self.design = Some(choice);
        // A different design invalidates any sticker resolution made
        // against the old one.
        self.sticker = None;
    }

    pub fn choose_sticker(&mut self, choice: StickerChoice) {
        self.sticker = Some(choice);
    }

    /// Resolve the sticker decision from matcher output. Zero candidates
    /// means no ambiguity: the session auto-advances to creating a new
    /// sticker. With candidates present the user must decide, so the
    /// decision is left open and `false` is returned.
    pub fn resolve_from_candidates(&mut self, candidates: &[NearbyCandidate]) -> bool {
        if candidates.is_empty() {
            self.sticker = Some(StickerChoice::CreateNew);
            true
        } else {
            false
        }
    }

    pub fn set_location_description(&mut self, description: impl Into<String>) {
        self.location_description = description.into();
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = note.into();
    }

    /// Both decisions are in; the session may submit.
    pub fn ready_to_submit(&self) -> bool {
        self.design.is_some() && self.sticker.is_some()
    }
}
