//! Current-hole cursor.
//!
//! The cursor always points at a hole in `FIRST_HOLE..=LAST_HOLE`. Moving
//! past either end is clamped, never wrapped.

use serde::{Deserialize, Serialize};

use crate::token_store::{keys, TokenStore};

pub const FIRST_HOLE: u8 = 1;
pub const LAST_HOLE: u8 = 18;

/// One step backwards or forwards through the course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Prev,
    Next,
}

impl Step {
    fn delta(self) -> i16 {
        match self {
            Step::Prev => -1,
            Step::Next => 1,
        }
    }
}

/// Hole currently being logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HoleCursor(u8);

impl Default for HoleCursor {
    fn default() -> Self {
        Self(FIRST_HOLE)
    }
}

impl HoleCursor {
    /// Cursor at `hole`, clamped into range.
    pub fn new(hole: u8) -> Self {
        Self(hole.clamp(FIRST_HOLE, LAST_HOLE))
    }

    pub fn hole(&self) -> u8 {
        self.0
    }

    /// Read the persisted cursor; hole 1 when absent, unreadable or out of range.
    pub fn restore(store: &dyn TokenStore) -> Self {
        store
            .get(keys::HOLE_NUM)
            .and_then(|raw| raw.trim().parse::<u8>().ok())
            .filter(|hole| (FIRST_HOLE..=LAST_HOLE).contains(hole))
            .map(Self)
            .unwrap_or_default()
    }

    /// Move one hole; persists when the value changes. Returns whether it did.
    pub fn navigate(&mut self, store: &mut dyn TokenStore, step: Step) -> bool {
        let target = (i16::from(self.0) + step.delta())
            .clamp(i16::from(FIRST_HOLE), i16::from(LAST_HOLE));
        // In range by the clamp above.
        self.move_to(store, target as u8)
    }

    /// Jump straight to `hole` (clamped); persisted like `navigate`.
    pub fn select(&mut self, store: &mut dyn TokenStore, hole: u8) -> bool {
        self.move_to(store, hole.clamp(FIRST_HOLE, LAST_HOLE))
    }

    fn move_to(&mut self, store: &mut dyn TokenStore, hole: u8) -> bool {
        if hole == self.0 {
            return false;
        }
        self.0 = hole;
        store.set(keys::HOLE_NUM, &hole.to_string(), None);
        tracing::debug!(hole, "Hole cursor moved");
        true
    }
}
