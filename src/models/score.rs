// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Score entry model for storage and API.

use crate::models::{Layout, WeatherSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of the throw being practiced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShotShape {
    #[serde(rename = "Straight-to-Fade")]
    StraightToFade,
    #[serde(rename = "Hyzer Spike")]
    HyzerSpike,
    #[serde(rename = "Flex/Anhyzer")]
    FlexAnhyzer,
    #[serde(rename = "Hyzer Flip")]
    HyzerFlip,
    Roller,
    Straight,
}

impl ShotShape {
    pub const ALL: [ShotShape; 6] = [
        ShotShape::StraightToFade,
        ShotShape::HyzerSpike,
        ShotShape::FlexAnhyzer,
        ShotShape::HyzerFlip,
        ShotShape::Roller,
        ShotShape::Straight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShotShape::StraightToFade => "Straight-to-Fade",
            ShotShape::HyzerSpike => "Hyzer Spike",
            ShotShape::FlexAnhyzer => "Flex/Anhyzer",
            ShotShape::HyzerFlip => "Hyzer Flip",
            ShotShape::Roller => "Roller",
            ShotShape::Straight => "Straight",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        ShotShape::ALL.into_iter().find(|s| s.as_str() == label)
    }
}

impl fmt::Display for ShotShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged hole attempt. Append-only; never mutated after the write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Round the entry belongs to; `None` outside a round or for a local-only round
    pub round_id: Option<String>,
    pub hole_number: u8,
    pub layout: Layout,
    pub disc_used: String,
    pub strokes: u8,
    pub rating: u8,
    pub shot_shape: ShotShape,
    pub notes: String,
    pub weather: Option<WeatherSnapshot>,
    /// Venue-local RFC3339 timestamp
    pub created_at: String,
}

impl ScoreEntry {
    /// Value written to the `notes` column: the shape prefix plus free text.
    pub fn stored_notes(&self) -> String {
        format!("[{}] {}", self.shot_shape, self.notes)
    }
}

/// Split a stored `notes` value back into shape and free text.
///
/// Rows written by hand (or before shapes existed) have no prefix.
pub fn split_stored_notes(stored: &str) -> (Option<ShotShape>, String) {
    if let Some(rest) = stored.strip_prefix('[') {
        if let Some((label, text)) = rest.split_once(']') {
            if let Some(shape) = ShotShape::from_label(label) {
                return (Some(shape), text.trim_start().to_string());
            }
        }
    }
    (None, stored.to_string())
}

/// Score entry as read back from the `practice_notes` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeNote {
    pub id: Option<String>,
    pub round_id: Option<String>,
    pub hole_number: u8,
    pub layout: Layout,
    pub disc_used: String,
    pub strokes: Option<u8>,
    pub rating: Option<u8>,
    pub shot_shape: Option<ShotShape>,
    pub notes: String,
    pub created_at: String,
}

impl From<&ScoreEntry> for PracticeNote {
    fn from(entry: &ScoreEntry) -> Self {
        Self {
            id: None,
            round_id: entry.round_id.clone(),
            hole_number: entry.hole_number,
            layout: entry.layout,
            disc_used: entry.disc_used.clone(),
            strokes: Some(entry.strokes),
            rating: Some(entry.rating),
            shot_shape: Some(entry.shot_shape),
            notes: entry.notes.clone(),
            created_at: entry.created_at.clone(),
        }
    }
}
