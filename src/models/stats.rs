//! Evening review aggregates for one layout.
//!
//! Computed on demand from the practice notes of a layout; nothing here is
//! stored.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::models::{Layout, PracticeNote};
use crate::services::hole::{FIRST_HOLE, LAST_HOLE};

/// Average rating for one disc across all rated throws.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscConfidence {
    pub disc: String,
    pub average_rating: f64,
    pub attempts: u32,
}

/// Most recent practice result on a hole.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoleSummary {
    pub hole_number: u8,
    pub disc_used: String,
    pub rating: Option<u8>,
    pub notes: String,
    pub logged_at: String,
}

/// Review of everything logged on a layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutReview {
    pub layout: Layout,
    /// Sorted by average rating, best first
    pub disc_confidence: Vec<DiscConfidence>,
    /// One entry per hole that has data, in hole order
    pub holes: Vec<HoleSummary>,
}

impl LayoutReview {
    /// Build the review from the notes of `layout`; other layouts are ignored.
    pub fn from_notes(layout: Layout, notes: &[PracticeNote]) -> Self {
        let notes: Vec<&PracticeNote> = notes.iter().filter(|n| n.layout == layout).collect();

        // ─── Disc confidence ─────────────────────────────────────────
        let mut ratings: HashMap<&str, (u32, u32)> = HashMap::new();
        for &note in &notes {
            if let Some(rating) = note.rating {
                let entry = ratings.entry(note.disc_used.as_str()).or_insert((0, 0));
                entry.0 += u32::from(rating);
                entry.1 += 1;
            }
        }

        let mut disc_confidence: Vec<DiscConfidence> = ratings
            .into_iter()
            .map(|(disc, (sum, count))| DiscConfidence {
                disc: disc.to_string(),
                average_rating: f64::from(sum) / f64::from(count),
                attempts: count,
            })
            .collect();
        disc_confidence.sort_by(|a, b| {
            b.average_rating
                .total_cmp(&a.average_rating)
                .then_with(|| a.disc.cmp(&b.disc))
        });

        // ─── Hole breakdown ──────────────────────────────────────────
        let mut latest: BTreeMap<u8, &PracticeNote> = BTreeMap::new();
        for &note in &notes {
            if !(FIRST_HOLE..=LAST_HOLE).contains(&note.hole_number) {
                continue;
            }
            let newer = match latest.get(&note.hole_number) {
                Some(current) => logged_at(note) > logged_at(current),
                None => true,
            };
            if newer {
                latest.insert(note.hole_number, note);
            }
        }

        let holes = latest
            .into_values()
            .map(|note| HoleSummary {
                hole_number: note.hole_number,
                disc_used: note.disc_used.clone(),
                rating: note.rating,
                notes: note.notes.clone(),
                logged_at: note.created_at.clone(),
            })
            .collect();

        Self {
            layout,
            disc_confidence,
            holes,
        }
    }
}

/// Unparseable timestamps sort as oldest.
fn logged_at(note: &PracticeNote) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(&note.created_at).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(hole: u8, layout: Layout, disc: &str, rating: u8, created_at: &str) -> PracticeNote {
        PracticeNote {
            id: None,
            round_id: None,
            hole_number: hole,
            layout,
            disc_used: disc.to_string(),
            strokes: Some(3),
            rating: Some(rating),
            shot_shape: None,
            notes: format!("{} on {}", disc, hole),
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_disc_confidence_sorted_by_average() {
        let notes = vec![
            note(1, Layout::Shorts, "Firebird", 5, "2026-06-01T09:00:00-05:00"),
            note(2, Layout::Shorts, "Firebird", 3, "2026-06-01T09:10:00-05:00"),
            note(3, Layout::Shorts, "Zone", 5, "2026-06-01T09:20:00-05:00"),
            note(4, Layout::Longs, "Trail", 1, "2026-06-01T09:30:00-05:00"),
        ];

        let review = LayoutReview::from_notes(Layout::Shorts, &notes);

        assert_eq!(review.disc_confidence.len(), 2);
        assert_eq!(review.disc_confidence[0].disc, "Zone");
        assert_eq!(review.disc_confidence[0].average_rating, 5.0);
        assert_eq!(review.disc_confidence[1].disc, "Firebird");
        assert_eq!(review.disc_confidence[1].average_rating, 4.0);
        assert_eq!(review.disc_confidence[1].attempts, 2);
    }

    #[test]
    fn test_hole_breakdown_keeps_latest_per_hole() {
        let notes = vec![
            note(5, Layout::Longs, "Firebird", 2, "2026-06-01T09:00:00-05:00"),
            note(5, Layout::Longs, "Trail", 4, "2026-06-02T09:00:00-05:00"),
            note(1, Layout::Longs, "Zone", 3, "2026-06-01T08:00:00-05:00"),
        ];

        let review = LayoutReview::from_notes(Layout::Longs, &notes);

        assert_eq!(review.holes.len(), 2);
        assert_eq!(review.holes[0].hole_number, 1);
        assert_eq!(review.holes[1].hole_number, 5);
        assert_eq!(review.holes[1].disc_used, "Trail");
    }

    #[test]
    fn test_empty_review() {
        let review = LayoutReview::from_notes(Layout::Shorts, &[]);
        assert!(review.disc_confidence.is_empty());
        assert!(review.holes.is_empty());
    }
}
