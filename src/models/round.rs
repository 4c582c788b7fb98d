// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Practice round model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Course layout played during a round.
///
/// Stored under the names the tracker has always written to the
/// `layout` column; the short names are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layout {
    #[serde(rename = "Shorts (Round 1)", alias = "Shorts")]
    Shorts,
    #[serde(rename = "Longs (Round 2)", alias = "Longs")]
    Longs,
}

impl Layout {
    pub const ALL: [Layout; 2] = [Layout::Shorts, Layout::Longs];

    /// Value stored in the remote `layout` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Shorts => "Shorts (Round 1)",
            Layout::Longs => "Longs (Round 2)",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Layout::Shorts => "Shorts",
            Layout::Longs => "Longs",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Layout::ALL
            .into_iter()
            .find(|l| s.eq_ignore_ascii_case(l.as_str()) || s.eq_ignore_ascii_case(l.short_name()))
            .ok_or_else(|| format!("unknown layout: {}", s))
    }
}

/// An in-progress (or just ended) practice round.
///
/// `layout` and `selected_discs` never change after the round is started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Remote identity; `None` for a degraded local-only round
    pub id: Option<String>,
    pub name: String,
    pub layout: Layout,
    pub selected_discs: BTreeSet<String>,
    /// Creation time (RFC3339, venue-local)
    pub created_at: String,
    #[serde(default)]
    pub ended: bool,
}

impl Round {
    /// True when the round was never written to the remote store.
    pub fn is_local_only(&self) -> bool {
        self.id.is_none()
    }
}

/// Round about to be inserted into the `rounds` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRound {
    pub name: String,
    pub layout: Layout,
    pub selected_discs: BTreeSet<String>,
    pub created_at: String,
}

impl NewRound {
    /// Materialize the round with the identity the store assigned (if any).
    pub fn into_round(self, id: Option<String>) -> Round {
        Round {
            id,
            name: self.name,
            layout: self.layout,
            selected_discs: self.selected_discs,
            created_at: self.created_at,
            ended: false,
        }
    }
}
