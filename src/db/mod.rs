//! Remote data store (Supabase / PostgREST).

pub mod memory;
pub mod supabase;

pub use memory::MemoryDataStore;
pub use supabase::SupabaseDb;

use async_trait::async_trait;

use crate::error::PersistenceError;
use crate::models::{Layout, NewRound, PracticeNote, Round, ScoreEntry, Session};

/// Table names as constants.
pub mod tables {
    pub const ROUNDS: &str = "rounds";
    pub const PRACTICE_NOTES: &str = "practice_notes";
}

/// Relational store holding rounds and score entries.
///
/// Every call is a single-row, single-statement operation; there is no
/// transaction or optimistic locking across calls. Calls run on behalf of
/// the signed-in user, whose session scopes what is visible.
#[async_trait]
pub trait RemoteDataStore: Send + Sync {
    /// Insert a round; the returned round carries the store-assigned id.
    async fn insert_round(
        &self,
        session: &Session,
        round: &NewRound,
    ) -> Result<Round, PersistenceError>;

    /// Fetch a round by id. `Ok(None)` when no such row exists.
    async fn fetch_round(
        &self,
        session: &Session,
        round_id: &str,
    ) -> Result<Option<Round>, PersistenceError>;

    /// All rounds, newest first.
    async fn list_rounds(&self, session: &Session) -> Result<Vec<Round>, PersistenceError>;

    /// Append a score entry.
    async fn insert_score_entry(
        &self,
        session: &Session,
        entry: &ScoreEntry,
    ) -> Result<PracticeNote, PersistenceError>;

    /// Most recent entry for a hole on a layout.
    async fn latest_note(
        &self,
        session: &Session,
        hole_number: u8,
        layout: Layout,
    ) -> Result<Option<PracticeNote>, PersistenceError>;

    /// Every entry on a layout, ordered by hole number.
    async fn notes_for_layout(
        &self,
        session: &Session,
        layout: Layout,
    ) -> Result<Vec<PracticeNote>, PersistenceError>;

    /// Every entry of a round, ordered by hole then time.
    async fn notes_for_round(
        &self,
        session: &Session,
        round_id: &str,
    ) -> Result<Vec<PracticeNote>, PersistenceError>;
}
