//! In-memory data store.
//!
//! Behaves like the remote store for a single user: ids are assigned on
//! insert, rows survive `end()` and can be deleted "externally". An outage
//! switch makes every call fail with `PersistenceError::Unavailable`; a
//! narrower one fails only round lookups.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::Mutex;

use crate::db::RemoteDataStore;
use crate::error::PersistenceError;
use crate::models::{Layout, NewRound, PracticeNote, Round, ScoreEntry, Session};

#[derive(Default)]
pub struct MemoryDataStore {
    rounds: DashMap<String, Round>,
    notes: Mutex<Vec<PracticeNote>>,
    next_id: AtomicU64,
    unavailable: AtomicBool,
    round_fetch_unavailable: AtomicBool,
    calls: AtomicUsize,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage (`true`) or recovery (`false`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fail only `fetch_round`, leaving writes working.
    pub fn set_round_fetch_unavailable(&self, unavailable: bool) {
        self.round_fetch_unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delete a round behind the tracker's back.
    pub fn delete_round(&self, round_id: &str) -> bool {
        self.rounds.remove(round_id).is_some()
    }

    /// Number of calls made, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of every stored note in insertion order.
    pub async fn notes(&self) -> Vec<PracticeNote> {
        self.notes.lock().await.clone()
    }

    fn begin(&self) -> Result<(), PersistenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "simulated store outage".to_string(),
            ));
        }
        Ok(())
    }

    fn assign_id(&self) -> String {
        (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }
}

#[async_trait]
impl RemoteDataStore for MemoryDataStore {
    async fn insert_round(
        &self,
        _session: &Session,
        round: &NewRound,
    ) -> Result<Round, PersistenceError> {
        self.begin()?;
        let id = self.assign_id();
        let stored = round.clone().into_round(Some(id.clone()));
        self.rounds.insert(id, stored.clone());
        Ok(stored)
    }

    async fn fetch_round(
        &self,
        _session: &Session,
        round_id: &str,
    ) -> Result<Option<Round>, PersistenceError> {
        self.begin()?;
        if self.round_fetch_unavailable.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "simulated round lookup timeout".to_string(),
            ));
        }
        Ok(self.rounds.get(round_id).map(|r| r.value().clone()))
    }

    async fn list_rounds(&self, _session: &Session) -> Result<Vec<Round>, PersistenceError> {
        self.begin()?;
        let mut rounds: Vec<Round> = self.rounds.iter().map(|r| r.value().clone()).collect();
        // Ids are assigned in insertion order.
        rounds.sort_by_key(|r| {
            std::cmp::Reverse(r.id.as_deref().and_then(|id| id.parse::<u64>().ok()))
        });
        Ok(rounds)
    }

    async fn insert_score_entry(
        &self,
        _session: &Session,
        entry: &ScoreEntry,
    ) -> Result<PracticeNote, PersistenceError> {
        self.begin()?;
        let mut note = PracticeNote::from(entry);
        note.id = Some(self.assign_id());
        self.notes.lock().await.push(note.clone());
        Ok(note)
    }

    async fn latest_note(
        &self,
        _session: &Session,
        hole_number: u8,
        layout: Layout,
    ) -> Result<Option<PracticeNote>, PersistenceError> {
        self.begin()?;
        Ok(self
            .notes
            .lock()
            .await
            .iter()
            .rev()
            .find(|n| n.hole_number == hole_number && n.layout == layout)
            .cloned())
    }

    async fn notes_for_layout(
        &self,
        _session: &Session,
        layout: Layout,
    ) -> Result<Vec<PracticeNote>, PersistenceError> {
        self.begin()?;
        let mut notes: Vec<PracticeNote> = self
            .notes
            .lock()
            .await
            .iter()
            .filter(|n| n.layout == layout)
            .cloned()
            .collect();
        notes.sort_by_key(|n| n.hole_number);
        Ok(notes)
    }

    async fn notes_for_round(
        &self,
        _session: &Session,
        round_id: &str,
    ) -> Result<Vec<PracticeNote>, PersistenceError> {
        self.begin()?;
        let mut notes: Vec<PracticeNote> = self
            .notes
            .lock()
            .await
            .iter()
            .filter(|n| n.round_id.as_deref() == Some(round_id))
            .cloned()
            .collect();
        notes.sort_by_key(|n| n.hole_number);
        Ok(notes)
    }
}
