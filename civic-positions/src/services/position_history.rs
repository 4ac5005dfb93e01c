//! Position history store
//!
//! Owns the current-holder rule: for every (position, jurisdiction) key at
//! most one entry is current. Two layers enforce it:
//!
//! - an in-process lock per key, held from the read of the current holder
//!   until the end-then-insert pair commits, so writers in this process
//!   serialize per key and never collide;
//! - the partial unique index on `position_history`, which rejects a second
//!   current entry written by anyone else. That rejection surfaces as
//!   [`Error::Conflict`].
//!
//! Keys are locked before a transaction is opened. Rows for different keys
//! take no in-process lock; SQLite serializes their commits and lock
//! contention is retried with backoff.

use chrono::{NaiveDate, Utc};
use civic_common::events::{CivicEvent, EventBus};
use civic_common::{Error, Result};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{elections, history, politicians, reference};
use crate::models::{
    AssignAction, AssignOutcome, AssignPositionRequest, EndTermRequest, EndedReason, Jurisdiction,
    PoliticianPositionTimeline, PositionHistoryEntry,
};
use crate::utils::retry_on_lock;

/// Identity of a seat
pub type HolderKey = (Uuid, Jurisdiction);

/// Idle lock entries are dropped once the map grows past this
const LOCK_PRUNE_THRESHOLD: usize = 1024;

/// Per-key async locks
#[derive(Default)]
struct KeyLocks {
    inner: Mutex<HashMap<HolderKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyLocks {
    async fn acquire(&self, key: HolderKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            if map.len() >= LOCK_PRUNE_THRESHOLD {
                map.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            map.entry(key).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Exclusive, transactional access to one seat
///
/// Holds the key lock and an open transaction. Other writes that must commit
/// together with the assignment (creating the politician of an import row)
/// run on [`AssignmentScope::connection`]. Dropping the scope without
/// [`PositionHistoryStore::commit`] rolls everything back.
pub struct AssignmentScope {
    key: HolderKey,
    tx: Transaction<'static, Sqlite>,
    events: Vec<CivicEvent>,
    _guard: OwnedMutexGuard<()>,
}

impl AssignmentScope {
    pub fn key(&self) -> &HolderKey {
        &self.key
    }

    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }
}

pub struct PositionHistoryStore {
    pool: SqlitePool,
    locks: KeyLocks,
    max_lock_wait: Duration,
    event_bus: Option<EventBus>,
}

impl PositionHistoryStore {
    pub fn new(pool: SqlitePool, max_lock_wait: Duration) -> Self {
        Self {
            pool,
            locks: KeyLocks::default(),
            max_lock_wait,
            event_bus: None,
        }
    }

    /// Publish `PositionAssigned` / `TermEnded` after each commit
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// How long a write may keep retrying lock contention
    pub fn max_lock_wait(&self) -> Duration {
        self.max_lock_wait
    }

    /// Lock a seat and open a transaction for it
    ///
    /// The transaction takes SQLite's write lock when it opens. A deferred
    /// transaction that reads the current holder and then writes fails with
    /// `SQLITE_BUSY_SNAPSHOT` whenever another connection committed in
    /// between, and the busy timeout does not cover that case.
    pub async fn begin(&self, position_id: Uuid, jurisdiction: Jurisdiction) -> Result<AssignmentScope> {
        let key = (position_id, jurisdiction);
        let guard = self.locks.acquire(key).await;
        let tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        Ok(AssignmentScope {
            key,
            tx,
            events: Vec::new(),
            _guard: guard,
        })
    }

    /// Commit a scope and publish what it did
    pub async fn commit(&self, scope: AssignmentScope) -> Result<()> {
        let AssignmentScope { tx, events, .. } = scope;
        tx.commit().await?;
        if let Some(bus) = &self.event_bus {
            for event in events {
                bus.emit_lossy(event);
            }
        }
        Ok(())
    }

    /// Create, update or supersede the current entry of the scope's seat
    ///
    /// - no current holder: insert a current entry;
    /// - same politician and `with_history == false`: update party and term
    ///   dates in place (re-importing an incumbent adds nothing);
    /// - otherwise: end the current entry and insert the new one.
    ///
    /// The ended entry gets `term_end` = the election date when the request
    /// carries an election (reason `election`), else the new `term_start`
    /// (reason `replaced`, or `term_expired` for the same politician). When the
    /// election date precedes the outgoing term, the new `term_start` is used.
    pub async fn assign_in(
        &self,
        scope: &mut AssignmentScope,
        request: &AssignPositionRequest,
    ) -> Result<AssignOutcome> {
        if scope.key != (request.position_id, request.jurisdiction) {
            return Err(Error::Internal(format!(
                "assignment for {}/{} issued in scope of {}/{}",
                request.position_id, request.jurisdiction, scope.key.0, scope.key.1
            )));
        }
        check_term(request.term_start, request.term_end)?;

        let now = Utc::now();
        let current =
            history::find_current(&mut *scope.tx, request.position_id, &request.jurisdiction).await?;

        let new_entry = |id: Uuid| PositionHistoryEntry {
            id,
            politician_id: request.politician_id,
            position_id: request.position_id,
            party_id: request.party_id,
            jurisdiction: request.jurisdiction,
            term_start: request.term_start,
            term_end: request.term_end,
            is_current: true,
            ended_reason: None,
            election_id: request.election_id,
            created_by: request.created_by.clone(),
            created_at: now,
            updated_at: now,
        };

        let outcome = match current {
            None => {
                let entry = new_entry(Uuid::new_v4());
                history::insert_entry(&mut *scope.tx, &entry).await?;
                AssignOutcome {
                    entry,
                    action: AssignAction::Created,
                }
            }
            Some(existing)
                if existing.politician_id == request.politician_id && !request.with_history =>
            {
                let mut entry = existing.clone();
                entry.party_id = request.party_id;
                entry.term_start = request.term_start;
                entry.term_end = request.term_end;
                entry.election_id = request.election_id.or(existing.election_id);

                if entry != existing {
                    entry.updated_at = now;
                    if !history::update_current(&mut *scope.tx, &entry).await? {
                        return Err(Error::Conflict(format!(
                            "entry {} stopped being current during update",
                            entry.id
                        )));
                    }
                    debug!(entry_id = %entry.id, "Current entry updated in place");
                }
                AssignOutcome {
                    entry,
                    action: AssignAction::Updated,
                }
            }
            Some(existing) => {
                let (end_date, reason) = self.supersession_end(scope, &existing, request).await?;
                if !history::end_entry(&mut *scope.tx, existing.id, end_date, reason, now).await? {
                    return Err(Error::Conflict(format!(
                        "entry {} was ended concurrently",
                        existing.id
                    )));
                }
                let entry = new_entry(Uuid::new_v4());
                history::insert_entry(&mut *scope.tx, &entry).await?;
                info!(
                    position_id = %request.position_id,
                    jurisdiction = %request.jurisdiction,
                    ended_entry_id = %existing.id,
                    new_entry_id = %entry.id,
                    reason = reason.as_str(),
                    "Current holder superseded"
                );
                AssignOutcome {
                    entry,
                    action: AssignAction::Superseded {
                        ended_entry_id: existing.id,
                    },
                }
            }
        };

        if outcome.action != AssignAction::Updated {
            politicians::touch_politician(&mut *scope.tx, request.politician_id).await?;
        }

        scope.events.push(CivicEvent::PositionAssigned {
            entry_id: outcome.entry.id,
            politician_id: outcome.entry.politician_id,
            position_id: outcome.entry.position_id,
            superseded_entry_id: outcome.superseded_entry_id(),
            timestamp: now,
        });

        Ok(outcome)
    }

    async fn supersession_end(
        &self,
        scope: &mut AssignmentScope,
        existing: &PositionHistoryEntry,
        request: &AssignPositionRequest,
    ) -> Result<(NaiveDate, EndedReason)> {
        let (mut end_date, reason) = match request.election_id {
            Some(election_id) => {
                let election = elections::get_election(&mut *scope.tx, election_id)
                    .await?
                    .ok_or_else(|| Error::NotFound(format!("election {}", election_id)))?;
                (election.election_date, EndedReason::Election)
            }
            None if existing.politician_id == request.politician_id => {
                (request.term_start, EndedReason::TermExpired)
            }
            None => (request.term_start, EndedReason::Replaced),
        };

        if end_date < existing.term_start {
            end_date = request.term_start;
        }
        if end_date < existing.term_start {
            return Err(Error::InvalidInput(format!(
                "new term starting {} precedes the current holder's term start {}",
                request.term_start, existing.term_start
            )));
        }
        Ok((end_date, reason))
    }

    /// Assign a position in its own transaction
    ///
    /// Checks that the jurisdiction exists and suits the position, then runs
    /// [`Self::assign_in`] under the seat lock, retrying lock contention.
    pub async fn assign_position(&self, request: AssignPositionRequest) -> Result<AssignOutcome> {
        check_term(request.term_start, request.term_end)?;

        let position = reference::get_position(&self.pool, request.position_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("position {}", request.position_id)))?;
        if !position.accepts(request.jurisdiction.kind()) {
            return Err(Error::InvalidInput(format!(
                "{} cannot be held in a {} jurisdiction",
                position.name,
                request.jurisdiction.kind()
            )));
        }
        if !reference::jurisdiction_exists(&self.pool, &request.jurisdiction).await? {
            return Err(Error::NotFound(format!("jurisdiction {}", request.jurisdiction)));
        }
        if politicians::get_politician(&self.pool, request.politician_id)
            .await?
            .is_none()
        {
            return Err(Error::NotFound(format!("politician {}", request.politician_id)));
        }
        if let Some(party_id) = request.party_id {
            if reference::get_party(&self.pool, party_id).await?.is_none() {
                return Err(Error::NotFound(format!("party {}", party_id)));
            }
        }

        retry_on_lock("assign_position", self.max_lock_wait, || async {
            let mut scope = self.begin(request.position_id, request.jurisdiction).await?;
            let outcome = self.assign_in(&mut scope, &request).await?;
            self.commit(scope).await?;
            Ok(outcome)
        })
        .await
    }

    /// End a current term directly (resignation, death, ...)
    pub async fn end_term(&self, entry_id: Uuid, request: EndTermRequest) -> Result<PositionHistoryEntry> {
        let entry = history::get_entry(&self.pool, entry_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("position history entry {}", entry_id)))?;

        if !entry.is_current {
            return Err(Error::Conflict(format!("entry {} has already ended", entry_id)));
        }
        check_term(entry.term_start, Some(request.end_date))?;

        retry_on_lock("end_term", self.max_lock_wait, || async {
            let mut scope = self.begin(entry.position_id, entry.jurisdiction).await?;
            let now = Utc::now();
            if !history::end_entry(
                &mut *scope.tx,
                entry_id,
                request.end_date,
                request.ended_reason,
                now,
            )
            .await?
            {
                return Err(Error::Conflict(format!("entry {} has already ended", entry_id)));
            }
            scope.events.push(CivicEvent::TermEnded {
                entry_id,
                ended_reason: request.ended_reason.as_str().to_string(),
                timestamp: now,
            });
            self.commit(scope).await
        })
        .await?;

        info!(entry_id = %entry_id, reason = request.ended_reason.as_str(), "Term ended");

        history::get_entry(&self.pool, entry_id)
            .await?
            .ok_or_else(|| Error::Internal(format!("entry {} vanished after ending", entry_id)))
    }

    pub async fn get_current_holder(
        &self,
        position_id: Uuid,
        jurisdiction: Jurisdiction,
    ) -> Result<Option<PositionHistoryEntry>> {
        history::find_current(&self.pool, position_id, &jurisdiction).await
    }

    /// Current entries plus past entries, each ordered by term_start descending
    pub async fn get_timeline(&self, politician_id: Uuid) -> Result<PoliticianPositionTimeline> {
        if politicians::get_politician(&self.pool, politician_id)
            .await?
            .is_none()
        {
            return Err(Error::NotFound(format!("politician {}", politician_id)));
        }

        let (current, past): (Vec<_>, Vec<_>) = history::list_for_politician(&self.pool, politician_id)
            .await?
            .into_iter()
            .partition(|e| e.entry.is_current);

        Ok(PoliticianPositionTimeline {
            politician_id,
            current,
            past,
        })
    }
}

fn check_term(start: NaiveDate, end: Option<NaiveDate>) -> Result<()> {
    match end {
        Some(end) if end < start => Err(Error::InvalidInput(format!(
            "term end {} is before term start {}",
            end, start
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::db::reference::{insert_jurisdiction, insert_position};
    use crate::models::{Branch, JurisdictionKind, Position, PositionLevel};

    struct Fixture {
        store: PositionHistoryStore,
        governor: Uuid,
        province: Jurisdiction,
    }

    async fn fixture() -> Fixture {
        let pool = memory_pool().await;
        let governor = Position {
            id: Uuid::new_v4(),
            name: "Governor".to_string(),
            slug: "governor".to_string(),
            level: PositionLevel::Provincial,
            branch: Branch::Executive,
            term_years: 3,
            max_terms: Some(3),
            is_elected: true,
        };
        insert_position(&pool, &governor).await.unwrap();
        let province = insert_jurisdiction(&pool, JurisdictionKind::Province, "Ilocos Norte", None)
            .await
            .unwrap();
        Fixture {
            store: PositionHistoryStore::new(pool, Duration::from_secs(1)),
            governor: governor.id,
            province,
        }
    }

    async fn politician(store: &PositionHistoryStore, name: &str) -> Uuid {
        politicians::insert_politician(store.pool(), name).await.unwrap().id
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(f: &Fixture, politician_id: Uuid, start: NaiveDate) -> AssignPositionRequest {
        AssignPositionRequest {
            politician_id,
            position_id: f.governor,
            jurisdiction: f.province,
            party_id: None,
            term_start: start,
            term_end: None,
            election_id: None,
            with_history: false,
            created_by: Some("test".to_string()),
        }
    }

    #[tokio::test]
    async fn test_first_assignment_creates() {
        let f = fixture().await;
        let a = politician(&f.store, "Ana").await;

        let outcome = f.store.assign_position(request(&f, a, date(2019, 6, 30))).await.unwrap();
        assert_eq!(outcome.action, AssignAction::Created);
        assert!(outcome.entry.is_current);

        let holder = f.store.get_current_holder(f.governor, f.province).await.unwrap();
        assert_eq!(holder.map(|e| e.id), Some(outcome.entry.id));
    }

    #[tokio::test]
    async fn test_reassigning_incumbent_is_idempotent() {
        let f = fixture().await;
        let a = politician(&f.store, "Ana").await;

        let first = f.store.assign_position(request(&f, a, date(2019, 6, 30))).await.unwrap();
        let second = f.store.assign_position(request(&f, a, date(2019, 6, 30))).await.unwrap();

        assert_eq!(second.action, AssignAction::Updated);
        assert_eq!(second.entry.id, first.entry.id);
        assert_eq!(second.entry.updated_at, first.entry.updated_at);

        let timeline = f.store.get_timeline(a).await.unwrap();
        assert_eq!(timeline.current.len() + timeline.past.len(), 1);
    }

    #[tokio::test]
    async fn test_incumbent_metadata_updated_in_place() {
        let f = fixture().await;
        let a = politician(&f.store, "Ana").await;
        f.store.assign_position(request(&f, a, date(2019, 6, 30))).await.unwrap();

        let mut update = request(&f, a, date(2019, 6, 30));
        update.term_end = Some(date(2022, 6, 30));
        let outcome = f.store.assign_position(update).await.unwrap();

        assert_eq!(outcome.action, AssignAction::Updated);
        assert_eq!(outcome.entry.term_end, Some(date(2022, 6, 30)));
        assert!(outcome.entry.is_current);
    }

    #[tokio::test]
    async fn test_new_politician_supersedes() {
        let f = fixture().await;
        let a = politician(&f.store, "Ana").await;
        let b = politician(&f.store, "Ben").await;

        let first = f.store.assign_position(request(&f, a, date(2019, 6, 30))).await.unwrap();
        let second = f.store.assign_position(request(&f, b, date(2022, 6, 30))).await.unwrap();

        assert_eq!(second.superseded_entry_id(), Some(first.entry.id));

        let ended = history::get_entry(f.store.pool(), first.entry.id).await.unwrap().unwrap();
        assert!(!ended.is_current);
        assert_eq!(ended.ended_reason, Some(EndedReason::Replaced));
        assert_eq!(ended.term_end, Some(date(2022, 6, 30)));

        let count = history::count_current(f.store.pool(), f.governor, &f.province).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_with_history_ends_own_term() {
        let f = fixture().await;
        let a = politician(&f.store, "Ana").await;
        f.store.assign_position(request(&f, a, date(2019, 6, 30))).await.unwrap();

        let mut reelect = request(&f, a, date(2022, 6, 30));
        reelect.with_history = true;
        let outcome = f.store.assign_position(reelect).await.unwrap();
        assert!(matches!(outcome.action, AssignAction::Superseded { .. }));

        let timeline = f.store.get_timeline(a).await.unwrap();
        assert_eq!(timeline.current.len(), 1);
        assert_eq!(timeline.past.len(), 1);
        assert_eq!(timeline.past[0].entry.ended_reason, Some(EndedReason::TermExpired));
        assert_eq!(timeline.current[0].position_name, "Governor");
    }

    #[tokio::test]
    async fn test_election_supersession_uses_election_date() {
        let f = fixture().await;
        let a = politician(&f.store, "Ana").await;
        let b = politician(&f.store, "Ben").await;
        let election = elections::create_election(
            f.store.pool(),
            "2022 General",
            date(2022, 5, 9),
            PositionLevel::Provincial,
        )
        .await
        .unwrap();

        let first = f.store.assign_position(request(&f, a, date(2019, 6, 30))).await.unwrap();
        let mut elected = request(&f, b, date(2022, 6, 30));
        elected.election_id = Some(election.id);
        let outcome = f.store.assign_position(elected).await.unwrap();
        assert_eq!(outcome.entry.election_id, Some(election.id));

        let ended = history::get_entry(f.store.pool(), first.entry.id).await.unwrap().unwrap();
        assert_eq!(ended.ended_reason, Some(EndedReason::Election));
        assert_eq!(ended.term_end, Some(date(2022, 5, 9)));
    }

    #[tokio::test]
    async fn test_backdated_supersession_rejected() {
        let f = fixture().await;
        let a = politician(&f.store, "Ana").await;
        let b = politician(&f.store, "Ben").await;
        f.store.assign_position(request(&f, a, date(2019, 6, 30))).await.unwrap();

        let err = f
            .store
            .assign_position(request(&f, b, date(2016, 6, 30)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        // Nothing changed
        let holder = f.store.get_current_holder(f.governor, f.province).await.unwrap().unwrap();
        assert_eq!(holder.politician_id, a);
    }

    #[tokio::test]
    async fn test_request_validation() {
        let f = fixture().await;
        let a = politician(&f.store, "Ana").await;

        let mut inverted = request(&f, a, date(2022, 6, 30));
        inverted.term_end = Some(date(2020, 1, 1));
        assert!(matches!(
            f.store.assign_position(inverted).await,
            Err(Error::InvalidInput(_))
        ));

        let mut wrong_level = request(&f, a, date(2022, 6, 30));
        wrong_level.jurisdiction = Jurisdiction::National;
        assert!(matches!(
            f.store.assign_position(wrong_level).await,
            Err(Error::InvalidInput(_))
        ));

        let mut unknown_place = request(&f, a, date(2022, 6, 30));
        unknown_place.jurisdiction = Jurisdiction::Province(Uuid::new_v4());
        assert!(matches!(
            f.store.assign_position(unknown_place).await,
            Err(Error::NotFound(_))
        ));

        let unknown_person = request(&f, Uuid::new_v4(), date(2022, 6, 30));
        assert!(matches!(
            f.store.assign_position(unknown_person).await,
            Err(Error::NotFound(_))
        ));

        let mut unknown_party = request(&f, a, date(2022, 6, 30));
        unknown_party.party_id = Some(Uuid::new_v4());
        assert!(matches!(
            f.store.assign_position(unknown_party).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_end_term() {
        let f = fixture().await;
        let a = politician(&f.store, "Ana").await;
        let outcome = f.store.assign_position(request(&f, a, date(2019, 6, 30))).await.unwrap();

        let end = EndTermRequest {
            end_date: date(2020, 3, 1),
            ended_reason: EndedReason::Resigned,
        };
        let ended = f.store.end_term(outcome.entry.id, end.clone()).await.unwrap();
        assert!(!ended.is_current);
        assert_eq!(ended.ended_reason, Some(EndedReason::Resigned));
        assert!(f.store.get_current_holder(f.governor, f.province).await.unwrap().is_none());

        let err = f.store.end_term(outcome.entry.id, end).await.unwrap_err();
        assert!(err.is_conflict());

        let err = f
            .store
            .end_term(
                Uuid::new_v4(),
                EndTermRequest {
                    end_date: date(2020, 3, 1),
                    ended_reason: EndedReason::Other,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_end_before_start_rejected() {
        let f = fixture().await;
        let a = politician(&f.store, "Ana").await;
        let outcome = f.store.assign_position(request(&f, a, date(2019, 6, 30))).await.unwrap();

        let err = f
            .store
            .end_term(
                outcome.entry.id,
                EndTermRequest {
                    end_date: date(2019, 1, 1),
                    ended_reason: EndedReason::Resigned,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unique_index_rejects_second_current_entry() {
        let f = fixture().await;
        let a = politician(&f.store, "Ana").await;
        let b = politician(&f.store, "Ben").await;
        let first = f.store.assign_position(request(&f, a, date(2019, 6, 30))).await.unwrap();

        // A writer bypassing the lock
        let mut rogue = first.entry.clone();
        rogue.id = Uuid::new_v4();
        rogue.politician_id = b;
        let err = history::insert_entry(f.store.pool(), &rogue).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_dropped_scope_rolls_back() {
        let f = fixture().await;
        let a = politician(&f.store, "Ana").await;
        {
            let mut scope = f.store.begin(f.governor, f.province).await.unwrap();
            f.store
                .assign_in(&mut scope, &request(&f, a, date(2019, 6, 30)))
                .await
                .unwrap();
        }
        assert!(f.store.get_current_holder(f.governor, f.province).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_events_published_on_commit() {
        let f = fixture().await;
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let store = PositionHistoryStore {
            event_bus: Some(bus),
            ..f.store
        };
        let a = politician(&store, "Ana").await;
        let outcome = store
            .assign_position(AssignPositionRequest {
                politician_id: a,
                position_id: f.governor,
                jurisdiction: f.province,
                party_id: None,
                term_start: date(2019, 6, 30),
                term_end: None,
                election_id: None,
                with_history: false,
                created_by: None,
            })
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            CivicEvent::PositionAssigned { entry_id, .. } => assert_eq!(entry_id, outcome.entry.id),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeline_unknown_politician() {
        let f = fixture().await;
        assert!(matches!(
            f.store.get_timeline(Uuid::new_v4()).await,
            Err(Error::NotFound(_))
        ));
    }
}
