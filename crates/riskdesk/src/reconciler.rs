//! Ticket reconciler: folds optimistic writes and store change events into
//! one visible list.
//!
//! A ticket the agent creates is shown at once under a local id. The store
//! later reports the same ticket twice: as the result of the insert call
//! (promotion) and as an INSERT event (echo). The two race. Echoes that
//! arrive while a local write with the same natural key is in flight are
//! held back, and released once that write resolves, so the list holds at
//! most one row per ticket at every point.

use crate::store::{ChangeEvent, ChangeOp};
use riskdesk_shared::ticket::{LocalId, NaturalKey, PersistedId, Ticket, TicketId};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// Outcome of [`TicketReconciler::promote`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// Local row replaced in place by the stored record
    Promoted { index: usize },
    /// Stored record was already visible; the local row was dropped
    Merged,
    /// Agent deleted the local row before the write resolved. The caller
    /// must delete the stored record.
    Orphaned(PersistedId),
    /// Stored record was deleted before the write resolved
    Discarded,
}

/// Outcome of [`TicketReconciler::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Inserted,
    /// Held back until an in-flight local write with the same key resolves
    Deferred,
    Updated,
    Removed,
    /// Duplicate, stale or unknown; nothing changed
    Ignored,
}

#[derive(Debug, Clone)]
struct PendingWrite {
    key: NaturalKey,
    /// Local row deleted while the write was in flight
    abandoned: bool,
}

#[derive(Debug, Default)]
pub struct TicketReconciler {
    /// Visible rows, newest first
    entries: Vec<Ticket>,
    pending: HashMap<LocalId, PendingWrite>,
    deferred: BTreeMap<PersistedId, Ticket>,
    /// Ids deleted in the store; never shown again. Grows by one id per
    /// deleted ticket for the life of the reconciler.
    tombstones: HashSet<PersistedId>,
}

impl TicketReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the list from an initial fetch, newest first
    pub fn with_entries(entries: Vec<Ticket>) -> Self {
        let mut reconciler = Self::new();
        for ticket in entries {
            if reconciler.position(ticket.id).is_none() {
                reconciler.entries.push(ticket);
            }
        }
        reconciler
    }

    pub fn entries(&self) -> &[Ticket] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: TicketId) -> Option<&Ticket> {
        self.entries.iter().find(|t| t.id == id)
    }

    /// Local write still waiting for the store
    pub fn is_pending(&self, local: LocalId) -> bool {
        self.pending.contains_key(&local)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of echoes held back
    pub fn deferred_count(&self) -> usize {
        self.deferred.len()
    }

    fn position(&self, id: TicketId) -> Option<usize> {
        self.entries.iter().position(|t| t.id == id)
    }

    /// Show `ticket` at the head as an in-flight write. Keeps the ticket's
    /// local id; a persisted id is replaced by a fresh local one.
    pub fn create_local(&mut self, mut ticket: Ticket) -> LocalId {
        let local = ticket.id.local().unwrap_or_default();
        ticket.id = TicketId::Local(local);
        self.pending.insert(
            local,
            PendingWrite {
                key: ticket.natural_key(),
                abandoned: false,
            },
        );
        self.entries.insert(0, ticket);
        debug!("Local ticket {} created", local);
        local
    }

    /// The store accepted the write for `local` and returned `record`
    pub fn promote(&mut self, local: LocalId, record: Ticket) -> Promotion {
        let Some(id) = record.id.persisted() else {
            warn!("Promotion of {} has no persisted id, rolling back", local);
            self.rollback(local);
            return Promotion::Discarded;
        };
        let Some(pending) = self.pending.remove(&local) else {
            warn!("Promotion of unknown local ticket {} ignored", local);
            return Promotion::Discarded;
        };
        let local_id = TicketId::Local(local);

        let outcome = if pending.abandoned {
            self.remove_row(local_id);
            self.deferred.remove(&id);
            self.tombstones.insert(id);
            Promotion::Orphaned(id)
        } else if self.tombstones.contains(&id) {
            self.remove_row(local_id);
            self.deferred.remove(&id);
            Promotion::Discarded
        } else {
            // The echo may have arrived first and been updated since
            let row = self.deferred.remove(&id).unwrap_or(record);
            if self.position(TicketId::Persisted(id)).is_some() {
                self.remove_row(local_id);
                Promotion::Merged
            } else {
                match self.position(local_id) {
                    Some(index) => {
                        self.entries[index] = row;
                        Promotion::Promoted { index }
                    }
                    None => {
                        self.entries.insert(0, row);
                        Promotion::Promoted { index: 0 }
                    }
                }
            }
        };

        debug!("Local ticket {} -> {}: {:?}", local, id, outcome);
        self.flush_deferred();
        outcome
    }

    /// The store rejected the write for `local`; drop its row
    pub fn rollback(&mut self, local: LocalId) -> Option<Ticket> {
        self.pending.remove(&local);
        let removed = self.remove_row(TicketId::Local(local)).map(|(_, t)| t);
        debug!("Local ticket {} rolled back", local);
        self.flush_deferred();
        removed
    }

    /// Fold one store change event
    pub fn apply(&mut self, event: ChangeEvent) -> Applied {
        let Some(id) = event.persisted_id() else {
            warn!("Change event without a persisted id ignored");
            return Applied::Ignored;
        };
        let visible = self.position(TicketId::Persisted(id));

        let applied = match event.op {
            ChangeOp::Insert => {
                if self.tombstones.contains(&id)
                    || visible.is_some()
                    || self.deferred.contains_key(&id)
                {
                    Applied::Ignored
                } else if self.matches_pending(&event.record.natural_key()) {
                    self.deferred.insert(id, event.record);
                    Applied::Deferred
                } else {
                    self.entries.insert(0, event.record);
                    Applied::Inserted
                }
            }
            ChangeOp::Update => match visible {
                Some(index) => {
                    self.entries[index] = event.record;
                    Applied::Updated
                }
                None if self.deferred.contains_key(&id) => {
                    self.deferred.insert(id, event.record);
                    self.flush_deferred();
                    Applied::Deferred
                }
                None => Applied::Ignored,
            },
            ChangeOp::Delete => {
                self.tombstones.insert(id);
                let held = self.deferred.remove(&id).is_some();
                match visible {
                    Some(index) => {
                        self.entries.remove(index);
                        Applied::Removed
                    }
                    None if held => Applied::Removed,
                    None => Applied::Ignored,
                }
            }
        };

        debug!("Change {:?} {}: {:?}", event.op, id, applied);
        applied
    }

    /// Remove a row for an optimistic delete. A local row's in-flight write
    /// is marked abandoned. Returns the row and its index for [`Self::restore`].
    pub fn remove(&mut self, id: TicketId) -> Option<(usize, Ticket)> {
        if let TicketId::Local(local) = id {
            if let Some(pending) = self.pending.get_mut(&local) {
                pending.abandoned = true;
            }
        }
        self.remove_row(id)
    }

    /// The store confirmed `id` is gone. Drops its row and any held echo,
    /// and ignores every later event for it.
    pub fn forget(&mut self, id: PersistedId) {
        self.tombstones.insert(id);
        self.deferred.remove(&id);
        self.remove_row(TicketId::Persisted(id));
        debug!("Ticket {} forgotten", id);
    }

    /// Put back a row removed by [`Self::remove`]
    pub fn restore(&mut self, index: usize, ticket: Ticket) {
        if self.position(ticket.id).is_some() {
            return;
        }
        if let TicketId::Persisted(id) = ticket.id {
            if self.tombstones.contains(&id) {
                return;
            }
        }
        let index = index.min(self.entries.len());
        self.entries.insert(index, ticket);
    }

    /// Replace the row with the same id, returning the previous row
    pub fn replace(&mut self, ticket: Ticket) -> Option<Ticket> {
        let index = self.position(ticket.id)?;
        Some(std::mem::replace(&mut self.entries[index], ticket))
    }

    fn remove_row(&mut self, id: TicketId) -> Option<(usize, Ticket)> {
        let index = self.position(id)?;
        Some((index, self.entries.remove(index)))
    }

    fn matches_pending(&self, key: &NaturalKey) -> bool {
        self.pending.values().any(|p| &p.key == key)
    }

    /// Release held echoes whose key no longer matches an in-flight write
    fn flush_deferred(&mut self) {
        let ready: Vec<PersistedId> = self
            .deferred
            .iter()
            .filter(|(_, t)| !self.matches_pending(&t.natural_key()))
            .map(|(id, _)| *id)
            .collect();
        for id in ready {
            if let Some(ticket) = self.deferred.remove(&id) {
                if self.position(ticket.id).is_none() {
                    debug!("Releasing held ticket {}", id);
                    self.entries.insert(0, ticket);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use riskdesk_shared::duty::DutyId;
    use riskdesk_shared::fields::FieldId;
    use riskdesk_shared::ticket::{TicketForm, TicketStatus};

    fn draft(member: &str, window: &str) -> Ticket {
        let form = TicketForm::new("PG Soft")
            .with(FieldId::MemberId, member)
            .with(FieldId::TimeRange, window);
        Ticket::draft(&form, DutyId::Ic1, "alice", Utc::now())
    }

    fn stored(ticket: &Ticket, id: u64) -> Ticket {
        Ticket {
            id: TicketId::Persisted(PersistedId(id)),
            ..ticket.clone()
        }
    }

    #[test]
    fn test_promotion_before_echo() {
        let mut r = TicketReconciler::new();
        let t = draft("user@017", "10:00-11:00");
        let local = r.create_local(t.clone());

        assert_eq!(
            r.promote(local, stored(&t, 5001)),
            Promotion::Promoted { index: 0 }
        );
        assert_eq!(
            r.apply(ChangeEvent::insert(stored(&t, 5001))),
            Applied::Ignored
        );
        assert_eq!(r.len(), 1);
        assert_eq!(r.entries()[0].id, TicketId::Persisted(PersistedId(5001)));
    }

    #[test]
    fn test_echo_before_promotion() {
        let mut r = TicketReconciler::new();
        let t = draft("user@017", "10:00-11:00");
        let local = r.create_local(t.clone());

        assert_eq!(
            r.apply(ChangeEvent::insert(stored(&t, 5001))),
            Applied::Deferred
        );
        assert_eq!(r.len(), 1);

        assert_eq!(
            r.promote(local, stored(&t, 5001)),
            Promotion::Promoted { index: 0 }
        );
        assert_eq!(r.len(), 1);
        assert_eq!(r.deferred_count(), 0);
        assert!(!r.is_pending(local));
    }

    #[test]
    fn test_deferred_update_wins_over_insert_result() {
        let mut r = TicketReconciler::new();
        let t = draft("user@017", "10:00-11:00");
        let local = r.create_local(t.clone());

        r.apply(ChangeEvent::insert(stored(&t, 5001)));
        let mut updated = stored(&t, 5001);
        updated.status = TicketStatus::Handover;
        assert_eq!(r.apply(ChangeEvent::update(updated)), Applied::Deferred);

        r.promote(local, stored(&t, 5001));
        assert_eq!(r.entries()[0].status, TicketStatus::Handover);
    }

    #[test]
    fn test_rollback_releases_other_agents_ticket() {
        let mut r = TicketReconciler::new();
        let t = draft("user@017", "10:00-11:00");
        let local = r.create_local(t.clone());

        assert_eq!(
            r.apply(ChangeEvent::insert(stored(&t, 7001))),
            Applied::Deferred
        );
        assert!(r.rollback(local).is_some());
        assert_eq!(r.len(), 1);
        assert_eq!(r.entries()[0].id, TicketId::Persisted(PersistedId(7001)));
    }

    #[test]
    fn test_orphaned_promotion() {
        let mut r = TicketReconciler::new();
        let t = draft("user@017", "10:00-11:00");
        let local = r.create_local(t.clone());

        assert!(r.remove(TicketId::Local(local)).is_some());
        assert!(r.is_empty());
        assert_eq!(
            r.promote(local, stored(&t, 5001)),
            Promotion::Orphaned(PersistedId(5001))
        );
        assert_eq!(
            r.apply(ChangeEvent::insert(stored(&t, 5001))),
            Applied::Ignored
        );
        assert!(r.is_empty());
    }

    #[test]
    fn test_discarded_promotion() {
        let mut r = TicketReconciler::new();
        let t = draft("user@017", "10:00-11:00");
        let local = r.create_local(t.clone());

        r.apply(ChangeEvent::insert(stored(&t, 5001)));
        assert_eq!(
            r.apply(ChangeEvent::delete(stored(&t, 5001))),
            Applied::Removed
        );
        assert_eq!(r.promote(local, stored(&t, 5001)), Promotion::Discarded);
        assert!(r.is_empty());
    }

    #[test]
    fn test_delete_then_late_insert_is_ignored() {
        let mut r = TicketReconciler::new();
        let t = stored(&draft("bob", "09:00"), 42);
        assert_eq!(r.apply(ChangeEvent::delete(t.clone())), Applied::Ignored);
        assert_eq!(r.apply(ChangeEvent::insert(t)), Applied::Ignored);
        assert!(r.is_empty());
    }

    #[test]
    fn test_forget_ignores_queued_echo() {
        let mut r = TicketReconciler::new();
        let t = draft("user@017", "10:00-11:00");
        let local = r.create_local(t.clone());
        r.promote(local, stored(&t, 9));

        assert!(r.remove(TicketId::Persisted(PersistedId(9))).is_some());
        r.forget(PersistedId(9));

        let echo = ChangeEvent::insert(stored(&t, 9));
        assert_eq!(r.apply(echo), Applied::Ignored);
        assert!(r.is_empty());
    }

    #[test]
    fn test_forget_drops_held_echo() {
        let mut r = TicketReconciler::new();
        let t = draft("user@017", "10:00-11:00");
        let local = r.create_local(t.clone());
        r.apply(ChangeEvent::insert(stored(&t, 7001)));
        assert_eq!(r.deferred_count(), 1);

        r.forget(PersistedId(7001));
        assert_eq!(r.deferred_count(), 0);
        r.rollback(local);
        assert!(r.is_empty());
    }

    #[test]
    fn test_promote_unknown_local_is_discarded() {
        let mut r = TicketReconciler::new();
        let t = draft("user@017", "10:00-11:00");
        let local = r.create_local(t.clone());
        r.promote(local, stored(&t, 5001));

        // A repeated promotion must not ask for the stored record's deletion
        let again = r.promote(local, stored(&t, 5001));
        assert_eq!(again, Promotion::Discarded);
        assert_eq!(r.len(), 1);
        assert_eq!(r.entries()[0].id, TicketId::Persisted(PersistedId(5001)));

        let stray = r.promote(LocalId::new(), stored(&t, 5002));
        assert_eq!(stray, Promotion::Discarded);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_update_absent_is_noop() {
        let mut r = TicketReconciler::new();
        let t = stored(&draft("bob", "09:00"), 42);
        assert_eq!(r.apply(ChangeEvent::update(t)), Applied::Ignored);
        assert!(r.is_empty());
    }

    #[test]
    fn test_remove_and_restore_position() {
        let a = stored(&draft("a", "1"), 1);
        let b = stored(&draft("b", "2"), 2);
        let c = stored(&draft("c", "3"), 3);
        let mut r = TicketReconciler::with_entries(vec![c, b, a]);

        let (index, row) = r.remove(TicketId::Persisted(PersistedId(2))).unwrap();
        assert_eq!(index, 1);
        r.restore(index, row);
        let ids: Vec<TicketId> = r.entries().iter().map(|t| t.id).collect();
        assert_eq!(
            ids,
            vec![
                TicketId::Persisted(PersistedId(3)),
                TicketId::Persisted(PersistedId(2)),
                TicketId::Persisted(PersistedId(1)),
            ]
        );
    }
}
