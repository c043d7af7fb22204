//! Ticket store collaborator.
//!
//! The store assigns persisted ids and broadcasts a change event for every
//! write, including the caller's own. Events for one ticket arrive in
//! order; events for different tickets may interleave.

use async_trait::async_trait;
use riskdesk_shared::error::StoreError;
use riskdesk_shared::ticket::{PersistedId, Ticket, TicketId, TicketPatch};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Kind of change, named as the store names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// Change notification with the full record after the change
/// (before it, for deletes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub op: ChangeOp,
    pub record: Ticket,
}

impl ChangeEvent {
    pub fn insert(record: Ticket) -> Self {
        Self {
            op: ChangeOp::Insert,
            record,
        }
    }

    pub fn update(record: Ticket) -> Self {
        Self {
            op: ChangeOp::Update,
            record,
        }
    }

    pub fn delete(record: Ticket) -> Self {
        Self {
            op: ChangeOp::Delete,
            record,
        }
    }

    /// Parse a change payload as the store sends it
    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }

    /// Persisted id of the record; events without one are malformed
    pub fn persisted_id(&self) -> Option<PersistedId> {
        self.record.id.persisted()
    }
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Persist a new ticket and return the stored record
    async fn insert(&self, ticket: &Ticket) -> Result<Ticket, StoreError>;

    async fn update(&self, id: PersistedId, patch: &TicketPatch) -> Result<(), StoreError>;

    async fn delete(&self, id: PersistedId) -> Result<(), StoreError>;

    /// Change feed for all tickets, starting now
    fn subscribe(&self) -> UnboundedReceiver<ChangeEvent>;
}

#[derive(Default)]
struct StoreState {
    next_id: u64,
    tickets: BTreeMap<PersistedId, Ticket>,
    fail_next: Option<StoreError>,
}

/// In-process store with failure injection
pub struct MemoryTicketStore {
    state: Mutex<StoreState>,
    subscribers: Mutex<Vec<UnboundedSender<ChangeEvent>>>,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::with_first_id(1)
    }

    /// Store whose first assigned id is `first`
    pub fn with_first_id(first: u64) -> Self {
        Self {
            state: Mutex::new(StoreState {
                next_id: first,
                ..Default::default()
            }),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Make the next write fail with `error`
    pub fn fail_next(&self, error: StoreError) {
        if let Ok(mut state) = self.state() {
            state.fail_next = Some(error);
        }
    }

    pub fn get(&self, id: PersistedId) -> Option<Ticket> {
        self.state().ok()?.tickets.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state().map(|s| s.tickets.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn state(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("store state poisoned".to_string()))
    }

    fn broadcast(&self, event: ChangeEvent) {
        debug!("Store {:?} {}", event.op, event.record.id);
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}

impl Default for MemoryTicketStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn insert(&self, ticket: &Ticket) -> Result<Ticket, StoreError> {
        let record = {
            let mut state = self.state()?;
            if let Some(err) = state.fail_next.take() {
                return Err(err);
            }
            let id = PersistedId(state.next_id);
            state.next_id += 1;
            let record = Ticket {
                id: TicketId::Persisted(id),
                ..ticket.clone()
            };
            state.tickets.insert(id, record.clone());
            record
        };
        self.broadcast(ChangeEvent::insert(record.clone()));
        Ok(record)
    }

    async fn update(&self, id: PersistedId, patch: &TicketPatch) -> Result<(), StoreError> {
        let record = {
            let mut state = self.state()?;
            if let Some(err) = state.fail_next.take() {
                return Err(err);
            }
            let ticket = state.tickets.get_mut(&id).ok_or(StoreError::NotFound(id))?;
            patch.apply_to(ticket);
            ticket.clone()
        };
        self.broadcast(ChangeEvent::update(record));
        Ok(())
    }

    async fn delete(&self, id: PersistedId) -> Result<(), StoreError> {
        let record = {
            let mut state = self.state()?;
            if let Some(err) = state.fail_next.take() {
                return Err(err);
            }
            state.tickets.remove(&id).ok_or(StoreError::NotFound(id))?
        };
        self.broadcast(ChangeEvent::delete(record));
        Ok(())
    }

    fn subscribe(&self) -> UnboundedReceiver<ChangeEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }
}
