//! Process-wide table of in-progress and established contexts.
//!
//! Slots are keyed by [`SessionId`], which is never reused, so a
//! connection that closes cannot leave its context where a later
//! connection would find it. A [`SlotLease`] owns its slot and removes it
//! on drop.

use super::EstablishedContext;
use crate::error::{Error, ErrorKind, Result};
use crate::mechanism::{ContextState, Mechanism};
use crate::types::{NegotiatedFlags, SessionId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

pub use crate::config::DEFAULT_MAX_SESSIONS;

enum Slot<M: Mechanism> {
    Negotiating,
    Established(EstablishedContext<M>),
}

/// Bounded map from session to context.
pub struct ContextTable<M: Mechanism> {
    slots: Mutex<HashMap<SessionId, Slot<M>>>,
    capacity: usize,
}

impl<M: Mechanism> ContextTable<M> {
    /// Creates a table admitting at most `capacity` sessions.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Reserves a slot for `id`.
    ///
    /// Fails with [`ErrorKind::SessionCollision`] if `id` already holds a
    /// slot and with [`ErrorKind::SessionLimit`] if the table is full.
    pub fn admit(self: &Arc<Self>, id: SessionId) -> Result<SlotLease<M>> {
        let mut slots = self.slots.lock();
        if slots.contains_key(&id) {
            return Err(Error::new(ErrorKind::SessionCollision).with_context(format!("session {id}")));
        }
        if slots.len() >= self.capacity {
            warn!(session = %id, capacity = self.capacity, "context table full");
            return Err(Error::new(ErrorKind::SessionLimit)
                .with_context(format!("{} sessions in progress", slots.len())));
        }
        slots.insert(id, Slot::Negotiating);
        drop(slots);

        trace!(session = %id, "context slot admitted");
        Ok(SlotLease {
            table: Arc::clone(self),
            id,
        })
    }

    /// Maximum number of slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Returns `true` if no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// State of the context held for `id`, if any.
    #[must_use]
    pub fn state(&self, id: SessionId) -> Option<ContextState> {
        self.slots.lock().get(&id).map(|slot| match slot {
            Slot::Negotiating => ContextState::Establishing,
            Slot::Established(ctx) => ctx.state(),
        })
    }

    /// Flags of the established context held for `id`.
    #[must_use]
    pub fn flags(&self, id: SessionId) -> Option<NegotiatedFlags> {
        match self.slots.lock().get(&id) {
            Some(Slot::Established(ctx)) => Some(ctx.flags()),
            _ => None,
        }
    }

    fn park(&self, id: SessionId, ctx: EstablishedContext<M>) {
        if let Some(slot) = self.slots.lock().get_mut(&id) {
            *slot = Slot::Established(ctx);
        }
    }

    fn remove(&self, id: SessionId) -> Option<Slot<M>> {
        self.slots.lock().remove(&id)
    }
}

impl<M: Mechanism> Default for ContextTable<M> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}

impl<M: Mechanism> std::fmt::Debug for ContextTable<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextTable")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Ownership of one slot in a [`ContextTable`].
pub struct SlotLease<M: Mechanism> {
    table: Arc<ContextTable<M>>,
    id: SessionId,
}

impl<M: Mechanism> SlotLease<M> {
    /// The session this slot belongs to.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Stores the established context in the slot.
    pub fn park(&self, ctx: EstablishedContext<M>) {
        self.table.park(self.id, ctx);
    }
}

impl<M: Mechanism> Drop for SlotLease<M> {
    fn drop(&mut self) {
        // The context, if parked, is released after the table lock is gone.
        let slot = self.table.remove(self.id);
        drop(slot);
        trace!(session = %self.id, "context slot released");
    }
}

impl<M: Mechanism> std::fmt::Debug for SlotLease<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotLease").field("id", &self.id).finish()
    }
}
