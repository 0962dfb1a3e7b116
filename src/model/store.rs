//! Session-scoped shared data store
//!
//! Holds the current dataset and the name of the active tab. Components get
//! it by reference from the `App` and only change it through the setters
//! below. Every mutation bumps `version`, which views use to notice that the
//! data under them changed.
//!
//! The store also hands out request tickets. Responses that write into a
//! slot carry the ticket they were issued with; anything older than the
//! newest ticket for that slot is stale and gets dropped.

use super::dataset::{Dataset, Sheet};
use std::collections::HashMap;

/// Independent pieces of state that asynchronous responses write into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestSlot {
    /// Upload and view both replace the dataset
    Dataset,
    Status,
    Trigger,
}

/// Sequence number identifying one issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    pub slot: RequestSlot,
    pub seq: u64,
}

#[derive(Debug, Default)]
pub struct DataStore {
    dataset: Dataset,
    active_tab: Option<String>,
    version: u64,
    latest: HashMap<RequestSlot, u64>,
    next_seq: u64,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn active_tab(&self) -> Option<&str> {
        self.active_tab.as_deref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Sheet shown by the active tab
    pub fn active_sheet(&self) -> Option<&Sheet> {
        self.active_tab
            .as_deref()
            .and_then(|name| self.dataset.sheet(name))
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_tab
            .as_deref()
            .and_then(|name| self.dataset.position(name))
    }

    /// Replace the whole dataset; the first sheet becomes active
    pub fn replace_dataset(&mut self, dataset: Dataset) {
        self.active_tab = dataset.sheets().first().map(|s| s.name.clone());
        self.dataset = dataset;
        self.version += 1;
    }

    /// Make `name` the active tab; unknown names are ignored
    pub fn set_active_tab(&mut self, name: &str) -> bool {
        if self.dataset.sheet(name).is_none() {
            return false;
        }
        if self.active_tab.as_deref() != Some(name) {
            self.active_tab = Some(name.to_string());
            self.version += 1;
        }
        true
    }

    pub fn next_tab(&mut self) {
        self.step_tab(1);
    }

    pub fn prev_tab(&mut self) {
        self.step_tab(-1);
    }

    fn step_tab(&mut self, delta: isize) {
        let count = self.dataset.len();
        if count == 0 {
            return;
        }
        let current = self.active_index().unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(count as isize) as usize;
        let name = self.dataset.sheets()[next].name.clone();
        self.set_active_tab(&name);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request tickets
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue a new ticket for `slot`, superseding any earlier one
    pub fn issue_ticket(&mut self, slot: RequestSlot) -> RequestTicket {
        self.next_seq += 1;
        self.latest.insert(slot, self.next_seq);
        RequestTicket {
            slot,
            seq: self.next_seq,
        }
    }

    /// Whether `ticket` is still the newest one for its slot
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.get(&ticket.slot) == Some(&ticket.seq)
    }

    /// Replace the dataset only if `ticket` has not been superseded
    pub fn publish(&mut self, ticket: RequestTicket, dataset: Dataset) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.replace_dataset(dataset);
        true
    }
}
