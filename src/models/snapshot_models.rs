use serde::{Deserialize, Serialize};

use crate::models::poll_models::Poll;

/// The complete persisted state. Field names follow the on-disk JSON layout.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub polls: Vec<Poll>,
    pub whitelist: Vec<String>,
    pub pending_requests: Vec<String>,
    pub poll_id_counter: u64,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            polls: Vec::new(),
            whitelist: Vec::new(),
            pending_requests: Vec::new(),
            poll_id_counter: 1,
        }
    }
}

impl Snapshot {
    pub fn with_whitelist(whitelist: Vec<String>) -> Self {
        let mut snapshot = Self {
            whitelist,
            ..Self::default()
        };
        snapshot.repair();
        snapshot
    }

    /// Holds no records and has never handed out a poll id.
    pub fn is_empty(&self) -> bool {
        self.polls.is_empty()
            && self.whitelist.is_empty()
            && self.pending_requests.is_empty()
            && self.poll_id_counter <= 1
    }

    pub fn poll(&self, id: u64) -> Option<&Poll> {
        self.polls.iter().find(|p| p.id == id)
    }

    pub fn poll_mut(&mut self, id: u64) -> Option<&mut Poll> {
        self.polls.iter_mut().find(|p| p.id == id)
    }

    pub fn is_whitelisted(&self, user: &str) -> bool {
        self.whitelist.iter().any(|u| u == user)
    }

    pub fn is_pending(&self, user: &str) -> bool {
        self.pending_requests.iter().any(|u| u == user)
    }

    pub fn next_poll_id(&self) -> u64 {
        self.polls.iter().map(|p| p.id).max().map_or(1, |max| max + 1)
    }

    /// Merges `other` in without overwriting: polls with a known id and
    /// users already present are skipped.
    pub fn absorb(&mut self, other: &Snapshot) {
        for poll in &other.polls {
            if self.poll(poll.id).is_none() {
                self.polls.push(poll.clone());
            }
        }
        for user in &other.whitelist {
            if !self.is_whitelisted(user) {
                self.whitelist.push(user.clone());
            }
        }
        for user in &other.pending_requests {
            if !self.is_pending(user) {
                self.pending_requests.push(user.clone());
            }
        }
        self.polls.sort_by_key(|p| p.id);
        self.poll_id_counter = self.poll_id_counter.max(other.poll_id_counter);
        self.repair();
    }

    /// Restores the snapshot invariants after loading data that may have
    /// been written by an older or inconsistent writer. Returns true when
    /// anything changed.
    pub fn repair(&mut self) -> bool {
        let mut changed = false;

        for poll in &mut self.polls {
            changed |= poll.recount();
        }

        changed |= dedup_in_order(&mut self.whitelist);
        changed |= dedup_in_order(&mut self.pending_requests);

        let before = self.pending_requests.len();
        let whitelist = &self.whitelist;
        self.pending_requests.retain(|u| !whitelist.contains(u));
        changed |= before != self.pending_requests.len();

        let next = self.next_poll_id();
        if self.poll_id_counter < next {
            self.poll_id_counter = next;
            changed = true;
        }

        changed
    }
}

fn dedup_in_order(users: &mut Vec<String>) -> bool {
    let before = users.len();
    let mut seen = Vec::with_capacity(before);
    users.retain(|u| {
        if seen.contains(u) {
            false
        } else {
            seen.push(u.clone());
            true
        }
    });
    before != users.len()
}
