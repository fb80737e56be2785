//! Directed connection storage.

use tower_siege_core::{ConnectionSnapshot, TowerId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Connection {
    pub(crate) from: TowerId,
    pub(crate) to: TowerId,
    pub(crate) sequence: u64,
}

impl Connection {
    pub(crate) fn snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            from: self.from,
            to: self.to,
        }
    }
}

/// Connections kept in creation order. Identical directed edges may repeat.
#[derive(Debug, Default)]
pub(crate) struct ConnectionSet {
    entries: Vec<Connection>,
    next_sequence: u64,
}

impl ConnectionSet {
    pub(crate) fn insert(&mut self, from: TowerId, to: TowerId) {
        self.entries.push(Connection {
            from,
            to,
            sequence: self.next_sequence,
        });
        self.next_sequence = self.next_sequence.wrapping_add(1);
    }

    /// Removes the oldest edge matching `from -> to`.
    pub(crate) fn remove_oldest(&mut self, from: TowerId, to: TowerId) -> bool {
        let Some(index) = self
            .entries
            .iter()
            .position(|connection| connection.from == from && connection.to == to)
        else {
            return false;
        };
        let _ = self.entries.remove(index);
        true
    }

    /// Removes the most recently created edge leaving `from`.
    pub(crate) fn remove_newest_from(&mut self, from: TowerId) -> Option<Connection> {
        let index = self
            .entries
            .iter()
            .rposition(|connection| connection.from == from)?;
        Some(self.entries.remove(index))
    }

    pub(crate) fn remove_sequence(&mut self, sequence: u64) -> Option<Connection> {
        let index = self
            .entries
            .iter()
            .position(|connection| connection.sequence == sequence)?;
        Some(self.entries.remove(index))
    }

    /// Distinct destinations reachable from `from`, ordered by tower id.
    pub(crate) fn destinations_from(&self, from: TowerId) -> Vec<TowerId> {
        let mut destinations: Vec<TowerId> = self
            .entries
            .iter()
            .filter(|connection| connection.from == from && connection.to != from)
            .map(|connection| connection.to)
            .collect();
        destinations.sort_unstable();
        destinations.dedup();
        destinations
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.entries.iter()
    }
}
