/*!
The room graph: every location in play, its clues, and where it leads.

Adjacency is data. Each room carries its own exit list and nothing here
assumes the lists are symmetric; a one-way passage is representable and
stays one-way. The graph is also the authority on clue discovery state:
saving gathers flags from it, loading projects persisted flags back onto
it.
*/

use std::collections::HashSet;

use crate::model::{Clue, ClueKey, Room};

/// All rooms in play, in a stable order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct World {
    rooms: Vec<Room>,
}

impl World {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a room, builder style
    pub fn with_room(mut self, room: Room) -> Self {
        self.rooms.push(room);
        self
    }

    /// Add a room
    pub fn add_room(&mut self, room: Room) {
        self.rooms.push(room);
    }

    /// Look up a room by name
    pub fn room(&self, name: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.name == name)
    }

    /// Look up a room for mutation
    pub fn room_mut(&mut self, name: &str) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|room| room.name == name)
    }

    /// All rooms in insertion order
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Whether a room of this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.room(name).is_some()
    }

    /// Whether `to` can be entered directly from `from`.
    ///
    /// True only when both rooms exist and `from` lists `to` as an exit.
    /// The check is directed: `is_reachable(a, b)` says nothing about
    /// `is_reachable(b, a)`.
    pub fn is_reachable(&self, from: &str, to: &str) -> bool {
        self.contains(to) && self.room(from).map_or(false, |room| room.leads_to(to))
    }

    /// Copies of every discovered clue across all rooms, in room order.
    ///
    /// This is the save-time gather: a read-only scan that leaves the rooms
    /// untouched and owning their clues.
    pub fn discovered_clues(&self) -> Vec<Clue> {
        self.rooms
            .iter()
            .flat_map(|room| room.clues.iter())
            .filter(|clue| clue.is_discovered())
            .cloned()
            .collect()
    }

    /// Re-attach persisted discovery flags to the live clues.
    ///
    /// Every room is scanned regardless of reachability, and every live
    /// clue whose normalized description matches a snapshot clue is marked
    /// discovered. Returns how many live clues matched.
    ///
    /// This is a projection, not a merge: clues the snapshot does not
    /// mention keep whatever flag they already have, snapshot entries that
    /// match nothing are logged and skipped, and running it twice gives the
    /// same world and the same count.
    pub fn restore_discoveries(&mut self, snapshot: &[Clue]) -> usize {
        let keys: HashSet<ClueKey> = snapshot.iter().map(Clue::key).collect();
        let mut matched_keys: HashSet<ClueKey> = HashSet::new();
        let mut matched = 0usize;

        for room in &mut self.rooms {
            for clue in &mut room.clues {
                let key = clue.key();
                if keys.contains(&key) {
                    clue.discover();
                    matched_keys.insert(key);
                    matched += 1;
                }
            }
        }

        for key in keys.difference(&matched_keys) {
            tracing::debug!(?key, "saved clue matches nothing in the live world");
        }
        matched
    }
}
