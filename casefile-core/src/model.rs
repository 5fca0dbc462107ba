/*!
Entity model: cases, suspects, clues, rooms, and the session snapshot
assembled by the save store.
*/

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// Case difficulty, stored as text in the case catalog.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

/// A person of interest attached to a case.
///
/// The guilt flag arrives pre-resolved from whatever loaded the case; the
/// core compares against it but never derives it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Suspect {
    /// Display name, also the key used in interrogation tracking
    pub name: String,

    /// Short description shown when reviewing suspects
    pub description: String,

    /// Whether this suspect is the culprit
    pub guilty: bool,
}

impl Suspect {
    /// Create a new suspect
    pub fn new<S1, S2>(name: S1, description: S2, guilty: bool) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            name: name.into(),
            description: description.into(),
            guilty,
        }
    }
}

/// Normalized identity of a clue, derived from its description text.
///
/// Clues have no numeric id anywhere in the save format; the description is
/// the only identity a persisted flag can point back to. Matching through a
/// trimmed, lowercased key keeps a re-attached flag from missing its clue
/// over stray whitespace or casing while the stored text stays verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClueKey(String);

impl ClueKey {
    /// Build the key for a description
    pub fn new(description: &str) -> Self {
        Self(description.trim().to_lowercase())
    }
}

/// A piece of evidence owned by a room.
///
/// The discovery flag is monotonic: [`Clue::discover`] can set it, and no
/// method can clear it for the lifetime of the value.
///
/// # Example
/// ```rust
/// use casefile_core::Clue;
///
/// let mut clue = Clue::new("a broken vent cover");
/// assert!(!clue.is_discovered());
/// clue.discover();
/// clue.discover();
/// assert!(clue.is_discovered());
/// ```
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Clue {
    description: String,
    discovered: bool,
}

impl Clue {
    /// Create an undiscovered clue
    pub fn new<S: Into<String>>(description: S) -> Self {
        Self {
            description: description.into(),
            discovered: false,
        }
    }

    /// Create an already-discovered clue, as read back from a saved session
    pub fn recovered<S: Into<String>>(description: S) -> Self {
        Self {
            description: description.into(),
            discovered: true,
        }
    }

    /// The evidence text
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the player has found this clue
    pub fn is_discovered(&self) -> bool {
        self.discovered
    }

    /// Mark the clue found. Idempotent; there is no way back.
    pub fn discover(&mut self) {
        self.discovered = true;
    }

    /// Normalized identity used for re-attaching persisted flags
    pub fn key(&self) -> ClueKey {
        ClueKey::new(&self.description)
    }
}

/// A location aboard the ship.
///
/// Rooms own their clues and name the rooms they lead to. The exit list is
/// directed: `a` listing `b` says nothing about `b` listing `a`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Room {
    /// Room name, the key used for movement and persistence
    pub name: String,

    /// Flavor text shown on entry
    pub description: String,

    /// Evidence placed in this room
    pub clues: Vec<Clue>,

    /// Names of rooms directly reachable from here
    pub exits: Vec<String>,
}

impl Room {
    /// Create a room with no clues and no exits
    pub fn new<S1, S2>(name: S1, description: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            name: name.into(),
            description: description.into(),
            clues: Vec::new(),
            exits: Vec::new(),
        }
    }

    /// Add a clue to this room
    pub fn with_clue(mut self, clue: Clue) -> Self {
        self.clues.push(clue);
        self
    }

    /// Add a directed exit toward another room
    pub fn with_exit<S: Into<String>>(mut self, room: S) -> Self {
        self.exits.push(room.into());
        self
    }

    /// Whether this room lists `name` as a direct exit
    pub fn leads_to(&self, name: &str) -> bool {
        self.exits.iter().any(|exit| exit == name)
    }
}

/// One mystery: the crime, the suspects, and the clues found so far.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Case {
    /// Case title, also its identity in the case catalog
    pub title: String,

    /// Crime scene narrative shown in the briefing
    pub crime_scene: String,

    /// The people under suspicion, guilt already resolved
    pub suspects: Vec<Suspect>,

    /// Running record of clues the player has turned up. The rooms stay
    /// authoritative for discovery state; this list is the case notebook.
    pub clues: Vec<Clue>,

    /// Difficulty rating for the catalog
    pub difficulty: Difficulty,
}

impl Case {
    /// Create a case with no suspects or clues and medium difficulty
    pub fn new<S1, S2>(title: S1, crime_scene: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            title: title.into(),
            crime_scene: crime_scene.into(),
            suspects: Vec::new(),
            clues: Vec::new(),
            difficulty: Difficulty::default(),
        }
    }

    /// Set the difficulty rating
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Add a suspect
    pub fn with_suspect(mut self, suspect: Suspect) -> Self {
        self.suspects.push(suspect);
        self
    }

    /// Look up a suspect by name, ignoring ASCII case
    pub fn suspect(&self, name: &str) -> Option<&Suspect> {
        self.suspects
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

/// Row image of the `players` table.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub id: i64,
    pub name: String,
    pub score: i64,
    pub current_case: i64,
}

/// Everything the store can say about one player's saved session.
///
/// `discovered_clues` holds only clues persisted as discovered; `case` is
/// `None` when no case blob was saved alongside the session.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Player the snapshot belongs to
    pub player: String,

    /// Room the player was in at save time
    pub current_room: String,

    /// Suspect name to questioned flag, exactly as saved
    pub questioned: HashMap<String, bool>,

    /// Clues saved as discovered
    pub discovered_clues: Vec<Clue>,

    /// The saved case, when a case blob row existed
    pub case: Option<Case>,
}
