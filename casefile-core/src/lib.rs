/*!
# Casefile Core Engine

Engine for a detective mystery game whose sessions survive restarts.

This crate provides the durable heart of the game:

- An entity model for cases, suspects, rooms, and clues with monotonic
  discovery flags
- A room graph with data-driven, possibly one-way connections
- A delimited text codec for the persisted suspect list
- An embedded SQLite store where each save is one atomic transaction
- A session manager that saves live state and reconciles it back on load,
  re-attaching discovery flags to room clues by content

All of it is synchronous and local. Presentation, content files, and
interrogation dialogue live in the front-end crate; this one only ever
talks to its own database file.

## Usage

```rust
use casefile_core::{Case, Clue, Room, Session, SessionStore, Suspect, World};

let world = World::new().with_room(
    Room::new("Engine Room", "The engine room hums.")
        .with_clue(Clue::new("oil stains on the floor")),
);
let case = Case::new("The Sabotaged Spaceship", "The engine deck reeks of spilled coolant.")
    .with_suspect(Suspect::new("Samantha", "Medical officer", true));

let store = SessionStore::open_in_memory()?;
let mut session = Session::new(store, "P", world, case, "Engine Room")?;

session.search();
session.save()?;
session.load()?;
# Ok::<(), casefile_core::CasefileError>(())
```
*/

pub mod codec;
pub mod config;
pub mod error;
pub mod model;
pub mod session;
pub mod store;
pub mod world;

pub use config::{StoreConfig, DEFAULT_SAVE_FILE};
pub use error::{CasefileError, Result};
pub use model::{
    Case, Clue, ClueKey, Difficulty, PlayerRecord, Room, SessionSnapshot, Suspect,
};
pub use session::Session;
pub use store::SessionStore;
pub use world::World;
