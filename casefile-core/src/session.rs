/*!
The session: one player moving through one case, with durable saves.

This module orchestrates the live state (world, case, questioned map,
position) against the durable store. Saving gathers a read-only snapshot of
the world and hands it to the store as a single transaction; loading
replaces position and interrogation state wholesale and then projects the
persisted discovery flags back onto the live rooms by clue content.

Every session carries its player identity explicitly. Nothing here or in
the store is global, so several sessions over separate stores can coexist
in one process.
*/

use std::collections::HashMap;

use crate::error::Result;
use crate::model::{Case, PlayerRecord};
use crate::store::SessionStore;
use crate::world::World;

/// Points awarded for closing a case with a correct accusation.
const CASE_SOLVED_SCORE: i64 = 100;

/// One player's running game, save and load included.
///
/// # Example
/// ```rust
/// use casefile_core::{Case, Clue, Room, Session, SessionStore, Suspect, World};
///
/// let world = World::new().with_room(
///     Room::new("Engine Room", "The engine room hums.")
///         .with_clue(Clue::new("oil stains on the floor")),
/// );
/// let case = Case::new("The Sabotaged Spaceship", "The engine deck reeks of spilled coolant.")
///     .with_suspect(Suspect::new("Samantha", "Medical officer", true));
///
/// let store = SessionStore::open_in_memory()?;
/// let mut session = Session::new(store, "P", world, case, "Engine Room")?;
///
/// session.search();
/// session.save()?;
/// assert!(session.accuse("Samantha")?);
/// # Ok::<(), casefile_core::CasefileError>(())
/// ```
pub struct Session {
    player: String,
    store: SessionStore,
    world: World,
    case: Case,
    questioned: HashMap<String, bool>,
    current_room: String,
}

impl Session {
    /// Start a session for `player` on the given world and case.
    ///
    /// The case is registered in the store's catalog and every suspect
    /// starts not-questioned. The session begins in `starting_room`.
    pub fn new<S1, S2>(
        mut store: SessionStore,
        player: S1,
        world: World,
        case: Case,
        starting_room: S2,
    ) -> Result<Self>
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        store.register_case(&case)?;

        let questioned: HashMap<String, bool> = case
            .suspects
            .iter()
            .map(|suspect| (suspect.name.clone(), false))
            .collect();

        let session = Self {
            player: player.into(),
            store,
            world,
            case,
            questioned,
            current_room: starting_room.into(),
        };
        tracing::info!(
            player = %session.player,
            case = %session.case.title,
            "session started"
        );
        Ok(session)
    }

    /// The player this session belongs to
    pub fn player(&self) -> &str {
        &self.player
    }

    /// Name of the room the player is in
    pub fn current_room(&self) -> &str {
        &self.current_room
    }

    /// The active case
    pub fn case(&self) -> &Case {
        &self.case
    }

    /// The live world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Raw questioned map, suspect name to flag
    pub fn questioned(&self) -> &HashMap<String, bool> {
        &self.questioned
    }

    /// This player's durable record, if any progress has been stored.
    pub fn record(&self) -> Result<Option<PlayerRecord>> {
        self.store.player(&self.player)
    }

    /// The case briefing shown when play starts: title, difficulty, the
    /// crime scene narrative, the suspect roster, and the opening room.
    pub fn begin(&self) -> String {
        let mut text = format!(
            "=== {} ===\nDifficulty: {}\n\n{}\n",
            self.case.title, self.case.difficulty, self.case.crime_scene
        );
        if !self.case.suspects.is_empty() {
            text.push_str("\nSuspects:\n");
            for suspect in &self.case.suspects {
                text.push_str(&format!("  - {}: {}\n", suspect.name, suspect.description));
            }
        }
        text.push('\n');
        text.push_str(&self.look());
        text
    }

    /// Describe the current room and its exits.
    pub fn look(&self) -> String {
        match self.world.room(&self.current_room) {
            Some(room) => {
                let mut text = format!("You are in the {}.\n{}", room.name, room.description);
                if !room.exits.is_empty() {
                    text.push_str(&format!("\nExits: {}", room.exits.join(", ")));
                }
                text
            }
            None => format!("You are in the {}.", self.current_room),
        }
    }

    /// Try to walk to another room.
    ///
    /// Moves only along the current room's exit list; anything else gets a
    /// refusal and the position stays where it was.
    pub fn move_to(&mut self, destination: &str) -> String {
        if !self.world.is_reachable(&self.current_room, destination) {
            return "You can't go that way from here.".to_string();
        }

        self.current_room = destination.to_string();
        tracing::debug!(player = %self.player, room = destination, "moved");

        let description = self
            .world
            .room(destination)
            .map(|room| room.description.as_str())
            .unwrap_or_default();
        format!("You enter the {}.\n\n{}", destination, description)
    }

    /// Search the current room for evidence.
    ///
    /// Every undiscovered clue here flips to discovered (and stays that
    /// way) and lands in the case notebook.
    pub fn search(&mut self) -> String {
        let mut found = Vec::new();
        if let Some(room) = self.world.room_mut(&self.current_room) {
            for clue in &mut room.clues {
                if !clue.is_discovered() {
                    clue.discover();
                    found.push(clue.clone());
                }
            }
        }

        if found.is_empty() {
            return format!(
                "You search the {} but find nothing new.",
                self.current_room
            );
        }

        let mut text = format!("You search the {} and find:", self.current_room);
        for clue in &found {
            text.push_str(&format!("\n  - {}", clue.description()));
            self.case.clues.push(clue.clone());
        }
        tracing::debug!(room = %self.current_room, found = found.len(), "room searched");
        text
    }

    /// Record that a suspect has been questioned.
    ///
    /// Returns `false` for names that are not part of the case. Once
    /// questioned, a suspect stays questioned.
    pub fn question(&mut self, suspect: &str) -> bool {
        match self.case.suspect(suspect) {
            Some(found) => {
                let name = found.name.clone();
                self.questioned.insert(name, true);
                true
            }
            None => false,
        }
    }

    /// Interrogation progress, one line per suspect.
    pub fn questioned_state(&self) -> String {
        if self.case.suspects.is_empty() {
            return "There are no suspects in this case.".to_string();
        }

        let mut lines = Vec::new();
        for suspect in &self.case.suspects {
            let questioned = self.questioned.get(&suspect.name).copied().unwrap_or(false);
            lines.push(format!(
                "{}: {}",
                suspect.name,
                if questioned {
                    "questioned"
                } else {
                    "not yet questioned"
                }
            ));
        }
        lines.join("\n")
    }

    /// Every clue discovered so far, gathered from the rooms.
    pub fn clue_log(&self) -> String {
        let discovered = self.world.discovered_clues();
        if discovered.is_empty() {
            return "You haven't discovered any clues yet.".to_string();
        }

        let mut text = String::from("Discovered clues:");
        for clue in &discovered {
            text.push_str(&format!("\n  - {}", clue.description()));
        }
        text
    }

    /// Save the session.
    ///
    /// Gathers discovered clues from every room (the rooms keep their
    /// clues; the store gets copies) and writes position, interrogation
    /// state, discoveries, and the case in one transaction.
    ///
    /// # Errors
    /// A store failure propagates unchanged; the live session state is
    /// untouched either way.
    pub fn save(&mut self) -> Result<String> {
        let discovered = self.world.discovered_clues();
        self.store.save_session(
            &self.player,
            &self.current_room,
            &self.questioned,
            &discovered,
            &self.case,
        )?;
        Ok(format!("Game saved. ({})", self.current_room))
    }

    /// Load this player's saved session, if one exists.
    ///
    /// With no saved session the live state stays untouched and the
    /// returned text says so; that outcome is not an error. Otherwise the
    /// position and questioned map are replaced by the snapshot, the case
    /// is replaced when the snapshot carries one, and the saved discovery
    /// flags are re-attached to the live rooms by clue content. Loading
    /// twice in a row is a no-op the second time.
    pub fn load(&mut self) -> Result<String> {
        let snapshot = match self.store.load_session(&self.player)? {
            Some(snapshot) => snapshot,
            None => return Ok("No saved game found.".to_string()),
        };

        self.current_room = snapshot.current_room;
        self.questioned = snapshot.questioned;
        if let Some(case) = snapshot.case {
            self.case = case;
        }
        let matched = self.world.restore_discoveries(&snapshot.discovered_clues);
        tracing::debug!(
            player = %self.player,
            matched,
            saved = snapshot.discovered_clues.len(),
            "discoveries re-attached"
        );

        let description = self
            .world
            .room(&self.current_room)
            .map(|room| room.description.as_str())
            .unwrap_or_default();
        Ok(format!(
            "Game loaded.\n\nLocation: {}\n{}",
            self.current_room, description
        ))
    }

    /// Accuse a suspect of the crime.
    ///
    /// Compares against the case's pre-resolved guilt flags. A correct
    /// accusation closes the case: the player's score and case index move
    /// forward and the catalog entry is marked completed. A wrong one
    /// changes nothing.
    pub fn accuse(&mut self, accused: &str) -> Result<bool> {
        let guilty = self
            .case
            .suspect(accused)
            .map(|suspect| suspect.guilty)
            .unwrap_or(false);
        if !guilty {
            tracing::info!(player = %self.player, accused, "accusation missed");
            return Ok(false);
        }

        self.store
            .record_case_solved(&self.player, &self.case.title, CASE_SOLVED_SCORE)?;

        tracing::info!(player = %self.player, accused, "case solved");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Clue, Room, Suspect};

    fn ship() -> World {
        World::new()
            .with_room(
                Room::new("Engine Room", "The engine room hums.")
                    .with_clue(Clue::new("oil stains on the floor"))
                    .with_clue(Clue::new("a broken vent cover"))
                    .with_exit("Crew Quarters"),
            )
            .with_room(
                Room::new("Crew Quarters", "Rows of beds.")
                    .with_clue(Clue::new("a torn uniform sleeve"))
                    .with_exit("Engine Room")
                    .with_exit("Bridge"),
            )
            .with_room(
                Room::new("Bridge", "The ship's control center.")
                    .with_clue(Clue::new("a deleted log entry"))
                    .with_exit("Crew Quarters"),
            )
    }

    fn case() -> Case {
        Case::new(
            "The Sabotaged Spaceship",
            "Chief Engineer Harris was found dead beside the sabotaged engine.",
        )
        .with_suspect(Suspect::new("Samantha", "Medical officer", true))
        .with_suspect(Suspect::new("Derek", "Navigator", false))
    }

    fn session() -> Session {
        let store = SessionStore::open_in_memory().unwrap();
        Session::new(store, "P", ship(), case(), "Engine Room").unwrap()
    }

    #[test]
    fn test_move_follows_exits_only() {
        let mut session = session();

        let refused = session.move_to("Bridge");
        assert_eq!(refused, "You can't go that way from here.");
        assert_eq!(session.current_room(), "Engine Room");

        session.move_to("Crew Quarters");
        assert_eq!(session.current_room(), "Crew Quarters");
        session.move_to("Bridge");
        assert_eq!(session.current_room(), "Bridge");
    }

    #[test]
    fn test_search_discovers_once() {
        let mut session = session();

        let first = session.search();
        assert!(first.contains("oil stains on the floor"));
        assert!(first.contains("a broken vent cover"));

        let second = session.search();
        assert!(second.contains("nothing new"));
        // The notebook holds each find exactly once
        assert_eq!(session.case().clues.len(), 2);
    }

    #[test]
    fn test_question_marks_known_suspects_only() {
        let mut session = session();

        assert!(session.question("samantha"));
        assert!(!session.question("Harris"));
        assert_eq!(session.questioned()["Samantha"], true);
        assert_eq!(session.questioned()["Derek"], false);
    }

    #[test]
    fn test_load_without_save_changes_nothing() {
        let mut session = session();
        session.move_to("Crew Quarters");

        let text = session.load().unwrap();
        assert_eq!(text, "No saved game found.");
        assert_eq!(session.current_room(), "Crew Quarters");
    }

    #[test]
    fn test_load_replaces_position_and_interrogation_state() {
        let mut session = session();
        session.question("Samantha");
        session.move_to("Crew Quarters");
        session.save().unwrap();

        // Diverge from the saved point
        session.question("Derek");
        session.move_to("Bridge");

        session.load().unwrap();
        assert_eq!(session.current_room(), "Crew Quarters");
        assert_eq!(session.questioned()["Samantha"], true);
        // Replaced wholesale: Derek's post-save interrogation is gone
        assert_eq!(session.questioned()["Derek"], false);
    }

    #[test]
    fn test_load_reattaches_discoveries_by_content() {
        let mut session = session();
        session.search();
        session.save().unwrap();

        session.load().unwrap();
        let engine = session.world().room("Engine Room").unwrap();
        assert!(engine.clues.iter().all(Clue::is_discovered));
        let bridge = session.world().room("Bridge").unwrap();
        assert!(bridge.clues.iter().all(|clue| !clue.is_discovered()));
    }

    #[test]
    fn test_double_load_is_idempotent() {
        let mut session = session();
        session.question("Samantha");
        session.search();
        session.save().unwrap();

        session.load().unwrap();
        let room_after_one = session.current_room().to_string();
        let questioned_after_one = session.questioned().clone();
        let discovered_after_one = session.world().discovered_clues();

        session.load().unwrap();
        assert_eq!(session.current_room(), room_after_one);
        assert_eq!(session.questioned(), &questioned_after_one);
        assert_eq!(session.world().discovered_clues(), discovered_after_one);
    }

    #[test]
    fn test_discovery_survives_load_even_when_unsaved() {
        let mut session = session();
        session.save().unwrap();

        // Discovered after the save, so the snapshot doesn't mention it
        session.search();
        session.load().unwrap();

        let engine = session.world().room("Engine Room").unwrap();
        assert!(engine.clues.iter().all(Clue::is_discovered));
    }

    #[test]
    fn test_wrong_accusation_changes_nothing() {
        let mut session = session();
        assert!(!session.accuse("Derek").unwrap());
        assert!(!session.accuse("nobody").unwrap());
        assert!(session.store.player("P").unwrap().is_none());
    }

    #[test]
    fn test_correct_accusation_awards_progress() {
        let mut session = session();
        assert!(session.record().unwrap().is_none());
        assert!(session.accuse("Samantha").unwrap());

        let record = session.record().unwrap().unwrap();
        assert_eq!(record.score, 100);
        assert_eq!(record.current_case, 2);
    }

    #[test]
    fn test_briefing_lays_out_the_case() {
        let session = session();
        let briefing = session.begin();
        assert!(briefing.contains("The Sabotaged Spaceship"));
        assert!(briefing.contains("Difficulty: Medium"));
        assert!(briefing.contains("Harris was found dead"));
        assert!(briefing.contains("Samantha: Medical officer"));
        assert!(briefing.contains("You are in the Engine Room."));
    }
}
