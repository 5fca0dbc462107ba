/*!
Durable session store over an embedded SQLite database.

One database file holds everything: player records, the case catalog, and
per-player session state. Existing save files depend on the exact table
and column names, so the schema is fixed. Saving a session is a single
transaction across all of its tables: either every row of a save lands or
none do, and a failure part-way through rolls back even the implicit
creation of the player row, because the transaction is released
scope-bound and only an explicit commit keeps it.

Saved state splits across four tables per player: `game_state` (position),
`suspect_progress` (questioned flags), `clue_progress` (discovered flags,
keyed by clue description, the only identity a clue has), and
`saved_cases` (the case itself, suspects packed by [`crate::codec`]).
*/

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::codec;
use crate::config::StoreConfig;
use crate::error::{CasefileError, Result};
use crate::model::{Case, Clue, PlayerRecord, SessionSnapshot};

/// Idempotent schema for the seven save tables.
///
/// Fixed by existing databases; changing a name here orphans every save
/// file in the field.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS players (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL,
    score INTEGER DEFAULT 0,
    current_case INTEGER DEFAULT 1
);
CREATE TABLE IF NOT EXISTS cases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    difficulty TEXT,
    is_completed BOOLEAN DEFAULT FALSE
);
CREATE TABLE IF NOT EXISTS suspects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    case_id INTEGER,
    name TEXT NOT NULL,
    is_guilty BOOLEAN DEFAULT FALSE,
    FOREIGN KEY (case_id) REFERENCES cases(id)
);
CREATE TABLE IF NOT EXISTS game_state (
    player_id INTEGER PRIMARY KEY,
    current_room TEXT NOT NULL,
    FOREIGN KEY (player_id) REFERENCES players(id)
);
CREATE TABLE IF NOT EXISTS suspect_progress (
    player_id INTEGER,
    suspect_name TEXT,
    questioned BOOLEAN DEFAULT FALSE,
    PRIMARY KEY (player_id, suspect_name),
    FOREIGN KEY (player_id) REFERENCES players(id)
);
CREATE TABLE IF NOT EXISTS clue_progress (
    player_id INTEGER,
    clue_description TEXT,
    discovered BOOLEAN DEFAULT FALSE,
    PRIMARY KEY (player_id, clue_description),
    FOREIGN KEY (player_id) REFERENCES players(id)
);
CREATE TABLE IF NOT EXISTS saved_cases (
    player_id INTEGER PRIMARY KEY,
    case_title TEXT NOT NULL,
    crime_scene TEXT NOT NULL,
    suspects_data TEXT NOT NULL,
    FOREIGN KEY (player_id) REFERENCES players(id)
);
";

/// Embedded save database.
///
/// Opens (and creates) the schema on construction. All operations take the
/// player identity explicitly; the store holds no notion of a current
/// player.
///
/// # Example
/// ```rust
/// use casefile_core::SessionStore;
///
/// let store = SessionStore::open_in_memory()?;
/// let id = store.create_player("Mira")?;
/// assert_eq!(store.player_id("Mira")?, id);
/// # Ok::<(), casefile_core::CasefileError>(())
/// ```
pub struct SessionStore {
    conn: Connection,
    #[cfg(test)]
    fail_after_room_write: bool,
}

impl SessionStore {
    /// Open (or create) a save database at the given path.
    ///
    /// Missing parent directories are created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    CasefileError::storage(format!(
                        "failed to create save directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let store = Self::from_connection(Connection::open(path)?)?;
        tracing::info!(path = %path.display(), "opened save database");
        Ok(store)
    }

    /// Open a database that lives only as long as this store.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Open the store described by a [`StoreConfig`].
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        match &config.path {
            Some(path) => Self::open(path),
            None => Self::open_in_memory(),
        }
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            #[cfg(test)]
            fail_after_room_write: false,
        })
    }

    /// Create a new player record.
    ///
    /// # Errors
    /// [`CasefileError::DuplicateIdentity`] when the name is taken; player
    /// names are unique across the database.
    pub fn create_player(&self, name: &str) -> Result<i64> {
        match self
            .conn
            .execute("INSERT INTO players (name) VALUES (?1)", params![name])
        {
            Ok(_) => {
                let id = self.conn.last_insert_rowid();
                tracing::debug!(player = name, id, "created player");
                Ok(id)
            }
            Err(err) if is_unique_violation(&err) => Err(CasefileError::duplicate(name)),
            Err(err) => Err(err.into()),
        }
    }

    /// Look up a player's id.
    ///
    /// # Errors
    /// [`CasefileError::NotFound`] when no player of that name exists.
    pub fn player_id(&self, name: &str) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT id FROM players WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| CasefileError::not_found(name))
    }

    /// Fetch one player record, `None` when the name is unknown.
    pub fn player(&self, name: &str) -> Result<Option<PlayerRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, name, score, current_case FROM players WHERE name = ?1",
                params![name],
                read_player_row,
            )
            .optional()?;
        Ok(record)
    }

    /// All player records, ordered by name.
    pub fn players(&self) -> Result<Vec<PlayerRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, score, current_case FROM players ORDER BY name")?;
        let rows = stmt.query_map([], read_player_row)?;

        let mut players = Vec::new();
        for row in rows {
            players.push(row?);
        }
        Ok(players)
    }

    /// Set a player's case index and score, creating the player if needed.
    pub fn update_player_progress(&mut self, name: &str, current_case: i64, score: i64) -> Result<()> {
        let tx = self.conn.transaction()?;
        ensure_player(&tx, name)?;
        tx.execute(
            "UPDATE players SET current_case = ?1, score = ?2 WHERE name = ?3",
            params![current_case, score, name],
        )?;
        tx.commit()?;

        tracing::debug!(player = name, current_case, score, "updated player progress");
        Ok(())
    }

    /// Add a case and its suspects to the catalog, keyed by title.
    ///
    /// Already-registered titles are left alone; returns the catalog id
    /// either way.
    pub fn register_case(&mut self, case: &Case) -> Result<i64> {
        let tx = self.conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM cases WHERE title = ?1",
                params![case.title],
                |row| row.get(0),
            )
            .optional()?;

        let id = match existing {
            Some(id) => id,
            None => {
                tx.execute(
                    "INSERT INTO cases (title, difficulty, is_completed) VALUES (?1, ?2, 0)",
                    params![case.title, case.difficulty.to_string()],
                )?;
                let case_id = tx.last_insert_rowid();
                for suspect in &case.suspects {
                    tx.execute(
                        "INSERT INTO suspects (case_id, name, is_guilty) VALUES (?1, ?2, ?3)",
                        params![case_id, suspect.name, suspect.guilty],
                    )?;
                }
                tracing::debug!(title = %case.title, case_id, "registered case in catalog");
                case_id
            }
        };

        tx.commit()?;
        Ok(id)
    }

    /// Record a solved case in one transaction: bump the player's score and
    /// case index and mark the catalog entry completed.
    ///
    /// The player row is created on the spot if this name has never saved.
    pub fn record_case_solved(
        &mut self,
        player: &str,
        case_title: &str,
        score_award: i64,
    ) -> Result<()> {
        let tx = self.conn.transaction()?;

        let player_id = ensure_player(&tx, player)?;
        tx.execute(
            "UPDATE players SET current_case = current_case + 1, score = score + ?1 \
             WHERE id = ?2",
            params![score_award, player_id],
        )?;
        tx.execute(
            "UPDATE cases SET is_completed = 1 WHERE title = ?1",
            params![case_title],
        )?;

        tx.commit()?;
        tracing::info!(player, case = case_title, score_award, "case solved");
        Ok(())
    }

    /// Persist one player's entire session in a single transaction.
    ///
    /// Writes, in order: the player row (created on first save), the
    /// current room into `game_state`, the questioned map into
    /// `suspect_progress`, every discovered clue into `clue_progress`, and
    /// the case (suspects packed by the codec) into `saved_cases`,
    /// replacing any earlier save for this player.
    ///
    /// # Errors
    /// Any database failure aborts the whole save: the transaction is
    /// dropped uncommitted, which rolls back every write above, and the
    /// error is returned to the caller.
    pub fn save_session(
        &mut self,
        player: &str,
        current_room: &str,
        questioned: &HashMap<String, bool>,
        discovered: &[Clue],
        case: &Case,
    ) -> Result<()> {
        let tx = self.conn.transaction()?;

        let player_id = ensure_player(&tx, player)?;

        tx.execute(
            "INSERT OR REPLACE INTO game_state (player_id, current_room) VALUES (?1, ?2)",
            params![player_id, current_room],
        )?;

        #[cfg(test)]
        if self.fail_after_room_write {
            return Err(CasefileError::storage(
                "injected failure after the game_state write",
            ));
        }

        for (suspect, &was_questioned) in questioned {
            tx.execute(
                "INSERT OR REPLACE INTO suspect_progress (player_id, suspect_name, questioned) \
                 VALUES (?1, ?2, ?3)",
                params![player_id, suspect, was_questioned],
            )?;
        }

        for clue in discovered {
            tx.execute(
                "INSERT OR REPLACE INTO clue_progress (player_id, clue_description, discovered) \
                 VALUES (?1, ?2, 1)",
                params![player_id, clue.description()],
            )?;
        }

        tx.execute(
            "DELETE FROM saved_cases WHERE player_id = ?1",
            params![player_id],
        )?;
        tx.execute(
            "INSERT INTO saved_cases (player_id, case_title, crime_scene, suspects_data) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                player_id,
                case.title,
                case.crime_scene,
                codec::encode(&case.suspects)
            ],
        )?;

        tx.commit()?;

        tracing::info!(
            player,
            room = current_room,
            clues = discovered.len(),
            "session saved"
        );
        Ok(())
    }

    /// Read one player's saved session back.
    ///
    /// Returns `Ok(None)` when the player does not exist or has never
    /// completed a save; that is a valid "no saved session" signal, not an
    /// error. The snapshot carries only `discovered = true` clue rows and
    /// the decoded case blob when one was saved.
    pub fn load_session(&self, player: &str) -> Result<Option<SessionSnapshot>> {
        let player_id: i64 = match self
            .conn
            .query_row(
                "SELECT id FROM players WHERE name = ?1",
                params![player],
                |row| row.get(0),
            )
            .optional()?
        {
            Some(id) => id,
            None => {
                tracing::debug!(player, "no player row; nothing to load");
                return Ok(None);
            }
        };

        // A committed save always writes game_state, so a missing row here
        // means the player was created but never saved.
        let current_room: String = match self
            .conn
            .query_row(
                "SELECT current_room FROM game_state WHERE player_id = ?1",
                params![player_id],
                |row| row.get(0),
            )
            .optional()?
        {
            Some(room) => room,
            None => {
                tracing::debug!(player, "player exists but has no saved session");
                return Ok(None);
            }
        };

        let mut questioned = HashMap::new();
        let mut stmt = self
            .conn
            .prepare("SELECT suspect_name, questioned FROM suspect_progress WHERE player_id = ?1")?;
        let rows = stmt.query_map(params![player_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?))
        })?;
        for row in rows {
            let (name, flag) = row?;
            questioned.insert(name, flag);
        }

        let mut discovered_clues = Vec::new();
        let mut stmt = self.conn.prepare(
            "SELECT clue_description FROM clue_progress WHERE player_id = ?1 AND discovered = 1",
        )?;
        let rows = stmt.query_map(params![player_id], |row| row.get::<_, String>(0))?;
        for row in rows {
            discovered_clues.push(Clue::recovered(row?));
        }

        let case = self
            .conn
            .query_row(
                "SELECT case_title, crime_scene, suspects_data FROM saved_cases WHERE player_id = ?1",
                params![player_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?
            .map(|(title, crime_scene, blob)| {
                let mut case = Case::new(title, crime_scene);
                case.suspects = codec::decode(&blob);
                case
            });

        tracing::info!(
            player,
            room = %current_room,
            clues = discovered_clues.len(),
            "session loaded"
        );
        Ok(Some(SessionSnapshot {
            player: player.to_string(),
            current_room,
            questioned,
            discovered_clues,
            case,
        }))
    }

    /// Make every save fail between the `game_state` write and the rest of
    /// the transaction, to prove the rollback covers the whole save.
    #[cfg(test)]
    pub(crate) fn arm_save_fault(&mut self) {
        self.fail_after_room_write = true;
    }
}

/// Get the player's id, inserting the row if this name has never saved.
fn ensure_player(tx: &Transaction<'_>, name: &str) -> Result<i64> {
    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM players WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(id) => Ok(id),
        None => {
            tx.execute("INSERT INTO players (name) VALUES (?1)", params![name])?;
            Ok(tx.last_insert_rowid())
        }
    }
}

fn read_player_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlayerRecord> {
    Ok(PlayerRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        score: row.get(2)?,
        current_case: row.get(3)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Suspect;

    fn store() -> SessionStore {
        SessionStore::open_in_memory().unwrap()
    }

    fn sample_case() -> Case {
        Case::new(
            "The Sabotaged Spaceship",
            "Chief Engineer Harris was found dead beside the sabotaged engine.",
        )
        .with_suspect(Suspect::new("Samantha", "Medical officer", true))
        .with_suspect(Suspect::new("Derek", "Navigator", false))
    }

    fn count(store: &SessionStore, table: &str) -> i64 {
        store
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .unwrap()
    }

    #[test]
    fn test_create_player_rejects_duplicates() {
        let store = store();
        store.create_player("P").unwrap();

        match store.create_player("P") {
            Err(CasefileError::DuplicateIdentity { name }) => assert_eq!(name, "P"),
            other => panic!("expected DuplicateIdentity, got {other:?}"),
        }
    }

    #[test]
    fn test_player_id_lookup() {
        let store = store();
        let id = store.create_player("P").unwrap();

        assert_eq!(store.player_id("P").unwrap(), id);
        match store.player_id("missing") {
            Err(CasefileError::NotFound { name }) => assert_eq!(name, "missing"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_update_player_progress_creates_and_sets() {
        let mut store = store();
        store.update_player_progress("P", 2, 150).unwrap();

        let record = store.player("P").unwrap().unwrap();
        assert_eq!(record.current_case, 2);
        assert_eq!(record.score, 150);

        store.update_player_progress("P", 3, 250).unwrap();
        let record = store.player("P").unwrap().unwrap();
        assert_eq!((record.current_case, record.score), (3, 250));
        assert_eq!(count(&store, "players"), 1);
    }

    #[test]
    fn test_register_case_is_idempotent_by_title() {
        let mut store = store();
        let case = sample_case();

        let first = store.register_case(&case).unwrap();
        let second = store.register_case(&case).unwrap();

        assert_eq!(first, second);
        assert_eq!(count(&store, "cases"), 1);
        assert_eq!(count(&store, "suspects"), 2);
    }

    #[test]
    fn test_load_without_player_is_none() {
        let store = store();
        assert!(store.load_session("nobody").unwrap().is_none());
    }

    #[test]
    fn test_load_without_save_is_none() {
        let store = store();
        store.create_player("P").unwrap();
        // Player row exists, but nothing was ever saved
        assert!(store.load_session("P").unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let mut store = store();
        let case = sample_case();

        let mut questioned = HashMap::new();
        questioned.insert("Samantha".to_string(), true);
        questioned.insert("Derek".to_string(), false);

        let discovered = vec![Clue::recovered("oil stains on the floor")];

        store
            .save_session("P", "Crew Quarters", &questioned, &discovered, &case)
            .unwrap();

        let snapshot = store.load_session("P").unwrap().unwrap();
        assert_eq!(snapshot.player, "P");
        assert_eq!(snapshot.current_room, "Crew Quarters");
        assert_eq!(snapshot.questioned, questioned);
        assert_eq!(snapshot.discovered_clues.len(), 1);
        assert_eq!(
            snapshot.discovered_clues[0].description(),
            "oil stains on the floor"
        );

        let saved_case = snapshot.case.unwrap();
        assert_eq!(saved_case.title, case.title);
        assert_eq!(saved_case.crime_scene, case.crime_scene);
        assert_eq!(saved_case.suspects, case.suspects);
    }

    #[test]
    fn test_resave_replaces_rather_than_duplicates() {
        let mut store = store();
        let case = sample_case();
        let questioned = HashMap::new();

        store
            .save_session("P", "Engine Room", &questioned, &[], &case)
            .unwrap();
        store
            .save_session("P", "Bridge", &questioned, &[], &case)
            .unwrap();

        assert_eq!(count(&store, "players"), 1);
        assert_eq!(count(&store, "game_state"), 1);
        assert_eq!(count(&store, "saved_cases"), 1);
        assert_eq!(
            store.load_session("P").unwrap().unwrap().current_room,
            "Bridge"
        );
    }

    #[test]
    fn test_failed_save_rolls_back_every_table() {
        let mut store = store();
        let case = sample_case();

        let mut questioned = HashMap::new();
        questioned.insert("Samantha".to_string(), true);

        // Committed baseline save
        store
            .save_session(
                "P",
                "Engine Room",
                &questioned,
                &[Clue::recovered("a broken vent cover")],
                &case,
            )
            .unwrap();
        let baseline: Vec<i64> = TABLES.iter().map(|t| count(&store, t)).collect();

        // Second save fails between the room write and the progress writes
        store.arm_save_fault();
        let result = store.save_session(
            "P",
            "Bridge",
            &questioned,
            &[
                Clue::recovered("a broken vent cover"),
                Clue::recovered("oil stains on the floor"),
            ],
            &case,
        );
        assert!(matches!(result, Err(CasefileError::Storage(_))));

        // Nothing changed: not even the room that was written pre-fault
        let after: Vec<i64> = TABLES.iter().map(|t| count(&store, t)).collect();
        assert_eq!(after, baseline);
        let snapshot = store.load_session("P").unwrap().unwrap();
        assert_eq!(snapshot.current_room, "Engine Room");
        assert_eq!(snapshot.discovered_clues.len(), 1);
    }

    #[test]
    fn test_failed_first_save_leaves_no_player_behind() {
        let mut store = store();
        store.arm_save_fault();

        let result = store.save_session("Q", "Engine Room", &HashMap::new(), &[], &sample_case());
        assert!(result.is_err());

        // The implicit player creation rolled back with everything else
        assert!(store.player("Q").unwrap().is_none());
        assert_eq!(count(&store, "players"), 0);
        assert_eq!(count(&store, "game_state"), 0);
    }

    #[test]
    fn test_players_listing_is_name_ordered() {
        let store = store();
        store.create_player("zed").unwrap();
        store.create_player("ana").unwrap();

        let players = store.players().unwrap();
        let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["ana", "zed"]);
    }

    #[test]
    fn test_record_case_solved_updates_player_and_catalog_together() {
        let mut store = store();
        store.register_case(&sample_case()).unwrap();
        store
            .record_case_solved("P", "The Sabotaged Spaceship", 100)
            .unwrap();

        // Implicit player creation starts from the column defaults
        let record = store.player("P").unwrap().unwrap();
        assert_eq!((record.current_case, record.score), (2, 100));

        let completed: bool = store
            .conn
            .query_row(
                "SELECT is_completed FROM cases WHERE title = ?1",
                params!["The Sabotaged Spaceship"],
                |row| row.get(0),
            )
            .unwrap();
        assert!(completed);
    }

    const TABLES: [&str; 7] = [
        "players",
        "cases",
        "suspects",
        "game_state",
        "suspect_progress",
        "clue_progress",
        "saved_cases",
    ];
}
