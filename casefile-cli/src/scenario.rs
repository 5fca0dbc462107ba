/*!
Scenario loading: plain-text case, clue, and question files turned into the
engine's world and case structures.

The bundled scenario is a three-deck ship laid out Engine Room, Crew
Quarters, Bridge. Walking north moves toward the Bridge and south back
toward the Engine Room; each deck connects only to its neighbours.
*/

use anyhow::{bail, Context};
use casefile_core::{Case, Clue, Room, Suspect, World};

/// Deck layout from south to north.
pub const DECK_ORDER: [&str; 3] = ["Engine Room", "Crew Quarters", "Bridge"];

/// The suspect who actually did it in the bundled case.
pub const CULPRIT: &str = "Samantha";

pub const DEFAULT_CASE: &str = include_str!("../assets/case1.txt");
pub const DEFAULT_CLUES: &str = include_str!("../assets/clues.txt");
pub const DEFAULT_QUESTIONS: &str = include_str!("../assets/questions.txt");

/// A playable bundle: the case, the ship it happened on, and the question
/// pool for interrogations.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub case: Case,
    pub world: World,
    pub questions: Vec<String>,
}

impl Scenario {
    /// Where play starts: the first deck of the ship.
    pub fn starting_room(&self) -> &'static str {
        DECK_ORDER[0]
    }
}

/// Walking direction along the deck order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
}

/// The deck reached walking `direction` from `current`, if any.
pub fn neighbour(current: &str, direction: Direction) -> Option<&'static str> {
    let index = DECK_ORDER.iter().position(|deck| *deck == current)?;
    match direction {
        Direction::North => DECK_ORDER.get(index + 1).copied(),
        Direction::South => index
            .checked_sub(1)
            .and_then(|south| DECK_ORDER.get(south))
            .copied(),
    }
}

/// Parse a case file: title line, crime-scene narrative line, then one
/// `Name: description` line per suspect.
///
/// Guilt is resolved here, once, by matching names against `culprit`; the
/// engine only ever reads the resulting flags.
pub fn parse_case(text: &str, culprit: &str) -> anyhow::Result<Case> {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

    let title = lines.next().context("case file is missing a title line")?;
    let scene = lines
        .next()
        .context("case file is missing a crime scene line")?;

    let mut case = Case::new(title, scene);
    for line in lines {
        match line.split_once(':') {
            Some((name, description)) => {
                let name = name.trim();
                let guilty = name.eq_ignore_ascii_case(culprit);
                case = case.with_suspect(Suspect::new(name, description.trim(), guilty));
            }
            None => tracing::warn!(line, "skipping malformed suspect line"),
        }
    }

    if case.suspects.is_empty() {
        bail!("case file '{}' has no suspects", title);
    }
    if !case.suspects.iter().any(|suspect| suspect.guilty) {
        bail!("no suspect in '{}' matches the culprit '{}'", title, culprit);
    }
    Ok(case)
}

/// Non-empty trimmed lines of a clue or question file.
pub fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build the three-deck ship and seed it with the first four clues: two in
/// the Engine Room, one in the Crew Quarters, one on the Bridge.
pub fn build_world(clues: &[String]) -> World {
    let mut engine = Room::new(
        "Engine Room",
        "Pipes hiss overhead and the deck plating is slick underfoot. \
         The sabotaged engine sits silent.",
    )
    .with_exit("Crew Quarters");
    let mut quarters = Room::new(
        "Crew Quarters",
        "Rows of bunks line the walls. Someone left in a hurry.",
    )
    .with_exit("Engine Room")
    .with_exit("Bridge");
    let mut bridge = Room::new(
        "Bridge",
        "Banks of consoles glow softly at the top of the ship.",
    )
    .with_exit("Crew Quarters");

    for (index, clue) in clues.iter().take(4).enumerate() {
        let room = match index {
            0 | 1 => &mut engine,
            2 => &mut quarters,
            _ => &mut bridge,
        };
        room.clues.push(Clue::new(clue));
    }

    World::new()
        .with_room(engine)
        .with_room(quarters)
        .with_room(bridge)
}

/// Assemble a scenario from raw file contents.
pub fn load(case_text: &str, clue_text: &str, question_text: &str) -> anyhow::Result<Scenario> {
    let case = parse_case(case_text, CULPRIT)?;

    let clues = parse_lines(clue_text);
    if clues.len() < 4 {
        bail!("clue file needs at least 4 clues, got {}", clues.len());
    }
    let world = build_world(&clues);

    let mut questions = parse_lines(question_text);
    if questions.is_empty() {
        tracing::warn!("question file has no questions, using the built-in pool");
        questions = fallback_questions();
    }

    Ok(Scenario {
        case,
        world,
        questions,
    })
}

/// Stand-in questions for an empty question file.
fn fallback_questions() -> Vec<String> {
    [
        "What were you doing at the time of the incident?",
        "Do you have an alibi?",
        "Did you know the victim well?",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// The scenario shipped with the binary.
pub fn bundled() -> anyhow::Result<Scenario> {
    load(DEFAULT_CASE, DEFAULT_CLUES, DEFAULT_QUESTIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_reads_title_scene_and_suspects() {
        let case = parse_case(DEFAULT_CASE, CULPRIT).unwrap();
        assert_eq!(case.title, "The Sabotaged Spaceship");
        assert!(case.crime_scene.contains("Chief Engineer Harris"));
        assert_eq!(case.suspects.len(), 3);
    }

    #[test]
    fn test_guilt_is_resolved_at_parse_time() {
        let case = parse_case(DEFAULT_CASE, CULPRIT).unwrap();
        let guilty: Vec<&str> = case
            .suspects
            .iter()
            .filter(|suspect| suspect.guilty)
            .map(|suspect| suspect.name.as_str())
            .collect();
        assert_eq!(guilty, vec!["Samantha"]);
    }

    #[test]
    fn test_parse_case_skips_malformed_suspect_lines() {
        let text = "Title\nA body in the hold.\nAda: engineer\nnot a suspect line\nBen: pilot";
        let case = parse_case(text, "Ada").unwrap();
        assert_eq!(case.suspects.len(), 2);
    }

    #[test]
    fn test_parse_case_requires_a_culprit_match() {
        let text = "Title\nA body in the hold.\nAda: engineer";
        assert!(parse_case(text, "Samantha").is_err());
    }

    #[test]
    fn test_clue_placement_follows_the_deck_map() {
        let scenario = bundled().unwrap();
        let engine = scenario.world.room("Engine Room").unwrap();
        assert_eq!(engine.clues.len(), 2);
        assert_eq!(engine.clues[0].description(), "oil stains on the floor");
        assert_eq!(scenario.world.room("Crew Quarters").unwrap().clues.len(), 1);
        assert_eq!(scenario.world.room("Bridge").unwrap().clues.len(), 1);
    }

    #[test]
    fn test_decks_only_connect_to_neighbours() {
        let scenario = bundled().unwrap();
        let world = &scenario.world;
        assert!(world.is_reachable("Engine Room", "Crew Quarters"));
        assert!(!world.is_reachable("Engine Room", "Bridge"));
        assert!(world.is_reachable("Crew Quarters", "Bridge"));
        assert!(world.is_reachable("Bridge", "Crew Quarters"));
        assert!(!world.is_reachable("Bridge", "Engine Room"));
    }

    #[test]
    fn test_neighbour_walks_the_deck_order() {
        assert_eq!(
            neighbour("Engine Room", Direction::North),
            Some("Crew Quarters")
        );
        assert_eq!(neighbour("Crew Quarters", Direction::North), Some("Bridge"));
        assert_eq!(neighbour("Bridge", Direction::North), None);
        assert_eq!(
            neighbour("Bridge", Direction::South),
            Some("Crew Quarters")
        );
        assert_eq!(neighbour("Engine Room", Direction::South), None);
        assert_eq!(neighbour("Airlock", Direction::North), None);
    }

    #[test]
    fn test_bundled_scenario_starts_in_the_engine_room() {
        let scenario = bundled().unwrap();
        assert_eq!(scenario.starting_room(), "Engine Room");
        assert!(!scenario.questions.is_empty());
    }

    #[test]
    fn test_empty_question_file_falls_back_to_builtins() {
        let scenario = load(DEFAULT_CASE, DEFAULT_CLUES, "\n   \n").unwrap();
        assert_eq!(scenario.questions.len(), 3);
        assert!(scenario.questions[1].contains("alibi"));
    }
}
