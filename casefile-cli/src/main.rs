/*!
Casefile CLI - play detective cases at the terminal and inspect the save
database behind them.

`play` runs the interactive loop; `players` and `inspect` are utilities
over the same save file the game writes.
*/

mod respond;
mod scenario;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use casefile_core::{Session, SessionStore, StoreConfig, DEFAULT_SAVE_FILE};
use clap::{Parser, Subcommand};
use rand::Rng;
use respond::QuestionPool;
use scenario::{Direction, Scenario};
use tabled::{Table, Tabled};
use tracing::debug;

#[derive(Parser)]
#[command(name = "casefile")]
#[command(about = "Detective mystery game with durable saves")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Save database path
    #[arg(long, global = true, env = "CASEFILE_SAVE_FILE", default_value = DEFAULT_SAVE_FILE)]
    save_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a case interactively
    Play {
        /// Detective name (prompted for when omitted)
        #[arg(short, long)]
        player: Option<String>,

        /// Case file overriding the bundled one
        #[arg(long)]
        case_file: Option<PathBuf>,

        /// Clue file overriding the bundled one
        #[arg(long)]
        clue_file: Option<PathBuf>,

        /// Question file overriding the bundled one
        #[arg(long)]
        question_file: Option<PathBuf>,
    },
    /// List every detective on record
    Players,
    /// Show a detective's record and saved session
    Inspect {
        /// Detective name
        player: String,

        /// Emit the record and session as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Tabled)]
struct PlayerRow {
    #[tabled(rename = "Detective")]
    name: String,
    #[tabled(rename = "Score")]
    score: i64,
    #[tabled(rename = "Case #")]
    case: i64,
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Play {
            player,
            case_file,
            clue_file,
            question_file,
        } => run_play(
            &cli.save_file,
            player,
            case_file.as_deref(),
            clue_file.as_deref(),
            question_file.as_deref(),
        )?,
        Commands::Players => list_players(&cli.save_file)?,
        Commands::Inspect { player, json } => inspect_player(&cli.save_file, &player, json)?,
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run_play(
    save_file: &Path,
    player: Option<String>,
    case_file: Option<&Path>,
    clue_file: Option<&Path>,
    question_file: Option<&Path>,
) -> Result<(), anyhow::Error> {
    let scenario = load_scenario(case_file, clue_file, question_file)?;
    let player = match player {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => read_player_name(&mut io::stdin().lock())?,
    };

    let store = SessionStore::from_config(&StoreConfig::on_disk(save_file))?;
    let starting_room = scenario.starting_room().to_string();
    let mut pool = QuestionPool::new(scenario.questions);
    let mut session = Session::new(store, player, scenario.world, scenario.case, starting_room)?;
    let mut rng = rand::thread_rng();

    println!("{}", session.begin());
    println!("\n(Type 'help' for the command list, 'load' to resume a saved game.)");

    let stdin = io::stdin();
    let mut input = String::new();
    loop {
        print!("\n> ");
        io::stdout().flush()?;
        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            println!();
            break;
        }

        let line = input.trim();
        let (command, argument) = match line.split_once(' ') {
            Some((head, tail)) => (head, tail.trim()),
            None => (line, ""),
        };

        match command.to_ascii_lowercase().as_str() {
            "look" => println!("{}", session.look()),
            "search" => println!("{}", session.search()),
            "north" | "n" => walk(&mut session, Direction::North),
            "south" | "s" => walk(&mut session, Direction::South),
            "return" => return_to_start(&mut session),
            "clues" => println!("{}", session.clue_log()),
            "suspects" => println!("{}", session.questioned_state()),
            "question" => interrogate(&mut session, &mut pool, &mut rng, argument),
            "accuse" => {
                if close_case(&mut session, argument) {
                    break;
                }
            }
            // Store failures never end the game; the live state is intact,
            // so report and keep playing
            "save" => match session.save() {
                Ok(text) => println!("{text}"),
                Err(err) => println!("Save failed: {err}"),
            },
            "load" => match session.load() {
                Ok(text) => println!("{text}"),
                Err(err) => println!("Load failed: {err}"),
            },
            "progress" => show_progress(&session),
            "help" => print_help(),
            "quit" | "exit" => {
                if confirm("Save before quitting? (Y/n): ")? {
                    match session.save() {
                        Ok(text) => println!("{text}"),
                        Err(err) => {
                            println!("Save failed: {err}");
                            println!("Staying in the game so nothing is lost.");
                            continue;
                        }
                    }
                }
                break;
            }
            "" => {}
            _ => println!("Unknown command. Type 'help' for the list."),
        }
    }

    Ok(())
}

fn load_scenario(
    case_file: Option<&Path>,
    clue_file: Option<&Path>,
    question_file: Option<&Path>,
) -> anyhow::Result<Scenario> {
    if case_file.is_none() && clue_file.is_none() && question_file.is_none() {
        return scenario::bundled();
    }

    let case_text = read_or_default(case_file, scenario::DEFAULT_CASE)?;
    let clue_text = read_or_default(clue_file, scenario::DEFAULT_CLUES)?;
    let question_text = read_or_default(question_file, scenario::DEFAULT_QUESTIONS)?;
    scenario::load(&case_text, &clue_text, &question_text)
}

fn read_or_default(path: Option<&Path>, fallback: &str) -> anyhow::Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => Ok(fallback.to_string()),
    }
}

fn walk(session: &mut Session, direction: Direction) {
    match scenario::neighbour(session.current_room(), direction) {
        Some(destination) => println!("{}", session.move_to(destination)),
        None => println!("You can't go that way from here."),
    }
}

/// Walk south deck by deck until back at the start of the ship.
fn return_to_start(session: &mut Session) {
    let start = scenario::DECK_ORDER[0];
    if session.current_room() == start {
        println!("You are already in the {start}.");
        return;
    }

    while session.current_room() != start {
        match scenario::neighbour(session.current_room(), Direction::South) {
            Some(destination) => {
                session.move_to(destination);
            }
            None => break,
        }
    }
    println!("You head back to the {start}.\n\n{}", session.look());
}

fn interrogate<R: Rng>(
    session: &mut Session,
    pool: &mut QuestionPool,
    rng: &mut R,
    name: &str,
) {
    if name.is_empty() {
        println!("Question whom? Try 'suspects' for the list.");
        return;
    }
    let suspect = match session.case().suspect(name) {
        Some(suspect) => suspect.clone(),
        None => {
            println!("There's no suspect by that name.");
            return;
        }
    };

    let offered = pool.offer(rng, &suspect.name, 3);
    if offered.is_empty() {
        println!("You've already asked {} every question you have.", suspect.name);
        return;
    }

    println!("{} ({}) waits for your question.", suspect.name, suspect.description);
    for (index, question) in offered.iter().enumerate() {
        println!("  {}. {}", index + 1, question);
    }

    let choice = match prompt("Ask which question? (number, Enter to stop): ") {
        Ok(choice) => choice.unwrap_or_default(),
        Err(err) => {
            debug!(%err, "failed to read interrogation choice");
            return;
        }
    };
    match choice.parse::<usize>() {
        Ok(number) if (1..=offered.len()).contains(&number) => {
            let question = &offered[number - 1];
            // The suspect counts as questioned once a question is actually asked
            session.question(&suspect.name);
            pool.mark_asked(&suspect.name, question);
            println!("\n{}: \"{}\"", suspect.name, respond::answer(&suspect, question));
        }
        _ => println!("{} watches you walk away.", suspect.name),
    }
}

/// Returns true when the case is closed and the loop should end.
fn close_case(session: &mut Session, accused: &str) -> bool {
    if accused.is_empty() {
        println!("Accuse whom? Try 'suspects' for the list.");
        return false;
    }

    let canonical = session
        .case()
        .suspect(accused)
        .map(|suspect| suspect.name.clone())
        .unwrap_or_else(|| accused.to_string());

    match session.accuse(accused) {
        Ok(true) => {
            println!("Case closed. {canonical} confesses to the sabotage.");
            match session.record() {
                Ok(Some(record)) => {
                    println!("Score: {} | Next case: #{}", record.score, record.current_case)
                }
                Ok(None) => {}
                Err(err) => debug!(%err, "record unavailable after accusation"),
            }
            true
        }
        Ok(false) => {
            println!("{canonical} has an answer for everything. The case stays open.");
            false
        }
        Err(err) => {
            println!("The accusation could not be recorded: {err}");
            false
        }
    }
}

fn show_progress(session: &Session) {
    match session.record() {
        Ok(Some(record)) => println!(
            "Detective {} | Score: {} | Case: #{}",
            record.name, record.score, record.current_case
        ),
        Ok(None) => println!("No progress on record yet. Solve a case or save the game."),
        Err(err) => println!("Could not read your record: {err}"),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  look               Describe the current room");
    println!("  north / south      Walk between decks");
    println!("  return             Head straight back to the Engine Room");
    println!("  search             Search the room for clues");
    println!("  clues              List discovered clues");
    println!("  suspects           Show interrogation progress");
    println!("  question <name>    Question a suspect");
    println!("  accuse <name>      Accuse a suspect of the crime");
    println!("  save / load        Write or restore your session");
    println!("  progress           Show your score and case number");
    println!("  quit               Leave the game");
}

fn list_players(save_file: &Path) -> Result<(), anyhow::Error> {
    let store = SessionStore::from_config(&StoreConfig::on_disk(save_file))?;
    let players = store.players()?;

    if players.is_empty() {
        println!("No detectives on record in {}", save_file.display());
        return Ok(());
    }

    let rows: Vec<PlayerRow> = players
        .into_iter()
        .map(|player| PlayerRow {
            name: player.name,
            score: player.score,
            case: player.current_case,
        })
        .collect();
    println!("{}", Table::new(rows));
    Ok(())
}

fn inspect_player(save_file: &Path, player: &str, json: bool) -> Result<(), anyhow::Error> {
    let store = SessionStore::from_config(&StoreConfig::on_disk(save_file))?;

    let record = match store.player(player)? {
        Some(record) => record,
        None => {
            println!("No detective named '{player}' in {}", save_file.display());
            return Ok(());
        }
    };
    let snapshot = store.load_session(player)?;

    if json {
        let report = serde_json::json!({
            "player": record,
            "session": snapshot,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Detective: {}", record.name);
    println!("  Score: {}", record.score);
    println!("  Case: #{}", record.current_case);
    if let Some(written) = last_written(save_file) {
        println!(
            "  Save file: {} (last written {})",
            save_file.display(),
            written
        );
    }

    match snapshot {
        Some(snapshot) => {
            println!("  Location: {}", snapshot.current_room);
            let questioned = snapshot.questioned.values().filter(|&&done| done).count();
            println!("  Questioned: {}/{}", questioned, snapshot.questioned.len());
            println!("  Clues found: {}", snapshot.discovered_clues.len());
            for clue in &snapshot.discovered_clues {
                println!("    - {}", clue.description());
            }
            if let Some(case) = &snapshot.case {
                println!("  Case in progress: {}", case.title);
            }
        }
        None => println!("  No saved session."),
    }

    Ok(())
}

/// Read one line from `input`, trimmed; `None` once the input is exhausted.
fn read_reply<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn prompt(text: &str) -> io::Result<Option<String>> {
    print!("{text}");
    io::stdout().flush()?;

    let reply = read_reply(&mut io::stdin().lock())?;
    if reply.is_none() {
        println!();
    }
    Ok(reply)
}

/// Ask until a usable name arrives; exhausted input is an error, not a
/// retry.
fn read_player_name<R: BufRead>(input: &mut R) -> anyhow::Result<String> {
    loop {
        print!("Enter your detective's name: ");
        io::stdout().flush()?;
        match read_reply(input)? {
            Some(name) if !name.is_empty() => return Ok(name),
            Some(_) => println!("A detective needs a name."),
            None => bail!("end of input before a detective name was given"),
        }
    }
}

fn confirm(text: &str) -> io::Result<bool> {
    let reply = match prompt(text)? {
        Some(reply) => reply,
        // No answer takes the prompt's default
        None => return Ok(true),
    };
    Ok(reply.is_empty() || reply.to_lowercase().starts_with('y'))
}

fn last_written(path: &Path) -> Option<String> {
    let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok()?;
    let stamp: chrono::DateTime<chrono::Local> = modified.into();
    Some(stamp.format("%Y-%m-%d %H:%M:%S").to_string())
}
