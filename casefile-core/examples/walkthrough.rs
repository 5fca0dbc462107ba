/*!
Scripted walkthrough: a short investigation against an in-memory store,
printing everything the player would see.
*/

use casefile_core::{Case, Clue, Room, Session, SessionStore, Suspect, World};

fn main() {
    let world = World::new()
        .with_room(
            Room::new("Engine Room", "Pipes hiss overhead. The engine sits silent.")
                .with_clue(Clue::new("oil stains on the floor"))
                .with_exit("Crew Quarters"),
        )
        .with_room(
            Room::new("Crew Quarters", "Rows of bunks line the walls.")
                .with_clue(Clue::new("a torn uniform sleeve"))
                .with_exit("Engine Room"),
        );
    let case = Case::new(
        "The Sabotaged Spaceship",
        "Chief Engineer Harris was found dead beside the sabotaged engine.",
    )
    .with_suspect(Suspect::new("Samantha", "Medical officer", true))
    .with_suspect(Suspect::new("Derek", "Navigator", false));

    let store = SessionStore::open_in_memory().unwrap();
    let mut session = Session::new(store, "Ada", world, case, "Engine Room").unwrap();

    println!("{}\n", session.begin());
    println!("{}\n", session.search());
    println!("{}\n", session.move_to("Crew Quarters"));

    session.question("Samantha");
    println!("{}\n", session.questioned_state());

    println!("{}\n", session.save().unwrap());
    println!("{}\n", session.load().unwrap());
    println!("{}\n", session.clue_log());

    let solved = session.accuse("Samantha").unwrap();
    println!("Accusation correct: {solved}");
    if let Some(record) = session.record().unwrap() {
        println!("Score: {} | Next case: #{}", record.score, record.current_case);
    }
}
