/*!
Interrogation flavor: a pool of questions drawn at random and suspect
answers keyed off what was asked. Guilty suspects deflect; innocent ones
give answers that hold up.
*/

use std::collections::{HashMap, HashSet};

use casefile_core::Suspect;
use rand::seq::SliceRandom;
use rand::Rng;

/// The interrogation question pool.
///
/// Asked questions are tracked per suspect, so every suspect can be asked
/// every question, but never the same one twice.
#[derive(Debug, Clone)]
pub struct QuestionPool {
    questions: Vec<String>,
    asked: HashMap<String, HashSet<String>>,
}

impl QuestionPool {
    pub fn new(questions: Vec<String>) -> Self {
        Self {
            questions,
            asked: HashMap::new(),
        }
    }

    /// Up to `count` random questions not yet asked to this suspect.
    pub fn offer<R: Rng + ?Sized>(&self, rng: &mut R, suspect: &str, count: usize) -> Vec<String> {
        let asked = self.asked.get(suspect);
        let available: Vec<&String> = self
            .questions
            .iter()
            .filter(|question| asked.map_or(true, |set| !set.contains(*question)))
            .collect();
        available
            .choose_multiple(rng, count)
            .map(|question| (*question).clone())
            .collect()
    }

    /// Retire a question for one suspect once it has actually been asked.
    pub fn mark_asked(&mut self, suspect: &str, question: &str) {
        self.asked
            .entry(suspect.to_string())
            .or_default()
            .insert(question.to_string());
    }

    /// How many questions this suspect can still be asked.
    #[cfg(test)]
    pub fn remaining_for(&self, suspect: &str) -> usize {
        let asked = self.asked.get(suspect).map_or(0, HashSet::len);
        self.questions.len().saturating_sub(asked)
    }
}

/// What a suspect says to a given question.
pub fn answer(suspect: &Suspect, question: &str) -> String {
    let asked = question.to_lowercase();

    let reply = if asked.contains("alibi") || asked.contains("where were you") {
        if suspect.guilty {
            "I was around. Checking supplies, I think. Nobody saw me, but that proves nothing."
        } else {
            "I was in the mess hall with half the crew. Ask any of them."
        }
    } else if asked.contains("fingerprint") || asked.contains("canister") {
        if suspect.guilty {
            "I handle equipment all over this ship. Fingerprints mean nothing."
        } else {
            "I've never touched an oxygen canister. The engine deck isn't my station."
        }
    } else if asked.contains("conflict") || asked.contains("victim") || asked.contains("argu") {
        if suspect.guilty {
            "We had words once or twice. Everyone argues on a long haul."
        } else {
            "No conflict at all. We got along fine, as far as I knew."
        }
    } else if asked.contains("vent") {
        if suspect.guilty {
            "A vent cover? First I'm hearing of it."
        } else {
            "It was broken last week. I filed a maintenance report about it."
        }
    } else if asked.contains("suspicious") || asked.contains("notice") {
        if suspect.guilty {
            "Nothing. I keep to myself and do my job."
        } else {
            "Someone was moving around the lower decks late that night. I couldn't see who."
        }
    } else if asked.contains("doing") || asked.contains("incident") || asked.contains("night") {
        if suspect.guilty {
            "Sleeping. Or reading. It was a long shift, the details blur."
        } else {
            "I was finishing my shift rotation. The duty log will confirm it."
        }
    } else if suspect.guilty {
        "I've told you everything I know."
    } else {
        "I wish I could help more. Whoever did this put all of us at risk."
    };

    reply.to_string()
}
