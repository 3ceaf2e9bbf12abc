//! Gender-Aware Pronoun Resolution
//!
//! Maps a free-form gender string onto a pronoun set used during template
//! substitution. Matching is case-insensitive; anything that is not
//! recognizably male or female (non-binary, empty, unknown) resolves to
//! the they/them set.

use serde::{Deserialize, Serialize};

/// A resolved pronoun set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pronouns {
    pub subject: &'static str,
    pub object: &'static str,
    pub possessive: &'static str,
    pub reflexive: &'static str,
}

const MALE: Pronouns = Pronouns {
    subject: "he",
    object: "him",
    possessive: "his",
    reflexive: "himself",
};

const FEMALE: Pronouns = Pronouns {
    subject: "she",
    object: "her",
    possessive: "her",
    reflexive: "herself",
};

const NEUTRAL: Pronouns = Pronouns {
    subject: "they",
    object: "them",
    possessive: "their",
    reflexive: "themselves",
};

/// Resolve the pronoun set for a gender string.
pub fn pronouns_for(gender: &str) -> Pronouns {
    match gender.trim().to_lowercase().as_str() {
        "male" => MALE,
        "female" => FEMALE,
        _ => NEUTRAL,
    }
}

impl Pronouns {
    /// Capitalize the first letter of a pronoun, for sentence-initial use.
    pub fn capitalize(word: &str) -> String {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }
}
