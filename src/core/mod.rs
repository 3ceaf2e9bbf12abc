pub mod compose;
pub mod generation;
pub mod pronouns;
pub mod random;
pub mod template;
