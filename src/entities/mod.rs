// Entity Models
//
// The catalog is static for a session: cats are loaded once, normalized,
// and never mutated afterwards.

pub mod cat;

pub use cat::{AnswerRef, Cat, CatRegistry, Form};
