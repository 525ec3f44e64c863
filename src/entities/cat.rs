// 🐱 Cat Entity - the thing being guessed
//
// "Display name is the IDENTITY a player types, unit id + form is the
//  IDENTITY an answer table points at"
//
// Several forms of one unit share a unit id, so the unit id alone is not a
// key. Names are unique within a catalog and key guesses and persistence.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// FORM
// ============================================================================

/// Fixed, ordered set of unit forms. The order exists but the comparison
/// engine deliberately ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Form {
    Base,
    Evolved,
    True,
    Ultra,
}

impl Form {
    pub const ALL: [Form; 4] = [Form::Base, Form::Evolved, Form::True, Form::Ultra];

    pub fn as_str(&self) -> &'static str {
        match self {
            Form::Base => "Base",
            Form::Evolved => "Evolved",
            Form::True => "True",
            Form::Ultra => "Ultra",
        }
    }

    /// Parse a form label, accepting the spreadsheet spellings
    ///
    /// Example: "Normal Form" → Base, "Third Form" → True
    pub fn parse(label: &str) -> Option<Form> {
        let normalized = label.trim().to_lowercase();
        let normalized = normalized.strip_suffix(" form").unwrap_or(&normalized);

        match normalized.trim() {
            "base" | "normal" | "first" | "1" => Some(Form::Base),
            "evolved" | "second" | "2" => Some(Form::Evolved),
            "true" | "third" | "3" => Some(Form::True),
            "ultra" | "fourth" | "4" => Some(Form::Ultra),
            _ => None,
        }
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CAT ENTITY
// ============================================================================

/// One catalog record, immutable once normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cat {
    /// Unit identifier, shared by every form of a unit (0 = placeholder)
    pub unit_id: u32,

    /// Unique display name, the guess key
    pub name: String,

    /// Image reference
    pub img: String,

    pub rarity: String,

    /// Canonical form label ("Base", "Evolved", "True", "Ultra") or raw text
    /// when the source held something unrecognized
    pub form: String,

    /// Comma/space separated tags
    pub role: String,

    /// Space separated tokens, empty when the unit has none
    pub traits: String,

    pub attack_type: String,

    pub abilities: String,

    /// Currency formatted, e.g. "1500¢"
    pub cost: String,

    /// "V<major>.<minor>.<patch>"
    pub version: String,

    /// Where the unit is obtained; revealed as the hint
    pub source: String,
}

impl Cat {
    /// Sentinel cat returned when every selection path fails
    pub fn placeholder() -> Self {
        Cat {
            unit_id: 0,
            name: "Cat".to_string(),
            img: "public/images/cats/Cat.webp".to_string(),
            rarity: "Normal".to_string(),
            form: Form::Base.to_string(),
            role: String::new(),
            traits: String::new(),
            attack_type: String::new(),
            abilities: String::new(),
            cost: "0¢".to_string(),
            version: "V1.0".to_string(),
            source: "Unknown".to_string(),
        }
    }

    /// Single entry of the fail-closed catalog
    pub fn starter() -> Self {
        Cat {
            unit_id: 1,
            role: "Meatshield".to_string(),
            attack_type: "Single Attack".to_string(),
            cost: "75¢".to_string(),
            source: "Starting Unit".to_string(),
            ..Cat::placeholder()
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.unit_id == 0
    }

    /// Parsed form, None when the label is outside the fixed set
    pub fn form_kind(&self) -> Option<Form> {
        Form::parse(&self.form)
    }

    /// Does this record answer to the given reference?
    pub fn matches_ref(&self, unit_id: u32, form: Option<Form>) -> bool {
        self.unit_id == unit_id && form.map_or(true, |f| self.form_kind() == Some(f))
    }
}

// ============================================================================
// ANSWER REFERENCE
// ============================================================================

/// Abstract pointer into the catalog used by the indexed answer table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRef {
    pub unit_id: u32,

    #[serde(default)]
    pub form: Option<Form>,

    /// Fallback lookup key when unit id + form do not resolve
    #[serde(default)]
    pub name: Option<String>,
}

impl AnswerRef {
    pub fn new(unit_id: u32, form: Option<Form>) -> Self {
        AnswerRef {
            unit_id,
            form,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

// ============================================================================
// CAT REGISTRY
// ============================================================================

/// The catalog: ordered, name-unique, loaded once per session
#[derive(Debug, Clone)]
pub struct CatRegistry {
    cats: Vec<Cat>,
    by_name: HashMap<String, usize>,
}

impl CatRegistry {
    /// Build a registry, dropping records whose name is already taken
    pub fn new(cats: Vec<Cat>) -> Self {
        let mut registry = CatRegistry {
            cats: Vec::with_capacity(cats.len()),
            by_name: HashMap::new(),
        };

        for cat in cats {
            registry.register(cat);
        }

        registry
    }

    /// Catalog used when loading fails entirely
    pub fn fallback() -> Self {
        CatRegistry::new(vec![Cat::starter()])
    }

    /// Add a cat; returns false (and keeps the first) on a duplicate name
    pub fn register(&mut self, cat: Cat) -> bool {
        if self.by_name.contains_key(&cat.name) {
            tracing::warn!("Duplicate cat name in catalog, keeping first: {}", cat.name);
            return false;
        }
        self.by_name.insert(cat.name.clone(), self.cats.len());
        self.cats.push(cat);
        true
    }

    pub fn all(&self) -> &[Cat] {
        &self.cats
    }

    pub fn len(&self) -> usize {
        self.cats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cats.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Cat> {
        self.cats.get(index)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Cat> {
        self.by_name.get(name).and_then(|&i| self.cats.get(i))
    }

    /// Resolve an answer reference: unit id + form first, then name
    pub fn resolve(&self, answer: &AnswerRef) -> Option<&Cat> {
        self.cats
            .iter()
            .find(|cat| cat.matches_ref(answer.unit_id, answer.form))
            .or_else(|| answer.name.as_deref().and_then(|n| self.find_by_name(n)))
    }

    /// Uniform random pick
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Cat> {
        self.cats.choose(rng)
    }

    /// Search by case-insensitive name substring, appending the other forms
    /// of every matched unit. Names in `exclude` are skipped.
    ///
    /// Example: "crazed" → ["Crazed Cat", "Crazed Titan", ...] plus "Manic
    /// Eraser Cat" when it shares a unit id with a match
    pub fn search(&self, query: &str, exclude: &[String]) -> Vec<&Cat> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let is_excluded = |cat: &Cat| exclude.iter().any(|n| n == &cat.name);

        let mut results: Vec<&Cat> = self
            .cats
            .iter()
            .filter(|cat| cat.name.to_lowercase().contains(&needle))
            .filter(|cat| !is_excluded(cat))
            .collect();

        let matched_units: Vec<u32> = results
            .iter()
            .map(|cat| cat.unit_id)
            .filter(|&id| id != 0)
            .collect();

        let related: Vec<&Cat> = self
            .cats
            .iter()
            .filter(|cat| matched_units.contains(&cat.unit_id))
            .filter(|cat| !is_excluded(cat))
            .filter(|cat| !results.iter().any(|r| r.name == cat.name))
            .collect();

        results.extend(related);
        results
    }
}

impl Default for CatRegistry {
    fn default() -> Self {
        Self::fallback()
    }
}

// ============================================================================
// TESTS
// ============================================================================
