// 🎯 Answer Selector - which cat is today's answer
//
// Three interchangeable strategies behind one trait:
//
//   Indexed  → day index looks up an explicit answer table
//   Seeded   → day key hashes to a seed, seed picks from the catalog,
//              skipping the picks of the last N days
//   Random   → no determinism, used by infinite mode
//
// Selection never fails. A strategy that cannot produce a cat falls back to a
// random pick, and an empty catalog falls back to the placeholder (unit 0).

use crate::config::{GameConfig, SelectionMode};
use crate::entities::{AnswerRef, Cat, CatRegistry};
use crate::temporal::DayKey;
use std::collections::HashSet;

// ============================================================================
// SELECTION CONTEXT
// ============================================================================

/// Which game day is being selected for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionContext {
    pub day_key: DayKey,

    /// Whole days since launch (0-based)
    pub day_index: i64,
}

impl SelectionContext {
    pub fn new(day_key: DayKey, day_index: i64) -> Self {
        SelectionContext { day_key, day_index }
    }

    /// The game day before this one
    pub fn previous(&self) -> Self {
        SelectionContext {
            day_key: self.day_key.previous(),
            day_index: self.day_index - 1,
        }
    }
}

// ============================================================================
// STRATEGY TRAIT
// ============================================================================

pub trait AnswerStrategy: Send + Sync {
    /// Pick a cat for the given day, None when this strategy cannot
    fn select(&self, ctx: &SelectionContext, catalog: &CatRegistry) -> Option<Cat>;

    fn name(&self) -> &str;
}

// ============================================================================
// INDEXED STRATEGY
// ============================================================================

/// Day index → explicit (unit id, form) reference
pub struct IndexedStrategy {
    answers: Vec<AnswerRef>,

    /// Wrap out-of-range indices instead of falling back
    wrap: bool,
}

impl IndexedStrategy {
    pub fn new(answers: Vec<AnswerRef>) -> Self {
        IndexedStrategy {
            answers,
            wrap: false,
        }
    }

    pub fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    fn answer_for(&self, day_index: i64) -> Option<&AnswerRef> {
        if day_index < 0 || self.answers.is_empty() {
            return None;
        }
        let index = day_index as usize;
        if self.wrap {
            self.answers.get(index % self.answers.len())
        } else {
            self.answers.get(index)
        }
    }
}

impl AnswerStrategy for IndexedStrategy {
    fn select(&self, ctx: &SelectionContext, catalog: &CatRegistry) -> Option<Cat> {
        let answer = match self.answer_for(ctx.day_index) {
            Some(answer) => answer,
            None => {
                tracing::warn!(
                    "Day index {} outside answer table ({} entries), picking from catalog",
                    ctx.day_index,
                    self.answers.len()
                );
                return day_stable_pick(&ctx.day_key, catalog);
            }
        };

        match catalog.resolve(answer) {
            Some(cat) => Some(cat.clone()),
            None => {
                tracing::warn!(
                    "Answer not found in catalog: unit {} form {:?} (day {})",
                    answer.unit_id,
                    answer.form,
                    ctx.day_key
                );
                day_stable_pick(&ctx.day_key, catalog)
            }
        }
    }

    fn name(&self) -> &str {
        "indexed"
    }
}

// ============================================================================
// SEEDED STRATEGY
// ============================================================================

/// Day key → seed → catalog index, avoiding recent repeats
pub struct SeededStrategy {
    repeat_window_days: u32,
}

impl SeededStrategy {
    pub fn new(repeat_window_days: u32) -> Self {
        SeededStrategy { repeat_window_days }
    }

    /// Unit ids picked (without exclusion) on the previous N days
    fn recent_units(&self, day_key: &DayKey, catalog: &CatRegistry) -> HashSet<u32> {
        (1..=self.repeat_window_days)
            .filter_map(|back| {
                let past = day_key.days_back(back).to_string();
                pick_index(seeded_random(generate_seed(&past)), catalog.len())
                    .and_then(|i| catalog.get(i))
                    .map(|cat| cat.unit_id)
            })
            .collect()
    }
}

impl Default for SeededStrategy {
    fn default() -> Self {
        Self::new(7)
    }
}

impl AnswerStrategy for SeededStrategy {
    fn select(&self, ctx: &SelectionContext, catalog: &CatRegistry) -> Option<Cat> {
        let recent = self.recent_units(&ctx.day_key, catalog);

        let mut pool: Vec<&Cat> = catalog
            .all()
            .iter()
            .filter(|cat| !recent.contains(&cat.unit_id))
            .collect();

        if pool.is_empty() {
            tracing::debug!("Repeat window excludes whole catalog, skipping exclusion");
            pool = catalog.all().iter().collect();
        }

        let seed = generate_seed(&ctx.day_key.to_string());
        pick_index(seeded_random(seed), pool.len()).map(|i| pool[i].clone())
    }

    fn name(&self) -> &str {
        "seeded"
    }
}

// ============================================================================
// RANDOM STRATEGY
// ============================================================================

/// Uniform pick on every call
#[derive(Debug, Default)]
pub struct RandomStrategy;

impl AnswerStrategy for RandomStrategy {
    fn select(&self, _ctx: &SelectionContext, catalog: &CatRegistry) -> Option<Cat> {
        catalog.random(&mut rand::thread_rng()).cloned()
    }

    fn name(&self) -> &str {
        "random"
    }
}

// ============================================================================
// ANSWER SELECTOR
// ============================================================================

pub struct AnswerSelector {
    strategy: Box<dyn AnswerStrategy>,
}

impl AnswerSelector {
    pub fn new(strategy: Box<dyn AnswerStrategy>) -> Self {
        AnswerSelector { strategy }
    }

    /// Strategy chosen by config; `answers` feeds the indexed mode
    pub fn from_config(config: &GameConfig, answers: Vec<AnswerRef>) -> Self {
        let strategy: Box<dyn AnswerStrategy> = match config.selection {
            SelectionMode::Indexed => {
                Box::new(IndexedStrategy::new(answers).with_wrap(config.wrap_answer_table))
            }
            SelectionMode::Seeded => Box::new(SeededStrategy::new(config.repeat_window_days)),
        };
        Self::new(strategy)
    }

    pub fn random() -> Self {
        Self::new(Box::new(RandomStrategy))
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// Always yields a cat: strategy, then random, then placeholder
    pub fn select(&self, ctx: &SelectionContext, catalog: &CatRegistry) -> Cat {
        if let Some(cat) = self.strategy.select(ctx, catalog) {
            tracing::debug!("{} selection for {}: {}", self.strategy.name(), ctx.day_key, cat.name);
            return cat;
        }

        tracing::warn!(
            "{} selection produced nothing for {}, falling back to random",
            self.strategy.name(),
            ctx.day_key
        );

        match catalog.random(&mut rand::thread_rng()) {
            Some(cat) => cat.clone(),
            None => {
                tracing::warn!("Catalog is empty, using placeholder answer");
                Cat::placeholder()
            }
        }
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Polynomial string hash: seed = seed * 31 + char, wrapped to 32 bits
pub fn generate_seed(input: &str) -> i32 {
    input
        .chars()
        .fold(0i32, |seed, c| seed.wrapping_mul(31).wrapping_add(c as i32))
}

/// Fractional part of sin(seed) * 10000, in [0, 1)
pub fn seeded_random(seed: i32) -> f64 {
    let x = (seed as f64).sin() * 10_000.0;
    x - x.floor()
}

/// Map a [0, 1) sample onto an index, None for an empty range
fn pick_index(sample: f64, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let index = (sample * len as f64).floor() as usize;
    Some(index.min(len - 1))
}

/// Deterministic per-day catalog pick used as the indexed fallback, so a
/// missing table entry still yields the same cat all day
fn day_stable_pick(day_key: &DayKey, catalog: &CatRegistry) -> Option<Cat> {
    let seed = generate_seed(&day_key.to_string());
    pick_index(seeded_random(seed), catalog.len())
        .and_then(|i| catalog.get(i))
        .cloned()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Form;

    fn cat(unit_id: u32, name: &str, form: Form) -> Cat {
        Cat {
            unit_id,
            name: name.to_string(),
            form: form.to_string(),
            ..Cat::placeholder()
        }
    }

    fn catalog() -> CatRegistry {
        CatRegistry::new(vec![
            cat(0, "Cat", Form::Base),
            cat(1, "Tank Cat", Form::Base),
            cat(1, "Wall Cat", Form::Evolved),
            cat(2, "Axe Cat", Form::Base),
            cat(2, "Brave Cat", Form::Evolved),
            cat(3, "Gross Cat", Form::Base),
            cat(4, "Cow Cat", Form::Base),
            cat(5, "Bird Cat", Form::Base),
            cat(6, "Fish Cat", Form::Base),
            cat(7, "Lizard Cat", Form::Base),
            cat(8, "Titan Cat", Form::Base),
            cat(9, "Ninja Cat", Form::Base),
            cat(10, "Zombie Cat", Form::Base),
        ])
    }

    fn ctx(day: &str, index: i64) -> SelectionContext {
        SelectionContext::new(day.parse().unwrap(), index)
    }

    #[test]
    fn test_generate_seed() {
        assert_eq!(generate_seed(""), 0);
        assert_eq!(generate_seed("a"), 97);
        assert_eq!(generate_seed("ab"), 97 * 31 + 98);
        // Long keys wrap instead of overflowing
        let _ = generate_seed(&"2026-01-14".repeat(20));
    }

    #[test]
    fn test_seeded_random_in_unit_interval() {
        for seed in [-1_000_000, -1, 0, 1, 42, 1_000_000, i32::MAX, i32::MIN] {
            let r = seeded_random(seed);
            assert!((0.0..1.0).contains(&r), "seed {} gave {}", seed, r);
        }
        assert_eq!(seeded_random(0), 0.0);
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let strategy = SeededStrategy::default();
        let catalog = catalog();
        let a = strategy.select(&ctx("2026-03-10", 55), &catalog).unwrap();
        let b = strategy.select(&ctx("2026-03-10", 55), &catalog).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_seeded_avoids_recent_units() {
        let strategy = SeededStrategy::new(7);
        let catalog = catalog();
        let day: DayKey = "2026-04-20".parse().unwrap();

        let recent = strategy.recent_units(&day, &catalog);
        let pick = strategy
            .select(&SelectionContext::new(day, 96), &catalog)
            .unwrap();

        if recent.len() < 11 {
            assert!(!recent.contains(&pick.unit_id));
        }
    }

    #[test]
    fn test_seeded_skips_exclusion_when_pool_empty() {
        let strategy = SeededStrategy::new(7);
        let single = CatRegistry::new(vec![cat(3, "Gross Cat", Form::Base)]);

        let pick = strategy.select(&ctx("2026-04-20", 96), &single).unwrap();
        assert_eq!(pick.name, "Gross Cat");
    }

    #[test]
    fn test_indexed_resolves_unit_and_form() {
        let strategy = IndexedStrategy::new(vec![
            AnswerRef::new(2, Some(Form::Evolved)),
            AnswerRef::new(1, Some(Form::Base)),
        ]);
        let catalog = catalog();

        assert_eq!(strategy.select(&ctx("2026-01-14", 0), &catalog).unwrap().name, "Brave Cat");
        assert_eq!(strategy.select(&ctx("2026-01-15", 1), &catalog).unwrap().name, "Tank Cat");
    }

    #[test]
    fn test_indexed_falls_back_to_name() {
        let strategy = IndexedStrategy::new(vec![
            AnswerRef::new(99, Some(Form::True)).with_name("Cow Cat"),
        ]);
        let pick = strategy.select(&ctx("2026-01-14", 0), &catalog()).unwrap();
        assert_eq!(pick.name, "Cow Cat");
    }

    #[test]
    fn test_indexed_out_of_range_is_stable_for_the_day() {
        let strategy = IndexedStrategy::new(vec![AnswerRef::new(1, None)]);
        let catalog = catalog();

        let first = strategy.select(&ctx("2026-02-01", 18), &catalog).unwrap();
        let again = strategy.select(&ctx("2026-02-01", 18), &catalog).unwrap();
        assert_eq!(first, again);
        assert!(catalog.find_by_name(&first.name).is_some());
    }

    #[test]
    fn test_indexed_wraps_when_enabled() {
        let strategy = IndexedStrategy::new(vec![
            AnswerRef::new(3, None),
            AnswerRef::new(4, None),
        ])
        .with_wrap(true);

        let pick = strategy.select(&ctx("2026-01-16", 2), &catalog()).unwrap();
        assert_eq!(pick.name, "Gross Cat");
    }

    #[test]
    fn test_random_strategy_picks_catalog_member() {
        let catalog = catalog();
        for _ in 0..20 {
            let pick = RandomStrategy.select(&ctx("2026-01-14", 0), &catalog).unwrap();
            assert!(catalog.find_by_name(&pick.name).is_some());
        }
    }

    #[test]
    fn test_selector_never_fails_on_empty_catalog() {
        let empty = CatRegistry::new(Vec::new());
        let context = ctx("2026-01-14", 0);

        for selector in [
            AnswerSelector::new(Box::new(SeededStrategy::default())),
            AnswerSelector::new(Box::new(IndexedStrategy::new(vec![AnswerRef::new(1, None)]))),
            AnswerSelector::random(),
        ] {
            let pick = selector.select(&context, &empty);
            assert!(pick.is_placeholder());
        }
    }

    #[test]
    fn test_selector_from_config() {
        let mut config = GameConfig::default();
        assert_eq!(AnswerSelector::from_config(&config, Vec::new()).strategy_name(), "seeded");

        config.selection = SelectionMode::Indexed;
        assert_eq!(AnswerSelector::from_config(&config, Vec::new()).strategy_name(), "indexed");
    }
}
