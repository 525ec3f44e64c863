// 🔍 Comparison Engine - attribute-by-attribute feedback
//
// Eight attributes, one verdict each, always in the same order:
//   rarity, form, role, traits, attack type, abilities, cost, version
//
// Every rule is a pure function of (guess value, secret value).
//
// Directional verdicts point at the secret:
//   *Higher → the secret's value is higher than the guess
//   *Lower  → the secret's value is lower than the guess

use crate::entities::{Cat, Form};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Cost gap above which the arrow doubles
pub const COST_DOUBLE_GAP: f64 = 1500.0;

/// Major version gap at or above which the arrow doubles
pub const VERSION_DOUBLE_GAP: i64 = 5;

/// Token standing in for an empty trait/ability list
const EMPTY_TOKEN: &str = "X";

// ============================================================================
// ATTRIBUTE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Attribute {
    Rarity,
    Form,
    Role,
    Traits,
    AttackType,
    Abilities,
    Cost,
    Version,
}

impl Attribute {
    /// Fixed feedback order
    pub const ALL: [Attribute; 8] = [
        Attribute::Rarity,
        Attribute::Form,
        Attribute::Role,
        Attribute::Traits,
        Attribute::AttackType,
        Attribute::Abilities,
        Attribute::Cost,
        Attribute::Version,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Attribute::Rarity => "Rarity",
            Attribute::Form => "Form",
            Attribute::Role => "Role",
            Attribute::Traits => "Traits",
            Attribute::AttackType => "Attack Type",
            Attribute::Abilities => "Abilities",
            Attribute::Cost => "Cost",
            Attribute::Version => "Version",
        }
    }

    /// The cat's raw value for this attribute
    pub fn value_of<'a>(&self, cat: &'a Cat) -> &'a str {
        match self {
            Attribute::Rarity => &cat.rarity,
            Attribute::Form => &cat.form,
            Attribute::Role => &cat.role,
            Attribute::Traits => &cat.traits,
            Attribute::AttackType => &cat.attack_type,
            Attribute::Abilities => &cat.abilities,
            Attribute::Cost => &cat.cost,
            Attribute::Version => &cat.version,
        }
    }
}

/// Number of compared attributes; also the daily guess cap
pub const ATTRIBUTE_COUNT: usize = Attribute::ALL.len();

// ============================================================================
// VERDICT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    Exact,
    Partial,
    #[serde(rename = "none")]
    Miss,
    SingleLower,
    SingleHigher,
    DoubleLower,
    DoubleHigher,
}

impl Verdict {
    pub fn is_exact(&self) -> bool {
        matches!(self, Verdict::Exact)
    }

    pub fn is_directional(&self) -> bool {
        matches!(
            self,
            Verdict::SingleLower | Verdict::SingleHigher | Verdict::DoubleLower | Verdict::DoubleHigher
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Exact => "exact",
            Verdict::Partial => "partial",
            Verdict::Miss => "none",
            Verdict::SingleLower => "single-lower",
            Verdict::SingleHigher => "single-higher",
            Verdict::DoubleLower => "double-lower",
            Verdict::DoubleHigher => "double-higher",
        }
    }

    /// Arrow for a guess differing by `diff = guess - secret`
    fn directional(diff_positive: bool, double: bool) -> Verdict {
        match (diff_positive, double) {
            (true, true) => Verdict::DoubleLower,
            (true, false) => Verdict::SingleLower,
            (false, true) => Verdict::DoubleHigher,
            (false, false) => Verdict::SingleHigher,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FEEDBACK
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeVerdict {
    pub attribute: Attribute,
    pub verdict: Verdict,
}

/// Compare a guess against the secret, one verdict per attribute in
/// [`Attribute::ALL`] order
pub fn compare(guess: &Cat, secret: &Cat) -> Vec<AttributeVerdict> {
    Attribute::ALL
        .iter()
        .map(|&attribute| AttributeVerdict {
            attribute,
            verdict: compare_attribute(attribute, guess, secret),
        })
        .collect()
}

pub fn compare_attribute(attribute: Attribute, guess: &Cat, secret: &Cat) -> Verdict {
    let g = attribute.value_of(guess);
    let s = attribute.value_of(secret);

    match attribute {
        Attribute::Rarity => compare_rarity(g, s),
        Attribute::Form => compare_form(g, s),
        Attribute::Role => compare_role(g, s),
        Attribute::Traits | Attribute::Abilities => compare_token_sets(g, s),
        Attribute::AttackType => compare_attack_type(g, s),
        Attribute::Cost => compare_cost(g, s),
        Attribute::Version => compare_version(g, s),
    }
}

// ============================================================================
// RULES
// ============================================================================

/// Exact string match, no partial credit
pub fn compare_rarity(guess: &str, secret: &str) -> Verdict {
    if guess == secret {
        Verdict::Exact
    } else {
        Verdict::Miss
    }
}

/// Both must be valid forms; no credit for being one form apart
pub fn compare_form(guess: &str, secret: &str) -> Verdict {
    match (Form::parse(guess), Form::parse(secret)) {
        (Some(g), Some(s)) if g == s => Verdict::Exact,
        _ => Verdict::Miss,
    }
}

/// Full string match, else any shared whitespace token
pub fn compare_attack_type(guess: &str, secret: &str) -> Verdict {
    if guess == secret {
        return Verdict::Exact;
    }

    let guess_tokens: BTreeSet<&str> = guess.split_whitespace().collect();
    if secret.split_whitespace().any(|t| guess_tokens.contains(t)) {
        Verdict::Partial
    } else {
        Verdict::Miss
    }
}

/// Order, separator and case insensitive tag comparison
///
/// Example: "Tank, Sniper" and "sniper tank" both normalize to "sniper tank"
pub fn compare_role(guess: &str, secret: &str) -> Verdict {
    let guess_roles = normalize_roles(guess);
    let secret_roles = normalize_roles(secret);

    if guess_roles == secret_roles {
        return Verdict::Exact;
    }

    if guess_roles.iter().any(|role| secret_roles.contains(role)) {
        Verdict::Partial
    } else {
        Verdict::Miss
    }
}

/// Set comparison for traits and abilities
pub fn compare_token_sets(guess: &str, secret: &str) -> Verdict {
    let guess_tokens = tokenize_set(guess);
    let secret_tokens = tokenize_set(secret);
    let common = guess_tokens.intersection(&secret_tokens).count();

    if common == guess_tokens.len() && common == secret_tokens.len() {
        Verdict::Exact
    } else if common > 0 {
        Verdict::Partial
    } else {
        Verdict::Miss
    }
}

/// Numeric comparison of currency strings
pub fn compare_cost(guess: &str, secret: &str) -> Verdict {
    let (g, s) = match (parse_cost(guess), parse_cost(secret)) {
        (Some(g), Some(s)) => (g, s),
        _ => return Verdict::Miss,
    };

    if g == s {
        return Verdict::Exact;
    }

    let diff = g - s;
    Verdict::directional(diff > 0.0, diff.abs() > COST_DOUBLE_GAP)
}

/// Major decides first (double at a gap of 5+), then minor (always single).
/// A patch-only difference reads as the secret being marginally newer.
pub fn compare_version(guess: &str, secret: &str) -> Verdict {
    if guess == secret {
        return Verdict::Exact;
    }

    let g = Version::parse(guess);
    let s = Version::parse(secret);

    if g.major != s.major {
        // Widened so extreme catalog values cannot overflow
        let diff = i128::from(g.major) - i128::from(s.major);
        return Verdict::directional(diff > 0, diff.abs() >= i128::from(VERSION_DOUBLE_GAP));
    }

    if g.minor != s.minor {
        return Verdict::directional(g.minor > s.minor, false);
    }

    Verdict::SingleHigher
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Split on commas and whitespace, lowercase, sort
fn normalize_roles(roles: &str) -> Vec<String> {
    let mut tokens: Vec<String> = roles
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect();
    tokens.sort();
    tokens
}

/// Whitespace tokens as a set; empty and "x" placeholders become one
/// sentinel token
fn tokenize_set(value: &str) -> BTreeSet<&str> {
    let tokens: BTreeSet<&str> = value
        .split_whitespace()
        .map(|t| if t.eq_ignore_ascii_case(EMPTY_TOKEN) { EMPTY_TOKEN } else { t })
        .collect();

    if tokens.is_empty() {
        BTreeSet::from([EMPTY_TOKEN])
    } else {
        tokens
    }
}

/// Strip everything but digits, '.', '-' and parse the longest numeric
/// prefix
///
/// Example: "1,500¢" → 1500.0, "¢" → None
pub fn parse_cost(value: &str) -> Option<f64> {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    (1..=cleaned.len())
        .rev()
        .find_map(|end| cleaned[..end].parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: i64,
    pub minor: i64,
    pub patch: i64,
}

impl Version {
    /// Parse "V<major>.<minor>.<patch>"; missing or garbled parts are 0
    pub fn parse(value: &str) -> Version {
        let trimmed = value.trim();
        let trimmed = trimmed
            .strip_prefix('V')
            .or_else(|| trimmed.strip_prefix('v'))
            .unwrap_or(trimmed);

        let mut parts = trimmed
            .split('.')
            .map(|p| p.trim().parse::<i64>().unwrap_or(0));

        Version {
            major: parts.next().unwrap_or(0),
            minor: parts.next().unwrap_or(0),
            patch: parts.next().unwrap_or(0),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cat() -> Cat {
        Cat {
            unit_id: 42,
            name: "Test Cat".to_string(),
            rarity: "Uber Rare".to_string(),
            form: "True".to_string(),
            role: "Tank, Sniper".to_string(),
            traits: "Red Floating".to_string(),
            attack_type: "Area Attack".to_string(),
            abilities: "Knockback Freeze".to_string(),
            cost: "3000¢".to_string(),
            version: "V10.4.0".to_string(),
            ..Cat::placeholder()
        }
    }

    #[test]
    fn test_compare_reflexive() {
        let c = cat();
        let verdicts = compare(&c, &c);

        assert_eq!(verdicts.len(), ATTRIBUTE_COUNT);
        for v in verdicts {
            assert_eq!(v.verdict, Verdict::Exact, "{:?}", v.attribute);
        }
    }

    #[test]
    fn test_compare_order() {
        let c = cat();
        let attributes: Vec<Attribute> = compare(&c, &Cat::placeholder())
            .into_iter()
            .map(|v| v.attribute)
            .collect();
        assert_eq!(attributes, Attribute::ALL.to_vec());
    }

    #[test]
    fn test_rarity_rule() {
        assert_eq!(compare_rarity("Rare", "Rare"), Verdict::Exact);
        assert_eq!(compare_rarity("Rare", "Super Rare"), Verdict::Miss);
        assert_eq!(compare_rarity("rare", "Rare"), Verdict::Miss);
    }

    #[test]
    fn test_form_rule_ignores_order() {
        assert_eq!(compare_form("Evolved", "Evolved Form"), Verdict::Exact);
        assert_eq!(compare_form("Base", "Evolved"), Verdict::Miss);
        assert_eq!(compare_form("True", "Ultra"), Verdict::Miss);
        assert_eq!(compare_form("Legend", "Legend"), Verdict::Miss);
    }

    #[test]
    fn test_attack_type_rule() {
        assert_eq!(compare_attack_type("Area Attack", "Area Attack"), Verdict::Exact);
        assert_eq!(compare_attack_type("Area Attack", "Single Attack"), Verdict::Partial);
        assert_eq!(compare_attack_type("Area", "Single Attack"), Verdict::Miss);
        assert_eq!(compare_attack_type("", ""), Verdict::Exact);
        assert_eq!(compare_attack_type("", "Area"), Verdict::Miss);
    }

    #[test]
    fn test_role_rule_normalizes() {
        assert_eq!(compare_role("Tank, Sniper", "sniper tank"), Verdict::Exact);
        assert_eq!(compare_role("Tank,Sniper", "Sniper ,  Tank"), Verdict::Exact);
        assert_eq!(compare_role("Tank Rusher", "Sniper Tank"), Verdict::Partial);
        assert_eq!(compare_role("Rusher", "Sniper Tank"), Verdict::Miss);
    }

    #[test]
    fn test_token_set_rule() {
        assert_eq!(compare_token_sets("Red Floating", "Floating Red"), Verdict::Exact);
        assert_eq!(compare_token_sets("Red Floating", "Red"), Verdict::Partial);
        assert_eq!(compare_token_sets("Red", "Red Floating"), Verdict::Partial);
        assert_eq!(compare_token_sets("Red", "Black"), Verdict::Miss);
        assert_eq!(compare_token_sets("Red Red", "Red"), Verdict::Exact);
    }

    #[test]
    fn test_token_set_placeholder() {
        assert_eq!(compare_token_sets("", ""), Verdict::Exact);
        assert_eq!(compare_token_sets("", "X"), Verdict::Exact);
        assert_eq!(compare_token_sets("x", "Red"), Verdict::Miss);
    }

    #[test]
    fn test_cost_convention_points_at_secret() {
        // Guess 1600 below the secret → secret is much higher
        assert_eq!(compare_cost("100¢", "1700¢"), Verdict::DoubleHigher);
        // Guess 1600 above the secret → secret is much lower
        assert_eq!(compare_cost("1700¢", "100¢"), Verdict::DoubleLower);
        assert_eq!(compare_cost("1000¢", "1500¢"), Verdict::SingleHigher);
        assert_eq!(compare_cost("1500¢", "1000¢"), Verdict::SingleLower);
    }

    #[test]
    fn test_cost_gap_boundary() {
        // Exactly 1500 apart is still single
        assert_eq!(compare_cost("0¢", "1500¢"), Verdict::SingleHigher);
        assert_eq!(compare_cost("0¢", "1501¢"), Verdict::DoubleHigher);
        assert_eq!(compare_cost("1,500¢", "1500"), Verdict::Exact);
    }

    #[test]
    fn test_cost_unparseable_is_miss() {
        assert_eq!(compare_cost("¢", "100¢"), Verdict::Miss);
        assert_eq!(compare_cost("100¢", "free"), Verdict::Miss);
    }

    #[test]
    fn test_parse_cost() {
        assert_eq!(parse_cost("4,500¢"), Some(4500.0));
        assert_eq!(parse_cost("75"), Some(75.0));
        assert_eq!(parse_cost("1.5.2"), Some(1.5));
        assert_eq!(parse_cost("-"), None);
        assert_eq!(parse_cost(""), None);
    }

    #[test]
    fn test_version_major() {
        assert_eq!(compare_version("V2.0", "V9.1"), Verdict::DoubleHigher);
        assert_eq!(compare_version("V9.1", "V2.0"), Verdict::DoubleLower);
        assert_eq!(compare_version("V6.0", "V9.0"), Verdict::SingleHigher);
        assert_eq!(compare_version("V13.0", "V9.0"), Verdict::SingleLower);
        assert_eq!(compare_version("V9223372036854775807", "V-1"), Verdict::DoubleLower);
        assert_eq!(
            compare_version("V-9223372036854775808", "V9223372036854775807"),
            Verdict::DoubleHigher
        );
    }

    #[test]
    fn test_version_minor_is_always_single() {
        assert_eq!(compare_version("V2.0", "V2.9"), Verdict::SingleHigher);
        assert_eq!(compare_version("V2.9", "V2.0"), Verdict::SingleLower);
    }

    #[test]
    fn test_version_patch_only_reads_secret_newer() {
        assert_eq!(compare_version("V2.0.9", "V2.0"), Verdict::SingleHigher);
        assert_eq!(compare_version("V2.0", "V2.0.9"), Verdict::SingleHigher);
        // Different raw strings, same numbers
        assert_eq!(compare_version("V2.0", "V2.0.0"), Verdict::SingleHigher);
    }

    #[test]
    fn test_version_parse() {
        assert_eq!(Version::parse("V10.4.1"), Version { major: 10, minor: 4, patch: 1 });
        assert_eq!(Version::parse("V3"), Version { major: 3, minor: 0, patch: 0 });
        assert_eq!(Version::parse("Vx.2"), Version { major: 0, minor: 2, patch: 0 });
    }

    #[test]
    fn test_verdict_serializes_kebab_case() {
        let json = serde_json::to_string(&Verdict::DoubleHigher).unwrap();
        assert_eq!(json, "\"double-higher\"");
        let json = serde_json::to_string(&Verdict::Miss).unwrap();
        assert_eq!(json, "\"none\"");
    }
}
