use catdle::comparison::{compare, compare_cost, compare_role, compare_version, Verdict};
use catdle::parser::{normalize_record, RawCatRecord};
use proptest::prelude::*;
use serde_json::Value;

fn cell(s: String) -> Option<Value> {
    Some(Value::String(s))
}

prop_compose! {
    fn arb_raw_record()(
        unit_id in 1u32..5000,
        name in "[A-Za-z][A-Za-z ]{0,20}",
        rarity in prop::sample::select(vec!["Normal", "Special", "Rare", "Super Rare", "Uber Rare", "Legend Rare"]),
        form in prop::sample::select(vec!["Normal Form", "Evolved Form", "True Form", "Ultra Form", "Weird Form", ""]),
        role in "[A-Za-z, ]{0,24}",
        traits in "[A-Za-z ]{0,24}",
        attack_type in "[A-Za-z ]{0,24}",
        abilities in "[A-Za-z ]{0,24}",
        cost in "[0-9,¢]{0,8}",
        version in "(V?[0-9]{1,2}(\\.[0-9]{1,2}){0,2})?",
    ) -> RawCatRecord {
        RawCatRecord {
            unit_id: Some(Value::from(unit_id)),
            name: cell(name),
            img: None,
            rarity: cell(rarity.to_string()),
            form: cell(form.to_string()),
            role: cell(role),
            traits: cell(traits),
            attack_type: cell(attack_type),
            abilities: cell(abilities),
            cost: cell(cost),
            version: cell(version),
            source: None,
        }
    }
}

proptest! {
    #[test]
    fn test_compare_is_reflexive_for_catalog_cats(raw in arb_raw_record()) {
        let cat = normalize_record(&raw);
        for v in compare(&cat, &cat) {
            prop_assert_eq!(v.verdict, Verdict::Exact, "{:?} on {:?}", v.attribute, cat);
        }
    }

    #[test]
    fn test_cost_direction_is_antisymmetric(a in 0u32..10_000, b in 0u32..10_000) {
        let forward = compare_cost(&format!("{}¢", a), &format!("{}¢", b));
        let backward = compare_cost(&format!("{}¢", b), &format!("{}¢", a));

        let expected = match forward {
            Verdict::Exact => Verdict::Exact,
            Verdict::SingleHigher => Verdict::SingleLower,
            Verdict::SingleLower => Verdict::SingleHigher,
            Verdict::DoubleHigher => Verdict::DoubleLower,
            Verdict::DoubleLower => Verdict::DoubleHigher,
            other => other,
        };
        prop_assert_eq!(backward, expected);
    }

    #[test]
    fn test_cost_points_at_secret(guess in 0u32..10_000, secret in 0u32..10_000) {
        let verdict = compare_cost(&format!("{}¢", guess), &format!("{}¢", secret));
        if secret > guess {
            prop_assert!(matches!(verdict, Verdict::SingleHigher | Verdict::DoubleHigher));
        } else if secret < guess {
            prop_assert!(matches!(verdict, Verdict::SingleLower | Verdict::DoubleLower));
        } else {
            prop_assert_eq!(verdict, Verdict::Exact);
        }
    }

    #[test]
    fn test_role_ignores_order_and_separators(roles in prop::collection::vec("[a-z]{1,8}", 1..4)) {
        let joined = roles.join(", ");
        let reversed: Vec<String> = roles.iter().rev().cloned().collect();
        let shuffled = reversed.join(" ").to_uppercase();
        prop_assert_eq!(compare_role(&joined, &shuffled), Verdict::Exact);
    }

    #[test]
    fn test_minor_only_difference_is_single(major in 0i32..20, a in 0i32..20, b in 0i32..20) {
        prop_assume!(a != b);
        let verdict = compare_version(&format!("V{}.{}", major, a), &format!("V{}.{}", major, b));
        prop_assert!(matches!(verdict, Verdict::SingleHigher | Verdict::SingleLower));
    }
}
