//! Declarative variant resolution.
//!
//! Some aircraft ship in several hardware configurations behind one
//! `(icao, author)` identity; a profile can refine the identity with a
//! variant string derived from simulator value samples. Resolution is a
//! pure function of the samples: ordered rules, first rule whose
//! conditions all hold wins. Anything that goes wrong — a missing sample,
//! a type mismatch, no rule matching — resolves to "no variant", never to
//! an error.

use flight_deck_core::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Latest observed simulator values, keyed by value name.
pub type ValueSamples = HashMap<String, Value>;

/// One condition over a named sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SampleCondition {
    /// Simulator value name to test.
    pub sample: String,
    /// Exact match against the sample value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<Value>,
    /// Substring match against a text sample.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
}

impl SampleCondition {
    fn holds(&self, samples: &ValueSamples) -> bool {
        let Some(value) = samples.get(&self.sample) else {
            return false;
        };
        if let Some(expected) = &self.equals {
            let matches = match (expected, value) {
                (Value::Number(a), Value::Number(b)) => (a - b).abs() < f64::EPSILON,
                (Value::Text(a), Value::Text(b)) => a == b,
                _ => false,
            };
            if !matches {
                return false;
            }
        }
        if let Some(needle) = &self.contains {
            match value {
                Value::Text(text) => {
                    if !text.contains(needle.as_str()) {
                        return false;
                    }
                }
                Value::Number(_) => return false,
            }
        }
        self.equals.is_some() || self.contains.is_some()
    }
}

/// One resolver rule: a variant string guarded by sample conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct VariantRule {
    pub variant: String,
    pub when: Vec<SampleCondition>,
}

impl VariantRule {
    fn matches(&self, samples: &ValueSamples) -> bool {
        !self.when.is_empty() && self.when.iter().all(|c| c.holds(samples))
    }
}

/// Resolve a variant string from ordered rules. First full match wins;
/// empty results count as no variant.
pub(crate) fn resolve_variant(rules: &[VariantRule], samples: &ValueSamples) -> Option<String> {
    rules
        .iter()
        .find(|rule| rule.matches(samples))
        .map(|rule| rule.variant.clone())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(entries: &[(&str, Value)]) -> ValueSamples {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    fn rule(variant: &str, sample: &str, equals: Value) -> VariantRule {
        VariantRule {
            variant: variant.into(),
            when: vec![SampleCondition {
                sample: sample.into(),
                equals: Some(equals),
                contains: None,
            }],
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = vec![
            rule("272NX", "engines", Value::Number(2.0)),
            rule("271NX", "engines", Value::Number(2.0)),
        ];
        let result = resolve_variant(&rules, &samples(&[("engines", Value::Number(2.0))]));
        assert_eq!(result, Some("272NX".to_string()));
    }

    #[test]
    fn missing_sample_fails_the_rule_not_the_resolution() {
        let rules = vec![
            rule("272NX", "engines", Value::Number(2.0)),
            rule("fallback", "other", Value::Number(1.0)),
        ];
        let result = resolve_variant(&rules, &samples(&[("other", Value::Number(1.0))]));
        assert_eq!(result, Some("fallback".to_string()));
    }

    #[test]
    fn no_match_resolves_to_none() {
        let rules = vec![rule("272NX", "engines", Value::Number(2.0))];
        assert_eq!(resolve_variant(&rules, &ValueSamples::new()), None);
    }

    #[test]
    fn empty_variant_string_counts_as_none() {
        let rules = vec![rule("", "engines", Value::Number(2.0))];
        let result = resolve_variant(&rules, &samples(&[("engines", Value::Number(2.0))]));
        assert_eq!(result, None);
    }

    #[test]
    fn type_mismatch_fails_the_condition() {
        let rules = vec![rule("272NX", "engines", Value::Number(2.0))];
        let result = resolve_variant(&rules, &samples(&[("engines", Value::Text("2".into()))]));
        assert_eq!(result, None);
    }

    #[test]
    fn contains_matches_text_substring() {
        let rules = vec![VariantRule {
            variant: "LR".into(),
            when: vec![SampleCondition {
                sample: "description".into(),
                equals: None,
                contains: Some("Long Range".into()),
            }],
        }];
        let result = resolve_variant(
            &rules,
            &samples(&[("description", Value::Text("A321 Long Range neo".into()))]),
        );
        assert_eq!(result, Some("LR".to_string()));
    }

    #[test]
    fn condition_without_predicates_never_holds() {
        let rules = vec![VariantRule {
            variant: "x".into(),
            when: vec![SampleCondition {
                sample: "a".into(),
                equals: None,
                contains: None,
            }],
        }];
        let result = resolve_variant(&rules, &samples(&[("a", Value::Number(1.0))]));
        assert_eq!(result, None);
    }

    #[test]
    fn resolution_is_deterministic() {
        let rules = vec![rule("272NX", "engines", Value::Number(2.0))];
        let input = samples(&[("engines", Value::Number(2.0))]);
        let first = resolve_variant(&rules, &input);
        let second = resolve_variant(&rules, &input);
        assert_eq!(first, second);
    }

    #[test]
    fn multi_condition_rule_requires_all() {
        let rules = vec![VariantRule {
            variant: "272NX".into(),
            when: vec![
                SampleCondition {
                    sample: "engines".into(),
                    equals: Some(Value::Number(2.0)),
                    contains: None,
                },
                SampleCondition {
                    sample: "fuel-tanks".into(),
                    equals: Some(Value::Number(3.0)),
                    contains: None,
                },
            ],
        }];

        let partial = samples(&[("engines", Value::Number(2.0))]);
        assert_eq!(resolve_variant(&rules, &partial), None);

        let full = samples(&[
            ("engines", Value::Number(2.0)),
            ("fuel-tanks", Value::Number(3.0)),
        ]);
        assert_eq!(resolve_variant(&rules, &full), Some("272NX".to_string()));
    }
}
