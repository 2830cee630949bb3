use serde::Serialize;

use super::config::{IdealRiskRules, MatchConfig};
use super::types::{AgeBracket, Category, Profile};

/// Where a profile's ideal risk score came from.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IdealRiskSource {
    /// A horizon rule matched; `exceeds_years` is its threshold.
    #[serde(rename_all = "camelCase")]
    HorizonRule { exceeds_years: u32 },
    /// A horizon is known but exceeds no rule threshold.
    ShortHorizon,
    AgeBracket { bracket: AgeBracket },
    Default,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdealRisk {
    pub score: f64,
    pub source: IdealRiskSource,
}

/// Horizon wins over age, age over the global default.
pub fn ideal_risk(profile: &Profile, rules: &IdealRiskRules) -> IdealRisk {
    if let Some(horizon) = profile.horizon_years {
        return rules
            .horizon_rules
            .iter()
            .find(|rule| horizon > rule.exceeds_years)
            .map(|rule| IdealRisk {
                score: rule.ideal_risk,
                source: IdealRiskSource::HorizonRule {
                    exceeds_years: rule.exceeds_years,
                },
            })
            .unwrap_or(IdealRisk {
                score: rules.short_horizon,
                source: IdealRiskSource::ShortHorizon,
            });
    }
    if let Some(bracket) = profile.age_bracket {
        return IdealRisk {
            score: rules.by_age.for_bracket(bracket),
            source: IdealRiskSource::AgeBracket { bracket },
        };
    }
    IdealRisk {
        score: rules.default,
        source: IdealRiskSource::Default,
    }
}

/// Linear fit between a product risk and an ideal risk, both in `[0, 100]`.
pub fn coherence_from_risks(product_risk: f64, ideal_risk: f64) -> u8 {
    let distance = (product_risk - ideal_risk).abs();
    let score = (100.0 - distance / 100.0 * 100.0).clamp(0.0, 100.0);
    score.round() as u8
}

/// Compatibility of a category with a profile in `[0, 100]`.
///
/// Unknown or absent categories, and profiles with neither horizon nor age,
/// score `config.neutral_coherence`. No other profile field moves the score.
pub fn score_coherence(category: Option<&str>, profile: &Profile, config: &MatchConfig) -> u8 {
    let Some(category) = category.and_then(Category::from_code) else {
        return config.neutral_coherence;
    };
    if !profile.has_risk_inputs() {
        return config.neutral_coherence;
    }
    let product_risk = config.category_risk.score(category);
    let ideal = ideal_risk(profile, &config.ideal_risk);
    coherence_from_risks(product_risk, ideal.score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{RiskPreference, WorkerKind};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn horizon(years: u32) -> Profile {
        Profile {
            horizon_years: Some(years),
            ..Profile::default()
        }
    }

    #[test]
    fn empty_profile_is_neutral_for_every_known_category() {
        let config = MatchConfig::default();
        for category in Category::ALL {
            assert_eq!(
                score_coherence(Some(category.code()), &Profile::default(), &config),
                50
            );
        }
    }

    #[test]
    fn profile_without_horizon_or_age_is_neutral() {
        let config = MatchConfig::default();
        let profile = Profile {
            risk_preference: Some(RiskPreference::Low),
            monthly_contribution: Some(100.0),
            worker_kind: Some(WorkerKind::SelfEmployed),
            ..Profile::default()
        };
        assert_eq!(
            ideal_risk(&profile, &config.ideal_risk).source,
            IdealRiskSource::Default
        );
        assert_eq!(score_coherence(Some("BIL"), &profile, &config), 50);
        assert_eq!(score_coherence(Some("GAR"), &profile, &config), 50);
        assert_eq!(score_coherence(Some("AZN"), &profile, &config), 50);
    }

    #[test]
    fn unknown_category_is_neutral_regardless_of_profile() {
        let config = MatchConfig::default();
        let profile = Profile {
            horizon_years: Some(30),
            age_bracket: Some(AgeBracket::Under35),
            risk_preference: Some(RiskPreference::High),
            ..Profile::default()
        };
        assert_eq!(score_coherence(None, &profile, &config), 50);
        assert_eq!(score_coherence(Some("CRYPTO"), &profile, &config), 50);
        assert_eq!(score_coherence(Some(""), &Profile::default(), &config), 50);
    }

    #[test]
    fn horizon_takes_precedence_over_age() {
        let config = MatchConfig::default();
        let profile = Profile {
            horizon_years: Some(3),
            age_bracket: Some(AgeBracket::Under35),
            ..Profile::default()
        };
        let ideal = ideal_risk(&profile, &config.ideal_risk);
        assert_eq!(ideal.score, 20.0);
        assert_eq!(ideal.source, IdealRiskSource::ShortHorizon);
        assert_eq!(score_coherence(Some("OBB"), &profile, &config), 100);
    }

    #[test]
    fn age_fallback_applies_without_horizon() {
        let config = MatchConfig::default();
        let profile = Profile {
            age_bracket: Some(AgeBracket::Over50),
            ..Profile::default()
        };
        let ideal = ideal_risk(&profile, &config.ideal_risk);
        assert_eq!(ideal.score, 30.0);
        assert_eq!(
            ideal.source,
            IdealRiskSource::AgeBracket {
                bracket: AgeBracket::Over50
            }
        );
        assert_eq!(score_coherence(Some("AZN"), &profile, &config), 45);
    }

    #[test]
    fn horizon_rules_use_strict_thresholds() {
        let config = MatchConfig::default();
        let rules = &config.ideal_risk;
        assert_eq!(ideal_risk(&horizon(0), rules).score, 20.0);
        assert_eq!(ideal_risk(&horizon(5), rules).score, 20.0);
        assert_eq!(ideal_risk(&horizon(6), rules).score, 40.0);
        assert_eq!(ideal_risk(&horizon(10), rules).score, 40.0);
        assert_eq!(ideal_risk(&horizon(11), rules).score, 60.0);
        assert_eq!(ideal_risk(&horizon(20), rules).score, 60.0);
        assert_eq!(
            ideal_risk(&horizon(21), rules),
            IdealRisk {
                score: 80.0,
                source: IdealRiskSource::HorizonRule { exceeds_years: 20 }
            }
        );
    }

    #[test]
    fn coherence_from_risks_hits_both_ends() {
        assert_eq!(coherence_from_risks(55.0, 55.0), 100);
        assert_eq!(coherence_from_risks(0.0, 100.0), 0);
        assert_eq!(coherence_from_risks(100.0, 0.0), 0);
        assert_eq!(coherence_from_risks(10.0, 80.0), 30);
        assert_eq!(coherence_from_risks(50.0, 50.4), 100);
        assert_eq!(coherence_from_risks(50.0, 50.6), 99);
    }

    proptest! {
        #[test]
        fn prop_informational_fields_never_move_the_score(
            idx in 0usize..5,
            years in proptest::option::of(0u32..60),
            age in proptest::option::of(0usize..3),
            contribution in proptest::option::of(0.0f64..2_000.0),
            worker in proptest::option::of(0usize..4),
            has_fpn in proptest::option::of(proptest::bool::ANY),
            fpn_category in proptest::option::of("[A-Z]{0,12}"),
            risk in proptest::option::of(0usize..3),
        ) {
            let config = MatchConfig::default();
            let brackets = [AgeBracket::Under35, AgeBracket::From35To50, AgeBracket::Over50];
            let workers = [
                WorkerKind::Employee,
                WorkerKind::PublicEmployee,
                WorkerKind::SelfEmployed,
                WorkerKind::Other,
            ];
            let risks = [RiskPreference::Low, RiskPreference::Medium, RiskPreference::High];
            let bare = Profile {
                horizon_years: years,
                age_bracket: age.map(|i| brackets[i]),
                ..Profile::default()
            };
            let filled = Profile {
                monthly_contribution: contribution,
                worker_kind: worker.map(|i| workers[i]),
                has_fpn,
                fpn_category,
                risk_preference: risk.map(|i| risks[i]),
                ..bare.clone()
            };
            let code = Some(Category::ALL[idx].code());
            prop_assert_eq!(
                score_coherence(code, &filled, &config),
                score_coherence(code, &bare, &config)
            );
        }

        #[test]
        fn prop_score_is_bounded(
            idx in 0usize..5,
            years in proptest::option::of(0u32..60),
            age in proptest::option::of(0usize..3),
        ) {
            let config = MatchConfig::default();
            let brackets = [AgeBracket::Under35, AgeBracket::From35To50, AgeBracket::Over50];
            let profile = Profile {
                horizon_years: years,
                age_bracket: age.map(|i| brackets[i]),
                ..Profile::default()
            };
            let score = score_coherence(Some(Category::ALL[idx].code()), &profile, &config);
            prop_assert!(score <= 100);
        }

        #[test]
        fn prop_horizons_under_the_same_rule_score_equally(
            idx in 0usize..5,
            h1 in 0u32..80,
            h2 in 0u32..80,
        ) {
            let config = MatchConfig::default();
            let rules = &config.ideal_risk;
            let a = ideal_risk(&horizon(h1), rules);
            let b = ideal_risk(&horizon(h2), rules);
            if a.source == b.source {
                let code = Some(Category::ALL[idx].code());
                prop_assert_eq!(
                    score_coherence(code, &horizon(h1), &config),
                    score_coherence(code, &horizon(h2), &config)
                );
            }
        }

        #[test]
        fn prop_larger_distance_never_scores_higher(
            product in 0.0f64..=100.0,
            near in 0.0f64..=100.0,
            far in 0.0f64..=100.0,
        ) {
            let (near, far) = if (product - near).abs() <= (product - far).abs() {
                (near, far)
            } else {
                (far, near)
            };
            prop_assert!(coherence_from_risks(product, far) <= coherence_from_risks(product, near));
        }
    }
}
