//! Thresholds, weights and rule tables driving labels, coherence and the shortlist.
//!
//! Everything here is data. [`MatchConfig::default`] carries the published
//! rule set; alternative rule sets can be loaded from JSON and must pass
//! [`MatchConfig::validate`] before use.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{AgeBracket, Category};

const WEIGHT_EPS: f64 = 1e-9;

/// Which end of a metric is desirable.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Polarity {
    LowerIsBetter,
    HigherIsBetter,
}

/// Two cut points splitting a metric into three tiers.
///
/// With [`Polarity::LowerIsBetter`] a value `<= first` is tier 1 and `<= second`
/// tier 2; with [`Polarity::HigherIsBetter`] a value `>= first` is tier 1 and
/// `>= second` tier 2.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bands {
    pub first: f64,
    pub second: f64,
    pub polarity: Polarity,
}

/// Risk score per category, in `[0, 100]`, lower is safer.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRisk {
    pub guaranteed: f64,
    pub bond: f64,
    pub mixed_bond: f64,
    pub balanced: f64,
    pub equity: f64,
}

impl CategoryRisk {
    pub fn score(&self, category: Category) -> f64 {
        match category {
            Category::Guaranteed => self.guaranteed,
            Category::Bond => self.bond,
            Category::MixedBond => self.mixed_bond,
            Category::Balanced => self.balanced,
            Category::Equity => self.equity,
        }
    }
}

/// Applies when the horizon strictly exceeds `exceeds_years`.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizonRule {
    pub exceeds_years: u32,
    pub ideal_risk: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeRisk {
    pub under35: f64,
    pub from35_to50: f64,
    pub over50: f64,
}

impl AgeRisk {
    pub fn for_bracket(&self, bracket: AgeBracket) -> f64 {
        match bracket {
            AgeBracket::Under35 => self.under35,
            AgeBracket::From35To50 => self.from35_to50,
            AgeBracket::Over50 => self.over50,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdealRiskRules {
    /// Ordered from the highest threshold down; first match wins.
    pub horizon_rules: Vec<HorizonRule>,
    /// Used when a horizon is known but exceeds no rule threshold.
    pub short_horizon: f64,
    pub by_age: AgeRisk,
    /// Used when neither horizon nor age is known.
    pub default: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortlistWeights {
    pub cost: f64,
    pub returns: f64,
    pub risk_boost_max: f64,
    pub contractual_type_boost: f64,
    pub contractual_category_boost: f64,
    pub age_conservatism: f64,
    /// Fraction of `age_conservatism` granted to equity lines for under-35 profiles.
    pub under35_share: f64,
}

impl ShortlistWeights {
    /// Largest score any candidate can reach.
    pub fn total(&self) -> f64 {
        self.cost
            + self.returns
            + self.risk_boost_max
            + self.contractual_type_boost
            + self.contractual_category_boost
            + self.age_conservatism
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityRule {
    pub exceeds_years: u32,
    pub categories: Vec<String>,
}

/// Horizon buckets used as a candidate filter, not as a score.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    /// Ordered from the highest threshold down; first match wins.
    pub rules: Vec<EligibilityRule>,
    pub short_horizon: Vec<String>,
}

impl Eligibility {
    pub fn allowed_for(&self, horizon_years: u32) -> &[String] {
        self.rules
            .iter()
            .find(|rule| horizon_years > rule.exceeds_years)
            .map(|rule| rule.categories.as_slice())
            .unwrap_or(&self.short_horizon)
    }
}

/// Category tags identifying the investment style of a line.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleTags {
    pub equity: Vec<String>,
    pub mixed: Vec<String>,
    pub conservative: Vec<String>,
}

/// Stand-ins for missing metrics, applied only while normalizing candidates.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentinels {
    pub missing_cost: f64,
    pub missing_return: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchConfig {
    pub cost_bands: Bands,
    pub return_bands: Bands,
    pub coherence_bands: Bands,
    pub category_risk: CategoryRisk,
    pub ideal_risk: IdealRiskRules,
    pub weights: ShortlistWeights,
    pub eligibility: Eligibility,
    pub style_tags: StyleTags,
    pub sentinels: Sentinels,
    /// Coherence score returned when a product's category is unknown.
    pub neutral_coherence: u8,
    pub default_max_results: usize,
}

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            cost_bands: Bands {
                first: 0.5,
                second: 1.0,
                polarity: Polarity::LowerIsBetter,
            },
            return_bands: Bands {
                first: 3.0,
                second: 1.5,
                polarity: Polarity::HigherIsBetter,
            },
            coherence_bands: Bands {
                first: 75.0,
                second: 50.0,
                polarity: Polarity::HigherIsBetter,
            },
            category_risk: CategoryRisk {
                guaranteed: 10.0,
                bond: 20.0,
                mixed_bond: 35.0,
                balanced: 55.0,
                equity: 85.0,
            },
            ideal_risk: IdealRiskRules {
                horizon_rules: vec![
                    HorizonRule {
                        exceeds_years: 20,
                        ideal_risk: 80.0,
                    },
                    HorizonRule {
                        exceeds_years: 10,
                        ideal_risk: 60.0,
                    },
                    HorizonRule {
                        exceeds_years: 5,
                        ideal_risk: 40.0,
                    },
                ],
                short_horizon: 20.0,
                by_age: AgeRisk {
                    under35: 70.0,
                    from35_to50: 50.0,
                    over50: 30.0,
                },
                default: 50.0,
            },
            weights: ShortlistWeights {
                cost: 0.35,
                returns: 0.35,
                risk_boost_max: 0.15,
                contractual_type_boost: 0.05,
                contractual_category_boost: 0.05,
                age_conservatism: 0.05,
                under35_share: 0.5,
            },
            eligibility: Eligibility {
                rules: vec![
                    EligibilityRule {
                        exceeds_years: 15,
                        categories: tags(&["BIL", "AZN"]),
                    },
                    EligibilityRule {
                        exceeds_years: 5,
                        categories: tags(&["OBM", "BIL"]),
                    },
                ],
                short_horizon: tags(&["GAR", "OBB"]),
            },
            style_tags: StyleTags {
                equity: tags(&["AZN"]),
                mixed: tags(&["BIL", "OBM"]),
                conservative: tags(&["GAR", "OBB"]),
            },
            sentinels: Sentinels {
                missing_cost: 99.0,
                missing_return: -99.0,
            },
            neutral_coherence: 50,
            default_max_results: 5,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid rule set JSON: {0}")]
    Parse(String),
    #[error("{name} cut points are out of order for their polarity")]
    BandOrder { name: &'static str },
    #[error("risk score {value} for {what} is outside 0..=100")]
    RiskOutOfRange { what: String, value: f64 },
    #[error("shortlist weights must be non-negative")]
    NegativeWeight,
    #[error("shortlist weights and boosts sum to {total:.3}, above 1")]
    WeightSum { total: f64 },
    #[error("under35Share must be between 0 and 1")]
    Under35Share,
    #[error("{name} thresholds must be strictly descending")]
    RuleOrder { name: &'static str },
    #[error("eligibility bucket over {exceeds_years} years allows no categories")]
    EmptyBucket { exceeds_years: u32 },
    #[error("eligibility becomes more conservative as the horizon grows past {exceeds_years} years")]
    EligibilityNotMonotone { exceeds_years: u32 },
    #[error("missing-{metric} sentinel must be worse than every band")]
    Sentinel { metric: &'static str },
    #[error("neutral coherence {0} is above 100")]
    NeutralCoherence(u8),
    #[error("default max results must be > 0")]
    MaxResults,
}

impl MatchConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, bands) in [
            ("cost bands", &self.cost_bands),
            ("return bands", &self.return_bands),
            ("coherence bands", &self.coherence_bands),
        ] {
            let ordered = match bands.polarity {
                Polarity::LowerIsBetter => bands.first <= bands.second,
                Polarity::HigherIsBetter => bands.first >= bands.second,
            };
            if !ordered || !bands.first.is_finite() || !bands.second.is_finite() {
                return Err(ConfigError::BandOrder { name });
            }
        }

        for category in Category::ALL {
            check_risk(category.code(), self.category_risk.score(category))?;
        }
        let ideal = &self.ideal_risk;
        for rule in &ideal.horizon_rules {
            check_risk(&format!("horizon > {}y", rule.exceeds_years), rule.ideal_risk)?;
        }
        check_risk("short horizon", ideal.short_horizon)?;
        check_risk("under35", ideal.by_age.under35)?;
        check_risk("35-50", ideal.by_age.from35_to50)?;
        check_risk("over50", ideal.by_age.over50)?;
        check_risk("default", ideal.default)?;
        if !strictly_descending(ideal.horizon_rules.iter().map(|rule| rule.exceeds_years)) {
            return Err(ConfigError::RuleOrder {
                name: "horizon rule",
            });
        }

        let w = &self.weights;
        let parts = [
            w.cost,
            w.returns,
            w.risk_boost_max,
            w.contractual_type_boost,
            w.contractual_category_boost,
            w.age_conservatism,
        ];
        if parts.iter().any(|part| !part.is_finite() || *part < 0.0) {
            return Err(ConfigError::NegativeWeight);
        }
        if w.total() > 1.0 + WEIGHT_EPS {
            return Err(ConfigError::WeightSum { total: w.total() });
        }
        if !(0.0..=1.0).contains(&w.under35_share) {
            return Err(ConfigError::Under35Share);
        }

        self.validate_eligibility()?;

        if self.sentinels.missing_cost.is_nan()
            || self.sentinels.missing_cost <= self.cost_bands.second
        {
            return Err(ConfigError::Sentinel { metric: "cost" });
        }
        if self.sentinels.missing_return.is_nan()
            || self.sentinels.missing_return >= self.return_bands.second
        {
            return Err(ConfigError::Sentinel { metric: "return" });
        }
        if self.neutral_coherence > 100 {
            return Err(ConfigError::NeutralCoherence(self.neutral_coherence));
        }
        if self.default_max_results == 0 {
            return Err(ConfigError::MaxResults);
        }
        Ok(())
    }

    fn validate_eligibility(&self) -> Result<(), ConfigError> {
        let eligibility = &self.eligibility;
        if !strictly_descending(eligibility.rules.iter().map(|rule| rule.exceeds_years)) {
            return Err(ConfigError::RuleOrder {
                name: "eligibility rule",
            });
        }
        if eligibility.short_horizon.is_empty() {
            return Err(ConfigError::EmptyBucket { exceeds_years: 0 });
        }

        let mut previous = self.most_aggressive_risk(&eligibility.short_horizon);
        for rule in eligibility.rules.iter().rev() {
            if rule.categories.is_empty() {
                return Err(ConfigError::EmptyBucket {
                    exceeds_years: rule.exceeds_years,
                });
            }
            let current = self.most_aggressive_risk(&rule.categories);
            if let (Some(prev), Some(cur)) = (previous, current) {
                if cur < prev {
                    return Err(ConfigError::EligibilityNotMonotone {
                        exceeds_years: rule.exceeds_years,
                    });
                }
            }
            previous = current.or(previous);
        }
        Ok(())
    }

    fn most_aggressive_risk(&self, tags: &[String]) -> Option<f64> {
        tags.iter()
            .filter_map(|tag| Category::from_code(tag))
            .map(|category| self.category_risk.score(category))
            .reduce(f64::max)
    }
}

fn check_risk(what: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RiskOutOfRange {
            what: what.to_string(),
            value,
        })
    }
}

fn strictly_descending(mut values: impl Iterator<Item = u32>) -> bool {
    let Some(mut previous) = values.next() else {
        return true;
    };
    for value in values {
        if value >= previous {
            return false;
        }
        previous = value;
    }
    true
}
