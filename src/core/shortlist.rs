//! Horizon-driven candidate filtering and weighted ranking.
//!
//! Ranking uses the 35-year cost indicator and the 10-year annualized return.
//! Missing values are replaced by [`Sentinels`] only while computing the
//! normalization bounds and goodness scores, never earlier.

use serde::Serialize;
use tracing::debug;

use super::config::{MatchConfig, Sentinels, ShortlistWeights, StyleTags};
use super::types::{AgeBracket, Product, Profile, RiskPreference};

/// Investment style of a line, derived from its category tags.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Style {
    Equity,
    Mixed,
    Conservative,
    Unclassified,
}

/// Per-term contributions behind a shortlist score.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub cost_goodness: f64,
    pub return_goodness: f64,
    pub risk_boost: f64,
    pub age_boost: f64,
    pub contractual_type_boost: f64,
    pub contractual_category_boost: f64,
}

impl ScoreBreakdown {
    pub fn total(&self, weights: &ShortlistWeights) -> f64 {
        weights.cost * self.cost_goodness
            + weights.returns * self.return_goodness
            + self.risk_boost
            + self.age_boost
            + self.contractual_type_boost
            + self.contractual_category_boost
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortlistEntry<'a> {
    pub product: &'a Product,
    pub score: f64,
    pub style: Style,
    pub breakdown: ScoreBreakdown,
}

fn contains_tag(category: &str, tag: &str) -> bool {
    !tag.is_empty()
        && category
            .to_ascii_uppercase()
            .contains(&tag.to_ascii_uppercase())
}

fn matches_any(category: Option<&str>, tags: &[String]) -> bool {
    category.is_some_and(|category| tags.iter().any(|tag| contains_tag(category, tag)))
}

pub fn classify_style(category: Option<&str>, tags: &StyleTags) -> Style {
    if matches_any(category, &tags.equity) {
        Style::Equity
    } else if matches_any(category, &tags.mixed) {
        Style::Mixed
    } else if matches_any(category, &tags.conservative) {
        Style::Conservative
    } else {
        Style::Unclassified
    }
}

/// Category allow-list check; tags match as case-insensitive substrings.
pub fn is_category_eligible(product: &Product, allowed: &[String]) -> bool {
    matches_any(product.category_code(), allowed)
}

/// Contractual products survive only when the profile's holdings allow them.
/// Other product types always pass.
pub fn passes_contractual_filter(product: &Product, profile: &Profile) -> bool {
    if !product.product_type.is_contractual() {
        return true;
    }
    match profile.has_fpn {
        Some(false) => false,
        Some(true) => match profile.held_fpn_category() {
            Some(category) => product.has_contractual_tag(category),
            None => true,
        },
        None => true,
    }
}

/// Products eligible for `profile`, in catalog order. Empty without a horizon.
pub fn eligible_candidates<'a>(
    catalog: &'a [Product],
    profile: &Profile,
    config: &MatchConfig,
) -> Vec<&'a Product> {
    let Some(horizon) = profile.horizon_years else {
        return Vec::new();
    };
    let allowed = config.eligibility.allowed_for(horizon);
    catalog
        .iter()
        .filter(|product| is_category_eligible(product, allowed))
        .filter(|product| passes_contractual_filter(product, profile))
        .collect()
}

fn ranking_cost(product: &Product, sentinels: &Sentinels) -> f64 {
    product.costs.isc_35y.unwrap_or(sentinels.missing_cost)
}

fn ranking_return(product: &Product, sentinels: &Sentinels) -> f64 {
    product.returns.last_10y.unwrap_or(sentinels.missing_return)
}

/// Observed range of a metric across the candidate set.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, value| match acc {
            None => Some(Self {
                min: value,
                max: value,
            }),
            Some(bounds) => Some(Self {
                min: bounds.min.min(value),
                max: bounds.max.max(value),
            }),
        })
    }

    /// 1.0 at `min`, 0.0 at `max`; 0.5 when the range is empty.
    pub fn lower_is_better(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.5;
        }
        (self.max - value) / span
    }

    /// 1.0 at `max`, 0.0 at `min`; 0.5 when the range is empty.
    pub fn higher_is_better(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.5;
        }
        (value - self.min) / span
    }
}

pub fn risk_appetite(preference: Option<RiskPreference>) -> f64 {
    match preference {
        Some(RiskPreference::Low) => 0.0,
        Some(RiskPreference::Medium) | None => 0.5,
        Some(RiskPreference::High) => 1.0,
    }
}

/// Centered on zero, bounded by `weights.risk_boost_max` either way.
pub fn risk_boost(
    style: Style,
    preference: Option<RiskPreference>,
    weights: &ShortlistWeights,
) -> f64 {
    let appetite = risk_appetite(preference);
    let alignment = match style {
        Style::Equity => appetite,
        Style::Conservative => 1.0 - appetite,
        Style::Mixed | Style::Unclassified => 0.5,
    };
    (alignment - 0.5) * 2.0 * weights.risk_boost_max
}

pub fn age_boost(style: Style, age: Option<AgeBracket>, weights: &ShortlistWeights) -> f64 {
    match (style, age) {
        (Style::Equity, Some(AgeBracket::Over50)) => -weights.age_conservatism,
        (Style::Equity, Some(AgeBracket::Under35)) => {
            weights.age_conservatism * weights.under35_share
        }
        _ => 0.0,
    }
}

pub fn contractual_type_boost(
    product: &Product,
    profile: &Profile,
    weights: &ShortlistWeights,
) -> f64 {
    if profile.has_fpn == Some(true) && product.product_type.is_contractual() {
        weights.contractual_type_boost
    } else {
        0.0
    }
}

/// Extra to [`contractual_type_boost`]: only FPN lines tagged with the held category.
pub fn contractual_category_boost(
    product: &Product,
    profile: &Profile,
    weights: &ShortlistWeights,
) -> f64 {
    if !product.product_type.is_contractual() {
        return 0.0;
    }
    match profile.held_fpn_category() {
        Some(category) if product.has_contractual_tag(category) => {
            weights.contractual_category_boost
        }
        _ => 0.0,
    }
}

/// Ranks the eligible products for `profile`, best first.
///
/// Returns an empty list when the profile has no horizon. Ties keep catalog
/// order. Cost and return bounds come from the filtered candidates, so the
/// same product can normalize differently under different horizons.
pub fn compute_shortlist<'a>(
    catalog: &'a [Product],
    profile: &Profile,
    config: &MatchConfig,
    max_results: usize,
) -> Vec<ShortlistEntry<'a>> {
    let candidates = eligible_candidates(catalog, profile, config);
    debug!(
        catalog = catalog.len(),
        eligible = candidates.len(),
        horizon = ?profile.horizon_years,
        "shortlist candidates filtered"
    );

    let sentinels = &config.sentinels;
    let (Some(cost_bounds), Some(return_bounds)) = (
        Bounds::of(candidates.iter().map(|p| ranking_cost(p, sentinels))),
        Bounds::of(candidates.iter().map(|p| ranking_return(p, sentinels))),
    ) else {
        return Vec::new();
    };

    let weights = &config.weights;
    let mut entries: Vec<ShortlistEntry<'a>> = candidates
        .into_iter()
        .map(|product| {
            let style = classify_style(product.category_code(), &config.style_tags);
            let breakdown = ScoreBreakdown {
                cost_goodness: cost_bounds.lower_is_better(ranking_cost(product, sentinels)),
                return_goodness: return_bounds
                    .higher_is_better(ranking_return(product, sentinels)),
                risk_boost: risk_boost(style, profile.risk_preference, weights),
                age_boost: age_boost(style, profile.age_bracket, weights),
                contractual_type_boost: contractual_type_boost(product, profile, weights),
                contractual_category_boost: contractual_category_boost(
                    product, profile, weights,
                ),
            };
            ShortlistEntry {
                product,
                score: breakdown.total(weights),
                style,
                breakdown,
            }
        })
        .collect();

    entries.sort_by(|a, b| b.score.total_cmp(&a.score));
    entries.truncate(max_results);
    entries
}
