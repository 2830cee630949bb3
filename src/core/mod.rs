mod catalog;
mod coherence;
mod config;
mod labels;
mod shortlist;
mod sort;
mod types;

pub use catalog::{Catalog, CatalogError};
pub use coherence::{IdealRisk, IdealRiskSource, coherence_from_risks, ideal_risk, score_coherence};
pub use config::{
    AgeRisk, Bands, CategoryRisk, ConfigError, Eligibility, EligibilityRule, HorizonRule,
    IdealRiskRules, MatchConfig, Polarity, Sentinels, ShortlistWeights, StyleTags,
};
pub use labels::{
    LabeledFigure, Metric, Tier, ToneColors, label, label_for_coherence, label_for_cost,
    label_for_return, tier_text, tones, tones_for_coherence, tones_for_cost, tones_for_return,
};
pub use shortlist::{
    Bounds, ScoreBreakdown, ShortlistEntry, Style, age_boost, classify_style, compute_shortlist,
    contractual_category_boost, contractual_type_boost, eligible_candidates, is_category_eligible,
    passes_contractual_filter, risk_appetite, risk_boost,
};
pub use sort::{SortDirection, SortKey, compare_by, compare_by_key, compare_text, sort_catalog};
pub use types::{
    AgeBracket, Category, CostIndicators, HistoricalReturns, Product, ProductType, Profile,
    RiskPreference, WorkerKind,
};

use serde::Serialize;

/// Coherence score together with what produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoherenceReport {
    pub score: u8,
    pub category: Option<Category>,
    pub product_risk: Option<f64>,
    pub ideal_risk: Option<IdealRisk>,
    pub label: LabeledFigure,
}

/// Stateless matcher bound to one rule set.
#[derive(Debug, Clone, Default)]
pub struct MatchEngine {
    config: MatchConfig,
}

impl MatchEngine {
    pub fn new(config: MatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn coherence(&self, category: Option<&str>, profile: &Profile) -> u8 {
        score_coherence(category, profile, &self.config)
    }

    pub fn explain_coherence(&self, category: Option<&str>, profile: &Profile) -> CoherenceReport {
        let score = self.coherence(category, profile);
        let parsed = category.and_then(Category::from_code);
        let scored = parsed.is_some() && profile.has_risk_inputs();
        CoherenceReport {
            score,
            category: parsed,
            product_risk: parsed.map(|category| self.config.category_risk.score(category)),
            ideal_risk: scored.then(|| ideal_risk(profile, &self.config.ideal_risk)),
            label: LabeledFigure::new(Metric::Coherence, Some(f64::from(score)), &self.config),
        }
    }

    /// Uses the configured default when `max_results` is `None`.
    pub fn shortlist<'a>(
        &self,
        catalog: &'a [Product],
        profile: &Profile,
        max_results: Option<usize>,
    ) -> Vec<ShortlistEntry<'a>> {
        let max_results = max_results.unwrap_or(self.config.default_max_results);
        compute_shortlist(catalog, profile, &self.config, max_results)
    }

    pub fn cost_label(&self, cost: Option<f64>) -> LabeledFigure {
        LabeledFigure::new(Metric::Cost, cost, &self.config)
    }

    pub fn return_label(&self, annual_return: Option<f64>) -> LabeledFigure {
        LabeledFigure::new(Metric::Return, annual_return, &self.config)
    }
}
