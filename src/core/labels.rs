//! Tier labels and display tones for cost, return and coherence figures.

use serde::Serialize;

use super::config::{Bands, MatchConfig, Polarity};

/// Display tier of a metric. `Tier1` is the most favorable.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Tier {
    Tier1,
    Tier2,
    Tier3,
    Unavailable,
}

/// Background and indicator tones used by the dashboard for a tier.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ToneColors {
    pub background: &'static str,
    pub indicator: &'static str,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Metric {
    Cost,
    Return,
    Coherence,
}

pub fn label(metric: Option<f64>, bands: &Bands) -> Tier {
    let Some(value) = metric.filter(|value| !value.is_nan()) else {
        return Tier::Unavailable;
    };
    match bands.polarity {
        Polarity::LowerIsBetter if value <= bands.first => Tier::Tier1,
        Polarity::LowerIsBetter if value <= bands.second => Tier::Tier2,
        Polarity::LowerIsBetter => Tier::Tier3,
        Polarity::HigherIsBetter if value >= bands.first => Tier::Tier1,
        Polarity::HigherIsBetter if value >= bands.second => Tier::Tier2,
        Polarity::HigherIsBetter => Tier::Tier3,
    }
}

pub fn tones(tier: Tier) -> ToneColors {
    match tier {
        Tier::Tier1 => ToneColors {
            background: "#ecfdf5",
            indicator: "#059669",
        },
        Tier::Tier2 => ToneColors {
            background: "#fffbeb",
            indicator: "#d97706",
        },
        Tier::Tier3 => ToneColors {
            background: "#fef2f2",
            indicator: "#dc2626",
        },
        Tier::Unavailable => ToneColors {
            background: "#f3f4f6",
            indicator: "#9ca3af",
        },
    }
}

pub fn tier_text(metric: Metric, tier: Tier) -> &'static str {
    match (metric, tier) {
        (_, Tier::Unavailable) => "not available",
        (Metric::Cost, Tier::Tier1) => "very competitive",
        (Metric::Cost, Tier::Tier2) => "average",
        (Metric::Cost, Tier::Tier3) => "above average",
        (Metric::Return, Tier::Tier1) => "above average",
        (Metric::Return, Tier::Tier2) => "in line",
        (Metric::Return, Tier::Tier3) => "below average",
        (Metric::Coherence, Tier::Tier1) => "high fit",
        (Metric::Coherence, Tier::Tier2) => "partial fit",
        (Metric::Coherence, Tier::Tier3) => "low fit",
    }
}

pub fn label_for_cost(cost: Option<f64>, config: &MatchConfig) -> Tier {
    label(cost, &config.cost_bands)
}

pub fn label_for_return(annual_return: Option<f64>, config: &MatchConfig) -> Tier {
    label(annual_return, &config.return_bands)
}

pub fn label_for_coherence(score: Option<u8>, config: &MatchConfig) -> Tier {
    label(score.map(f64::from), &config.coherence_bands)
}

pub fn tones_for_cost(cost: Option<f64>, config: &MatchConfig) -> ToneColors {
    tones(label_for_cost(cost, config))
}

pub fn tones_for_return(annual_return: Option<f64>, config: &MatchConfig) -> ToneColors {
    tones(label_for_return(annual_return, config))
}

pub fn tones_for_coherence(score: Option<u8>, config: &MatchConfig) -> ToneColors {
    tones(label_for_coherence(score, config))
}

/// Tier, text and tones of one figure, as shown next to it in tables.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct LabeledFigure {
    pub value: Option<f64>,
    pub tier: Tier,
    pub text: &'static str,
    pub tones: ToneColors,
}

impl LabeledFigure {
    pub fn new(metric: Metric, value: Option<f64>, config: &MatchConfig) -> Self {
        let bands = match metric {
            Metric::Cost => &config.cost_bands,
            Metric::Return => &config.return_bands,
            Metric::Coherence => &config.coherence_bands,
        };
        let tier = label(value, bands);
        Self {
            value,
            tier,
            text: tier_text(metric, tier),
            tones: tones(tier),
        }
    }
}
