use serde::{Deserialize, Serialize};

/// Legal wrapper of a pension product.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum ProductType {
    /// Contractual fund negotiated for an employer or worker category.
    #[serde(rename = "FPN", alias = "fpn")]
    Fpn,
    /// Open fund, available to anyone.
    #[serde(rename = "FPA", alias = "fpa")]
    Fpa,
    /// Individual insurance-based plan.
    #[serde(rename = "PIP", alias = "pip")]
    Pip,
}

impl ProductType {
    pub fn code(self) -> &'static str {
        match self {
            ProductType::Fpn => "FPN",
            ProductType::Fpa => "FPA",
            ProductType::Pip => "PIP",
        }
    }

    pub fn is_contractual(self) -> bool {
        self == ProductType::Fpn
    }
}

/// Investment line category, ordered from the most conservative to the most aggressive.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub enum Category {
    #[serde(rename = "GAR")]
    Guaranteed,
    #[serde(rename = "OBB")]
    Bond,
    #[serde(rename = "OBM")]
    MixedBond,
    #[serde(rename = "BIL")]
    Balanced,
    #[serde(rename = "AZN")]
    Equity,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Guaranteed,
        Category::Bond,
        Category::MixedBond,
        Category::Balanced,
        Category::Equity,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Category::Guaranteed => "GAR",
            Category::Bond => "OBB",
            Category::MixedBond => "OBM",
            Category::Balanced => "BIL",
            Category::Equity => "AZN",
        }
    }

    /// Resolves a catalog category code. Codes are matched exactly, ignoring
    /// case and surrounding whitespace; anything else is unknown.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.code().eq_ignore_ascii_case(code))
    }
}

/// Synthetic cost indicator (ISC) in percent at each holding period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CostIndicators {
    pub isc_2y: Option<f64>,
    pub isc_5y: Option<f64>,
    pub isc_10y: Option<f64>,
    pub isc_35y: Option<f64>,
}

/// Annualized returns in percent over each lookback window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistoricalReturns {
    pub last_1y: Option<f64>,
    pub last_3y: Option<f64>,
    pub last_5y: Option<f64>,
    pub last_10y: Option<f64>,
    pub last_20y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    #[serde(default)]
    pub provider: Option<String>,
    /// Raw category code as published; may carry variants of the known codes.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub costs: CostIndicators,
    #[serde(default)]
    pub returns: HistoricalReturns,
    /// Comma-separated worker categories a contractual fund is open to.
    #[serde(default)]
    pub contractual_categories: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

impl Product {
    pub fn category_code(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Trimmed, non-empty entries of `contractual_categories`.
    pub fn contractual_tags(&self) -> impl Iterator<Item = &str> {
        self.contractual_categories
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
    }

    pub fn has_contractual_tag(&self, wanted: &str) -> bool {
        let wanted = wanted.trim();
        !wanted.is_empty()
            && self
                .contractual_tags()
                .any(|tag| tag.eq_ignore_ascii_case(wanted))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub enum AgeBracket {
    #[serde(rename = "under35", alias = "under-35", alias = "under_35")]
    Under35,
    #[serde(rename = "35-50", alias = "from35To50", alias = "35_50")]
    From35To50,
    #[serde(rename = "over50", alias = "over-50", alias = "over_50")]
    Over50,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskPreference {
    Low,
    Medium,
    High,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkerKind {
    #[serde(alias = "employee_private", alias = "privateEmployee")]
    Employee,
    #[serde(alias = "public_employee", alias = "publicEmployee")]
    PublicEmployee,
    #[serde(alias = "self_employed", alias = "selfEmployed")]
    SelfEmployed,
    Other,
}

/// Partially known user profile. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profile {
    pub age_bracket: Option<AgeBracket>,
    pub horizon_years: Option<u32>,
    pub risk_preference: Option<RiskPreference>,
    pub has_fpn: Option<bool>,
    pub fpn_category: Option<String>,
    pub worker_kind: Option<WorkerKind>,
    /// Informational only; not used by any score.
    pub monthly_contribution: Option<f64>,
}

impl Profile {
    /// True when no field has been filled in yet.
    pub fn is_empty(&self) -> bool {
        self.age_bracket.is_none()
            && self.horizon_years.is_none()
            && self.risk_preference.is_none()
            && self.has_fpn.is_none()
            && self.fpn_category.is_none()
            && self.worker_kind.is_none()
            && self.monthly_contribution.is_none()
    }

    /// Whether anything that drives the ideal risk (horizon or age) is known.
    pub fn has_risk_inputs(&self) -> bool {
        self.horizon_years.is_some() || self.age_bracket.is_some()
    }

    /// The stated contractual category, when the profile holds a contractual fund.
    pub fn held_fpn_category(&self) -> Option<&str> {
        if self.has_fpn != Some(true) {
            return None;
        }
        self.fpn_category
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
    }
}
