//! Key-driven ordering for catalog tables.
//!
//! Missing values always sort last, whatever the direction.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::types::Product;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "ascending")]
    Asc,
    #[serde(alias = "descending")]
    Desc,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Name,
    Provider,
    #[serde(rename = "type")]
    ProductType,
    Category,
    Isc2y,
    Isc5y,
    Isc10y,
    Isc35y,
    Return1y,
    Return3y,
    Return5y,
    Return10y,
    Return20y,
}

impl SortKey {
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        let parsed = match key.to_ascii_lowercase().as_str() {
            "name" => SortKey::Name,
            "provider" => SortKey::Provider,
            "type" => SortKey::ProductType,
            "category" => SortKey::Category,
            "isc2y" => SortKey::Isc2y,
            "isc5y" => SortKey::Isc5y,
            "isc10y" => SortKey::Isc10y,
            "isc35y" => SortKey::Isc35y,
            "return1y" => SortKey::Return1y,
            "return3y" => SortKey::Return3y,
            "return5y" => SortKey::Return5y,
            "return10y" => SortKey::Return10y,
            "return20y" => SortKey::Return20y,
            _ => return None,
        };
        Some(parsed)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum SortValue<'a> {
    Number(f64),
    Text(&'a str),
    Missing,
}

fn number(value: Option<f64>) -> SortValue<'static> {
    match value {
        Some(value) if !value.is_nan() => SortValue::Number(value),
        _ => SortValue::Missing,
    }
}

fn text(value: Option<&str>) -> SortValue<'_> {
    match value {
        Some(value) if !value.trim().is_empty() => SortValue::Text(value),
        _ => SortValue::Missing,
    }
}

fn resolve(product: &Product, key: SortKey) -> SortValue<'_> {
    match key {
        SortKey::Name => text(Some(product.name.as_str())),
        SortKey::Provider => text(product.provider.as_deref()),
        SortKey::ProductType => text(Some(product.product_type.code())),
        SortKey::Category => text(product.category_code()),
        SortKey::Isc2y => number(product.costs.isc_2y),
        SortKey::Isc5y => number(product.costs.isc_5y),
        SortKey::Isc10y => number(product.costs.isc_10y),
        SortKey::Isc35y => number(product.costs.isc_35y),
        SortKey::Return1y => number(product.returns.last_1y),
        SortKey::Return3y => number(product.returns.last_3y),
        SortKey::Return5y => number(product.returns.last_5y),
        SortKey::Return10y => number(product.returns.last_10y),
        SortKey::Return20y => number(product.returns.last_20y),
    }
}

/// Case- and accent-insensitive comparison (NFD with combining marks
/// dropped), falling back to the raw text so distinct strings never tie.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    let folded = |s: &str| {
        s.nfd()
            .filter(|c| !is_combining_mark(*c))
            .flat_map(char::to_lowercase)
            .collect::<Vec<char>>()
    };
    folded(a).cmp(&folded(b)).then_with(|| a.cmp(b))
}

pub fn compare_by(a: &Product, b: &Product, key: SortKey, direction: SortDirection) -> Ordering {
    let ordering = match (resolve(a, key), resolve(b, key)) {
        (SortValue::Missing, SortValue::Missing) => return Ordering::Equal,
        (SortValue::Missing, _) => return Ordering::Greater,
        (_, SortValue::Missing) => return Ordering::Less,
        (SortValue::Number(x), SortValue::Number(y)) => x.total_cmp(&y),
        (SortValue::Text(x), SortValue::Text(y)) => compare_text(x, y),
        _ => Ordering::Equal,
    };
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Unknown keys compare as equal.
pub fn compare_by_key(a: &Product, b: &Product, key: &str, direction: SortDirection) -> Ordering {
    match SortKey::parse(key) {
        Some(key) => compare_by(a, b, key, direction),
        None => Ordering::Equal,
    }
}

/// Stable sort of catalog rows; equal rows keep their catalog order.
pub fn sort_catalog<'a>(
    catalog: &'a [Product],
    key: SortKey,
    direction: SortDirection,
) -> Vec<&'a Product> {
    let mut rows: Vec<&Product> = catalog.iter().collect();
    rows.sort_by(|a, b| compare_by(a, b, key, direction));
    rows
}
