//! Price-based wardrobe classification.
//!
//! Two independent schemes live here: [`PriceStats`] buckets a user's mean
//! price into a five-step [`SocialStatus`], while [`PriceTiers`] counts each
//! item into one of three fixed price bands. They answer different
//! questions and are kept separate.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

/// Leading decimal literal of a stored price. `"25.5 EUR"` gives 25.5,
/// `"N/A"` and `""` give `None`, as do non-finite values.
pub fn parse_price(raw: &str) -> Option<f64> {
    lazy_static! {
        static ref LEADING_NUMBER: Regex =
            Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").unwrap();
    }
    let m = LEADING_NUMBER.find(raw.trim_start())?;
    m.as_str().parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Parsed prices of the items that have one.
pub fn valid_prices<'a, I>(prices: I) -> Vec<f64>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    prices.into_iter().flatten().filter_map(parse_price).collect()
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SocialStatus {
    #[serde(rename = "No Data")]
    NoData,
    #[serde(rename = "Budget-Conscious")]
    BudgetConscious,
    #[serde(rename = "Middle Class")]
    MiddleClass,
    #[serde(rename = "Upper Middle Class")]
    UpperMiddleClass,
    #[serde(rename = "Affluent")]
    Affluent,
    #[serde(rename = "High Net Worth")]
    HighNetWorth,
}

impl SocialStatus {
    pub fn classify(count: usize, mean: f64) -> Self {
        match mean {
            _ if count == 0 => Self::NoData,
            m if m < 30.0 => Self::BudgetConscious,
            m if m < 60.0 => Self::MiddleClass,
            m if m < 100.0 => Self::UpperMiddleClass,
            m if m < 200.0 => Self::Affluent,
            _ => Self::HighNetWorth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStats {
    /// Items with a parseable price, not all items.
    pub total_items: usize,
    pub total_price: f64,
    pub average_price: f64,
    pub social_status: SocialStatus,
}

impl PriceStats {
    pub fn from_prices(prices: &[f64]) -> Self {
        let count = prices.len();
        let total: f64 = prices.iter().sum();
        let mean = if count > 0 { total / count as f64 } else { 0.0 };
        Self {
            total_items: count,
            total_price: round_to(total, 2),
            average_price: round_to(mean, 2),
            social_status: SocialStatus::classify(count, mean),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierCounts {
    pub budget: usize,
    pub mid_range: usize,
    pub premium: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierPercentages {
    pub budget: f64,
    pub mid_range: f64,
    pub premium: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTiers {
    pub total_items: usize,
    pub tiers: TierCounts,
    pub percentages: TierPercentages,
}

impl PriceTiers {
    /// Under 30 is budget, up to and including 100 is mid-range, the rest
    /// premium.
    pub fn from_prices(prices: &[f64]) -> Self {
        let mut tiers = TierCounts::default();
        for &p in prices {
            if p < 30.0 {
                tiers.budget += 1;
            } else if p <= 100.0 {
                tiers.mid_range += 1;
            } else {
                tiers.premium += 1;
            }
        }

        let total = prices.len();
        let share = |n: usize| round_to(n as f64 / total as f64 * 100.0, 1);
        let percentages = if total > 0 {
            TierPercentages {
                budget: share(tiers.budget),
                mid_range: share(tiers.mid_range),
                premium: share(tiers.premium),
            }
        } else {
            TierPercentages::default()
        };

        Self {
            total_items: total,
            tiers,
            percentages,
        }
    }
}
