//! Read-side figures derived from raw market totals. Nothing here is stored;
//! odds and summaries are recomputed from the current totals on every read.

use serde::{Deserialize, Serialize};

use crate::types::market_types::{Market, DEFAULT_CATEGORY, LAMPORTS_PER_SOL, SECONDS_PER_DAY};

/// Markets with more than this much volume are flagged as featured.
pub const FEATURED_VOLUME_LAMPORTS: u64 = 5 * LAMPORTS_PER_SOL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOdds {
    pub yes_percent: u8,
    pub no_percent: u8,
}

impl MarketOdds {
    /// Whole-percent odds, rounded half up; an empty market is 50/50.
    pub fn from_totals(total_yes: u64, total_no: u64) -> Self {
        let total = total_yes as u128 + total_no as u128;
        if total == 0 {
            return Self {
                yes_percent: 50,
                no_percent: 50,
            };
        }
        let yes = ((total_yes as u128 * 200 + total) / (total * 2)) as u8;
        Self {
            yes_percent: yes,
            no_percent: 100 - yes,
        }
    }

    pub fn of(market: &Market) -> Self {
        Self::from_totals(market.total_yes_bets, market.total_no_bets)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub id: String,
    pub question: String,
    pub category: String,
    pub odds: MarketOdds,
    pub volume: String,
    pub ends_in: String,
    pub featured: bool,
}

impl MarketSummary {
    pub fn of(market: &Market, now: i64) -> Self {
        let volume = market.total_volume();
        let category = if market.category.is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            market.category.clone()
        };
        Self {
            id: market.id.clone(),
            question: market.question.clone(),
            category,
            odds: MarketOdds::of(market),
            volume: format_sol(volume),
            ends_in: ends_in(market.resolution_date, now),
            featured: volume > FEATURED_VOLUME_LAMPORTS,
        }
    }
}

pub fn format_sol(lamports: u64) -> String {
    format!("{:.2} SOL", lamports as f64 / LAMPORTS_PER_SOL as f64)
}

/// Time left until `resolution_date`, e.g. `"7 days"`, `"1 day"`, `"2 years"`.
pub fn ends_in(resolution_date: i64, now: i64) -> String {
    let remaining = resolution_date - now;
    // ceil for positive spans; integer division already rounds negatives up
    let days = if remaining > 0 {
        (remaining + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
    } else {
        remaining / SECONDS_PER_DAY
    };

    if days > 365 {
        let years = (days * 2 + 365) / 730;
        let suffix = if days > 730 { "s" } else { "" };
        format!("{} year{}", years, suffix)
    } else {
        let suffix = if days != 1 { "s" } else { "" };
        format!("{} day{}", days, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::market_types::{MarketOutcome, MarketStatus};

    #[test]
    fn odds_follow_totals() {
        let odds = MarketOdds::from_totals(7_000_000_000, 3_000_000_000);
        assert_eq!(odds.yes_percent, 70);
        assert_eq!(odds.no_percent, 30);
    }

    #[test]
    fn empty_market_is_even() {
        assert_eq!(
            MarketOdds::from_totals(0, 0),
            MarketOdds {
                yes_percent: 50,
                no_percent: 50
            }
        );
    }

    #[test]
    fn odds_round_half_up_and_sum_to_hundred() {
        let odds = MarketOdds::from_totals(1, 7);
        // 12.5% rounds to 13
        assert_eq!(odds.yes_percent, 13);
        assert_eq!(odds.no_percent, 87);
        let odds = MarketOdds::from_totals(2, 1);
        assert_eq!(odds.yes_percent + odds.no_percent, 100);
    }

    #[test]
    fn ends_in_counts_days_and_years() {
        let now = 1_000_000;
        assert_eq!(ends_in(now + 7 * SECONDS_PER_DAY, now), "7 days");
        assert_eq!(ends_in(now + 1, now), "1 day");
        assert_eq!(ends_in(now + 400 * SECONDS_PER_DAY, now), "1 year");
        assert_eq!(ends_in(now + 800 * SECONDS_PER_DAY, now), "2 years");
    }

    #[test]
    fn summary_formats_volume_and_featured_flag() {
        let market = Market {
            id: "m".into(),
            question: "q".into(),
            category: String::new(),
            resolution_date: 10 * SECONDS_PER_DAY,
            status: MarketStatus::Active,
            outcome: MarketOutcome::Pending,
            total_yes_bets: 4_000_000_000,
            total_no_bets: 2_500_000_000,
            created_at: 0,
            resolved_at: None,
        };
        let summary = MarketSummary::of(&market, 0);
        assert_eq!(summary.volume, "6.50 SOL");
        assert_eq!(summary.category, DEFAULT_CATEGORY);
        assert_eq!(summary.ends_in, "10 days");
        assert!(summary.featured);
        assert_eq!(summary.odds.yes_percent, 62);
    }
}
