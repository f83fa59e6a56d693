use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{StoreError, StoreResult};

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;
pub const SECONDS_PER_DAY: i64 = 86_400;
pub const DEFAULT_CATEGORY: &str = "General";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub id: String,
    pub question: String,
    pub category: String,
    pub resolution_date: i64,
    pub status: MarketStatus,
    pub outcome: MarketOutcome,
    pub total_yes_bets: u64,
    pub total_no_bets: u64,
    pub created_at: i64,
    pub resolved_at: Option<i64>,
}

impl Market {
    pub fn is_active(&self) -> bool {
        self.status == MarketStatus::Active
    }

    pub fn total_volume(&self) -> u64 {
        self.total_yes_bets.saturating_add(self.total_no_bets)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MarketStatus {
    Active,
    Resolved,
}

impl MarketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketStatus::Active => "active",
            MarketStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MarketOutcome {
    Pending,
    Yes,
    No,
    Cancelled,
}

impl MarketOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketOutcome::Pending => "pending",
            MarketOutcome::Yes => "yes",
            MarketOutcome::No => "no",
            MarketOutcome::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, MarketOutcome::Pending)
    }
}

impl fmt::Display for MarketOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for creating a market with a store-assigned id.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewMarket {
    pub question: String,
    pub category: String,
    pub resolution_date: i64,
}

impl NewMarket {
    pub fn new(
        question: impl Into<String>,
        category: impl Into<String>,
        resolution_date: i64,
    ) -> Self {
        Self {
            question: question.into(),
            category: category.into(),
            resolution_date,
        }
    }

    /// Builds a market resolving `days` whole days after `now`.
    pub fn resolving_in_days(
        question: impl Into<String>,
        category: impl Into<String>,
        days: i64,
        now: i64,
    ) -> StoreResult<Self> {
        if days <= 0 {
            return Err(StoreError::validation(format!(
                "days until resolution must be positive, got {}",
                days
            )));
        }
        let offset = days
            .checked_mul(SECONDS_PER_DAY)
            .and_then(|secs| now.checked_add(secs))
            .ok_or_else(|| StoreError::validation("days until resolution is out of range"))?;
        Ok(Self::new(question, category, offset))
    }

    /// Trims the question, defaults the category and checks the resolution date.
    pub(crate) fn normalized(self, now: i64) -> StoreResult<Self> {
        let question = self.question.trim().to_string();
        if question.is_empty() {
            return Err(StoreError::validation("question must not be empty"));
        }
        if self.resolution_date <= now {
            return Err(StoreError::validation(format!(
                "resolution date {} is not in the future",
                self.resolution_date
            )));
        }
        let category = match self.category.trim() {
            "" => DEFAULT_CATEGORY.to_string(),
            c => c.to_string(),
        };
        Ok(Self {
            question,
            category,
            resolution_date: self.resolution_date,
        })
    }
}

/// Full market payload for the id-addressed create, mirroring the record an
/// admin client writes: status, outcome and totals must carry initial values.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MarketRecord {
    pub question: String,
    pub category: String,
    pub resolution_date: i64,
    #[serde(default = "default_status")]
    pub status: MarketStatus,
    #[serde(default = "default_outcome")]
    pub outcome: MarketOutcome,
    #[serde(default)]
    pub total_yes_bets: u64,
    #[serde(default)]
    pub total_no_bets: u64,
}

fn default_status() -> MarketStatus {
    MarketStatus::Active
}

fn default_outcome() -> MarketOutcome {
    MarketOutcome::Pending
}

impl MarketRecord {
    pub(crate) fn into_new_market(self) -> StoreResult<NewMarket> {
        if self.status != MarketStatus::Active || self.outcome != MarketOutcome::Pending {
            return Err(StoreError::validation(
                "new markets must start active with a pending outcome",
            ));
        }
        if self.total_yes_bets != 0 || self.total_no_bets != 0 {
            return Err(StoreError::validation("new markets must start with zero totals"));
        }
        Ok(NewMarket::new(self.question, self.category, self.resolution_date))
    }
}

/// Partial update; `None` leaves the field untouched.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct MarketPatch {
    pub question: Option<String>,
    pub category: Option<String>,
    pub resolution_date: Option<i64>,
    pub status: Option<MarketStatus>,
    pub outcome: Option<MarketOutcome>,
}

impl MarketPatch {
    pub fn resolve(outcome: MarketOutcome) -> Self {
        Self {
            status: Some(MarketStatus::Resolved),
            outcome: Some(outcome),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.question.is_none()
            && self.category.is_none()
            && self.resolution_date.is_none()
            && self.status.is_none()
            && self.outcome.is_none()
    }
}
