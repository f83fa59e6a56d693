use crate::error::{StoreError, StoreResult};
use crate::types::bet_types::Bet;
use crate::types::market_types::Market;

/// Records that can be filtered by a query expression.
pub trait Queryable {
    /// Canonical field names: lowercase with underscores removed.
    const FIELDS: &'static [&'static str];

    fn field_value(&self, field: &str) -> Option<String>;
}

impl Queryable for Market {
    const FIELDS: &'static [&'static str] = &[
        "id",
        "question",
        "category",
        "resolutiondate",
        "status",
        "outcome",
        "totalyesbets",
        "totalnobets",
    ];

    fn field_value(&self, field: &str) -> Option<String> {
        let value = match field {
            "id" => self.id.clone(),
            "question" => self.question.clone(),
            "category" => self.category.clone(),
            "resolutiondate" => self.resolution_date.to_string(),
            "status" => self.status.as_str().to_string(),
            "outcome" => self.outcome.as_str().to_string(),
            "totalyesbets" => self.total_yes_bets.to_string(),
            "totalnobets" => self.total_no_bets.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

impl Queryable for Bet {
    const FIELDS: &'static [&'static str] =
        &["id", "marketid", "bettor", "position", "amount", "resolved"];

    fn field_value(&self, field: &str) -> Option<String> {
        let value = match field {
            "id" => self.id.clone(),
            "marketid" => self.market_id.clone(),
            "bettor" => self.bettor.clone(),
            "position" => self.position.as_str().to_string(),
            "amount" => self.amount.to_string(),
            "resolved" => self.resolved.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field: String,
    pub value: String,
}

/// Parsed `field=value ... limit N` expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub conditions: Vec<Condition>,
    pub limit: Option<usize>,
}

fn canonical_field(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn parse(expression: &str) -> StoreResult<Self> {
        let mut query = Query::default();
        let mut tokens = expression.split_whitespace();

        while let Some(token) = tokens.next() {
            if token == "*" || token.eq_ignore_ascii_case("and") {
                continue;
            }

            if token.eq_ignore_ascii_case("limit") {
                if query.limit.is_some() {
                    return Err(StoreError::validation("limit given more than once"));
                }
                let raw = tokens
                    .next()
                    .ok_or_else(|| StoreError::validation("limit requires a number"))?;
                let limit = raw
                    .parse::<usize>()
                    .map_err(|_| StoreError::validation(format!("invalid limit '{}'", raw)))?;
                query.limit = Some(limit);
                continue;
            }

            let Some((field, value)) = token.split_once('=') else {
                return Err(StoreError::validation(format!(
                    "expected field=value, got '{}'",
                    token
                )));
            };
            if field.is_empty() || value.is_empty() {
                return Err(StoreError::validation(format!("incomplete condition '{}'", token)));
            }
            query.conditions.push(Condition {
                field: canonical_field(field),
                value: value.to_string(),
            });
        }

        Ok(query)
    }

    /// Parses and checks every condition names a field of `T`.
    pub fn parse_for<T: Queryable>(expression: &str) -> StoreResult<Self> {
        let query = Self::parse(expression)?;
        if let Some(unknown) = query
            .conditions
            .iter()
            .find(|c| !T::FIELDS.contains(&c.field.as_str()))
        {
            return Err(StoreError::validation(format!("unknown field '{}'", unknown.field)));
        }
        Ok(query)
    }

    pub fn matches<T: Queryable>(&self, record: &T) -> bool {
        self.conditions
            .iter()
            .all(|c| record.field_value(&c.field).as_deref() == Some(c.value.as_str()))
    }

    /// Filters `records` in iteration order and applies the limit.
    pub fn select<'a, T, I>(&self, records: I) -> Vec<T>
    where
        T: Queryable + Clone + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let limit = self.limit.unwrap_or(usize::MAX);
        records
            .into_iter()
            .filter(|r| self.matches(*r))
            .take(limit)
            .cloned()
            .collect()
    }
}
