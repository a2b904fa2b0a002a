//! Monthly budget allocations

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::source::SourceMonthCategory;

/// One month's allocation for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetMonthEntry {
    /// `YYYY-MM`
    pub month: String,
    /// Category id; provisional until the budget stage resolves it
    pub category: String,
    pub amount: i64,
    pub carryover: bool,
}

/// Parser for month-category ids: `<budget>_m_category_YYYY-MM-DD_<category>`
pub struct MonthCategoryParser {
    pattern: Regex,
}

impl MonthCategoryParser {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(r"^.+_m_category_(\d{4}-\d{2})-(\d{2})_([^_]+)$")
            .map_err(|e| Error::mapping(format!("invalid month-category pattern: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Split a month-category id into (`YYYY-MM`, category id).
    ///
    /// The day is checked for validity and then dropped.
    pub fn parse<'a>(&self, id: &'a str) -> Result<(String, &'a str)> {
        let caps = self
            .pattern
            .captures(id)
            .ok_or_else(|| Error::mapping(format!("malformed month-category id '{}'", id)))?;

        let (Some(month), Some(day), Some(category)) = (caps.get(1), caps.get(2), caps.get(3))
        else {
            return Err(Error::mapping(format!("malformed month-category id '{}'", id)));
        };

        let date = format!("{}-{}", month.as_str(), day.as_str());
        NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|_| Error::mapping(format!("invalid date '{}' in '{}'", date, id)))?;

        Ok((month.as_str().to_string(), category.as_str()))
    }

    /// Build the entry for one month-category record
    pub fn entry(&self, record: &SourceMonthCategory) -> Result<BudgetMonthEntry> {
        let (month, category) = self.parse(&record.id)?;
        Ok(BudgetMonthEntry {
            month,
            category: category.to_string(),
            amount: record.budget.unwrap_or(0),
            carryover: matches!(record.overspending, Some(serde_json::Value::Bool(true))),
        })
    }
}
