//! Category groups and categories

use serde::{Deserialize, Serialize};

/// Name of the destination's built-in income category
pub const INCOME_CATEGORY_NAME: &str = "Income";

/// A Financier master category, mapped onto an Actual category group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGroup {
    pub id: String,
    pub name: String,
    #[serde(skip)]
    pub source_id: String,
}

/// A category ready to be created in the destination
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Provisional group id at mapping time, rewritten before creation
    pub group_id: String,
    #[serde(skip)]
    pub source_id: String,
}

/// A category as listed back by the destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub is_income: bool,
}
