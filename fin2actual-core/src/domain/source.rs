//! Financier export records
//!
//! The export is an untyped list of CouchDB documents whose kind is only
//! encoded in the `_id`. Each document is classified exactly once here and
//! deserialized into a typed record; nothing downstream looks at the id
//! string to decide what a record is.

use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

use crate::domain::result::{Error, Result};

/// A source field that may be missing, explicitly `null`, or set
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field<T> {
    #[default]
    Absent,
    Null,
    Present(T),
}

impl<T> Field<T> {
    /// The value, if one was given
    pub fn present(self) -> Option<T> {
        match self {
            Field::Present(v) => Some(v),
            Field::Absent | Field::Null => None,
        }
    }

    pub fn as_present(&self) -> Option<&T> {
        match self {
            Field::Present(v) => Some(v),
            Field::Absent | Field::Null => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Field::Present(_))
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // Missing keys never reach here; they take the `#[serde(default)]` path.
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Field::Present(v),
            None => Field::Null,
        })
    }
}

/// Document kind, decided by the tag embedded in `_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Account,
    CategoryGroup,
    Category,
    MonthCategory,
    Payee,
    Transaction,
    Other,
}

impl RecordKind {
    /// Classify a composite id.
    ///
    /// `_m_category_` contains `_category_`, so it has to be tested first.
    pub fn from_id(id: &str) -> Self {
        if id.contains("_m_category_") {
            RecordKind::MonthCategory
        } else if id.contains("_master-category_") {
            RecordKind::CategoryGroup
        } else if id.contains("_category_") {
            RecordKind::Category
        } else if id.contains("_account_") {
            RecordKind::Account
        } else if id.contains("_payee_") {
            RecordKind::Payee
        } else if id.contains("_transaction_") {
            RecordKind::Transaction
        } else {
            RecordKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Account => "account",
            RecordKind::CategoryGroup => "master-category",
            RecordKind::Category => "category",
            RecordKind::MonthCategory => "month-category",
            RecordKind::Payee => "payee",
            RecordKind::Transaction => "transaction",
            RecordKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceAccount {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub closed: Option<bool>,
    #[serde(default)]
    pub on_budget: Option<bool>,
    #[serde(default)]
    pub sort: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceCategoryGroup {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sort: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCategory {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Canonical id of the owning master category
    #[serde(default)]
    pub master_category: Option<String>,
    #[serde(default)]
    pub sort: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceMonthCategory {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub budget: Option<i64>,
    /// Kept raw: only a literal `true` turns carryover on
    #[serde(default)]
    pub overspending: Option<JsonValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcePayee {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sort: Option<f64>,
}

/// A top-level transaction document
#[derive(Debug, Clone, Deserialize)]
pub struct SourceTransaction {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub account: Field<String>,
    #[serde(default)]
    pub category: Field<String>,
    #[serde(default)]
    pub memo: Field<String>,
    #[serde(default)]
    pub cleared: Option<bool>,
    #[serde(default)]
    pub payee: Field<String>,
    #[serde(default)]
    pub transfer: Field<String>,
    #[serde(default)]
    pub splits: Option<Vec<SourceSplit>>,
}

/// A split embedded in a transaction; carries a bare id, not a composite one.
/// Splits always belong to their parent's account, so any `account` on a
/// split is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSplit {
    pub id: String,
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub category: Field<String>,
    #[serde(default)]
    pub memo: Field<String>,
    #[serde(default)]
    pub payee: Field<String>,
    #[serde(default)]
    pub transfer: Field<String>,
    #[serde(default)]
    pub splits: Option<Vec<SourceSplit>>,
}

/// The category slot of a transaction or split
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionCategory {
    /// `"split"`: the transaction is a container for its splits
    Split,
    /// `"income"`
    Income,
    /// `"incomeNextMonth"`
    IncomeNextMonth,
    /// Canonical id of a regular category
    Category(String),
}

impl TransactionCategory {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "split" => TransactionCategory::Split,
            "income" => TransactionCategory::Income,
            "incomeNextMonth" => TransactionCategory::IncomeNextMonth,
            other => TransactionCategory::Category(other.to_string()),
        }
    }
}

/// One classified export document
#[derive(Debug, Clone)]
pub enum SourceRecord {
    Account(SourceAccount),
    CategoryGroup(SourceCategoryGroup),
    Category(SourceCategory),
    MonthCategory(SourceMonthCategory),
    Payee(SourcePayee),
    Transaction(SourceTransaction),
    Other { id: String },
}

impl SourceRecord {
    /// Classify and deserialize one export document
    pub fn parse(value: JsonValue) -> Result<Self> {
        let id = value
            .get("_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::mapping("export record without a string _id"))?
            .to_string();

        let kind = RecordKind::from_id(&id);
        let record = match kind {
            RecordKind::Account => SourceRecord::Account(typed(value, &id, kind)?),
            RecordKind::CategoryGroup => SourceRecord::CategoryGroup(typed(value, &id, kind)?),
            RecordKind::Category => SourceRecord::Category(typed(value, &id, kind)?),
            RecordKind::MonthCategory => SourceRecord::MonthCategory(typed(value, &id, kind)?),
            RecordKind::Payee => SourceRecord::Payee(typed(value, &id, kind)?),
            RecordKind::Transaction => SourceRecord::Transaction(typed(value, &id, kind)?),
            RecordKind::Other => SourceRecord::Other { id },
        };
        Ok(record)
    }

    pub fn id(&self) -> &str {
        match self {
            SourceRecord::Account(r) => &r.id,
            SourceRecord::CategoryGroup(r) => &r.id,
            SourceRecord::Category(r) => &r.id,
            SourceRecord::MonthCategory(r) => &r.id,
            SourceRecord::Payee(r) => &r.id,
            SourceRecord::Transaction(r) => &r.id,
            SourceRecord::Other { id } => id,
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            SourceRecord::Account(_) => RecordKind::Account,
            SourceRecord::CategoryGroup(_) => RecordKind::CategoryGroup,
            SourceRecord::Category(_) => RecordKind::Category,
            SourceRecord::MonthCategory(_) => RecordKind::MonthCategory,
            SourceRecord::Payee(_) => RecordKind::Payee,
            SourceRecord::Transaction(_) => RecordKind::Transaction,
            SourceRecord::Other { .. } => RecordKind::Other,
        }
    }
}

fn typed<T: for<'de> Deserialize<'de>>(value: JsonValue, id: &str, kind: RecordKind) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| Error::mapping(format!("malformed {} record {}: {}", kind.as_str(), id, e)))
}

/// A parsed Financier export, in file order
#[derive(Debug, Clone, Default)]
pub struct Export {
    pub records: Vec<SourceRecord>,
}

impl Export {
    /// Parse an export document.
    ///
    /// Accepts a bare array of documents or a dump object with a `docs` array.
    pub fn from_json(value: JsonValue) -> Result<Self> {
        let docs = match value {
            JsonValue::Array(docs) => docs,
            JsonValue::Object(mut obj) => match obj.remove("docs") {
                Some(JsonValue::Array(docs)) => docs,
                _ => {
                    return Err(Error::mapping(
                        "export object has no \"docs\" array",
                    ))
                }
            },
            _ => return Err(Error::mapping("export must be a JSON array of records")),
        };

        let records = docs
            .into_iter()
            .map(SourceRecord::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { records })
    }

    pub fn parse_str(content: &str) -> Result<Self> {
        Self::from_json(serde_json::from_str(content)?)
    }

    /// Read and parse an export file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_str(&content)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &SourceAccount> {
        self.records.iter().filter_map(|r| match r {
            SourceRecord::Account(a) => Some(a),
            _ => None,
        })
    }

    pub fn category_groups(&self) -> impl Iterator<Item = &SourceCategoryGroup> {
        self.records.iter().filter_map(|r| match r {
            SourceRecord::CategoryGroup(g) => Some(g),
            _ => None,
        })
    }

    pub fn categories(&self) -> impl Iterator<Item = &SourceCategory> {
        self.records.iter().filter_map(|r| match r {
            SourceRecord::Category(c) => Some(c),
            _ => None,
        })
    }

    pub fn month_categories(&self) -> impl Iterator<Item = &SourceMonthCategory> {
        self.records.iter().filter_map(|r| match r {
            SourceRecord::MonthCategory(m) => Some(m),
            _ => None,
        })
    }

    pub fn payees(&self) -> impl Iterator<Item = &SourcePayee> {
        self.records.iter().filter_map(|r| match r {
            SourceRecord::Payee(p) => Some(p),
            _ => None,
        })
    }

    pub fn transactions(&self) -> impl Iterator<Item = &SourceTransaction> {
        self.records.iter().filter_map(|r| match r {
            SourceRecord::Transaction(t) => Some(t),
            _ => None,
        })
    }

    /// Number of documents that are not imported at all
    pub fn ignored_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.kind() == RecordKind::Other)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_month_category_is_not_a_category() {
        assert_eq!(
            RecordKind::from_id("b_1_m_category_2024-03-01_abc"),
            RecordKind::MonthCategory
        );
        assert_eq!(RecordKind::from_id("b_1_category_abc"), RecordKind::Category);
        assert_eq!(
            RecordKind::from_id("b_1_master-category_abc"),
            RecordKind::CategoryGroup
        );
        assert_eq!(RecordKind::from_id("budget_1"), RecordKind::Other);
    }

    #[test]
    fn test_field_distinguishes_absent_null_present() {
        let tx: SourceTransaction = serde_json::from_value(json!({
            "_id": "b_1_transaction_t1",
            "value": 100,
            "account": null,
            "category": "split"
        }))
        .unwrap();
        assert_eq!(tx.account, Field::Null);
        assert_eq!(tx.payee, Field::Absent);
        assert_eq!(tx.category, Field::Present("split".to_string()));
    }

    #[test]
    fn test_transaction_category_parse() {
        assert_eq!(TransactionCategory::parse("split"), TransactionCategory::Split);
        assert_eq!(TransactionCategory::parse("income"), TransactionCategory::Income);
        assert_eq!(
            TransactionCategory::parse("incomeNextMonth"),
            TransactionCategory::IncomeNextMonth
        );
        assert_eq!(
            TransactionCategory::parse("c1"),
            TransactionCategory::Category("c1".to_string())
        );
    }

    #[test]
    fn test_export_accepts_docs_object() {
        let export = Export::from_json(json!({
            "docs": [
                { "_id": "b_1_payee_p1", "name": "Grocer" },
                { "_id": "budget_1", "name": "Home" }
            ]
        }))
        .unwrap();
        assert_eq!(export.payees().count(), 1);
        assert_eq!(export.ignored_count(), 1);
    }

    #[test]
    fn test_record_without_id_is_rejected() {
        let err = Export::from_json(json!([{ "name": "nameless" }])).unwrap_err();
        assert!(matches!(err, Error::Mapping(_)));
    }

    #[test]
    fn test_malformed_record_names_its_id() {
        let err = Export::from_json(json!([
            { "_id": "b_1_transaction_t1", "value": "lots" }
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("b_1_transaction_t1"));
    }
}
