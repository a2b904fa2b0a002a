//! Actual Budget destination over HTTP
//!
//! Talks to an actual-http-api server, which wraps `@actual-app/api` behind
//! REST endpoints under `/v1/budgets/{budget}`. Responses are wrapped as
//! `{ "data": ... }`; failures as `{ "error": "..." }`.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::config::ActualConfig;
use crate::domain::result::{Error, Result};
use crate::domain::{
    Account, Category, CategoryGroup, DestinationCategory, DestinationPayee, Payee, Transaction,
};
use crate::ports::Destination;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
}

/// Transaction body as `addTransactions` expects it
#[derive(Debug, Serialize)]
struct TransactionBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    account: Option<&'a str>,
    date: String,
    amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    payee: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
    cleared: bool,
    imported_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subtransactions: Option<Vec<TransactionBody<'a>>>,
}

impl<'a> TransactionBody<'a> {
    fn from_transaction(tx: &'a Transaction) -> Self {
        Self {
            account: tx.account.as_deref(),
            date: tx.date.format("%Y-%m-%d").to_string(),
            amount: tx.amount,
            payee: tx.payee.as_deref(),
            category: tx.category.as_deref(),
            notes: tx.notes.as_deref(),
            cleared: tx.cleared,
            imported_id: &tx.id,
            subtransactions: tx
                .subtransactions
                .as_ref()
                .map(|subs| subs.iter().map(Self::from_split).collect()),
        }
    }

    /// Splits are posted under their parent, never to an account of their own
    fn from_split(tx: &'a Transaction) -> Self {
        Self {
            account: None,
            ..Self::from_transaction(tx)
        }
    }
}

/// Destination backed by an Actual HTTP API server
pub struct ActualHttpDestination {
    client: Client,
    base_url: String,
    api_key: String,
    password: Option<String>,
    import_label: Mutex<Option<String>>,
}

impl ActualHttpDestination {
    pub fn new(config: &ActualConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::destination(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: format!(
                "{}/v1/budgets/{}",
                config.url.trim_end_matches('/'),
                config.budget_id
            ),
            api_key: config.api_key.clone(),
            password: config.password.clone(),
            import_label: Mutex::new(None),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("x-api-key", &self.api_key);
        if let Some(password) = &self.password {
            builder = builder.header("budget-encryption-password", password);
        }
        builder
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await.map_err(map_request_error)?;
        let response = check_response_status(response).await?;
        let envelope: DataEnvelope<T> = response
            .json()
            .await
            .map_err(|e| Error::destination(format!("unexpected Actual response: {}", e)))?;
        Ok(envelope.data)
    }

    /// For endpoints whose response body carries nothing we need
    async fn execute(&self, builder: RequestBuilder) -> Result<()> {
        let response = builder.send().await.map_err(map_request_error)?;
        check_response_status(response).await?;
        Ok(())
    }

    async fn create(&self, path: &str, body: JsonValue) -> Result<String> {
        self.send(self.request(Method::POST, path).json(&body)).await
    }

    async fn update_month_category(&self, month: &str, category_id: &str, body: JsonValue) -> Result<()> {
        let path = format!("/months/{}/categories/{}", month, category_id);
        self.execute(self.request(Method::PATCH, &path).json(&json!({ "category": body })))
            .await
    }

    fn label(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.import_label
            .lock()
            .map_err(|e| Error::destination(format!("lock poisoned: {}", e)))
    }
}

fn map_request_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::destination(format!(
            "Actual server did not answer within {} seconds",
            REQUEST_TIMEOUT_SECS
        ))
    } else if error.is_connect() {
        Error::destination("unable to connect to the Actual server")
    } else {
        Error::destination(format!("Actual request failed: {}", error))
    }
}

async fn check_response_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = response
        .json::<ErrorEnvelope>()
        .await
        .map(|e| e.error)
        .unwrap_or_default();

    let message = match status.as_u16() {
        401 | 403 => "Actual rejected the API key".to_string(),
        404 => "Actual budget or resource not found".to_string(),
        code => format!("Actual API error: HTTP {}", code),
    };
    if detail.is_empty() {
        Err(Error::destination(message))
    } else {
        Err(Error::destination(format!("{} ({})", message, detail)))
    }
}

#[async_trait]
impl Destination for ActualHttpDestination {
    fn name(&self) -> &str {
        "actual"
    }

    /// Checks the budget is reachable before anything is created
    async fn begin_import(&self, label: &str) -> Result<()> {
        let running = self.label()?.clone();
        if let Some(running) = running {
            return Err(Error::destination(format!(
                "import '{}' is already running",
                running
            )));
        }
        self.execute(self.request(Method::GET, "/accounts")).await?;
        *self.label()? = Some(label.to_string());
        Ok(())
    }

    async fn finish_import(&self) -> Result<()> {
        match self.label()?.take() {
            Some(_) => Ok(()),
            None => Err(Error::destination("no import is running")),
        }
    }

    async fn create_account(&self, account: &Account) -> Result<String> {
        self.create(
            "/accounts",
            json!({
                "account": {
                    "name": account.name,
                    "type": account.account_type.as_str(),
                    "offbudget": account.offbudget,
                    "closed": account.closed,
                },
                "initialBalance": 0,
            }),
        )
        .await
    }

    async fn create_category_group(&self, group: &CategoryGroup) -> Result<String> {
        self.create("/categorygroups", json!({ "category_group": { "name": group.name } }))
            .await
    }

    async fn create_category(&self, category: &Category) -> Result<String> {
        self.create(
            "/categories",
            json!({ "category": { "name": category.name, "group_id": category.group_id } }),
        )
        .await
    }

    async fn create_payee(&self, payee: &Payee) -> Result<String> {
        self.create("/payees", json!({ "payee": { "name": payee.name } }))
            .await
    }

    async fn list_categories(&self) -> Result<Vec<DestinationCategory>> {
        self.send(self.request(Method::GET, "/categories")).await
    }

    async fn list_payees(&self) -> Result<Vec<DestinationPayee>> {
        self.send(self.request(Method::GET, "/payees")).await
    }

    async fn add_transactions(&self, account_id: &str, transactions: &[Transaction]) -> Result<()> {
        let body: Vec<TransactionBody<'_>> = transactions
            .iter()
            .map(TransactionBody::from_transaction)
            .collect();
        let path = format!("/accounts/{}/transactions/batch", account_id);
        // Both legs of every transfer are in the export, so Actual must not
        // create mirror transactions of its own.
        self.execute(self.request(Method::POST, &path).json(&json!({
            "transactions": body,
            "learnCategories": false,
            "runTransfers": false,
        })))
        .await
    }

    async fn set_budget_amount(&self, month: &str, category_id: &str, amount: i64) -> Result<()> {
        self.update_month_category(month, category_id, json!({ "budgeted": amount }))
            .await
    }

    async fn set_budget_carryover(
        &self,
        month: &str,
        category_id: &str,
        carryover: bool,
    ) -> Result<()> {
        self.update_month_category(month, category_id, json!({ "carryover": carryover }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn config() -> ActualConfig {
        ActualConfig {
            url: "http://localhost:5007/".to_string(),
            api_key: "key".to_string(),
            budget_id: "budget-1".to_string(),
            password: None,
        }
    }

    #[test]
    fn test_base_url_is_scoped_to_budget() {
        let dest = ActualHttpDestination::new(&config()).unwrap();
        assert_eq!(dest.base_url, "http://localhost:5007/v1/budgets/budget-1");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = config();
        config.api_key.clear();
        assert!(matches!(
            ActualHttpDestination::new(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_transaction_body_shape() {
        let tx = Transaction {
            id: "t1".to_string(),
            account: Some("acct".to_string()),
            amount: -3000,
            date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            notes: None,
            cleared: true,
            category: None,
            payee: Some("payee".to_string()),
            transfer: Some("t9".to_string()),
            subtransactions: Some(vec![Transaction {
                id: "s1".to_string(),
                account: Some("other-acct".to_string()),
                amount: -3000,
                date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                notes: Some("half".to_string()),
                cleared: true,
                category: Some("cat".to_string()),
                payee: None,
                transfer: None,
                subtransactions: None,
            }]),
        };

        let body = serde_json::to_value(TransactionBody::from_transaction(&tx)).unwrap();
        assert_eq!(body["date"], "2024-02-29");
        assert_eq!(body["imported_id"], "t1");
        assert!(body.get("category").is_none());
        assert!(body.get("transfer").is_none());
        assert_eq!(body["subtransactions"][0]["category"], "cat");
        assert_eq!(body["subtransactions"][0]["notes"], "half");
        assert!(body["subtransactions"][0].get("account").is_none());
    }
}
