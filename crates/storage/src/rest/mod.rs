//! Hosted Postgres REST (PostgREST) adapter.
//!
//! Tables are addressed as `{base}/rest/v1/{table}`; reads use `select=*`
//! with `column=eq.value`, `order=column.desc` and `limit` query parameters.

use async_trait::async_trait;
use log::debug;
use practice_core::model::RawRow;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

use crate::repository::{ProgressStore, QuestionSource, RowQuery, StorageError};

mod config;

pub use config::{RestConfig, RestConfigError};

#[derive(Clone)]
pub struct RestRepository {
    client: Client,
    config: RestConfig,
}

impl RestRepository {
    #[must_use]
    pub fn new(config: RestConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(self.config.bearer())
    }

    async fn read_rows(&self, response: Response) -> Result<Vec<RawRow>, StorageError> {
        let response = check_status(response).await?;
        response
            .json::<Vec<RawRow>>()
            .await
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

/// Query parameters for a [`RowQuery`], in PostgREST syntax.
#[must_use]
pub fn query_params(query: &RowQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    if let Some((column, value)) = &query.filter {
        params.push((column.clone(), format!("eq.{value}")));
    }
    if let Some(column) = &query.order_desc {
        params.push(("order".to_string(), format!("{column}.desc")));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: Option<String>,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

fn describe_error(body: &str) -> String {
    match serde_json::from_str::<PostgrestError>(body) {
        Ok(err) => {
            let mut text = err.message.unwrap_or_else(|| "request refused".to_string());
            if let Some(code) = err.code {
                text = format!("{text} [{code}]");
            }
            for extra in [err.details, err.hint].into_iter().flatten() {
                text.push_str("; ");
                text.push_str(&extra);
            }
            text
        }
        Err(_) if body.trim().is_empty() => "request refused".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

async fn check_status(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StorageError::Rejected {
        status: Some(status.as_u16()),
        message: describe_error(&body),
    })
}

fn transport(e: reqwest::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl QuestionSource for RestRepository {
    async fn fetch_rows(&self, table: &str) -> Result<Vec<RawRow>, StorageError> {
        debug!("fetching rows from {table}");
        let request = self
            .client
            .get(self.config.table_url(table))
            .query(&[("select", "*")]);
        let response = self.authorized(request).send().await.map_err(transport)?;
        self.read_rows(response).await
    }
}

#[async_trait]
impl ProgressStore for RestRepository {
    async fn insert_row(&self, table: &str, row: &RawRow) -> Result<(), StorageError> {
        let request = self
            .client
            .post(self.config.table_url(table))
            .header("Prefer", "return=minimal")
            .json(&[row]);
        let response = self.authorized(request).send().await.map_err(transport)?;
        check_status(response).await?;
        Ok(())
    }

    async fn select_rows(&self, query: &RowQuery) -> Result<Vec<RawRow>, StorageError> {
        let request = self
            .client
            .get(self.config.table_url(&query.table))
            .query(&query_params(query));
        let response = self.authorized(request).send().await.map_err(transport)?;
        self.read_rows(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_follow_postgrest_syntax() {
        let query = RowQuery::table("test_results")
            .eq("user_id", "u1")
            .order_desc("created_at")
            .limit(10);
        let params = query_params(&query);
        assert_eq!(
            params,
            vec![
                ("select".to_string(), "*".to_string()),
                ("user_id".to_string(), "eq.u1".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn postgrest_errors_are_summarized() {
        let body = r#"{"code":"PGRST204","details":null,"hint":null,"message":"Could not find the 'score' column of 'test_results' in the schema cache"}"#;
        assert_eq!(
            describe_error(body),
            "Could not find the 'score' column of 'test_results' in the schema cache [PGRST204]"
        );
        assert_eq!(describe_error(""), "request refused");
        assert_eq!(describe_error("Bad Gateway"), "Bad Gateway");
    }
}
