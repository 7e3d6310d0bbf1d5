use std::env;

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RestConfigError {
    #[error("invalid backend url {raw:?}: {source}")]
    InvalidUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },
    #[error("backend url must use http or https, got {0}")]
    UnsupportedScheme(String),
}

/// Connection settings for a hosted Postgres REST backend.
#[derive(Clone, Debug)]
pub struct RestConfig {
    pub base_url: Url,
    pub api_key: String,
    pub access_token: Option<String>,
}

impl RestConfig {
    /// Validate a base URL and key.
    ///
    /// # Errors
    ///
    /// Returns `RestConfigError` if the URL does not parse or is not http(s).
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, RestConfigError> {
        let base_url = Url::parse(base_url.trim()).map_err(|source| RestConfigError::InvalidUrl {
            raw: base_url.to_string(),
            source,
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(RestConfigError::UnsupportedScheme(
                base_url.scheme().to_string(),
            ));
        }
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            access_token: None,
        })
    }

    /// Use a signed-in user's token instead of the anon key for `Authorization`.
    #[must_use]
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Read `ASVAB_SUPABASE_URL`, `ASVAB_SUPABASE_ANON_KEY` and the optional
    /// `ASVAB_SUPABASE_ACCESS_TOKEN`.
    ///
    /// Returns `Ok(None)` when the URL or key is unset or blank.
    ///
    /// # Errors
    ///
    /// Returns `RestConfigError` if the URL is set but invalid.
    pub fn from_env() -> Result<Option<Self>, RestConfigError> {
        let Some(url) = non_blank_var("ASVAB_SUPABASE_URL") else {
            return Ok(None);
        };
        let Some(key) = non_blank_var("ASVAB_SUPABASE_ANON_KEY") else {
            return Ok(None);
        };
        let config = Self::new(&url, key)?
            .with_access_token(non_blank_var("ASVAB_SUPABASE_ACCESS_TOKEN"));
        Ok(Some(config))
    }

    /// `{base}/rest/v1/{table}`
    #[must_use]
    pub fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.base_url.as_str().trim_end_matches('/'),
            table
        )
    }

    #[must_use]
    pub fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.api_key)
    }
}

fn non_blank_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
