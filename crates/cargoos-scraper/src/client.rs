//! Page retrieval collaborators.
//!
//! [`PageFetcher`] performs the static GET; [`PageRenderer`] is an optional
//! script-executing fetcher consulted only for pages whose static markup is
//! incomplete. No rendering engine ships with this crate.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::error::FetchError;

const ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9,ru;q=0.8";

/// Per-request settings taken from the search query.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub proxy: Option<String>,
    pub cookie: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            proxy: None,
            cookie: None,
        }
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Return the raw markup at `url`.
    ///
    /// Implementations report HTTP 403/429 as [`FetchError::AntiBot`] and
    /// any other non-2xx status as an error; none of them retry.
    async fn fetch(&self, url: &Url, opts: &FetchOptions) -> Result<String, FetchError>;
}

#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Same contract as [`PageFetcher::fetch`], but returns markup after
    /// client-side scripts have run.
    async fn render(&self, url: &Url, opts: &FetchOptions) -> Result<String, FetchError>;
}

/// `reqwest`-backed [`PageFetcher`].
///
/// Requests through a proxy use a one-off client, since `reqwest` binds
/// proxies at client construction.
pub struct HttpPageFetcher {
    client: Client,
    user_agent: String,
}

impl HttpPageFetcher {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let client = Self::builder(user_agent).build()?;
        Ok(Self {
            client,
            user_agent: user_agent.to_owned(),
        })
    }

    fn builder(user_agent: &str) -> reqwest::ClientBuilder {
        Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
    }

    fn client_for(&self, opts: &FetchOptions) -> Result<Client, FetchError> {
        let Some(proxy) = opts.proxy.as_deref().filter(|p| !p.trim().is_empty()) else {
            return Ok(self.client.clone());
        };
        let proxy_cfg = reqwest::Proxy::all(proxy).map_err(|e| FetchError::InvalidProxy {
            proxy: proxy.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self::builder(&self.user_agent).proxy(proxy_cfg).build()?)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url, opts: &FetchOptions) -> Result<String, FetchError> {
        let client = self.client_for(opts)?;

        let mut request = client
            .get(url.clone())
            .timeout(opts.timeout)
            .header(reqwest::header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE);
        if let Some(cookie) = opts.cookie.as_deref().filter(|c| !c.is_empty()) {
            request = request.header(reqwest::header::COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            return Err(FetchError::AntiBot {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
