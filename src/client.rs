//! REST catalog client
//!
//! The server is an external collaborator; this module only knows the three
//! read endpoints the screens need.

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use tracing::debug;

use crate::catalog::CatalogQuery;
use crate::config::Config;
use crate::types::{AppRecord, AppsPage};

/// Read access to the app catalog
pub trait CatalogApi {
    /// One page of results for the given query
    fn fetch_page(&self, query: &CatalogQuery) -> Result<AppsPage>;

    /// A single app, `None` if the server does not know the id
    fn fetch_app(&self, id: &str) -> Result<Option<AppRecord>>;

    /// The full collection, used to resolve the installed list
    fn fetch_all(&self) -> Result<Vec<AppRecord>>;
}

pub struct HttpCatalog {
    base_url: String,
    all_apps_path: String,
    client: Client,
}

impl HttpCatalog {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("heroapps/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()
            .wrap_err("build http client")?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            all_apps_path: config.all_apps_path.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `/apps/{id}` with the id encoded as a single path segment
    fn app_url(&self, id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url("/apps"))
            .wrap_err_with(|| format!("invalid base url '{}'", self.base_url))?;
        url.path_segments_mut()
            .map_err(|()| eyre!("base url '{}' cannot take a path", self.base_url))?
            .push(id);
        Ok(url)
    }

    fn ensure_ok(resp: Response, label: &str) -> Result<Response> {
        let status = resp.status();
        if !status.is_success() {
            return Err(eyre!("{label}: server returned {status}"));
        }
        Ok(resp)
    }
}

impl CatalogApi for HttpCatalog {
    fn fetch_page(&self, query: &CatalogQuery) -> Result<AppsPage> {
        let url = self.url("/apps");
        let params = query.to_params();
        debug!(%url, ?params, "fetching catalog page");

        let resp = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .wrap_err_with(|| format!("GET {url}"))?;
        Self::ensure_ok(resp, "load apps")?
            .json::<AppsPage>()
            .wrap_err("decode apps page")
    }

    fn fetch_app(&self, id: &str) -> Result<Option<AppRecord>> {
        let url = self.app_url(id)?;
        debug!(%url, "fetching app");

        let resp = self
            .client
            .get(url.clone())
            .send()
            .wrap_err_with(|| format!("GET {url}"))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        // A JSON `null` body also means "no such app"
        Self::ensure_ok(resp, "load app")?
            .json::<Option<AppRecord>>()
            .wrap_err("decode app")
    }

    fn fetch_all(&self) -> Result<Vec<AppRecord>> {
        let url = self.url(&self.all_apps_path);
        debug!(%url, "fetching full collection");

        let resp = self
            .client
            .get(&url)
            .send()
            .wrap_err_with(|| format!("GET {url}"))?;
        Self::ensure_ok(resp, "load all apps")?
            .json::<Vec<AppRecord>>()
            .wrap_err("decode app collection")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped_from_base_url() {
        let config = Config {
            base_url: "http://example.test:5000/".into(),
            ..Config::default()
        };
        let api = HttpCatalog::new(&config).unwrap();
        assert_eq!(api.base_url(), "http://example.test:5000");
        assert_eq!(api.url("/apps/7"), "http://example.test:5000/apps/7");
    }

    #[test]
    fn app_id_is_one_encoded_path_segment() {
        let config = Config {
            base_url: "http://example.test:5000".into(),
            ..Config::default()
        };
        let api = HttpCatalog::new(&config).unwrap();
        assert_eq!(api.app_url("7").unwrap().as_str(), "http://example.test:5000/apps/7");

        let url = api.app_url("x?y#z/w%").unwrap();
        assert_eq!(url.path(), "/apps/x%3Fy%23z%2Fw%25");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }
}
