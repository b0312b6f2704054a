use crate::search::{parse_url_list, SearchError, SearchResult, UrlSource};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// Search backed by an HTTP endpoint returning a plain-text URL list
///
/// The term is sent as the `q` query parameter.
#[derive(Debug, Clone)]
pub struct HttpListSource {
    client: Client,
    endpoint: Url,
}

impl HttpListSource {
    pub fn new(client: Client, endpoint: &str) -> SearchResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| SearchError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        Ok(Self { client, endpoint })
    }

    /// Full request URL for a term
    fn query_url(&self, term: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("q", term);
        url
    }
}

#[async_trait]
impl UrlSource for HttpListSource {
    async fn search(&self, term: &str) -> SearchResult<Vec<String>> {
        let url = self.query_url(term);
        tracing::debug!("Searching {}", url);

        let connectivity = |source| SearchError::Connectivity {
            endpoint: self.endpoint.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(connectivity)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status {
                endpoint: self.endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(connectivity)?;
        let urls = parse_url_list(&body);
        tracing::info!("Search for '{}' returned {} URLs", term, urls.len());
        Ok(urls)
    }
}
