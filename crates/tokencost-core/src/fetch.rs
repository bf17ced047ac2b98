use std::time::Duration;

use reqwest::Client;

use crate::error::{Result, TcError};
use crate::loader::load_catalog_str;
use crate::pricing::PricingCatalog;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Download a pricing TSV once and parse it.
pub async fn fetch_catalog(url: &str) -> Result<PricingCatalog> {
    let http = Client::builder().timeout(FETCH_TIMEOUT).build()?;
    let resp = http.get(url).send().await?;
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(TcError::Api { status, body });
    }
    let text = resp.text().await?;
    load_catalog_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatError;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_and_parses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pricing.tsv"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "Provider\tModel\tInput $/1M\tOutput $/1M\nOpenAI\tgpt-5\t$1.25\t$10.00\n",
            ))
            .mount(&server)
            .await;

        let catalog = fetch_catalog(&format!("{}/pricing.tsv", server.uri()))
            .await
            .expect("fetch should succeed");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.records()[0].output_per_1m, 10.0);
    }

    #[tokio::test]
    async fn missing_file_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let err = fetch_catalog(&format!("{}/pricing.tsv", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, TcError::Api { status: 404, .. }), "{err}");
    }

    #[tokio::test]
    async fn bad_payload_is_format_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let err = fetch_catalog(&server.uri()).await.unwrap_err();
        assert!(matches!(err, TcError::Format(FormatError::TooShort)), "{err}");
    }
}
