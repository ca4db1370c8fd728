//! HTTP client for the country dataset.

use earthpick_core::{CountryInfo, CountryRecord, build_records, parse_country_infos};

use crate::error::{Error, Result};

/// Fetches the country dataset.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    dataset_url: String,
}

impl Client {
    /// Where the country centroid and bounding box dataset is published.
    pub const DEFAULT_DATASET_URL: &'static str =
        "https://threejsfundamentals.org/threejs/resources/data/world/country-info.json";

    /// Create a client for the default dataset.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dataset_url(Self::DEFAULT_DATASET_URL)
    }

    /// Create a client for a dataset published elsewhere.
    #[must_use]
    pub fn with_dataset_url(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            dataset_url: url.into(),
        }
    }

    #[must_use]
    pub fn dataset_url(&self) -> &str {
        &self.dataset_url
    }

    /// Fetch raw bytes from a URL, failing on non-success status codes.
    pub async fn fetch_bytes_from_url(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("Fetching {}", url);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Fetch and validate the dataset entries.
    pub async fn fetch_country_infos(&self) -> Result<Vec<CountryInfo>> {
        let bytes = self.fetch_bytes_from_url(&self.dataset_url).await?;
        let infos = parse_country_infos(&bytes)?;
        tracing::debug!("Parsed {} dataset entries", infos.len());
        Ok(infos)
    }

    /// Fetch the dataset and build records with anchors on a globe of the
    /// given radius.
    pub async fn fetch_records(&self, radius: f32) -> Result<Vec<CountryRecord>> {
        let infos = self.fetch_country_infos().await?;
        Ok(build_records(&infos, radius))
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serve one canned HTTP response on a local port and return its URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{address}/country-info.json")
    }

    #[tokio::test]
    async fn fetches_and_builds_records() {
        let url = serve_once(
            "HTTP/1.1 200 OK",
            r#"[{"name":"Chile","lat":-35.6,"lon":-71.5,"min":[-109.4,-55.9],"max":[-66.4,-17.5]},
                {"name":"Peru","lat":-9.1,"lon":-75.0,"min":[-81.3,-18.3],"max":[-68.6,-0.1]}]"#,
        )
        .await;

        let records = Client::with_dataset_url(url).fetch_records(0.5).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].index, 1);
        assert_eq!(records[1].name, "Peru");
        assert!((records[1].centroid.length() - 0.5).abs() < 1e-4);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let url = serve_once("HTTP/1.1 404 Not Found", "").await;
        let err = Client::with_dataset_url(url).fetch_country_infos().await.unwrap_err();
        assert!(matches!(err, Error::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_a_dataset_error() {
        let url = serve_once("HTTP/1.1 200 OK", "{\"not\": \"a list\"}").await;
        let err = Client::with_dataset_url(url).fetch_country_infos().await.unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
    }
}
