//! Image upload over the ESP-IDF HTTP client.

use std::time::Duration;

use crate::traits::UploadTransport;
use embedded_svc::{
    http::{client::Client as HttpClient, Method, Status},
    io::Write,
};
use esp_idf_svc::http::client::{Configuration as HttpClientConfiguration, EspHttpConnection};

/// One-shot HTTP POST uploader.
///
/// Opens a fresh connection per upload; the only header sent is the
/// `Content-Length` that frames the body.
pub struct Esp32Uploader {
    timeout: Duration,
}

impl Esp32Uploader {
    /// Creates an uploader with the given request timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for Esp32Uploader {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl UploadTransport for Esp32Uploader {
    type Error = anyhow::Error;

    fn post(&mut self, url: &str, body: &[u8]) -> anyhow::Result<u16> {
        let http_conf = HttpClientConfiguration {
            timeout: Some(self.timeout),
            ..Default::default()
        };
        let mut client = HttpClient::wrap(EspHttpConnection::new(&http_conf)?);

        let content_length = body.len().to_string();
        let headers = [("Content-Length", content_length.as_str())];
        let mut request = client.request(Method::Post, url, &headers)?;
        request.write_all(body)?;
        request.flush()?;

        let response = request.submit()?;
        Ok(response.status())
    }
}
