//! ESP-IDF HTTPS transport.
//!
//! Implements [`HttpTransport`] with `esp_idf_svc::http::client::EspHttpConnection`.
//! Each request opens a fresh connection and verifies the server against the
//! ESP-IDF certificate bundle.  The configured timeout bounds every socket
//! operation and, checked between operations, the exchange as a whole; see
//! [`StationConfig::exchange_bound_ms`](crate::config::StationConfig::exchange_bound_ms).
//! A reply body over [`MAX_BODY_LEN`] is `RemoteError::Malformed`.

use core::time::Duration;

use esp_idf_svc::http::Method;
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
use esp_idf_svc::sys::{ESP_ERR_HTTP_EAGAIN, ESP_ERR_TIMEOUT, EspError};
use log::{debug, warn};

use crate::error::RemoteError;

use super::rtdb::{HttpMethod, HttpResponse, HttpTransport};
use super::utils::{CappedBody, Deadline};

/// Largest reply body accepted before the exchange is treated as malformed.
const MAX_BODY_LEN: usize = 16 * 1024;

pub struct EspHttpTransport {
    timeout: Duration,
}

impl EspHttpTransport {
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            timeout: Duration::from_millis(u64::from(timeout_ms)),
        }
    }

    fn exchange(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&[u8]>,
    ) -> Result<HttpResponse, RemoteError> {
        let deadline = Deadline::after(self.timeout);

        let mut conn = EspHttpConnection::new(&Configuration {
            timeout: Some(self.timeout),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        })
        .map_err(transport_error)?;

        let method = match method {
            HttpMethod::Get => Method::Get,
            HttpMethod::Put => Method::Put,
            HttpMethod::Post => Method::Post,
        };
        let len = body.map_or(0, <[u8]>::len).to_string();
        let headers = [
            ("content-type", "application/json"),
            ("content-length", len.as_str()),
        ];

        conn.initiate_request(method, url, &headers)
            .map_err(transport_error)?;
        let mut pending = body.unwrap_or_default();
        while !pending.is_empty() {
            deadline.check()?;
            let n = conn.write(pending).map_err(transport_error)?;
            pending = &pending[n..];
        }
        deadline.check()?;
        conn.initiate_response().map_err(transport_error)?;

        let status = conn.status();
        let mut body = CappedBody::new(MAX_BODY_LEN);
        let mut chunk = [0u8; 512];
        loop {
            deadline.check()?;
            let n = conn.read(&mut chunk).map_err(transport_error)?;
            if n == 0 {
                break;
            }
            body.push(&chunk[..n]).inspect_err(|_| {
                warn!("HTTP {:?} -> {}: body over {} bytes", method, status, MAX_BODY_LEN);
            })?;
        }
        debug!("HTTP {:?} -> {} ({} bytes)", method, status, body.len());

        Ok(HttpResponse {
            status,
            body: body.into_vec(),
        })
    }
}

fn transport_error(e: EspError) -> RemoteError {
    let code = e.code();
    if code == ESP_ERR_HTTP_EAGAIN as i32 || code == ESP_ERR_TIMEOUT as i32 {
        RemoteError::Timeout
    } else {
        debug!("HTTP transport error: {}", e);
        RemoteError::Network
    }
}

impl HttpTransport for EspHttpTransport {
    fn request(
        &mut self,
        method: HttpMethod,
        url: &str,
        body: Option<&[u8]>,
    ) -> Result<HttpResponse, RemoteError> {
        self.exchange(method, url, body)
    }
}
