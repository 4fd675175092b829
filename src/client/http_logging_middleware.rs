//! HTTP logging middleware with sensitive header redaction.
//!
//! Logs each Conductor API call at the transport layer through `tracing`,
//! with default-on redaction of credentials:
//! - `authorization`: redacted as "Bearer [REDACTED]" (scheme visible by default)
//! - `x-authorization` (Conductor access token): "[REDACTED]"
//! - `cookie` / `set-cookie`, `x-api-key`, `proxy-authorization`, `x-auth-token`: "[REDACTED]"
//!
//! # Examples
//!
//! ```rust
//! use conductor_client::client::http_logging_middleware::HttpLoggingMiddleware;
//! use conductor_client::{ClientConfig, ConductorClient};
//! use std::sync::Arc;
//!
//! # fn example() -> conductor_client::Result<()> {
//! let client = ConductorClient::new(ClientConfig::new("http://localhost:8080/api"))?
//!     .with_middleware(Arc::new(
//!         HttpLoggingMiddleware::new()
//!             .with_level(tracing::Level::DEBUG)
//!             .with_max_body_bytes(1024),
//!     ));
//! # Ok(())
//! # }
//! ```

use crate::client::http_middleware::{
    HttpMiddleware, HttpMiddlewareContext, HttpRequest, HttpResponse,
};
use crate::error::Result;
use async_trait::async_trait;
use http::header::HeaderName;
use http::HeaderMap;
use std::collections::HashSet;

/// HTTP logging middleware with sensitive header redaction.
#[derive(Debug, Clone)]
pub struct HttpLoggingMiddleware {
    level: tracing::Level,
    redact_headers: HashSet<HeaderName>,
    show_auth_scheme: bool,
    max_header_value_len: Option<usize>,
    max_body_bytes: Option<usize>,
}

impl Default for HttpLoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpLoggingMiddleware {
    /// Create a new HTTP logging middleware with secure defaults.
    ///
    /// Defaults:
    /// - Log level: INFO
    /// - Redacted headers: authorization, x-authorization, cookie, set-cookie,
    ///   x-api-key, proxy-authorization, x-auth-token
    /// - Show auth scheme: true
    /// - Max header value length: None (no truncation)
    /// - Max body bytes: None (don't log bodies)
    pub fn new() -> Self {
        let redact_headers = [
            "authorization",
            "x-authorization",
            "cookie",
            "set-cookie",
            "x-api-key",
            "proxy-authorization",
            "x-auth-token",
        ]
        .into_iter()
        .map(HeaderName::from_static)
        .collect();

        Self {
            level: tracing::Level::INFO,
            redact_headers,
            show_auth_scheme: true,
            max_header_value_len: None,
            max_body_bytes: None,
        }
    }

    /// Set the log level for this middleware.
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self
    }

    /// Add a header to the redaction list.
    pub fn redact_header(mut self, name: HeaderName) -> Self {
        self.redact_headers.insert(name);
        self
    }

    /// Remove a header from the redaction list (use with caution).
    pub fn allow_header(mut self, name: &HeaderName) -> Self {
        self.redact_headers.remove(name);
        self
    }

    /// If true: "Bearer [REDACTED]". If false: "[REDACTED]".
    pub fn with_show_auth_scheme(mut self, show: bool) -> Self {
        self.show_auth_scheme = show;
        self
    }

    /// Set maximum header value length. Longer values are truncated.
    pub fn with_max_header_value_len(mut self, max_len: usize) -> Self {
        self.max_header_value_len = Some(max_len);
        self
    }

    /// Set maximum body bytes to log. If unset, only body sizes are logged.
    pub fn with_max_body_bytes(mut self, max_bytes: usize) -> Self {
        self.max_body_bytes = Some(max_bytes);
        self
    }

    /// Get the maximum body bytes configuration.
    pub fn max_body_bytes(&self) -> Option<usize> {
        self.max_body_bytes
    }

    /// Redact a header value based on the header name.
    pub fn redact_header_value(&self, name: &HeaderName, value: &str) -> String {
        if !self.redact_headers.contains(name) {
            return self.truncate_value(value);
        }

        if name == "authorization" && self.show_auth_scheme {
            if let Some(space_idx) = value.find(' ') {
                return format!("{} [REDACTED]", &value[..space_idx]);
            }
        }
        "[REDACTED]".to_string()
    }

    fn truncate_value(&self, value: &str) -> String {
        match self.max_header_value_len {
            Some(max_len) if value.len() > max_len => {
                let mut cut = max_len;
                while !value.is_char_boundary(cut) {
                    cut -= 1;
                }
                format!("{}...", &value[..cut])
            },
            _ => value.to_string(),
        }
    }

    /// Format headers for logging with redaction.
    pub fn format_headers(&self, headers: &HeaderMap) -> String {
        let mut header_strs = Vec::new();

        for name in headers.keys() {
            let values: Vec<String> = headers
                .get_all(name)
                .iter()
                .map(|v| self.redact_header_value(name, v.to_str().unwrap_or("<invalid-utf8>")))
                .collect();

            if values.len() == 1 {
                header_strs.push(format!("{}: {}", name.as_str(), values[0]));
            } else {
                for (idx, val) in values.iter().enumerate() {
                    header_strs.push(format!("{}[{}]: {}", name.as_str(), idx, val));
                }
            }
        }

        if header_strs.is_empty() {
            "(no headers)".to_string()
        } else {
            header_strs.join(", ")
        }
    }

    /// Size, and optionally a preview, of a body.
    pub fn describe_body(&self, body: &[u8]) -> String {
        let Some(max_bytes) = self.max_body_bytes else {
            return format!(" body={}B", body.len());
        };
        if body.is_empty() {
            return " body=0B".to_string();
        }

        let preview_len = max_bytes.min(body.len());
        let preview = String::from_utf8_lossy(&body[..preview_len]);
        if body.len() > max_bytes {
            format!(
                " body={}B (showing {}B): {}...",
                body.len(),
                preview_len,
                preview
            )
        } else {
            format!(" body={}B: {}", body.len(), preview)
        }
    }

    fn log_request(&self, request: &HttpRequest, context: &HttpMiddlewareContext) {
        let operation = context.operation.as_deref().unwrap_or("-");
        let body_info = self.describe_body(&request.body);

        match self.level {
            tracing::Level::TRACE | tracing::Level::DEBUG => {
                let headers_str = self.format_headers(&request.headers);
                if self.level == tracing::Level::TRACE {
                    tracing::trace!(
                        operation,
                        "HTTP {} {} | headers: [{}]{}",
                        request.method,
                        request.url,
                        headers_str,
                        body_info
                    );
                } else {
                    tracing::debug!(
                        operation,
                        "HTTP {} {} | headers: [{}]{}",
                        request.method,
                        request.url,
                        headers_str,
                        body_info
                    );
                }
            },
            tracing::Level::INFO => tracing::info!(
                operation,
                "HTTP {} {}{}",
                request.method,
                request.url,
                if self.max_body_bytes.is_some() { body_info.as_str() } else { "" }
            ),
            tracing::Level::WARN => {
                tracing::warn!(operation, "HTTP {} {}", request.method, request.url)
            },
            tracing::Level::ERROR => {
                tracing::error!(operation, "HTTP {} {}", request.method, request.url)
            },
        }
    }

    fn log_response(&self, response: &HttpResponse, context: &HttpMiddlewareContext) {
        let operation = context.operation.as_deref().unwrap_or("-");
        let body_info = self.describe_body(&response.body);

        let status_mark = if response.is_success() {
            "ok"
        } else if response.is_client_error() {
            "client-error"
        } else if response.is_server_error() {
            "server-error"
        } else {
            "other"
        };

        match self.level {
            tracing::Level::TRACE | tracing::Level::DEBUG => {
                let headers_str = self.format_headers(&response.headers);
                if self.level == tracing::Level::TRACE {
                    tracing::trace!(
                        operation,
                        "{} HTTP {} | headers: [{}]{}",
                        status_mark,
                        response.status,
                        headers_str,
                        body_info
                    );
                } else {
                    tracing::debug!(
                        operation,
                        "{} HTTP {} | headers: [{}]{}",
                        status_mark,
                        response.status,
                        headers_str,
                        body_info
                    );
                }
            },
            tracing::Level::INFO => tracing::info!(
                operation,
                "{} HTTP {}{}",
                status_mark,
                response.status,
                if self.max_body_bytes.is_some() { body_info.as_str() } else { "" }
            ),
            tracing::Level::WARN => {
                tracing::warn!(operation, "{} HTTP {}", status_mark, response.status)
            },
            tracing::Level::ERROR => {
                tracing::error!(operation, "{} HTTP {}", status_mark, response.status)
            },
        }
    }
}

#[async_trait]
impl HttpMiddleware for HttpLoggingMiddleware {
    async fn on_request(
        &self,
        request: &mut HttpRequest,
        context: &HttpMiddlewareContext,
    ) -> Result<()> {
        self.log_request(request, context);
        Ok(())
    }

    async fn on_response(
        &self,
        response: &mut HttpResponse,
        context: &HttpMiddlewareContext,
    ) -> Result<()> {
        self.log_response(response, context);
        Ok(())
    }

    fn priority(&self) -> i32 {
        // Late on requests so injected headers show up redacted
        100
    }
}
