//! API-key request signing for the OCI REST endpoints.
//!
//! OCI authenticates each request with an HTTP signature (`rsa-sha256`) over
//! `date`, `(request-target)` and `host`, plus the body headers on requests
//! that carry a body.

use std::fmt;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Request};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};

use crate::config::ConfigError;
use crate::error::HunterError;

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Signs requests as `<tenancy>/<user>/<fingerprint>`.
pub struct RequestSigner {
    key_id: String,
    key: SigningKey<Sha256>,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    /// Accepts PKCS#8 (`BEGIN PRIVATE KEY`) or PKCS#1 (`BEGIN RSA PRIVATE KEY`) PEM.
    pub fn new(
        tenancy_id: &str,
        user_id: &str,
        fingerprint: &str,
        private_key_pem: &str,
    ) -> Result<Self, ConfigError> {
        let key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(private_key_pem))
            .map_err(|e| ConfigError::Invalid(format!("unreadable OCI private key: {e}")))?;
        Ok(Self {
            key_id: format!("{tenancy_id}/{user_id}/{fingerprint}"),
            key: SigningKey::<Sha256>::new(key),
        })
    }

    pub fn from_key_file(
        tenancy_id: &str,
        user_id: &str,
        fingerprint: &str,
        key_file: &Path,
    ) -> Result<Self, ConfigError> {
        let pem = std::fs::read_to_string(key_file).map_err(|e| {
            ConfigError::Invalid(format!(
                "cannot read OCI private key {}: {e}",
                key_file.display()
            ))
        })?;
        Self::new(tenancy_id, user_id, fingerprint, &pem)
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Adds the signed headers and the `Authorization` header to `request`.
    pub fn sign(&self, request: &mut Request) -> Result<(), HunterError> {
        let signed = signed_headers(request, Utc::now().format(HTTP_DATE).to_string());
        let names = signed
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(" ");
        let signature = self.key.sign(signing_string(&signed).as_bytes());
        let authorization = format!(
            "Signature version=\"1\",keyId=\"{}\",algorithm=\"rsa-sha256\",headers=\"{names}\",signature=\"{}\"",
            self.key_id,
            STANDARD.encode(signature.to_bytes())
        );

        let headers = request.headers_mut();
        for (name, value) in signed {
            if name == "(request-target)" {
                continue;
            }
            headers.insert(HeaderName::from_static(name), header_value(&value)?);
        }
        headers.insert(AUTHORIZATION, header_value(&authorization)?);
        Ok(())
    }
}

fn header_value(value: &str) -> Result<HeaderValue, HunterError> {
    HeaderValue::from_str(value)
        .map_err(|e| HunterError::Generic(format!("invalid signed header value: {e}")))
}

/// Signed `(name, value)` pairs in the order they are listed in the signature.
fn signed_headers(request: &Request, date: String) -> Vec<(&'static str, String)> {
    let url = request.url();
    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };
    let method = request.method().as_str().to_lowercase();
    let target = match url.query() {
        Some(query) => format!("{method} {}?{query}", url.path()),
        None => format!("{method} {}", url.path()),
    };

    let mut signed = vec![
        ("date", date),
        ("(request-target)", target),
        ("host", host),
    ];
    if matches!(*request.method(), Method::POST | Method::PUT | Method::PATCH) {
        let body = request
            .body()
            .and_then(|body| body.as_bytes())
            .unwrap_or_default();
        let content_type = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/json")
            .to_string();
        signed.push(("content-length", body.len().to_string()));
        signed.push(("content-type", content_type));
        signed.push(("x-content-sha256", STANDARD.encode(Sha256::digest(body))));
    }
    signed
}

fn signing_string(signed: &[(&'static str, String)]) -> String {
    signed
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}
