use crate::config::S3Config;
use crate::error::{EnrichError, Result};
use crate::storage::ObjectStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use log::debug;
use reqwest::{Client, StatusCode};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

/// S3-compatible object store addressed path-style (`{endpoint}/{bucket}/{key}`).
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    config: S3Config,
}

/// A GET request with its SigV4 headers already computed.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl S3Store {
    pub fn new(config: S3Config) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn sign_get(&self, key: &str, now: DateTime<Utc>) -> Result<SignedRequest> {
        sign_get(&self.config, key, now)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let signed = self.sign_get(key, Utc::now())?;
        debug!("GET {}", signed.url);

        let mut request = self.client.get(&signed.url);
        for (name, value) in &signed.headers {
            // reqwest derives Host from the URL itself
            if name != "host" {
                request = request.header(name.as_str(), value.as_str());
            }
        }

        let res = request.send().await?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(EnrichError::NotFound(key.to_string()));
        }
        if !status.is_success() {
            let error_text = res.text().await?;
            return Err(EnrichError::Transport(format!(
                "S3 GET '{}' failed (status {}): {}",
                key, status, error_text
            )));
        }

        Ok(res.bytes().await?.to_vec())
    }
}

pub fn sign_get(config: &S3Config, key: &str, now: DateTime<Utc>) -> Result<SignedRequest> {
    let (host, prefix) = endpoint_parts(&config.endpoint)?;
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();
    let payload_hash = to_hex(&Sha256::digest(b""));
    let object_path = format!("/{}/{}", uri_encode(&config.bucket), uri_encode(key));
    let canonical_uri = format!("{}{}", uri_encode(prefix), object_path);
    let base = config.endpoint.trim_end_matches('/');
    let origin = base.strip_suffix(prefix).unwrap_or(base);

    let canonical_request = format!(
        "GET\n{}\n\nhost:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n\n{}\n{}",
        canonical_uri, host, payload_hash, amz_date, SIGNED_HEADERS, payload_hash
    );
    let scope = format!("{}/{}/s3/aws4_request", date, config.region);
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{}\n{}\n{}",
        amz_date,
        scope,
        to_hex(&Sha256::digest(canonical_request.as_bytes()))
    );

    let mut signing_key = hmac_sha256(format!("AWS4{}", config.secret_key).as_bytes(), &date)?;
    for part in [config.region.as_str(), "s3", "aws4_request"] {
        signing_key = hmac_sha256(&signing_key, part)?;
    }
    let signature = to_hex(&hmac_sha256(&signing_key, &string_to_sign)?);

    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
        config.access_key, scope, SIGNED_HEADERS, signature
    );

    Ok(SignedRequest {
        url: format!("{}{}", origin, canonical_uri),
        headers: vec![
            ("host".to_string(), host),
            ("x-amz-content-sha256".to_string(), payload_hash),
            ("x-amz-date".to_string(), amz_date),
            ("authorization".to_string(), authorization),
        ],
    })
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn hmac_sha256(key: &[u8], data: &str) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| EnrichError::Configuration(format!("Invalid signing key: {}", e)))?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Host (and non-default port) exactly as the HTTP client will send it, plus any
/// path prefix the endpoint carries (`https://gw/minio` serves buckets under `/minio`).
fn endpoint_parts(endpoint: &str) -> Result<(String, &str)> {
    let (scheme, rest) = endpoint.split_once("://").ok_or_else(|| {
        EnrichError::Configuration(format!("S3_ENDPOINT '{}' has no scheme", endpoint))
    })?;
    let (authority, prefix) = match rest.find('/') {
        Some(slash) => rest.split_at(slash),
        None => (rest, ""),
    };
    if authority.is_empty() {
        return Err(EnrichError::Configuration(format!(
            "S3_ENDPOINT '{}' has no host",
            endpoint
        )));
    }
    if prefix.contains(['?', '#']) {
        return Err(EnrichError::Configuration(format!(
            "S3_ENDPOINT '{}' must not carry a query or fragment",
            endpoint
        )));
    }

    let default_port = match scheme {
        "https" => ":443",
        "http" => ":80",
        _ => "",
    };
    let host = match authority.strip_suffix(default_port) {
        Some(bare) if !default_port.is_empty() => bare,
        _ => authority,
    };
    Ok((host.to_string(), prefix.trim_end_matches('/')))
}

/// Percent-encodes everything but RFC 3986 unreserved characters and `/`.
fn uri_encode(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
