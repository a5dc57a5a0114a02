//! Object-store metadata client
//!
//! Site generators publish a `metadata.json` next to each document build.
//! This module fetches those objects with AWS Signature Version 4
//! authenticated GET requests, using pure-Rust signing (`hmac` + `sha2`),
//! with no AWS SDK dependency.
//!
//! Every fetch or parse failure maps to [`IngestError::Metadata`], the unit
//! of per-project isolation during a refresh run.

use crate::errors::IngestError;
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Where raw per-project metadata objects come from.
///
/// The refresh orchestrator only needs "fetch the object for this slug";
/// implementations decide where that object lives.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch and parse the metadata object for a project slug.
    async fn fetch(&self, slug: &str) -> Result<Value, IngestError>;
}

/// Signed read access to the S3 bucket holding per-document metadata.
pub struct MetadataBucket {
    bucket: String,
    region: String,
    access_key_id: String,
    secret_access_key: String,
    http: reqwest::Client,
}

impl MetadataBucket {
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            http,
        }
    }

    fn host(&self) -> String {
        format!("{}.s3.{}.amazonaws.com", self.bucket, self.region)
    }

    /// The object key holding a project's metadata.
    fn metadata_key(slug: &str) -> String {
        format!("{}/v/__main/metadata.json", slug.to_lowercase())
    }

    /// Sign a GET for `canonical_uri` (leading slash, already URI-encoded),
    /// returning the headers to attach.
    fn sign_get(&self, canonical_uri: &str) -> Vec<(&'static str, String)> {
        let now = Utc::now();
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let payload_hash = hex_sha256(b"");
        let host = self.host();

        // Header names sorted lexicographically, as SigV4 requires
        let signed_headers = "host;x-amz-content-sha256;x-amz-date";
        let canonical_headers = format!(
            "host:{host}\nx-amz-content-sha256:{payload_hash}\nx-amz-date:{amz_date}\n"
        );
        let canonical_request = format!(
            "GET\n{canonical_uri}\n\n{canonical_headers}\n{signed_headers}\n{payload_hash}"
        );

        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            credential_scope,
            hex_sha256(canonical_request.as_bytes())
        );

        let signing_key = derive_signing_key(
            &self.secret_access_key,
            &date_stamp,
            &self.region,
            "s3",
        );
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.access_key_id, credential_scope, signed_headers, signature
        );

        vec![
            ("Authorization", authorization),
            ("x-amz-content-sha256", payload_hash),
            ("x-amz-date", amz_date),
        ]
    }

    /// Send an authorized GET request for an object, returning the body.
    async fn get_object(&self, slug: &str, key: &str) -> Result<String, IngestError> {
        let encoded_key = key.split('/').map(uri_encode).collect::<Vec<_>>().join("/");
        let canonical_uri = format!("/{encoded_key}");
        let url = format!("https://{}{}", self.host(), canonical_uri);

        let mut request = self.http.get(&url);
        for (name, value) in self.sign_get(&canonical_uri) {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| {
            IngestError::metadata_with_source(slug, "metadata object unreachable", e)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::metadata(
                slug,
                format!("metadata object GET returned HTTP {}", status.as_u16()),
            ));
        }

        response.text().await.map_err(|e| {
            IngestError::metadata_with_source(slug, "metadata object body unreadable", e)
        })
    }
}

#[async_trait]
impl MetadataSource for MetadataBucket {
    async fn fetch(&self, slug: &str) -> Result<Value, IngestError> {
        let key = Self::metadata_key(slug);
        debug!(slug = %slug, key = %key, bucket = %self.bucket, "Fetching metadata object");
        let body = self.get_object(slug, &key).await?;
        serde_json::from_str(&body).map_err(|e| {
            IngestError::metadata_with_source(slug, "metadata object is not valid JSON", e)
        })
    }
}

/// Compute the hex-encoded SHA-256 hash of data.
fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute HMAC-SHA256 of data with the given key.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Compute hex-encoded HMAC-SHA256.
fn hex_hmac_sha256(key: &[u8], data: &[u8]) -> String {
    hex::encode(hmac_sha256(key, data))
}

/// Derive the AWS SigV4 signing key for a given date, region, and service.
///
/// ```text
/// kDate    = HMAC("AWS4" + secret, dateStamp)
/// kRegion  = HMAC(kDate, region)
/// kService = HMAC(kRegion, service)
/// kSigning = HMAC(kService, "aws4_request")
/// ```
fn derive_signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_key).as_bytes(),
        date_stamp.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// URI-encode a string per RFC 3986 (used in SigV4 canonical requests).
///
/// Encodes all characters except unreserved characters:
/// `A-Z a-z 0-9 - _ . ~`
fn uri_encode(s: &str) -> String {
    let mut result = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_key_is_lowercased() {
        assert_eq!(
            MetadataBucket::metadata_key("SSDC-MS-001"),
            "ssdc-ms-001/v/__main/metadata.json"
        );
        assert_eq!(
            MetadataBucket::metadata_key("ssdc-tr-042"),
            "ssdc-tr-042/v/__main/metadata.json"
        );
    }

    #[test]
    fn test_signing_key_derivation() {
        // Worked example from the AWS SigV4 documentation
        let key = derive_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_uri_encode() {
        assert_eq!(uri_encode("metadata.json"), "metadata.json");
        assert_eq!(uri_encode("__main"), "__main");
        assert_eq!(uri_encode("a b+c"), "a%20b%2Bc");
    }

    #[test]
    fn test_sign_get_header_shape() {
        let bucket = MetadataBucket::new(
            "spherex-docs",
            "us-west-1",
            "AKIAEXAMPLE",
            "secret",
            reqwest::Client::new(),
        );
        let headers = bucket.sign_get("/ssdc-ms-001/v/__main/metadata.json");
        assert_eq!(headers.len(), 3);
        let auth = &headers[0].1;
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIAEXAMPLE/"));
        assert!(auth.contains("/us-west-1/s3/aws4_request"));
        assert!(auth.contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date"));
        // Empty-payload hash is a fixed constant
        assert_eq!(
            headers[1].1,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
