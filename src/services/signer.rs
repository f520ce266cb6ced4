//! AWS-style V4 request signing. Used for presigned object-store upload
//! URLs, authenticated object deletion, and the SES-style email API.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// RFC 3986 percent-encoding as the V4 canonicalization requires.
/// Slashes are preserved in URI paths but encoded in query values.
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'/' if !encode_slash => out.push('/'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

fn scope(date: &str, region: &str, service: &str) -> String {
    format!("{}/{}/{}/aws4_request", date, region, service)
}

fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> String {
    format!(
        "AWS4-HMAC-SHA256\n{}\n{}\n{}",
        amz_date,
        scope,
        sha256_hex(canonical_request.as_bytes())
    )
}

/// Build a presigned URL granting one HTTP method on one object path for a
/// limited time. Only the `host` header is signed, so the client is free to
/// set its own content type on upload.
pub fn presign_url(
    method: &str,
    endpoint: &str,
    path: &str,
    region: &str,
    credentials: &Credentials,
    expires_secs: u64,
    now: DateTime<Utc>,
) -> String {
    let host = host_of(endpoint);
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();
    let scope = scope(&date, region, "s3");

    let credential = format!("{}/{}", credentials.access_key_id, scope);
    let query_pairs = [
        ("X-Amz-Algorithm", "AWS4-HMAC-SHA256".to_string()),
        ("X-Amz-Credential", credential),
        ("X-Amz-Date", amz_date.clone()),
        ("X-Amz-Expires", expires_secs.to_string()),
        ("X-Amz-SignedHeaders", "host".to_string()),
    ];
    let canonical_query = query_pairs
        .iter()
        .map(|(k, v)| format!("{}={}", uri_encode(k, true), uri_encode(v, true)))
        .collect::<Vec<_>>()
        .join("&");

    let canonical_request = format!(
        "{}\n{}\n{}\nhost:{}\n\nhost\n{}",
        method,
        uri_encode(path, false),
        canonical_query,
        host,
        UNSIGNED_PAYLOAD
    );

    let to_sign = string_to_sign(&amz_date, &scope, &canonical_request);
    let key = signing_key(&credentials.secret_access_key, &date, region, "s3");
    let signature = hex::encode(hmac_sha256(&key, to_sign.as_bytes()));

    format!(
        "{}{}?{}&X-Amz-Signature={}",
        endpoint.trim_end_matches('/'),
        uri_encode(path, false),
        canonical_query,
        signature
    )
}

/// Headers for a signed (non-presigned) request: x-amz-date,
/// x-amz-content-sha256, and the Authorization header.
pub fn sign_headers(
    method: &str,
    endpoint: &str,
    path: &str,
    query: &str,
    payload: &[u8],
    service: &str,
    region: &str,
    credentials: &Credentials,
    now: DateTime<Utc>,
) -> Vec<(&'static str, String)> {
    let host = host_of(endpoint);
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();
    let scope = scope(&date, region, service);
    let payload_hash = sha256_hex(payload);

    let canonical_request = format!(
        "{}\n{}\n{}\nhost:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n\nhost;x-amz-content-sha256;x-amz-date\n{}",
        method,
        uri_encode(path, false),
        query,
        host,
        payload_hash,
        amz_date,
        payload_hash
    );

    let to_sign = string_to_sign(&amz_date, &scope, &canonical_request);
    let key = signing_key(&credentials.secret_access_key, &date, region, service);
    let signature = hex::encode(hmac_sha256(&key, to_sign.as_bytes()));

    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders=host;x-amz-content-sha256;x-amz-date, Signature={}",
        credentials.access_key_id, scope, signature
    );

    vec![
        ("x-amz-date", amz_date),
        ("x-amz-content-sha256", payload_hash),
        ("authorization", authorization),
    ]
}

fn host_of(endpoint: &str) -> String {
    endpoint
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn creds() -> Credentials {
        Credentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string(),
        }
    }

    #[test]
    fn uri_encode_preserves_unreserved_characters() {
        assert_eq!(uri_encode("abc-123_~.txt", true), "abc-123_~.txt");
        assert_eq!(uri_encode("a b+c", true), "a%20b%2Bc");
        assert_eq!(uri_encode("/bucket/a b.mp4", false), "/bucket/a%20b.mp4");
        assert_eq!(uri_encode("a/b", true), "a%2Fb");
    }

    #[test]
    fn presigned_url_shape() {
        let now = Utc.with_ymd_and_hms(2025, 5, 4, 12, 0, 0).unwrap();
        let url = presign_url(
            "PUT",
            "https://storage.example.com",
            "/bucket/videos/clip.mp4",
            "us-east-1",
            &creds(),
            3600,
            now,
        );
        assert!(url.starts_with("https://storage.example.com/bucket/videos/clip.mp4?"));
        assert!(url.contains("X-Amz-Algorithm=AWS4-HMAC-SHA256"));
        assert!(url.contains("X-Amz-Date=20250504T120000Z"));
        assert!(url.contains("X-Amz-Expires=3600"));
        let signature = url.split("X-Amz-Signature=").nth(1).unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signing_is_deterministic_and_key_sensitive() {
        let now = Utc.with_ymd_and_hms(2025, 5, 4, 12, 0, 0).unwrap();
        let a = presign_url("PUT", "https://s.example.com", "/b/k", "us-east-1", &creds(), 60, now);
        let b = presign_url("PUT", "https://s.example.com", "/b/k", "us-east-1", &creds(), 60, now);
        assert_eq!(a, b);

        let other = Credentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "different".to_string(),
        };
        let c = presign_url("PUT", "https://s.example.com", "/b/k", "us-east-1", &other, 60, now);
        assert_ne!(a, c);
    }

    #[test]
    fn signed_headers_include_authorization() {
        let now = Utc.with_ymd_and_hms(2025, 5, 4, 12, 0, 0).unwrap();
        let headers = sign_headers(
            "DELETE",
            "https://storage.example.com",
            "/bucket/key.png",
            "",
            b"",
            "s3",
            "us-east-1",
            &creds(),
            now,
        );
        let auth = &headers.iter().find(|(k, _)| *k == "authorization").unwrap().1;
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20250504/us-east-1/s3/aws4_request"));
        assert!(auth.contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date"));
    }
}
