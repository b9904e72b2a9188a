//! OAuth 1.0a request signing (HMAC-SHA1), as required by the v1.1 streaming API.

use crate::domain::model::Credentials;
use crate::utils::error::{AppError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 unreserved characters stay as-is, everything else is encoded.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

/// Per-request values. Fixed in tests, random/current in production.
#[derive(Debug, Clone)]
pub struct OAuthNonce {
    pub nonce: String,
    pub timestamp: i64,
}

impl OAuthNonce {
    pub fn generate() -> Self {
        Self {
            nonce: uuid::Uuid::new_v4().simple().to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Builds the value of the `Authorization` header for a request.
///
/// `params` are the request's query and form-body parameters, unencoded.
/// `url` must not carry a query string.
pub fn authorization_header(
    credentials: &Credentials,
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    nonce: &OAuthNonce,
) -> Result<String> {
    let timestamp = nonce.timestamp.to_string();
    let oauth_params: Vec<(&str, &str)> = vec![
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", nonce.nonce.as_str()),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", credentials.access_token.as_str()),
        ("oauth_version", "1.0"),
    ];

    let signature = sign(credentials, method, url, params, &oauth_params)?;

    let mut header_params: Vec<(String, String)> = oauth_params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    header_params.push(("oauth_signature".to_string(), signature));
    header_params.sort();

    let rendered: Vec<String> = header_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect();

    Ok(format!("OAuth {}", rendered.join(", ")))
}

pub fn signature_base_string(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    oauth_params: &[(&str, &str)],
) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .chain(oauth_params.iter())
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    // 先依 key 再依 value 排序
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(url),
        percent_encode(&param_string)
    )
}

fn sign(
    credentials: &Credentials,
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    oauth_params: &[(&str, &str)],
) -> Result<String> {
    let base = signature_base_string(method, url, params, oauth_params);
    let key = format!(
        "{}&{}",
        percent_encode(&credentials.consumer_secret),
        percent_encode(&credentials.access_secret)
    );

    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).map_err(|e| AppError::SignatureError {
            message: e.to_string(),
        })?;
    mac.update(base.as_bytes());

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Twitter 官方文件 "Creating a signature" 範例
    fn doc_credentials() -> Credentials {
        Credentials {
            consumer_key: "xvz1evFS4wEEPTGEFPHBog".to_string(),
            consumer_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".to_string(),
            access_token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".to_string(),
            access_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".to_string(),
        }
    }

    fn doc_nonce() -> OAuthNonce {
        OAuthNonce {
            nonce: "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg".to_string(),
            timestamp: 1318622958,
        }
    }

    const DOC_URL: &str = "https://api.twitter.com/1.1/statuses/update.json";
    const DOC_PARAMS: &[(&str, &str)] = &[
        ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
        ("include_entities", "true"),
    ];

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
        assert_eq!(percent_encode("An encoded string!"), "An%20encoded%20string%21");
        assert_eq!(percent_encode("Dogs, Cats & Mice"), "Dogs%2C%20Cats%20%26%20Mice");
        assert_eq!(percent_encode("☃"), "%E2%98%83");
        assert_eq!(percent_encode("a-b.c_d~e"), "a-b.c_d~e");
    }

    #[test]
    fn test_signature_matches_documented_example() {
        let creds = doc_credentials();
        let nonce = doc_nonce();
        let timestamp = nonce.timestamp.to_string();
        let oauth_params = [
            ("oauth_consumer_key", creds.consumer_key.as_str()),
            ("oauth_nonce", nonce.nonce.as_str()),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp.as_str()),
            ("oauth_token", creds.access_token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let base = signature_base_string("post", DOC_URL, DOC_PARAMS, &oauth_params);
        assert!(base.starts_with(
            "POST&https%3A%2F%2Fapi.twitter.com%2F1.1%2Fstatuses%2Fupdate.json&include_entities%3Dtrue%26oauth_consumer_key"
        ));

        let signature = sign(&creds, "POST", DOC_URL, DOC_PARAMS, &oauth_params).unwrap();
        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn test_authorization_header_layout() {
        let header =
            authorization_header(&doc_credentials(), "POST", DOC_URL, DOC_PARAMS, &doc_nonce())
                .unwrap();

        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
        assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
        assert!(header.contains("oauth_timestamp=\"1318622958\""));
        assert!(header.contains("oauth_version=\"1.0\""));
        // 請求參數不會出現在 header 裡
        assert!(!header.contains("status="));
    }

    #[test]
    fn test_generated_nonces_differ() {
        let a = OAuthNonce::generate();
        let b = OAuthNonce::generate();
        assert_ne!(a.nonce, b.nonce);
        assert!(a.nonce.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
