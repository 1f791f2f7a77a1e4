//! Webhook signature verification
//!
//! Pure functions; callers supply the current unix time so verification
//! stays deterministic.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Accepted clock skew for signed events, in seconds
pub const TIMESTAMP_WINDOW_SECS: i64 = 300;

fn request_mac(auth_token: &str, url: &str, params: &[(String, String)]) -> HmacSha1 {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut mac =
        HmacSha1::new_from_slice(auth_token.as_bytes()).expect("hmac accepts any key length");
    mac.update(url.as_bytes());
    for (name, value) in sorted {
        mac.update(name.as_bytes());
        mac.update(value.as_bytes());
    }
    mac
}

/// Compute the provider request signature: HMAC-SHA1 over the request URL
/// followed by every POST parameter name and value sorted by name,
/// base64-encoded.
pub fn request_signature(auth_token: &str, url: &str, params: &[(String, String)]) -> String {
    BASE64.encode(request_mac(auth_token, url, params).finalize().into_bytes())
}

/// Verify the provider-supplied request signature header
pub fn verify_request_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
    provided: &str,
) -> bool {
    let Ok(provided) = BASE64.decode(provided) else {
        return false;
    };
    request_mac(auth_token, url, params)
        .verify_slice(&provided)
        .is_ok()
}

/// Verify an Ed25519-signed event from the alternate provider.
///
/// The signed message is `timestamp || "|" || raw_body`; events older or
/// newer than [`TIMESTAMP_WINDOW_SECS`] are rejected regardless of the
/// signature.
pub fn verify_event_signature(
    public_key: &[u8; 32],
    timestamp: &str,
    raw_body: &[u8],
    signature: &[u8],
    now_unix: i64,
) -> bool {
    let Ok(ts) = timestamp.parse::<i64>() else {
        return false;
    };
    if (now_unix - ts).abs() > TIMESTAMP_WINDOW_SECS {
        return false;
    }

    let Ok(key) = VerifyingKey::from_bytes(public_key) else {
        return false;
    };
    let Ok(sig) = Signature::from_slice(signature) else {
        return false;
    };

    let mut message = Vec::with_capacity(timestamp.len() + 1 + raw_body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.push(b'|');
    message.extend_from_slice(raw_body);

    key.verify(&message, &sig).is_ok()
}
