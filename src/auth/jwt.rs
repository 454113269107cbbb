//! Best-effort JWT claim lookup.
//!
//! **Not a trust boundary.** The signature is never verified. The value found
//! here is only ever used as a default organization id when a tool caller
//! omits one; it must not gate any authorization decision.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use serde_json::Value;

/// Claim paths checked in order; the first populated one wins.
pub const ORGANIZATION_CLAIMS: &[&[&str]] = &[
    &["organizationId"],
    &["org_id"],
    &["organization", "id"],
    &["org"],
    &["tenant_id"],
    &["tenantId"],
];

/// Claims stripped before the claim names are logged.
const NOISY_CLAIMS: &[&str] = &["exp", "iat", "sub"];

/// Decode the payload segment of a `header.payload.signature` token.
///
/// Returns `None` when the token does not have exactly three segments or the
/// payload is not base64-encoded JSON.
pub fn decode_payload(token: &str) -> Option<Value> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return None;
    }

    let mut payload = segments[1].to_string();
    while payload.len() % 4 != 0 {
        payload.push('=');
    }

    let bytes = URL_SAFE
        .decode(&payload)
        .or_else(|_| STANDARD.decode(&payload))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Return the first populated organization claim of a decoded payload.
///
/// Non-empty strings are returned as-is and numbers as their decimal text.
/// `null`, empty strings, booleans, arrays and objects count as absent.
pub fn organization_id_from_claims(claims: &Value) -> Option<String> {
    ORGANIZATION_CLAIMS
        .iter()
        .find_map(|path| lookup(claims, path).and_then(populated))
}

/// Decode `token` and look up its organization claim.
pub fn organization_id_from_token(token: &str) -> Option<String> {
    let Some(claims) = decode_payload(token) else {
        tracing::debug!("access token is not a decodable JWT; skipping organization discovery");
        return None;
    };

    let found = organization_id_from_claims(&claims);
    if found.is_none() {
        let names: Vec<&str> = claims
            .as_object()
            .map(|obj| {
                obj.keys()
                    .map(String::as_str)
                    .filter(|k| !NOISY_CLAIMS.contains(k))
                    .collect()
            })
            .unwrap_or_default();
        tracing::debug!(claims = ?names, "no organization claim in access token");
    }
    found
}

fn lookup<'a>(claims: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(claims, |v, key| v.get(*key))
}

fn populated(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
