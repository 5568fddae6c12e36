use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
const SIGNATURE_PREFIX: &str = "sha256=";

fn mac_for(secret: &str, payload: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload);
    Some(mac)
}

/// Signature string in the format "sha256=<hex>", as Meta sends it.
pub fn sign_payload(payload: &[u8], secret: &str) -> String {
    let hex_digest = mac_for(secret, payload)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default();
    format!("{}{}", SIGNATURE_PREFIX, hex_digest)
}

/// Verifies an `X-Hub-Signature-256` header value against the raw body.
/// The digest comparison is constant-time.
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    let Some(hex_digest) = signature.trim().strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };
    match mac_for(secret, payload) {
        Some(mac) => mac.verify_slice(&expected).is_ok(),
        None => false,
    }
}
