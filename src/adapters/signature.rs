//! Webhook signature verification and test/live mode resolution.
//!
//! The payload is verified as raw bytes against HMAC-SHA256 over
//! `"{timestamp}.{payload}"`, per the provider's signing scheme. Both
//! credential sets are tried; whichever secret verifies names the mode.
//! Nothing caller-supplied (livemode flag, id prefixes) is ever the
//! determinant — only the signature itself.

use {
    crate::domain::{error::ReconcileError, mode::StripeMode},
    hmac::{Hmac, Mac},
    sha2::Sha256,
    std::time::{SystemTime, UNIX_EPOCH},
};

type HmacSha256 = Hmac<Sha256>;

/// Clock-skew tolerance for the signed timestamp.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Clone)]
pub struct WebhookSecrets {
    pub test: String,
    pub live: String,
}

struct SignatureHeader<'a> {
    timestamp: i64,
    signatures: Vec<&'a str>,
}

/// Parse `t=<ts>,v1=<sig>[,v1=<sig>...]`, ignoring unknown schemes.
fn parse_header(header: &str) -> Result<SignatureHeader<'_>, ReconcileError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let mut kv = part.splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("t"), Some(v)) => timestamp = v.trim().parse().ok(),
            (Some("v1"), Some(v)) => signatures.push(v.trim()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        ReconcileError::InvalidSignature("missing timestamp in signature header".into())
    })?;
    if signatures.is_empty() {
        return Err(ReconcileError::InvalidSignature(
            "no v1 signature found".into(),
        ));
    }
    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn matches_secret(payload: &[u8], header: &SignatureHeader<'_>, secret: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(format!("{}.", header.timestamp).as_bytes());
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    header
        .signatures
        .iter()
        .any(|sig| constant_time_eq(expected.as_bytes(), sig.as_bytes()))
}

/// Verify the payload and determine which mode's secret signed it.
pub fn verify_and_resolve_mode(
    payload: &[u8],
    sig_header: &str,
    secrets: &WebhookSecrets,
    tolerance_secs: i64,
) -> Result<StripeMode, ReconcileError> {
    let header = parse_header(sig_header)?;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    let skew = (now - header.timestamp).abs();
    if skew > tolerance_secs {
        return Err(ReconcileError::InvalidSignature(format!(
            "timestamp outside tolerance: skew {skew}s > {tolerance_secs}s"
        )));
    }

    if matches_secret(payload, &header, &secrets.live) {
        Ok(StripeMode::Live)
    } else if matches_secret(payload, &header, &secrets.test) {
        Ok(StripeMode::Test)
    } else {
        Err(ReconcileError::InvalidSignature(
            "no configured secret verifies this payload".into(),
        ))
    }
}
