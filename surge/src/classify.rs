//! Classification of raw response bodies into outcomes.
use lazy_static::lazy_static;
use regex::Regex;
use surge_core::{error_message, Outcome};

lazy_static! {
    static ref INSUFFICIENT_FUNDS: Regex =
        Regex::new(r"sender balance < tx cost \(\d+ < \d+\): insufficient fund")
            .expect("valid insufficient funds pattern");
    static ref NONCE_CONFLICT: Regex =
        Regex::new(r"expected (\d+)").expect("valid nonce pattern");
}

/// Classify a response body that came back from the endpoint.
///
/// Insufficient funds is checked before the nonce pattern. Anything else counts as success.
pub fn classify(body: &str) -> Outcome {
    let message = || error_message(body).unwrap_or_else(|| body.to_string());

    if INSUFFICIENT_FUNDS.is_match(body) {
        return Outcome::InsufficientFunds { message: message() };
    }

    if let Some(digits) = NONCE_CONFLICT.captures(body).and_then(|caps| caps.get(1)) {
        // A match is a conflict even when the reported nonce overflows.
        let expected = digits.as_str().parse::<u64>().unwrap_or(u64::MAX);
        return Outcome::NonceConflict {
            expected,
            message: message(),
        };
    }

    Outcome::Success
}
