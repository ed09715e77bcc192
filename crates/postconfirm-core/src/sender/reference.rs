//! Confirmation reference minting.

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

use super::model::Reference;
use crate::config::ReferenceScheme;

/// Mint a fresh reference for `email` using `scheme`.
#[must_use]
pub fn mint(email: &str, scheme: ReferenceScheme) -> Reference {
    match scheme {
        ReferenceScheme::Timestamp => from_timestamp(email, Utc::now()),
        ReferenceScheme::Random => from_random(email),
    }
}

/// Hex SHA-256 of `"{email}_{timestamp}"` with microsecond resolution.
#[must_use]
pub fn from_timestamp(email: &str, now: DateTime<Utc>) -> Reference {
    let stamp = now.to_rfc3339_opts(SecondsFormat::Micros, true);
    digest(format!("{email}_{stamp}").as_bytes())
}

fn from_random(email: &str) -> Reference {
    let salt: [u8; 32] = rand::thread_rng().r#gen();
    let mut data = Vec::with_capacity(email.len() + 1 + salt.len());
    data.extend_from_slice(email.as_bytes());
    data.push(b'_');
    data.extend_from_slice(&salt);
    digest(&data)
}

fn digest(data: &[u8]) -> Reference {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Reference::new(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn is_hex_sha256(reference: &Reference) -> bool {
        reference.as_str().len() == 64
            && reference.as_str().chars().all(|c| c.is_ascii_hexdigit())
    }

    #[test]
    fn test_timestamp_reference_is_deterministic_for_instant() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single();
        let Some(now) = now else {
            panic!("valid timestamp");
        };
        let a = from_timestamp("a@example.com", now);
        let b = from_timestamp("a@example.com", now);
        assert_eq!(a, b);
        assert!(is_hex_sha256(&a));
    }

    #[test]
    fn test_timestamp_reference_changes_with_time() {
        let base = Utc::now();
        let later = base + chrono::Duration::microseconds(1);
        assert_ne!(
            from_timestamp("a@example.com", base),
            from_timestamp("a@example.com", later)
        );
    }

    #[test]
    fn test_timestamp_reference_changes_with_email() {
        let now = Utc::now();
        assert_ne!(
            from_timestamp("a@example.com", now),
            from_timestamp("b@example.com", now)
        );
    }

    #[test]
    fn test_random_scheme() {
        let a = mint("a@example.com", ReferenceScheme::Random);
        let b = mint("a@example.com", ReferenceScheme::Random);
        assert!(is_hex_sha256(&a));
        assert_ne!(a, b);
    }
}
