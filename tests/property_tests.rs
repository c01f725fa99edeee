//! Property-based tests for the probe
//!
//! These tests verify invariants that must hold for all inputs:
//! - Session ids keep their shape and ordering
//! - Basic auth headers always decode to `public:secret`
//! - Config lookup never panics and never invents a secret
//!
//! Run with: cargo test --test property_tests

use proptest::prelude::*;

// ============================================================================
// SESSION ID TESTS
// ============================================================================

mod session_id_tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use langfuse_probe::checks::session_id_at;

    fn epoch_of(id: &str) -> i64 {
        id.strip_prefix("test-session-")
            .expect("session id prefix")
            .parse()
            .expect("session id suffix is numeric")
    }

    proptest! {
        /// Invariant: ids are `test-session-` followed by digits only
        #[test]
        fn shape(secs in 0i64..4_102_444_800) {
            let id = session_id_at(Utc.timestamp_opt(secs, 0).unwrap());
            let suffix = id.strip_prefix("test-session-").unwrap();
            prop_assert!(!suffix.is_empty());
            prop_assert!(suffix.chars().all(|c| c.is_ascii_digit()));
        }

        /// Invariant: later runs never get a smaller id
        #[test]
        fn non_decreasing(a in 0i64..4_102_444_800, delta in 0i64..1_000_000) {
            let first = session_id_at(Utc.timestamp_opt(a, 0).unwrap());
            let second = session_id_at(Utc.timestamp_opt(a + delta, 0).unwrap());
            prop_assert!(epoch_of(&first) <= epoch_of(&second));
        }
    }
}

// ============================================================================
// BASIC AUTH TESTS
// ============================================================================

mod basic_auth_tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use langfuse_probe::api::basic_auth_header;

    proptest! {
        /// Invariant: the encoded credentials are exactly `public:secret`
        #[test]
        fn decodes_to_pair(public in "pk-lf-[a-z0-9-]{0,40}", secret in "\\PC{0,64}") {
            let header = basic_auth_header(&public, &secret);
            let encoded = header.strip_prefix("Basic ").unwrap();
            let decoded = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
            prop_assert_eq!(decoded, format!("{}:{}", public, secret));
        }
    }
}

// ============================================================================
// CONFIG TESTS
// ============================================================================

mod config_tests {
    use super::*;
    use langfuse_probe::config::{ProbeConfig, HOST_ENV, SECRET_KEY_ENV};

    proptest! {
        /// Invariant: hosts never keep a trailing slash
        #[test]
        fn host_has_no_trailing_slash(host in "https?://[a-z]{1,12}(:[0-9]{2,5})?/{0,3}") {
            let config = ProbeConfig::from_lookup(|k| (k == HOST_ENV).then(|| host.clone()));
            prop_assert!(!config.host.ends_with('/'));
        }

        /// Invariant: blank secrets are treated as missing
        #[test]
        fn blank_secret_is_missing(secret in "\\s{0,8}") {
            let config = ProbeConfig::from_lookup(|k| (k == SECRET_KEY_ENV).then(|| secret.clone()));
            prop_assert!(config.secret_key.is_none());
        }
    }
}
