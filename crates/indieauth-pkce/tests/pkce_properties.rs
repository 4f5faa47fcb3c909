//! Property tests for code verifiers and code challenges
//!
//! Challenges are checked against a SHA-256 computed here, independently of
//! the crate's own encoding path.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use indieauth_pkce::{
    ALPHABET, ChallengeMethod, PkceError, code_challenge, code_verifier, is_valid_code_verifier,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sha2::{Digest, Sha256};

proptest! {
    #[test]
    fn unseeded_verifier_has_requested_length_and_alphabet(len in 43usize..=128) {
        let verifier = code_verifier(len, None).unwrap();
        prop_assert_eq!(verifier.len(), len);
        prop_assert!(verifier.bytes().all(|b| ALPHABET.contains(&b)));
        prop_assert!(is_valid_code_verifier(&verifier));
    }

    #[test]
    fn seeded_verifier_is_deterministic(len in 43usize..=128, seed in any::<u64>()) {
        let first = code_verifier(len, Some(seed)).unwrap();
        let second = code_verifier(len, Some(seed)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn out_of_range_lengths_are_rejected(len in prop_oneof![0usize..43, 129usize..1024]) {
        let is_invalid_length = matches!(
            code_verifier(len, None),
            Err(PkceError::InvalidLength { .. })
        );
        prop_assert!(is_invalid_length);
    }

    #[test]
    fn plain_challenge_is_identity(verifier in ".*") {
        prop_assert_eq!(code_challenge(&verifier, ChallengeMethod::Plain), verifier);
    }

    #[test]
    fn s256_challenge_matches_independent_hash(verifier in "[A-Za-z0-9._~-]{43,128}") {
        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        let expected = URL_SAFE_NO_PAD.encode(hasher.finalize());
        prop_assert_eq!(code_challenge(&verifier, ChallengeMethod::S256), expected);
    }
}

#[test]
fn unseeded_verifiers_differ() {
    let a = code_verifier(128, None).unwrap();
    let b = code_verifier(128, None).unwrap();
    assert_ne!(a, b);
}

#[test]
fn rfc7636_appendix_b_vector() {
    assert_eq!(
        code_challenge(
            "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk",
            ChallengeMethod::S256
        ),
        "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
    );
}

#[test]
fn unsupported_method_is_an_error() {
    assert_eq!(
        "S384".parse::<ChallengeMethod>(),
        Err(PkceError::UnsupportedMethod("S384".to_string()))
    );
}
