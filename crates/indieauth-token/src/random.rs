//! Opaque random identifiers for `jti` claims and refresh tokens

use rand::Rng;

/// URL-safe alphabet, 64 symbols
const URL_ALPHABET: &[u8; 64] =
    b"ModuleSymbhasOwnPr-0123456789ABCDEFGHNRVfgctiUvz_KqYTJkLxpZXIjQW";

/// Length of generated ids (~126 bits of entropy)
pub const ID_LEN: usize = 21;

/// Generate a 21-character URL-safe random id
pub fn random_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| char::from(URL_ALPHABET[rng.gen_range(0..URL_ALPHABET.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_alphabet_is_64_distinct_url_safe_symbols() {
        let set: HashSet<u8> = URL_ALPHABET.iter().copied().collect();
        assert_eq!(set.len(), 64);
        assert!(
            URL_ALPHABET
                .iter()
                .all(|b| b.is_ascii_alphanumeric() || *b == b'-' || *b == b'_')
        );
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| random_id()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.len() == ID_LEN));
    }
}
