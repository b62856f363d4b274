// Content hashing for identities, ticket metadata and protocol identifiers.

use primitive_types::H256;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512_256};
use std::fmt;

/// SHA-256 of an arbitrary byte sequence.
pub fn digest_bytes(input: &[u8]) -> H256 {
    H256::from_slice(&Sha256::digest(input))
}

/// Lowercase hex SHA-256 of a UTF-8 string (64 characters).
pub fn digest_hex(input: &str) -> String {
    hex::encode(digest_bytes(input.as_bytes()).as_bytes())
}

/// SHA-512/256, the ledger's native hash (address checksums, ABI selectors, tx ids).
pub fn sha512_256(input: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha512_256::digest(input));
    out
}

/// Pseudonymous registration credential: SHA-256 of the raw identity string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityHash(H256);

impl IdentityHash {
    /// Hashes `identity` exactly as given. Callers trim user input first.
    pub fn of(identity: &str) -> Self {
        Self(digest_bytes(identity.as_bytes()))
    }

    /// The 64-char lowercase hex form, which is what gets registered on-chain.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.as_bytes())
    }
}

impl fmt::Display for IdentityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Integrity hash bound into a minted ticket's asset parameters.
///
/// Computed over `"{description}:{nonce}"` where the nonce is the creation
/// time in unix milliseconds, so repeated mints of the same event differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetadataDigest(H256);

impl MetadataDigest {
    pub fn compute(description: &str, nonce_millis: i64) -> Self {
        let preimage = format!("{description}:{nonce_millis}");
        Self(digest_bytes(preimage.as_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0.as_bytes())
    }
}

impl fmt::Display for MetadataDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn digest_hex_matches_known_vector() {
        assert_eq!(
            digest_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn identity_hash_is_plain_sha256_of_student_id() {
        let hash = IdentityHash::of("S12345");
        let expected = hex::encode(Sha256::digest(b"S12345"));
        assert_eq!(hash.to_hex(), expected);
        assert_eq!(hash.to_string().len(), 64);
        assert!(hash
            .to_hex()
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn metadata_digest_changes_with_nonce() {
        let first = MetadataDigest::compute("Fall Fest", 1_700_000_000_000);
        let second = MetadataDigest::compute("Fall Fest", 1_700_000_001_000);
        assert_ne!(first, second);
        assert_eq!(first, MetadataDigest::compute("Fall Fest", 1_700_000_000_000));
        assert_eq!(
            first.to_hex(),
            digest_hex("Fall Fest:1700000000000")
        );
    }

    proptest! {
        #[test]
        fn digest_hex_is_stable_and_64_chars(s in ".*") {
            let a = digest_hex(&s);
            prop_assert_eq!(a.len(), 64);
            prop_assert_eq!(a, digest_hex(&s));
        }

        #[test]
        fn distinct_inputs_hash_differently(a in ".{0,32}", b in ".{0,32}") {
            prop_assume!(a != b);
            prop_assert_ne!(digest_hex(&a), digest_hex(&b));
        }
    }
}
