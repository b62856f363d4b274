//! Storage keys for records held in contract box storage.
//!
//! The permission contract declares its box map with `key_prefix=b"perm_"` and
//! indexes it by the 32 raw public-key bytes of the account. The client must
//! produce the exact same bytes or box references silently miss.

use crate::domain::account::AccountIdentifier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace prefix of the permission box map.
pub const PERMISSION_KEY_PREFIX: &[u8] = b"perm_";

/// Raw byte key addressing one record in contract storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StorageKey(Vec<u8>);

impl StorageKey {
    pub fn namespaced(prefix: &[u8], body: &[u8]) -> Self {
        let mut key = Vec::with_capacity(prefix.len() + body.len());
        key.extend_from_slice(prefix);
        key.extend_from_slice(body);
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Box key under which the permission contract stores `account`'s expiry.
///
/// Taking an [`AccountIdentifier`] means the address has already been decoded;
/// use [`permission_key_for`] to go straight from text.
pub fn permission_key(account: &AccountIdentifier) -> StorageKey {
    StorageKey::namespaced(PERMISSION_KEY_PREFIX, account.public_key())
}

/// Parses `raw` and derives its permission key; fails with `InvalidAccount`.
pub fn permission_key_for(raw: &str) -> crate::error::Result<StorageKey> {
    let account = AccountIdentifier::parse(raw)?;
    Ok(permission_key(&account))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccessError;
    use proptest::prelude::*;

    #[test]
    fn key_is_prefix_then_public_key() {
        let account = AccountIdentifier::from_public_key([0xAB; 32]);
        let key = permission_key(&account);
        assert_eq!(key.as_bytes().len(), 37);
        assert_eq!(&key.as_bytes()[..5], b"perm_");
        assert_eq!(&key.as_bytes()[5..], &[0xAB; 32]);
        assert_eq!(key.to_hex(), format!("7065726d5f{}", "ab".repeat(32)));
    }

    #[test]
    fn malformed_address_fails_before_derivation() {
        assert!(matches!(
            permission_key_for("campus-admin"),
            Err(AccessError::InvalidAccount(_))
        ));
    }

    proptest! {
        #[test]
        fn derivation_is_deterministic_and_prefixed(pk in any::<[u8; 32]>()) {
            let account = AccountIdentifier::from_public_key(pk);
            let key = permission_key(&account);
            prop_assert_eq!(&key.as_bytes()[..5], PERMISSION_KEY_PREFIX);
            prop_assert_eq!(key.clone(), permission_key_for(account.as_str()).unwrap());
        }

        #[test]
        fn distinct_accounts_get_distinct_keys(a in any::<[u8; 32]>(), b in any::<[u8; 32]>()) {
            prop_assume!(a != b);
            let ka = permission_key(&AccountIdentifier::from_public_key(a));
            let kb = permission_key(&AccountIdentifier::from_public_key(b));
            prop_assert_ne!(ka, kb);
        }
    }
}
