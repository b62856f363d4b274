//! Validated identifiers: ledger accounts, applications and assets.

use crate::crypto::sha512_256;
use crate::error::AccessError;
use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

const PUBLIC_KEY_LEN: usize = 32;
const CHECKSUM_LEN: usize = 4;
const ADDRESS_LEN: usize = 58;

/// A well-formed ledger account address.
///
/// Parsing checks length, base32 alphabet and the trailing 4-byte checksum
/// (last bytes of SHA-512/256 over the public key), so holding one means the
/// canonical public key bytes are available.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountIdentifier {
    address: String,
    public_key: [u8; PUBLIC_KEY_LEN],
}

impl AccountIdentifier {
    pub fn parse(raw: &str) -> Result<Self, AccessError> {
        let address = raw.trim();
        if address.len() != ADDRESS_LEN {
            return Err(AccessError::InvalidAccount(format!(
                "expected {ADDRESS_LEN} characters, got {}",
                address.len()
            )));
        }
        let decoded = BASE32_NOPAD
            .decode(address.as_bytes())
            .map_err(|e| AccessError::InvalidAccount(format!("not base32: {e}")))?;
        if decoded.len() != PUBLIC_KEY_LEN + CHECKSUM_LEN {
            return Err(AccessError::InvalidAccount("decoded length mismatch".into()));
        }

        let mut public_key = [0u8; PUBLIC_KEY_LEN];
        public_key.copy_from_slice(&decoded[..PUBLIC_KEY_LEN]);
        if decoded[PUBLIC_KEY_LEN..] != checksum(&public_key) {
            return Err(AccessError::InvalidAccount("checksum mismatch".into()));
        }

        Ok(Self {
            address: address.to_string(),
            public_key,
        })
    }

    /// Builds the canonical address for a raw public key.
    pub fn from_public_key(public_key: [u8; PUBLIC_KEY_LEN]) -> Self {
        let mut bytes = Vec::with_capacity(PUBLIC_KEY_LEN + CHECKSUM_LEN);
        bytes.extend_from_slice(&public_key);
        bytes.extend_from_slice(&checksum(&public_key));
        Self {
            address: BASE32_NOPAD.encode(&bytes),
            public_key,
        }
    }

    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public_key
    }

    pub fn as_str(&self) -> &str {
        &self.address
    }
}

fn checksum(public_key: &[u8; PUBLIC_KEY_LEN]) -> [u8; CHECKSUM_LEN] {
    let digest = sha512_256(public_key);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[PUBLIC_KEY_LEN - CHECKSUM_LEN..]);
    out
}

impl FromStr for AccountIdentifier {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccountIdentifier {
    type Error = AccessError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccountIdentifier> for String {
    fn from(value: AccountIdentifier) -> Self {
        value.address
    }
}

impl fmt::Display for AccountIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

impl fmt::Debug for AccountIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountIdentifier({})", self.address)
    }
}

macro_rules! positive_id {
    ($(#[$meta:meta])* $name:ident, $err:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(NonZeroU64);

        impl $name {
            pub fn new(value: u64) -> Option<Self> {
                NonZeroU64::new(value).map(Self)
            }

            pub fn get(&self) -> u64 {
                self.0.get()
            }
        }

        impl TryFrom<i64> for $name {
            type Error = AccessError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                u64::try_from(value)
                    .ok()
                    .and_then(Self::new)
                    .ok_or_else(|| $err(value.to_string()))
            }
        }

        impl FromStr for $name {
            type Err = AccessError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                trimmed
                    .parse::<u64>()
                    .ok()
                    .and_then(Self::new)
                    .ok_or_else(|| $err(trimmed.to_string()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

positive_id!(
    /// Identifier of a deployed contract (application).
    AppId,
    |v: String| AccessError::Config(format!("app id must be a positive integer, got {v:?}"))
);

positive_id!(
    /// Identifier of a ledger asset (ticket token).
    AssetId,
    AccessError::InvalidAssetId
);
