//! ARC-4 contract ABI: method signatures, selectors and value encoding.

use crate::crypto::sha512_256;
use crate::domain::account::AccountIdentifier;
use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix marking the log entry that carries a method's return value.
pub const RETURN_LOG_PREFIX: [u8; 4] = [0x15, 0x1f, 0x7c, 0x75];

/// Longest string an ARC-4 `string` can carry (two-byte length prefix).
pub const MAX_STRING_BYTES: usize = u16::MAX as usize;

const ARC4_TRUE: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbiType {
    Address,
    Uint64,
    Bool,
    String,
    Void,
}

impl AbiType {
    pub fn name(&self) -> &'static str {
        match self {
            AbiType::Address => "address",
            AbiType::Uint64 => "uint64",
            AbiType::Bool => "bool",
            AbiType::String => "string",
            AbiType::Void => "void",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AbiValue {
    Address(AccountIdentifier),
    Uint64(u64),
    Bool(bool),
    String(String),
}

impl AbiValue {
    pub fn abi_type(&self) -> AbiType {
        match self {
            AbiValue::Address(_) => AbiType::Address,
            AbiValue::Uint64(_) => AbiType::Uint64,
            AbiValue::Bool(_) => AbiType::Bool,
            AbiValue::String(_) => AbiType::String,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AbiValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// False for strings too long for the two-byte length prefix.
    pub fn is_encodable(&self) -> bool {
        match self {
            AbiValue::String(s) => s.len() <= MAX_STRING_BYTES,
            _ => true,
        }
    }

    /// Wire form of the value. Strings past [`MAX_STRING_BYTES`] are cut at
    /// the cap; the transaction builder refuses them before they get here.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            AbiValue::Address(account) => account.public_key().to_vec(),
            AbiValue::Uint64(n) => n.to_be_bytes().to_vec(),
            AbiValue::Bool(b) => vec![if *b { ARC4_TRUE } else { 0x00 }],
            AbiValue::String(s) => {
                let len = s.len().min(MAX_STRING_BYTES);
                let mut out = Vec::with_capacity(2 + len);
                out.extend_from_slice(&(len as u16).to_be_bytes());
                out.extend_from_slice(&s.as_bytes()[..len]);
                out
            }
        }
    }

    pub fn decode(ty: AbiType, bytes: &[u8]) -> Result<Option<AbiValue>, LedgerError> {
        let malformed =
            |what: &str| LedgerError::Malformed(format!("{what}: {}", hex::encode(bytes)));
        match ty {
            AbiType::Void => Ok(None),
            AbiType::Bool => match bytes {
                [b] => Ok(Some(AbiValue::Bool(b & ARC4_TRUE != 0))),
                _ => Err(malformed("bool must be one byte")),
            },
            AbiType::Uint64 => {
                let arr: [u8; 8] = bytes
                    .try_into()
                    .map_err(|_| malformed("uint64 must be eight bytes"))?;
                Ok(Some(AbiValue::Uint64(u64::from_be_bytes(arr))))
            }
            AbiType::Address => {
                let arr: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| malformed("address must be 32 bytes"))?;
                Ok(Some(AbiValue::Address(AccountIdentifier::from_public_key(arr))))
            }
            AbiType::String => {
                if bytes.len() < 2 {
                    return Err(malformed("string missing length prefix"));
                }
                let len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
                let body = &bytes[2..];
                if body.len() != len {
                    return Err(malformed("string length prefix mismatch"));
                }
                let s = String::from_utf8(body.to_vec())
                    .map_err(|_| malformed("string not utf-8"))?;
                Ok(Some(AbiValue::String(s)))
            }
        }
    }
}

/// A contract entry point with typed arguments and return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiMethod {
    pub name: String,
    pub args: Vec<AbiType>,
    pub returns: AbiType,
}

impl AbiMethod {
    pub fn new(name: &str, args: &[AbiType], returns: AbiType) -> Self {
        Self {
            name: name.to_string(),
            args: args.to_vec(),
            returns,
        }
    }

    /// Canonical signature, e.g. `grant(address,uint64)void`.
    pub fn signature(&self) -> String {
        let args: Vec<&str> = self.args.iter().map(AbiType::name).collect();
        format!("{}({}){}", self.name, args.join(","), self.returns.name())
    }

    /// First four bytes of SHA-512/256 over the signature.
    pub fn selector(&self) -> [u8; 4] {
        let digest = sha512_256(self.signature().as_bytes());
        [digest[0], digest[1], digest[2], digest[3]]
    }

    pub fn accepts(&self, values: &[AbiValue]) -> bool {
        self.args.len() == values.len()
            && self.args.iter().zip(values).all(|(t, v)| *t == v.abi_type())
    }

    /// Finds and decodes the return value in a confirmed transaction's logs.
    pub fn decode_return(&self, logs: &[Vec<u8>]) -> Result<Option<AbiValue>, LedgerError> {
        if self.returns == AbiType::Void {
            return Ok(None);
        }
        let Some(log) = logs.iter().rev().find(|l| l.starts_with(&RETURN_LOG_PREFIX)) else {
            return Ok(None);
        };
        AbiValue::decode(self.returns, &log[RETURN_LOG_PREFIX.len()..])
    }

    pub fn register() -> Self {
        Self::new("register", &[AbiType::String], AbiType::Void)
    }

    pub fn get_registered_hash() -> Self {
        Self::new("get_registered_hash", &[AbiType::Address], AbiType::String)
    }

    pub fn grant() -> Self {
        Self::new("grant", &[AbiType::Address, AbiType::Uint64], AbiType::Void)
    }

    pub fn revoke() -> Self {
        Self::new("revoke", &[AbiType::Address], AbiType::Void)
    }

    pub fn has_permission() -> Self {
        Self::new("has_permission", &[AbiType::Address], AbiType::Bool)
    }
}

impl fmt::Display for AbiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

/// Wraps an encoded value into a return log entry.
pub fn return_log(value: &AbiValue) -> Vec<u8> {
    let mut log = RETURN_LOG_PREFIX.to_vec();
    log.extend(value.encode());
    log
}
