pub mod hashing;

pub use hashing::{digest_bytes, digest_hex, sha512_256, IdentityHash, MetadataDigest};
