//! Shared primitive types

/// Content fingerprint of a file (BLAKE3, 32 bytes)
pub type Digest = [u8; 32];
