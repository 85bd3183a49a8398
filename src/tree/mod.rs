//! Filesystem side of the mirror
//!
//! Content comparison, entry classification and path mapping between the
//! source and replica roots.

pub mod hasher;
pub mod path;
pub mod walker;
