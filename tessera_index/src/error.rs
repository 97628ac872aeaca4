// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by the index for contract violations.

use thiserror::Error;

/// Misuse of the keyed write API.
///
/// Removal of an absent key is not an error; see [`IndexGeneric::remove`](crate::IndexGeneric::remove).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexError {
    /// `insert` was called for a key that is already live.
    #[error("key is already present in the index")]
    DuplicateKey,

    /// `update` was called for a key that is not live.
    #[error("key is not present in the index")]
    UnknownKey,
}
