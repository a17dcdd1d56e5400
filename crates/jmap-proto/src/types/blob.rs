/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use sha1::{Digest, Sha1};
use std::{fmt, str::FromStr};

/// Length of the printable form: the `G` sentinel plus the 40 hex
/// digits of the content SHA-1.
pub const BLOB_ID_LEN: usize = 41;

const SENTINEL: u8 = b'G';

/// Content-addressed blob identifier. The printable form is
/// deterministic in the content digest and round-trips losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BlobId {
    hash: [u8; 20],
}

impl BlobId {
    pub fn new(hash: [u8; 20]) -> Self {
        BlobId { hash }
    }

    pub fn from_content(content: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(content);
        BlobId {
            hash: hasher.finalize().into(),
        }
    }

    pub fn hash(&self) -> &[u8; 20] {
        &self.hash
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.as_bytes();
        if value.len() != BLOB_ID_LEN || value[0] != SENTINEL {
            return None;
        }
        let mut hash = [0u8; 20];
        for (byte, chunk) in hash.iter_mut().zip(value[1..].chunks_exact(2)) {
            *byte = (hex_digit(chunk[0])? << 4) | hex_digit(chunk[1])?;
        }
        Some(BlobId { hash })
    }
}

fn hex_digit(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        _ => None,
    }
}

impl FromStr for BlobId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlobId::parse(s).ok_or(())
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("G")?;
        for byte in self.hash {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl serde::Serialize for BlobId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for BlobId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        BlobId::parse(<&str>::deserialize(deserializer)?)
            .ok_or_else(|| serde::de::Error::custom("invalid blob id"))
    }
}
