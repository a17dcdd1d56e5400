/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::fmt;

/// Per-type state token minted from the backing store's modification
/// sequence. The wire form is the decimal rendering of the counter;
/// clients may only compare tokens for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct State {
    modseq: u64,
}

impl State {
    pub fn new(modseq: u64) -> Self {
        State { modseq }
    }

    pub fn modseq(&self) -> u64 {
        self.modseq
    }

    pub fn parse(value: &str) -> Option<Self> {
        if !value.is_empty() && value.len() <= 20 && value.bytes().all(|b| b.is_ascii_digit()) {
            value.parse::<u64>().ok().map(State::new)
        } else {
            None
        }
    }
}

impl From<u64> for State {
    fn from(modseq: u64) -> Self {
        State::new(modseq)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.modseq)
    }
}

impl serde::Serialize for State {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for State {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        State::parse(<&str>::deserialize(deserializer)?)
            .ok_or_else(|| serde::de::Error::custom("invalid JMAP state"))
    }
}
