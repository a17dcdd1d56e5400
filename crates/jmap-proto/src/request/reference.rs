/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::references::jsptr::JsonPointer;
use std::fmt::{self, Display};

/// Back-reference to the output of an already-processed call, matched
/// by client id and method name and extracted via an RFC 6901 pointer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResultReference {
    #[serde(rename = "resultOf")]
    pub result_of: String,
    pub name: String,
    pub path: JsonPointer,
}

impl Display for ResultReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ resultOf: {}, name: {}, path: {} }}",
            self.result_of, self.name, self.path
        )
    }
}

/// Resolves client-supplied creation ids to server ids. Implemented by
/// the request context over its creation-ID table.
pub trait IdResolver {
    fn created_id(&self, creation_id: &str) -> Option<&str>;

    /// Resolves a string that may be a `#`-prefixed creation id to a
    /// server id. Plain strings pass through untouched.
    fn id_value<'x>(&'x self, value: &'x str) -> Option<&'x str> {
        match value.strip_prefix('#') {
            Some(creation_id) if !creation_id.is_empty() => self.created_id(creation_id),
            Some(_) => None,
            None => Some(value),
        }
    }
}

/// Resolver used when creation ids cannot occur, e.g. when parsing
/// outside a request context.
pub struct NoIdResolver;

impl IdResolver for NoIdResolver {
    fn created_id(&self, _creation_id: &str) -> Option<&str> {
        None
    }
}
