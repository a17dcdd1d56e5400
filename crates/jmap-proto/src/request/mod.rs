/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod capability;
pub mod parser;
pub mod reference;

use crate::request::capability::Capability;
use serde_json::Value;
use utils::map::vec_map::VecMap;

#[derive(Debug, Default)]
pub struct Request {
    pub using: Vec<String>,
    pub method_calls: Vec<Call>,
    pub created_ids: Option<VecMap<String, String>>,
}

/// One `[name, arguments, client-id]` triple, used for both method
/// calls and method responses.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl Call {
    pub fn new(name: impl Into<String>, arguments: Value, id: impl Into<String>) -> Self {
        Call {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

impl Request {
    /// Validates the capability set against the capabilities the
    /// server advertises, returning the requested mask.
    pub fn capabilities(&self, can_use: u32) -> Result<u32, crate::error::request::RequestError> {
        let mut using = 0;
        for uri in &self.using {
            match Capability::parse(uri) {
                Some(capability) if can_use & capability as u32 != 0 => {
                    using |= capability as u32;
                }
                _ => {
                    return Err(crate::error::request::RequestError::unknown_capability(uri));
                }
            }
        }
        Ok(using)
    }
}
