/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    error::method::MethodError, method::ArgsParser, parser::Parser, types::state::State,
};
use serde_json::Value;

/// The `Foo/changes` shape.
#[derive(Debug, Default, serde::Serialize)]
pub struct Changes {
    #[serde(skip)]
    pub since_state: State,
    #[serde(skip)]
    pub max_changes: Option<usize>,

    #[serde(rename = "accountId")]
    pub account_id: String,

    #[serde(rename = "oldState")]
    pub old_state: State,

    #[serde(rename = "newState")]
    pub new_state: State,

    #[serde(rename = "hasMoreChanges")]
    pub has_more_changes: bool,

    pub created: Vec<String>,

    pub updated: Vec<String>,

    pub destroyed: Vec<String>,
}

impl Changes {
    pub fn parse(
        args: &Value,
        parser: &mut Parser,
        mut args_parse: Option<ArgsParser<'_>>,
    ) -> Result<Changes, MethodError> {
        let mut changes = Changes::default();
        let mut has_since_state = false;

        for (key, value) in args.as_object().into_iter().flatten() {
            match key.as_str() {
                "accountId" => {
                    if let Some(account_id) = value.as_str() {
                        changes.account_id = account_id.to_string();
                    } else {
                        parser.invalid("accountId");
                    }
                }
                "sinceState" => match value.as_str().and_then(State::parse) {
                    Some(state) => {
                        changes.since_state = state;
                        has_since_state = true;
                    }
                    None => parser.invalid("sinceState"),
                },
                "maxChanges" => match value {
                    Value::Number(number) => match number.as_u64() {
                        Some(max_changes) if max_changes > 0 => {
                            changes.max_changes = Some(max_changes as usize);
                        }
                        _ => parser.invalid("maxChanges"),
                    },
                    Value::Null => (),
                    _ => parser.invalid("maxChanges"),
                },
                _ => {
                    let handled = args_parse
                        .as_mut()
                        .is_some_and(|args_parse| args_parse(key, value, parser));
                    if !handled {
                        parser.invalid(key);
                    }
                }
            }
        }

        if !has_since_state && parser.is_valid() {
            parser.invalid("sinceState");
        }

        if parser.is_valid() {
            Ok(changes)
        } else {
            Err(parser.invalid_arguments())
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.created.is_empty() || !self.updated.is_empty() || !self.destroyed.is_empty()
    }

    pub fn reply(self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
