/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    error::{method::MethodError, set::SetError},
    method::ArgsParser,
    parser::Parser,
    request::{capability::CoreCapabilities, reference::IdResolver},
    types::{id::is_valid_id, state::State},
};
use serde_json::Value;
use utils::map::vec_map::VecMap;

/// The `Foo/set` shape. Per-object failures land in the `notX` maps
/// without failing the call.
#[derive(Debug, Default, serde::Serialize)]
pub struct Set {
    #[serde(skip)]
    pub if_in_state: Option<String>,
    #[serde(skip)]
    pub create: VecMap<String, Value>,
    #[serde(skip)]
    pub update: VecMap<String, Value>,
    #[serde(skip)]
    pub destroy: Vec<String>,

    #[serde(rename = "accountId")]
    pub account_id: String,

    #[serde(rename = "oldState")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_state: Option<State>,

    #[serde(rename = "newState")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_state: Option<State>,

    #[serde(skip_serializing_if = "VecMap::is_empty")]
    pub created: VecMap<String, Value>,

    #[serde(skip_serializing_if = "VecMap::is_empty")]
    pub updated: VecMap<String, Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub destroyed: Vec<String>,

    #[serde(rename = "notCreated")]
    #[serde(skip_serializing_if = "VecMap::is_empty")]
    pub not_created: VecMap<String, SetError>,

    #[serde(rename = "notUpdated")]
    #[serde(skip_serializing_if = "VecMap::is_empty")]
    pub not_updated: VecMap<String, SetError>,

    #[serde(rename = "notDestroyed")]
    #[serde(skip_serializing_if = "VecMap::is_empty")]
    pub not_destroyed: VecMap<String, SetError>,
}

impl Set {
    pub fn parse(
        args: &Value,
        parser: &mut Parser,
        resolver: &dyn IdResolver,
        capabilities: &CoreCapabilities,
        mut args_parse: Option<ArgsParser<'_>>,
    ) -> Result<Set, MethodError> {
        let mut set = Set::default();

        for (key, value) in args.as_object().into_iter().flatten() {
            match key.as_str() {
                "accountId" => {
                    if let Some(account_id) = value.as_str() {
                        set.account_id = account_id.to_string();
                    } else {
                        parser.invalid("accountId");
                    }
                }
                "ifInState" => match value {
                    Value::String(state) => set.if_in_state = Some(state.clone()),
                    Value::Null => (),
                    _ => parser.invalid("ifInState"),
                },
                "create" => match value {
                    Value::Object(objects) => {
                        for (creation_id, object) in objects {
                            if object.is_object() {
                                set.create.append(creation_id.clone(), object.clone());
                            } else {
                                parser.push("create");
                                parser.invalid(creation_id);
                                parser.pop();
                            }
                        }
                    }
                    Value::Null => (),
                    _ => parser.invalid("create"),
                },
                "update" => match value {
                    Value::Object(objects) => {
                        for (id, object) in objects {
                            match (
                                resolver.id_value(id).filter(|id| is_valid_id(id)),
                                object,
                            ) {
                                (Some(id), Value::Object(_)) => {
                                    set.update.append(id.to_string(), object.clone());
                                }
                                _ => {
                                    parser.push("update");
                                    parser.invalid(id);
                                    parser.pop();
                                }
                            }
                        }
                    }
                    Value::Null => (),
                    _ => parser.invalid("update"),
                },
                "destroy" => match value {
                    Value::Array(items) => {
                        for (index, item) in items.iter().enumerate() {
                            match item
                                .as_str()
                                .and_then(|item| resolver.id_value(item))
                                .filter(|id| is_valid_id(id))
                            {
                                Some(id) => set.destroy.push(id.to_string()),
                                None => parser.invalid_index("destroy", index),
                            }
                        }
                    }
                    Value::Null => (),
                    _ => parser.invalid("destroy"),
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

        if !parser.is_valid() {
            Err(parser.invalid_arguments())
        } else if set.create.len() + set.update.len() + set.destroy.len()
            > capabilities.max_objects_in_set
        {
            Err(MethodError::request_too_large())
        } else {
            Ok(set)
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.created.is_empty() || !self.updated.is_empty() || !self.destroyed.is_empty()
    }

    /// Records a successful create, echoing the server-assigned id.
    pub fn created(&mut self, creation_id: impl Into<String>, id: &str) {
        self.created
            .append(creation_id.into(), serde_json::json!({"id": id}));
    }

    pub fn updated(&mut self, id: impl Into<String>) {
        self.updated.append(id.into(), Value::Null);
    }

    pub fn destroyed(&mut self, id: impl Into<String>) {
        self.destroyed.push(id.into());
    }

    pub fn not_created(&mut self, creation_id: impl Into<String>, error: SetError) {
        self.not_created.append(creation_id.into(), error);
    }

    pub fn not_updated(&mut self, id: impl Into<String>, error: SetError) {
        self.not_updated.append(id.into(), error);
    }

    pub fn not_destroyed(&mut self, id: impl Into<String>, error: SetError) {
        self.not_destroyed.append(id.into(), error);
    }

    pub fn reply(self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
