/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    error::{method::MethodError, set::SetError},
    parser::Parser,
    request::{capability::CoreCapabilities, reference::IdResolver},
};
use serde_json::{Value, json};
use utils::map::vec_map::VecMap;

/// The `Foo/copy` shape. Blob copies carry a flat id list instead of
/// a creation map; both share the response half.
#[derive(Debug, Default, serde::Serialize)]
pub struct Copy {
    #[serde(skip)]
    pub if_from_in_state: Option<String>,
    #[serde(skip)]
    pub if_in_state: Option<String>,
    #[serde(skip)]
    pub create: VecMap<String, Value>,
    #[serde(skip)]
    pub blob_ids: Vec<String>,
    #[serde(skip)]
    pub on_success_destroy_original: bool,
    #[serde(skip)]
    pub destroy_from_if_in_state: Option<String>,
    #[serde(skip)]
    copied_source_ids: Vec<String>,

    #[serde(rename = "fromAccountId")]
    pub from_account_id: String,

    #[serde(rename = "accountId")]
    pub account_id: String,

    #[serde(skip_serializing_if = "VecMap::is_empty")]
    pub created: VecMap<String, Value>,

    #[serde(rename = "notCreated")]
    #[serde(skip_serializing_if = "VecMap::is_empty")]
    pub not_created: VecMap<String, SetError>,
}

impl Copy {
    pub fn parse(
        args: &Value,
        parser: &mut Parser,
        resolver: &dyn IdResolver,
        capabilities: &CoreCapabilities,
        blob_copy: bool,
    ) -> Result<Copy, MethodError> {
        let mut copy = Copy::default();

        for (key, value) in args.as_object().into_iter().flatten() {
            match key.as_str() {
                "accountId" => {
                    if let Some(account_id) = value.as_str() {
                        copy.account_id = account_id.to_string();
                    } else {
                        parser.invalid("accountId");
                    }
                }
                "fromAccountId" => {
                    if let Some(from_account_id) = value.as_str() {
                        copy.from_account_id = from_account_id.to_string();
                    } else {
                        parser.invalid("fromAccountId");
                    }
                }
                "ifFromInState" => match value {
                    Value::String(state) => copy.if_from_in_state = Some(state.clone()),
                    Value::Null => (),
                    _ => parser.invalid("ifFromInState"),
                },
                "ifInState" => match value {
                    Value::String(state) => copy.if_in_state = Some(state.clone()),
                    Value::Null => (),
                    _ => parser.invalid("ifInState"),
                },
                "blobIds" if blob_copy => match value {
                    Value::Array(items) => {
                        for (index, item) in items.iter().enumerate() {
                            match item.as_str() {
                                Some(id) => copy.blob_ids.push(id.to_string()),
                                None => parser.invalid_index("blobIds", index),
                            }
                        }
                    }
                    _ => parser.invalid("blobIds"),
                },
                "create" if !blob_copy => match value {
                    Value::Object(objects) => {
                        for (creation_id, object) in objects {
                            // Every copied object names its source id.
                            let source_id = object
                                .get("id")
                                .and_then(|id| id.as_str())
                                .and_then(|id| resolver.id_value(id));
                            match source_id {
                                Some(_) => copy.create.append(creation_id.clone(), object.clone()),
                                None => {
                                    parser.push("create");
                                    parser.push(creation_id);
                                    parser.invalid("id");
                                    parser.pop();
                                    parser.pop();
                                }
                            }
                        }
                    }
                    Value::Null => (),
                    _ => parser.invalid("create"),
                },
                "onSuccessDestroyOriginal" => match value {
                    Value::Bool(destroy) => copy.on_success_destroy_original = *destroy,
                    Value::Null => (),
                    _ => parser.invalid("onSuccessDestroyOriginal"),
                },
                "destroyFromIfInState" => match value {
                    Value::String(state) => copy.destroy_from_if_in_state = Some(state.clone()),
                    Value::Null => (),
                    _ => parser.invalid("destroyFromIfInState"),
                },
                _ => parser.invalid(key),
            }
        }

        if parser.is_valid() {
            if copy.from_account_id.is_empty() {
                parser.invalid("fromAccountId");
            } else if !copy.account_id.is_empty() && copy.from_account_id == copy.account_id {
                // Copying within one account is a Foo/set job.
                parser.invalid("fromAccountId");
            }
        }

        if !parser.is_valid() {
            Err(parser.invalid_arguments())
        } else if copy.create.len() + copy.blob_ids.len() > capabilities.max_objects_in_set {
            Err(MethodError::request_too_large())
        } else {
            Ok(copy)
        }
    }

    pub fn created(&mut self, id: impl Into<String>, object: Value) {
        self.created.append(id.into(), object);
    }

    pub fn not_created(&mut self, id: impl Into<String>, error: SetError) {
        self.not_created.append(id.into(), error);
    }

    /// Records the source id of a successful copy for a later
    /// `onSuccessDestroyOriginal` sub-call.
    pub fn copied_source(&mut self, source_id: impl Into<String>) {
        self.copied_source_ids.push(source_id.into());
    }

    /// Arguments for the deferred `Foo/set` destroying the originals,
    /// or `None` unless every requested copy succeeded.
    pub fn destroy_sub_call(&self) -> Option<Value> {
        if self.on_success_destroy_original
            && self.not_created.is_empty()
            && !self.copied_source_ids.is_empty()
        {
            let mut args = json!({
                "accountId": self.from_account_id,
                "destroy": self.copied_source_ids,
            });
            if let Some(state) = &self.destroy_from_if_in_state {
                args["ifInState"] = json!(state);
            }
            Some(args)
        } else {
            None
        }
    }

    pub fn reply(self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
