/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    error::method::MethodError,
    method::{ArgsParser, PropertyDef, property_find},
    parser::Parser,
    request::{capability::CoreCapabilities, reference::IdResolver},
    types::{id::is_valid_id, state::State},
};
use ahash::AHashSet;
use serde_json::Value;

/// The `Foo/get` shape. Request fields are filled by `parse`, response
/// fields by the handler.
#[derive(Debug, Default, serde::Serialize)]
pub struct Get {
    /// Requested ids, `None` meaning all objects of the type.
    #[serde(skip)]
    pub ids: Option<Vec<String>>,
    /// Requested property names, `None` meaning all properties.
    #[serde(skip)]
    pub properties: Option<AHashSet<String>>,

    #[serde(rename = "accountId")]
    pub account_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,

    pub list: Vec<Value>,

    #[serde(rename = "notFound")]
    pub not_found: Vec<String>,
}

impl Get {
    pub fn parse(
        args: &Value,
        parser: &mut Parser,
        resolver: &dyn IdResolver,
        capabilities: &CoreCapabilities,
        valid_properties: &[PropertyDef],
        allow_null_ids: bool,
        mut args_parse: Option<ArgsParser<'_>>,
    ) -> Result<Get, MethodError> {
        let mut get = Get::default();
        let mut too_many_ids = false;

        for (key, value) in args.as_object().into_iter().flatten() {
            match key.as_str() {
                "accountId" => {
                    if let Some(account_id) = value.as_str() {
                        get.account_id = account_id.to_string();
                    } else {
                        parser.invalid("accountId");
                    }
                }
                "ids" => match value {
                    Value::Null => {
                        if !allow_null_ids {
                            parser.invalid("ids");
                        }
                    }
                    Value::Array(items) => {
                        if items.len() > capabilities.max_objects_in_get {
                            too_many_ids = true;
                            continue;
                        }
                        let mut ids = Vec::with_capacity(items.len());
                        for (index, item) in items.iter().enumerate() {
                            match item
                                .as_str()
                                .and_then(|item| resolver.id_value(item))
                                .filter(|id| is_valid_id(id))
                            {
                                Some(id) => ids.push(id.to_string()),
                                None => parser.invalid_index("ids", index),
                            }
                        }
                        get.ids = Some(ids);
                    }
                    _ => parser.invalid("ids"),
                },
                "properties" => match value {
                    Value::Null => (),
                    Value::Array(items) => {
                        let mut properties = AHashSet::with_capacity(items.len());
                        for (index, item) in items.iter().enumerate() {
                            match item
                                .as_str()
                                .and_then(|name| property_find(name, valid_properties))
                            {
                                Some(prop) => {
                                    properties.insert(prop.name.to_string());
                                }
                                None => parser.invalid_index("properties", index),
                            }
                        }
                        get.properties = Some(properties);
                    }
                    _ => parser.invalid("properties"),
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

        if !allow_null_ids && get.ids.is_none() && !too_many_ids && parser.is_valid() {
            parser.invalid("ids");
        }

        if !parser.is_valid() {
            Err(parser.invalid_arguments())
        } else if too_many_ids {
            Err(MethodError::request_too_large())
        } else {
            Ok(get)
        }
    }

    /// True when the caller asked for the property, or asked for all.
    pub fn want(&self, property: &str) -> bool {
        self.properties
            .as_ref()
            .is_none_or(|properties| properties.contains(property))
    }

    pub fn reply(self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
