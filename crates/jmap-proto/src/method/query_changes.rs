/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    error::method::{MethodError, MethodErrorType},
    method::{
        ArgsParser,
        query::{Comparator, ComparatorParser, FilterParser, parse_filter, parse_sort},
    },
    parser::Parser,
    types::state::State,
};
use serde_json::Value;

/// The `Foo/queryChanges` shape.
#[derive(Debug, Default, serde::Serialize)]
pub struct QueryChanges {
    #[serde(skip)]
    pub filter: Option<Value>,
    #[serde(skip)]
    pub sort: Vec<Comparator>,
    /// Kept as the raw token: query states may be unreconstructable,
    /// which is the handler's `cannotCalculateChanges` case.
    #[serde(skip)]
    pub since_query_state: String,
    #[serde(skip)]
    pub max_changes: Option<usize>,
    #[serde(skip)]
    pub up_to_id: Option<String>,
    #[serde(skip)]
    pub calculate_total: bool,

    #[serde(rename = "accountId")]
    pub account_id: String,

    #[serde(rename = "oldQueryState")]
    pub old_query_state: String,

    #[serde(rename = "newQueryState")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_query_state: Option<State>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,

    pub removed: Vec<String>,

    pub added: Vec<AddedItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AddedItem {
    pub id: String,
    pub index: usize,
}

impl AddedItem {
    pub fn new(id: String, index: usize) -> Self {
        AddedItem { id, index }
    }
}

impl QueryChanges {
    pub fn parse(
        args: &Value,
        parser: &mut Parser,
        mut filter_parse: Option<FilterParser<'_>>,
        mut comparator_parse: Option<ComparatorParser<'_>>,
        mut args_parse: Option<ArgsParser<'_>>,
    ) -> Result<QueryChanges, MethodError> {
        let mut query = QueryChanges::default();
        let mut unsupported_filter = Vec::new();
        let mut unsupported_sort = Vec::new();

        for (key, value) in args.as_object().into_iter().flatten() {
            match key.as_str() {
                "accountId" => {
                    if let Some(account_id) = value.as_str() {
                        query.account_id = account_id.to_string();
                    } else {
                        parser.invalid("accountId");
                    }
                }
                "filter" => match value {
                    Value::Object(_) => {
                        parser.push("filter");
                        parse_filter(value, parser, &mut filter_parse, &mut unsupported_filter);
                        parser.pop();
                        query.filter = Some(value.clone());
                    }
                    Value::Null => (),
                    _ => parser.invalid("filter"),
                },
                "sort" => match value {
                    Value::Array(_) => {
                        query.sort = parse_sort(
                            value,
                            parser,
                            &mut comparator_parse,
                            &mut unsupported_sort,
                        );
                    }
                    Value::Null => (),
                    _ => parser.invalid("sort"),
                },
                "sinceQueryState" => match value {
                    Value::String(state) => query.since_query_state = state.clone(),
                    _ => parser.invalid("sinceQueryState"),
                },
                "maxChanges" => match value {
                    Value::Number(number) => match number.as_u64() {
                        Some(max_changes) if max_changes > 0 => {
                            query.max_changes = Some(max_changes as usize);
                        }
                        _ => parser.invalid("maxChanges"),
                    },
                    Value::Null => (),
                    _ => parser.invalid("maxChanges"),
                },
                "upToId" => match value {
                    Value::String(id) => query.up_to_id = Some(id.clone()),
                    Value::Null => (),
                    _ => parser.invalid("upToId"),
                },
                "calculateTotal" => match value {
                    Value::Bool(calculate_total) => query.calculate_total = *calculate_total,
                    Value::Null => (),
                    _ => parser.invalid("calculateTotal"),
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

        if query.since_query_state.is_empty() && parser.is_valid() {
            parser.invalid("sinceQueryState");
        }

        if !parser.is_valid() {
            Err(parser.invalid_arguments())
        } else if !unsupported_filter.is_empty() {
            Err(MethodError::new(MethodErrorType::UnsupportedFilter)
                .with_arguments(unsupported_filter))
        } else if !unsupported_sort.is_empty() {
            Err(MethodError::new(MethodErrorType::UnsupportedSort).with_arguments(unsupported_sort))
        } else {
            query.old_query_state = query.since_query_state.clone();
            Ok(query)
        }
    }

    pub fn reply(self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
