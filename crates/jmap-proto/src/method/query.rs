/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    error::method::{MethodError, MethodErrorType},
    method::ArgsParser,
    parser::Parser,
    request::capability::CoreCapabilities,
    types::state::State,
};
use serde_json::{Map, Value};

/// Per-type filter-condition validator. Returns false when the
/// condition is not supported by the type.
pub type FilterParser<'x> = &'x mut dyn FnMut(&Map<String, Value>, &mut Parser) -> bool;

/// Per-type comparator validator. Returns false when the sort
/// property is not supported by the type.
pub type ComparatorParser<'x> = &'x mut dyn FnMut(&Comparator) -> bool;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Comparator {
    pub property: String,
    pub is_ascending: bool,
    pub collation: Option<String>,
}

/// The `Foo/query` shape.
#[derive(Debug, Default, serde::Serialize)]
pub struct Query {
    /// Validated filter tree, kept as JSON for the backing query
    /// engine.
    #[serde(skip)]
    pub filter: Option<Value>,
    #[serde(skip)]
    pub sort: Vec<Comparator>,
    #[serde(skip)]
    pub position: i64,
    #[serde(skip)]
    pub anchor: Option<String>,
    #[serde(skip)]
    pub anchor_offset: i64,
    #[serde(skip)]
    pub limit: Option<usize>,
    #[serde(skip)]
    pub calculate_total: bool,

    #[serde(rename = "accountId")]
    pub account_id: String,

    #[serde(rename = "queryState")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_state: Option<State>,

    #[serde(rename = "canCalculateChanges")]
    pub can_calculate_changes: bool,

    #[serde(rename = "position")]
    pub result_position: usize,

    pub ids: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl Query {
    pub fn parse(
        args: &Value,
        parser: &mut Parser,
        capabilities: &CoreCapabilities,
        mut filter_parse: Option<FilterParser<'_>>,
        mut comparator_parse: Option<ComparatorParser<'_>>,
        mut args_parse: Option<ArgsParser<'_>>,
    ) -> Result<Query, MethodError> {
        let mut query = Query::default();
        let mut unsupported_filter = Vec::new();
        let mut unsupported_sort = Vec::new();
        let mut has_position = false;

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
                "position" => match value {
                    Value::Number(number) => match number.as_i64() {
                        Some(position) => {
                            query.position = position;
                            has_position = true;
                        }
                        None => parser.invalid("position"),
                    },
                    Value::Null => (),
                    _ => parser.invalid("position"),
                },
                "anchor" => match value {
                    Value::String(anchor) => query.anchor = Some(anchor.clone()),
                    Value::Null => (),
                    _ => parser.invalid("anchor"),
                },
                "anchorOffset" => match value {
                    Value::Number(number) => match number.as_i64() {
                        Some(anchor_offset) => query.anchor_offset = anchor_offset,
                        None => parser.invalid("anchorOffset"),
                    },
                    Value::Null => (),
                    _ => parser.invalid("anchorOffset"),
                },
                "limit" => match value {
                    Value::Number(number) => match number.as_u64() {
                        Some(limit) => {
                            // Clamped, not rejected.
                            query.limit =
                                Some((limit as usize).min(capabilities.max_objects_in_get));
                        }
                        None => parser.invalid("limit"),
                    },
                    Value::Null => (),
                    _ => parser.invalid("limit"),
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

        if has_position && query.anchor.is_some() {
            parser.invalid("position");
            parser.invalid("anchor");
        }

        if !parser.is_valid() {
            Err(parser.invalid_arguments())
        } else if !unsupported_filter.is_empty() {
            Err(MethodError::new(MethodErrorType::UnsupportedFilter)
                .with_arguments(unsupported_filter))
        } else if !unsupported_sort.is_empty() {
            Err(MethodError::new(MethodErrorType::UnsupportedSort).with_arguments(unsupported_sort))
        } else {
            Ok(query)
        }
    }

    pub fn reply(self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Validates a filter tree: either an operator node with conditions,
/// or a single condition handed to the per-type hook.
pub(crate) fn parse_filter(
    filter: &Value,
    parser: &mut Parser,
    condition_parse: &mut Option<FilterParser<'_>>,
    unsupported: &mut Vec<String>,
) {
    let filter = match filter.as_object() {
        Some(filter) => filter,
        None => {
            parser.invalid_here();
            return;
        }
    };

    if filter.contains_key("operator") || filter.contains_key("conditions") {
        for (key, value) in filter {
            match key.as_str() {
                "operator" => {
                    if !matches!(value.as_str(), Some("AND" | "OR" | "NOT")) {
                        parser.invalid("operator");
                    }
                }
                "conditions" => match value {
                    Value::Array(conditions) => {
                        for (index, condition) in conditions.iter().enumerate() {
                            parser.push_index("conditions", index);
                            parse_filter(condition, parser, condition_parse, unsupported);
                            parser.pop();
                        }
                    }
                    _ => parser.invalid("conditions"),
                },
                _ => parser.invalid(key),
            }
        }
    } else {
        let supported = match condition_parse {
            Some(condition_parse) => condition_parse(filter, parser),
            None => false,
        };
        if !supported {
            unsupported.push(parser.path());
        }
    }
}

pub(crate) fn parse_sort(
    value: &Value,
    parser: &mut Parser,
    comparator_parse: &mut Option<ComparatorParser<'_>>,
    unsupported: &mut Vec<String>,
) -> Vec<Comparator> {
    let items = match value.as_array() {
        Some(items) => items,
        None => return Vec::new(),
    };

    let mut sort = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        parser.push_index("sort", index);

        let mut comparator = Comparator {
            is_ascending: true,
            ..Comparator::default()
        };
        match item.as_object() {
            Some(item) => {
                for (key, value) in item {
                    match key.as_str() {
                        "property" => match value.as_str() {
                            Some(property) => comparator.property = property.to_string(),
                            None => parser.invalid("property"),
                        },
                        "isAscending" => match value {
                            Value::Bool(is_ascending) => comparator.is_ascending = *is_ascending,
                            Value::Null => (),
                            _ => parser.invalid("isAscending"),
                        },
                        "collation" => match value {
                            Value::String(collation) => {
                                comparator.collation = Some(collation.clone())
                            }
                            Value::Null => (),
                            _ => parser.invalid("collation"),
                        },
                        _ => parser.invalid(key),
                    }
                }
                if comparator.property.is_empty() {
                    parser.invalid("property");
                } else {
                    let supported = match comparator_parse {
                        Some(comparator_parse) => comparator_parse(&comparator),
                        None => false,
                    };
                    if supported {
                        sort.push(comparator);
                    } else {
                        unsupported.push(parser.path());
                    }
                }
            }
            None => parser.invalid_here(),
        }

        parser.pop();
    }

    sort
}
