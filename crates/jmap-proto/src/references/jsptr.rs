/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use serde_json::Value;
use std::fmt::{self, Display};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonPointerItem {
    Key(String),
    Number(u64),
    Wildcard,
}

/// RFC 6901 pointer extended with the `*` wildcard of RFC 8620 §3.7.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JsonPointer {
    items: Vec<JsonPointerItem>,
}

impl JsonPointer {
    pub fn parse(value: &str) -> Self {
        let value = value.strip_prefix('/').unwrap_or(value);
        if value.is_empty() {
            return JsonPointer::default();
        }

        JsonPointer {
            items: value
                .split('/')
                .map(|segment| {
                    if segment == "*" {
                        JsonPointerItem::Wildcard
                    } else if let Ok(number) = segment.parse::<u64>() {
                        JsonPointerItem::Number(number)
                    } else {
                        JsonPointerItem::Key(segment.replace("~1", "/").replace("~0", "~"))
                    }
                })
                .collect(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JsonPointerItem> {
        self.items.iter()
    }

    /// Evaluates the pointer against a value. A wildcard maps over an
    /// array and flattens one level of nested arrays into the result;
    /// any unresolved segment fails the whole evaluation.
    pub fn eval(&self, value: &Value) -> Option<Value> {
        eval_items(&self.items, value)
    }
}

fn eval_items(items: &[JsonPointerItem], value: &Value) -> Option<Value> {
    let (item, rest) = match items.split_first() {
        Some(split) => split,
        None => return Some(value.clone()),
    };

    match item {
        JsonPointerItem::Key(key) => eval_items(rest, value.as_object()?.get(key)?),
        JsonPointerItem::Number(n) => match value {
            Value::Array(list) => eval_items(rest, list.get(*n as usize)?),
            Value::Object(map) => eval_items(rest, map.get(&n.to_string())?),
            _ => None,
        },
        JsonPointerItem::Wildcard => {
            let mut results = Vec::new();
            for item in value.as_array()? {
                match eval_items(rest, item)? {
                    Value::Array(nested) => results.extend(nested),
                    result => results.push(result),
                }
            }
            Some(Value::Array(results))
        }
    }
}

impl Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            return f.write_str("/");
        }
        for item in &self.items {
            f.write_str("/")?;
            match item {
                JsonPointerItem::Key(key) => {
                    f.write_str(&key.replace('~', "~0").replace('/', "~1"))?
                }
                JsonPointerItem::Number(n) => write!(f, "{}", n)?,
                JsonPointerItem::Wildcard => f.write_str("*")?,
            }
        }
        Ok(())
    }
}

impl<'de> serde::Deserialize<'de> for JsonPointer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(JsonPointer::parse(&<std::borrow::Cow<'de, str>>::deserialize(deserializer)?))
    }
}

impl serde::Serialize for JsonPointer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
