/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use serde_json::{Map, Value};
use std::fmt::{self, Display};

/// A patch entry could not be applied; `path` names the offending key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchError {
    pub path: String,
}

impl Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid patch path {:?}", self.path)
    }
}

/// Applies a patch object to a deep copy of `val`. Each key is an
/// RFC 6901 path with an implicit leading slash; a null value deletes
/// the target, intermediate objects are created as needed, and
/// patching through a non-object fails with the offending path.
pub fn apply(val: &Value, patch: &Value) -> Result<Value, PatchError> {
    let patch = match patch {
        Value::Object(patch) => patch,
        _ => {
            return Err(PatchError {
                path: String::new(),
            });
        }
    };

    let mut result = val.clone();
    for (path, new_value) in patch {
        let segments = split_path(path);
        let (last, parents) = match segments.split_last() {
            Some(split) => split,
            None => {
                // Empty path addresses the whole document.
                result = new_value.clone();
                continue;
            }
        };

        let mut target = &mut result;
        for segment in parents {
            let map = target.as_object_mut().ok_or_else(|| PatchError {
                path: path.clone(),
            })?;
            target = map
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }

        let map = target.as_object_mut().ok_or_else(|| PatchError {
            path: path.clone(),
        })?;
        if new_value.is_null() {
            map.remove(last);
        } else {
            map.insert(last.clone(), new_value.clone());
        }
    }

    Ok(result)
}

/// Derives the minimal patch such that `apply(a, create(a, b)) == b`.
/// Objects are diffed recursively; arrays and scalars are replaced
/// whole.
pub fn create(a: &Value, b: &Value) -> Value {
    let mut patch = Map::new();
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => diff("", a, b, &mut patch),
        _ => {
            if a != b {
                patch.insert(String::new(), b.clone());
            }
        }
    }
    Value::Object(patch)
}

fn diff(prefix: &str, a: &Map<String, Value>, b: &Map<String, Value>, patch: &mut Map<String, Value>) {
    for key in a.keys() {
        if !b.contains_key(key) {
            patch.insert(join_path(prefix, key), Value::Null);
        }
    }

    for (key, b_value) in b {
        match a.get(key) {
            Some(a_value) if a_value == b_value => {}
            Some(Value::Object(a_child)) if b_value.is_object() => {
                let path = join_path(prefix, key);
                diff(&path, a_child, b_value.as_object().unwrap(), patch);
            }
            _ => {
                patch.insert(join_path(prefix, key), b_value.clone());
            }
        }
    }
}

fn split_path(path: &str) -> Vec<String> {
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('/')
            .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
            .collect()
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    let key = if key.contains(['~', '/']) {
        key.replace('~', "~0").replace('/', "~1")
    } else {
        key.to_string()
    };
    if prefix.is_empty() {
        key
    } else {
        format!("{}/{}", prefix, key)
    }
}
