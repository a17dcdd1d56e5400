/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::error::method::MethodError;
use serde_json::{Map, Value};

/// Accumulating argument validator. Descents push onto the path
/// stack; every failure snapshots the current pointer instead of
/// unwinding, so one pass reports every offending location.
#[derive(Debug, Default)]
pub struct Parser {
    path: Vec<String>,
    invalid: Vec<String>,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, prop: &str) {
        self.path.push(encode_segment(prop));
    }

    pub fn push_index(&mut self, prop: &str, index: usize) {
        self.path.push(format!("{}[{}]", encode_segment(prop), index));
    }

    pub fn pop(&mut self) {
        self.path.pop();
    }

    /// RFC 6901 pointer to the current position.
    pub fn path(&self) -> String {
        self.path.join("/")
    }

    /// Records `prop` below the current position as invalid.
    pub fn invalid(&mut self, prop: &str) {
        self.push(prop);
        self.invalid_here();
        self.pop();
    }

    pub fn invalid_index(&mut self, prop: &str, index: usize) {
        self.push_index(prop, index);
        self.invalid_here();
        self.pop();
    }

    /// Records the current position itself as invalid.
    pub fn invalid_here(&mut self) {
        self.invalid.push(self.path());
    }

    pub fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }

    pub fn invalid_paths(&self) -> &[String] {
        &self.invalid
    }

    /// Terminal mapping of the accumulated pointers.
    pub fn invalid_arguments(&self) -> MethodError {
        MethodError::invalid_arguments(self.invalid.iter().cloned())
    }

    pub fn read_string<'x>(
        &mut self,
        args: &'x Value,
        name: &str,
        mandatory: bool,
    ) -> Option<&'x str> {
        match args.get(name) {
            Some(Value::String(value)) => Some(value.as_str()),
            Some(Value::Null) | None => {
                if mandatory {
                    self.invalid(name);
                }
                None
            }
            Some(_) => {
                self.invalid(name);
                None
            }
        }
    }

    pub fn read_u64(&mut self, args: &Value, name: &str, mandatory: bool) -> Option<u64> {
        match args.get(name) {
            Some(Value::Number(value)) => match value.as_u64() {
                Some(value) => Some(value),
                None => {
                    self.invalid(name);
                    None
                }
            },
            Some(Value::Null) | None => {
                if mandatory {
                    self.invalid(name);
                }
                None
            }
            Some(_) => {
                self.invalid(name);
                None
            }
        }
    }

    pub fn read_i64(&mut self, args: &Value, name: &str, mandatory: bool) -> Option<i64> {
        match args.get(name) {
            Some(Value::Number(value)) => match value.as_i64() {
                Some(value) => Some(value),
                None => {
                    self.invalid(name);
                    None
                }
            },
            Some(Value::Null) | None => {
                if mandatory {
                    self.invalid(name);
                }
                None
            }
            Some(_) => {
                self.invalid(name);
                None
            }
        }
    }

    pub fn read_bool(&mut self, args: &Value, name: &str, mandatory: bool) -> Option<bool> {
        match args.get(name) {
            Some(Value::Bool(value)) => Some(*value),
            Some(Value::Null) | None => {
                if mandatory {
                    self.invalid(name);
                }
                None
            }
            Some(_) => {
                self.invalid(name);
                None
            }
        }
    }

    pub fn read_object<'x>(
        &mut self,
        args: &'x Value,
        name: &str,
        mandatory: bool,
    ) -> Option<&'x Map<String, Value>> {
        match args.get(name) {
            Some(Value::Object(value)) => Some(value),
            Some(Value::Null) | None => {
                if mandatory {
                    self.invalid(name);
                }
                None
            }
            Some(_) => {
                self.invalid(name);
                None
            }
        }
    }

    pub fn read_array<'x>(
        &mut self,
        args: &'x Value,
        name: &str,
        mandatory: bool,
    ) -> Option<&'x Vec<Value>> {
        match args.get(name) {
            Some(Value::Array(value)) => Some(value),
            Some(Value::Null) | None => {
                if mandatory {
                    self.invalid(name);
                }
                None
            }
            Some(_) => {
                self.invalid(name);
                None
            }
        }
    }

    /// Validates an array-of-strings value, recording the index of
    /// every non-string element.
    pub fn parse_strings(&mut self, value: &Value, prop: &str) -> Option<Vec<String>> {
        match value {
            Value::Array(items) => {
                let mut strings = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match item {
                        Value::String(item) => strings.push(item.clone()),
                        _ => self.invalid_index(prop, index),
                    }
                }
                Some(strings)
            }
            _ => {
                self.invalid(prop);
                None
            }
        }
    }
}

/// Escapes a path segment per RFC 6901 when it contains `~` or `/`.
fn encode_segment(prop: &str) -> String {
    if prop.contains(['~', '/']) {
        prop.replace('~', "~0").replace('/', "~1")
    } else {
        prop.to_string()
    }
}
