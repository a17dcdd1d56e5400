/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use serde::ser::SerializeMap;
use std::{borrow::Cow, fmt};

/// Error replacing a single method response:
/// `["error", {"type": ..}, client-id]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodError {
    pub error_type: MethodErrorType,
    pub description: Option<Cow<'static, str>>,
    pub arguments: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodErrorType {
    ServerUnavailable,
    ServerFail,
    UnknownMethod,
    MethodNotFound,
    InvalidArguments,
    InvalidResultReference,
    Forbidden,
    AccountNotFound,
    AccountNotSupportedByMethod,
    AccountReadOnly,
    RequestTooLarge,
    StateMismatch,
    CannotCalculateChanges,
    AnchorNotFound,
    UnsupportedFilter,
    UnsupportedSort,
}

impl MethodErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodErrorType::ServerUnavailable => "serverUnavailable",
            MethodErrorType::ServerFail => "serverFail",
            MethodErrorType::UnknownMethod => "unknownMethod",
            MethodErrorType::MethodNotFound => "methodNotFound",
            MethodErrorType::InvalidArguments => "invalidArguments",
            MethodErrorType::InvalidResultReference => "invalidResultReference",
            MethodErrorType::Forbidden => "forbidden",
            MethodErrorType::AccountNotFound => "accountNotFound",
            MethodErrorType::AccountNotSupportedByMethod => "accountNotSupportedByMethod",
            MethodErrorType::AccountReadOnly => "accountReadOnly",
            MethodErrorType::RequestTooLarge => "requestTooLarge",
            MethodErrorType::StateMismatch => "stateMismatch",
            MethodErrorType::CannotCalculateChanges => "cannotCalculateChanges",
            MethodErrorType::AnchorNotFound => "anchorNotFound",
            MethodErrorType::UnsupportedFilter => "unsupportedFilter",
            MethodErrorType::UnsupportedSort => "unsupportedSort",
        }
    }

    /// Key under which the error's argument list is reported.
    fn arguments_key(&self) -> &'static str {
        match self {
            MethodErrorType::UnsupportedFilter => "filters",
            MethodErrorType::UnsupportedSort => "sort",
            _ => "arguments",
        }
    }
}

impl MethodError {
    pub fn new(error_type: MethodErrorType) -> Self {
        MethodError {
            error_type,
            description: None,
            arguments: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<Cow<'static, str>>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_arguments(mut self, arguments: impl IntoIterator<Item = String>) -> Self {
        self.arguments = Some(arguments.into_iter().collect());
        self
    }

    pub fn unknown_method(name: &str) -> Self {
        Self::new(MethodErrorType::UnknownMethod)
            .with_description(format!("Method {:?} is not known by this server.", name))
    }

    pub fn method_not_found(name: &str) -> Self {
        Self::new(MethodErrorType::MethodNotFound).with_description(format!(
            "Method {:?} requires a capability that was not requested.",
            name
        ))
    }

    pub fn invalid_arguments(pointers: impl IntoIterator<Item = String>) -> Self {
        Self::new(MethodErrorType::InvalidArguments).with_arguments(pointers)
    }

    pub fn invalid_result_reference(description: impl Into<Cow<'static, str>>) -> Self {
        Self::new(MethodErrorType::InvalidResultReference).with_description(description)
    }

    pub fn forbidden() -> Self {
        Self::new(MethodErrorType::Forbidden)
    }

    pub fn account_not_found() -> Self {
        Self::new(MethodErrorType::AccountNotFound)
    }

    pub fn account_read_only() -> Self {
        Self::new(MethodErrorType::AccountReadOnly)
    }

    pub fn request_too_large() -> Self {
        Self::new(MethodErrorType::RequestTooLarge)
    }

    pub fn state_mismatch() -> Self {
        Self::new(MethodErrorType::StateMismatch)
    }

    pub fn cannot_calculate_changes() -> Self {
        Self::new(MethodErrorType::CannotCalculateChanges)
    }

    pub fn anchor_not_found() -> Self {
        Self::new(MethodErrorType::AnchorNotFound)
    }

    /// Maps a backing-store failure onto the wire taxonomy: transient
    /// conditions become `serverUnavailable`, everything else
    /// `serverFail` with a stable message.
    pub fn server_error(transient: bool, message: impl fmt::Display) -> Self {
        if transient {
            Self::new(MethodErrorType::ServerUnavailable)
                .with_description("Service temporarily unavailable, try again later.")
        } else {
            Self::new(MethodErrorType::ServerFail)
                .with_description(format!("An internal error occurred: {}", message))
        }
    }
}

impl From<MethodErrorType> for MethodError {
    fn from(error_type: MethodErrorType) -> Self {
        MethodError::new(error_type)
    }
}

impl fmt::Display for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.error_type.as_str())?;
        if let Some(description) = &self.description {
            write!(f, ": {}", description)?;
        }
        Ok(())
    }
}

impl serde::Serialize for MethodError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.error_type.as_str())?;
        if let Some(description) = &self.description {
            map.serialize_entry("description", description)?;
        }
        if let Some(arguments) = &self.arguments {
            map.serialize_entry(self.error_type.arguments_key(), arguments)?;
        }
        map.end()
    }
}
