/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::borrow::Cow;

/// Problem document replacing the whole response when the envelope
/// itself is rejected.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RequestError {
    #[serde(rename = "type")]
    pub error_type: RequestErrorType,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Cow<'static, str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<RequestLimitError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestErrorType {
    UnknownCapability,
    NotJson,
    NotRequest,
    Limit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestLimitError {
    SizeRequest,
    SizeUpload,
    CallsIn,
    ConcurrentRequests,
    ConcurrentUpload,
}

impl RequestErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestErrorType::UnknownCapability => "urn:ietf:params:jmap:error:unknownCapability",
            RequestErrorType::NotJson => "urn:ietf:params:jmap:error:notJSON",
            RequestErrorType::NotRequest => "urn:ietf:params:jmap:error:notRequest",
            RequestErrorType::Limit => "urn:ietf:params:jmap:error:limit",
        }
    }
}

impl RequestLimitError {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestLimitError::SizeRequest => "maxSizeRequest",
            RequestLimitError::SizeUpload => "maxSizeUpload",
            RequestLimitError::CallsIn => "maxCallsInRequest",
            RequestLimitError::ConcurrentRequests => "maxConcurrentRequests",
            RequestLimitError::ConcurrentUpload => "maxConcurrentUpload",
        }
    }
}

impl RequestError {
    pub fn unknown_capability(capability: impl AsRef<str>) -> Self {
        RequestError {
            error_type: RequestErrorType::UnknownCapability,
            status: 400,
            detail: Some(
                format!(
                    "The Request object used capability {:?}, which is not supported by this server.",
                    capability.as_ref()
                )
                .into(),
            ),
            limit: None,
        }
    }

    pub fn not_json(detail: impl Into<Cow<'static, str>>) -> Self {
        RequestError {
            error_type: RequestErrorType::NotJson,
            status: 400,
            detail: Some(detail.into()),
            limit: None,
        }
    }

    pub fn not_request(detail: impl Into<Cow<'static, str>>) -> Self {
        RequestError {
            error_type: RequestErrorType::NotRequest,
            status: 400,
            detail: Some(detail.into()),
            limit: None,
        }
    }

    pub fn limit(limit: RequestLimitError) -> Self {
        RequestError {
            error_type: RequestErrorType::Limit,
            status: match limit {
                RequestLimitError::SizeRequest | RequestLimitError::SizeUpload => 413,
                RequestLimitError::CallsIn => 400,
                RequestLimitError::ConcurrentRequests | RequestLimitError::ConcurrentUpload => 429,
            },
            detail: Some(
                match limit {
                    RequestLimitError::SizeRequest => {
                        "The request is larger than the server is willing to process."
                    }
                    RequestLimitError::SizeUpload => {
                        "The uploaded file is larger than the server is willing to accept."
                    }
                    RequestLimitError::CallsIn => {
                        "The request exceeds the maximum number of calls in a single request."
                    }
                    RequestLimitError::ConcurrentRequests => {
                        "The request exceeds the maximum number of concurrent requests."
                    }
                    RequestLimitError::ConcurrentUpload => {
                        "The request exceeds the maximum number of concurrent uploads."
                    }
                }
                .into(),
            ),
            limit: Some(limit),
        }
    }
}

impl serde::Serialize for RequestErrorType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl serde::Serialize for RequestLimitError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}
