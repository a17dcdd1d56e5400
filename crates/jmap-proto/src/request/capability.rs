/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::types::state::State;
use utils::map::vec_map::VecMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum Capability {
    Core = 1 << 0,
    Mail = 1 << 1,
    Submission = 1 << 2,
    VacationResponse = 1 << 3,
    Contacts = 1 << 4,
    Calendars = 1 << 5,
    WebSocket = 1 << 6,
    Quota = 1 << 7,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Core => "urn:ietf:params:jmap:core",
            Capability::Mail => "urn:ietf:params:jmap:mail",
            Capability::Submission => "urn:ietf:params:jmap:submission",
            Capability::VacationResponse => "urn:ietf:params:jmap:vacationresponse",
            Capability::Contacts => "urn:ietf:params:jmap:contacts",
            Capability::Calendars => "urn:ietf:params:jmap:calendars",
            Capability::WebSocket => "urn:ietf:params:jmap:websocket",
            Capability::Quota => "http://cyrusimap.org/ns/quota",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        hashify::tiny_map!(value.as_bytes(),
            "urn:ietf:params:jmap:core" => Capability::Core,
            "urn:ietf:params:jmap:mail" => Capability::Mail,
            "urn:ietf:params:jmap:submission" => Capability::Submission,
            "urn:ietf:params:jmap:vacationresponse" => Capability::VacationResponse,
            "urn:ietf:params:jmap:contacts" => Capability::Contacts,
            "urn:ietf:params:jmap:calendars" => Capability::Calendars,
            "urn:ietf:params:jmap:websocket" => Capability::WebSocket,
            "http://cyrusimap.org/ns/quota" => Capability::Quota,
        )
    }

    pub fn all_capabilities() -> &'static [Capability] {
        &[
            Capability::Core,
            Capability::Mail,
            Capability::Submission,
            Capability::VacationResponse,
            Capability::Contacts,
            Capability::Calendars,
            Capability::WebSocket,
            Capability::Quota,
        ]
    }
}

impl serde::Serialize for Capability {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(untagged)]
pub enum Capabilities {
    Core(CoreCapabilities),
    WebSocket(WebSocketCapabilities),
    Empty(EmptyCapabilities),
}

/// Limits advertised under `urn:ietf:params:jmap:core` and enforced by
/// the dispatcher and the CRUD shapes.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CoreCapabilities {
    #[serde(rename = "maxSizeUpload")]
    pub max_size_upload: usize,
    #[serde(rename = "maxConcurrentUpload")]
    pub max_concurrent_upload: usize,
    #[serde(rename = "maxSizeRequest")]
    pub max_size_request: usize,
    #[serde(rename = "maxConcurrentRequests")]
    pub max_concurrent_requests: usize,
    #[serde(rename = "maxCallsInRequest")]
    pub max_calls_in_request: usize,
    #[serde(rename = "maxObjectsInGet")]
    pub max_objects_in_get: usize,
    #[serde(rename = "maxObjectsInSet")]
    pub max_objects_in_set: usize,
    #[serde(rename = "collationAlgorithms")]
    pub collation_algorithms: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct WebSocketCapabilities {
    #[serde(rename = "url")]
    pub url: String,
    #[serde(rename = "supportsPush")]
    pub supports_push: bool,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct EmptyCapabilities {}

impl Default for CoreCapabilities {
    fn default() -> Self {
        CoreCapabilities {
            max_size_upload: 50_000_000,
            max_concurrent_upload: 4,
            max_size_request: 10_000_000,
            max_concurrent_requests: 4,
            max_calls_in_request: 16,
            max_objects_in_get: 500,
            max_objects_in_set: 500,
            collation_algorithms: vec![
                "i;ascii-numeric".to_string(),
                "i;ascii-casemap".to_string(),
                "i;octet".to_string(),
            ],
        }
    }
}

impl WebSocketCapabilities {
    pub fn new(base_url: &str) -> Self {
        WebSocketCapabilities {
            url: format!(
                "ws{}/jmap/ws/",
                base_url.strip_prefix("http").unwrap_or_default()
            ),
            supports_push: false,
        }
    }
}

/// The Session resource returned by `GET /jmap/`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Session {
    #[serde(rename = "capabilities")]
    pub capabilities: VecMap<Capability, Capabilities>,
    #[serde(rename = "accounts")]
    pub accounts: VecMap<String, Account>,
    #[serde(rename = "primaryAccounts")]
    pub primary_accounts: VecMap<Capability, String>,
    #[serde(rename = "username")]
    pub username: String,
    #[serde(rename = "apiUrl")]
    pub api_url: String,
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
    #[serde(rename = "uploadUrl")]
    pub upload_url: String,
    #[serde(rename = "state")]
    pub state: State,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Account {
    #[serde(rename = "name")]
    pub name: String,
    #[serde(rename = "isPersonal")]
    pub is_personal: bool,
    #[serde(rename = "isReadOnly")]
    pub is_read_only: bool,
    #[serde(rename = "accountCapabilities")]
    pub account_capabilities: VecMap<Capability, Capabilities>,
}

impl Session {
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        capabilities: VecMap<Capability, Capabilities>,
        state: State,
    ) -> Self {
        Session {
            capabilities,
            accounts: VecMap::new(),
            primary_accounts: VecMap::new(),
            username: username.into(),
            api_url: format!("{}/jmap/", base_url),
            download_url: format!(
                "{}/jmap/download/{{accountId}}/{{blobId}}/{{name}}?accept={{type}}",
                base_url
            ),
            upload_url: format!("{}/jmap/upload/{{accountId}}/", base_url),
            state,
        }
    }
}
