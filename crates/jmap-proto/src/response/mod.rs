/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    error::method::MethodError,
    request::{Call, reference::{IdResolver, ResultReference}},
    types::state::State,
};
use serde::ser::SerializeSeq;
use serde_json::Value;
use utils::map::vec_map::VecMap;

#[derive(Debug, serde::Serialize)]
pub struct Response {
    #[serde(rename = "methodResponses")]
    pub method_responses: Vec<Call>,

    #[serde(rename = "createdIds")]
    #[serde(skip_serializing_if = "VecMap::is_empty")]
    pub created_ids: VecMap<String, String>,

    #[serde(rename = "sessionState")]
    pub session_state: State,
}

impl Response {
    pub fn new(session_state: State, created_ids: VecMap<String, String>, capacity: usize) -> Self {
        Response {
            method_responses: Vec::with_capacity(capacity),
            created_ids,
            session_state,
        }
    }

    pub fn push_response(&mut self, name: impl Into<String>, payload: Value, id: impl Into<String>) {
        self.method_responses.push(Call::new(name, payload, id));
    }

    pub fn push_error(&mut self, id: impl Into<String>, error: MethodError) {
        self.method_responses.push(Call::new(
            "error",
            serde_json::to_value(&error).unwrap_or_default(),
            id,
        ));
    }

    pub fn push_created_id(&mut self, creation_id: String, id: String) {
        self.created_ids.set(creation_id, id);
    }

    /// Evaluates a result reference against the responses emitted so
    /// far. The referenced call is matched by client id and method
    /// name; the payload is extracted via the RFC 6901 pointer.
    pub fn eval_result_reference(&self, rr: &ResultReference) -> Result<Value, MethodError> {
        self.method_responses
            .iter()
            .find(|response| response.id == rr.result_of && response.name == rr.name)
            .and_then(|response| rr.path.eval(&response.arguments))
            .ok_or_else(|| {
                MethodError::invalid_result_reference(format!("Result reference {} not found.", rr))
            })
    }
}

impl IdResolver for Response {
    fn created_id(&self, creation_id: &str) -> Option<&str> {
        self.created_ids
            .get(&creation_id.to_string())
            .map(|id| id.as_str())
    }
}

impl serde::Serialize for Call {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(3))?;
        seq.serialize_element(&self.name)?;
        seq.serialize_element(&self.arguments)?;
        seq.serialize_element(&self.id)?;
        seq.end()
    }
}
