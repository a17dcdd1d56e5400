/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use super::{Call, Request};
use crate::error::request::{RequestError, RequestLimitError};
use serde::{
    Deserialize, Deserializer,
    de::{self, SeqAccess, Visitor},
};
use serde_json::Value;
use std::fmt;

impl Request {
    /// Deserializes and gates a request envelope. The size gate runs
    /// before parsing, the call-count gate after.
    pub fn parse(json: &[u8], max_calls: usize, max_size: usize) -> Result<Self, RequestError> {
        if json.len() > max_size {
            return Err(RequestError::limit(RequestLimitError::SizeRequest));
        }

        let request = serde_json::from_slice::<Request>(json).map_err(|err| {
            match err.classify() {
                serde_json::error::Category::Data => RequestError::not_request(err.to_string()),
                _ => RequestError::not_json(err.to_string()),
            }
        })?;

        if request.using.is_empty() {
            Err(RequestError::not_request(
                "The using property cannot be empty.",
            ))
        } else if request.method_calls.is_empty() {
            Err(RequestError::not_request(
                "The methodCalls property cannot be empty.",
            ))
        } else if request.method_calls.len() > max_calls {
            Err(RequestError::limit(RequestLimitError::CallsIn))
        } else {
            Ok(request)
        }
    }
}

impl<'de> Deserialize<'de> for Request {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RequestVisitor;

        impl<'de> Visitor<'de> for RequestVisitor {
            type Value = Request;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JMAP request object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Request, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut request = Request::default();

                while let Some(key) = map.next_key::<&str>()? {
                    match key {
                        "using" => {
                            request.using = map.next_value()?;
                        }
                        "methodCalls" => {
                            request.method_calls = map.next_value()?;
                        }
                        "createdIds" => {
                            request.created_ids = map.next_value()?;
                        }
                        _ => {
                            let _ = map.next_value::<de::IgnoredAny>()?;
                        }
                    }
                }

                Ok(request)
            }
        }

        deserializer.deserialize_map(RequestVisitor)
    }
}

struct CallVisitor;

impl<'de> Visitor<'de> for CallVisitor {
    type Value = Call;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an array with 3 elements")
    }

    fn visit_seq<V>(self, mut seq: V) -> Result<Call, V::Error>
    where
        V: SeqAccess<'de>,
    {
        let name = seq
            .next_element::<String>()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let arguments = seq
            .next_element::<Value>()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        if !arguments.is_object() {
            return Err(de::Error::invalid_type(
                de::Unexpected::Other("non-object method arguments"),
                &"a JSON object",
            ));
        }
        let id = seq
            .next_element::<String>()?
            .ok_or_else(|| de::Error::invalid_length(2, &self))?;

        if seq.next_element::<de::IgnoredAny>()?.is_some() {
            return Err(de::Error::custom("method call has more than 3 elements"));
        }

        Ok(Call {
            id,
            name,
            arguments,
        })
    }
}

impl<'de> Deserialize<'de> for Call {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(CallVisitor)
    }
}
