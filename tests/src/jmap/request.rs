/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::jmap::{JMAPTest, OWNER, method_response, method_responses};
use ::jmap::api::JmapConfig;
use jmap_proto::error::request::{RequestErrorType, RequestLimitError};
use serde_json::json;

const USING: [&str; 2] = ["urn:ietf:params:jmap:core", "urn:ietf:params:jmap:mail"];

#[test]
fn core_echo() {
    let params = JMAPTest::new();
    let response = params.request(json!({
        "using": ["urn:ietf:params:jmap:core"],
        "methodCalls": [["Core/echo", {"hello": 1}, "c0"]]
    }));

    assert_eq!(
        response["methodResponses"],
        json!([["Core/echo", {"hello": 1}, "c0"]])
    );
    assert!(response["sessionState"].is_string());
    assert!(response.get("createdIds").is_none());
}

#[test]
fn unknown_capability_is_rejected() {
    let params = JMAPTest::new();

    for capability in ["urn:x", "urn:ietf:params:jmap:calendars"] {
        let error = params.request_err(json!({
            "using": [capability],
            "methodCalls": [["Core/echo", {}, "c0"]]
        }));
        assert_eq!(error.error_type, RequestErrorType::UnknownCapability);
    }
}

#[test]
fn request_limits() {
    let params = JMAPTest::with_config(JmapConfig {
        max_calls_in_request: 2,
        ..JmapConfig::default()
    });
    let error = params.request_err(json!({
        "using": ["urn:ietf:params:jmap:core"],
        "methodCalls": [
            ["Core/echo", {}, "c0"],
            ["Core/echo", {}, "c1"],
            ["Core/echo", {}, "c2"]
        ]
    }));
    assert_eq!(error.limit, Some(RequestLimitError::CallsIn));

    let params = JMAPTest::with_config(JmapConfig {
        max_size_request: 10,
        ..JmapConfig::default()
    });
    let error = params.request_err(json!({
        "using": ["urn:ietf:params:jmap:core"],
        "methodCalls": [["Core/echo", {}, "c0"]]
    }));
    assert_eq!(error.limit, Some(RequestLimitError::SizeRequest));

    // A limit configured out of range disables the call entirely.
    let params = JMAPTest::with_config(JmapConfig {
        max_calls_in_request: -3,
        ..JmapConfig::default()
    });
    let error = params.request_err(json!({
        "using": ["urn:ietf:params:jmap:core"],
        "methodCalls": [["Core/echo", {}, "c0"]]
    }));
    assert_eq!(error.limit, Some(RequestLimitError::CallsIn));
}

#[test]
fn unknown_and_ungranted_methods() {
    let params = JMAPTest::new();
    let response = params.request(json!({
        "using": ["urn:ietf:params:jmap:core"],
        "methodCalls": [
            ["Core/echo", {"a": true}, "c0"],
            ["Foo/bar", {}, "c1"],
            // Known method, but the mail capability was not requested.
            ["Email/get", {"ids": []}, "c2"],
            ["Core/echo", {"b": true}, "c3"]
        ]
    }));

    // Responses keep the request order and echo the client ids.
    let responses = method_responses(&response);
    assert_eq!(responses.len(), 4);
    for (index, (name, id)) in [
        ("Core/echo", "c0"),
        ("error", "c1"),
        ("error", "c2"),
        ("Core/echo", "c3"),
    ]
    .into_iter()
    .enumerate()
    {
        let (got_name, _, got_id) = method_response(&response, index);
        assert_eq!(got_name, name);
        assert_eq!(got_id, id);
    }

    assert_eq!(responses[1][1]["type"], "unknownMethod");
    assert_eq!(responses[2][1]["type"], "methodNotFound");
}

#[test]
fn result_references() {
    let params = JMAPTest::new();
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [
            ["Email/set", {"create": {
                "k1": {"subject": "first"},
                "k2": {"subject": "second"}
            }}, "a"],
            ["Email/query", {}, "b"],
            ["Email/get", {
                "#ids": {"resultOf": "b", "name": "Email/query", "path": "/ids"},
                "properties": ["subject"]
            }, "c"]
        ]
    }));

    let (_, get, _) = method_response(&response, 2);
    assert_eq!(get["list"].as_array().unwrap().len(), 2);

    // Unresolvable references fail only their own call.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [
            ["Email/get", {
                "#ids": {"resultOf": "nope", "name": "Email/query", "path": "/ids"}
            }, "c0"],
            ["Core/echo", {}, "c1"]
        ]
    }));
    let (name, payload, _) = method_response(&response, 0);
    assert_eq!(name, "error");
    assert_eq!(payload["type"], "invalidResultReference");
    assert_eq!(method_response(&response, 1).0, "Core/echo");

    // A reference alongside its plain twin is invalid.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [
            ["Email/get", {
                "ids": [],
                "#ids": {"resultOf": "x", "name": "Email/query", "path": "/ids"}
            }, "c0"]
        ]
    }));
    let (name, payload, _) = method_response(&response, 0);
    assert_eq!(name, "error");
    assert_eq!(payload["type"], "invalidArguments");
}

#[test]
fn creation_id_references() {
    let params = JMAPTest::new();
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [
            ["Email/set", {"create": {"k": {"subject": "hi"}}}, "a"],
            ["Email/get", {"ids": ["#k"], "properties": ["subject"]}, "b"]
        ]
    }));

    let (_, set, _) = method_response(&response, 0);
    let id = set["created"]["k"]["id"].as_str().unwrap().to_string();
    let (_, get, _) = method_response(&response, 1);
    assert_eq!(get["list"], json!([{"id": &id, "subject": "hi"}]));
    assert_eq!(get["notFound"], json!([]));

    // The table grows the echoed map when the client sent one.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [
            ["Email/set", {"create": {"k2": {"subject": "again"}}}, "a"],
            ["Email/get", {"ids": ["#seed"], "properties": ["subject"]}, "b"]
        ],
        "createdIds": {"seed": &id}
    }));
    let created_ids = response["createdIds"].as_object().unwrap();
    assert_eq!(created_ids["seed"], json!(id));
    assert!(created_ids.contains_key("k2"));
    let (_, get, _) = method_response(&response, 1);
    assert_eq!(get["list"][0]["subject"], "hi");

    // An unknown creation id points at the offending property.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/get", {"ids": ["#ghost"]}, "c0"]]
    }));
    let (name, payload, _) = method_response(&response, 0);
    assert_eq!(name, "error");
    assert_eq!(payload["type"], "invalidArguments");
    assert_eq!(payload["arguments"], json!(["ids[0]"]));
}

#[test]
fn session_resource() {
    let params = JMAPTest::new();
    let session = serde_json::to_value(
        params
            .server
            .session_resource(&params.access_token)
            .unwrap(),
    )
    .unwrap();

    assert_eq!(session["username"], OWNER);
    assert_eq!(session["apiUrl"], "https://localhost/jmap/");
    assert_eq!(
        session["uploadUrl"],
        "https://localhost/jmap/upload/{accountId}/"
    );
    let core = &session["capabilities"]["urn:ietf:params:jmap:core"];
    assert_eq!(core["maxCallsInRequest"], 16);
    assert_eq!(core["maxObjectsInSet"], 500);
    assert!(session["capabilities"]["urn:ietf:params:jmap:mail"].is_object());
    assert_eq!(session["accounts"][OWNER]["isPersonal"], true);
    assert_eq!(
        session["primaryAccounts"]["urn:ietf:params:jmap:mail"],
        OWNER
    );
    assert!(session["state"].is_string());
}
