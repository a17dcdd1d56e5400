/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::jmap::{JMAPTest, method_response};
use serde_json::json;

const USING: [&str; 2] = ["urn:ietf:params:jmap:core", "urn:ietf:params:jmap:mail"];

fn seed(params: &JMAPTest, subjects: &[&str]) -> Vec<String> {
    let mut ids = Vec::with_capacity(subjects.len());
    for subject in subjects {
        let response = params.request(json!({
            "using": USING,
            "methodCalls": [["Email/set", {
                "create": {"k": {"subject": subject}}
            }, "c0"]]
        }));
        ids.push(
            method_response(&response, 0).1["created"]["k"]["id"]
                .as_str()
                .unwrap()
                .to_string(),
        );
    }
    ids
}

#[test]
fn filter_sort_position() {
    let params = JMAPTest::new();
    let ids = seed(&params, &["alpha", "beta", "gamma", "alpha beta"]);

    // Substring filter with calculateTotal.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/query", {
            "filter": {"subject": "beta"},
            "calculateTotal": true
        }, "c0"]]
    }));
    let (_, query, _) = method_response(&response, 0);
    assert_eq!(query["ids"], json!([&ids[1], &ids[3]]));
    assert_eq!(query["total"], 2);
    assert_eq!(query["position"], 0);
    assert_eq!(query["canCalculateChanges"], false);
    assert!(query["queryState"].is_string());

    // Operator tree.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/query", {
            "filter": {"operator": "NOT", "conditions": [{"subject": "a"}]}
        }, "c0"]]
    }));
    let (_, query, _) = method_response(&response, 0);
    assert_eq!(query["ids"], json!([]));

    // Descending sort.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/query", {
            "sort": [{"property": "subject", "isAscending": false}]
        }, "c0"]]
    }));
    let (_, query, _) = method_response(&response, 0);
    assert_eq!(query["ids"], json!([&ids[2], &ids[1], &ids[3], &ids[0]]));

    // Positive and negative positions, with a limit.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [
            ["Email/query", {"position": 2, "limit": 1}, "c0"],
            ["Email/query", {"position": -2}, "c1"]
        ]
    }));
    let (_, query, _) = method_response(&response, 0);
    assert_eq!(query["ids"], json!([&ids[2]]));
    assert_eq!(query["position"], 2);
    let (_, query, _) = method_response(&response, 1);
    assert_eq!(query["ids"], json!([&ids[2], &ids[3]]));
}

#[test]
fn anchors() {
    let params = JMAPTest::new();
    let ids = seed(&params, &["one", "two", "three", "four"]);

    let response = params.request(json!({
        "using": USING,
        "methodCalls": [
            ["Email/query", {"anchor": &ids[1], "anchorOffset": 1}, "c0"],
            ["Email/query", {"anchor": "Mdoesnotexist000000000000"}, "c1"]
        ]
    }));
    let (_, query, _) = method_response(&response, 0);
    assert_eq!(query["ids"], json!([&ids[2], &ids[3]]));
    assert_eq!(query["position"], 2);

    let (name, payload, _) = method_response(&response, 1);
    assert_eq!(name, "error");
    assert_eq!(payload["type"], "anchorNotFound");
}

#[test]
fn unsupported_filters_and_sorts() {
    let params = JMAPTest::new();

    let response = params.request(json!({
        "using": USING,
        "methodCalls": [
            ["Email/query", {"filter": {"frobnicate": true}}, "c0"],
            ["Email/query", {"sort": [{"property": "smell"}]}, "c1"],
            ["Email/query", {"position": 1, "anchor": "M1"}, "c2"]
        ]
    }));

    let (name, payload, _) = method_response(&response, 0);
    assert_eq!(name, "error");
    assert_eq!(payload["type"], "unsupportedFilter");
    let (_, payload, _) = method_response(&response, 1);
    assert_eq!(payload["type"], "unsupportedSort");
    let (_, payload, _) = method_response(&response, 2);
    assert_eq!(payload["type"], "invalidArguments");
}

#[test]
fn query_changes() {
    let params = JMAPTest::new();
    seed(&params, &["one"]);

    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/query", {}, "c0"]]
    }));
    let state = method_response(&response, 0).1["queryState"]
        .as_str()
        .unwrap()
        .to_string();

    // Up to date: the empty diff.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/queryChanges", {
            "filter": {"subject": "one"},
            "sinceQueryState": &state
        }, "c0"]]
    }));
    let (name, query, _) = method_response(&response, 0);
    assert_eq!(name, "Email/queryChanges");
    assert_eq!(query["oldQueryState"], json!(&state));
    assert_eq!(query["newQueryState"], json!(&state));
    assert_eq!(query["added"], json!([]));
    assert_eq!(query["removed"], json!([]));

    // Stale or garbled states cannot be diffed.
    seed(&params, &["two"]);
    for since in [state.as_str(), "not-a-state"] {
        let response = params.request(json!({
            "using": USING,
            "methodCalls": [["Email/queryChanges", {
                "sinceQueryState": since
            }, "c0"]]
        }));
        let (name, payload, _) = method_response(&response, 0);
        assert_eq!(name, "error");
        assert_eq!(payload["type"], "cannotCalculateChanges");
    }
}
