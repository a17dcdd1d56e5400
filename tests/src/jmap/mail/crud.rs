/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::jmap::{JMAPTest, OWNER, PEER, method_response, method_responses};
use jmap_proto::types::type_state::DataType;
use serde_json::{Value, json};

const USING: [&str; 2] = ["urn:ietf:params:jmap:core", "urn:ietf:params:jmap:mail"];

fn email_state(params: &JMAPTest) -> String {
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/get", {"ids": []}, "s"]]
    }));
    method_response(&response, 0).1["state"]
        .as_str()
        .unwrap()
        .to_string()
}

#[test]
fn set_create_update_destroy() {
    let params = JMAPTest::new();

    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/set", {
            "create": {"k": {"subject": "hello", "keywords": {"$draft": true}}}
        }, "c0"]]
    }));
    let (_, set, _) = method_response(&response, 0);
    let id = set["created"]["k"]["id"].as_str().unwrap().to_string();
    assert_ne!(set["oldState"], set["newState"]);

    // Patch-object update: add a keyword, drop one, rewrite the
    // subject.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [
            ["Email/set", {"update": {&id: {
                "keywords/$seen": true,
                "keywords/$draft": null,
                "subject": "bye"
            }}}, "c0"],
            ["Email/get", {"ids": [&id]}, "c1"]
        ]
    }));
    let (_, set, _) = method_response(&response, 0);
    assert!(set["updated"].as_object().unwrap().contains_key(&id));
    let (_, get, _) = method_response(&response, 1);
    assert_eq!(get["list"][0]["subject"], "bye");
    assert_eq!(get["list"][0]["keywords"], json!({"$seen": true}));

    // Updating and destroying the same id rejects the update.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/set", {
            "update": {&id: {"subject": "never"}},
            "destroy": [&id]
        }, "c0"]]
    }));
    let (_, set, _) = method_response(&response, 0);
    assert_eq!(set["notUpdated"][&id]["type"], "willDestroy");
    assert_eq!(set["destroyed"], json!([&id]));

    // Destroying it again is a per-object failure, not a call error.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/set", {"destroy": [&id]}, "c0"]]
    }));
    let (name, set, _) = method_response(&response, 0);
    assert_eq!(name, "Email/set");
    assert_eq!(set["notDestroyed"][&id]["type"], "notFound");
}

#[test]
fn get_all_with_property_filter() {
    let params = JMAPTest::new();
    params.request(json!({
        "using": USING,
        "methodCalls": [["Email/set", {"create": {
            "a": {"subject": "one", "keywords": {"$seen": true}},
            "b": {"subject": "two", "keywords": {}}
        }}, "c0"]]
    }));

    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/get", {
            "ids": null,
            "properties": ["subject"]
        }, "c0"]]
    }));

    // Every listed object carries exactly the id and the requested
    // property.
    let (_, get, _) = method_response(&response, 0);
    let list = get["list"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    for email in list {
        let mut keys: Vec<&str> = email
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(keys, ["id", "subject"]);
    }

    // Unknown property names are rejected with their index.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/get", {
            "ids": null,
            "properties": ["subject", "x-bogus"]
        }, "c0"]]
    }));
    let (name, payload, _) = method_response(&response, 0);
    assert_eq!(name, "error");
    assert_eq!(payload["type"], "invalidArguments");
    assert_eq!(payload["arguments"], json!(["properties[1]"]));
}

#[test]
fn server_set_properties_are_rejected() {
    let params = JMAPTest::new();
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/set", {
            "create": {"k": {"id": "M123", "subject": "forged"}}
        }, "c0"]]
    }));
    let (_, set, _) = method_response(&response, 0);
    assert_eq!(set["notCreated"]["k"]["type"], "invalidProperties");
    assert_eq!(set["notCreated"]["k"]["properties"], json!(["id"]));
}

#[test]
fn if_in_state() {
    let params = JMAPTest::new();
    let state = email_state(&params);

    // Mismatch fails the call before any mutation.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/set", {
            "ifInState": "987654",
            "create": {"k": {"subject": "nope"}}
        }, "c0"]]
    }));
    let (name, payload, id) = method_response(&response, 0);
    assert_eq!((name, id), ("error", "c0"));
    assert_eq!(payload["type"], "stateMismatch");
    assert_eq!(
        params
            .store
            .object_ids(OWNER, DataType::Email)
            .unwrap()
            .len(),
        0
    );

    // A matching token is echoed as oldState.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/set", {
            "ifInState": &state,
            "create": {"k": {"subject": "yes"}}
        }, "c0"]]
    }));
    let (_, set, _) = method_response(&response, 0);
    assert_eq!(set["oldState"], json!(&state));
    assert_ne!(set["newState"], json!(state));

    // A set with nothing to do leaves the state untouched.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/set", {}, "c0"]]
    }));
    let (_, set, _) = method_response(&response, 0);
    assert_eq!(set["oldState"], set["newState"]);
}

#[test]
fn changes() {
    let params = JMAPTest::new();
    let state0 = email_state(&params);

    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/set", {"create": {
            "a": {"subject": "one"},
            "b": {"subject": "two"},
            "c": {"subject": "three"}
        }}, "c0"]]
    }));
    let (_, set, _) = method_response(&response, 0);
    let id_a = set["created"]["a"]["id"].as_str().unwrap().to_string();

    let response = params.request(json!({
        "using": USING,
        "methodCalls": [
            ["Email/set", {"destroy": [&id_a]}, "c0"],
            ["Email/changes", {"sinceState": state0}, "c1"]
        ]
    }));
    let (_, changes, _) = method_response(&response, 1);
    // Created then destroyed within the window cancels out.
    assert_eq!(changes["created"].as_array().unwrap().len(), 2);
    assert_eq!(changes["updated"], json!([]));
    assert_eq!(changes["destroyed"], json!([]));
    assert_eq!(changes["hasMoreChanges"], false);
    let state1 = changes["newState"].as_str().unwrap().to_string();

    // Equal states produce the empty diff.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/changes", {"sinceState": state1}, "c0"]]
    }));
    let (_, changes, _) = method_response(&response, 0);
    assert_eq!(changes["oldState"], changes["newState"]);
    assert_eq!(changes["created"], json!([]));

    // A state from the future cannot be reconstructed.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/changes", {"sinceState": "99999999"}, "c0"]]
    }));
    let (name, payload, _) = method_response(&response, 0);
    assert_eq!(name, "error");
    assert_eq!(payload["type"], "cannotCalculateChanges");
}

#[test]
fn changes_pagination() {
    let params = JMAPTest::new();
    let state0 = email_state(&params);

    params.request(json!({
        "using": USING,
        "methodCalls": [["Email/set", {"create": {
            "a": {"subject": "one"},
            "b": {"subject": "two"},
            "c": {"subject": "three"}
        }}, "c0"]]
    }));

    let mut since = state0;
    let mut created: Vec<String> = Vec::new();
    for _ in 0..3 {
        let response = params.request(json!({
            "using": USING,
            "methodCalls": [["Email/changes", {
                "sinceState": since,
                "maxChanges": 2
            }, "c0"]]
        }));
        let (_, changes, _) = method_response(&response, 0);
        created.extend(
            changes["created"]
                .as_array()
                .unwrap()
                .iter()
                .map(|id| id.as_str().unwrap().to_string()),
        );
        since = changes["newState"].as_str().unwrap().to_string();
        if changes["hasMoreChanges"] == json!(false) {
            break;
        }
    }
    assert_eq!(created.len(), 3);
}

#[test]
fn copy_with_destroy_original() {
    let params = JMAPTest::new();
    params
        .store
        .object_insert(PEER, DataType::Email, "Maaaabbbbccccddddeeeeffff", json!({"subject": "source"}))
        .unwrap();

    let response = params.request(json!({
        "using": USING,
        "methodCalls": [
            ["Email/copy", {
                "fromAccountId": PEER,
                "accountId": OWNER,
                "create": {"k": {"id": "Maaaabbbbccccddddeeeeffff"}},
                "onSuccessDestroyOriginal": true
            }, "c0"],
            ["Core/echo", {"done": true}, "c1"]
        ]
    }));

    // The destroy sub-call runs between its parent and the next
    // original call, inheriting the parent's client id.
    let responses = method_responses(&response);
    assert_eq!(responses.len(), 3);
    assert_eq!(method_response(&response, 0).0, "Email/copy");
    let (name, set, id) = method_response(&response, 1);
    assert_eq!((name, id), ("Email/set", "c0"));
    assert_eq!(set["destroyed"], json!(["Maaaabbbbccccddddeeeeffff"]));
    assert_eq!(set["accountId"], PEER);
    assert_eq!(method_response(&response, 2).0, "Core/echo");

    assert_eq!(
        params
            .store
            .object_get(PEER, DataType::Email, "Maaaabbbbccccddddeeeeffff")
            .unwrap(),
        None
    );

    let copied: Vec<Value> = method_response(&response, 0).1["created"]
        .as_object()
        .unwrap()
        .values()
        .cloned()
        .collect();
    let copied_id = copied[0]["id"].as_str().unwrap();
    assert!(
        params
            .store
            .object_get(OWNER, DataType::Email, copied_id)
            .unwrap()
            .is_some()
    );
}

#[test]
fn copy_failure_suppresses_destroy() {
    let params = JMAPTest::new();
    params
        .store
        .object_insert(PEER, DataType::Email, "Maaaabbbbccccddddeeee0000", json!({"subject": "keep me"}))
        .unwrap();

    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Email/copy", {
            "fromAccountId": PEER,
            "accountId": OWNER,
            "create": {
                "k1": {"id": "Maaaabbbbccccddddeeee0000"},
                "k2": {"id": "Mdoesnotexist000000000000"}
            },
            "onSuccessDestroyOriginal": true
        }, "c0"]]
    }));

    // One failure: no Email/set sub-call is scheduled and the source
    // survives.
    assert_eq!(method_responses(&response).len(), 1);
    let (_, copy, _) = method_response(&response, 0);
    assert_eq!(copy["created"].as_object().unwrap().len(), 1);
    assert_eq!(copy["notCreated"]["k2"]["type"], "notFound");
    assert!(
        params
            .store
            .object_get(PEER, DataType::Email, "Maaaabbbbccccddddeeee0000")
            .unwrap()
            .is_some()
    );
}
