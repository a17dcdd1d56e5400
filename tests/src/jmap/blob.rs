/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::jmap::{JMAPTest, OWNER, PEER, method_response, method_responses};
use ::jmap::{
    api::JmapConfig,
    blob::{
        download::{BlobDownload, DownloadError},
        upload::{BlobUpload, UploadError},
    },
};
use jmap_proto::types::{acl::Acl, blob::BlobId};
use serde_json::json;
use store::Store;

const USING: [&str; 1] = ["urn:ietf:params:jmap:core"];

#[test]
fn upload_and_download() {
    let params = JMAPTest::new();
    let data = b"some uploaded bytes";

    let upload = params
        .server
        .blob_upload(&params.access_token, OWNER, data, Some("text/plain"))
        .unwrap();
    let blob_id = upload.blob_id.to_string();
    assert_eq!(blob_id.len(), 41);
    assert!(blob_id.starts_with('G'));
    assert_eq!(upload.size, data.len());
    assert_eq!(upload.content_type, "text/plain");
    assert_eq!(upload.account_id, OWNER);
    assert!(upload.expires.ends_with('Z'));

    let downloaded = params
        .server
        .blob_download(
            &params.access_token,
            OWNER,
            &blob_id,
            "notes.txt",
            Some("text/plain"),
        )
        .unwrap();
    assert_eq!(downloaded.data, data);
    assert_eq!(downloaded.content_type, "text/plain");
    assert_eq!(downloaded.file_name, "notes.txt");

    // Wildcard accept values fall back to octet-stream.
    let downloaded = params
        .server
        .blob_download(&params.access_token, OWNER, &blob_id, "notes", Some("*/*"))
        .unwrap();
    assert_eq!(downloaded.content_type, "application/octet-stream");

    assert_eq!(
        params
            .server
            .blob_download(&params.access_token, OWNER, "G123", "x", None)
            .unwrap_err(),
        DownloadError::BadBlobId("invalid blobid (not 41 chars)")
    );
    assert_eq!(
        params
            .server
            .blob_download(
                &params.access_token,
                OWNER,
                &blob_id.replace('G', "X"),
                "x",
                None
            )
            .unwrap_err(),
        DownloadError::BadBlobId("invalid blobid (doesn't start with G)")
    );
}

#[test]
fn upload_size_limit() {
    let params = JMAPTest::with_config(JmapConfig {
        max_size_upload: 8,
        ..JmapConfig::default()
    });

    assert!(matches!(
        params
            .server
            .blob_upload(&params.access_token, OWNER, b"way past the limit", None)
            .unwrap_err(),
        UploadError::TooLarge
    ));
}

#[test]
fn download_requires_rights() {
    let params = JMAPTest::new();
    params.store.create_mailbox(PEER, "Private").unwrap();
    params.store.create_mailbox(PEER, "Shared").unwrap();
    params
        .store
        .share_mailbox(PEER, "Shared", OWNER, Acl::read_items())
        .unwrap();

    let (shared_blob, _, _) = params
        .store
        .put_message(PEER, "Shared", b"shared message")
        .unwrap();
    let (private_blob, _, _) = params
        .store
        .put_message(PEER, "Private", b"private message")
        .unwrap();

    // The account segment names the peer; access follows mailbox
    // rights, not account identity.
    let downloaded = params
        .server
        .blob_download(
            &params.access_token,
            PEER,
            &shared_blob.to_string(),
            "m",
            None,
        )
        .unwrap();
    assert_eq!(downloaded.data, b"shared message");

    assert_eq!(
        params
            .server
            .blob_download(
                &params.access_token,
                PEER,
                &private_blob.to_string(),
                "m",
                None
            )
            .unwrap_err(),
        DownloadError::Forbidden
    );
}

#[test]
fn blob_get() {
    let params = JMAPTest::new();
    let (blob_id, email_id, thread_id) = params
        .store
        .put_message(OWNER, "INBOX", b"From: a@b\r\n\r\nhello")
        .unwrap();
    let blob_id = blob_id.to_string();
    let email_id = email_id.to_string();
    let thread_id = thread_id.to_string();
    let inbox_id = params.store.mailbox_lookup(OWNER, "INBOX").unwrap().id;
    let missing = BlobId::from_content(b"not stored").to_string();

    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Blob/get", {
            "ids": [&blob_id, &missing]
        }, "c0"]]
    }));

    let (_, get, _) = method_response(&response, 0);
    assert_eq!(
        get["list"],
        json!([{
            "id": &blob_id,
            "mailboxIds": {inbox_id: true},
            "emailIds": {email_id: true},
            "threadIds": {thread_id: true}
        }])
    );
    assert_eq!(get["notFound"], json!([missing]));

    // Property filtering keeps only what was asked for.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Blob/get", {
            "ids": [&blob_id],
            "properties": ["mailboxIds"]
        }, "c0"]]
    }));
    let (_, get, _) = method_response(&response, 0);
    let keys: Vec<&str> = get["list"][0]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, ["id", "mailboxIds"]);

    // All-objects listing is not allowed for blobs.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Blob/get", {"ids": null}, "c0"]]
    }));
    let (name, payload, _) = method_response(&response, 0);
    assert_eq!(name, "error");
    assert_eq!(payload["type"], "invalidArguments");
    assert_eq!(payload["arguments"], json!(["ids"]));
}

#[test]
fn blob_copy_is_per_blob() {
    let params = JMAPTest::new();
    params.store.create_mailbox(PEER, "Shared").unwrap();
    params
        .store
        .share_mailbox(PEER, "Shared", OWNER, Acl::read_items())
        .unwrap();

    let (blob_a, _, _) = params.store.put_message(PEER, "Shared", b"blob a").unwrap();
    let (blob_b, _, _) = params.store.put_message(PEER, "Shared", b"blob b").unwrap();
    let missing = BlobId::from_content(b"missing").to_string();

    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Blob/copy", {
            "fromAccountId": PEER,
            "accountId": OWNER,
            "blobIds": [blob_a.to_string(), blob_b.to_string(), &missing],
            "onSuccessDestroyOriginal": true
        }, "c0"]]
    }));

    // Two copied, one failed; the partial failure schedules no
    // destroy sub-call.
    assert_eq!(method_responses(&response).len(), 1);
    let (name, copy, _) = method_response(&response, 0);
    assert_eq!(name, "Blob/copy");
    assert_eq!(copy["created"].as_object().unwrap().len(), 2);
    assert_eq!(copy["notCreated"][&missing]["type"], "blobNotFound");

    // The copies are readable in the target account.
    let dest = copy["created"][&blob_a.to_string()].as_str().unwrap();
    let content = params
        .store
        .blob_content(OWNER, &BlobId::parse(dest).unwrap())
        .unwrap();
    assert_eq!(content.data, b"blob a");

    // An unknown target account fails each blob, not the call.
    let response = params.request(json!({
        "using": USING,
        "methodCalls": [["Blob/copy", {
            "fromAccountId": PEER,
            "accountId": "nobody@example.com",
            "blobIds": [blob_a.to_string()]
        }, "c0"]]
    }));
    let (_, copy, _) = method_response(&response, 0);
    assert_eq!(
        copy["notCreated"][&blob_a.to_string()]["type"],
        "toAccountNotFound"
    );
}
