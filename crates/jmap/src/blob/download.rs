/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::api::{Server, auth::AccessToken};
use jmap_proto::types::{acl::Acl, blob::{BLOB_ID_LEN, BlobId}};
use std::fmt::{self, Display};
use store::StoreError;

/// Contract of `GET /jmap/download/{accountId}/{blobId}/{name}`.
pub trait BlobDownload: Sync + Send {
    fn blob_download(
        &self,
        access_token: &AccessToken,
        account_id: &str,
        blob_id: &str,
        name: &str,
        accept: Option<&str>,
    ) -> Result<DownloadedBlob, DownloadError>;
}

#[derive(Debug, Clone)]
pub struct DownloadedBlob {
    pub content_type: String,
    pub file_name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DownloadError {
    BadBlobId(&'static str),
    NotFound,
    Forbidden,
    Store(StoreError),
}

impl Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::BadBlobId(detail) => f.write_str(detail),
            DownloadError::NotFound => f.write_str("failed to find blob by id"),
            DownloadError::Forbidden => f.write_str("not allowed to fetch this blob"),
            DownloadError::Store(error) => error.fmt(f),
        }
    }
}

impl BlobDownload for Server {
    /// The account segment names the account to search; the
    /// authenticated user must hold read rights on a mailbox holding
    /// the blob there, but need not be that account.
    fn blob_download(
        &self,
        access_token: &AccessToken,
        account_id: &str,
        blob_id: &str,
        name: &str,
        accept: Option<&str>,
    ) -> Result<DownloadedBlob, DownloadError> {
        if !blob_id.starts_with('G') {
            return Err(DownloadError::BadBlobId(
                "invalid blobid (doesn't start with G)",
            ));
        }
        if blob_id.len() != BLOB_ID_LEN {
            return Err(DownloadError::BadBlobId("invalid blobid (not 41 chars)"));
        }
        let blob_id = BlobId::parse(blob_id)
            .ok_or(DownloadError::BadBlobId("invalid blobid (bad digest)"))?;

        let allowed = if access_token.user_id == account_id {
            true
        } else {
            let locations = self
                .store
                .blob_locate(account_id, &blob_id)
                .map_err(map_store_error)?;
            locations.iter().any(|location| {
                self.store
                    .mailbox_lookup(account_id, &location.mailbox)
                    .map(|mailbox| {
                        self.store
                            .myrights(&access_token.user_id, &mailbox)
                            .contains_all(Acl::read_items())
                    })
                    .unwrap_or(false)
            })
        };
        if !allowed {
            return Err(DownloadError::Forbidden);
        }

        let content = match self.store.blob_content(account_id, &blob_id) {
            Ok(content) => content,
            Err(StoreError::NotFound) => return Err(DownloadError::NotFound),
            Err(error) => return Err(map_store_error(error)),
        };

        Ok(DownloadedBlob {
            content_type: accept
                .filter(|accept| accept.contains('/') && !accept.contains('*'))
                .unwrap_or("application/octet-stream")
                .to_string(),
            file_name: name.to_string(),
            data: content.data,
        })
    }
}

fn map_store_error(error: StoreError) -> DownloadError {
    match error {
        StoreError::AccountNotFound | StoreError::NotFound => DownloadError::NotFound,
        StoreError::PermissionDenied => DownloadError::Forbidden,
        error => DownloadError::Store(error),
    }
}
