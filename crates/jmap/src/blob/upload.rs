/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::api::{Server, auth::AccessToken};
use chrono::{Duration, SecondsFormat, Utc};
use jmap_proto::types::blob::BlobId;
use std::fmt::{self, Display};
use store::StoreError;

/// Contract of `POST /jmap/upload/{accountId}/`. The HTTP layer maps
/// `TooLarge` to 413 and the store errors to 404.
pub trait BlobUpload: Sync + Send {
    fn blob_upload(
        &self,
        access_token: &AccessToken,
        account_id: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> Result<UploadResponse, UploadError>;
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct UploadResponse {
    #[serde(rename = "accountId")]
    pub account_id: String,

    #[serde(rename = "blobId")]
    pub blob_id: BlobId,

    #[serde(rename = "type")]
    pub content_type: String,

    pub size: usize,

    /// RFC 3339 timestamp after which the reservation lapses.
    pub expires: String,
}

#[derive(Debug)]
pub enum UploadError {
    TooLarge,
    Store(StoreError),
}

impl Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::TooLarge => f.write_str("upload size exceeds maxSizeUpload"),
            UploadError::Store(error) => error.fmt(f),
        }
    }
}

impl From<StoreError> for UploadError {
    fn from(error: StoreError) -> Self {
        UploadError::Store(error)
    }
}

impl BlobUpload for Server {
    fn blob_upload(
        &self,
        access_token: &AccessToken,
        account_id: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> Result<UploadResponse, UploadError> {
        if data.len() > self.settings.core.max_size_upload {
            return Err(UploadError::TooLarge);
        }

        let blob_id =
            self.store
                .blob_reserve(&access_token.user_id, account_id, data, content_type)?;

        let expires =
            (Utc::now() + Duration::hours(24)).to_rfc3339_opts(SecondsFormat::Secs, true);

        Ok(UploadResponse {
            account_id: account_id.to_string(),
            blob_id,
            content_type: content_type.unwrap_or("application/octet-stream").to_string(),
            size: data.len(),
            expires,
        })
    }
}
