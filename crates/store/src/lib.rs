/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod memory;

use jmap_proto::types::{acl::Acl, blob::BlobId, type_state::DataType};
use std::fmt::{self, Display};
use utils::map::bitmap::Bitmap;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    AccountNotFound,
    NotFound,
    PermissionDenied,
    /// The mailbox is locked by another worker.
    MailboxLocked,
    /// A cached read-only handle cannot be promoted to read-write.
    LockUpgrade,
    OverQuota,
    Unavailable(String),
    Internal(String),
}

impl StoreError {
    /// Transient conditions map to `serverUnavailable`, the rest to
    /// `serverFail`.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::MailboxLocked | StoreError::Unavailable(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::AccountNotFound => f.write_str("account not found"),
            StoreError::NotFound => f.write_str("not found"),
            StoreError::PermissionDenied => f.write_str("permission denied"),
            StoreError::MailboxLocked => f.write_str("mailbox is locked"),
            StoreError::LockUpgrade => f.write_str("mailbox lock upgrade is not supported"),
            StoreError::OverQuota => f.write_str("quota exceeded"),
            StoreError::Unavailable(details) => write!(f, "store unavailable: {}", details),
            StoreError::Internal(details) => write!(f, "internal store error: {}", details),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<StoreError> for jmap_proto::error::method::MethodError {
    fn from(error: StoreError) -> Self {
        use jmap_proto::error::method::MethodError;
        match &error {
            StoreError::AccountNotFound => MethodError::account_not_found(),
            StoreError::PermissionDenied => MethodError::forbidden(),
            _ => MethodError::server_error(error.is_transient(), &error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxInfo {
    pub account_id: String,
    pub name: String,
    /// Stable unique id, independent of renames.
    pub id: String,
}

/// An open mailbox. The lock token identifies the underlying lock;
/// two handles with equal tokens denote the same lock.
#[derive(Debug, Clone)]
pub struct MailboxHandle {
    pub info: MailboxInfo,
    pub rw: bool,
    pub lock_token: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocation {
    pub mailbox: String,
    pub uid: u32,
    pub guid: [u8; 20],
    pub cid: u64,
}

#[derive(Debug, Clone)]
pub struct BlobRecord {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AccountInfo {
    pub account_id: String,
    pub is_personal: bool,
    pub is_read_only: bool,
}

/// Per-type change log segment.
#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    pub from_modseq: u64,
    pub to_modseq: u64,
    pub has_more: bool,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub destroyed: Vec<String>,
}

/// Narrow contract with the backing message store. The core only ever
/// calls these operations; persistence, locking and indexing live
/// behind them.
pub trait Store: Send + Sync {
    fn mailbox_lookup(&self, account_id: &str, name: &str) -> Result<MailboxInfo>;

    /// Takes the mailbox lock in the requested mode.
    fn mailbox_open(&self, account_id: &str, name: &str, rw: bool) -> Result<MailboxHandle>;

    /// Commits (read-write) or aborts the handle and releases its
    /// lock. Called exactly once per open handle.
    fn mailbox_close(&self, handle: &MailboxHandle, commit: bool) -> Result<()>;

    /// Rights of `user_id` on the mailbox, unmemoized.
    fn myrights(&self, user_id: &str, mailbox: &MailboxInfo) -> Bitmap<Acl>;

    fn highest_modseq(&self, account_id: &str, data_type: DataType) -> Result<u64>;

    fn changes_since(
        &self,
        account_id: &str,
        data_type: DataType,
        since_modseq: u64,
        max_changes: Option<usize>,
    ) -> Result<ChangeLog>;

    /// Account-wide state fed into the response's `sessionState`.
    fn session_state(&self, user_id: &str) -> Result<u64>;

    /// Accounts visible to the user, the personal one included.
    fn accounts(&self, user_id: &str) -> Vec<AccountInfo>;

    /// All message parts carrying the blob's content digest.
    fn blob_locate(&self, account_id: &str, blob_id: &BlobId) -> Result<Vec<BlobLocation>>;

    fn blob_content(&self, account_id: &str, blob_id: &BlobId) -> Result<BlobRecord>;

    /// Stages a blob into the account's upload collection on behalf
    /// of `user_id`.
    fn blob_reserve(
        &self,
        user_id: &str,
        account_id: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> Result<BlobId>;
}
