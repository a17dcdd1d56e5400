/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    AccountInfo, BlobLocation, BlobRecord, ChangeLog, MailboxHandle, MailboxInfo, Result, Store,
    StoreError,
};
use ahash::AHashMap;
use jmap_proto::types::{
    acl::Acl,
    blob::BlobId,
    id::{EmailId, ThreadId},
    type_state::DataType,
};
use serde_json::Value;
use sha1::{Digest, Sha1};
use std::sync::Mutex;
use utils::map::{bitmap::Bitmap, vec_map::VecMap};

/// Embedded backend implementing the store contract, used by the test
/// suites. One mutex guards everything; mailbox locks are modeled as
/// reader/writer counters so lock conflicts surface as
/// `MailboxLocked`.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    accounts: AHashMap<String, AccountData>,
}

#[derive(Default)]
struct AccountData {
    is_personal: bool,
    mailboxes: Vec<MailboxData>,
    modseq: [u64; DataType::COUNT],
    session_modseq: u64,
    objects: [VecMap<String, Value>; DataType::COUNT],
    changelog: [Vec<ChangeEntry>; DataType::COUNT],
    blobs: AHashMap<[u8; 20], BlobRecord>,
}

struct MailboxData {
    name: String,
    id: String,
    acl: AHashMap<String, Bitmap<Acl>>,
    messages: Vec<MessageData>,
    next_uid: u32,
    readers: u32,
    writer: bool,
    lock_token: u64,
}

struct MessageData {
    uid: u32,
    guid: [u8; 20],
    cid: u64,
}

struct ChangeEntry {
    modseq: u64,
    id: String,
    kind: ChangeKind,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ChangeKind {
    Created,
    Updated,
    Destroyed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_account(&self, account_id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.accounts.insert(
            account_id.to_string(),
            AccountData {
                is_personal: true,
                ..AccountData::default()
            },
        );
    }

    pub fn create_mailbox(&self, account_id: &str, name: &str) -> Result<String> {
        let mut inner = self.inner.lock().unwrap();
        let account = inner.account_mut(account_id)?;
        let id = format!("mb-{}-{}", account_id, account.mailboxes.len() + 1);
        let lock_token = account.mailboxes.len() as u64 + 1;
        account.mailboxes.push(MailboxData {
            name: name.to_string(),
            id: id.clone(),
            acl: AHashMap::new(),
            messages: Vec::new(),
            next_uid: 1,
            readers: 0,
            writer: false,
            lock_token,
        });
        account.bump(DataType::Mailbox);
        Ok(id)
    }

    pub fn share_mailbox(
        &self,
        account_id: &str,
        name: &str,
        user_id: &str,
        rights: Bitmap<Acl>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let mailbox = inner.account_mut(account_id)?.mailbox_mut(name)?;
        mailbox.acl.insert(user_id.to_string(), rights);
        Ok(())
    }

    /// Appends a message, indexing its content digest for blob
    /// lookups. Returns the blob, email and thread ids.
    pub fn put_message(
        &self,
        account_id: &str,
        mailbox: &str,
        body: &[u8],
    ) -> Result<(BlobId, EmailId, ThreadId)> {
        let guid: [u8; 20] = Sha1::digest(body).into();
        let cid = u64::from_be_bytes(guid[..8].try_into().unwrap());
        let blob_id = BlobId::new(guid);
        let email_id = EmailId::from_guid(&guid);
        let thread_id = ThreadId::from_cid(cid);

        let mut inner = self.inner.lock().unwrap();
        let account = inner.account_mut(account_id)?;
        account.blobs.insert(
            guid,
            BlobRecord {
                data: body.to_vec(),
                content_type: None,
            },
        );
        let mailbox = account.mailbox_mut(mailbox)?;
        let uid = mailbox.next_uid;
        mailbox.next_uid += 1;
        mailbox.messages.push(MessageData { uid, guid, cid });
        let modseq = account.bump(DataType::Email);
        account.bump(DataType::Thread);
        account.log(DataType::Email, email_id.to_string(), ChangeKind::Created, modseq);
        Ok((blob_id, email_id, thread_id))
    }

    pub fn object_insert(
        &self,
        account_id: &str,
        data_type: DataType,
        id: &str,
        value: Value,
    ) -> Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        let account = inner.account_mut(account_id)?;
        account.objects[data_type as usize].set(id.to_string(), value);
        let modseq = account.bump(data_type);
        account.log(data_type, id.to_string(), ChangeKind::Created, modseq);
        Ok(modseq)
    }

    pub fn object_update(
        &self,
        account_id: &str,
        data_type: DataType,
        id: &str,
        value: Value,
    ) -> Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        let account = inner.account_mut(account_id)?;
        let objects = &mut account.objects[data_type as usize];
        if !objects.contains_key(&id.to_string()) {
            return Err(StoreError::NotFound);
        }
        objects.set(id.to_string(), value);
        let modseq = account.bump(data_type);
        account.log(data_type, id.to_string(), ChangeKind::Updated, modseq);
        Ok(modseq)
    }

    pub fn object_destroy(&self, account_id: &str, data_type: DataType, id: &str) -> Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        let account = inner.account_mut(account_id)?;
        if account.objects[data_type as usize]
            .remove(&id.to_string())
            .is_none()
        {
            return Err(StoreError::NotFound);
        }
        let modseq = account.bump(data_type);
        account.log(data_type, id.to_string(), ChangeKind::Destroyed, modseq);
        Ok(modseq)
    }

    pub fn object_get(&self, account_id: &str, data_type: DataType, id: &str) -> Result<Option<Value>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .account(account_id)?
            .objects[data_type as usize]
            .get(&id.to_string())
            .cloned())
    }

    pub fn object_ids(&self, account_id: &str, data_type: DataType) -> Result<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.account(account_id)?.objects[data_type as usize]
            .keys()
            .cloned()
            .collect())
    }
}

impl Inner {
    fn account(&self, account_id: &str) -> Result<&AccountData> {
        self.accounts
            .get(account_id)
            .ok_or(StoreError::AccountNotFound)
    }

    fn account_mut(&mut self, account_id: &str) -> Result<&mut AccountData> {
        self.accounts
            .get_mut(account_id)
            .ok_or(StoreError::AccountNotFound)
    }
}

impl AccountData {
    fn mailbox(&self, name: &str) -> Result<&MailboxData> {
        self.mailboxes
            .iter()
            .find(|mailbox| mailbox.name == name)
            .ok_or(StoreError::NotFound)
    }

    fn mailbox_mut(&mut self, name: &str) -> Result<&mut MailboxData> {
        self.mailboxes
            .iter_mut()
            .find(|mailbox| mailbox.name == name)
            .ok_or(StoreError::NotFound)
    }

    fn bump(&mut self, data_type: DataType) -> u64 {
        self.session_modseq += 1;
        let modseq = &mut self.modseq[data_type as usize];
        *modseq += 1;
        *modseq
    }

    fn log(&mut self, data_type: DataType, id: String, kind: ChangeKind, modseq: u64) {
        self.changelog[data_type as usize].push(ChangeEntry { modseq, id, kind });
    }
}

impl Store for MemoryStore {
    fn mailbox_lookup(&self, account_id: &str, name: &str) -> Result<MailboxInfo> {
        let inner = self.inner.lock().unwrap();
        let mailbox = inner.account(account_id)?.mailbox(name)?;
        Ok(MailboxInfo {
            account_id: account_id.to_string(),
            name: mailbox.name.clone(),
            id: mailbox.id.clone(),
        })
    }

    fn mailbox_open(&self, account_id: &str, name: &str, rw: bool) -> Result<MailboxHandle> {
        let mut inner = self.inner.lock().unwrap();
        let mailbox = inner.account_mut(account_id)?.mailbox_mut(name)?;

        if mailbox.writer || (rw && mailbox.readers > 0) {
            return Err(StoreError::MailboxLocked);
        }
        if rw {
            mailbox.writer = true;
        } else {
            mailbox.readers += 1;
        }

        Ok(MailboxHandle {
            info: MailboxInfo {
                account_id: account_id.to_string(),
                name: mailbox.name.clone(),
                id: mailbox.id.clone(),
            },
            rw,
            lock_token: mailbox.lock_token,
        })
    }

    fn mailbox_close(&self, handle: &MailboxHandle, commit: bool) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let mailbox = inner
            .account_mut(&handle.info.account_id)?
            .mailbox_mut(&handle.info.name)?;
        if handle.rw {
            mailbox.writer = false;
            if !commit {
                tracing::debug!(mailbox = %handle.info.name, "aborting mailbox transaction");
            }
        } else {
            mailbox.readers = mailbox.readers.saturating_sub(1);
        }
        Ok(())
    }

    fn myrights(&self, user_id: &str, mailbox: &MailboxInfo) -> Bitmap<Acl> {
        if user_id == mailbox.account_id {
            return Bitmap::all();
        }
        let inner = self.inner.lock().unwrap();
        inner
            .account(&mailbox.account_id)
            .and_then(|account| account.mailbox(&mailbox.name))
            .map(|mailbox| mailbox.acl.get(user_id).copied().unwrap_or_default())
            .unwrap_or_default()
    }

    fn highest_modseq(&self, account_id: &str, data_type: DataType) -> Result<u64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.account(account_id)?.modseq[data_type as usize])
    }

    fn changes_since(
        &self,
        account_id: &str,
        data_type: DataType,
        since_modseq: u64,
        max_changes: Option<usize>,
    ) -> Result<ChangeLog> {
        let inner = self.inner.lock().unwrap();
        let account = inner.account(account_id)?;
        let current = account.modseq[data_type as usize];
        if since_modseq > current {
            return Err(StoreError::NotFound);
        }

        let mut log = ChangeLog {
            from_modseq: since_modseq,
            to_modseq: current,
            ..ChangeLog::default()
        };
        let entries = account.changelog[data_type as usize]
            .iter()
            .filter(|entry| entry.modseq > since_modseq);
        let mut windows: VecMap<&str, (bool, ChangeKind)> = VecMap::new();
        for (pos, entry) in entries.enumerate() {
            if max_changes.is_some_and(|max_changes| pos >= max_changes) {
                log.has_more = true;
                break;
            }
            log.to_modseq = entry.modseq;
            match windows.get_mut(&entry.id.as_str()) {
                Some(window) => window.1 = entry.kind,
                None => windows.append(
                    entry.id.as_str(),
                    (entry.kind == ChangeKind::Created, entry.kind),
                ),
            }
        }

        for (id, (created_in_window, last)) in windows {
            match (created_in_window, last) {
                (true, ChangeKind::Destroyed) => (),
                (true, _) => log.created.push(id.to_string()),
                (false, ChangeKind::Destroyed) => log.destroyed.push(id.to_string()),
                (false, _) => log.updated.push(id.to_string()),
            }
        }

        Ok(log)
    }

    fn session_state(&self, user_id: &str) -> Result<u64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .accounts
            .get(user_id)
            .map(|account| account.session_modseq)
            .unwrap_or_default())
    }

    fn accounts(&self, user_id: &str) -> Vec<AccountInfo> {
        let inner = self.inner.lock().unwrap();
        let mut accounts = Vec::new();
        for (account_id, account) in &inner.accounts {
            if account_id == user_id {
                accounts.insert(
                    0,
                    AccountInfo {
                        account_id: account_id.clone(),
                        is_personal: account.is_personal,
                        is_read_only: false,
                    },
                );
            } else if account
                .mailboxes
                .iter()
                .any(|mailbox| mailbox.acl.contains_key(user_id))
            {
                let is_read_only = !account.mailboxes.iter().any(|mailbox| {
                    mailbox
                        .acl
                        .get(user_id)
                        .is_some_and(|rights| rights.contains(Acl::Write))
                });
                accounts.push(AccountInfo {
                    account_id: account_id.clone(),
                    is_personal: false,
                    is_read_only,
                });
            }
        }
        accounts
    }

    fn blob_locate(&self, account_id: &str, blob_id: &BlobId) -> Result<Vec<BlobLocation>> {
        let inner = self.inner.lock().unwrap();
        let account = inner.account(account_id)?;
        let mut locations = Vec::new();
        for mailbox in &account.mailboxes {
            for message in &mailbox.messages {
                if &message.guid == blob_id.hash() {
                    locations.push(BlobLocation {
                        mailbox: mailbox.name.clone(),
                        uid: message.uid,
                        guid: message.guid,
                        cid: message.cid,
                    });
                }
            }
        }
        Ok(locations)
    }

    fn blob_content(&self, account_id: &str, blob_id: &BlobId) -> Result<BlobRecord> {
        let inner = self.inner.lock().unwrap();
        inner
            .account(account_id)?
            .blobs
            .get(blob_id.hash())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn blob_reserve(
        &self,
        user_id: &str,
        account_id: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> Result<BlobId> {
        let mut inner = self.inner.lock().unwrap();
        let account = inner.account(account_id)?;
        if user_id != account_id
            && !account.mailboxes.iter().any(|mailbox| {
                mailbox
                    .acl
                    .get(user_id)
                    .is_some_and(|rights| rights.contains(Acl::Insert))
            })
        {
            return Err(StoreError::PermissionDenied);
        }

        let blob_id = BlobId::from_content(data);
        inner.account_mut(account_id)?.blobs.insert(
            *blob_id.hash(),
            BlobRecord {
                data: data.to_vec(),
                content_type: content_type.map(|content_type| content_type.to_string()),
            },
        );
        Ok(blob_id)
    }
}
