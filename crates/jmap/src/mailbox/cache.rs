/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use store::{MailboxHandle, Store, StoreError};

/// Request-scoped arena of open mailboxes. Handles are indices into
/// the arena; the underlying store handles stay cached until request
/// teardown, where each is committed or aborted exactly once.
///
/// The store cannot promote a read-only lock to read-write, so a
/// request that will need write access must either ask for it on the
/// first open or set the force flag before any open.
#[derive(Default)]
pub struct MailboxCache {
    entries: Vec<CachedMailbox>,
}

struct CachedMailbox {
    handle: MailboxHandle,
    refs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxRef(usize);

impl MailboxCache {
    pub fn open(
        &mut self,
        store: &dyn Store,
        account_id: &str,
        name: &str,
        rw: bool,
        force_rw: bool,
    ) -> Result<MailboxRef, StoreError> {
        let rw = rw || force_rw;

        if let Some(index) = self.entries.iter().position(|entry| {
            entry.handle.info.account_id == account_id && entry.handle.info.name == name
        }) {
            let entry = &mut self.entries[index];
            if rw && !entry.handle.rw {
                return Err(StoreError::LockUpgrade);
            }
            entry.refs += 1;
            return Ok(MailboxRef(index));
        }

        let handle = store.mailbox_open(account_id, name, rw)?;
        self.entries.push(CachedMailbox { handle, refs: 1 });
        Ok(MailboxRef(self.entries.len() - 1))
    }

    pub fn get(&self, mailbox: MailboxRef) -> &MailboxHandle {
        &self.entries[mailbox.0].handle
    }

    /// Advisory: the handle stays cached until teardown.
    pub fn close(&mut self, mailbox: MailboxRef) {
        let entry = &mut self.entries[mailbox.0];
        entry.refs = entry.refs.saturating_sub(1);
    }

    pub fn is_open(&self, account_id: &str, name: &str) -> bool {
        self.entries.iter().any(|entry| {
            entry.handle.info.account_id == account_id && entry.handle.info.name == name
        })
    }

    /// Commits read-write handles, releases everything.
    pub fn finish(&mut self, store: &dyn Store) {
        for entry in self.entries.drain(..) {
            if entry.refs > 0 {
                tracing::debug!(
                    mailbox = %entry.handle.info.name,
                    refs = entry.refs,
                    "mailbox still referenced at teardown"
                );
            }
            if let Err(error) = store.mailbox_close(&entry.handle, entry.handle.rw) {
                tracing::error!(
                    mailbox = %entry.handle.info.name,
                    %error,
                    "failed to close mailbox"
                );
            }
        }
    }
}
