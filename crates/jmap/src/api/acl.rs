/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use ahash::AHashMap;
use jmap_proto::types::acl::Acl;
use store::{MailboxInfo, Store};
use utils::map::bitmap::Bitmap;

/// Request-scoped memoization of the authenticated user's rights per
/// mailbox. A missing mailbox is cached as the empty bitset, which
/// doubles as its tombstone.
#[derive(Default)]
pub struct RightsCache {
    rights: AHashMap<String, Bitmap<Acl>>,
}

impl RightsCache {
    pub fn myrights(
        &mut self,
        store: &dyn Store,
        user_id: &str,
        mailbox: &MailboxInfo,
    ) -> Bitmap<Acl> {
        let key = cache_key(&mailbox.account_id, &mailbox.name);
        if let Some(rights) = self.rights.get(&key) {
            *rights
        } else {
            let rights = store.myrights(user_id, mailbox);
            self.rights.insert(key, rights);
            rights
        }
    }

    pub fn has_rights(
        &mut self,
        store: &dyn Store,
        user_id: &str,
        mailbox: &MailboxInfo,
        mask: Bitmap<Acl>,
    ) -> bool {
        self.myrights(store, user_id, mailbox).contains_all(mask)
    }

    /// Drops the cached entry, needed when a handler alters ACLs
    /// mid-request.
    pub fn invalidate(&mut self, account_id: &str, name: &str) {
        self.rights.remove(&cache_key(account_id, name));
    }
}

fn cache_key(account_id: &str, name: &str) -> String {
    format!("{}!{}", account_id, name)
}
