/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::api::{Server, auth::AccessToken};
use jmap_proto::{
    request::capability::{Account, Capability, Session},
    types::state::State,
};
use utils::map::vec_map::VecMap;

impl Server {
    /// Builds the Session resource for `GET /jmap/`. Served with
    /// no-cache headers by the HTTP layer.
    pub fn session_resource(&self, access_token: &AccessToken) -> Result<Session, store::StoreError> {
        let state = State::new(self.store.session_state(&access_token.user_id)?);
        let mut session = Session::new(
            &self.settings.base_url,
            &access_token.user_id,
            self.settings.capabilities_object(),
            state,
        );

        for account in self.store.accounts(&access_token.user_id) {
            session.accounts.append(
                account.account_id.clone(),
                Account {
                    name: account.account_id,
                    is_personal: account.is_personal,
                    is_read_only: account.is_read_only,
                    account_capabilities: VecMap::new(),
                },
            );
        }

        for capability in Capability::all_capabilities() {
            if *capability != Capability::Core
                && self.settings.can_use() & *capability as u32 != 0
            {
                session
                    .primary_accounts
                    .append(*capability, access_token.user_id.clone());
            }
        }

        Ok(session)
    }
}
