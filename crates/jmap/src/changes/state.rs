/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::api::request::RequestContext;
use jmap_proto::{
    error::method::MethodError,
    types::{state::State, type_state::DataType},
};
use std::cmp::Ordering;

impl RequestContext<'_> {
    /// Highest modification sequence of the type in the current
    /// account, cached for the duration of the call.
    pub fn highest_modseq(&mut self, data_type: DataType) -> Result<u64, MethodError> {
        if let Some(modseq) = self.counters[data_type as usize] {
            return Ok(modseq);
        }
        let modseq = self
            .server
            .store
            .highest_modseq(&self.account_id, data_type)?;
        self.counters[data_type as usize] = Some(modseq);
        Ok(modseq)
    }

    pub fn get_state(&mut self, data_type: DataType, refresh: bool) -> Result<State, MethodError> {
        if refresh {
            self.counters[data_type as usize] = None;
        }
        self.highest_modseq(data_type).map(State::new)
    }

    /// The `ifInState` gate: tokens are compared as opaque strings
    /// before any mutation happens.
    pub fn assert_state(
        &mut self,
        data_type: DataType,
        if_in_state: &Option<String>,
    ) -> Result<State, MethodError> {
        let old_state = self.get_state(data_type, false)?;
        if let Some(if_in_state) = if_in_state {
            if if_in_state != &old_state.to_string() {
                return Err(MethodError::state_mismatch());
            }
        }
        Ok(old_state)
    }

    /// Server-side ordering of a client token against the current
    /// state: `Less` when the token is older.
    pub fn cmp_state(&mut self, token: &str, data_type: DataType) -> Result<Ordering, MethodError> {
        let state = State::parse(token).ok_or_else(|| MethodError::cannot_calculate_changes())?;
        let current = self.get_state(data_type, false)?;
        Ok(state.modseq().cmp(&current.modseq()))
    }
}
