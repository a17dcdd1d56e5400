/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

/// Authenticated identity handed in by the HTTP layer. How it was
/// established is not the core's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub user_id: String,
}

impl AccessToken {
    pub fn new(user_id: impl Into<String>) -> Self {
        AccessToken {
            user_id: user_id.into(),
        }
    }
}
