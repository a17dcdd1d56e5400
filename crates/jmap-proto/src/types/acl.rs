/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::fmt::{self, Display};
use utils::map::bitmap::{Bitmap, BitmapItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Acl {
    Lookup = 0,
    Read = 1,
    Seen = 2,
    Write = 3,
    Insert = 4,
    Post = 5,
    CreateChild = 6,
    DeleteMailbox = 7,
    DeleteMessage = 8,
    Expunge = 9,
    Admin = 10,
    None = 11,
}

impl Acl {
    fn as_str(&self) -> &'static str {
        match self {
            Acl::Lookup => "lookup",
            Acl::Read => "read",
            Acl::Seen => "seen",
            Acl::Write => "write",
            Acl::Insert => "insert",
            Acl::Post => "post",
            Acl::CreateChild => "createChild",
            Acl::DeleteMailbox => "deleteMailbox",
            Acl::DeleteMessage => "deleteMessage",
            Acl::Expunge => "expunge",
            Acl::Admin => "admin",
            Acl::None => "",
        }
    }

    /// Rights required to read messages out of a mailbox.
    pub fn read_items() -> Bitmap<Acl> {
        Bitmap::from_iter([Acl::Lookup, Acl::Read])
    }
}

impl Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl serde::Serialize for Acl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl BitmapItem for Acl {
    fn max() -> u64 {
        Acl::None as u64
    }

    fn is_valid(&self) -> bool {
        !matches!(self, Acl::None)
    }
}

impl From<Acl> for u64 {
    fn from(value: Acl) -> Self {
        value as u64
    }
}

impl From<u64> for Acl {
    fn from(value: u64) -> Self {
        match value {
            0 => Acl::Lookup,
            1 => Acl::Read,
            2 => Acl::Seen,
            3 => Acl::Write,
            4 => Acl::Insert,
            5 => Acl::Post,
            6 => Acl::CreateChild,
            7 => Acl::DeleteMailbox,
            8 => Acl::DeleteMessage,
            9 => Acl::Expunge,
            10 => Acl::Admin,
            _ => Acl::None,
        }
    }
}
