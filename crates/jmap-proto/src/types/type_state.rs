/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::fmt::{self, Display};

/// Data types that carry their own modification sequence in the
/// backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DataType {
    Email = 0,
    Mailbox = 1,
    Thread = 2,
    EmailSubmission = 3,
    Contact = 4,
    Calendar = 5,
}

impl DataType {
    pub const COUNT: usize = 6;

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Email => "Email",
            DataType::Mailbox => "Mailbox",
            DataType::Thread => "Thread",
            DataType::EmailSubmission => "EmailSubmission",
            DataType::Contact => "ContactCard",
            DataType::Calendar => "CalendarEvent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        hashify::tiny_map!(value.as_bytes(),
            "Email" => DataType::Email,
            "Mailbox" => DataType::Mailbox,
            "Thread" => DataType::Thread,
            "EmailSubmission" => DataType::EmailSubmission,
            "ContactCard" => DataType::Contact,
            "CalendarEvent" => DataType::Calendar,
        )
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for DataType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for DataType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        DataType::parse(<&str>::deserialize(deserializer)?)
            .ok_or_else(|| serde::de::Error::custom("unknown data type"))
    }
}
