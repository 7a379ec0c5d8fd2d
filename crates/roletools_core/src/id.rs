//! Snowflake identifiers for guilds, roles, users and messages.
//!
//! Each id is a distinct newtype so a role id can never be passed where a
//! user id is expected. All ids serialize as plain integers.

use serde::{Deserialize, Serialize};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            Default,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
            derive_more::Display,
            derive_more::From,
        )]
        #[serde(transparent)]
        #[display("{}", _0)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw snowflake value.
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u64>().map(Self)
            }
        }
    };
}

snowflake!(
    /// Guild (server) identifier.
    GuildId
);
snowflake!(
    /// Role identifier.
    RoleId
);
snowflake!(
    /// User identifier. Members are addressed by guild + user.
    UserId
);
snowflake!(
    /// Channel identifier.
    ChannelId
);
snowflake!(
    /// Message identifier.
    MessageId
);

impl RoleId {
    /// Chat mention for this role.
    ///
    /// ```
    /// use roletools_core::RoleId;
    ///
    /// assert_eq!(RoleId(42).mention(), "<@&42>");
    /// ```
    pub fn mention(self) -> String {
        format!("<@&{}>", self.0)
    }
}

impl UserId {
    /// Chat mention for this user.
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

/// Render a list of roles as space separated mentions.
pub fn mention_roles(roles: &[RoleId]) -> String {
    roles
        .iter()
        .map(|r| r.mention())
        .collect::<Vec<_>>()
        .join(" ")
}
