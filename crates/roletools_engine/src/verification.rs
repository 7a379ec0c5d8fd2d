//! Guild verification waiting periods.
//!
//! Discord refuses role changes for brand-new members until the guild's
//! verification level is satisfied. Level 2 and above requires the account
//! to be at least five minutes old; level 3 and above additionally requires
//! ten minutes of guild membership. Members who already hold a role have
//! passed verification.

use chrono::{DateTime, Utc};
use roletools_core::MemberSnapshot;
use std::time::Duration;
use tracing::debug;

const ACCOUNT_AGE_LEVEL: u8 = 2;
const JOIN_AGE_LEVEL: u8 = 3;
const MIN_ACCOUNT_AGE_SECS: i64 = 5 * 60;
const MIN_JOIN_AGE_SECS: i64 = 10 * 60;

/// Time the member must still wait before roles can be granted, or `None`.
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use roletools_core::{GuildId, MemberSnapshot, UserId};
/// use roletools_engine::check_guild_verification;
///
/// let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
/// let member = MemberSnapshot::new(GuildId(1), UserId(2), now - Duration::seconds(299));
///
/// let wait = check_guild_verification(&member, 2, now).unwrap();
/// assert_eq!(wait.as_secs(), 1);
///
/// let older = MemberSnapshot::new(GuildId(1), UserId(2), now - Duration::seconds(300));
/// assert!(check_guild_verification(&older, 2, now).is_none());
/// ```
pub fn check_guild_verification(
    member: &MemberSnapshot,
    verification_level: u8,
    now: DateTime<Utc>,
) -> Option<Duration> {
    if !member.roles.is_empty() {
        return None;
    }

    if verification_level >= ACCOUNT_AGE_LEVEL {
        let minimum = chrono::Duration::seconds(MIN_ACCOUNT_AGE_SECS);
        let account_age = member.account_age(now);
        if account_age < minimum {
            return remaining(minimum - account_age);
        }
    }

    if verification_level >= JOIN_AGE_LEVEL {
        let minimum = chrono::Duration::seconds(MIN_JOIN_AGE_SECS);
        let join_age = member.join_age(now);
        if join_age < minimum {
            return remaining(minimum - join_age);
        }
    }

    None
}

fn remaining(wait: chrono::Duration) -> Option<Duration> {
    wait.to_std().ok().filter(|wait| !wait.is_zero())
}

/// Sleep until the verification waiting period is over.
///
/// Returns the time waited.
pub async fn wait_for_verification(member: &MemberSnapshot, verification_level: u8) -> Duration {
    let Some(wait) = check_guild_verification(member, verification_level, Utc::now()) else {
        return Duration::ZERO;
    };
    debug!(
        user_id = %member.user_id,
        wait_secs = wait.as_secs(),
        "Waiting out guild verification"
    );
    tokio::time::sleep(wait).await;
    wait
}
