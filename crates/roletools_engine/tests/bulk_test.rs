//! Bulk and forced role changes.

mod test_utils;

use roletools_core::{RoleId, RoleOutcomeKind, UserId};
use roletools_engine::BulkTarget;
use roletools_error::CommandErrorKind;
use roletools_interface::StickyRoleStore;
use std::time::Duration;
use test_utils::{Fixture, GUILD, HIGH_ROLE, settled_member};

#[tokio::test]
async fn test_bulk_give_to_humans_skips_holders_and_bots() {
    let fx = Fixture::new();
    fx.member(10, &[]);
    fx.member(11, &[]);
    fx.member(12, &[3]);
    fx.platform.put_member(settled_member(13, &[]).with_bot(true));

    let report = fx
        .engine
        .bulk_give(GUILD, RoleId(3), &[BulkTarget::Humans], "bulk")
        .await
        .unwrap();

    assert_eq!(report.changed(), 2);
    assert_eq!(report.outcomes.len(), 2);
    assert!(report.failures.is_empty());
    assert_eq!(fx.roles(10), vec![3]);
    assert_eq!(fx.roles(11), vec![3]);
    assert!(fx.roles(13).is_empty());
    assert!(report.summary().starts_with("Changed <@&3> for 2 of 2 members."));
}

#[tokio::test]
async fn test_bulk_operations_start_a_cooldown() {
    let fx = Fixture::new();
    fx.member(10, &[]);
    fx.member(11, &[]);

    fx.engine
        .bulk_give(GUILD, RoleId(3), &[BulkTarget::Everyone], "bulk")
        .await
        .unwrap();
    let remaining = fx.engine.cooldowns().remaining(GUILD).await.unwrap();
    assert!(remaining <= Duration::from_secs(20));
    assert!(remaining > Duration::from_secs(15));

    let err = fx
        .engine
        .bulk_remove(GUILD, RoleId(3), &[BulkTarget::Everyone], "bulk")
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_command().map(|e| e.kind()),
        Some(CommandErrorKind::Cooldown(_))
    ));
    assert_eq!(fx.roles(10), vec![3]);
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_expires() {
    let fx = Fixture::new();
    fx.member(10, &[]);

    fx.engine
        .bulk_give(GUILD, RoleId(3), &[BulkTarget::Member(UserId(10))], "bulk")
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(11)).await;

    let report = fx
        .engine
        .bulk_remove(GUILD, RoleId(3), &[BulkTarget::RoleHolders(RoleId(3))], "bulk")
        .await
        .unwrap();
    assert_eq!(report.count(&RoleOutcomeKind::Revoked), 1);
    assert!(fx.roles(10).is_empty());
}

#[tokio::test]
async fn test_bulk_refuses_unmanageable_role() {
    let fx = Fixture::new();
    fx.member(10, &[]);

    let err = fx
        .engine
        .bulk_give(GUILD, HIGH_ROLE, &[BulkTarget::Everyone], "bulk")
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_command().map(|e| e.kind()),
        Some(CommandErrorKind::Rejected(_))
    ));
    assert!(fx.engine.cooldowns().remaining(GUILD).await.is_none());
}

#[tokio::test]
async fn test_force_add_bypasses_rules_and_saves_for_absent() {
    let fx = Fixture::new();
    fx.configure(3, |s| {
        s.sticky = true;
        s.required = vec![RoleId(1)];
    })
    .await;
    fx.member(10, &[]);

    let report = fx
        .engine
        .force_add(GUILD, RoleId(3), &[UserId(10), UserId(20)], "force")
        .await
        .unwrap();

    assert_eq!(report.count(&RoleOutcomeKind::Granted), 1);
    assert_eq!(report.count(&RoleOutcomeKind::SavedForRejoin), 1);
    assert!(report.absent.is_empty());
    assert_eq!(fx.roles(10), vec![3]);
    assert_eq!(
        fx.store.sticky_roles(GUILD, UserId(20)).await.unwrap(),
        vec![RoleId(3)]
    );
}

#[tokio::test]
async fn test_force_add_reports_absent_users_for_plain_roles() {
    let fx = Fixture::new();

    let report = fx
        .engine
        .force_add(GUILD, RoleId(3), &[UserId(20)], "force")
        .await
        .unwrap();

    assert_eq!(report.absent, vec![UserId(20)]);
    assert!(report.summary().contains("1 users are not in this server."));
}

#[tokio::test]
async fn test_force_remove_forgets_sticky_and_skips_cascade() {
    let fx = Fixture::new();
    fx.configure(3, |s| {
        s.sticky = true;
        s.inclusive_with = vec![RoleId(4)];
    })
    .await;
    fx.configure(4, |s| s.self_removable = true).await;
    fx.member(10, &[3, 4]);
    fx.store.add_sticky_role(GUILD, UserId(10), RoleId(3)).await.unwrap();
    fx.store.add_sticky_role(GUILD, UserId(20), RoleId(3)).await.unwrap();

    let report = fx
        .engine
        .force_remove(GUILD, RoleId(3), &[UserId(10), UserId(20)], "force")
        .await
        .unwrap();

    assert_eq!(report.count(&RoleOutcomeKind::Revoked), 1);
    assert_eq!(report.absent, vec![UserId(20)]);
    assert_eq!(fx.roles(10), vec![4]);
    assert!(fx.store.sticky_roles(GUILD, UserId(10)).await.unwrap().is_empty());
    assert!(fx.store.sticky_roles(GUILD, UserId(20)).await.unwrap().is_empty());
}
