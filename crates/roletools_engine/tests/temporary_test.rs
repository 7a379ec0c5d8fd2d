//! Temporary role tracking and expiry.

mod test_utils;

use chrono::Utc;
use roletools_core::{RoleId, TemporaryRoleRecord, UserId};
use roletools_engine::testing::RoleCall;
use roletools_engine::{EXPIRY_REASON, GrantOptions, TemporaryRoleScheduler};
use roletools_interface::TemporaryRoleStore;
use test_utils::{Fixture, GUILD, ids};

#[tokio::test]
async fn test_granting_timed_role_records_expiry() {
    let fx = Fixture::new();
    fx.configure(4, |s| s.duration = Some(3600)).await;
    let member = fx.member(10, &[]);

    fx.engine
        .give_roles(&member, &ids(&[4]), "test", GrantOptions::default())
        .await
        .unwrap();

    let records = fx.store.temporary_records(GUILD).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].matches(UserId(10), RoleId(4)));
    let left = records[0].remove_at - Utc::now();
    assert!(left > chrono::Duration::seconds(3590));
}

#[tokio::test(start_paused = true)]
async fn test_due_role_is_removed() {
    let fx = Fixture::new();
    fx.configure(4, |s| s.duration = Some(10)).await;
    let member = fx.member(10, &[]);
    fx.engine
        .give_roles(&member, &ids(&[4]), "test", GrantOptions::default())
        .await
        .unwrap();
    fx.platform.clear_calls();

    let scheduler = TemporaryRoleScheduler::new(fx.engine.clone());
    let report = scheduler.sweep(Utc::now()).await.unwrap();

    assert_eq!(report.armed.len(), 1);
    assert!(fx.store.temporary_records(GUILD).await.unwrap().is_empty());
    report.join_armed().await;

    assert!(fx.roles(10).is_empty());
    assert_eq!(
        fx.platform.calls(),
        vec![RoleCall::Remove {
            user_id: UserId(10),
            roles: ids(&[4]),
            reason: EXPIRY_REASON.to_string(),
        }]
    );
}

#[tokio::test]
async fn test_distant_expiry_stays_stored() {
    let fx = Fixture::new();
    fx.configure(4, |s| s.duration = Some(86_400)).await;
    let member = fx.member(10, &[]);
    fx.engine
        .give_roles(&member, &ids(&[4]), "test", GrantOptions::default())
        .await
        .unwrap();

    let report = TemporaryRoleScheduler::new(fx.engine.clone())
        .sweep(Utc::now())
        .await
        .unwrap();

    assert!(report.armed.is_empty());
    assert!(report.abandoned.is_empty());
    assert_eq!(fx.store.temporary_records(GUILD).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_records_for_lost_roles_are_abandoned() {
    let fx = Fixture::new();
    fx.member(10, &[]);
    fx.member(11, &[4]);
    let now = Utc::now();
    for (user, role) in [(10, 4), (11, 404), (12, 4)] {
        fx.store
            .add_temporary(TemporaryRoleRecord::new(
                GUILD,
                UserId(user),
                RoleId(role),
                now,
                chrono::Duration::seconds(60),
            ))
            .await
            .unwrap();
    }

    let report = TemporaryRoleScheduler::new(fx.engine.clone())
        .sweep(now)
        .await
        .unwrap();

    assert_eq!(report.abandoned.len(), 3);
    assert!(report.armed.is_empty());
    assert!(fx.store.guilds_with_temporary().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_records_of_departed_guild_are_abandoned() {
    let fx = Fixture::new();
    fx.store
        .add_temporary(TemporaryRoleRecord::new(
            GUILD,
            UserId(10),
            RoleId(4),
            Utc::now(),
            chrono::Duration::seconds(60),
        ))
        .await
        .unwrap();
    fx.platform.remove_guild(GUILD);

    let report = TemporaryRoleScheduler::new(fx.engine.clone())
        .sweep(Utc::now())
        .await
        .unwrap();

    assert_eq!(report.abandoned.len(), 1);
    assert!(fx.store.temporary_records(GUILD).await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_armed_removal_skips_role_already_gone() {
    let fx = Fixture::new();
    fx.member(10, &[4]);
    let now = Utc::now();
    let record = TemporaryRoleRecord::new(
        GUILD,
        UserId(10),
        RoleId(4),
        now,
        chrono::Duration::seconds(30),
    );

    let scheduler = TemporaryRoleScheduler::new(fx.engine.clone());
    let armed = scheduler.arm(record, now);
    fx.member(10, &[]);
    armed.handle.await.unwrap();

    assert!(fx.platform.calls().is_empty());
}
