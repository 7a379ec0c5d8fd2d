//! Members assigning and removing roles themselves, including paid roles.

mod test_utils;

use chrono::{Duration, Utc};
use roletools_core::{MemberSnapshot, RoleId, RoleOutcome, RoleOutcomeKind, UserId};
use roletools_engine::testing::FakeLedger;
use roletools_engine::{EngineConfig, GrantOptions};
use roletools_error::SettingsErrorKind;
use std::sync::Arc;
use test_utils::{Fixture, GUILD, guild, ids};

const VIP: u64 = 7;

async fn paid_fixture(balance: u64) -> (Fixture, Arc<FakeLedger>) {
    let ledger = Arc::new(FakeLedger::new(1_000).with_balance(GUILD, UserId(10), balance));
    let fx = Fixture::new().with_ledger(ledger.clone());
    fx.configure(VIP, |s| {
        s.self_assignable = true;
        s.cost = 100;
    })
    .await;
    (fx, ledger)
}

#[tokio::test]
async fn test_insufficient_balance_rejects_paid_role() {
    let (fx, ledger) = paid_fixture(50).await;
    let member = fx.member(10, &[]);

    let outcomes = fx.engine.self_assign(&member, &ids(&[VIP]), "shop").await.unwrap();

    assert_eq!(
        outcomes,
        vec![RoleOutcome::new(
            RoleId(VIP),
            RoleOutcomeKind::InsufficientFunds {
                cost: 100,
                balance: 50
            }
        )]
    );
    assert!(fx.roles(10).is_empty());
    assert_eq!(ledger.balance_of(GUILD, UserId(10)), 50);
}

#[tokio::test]
async fn test_paid_role_is_charged_on_grant() {
    let (fx, ledger) = paid_fixture(150).await;
    let member = fx.member(10, &[]);

    let outcomes = fx.engine.self_assign(&member, &ids(&[VIP]), "shop").await.unwrap();

    assert_eq!(outcomes, vec![RoleOutcome::new(RoleId(VIP), RoleOutcomeKind::Granted)]);
    assert_eq!(ledger.balance_of(GUILD, UserId(10)), 50);
}

#[tokio::test]
async fn test_charging_can_be_disabled() {
    let (fx, ledger) = paid_fixture(150).await;
    let fx = fx
        .with_config(EngineConfig::default().with_charge_on_grant(false))
        .with_ledger(ledger.clone());
    let member = fx.member(10, &[]);

    fx.engine.self_assign(&member, &ids(&[VIP]), "shop").await.unwrap();

    assert_eq!(fx.roles(10), vec![VIP]);
    assert_eq!(ledger.balance_of(GUILD, UserId(10)), 150);
}

#[tokio::test]
async fn test_costs_accumulate_within_one_request() {
    let (fx, ledger) = paid_fixture(150).await;
    fx.configure(8, |s| {
        s.self_assignable = true;
        s.cost = 100;
    })
    .await;
    let member = fx.member(10, &[]);

    let outcomes = fx
        .engine
        .self_assign(&member, &ids(&[VIP, 8]), "shop")
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![
            RoleOutcome::new(
                RoleId(8),
                RoleOutcomeKind::InsufficientFunds {
                    cost: 100,
                    balance: 50
                }
            ),
            RoleOutcome::new(RoleId(VIP), RoleOutcomeKind::Granted),
        ]
    );
    assert_eq!(ledger.balance_of(GUILD, UserId(10)), 50);
}

#[tokio::test]
async fn test_admin_grant_ignores_cost() {
    let (fx, ledger) = paid_fixture(0).await;
    let member = fx.member(10, &[]);

    let outcomes = fx
        .engine
        .give_roles(&member, &ids(&[VIP]), "admin", GrantOptions::default())
        .await
        .unwrap();

    assert_eq!(outcomes, vec![RoleOutcome::new(RoleId(VIP), RoleOutcomeKind::Granted)]);
    assert_eq!(ledger.balance_of(GUILD, UserId(10)), 0);
}

#[tokio::test]
async fn test_cost_above_ledger_maximum_is_rejected() {
    let (fx, _ledger) = paid_fixture(0).await;

    let err = fx.engine.set_cost(GUILD, RoleId(3), 5_000).await.unwrap_err();
    assert!(matches!(
        err.as_settings().map(|e| e.kind()),
        Some(SettingsErrorKind::CostAboveMaximum { cost: 5_000, max: 1_000 })
    ));

    let setting = fx.engine.set_cost(GUILD, RoleId(3), 500).await.unwrap();
    assert_eq!(setting.cost, 500);
}

#[tokio::test]
async fn test_without_ledger_paid_roles_cannot_be_configured() {
    let fx = Fixture::new();

    let err = fx.engine.set_cost(GUILD, RoleId(3), 1).await.unwrap_err();
    assert!(matches!(
        err.as_settings().map(|e| e.kind()),
        Some(SettingsErrorKind::CostAboveMaximum { max: 0, .. })
    ));
    assert!(fx.engine.set_cost(GUILD, RoleId(3), 0).await.is_ok());
}

#[tokio::test]
async fn test_self_assign_requires_flag() {
    let fx = Fixture::new();
    fx.configure(2, |s| s.self_assignable = true).await;
    let member = fx.member(10, &[]);

    let outcomes = fx
        .engine
        .self_assign(&member, &ids(&[1, 2]), "self")
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![
            RoleOutcome::new(RoleId(1), RoleOutcomeKind::NotSelfAssignable),
            RoleOutcome::new(RoleId(2), RoleOutcomeKind::Granted),
        ]
    );
}

#[tokio::test]
async fn test_self_remove_requires_flag() {
    let fx = Fixture::new();
    fx.configure(2, |s| s.self_removable = true).await;
    let member = fx.member(10, &[1, 2]);

    let outcomes = fx
        .engine
        .self_remove(&member, &ids(&[1, 2]), "self")
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![
            RoleOutcome::new(RoleId(1), RoleOutcomeKind::NotSelfRemovable),
            RoleOutcome::new(RoleId(2), RoleOutcomeKind::Revoked),
        ]
    );
    assert_eq!(fx.roles(10), vec![1]);
}

#[tokio::test]
async fn test_new_account_is_told_to_wait() {
    let fx = Fixture::with_guild(guild(2));
    fx.configure(2, |s| s.self_assignable = true).await;
    let member = MemberSnapshot::new(GUILD, UserId(10), Utc::now() - Duration::seconds(240))
        .with_joined_at(Utc::now());
    fx.platform.put_member(member.clone());

    let outcomes = fx.engine.self_assign(&member, &ids(&[2]), "self").await.unwrap();

    assert_eq!(outcomes.len(), 1);
    match &outcomes[0].kind {
        RoleOutcomeKind::VerificationPending { wait_secs } => {
            assert!((59..=60).contains(wait_secs), "waited {wait_secs}s");
        }
        other => panic!("expected pending verification, got {other:?}"),
    }
    assert!(fx.roles(10).is_empty());
}

#[tokio::test]
async fn test_settled_account_passes_verification() {
    let fx = Fixture::with_guild(guild(4));
    fx.configure(2, |s| s.self_assignable = true).await;
    let member = fx.member(10, &[]);

    let outcomes = fx.engine.self_assign(&member, &ids(&[2]), "self").await.unwrap();

    assert_eq!(outcomes, vec![RoleOutcome::new(RoleId(2), RoleOutcomeKind::Granted)]);
}
