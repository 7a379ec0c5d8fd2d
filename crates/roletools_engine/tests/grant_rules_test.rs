//! Relationship rules applied by give_roles and remove_roles.

mod test_utils;

use roletools_core::{RoleId, RoleOutcome, RoleOutcomeKind, UserId};
use roletools_engine::GrantOptions;
use roletools_engine::testing::RoleCall;
use test_utils::{Fixture, HIGH_ROLE, ids};

#[tokio::test]
async fn test_missing_required_role_leaves_member_unchanged() {
    let fx = Fixture::new();
    fx.configure(1, |s| s.required = vec![RoleId(2)]).await;
    let member = fx.member(10, &[3]);

    let outcomes = fx
        .engine
        .give_roles(&member, &ids(&[1]), "test", GrantOptions::default())
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![RoleOutcome::new(
            RoleId(1),
            RoleOutcomeKind::MissingRequired {
                missing: vec![RoleId(2)]
            }
        )]
    );
    assert_eq!(fx.roles(10), vec![3]);
    assert!(fx.platform.calls().is_empty());
}

#[tokio::test]
async fn test_required_role_held_allows_grant() {
    let fx = Fixture::new();
    fx.configure(1, |s| s.required = vec![RoleId(2)]).await;
    let member = fx.member(10, &[2]);

    let outcomes = fx
        .engine
        .give_roles(&member, &ids(&[1]), "test", GrantOptions::default())
        .await
        .unwrap();

    assert_eq!(outcomes, vec![RoleOutcome::new(RoleId(1), RoleOutcomeKind::Granted)]);
    assert_eq!(fx.roles(10), vec![1, 2]);
}

#[tokio::test]
async fn test_non_removable_exclusive_vetoes_grant() {
    let fx = Fixture::new();
    fx.configure(1, |s| s.exclusive_to = vec![RoleId(2)]).await;
    let member = fx.member(10, &[2]);

    let outcomes = fx
        .engine
        .give_roles(&member, &ids(&[1]), "test", GrantOptions::default())
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![RoleOutcome::new(
            RoleId(1),
            RoleOutcomeKind::ExclusiveVeto {
                blocking: vec![RoleId(2)]
            }
        )]
    );
    assert_eq!(fx.roles(10), vec![2]);
    assert!(fx.platform.calls().is_empty());
}

#[tokio::test]
async fn test_exclusive_veto_keeps_inclusive_roles_granted() {
    let fx = Fixture::new();
    fx.configure(1, |s| {
        s.inclusive_with = vec![RoleId(3)];
        s.exclusive_to = vec![RoleId(2)];
    })
    .await;
    fx.configure(3, |s| s.self_assignable = true).await;
    let member = fx.member(10, &[2]);

    let outcomes = fx
        .engine
        .give_roles(&member, &ids(&[1]), "test", GrantOptions::default())
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![
            RoleOutcome::new(RoleId(3), RoleOutcomeKind::Granted),
            RoleOutcome::new(
                RoleId(1),
                RoleOutcomeKind::ExclusiveVeto {
                    blocking: vec![RoleId(2)]
                }
            ),
        ]
    );
    assert_eq!(fx.roles(10), vec![2, 3]);
    let calls = fx.platform.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].is_add());
    assert_eq!(calls[0].roles(), ids(&[3]).as_slice());
}

#[tokio::test]
async fn test_removable_exclusive_is_swapped_out() {
    let fx = Fixture::new();
    fx.configure(1, |s| s.exclusive_to = vec![RoleId(2)]).await;
    fx.configure(2, |s| s.self_removable = true).await;
    let member = fx.member(10, &[2]);

    let outcomes = fx
        .engine
        .give_roles(&member, &ids(&[1]), "swap", GrantOptions::default())
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![
            RoleOutcome::new(RoleId(2), RoleOutcomeKind::Revoked),
            RoleOutcome::new(RoleId(1), RoleOutcomeKind::Granted),
        ]
    );
    assert_eq!(fx.roles(10), vec![1]);
    let calls = fx.platform.calls();
    assert_eq!(calls.len(), 2);
    assert!(!calls[0].is_add());
    assert!(calls[1].is_add());
}

#[tokio::test]
async fn test_mutually_exclusive_roles_swap_both_ways() {
    let fx = Fixture::new();
    for (role, other) in [(1, 2), (2, 1)] {
        fx.configure(role, move |s| {
            s.exclusive_to = vec![RoleId(other)];
            s.self_removable = true;
        })
        .await;
    }
    let member = fx.member(10, &[]);

    fx.engine
        .give_roles(&member, &ids(&[1]), "test", GrantOptions::default())
        .await
        .unwrap();
    assert_eq!(fx.roles(10), vec![1]);

    let member = fx.engine.member(test_utils::GUILD, UserId(10)).await.unwrap().unwrap();
    fx.engine
        .give_roles(&member, &ids(&[2]), "test", GrantOptions::default())
        .await
        .unwrap();
    assert_eq!(fx.roles(10), vec![2]);
}

#[tokio::test]
async fn test_granting_held_role_is_idempotent() {
    let fx = Fixture::new();
    let member = fx.member(10, &[]);

    fx.engine
        .give_roles(&member, &ids(&[1]), "test", GrantOptions::default())
        .await
        .unwrap();
    let member = fx.engine.member(test_utils::GUILD, UserId(10)).await.unwrap().unwrap();
    let outcomes = fx
        .engine
        .give_roles(&member, &ids(&[1]), "test", GrantOptions::default())
        .await
        .unwrap();

    assert_eq!(outcomes, vec![RoleOutcome::new(RoleId(1), RoleOutcomeKind::AlreadyHeld)]);
    assert_eq!(fx.platform.calls().iter().filter(|c| c.is_add()).count(), 1);
}

#[tokio::test]
async fn test_duplicate_roles_in_request_are_added_once() {
    let fx = Fixture::new();
    let member = fx.member(10, &[]);

    let outcomes = fx
        .engine
        .give_roles(&member, &ids(&[1, 1, 3]), "test", GrantOptions::default())
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![
            RoleOutcome::new(RoleId(1), RoleOutcomeKind::Duplicate),
            RoleOutcome::new(RoleId(1), RoleOutcomeKind::Granted),
            RoleOutcome::new(RoleId(3), RoleOutcomeKind::Granted),
        ]
    );
    assert_eq!(
        fx.platform.calls(),
        vec![RoleCall::Add {
            user_id: UserId(10),
            roles: ids(&[1, 3]),
            reason: "test".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_inclusive_roles_granted_before_parent() {
    let fx = Fixture::new();
    fx.configure(1, |s| s.inclusive_with = vec![RoleId(4), RoleId(5)]).await;
    fx.configure(4, |s| s.self_assignable = true).await;
    let member = fx.member(10, &[]);

    let outcomes = fx
        .engine
        .give_roles(&member, &ids(&[1]), "test", GrantOptions::default())
        .await
        .unwrap();

    // Role 5 is not self-assignable and is skipped.
    assert_eq!(
        outcomes,
        vec![
            RoleOutcome::new(RoleId(4), RoleOutcomeKind::Granted),
            RoleOutcome::new(RoleId(1), RoleOutcomeKind::Granted),
        ]
    );
    let calls = fx.platform.calls();
    assert_eq!(calls[0].roles(), ids(&[4]).as_slice());
    assert_eq!(calls[1].roles(), ids(&[1]).as_slice());
}

#[tokio::test]
async fn test_unchecked_grant_ignores_relations() {
    let fx = Fixture::new();
    fx.configure(1, |s| {
        s.required = vec![RoleId(2)];
        s.exclusive_to = vec![RoleId(3)];
    })
    .await;
    let member = fx.member(10, &[3]);

    let outcomes = fx
        .engine
        .give_roles(&member, &ids(&[1]), "force", GrantOptions::unchecked())
        .await
        .unwrap();

    assert_eq!(outcomes, vec![RoleOutcome::new(RoleId(1), RoleOutcomeKind::Granted)]);
    assert_eq!(fx.roles(10), vec![1, 3]);
}

#[tokio::test]
async fn test_unmanageable_roles_are_reported() {
    let fx = Fixture::new();
    let member = fx.member(10, &[]);

    let outcomes = fx
        .engine
        .give_roles(&member, &[HIGH_ROLE, RoleId(404)], "test", GrantOptions::default())
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![
            RoleOutcome::new(HIGH_ROLE, RoleOutcomeKind::AboveCeiling),
            RoleOutcome::new(RoleId(404), RoleOutcomeKind::RoleMissing),
        ]
    );
    assert!(fx.platform.calls().is_empty());
}

#[tokio::test]
async fn test_forbidden_mutation_becomes_outcome() {
    let fx = Fixture::new();
    fx.platform.forbid_role(RoleId(1));
    let member = fx.member(10, &[]);

    let outcomes = fx
        .engine
        .give_roles(&member, &ids(&[1]), "test", GrantOptions::default())
        .await
        .unwrap();

    assert_eq!(outcomes, vec![RoleOutcome::new(RoleId(1), RoleOutcomeKind::Forbidden)]);
    assert!(fx.roles(10).is_empty());
}

#[tokio::test]
async fn test_remove_cascades_removable_inclusive_roles() {
    let fx = Fixture::new();
    fx.configure(1, |s| s.inclusive_with = vec![RoleId(4), RoleId(5)]).await;
    fx.configure(4, |s| s.self_removable = true).await;
    let member = fx.member(10, &[1, 4, 5]);

    let outcomes = fx
        .engine
        .remove_roles(&member, &ids(&[1]), "test", true)
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![
            RoleOutcome::new(RoleId(4), RoleOutcomeKind::Revoked),
            RoleOutcome::new(RoleId(1), RoleOutcomeKind::Revoked),
        ]
    );
    assert_eq!(fx.roles(10), vec![5]);
}

#[tokio::test]
async fn test_remove_without_cascade_and_not_held() {
    let fx = Fixture::new();
    fx.configure(1, |s| s.inclusive_with = vec![RoleId(4)]).await;
    fx.configure(4, |s| s.self_removable = true).await;
    let member = fx.member(10, &[1, 4]);

    let outcomes = fx
        .engine
        .remove_roles(&member, &ids(&[1, 2]), "test", false)
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![
            RoleOutcome::new(RoleId(1), RoleOutcomeKind::Revoked),
            RoleOutcome::new(RoleId(2), RoleOutcomeKind::NotHeld),
        ]
    );
    assert_eq!(fx.roles(10), vec![4]);
    assert_eq!(fx.platform.calls().len(), 1);
}
