//! Admin edits to role settings.

mod test_utils;

use roletools_core::{RelationKind, RoleId};
use roletools_engine::SettingFlag;
use roletools_error::SettingsErrorKind;
use test_utils::{Fixture, GUILD, ids};

#[tokio::test]
async fn test_relations_are_appended_without_duplicates() {
    let fx = Fixture::new();

    fx.engine
        .add_relation(GUILD, RoleId(1), RelationKind::Required, &ids(&[2, 3]))
        .await
        .unwrap();
    let setting = fx
        .engine
        .add_relation(GUILD, RoleId(1), RelationKind::Required, &ids(&[3, 4]))
        .await
        .unwrap();

    assert_eq!(setting.required, ids(&[2, 3, 4]));
    assert!(
        fx.engine
            .role_setting(GUILD, RoleId(2))
            .await
            .unwrap()
            .required
            .is_empty()
    );
}

#[tokio::test]
async fn test_inclusive_and_exclusive_cannot_overlap() {
    let fx = Fixture::new();
    fx.engine
        .add_relation(GUILD, RoleId(1), RelationKind::Inclusive, &ids(&[2]))
        .await
        .unwrap();

    let err = fx
        .engine
        .add_relation(GUILD, RoleId(1), RelationKind::Exclusive, &ids(&[3, 2]))
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_settings().map(|e| e.kind()),
        Some(SettingsErrorKind::Conflict {
            role: 1,
            other: 2,
            list: "inclusive"
        })
    ));
    let setting = fx.engine.role_setting(GUILD, RoleId(1)).await.unwrap();
    assert!(setting.exclusive_to.is_empty());
}

#[tokio::test]
async fn test_self_reference_and_unknown_roles_are_rejected() {
    let fx = Fixture::new();

    let err = fx
        .engine
        .add_relation(GUILD, RoleId(1), RelationKind::Exclusive, &ids(&[1]))
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_settings().map(|e| e.kind()),
        Some(SettingsErrorKind::SelfReference(1))
    ));

    let err = fx
        .engine
        .add_relation(GUILD, RoleId(1), RelationKind::Required, &ids(&[404]))
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_settings().map(|e| e.kind()),
        Some(SettingsErrorKind::UnknownRole(404))
    ));
}

#[tokio::test]
async fn test_concurrent_relation_edits_both_land() {
    let fx = Fixture::new();
    let first = fx.engine.clone();
    let second = fx.engine.clone();
    let required = ids(&[2]);
    let exclusive = ids(&[3]);

    let (a, b) = tokio::join!(
        first.add_relation(GUILD, RoleId(1), RelationKind::Required, &required),
        second.add_relation(GUILD, RoleId(1), RelationKind::Exclusive, &exclusive),
    );
    a.unwrap();
    b.unwrap();

    let setting = fx.engine.role_setting(GUILD, RoleId(1)).await.unwrap();
    assert_eq!(setting.required, ids(&[2]));
    assert_eq!(setting.exclusive_to, ids(&[3]));
}

#[tokio::test]
async fn test_remove_relation_allows_stale_roles() {
    let fx = Fixture::new();
    fx.configure(1, |s| s.exclusive_to = vec![RoleId(2), RoleId(404)]).await;

    let setting = fx
        .engine
        .remove_relation(GUILD, RoleId(1), RelationKind::Exclusive, &ids(&[404]))
        .await
        .unwrap();

    assert_eq!(setting.exclusive_to, ids(&[2]));
}

#[tokio::test]
async fn test_flags_duration_and_reset() {
    let fx = Fixture::new();

    fx.engine
        .set_flag(GUILD, RoleId(5), SettingFlag::Sticky, true)
        .await
        .unwrap();
    let setting = fx.engine.set_duration(GUILD, RoleId(5), Some(600)).await.unwrap();
    assert!(setting.sticky);
    assert_eq!(setting.duration, Some(600));

    let setting = fx.engine.set_duration(GUILD, RoleId(5), Some(0)).await.unwrap();
    assert_eq!(setting.duration, None);

    assert_eq!(fx.engine.configured_roles(GUILD).await.unwrap().len(), 1);
    assert!(fx.engine.reset_setting(GUILD, RoleId(5)).await.unwrap());
    assert!(fx.engine.configured_roles(GUILD).await.unwrap().is_empty());
    assert!(!fx.engine.reset_setting(GUILD, RoleId(5)).await.unwrap());
}

#[tokio::test]
async fn test_auto_role_list_follows_flag() {
    let fx = Fixture::new();
    fx.engine
        .set_flag(GUILD, RoleId(6), SettingFlag::Auto, true)
        .await
        .unwrap();
    fx.engine
        .set_flag(GUILD, RoleId(2), SettingFlag::Auto, true)
        .await
        .unwrap();
    assert_eq!(fx.engine.auto_roles(GUILD).await.unwrap(), ids(&[2, 6]));

    fx.engine
        .set_flag(GUILD, RoleId(6), SettingFlag::Auto, false)
        .await
        .unwrap();
    assert_eq!(fx.engine.auto_roles(GUILD).await.unwrap(), ids(&[2]));
}
