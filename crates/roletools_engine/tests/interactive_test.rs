//! Reaction roles, buttons and select menus.

mod test_utils;

use roletools_core::{
    ChannelId, ComponentId, MessageId, ReactionBinding, RoleId, RoleOutcome, RoleOutcomeKind,
    UserId,
};
use roletools_engine::ReactionEvent;
use roletools_engine::testing::FakeLedger;
use std::sync::Arc;
use roletools_error::SettingsErrorKind;
use test_utils::{Fixture, GUILD, ids};

const MESSAGE: MessageId = MessageId(555);

fn binding(emoji: &str, role: u64) -> ReactionBinding {
    ReactionBinding {
        channel_id: ChannelId(1),
        message_id: MESSAGE,
        emoji: emoji.to_string(),
        role_id: RoleId(role),
    }
}

fn reaction(user: u64, emoji: &str) -> ReactionEvent {
    ReactionEvent {
        guild_id: GUILD,
        channel_id: ChannelId(1),
        message_id: MESSAGE,
        user_id: UserId(user),
        emoji: emoji.to_string(),
    }
}

#[tokio::test]
async fn test_reaction_toggles_bound_role() {
    let fx = Fixture::new();
    fx.configure(3, |s| {
        s.self_assignable = true;
        s.self_removable = true;
        s.cost = 500;
    })
    .await;
    fx.engine.bind_reaction(GUILD, binding("🎨", 3)).await.unwrap();
    fx.member(10, &[]);

    let added = fx.engine.on_reaction_add(&reaction(10, "🎨")).await.unwrap();
    assert_eq!(added, vec![RoleOutcome::new(RoleId(3), RoleOutcomeKind::Granted)]);
    assert_eq!(fx.roles(10), vec![3]);

    let removed = fx.engine.on_reaction_remove(&reaction(10, "🎨")).await.unwrap();
    assert_eq!(removed, vec![RoleOutcome::new(RoleId(3), RoleOutcomeKind::Revoked)]);
    assert!(fx.roles(10).is_empty());
}

#[tokio::test]
async fn test_reaction_requires_self_assignable() {
    let fx = Fixture::new();
    fx.engine.bind_reaction(GUILD, binding("🎨", 3)).await.unwrap();
    fx.member(10, &[]);

    let outcomes = fx.engine.on_reaction_add(&reaction(10, "🎨")).await.unwrap();

    assert_eq!(outcomes, vec![RoleOutcome::new(RoleId(3), RoleOutcomeKind::NotSelfAssignable)]);
    assert!(fx.platform.calls().is_empty());
}

#[tokio::test]
async fn test_unbound_reactions_and_bots_are_ignored() {
    let fx = Fixture::new();
    fx.configure(3, |s| s.self_assignable = true).await;
    fx.engine.bind_reaction(GUILD, binding("🎨", 3)).await.unwrap();
    fx.platform
        .put_member(test_utils::settled_member(11, &[]).with_bot(true));
    fx.member(10, &[]);

    assert!(fx.engine.on_reaction_add(&reaction(10, "🎵")).await.unwrap().is_empty());
    assert!(fx.engine.on_reaction_add(&reaction(11, "🎨")).await.unwrap().is_empty());
    assert!(fx.engine.on_reaction_add(&reaction(12, "🎨")).await.unwrap().is_empty());
    assert!(fx.platform.calls().is_empty());
}

#[tokio::test]
async fn test_binding_unknown_role_is_rejected() {
    let fx = Fixture::new();

    let err = fx.engine.bind_reaction(GUILD, binding("🎨", 404)).await.unwrap_err();

    assert!(matches!(
        err.as_settings().map(|e| e.kind()),
        Some(SettingsErrorKind::UnknownRole(404))
    ));
    assert!(fx.engine.reaction_bindings(GUILD).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cleanup_drops_bindings_of_deleted_roles() {
    let fx = Fixture::new();
    fx.engine.bind_reaction(GUILD, binding("🎨", 3)).await.unwrap();
    fx.engine.bind_reaction(GUILD, binding("🎵", 4)).await.unwrap();
    fx.platform.put_guild(
        (1..=3u16).fold(
            roletools_core::GuildSnapshot::new(GUILD, 0, test_utils::BOT_TOP),
            |guild, id| guild.with_role(RoleId(u64::from(id)), id),
        ),
    );

    let removed = fx.engine.cleanup_reaction_bindings(GUILD).await.unwrap();

    assert_eq!(removed, vec![binding("🎵", 4)]);
    assert_eq!(fx.engine.reaction_bindings(GUILD).await.unwrap(), vec![binding("🎨", 3)]);
}

#[tokio::test]
async fn test_button_press_toggles_role() {
    let fx = Fixture::new();
    fx.configure(3, |s| {
        s.self_assignable = true;
        s.self_removable = true;
    })
    .await;
    let button = fx
        .engine
        .create_button(GUILD, "colours", RoleId(3), Some("Red".to_string()))
        .await
        .unwrap();
    let custom_id = button.custom_ids().remove(0);
    fx.member(10, &[]);

    let first = fx
        .engine
        .on_button_press(GUILD, UserId(10), &custom_id)
        .await
        .unwrap();
    let second = fx
        .engine
        .on_button_press(GUILD, UserId(10), &custom_id)
        .await
        .unwrap();

    assert_eq!(first, vec![RoleOutcome::new(RoleId(3), RoleOutcomeKind::Granted)]);
    assert_eq!(second, vec![RoleOutcome::new(RoleId(3), RoleOutcomeKind::Revoked)]);
}

#[tokio::test]
async fn test_components_grant_paid_roles_without_charging() {
    let ledger = Arc::new(FakeLedger::new(1000).with_balance(GUILD, UserId(10), 40));
    let fx = Fixture::new().with_ledger(ledger.clone());
    for role in [3, 4] {
        fx.configure(role, |s| {
            s.self_assignable = true;
            s.cost = 100;
        })
        .await;
    }
    let button = fx
        .engine
        .create_button(GUILD, "vip", RoleId(3), None)
        .await
        .unwrap();
    let select = fx
        .engine
        .create_select(GUILD, "perks", &ids(&[4]), None)
        .await
        .unwrap();
    fx.member(10, &[]);

    let pressed = fx
        .engine
        .on_button_press(GUILD, UserId(10), &button.custom_ids()[0])
        .await
        .unwrap();
    let submitted = fx
        .engine
        .on_select_submit(GUILD, UserId(10), &select.custom_ids()[0], &["4".to_string()])
        .await
        .unwrap();

    assert_eq!(pressed, vec![RoleOutcome::new(RoleId(3), RoleOutcomeKind::Granted)]);
    assert_eq!(submitted, vec![RoleOutcome::new(RoleId(4), RoleOutcomeKind::Granted)]);
    assert_eq!(fx.roles(10), vec![3, 4]);
    assert_eq!(ledger.balance_of(GUILD, UserId(10)), 40);
}

#[tokio::test]
async fn test_button_for_other_role_or_deleted_binding_does_nothing() {
    let fx = Fixture::new();
    fx.configure(3, |s| s.self_assignable = true).await;
    fx.engine
        .create_button(GUILD, "colours", RoleId(3), None)
        .await
        .unwrap();
    fx.member(10, &[]);

    let forged = ComponentId::Button {
        name: "colours".to_string(),
        role_id: RoleId(4),
    }
    .encode();
    assert!(fx.engine.on_button_press(GUILD, UserId(10), &forged).await.unwrap().is_empty());
    assert!(fx.engine.on_button_press(GUILD, UserId(10), "garbage").await.unwrap().is_empty());

    assert!(fx.engine.delete_component(GUILD, "colours").await.unwrap());
    assert!(
        fx.engine
            .on_button_press(GUILD, UserId(10), "colours-3")
            .await
            .unwrap()
            .is_empty()
    );
    assert!(fx.platform.calls().is_empty());
}

#[tokio::test]
async fn test_select_submission_syncs_offered_roles() {
    let fx = Fixture::new();
    for role in [3, 4, 5] {
        fx.configure(role, |s| {
            s.self_assignable = true;
            s.self_removable = true;
        })
        .await;
    }
    let select = fx
        .engine
        .create_select(GUILD, "games", &ids(&[3, 4, 5, 3]), None)
        .await
        .unwrap();
    assert_eq!(select.role_ids, ids(&[3, 4, 5]));
    let custom_id = select.custom_ids().remove(0);
    fx.member(10, &[3, 9]);

    let outcomes = fx
        .engine
        .on_select_submit(
            GUILD,
            UserId(10),
            &custom_id,
            &["4".to_string(), "5".to_string(), "9".to_string()],
        )
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![
            RoleOutcome::new(RoleId(4), RoleOutcomeKind::Granted),
            RoleOutcome::new(RoleId(5), RoleOutcomeKind::Granted),
            RoleOutcome::new(RoleId(3), RoleOutcomeKind::Revoked),
        ]
    );
    assert_eq!(fx.roles(10), vec![4, 5, 9]);
}

#[tokio::test]
async fn test_component_names_are_validated() {
    let fx = Fixture::new();

    assert!(fx.engine.create_button(GUILD, "two words", RoleId(3), None).await.is_err());
    assert!(fx.engine.create_select(GUILD, "empty", &[], None).await.is_err());
    assert!(fx.engine.component_bindings(GUILD).await.unwrap().is_empty());
}
