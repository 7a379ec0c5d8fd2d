//! Commands run end to end against the in-memory platform.

mod test_utils;

use roletools_core::{ChannelId, ComponentKind, MessageId, RoleId, UserId};
use roletools_social::{CommandContext, RoleCommand};
use test_utils::{ADMIN, CHANNEL, Fixture, GUILD, MEMBER, Posted};

#[tokio::test]
async fn test_self_service_round_trip() {
    let fx = Fixture::new();
    fx.run(&fx.admin(), "!roletools selfadd 3 true").await;
    fx.run(&fx.admin(), "!roletools selfrem 3 true").await;

    let reply = fx.run(&fx.member(), "!roletools selfrole add <@&3>").await;
    assert_eq!(reply, "Added <@&3>.");
    assert_eq!(fx.roles(MEMBER), vec![3]);

    let reply = fx.run(&fx.member(), "!roletools selfrole remove <@&3>").await;
    assert_eq!(reply, "Removed <@&3>.");
    assert!(fx.roles(MEMBER).is_empty());
}

#[tokio::test]
async fn test_members_cannot_run_admin_commands() {
    let fx = Fixture::new();
    let reply = fx.run(&fx.member(), "!roletools sticky 3 true").await;
    assert_eq!(reply, "Permission denied for 'sticky'");

    let reply = fx.run(&fx.member(), "!roletools selfrole add 3").await;
    assert_eq!(reply, "<@&3> is not self-assignable.");
    assert!(fx.roles(MEMBER).is_empty());
}

#[tokio::test]
async fn test_info_describes_configuration() {
    let fx = Fixture::new();
    fx.run(&fx.admin(), "!roletools exclude add 3 4").await;
    fx.run(&fx.admin(), "!roletools cost 3 0").await;
    let reply = fx.run(&fx.member(), "!roletools info 3").await;
    assert!(reply.starts_with("Settings for <@&3>"));
    assert!(reply.contains("Exclusive: <@&4>"));

    let list = fx.run(&fx.admin(), "!roletools list").await;
    assert_eq!(list, "<@&3>: 1 exclusive");
}

#[tokio::test]
async fn test_rejected_settings_are_explained() {
    let fx = Fixture::new();
    fx.run(&fx.admin(), "!roletools include add 3 4").await;
    let reply = fx.run(&fx.admin(), "!roletools exclude add 3 4").await;
    assert_eq!(reply, "Role 4 is already in the inclusive list of role 3");

    let reply = fx.run(&fx.admin(), "!roletools sticky 77 true").await;
    assert_eq!(reply, "Unknown role: 77");
}

#[tokio::test]
async fn test_direct_messages_are_refused() {
    let fx = Fixture::new();
    let ctx = CommandContext::new(None, UserId(MEMBER), ChannelId(1));
    let reply = fx.dispatcher.dispatch(&ctx, RoleCommand::List).await;
    assert_eq!(reply.content, "This command only works inside a server");

    let help = fx.dispatcher.dispatch(&ctx, RoleCommand::Help).await;
    assert!(help.content.contains("selfrole add"));
}

#[tokio::test]
async fn test_giverole_reports_and_cools_down() {
    let fx = Fixture::new();
    let reply = fx.run(&fx.admin(), "!roletools giverole 5 everyone").await;
    assert_eq!(reply, "Changed <@&5> for 2 of 2 members.");
    assert_eq!(fx.roles(ADMIN), vec![5]);

    let reply = fx.run(&fx.admin(), "!roletools removerole 5 everyone").await;
    assert!(reply.starts_with("This command is on cooldown"));
    assert_eq!(fx.roles(MEMBER), vec![5]);
}

#[tokio::test]
async fn test_reaction_binding_reacts_to_message() {
    let fx = Fixture::new();
    let reply = fx
        .run(&fx.admin(), "!roletools reaction add <#10> 20 🎉 3")
        .await;
    assert_eq!(reply, "Reacting with 🎉 now gives <@&3>.");
    assert_eq!(
        fx.surface.posted(),
        vec![Posted::Reaction(ChannelId(10), MessageId(20), "🎉".to_string())]
    );

    let list = fx.run(&fx.admin(), "!roletools reaction list").await;
    assert_eq!(list, "🎉 → <@&3> on message 20 in <#10>");

    let reply = fx.run(&fx.admin(), "!roletools reaction remove 20 🎉").await;
    assert_eq!(reply, "Removed the 🎉 reaction role.");
    let list = fx.run(&fx.admin(), "!roletools reaction list").await;
    assert_eq!(list, "No reaction roles.");
}

#[tokio::test]
async fn test_components_are_posted_in_invoking_channel() {
    let fx = Fixture::new();
    fx.run(&fx.admin(), "!roletools button create colours 3 Red").await;
    fx.run(&fx.admin(), "!roletools select create pronouns 4 5 4").await;

    let posted = fx.surface.posted();
    assert_eq!(posted.len(), 2);
    let Posted::Components(channel, button) = &posted[0] else {
        panic!("expected a component post");
    };
    assert_eq!(*channel, CHANNEL);
    assert_eq!(button.kind, ComponentKind::Button);
    assert_eq!(button.label.as_deref(), Some("Red"));
    let Posted::Components(_, select) = &posted[1] else {
        panic!("expected a component post");
    };
    assert_eq!(select.role_ids, vec![RoleId(4), RoleId(5)]);

    let list = fx.run(&fx.admin(), "!roletools component list").await;
    assert!(list.contains("`colours` (button): <@&3>"));
    assert!(list.contains("`pronouns` (select): <@&4> <@&5>"));

    let reply = fx.run(&fx.admin(), "!roletools component delete colours").await;
    assert_eq!(reply, "Deleted `colours`.");
}

#[tokio::test]
async fn test_bad_component_name_is_rejected_before_posting() {
    let fx = Fixture::new();
    let reply = fx
        .run(&fx.admin(), "!roletools button create bad!name 3")
        .await;
    assert!(reply.starts_with("Invalid argument 'name'"));
    assert!(fx.surface.posted().is_empty());
}

#[tokio::test]
async fn test_forcerole_saves_sticky_role_for_absent_user() {
    let fx = Fixture::new();
    fx.run(&fx.admin(), "!roletools sticky 6 true").await;
    let reply = fx.run(&fx.admin(), "!roletools forcerole 6 2 404").await;
    assert_eq!(
        reply,
        "Changed <@&6> for 1 of 2 members.\n1 members will get <@&6> when they rejoin."
    );
    assert_eq!(fx.roles(MEMBER), vec![6]);
    assert!(fx.platform.roles_of(GUILD, UserId(404)).is_empty());
}

#[tokio::test]
async fn test_balances_are_shown_and_set() {
    let fx = Fixture::with_ledger();
    let reply = fx.run(&fx.member(), "!roletools balance").await;
    assert_eq!(reply, "<@2> has 0.");

    let reply = fx.run(&fx.admin(), "!roletools balance set <@2> 250").await;
    assert_eq!(reply, "<@2> now has 250.");
    let reply = fx.run(&fx.admin(), "!roletools balance <@2>").await;
    assert_eq!(reply, "<@2> has 250.");

    let reply = fx.run(&fx.member(), "!roletools balance <@1>").await;
    assert_eq!(reply, "Permission denied for 'balance'");
    let reply = fx.run(&fx.member(), "!roletools balance set <@2> 9000").await;
    assert_eq!(reply, "Permission denied for 'balance set'");

    // Paid self-service draws from the same balance.
    fx.run(&fx.admin(), "!roletools selfadd 3 true").await;
    fx.run(&fx.admin(), "!roletools cost 3 100").await;
    let reply = fx.run(&fx.member(), "!roletools selfrole add 3").await;
    assert_eq!(reply, "Added <@&3>.");
    let reply = fx.run(&fx.member(), "!roletools balance").await;
    assert_eq!(reply, "<@2> has 150.");
}

#[tokio::test]
async fn test_balance_commands_without_ledger_are_rejected() {
    let fx = Fixture::new();
    let reply = fx.run(&fx.member(), "!roletools balance").await;
    assert_eq!(reply, "No currency ledger is configured.");
}
