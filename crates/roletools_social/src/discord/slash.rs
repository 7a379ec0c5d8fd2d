//! Slash command registration and option conversion.

use crate::{CommandParser, RoleCommand};
use roletools_core::RoleId;
use roletools_error::{CommandError, CommandErrorKind, RoletoolsResult};
use serenity::all::{
    CommandDataOption, CommandDataOptionValue, CommandOptionType, CreateCommand,
    CreateCommandOption, Permissions,
};

/// Slash commands registered globally at startup.
///
/// `/selfrole` and `/roleinfo` take typed options. `/roletools` takes the
/// same text the prefix command does, so every admin command is reachable
/// from the slash menu.
pub fn slash_commands() -> Vec<CreateCommand> {
    let role_option = |description: &str| {
        CreateCommandOption::new(CommandOptionType::Role, "role", description).required(true)
    };
    vec![
        CreateCommand::new("selfrole")
            .description("Add or remove one of the self-assignable roles")
            .dm_permission(false)
            .add_option(
                CreateCommandOption::new(CommandOptionType::SubCommand, "add", "Give yourself a role")
                    .add_sub_option(role_option("Role to add")),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "remove",
                    "Remove a role from yourself",
                )
                .add_sub_option(role_option("Role to remove")),
            ),
        CreateCommand::new("roleinfo")
            .description("Show how a role is configured")
            .dm_permission(false)
            .add_option(role_option("Role to describe")),
        CreateCommand::new("roletools")
            .description("Configure roles, e.g. `sticky @Role true`")
            .dm_permission(false)
            .default_member_permissions(Permissions::MANAGE_ROLES)
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "command", "Command text")
                    .required(true),
            ),
    ]
}

/// Convert a slash invocation into a [`RoleCommand`].
pub(crate) fn command_from_slash(
    parser: &CommandParser,
    name: &str,
    options: &[CommandDataOption],
) -> RoletoolsResult<RoleCommand> {
    match name {
        "selfrole" => {
            let Some(sub) = options.first() else {
                return Err(missing("selfrole", "action"));
            };
            let CommandDataOptionValue::SubCommand(sub_options) = &sub.value else {
                return Err(missing("selfrole", "action"));
            };
            let role_id = role_option("selfrole", sub_options)?;
            match sub.name.as_str() {
                "add" => Ok(RoleCommand::SelfAdd(role_id)),
                "remove" => Ok(RoleCommand::SelfRemove(role_id)),
                other => Err(CommandError::new(CommandErrorKind::UnknownCommand(format!(
                    "selfrole {other}"
                )))
                .into()),
            }
        }
        "roleinfo" => Ok(RoleCommand::Info(role_option("roleinfo", options)?)),
        "roletools" => {
            let text = options
                .iter()
                .find(|option| option.name == "command")
                .and_then(|option| option.value.as_str())
                .ok_or_else(|| missing("roletools", "command"))?;
            parser.parse_args(text)
        }
        other => Err(CommandError::new(CommandErrorKind::UnknownCommand(other.to_string())).into()),
    }
}

fn role_option(command: &str, options: &[CommandDataOption]) -> RoletoolsResult<RoleId> {
    options
        .iter()
        .find(|option| option.name == "role")
        .and_then(|option| option.value.as_role_id())
        .map(|role_id| RoleId(role_id.get()))
        .ok_or_else(|| missing(command, "role"))
}

fn missing(command: &str, arg_name: &str) -> roletools_error::RoletoolsError {
    CommandError::new(CommandErrorKind::MissingArgument {
        command: command.to_string(),
        arg_name: arg_name.to_string(),
    })
    .into()
}
