//! Text prefix command parsing.
//!
//! ```text
//! !roletools selfrole add <role>
//! !roletools exclude add <role> <role>...
//! !roletools giverole <role> everyone|humans|bots|<role>|<user>...
//! !roletools temporary set <role> 1d12h
//! !roletools balance set <user> 500
//! ```
//!
//! Roles are given as mentions (`<@&id>`) or raw ids. Users are given as
//! mentions (`<@id>`, `<@!id>`) or raw ids.

use crate::RoleCommand;
use regex::Regex;
use roletools_core::{ChannelId, MessageId, RelationKind, RoleId, UserId};
use roletools_engine::{BulkTarget, SettingFlag};
use roletools_error::{CommandError, CommandErrorKind, ConfigError, RoletoolsResult};
use tracing::{debug, instrument};

/// Parses `<prefix> <command> <args>` messages into [`RoleCommand`]s.
#[derive(Debug, Clone)]
pub struct CommandParser {
    prefix: String,
    role_mention: Regex,
    user_mention: Regex,
    channel_mention: Regex,
    duration: Regex,
}

impl CommandParser {
    /// Parser for messages starting with `prefix`, e.g. `!roletools`.
    pub fn new(prefix: impl Into<String>) -> RoletoolsResult<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| ConfigError::new(format!("Invalid pattern '{pattern}': {e}")))
        };
        Ok(Self {
            prefix: prefix.into(),
            role_mention: compile(r"^<@&(\d+)>$")?,
            user_mention: compile(r"^<@!?(\d+)>$")?,
            channel_mention: compile(r"^<#(\d+)>$")?,
            duration: compile(r"^(?:(\d+)w)?(?:(\d+)d)?(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$")?,
        })
    }

    /// Command prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Parse a chat message.
    ///
    /// Returns `None` when the message is not addressed to the bot.
    #[instrument(skip(self, content), fields(len = content.len()))]
    pub fn parse(&self, content: &str) -> Option<RoletoolsResult<RoleCommand>> {
        let rest = content.trim().strip_prefix(self.prefix.as_str())?;
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        let parsed = self.parse_tokens(&tokens);
        debug!(ok = parsed.is_ok(), "Parsed prefix command");
        Some(parsed)
    }

    /// Parse command text without the prefix, as typed into the slash
    /// command's free-form option.
    pub fn parse_args(&self, args: &str) -> RoletoolsResult<RoleCommand> {
        let tokens: Vec<&str> = args.split_whitespace().collect();
        self.parse_tokens(&tokens)
    }

    fn parse_tokens(&self, tokens: &[&str]) -> RoletoolsResult<RoleCommand> {
        let Some((&head, args)) = tokens.split_first() else {
            return Ok(RoleCommand::Help);
        };
        let head = head.to_ascii_lowercase();
        match head.as_str() {
            "help" => Ok(RoleCommand::Help),
            "selfrole" => {
                let (action, args) = subcommand("selfrole", args)?;
                let role_id = self.role_arg("selfrole", args, 0)?;
                match action.as_str() {
                    "add" => Ok(RoleCommand::SelfAdd(role_id)),
                    "remove" => Ok(RoleCommand::SelfRemove(role_id)),
                    other => Err(unknown("selfrole", other)),
                }
            }
            "required" | "include" | "exclude" => {
                let kind = match head.as_str() {
                    "required" => RelationKind::Required,
                    "include" => RelationKind::Inclusive,
                    _ => RelationKind::Exclusive,
                };
                let command = static_name(&head);
                let (action, args) = subcommand(command, args)?;
                let role_id = self.role_arg(command, args, 0)?;
                let others = self.role_list(command, &args[1..])?;
                match action.as_str() {
                    "add" => Ok(RoleCommand::AddRelation { role_id, kind, others }),
                    "remove" => Ok(RoleCommand::RemoveRelation { role_id, kind, others }),
                    other => Err(unknown(command, other)),
                }
            }
            "sticky" | "autorole" | "selfadd" | "selfrem" => {
                let flag = match head.as_str() {
                    "sticky" => SettingFlag::Sticky,
                    "autorole" => SettingFlag::Auto,
                    "selfadd" => SettingFlag::SelfAssignable,
                    _ => SettingFlag::SelfRemovable,
                };
                let command = static_name(&head);
                let role_id = self.role_arg(command, args, 0)?;
                let value = parse_bool(command, arg(command, args, 1, "value")?)?;
                Ok(RoleCommand::SetFlag { role_id, flag, value })
            }
            "cost" => {
                let role_id = self.role_arg("cost", args, 0)?;
                let raw = arg("cost", args, 1, "cost")?;
                let cost = raw
                    .parse::<u64>()
                    .map_err(|_| invalid("cost", "cost", "expected a whole number"))?;
                Ok(RoleCommand::SetCost { role_id, cost })
            }
            "temporary" => {
                let (action, args) = subcommand("temporary", args)?;
                let role_id = self.role_arg("temporary", args, 0)?;
                match action.as_str() {
                    "set" => {
                        let raw = arg("temporary", args, 1, "duration")?;
                        let seconds = self.parse_duration(raw).ok_or_else(|| {
                            invalid("temporary", "duration", "use a form like 90s, 30m, 2h or 1d12h")
                        })?;
                        Ok(RoleCommand::SetDuration {
                            role_id,
                            seconds: Some(seconds),
                        })
                    }
                    "clear" => Ok(RoleCommand::SetDuration {
                        role_id,
                        seconds: None,
                    }),
                    other => Err(unknown("temporary", other)),
                }
            }
            "reset" => Ok(RoleCommand::Reset(self.role_arg("reset", args, 0)?)),
            "info" => Ok(RoleCommand::Info(self.role_arg("info", args, 0)?)),
            "list" => Ok(RoleCommand::List),
            "giverole" | "removerole" => {
                let command = static_name(&head);
                let role_id = self.role_arg(command, args, 0)?;
                let targets = self.targets(command, &args[1..])?;
                if head == "giverole" {
                    Ok(RoleCommand::GiveRole { role_id, targets })
                } else {
                    Ok(RoleCommand::RemoveRole { role_id, targets })
                }
            }
            "forcerole" | "forceroleremove" => {
                let command = static_name(&head);
                let role_id = self.role_arg(command, args, 0)?;
                let users = self.user_list(command, &args[1..])?;
                if head == "forcerole" {
                    Ok(RoleCommand::ForceRole { role_id, users })
                } else {
                    Ok(RoleCommand::ForceRoleRemove { role_id, users })
                }
            }
            "reaction" => {
                let (action, args) = subcommand("reaction", args)?;
                match action.as_str() {
                    "add" => {
                        let channel_id = self.channel_arg("reaction", args, 0)?;
                        let message_id = id_arg::<MessageId>("reaction", args, 1, "message")?;
                        let emoji = arg("reaction", args, 2, "emoji")?.to_string();
                        let role_id = self.role_arg("reaction", args, 3)?;
                        Ok(RoleCommand::ReactionAdd {
                            channel_id,
                            message_id,
                            emoji,
                            role_id,
                        })
                    }
                    "remove" => {
                        let message_id = id_arg::<MessageId>("reaction", args, 0, "message")?;
                        let emoji = arg("reaction", args, 1, "emoji")?.to_string();
                        Ok(RoleCommand::ReactionRemove { message_id, emoji })
                    }
                    "list" => Ok(RoleCommand::ReactionList),
                    "cleanup" => Ok(RoleCommand::ReactionCleanup),
                    other => Err(unknown("reaction", other)),
                }
            }
            "button" => {
                let (action, args) = subcommand("button", args)?;
                if action != "create" {
                    return Err(unknown("button", &action));
                }
                let name = arg("button", args, 0, "name")?.to_string();
                let role_id = self.role_arg("button", args, 1)?;
                let label = join_rest(&args[2..]);
                Ok(RoleCommand::ButtonCreate {
                    name,
                    role_id,
                    label,
                })
            }
            "select" => {
                let (action, args) = subcommand("select", args)?;
                if action != "create" {
                    return Err(unknown("select", &action));
                }
                let name = arg("select", args, 0, "name")?.to_string();
                let role_ids = self.role_list("select", &args[1..])?;
                Ok(RoleCommand::SelectCreate {
                    name,
                    role_ids,
                    label: None,
                })
            }
            "component" => {
                let (action, args) = subcommand("component", args)?;
                match action.as_str() {
                    "delete" => Ok(RoleCommand::ComponentDelete(
                        arg("component", args, 0, "name")?.to_string(),
                    )),
                    "list" => Ok(RoleCommand::ComponentList),
                    other => Err(unknown("component", other)),
                }
            }
            "balance" => match args.first().map(|raw| raw.to_ascii_lowercase()) {
                None => Ok(RoleCommand::Balance(None)),
                Some(action) if action == "set" => {
                    let user_id = self.user_arg("balance", args, 1)?;
                    let amount = arg("balance", args, 2, "amount")?
                        .parse::<u64>()
                        .map_err(|_| invalid("balance", "amount", "expected a whole number"))?;
                    Ok(RoleCommand::SetBalance { user_id, amount })
                }
                Some(_) => Ok(RoleCommand::Balance(Some(self.user_arg("balance", args, 0)?))),
            },
            other => Err(CommandError::new(CommandErrorKind::UnknownCommand(other.to_string())).into()),
        }
    }

    /// Parse a duration such as `90`, `45s`, `30m`, `2h`, `1d12h` or `1w`
    /// into seconds. Zero is rejected.
    pub fn parse_duration(&self, raw: &str) -> Option<u64> {
        if let Ok(seconds) = raw.parse::<u64>() {
            return Some(seconds).filter(|s| *s > 0);
        }
        let captures = self.duration.captures(raw)?;
        const UNITS: [u64; 5] = [604_800, 86_400, 3_600, 60, 1];
        let mut total = 0u64;
        let mut matched = false;
        for (index, unit) in UNITS.iter().enumerate() {
            if let Some(value) = captures.get(index + 1) {
                matched = true;
                let value = value.as_str().parse::<u64>().ok()?;
                total = total.checked_add(value.checked_mul(*unit)?)?;
            }
        }
        Some(total).filter(|total| matched && *total > 0)
    }

    /// Parse a role mention or raw id.
    pub fn parse_role(&self, raw: &str) -> Option<RoleId> {
        capture_id(&self.role_mention, raw)
            .or_else(|| raw.parse().ok())
            .map(RoleId)
    }

    /// Parse a user mention or raw id.
    pub fn parse_user(&self, raw: &str) -> Option<UserId> {
        capture_id(&self.user_mention, raw)
            .or_else(|| raw.parse().ok())
            .map(UserId)
    }

    fn role_arg(&self, command: &'static str, args: &[&str], index: usize) -> RoletoolsResult<RoleId> {
        let raw = arg(command, args, index, "role")?;
        self.parse_role(raw)
            .ok_or_else(|| invalid(command, "role", "expected a role mention or id"))
    }

    fn user_arg(&self, command: &'static str, args: &[&str], index: usize) -> RoletoolsResult<UserId> {
        let raw = arg(command, args, index, "user")?;
        self.parse_user(raw)
            .ok_or_else(|| invalid(command, "user", "expected a user mention or id"))
    }

    fn channel_arg(
        &self,
        command: &'static str,
        args: &[&str],
        index: usize,
    ) -> RoletoolsResult<ChannelId> {
        let raw = arg(command, args, index, "channel")?;
        capture_id(&self.channel_mention, raw)
            .or_else(|| raw.parse().ok())
            .map(ChannelId)
            .ok_or_else(|| invalid(command, "channel", "expected a channel mention or id"))
    }

    fn role_list(&self, command: &'static str, args: &[&str]) -> RoletoolsResult<Vec<RoleId>> {
        if args.is_empty() {
            return Err(missing(command, "roles"));
        }
        args.iter()
            .map(|raw| {
                self.parse_role(raw)
                    .ok_or_else(|| invalid(command, "roles", &format!("'{raw}' is not a role")))
            })
            .collect()
    }

    fn user_list(&self, command: &'static str, args: &[&str]) -> RoletoolsResult<Vec<UserId>> {
        if args.is_empty() {
            return Err(missing(command, "users"));
        }
        args.iter()
            .map(|raw| {
                self.parse_user(raw)
                    .ok_or_else(|| invalid(command, "users", &format!("'{raw}' is not a user")))
            })
            .collect()
    }

    fn targets(&self, command: &'static str, args: &[&str]) -> RoletoolsResult<Vec<BulkTarget>> {
        if args.is_empty() {
            return Err(missing(command, "targets"));
        }
        args.iter()
            .map(|raw| match raw.to_ascii_lowercase().as_str() {
                "everyone" | "all" => Ok(BulkTarget::Everyone),
                "humans" => Ok(BulkTarget::Humans),
                "bots" => Ok(BulkTarget::Bots),
                _ => {
                    if let Some(id) = capture_id(&self.role_mention, raw) {
                        return Ok(BulkTarget::RoleHolders(RoleId(id)));
                    }
                    self.parse_user(raw).map(BulkTarget::Member).ok_or_else(|| {
                        invalid(command, "targets", &format!("'{raw}' is not a member, role or group"))
                    })
                }
            })
            .collect()
    }
}

fn capture_id(pattern: &Regex, raw: &str) -> Option<u64> {
    pattern
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .and_then(|id| id.as_str().parse().ok())
}

fn static_name(head: &str) -> &'static str {
    match head {
        "required" => "required",
        "include" => "include",
        "exclude" => "exclude",
        "sticky" => "sticky",
        "autorole" => "autorole",
        "selfadd" => "selfadd",
        "selfrem" => "selfrem",
        "giverole" => "giverole",
        "removerole" => "removerole",
        "forcerole" => "forcerole",
        "forceroleremove" => "forceroleremove",
        _ => "roletools",
    }
}

fn subcommand<'a, 'b>(
    command: &'static str,
    args: &'a [&'b str],
) -> RoletoolsResult<(String, &'a [&'b str])> {
    let (action, rest) = args
        .split_first()
        .ok_or_else(|| missing(command, "subcommand"))?;
    Ok((action.to_ascii_lowercase(), rest))
}

fn arg<'a>(
    command: &'static str,
    args: &[&'a str],
    index: usize,
    name: &'static str,
) -> RoletoolsResult<&'a str> {
    args.get(index).copied().ok_or_else(|| missing(command, name))
}

fn id_arg<T: From<u64>>(
    command: &'static str,
    args: &[&str],
    index: usize,
    name: &'static str,
) -> RoletoolsResult<T> {
    arg(command, args, index, name)?
        .parse::<u64>()
        .map(T::from)
        .map_err(|_| invalid(command, name, "expected an id"))
}

fn join_rest(args: &[&str]) -> Option<String> {
    Some(args.join(" ")).filter(|label| !label.is_empty())
}

fn parse_bool(command: &'static str, raw: &str) -> RoletoolsResult<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(command, "value", "expected true or false")),
    }
}

fn missing(command: &str, arg_name: &str) -> roletools_error::RoletoolsError {
    CommandError::new(CommandErrorKind::MissingArgument {
        command: command.to_string(),
        arg_name: arg_name.to_string(),
    })
    .into()
}

fn invalid(command: &str, arg_name: &str, reason: &str) -> roletools_error::RoletoolsError {
    CommandError::new(CommandErrorKind::InvalidArgument {
        command: command.to_string(),
        arg_name: arg_name.to_string(),
        reason: reason.to_string(),
    })
    .into()
}

fn unknown(command: &str, action: &str) -> roletools_error::RoletoolsError {
    CommandError::new(CommandErrorKind::UnknownCommand(format!("{command} {action}"))).into()
}
