// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Validates a token vector against the command table of spec.md §4.3 and
//! produces a typed [`Command`] with normalized fields.

use crate::error::EngineError;

/// Credentials carried by `AUTH`/`HELLO ... AUTH`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthOptions {
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Version,
    Ping,
    Info,
    DbSize,
    FlushAll,
    Keys,
    Cleanup,
    Expire,
    Auth,
    Hello,
    Set,
    Get,
    Del,
    QAdd,
    QPop,
    QLen,
    LPush,
    LPop,
    RPush,
    RPop,
    LLen,
    SAdd,
    SRem,
    SMembers,
    SIsMember,
    SCard,
    SInter,
}

impl CommandKind {
    /// Commands the dispatcher must append to the WAL before applying (§4.9).
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            CommandKind::Set
                | CommandKind::Del
                | CommandKind::FlushAll
                | CommandKind::Expire
                | CommandKind::QAdd
                | CommandKind::QPop
                | CommandKind::LPush
                | CommandKind::LPop
                | CommandKind::RPush
                | CommandKind::RPop
                | CommandKind::SAdd
                | CommandKind::SRem
        )
    }
}

/// A parsed, arity-checked command with normalized fields. Unused fields for
/// a given `kind` are left at their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    pub kind: Option<CommandKind>,
    pub key: String,
    pub keys: Vec<String>,
    pub value: String,
    pub values: Vec<String>,
    pub pattern: String,
    pub expire_seconds: i64,
    pub priority: i64,
    pub limit: i64,
    pub auth: AuthOptions,
    pub resp_version: String,
}

impl Command {
    fn with_kind(kind: CommandKind) -> Self {
        Command { kind: Some(kind), ..Default::default() }
    }
}

fn arg_count_err(name: &str) -> EngineError {
    EngineError::ArgumentCount(name.to_string())
}

fn parse_int(name: &str, text: &str) -> Result<i64, EngineError> {
    text.parse::<i64>().map_err(|_| {
        let _ = name;
        EngineError::NotInteger
    })
}

/// Parse a token vector (already split by [`crate::tokenizer::split_tokens`]
/// or taken directly from a RESP array) into a [`Command`].
pub fn parse_command(tokens: &[String]) -> Result<Command, EngineError> {
    let argc = tokens.len();
    if argc == 0 {
        return Err(EngineError::UnknownCommand(String::new()));
    }

    let lower = tokens[0].to_lowercase();
    match lower.as_str() {
        "version" => {
            if argc != 1 {
                return Err(arg_count_err(&lower));
            }
            Ok(Command::with_kind(CommandKind::Version))
        },
        "ping" => {
            if argc != 1 {
                return Err(arg_count_err(&lower));
            }
            Ok(Command::with_kind(CommandKind::Ping))
        },
        "info" => {
            if argc != 1 {
                return Err(arg_count_err(&lower));
            }
            Ok(Command::with_kind(CommandKind::Info))
        },
        "dbsize" => {
            if argc != 1 {
                return Err(arg_count_err(&lower));
            }
            Ok(Command::with_kind(CommandKind::DbSize))
        },
        "flushall" => {
            if argc != 1 {
                return Err(arg_count_err(&lower));
            }
            Ok(Command::with_kind(CommandKind::FlushAll))
        },
        "keys" => {
            if argc != 1 && argc != 2 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::Keys);
            cmd.pattern = if argc == 2 { tokens[1].clone() } else { "*".to_string() };
            Ok(cmd)
        },
        "cleanup" => {
            if argc != 1 && argc != 2 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::Cleanup);
            if argc == 2 {
                cmd.limit = parse_int(&lower, &tokens[1])?;
            }
            Ok(cmd)
        },
        "expire" => {
            if argc != 3 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::Expire);
            cmd.key = tokens[1].clone();
            cmd.expire_seconds = parse_int(&lower, &tokens[2])?;
            Ok(cmd)
        },
        "auth" => {
            if argc != 3 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::Auth);
            cmd.auth = AuthOptions { user: tokens[1].clone(), password: tokens[2].clone() };
            Ok(cmd)
        },
        "hello" => {
            if argc < 2 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::Hello);
            cmd.resp_version = tokens[1].clone();
            if argc > 2 {
                if tokens[2].to_lowercase() != "auth" || argc != 5 {
                    return Err(arg_count_err(&lower));
                }
                cmd.auth = AuthOptions { user: tokens[3].clone(), password: tokens[4].clone() };
            }
            Ok(cmd)
        },
        "set" => {
            if argc != 3 && argc != 5 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::Set);
            cmd.key = tokens[1].clone();
            cmd.value = tokens[2].clone();
            if argc == 5 {
                if tokens[3].to_lowercase() != "ex" {
                    return Err(arg_count_err(&lower));
                }
                cmd.expire_seconds = parse_int(&lower, &tokens[4])?;
            }
            Ok(cmd)
        },
        "get" => {
            if argc != 2 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::Get);
            cmd.key = tokens[1].clone();
            Ok(cmd)
        },
        "del" => {
            if argc < 2 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::Del);
            cmd.keys = tokens[1..].to_vec();
            Ok(cmd)
        },
        "qadd" => {
            if argc < 3 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::QAdd);
            cmd.key = tokens[1].clone();
            cmd.priority = 1;
            let mut i = 2;
            while i < argc {
                if i + 1 < argc && tokens[i].to_lowercase() == "pr" {
                    cmd.priority = parse_int(&lower, &tokens[i + 1])?;
                    i += 2;
                    continue;
                }
                cmd.values.push(tokens[i].clone());
                i += 1;
            }
            Ok(cmd)
        },
        "qpop" => {
            if argc != 2 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::QPop);
            cmd.key = tokens[1].clone();
            Ok(cmd)
        },
        "qlen" => {
            if argc != 2 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::QLen);
            cmd.key = tokens[1].clone();
            Ok(cmd)
        },
        "lpush" => {
            if argc < 3 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::LPush);
            cmd.key = tokens[1].clone();
            cmd.values = tokens[2..].to_vec();
            Ok(cmd)
        },
        "lpop" => {
            if argc != 2 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::LPop);
            cmd.key = tokens[1].clone();
            Ok(cmd)
        },
        "rpush" => {
            if argc < 3 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::RPush);
            cmd.key = tokens[1].clone();
            cmd.values = tokens[2..].to_vec();
            Ok(cmd)
        },
        "rpop" => {
            if argc != 2 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::RPop);
            cmd.key = tokens[1].clone();
            Ok(cmd)
        },
        "llen" => {
            if argc != 2 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::LLen);
            cmd.key = tokens[1].clone();
            Ok(cmd)
        },
        "sadd" => {
            if argc < 3 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::SAdd);
            cmd.key = tokens[1].clone();
            cmd.values = tokens[2..].to_vec();
            Ok(cmd)
        },
        "srem" => {
            if argc < 3 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::SRem);
            cmd.key = tokens[1].clone();
            cmd.values = tokens[2..].to_vec();
            Ok(cmd)
        },
        "smembers" => {
            if argc != 2 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::SMembers);
            cmd.key = tokens[1].clone();
            Ok(cmd)
        },
        "sismember" => {
            if argc != 3 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::SIsMember);
            cmd.key = tokens[1].clone();
            cmd.value = tokens[2].clone();
            Ok(cmd)
        },
        "scard" => {
            if argc != 2 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::SCard);
            cmd.key = tokens[1].clone();
            Ok(cmd)
        },
        "sinter" => {
            if argc != 3 {
                return Err(arg_count_err(&lower));
            }
            let mut cmd = Command::with_kind(CommandKind::SInter);
            cmd.keys = vec![tokens[1].clone(), tokens[2].clone()];
            Ok(cmd)
        },
        other => Err(EngineError::UnknownCommand(other.to_string())),
    }
}
