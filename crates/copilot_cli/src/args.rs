//! Command-line parsing.
//!
//! Flags take one or two leading dashes and accept `-flag value` or `-flag=value`. Parsing
//! stops at the first positional argument or at `--`.

use copilot_api::ChatMessage;
use thiserror::Error;

use crate::config::Config;

pub const USAGE: &str = "\
Usage: gh-copilot [flags] [prompt]

Ask GitHub Copilot a question and stream the answer to the terminal.
Text piped on stdin is appended to the prompt.

Flags:
  -model <name>     model to use (default from config)
  -c <name>         use a prompt command from config
  -plain[=bool]     disable markdown rendering
  -h, -help         show this help
";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgsError {
    #[error("flag provided but not defined: {0}")]
    UnknownFlag(String),
    #[error("flag needs an argument: {0}")]
    MissingValue(String),
    #[error("invalid boolean value {value:?} for {flag}")]
    InvalidBool { flag: String, value: String },
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("no prompt or command provided")]
    NoPrompt,
}

/// Flags as written on the command line, before config is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    pub model: Option<String>,
    pub command: Option<String>,
    pub plain: Option<bool>,
    pub help: bool,
    pub prompt: Option<String>,
}

impl Flags {
    pub fn parse<I>(argv: I) -> Result<Self, ArgsError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = Flags::default();
        let mut argv = argv.into_iter();

        while let Some(arg) = argv.next() {
            if arg == "--" {
                flags.prompt = argv.next();
                break;
            }
            let Some(body) = flag_body(&arg) else {
                flags.prompt = Some(arg);
                break;
            };
            let (name, inline) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (body, None),
            };

            match name {
                "model" => flags.model = Some(value_for(&arg, inline, &mut argv)?),
                "c" | "command" => flags.command = Some(value_for(&arg, inline, &mut argv)?),
                "plain" => {
                    flags.plain = Some(match inline {
                        Some(value) => parse_bool(&arg, &value)?,
                        None => true,
                    })
                }
                "h" | "help" => flags.help = true,
                _ => return Err(ArgsError::UnknownFlag(format!("-{name}"))),
            }
        }

        if argv.next().is_some() {
            tracing::debug!("ignoring arguments after the prompt");
        }
        Ok(flags)
    }
}

fn flag_body(arg: &str) -> Option<&str> {
    let body = arg
        .strip_prefix("--")
        .or_else(|| arg.strip_prefix('-'))?;
    (!body.is_empty()).then_some(body)
}

fn value_for(
    arg: &str,
    inline: Option<String>,
    rest: &mut impl Iterator<Item = String>,
) -> Result<String, ArgsError> {
    let flag = arg.split('=').next().unwrap_or(arg);
    inline
        .or_else(|| rest.next())
        .ok_or_else(|| ArgsError::MissingValue(flag.to_string()))
}

fn parse_bool(arg: &str, value: &str) -> Result<bool, ArgsError> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(ArgsError::InvalidBool {
            flag: arg.split('=').next().unwrap_or(arg).to_string(),
            value: value.to_string(),
        }),
    }
}

/// A fully resolved invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arguments {
    pub model: String,
    pub command: Option<String>,
    /// Command prompt sent ahead of the user's text.
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub plain: bool,
}

impl Arguments {
    /// Combines flags, piped stdin and config.
    ///
    /// The user's text is the positional prompt followed by trimmed piped input, separated by a
    /// blank line. `plain_default` applies unless `-plain` was given explicitly.
    pub fn resolve(
        flags: Flags,
        piped: Option<&str>,
        config: &Config,
        plain_default: bool,
    ) -> Result<Self, ArgsError> {
        let user_text = [flags.prompt.as_deref(), piped]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        let plain = flags.plain.unwrap_or(plain_default);
        let Some(name) = flags.command.filter(|name| !name.trim().is_empty()) else {
            if user_text.is_empty() {
                return Err(ArgsError::NoPrompt);
            }
            return Ok(Self {
                model: flags.model.unwrap_or_else(|| config.model.clone()),
                command: None,
                system_prompt: None,
                prompt: user_text,
                plain,
            });
        };

        let command = config
            .prompt(&name)
            .ok_or_else(|| ArgsError::UnknownCommand(name.clone()))?;
        let model = flags
            .model
            .or_else(|| command.model.clone())
            .unwrap_or_else(|| config.model.clone());
        let (system_prompt, prompt) = if user_text.is_empty() {
            (None, command.prompt.clone())
        } else {
            (Some(command.prompt.clone()), user_text)
        };

        Ok(Self {
            model,
            command: Some(name),
            system_prompt,
            prompt,
            plain,
        })
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(self.prompt.clone()));
        messages
    }
}
