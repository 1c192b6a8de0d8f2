//! Line-oriented grouping script.
//!
//! ```text
//! runtime <name>
//! open <runtime> <owner>/<window> <native-key>
//! close <runtime> <owner>/<window>
//! join <runtime> <owner>/<window> <owner>/<window>
//! merge <runtime> <owner>/<window> <owner>/<window>
//! leave <runtime> <owner>/<window>
//! groups <runtime>
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use tether_common::Identity;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Runtime(String),
    Open {
        runtime: String,
        window: Identity,
        native_key: String,
    },
    Close {
        runtime: String,
        window: Identity,
    },
    Join {
        runtime: String,
        source: Identity,
        target: Identity,
    },
    Merge {
        runtime: String,
        source: Identity,
        target: Identity,
    },
    Leave {
        runtime: String,
        window: Identity,
    },
    Groups(String),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Runtime(_) => "runtime",
            Command::Open { .. } => "open",
            Command::Close { .. } => "close",
            Command::Join { .. } => "join",
            Command::Merge { .. } => "merge",
            Command::Leave { .. } => "leave",
            Command::Groups(_) => "groups",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("{command} takes {expected} argument(s), got {found}")]
    Arity {
        command: String,
        expected: usize,
        found: usize,
    },

    #[error("{0}")]
    BadIdentity(String),
}

/// Parse one script line. Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match verb {
        "runtime" => {
            let [name] = arity::<1>(verb, &args)?;
            Command::Runtime(name.to_string())
        }
        "open" => {
            let [runtime, window, key] = arity::<3>(verb, &args)?;
            Command::Open {
                runtime: runtime.to_string(),
                window: identity(window)?,
                native_key: key.to_string(),
            }
        }
        "close" => {
            let [runtime, window] = arity::<2>(verb, &args)?;
            Command::Close {
                runtime: runtime.to_string(),
                window: identity(window)?,
            }
        }
        "join" | "merge" => {
            let [runtime, source, target] = arity::<3>(verb, &args)?;
            let runtime = runtime.to_string();
            let source = identity(source)?;
            let target = identity(target)?;
            if verb == "join" {
                Command::Join {
                    runtime,
                    source,
                    target,
                }
            } else {
                Command::Merge {
                    runtime,
                    source,
                    target,
                }
            }
        }
        "leave" => {
            let [runtime, window] = arity::<2>(verb, &args)?;
            Command::Leave {
                runtime: runtime.to_string(),
                window: identity(window)?,
            }
        }
        "groups" => {
            let [runtime] = arity::<1>(verb, &args)?;
            Command::Groups(runtime.to_string())
        }
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

fn arity<'a, const N: usize>(verb: &str, args: &[&'a str]) -> Result<[&'a str; N], ParseError> {
    <[&'a str; N]>::try_from(args).map_err(|_| ParseError::Arity {
        command: verb.to_string(),
        expected: N,
        found: args.len(),
    })
}

fn identity(word: &str) -> Result<Identity, ParseError> {
    word.parse().map_err(ParseError::BadIdentity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(parse_line("# set up runtimes"), Ok(None));
    }

    #[test]
    fn parses_every_command() {
        assert_eq!(
            parse_line("runtime a"),
            Ok(Some(Command::Runtime("a".into())))
        );
        assert_eq!(
            parse_line("open a app/main 0x10"),
            Ok(Some(Command::Open {
                runtime: "a".into(),
                window: Identity::new("app", "main"),
                native_key: "0x10".into(),
            }))
        );
        assert_eq!(
            parse_line("  join a app/side   app/main "),
            Ok(Some(Command::Join {
                runtime: "a".into(),
                source: Identity::new("app", "side"),
                target: Identity::new("app", "main"),
            }))
        );
        assert_eq!(
            parse_line("merge a app/side other/main"),
            Ok(Some(Command::Merge {
                runtime: "a".into(),
                source: Identity::new("app", "side"),
                target: Identity::new("other", "main"),
            }))
        );
        assert_eq!(
            parse_line("leave a app/side"),
            Ok(Some(Command::Leave {
                runtime: "a".into(),
                window: Identity::new("app", "side"),
            }))
        );
        assert_eq!(
            parse_line("close a app/side"),
            Ok(Some(Command::Close {
                runtime: "a".into(),
                window: Identity::new("app", "side"),
            }))
        );
        assert_eq!(
            parse_line("groups a"),
            Ok(Some(Command::Groups("a".into())))
        );
    }

    #[test]
    fn wrong_argument_count() {
        assert_eq!(
            parse_line("join a app/main"),
            Err(ParseError::Arity {
                command: "join".into(),
                expected: 3,
                found: 2,
            })
        );
        assert!(parse_line("groups").is_err());
    }

    #[test]
    fn malformed_identity() {
        let err = parse_line("leave a main").unwrap_err();
        assert!(matches!(err, ParseError::BadIdentity(_)));
        assert!(err.to_string().contains("main"));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_line("split a app/main"),
            Err(ParseError::UnknownCommand("split".into()))
        );
    }

    #[test]
    fn command_names() {
        let cmd = parse_line("merge a x/1 y/2").unwrap().unwrap();
        assert_eq!(cmd.name(), "merge");
    }
}
