//! Request Parsing
//!
//! The wire protocol is one whitespace-delimited command per line:
//!
//! ```text
//! SET user:1 john 30
//! GET user:1
//! SEARCHPREFIX user:
//! ```
//!
//! Parsing is strict about arity and numeric arguments but makes no
//! attempt at quoting or escaping; keys and values are single tokens.
//! Errors carry the exact text to send back to the client.

use thiserror::Error;

/// A parsed client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `SET key value [ttl]`. `ttl` is relative seconds; absent means the
    /// configured default.
    Set {
        key: String,
        value: String,
        ttl: Option<i64>,
    },
    /// `GET key`
    Get { key: String },
    /// `DELETE key`
    Delete { key: String },
    /// `TTL key`
    Ttl { key: String },
    /// `EXPIRE key seconds`
    Expire { key: String, seconds: i64 },
    /// `SAVE`
    Save,
    /// `BGSAVE`
    BgSave,
    /// `SEARCHVALUE value`
    SearchValue { value: String },
    /// `SEARCHPREFIX prefix`
    SearchPrefix { prefix: String },
    /// `SEARCHSUFFIX suffix`
    SearchSuffix { suffix: String },
    /// `SEARCHCONTAINS substring`
    SearchContains { substring: String },
}

/// Errors produced while parsing a request line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Blank input line.
    #[error("Invalid command!")]
    Empty,

    /// Command word not recognized.
    #[error("Unknown command '{0}'.")]
    UnknownCommand(String),

    /// Wrong number of arguments.
    #[error("Usage: {0}")]
    Usage(&'static str),

    /// A numeric argument did not parse.
    #[error("Invalid {what} value: {raw}")]
    InvalidInteger { what: &'static str, raw: String },
}

fn parse_i64(what: &'static str, raw: &str) -> Result<i64, ParseError> {
    raw.parse().map_err(|_| ParseError::InvalidInteger {
        what,
        raw: raw.to_string(),
    })
}

/// Parses one request line.
pub fn parse(line: &str) -> Result<Request, ParseError> {
    let args: Vec<&str> = line.split_whitespace().collect();
    let Some(&command) = args.first() else {
        return Err(ParseError::Empty);
    };

    match command.to_uppercase().as_str() {
        "SET" => match args.len() {
            3 => Ok(Request::Set {
                key: args[1].to_string(),
                value: args[2].to_string(),
                ttl: None,
            }),
            4 => Ok(Request::Set {
                key: args[1].to_string(),
                value: args[2].to_string(),
                ttl: Some(parse_i64("TTL", args[3])?),
            }),
            _ => Err(ParseError::Usage("SET {key} {value} [ttl]")),
        },
        "GET" => match args.len() {
            2 => Ok(Request::Get {
                key: args[1].to_string(),
            }),
            _ => Err(ParseError::Usage("GET {key}")),
        },
        "DELETE" => match args.len() {
            2 => Ok(Request::Delete {
                key: args[1].to_string(),
            }),
            _ => Err(ParseError::Usage("DELETE {key}")),
        },
        "TTL" => match args.len() {
            2 => Ok(Request::Ttl {
                key: args[1].to_string(),
            }),
            _ => Err(ParseError::Usage("TTL {key}")),
        },
        "EXPIRE" => match args.len() {
            3 => Ok(Request::Expire {
                key: args[1].to_string(),
                seconds: parse_i64("seconds", args[2])?,
            }),
            _ => Err(ParseError::Usage("EXPIRE {key} {seconds}")),
        },
        "SAVE" => Ok(Request::Save),
        "BGSAVE" => Ok(Request::BgSave),
        "SEARCHVALUE" => match args.len() {
            2 => Ok(Request::SearchValue {
                value: args[1].to_string(),
            }),
            _ => Err(ParseError::Usage("SEARCHVALUE {value}")),
        },
        "SEARCHPREFIX" => match args.len() {
            2 => Ok(Request::SearchPrefix {
                prefix: args[1].to_string(),
            }),
            _ => Err(ParseError::Usage("SEARCHPREFIX {prefix}")),
        },
        "SEARCHSUFFIX" => match args.len() {
            2 => Ok(Request::SearchSuffix {
                suffix: args[1].to_string(),
            }),
            _ => Err(ParseError::Usage("SEARCHSUFFIX {suffix}")),
        },
        "SEARCHCONTAINS" => match args.len() {
            2 => Ok(Request::SearchContains {
                substring: args[1].to_string(),
            }),
            _ => Err(ParseError::Usage("SEARCHCONTAINS {substring}")),
        },
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_with_and_without_ttl() {
        assert_eq!(
            parse("SET a 1").unwrap(),
            Request::Set {
                key: "a".into(),
                value: "1".into(),
                ttl: None
            }
        );
        assert_eq!(
            parse("SET a 1 30").unwrap(),
            Request::Set {
                key: "a".into(),
                value: "1".into(),
                ttl: Some(30)
            }
        );
    }

    #[test]
    fn test_command_word_is_case_insensitive() {
        assert_eq!(parse("get a").unwrap(), Request::Get { key: "a".into() });
        assert_eq!(parse("Save").unwrap(), Request::Save);
    }

    #[test]
    fn test_arity_errors_carry_usage() {
        assert_eq!(parse("SET a"), Err(ParseError::Usage("SET {key} {value} [ttl]")));
        assert_eq!(parse("GET"), Err(ParseError::Usage("GET {key}")));
        assert_eq!(parse("EXPIRE k"), Err(ParseError::Usage("EXPIRE {key} {seconds}")));
    }

    #[test]
    fn test_numeric_arguments_validated() {
        assert_eq!(
            parse("SET a 1 soon"),
            Err(ParseError::InvalidInteger {
                what: "TTL",
                raw: "soon".into()
            })
        );
        assert!(parse("EXPIRE k -5").is_ok());
        assert!(matches!(
            parse("EXPIRE k never"),
            Err(ParseError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn test_blank_and_unknown() {
        assert_eq!(parse(""), Err(ParseError::Empty));
        assert_eq!(parse("   "), Err(ParseError::Empty));
        assert_eq!(
            parse("PING"),
            Err(ParseError::UnknownCommand("PING".into()))
        );
    }

    #[test]
    fn test_error_display_matches_wire_text() {
        assert_eq!(ParseError::Empty.to_string(), "Invalid command!");
        assert_eq!(
            ParseError::UnknownCommand("PING".into()).to_string(),
            "Unknown command 'PING'."
        );
        assert_eq!(
            ParseError::Usage("GET {key}").to_string(),
            "Usage: GET {key}"
        );
    }
}
