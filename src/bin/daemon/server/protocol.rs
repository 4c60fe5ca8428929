//! Command Grammar
//!
//! A request is a batch of `KEY:VALUE` commands separated by `;`. Values are
//! not escaped, so a literal `;` cannot appear inside a value; `:` can, since
//! only the first colon of a token separates the key.

use crate::controller::AxesSelection;
use std::fmt;

/// Separator between commands of one batch
pub const COMMAND_SEPARATOR: char = ';';
/// Separator between a command key and its value
pub const KEY_SEPARATOR: char = ':';

/// One parsed `KEY:VALUE` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

/// A token without a key separator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedToken(pub String);

impl fmt::Display for MalformedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Malformed command: {}", self.0)
    }
}

impl std::error::Error for MalformedToken {}

/// Split a request into command tokens, in order.
///
/// Tokens are trimmed; empty tokens from doubled or trailing separators are
/// skipped.
pub fn split_batch(request: &str) -> impl Iterator<Item = &str> {
    request
        .split(COMMAND_SEPARATOR)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Split a token on its first colon
pub fn parse_token(token: &str) -> Result<Command<'_>, MalformedToken> {
    token
        .split_once(KEY_SEPARATOR)
        .map(|(key, value)| Command { key, value })
        .ok_or_else(|| MalformedToken(token.to_string()))
}

/// Parse an `x,y,z` axis triple; anything other than exactly three integers
/// yields `None`.
pub fn parse_axes(value: &str) -> Option<AxesSelection> {
    let mut parts = value.split(',').map(|part| part.trim().parse::<i32>());
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y)), Some(Ok(z)), None) => Some(AxesSelection::new(x, y, z)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_batch_skips_empty_tokens() {
        let tokens: Vec<_> = split_batch("AXES:0,2,4;;SHOW:; ").collect();
        assert_eq!(tokens, vec!["AXES:0,2,4", "SHOW:"]);
    }

    #[test]
    fn test_split_batch_tolerates_spaced_separators() {
        let tokens: Vec<_> = split_batch("FILE:/tmp/a.dat; SHOW:\n").collect();
        assert_eq!(tokens, vec!["FILE:/tmp/a.dat", "SHOW:"]);
    }

    #[test]
    fn test_parse_token_splits_on_first_colon() {
        let command = parse_token("FILE:C:/data/sweep.dat").unwrap();
        assert_eq!(command.key, "FILE");
        assert_eq!(command.value, "C:/data/sweep.dat");
    }

    #[test]
    fn test_parse_token_empty_value() {
        assert_eq!(
            parse_token("SHOW:").unwrap(),
            Command {
                key: "SHOW",
                value: ""
            }
        );
    }

    #[test]
    fn test_parse_token_without_colon() {
        assert_eq!(
            parse_token("GARBAGE"),
            Err(MalformedToken("GARBAGE".to_string()))
        );
    }

    #[test]
    fn test_parse_axes() {
        assert_eq!(parse_axes("0,2,4"), Some(AxesSelection::new(0, 2, 4)));
        assert_eq!(parse_axes(" 1, 2 ,3"), Some(AxesSelection::new(1, 2, 3)));
        assert_eq!(parse_axes("-1,0,1"), Some(AxesSelection::new(-1, 0, 1)));
    }

    #[test]
    fn test_parse_axes_rejects_wrong_shapes() {
        assert_eq!(parse_axes("1,2"), None);
        assert_eq!(parse_axes("1,2,3,4"), None);
        assert_eq!(parse_axes("1,two,3"), None);
        assert_eq!(parse_axes(""), None);
        assert_eq!(parse_axes("1.5,2,3"), None);
    }
}
