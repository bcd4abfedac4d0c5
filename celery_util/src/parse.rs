use thiserror::Error;

/// Failure parsing a loosely-typed string into a primitive value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to parse {kind}: {input:?}")]
pub struct ParseError {
    kind: &'static str,
    input: String,
}

impl ParseError {
    fn new(kind: &'static str, input: &str) -> Self {
        Self {
            kind,
            input: input.to_string(),
        }
    }
}

/// Parses an integer out of a decimal, `0x`-hex, `0b`-binary, or
/// leading-zero octal string, mirroring the numeric literal grammar commonly
/// accepted by configuration loaders.
///
/// ```
/// assert_eq!(celery_util::parse_integer("0xdeadBEEF").unwrap(), 3735928559);
/// assert_eq!(celery_util::parse_integer("0b1111").unwrap(), 15);
/// assert_eq!(celery_util::parse_integer("010").unwrap(), 8);
/// assert_eq!(celery_util::parse_integer("42").unwrap(), 42);
/// assert!(celery_util::parse_integer("08").is_err());
/// ```
pub fn parse_integer(input: &str) -> Result<u64, ParseError> {
    let trimmed = input.trim();
    let err = || ParseError::new("integer", input);

    if let Some(rest) = trimmed
        .strip_prefix("0b")
        .or_else(|| trimmed.strip_prefix("0B"))
    {
        if rest.is_empty() {
            return Err(err());
        }
        return u64::from_str_radix(rest, 2).map_err(|_| err());
    }

    if let Some(rest) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if rest.is_empty() {
            return Err(err());
        }
        return u64::from_str_radix(rest, 16).map_err(|_| err());
    }

    if trimmed.len() > 1 && trimmed.starts_with('0') {
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        return u64::from_str_radix(&trimmed[1..], 8).map_err(|_| err());
    }

    trimmed.parse::<u64>().map_err(|_| err())
}

/// Parses a boolean out of one of the common truthy/falsy string spellings.
///
/// ```
/// assert_eq!(celery_util::parse_boolean("on").unwrap(), true);
/// assert_eq!(celery_util::parse_boolean("no").unwrap(), false);
/// assert!(celery_util::parse_boolean("2").is_err());
/// ```
pub fn parse_boolean(input: &str) -> Result<bool, ParseError> {
    match input.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(ParseError::new("boolean", input)),
    }
}

/// Converts a `snake_case` string into `camelCase`. Idempotent on input that
/// is already camelCase.
///
/// ```
/// assert_eq!(celery_util::to_camel_case("max_elapsed_time"), "maxElapsedTime");
/// assert_eq!(celery_util::to_camel_case("channelMax"), "channelMax");
/// ```
pub fn to_camel_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut uppercase_next = false;

    for ch in input.chars() {
        if ch == '_' {
            uppercase_next = true;
            continue;
        }

        if uppercase_next {
            out.extend(ch.to_uppercase());
            uppercase_next = false;
        } else {
            out.push(ch);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_hex_binary_and_octal() {
        assert_eq!(parse_integer("0xdeadBEEF").unwrap(), 3735928559);
        assert_eq!(parse_integer("0b1111").unwrap(), 15);
        assert_eq!(parse_integer("010").unwrap(), 8);
        assert_eq!(parse_integer("0666").unwrap(), 438);
    }

    #[test]
    fn rejects_invalid_octal_digit() {
        assert!(parse_integer("08").is_err());
    }

    #[test]
    fn parses_plain_decimal() {
        assert_eq!(parse_integer("42").unwrap(), 42);
    }

    #[test]
    fn parses_booleans() {
        assert_eq!(parse_boolean("on").unwrap(), true);
        assert_eq!(parse_boolean("No").unwrap(), false);
        assert!(parse_boolean("2").is_err());
    }

    #[test]
    fn converts_to_camel_case() {
        assert_eq!(to_camel_case("max_elapsed_time"), "maxElapsedTime");
        assert_eq!(to_camel_case("already_camel"), "alreadyCamel");
        assert_eq!(to_camel_case("channelMax"), "channelMax");
    }
}
