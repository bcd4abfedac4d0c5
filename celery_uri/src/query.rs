use crate::ParseError;
use celery_util::{parse_boolean, parse_integer, to_camel_case};
use percent_encoding::percent_decode_str;
use std::collections::BTreeMap;

/// A single query value: either a scalar, or an ordered sequence when the
/// same key occurred more than once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// A query key that occurred exactly once.
    Scalar(String),
    /// A query key that occurred more than once, in occurrence order.
    Sequence(Vec<String>),
}

impl QueryValue {
    /// Returns this value as a single scalar: the last element if this is a
    /// sequence, the value itself if already a scalar.
    pub fn as_scalar(&self) -> &str {
        match self {
            QueryValue::Scalar(s) => s,
            QueryValue::Sequence(seq) => seq.last().map(String::as_str).unwrap_or_default(),
        }
    }

    /// Returns this value as an ordered sequence, wrapping a lone scalar in
    /// a single-element vector.
    pub fn as_array(&self) -> Vec<&str> {
        match self {
            QueryValue::Scalar(s) => vec![s.as_str()],
            QueryValue::Sequence(seq) => seq.iter().map(String::as_str).collect(),
        }
    }
}

/// Reports whether `token` consists solely of the query grammar's allowed
/// character set (`[A-Za-z0-9*\-._+%]`), checked before percent-decoding.
fn is_valid_token(token: &str) -> bool {
    token
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'*' | b'-' | b'.' | b'_' | b'+' | b'%'))
}

/// An ordered mapping from camelCase-normalized query key to
/// [`QueryValue`], as decoded from the `?...` portion of a URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    entries: BTreeMap<String, QueryValue>,
}

impl Query {
    /// Parses a raw query string (without the leading `?`).
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let mut entries: BTreeMap<String, QueryValue> = BTreeMap::new();

        if raw.is_empty() {
            return Ok(Self { entries });
        }

        for pair in raw.split('&') {
            if pair.is_empty() {
                return Err(ParseError::InvalidQuery(raw.to_string()));
            }

            let (raw_key, raw_value) = pair
                .split_once('=')
                .ok_or_else(|| ParseError::InvalidQuery(raw.to_string()))?;

            if raw_key.is_empty() {
                return Err(ParseError::InvalidQuery(raw.to_string()));
            }

            if !is_valid_token(raw_key) || !is_valid_token(raw_value) {
                return Err(ParseError::InvalidQuery(raw.to_string()));
            }

            let key = to_camel_case(
                &percent_decode_str(raw_key)
                    .decode_utf8()
                    .map_err(|_| ParseError::InvalidQuery(raw.to_string()))?,
            );
            let value = percent_decode_str(raw_value)
                .decode_utf8()
                .map_err(|_| ParseError::InvalidQuery(raw.to_string()))?
                .into_owned();

            entries
                .entry(key)
                .and_modify(|existing| match existing {
                    QueryValue::Scalar(first) => {
                        *existing = QueryValue::Sequence(vec![first.clone(), value.clone()]);
                    }
                    QueryValue::Sequence(seq) => seq.push(value.clone()),
                })
                .or_insert_with(|| QueryValue::Scalar(value));
        }

        Ok(Self { entries })
    }

    /// Looks up a normalized key.
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries.get(key)
    }

    /// Reports whether this query string had no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A declarative rule mapping one query key onto a field of `T`, applied by
/// [`apply_queries`].
pub struct QueryDescriptor<T> {
    source: &'static str,
    apply: fn(&mut T, &QueryValue),
}

impl<T> QueryDescriptor<T> {
    /// Builds a descriptor that calls `apply` with the raw [`QueryValue`]
    /// found under `source`, if any.
    pub fn new(source: &'static str, apply: fn(&mut T, &QueryValue)) -> Self {
        Self { source, apply }
    }
}

/// Applies every descriptor in `descriptors` against `target`, pulling
/// values out of `queries` by each descriptor's source key. Keys absent
/// from `queries` leave the corresponding field untouched.
pub fn apply_queries<T>(queries: &Query, mut target: T, descriptors: &[QueryDescriptor<T>]) -> T {
    for descriptor in descriptors {
        if let Some(value) = queries.get(descriptor.source) {
            (descriptor.apply)(&mut target, value);
        }
    }

    target
}

/// Builds a [`QueryDescriptor`] that parses its value with
/// [`celery_util::parse_integer`] and stores it via `set`.
pub fn integer_query_descriptor<T>(
    source: &'static str,
    set: fn(&mut T, u64),
) -> QueryDescriptor<T> {
    QueryDescriptor::new(source, move |target, value| {
        if let Ok(parsed) = parse_integer(value.as_scalar()) {
            set(target, parsed);
        }
    })
}

/// Builds a [`QueryDescriptor`] that parses its value with
/// [`celery_util::parse_boolean`] and stores it via `set`.
pub fn boolean_query_descriptor<T>(
    source: &'static str,
    set: fn(&mut T, bool),
) -> QueryDescriptor<T> {
    QueryDescriptor::new(source, move |target, value| {
        if let Ok(parsed) = parse_boolean(value.as_scalar()) {
            set(target, parsed);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn repeated_keys_become_an_ordered_sequence() {
        // Given
        let query = Query::parse("key=value&key=value2").unwrap();

        // Then
        assert_eq!(
            query.get("key"),
            Some(&QueryValue::Sequence(vec![
                "value".to_string(),
                "value2".to_string()
            ]))
        );
    }

    #[test]
    fn snake_case_keys_normalize_to_camel_case() {
        // Given
        let query = Query::parse("channel_max=10").unwrap();

        // Then
        assert_eq!(query.get("channelMax"), Some(&QueryValue::Scalar("10".to_string())));
    }

    #[test]
    fn rejects_empty_trailing_token() {
        assert!(Query::parse("a=1&").is_err());
    }

    #[test]
    fn rejects_out_of_grammar_characters() {
        assert!(Query::parse("a b=1").is_err());
        assert!(Query::parse("key=va!ue").is_err());
    }

    #[test]
    fn applies_integer_descriptor() {
        #[derive(Default, Debug, PartialEq)]
        struct Target {
            heartbeat: Option<u64>,
        }

        let query = Query::parse("heartbeat=30").unwrap();
        let descriptors = [integer_query_descriptor::<Target>("heartbeat", |t, v| {
            t.heartbeat = Some(v)
        })];

        let target = apply_queries(&query, Target::default(), &descriptors);

        assert_eq!(target, Target { heartbeat: Some(30) });
    }
}
