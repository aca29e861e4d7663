use std::collections::HashMap;
use std::sync::Arc;

use tusker_core::{BoxDynError, Error, Result, TypeParser, Value};

use crate::error::map_wire_error;

pub(crate) const RESOLVE_TYPES_SQL: &str =
    "SELECT oid, typarray, typname FROM pg_type WHERE typname = ANY($1::text[])";

type ScalarParser = Arc<dyn Fn(&str) -> std::result::Result<Value, BoxDynError> + Send + Sync>;

/// One row of the type-catalog resolution result.
#[derive(Debug)]
pub(crate) struct ResolvedType {
    pub(crate) name: String,
    pub(crate) oid: u32,
    /// 0 when the type has no array form.
    pub(crate) array_oid: u32,
}

/// An installed decoder for one OID.
pub(crate) enum Decoder {
    Scalar(ScalarParser),
    /// Splits the wire array literal and maps each element through the
    /// scalar parser.
    Array(ScalarParser),
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decoder::Scalar(_) => f.write_str("Decoder::Scalar(..)"),
            Decoder::Array(_) => f.write_str("Decoder::Array(..)"),
        }
    }
}

impl Decoder {
    pub(crate) fn apply(&self, raw: &str) -> std::result::Result<Value, BoxDynError> {
        match self {
            Self::Scalar(parse) => parse(raw),
            Self::Array(parse) => split_array_literal(raw)?
                .into_iter()
                .map(|element| match element {
                    None => Ok(Value::Null),
                    Some(text) => parse(&text),
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Value::Array),
        }
    }
}

/// Per-OID decoders resolved for one driver instance.
///
/// Resolution runs at most once per driver; connections share the resolved
/// registry, which is immutable thereafter. OIDs without an installed
/// decoder fall back to the default decoding in [`crate::decode`].
#[derive(Debug)]
pub(crate) struct TypeParserRegistry {
    decoders: HashMap<u32, Decoder>,
}

impl TypeParserRegistry {
    pub(crate) fn empty() -> Self {
        Self { decoders: HashMap::new() }
    }

    /// Resolves the requested type names against the backend's type catalog.
    pub(crate) async fn resolve(
        client: &tokio_postgres::Client,
        parsers: &[TypeParser],
    ) -> Result<Self> {
        if parsers.is_empty() {
            return Ok(Self::empty());
        }

        let names: Vec<String> = parsers.iter().map(|parser| parser.name().to_owned()).collect();

        let rows = client
            .query(RESOLVE_TYPES_SQL, &[&names])
            .await
            .map_err(|error| map_wire_error(error, RESOLVE_TYPES_SQL, &[]))?;

        let resolved: Vec<ResolvedType> = rows
            .iter()
            .map(|row| ResolvedType {
                name: row.get("typname"),
                oid: row.get("oid"),
                array_oid: row.get("typarray"),
            })
            .collect();

        Self::build(parsers, &resolved)
    }

    /// Installs each parser under its scalar OID and, when the type has an
    /// array form, its array OID. A requested name missing from the catalog
    /// aborts driver bring-up.
    pub(crate) fn build(parsers: &[TypeParser], resolved: &[ResolvedType]) -> Result<Self> {
        let mut decoders = HashMap::new();

        for parser in parsers {
            let entry = resolved
                .iter()
                .find(|candidate| candidate.name == parser.name())
                .ok_or_else(|| {
                    Error::configuration_msg(format!(
                        "type parser references unknown backend type {:?}",
                        parser.name()
                    ))
                })?;

            decoders.insert(entry.oid, Decoder::Scalar(parser.parse_fn()));

            if entry.array_oid != 0 {
                decoders.insert(entry.array_oid, Decoder::Array(parser.parse_fn()));
            }
        }

        Ok(Self { decoders })
    }

    pub(crate) fn get(&self, oid: u32) -> Option<&Decoder> {
        self.decoders.get(&oid)
    }
}

/// Splits a wire-level array literal into raw element strings.
///
/// Quoted elements may contain commas, quotes, and backslash escapes; the
/// unquoted word `NULL` is a null element. Nested (multidimensional)
/// literals are not supported.
fn split_array_literal(raw: &str) -> std::result::Result<Vec<Option<String>>, BoxDynError> {
    let inner = raw
        .trim()
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .ok_or("malformed array literal")?;

    let mut elements = Vec::new();

    if inner.is_empty() {
        return Ok(elements);
    }

    let mut chars = inner.chars().peekable();

    loop {
        match chars.peek() {
            Some('"') => {
                chars.next();
                let mut element = String::new();

                loop {
                    match chars.next() {
                        Some('\\') => {
                            element.push(chars.next().ok_or("truncated escape in array literal")?);
                        }
                        Some('"') => break,
                        Some(c) => element.push(c),
                        None => return Err("unterminated quoted element in array literal".into()),
                    }
                }

                elements.push(Some(element));
            }
            _ => {
                let mut element = String::new();

                while let Some(&c) = chars.peek() {
                    if c == ',' {
                        break;
                    }
                    if c == '{' || c == '}' {
                        return Err("nested array literals are not supported".into());
                    }
                    element.push(c);
                    chars.next();
                }

                elements.push(if element.eq_ignore_ascii_case("null") {
                    None
                } else {
                    Some(element)
                });
            }
        }

        match chars.next() {
            Some(',') => {}
            None => break,
            Some(other) => {
                return Err(format!("unexpected {other:?} in array literal").into());
            }
        }
    }

    Ok(elements)
}
