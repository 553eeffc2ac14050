//! Magic method name parsing: `findBy<Field>`, `countBy<Field>`, ...

use once_cell::sync::Lazy;
use regex::Regex;

static MAGIC_METHOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(findBy|findOneBy|countBy|removeBy|removeOneBy)([A-Za-z_][A-Za-z0-9_]*)$")
        .expect("valid magic method regex")
});

/// Operation implied by a magic method prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagicOperation {
    FindBy,
    FindOneBy,
    CountBy,
    RemoveBy,
    RemoveOneBy,
}

impl MagicOperation {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::FindBy => "findBy",
            Self::FindOneBy => "findOneBy",
            Self::CountBy => "countBy",
            Self::RemoveBy => "removeBy",
            Self::RemoveOneBy => "removeOneBy",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "findBy" => Some(Self::FindBy),
            "findOneBy" => Some(Self::FindOneBy),
            "countBy" => Some(Self::CountBy),
            "removeBy" => Some(Self::RemoveBy),
            "removeOneBy" => Some(Self::RemoveOneBy),
            _ => None,
        }
    }
}

/// Parsed method name; `field` is the raw suffix before case normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicMethod<'a> {
    pub operation: MagicOperation,
    pub field: &'a str,
}

/// Splits `method` into operation and field suffix.
///
/// Returns `None` for unknown prefixes and for a bare prefix without field.
pub fn parse_magic_method(method: &str) -> Option<MagicMethod<'_>> {
    let caps = MAGIC_METHOD_RE.captures(method)?;
    let operation = MagicOperation::from_prefix(caps.get(1)?.as_str())?;
    let field = caps.get(2)?.as_str();
    Some(MagicMethod { operation, field })
}

/// Result of one magic call, shaped by its operation.
#[derive(Debug, Clone, PartialEq)]
pub enum MagicResult<R> {
    Many(Vec<R>),
    One(Option<R>),
    Count(u64),
    Removed(u64),
}

impl<R> MagicResult<R> {
    pub fn into_many(self) -> Option<Vec<R>> {
        match self {
            Self::Many(records) => Some(records),
            _ => None,
        }
    }

    pub fn into_one(self) -> Option<Option<R>> {
        match self {
            Self::One(record) => Some(record),
            _ => None,
        }
    }

    /// Count for `countBy`, affected rows for `removeBy`/`removeOneBy`.
    pub fn as_count(&self) -> Option<u64> {
        match self {
            Self::Count(value) | Self::Removed(value) => Some(*value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_magic_method, MagicOperation};

    #[test]
    fn parses_every_prefix() {
        let cases = [
            ("findByName", MagicOperation::FindBy),
            ("findOneByName", MagicOperation::FindOneBy),
            ("countByName", MagicOperation::CountBy),
            ("removeByName", MagicOperation::RemoveBy),
            ("removeOneByName", MagicOperation::RemoveOneBy),
        ];
        for (method, operation) in cases {
            let parsed = parse_magic_method(method).unwrap();
            assert_eq!(parsed.operation, operation, "{method}");
            assert_eq!(parsed.field, "Name");
        }
    }

    #[test]
    fn one_by_prefix_wins_over_by_prefix() {
        let parsed = parse_magic_method("findOneByOneByField").unwrap();
        assert_eq!(parsed.operation, MagicOperation::FindOneBy);
        assert_eq!(parsed.field, "OneByField");
    }

    #[test]
    fn rejects_unknown_prefix_and_bare_prefix() {
        assert!(parse_magic_method("deleteByName").is_none());
        assert!(parse_magic_method("findBy").is_none());
        assert!(parse_magic_method("findBy-name").is_none());
    }
}
