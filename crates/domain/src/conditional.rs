//! Conditional requests: fingerprints and the validators clients send back.
//!
//! A fingerprint is an opaque token derived only from last-modified time,
//! so it changes exactly when an order (or, for the collection, any order)
//! is mutated. Reads compare it against `If-None-Match`, writes against
//! `If-Match`.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

const EMPTY_COLLECTION: &str = "orders:empty";

/// Opaque change token for an order or for the order collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint of a single order.
    pub fn for_order(id: OrderId, updated_at: DateTime<Utc>) -> Self {
        Self(format!("order:{id}:{}", updated_at.timestamp_micros()))
    }

    /// Fingerprint of the collection, given its most recent modification.
    ///
    /// An empty collection gets a fixed sentinel.
    pub fn for_collection(last_modified: Option<DateTime<Utc>>) -> Self {
        match last_modified {
            Some(at) => Self(format!("orders:{}", at.timestamp_micros())),
            None => Self(EMPTY_COLLECTION.to_string()),
        }
    }

    /// Returns the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the token as a strong, quoted entity tag.
    pub fn to_etag(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One entity tag from a validator header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTag {
    pub fingerprint: Fingerprint,
    /// Sent with the `W/` prefix.
    pub weak: bool,
}

impl EntityTag {
    pub fn strong(fingerprint: Fingerprint) -> Self {
        Self {
            fingerprint,
            weak: false,
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        let (weak, tag) = match raw.strip_prefix("W/") {
            Some(tag) => (true, tag),
            None => (false, raw),
        };
        let tag = tag.trim_matches('"');
        if tag.is_empty() {
            return None;
        }
        Some(Self {
            fingerprint: Fingerprint::from(tag),
            weak,
        })
    }
}

/// A client-supplied validator from `If-Match` or `If-None-Match`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validator {
    /// `*`: matches any current representation.
    Any,
    /// One or more entity tags; matches if any of them equals the fingerprint.
    Tags(Vec<EntityTag>),
}

impl Validator {
    /// A validator expecting exactly this fingerprint.
    pub fn exact(fingerprint: Fingerprint) -> Self {
        Validator::Tags(vec![EntityTag::strong(fingerprint)])
    }

    /// Parses a header value.
    ///
    /// Accepts comma-separated lists, quoted or bare tags and the weak
    /// `W/` prefix. Returns None when no tag could be read.
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        if header == "*" {
            return Some(Validator::Any);
        }

        let tags: Vec<EntityTag> = header
            .split(',')
            .map(str::trim)
            .filter_map(EntityTag::parse)
            .collect();

        if tags.is_empty() {
            None
        } else {
            Some(Validator::Tags(tags))
        }
    }

    /// Weak comparison, used for `If-None-Match`. The `W/` prefix is ignored.
    pub fn matches(&self, current: &Fingerprint) -> bool {
        match self {
            Validator::Any => true,
            Validator::Tags(tags) => tags.iter().any(|tag| &tag.fingerprint == current),
        }
    }

    /// Strong comparison, used for `If-Match`. Weak tags never match.
    pub fn matches_strong(&self, current: &Fingerprint) -> bool {
        match self {
            Validator::Any => true,
            Validator::Tags(tags) => tags
                .iter()
                .any(|tag| !tag.weak && &tag.fingerprint == current),
        }
    }
}

/// Result of evaluating a conditional read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadDecision {
    /// The client's copy is current; answer without a body.
    NotModified(Fingerprint),
    /// Produce the representation and tag it with the fingerprint.
    Fresh(Fingerprint),
}

impl ReadDecision {
    /// Evaluates `If-None-Match` against the current fingerprint.
    pub fn evaluate(if_none_match: Option<&Validator>, current: Fingerprint) -> Self {
        match if_none_match {
            Some(validator) if validator.matches(&current) => ReadDecision::NotModified(current),
            _ => ReadDecision::Fresh(current),
        }
    }

    /// The fingerprint to send back either way.
    pub fn fingerprint(&self) -> &Fingerprint {
        match self {
            ReadDecision::NotModified(f) | ReadDecision::Fresh(f) => f,
        }
    }

    pub fn is_not_modified(&self) -> bool {
        matches!(self, ReadDecision::NotModified(_))
    }
}

/// Evaluates `If-Match` for a write. An absent precondition always passes.
pub fn precondition_holds(if_match: Option<&Validator>, current: &Fingerprint) -> bool {
    if_match.is_none_or(|validator| validator.matches_strong(current))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn order_fingerprint_tracks_updated_at() {
        let id = OrderId::new();
        let at = Utc::now();

        assert_eq!(Fingerprint::for_order(id, at), Fingerprint::for_order(id, at));
        assert_ne!(
            Fingerprint::for_order(id, at),
            Fingerprint::for_order(id, at + Duration::microseconds(1))
        );
        assert_ne!(
            Fingerprint::for_order(id, at),
            Fingerprint::for_order(OrderId::new(), at)
        );
    }

    #[test]
    fn empty_collection_uses_sentinel() {
        assert_eq!(Fingerprint::for_collection(None).as_str(), "orders:empty");
        assert_ne!(
            Fingerprint::for_collection(Some(Utc::now())).as_str(),
            "orders:empty"
        );
    }

    #[test]
    fn etag_is_quoted() {
        let fingerprint = Fingerprint::from("order:abc:1");
        assert_eq!(fingerprint.to_etag(), "\"order:abc:1\"");
    }

    #[test]
    fn parse_handles_lists_weak_tags_and_wildcard() {
        assert_eq!(Validator::parse("*"), Some(Validator::Any));
        assert_eq!(Validator::parse("  "), None);

        let validator = Validator::parse(r#"W/"a", "b",c"#).unwrap();
        assert!(validator.matches(&Fingerprint::from("a")));
        assert!(validator.matches(&Fingerprint::from("b")));
        assert!(validator.matches(&Fingerprint::from("c")));
        assert!(!validator.matches(&Fingerprint::from("d")));
    }

    #[test]
    fn weak_tag_matches_reads_but_not_writes() {
        let current = Fingerprint::from("order:x:2");
        let weak = Validator::parse(r#"W/"order:x:2""#).unwrap();

        assert!(ReadDecision::evaluate(Some(&weak), current.clone()).is_not_modified());
        assert!(!precondition_holds(Some(&weak), &current));

        let mixed = Validator::parse(r#"W/"order:x:1", "order:x:2""#).unwrap();
        assert!(precondition_holds(Some(&mixed), &current));
    }

    #[test]
    fn read_decision_short_circuits_on_match() {
        let current = Fingerprint::from("orders:1");
        let hit = Validator::exact(current.clone());
        let miss = Validator::exact(Fingerprint::from("orders:0"));

        assert!(ReadDecision::evaluate(Some(&hit), current.clone()).is_not_modified());
        assert!(!ReadDecision::evaluate(Some(&miss), current.clone()).is_not_modified());
        assert_eq!(
            ReadDecision::evaluate(None, current.clone()).fingerprint(),
            &current
        );
    }

    #[test]
    fn precondition_absent_or_matching_passes() {
        let current = Fingerprint::from("order:x:2");

        assert!(precondition_holds(None, &current));
        assert!(precondition_holds(Some(&Validator::Any), &current));
        assert!(precondition_holds(
            Some(&Validator::exact(current.clone())),
            &current
        ));
        assert!(!precondition_holds(
            Some(&Validator::exact(Fingerprint::from("order:x:1"))),
            &current
        ));
    }
}
