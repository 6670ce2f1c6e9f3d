//! Identifier normalization: from human-entered names to canonical IRIs.
//!
//! Ontology identifiers cannot contain whitespace (they end up inside IRIs),
//! so every boundary where user input becomes part of an identifier passes
//! through [`canonicalize`]. A [`Namespace`] then turns canonical local names
//! into fully-qualified [`NamedNode`]s, idempotently: an already-qualified
//! value is returned unchanged.

use oxigraph::model::NamedNode;
use regex::Regex;

use crate::error::{NameError, NameResult};

/// Replace every whitespace character with an underscore.
///
/// Applied consistently to dataset folder names and to individual, class,
/// and property local names.
pub fn canonicalize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// A dataset's default namespace, discovered once from the uploaded ontology
/// document and read-only for the lifetime of the in-memory model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(base: impl Into<String>) -> Self {
        Self(base.into())
    }

    /// Discover the default namespace from an ontology document.
    ///
    /// Recognizes the Turtle `@prefix : <...>`, SPARQL-style `PREFIX : <...>`,
    /// and RDF/XML default `xmlns="..."` declarations, in that order.
    pub fn discover(document: &str) -> Option<Self> {
        let patterns = [
            r"@prefix\s+:\s*<([^>]+)>",
            r"(?i)PREFIX\s+:\s*<([^>]+)>",
            r#"xmlns\s*=\s*"([^"]+)""#,
        ];
        for pattern in patterns {
            let re = Regex::new(pattern).expect("valid namespace pattern");
            if let Some(caps) = re.captures(document) {
                return Some(Self(caps[1].to_string()));
            }
        }
        None
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build a fully-qualified IRI from a raw name.
    ///
    /// The name is canonicalized first; a name that already starts with this
    /// namespace is used as-is (idempotence).
    pub fn iri_for(&self, name: &str) -> NameResult<NamedNode> {
        let name = canonicalize(name);
        let full = if name.starts_with(self.as_str()) {
            name
        } else {
            format!("{}{name}", self.0)
        };
        NamedNode::new(&full).map_err(|e| NameError::InvalidIri {
            value: full,
            source: e,
        })
    }

    /// Strip this namespace from an IRI, falling back to the last `#` or `/`
    /// segment for IRIs outside the namespace.
    pub fn local_name<'a>(&self, iri: &'a str) -> &'a str {
        if let Some(rest) = iri.strip_prefix(self.as_str()) {
            return rest;
        }
        match iri.rfind(['#', '/']) {
            Some(pos) => &iri[pos + 1..],
            None => iri,
        }
    }
}
