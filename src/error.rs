//! Rich diagnostic error types for the ontogrid engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so users know exactly what went wrong
//! and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the ontogrid engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes, help text, source chains) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum OntoError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Name(#[from] NameError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    View(#[from] ViewError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Metric(#[from] MetricError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Timeline(#[from] TimelineError),
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("a transaction is already open on this store")]
    #[diagnostic(
        code(ontogrid::store::concurrency),
        help(
            "The store allows at most one open transaction at a time. \
             This is a programming error, not a recoverable condition: \
             finish (commit, abort, or drop) the current transaction before \
             opening another."
        )
    )]
    Concurrency,

    #[error("write attempted inside a read transaction")]
    #[diagnostic(
        code(ontogrid::store::read_only),
        help("Open the transaction with `TxnMode::Write` to stage inserts or removals.")
    )]
    ReadOnly,

    #[error("storage backend error: {source}")]
    #[diagnostic(
        code(ontogrid::store::backend),
        help(
            "The underlying oxigraph store failed. Check that the dataset \
             directory exists, has correct permissions, and that the disk is \
             not full."
        )
    )]
    Backend {
        #[from]
        source: oxigraph::store::StorageError,
    },

    #[error("failed to load ontology document: {message}")]
    #[diagnostic(
        code(ontogrid::store::load),
        help(
            "The document could not be parsed into the store. Verify that it \
             is valid RDF/XML, Turtle, or N-Triples and matches its file extension."
        )
    )]
    Load { message: String },
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Naming errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum NameError {
    #[error("invalid IRI: \"{value}\"")]
    #[diagnostic(
        code(ontogrid::name::invalid_iri),
        help(
            "The name could not be turned into a valid IRI even after \
             canonicalization. Remove characters that are illegal in IRIs \
             (angle brackets, quotes, control characters)."
        )
    )]
    InvalidIri {
        value: String,
        #[source]
        source: oxigraph::model::IriParseError,
    },
}

pub type NameResult<T> = std::result::Result<T, NameError>;

// ---------------------------------------------------------------------------
// Dataset errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DatasetError {
    #[error("dataset already exists: \"{name}\"")]
    #[diagnostic(
        code(ontogrid::dataset::already_exists),
        help("Pick a different dataset name, or destroy the existing dataset first.")
    )]
    AlreadyExists { name: String },

    #[error("dataset not found: \"{name}\"")]
    #[diagnostic(
        code(ontogrid::dataset::not_found),
        help("Create it with `ontogrid dataset create` or check the datasets directory.")
    )]
    NotFound { name: String },

    #[error("I/O error on {path}: {source}")]
    #[diagnostic(
        code(ontogrid::dataset::io),
        help(
            "A filesystem operation on the dataset folder failed. Check that \
             the datasets directory exists and you have write permissions."
        )
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no default namespace found in \"{file}\"")]
    #[diagnostic(
        code(ontogrid::dataset::no_namespace),
        help(
            "The ontology document must declare a default namespace prefix \
             (`@prefix : <...>` in Turtle, or a default `xmlns` in RDF/XML). \
             All individual, class, and property names are resolved against it."
        )
    )]
    NoNamespace { file: String },

    #[error("unsupported document format: \"{file}\"")]
    #[diagnostic(
        code(ontogrid::dataset::unsupported_format),
        help("Supported extensions: .owl/.rdf/.xml (RDF/XML), .ttl (Turtle), .nt (N-Triples).")
    )]
    UnsupportedFormat { file: String },

    #[error("dataset config error: {message}")]
    #[diagnostic(
        code(ontogrid::dataset::config),
        help(
            "The dataset's config.toml could not be read or written. \
             If it was edited by hand, restore it or recreate the dataset."
        )
    )]
    Config { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Name(#[from] NameError),
}

pub type DatasetResult<T> = std::result::Result<T, DatasetError>;

// ---------------------------------------------------------------------------
// Editor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EditError {
    #[error("ontology class does not exist: \"{name}\"")]
    #[diagnostic(
        code(ontogrid::edit::unknown_class),
        help(
            "Individuals can only be created under a class already present in \
             the model. List available classes with `ontogrid dataset info`."
        )
    )]
    UnknownClass { name: String },

    #[error("individual does not exist: \"{name}\"")]
    #[diagnostic(
        code(ontogrid::edit::not_found),
        help("Check the name, or list individuals with `ontogrid individual list`.")
    )]
    NotFound { name: String },

    #[error("property key has no name: \"{key}\"")]
    #[diagnostic(
        code(ontogrid::edit::empty_property),
        help("Property keys look like `int:Potência_Aparente` or `resource:Pertence_A`.")
    )]
    EmptyPropertyName { key: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Name(#[from] NameError),
}

pub type EditResult<T> = std::result::Result<T, EditError>;

// ---------------------------------------------------------------------------
// View errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ViewError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Name(#[from] NameError),
}

pub type ViewResult<T> = std::result::Result<T, ViewError>;

// ---------------------------------------------------------------------------
// Query errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum QueryError {
    #[error("query failed: {message}")]
    #[diagnostic(
        code(ontogrid::query::parse),
        help(
            "The SPARQL body could not be parsed or evaluated. Note that the \
             dataset's own prefix declarations are prepended automatically."
        )
    )]
    Parse { message: String },

    #[error("unsupported query form: {message}")]
    #[diagnostic(
        code(ontogrid::query::unsupported),
        help("Only SELECT and ASK queries are supported at this boundary.")
    )]
    Unsupported { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

pub type QueryResult<T> = std::result::Result<T, QueryError>;

// ---------------------------------------------------------------------------
// Metric errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum MetricError {
    #[error(
        "inconsistent power triangle: active power {active} exceeds apparent power magnitude {apparent}"
    )]
    #[diagnostic(
        code(ontogrid::metric::power_triangle),
        help(
            "Reactive power is sqrt(apparent² − active²), which requires \
             |active| ≤ |apparent|. Check the individual's Potência_Aparente \
             and Fator_de_Potência values; a power factor outside [0, 1] \
             produces this condition."
        )
    )]
    PowerTriangle { apparent: f64, active: f64 },

    #[error("invalid time literal: \"{value}\"")]
    #[diagnostic(
        code(ontogrid::metric::bad_time),
        help("Activity times are wall-clock strings in HH:MM form, e.g. \"08:30\".")
    )]
    BadTime { value: String },

    #[error("unknown metric: \"{value}\"")]
    #[diagnostic(
        code(ontogrid::metric::unknown),
        help(
            "Valid metrics: apparent-power, demand, active-power, \
             reactive-power, rdp, der."
        )
    )]
    UnknownMetric { value: String },
}

pub type MetricResult<T> = std::result::Result<T, MetricError>;

// ---------------------------------------------------------------------------
// Timeline errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TimelineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    View(#[from] ViewError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Metric(#[from] MetricError),
}

pub type TimelineResult<T> = std::result::Result<T, TimelineError>;

/// Convenience alias for functions returning ontogrid results.
pub type OntoResult<T> = std::result::Result<T, OntoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts_to_onto_error() {
        let err = StoreError::Concurrency;
        let onto: OntoError = err.into();
        assert!(matches!(onto, OntoError::Store(StoreError::Concurrency)));
    }

    #[test]
    fn edit_error_wraps_store_error() {
        let store_err = StoreError::ReadOnly;
        let edit_err: EditError = store_err.into();
        assert!(matches!(edit_err, EditError::Store(StoreError::ReadOnly)));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = MetricError::PowerTriangle {
            apparent: 100.0,
            active: 120.0,
        };
        let msg = format!("{err}");
        assert!(msg.contains("100"));
        assert!(msg.contains("120"));
    }
}
