//! # ontogrid
//!
//! An ontology-backed demand management core for electrical installations.
//! Installations are modeled as OWL individuals in a belongs-to forest
//! (feeders at the roots, building systems and resources below), persisted
//! in an oxigraph triple store per dataset.
//!
//! ## Architecture
//!
//! - **Datasets** (`dataset`): one directory + persistent store per uploaded
//!   ontology document, with namespace discovery and SPARQL access
//! - **Editing** (`edit`): transactional create/update/destroy of typed
//!   individuals, including rename-with-relink
//! - **Views** (`view`): read facades computing the electrical quantities
//!   (demand, active/reactive power, priority indices) with defaults
//! - **Timelines** (`timeline`): daily metric curves at 15-minute resolution
//!   over each node's activity span
//!
//! ## Library usage
//!
//! ```no_run
//! use std::path::Path;
//! use ontogrid::dataset::Dataset;
//! use ontogrid::metric::Metric;
//! use ontogrid::timeline::timelines;
//!
//! let doc = std::fs::read("demand.owl").unwrap();
//! let ds = Dataset::create(Path::new("datasets"), "campus", "demand.owl", &doc).unwrap();
//! ds.editor().create("Alimentador", "F1", &[
//!     ("int:Potência_Aparente".to_string(), "100".to_string()),
//!     ("double:Fator_de_Demanda".to_string(), "0.8".to_string()),
//! ]).unwrap();
//! let feeder = ds.individual("F1").unwrap().unwrap();
//! assert_eq!(feeder.demand(), 80.0);
//! let curves = timelines(&feeder, Metric::Demand, true).unwrap();
//! assert_eq!(curves[0].points.len(), 96);
//! ```

pub mod clock;
pub mod dataset;
pub mod edit;
pub mod error;
pub mod metric;
pub mod naming;
pub mod store;
pub mod timeline;
pub mod view;
pub mod vocab;

pub use error::{OntoError, OntoResult};
