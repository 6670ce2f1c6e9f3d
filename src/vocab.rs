//! Vocabulary constants: OWL terms plus the demand-ontology local names.
//!
//! The RDF/RDFS/XSD vocabularies come from `oxigraph::model::vocab`; OWL is
//! not shipped there, so the handful of terms we need is declared here.
//! Domain property and class names are local names only — they are resolved
//! against each dataset's own namespace at runtime.

use oxigraph::model::NamedNodeRef;

/// OWL namespace.
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";

/// `owl:Class`.
pub const OWL_CLASS: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Class");

/// `owl:NamedIndividual` — the administrative marker class every individual
/// is linked to. Excluded from domain-facing class listings.
pub const OWL_NAMED_INDIVIDUAL: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#NamedIndividual");

/// `owl:ObjectProperty`.
pub const OWL_OBJECT_PROPERTY: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#ObjectProperty");

/// `owl:DatatypeProperty`.
pub const OWL_DATATYPE_PROPERTY: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#DatatypeProperty");

// ---------------------------------------------------------------------------
// Demand-ontology local names
// ---------------------------------------------------------------------------

/// Apparent power in VA (`xsd:integer`).
pub const APPARENT_POWER: &str = "Potência_Aparente";

/// Demand factor in [0, 1] (`xsd:double`).
pub const DEMAND_FACTOR: &str = "Fator_de_Demanda";

/// Power factor in [0, 1] (`xsd:double`).
pub const POWER_FACTOR: &str = "Fator_de_Potência";

/// Usage priority for load-shedding ranking (`xsd:integer`).
pub const USAGE_PRIORITY: &str = "Prioridade_de_Uso";

/// Generation priority for curtailment ranking (`xsd:integer`).
pub const GENERATION_PRIORITY: &str = "Prioridade_de_Geração";

/// The distinguished hierarchy edge from a child individual to its parent.
pub const BELONGS_TO: &str = "Pertence_A";

/// Activity start, wall-clock `HH:MM` literal.
pub const START_TIME: &str = "Hora_de_Início";

/// Activity duration, `HH:MM` literal interpreted as total minutes.
pub const DURATION_TIME: &str = "Tempo_de_Duração";

/// Class of feeder individuals.
pub const FEEDER_CLASS: &str = "Alimentador";

/// Class of building-system individuals.
pub const BUILDING_SYSTEM_CLASS: &str = "Sistema_Predial";
