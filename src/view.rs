//! Read-oriented facade over one graph individual.
//!
//! An [`IndividualView`] snapshots an individual's properties in one short
//! read transaction and exposes the domain-computed electrical quantities on
//! top of them. Hierarchy navigation (`children`, `parent`, `descendants`)
//! follows the `Pertence_A` belongs-to forest, opening further short read
//! transactions as it goes.
//!
//! Every derived metric has a documented default when the backing property
//! is absent, so a freshly created individual is already computable:
//!
//! | metric | default |
//! |---|---|
//! | apparent_power | 0 |
//! | demand_factor | 1.0 |
//! | power_factor | 1.0 |
//! | usage_priority | none |
//! | generation_priority | none |
//! | priority | usage, else generation, else 1 |
//! | start_time | 00:00 |
//! | duration | 23:59 |

use oxigraph::model::vocab::{rdf, xsd};
use oxigraph::model::{NamedNode, Subject, Term};

use crate::clock::{DayMinute, DaySpan, parse_duration};
use crate::error::{MetricResult, ViewResult};
use crate::metric::round3;
use crate::naming::Namespace;
use crate::store::{GraphStore, term_text};
use crate::vocab;

/// A resolved property value: scalar, or a nested view for object properties.
#[derive(Debug)]
pub enum PropertyValue<'a> {
    Int(i64),
    Double(f64),
    Literal(String),
    Individual(Box<IndividualView<'a>>),
}

/// Read-only facade over one individual.
#[derive(Debug)]
pub struct IndividualView<'a> {
    store: &'a GraphStore,
    namespace: &'a Namespace,
    iri: NamedNode,
    local_name: String,
    primary_class: Option<NamedNode>,
    props: Vec<(NamedNode, Term)>,
}

impl<'a> IndividualView<'a> {
    /// Resolve a view from a local name or fully-qualified IRI.
    ///
    /// Returns `None` when no such individual exists. Properties are
    /// snapshotted here; later store mutations are not reflected in this
    /// view.
    pub fn resolve(
        store: &'a GraphStore,
        namespace: &'a Namespace,
        name: &str,
    ) -> ViewResult<Option<Self>> {
        let iri = namespace.iri_for(name)?;
        let quads = store.read(|txn| {
            if txn.get_individual(&iri)?.is_none() {
                return Ok(None);
            }
            Ok(Some(txn.quads_matching(Some(&iri), None, None)?))
        })?;
        let Some(quads) = quads else {
            return Ok(None);
        };

        let marker = Term::NamedNode(vocab::OWL_NAMED_INDIVIDUAL.into_owned());
        let mut primary_class = None;
        let mut props = Vec::new();
        for quad in quads {
            if quad.predicate == rdf::TYPE {
                if quad.object != marker && primary_class.is_none() {
                    if let Term::NamedNode(class) = quad.object {
                        primary_class = Some(class);
                    }
                }
            } else {
                props.push((quad.predicate, quad.object));
            }
        }

        let local_name = namespace.local_name(iri.as_str()).to_string();
        Ok(Some(Self {
            store,
            namespace,
            iri,
            local_name,
            primary_class,
            props,
        }))
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn iri(&self) -> &NamedNode {
        &self.iri
    }

    /// The individual's domain class, the `owl:NamedIndividual` marker
    /// excluded.
    pub fn primary_class(&self) -> Option<&NamedNode> {
        self.primary_class.as_ref()
    }

    pub fn primary_class_name(&self) -> Option<&str> {
        self.primary_class
            .as_ref()
            .map(|c| self.namespace.local_name(c.as_str()))
    }

    /// Whether the primary class matches the given class name.
    pub fn is_a(&self, class_name: &str) -> ViewResult<bool> {
        let class_iri = self.namespace.iri_for(class_name)?;
        Ok(self.primary_class.as_ref() == Some(&class_iri))
    }

    /// The snapshotted non-type properties, as `(name, value)` display pairs.
    pub fn property_list(&self) -> Vec<(String, String)> {
        self.props
            .iter()
            .map(|(p, o)| {
                (
                    self.namespace.local_name(p.as_str()).to_string(),
                    term_text(o),
                )
            })
            .collect()
    }

    pub fn has_property(&self, name: &str) -> ViewResult<bool> {
        let prop = self.namespace.iri_for(name)?;
        Ok(self.props.iter().any(|(p, _)| p == &prop))
    }

    /// Resolve a property to a scalar or a nested view.
    ///
    /// An object property whose target no longer resolves degrades to a
    /// literal carrying the dangling IRI.
    pub fn value(&self, name: &str) -> ViewResult<Option<PropertyValue<'a>>> {
        let prop = self.namespace.iri_for(name)?;
        let Some((_, term)) = self.props.iter().find(|(p, _)| p == &prop) else {
            return Ok(None);
        };
        Ok(Some(match term {
            Term::NamedNode(target) => {
                match Self::resolve(self.store, self.namespace, target.as_str())? {
                    Some(view) => PropertyValue::Individual(Box::new(view)),
                    None => PropertyValue::Literal(target.as_str().to_string()),
                }
            }
            Term::Literal(l) if l.datatype() == xsd::INTEGER => match l.value().parse() {
                Ok(i) => PropertyValue::Int(i),
                Err(_) => PropertyValue::Literal(l.value().to_string()),
            },
            Term::Literal(l)
                if l.datatype() == xsd::DOUBLE
                    || l.datatype() == xsd::DECIMAL
                    || l.datatype() == xsd::FLOAT =>
            {
                match l.value().parse() {
                    Ok(d) => PropertyValue::Double(d),
                    Err(_) => PropertyValue::Literal(l.value().to_string()),
                }
            }
            other => PropertyValue::Literal(term_text(other)),
        }))
    }

    // -----------------------------------------------------------------------
    // Hierarchy navigation
    // -----------------------------------------------------------------------

    /// All individuals whose `Pertence_A` value is this node.
    pub fn children(&self) -> ViewResult<Vec<IndividualView<'a>>> {
        let belongs = self.namespace.iri_for(vocab::BELONGS_TO)?;
        let me = Term::NamedNode(self.iri.clone());
        let subjects: Vec<NamedNode> = self.store.read(|txn| {
            Ok(txn
                .quads_matching(None, Some(&belongs), Some(&me))?
                .into_iter()
                .filter_map(|q| match q.subject {
                    Subject::NamedNode(n) => Some(n),
                    _ => None,
                })
                .collect())
        })?;

        let mut out = Vec::new();
        for subject in subjects {
            if let Some(view) = Self::resolve(self.store, self.namespace, subject.as_str())? {
                out.push(view);
            }
        }
        Ok(out)
    }

    /// The `Pertence_A` target, or `None` for a root.
    pub fn parent(&self) -> ViewResult<Option<IndividualView<'a>>> {
        let belongs = self.namespace.iri_for(vocab::BELONGS_TO)?;
        let Some((_, term)) = self.props.iter().find(|(p, _)| p == &belongs) else {
            return Ok(None);
        };
        match term {
            Term::NamedNode(target) => Self::resolve(self.store, self.namespace, target.as_str()),
            _ => Ok(None),
        }
    }

    pub fn is_leaf(&self) -> ViewResult<bool> {
        Ok(self.children()?.is_empty())
    }

    /// Every descendant, collected by explicit recursion over `children`.
    ///
    /// For the domain's feeder → building-system → resource forests this is
    /// the children-plus-grandchildren set the aggregations sum over.
    pub fn descendants(&self) -> ViewResult<Vec<IndividualView<'a>>> {
        let mut out = Vec::new();
        for child in self.children()? {
            let nested = child.descendants()?;
            out.push(child);
            out.extend(nested);
        }
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Stored electrical properties (with defaults)
    // -----------------------------------------------------------------------

    fn literal_value(&self, local_name: &str) -> Option<&str> {
        let prop = self.namespace.iri_for(local_name).ok()?;
        self.props.iter().find_map(|(p, o)| match o {
            Term::Literal(l) if p == &prop => Some(l.value()),
            _ => None,
        })
    }

    fn int_property(&self, local_name: &str) -> Option<i64> {
        self.literal_value(local_name)?.trim().parse().ok()
    }

    fn double_property(&self, local_name: &str) -> Option<f64> {
        self.literal_value(local_name)?.trim().parse().ok()
    }

    /// `Potência_Aparente`, in VA. 0 when absent.
    pub fn apparent_power(&self) -> i64 {
        self.int_property(vocab::APPARENT_POWER).unwrap_or(0)
    }

    /// `Fator_de_Demanda`. 1.0 when absent.
    pub fn demand_factor(&self) -> f64 {
        self.double_property(vocab::DEMAND_FACTOR).unwrap_or(1.0)
    }

    /// `Fator_de_Potência`. 1.0 when absent.
    pub fn power_factor(&self) -> f64 {
        self.double_property(vocab::POWER_FACTOR).unwrap_or(1.0)
    }

    /// `Prioridade_de_Uso`, when present.
    pub fn usage_priority(&self) -> Option<i64> {
        self.int_property(vocab::USAGE_PRIORITY)
    }

    /// `Prioridade_de_Geração`, when present.
    pub fn generation_priority(&self) -> Option<i64> {
        self.int_property(vocab::GENERATION_PRIORITY)
    }

    /// Usage priority, else generation priority, else 1.
    pub fn priority(&self) -> i64 {
        self.usage_priority()
            .or_else(|| self.generation_priority())
            .unwrap_or(1)
    }

    // -----------------------------------------------------------------------
    // Derived metrics
    // -----------------------------------------------------------------------

    /// `apparent_power × demand_factor`.
    pub fn demand(&self) -> f64 {
        self.apparent_power() as f64 * self.demand_factor()
    }

    /// `|apparent_power| × power_factor`.
    pub fn active_power(&self) -> f64 {
        (self.apparent_power() as f64).abs() * self.power_factor()
    }

    /// `sqrt(apparent² − active²)`, rounded to 3 decimals.
    ///
    /// Fails with [`MetricError::PowerTriangle`] when the stored values are
    /// inconsistent (`active > |apparent|`); no silent clamping.
    ///
    /// [`MetricError::PowerTriangle`]: crate::error::MetricError::PowerTriangle
    pub fn reactive_power(&self) -> MetricResult<f64> {
        let apparent = (self.apparent_power() as f64).abs();
        let active = self.active_power();
        if active > apparent {
            return Err(crate::error::MetricError::PowerTriangle { apparent, active });
        }
        Ok(round3((apparent * apparent - active * active).sqrt()))
    }

    /// Demand-priority index: `|demand| / usage_priority` to 3 decimals,
    /// 0 when no usage priority is set.
    pub fn rdp(&self) -> f64 {
        match self.usage_priority() {
            Some(priority) => round3(self.demand().abs() / priority as f64),
            None => 0.0,
        }
    }

    /// Generation-energy index: `|apparent × demand_factor| / generation_priority`
    /// to 3 decimals, 0 when no generation priority is set.
    pub fn der(&self) -> f64 {
        match self.generation_priority() {
            Some(priority) => {
                round3((self.apparent_power() as f64 * self.demand_factor()).abs() / priority as f64)
            }
            None => 0.0,
        }
    }

    // -----------------------------------------------------------------------
    // Activity window
    // -----------------------------------------------------------------------

    /// `Hora_de_Início` as wall-clock minutes. 00:00 when absent.
    pub fn start_time(&self) -> MetricResult<DayMinute> {
        match self.literal_value(vocab::START_TIME) {
            Some(value) => DayMinute::parse(value),
            None => Ok(DayMinute::MIDNIGHT),
        }
    }

    /// `Tempo_de_Duração` in minutes. 23:59 (1439 minutes) when absent.
    pub fn duration_minutes(&self) -> MetricResult<u32> {
        match self.literal_value(vocab::DURATION_TIME) {
            Some(value) => parse_duration(value),
            None => Ok(23 * 60 + 59),
        }
    }

    /// The node's activity interval over one day.
    pub fn span(&self) -> MetricResult<DaySpan> {
        Ok(DaySpan::new(self.start_time()?, self.duration_minutes()?))
    }

    /// `start + duration`, normalized modulo one day.
    pub fn stop_time(&self) -> MetricResult<DayMinute> {
        Ok(self.span()?.stop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::IndividualEditor;
    use crate::error::MetricError;
    use oxigraph::io::RdfFormat;

    const NS: &str = "http://example.org/demand#";

    const ONTOLOGY: &str = "@prefix : <http://example.org/demand#> .\n\
         @prefix owl: <http://www.w3.org/2002/07/owl#> .\n\
         :Alimentador a owl:Class .\n\
         :Sistema_Predial a owl:Class .\n\
         :Recurso a owl:Class .\n\
         :Pertence_A a owl:ObjectProperty .\n";

    fn fixture() -> (GraphStore, Namespace) {
        let store = GraphStore::in_memory().unwrap();
        store
            .load_document(RdfFormat::Turtle, ONTOLOGY.as_bytes())
            .unwrap();
        (store, Namespace::new(NS))
    }

    fn props(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn missing_individual_resolves_to_none() {
        let (store, ns) = fixture();
        assert!(
            IndividualView::resolve(&store, &ns, "Fantasma")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn defaults_when_properties_absent() {
        let (store, ns) = fixture();
        IndividualEditor::new(&store, &ns)
            .create("Alimentador", "F1", &[])
            .unwrap();
        let view = IndividualView::resolve(&store, &ns, "F1").unwrap().unwrap();

        assert_eq!(view.apparent_power(), 0);
        assert_eq!(view.demand_factor(), 1.0);
        assert_eq!(view.power_factor(), 1.0);
        assert_eq!(view.usage_priority(), None);
        assert_eq!(view.generation_priority(), None);
        assert_eq!(view.priority(), 1);
        assert_eq!(view.demand(), 0.0);
        assert_eq!(view.rdp(), 0.0);
        assert_eq!(view.der(), 0.0);
        assert_eq!(view.start_time().unwrap().to_string(), "00:00");
        assert_eq!(view.duration_minutes().unwrap(), 1439);
        assert_eq!(view.stop_time().unwrap().to_string(), "23:59");
    }

    #[test]
    fn primary_class_excludes_marker() {
        let (store, ns) = fixture();
        IndividualEditor::new(&store, &ns)
            .create("Alimentador", "F1", &[])
            .unwrap();
        let view = IndividualView::resolve(&store, &ns, "F1").unwrap().unwrap();
        assert_eq!(view.primary_class_name(), Some("Alimentador"));
        assert!(view.is_a("Alimentador").unwrap());
        assert!(!view.is_a("Sistema_Predial").unwrap());
    }

    #[test]
    fn derived_metrics() {
        let (store, ns) = fixture();
        IndividualEditor::new(&store, &ns)
            .create(
                "Alimentador",
                "F1",
                &props(&[
                    ("int:Potência_Aparente", "100"),
                    ("double:Fator_de_Demanda", "0.8"),
                    ("double:Fator_de_Potência", "0.6"),
                    ("int:Prioridade_de_Uso", "2"),
                ]),
            )
            .unwrap();
        let view = IndividualView::resolve(&store, &ns, "F1").unwrap().unwrap();

        assert_eq!(view.apparent_power(), 100);
        assert_eq!(view.demand(), 80.0);
        assert_eq!(view.active_power(), 60.0);
        assert_eq!(view.reactive_power().unwrap(), 80.0);
        assert_eq!(view.rdp(), 40.0);
        assert_eq!(view.der(), 0.0);
        assert_eq!(view.priority(), 2);
    }

    #[test]
    fn power_triangle_identity_holds() {
        let (store, ns) = fixture();
        IndividualEditor::new(&store, &ns)
            .create(
                "Alimentador",
                "F1",
                &props(&[
                    ("int:Potência_Aparente", "250"),
                    ("double:Fator_de_Potência", "0.92"),
                ]),
            )
            .unwrap();
        let view = IndividualView::resolve(&store, &ns, "F1").unwrap().unwrap();

        let apparent = view.apparent_power() as f64;
        let active = view.active_power();
        let reactive = view.reactive_power().unwrap();
        assert!((active * active + reactive * reactive - apparent * apparent).abs() < 1e-3);
    }

    #[test]
    fn inconsistent_power_triangle_fails_loudly() {
        let (store, ns) = fixture();
        IndividualEditor::new(&store, &ns)
            .create(
                "Alimentador",
                "F1",
                &props(&[
                    ("int:Potência_Aparente", "100"),
                    ("double:Fator_de_Potência", "1.5"),
                ]),
            )
            .unwrap();
        let view = IndividualView::resolve(&store, &ns, "F1").unwrap().unwrap();
        assert!(matches!(
            view.reactive_power(),
            Err(MetricError::PowerTriangle { .. })
        ));
    }

    #[test]
    fn negative_apparent_power_keeps_rdp_positive() {
        let (store, ns) = fixture();
        IndividualEditor::new(&store, &ns)
            .create(
                "Alimentador",
                "G1",
                &props(&[
                    ("int:Potência_Aparente", "-50"),
                    ("int:Prioridade_de_Uso", "2"),
                ]),
            )
            .unwrap();
        let view = IndividualView::resolve(&store, &ns, "G1").unwrap().unwrap();
        assert_eq!(view.demand(), -50.0);
        assert_eq!(view.rdp(), 25.0);
    }

    #[test]
    fn hierarchy_navigation() {
        let (store, ns) = fixture();
        let editor = IndividualEditor::new(&store, &ns);
        editor.create("Alimentador", "F1", &[]).unwrap();
        editor
            .create(
                "Sistema_Predial",
                "SP1",
                &props(&[("resource:Pertence_A", "F1")]),
            )
            .unwrap();
        editor
            .create("Recurso", "R1", &props(&[("resource:Pertence_A", "SP1")]))
            .unwrap();
        editor
            .create("Recurso", "R2", &props(&[("resource:Pertence_A", "SP1")]))
            .unwrap();

        let feeder = IndividualView::resolve(&store, &ns, "F1").unwrap().unwrap();
        assert!(feeder.parent().unwrap().is_none());
        assert!(!feeder.is_leaf().unwrap());

        let children = feeder.children().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].local_name(), "SP1");
        assert_eq!(
            children[0].parent().unwrap().unwrap().local_name(),
            "F1"
        );

        let mut names: Vec<_> = feeder
            .descendants()
            .unwrap()
            .iter()
            .map(|v| v.local_name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, ["R1", "R2", "SP1"]);

        let r1 = IndividualView::resolve(&store, &ns, "R1").unwrap().unwrap();
        assert!(r1.is_leaf().unwrap());
    }

    #[test]
    fn value_resolves_scalars_and_resources() {
        let (store, ns) = fixture();
        let editor = IndividualEditor::new(&store, &ns);
        editor.create("Alimentador", "F1", &[]).unwrap();
        editor
            .create(
                "Sistema_Predial",
                "SP1",
                &props(&[
                    ("int:Potência_Aparente", "42"),
                    ("double:Fator_de_Demanda", "0.5"),
                    ("literal:Descrição", "bombas"),
                    ("resource:Pertence_A", "F1"),
                ]),
            )
            .unwrap();
        let view = IndividualView::resolve(&store, &ns, "SP1").unwrap().unwrap();

        assert!(view.has_property("Potência_Aparente").unwrap());
        assert!(!view.has_property("Fator_de_Potência").unwrap());

        match view.value("Potência_Aparente").unwrap() {
            Some(PropertyValue::Int(42)) => {}
            other => panic!("expected Int(42), got {other:?}"),
        }
        match view.value("Fator_de_Demanda").unwrap() {
            Some(PropertyValue::Double(d)) => assert_eq!(d, 0.5),
            other => panic!("expected Double, got {other:?}"),
        }
        match view.value("Descrição").unwrap() {
            Some(PropertyValue::Literal(s)) => assert_eq!(s, "bombas"),
            other => panic!("expected Literal, got {other:?}"),
        }
        match view.value("Pertence_A").unwrap() {
            Some(PropertyValue::Individual(parent)) => assert_eq!(parent.local_name(), "F1"),
            other => panic!("expected Individual, got {other:?}"),
        }
        assert!(view.value("Inexistente").unwrap().is_none());
    }
}
