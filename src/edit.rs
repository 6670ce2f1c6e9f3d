//! Individual editing: create, update, destroy inside one write transaction.
//!
//! Form-level property keys arrive as `"<kind>:<name>"` strings
//! (`int:Potência_Aparente`, `resource:Pertence_A`, `destroy:Fator_de_Demanda`).
//! They are parsed once at this boundary into a [`PropertyKey`] and consumed
//! uniformly by the create and update paths.
//!
//! Every operation runs inside exactly one write transaction; an early error
//! return drops the transaction, which aborts it — no partial mutation can
//! reach the store.

use oxigraph::model::vocab::rdf;
use oxigraph::model::{Literal, NamedNode, Quad, Subject, Term};

use crate::error::{EditError, EditResult};
use crate::naming::Namespace;
use crate::store::{GraphStore, Transaction, TxnMode, default_quad};
use crate::vocab;

/// Coercion kind carried by a property key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// `xsd:integer` literal.
    Int,
    /// `xsd:double` literal.
    Double,
    /// String literal.
    Literal,
    /// Untyped (plain) literal — the default when no kind token matches.
    Untyped,
    /// Object property: the value names another individual.
    Resource,
    /// Remove the property's current value (update only).
    Destroy,
}

/// A parsed property key: coercion kind plus bare local name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyKey {
    pub kind: PropertyKind,
    pub local_name: String,
}

impl PropertyKey {
    /// Parse a wire-format key.
    ///
    /// Kind tokens are matched by containment (`"integer"` selects `Int`,
    /// `"string"` selects `Literal`) because the form layer derives them from
    /// datatype range names. A key without a `:` separator is an untyped key.
    pub fn parse(raw: &str) -> EditResult<Self> {
        let (kind, name) = match raw.split_once(':') {
            Some((token, name)) => {
                let token = token.trim().to_lowercase();
                let kind = if token.contains("destroy") {
                    PropertyKind::Destroy
                } else if token.contains("resource") {
                    PropertyKind::Resource
                } else if token.contains("int") {
                    PropertyKind::Int
                } else if token.contains("double") || token.contains("float") {
                    PropertyKind::Double
                } else if token.contains("literal") || token.contains("string") {
                    PropertyKind::Literal
                } else {
                    PropertyKind::Untyped
                };
                (kind, name)
            }
            None => (PropertyKind::Untyped, raw),
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(EditError::EmptyPropertyName {
                key: raw.to_string(),
            });
        }
        Ok(Self {
            kind,
            local_name: name.to_string(),
        })
    }
}

/// Editor for typed individuals, built on one [`GraphStore`].
pub struct IndividualEditor<'a> {
    store: &'a GraphStore,
    namespace: &'a Namespace,
}

impl<'a> IndividualEditor<'a> {
    pub fn new(store: &'a GraphStore, namespace: &'a Namespace) -> Self {
        Self { store, namespace }
    }

    /// Create an individual under `class_name` with the given properties.
    ///
    /// The class must already exist in the model; the individual is linked
    /// both to it and to the `owl:NamedIndividual` marker class (required by
    /// the store's typing rules). Returns the new individual's IRI.
    pub fn create(
        &self,
        class_name: &str,
        local_name: &str,
        properties: &[(String, String)],
    ) -> EditResult<NamedNode> {
        let mut txn = self.store.begin(TxnMode::Write)?;

        let class_iri = self.namespace.iri_for(class_name)?;
        let Some(class) = txn.get_class(&class_iri)? else {
            txn.abort();
            return Err(EditError::UnknownClass {
                name: class_name.to_string(),
            });
        };

        let iri = self.namespace.iri_for(local_name)?;
        txn.create_individual(&iri, &class)?;
        let marker = txn.get_or_create_class(&vocab::OWL_NAMED_INDIVIDUAL.into_owned())?;
        txn.create_individual(&iri, &marker)?;

        for (key, value) in properties {
            let key = PropertyKey::parse(key)?;
            if key.kind == PropertyKind::Destroy {
                tracing::warn!(property = %key.local_name, "destroy key ignored on create");
                continue;
            }
            let prop = txn.property(&self.namespace.iri_for(&key.local_name)?);
            let object = self.coerce(&txn, &key, value)?;
            txn.insert(default_quad(iri.clone(), prop.0, object))?;
        }

        txn.commit()?;
        tracing::info!(individual = %iri, class = class_name, "created individual");
        Ok(iri)
    }

    /// Update an individual: optional rename-with-relink, class reassignment,
    /// and property changes. Returns the (possibly renamed) IRI.
    ///
    /// Properties are single-valued from the editor's perspective: a new
    /// value overwrites the existing one when they differ, and is added when
    /// absent. The underlying store permits multi-valued properties; this
    /// contract is deliberate.
    pub fn update(
        &self,
        original_name: &str,
        new_name: &str,
        class_name: &str,
        properties: &[(String, String)],
    ) -> EditResult<NamedNode> {
        let mut txn = self.store.begin(TxnMode::Write)?;

        let old_iri = self.namespace.iri_for(original_name)?;
        if txn.get_individual(&old_iri)?.is_none() {
            txn.abort();
            return Err(EditError::NotFound {
                name: original_name.to_string(),
            });
        }

        let new_iri = self.namespace.iri_for(new_name)?;
        let iri = if new_iri != old_iri {
            // Rename-with-relink: re-point every triple referencing the old
            // identifier, whatever position it appears in. Not a copy — all
            // existing edges survive under the new identifier.
            for quad in txn.quads_mentioning(&old_iri)? {
                txn.remove(quad.clone())?;
                txn.insert(rename_quad(quad, &old_iri, &new_iri))?;
            }
            match txn.get_individual(&new_iri)? {
                Some(individual) => individual.iri().clone(),
                None => {
                    txn.abort();
                    return Err(EditError::NotFound {
                        name: new_name.to_string(),
                    });
                }
            }
        } else {
            old_iri
        };

        self.reassign_class(&mut txn, &iri, class_name)?;

        for (key, value) in properties {
            let key = PropertyKey::parse(key)?;
            let prop = txn.property(&self.namespace.iri_for(&key.local_name)?);
            let existing = txn.quads_matching(Some(&iri), Some(&prop.0), None)?;

            if key.kind == PropertyKind::Destroy {
                for quad in existing {
                    txn.remove(quad)?;
                }
                continue;
            }

            let object = self.coerce(&txn, &key, value)?;
            if existing.iter().any(|q| q.object == object) {
                continue;
            }
            for quad in existing {
                txn.remove(quad)?;
            }
            txn.insert(default_quad(iri.clone(), prop.0, object))?;
        }

        txn.commit()?;
        tracing::info!(individual = %iri, "updated individual");
        Ok(iri)
    }

    /// Remove an individual and every triple referencing it.
    pub fn destroy(&self, local_name: &str) -> EditResult<()> {
        let mut txn = self.store.begin(TxnMode::Write)?;

        let iri = self.namespace.iri_for(local_name)?;
        if txn.get_individual(&iri)?.is_none() {
            txn.abort();
            return Err(EditError::NotFound {
                name: local_name.to_string(),
            });
        }

        for quad in txn.quads_mentioning(&iri)? {
            txn.remove(quad)?;
        }

        txn.commit()?;
        tracing::info!(individual = %iri, "destroyed individual");
        Ok(())
    }

    /// Replace the primary `rdf:type` edge when the class changed, guarding
    /// against the `owl:NamedIndividual` marker matching as the primary class.
    fn reassign_class(
        &self,
        txn: &mut Transaction<'_>,
        iri: &NamedNode,
        class_name: &str,
    ) -> EditResult<()> {
        let class_iri = self.namespace.iri_for(class_name)?;
        let Some(class) = txn.get_class(&class_iri)? else {
            return Err(EditError::UnknownClass {
                name: class_name.to_string(),
            });
        };

        let marker = Term::NamedNode(vocab::OWL_NAMED_INDIVIDUAL.into_owned());
        let target = Term::NamedNode(class.0.clone());
        let types = txn.quads_matching(Some(iri), Some(&rdf::TYPE.into_owned()), None)?;
        let primary = types.into_iter().find(|q| q.object != marker);

        match primary {
            Some(quad) if quad.object == target => {}
            Some(quad) => {
                txn.remove(quad)?;
                txn.insert(default_quad(iri.clone(), rdf::TYPE.into_owned(), target))?;
            }
            None => {
                txn.insert(default_quad(iri.clone(), rdf::TYPE.into_owned(), target))?;
            }
        }
        Ok(())
    }

    /// Coerce a raw value per the key's kind.
    ///
    /// Numeric coercion is forgiving (unparseable input becomes 0), matching
    /// the form layer's behavior; `resource` values must name an existing
    /// individual.
    fn coerce(&self, txn: &Transaction<'_>, key: &PropertyKey, value: &str) -> EditResult<Term> {
        Ok(match key.kind {
            PropertyKind::Resource => {
                let target = self.namespace.iri_for(value)?;
                let Some(resource) = txn.get_individual(&target)? else {
                    return Err(EditError::NotFound {
                        name: value.to_string(),
                    });
                };
                Term::NamedNode(resource.iri().clone())
            }
            PropertyKind::Int => Term::Literal(Literal::from(
                value.trim().parse::<i64>().unwrap_or(0),
            )),
            PropertyKind::Double => Term::Literal(Literal::from(
                value.trim().parse::<f64>().unwrap_or(0.0),
            )),
            PropertyKind::Literal | PropertyKind::Untyped => {
                Term::Literal(Literal::from(value))
            }
            PropertyKind::Destroy => unreachable!("destroy keys are handled before coercion"),
        })
    }
}

fn rename_quad(quad: Quad, old: &NamedNode, new: &NamedNode) -> Quad {
    let subject = match quad.subject {
        Subject::NamedNode(n) if &n == old => Subject::NamedNode(new.clone()),
        other => other,
    };
    let predicate = if &quad.predicate == old {
        new.clone()
    } else {
        quad.predicate
    };
    let object = match quad.object {
        Term::NamedNode(n) if &n == old => Term::NamedNode(new.clone()),
        other => other,
    };
    Quad::new(subject, predicate, object, quad.graph_name)
}
