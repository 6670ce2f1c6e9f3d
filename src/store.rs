//! Persistent graph store backed by oxigraph, with explicit transactions.
//!
//! [`GraphStore`] owns one oxigraph [`Store`] (the dataset's triple store)
//! and enforces the transaction discipline the editors rely on:
//!
//! - at most one open [`Transaction`] per store — a second `begin` fails with
//!   [`StoreError::Concurrency`] and is deliberately never caught;
//! - write transactions never auto-commit: staged inserts/removals are
//!   buffered and applied atomically on [`Transaction::commit`], or discarded
//!   on [`Transaction::abort`];
//! - dropping a transaction on any exit path ends it (an uncommitted write
//!   transaction aborts), so error returns cannot leak partial mutations.
//!
//! Reads inside a transaction overlay the staged writes onto committed state,
//! so an editor sees its own pending changes.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use oxigraph::io::RdfFormat;
use oxigraph::model::vocab::rdf;
use oxigraph::model::{GraphName, GraphNameRef, NamedNode, Quad, Subject, Term};
use oxigraph::sparql::QueryResults;
use oxigraph::store::{StorageError, Store};
use serde::Serialize;

use crate::error::{QueryError, QueryResult, StoreError, StoreResult};
use crate::vocab;

/// Transaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnMode {
    Read,
    Write,
}

/// A class node (`rdf:type owl:Class`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OntClass(pub NamedNode);

/// A property node. Construction never fails; whether the property is
/// declared in the model is not checked, mirroring the permissive lookup
/// the editors expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OntProperty(pub NamedNode);

/// An individual node (has at least one `rdf:type` edge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OntIndividual(pub NamedNode);

impl OntIndividual {
    pub fn iri(&self) -> &NamedNode {
        &self.0
    }
}

/// One row of SPARQL SELECT results: ordered `(variable, value)` bindings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectRow {
    pub bindings: Vec<(String, String)>,
}

/// The dataset's persistent triple store.
pub struct GraphStore {
    inner: Store,
    txn_open: AtomicBool,
}

impl GraphStore {
    /// Create an in-memory store (no persistence). Used by tests and merges.
    pub fn in_memory() -> StoreResult<Self> {
        let inner = Store::new()?;
        Ok(Self {
            inner,
            txn_open: AtomicBool::new(false),
        })
    }

    /// Open or create a persistent store at the given directory.
    pub fn open(path: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(path).map_err(StorageError::from)?;
        let inner = Store::open(path)?;
        Ok(Self {
            inner,
            txn_open: AtomicBool::new(false),
        })
    }

    /// Begin a transaction.
    ///
    /// Fails with [`StoreError::Concurrency`] if one is already open on this
    /// store. Overlapping transactions are a programming error; the failure
    /// is meant to surface immediately rather than queue.
    pub fn begin(&self, mode: TxnMode) -> StoreResult<Transaction<'_>> {
        if self.txn_open.swap(true, Ordering::AcqRel) {
            return Err(StoreError::Concurrency);
        }
        Ok(Transaction {
            store: self,
            mode,
            inserts: Vec::new(),
            removals: Vec::new(),
        })
    }

    /// Run `f` inside a short-lived read transaction.
    ///
    /// Collect what you need and return it — resolving further nodes inside
    /// the closure would try to open a second transaction.
    pub fn read<T>(&self, f: impl FnOnce(&Transaction<'_>) -> StoreResult<T>) -> StoreResult<T> {
        let txn = self.begin(TxnMode::Read)?;
        f(&txn)
    }

    /// Total triple count.
    pub fn size(&self) -> StoreResult<usize> {
        Ok(self.inner.len()?)
    }

    /// Bulk-load an ontology document into the default graph.
    ///
    /// Adding is a union: triples already present stay, new ones are added.
    /// Both the dataset-creation and merge paths go through here.
    pub fn load_document(&self, format: RdfFormat, data: &[u8]) -> StoreResult<()> {
        self.inner
            .load_from_reader(format, data)
            .map_err(|e| StoreError::Load {
                message: e.to_string(),
            })
    }

    /// Execute a SPARQL SELECT or ASK query inside an implicit read snapshot.
    ///
    /// Parse and evaluation failures both surface as [`QueryError::Parse`];
    /// the dataset query boundary converts that into display content, every
    /// other caller propagates it.
    pub fn query(&self, sparql: &str) -> QueryResult<Vec<SelectRow>> {
        let results = self.inner.query(sparql).map_err(|e| QueryError::Parse {
            message: e.to_string(),
        })?;

        match results {
            QueryResults::Solutions(solutions) => {
                let mut rows = Vec::new();
                for solution in solutions {
                    let solution = solution.map_err(|e| QueryError::Parse {
                        message: e.to_string(),
                    })?;
                    let bindings = solution
                        .iter()
                        .map(|(var, term)| (var.as_str().to_string(), term_text(term)))
                        .collect();
                    rows.push(SelectRow { bindings });
                }
                Ok(rows)
            }
            QueryResults::Boolean(b) => Ok(vec![SelectRow {
                bindings: vec![("result".to_string(), b.to_string())],
            }]),
            QueryResults::Graph(_) => Err(QueryError::Unsupported {
                message: "CONSTRUCT/DESCRIBE are not supported here".to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("txn_open", &self.txn_open.load(Ordering::Acquire))
            .finish()
    }
}

/// Plain text rendering of a term for result rows: IRIs without brackets,
/// literals without quotes or datatype suffix.
pub(crate) fn term_text(term: &Term) -> String {
    match term {
        Term::NamedNode(n) => n.as_str().to_string(),
        Term::Literal(l) => l.value().to_string(),
        other => other.to_string(),
    }
}

/// An open transaction: staged writes over a committed snapshot.
pub struct Transaction<'a> {
    store: &'a GraphStore,
    mode: TxnMode,
    inserts: Vec<Quad>,
    removals: Vec<Quad>,
}

impl Transaction<'_> {
    pub fn mode(&self) -> TxnMode {
        self.mode
    }

    /// Stage a quad insertion.
    pub fn insert(&mut self, quad: Quad) -> StoreResult<()> {
        if self.mode != TxnMode::Write {
            return Err(StoreError::ReadOnly);
        }
        if let Some(pos) = self.removals.iter().position(|q| q == &quad) {
            self.removals.remove(pos);
        } else if !self.inserts.contains(&quad) {
            self.inserts.push(quad);
        }
        Ok(())
    }

    /// Stage a quad removal.
    pub fn remove(&mut self, quad: Quad) -> StoreResult<()> {
        if self.mode != TxnMode::Write {
            return Err(StoreError::ReadOnly);
        }
        if let Some(pos) = self.inserts.iter().position(|q| q == &quad) {
            self.inserts.remove(pos);
        } else if !self.removals.contains(&quad) {
            self.removals.push(quad);
        }
        Ok(())
    }

    /// All default-graph quads matching the pattern, with staged writes
    /// overlaid: staged removals are hidden, staged inserts are visible.
    pub fn quads_matching(
        &self,
        subject: Option<&NamedNode>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
    ) -> StoreResult<Vec<Quad>> {
        let mut out = Vec::new();
        let iter = self.store.inner.quads_for_pattern(
            subject.map(|n| n.as_ref().into()),
            predicate.map(|n| n.as_ref()),
            object.map(|t| t.as_ref()),
            Some(GraphNameRef::DefaultGraph),
        );
        for quad in iter {
            let quad = quad?;
            if !self.removals.contains(&quad) {
                out.push(quad);
            }
        }
        for quad in &self.inserts {
            if pattern_matches(quad, subject, predicate, object) && !out.contains(quad) {
                out.push(quad.clone());
            }
        }
        Ok(out)
    }

    /// Every quad that mentions `iri` in subject, predicate, or object
    /// position. The rename-with-relink path walks this set.
    pub fn quads_mentioning(&self, iri: &NamedNode) -> StoreResult<Vec<Quad>> {
        let mut out = self.quads_matching(Some(iri), None, None)?;
        let as_term = Term::NamedNode(iri.clone());
        for quad in self.quads_matching(None, None, Some(&as_term))? {
            if !out.contains(&quad) {
                out.push(quad);
            }
        }
        for quad in self.quads_matching(None, Some(iri), None)? {
            if !out.contains(&quad) {
                out.push(quad);
            }
        }
        Ok(out)
    }

    /// Resolve an individual: present iff it has at least one `rdf:type` edge.
    pub fn get_individual(&self, iri: &NamedNode) -> StoreResult<Option<OntIndividual>> {
        let types = self.quads_matching(Some(iri), Some(&rdf_type()), None)?;
        Ok((!types.is_empty()).then(|| OntIndividual(iri.clone())))
    }

    /// Resolve a class: present iff typed `owl:Class`.
    pub fn get_class(&self, iri: &NamedNode) -> StoreResult<Option<OntClass>> {
        let marker = Term::NamedNode(vocab::OWL_CLASS.into_owned());
        let quads = self.quads_matching(Some(iri), Some(&rdf_type()), Some(&marker))?;
        Ok((!quads.is_empty()).then(|| OntClass(iri.clone())))
    }

    /// Resolve a class, declaring it when absent.
    pub fn get_or_create_class(&mut self, iri: &NamedNode) -> StoreResult<OntClass> {
        if let Some(class) = self.get_class(iri)? {
            return Ok(class);
        }
        self.insert(default_quad(
            iri.clone(),
            rdf_type(),
            Term::NamedNode(vocab::OWL_CLASS.into_owned()),
        ))?;
        Ok(OntClass(iri.clone()))
    }

    /// Link `iri` to `class` via `rdf:type`, creating the individual.
    pub fn create_individual(
        &mut self,
        iri: &NamedNode,
        class: &OntClass,
    ) -> StoreResult<OntIndividual> {
        self.insert(default_quad(
            iri.clone(),
            rdf_type(),
            Term::NamedNode(class.0.clone()),
        ))?;
        Ok(OntIndividual(iri.clone()))
    }

    /// Property lookup. Never fails — see [`OntProperty`].
    pub fn property(&self, iri: &NamedNode) -> OntProperty {
        OntProperty(iri.clone())
    }

    /// Apply staged writes atomically. A transaction with no staged writes
    /// commits as a no-op.
    pub fn commit(self) -> StoreResult<()> {
        if !self.inserts.is_empty() || !self.removals.is_empty() {
            self.store.inner.transaction(|mut txn| {
                for quad in &self.removals {
                    txn.remove(quad.as_ref())?;
                }
                for quad in &self.inserts {
                    txn.insert(quad.as_ref())?;
                }
                Ok::<(), StorageError>(())
            })?;
        }
        Ok(())
    }

    /// Discard staged writes. Equivalent to dropping the transaction, spelled
    /// out for call sites where the abort is the point.
    pub fn abort(self) {}
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        // Ends the transaction on every exit path, commit and abort included.
        self.store.txn_open.store(false, Ordering::Release);
    }
}

fn rdf_type() -> NamedNode {
    rdf::TYPE.into_owned()
}

/// Build a default-graph quad.
pub fn default_quad(subject: NamedNode, predicate: NamedNode, object: Term) -> Quad {
    Quad::new(subject, predicate, object, GraphName::DefaultGraph)
}

fn pattern_matches(
    quad: &Quad,
    subject: Option<&NamedNode>,
    predicate: Option<&NamedNode>,
    object: Option<&Term>,
) -> bool {
    if let Some(s) = subject {
        match &quad.subject {
            Subject::NamedNode(n) if n == s => {}
            _ => return false,
        }
    }
    if let Some(p) = predicate {
        if &quad.predicate != p {
            return false;
        }
    }
    if let Some(o) = object {
        if &quad.object != o {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::Literal;

    fn node(s: &str) -> NamedNode {
        NamedNode::new(format!("http://example.org/demand#{s}")).unwrap()
    }

    fn quad(s: &str, p: &str, o: &str) -> Quad {
        default_quad(node(s), node(p), Term::NamedNode(node(o)))
    }

    #[test]
    fn overlapping_transactions_are_rejected() {
        let store = GraphStore::in_memory().unwrap();
        let txn = store.begin(TxnMode::Read).unwrap();
        let second = store.begin(TxnMode::Write);
        assert!(matches!(second, Err(StoreError::Concurrency)));
        drop(txn);
        // After the first ends, a new one may begin.
        assert!(store.begin(TxnMode::Write).is_ok());
    }

    #[test]
    fn writes_on_read_transaction_fail() {
        let store = GraphStore::in_memory().unwrap();
        let mut txn = store.begin(TxnMode::Read).unwrap();
        let err = txn.insert(quad("a", "p", "b"));
        assert!(matches!(err, Err(StoreError::ReadOnly)));
    }

    #[test]
    fn commit_applies_staged_writes() {
        let store = GraphStore::in_memory().unwrap();
        let mut txn = store.begin(TxnMode::Write).unwrap();
        txn.insert(quad("a", "p", "b")).unwrap();
        txn.insert(quad("b", "p", "c")).unwrap();
        txn.commit().unwrap();
        assert_eq!(store.size().unwrap(), 2);
    }

    #[test]
    fn abort_discards_staged_writes() {
        let store = GraphStore::in_memory().unwrap();
        let mut txn = store.begin(TxnMode::Write).unwrap();
        txn.insert(quad("a", "p", "b")).unwrap();
        txn.abort();
        assert_eq!(store.size().unwrap(), 0);
    }

    #[test]
    fn dropped_transaction_aborts() {
        let store = GraphStore::in_memory().unwrap();
        {
            let mut txn = store.begin(TxnMode::Write).unwrap();
            txn.insert(quad("a", "p", "b")).unwrap();
            // Falls out of scope without commit.
        }
        assert_eq!(store.size().unwrap(), 0);
        assert!(store.begin(TxnMode::Read).is_ok());
    }

    #[test]
    fn overlay_shows_pending_inserts_and_hides_pending_removals() {
        let store = GraphStore::in_memory().unwrap();
        let mut txn = store.begin(TxnMode::Write).unwrap();
        txn.insert(quad("a", "p", "b")).unwrap();
        txn.commit().unwrap();

        let mut txn = store.begin(TxnMode::Write).unwrap();
        txn.remove(quad("a", "p", "b")).unwrap();
        txn.insert(quad("a", "p", "c")).unwrap();

        let visible = txn.quads_matching(Some(&node("a")), None, None).unwrap();
        assert_eq!(visible, vec![quad("a", "p", "c")]);
        txn.abort();

        // Nothing changed in the committed state.
        let committed = store
            .read(|txn| txn.quads_matching(Some(&node("a")), None, None))
            .unwrap();
        assert_eq!(committed, vec![quad("a", "p", "b")]);
    }

    #[test]
    fn get_or_create_class_is_idempotent() {
        let store = GraphStore::in_memory().unwrap();
        let mut txn = store.begin(TxnMode::Write).unwrap();
        let iri = node("Alimentador");
        assert!(txn.get_class(&iri).unwrap().is_none());
        txn.get_or_create_class(&iri).unwrap();
        txn.get_or_create_class(&iri).unwrap();
        txn.commit().unwrap();
        assert_eq!(store.size().unwrap(), 1);
    }

    #[test]
    fn query_select_and_bad_syntax() {
        let store = GraphStore::in_memory().unwrap();
        let mut txn = store.begin(TxnMode::Write).unwrap();
        txn.insert(default_quad(
            node("F1"),
            node("Potência_Aparente"),
            Term::Literal(Literal::from(100_i64)),
        ))
        .unwrap();
        txn.commit().unwrap();

        let rows = store
            .query("SELECT ?s ?o WHERE { ?s ?p ?o }")
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].bindings.len(), 2);

        let err = store.query("SELEKT garbage");
        assert!(matches!(err, Err(QueryError::Parse { .. })));
    }

    #[test]
    fn load_document_turtle() {
        let store = GraphStore::in_memory().unwrap();
        let doc = b"@prefix : <http://example.org/demand#> .\n:F1 :p :F2 .\n";
        store.load_document(RdfFormat::Turtle, doc).unwrap();
        assert_eq!(store.size().unwrap(), 1);

        // Loading again is a union, not a duplication.
        store.load_document(RdfFormat::Turtle, doc).unwrap();
        assert_eq!(store.size().unwrap(), 1);
    }
}
