//! Dataset lifecycle and the operations exposed on an open dataset.
//!
//! A dataset is one directory under the datasets root:
//!
//! ```text
//! <datasets>/<name>/
//!   config.toml     name, namespace, source document file name
//!   <source doc>    the uploaded ontology document, kept verbatim
//!   store/          the persistent triple store
//! ```
//!
//! Creation uploads an ontology document, discovers its default namespace,
//! and bulk-loads it. Every later operation (editing, views, timelines,
//! SPARQL) runs against the persistent store; the source document is only
//! kept for provenance and the source-count comparison.

use std::fs;
use std::path::{Path, PathBuf};

use oxigraph::io::RdfFormat;
use oxigraph::model::vocab::rdf;
use oxigraph::model::{Subject, Term};
use serde::{Deserialize, Serialize};

use crate::edit::IndividualEditor;
use crate::error::{DatasetError, DatasetResult, ViewResult};
use crate::naming::{Namespace, canonicalize};
use crate::store::{GraphStore, SelectRow};
use crate::view::IndividualView;
use crate::vocab;

const CONFIG_FILE: &str = "config.toml";
const STORE_DIR: &str = "store";

/// Map a document file name to its RDF serialization by extension.
pub fn rdf_format_for(file: &str) -> DatasetResult<RdfFormat> {
    let lower = file.to_lowercase();
    let ext = lower.rsplit('.').next().unwrap_or("");
    match ext {
        "owl" | "rdf" | "xml" => Ok(RdfFormat::RdfXml),
        "ttl" => Ok(RdfFormat::Turtle),
        "nt" => Ok(RdfFormat::NTriples),
        _ => Err(DatasetError::UnsupportedFormat {
            file: file.to_string(),
        }),
    }
}

/// Persisted dataset metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    pub namespace: String,
    pub source_file: String,
}

impl DatasetConfig {
    fn load(path: &Path) -> DatasetResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|e| DatasetError::Config {
            message: e.to_string(),
        })
    }

    fn save(&self, path: &Path) -> DatasetResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| DatasetError::Config {
            message: e.to_string(),
        })?;
        fs::write(path, text).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

/// A named SPARQL starting point offered to users.
#[derive(Debug, Clone, Serialize)]
pub struct QueryTemplate {
    pub name: &'static str,
    pub body: &'static str,
}

/// The canned queries the query console starts from.
pub fn query_templates() -> Vec<QueryTemplate> {
    vec![
        QueryTemplate {
            name: "all-triples",
            body: "SELECT ?subject ?predicate ?object\nWHERE { ?subject ?predicate ?object }",
        },
        QueryTemplate {
            name: "individuals",
            body: "SELECT ?individual ?class\nWHERE {\n  ?individual rdf:type ?class .\n  ?individual rdf:type owl:NamedIndividual .\n  FILTER(?class != owl:NamedIndividual)\n}",
        },
        QueryTemplate {
            name: "classes",
            body: "SELECT ?class\nWHERE { ?class rdf:type owl:Class }",
        },
        QueryTemplate {
            name: "hierarchy",
            body: "SELECT ?child ?parent\nWHERE { ?child :Pertence_A ?parent }",
        },
    ]
}

/// Which individuals a listing returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndividualFilter {
    All,
    OfClass(String),
}

/// Inference seam: everything known about one resource.
///
/// The shipped [`AssertedReasoner`] reports asserted triples only; an
/// OWL-entailing implementation would add inferred statements behind the
/// same signature.
pub trait Reasoner {
    /// `(predicate, object)` pairs for every statement with the named
    /// resource as subject, rendered as local names where possible.
    fn statements_about(
        &self,
        store: &GraphStore,
        namespace: &Namespace,
        name: &str,
    ) -> DatasetResult<Vec<(String, String)>>;
}

/// The no-inference reasoner: the model holds asserted triples only.
#[derive(Debug, Default)]
pub struct AssertedReasoner;

impl Reasoner for AssertedReasoner {
    fn statements_about(
        &self,
        store: &GraphStore,
        namespace: &Namespace,
        name: &str,
    ) -> DatasetResult<Vec<(String, String)>> {
        let iri = namespace.iri_for(name)?;
        let quads = store.read(|txn| txn.quads_matching(Some(&iri), None, None))?;
        Ok(quads
            .into_iter()
            .map(|q| {
                let object = crate::store::term_text(&q.object);
                let object = match object.strip_prefix(namespace.as_str()) {
                    Some(local) => local.to_string(),
                    None => object,
                };
                (
                    namespace.local_name(q.predicate.as_str()).to_string(),
                    object,
                )
            })
            .collect())
    }
}

/// An open dataset: config, namespace, and the live store.
#[derive(Debug)]
pub struct Dataset {
    root: PathBuf,
    config: DatasetConfig,
    namespace: Namespace,
    store: GraphStore,
}

impl Dataset {
    /// Create a dataset from an uploaded ontology document.
    ///
    /// The dataset name is canonicalized the same way individual names are.
    /// Fails when the name is taken, the document format is unrecognized, or
    /// no default namespace can be discovered in the document.
    pub fn create(
        datasets_dir: &Path,
        name: &str,
        file_name: &str,
        document: &[u8],
    ) -> DatasetResult<Self> {
        let name = canonicalize(name);
        let root = datasets_dir.join(&name);
        if root.exists() {
            return Err(DatasetError::AlreadyExists { name });
        }

        let format = rdf_format_for(file_name)?;
        let text = String::from_utf8_lossy(document);
        let namespace = Namespace::discover(&text).ok_or_else(|| DatasetError::NoNamespace {
            file: file_name.to_string(),
        })?;

        fs::create_dir_all(&root).map_err(|source| DatasetError::Io {
            path: root.display().to_string(),
            source,
        })?;
        fs::write(root.join(file_name), document).map_err(|source| DatasetError::Io {
            path: root.join(file_name).display().to_string(),
            source,
        })?;

        let config = DatasetConfig {
            name: name.clone(),
            namespace: namespace.as_str().to_string(),
            source_file: file_name.to_string(),
        };
        config.save(&root.join(CONFIG_FILE))?;

        // A document that fails to load must not leave a half-created
        // dataset behind; the name stays free for a retry.
        let store = match Self::populate_store(&root, format, document) {
            Ok(store) => store,
            Err(e) => {
                let _ = fs::remove_dir_all(&root);
                return Err(e.into());
            }
        };

        tracing::info!(dataset = %name, namespace = %namespace.as_str(), "created dataset");
        Ok(Self {
            root,
            config,
            namespace,
            store,
        })
    }

    fn populate_store(
        root: &Path,
        format: RdfFormat,
        document: &[u8],
    ) -> crate::error::StoreResult<GraphStore> {
        let store = GraphStore::open(&root.join(STORE_DIR))?;
        store.load_document(format, document)?;
        Ok(store)
    }

    /// Open an existing dataset.
    pub fn open(datasets_dir: &Path, name: &str) -> DatasetResult<Self> {
        let name = canonicalize(name);
        let root = datasets_dir.join(&name);
        if !root.is_dir() {
            return Err(DatasetError::NotFound { name });
        }
        let config = DatasetConfig::load(&root.join(CONFIG_FILE))?;
        let namespace = Namespace::new(config.namespace.clone());
        let store = GraphStore::open(&root.join(STORE_DIR))?;
        Ok(Self {
            root,
            config,
            namespace,
            store,
        })
    }

    /// Names of every dataset under the datasets root, sorted.
    pub fn list(datasets_dir: &Path) -> DatasetResult<Vec<String>> {
        let mut names = Vec::new();
        if !datasets_dir.is_dir() {
            return Ok(names);
        }
        let entries = fs::read_dir(datasets_dir).map_err(|source| DatasetError::Io {
            path: datasets_dir.display().to_string(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| DatasetError::Io {
                path: datasets_dir.display().to_string(),
                source,
            })?;
            if entry.path().join(CONFIG_FILE).is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete a dataset's directory, store included.
    pub fn destroy(datasets_dir: &Path, name: &str) -> DatasetResult<()> {
        let name = canonicalize(name);
        let root = datasets_dir.join(&name);
        if !root.is_dir() {
            return Err(DatasetError::NotFound { name });
        }
        fs::remove_dir_all(&root).map_err(|source| DatasetError::Io {
            path: root.display().to_string(),
            source,
        })?;
        tracing::info!(dataset = %name, "destroyed dataset");
        Ok(())
    }

    /// Merge another ontology document into this dataset's store.
    ///
    /// Loading is a union over triples, so merging the same document twice
    /// changes nothing.
    pub fn merge(&self, file_name: &str, document: &[u8]) -> DatasetResult<()> {
        let format = rdf_format_for(file_name)?;
        self.store.load_document(format, document)?;
        tracing::info!(dataset = %self.config.name, file = file_name, "merged document");
        Ok(())
    }

    /// Rename the dataset, moving its directory.
    ///
    /// The store is closed before the move and reopened under the new path.
    pub fn rename(self, new_name: &str) -> DatasetResult<Self> {
        let new_name = canonicalize(new_name);
        let Some(parent) = self.root.parent().map(Path::to_path_buf) else {
            return Err(DatasetError::Config {
                message: "dataset directory has no parent".to_string(),
            });
        };
        let target = parent.join(&new_name);
        if target.exists() {
            return Err(DatasetError::AlreadyExists { name: new_name });
        }

        let Dataset {
            root, mut config, ..
        } = self;
        // The store's file locks must be released before the directory moves.
        fs::rename(&root, &target).map_err(|source| DatasetError::Io {
            path: root.display().to_string(),
            source,
        })?;
        config.name = new_name.clone();
        config.save(&target.join(CONFIG_FILE))?;

        tracing::info!(dataset = %new_name, "renamed dataset");
        Self::open(&parent, &new_name)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn source_file(&self) -> &str {
        &self.config.source_file
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Editor bound to this dataset's store and namespace.
    pub fn editor(&self) -> IndividualEditor<'_> {
        IndividualEditor::new(&self.store, &self.namespace)
    }

    /// Triple count of the live store.
    pub fn count(&self) -> DatasetResult<usize> {
        Ok(self.store.size()?)
    }

    /// Triple count of the original source document, for drift comparison
    /// against [`count`](Self::count).
    pub fn count_source(&self) -> DatasetResult<usize> {
        let path = self.root.join(&self.config.source_file);
        let document = fs::read(&path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let format = rdf_format_for(&self.config.source_file)?;
        let scratch = GraphStore::in_memory()?;
        scratch.load_document(format, &document)?;
        Ok(scratch.size()?)
    }

    // -----------------------------------------------------------------------
    // Individuals
    // -----------------------------------------------------------------------

    /// Resolve one individual by local name or IRI.
    pub fn individual(&self, name: &str) -> ViewResult<Option<IndividualView<'_>>> {
        IndividualView::resolve(&self.store, &self.namespace, name)
    }

    /// Views over individuals, optionally restricted to one class.
    ///
    /// `All` matches any subject typed under a non-OWL class, so individuals
    /// asserted in an uploaded document without the `owl:NamedIndividual`
    /// marker are listed too. Results are ordered by local name.
    pub fn individuals(&self, filter: IndividualFilter) -> DatasetResult<Vec<IndividualView<'_>>> {
        let rdf_type = rdf::TYPE.into_owned();
        let class_term = match &filter {
            IndividualFilter::All => None,
            IndividualFilter::OfClass(class) => {
                Some(Term::NamedNode(self.namespace.iri_for(class)?))
            }
        };

        let mut names: Vec<String> = self.store.read(|txn| {
            Ok(txn
                .quads_matching(None, Some(&rdf_type), class_term.as_ref())?
                .into_iter()
                .filter(|q| match &q.object {
                    Term::NamedNode(class) => !class.as_str().starts_with(vocab::OWL_NS),
                    _ => false,
                })
                .filter_map(|q| match q.subject {
                    Subject::NamedNode(n) => Some(n.as_str().to_string()),
                    _ => None,
                })
                .collect())
        })?;
        names.sort();
        names.dedup();

        let mut views = Vec::new();
        for name in names {
            if let Some(view) = self.individual(&name).map_err(store_of_view)? {
                views.push(view);
            }
        }
        Ok(views)
    }

    /// The feeder individuals (`Alimentador`), the hierarchy roots.
    pub fn feeders(&self) -> DatasetResult<Vec<IndividualView<'_>>> {
        self.individuals(IndividualFilter::OfClass(vocab::FEEDER_CLASS.to_string()))
    }

    /// The building-system individuals (`Sistema_Predial`).
    pub fn building_systems(&self) -> DatasetResult<Vec<IndividualView<'_>>> {
        self.individuals(IndividualFilter::OfClass(
            vocab::BUILDING_SYSTEM_CLASS.to_string(),
        ))
    }

    // -----------------------------------------------------------------------
    // Schema listings
    // -----------------------------------------------------------------------

    /// Domain class local names, sorted. OWL's own terms are excluded.
    pub fn classes(&self) -> DatasetResult<Vec<String>> {
        self.schema_listing(vocab::OWL_CLASS.into_owned())
    }

    /// Object property local names, sorted.
    pub fn object_properties(&self) -> DatasetResult<Vec<String>> {
        self.schema_listing(vocab::OWL_OBJECT_PROPERTY.into_owned())
    }

    /// Datatype property local names, sorted.
    pub fn datatype_properties(&self) -> DatasetResult<Vec<String>> {
        self.schema_listing(vocab::OWL_DATATYPE_PROPERTY.into_owned())
    }

    /// All property local names, object and datatype together, sorted.
    pub fn properties(&self) -> DatasetResult<Vec<String>> {
        let mut all = self.object_properties()?;
        all.extend(self.datatype_properties()?);
        all.sort();
        all.dedup();
        Ok(all)
    }

    fn schema_listing(
        &self,
        declaration: oxigraph::model::NamedNode,
    ) -> DatasetResult<Vec<String>> {
        let rdf_type = rdf::TYPE.into_owned();
        let target = Term::NamedNode(declaration);
        let mut names: Vec<String> = self.store.read(|txn| {
            Ok(txn
                .quads_matching(None, Some(&rdf_type), Some(&target))?
                .into_iter()
                .filter_map(|q| match q.subject {
                    Subject::NamedNode(n) if !n.as_str().starts_with(vocab::OWL_NS) => {
                        Some(self.namespace.local_name(n.as_str()).to_string())
                    }
                    _ => None,
                })
                .collect())
        })?;
        names.sort();
        names.dedup();
        Ok(names)
    }

    // -----------------------------------------------------------------------
    // SPARQL boundary
    // -----------------------------------------------------------------------

    /// The prefix block prepended to every user query: the dataset's default
    /// namespace plus the standard vocabularies.
    pub fn query_prefixes(&self) -> String {
        format!(
            "PREFIX : <{ns}>\n\
             PREFIX demand: <{ns}>\n\
             PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>\n\
             PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n\
             PREFIX owl: <{owl}>\n\
             PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>\n",
            ns = self.namespace.as_str(),
            owl = vocab::OWL_NS,
        )
    }

    /// Run a user SPARQL body with the dataset prefixes prepended.
    ///
    /// This boundary never fails on a bad query: parse and evaluation errors
    /// come back as a single row binding `error` to the message, so the
    /// console renders them in place of results.
    pub fn query_rows(&self, body: &str) -> DatasetResult<Vec<SelectRow>> {
        let full = format!("{}{body}", self.query_prefixes());
        match self.store.query(&full) {
            Ok(rows) => Ok(rows),
            Err(e) => {
                tracing::debug!(error = %e, "query failed, reporting inline");
                Ok(vec![SelectRow {
                    bindings: vec![("error".to_string(), e.to_string())],
                }])
            }
        }
    }

    /// Everything the reasoner knows about one resource.
    pub fn reason(
        &self,
        reasoner: &dyn Reasoner,
        name: &str,
    ) -> DatasetResult<Vec<(String, String)>> {
        reasoner.statements_about(&self.store, &self.namespace, name)
    }
}

fn store_of_view(e: crate::error::ViewError) -> DatasetError {
    match e {
        crate::error::ViewError::Store(s) => DatasetError::Store(s),
        crate::error::ViewError::Name(n) => DatasetError::Name(n),
    }
}
