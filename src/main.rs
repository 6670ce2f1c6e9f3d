//! ontogrid CLI: ontology-backed demand management for electrical installations.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use ontogrid::dataset::{AssertedReasoner, Dataset, IndividualFilter, query_templates};
use ontogrid::metric::{Metric, summation};
use ontogrid::timeline::timelines;
use ontogrid::view::IndividualView;

#[derive(Parser)]
#[command(name = "ontogrid", version, about = "Ontology-backed electrical demand management")]
struct Cli {
    /// Root directory holding the datasets.
    #[arg(long, global = true, default_value = "datasets")]
    datasets_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage datasets (one per uploaded ontology document).
    Dataset {
        #[command(subcommand)]
        action: DatasetAction,
    },

    /// Create, update, and inspect individuals.
    Individual {
        #[command(subcommand)]
        action: IndividualAction,
    },

    /// Run a SPARQL query against a dataset.
    Query {
        /// Dataset name.
        dataset: String,

        /// SPARQL body; the dataset's prefixes are prepended automatically.
        /// Omit to list the available query templates.
        body: Option<String>,

        /// Use a named template instead of an inline body.
        #[arg(long, conflicts_with = "body")]
        template: Option<String>,
    },

    /// Print a node's daily metric timeline as JSON.
    Timeline {
        /// Dataset name.
        dataset: String,

        /// Individual name (a leaf yields one series, an interior node one
        /// per leaf descendant).
        individual: String,

        /// Metric to sample (apparent-power, demand, active-power,
        /// reactive-power, rdp, der).
        #[arg(long, default_value = "demand")]
        metric: String,

        /// Merge all series into a single pointwise sum.
        #[arg(long)]
        merge: bool,
    },

    /// Print a metric for a node, summed over its leaf descendants.
    Metrics {
        /// Dataset name.
        dataset: String,

        /// Individual name.
        individual: String,

        /// Metric to aggregate; omit to print all of them.
        #[arg(long)]
        metric: Option<String>,
    },

    /// Print everything the reasoner knows about a resource.
    Reason {
        /// Dataset name.
        dataset: String,

        /// Resource local name.
        name: String,
    },
}

#[derive(Subcommand)]
enum DatasetAction {
    /// Create a dataset from an ontology document.
    Create {
        /// Dataset name.
        name: String,
        /// Ontology document (.owl/.rdf/.xml, .ttl, or .nt).
        file: PathBuf,
    },
    /// List all datasets.
    List,
    /// Merge another ontology document into an existing dataset.
    Merge {
        /// Dataset name.
        name: String,
        /// Document to merge.
        file: PathBuf,
    },
    /// Rename a dataset.
    Rename {
        /// Current name.
        name: String,
        /// New name.
        new_name: String,
    },
    /// Delete a dataset and its store.
    Destroy {
        /// Dataset name.
        name: String,
    },
    /// Show a dataset's namespace, counts, and schema.
    Info {
        /// Dataset name.
        name: String,
    },
}

#[derive(Subcommand)]
enum IndividualAction {
    /// Create an individual under an existing class.
    Create {
        /// Dataset name.
        dataset: String,
        /// Class local name (must exist in the model).
        class: String,
        /// Individual local name.
        name: String,
        /// Properties as `kind:Name=value` pairs,
        /// e.g. `int:Potência_Aparente=100` or `resource:Pertence_A=F1`.
        #[arg(long = "prop")]
        props: Vec<String>,
    },
    /// Update an individual (rename, reclassify, change properties).
    Update {
        /// Dataset name.
        dataset: String,
        /// Current individual name.
        name: String,
        /// New name (same as current to keep it).
        #[arg(long)]
        rename: Option<String>,
        /// Class local name.
        #[arg(long)]
        class: String,
        /// Property changes; `destroy:Name=` removes a value.
        #[arg(long = "prop")]
        props: Vec<String>,
    },
    /// Remove an individual and every triple referencing it.
    Destroy {
        /// Dataset name.
        dataset: String,
        /// Individual name.
        name: String,
    },
    /// Show an individual's properties and computed metrics.
    Show {
        /// Dataset name.
        dataset: String,
        /// Individual name.
        name: String,
    },
    /// List individuals, optionally restricted to one class.
    List {
        /// Dataset name.
        dataset: String,
        /// Class local name.
        #[arg(long)]
        class: Option<String>,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let dir = cli.datasets_dir;

    match cli.command {
        Commands::Dataset { action } => match action {
            DatasetAction::Create { name, file } => {
                let document = std::fs::read(&file).into_diagnostic()?;
                let file_name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let ds = Dataset::create(&dir, &name, &file_name, &document)?;
                println!(
                    "Created dataset \"{}\" ({} triples, namespace {})",
                    ds.name(),
                    ds.count()?,
                    ds.namespace().as_str()
                );
            }
            DatasetAction::List => {
                let names = Dataset::list(&dir)?;
                if names.is_empty() {
                    println!("No datasets under {}.", dir.display());
                } else {
                    for name in names {
                        println!("{name}");
                    }
                }
            }
            DatasetAction::Merge { name, file } => {
                let document = std::fs::read(&file).into_diagnostic()?;
                let file_name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let ds = Dataset::open(&dir, &name)?;
                let before = ds.count()?;
                ds.merge(&file_name, &document)?;
                println!(
                    "Merged {} into \"{}\" (+{} triples)",
                    file.display(),
                    ds.name(),
                    ds.count()? - before
                );
            }
            DatasetAction::Rename { name, new_name } => {
                let ds = Dataset::open(&dir, &name)?.rename(&new_name)?;
                println!("Renamed dataset to \"{}\"", ds.name());
            }
            DatasetAction::Destroy { name } => {
                Dataset::destroy(&dir, &name)?;
                println!("Destroyed dataset \"{name}\"");
            }
            DatasetAction::Info { name } => {
                let ds = Dataset::open(&dir, &name)?;
                println!("Dataset:    {}", ds.name());
                println!("Namespace:  {}", ds.namespace().as_str());
                println!("Source:     {}", ds.source_file());
                println!("Triples:    {} (source document: {})", ds.count()?, ds.count_source()?);
                println!("Classes:    {}", ds.classes()?.join(", "));
                println!("Obj props:  {}", ds.object_properties()?.join(", "));
                println!("Data props: {}", ds.datatype_properties()?.join(", "));
            }
        },

        Commands::Individual { action } => match action {
            IndividualAction::Create {
                dataset,
                class,
                name,
                props,
            } => {
                let ds = Dataset::open(&dir, &dataset)?;
                let props = parse_props(&props)?;
                let iri = ds.editor().create(&class, &name, &props)?;
                println!("Created {iri}");
            }
            IndividualAction::Update {
                dataset,
                name,
                rename,
                class,
                props,
            } => {
                let ds = Dataset::open(&dir, &dataset)?;
                let props = parse_props(&props)?;
                let new_name = rename.as_deref().unwrap_or(&name);
                let iri = ds.editor().update(&name, new_name, &class, &props)?;
                println!("Updated {iri}");
            }
            IndividualAction::Destroy { dataset, name } => {
                let ds = Dataset::open(&dir, &dataset)?;
                ds.editor().destroy(&name)?;
                println!("Destroyed \"{name}\"");
            }
            IndividualAction::Show { dataset, name } => {
                let ds = Dataset::open(&dir, &dataset)?;
                let Some(view) = ds.individual(&name)? else {
                    miette::bail!("no individual named \"{name}\" in dataset \"{dataset}\"");
                };
                print_individual(&view)?;
            }
            IndividualAction::List { dataset, class } => {
                let ds = Dataset::open(&dir, &dataset)?;
                let filter = match class {
                    Some(class) => IndividualFilter::OfClass(class),
                    None => IndividualFilter::All,
                };
                let views = ds.individuals(filter)?;
                if views.is_empty() {
                    println!("No individuals.");
                }
                for view in &views {
                    println!(
                        "{} ({})",
                        view.local_name(),
                        view.primary_class_name().unwrap_or("untyped")
                    );
                }
            }
        },

        Commands::Query {
            dataset,
            body,
            template,
        } => {
            let ds = Dataset::open(&dir, &dataset)?;
            let body = match (body, template) {
                (Some(body), _) => body,
                (None, Some(wanted)) => {
                    let Some(t) = query_templates().into_iter().find(|t| t.name == wanted)
                    else {
                        miette::bail!("no query template named \"{wanted}\"");
                    };
                    t.body.to_string()
                }
                (None, None) => {
                    println!("Available templates:");
                    for t in query_templates() {
                        println!("\n# {}\n{}", t.name, t.body);
                    }
                    return Ok(());
                }
            };
            let rows = ds.query_rows(&body)?;
            if rows.is_empty() {
                println!("No results.");
            }
            for row in &rows {
                let line: Vec<String> = row
                    .bindings
                    .iter()
                    .map(|(var, value)| format!("{var}={value}"))
                    .collect();
                println!("{}", line.join("  "));
            }
        }

        Commands::Timeline {
            dataset,
            individual,
            metric,
            merge,
        } => {
            let ds = Dataset::open(&dir, &dataset)?;
            let metric: Metric = metric.parse()?;
            let Some(view) = ds.individual(&individual)? else {
                miette::bail!("no individual named \"{individual}\" in dataset \"{dataset}\"");
            };
            let series = timelines(&view, metric, merge)?;
            println!("{}", serde_json::to_string_pretty(&series).into_diagnostic()?);
        }

        Commands::Metrics {
            dataset,
            individual,
            metric,
        } => {
            let ds = Dataset::open(&dir, &dataset)?;
            let Some(view) = ds.individual(&individual)? else {
                miette::bail!("no individual named \"{individual}\" in dataset \"{dataset}\"");
            };
            let wanted: Vec<Metric> = match metric {
                Some(m) => vec![m.parse()?],
                None => Metric::ALL.to_vec(),
            };
            // Interior nodes aggregate over every descendant, interior
            // descendants included.
            let descendants = view.descendants()?;
            for m in wanted {
                let value = if descendants.is_empty() {
                    m.evaluate(&view)?
                } else {
                    summation(&descendants, m)?
                };
                println!("{m} = {value}");
            }
        }

        Commands::Reason { dataset, name } => {
            let ds = Dataset::open(&dir, &dataset)?;
            let statements = ds.reason(&AssertedReasoner, &name)?;
            if statements.is_empty() {
                println!("Nothing known about \"{name}\".");
            }
            for (predicate, object) in &statements {
                println!("{name} {predicate} {object}");
            }
        }
    }

    Ok(())
}

/// Split `kind:Name=value` CLI arguments into property pairs.
fn parse_props(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|arg| match arg.split_once('=') {
            Some((key, value)) => Ok((key.to_string(), value.to_string())),
            None => miette::bail!("property \"{arg}\" is not in key=value form"),
        })
        .collect()
}

fn print_individual(view: &IndividualView<'_>) -> Result<()> {
    println!("Individual: {}", view.local_name());
    println!("Class:      {}", view.primary_class_name().unwrap_or("untyped"));

    let props = view.property_list();
    if !props.is_empty() {
        println!("Properties:");
        for (name, value) in &props {
            println!("  {name} = {value}");
        }
    }

    println!("Metrics:");
    println!("  apparent-power = {}", view.apparent_power());
    println!("  demand         = {}", view.demand());
    println!("  active-power   = {}", view.active_power());
    match view.reactive_power() {
        Ok(q) => println!("  reactive-power = {q}"),
        Err(e) => println!("  reactive-power = <{e}>"),
    }
    println!("  rdp            = {}", view.rdp());
    println!("  der            = {}", view.der());
    println!(
        "Activity:   {} for {} minutes (until {})",
        view.start_time()?,
        view.duration_minutes()?,
        view.stop_time()?
    );
    Ok(())
}
