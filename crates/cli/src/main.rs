use api_shared::{
    AssignLabDocumentRes, LabDocumentDetailRes, ListLabDocumentsRes, ListPatientsRes,
    ListRecordsRes, SearchRes, StatsRes,
};
use clap::{Parser, Subcommand};
use clinrec_core::config::{data_dir_from_env_value, page_limit_from_env_value};
use clinrec_core::{
    classify, CoreConfig, DocumentService, FileStore, LabValue, PatientService, RawLabService,
    ReferenceRange, SearchCriteria, VariantTag,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clinrec")]
#[command(about = "Browse, search and assign converted clinical records")]
struct Cli {
    /// Document store directory (defaults to CLINREC_DATA_DIR, then "clinrec_data")
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a value against a reference range
    Classify {
        /// Lab value, e.g. 4.0
        value: String,
        /// Reference range, e.g. "3.5 - 5.3", ">60" or "<200"
        range: String,
    },
    /// List converted records of one variant
    List {
        /// Variant tag: MDM, OUL or ORU
        tag: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Search converted records of one variant
    Search {
        /// Variant tag: MDM, OUL or ORU
        tag: String,
        /// Criteria as key=value, e.g. patient_id=1721
        #[arg(required = true)]
        criteria: Vec<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show per-variant document counts
    Stats,
    /// List raw lab documents
    LabList {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show a raw lab document with classified results
    LabShow {
        /// Lab document id
        id: String,
    },
    /// Assign a raw lab document to a patient
    Assign {
        document_id: String,
        patient_id: String,
    },
    /// List patients, optionally filtered
    Patients {
        /// Text matched against identifiers, family names and first given names
        query: Option<String>,
    },
}

struct Services {
    documents: DocumentService,
    raw_lab: RawLabService,
    patients: PatientService,
}

impl Services {
    fn open(data_dir: Option<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let data_dir = data_dir.unwrap_or_else(|| {
            data_dir_from_env_value(std::env::var("CLINREC_DATA_DIR").ok())
        });
        let page_limit = page_limit_from_env_value(std::env::var("CLINREC_PAGE_LIMIT").ok())?;
        let cfg = Arc::new(CoreConfig::new(data_dir, page_limit)?);
        let store = Arc::new(FileStore::open(cfg.data_dir())?);

        Ok(Self {
            documents: DocumentService::new(cfg.clone(), store.clone()),
            raw_lab: RawLabService::new(cfg, store.clone()),
            patients: PatientService::new(store),
        })
    }
}

/// Split `key=value` command-line criteria.
fn parse_criteria(raw: &[String]) -> Result<Vec<(String, String)>, String> {
    raw.iter()
        .map(|item| {
            item.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .ok_or_else(|| format!("criterion '{item}' is not of the form key=value"))
        })
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinrec_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    match cli.command {
        Some(Commands::Classify { value, range }) => {
            let class = classify(&LabValue::from(value.as_str()), Some(&range));
            match ReferenceRange::parse(&range) {
                Some(parsed) => println!("{class} ({parsed:?})"),
                None => println!("{class} (range not recognised)"),
            }
        }
        Some(Commands::List { tag, limit }) => {
            let services = Services::open(cli.data_dir)?;
            let tag: VariantTag = tag.parse()?;
            let records = services.documents.list(tag, limit)?;
            if json {
                return print_json(&ListRecordsRes::new(tag, records));
            }
            if records.is_empty() {
                println!("No {tag} records found.");
            }
            for record in records {
                println!("{}  {}", record.id, record.title);
                for (label, value) in record.summary.iter() {
                    println!("    {label}: {value}");
                }
            }
        }
        Some(Commands::Search {
            tag,
            criteria,
            limit,
        }) => {
            let services = Services::open(cli.data_dir)?;
            let tag: VariantTag = tag.parse()?;
            let criteria = SearchCriteria::from_pairs(tag, parse_criteria(&criteria)?)?
                .with_limit(limit);
            let outcome = services.documents.search(&criteria)?;
            if json {
                return print_json(&SearchRes::from(outcome));
            }
            println!(
                "{} match(es), showing {}",
                outcome.total_matches,
                outcome.results.len()
            );
            for hit in outcome.results {
                println!("{}  {}", hit.id, hit.title);
                for field in hit.highlights {
                    let marker = if field.is_hit { "*" } else { " " };
                    println!("  {marker} {}: {}", field.label, field.value);
                }
            }
        }
        Some(Commands::Stats) => {
            let services = Services::open(cli.data_dir)?;
            let stats = services.documents.stats();
            if json {
                return print_json(&StatsRes::from(stats));
            }
            println!("Total documents: {}", stats.total_documents);
            for (tag, share) in &stats.per_variant {
                print!(
                    "  {tag} ({}): {} ({:.1}%)",
                    share.collection_name, share.document_count, share.percentage
                );
                match &share.error {
                    Some(error) => println!("  error: {error}"),
                    None => println!(),
                }
            }
        }
        Some(Commands::LabList { limit }) => {
            let services = Services::open(cli.data_dir)?;
            let docs = services.raw_lab.list(limit)?;
            if json {
                return print_json(&ListLabDocumentsRes::from(docs));
            }
            if docs.is_empty() {
                println!("No lab documents found.");
            }
            for doc in docs {
                println!("{}  {}", doc.id, doc.title);
                for (label, value) in doc.summary.iter() {
                    println!("    {label}: {value}");
                }
            }
        }
        Some(Commands::LabShow { id }) => {
            let services = Services::open(cli.data_dir)?;
            let detail = services.raw_lab.detail(&id)?;
            if json {
                return print_json(&LabDocumentDetailRes::from(detail));
            }
            println!("{}", detail.title);
            for (label, value) in detail.summary.iter() {
                println!("  {label}: {value}");
            }
            println!("  Birth date: {}", detail.patient.birth_date.as_deref().unwrap_or("N/A"));
            println!("  Gender: {}", detail.patient.gender.as_deref().unwrap_or("N/A"));
            for result in &detail.results {
                let flag = if result.classification.renders_as_normal() {
                    " "
                } else {
                    "!"
                };
                println!(
                    "  {flag} {:<20} {:>10} {:<10} [{}] {}",
                    result.test_name.as_deref().unwrap_or("N/A"),
                    result.value_text,
                    result.unit.as_deref().unwrap_or(""),
                    result.reference_range.as_deref().unwrap_or(""),
                    result.classification
                );
            }
        }
        Some(Commands::Assign {
            document_id,
            patient_id,
        }) => {
            let services = Services::open(cli.data_dir)?;
            let outcome = services.raw_lab.assign(&document_id, &patient_id)?;
            if json {
                return print_json(&AssignLabDocumentRes::from(outcome));
            }
            println!("{}", outcome.message);
        }
        Some(Commands::Patients { query }) => {
            let services = Services::open(cli.data_dir)?;
            let patients = services.patients.list(query.as_deref())?;
            if json {
                return print_json(&ListPatientsRes::from_patients(&patients)?);
            }
            if patients.is_empty() {
                println!("No patients found.");
            }
            for patient in patients {
                println!(
                    "ID: {}, Name: {}, Identifier: {}",
                    patient.id,
                    patient.display_name().unwrap_or_else(|| "N/A".into()),
                    patient.primary_identifier().unwrap_or("N/A")
                );
            }
        }
        None => {
            println!("Use 'clinrec --help' for commands");
        }
    }

    Ok(())
}
