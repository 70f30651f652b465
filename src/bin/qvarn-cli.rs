//! Operational CLI for the resource store: load schemas, create/get/search
//! resources, inspect listeners — the stand-in for the HTTP surface.

use clap::{Parser, Subcommand};
use qvarn_core::database::Database;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "qvarn-cli", about = "Schema-driven JSON resource store")]
struct Cli {
    /// Path to the RocksDB data directory.
    #[arg(long, env = "QVARN_BACKEND")]
    backend: PathBuf,

    /// Directory of resource-type schema files to load at startup.
    #[arg(long, env = "QVARN_RESOURCE_TYPES_PATH")]
    resource_types_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open (creating if missing) the database and load schemas.
    InitDb,
    /// Create a resource from a JSON document read from a file, or `-` for stdin.
    Create {
        resource_type: String,
        #[arg(value_name = "FILE")]
        data: PathBuf,
    },
    /// Fetch a resource by id.
    Get { resource_type: String, id: String },
    /// Run a path-encoded search over a resource type.
    Search {
        resource_type: String,
        #[arg(default_value = "")]
        search_path: String,
    },
    /// List registered listeners for a resource type.
    Listeners { resource_type: String },
    /// Write a file sub-path, conditioned on the resource's current revision.
    PutFile {
        resource_type: String,
        id: String,
        subpath: String,
        content_type: String,
        #[arg(value_name = "FILE")]
        blob: PathBuf,
        revision: String,
    },
    /// Read a file sub-path's bytes to stdout.
    GetFile {
        resource_type: String,
        id: String,
        subpath: String,
    },
}

fn load_schemas(db: &Database, dir: &PathBuf) -> anyhow::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let ext = path.extension().and_then(|e| e.to_str());
        if !matches!(ext, Some("yaml") | Some("yml") | Some("json")) {
            continue;
        }
        let content = std::fs::read_to_string(&path)?;
        let schema = if ext == Some("json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        db.register_schema(schema);
        tracing::info!(path = %path.display(), "loaded resource type schema");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let db = Database::open(&cli.backend)?;
    if let Some(dir) = &cli.resource_types_path {
        load_schemas(&db, dir)?;
    }

    match cli.command {
        Command::InitDb => {
            println!("initialized database at {}", cli.backend.display());
        }
        Command::Create { resource_type, data } => {
            let content = if data == PathBuf::from("-") {
                std::io::read_to_string(std::io::stdin())?
            } else {
                std::fs::read_to_string(&data)?
            };
            let value: serde_json::Value = serde_json::from_str(&content)?;
            let resource = db.create(&resource_type, value)?;
            println!("{}", serde_json::to_string_pretty(&resource)?);
        }
        Command::Get { resource_type, id } => {
            let resource = db.get(&resource_type, &id)?;
            println!("{}", serde_json::to_string_pretty(&resource)?);
        }
        Command::Search {
            resource_type,
            search_path,
        } => {
            let results = db.search(&resource_type, &search_path)?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::Listeners { resource_type } => {
            let listeners = db.list_listeners(&resource_type)?;
            for id in listeners {
                println!("{id}");
            }
        }
        Command::PutFile {
            resource_type,
            id,
            subpath,
            content_type,
            blob,
            revision,
        } => {
            let bytes = std::fs::read(&blob)?;
            let resource = db.put_file(&resource_type, &id, &subpath, &content_type, &bytes, &revision)?;
            println!("{}", serde_json::to_string_pretty(&resource)?);
        }
        Command::GetFile {
            resource_type,
            id,
            subpath,
        } => {
            let (bytes, content_type, revision) = db.get_file(&resource_type, &id, &subpath)?;
            eprintln!("content-type: {content_type}");
            eprintln!("revision: {revision}");
            use std::io::Write;
            std::io::stdout().write_all(&bytes)?;
        }
    }

    Ok(())
}
