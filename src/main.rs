use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use licitagen::config::ConfigLoader;
use licitagen::types::data_por_extenso;
use licitagen::{
    Config, DocumentDataGenerator, DocumentType, RequestContext, create_cache, create_client,
};

#[derive(Parser)]
#[command(name = "licitagen")]
#[command(
    version,
    about = "AI data synthesis for Brazilian public procurement documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to licitagen.toml plus the global config)
    #[arg(long, short, env = "LICITAGEN_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default licitagen.toml to the current directory
    Init {
        #[arg(long, short, help = "Overwrite an existing config file")]
        force: bool,
    },

    /// List the expected fields of a document type
    Fields {
        /// Document type (institutional, etp, tr, demand, risco)
        doc_type: String,
    },

    /// Generate the data record for one document
    Generate {
        /// Document type (institutional, etp, tr, demand, risco)
        doc_type: String,

        #[arg(long, help = "Municipality name")]
        municipality: String,

        #[arg(long, help = "Contracting institution")]
        institution: String,

        #[arg(long, default_value = "", help = "Institution address")]
        address: String,

        #[arg(long, help = "Object of the procurement")]
        object: String,

        #[arg(long, default_value = "", help = "Estimated value, e.g. 150.000,00")]
        value: String,

        #[arg(long, short, help = "Write the record JSON to this file")]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(&cli);

    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("licitagen={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Init { force } => {
            let path = ConfigLoader::project_config_path();
            ConfigLoader::write_default(&path, force)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("wrote {}", path.display());
            Ok(())
        }

        Commands::Fields { doc_type } => {
            let doc_type: DocumentType = doc_type.parse()?;
            println!("# {} ({})", doc_type.display_name(), doc_type.slug());
            for field in licitagen::catalog::fields(doc_type) {
                let spec = licitagen::catalog::describe(doc_type, field);
                println!("{field}\t{}", spec.description);
            }
            Ok(())
        }

        Commands::Generate {
            doc_type,
            municipality,
            institution,
            address,
            object,
            value,
            output,
        } => {
            let doc_type: DocumentType = doc_type.parse()?;
            let config = load_config(cli.config.as_deref())?;

            let ctx = RequestContext {
                municipality,
                institution,
                address,
                object_description: object,
                value,
                date: data_por_extenso(chrono::Local::now().date_naive()),
            };

            let client = create_client(&config.llm)?;
            let cache = create_cache(&config.cache)?;
            let generator = DocumentDataGenerator::new(client, cache)
                .with_mode(config.llm.mode)
                .with_cache_ttl(std::time::Duration::from_secs(config.cache.ttl_secs));

            let record = generator.generate(doc_type, &ctx).await?;
            let rendered = serde_json::to_string_pretty(&record)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("wrote {}", path.display());
                }
                None => println!("{rendered}"),
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigLoader::load().context("loading configuration")?,
    };
    Ok(config)
}
