// ============================================================================
// market-data - Point d'entrée
// ============================================================================
// CLI autour du handler serverless :
// - fetch    : récupère les cotations d'une liste de tickers
// - invoke   : exécute le handler sur un événement JSON (fichier ou stdin)
// - diagnose : affiche ce qui est disponible dans l'environnement
//
// CONCEPTS RUST CLÉS :
// 1. clap derive : la structure des arguments est décrite par des types
// 2. Async dans sync : tokio::runtime::Runtime + block_on
// ============================================================================

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::{error, info};

use market_data::api::ProviderKind;
use market_data::config::Config;
use market_data::diagnostics;
use market_data::handle_event;
use market_data::models::LambdaResponse;

// ============================================================================
// Arguments
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "market-data", version, about = "Cotations boursières avec replis successifs")]
struct Cli {
    /// Écrit les logs dans un fichier journalier plutôt que sur stderr
    #[arg(long, global = true)]
    log_to_file: bool,

    #[command(subcommand)]
    command: Command,
}

/// Options communes aux commandes qui appellent le handler
#[derive(Debug, clap::Args)]
struct FetchOptions {
    /// Provider à utiliser (sinon MARKET_DATA_PROVIDER, sinon scraper)
    #[arg(long, value_enum)]
    provider: Option<ProviderKind>,

    /// Désactive toutes les pauses (retries et espacement)
    #[arg(long)]
    no_delay: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Récupère les cotations des tickers donnés
    Fetch {
        #[arg(required = true)]
        tickers: Vec<String>,

        #[command(flatten)]
        options: FetchOptions,
    },

    /// Exécute le handler sur un événement JSON
    Invoke {
        /// Fichier contenant l'événement ; stdin si absent
        #[arg(long)]
        event: Option<PathBuf>,

        #[command(flatten)]
        options: FetchOptions,
    },

    /// Diagnostic de l'environnement d'exécution
    Diagnose {
        /// Résumé texte plutôt que la réponse JSON
        #[arg(long)]
        human: bool,
    },
}

// ============================================================================
// Initialisation du logging
// ============================================================================

/// Initialise tracing
///
/// - Par défaut : stderr (les runtimes serverless capturent les flux)
/// - Avec --log-to-file : rotation quotidienne dans
///   ~/.local/share/market-data/logs/market-data.log (ou ./logs)
///
/// Le niveau se contrôle avec RUST_LOG (ex : RUST_LOG=market_data=debug).
fn init_logging(to_file: bool) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "market_data=info,warn".into());

    if to_file {
        let log_dir = dirs::data_local_dir()
            .map(|dir| dir.join("market-data").join("logs"))
            .unwrap_or_else(|| PathBuf::from("./logs"));
        std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

        let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "market-data.log");

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true),
            )
            .with(filter)
            .init();

        info!(?log_dir, "Logging initialisé");
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .init();
    }

    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_to_file).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
    });

    let mut config = Config::from_env()?;

    match cli.command {
        Command::Fetch { tickers, options } => {
            apply_options(&mut config, &options);
            let event = json!({ "tickers": tickers });
            let response = run_handler(&event, &config)?;
            print_body(&response)?;
            exit_status(&response)
        }
        Command::Invoke { event, options } => {
            apply_options(&mut config, &options);
            let event = read_event(event.as_ref())?;
            let response = run_handler(&event, &config)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Command::Diagnose { human } => {
            if human {
                println!("{}", diagnostics::render_human(&diagnostics::collect(&config)));
            } else {
                let response = diagnostics::handle_diagnostics(&config);
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
            Ok(())
        }
    }
}

/// Les flags de la CLI priment sur l'environnement
fn apply_options(config: &mut Config, options: &FetchOptions) {
    if let Some(provider) = options.provider {
        config.provider = provider;
    }
    if options.no_delay {
        config.no_delay = true;
    }
}

/// Exécute le handler async dans un runtime tokio
fn run_handler(event: &Value, config: &Config) -> Result<LambdaResponse> {
    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;
    let response = runtime.block_on(handle_event(event, config));
    info!(status = response.status_code, "Handler finished");
    Ok(response)
}

/// Lit l'événement depuis un fichier ou stdin
fn read_event(path: Option<&PathBuf>) -> Result<Value> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Impossible de lire stdin")?;
            buffer
        }
    };
    serde_json::from_str(&raw).context("Événement JSON invalide")
}

/// Affiche le body JSON indenté
fn print_body(response: &LambdaResponse) -> Result<()> {
    let body = response.body_json()?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn exit_status(response: &LambdaResponse) -> Result<()> {
    if response.status_code == 200 {
        Ok(())
    } else {
        error!(status = response.status_code, "Handler returned an error");
        anyhow::bail!("handler returned HTTP {}", response.status_code)
    }
}
