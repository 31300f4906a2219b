//! Digisign CLI
//!
//! Command-line front end for the remote signing service: generate
//! credentials, sign files, verify detached signatures and manage the
//! client configuration.

use clap::{Parser, Subcommand, ValueEnum};
use digisign_client::{
    infra::progress::{ProgressFactory, ProgressReporter, ProgressStyle},
    save_artifact, ClientConfiguration, ConfigManager, ExportFormat, GenerateWorkflow,
    RenderedResult, ServiceUrl, SignWorkflow, VerifyWorkflow,
};
use miette::{Context, IntoDiagnostic, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "digisign")]
#[command(about = "Generate credentials, sign files and verify detached signatures")]
#[command(long_about = "
Digisign - client for a remote signing service

EXAMPLES:
    # Request a fresh certificate and private key
    digisign generate --output-dir ./credentials

    # Sign a file with a PEM key (writes report.pdf.sig)
    digisign sign report.pdf --key private_key.pem

    # Verify a detached signature
    digisign verify report.pdf --signature report.pdf.sig --cert certificate.pem

    # Point the client at another service
    digisign config set service_url https://sign.example.com

ENVIRONMENT VARIABLES:
    DIGISIGN_URL    Service base URL (overrides config)
    RUST_LOG        Logging level (debug, info, warn, error)
")]
#[command(version)]
struct Cli {
    /// Service base URL (overrides the configuration file)
    #[arg(long, global = true, env = "DIGISIGN_URL", value_name = "URL")]
    service_url: Option<String>,

    /// Configuration file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Progress indicator style
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressStyleArg>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a certificate and private key on the service
    Generate {
        /// Directory for the credentials archive
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Sign a file, producing a detached signature
    Sign {
        /// File to sign
        #[arg(value_name = "DATA_FILE")]
        data: PathBuf,

        /// PEM private key
        #[arg(short, long, value_name = "KEY_FILE")]
        key: PathBuf,

        /// Directory for the signature file
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Verify a detached signature against a file and certificate
    Verify {
        /// File that was signed
        #[arg(value_name = "DATA_FILE")]
        data: PathBuf,

        /// Signature file as produced by `sign`
        #[arg(short, long, value_name = "SIGNATURE_FILE")]
        signature: PathBuf,

        /// PEM certificate
        #[arg(short, long, value_name = "CERT_FILE")]
        cert: PathBuf,
    },

    /// Download the credentials archive directly
    Download {
        /// Directory for the credentials archive
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Create default configuration file
    Init,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Export configuration
    Export {
        /// Export format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ExportFormatArg,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import configuration
    Import {
        /// Configuration file to import
        file: PathBuf,
        /// Import format (guessed from the extension when omitted)
        #[arg(short, long, value_enum)]
        format: Option<ExportFormatArg>,
    },
}

#[derive(ValueEnum, Clone, Copy)]
enum ProgressStyleArg {
    Spinner,
    Plain,
    Silent,
}

impl From<ProgressStyleArg> for ProgressStyle {
    fn from(arg: ProgressStyleArg) -> Self {
        match arg {
            ProgressStyleArg::Spinner => ProgressStyle::Spinner,
            ProgressStyleArg::Plain => ProgressStyle::Plain,
            ProgressStyleArg::Silent => ProgressStyle::Silent,
        }
    }
}

#[derive(ValueEnum, Clone, Copy)]
enum ExportFormatArg {
    Toml,
    Json,
    Yaml,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Toml => ExportFormat::Toml,
            ExportFormatArg::Json => ExportFormat::Json,
            ExportFormatArg::Yaml => ExportFormat::Yaml,
        }
    }
}

/// Settings resolved from the config file and the global flags.
struct Session {
    config: ClientConfiguration,
    progress: Arc<dyn ProgressReporter>,
}

impl Session {
    fn output_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.unwrap_or_else(|| self.config.output_dir.clone())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let loaded = manager.load_or_default();

    let config_verbose = loaded.as_ref().is_ok_and(|config| config.verbose);
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(cli.verbose, config_verbose)),
    )
    .init();

    match cli.command {
        Commands::Config(config_cmd) => handle_config_command(&manager, config_cmd),
        command => {
            let config = loaded.wrap_err_with(|| {
                format!("Failed to load {}", manager.config_path().display())
            })?;
            let session = open_session(config, cli.service_url.as_deref(), cli.progress)?;
            run_operation(&session, command).await
        }
    }
}

/// Default log filter; `RUST_LOG` still takes precedence.
fn log_filter(cli_verbose: bool, config_verbose: bool) -> &'static str {
    if cli_verbose || config_verbose {
        "debug"
    } else {
        "info"
    }
}

async fn run_operation(session: &Session, command: Commands) -> Result<()> {
    match command {
        Commands::Generate { output_dir } => {
            let output_dir = session.output_dir(output_dir);
            handle_generate_command(session, &output_dir).await
        }
        Commands::Sign {
            data,
            key,
            output_dir,
        } => {
            let output_dir = session.output_dir(output_dir);
            handle_sign_command(session, data, key, &output_dir).await
        }
        Commands::Verify {
            data,
            signature,
            cert,
        } => handle_verify_command(session, data, signature, cert).await,
        Commands::Download { output_dir } => {
            let output_dir = session.output_dir(output_dir);
            handle_download_command(session, &output_dir).await
        }
        Commands::Config(_) => Ok(()),
    }
}

fn open_session(
    mut config: ClientConfiguration,
    service_url: Option<&str>,
    progress: Option<ProgressStyleArg>,
) -> Result<Session> {
    if let Some(url) = service_url {
        ServiceUrl::new(url).wrap_err("Invalid --service-url")?;
        config.service_url = url.to_string();
    }
    log::debug!("Using service at {}", config.service_url);

    let style = progress.map_or_else(|| config.progress(), ProgressStyle::from);
    Ok(Session {
        progress: ProgressFactory::create_reporter(style),
        config,
    })
}

async fn handle_generate_command(session: &Session, output_dir: &Path) -> Result<()> {
    let workflow =
        GenerateWorkflow::from_config(&session.config)?.with_progress(session.progress.clone());

    let rendered = workflow.generate().await?;
    report(&rendered, output_dir).await?;

    if rendered.is_positive() && rendered.artifact.is_none() {
        println!("   Run 'digisign download' to fetch the certificate and key.");
    }
    exit_on_negative(&rendered);
    Ok(())
}

async fn handle_sign_command(
    session: &Session,
    data: PathBuf,
    key: PathBuf,
    output_dir: &Path,
) -> Result<()> {
    let workflow =
        SignWorkflow::from_config(&session.config)?.with_progress(session.progress.clone());

    let rendered = workflow.sign(data, key).await?;
    report(&rendered, output_dir).await?;
    exit_on_negative(&rendered);
    Ok(())
}

async fn handle_verify_command(
    session: &Session,
    data: PathBuf,
    signature: PathBuf,
    cert: PathBuf,
) -> Result<()> {
    let workflow =
        VerifyWorkflow::from_config(&session.config)?.with_progress(session.progress.clone());

    let rendered = workflow.verify(data, signature, cert).await?;
    print_result(&rendered);
    exit_on_negative(&rendered);
    Ok(())
}

async fn handle_download_command(session: &Session, output_dir: &Path) -> Result<()> {
    let workflow = GenerateWorkflow::from_config(&session.config)?;
    let path = workflow
        .download(output_dir)
        .await
        .wrap_err("Download failed")?;
    println!("✅ Saved {}", path.display());
    Ok(())
}

/// Print the result and save its artifact, if any.
async fn report(rendered: &RenderedResult, output_dir: &Path) -> Result<()> {
    print_result(rendered);
    if let Some(artifact) = &rendered.artifact {
        let path = save_artifact(artifact, output_dir)
            .await
            .wrap_err("Failed to save result")?;
        println!("   Saved {}", path.display());
    }
    Ok(())
}

fn print_result(rendered: &RenderedResult) {
    if rendered.is_positive() {
        println!("✅ {}", rendered.message);
    } else {
        eprintln!("❌ {}", rendered.message);
    }
}

fn exit_on_negative(rendered: &RenderedResult) {
    if !rendered.is_positive() {
        std::process::exit(1);
    }
}

fn handle_config_command(manager: &ConfigManager, config_cmd: ConfigCommands) -> Result<()> {
    match config_cmd {
        ConfigCommands::Show => {
            if !manager.config_path().exists() {
                println!("📋 No configuration file found. Use 'config init' to create one.");
                return Ok(());
            }
            let config = manager.load()?;
            println!("📋 Current Configuration:");
            println!("  Service URL: {}", config.service_url);
            println!("  Generate path: {}", config.generate_path);
            println!("  Sign path: {}", config.sign_path);
            println!("  Verify path: {}", config.verify_path);
            println!("  Timeout: {}s", config.timeout_seconds);
            println!("  Output directory: {}", config.output_dir.display());
            println!("  Signature suffix: {}", config.signature_suffix);
            println!("  Credentials file: {}", config.credentials_file_name);
            println!("  Progress style: {}", config.progress_style);
            println!(
                "  Configuration file: {}",
                manager.config_path().display()
            );
        }
        ConfigCommands::Init => {
            manager.load_or_create_default()?;
            println!(
                "✅ Configuration initialized: {}",
                manager.config_path().display()
            );
            println!("   Edit the file to customize settings, or use 'config set' commands.");
        }
        ConfigCommands::Set { key, value } => {
            manager
                .update_value(&key, &value)
                .wrap_err_with(|| format!("Failed to set {key}"))?;
            println!("✅ Set {key} = {value}");
        }
        ConfigCommands::Export { format, output } => {
            let content = manager.export_config(format.into())?;
            if let Some(path) = output {
                std::fs::write(&path, content)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
                println!("✅ Configuration exported to: {}", path.display());
            } else {
                println!("{content}");
            }
        }
        ConfigCommands::Import { file, format } => {
            let content = std::fs::read_to_string(&file)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
            let format = format.map_or_else(|| ExportFormat::from_path(&file), Into::into);
            manager.import_config(&content, format)?;
            println!("✅ Configuration imported from: {}", file.display());
        }
    }
    Ok(())
}
