//! Authenticode verifier CLI
//!
//! Verifies PKCS#7 signatures embedded in PE files, dumps ASN.1 structures
//! and manages the verifier configuration file.

use authenticode_verifier::{
    domain::{
        asn1::{Element, ElementTree},
        constants::oid_name,
        pe::PeImage,
    },
    ConfigManager, VerificationReport, VerifierConfiguration, VerifyWorkflow,
};
use clap::{Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "authenticode-verifier")]
#[command(about = "Verify Authenticode signatures and inspect ASN.1 structures")]
#[command(long_about = "
Authenticode Verifier - offline PKCS#7 signature verification for PE files

EXAMPLES:
    # Verify a signed executable
    authenticode-verifier verify myapp.exe

    # Verify a detached PKCS#7 blob without image hashing
    authenticode-verifier verify signature.p7s --raw

    # Dump the ASN.1 structure of every embedded signature
    authenticode-verifier dump myapp.exe

    # Require a verified timestamp
    authenticode-verifier config set require_timestamp true

ENVIRONMENT VARIABLES:
    RUST_LOG        Logging level (debug, info, warn, error)
")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify the signatures of a signed PE file
    Verify {
        /// Signed PE file, or a DER PKCS#7 blob with --raw
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Treat the input as a bare PKCS#7 signature
        #[arg(long)]
        raw: bool,

        /// Skip the image digest comparison
        #[arg(long)]
        no_image_hash: bool,

        /// Fail unless a timestamp or countersignature verifies
        #[arg(long)]
        require_timestamp: bool,

        /// Configuration file (defaults to the user configuration directory)
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the ASN.1 element tree of embedded signatures
    Dump {
        /// PE file, or a DER blob with --raw
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Treat the input as a single DER element
        #[arg(long)]
        raw: bool,
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

    /// Print the configuration file path
    Path,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Parameters for the verify command
struct VerifyCommandArgs {
    file: PathBuf,
    raw: bool,
    no_image_hash: bool,
    require_timestamp: bool,
    config: Option<PathBuf>,
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Verify { verbose: true, .. });
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Verify {
            file,
            raw,
            no_image_hash,
            require_timestamp,
            config,
            verbose,
        } => {
            let args = VerifyCommandArgs {
                file,
                raw,
                no_image_hash,
                require_timestamp,
                config,
                verbose,
            };
            handle_verify_command(args)?;
        }

        Commands::Dump { file, raw } => {
            handle_dump_command(&file, raw)?;
        }

        Commands::Config(config_cmd) => {
            handle_config_command(config_cmd)?;
        }
    }

    Ok(())
}

fn load_configuration(path: Option<&Path>) -> Result<VerifierConfiguration> {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new().into_diagnostic()?,
    };
    manager
        .load_or_default()
        .into_diagnostic()
        .context("Failed to load configuration")
}

fn handle_verify_command(args: VerifyCommandArgs) -> Result<()> {
    let mut config = load_configuration(args.config.as_deref())?;
    if args.no_image_hash {
        config.verify_image_hash = false;
    }
    if args.require_timestamp {
        config.require_timestamp = true;
    }
    let verbose = args.verbose || config.verbose;

    let bytes = std::fs::read(&args.file)
        .into_diagnostic()
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    println!("🔍 Verifying {}", args.file.display());
    let workflow = VerifyWorkflow::new(config);
    let report = if args.raw {
        workflow.run_blob(bytes)
    } else {
        workflow.run(bytes)
    }
    .into_diagnostic()
    .context("Verification could not be completed")?;

    print_report(&report, verbose);

    if !report.success() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(report: &VerificationReport, verbose: bool) {
    if report.outcomes.is_empty() {
        println!("❌ File is not signed");
        return;
    }

    let mark = |ok: bool| if ok { "✅" } else { "❌" };
    println!("  {} Image hash", mark(report.image_hash_ok));
    println!("  {} Primary signature", mark(report.signature_ok));
    println!("  {} Nested signatures", mark(report.nested_ok));
    println!("  {} Timestamp", mark(report.timestamp_ok));

    if verbose || !report.success() {
        println!("\n📋 Signature graph:");
        for outcome in &report.outcomes {
            println!("  {outcome}");
        }
    }

    if report.success() {
        println!("\n✅ Signature verified");
    } else {
        println!("\n❌ Signature verification failed");
    }
}

fn handle_dump_command(file: &Path, raw: bool) -> Result<()> {
    let bytes = std::fs::read(file)
        .into_diagnostic()
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if raw {
        let element = Element::from_der(bytes).into_diagnostic()?;
        print!("{}", ElementTree::new(&element).with_oid_names(oid_name));
        return Ok(());
    }

    let image = PeImage::parse(bytes).into_diagnostic()?;
    let blobs = image.signatures().into_diagnostic()?;
    if blobs.is_empty() {
        println!("No PKCS#7 signatures present");
        return Ok(());
    }
    for (index, blob) in blobs.iter().enumerate() {
        let element = Element::decode(blob).into_diagnostic()?;
        println!("Signature #{index} ({} bytes):", blob.len());
        print!("{}", ElementTree::new(&element).with_oid_names(oid_name));
    }
    Ok(())
}

fn handle_config_command(config_cmd: ConfigCommands) -> Result<()> {
    let config_manager = ConfigManager::new().into_diagnostic()?;

    match config_cmd {
        ConfigCommands::Show => {
            let config = config_manager.load_or_default().into_diagnostic()?;
            println!("📋 Current Configuration:");
            println!("  Hash block size: {} bytes", config.hash_block_size);
            println!("  Verify image hash: {}", config.verify_image_hash);
            println!("  Require timestamp: {}", config.require_timestamp);
            println!("  Verbose: {}", config.verbose);
            println!(
                "  Configuration file: {}",
                config_manager.config_path().display()
            );
        }

        ConfigCommands::Init => {
            let _config = config_manager.load_or_create_default().into_diagnostic()?;
            println!(
                "✅ Configuration initialized: {}",
                config_manager.config_path().display()
            );
            println!("   Edit the file to customize settings, or use 'config set' commands.");
        }

        ConfigCommands::Path => {
            println!("{}", config_manager.config_path().display());
        }

        ConfigCommands::Set { key, value } => {
            config_manager
                .update_value(&key, &value)
                .into_diagnostic()?;
            println!("✅ Configuration updated: {key} = {value}");
        }
    }

    Ok(())
}
