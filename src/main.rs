use anyhow::Result;
use clap::Parser;
use hspy_bundle::commands::{self, BundleOptions, Config, GlobalOptions};
use std::path::PathBuf;

/// hspy-bundle - HyperSpy WinPython bundle builder
///
/// Curates the 32-bit and 64-bit WinPython distributions of a bundle folder down to the
/// packages HyperSpy needs, records their install manifests and generates one NSIS
/// installer script per architecture.
///
/// Examples:
///   hspy-bundle -r D:\hspy_bundle bundle    # Run the whole pipeline
///   hspy-bundle prune --dry-run             # List packages that would be removed
///   hspy-bundle --product-version 0.8.1 installers
#[derive(Parser, Debug)]
#[command(author, version = env!("HSPY_BUNDLE_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Bundle root holding the WinPython folders (defaults to the current directory; also via HSPY_BUNDLE_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "HSPY_BUNDLE_ROOT",
        value_name = "PATH",
        global = true
    )]
    pub root: Option<PathBuf>,

    /// JSON configuration file (defaults to <root>/hspy_bundle.json when present)
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Use this product version instead of asking the package index
    #[arg(long = "product-version", value_name = "VERSION", global = true)]
    pub product_version: Option<String>,

    /// Package index URL (defaults to https://pypi.python.org)
    #[arg(long = "index-url", value_name = "URL", global = true)]
    pub index_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Uninstall every package that is not in the allow-list
    Prune(PruneArgs),

    /// Delete the Qt and TortoiseHg tools shipped with WinPython
    RemoveTools,

    /// Install the architecture-matched artifacts from packages2install
    InstallLocal,

    /// Install packages from the package index in both distributions
    Install(InstallArgs),

    /// Run the HyperSpy test suite in both distributions
    Test,

    /// Write the install manifest of both distributions
    Manifest(ManifestArgs),

    /// Generate the 32-bit and 64-bit NSIS installer scripts
    Installers(InstallersArgs),

    /// Download the HyperSpy license next to the installer scripts
    License,

    /// Run every step: prune, remove tools, install, manifest, installers
    Bundle(BundleArgs),
}

#[derive(clap::Args, Debug)]
pub struct PruneArgs {
    /// Only list the packages that would be uninstalled
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Package names (defaults to the configured list: configobj, hyperspy)
    #[arg(value_name = "NAME")]
    pub names: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct ManifestArgs {
    /// Record .pyc/.swp files instead of deleting them
    #[arg(long)]
    pub keep_transient: bool,
}

#[derive(clap::Args, Debug)]
pub struct InstallersArgs {
    /// Directory for the generated scripts, relative to the bundle root
    #[arg(long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct BundleArgs {
    /// Skip installing staged and index packages
    #[arg(long)]
    pub skip_install: bool,

    /// Also download the license file
    #[arg(long)]
    pub with_license: bool,

    /// Record .pyc/.swp files instead of deleting them
    #[arg(long)]
    pub keep_transient: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = hspy_bundle::runtime::RealRuntime;

    let options = GlobalOptions {
        root: cli.root,
        config: cli.config,
        product_version: cli.product_version,
        index_url: cli.index_url,
    };
    let config = Config::new(runtime, options)?;

    match cli.command {
        Commands::Prune(args) => {
            commands::prune(&config, args.dry_run).await?;
        }
        Commands::RemoveTools => {
            commands::remove_tools(&config)?;
        }
        Commands::InstallLocal => {
            commands::install_local(&config).await?;
        }
        Commands::Install(args) => {
            commands::install(&config, &args.names).await?;
        }
        Commands::Test => {
            commands::run_tests(&config).await?;
        }
        Commands::Manifest(args) => {
            commands::manifest(&config, args.keep_transient).await?;
        }
        Commands::Installers(args) => {
            commands::installers(&config, args.output_dir.as_deref()).await?;
        }
        Commands::License => {
            commands::license(&config).await?;
        }
        Commands::Bundle(args) => {
            let options = BundleOptions {
                skip_install: args.skip_install,
                with_license: args.with_license,
                keep_transient: args.keep_transient,
            };
            commands::bundle(&config, options).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_prune_parsing() {
        let cli = Cli::try_parse_from(["hspy-bundle", "prune", "--dry-run"]).unwrap();
        match cli.command {
            Commands::Prune(args) => assert!(args.dry_run),
            _ => panic!("Expected Prune command"),
        }
        assert_eq!(cli.root, None);
    }

    #[test]
    fn test_cli_install_names_parsing() {
        let cli = Cli::try_parse_from(["hspy-bundle", "install", "hyperspy", "six"]).unwrap();
        match cli.command {
            Commands::Install(args) => assert_eq!(args.names, vec!["hyperspy", "six"]),
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "hspy-bundle",
            "installers",
            "--root",
            "/tmp/bundle",
            "--product-version",
            "0.8.1",
            "--output-dir",
            "dist",
        ])
        .unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/bundle")));
        assert_eq!(cli.product_version.as_deref(), Some("0.8.1"));
        match cli.command {
            Commands::Installers(args) => assert_eq!(args.output_dir, Some(PathBuf::from("dist"))),
            _ => panic!("Expected Installers command"),
        }
    }

    #[test]
    fn test_cli_bundle_flags() {
        let cli = Cli::try_parse_from([
            "hspy-bundle",
            "-r",
            "/tmp/bundle",
            "bundle",
            "--skip-install",
            "--with-license",
        ])
        .unwrap();
        match cli.command {
            Commands::Bundle(args) => {
                assert!(args.skip_install);
                assert!(args.with_license);
                assert!(!args.keep_transient);
            }
            _ => panic!("Expected Bundle command"),
        }
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        let result = Cli::try_parse_from(["hspy-bundle"]);
        assert!(result.is_err());
    }
}
