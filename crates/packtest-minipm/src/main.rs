use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod install;
mod manifest;
mod render;

use install::{
    install_package, list_installed, resolve_source, uninstall_package, InstallOutcome, SiteRoot,
};
use render::{file_count_fragment, status_line};

#[derive(Parser, Debug)]
#[command(name = "minipm")]
#[command(about = "Minimal local-directory package manager", long_about = None)]
struct Cli {
    /// Installation prefix; falls back to the MINIPM_PREFIX variable.
    #[arg(long)]
    prefix: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Install {
        /// Source directory path, or a name==version spec.
        spec: String,
        /// Directory of package source dirs used to resolve name==version specs.
        #[arg(long)]
        find_links: Option<PathBuf>,
        /// Install into this directory instead of the prefix's site dir.
        #[arg(long, short = 't')]
        target: Option<PathBuf>,
        /// Replace an already-installed version.
        #[arg(long)]
        upgrade: bool,
    },
    Uninstall {
        name: String,
    },
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let site = resolve_site(cli.prefix.as_deref(), &cli.command)?;

    match cli.command {
        Commands::Install {
            spec,
            find_links,
            upgrade,
            ..
        } => {
            let source = resolve_source(&spec, find_links.as_deref())?;
            match install_package(&site, &source, upgrade)? {
                InstallOutcome::Installed {
                    name,
                    version,
                    file_count,
                } => {
                    println!(
                        "{}",
                        status_line(
                            "Installed",
                            &format!("{name} {version} ({})", file_count_fragment(file_count))
                        )
                    );
                }
                InstallOutcome::AlreadyInstalled { name, version } => {
                    eprintln!(
                        "warning: package '{name}' {version} is already installed (use --upgrade to reinstall)"
                    );
                }
                InstallOutcome::Upgraded {
                    name,
                    previous,
                    version,
                    file_count,
                } => {
                    println!(
                        "{}",
                        status_line(
                            "Upgraded",
                            &format!(
                                "{name} {previous} -> {version} ({})",
                                file_count_fragment(file_count)
                            )
                        )
                    );
                }
            }
        }
        Commands::Uninstall { name } => match uninstall_package(&site, &name)? {
            Some(version) => {
                println!("{}", status_line("Removed", &format!("{name} {version}")));
            }
            None => {
                anyhow::bail!("package '{name}' is not installed");
            }
        },
        Commands::List => {
            for receipt in list_installed(&site)? {
                println!("{} {}", receipt.name, receipt.version);
            }
        }
    }

    Ok(())
}

/// The install/list/uninstall destination: an explicit target directory for
/// installs, otherwise `<prefix>/site`.
fn resolve_site(prefix_flag: Option<&std::path::Path>, command: &Commands) -> Result<SiteRoot> {
    if let Commands::Install {
        target: Some(target),
        ..
    } = command
    {
        return Ok(SiteRoot::new(target.clone()));
    }

    let prefix = match prefix_flag {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(
            std::env::var("MINIPM_PREFIX")
                .context("no prefix configured (pass --prefix or set MINIPM_PREFIX)")?,
        ),
    };
    Ok(SiteRoot::new(prefix.join("site")))
}
