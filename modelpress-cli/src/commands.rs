//! CLI subcommand handlers.

use std::path::{Path, PathBuf};

use modelpress_core::catalog;
use modelpress_core::config::{load_config, PublishConfig};
use modelpress_core::publish::{write_report, Publisher};

use crate::{Commands, ConfigAction};

/// Handle a CLI subcommand.
pub async fn handle_command(
    command: Commands,
    config_file: Option<&Path>,
    quiet: bool,
) -> anyhow::Result<()> {
    match command {
        Commands::Run {
            models,
            store,
            version,
            keep_scratch,
            dry_run,
            report,
        } => {
            handle_run(
                config_file,
                models,
                store,
                version,
                keep_scratch,
                dry_run,
                report,
                quiet,
            )
            .await
        }
        Commands::List {
            store,
            version,
            remote,
        } => handle_list(config_file, store, version, remote).await,
        Commands::Convert { source, dest } => handle_convert(source, dest).await,
        Commands::Config { action } => handle_config(action, config_file),
    }
}

/// Load configuration and apply CLI flag overrides on top.
fn load_with_overrides(
    config_file: Option<&Path>,
    store: Option<String>,
    version: Option<String>,
    keep_scratch: bool,
) -> anyhow::Result<PublishConfig> {
    let mut config = load_config(config_file)?;
    if let Some(store) = store {
        config.store_url = store;
    }
    if let Some(version) = version {
        config.version = version;
    }
    if keep_scratch {
        config.keep_scratch = true;
    }
    config.validate()?;
    tracing::debug!(
        store = %config.store_url,
        version = %config.version,
        "effective configuration"
    );
    Ok(config)
}

#[allow(clippy::too_many_arguments)]
async fn handle_run(
    config_file: Option<&Path>,
    models: Vec<String>,
    store: Option<String>,
    version: Option<String>,
    keep_scratch: bool,
    dry_run: bool,
    report: Option<PathBuf>,
    quiet: bool,
) -> anyhow::Result<()> {
    let config = load_with_overrides(config_file, store, version, keep_scratch)?;
    let entries = Publisher::select(&models)?;

    if dry_run {
        println!(
            "Would publish {} checkpoint(s) to {}:",
            entries.len(),
            config.store_url
        );
        for entry in entries {
            println!(
                "  {:<20} {} -> {}",
                entry.name,
                entry.weights_url(&config.hub_base_url),
                entry.object_key(&config.version)
            );
        }
        return Ok(());
    }

    let publisher = Publisher::new(config)?.with_progress(!quiet);
    let run = publisher.publish_all(&models).await?;

    println!(
        "Published {} checkpoint(s) to {}:",
        run.outcomes.len(),
        run.store
    );
    for outcome in &run.outcomes {
        println!(
            "  {:<20} {} tensors, {} bytes -> {}",
            outcome.name, outcome.tensor_count, outcome.bytes_uploaded, outcome.object_key
        );
    }

    if let Some(path) = report {
        write_report(&path, &run)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

async fn handle_list(
    config_file: Option<&Path>,
    store: Option<String>,
    version: Option<String>,
    remote: bool,
) -> anyhow::Result<()> {
    let config = load_with_overrides(config_file, store, version, false)?;

    println!("Catalog ({} checkpoints):", catalog::CATALOG.len());
    if remote {
        let publisher = Publisher::new(config.clone())?;
        for entry in catalog::CATALOG {
            let status = if publisher.published(entry).await? {
                "published"
            } else {
                "missing"
            };
            println!(
                "  {:<20} {:<40} {}  [{}]",
                entry.name,
                entry.repo,
                entry.object_key(&config.version),
                status
            );
        }
    } else {
        for entry in catalog::CATALOG {
            println!(
                "  {:<20} {:<40} {}",
                entry.name,
                entry.repo,
                entry.object_key(&config.version)
            );
        }
    }
    Ok(())
}

async fn handle_convert(source: PathBuf, dest: PathBuf) -> anyhow::Result<()> {
    let report =
        tokio::task::spawn_blocking(move || modelpress_core::convert_checkpoint(&source, &dest))
            .await??;
    println!(
        "Converted {} tensors: {} ({} bytes) -> {} ({} bytes)",
        report.tensor_count,
        report.source_path.display(),
        report.source_size_bytes,
        report.output_path.display(),
        report.output_size_bytes
    );
    Ok(())
}

fn handle_config(action: ConfigAction, config_file: Option<&Path>) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let dirs = directories::ProjectDirs::from("dev", "modelpress", "modelpress")
                .ok_or_else(|| anyhow::anyhow!("could not determine user config directory"))?;
            let config_path = dirs.config_dir().join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            std::fs::create_dir_all(dirs.config_dir())?;
            let toml_str = toml::to_string_pretty(&PublishConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config(config_file)?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_overrides_apply() {
        let config = load_with_overrides(
            None,
            Some("memory:".to_string()),
            Some("9".to_string()),
            true,
        )
        .unwrap();
        assert_eq!(config.store_url, "memory:");
        assert_eq!(config.version, "9");
        assert!(config.keep_scratch);
    }

    #[test]
    fn test_overrides_win_over_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "store_url = \"memory:\"\nversion = \"7\"\n").unwrap();

        let config =
            load_with_overrides(Some(&path), None, Some("9".to_string()), false).unwrap();
        assert_eq!(config.store_url, "memory:");
        assert_eq!(config.version, "9");
    }

    #[test]
    fn test_no_overrides_keeps_loaded_values() {
        let config = load_with_overrides(None, None, None, false).unwrap();
        assert_eq!(config.version, PublishConfig::default().version);
    }
}
