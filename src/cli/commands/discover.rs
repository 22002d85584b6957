//! Implementation of the `remote-test-parser discover` command.

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::adapters::replay::{NoopInstaller, ReplayDevice};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, Test, TestBundle};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::LoggerImpl;
use crate::services::{RemoteTestParser, TestBundleIdentifier};

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// YAML file listing the test bundles
    #[arg(long)]
    pub bundles: PathBuf,

    /// Directory of recorded instrumentation transcripts
    #[arg(long)]
    pub transcripts: PathBuf,

    /// Configuration file (defaults to ./discovery.yaml)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Device serial to report
    #[arg(long, default_value = "replay")]
    pub serial: String,
}

#[derive(Debug, Serialize)]
pub struct DiscoverOutput {
    pub serial: String,
    pub bundles: usize,
    pub tests: Vec<DiscoveredTest>,
}

#[derive(Debug, Serialize)]
pub struct DiscoveredTest {
    #[serde(flatten)]
    pub test: Test,
    pub bundle: Option<String>,
}

impl CommandOutput for DiscoverOutput {
    fn to_human(&self) -> String {
        if self.tests.is_empty() {
            return format!("No tests discovered on {}", self.serial);
        }

        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Class").add_attribute(Attribute::Bold),
                Cell::new("Method").add_attribute(Attribute::Bold),
                Cell::new("Annotations").add_attribute(Attribute::Bold),
                Cell::new("Bundle").add_attribute(Attribute::Bold),
            ]);

        for entry in &self.tests {
            let annotations = entry
                .test
                .annotations
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            table.add_row(vec![
                Cell::new(entry.test.class_name()),
                Cell::new(&entry.test.method),
                Cell::new(annotations),
                Cell::new(entry.bundle.as_deref().unwrap_or("-")),
            ]);
        }

        format!(
            "{table}\n\nDiscovered {} test(s) in {} bundle(s) on {}",
            self.tests.len(),
            self.bundles,
            self.serial
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Read the bundle list.
pub fn load_bundles(path: &Path) -> Result<Vec<TestBundle>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read bundles from {}", path.display()))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse bundles from {}", path.display()))
}

pub async fn execute(args: DiscoverArgs, json_mode: bool) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let _logger = LoggerImpl::init(&config.logging).context("Failed to initialize logging")?;

    let bundles = load_bundles(&args.bundles)?;
    let device = ReplayDevice::new(args.serial.clone(), &args.transcripts);
    let bundle_identifier = Arc::new(TestBundleIdentifier::new());
    let parser = RemoteTestParser::new(
        config.discovery.clone(),
        Arc::new(NoopInstaller),
        bundle_identifier.clone(),
    );

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling discovery");
            ctrl_c.cancel();
        }
    });

    let tests = parser
        .extract(&device, &bundles, &cancel)
        .await
        .with_context(|| format!("Test discovery failed on {}", args.serial))?;

    let tests = tests
        .into_iter()
        .map(|test| {
            let bundle = bundle_identifier.identify(&test.id()).map(|b| b.id.0);
            DiscoveredTest { test, bundle }
        })
        .collect();

    output(
        &DiscoverOutput {
            serial: args.serial,
            bundles: bundles.len(),
            tests,
        },
        json_mode,
    );
    Ok(())
}
