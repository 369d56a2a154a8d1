use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use xsdvalidate::config::ErrorConfig;
use xsdvalidate::output::{EXIT_FAILURE, exit_code};
use xsdvalidate::{
    AsyncHttpClient, Cli, Config, ConfigManager, DocumentHandle, HttpClientConfig, Output,
    SchemaHandle, SchemaSource, ValidationOutcome, VerbosityLevel, XsdRuntime,
};

// cat crs_payload.xml | validatexml-xsd -s CrsXML_v2.0.xsd -v
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let schema_source = match cli.validate() {
        Ok(source) => source.to_string(),
        Err(message) => {
            println!("{}", message);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let config = match ConfigManager::load_config(&cli).await {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {}", err);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    init_tracing(VerbosityLevel::from_flags(
        config.output.verbose,
        config.output.quiet,
    ));

    let output = Output::new(config.output.format, config.errors.delimiter.clone());

    match run(&cli, &config, &schema_source).await {
        Ok(outcome) => {
            println!("{}", output.format_outcome(&outcome));
            ExitCode::from(exit_code(&outcome))
        }
        Err(err) => {
            eprintln!("{}", output.format_failure(&format!("{:#}", err)));
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn init_tracing(verbosity: VerbosityLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli, config: &Config, schema_source: &str) -> anyhow::Result<ValidationOutcome> {
    let document = read_input(cli.file.as_deref()).await?;

    let remote_schema = match SchemaSource::classify(schema_source) {
        SchemaSource::Url(url) => {
            let client = AsyncHttpClient::new(HttpClientConfig {
                timeout_seconds: config.network.timeout_seconds,
                ..Default::default()
            })?;
            let schema_data = client
                .download_schema(&url)
                .await
                .with_context(|| format!("failed to fetch schema {}", url))?;
            Some((url, schema_data))
        }
        SchemaSource::Path(_) => None,
    };

    let runtime = match config.runtime.reclaim_interval() {
        Some(interval) => XsdRuntime::init_with_reclamation(interval)?,
        None => XsdRuntime::init()?,
    };

    let outcome = validate(
        &runtime,
        schema_source,
        remote_schema
            .as_ref()
            .map(|(url, schema_data)| (url.as_str(), schema_data.as_slice())),
        &document,
        &config.errors,
    );
    runtime.cleanup()?;

    Ok(outcome?)
}

/// Handles are released in reverse order of creation when this returns
fn validate(
    runtime: &XsdRuntime,
    schema_source: &str,
    remote_schema: Option<(&str, &[u8])>,
    document: &[u8],
    errors: &ErrorConfig,
) -> xsdvalidate::Result<ValidationOutcome> {
    let schema = match remote_schema {
        // Includes of a fetched schema resolve against its URL
        Some((url, schema_data)) => {
            SchemaHandle::parse_memory(runtime, url, schema_data, errors.parse_mode)?
        }
        None => SchemaHandle::parse(runtime, schema_source, errors.parse_mode)?,
    };
    let document = DocumentHandle::parse(runtime, document, errors.parse_mode)?;

    schema.validate(&document, errors.validate_mode)
}

async fn read_input(path: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match path {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            // Otherwise, try loading from standard input
            let mut buffer = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buffer)
                .await
                .context("Error occurred while reading from standard input")?;
            Ok(buffer)
        }
    }
}
