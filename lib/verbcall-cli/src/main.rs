#![allow(missing_docs, clippy::print_stdout, clippy::print_stderr)]
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};
use url::Url;

use verbcall_core::{SchemaFaker, VerbCatalog, VerbClient, VerbConsole, VerbDescriptor, VerbRef};

mod args;
use self::args::{AppArgs, BodyArg, Command, SchemaSourceArg, USAGE};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let AppArgs { log_level, command } = AppArgs::parse().context("parsing arguments")?;
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();
    debug!(?command, "starting");

    match command {
        Command::List { catalog } => list(&catalog)?,
        Command::Fake { source } => fake(source).await?,
        Command::Call {
            verb,
            source,
            body,
            endpoint,
        } => return call(verb, source, body, endpoint).await,
        Command::Help => print!("{USAGE}"),
    }

    Ok(ExitCode::SUCCESS)
}

fn list(catalog: &Path) -> Result<()> {
    let catalog = VerbCatalog::load(catalog)
        .with_context(|| format!("loading catalog {}", catalog.display()))?;
    for descriptor in catalog.descriptors() {
        let marker = if descriptor.request_schema.is_some() {
            ""
        } else {
            " (no schema)"
        };
        println!("{}{marker}", descriptor.verb);
    }
    Ok(())
}

async fn fake(source: SchemaSourceArg) -> Result<()> {
    let (label, schema) = match source {
        SchemaSourceArg::Schema(path) => {
            let schema = read_schema(&path).await?;
            (path.display().to_string(), Some(schema))
        }
        SchemaSourceArg::Catalog(path, verb) => {
            let descriptor = catalog_descriptor(&path, &verb)?;
            (verb.to_string(), descriptor.request_schema)
        }
    };
    let request = SchemaFaker::new()
        .fake_request(schema.as_deref())
        .with_context(|| format!("faking a request for {label}"))?;
    println!("{request}");
    Ok(())
}

async fn call(
    verb: VerbRef,
    source: Option<SchemaSourceArg>,
    body: Option<BodyArg>,
    endpoint: Url,
) -> Result<ExitCode> {
    let descriptor = match source {
        Some(SchemaSourceArg::Schema(path)) => {
            VerbDescriptor::new(verb).with_request_schema(read_schema(&path).await?)
        }
        Some(SchemaSourceArg::Catalog(path, verb)) => catalog_descriptor(&path, &verb)?,
        None => VerbDescriptor::new(verb),
    };

    let client = VerbClient::builder()
        .with_endpoint(endpoint)
        .build()
        .context("building the verb client")?;
    info!(endpoint = %client.call_url(), verb = %descriptor.verb, "calling");

    let mut console = VerbConsole::new(client);
    console.select_verb(&descriptor);
    for warning in console.warnings() {
        warn!(%warning, "request not generated");
    }

    if let Some(body) = body {
        let text = read_body(&body).await?;
        console.set_buffer_text(text);
    }
    debug!(request = console.buffer().text(), "request ready");

    for diagnostic in console.diagnostics() {
        eprintln!("warning: {diagnostic}");
    }

    console.submit().await;
    let state = console.display_state().await;
    if let Some(payload) = state.success() {
        println!("{payload}");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{}", state.render());
        Ok(ExitCode::FAILURE)
    }
}

async fn read_schema(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading schema {}", path.display()))
}

fn catalog_descriptor(path: &Path, verb: &VerbRef) -> Result<VerbDescriptor> {
    let catalog = VerbCatalog::load(path)
        .with_context(|| format!("loading catalog {}", path.display()))?;
    let descriptor = catalog.descriptor(verb)?;
    Ok(descriptor)
}

async fn read_body(body: &BodyArg) -> Result<String> {
    match body {
        BodyArg::Stdin => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("reading request body from stdin")?;
            Ok(text)
        }
        BodyArg::File(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading request body {}", path.display())),
    }
}
