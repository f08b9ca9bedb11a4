mod args;

use anyhow::Context;
use args::Args;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vrops_core::{OpsConfig, ResponseFormat};
use vrops_resources::{ResourceList, ResourcesClient};

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "vrops_core=debug,vrops_resources=debug,vrops_cli=debug"
    } else {
        "warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = OpsConfig::new(args.server.clone())
        .context("invalid server")?
        .with_format(ResponseFormat::from(args.format))
        .with_tls_verify(!args.insecure)
        .with_timeout(args.timeout)
        .with_query_encoding(args.query_encoding());

    let mut builder = ResourcesClient::builder(config);
    if let Some(token) = args.token.clone() {
        builder = builder.with_token(token);
    }
    let client = builder.build()?;
    let query = args.to_query();
    debug!(
        server = %args.server,
        format = %client.config().format,
        paged = query.paging.to_body().is_some(),
        "Querying resources"
    );

    match client.query_resources(&query).await? {
        ResourceList::Json { resources, .. } => {
            println!("{}", serde_json::to_string_pretty(&resources)?);
        }
        ResourceList::Xml { document, .. } => println!("{document}"),
    }

    Ok(())
}
