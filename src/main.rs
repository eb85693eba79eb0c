use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rustdirectus::transport::{HttpTransport, Transport, TransportRequest, envelope};
use rustdirectus::{ClientConfig, Filter, ReadParams};
use serde_json::Value;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rustdirectus")]
#[command(about = "Inspect a Directus instance and compile filter expressions")]
struct Cli {
    /// Base URL; defaults to DIRECTUS_URL
    #[arg(long, global = true)]
    url: Option<String>,

    /// Access token; defaults to DIRECTUS_TOKEN
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the instance answers its health endpoint
    Ping,
    /// Print the filter object for one or more comparisons
    Filter {
        #[arg(required = true)]
        expressions: Vec<String>,
    },
    /// Fetch one item as JSON
    Get {
        collection: String,
        id: String,
        #[arg(long)]
        fields: Option<String>,
    },
    /// List items as JSON
    List {
        collection: String,
        #[arg(long = "filter")]
        filters: Vec<String>,
        #[arg(long)]
        fields: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Filter { expressions } => {
            let filter = Filter::compile(&expressions)?;
            println!("{}", serde_json::to_string_pretty(&filter.into_value())?);
            Ok(())
        }
        Command::Ping => {
            let transport = connect(cli.url, cli.token)?;
            transport.ping().await?;
            println!("ok");
            Ok(())
        }
        Command::Get {
            collection,
            id,
            fields,
        } => {
            let transport = connect(cli.url, cli.token)?;
            let params = ReadParams {
                fields,
                ..ReadParams::default()
            };
            let request = params.apply(TransportRequest::get(["items", collection.as_str(), id.as_str()]));
            print_data(&transport, request).await
        }
        Command::List {
            collection,
            filters,
            fields,
            limit,
        } => {
            let transport = connect(cli.url, cli.token)?;
            let filter = Filter::compile(&filters)?;
            let params = ReadParams {
                filter: (!filter.is_empty()).then(|| filter.to_string()),
                fields,
                limit,
                ..ReadParams::default()
            };
            let request = params.apply(TransportRequest::get(["items", collection.as_str()]));
            print_data(&transport, request).await
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rustdirectus=warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn connect(url: Option<String>, token: Option<String>) -> Result<HttpTransport> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = url {
        config.base_url = url;
    }
    if let Some(token) = token {
        config = config.token(&token);
    }
    config.validate()?;
    HttpTransport::new(&config).with_context(|| format!("cannot build transport for {}", config.base_url))
}

async fn print_data(transport: &HttpTransport, request: TransportRequest) -> Result<()> {
    let path = request.path();
    let response = transport
        .send(request)
        .await
        .with_context(|| format!("request to {} failed", path))?;
    let data: Value = envelope::decode(&response)?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}
