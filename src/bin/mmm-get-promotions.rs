use anyhow::Result;
use clap::Parser;
use mmm_client::{AppConfig, Client, EndpointConfig};
use serde_json::json;
use tokio_stream::{self, StreamExt};

#[derive(Parser, Debug)]
struct Args {
    #[arg(
        short = 'u',
        long,
        help = "Backend base URL. Defaults to MMM_API_URL or the local backend."
    )]
    api_url: Option<String>,
    #[arg(
        short = 'n',
        long = "name",
        help = "Only include places whose name contains this text (case-insensitive)."
    )]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let api_url = args.api_url.unwrap_or_else(|| AppConfig::from_env().api_url);
    let client = Client::new(
        mmm_client::default_http_client()?,
        EndpointConfig::new(api_url)?,
    );
    let filter = args.name.map(|name| name.to_lowercase());
    let places = client
        .get_places()
        .await?
        .into_iter()
        .filter(|place| match &filter {
            Some(filter) => place.name.to_lowercase().contains(filter),
            None => true,
        });
    let promotions = tokio_stream::iter(places)
        .then(|place| {
            let client = client.clone();
            async move {
                match client.get_discounts_by_place(place.id).await {
                    Ok(discounts) => json!({"place": place, "discounts": discounts}),
                    Err(e) => {
                        tracing::warn!(place_id = place.id, error = %e, "skipping place");
                        json!({"place": place, "error": e.to_string()})
                    }
                }
            }
        })
        .collect::<Vec<_>>()
        .await;

    println!("{}", serde_json::to_string_pretty(&promotions)?);
    Ok(())
}
