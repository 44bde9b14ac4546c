use std::{path::PathBuf, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use mmm_client::{
    auth,
    cookies::CookieStore,
    discounts::{DiscountImage, NewDiscount, PublishPanel},
    export::DEFAULT_FILE_NAME,
    loader::{CollectionView, FeaturedListings},
    places::Places,
    selection::PlaceSelection,
    session::{MealPlanSession, Sender},
    sheet::SheetConfig,
    AppConfig, Client, EndpointConfig,
};

#[derive(Parser, Debug)]
#[command(name = "mapmymeal", about = "Places, promotions and meal plans from the command line")]
struct CliArgs {
    #[command(subcommand)]
    pub subcommand: Command,

    #[command(flatten)]
    pub global_opts: GlobalOpts,
}

#[derive(Args, Debug)]
struct GlobalOpts {
    #[arg(short = 'u', long, global = true, help = "Backend base URL. Defaults to MMM_API_URL")]
    pub api_url: Option<String>,

    #[arg(long, global = true, help = "Session relay URL. Defaults to MMM_SESSION_RELAY_URL")]
    pub relay_url: Option<String>,

    #[arg(short = 't', long, global = true, env = "MMM_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[arg(
        short = 'j',
        long,
        global = true,
        default_value = "mapmymeal-cookies.json",
        help = "File the login cookies are kept in"
    )]
    pub cookie_jar: PathBuf,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    #[clap(name = "places", about = "List the places shown on the map")]
    Places {
        #[arg(long, help = "Read places from a file saved earlier instead of the API")]
        from_file: Option<PathBuf>,

        #[arg(short = 'o', long, help = "Output file")]
        output_path: Option<PathBuf>,
    },

    #[clap(name = "promotions", about = "Discounts and products of one place")]
    Promotions { place_id: i64 },

    #[clap(name = "featured", about = "Current and top discounts")]
    Featured,

    #[clap(name = "plan", about = "Generate a meal plan from a free-text request")]
    Plan {
        prompt: String,

        #[arg(short = 'o', long, help = "Export the plan to this file")]
        output_path: Option<PathBuf>,
    },

    #[clap(name = "login", about = "Log in and store the session token")]
    Login {
        #[arg(short = 'e', long)]
        email: String,

        #[arg(short = 'p', long, env = "MMM_PASSWORD", hide_env_values = true)]
        password: String,
    },

    #[clap(name = "publish", about = "Publish a discount for a place")]
    Publish {
        #[command(flatten)]
        discount: DiscountOpts,
    },
}

#[derive(Args, Debug, PartialEq)]
struct DiscountOpts {
    #[arg(long)]
    pub place_id: i64,
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long)]
    pub price: f64,
    #[arg(long, help = "Start time as HH:MM")]
    pub start_time: String,
    #[arg(long, help = "End time as HH:MM")]
    pub end_time: String,
    #[arg(long, help = "0-6 Sunday to Saturday, 7 every day, 8 weekends")]
    pub day_of_week: u8,
    #[arg(long, help = "Image file to attach")]
    pub image: Option<PathBuf>,
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "mapmymeal=info,mmm_client=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn print_collection(heading: &str, view: CollectionView) {
    println!("== {heading} ==");
    match view {
        CollectionView::Skeletons(_) => println!("(loading)"),
        CollectionView::Error { message, hint } => println!("{message}\n{hint}"),
        CollectionView::Empty(message) => println!("{message}"),
        CollectionView::Cards(cards) => {
            for card in cards {
                let mut line = format!("[{}] {} ({} votes)", card.key, card.label, card.votes);
                if let Some(price) = card.price {
                    line.push_str(&format!(" {price}"));
                }
                if let Some(schedule) = card.schedule {
                    line.push_str(&format!(" - {schedule}"));
                }
                println!("{line}");
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = CliArgs::parse();
    let mut config = AppConfig::from_env();
    if let Some(api_url) = args.global_opts.api_url {
        config.api_url = api_url;
    }
    if let Some(relay_url) = args.global_opts.relay_url {
        config.session_relay_url = Some(relay_url);
    }

    let http = mmm_client::default_http_client()?;
    let endpoints = EndpointConfig::new(config.api_url.as_str())?
        .with_session_relay(config.session_relay_url.clone());
    let mut cookie_jar = CookieStore::open(&args.global_opts.cookie_jar)
        .await
        .with_context(|| format!("opening {}", args.global_opts.cookie_jar.display()))?;
    let token = args
        .global_opts
        .token
        .or_else(|| auth::stored_token(&cookie_jar).map(str::to_string));
    let client = match token {
        Some(token) => Client::new(http, endpoints).with_token(token),
        None => Client::new(http, endpoints),
    };

    match args.subcommand {
        Command::Places {
            from_file,
            output_path,
        } => {
            let places = match from_file {
                Some(path) => Places::load(&path).await?,
                None => client.get_places().await?,
            };
            if let Some(output_path) = output_path {
                places.save(&output_path).await?;
                tracing::info!(count = places.len(), path = %output_path.display(), "places saved");
            } else {
                println!("{}", serde_json::to_string_pretty(&places)?);
            }
        }
        Command::Promotions { place_id } => {
            let places = client.get_places().await?;
            let place = places
                .get(place_id)
                .cloned()
                .ok_or_else(|| anyhow!("no place with id {place_id}"))?;
            println!("{}", place.name);
            let mut selection = PlaceSelection::new(SheetConfig::default(), 800.0)?;
            selection.select_place(place);
            if let Some(ticket) = selection.request_expand()? {
                selection.load_promotions(&client, ticket).await;
            }
            print_collection("Discounts", selection.promotions().discounts().view());
            print_collection("Products", selection.promotions().products().view());
        }
        Command::Featured => {
            let featured = FeaturedListings::load(&client).await;
            print_collection("Available now", featured.now.view());
            print_collection("Top discounts", featured.top.view());
        }
        Command::Plan {
            prompt,
            output_path,
        } => {
            let mut session = MealPlanSession::new();
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")?);
            spinner.set_message("Generating your meal plan");
            spinner.enable_steady_tick(Duration::from_millis(120));
            session.run(&client, &prompt).await?;
            spinner.finish_and_clear();

            let Some(summary) = session.summary() else {
                let reply = session
                    .transcript()
                    .iter()
                    .rev()
                    .find(|message| message.sender == Sender::Bot)
                    .map(|message| message.text.clone())
                    .unwrap_or_default();
                return Err(anyhow!(reply));
            };
            println!("Budget: ${}", summary.total_budget);
            println!("Days: {}", summary.days);
            println!("Total cost: ${}", summary.total_cost);
            println!("Remaining: ${}", summary.remaining_budget);
            if let Some(document) = session.export() {
                let path = output_path.unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_NAME));
                document.save(&path).await?;
                println!("Plan exported to {}", path.display());
            }
        }
        Command::Login { email, password } => {
            let token = client.login(&email, &password).await?;
            auth::persist_token(&mut cookie_jar, &token).await?;
            println!("Logged in.");
        }
        Command::Publish { discount } => {
            let image = match discount.image {
                Some(path) => Some(DiscountImage {
                    file_name: path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "image".to_string()),
                    bytes: tokio::fs::read(&path).await?,
                }),
                None => None,
            };
            let mut form = NewDiscount::builder();
            form.place_id(discount.place_id)
                .title(discount.title)
                .description(discount.description)
                .price(discount.price)
                .start_time(discount.start_time)
                .end_time(discount.end_time)
                .day_of_week(discount.day_of_week)
                .image(image);
            let mut panel = PublishPanel::new();
            panel.open();
            let created = panel.submit(&client, &form).await?;
            println!("Discount published: {created}");
        }
    }

    Ok(())
}
