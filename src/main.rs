use anyhow::{Context, Result};
use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};
use realty_crm::editor::PropertyDraft;
use realty_crm::filter::{AnyOf, FilterState, RangeFilter, StatusFilter};
use realty_crm::models::{Category, Client, Property, Status};
use realty_crm::taxonomy::{Facet, ROOMS_OPTIONS};
use realty_crm::{Config, Crm, CrmError};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "realty-crm", version, about = "Real-estate listing CRM")]
struct Cli {
    /// Base URL of the REST collaborator; the local database is used when unset
    #[arg(long, env = "REALTY_API_URL", global = true)]
    api_url: Option<String>,

    #[arg(long, env = "REALTY_DATA_FILE", default_value = "db.json", global = true)]
    data_file: PathBuf,

    #[arg(long, env = "REALTY_UPLOADS_DIR", default_value = "uploads", global = true)]
    uploads_dir: PathBuf,

    /// Origin used to build public listing links
    #[arg(
        long,
        env = "REALTY_SHARE_ORIGIN",
        default_value = "http://localhost:3001",
        global = true
    )]
    share_origin: String,

    #[arg(long, default_value_t = 30, global = true)]
    timeout: u64,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List listings matching the given criteria
    List(ListArgs),
    /// Show one listing
    Show { id: String },
    /// Add a listing from a JSON draft, on top of the form defaults
    Add { draft: PathBuf },
    /// Overwrite fields of a listing with the ones in a JSON draft
    Edit { id: String, draft: PathBuf },
    Delete { id: String },
    /// Change the sale status of a listing
    Status { id: String, status: Status },
    /// Create the public client link of a listing
    Share { id: String },
    /// Upload an image, optionally attaching it to a listing
    Upload {
        file: PathBuf,
        #[arg(long)]
        property: Option<String>,
    },
    /// Manage picker options
    #[command(subcommand)]
    Options(OptionsCommand),
    /// Manage clients
    #[command(subcommand)]
    Clients(ClientsCommand),
}

#[derive(clap::Args, Debug)]
struct ListArgs {
    /// Start from criteria stored as JSON
    #[arg(long)]
    criteria: Option<PathBuf>,

    #[arg(long)]
    category: Option<Category>,

    #[arg(long)]
    status: Option<StatusFilter>,

    #[arg(long)]
    keywords: Option<String>,

    #[arg(long, default_value = "")]
    min_price: String,

    #[arg(long, default_value = "")]
    max_price: String,

    #[arg(long = "district")]
    districts: Vec<String>,

    #[arg(long, value_parser = PossibleValuesParser::new(ROOMS_OPTIONS.iter().copied()))]
    rooms: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum OptionsCommand {
    /// Show the options of one facet, or every facet key
    List { facet: Option<Facet> },
    Add { facet: Facet, value: String },
    Remove { facet: Facet, value: String },
}

#[derive(Subcommand, Debug)]
enum ClientsCommand {
    List,
    Add {
        #[arg(long)]
        phone: String,
        #[arg(long)]
        request: String,
        #[arg(long, default_value = "")]
        name: String,
    },
    Delete { id: String },
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            api_url: self.api_url.clone(),
            data_file: self.data_file.clone(),
            uploads_dir: self.uploads_dir.clone(),
            share_origin: self.share_origin.clone(),
            request_timeout_secs: self.timeout,
        }
    }
}

impl ListArgs {
    fn criteria(&self) -> Result<FilterState> {
        let mut criteria = match &self.criteria {
            Some(path) => read_json(path)?,
            None => FilterState::default(),
        };
        if let Some(category) = self.category {
            criteria.category = category;
        }
        if let Some(status) = self.status {
            criteria.status = status;
        }
        if let Some(keywords) = &self.keywords {
            criteria.keywords = keywords.clone();
        }
        let price = RangeFilter::from_bounds(&self.min_price, &self.max_price);
        if !price.is_unbounded() {
            criteria.price = price;
        }
        if !self.districts.is_empty() {
            criteria.districts = AnyOf::of(&self.districts);
        }
        if !self.rooms.is_empty() {
            criteria.residential.rooms = AnyOf::of(&self.rooms);
        }
        Ok(criteria)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Top-level keys of `patch` replace those of `base`.
fn merge(mut base: Value, patch: Value) -> Value {
    if let (Value::Object(base_fields), Value::Object(patch_fields)) = (&mut base, patch) {
        base_fields.extend(patch_fields);
    }
    base
}

fn print_listing(i: usize, property: &Property) {
    println!(
        "{}. {} (${}) [{}]",
        i + 1,
        property.address,
        property.price,
        property.status
    );
    println!(
        "   {}, {}, {} {}",
        property.category().label(),
        if property.district.is_empty() { "-" } else { &property.district },
        property.display_area(),
        property.area_unit()
    );
    if let Some(per_unit) = property.price_per_unit() {
        println!("   ${} / {}", per_unit, property.area_unit());
    }
    println!("   ID: {}", property.id);
}

fn print_client(client: &Client) {
    let last_called = client
        .last_called
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    println!("{} {} ({})", client.id, client.phone_number, last_called);
    if !client.client_name.is_empty() {
        println!("   {}", client.client_name);
    }
    println!("   {}", client.request);
}

async fn run(cli: Cli) -> Result<()> {
    let mut crm: Crm = cli.config().open().await?;

    match cli.command {
        Command::List(args) => {
            let criteria = args.criteria()?;
            let visible = crm.visible(&criteria);
            info!(count = visible.len(), category = %criteria.category, "listings matched");
            for (i, property) in visible.iter().enumerate() {
                print_listing(i, property);
                println!();
            }
        }
        Command::Show { id } => {
            let property = crm.get(&id).ok_or_else(|| CrmError::NotFound {
                collection: "properties".into(),
                id: id.clone(),
            })?;
            println!("{}", serde_json::to_string_pretty(property)?);
        }
        Command::Add { draft } => {
            let base = serde_json::to_value(crm.new_draft())?;
            let mut draft: PropertyDraft = serde_json::from_value(merge(base, read_json(&draft)?))
                .context("Draft does not describe a listing")?;
            draft.id = None;
            let saved = crm.save_property(draft).await?;
            println!("Added {}", saved.id);
        }
        Command::Edit { id, draft } => {
            let base = serde_json::to_value(crm.edit_draft(&id)?)?;
            let mut edited: PropertyDraft = serde_json::from_value(merge(base, read_json(&draft)?))
                .context("Draft does not describe a listing")?;
            edited.id = Some(id);
            let saved = crm.save_property(edited).await?;
            println!("Updated {}", saved.id);
        }
        Command::Delete { id } => {
            crm.delete_property(&id).await?;
            println!("Deleted {}", id);
        }
        Command::Status { id, status } => {
            crm.set_status(&id, status).await?;
            println!("{} is now {}", id, status);
        }
        Command::Share { id } => {
            println!("{}", crm.share_link(&id).await?);
        }
        Command::Upload { file, property } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("image")
                .to_string();
            let url = crm.upload_image(&name, bytes).await?;
            if let Some(id) = property {
                let mut draft = crm.edit_draft(&id)?;
                draft.add_image(url.clone());
                crm.save_property(draft).await?;
                info!(id = %id, "image attached");
            }
            println!("{}", url);
        }
        Command::Options(OptionsCommand::List { facet: None }) => {
            for facet in Facet::ALL {
                println!("{}", facet.key());
            }
        }
        Command::Options(OptionsCommand::List { facet: Some(facet) }) => {
            let taxonomy = crm.taxonomy();
            for value in crm.options(facet) {
                let marker = if taxonomy.is_protected(facet, &value) { "*" } else { " " };
                println!("{} {}", marker, value);
            }
        }
        Command::Options(OptionsCommand::Add { facet, value }) => {
            if crm.add_custom_option(facet, &value).await? {
                println!("Added '{}' to {}", value.trim(), facet);
            } else {
                println!("'{}' is already an option of {}", value.trim(), facet);
            }
        }
        Command::Options(OptionsCommand::Remove { facet, value }) => {
            if crm.remove_custom_option(facet, &value).await? {
                println!("Removed '{}' from {}", value, facet);
            } else {
                println!("'{}' is not a custom option of {}", value, facet);
            }
        }
        Command::Clients(ClientsCommand::List) => {
            for client in crm.clients() {
                print_client(client);
            }
        }
        Command::Clients(ClientsCommand::Add {
            phone,
            request,
            name,
        }) => {
            let mut client = Client::new(phone, request);
            client.client_name = name;
            let saved = crm.save_client(client).await?;
            println!("Added client {}", saved.id);
        }
        Command::Clients(ClientsCommand::Delete { id }) => {
            crm.delete_client(&id).await?;
            println!("Deleted client {}", id);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<CrmError>() {
            Some(crm_error) => {
                error!(error = %crm_error, "operation failed");
                eprintln!("{}", crm_error.user_message());
            }
            None => error!(error = %e, "operation failed"),
        }
        std::process::exit(1);
    }

    Ok(())
}
