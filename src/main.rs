use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use core_types::{RequestFilters, RequestStatus};
// Import database types directly from the database crate
use database::connection::{connect, run_migrations};
use database::repository::RequestRepository;
use tracing_subscriber::EnvFilter;

/// The main entry point for the kharid purchase-request tracker.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from a .env file next to the program, if any.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = configuration::load_settings()?;

    // Initialize the database connection and run migrations
    let pool = connect(&settings.database).await?;
    run_migrations(&pool).await?;
    let repo = RequestRepository::new(pool);

    // Parse command-line arguments and execute the appropriate command
    let cli = Cli::parse();
    match cli.command {
        Commands::Stats => handle_stats(&repo).await,
        Commands::Show(args) => handle_show(&repo, args).await,
        Commands::Search(args) => handle_search(&repo, args).await,
        Commands::SearchItems { text } => handle_search_items(&repo, &text).await,
        Commands::SetStatus { id, status } => handle_set_status(&repo, id, &status).await,
        Commands::Delete { id, hard } => handle_delete(&repo, id, hard).await,
        Commands::Restore { id } => handle_restore(&repo, id).await,
        Commands::NextNumber => handle_next_number(&repo).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Operations console for the purchase-request store.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show counts of active requests, overall and per status.
    Stats,
    /// Show one request and its items.
    Show(ShowArgs),
    /// Search requests with optional filters.
    Search(SearchArgs),
    /// Search item descriptions and notes for a substring.
    SearchItems {
        /// The text to look for (case-insensitive).
        text: String,
    },
    /// Transition a request to a new status.
    SetStatus {
        id: i64,
        /// One of: pending, approved, rejected, completed.
        status: String,
    },
    /// Soft-delete a request (or hard-delete it together with its items).
    Delete {
        id: i64,
        /// Physically remove the request and cascade to its items.
        #[arg(long)]
        hard: bool,
    },
    /// Bring a soft-deleted request back.
    Restore { id: i64 },
    /// Suggest the next free numeric request number.
    NextNumber,
}

#[derive(Parser)]
struct ShowArgs {
    /// The id of the request to display.
    id: i64,

    /// Emit the request and its items as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct SearchArgs {
    /// Exact request number.
    #[arg(long)]
    number: Option<String>,

    /// Substring of the requester name (case-insensitive).
    #[arg(long)]
    requester: Option<String>,

    /// Substring of the requesting unit (case-insensitive).
    #[arg(long)]
    unit: Option<String>,

    #[arg(long)]
    year: Option<i32>,

    #[arg(long)]
    month: Option<i32>,

    /// One of: pending, approved, rejected, completed.
    #[arg(long)]
    status: Option<String>,

    /// Inclusive lower bound on the Gregorian request date (YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Inclusive upper bound on the Gregorian request date (YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Include soft-deleted requests in the results.
    #[arg(long)]
    include_deleted: bool,
}

// ==============================================================================
// Command Handlers
// ==============================================================================

async fn handle_stats(repo: &RequestRepository) -> anyhow::Result<()> {
    let stats = repo.get_statistics().await;

    let mut table = Table::new();
    table.set_header(vec!["total", "pending", "approved", "rejected", "completed"]);
    table.add_row(vec![
        stats.total.to_string(),
        stats.pending.to_string(),
        stats.approved.to_string(),
        stats.rejected.to_string(),
        stats.completed.to_string(),
    ]);
    println!("{table}");
    Ok(())
}

async fn handle_show(repo: &RequestRepository, args: ShowArgs) -> anyhow::Result<()> {
    let Some(details) = repo.get_request_by_id(args.id).await? else {
        anyhow::bail!("no request with id {}", args.id);
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }

    let request = &details.request;
    println!(
        "#{} {} ({} / {}) — {} / {} [{}]{}",
        request.id,
        request.request_number,
        request.request_date_jalali,
        request.request_date_gregorian,
        request.requesting_unit,
        request.requester_name,
        request.status,
        if request.deleted_at.is_some() { " (deleted)" } else { "" },
    );

    let mut table = Table::new();
    table.set_header(vec!["#", "description", "qty", "unit", "location", "notes"]);
    for item in &details.items {
        table.add_row(vec![
            item.row_number.to_string(),
            item.description.clone(),
            item.quantity.to_string(),
            item.unit.clone(),
            item.purchase_location.clone(),
            item.notes.clone().unwrap_or_default(),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn handle_search(repo: &RequestRepository, args: SearchArgs) -> anyhow::Result<()> {
    let status = match args.status.as_deref() {
        Some(raw) => Some(raw.parse::<RequestStatus>()?),
        None => None,
    };

    let filters = RequestFilters {
        request_number: args.number,
        requester_name: args.requester,
        requesting_unit: args.unit,
        year: args.year,
        month: args.month,
        status,
        date_from: args.from,
        date_to: args.to,
    };

    let results = repo.search_requests(&filters, args.include_deleted).await?;

    let mut table = Table::new();
    table.set_header(vec![
        "id", "number", "date", "unit", "requester", "status", "items", "deleted",
    ]);
    for row in &results {
        table.add_row(vec![
            row.id.to_string(),
            row.request_number.clone(),
            row.request_date_jalali.clone(),
            row.requesting_unit.clone(),
            row.requester_name.clone(),
            row.status.clone(),
            row.items_count.to_string(),
            if row.deleted_at.is_some() { "yes" } else { "" }.to_string(),
        ]);
    }
    println!("{table}");
    println!("{} request(s)", results.len());
    Ok(())
}

async fn handle_search_items(repo: &RequestRepository, text: &str) -> anyhow::Result<()> {
    let matches = repo.search_in_items(text).await?;

    let mut table = Table::new();
    table.set_header(vec!["request", "date", "#", "description", "notes"]);
    for m in &matches {
        table.add_row(vec![
            m.request_number.clone(),
            m.request_date_jalali.clone(),
            m.row_number.to_string(),
            m.matched_description.clone(),
            m.matched_notes.clone().unwrap_or_default(),
        ]);
    }
    println!("{table}");
    println!("{} item(s) matched", matches.len());
    Ok(())
}

async fn handle_set_status(
    repo: &RequestRepository,
    id: i64,
    status: &str,
) -> anyhow::Result<()> {
    repo.update_status(id, status).await?;
    println!("request {id} is now '{status}'");
    Ok(())
}

async fn handle_delete(repo: &RequestRepository, id: i64, hard: bool) -> anyhow::Result<()> {
    if hard {
        repo.delete_request(id).await?;
        println!("request {id} and its items removed");
    } else {
        repo.soft_delete_request(id).await?;
        println!("request {id} soft-deleted (restore with `restore {id}`)");
    }
    Ok(())
}

async fn handle_restore(repo: &RequestRepository, id: i64) -> anyhow::Result<()> {
    repo.restore_request(id).await?;
    println!("request {id} restored");
    Ok(())
}

async fn handle_next_number(repo: &RequestRepository) -> anyhow::Result<()> {
    let next = repo.get_max_request_number().await?.unwrap_or(1000) + 1;
    println!("{next}");
    Ok(())
}
