use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use jobsync::classify::{categorize, region_from_location};
use jobsync::config::{FetchOptions, ProviderEndpoints, Roster};
use jobsync::db::{Database, JobFilter, JobStore};
use jobsync::fetch::build_client;
use jobsync::models::{Category, Provider, Region};
use jobsync::sources::Sources;
use jobsync::sync::{SyncReport, Synchronizer};

#[derive(Parser)]
#[command(name = "jobsync")]
#[command(about = "Keep a local job store in sync with company ATS boards")]
struct Cli {
    /// Path to the SQLite database (defaults to the platform data dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Path to the roster JSON file (defaults to the platform config dir)
    #[arg(long, global = true)]
    roster: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Manage companies
    Company {
        #[command(subcommand)]
        command: CompanyCommands,
    },

    /// Show the configured roster
    Roster,

    /// Pull postings from every configured ATS board and reconcile
    Sync {
        /// Only sync this company slug
        #[arg(short, long)]
        slug: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long, default_value = "15")]
        timeout_secs: u64,

        /// Attempts per request, including the first
        #[arg(long, default_value = "3")]
        max_attempts: u32,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List jobs
    Jobs {
        /// Filter by company slug
        #[arg(short, long)]
        company: Option<String>,

        /// Filter by provider (greenhouse, lever)
        #[arg(short, long)]
        provider: Option<Provider>,

        /// Filter by region (north_america, europe, asia, ...)
        #[arg(short, long)]
        region: Option<Region>,

        /// Filter by category (software, data_analytics, ...)
        #[arg(long)]
        category: Option<Category>,

        /// Include closed jobs
        #[arg(short, long)]
        all: bool,
    },

    /// Show a company's business units
    Units {
        /// Company slug
        slug: String,
    },

    /// Preview how a title and/or location would be classified
    Classify {
        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        location: Option<String>,
    },
}

#[derive(Subcommand)]
enum CompanyCommands {
    /// Add a company
    Add {
        /// Unique slug, as used in the roster
        slug: String,

        /// Display name
        name: String,
    },

    /// List companies
    List,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "jobsync=debug" } else { "jobsync=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_roster(path: Option<PathBuf>) -> Result<Roster> {
    let path = path.unwrap_or_else(Roster::default_path);
    Roster::load(&path)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Init => {
            let db = Database::open(cli.db.as_deref())?;
            db.init()?;
            println!("Database initialized at {}", db.path().display());
        }

        Commands::Company { command } => {
            let db = Database::open(cli.db.as_deref())?;
            db.ensure_initialized()?;
            match command {
                CompanyCommands::Add { slug, name } => {
                    let id = db.create_company(&slug, &name)?;
                    println!("Added company '{}' (ID: {})", slug, id);
                }

                CompanyCommands::List => {
                    let companies = db.list_companies()?;
                    if companies.is_empty() {
                        println!("No companies found.");
                    } else {
                        println!("{:<6} {:<20} {:<30}", "ID", "SLUG", "NAME");
                        println!("{}", "-".repeat(58));
                        for company in companies {
                            println!(
                                "{:<6} {:<20} {:<30}",
                                company.id,
                                truncate(&company.slug, 18),
                                truncate(&company.name, 28)
                            );
                        }
                    }
                }
            }
        }

        Commands::Roster => {
            let roster = load_roster(cli.roster)?;
            if roster.is_empty() {
                println!("Roster is empty.");
            } else {
                println!("{:<20} {:<12} {:<30}", "SLUG", "PROVIDER", "TOKEN");
                println!("{}", "-".repeat(64));
                for entry in roster.entries() {
                    println!(
                        "{:<20} {:<12} {:<30}",
                        truncate(&entry.slug, 18),
                        entry.provider,
                        truncate(&entry.token, 28)
                    );
                }
            }
        }

        Commands::Sync {
            slug,
            timeout_secs,
            max_attempts,
            json,
        } => {
            let db = Database::open(cli.db.as_deref())?;
            let roster = load_roster(cli.roster)?;
            let options = FetchOptions {
                timeout: Duration::from_secs(timeout_secs),
                max_attempts,
                ..FetchOptions::default()
            };
            let client = build_client(&options)?;
            let sources = Sources::standard(client, &ProviderEndpoints::default(), &options);

            let report = Synchronizer::new(&db, &sources, &roster).trigger(slug.as_deref());

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }

            if !report.is_ok() {
                return Err(anyhow!("Sync run failed"));
            }
        }

        Commands::Jobs {
            company,
            provider,
            region,
            category,
            all,
        } => {
            let db = Database::open(cli.db.as_deref())?;
            db.ensure_initialized()?;
            let filter = JobFilter {
                company,
                provider,
                region,
                category,
                include_closed: all,
            };
            let jobs = db.list_jobs(&filter)?;
            if jobs.is_empty() {
                println!("No jobs found.");
            } else {
                println!(
                    "{:<6} {:<8} {:<30} {:<14} {:<18} {:<14} {:<20}",
                    "ID", "STATUS", "TITLE", "COMPANY", "CATEGORY", "REGION", "LOCATION"
                );
                println!("{}", "-".repeat(116));
                for job in jobs {
                    println!(
                        "{:<6} {:<8} {:<30} {:<14} {:<18} {:<14} {:<20}",
                        job.id,
                        if job.closed { "closed" } else { "open" },
                        truncate(&job.title, 28),
                        truncate(&job.company_slug, 12),
                        job.category.map(|c| c.as_str()).unwrap_or("-"),
                        job.region.map(|r| r.as_str()).unwrap_or("-"),
                        truncate(job.location.as_deref().unwrap_or("-"), 18)
                    );
                }
            }
        }

        Commands::Units { slug } => {
            let db = Database::open(cli.db.as_deref())?;
            db.ensure_initialized()?;
            let company = db
                .find_company_by_slug(&slug)?
                .ok_or_else(|| anyhow!("Company '{}' not found", slug))?;
            let units = db.list_business_units(company.id)?;
            if units.is_empty() {
                println!("No business units for '{}' yet.", slug);
            } else {
                println!(
                    "{:<6} {:<24} {:>8} {:>8} {:>8} {:>8} {:>10}",
                    "ID", "NAME", "APPS", "RESP", "INTV", "OFFERS", "MEDIAN D"
                );
                println!("{}", "-".repeat(78));
                for unit in units {
                    println!(
                        "{:<6} {:<24} {:>8} {:>8} {:>8} {:>8} {:>10}",
                        unit.id,
                        truncate(&unit.name, 22),
                        unit.applications,
                        unit.responses,
                        unit.interviews,
                        unit.offers,
                        unit.median_response_days
                            .map(|d| format!("{:.1}", d))
                            .unwrap_or_else(|| "-".to_string())
                    );
                }
            }
        }

        Commands::Classify { title, location } => {
            if title.is_none() && location.is_none() {
                return Err(anyhow!("Pass --title and/or --location"));
            }
            if let Some(title) = title {
                println!("Category: {}", categorize(&title));
            }
            if let Some(location) = location {
                match region_from_location(&location) {
                    Some(region) => println!("Region: {}", region),
                    None => println!("Region: (none)"),
                }
            }
        }
    }

    Ok(())
}

fn print_report(report: &SyncReport) {
    match report {
        SyncReport::Completed { results } => {
            if results.is_empty() {
                println!("Nothing to sync.");
                return;
            }
            println!("{:<20} {:<12} {:>9} {:>7}  {}", "SLUG", "PROVIDER", "UPSERTED", "CLOSED", "NOTE");
            println!("{}", "-".repeat(72));
            for result in results {
                println!(
                    "{:<20} {:<12} {:>9} {:>7}  {}",
                    truncate(&result.slug, 18),
                    result.provider.map(|p| p.as_str()).unwrap_or("-"),
                    result.upserted_count,
                    result.closed_count,
                    result.note.as_deref().unwrap_or("")
                );
            }
            let upserted: usize = results.iter().map(|r| r.upserted_count).sum();
            let closed: usize = results.iter().map(|r| r.closed_count).sum();
            println!("\nTotal: {} upserted, {} closed", upserted, closed);
        }
        SyncReport::Failed { error } => {
            println!("Sync failed: {}", error);
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
