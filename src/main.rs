mod api;
mod mapping;
mod models;
mod normalize;
mod profile;
mod storage;
mod store;

use anyhow::Result;
use api::{HttpSearchClient, SearchSpec};
use chrono::Utc;
use clap::{Parser, Subcommand};
use models::{ApplicationStatus, ProfileUpdate, SortKey, UserProfile};
use profile::ProfileStore;
use storage::Storage;
use store::JobStore;

#[derive(Parser)]
#[command(name = "platsjakt")]
#[command(about = "Job search against the Swedish JobTech listings API - search, save, apply, track")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search job postings
    Search {
        /// Free-text query
        #[arg(default_value = "")]
        query: String,

        /// Result page (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Category (e.g. IT, Healthcare, Education; "All" for no constraint)
        #[arg(short, long)]
        category: Option<String>,

        /// Location term, matched against municipality, city and region
        #[arg(short, long)]
        location: Option<String>,

        /// Employment type (e.g. Full-time, Part-time, Internship)
        #[arg(short = 't', long = "type")]
        job_type: Option<String>,

        /// Filter on remote work (true/false)
        #[arg(short, long)]
        remote: Option<bool>,

        /// Sort order: newest, oldest or location
        #[arg(short, long)]
        sort: Option<String>,
    },

    /// Count matching postings without fetching them
    Count {
        /// Free-text query
        #[arg(default_value = "")]
        query: String,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(short = 't', long = "type")]
        job_type: Option<String>,

        #[arg(short, long)]
        remote: Option<bool>,
    },

    /// Show one posting by ID
    Show {
        /// Posting ID
        id: String,
    },

    /// Toggle a posting in the saved set
    Save {
        /// Posting ID
        id: String,
    },

    /// List saved posting IDs
    Saved,

    /// Record an application for a posting
    Apply {
        /// Posting ID
        id: String,
    },

    /// List recorded applications
    Applications,

    /// Update the status of a recorded application
    SetStatus {
        /// Posting ID
        id: String,

        /// New status (applied, viewed, interviewing, offered, rejected, withdrawn)
        status: ApplicationStatus,
    },

    /// Manage the local user profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the stored profile
    Show,

    /// Update profile fields
    Set {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        about: Option<String>,
    },

    /// Clear the profile and authentication state
    Logout,
}

fn job_store() -> Result<JobStore<HttpSearchClient>> {
    let storage = Storage::open()?;
    Ok(JobStore::new(HttpSearchClient::new(), storage))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "platsjakt=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            query,
            page,
            category,
            location,
            job_type,
            remote,
            sort,
        } => {
            let mut store = job_store()?;
            store.filter.query = query;
            store.filter.category = category;
            store.filter.location = location;
            store.filter.job_type = job_type;
            store.filter.remote = remote;
            store.sort_by = sort.as_deref().and_then(SortKey::parse);

            store.fetch_jobs(page).await;

            if let Some(error) = &store.error {
                println!("{}", error);
            } else if store.jobs.is_empty() {
                println!("No jobs found.");
            } else {
                println!(
                    "{:<34} {:<30} {:<22} {:<14} {:<8}",
                    "ID", "TITLE", "COMPANY", "LOCATION", "STATUS"
                );
                println!("{}", "-".repeat(110));
                for job in &store.jobs {
                    let mut status = String::new();
                    if store.is_job_saved(&job.id) {
                        status.push('*');
                    }
                    if store.is_job_applied(&job.id) {
                        status.push('A');
                    }
                    println!(
                        "{:<34} {:<30} {:<22} {:<14} {:<8}",
                        truncate(&job.id, 32),
                        truncate(&job.title, 28),
                        truncate(&job.company.name, 20),
                        truncate(&job.location, 12),
                        status
                    );
                }
                let p = &store.pagination;
                println!(
                    "\nPage {} of {} ({} jobs total)",
                    p.current_page, p.total_pages, p.total_jobs
                );
            }
        }

        Commands::Count {
            query,
            category,
            location,
            job_type,
            remote,
        } => {
            let client = HttpSearchClient::new();
            let spec = SearchSpec {
                query,
                page: 1,
                limit: 1,
                category,
                location,
                employment_type: job_type,
                remote,
                sort: None,
            };
            let total = client.total_hits(&spec).await?;
            println!("{} matching jobs", total);
        }

        Commands::Show { id } => {
            let store = job_store()?;
            match store.fetch_job_by_id(&id).await {
                Some(job) => {
                    println!("{}", job.title);
                    println!("Company: {}", job.company.name);
                    println!("Location: {}", job.location);
                    println!("Category: {}", job.category);
                    println!("Type: {}", job.job_type);
                    println!("Remote: {}", if job.remote { "yes" } else { "no" });
                    println!("Posted: {}", job.posted_at.format("%Y-%m-%d"));
                    if !job.url.is_empty() {
                        println!("URL: {}", job.url);
                    }
                    if store.is_job_saved(&id) {
                        println!("Saved: yes");
                    }
                    if let Some(status) = store.application_status(&id) {
                        println!("Application: {}", status);
                    }
                    if !job.description.is_empty() {
                        println!("\n{}", job.description);
                    }
                }
                None => {
                    println!("Job '{}' not found.", id);
                }
            }
        }

        Commands::Save { id } => {
            let mut store = job_store()?;
            store.toggle_save_job(&id);
            if store.is_job_saved(&id) {
                println!("Saved job '{}'.", id);
            } else {
                println!("Removed job '{}' from saved jobs.", id);
            }
        }

        Commands::Saved => {
            let store = job_store()?;
            let mut ids: Vec<&str> = store.saved_job_ids().collect();
            if ids.is_empty() {
                println!("No saved jobs.");
            } else {
                ids.sort_unstable();
                for id in ids {
                    println!("{}", id);
                }
            }
        }

        Commands::Apply { id } => {
            let mut store = job_store()?;
            if store.is_job_applied(&id) {
                println!("Already applied to '{}'.", id);
            } else {
                store.apply_to_job(&id);
                println!("Recorded application for '{}'.", id);
            }
        }

        Commands::Applications => {
            let store = job_store()?;
            let mut applications: Vec<_> = store.applications().collect();
            if applications.is_empty() {
                println!("No applications recorded.");
            } else {
                applications.sort_by_key(|(_, record)| record.date);
                println!("{:<34} {:<14} {:<14}", "ID", "DATE", "STATUS");
                println!("{}", "-".repeat(62));
                for (id, record) in applications {
                    println!(
                        "{:<34} {:<14} {:<14}",
                        truncate(id, 32),
                        record.date.format("%Y-%m-%d"),
                        record.status
                    );
                }
            }
        }

        Commands::SetStatus { id, status } => {
            let mut store = job_store()?;
            if !store.is_job_applied(&id) {
                println!("No application recorded for '{}'.", id);
            } else {
                store.update_application_status(&id, status);
                println!("Application for '{}' is now {}.", id, status);
            }
        }

        Commands::Profile { command } => {
            let mut profiles = ProfileStore::new(Storage::open()?);
            match command {
                ProfileCommands::Show => {
                    let p = &profiles.profile;
                    if p.name.is_empty() {
                        println!("No profile set. Use 'platsjakt profile set --name ...'");
                    } else {
                        println!("Name: {}", p.name);
                        println!("Email: {}", p.email);
                        if let Some(phone) = &p.phone {
                            println!("Phone: {}", phone);
                        }
                        if let Some(location) = &p.location {
                            println!("Location: {}", location);
                        }
                        if let Some(title) = &p.title {
                            println!("Title: {}", title);
                        }
                        if let Some(about) = &p.about {
                            println!("About: {}", about);
                        }
                        if !p.skills.is_empty() {
                            println!("Skills: {}", p.skills.join(", "));
                        }
                    }
                }

                ProfileCommands::Set {
                    name,
                    email,
                    phone,
                    location,
                    title,
                    about,
                } => {
                    if profiles.profile.id.is_empty() {
                        profiles.set_profile(UserProfile {
                            id: format!("user-{}", Utc::now().timestamp()),
                            ..Default::default()
                        });
                    }
                    profiles.update_profile(ProfileUpdate {
                        name,
                        email,
                        phone,
                        location,
                        title,
                        about,
                        skills: None,
                    });
                    println!("Profile updated.");
                }

                ProfileCommands::Logout => {
                    profiles.logout();
                    println!("Profile cleared.");
                }
            }
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        // Back up to a char boundary so å/ä/ö in titles can't split.
        let mut end = max.saturating_sub(3);
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}
