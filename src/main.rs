//! Project Bookmarks - command-line host
//!
//! Bookmarks project folders and shows their sizes, which are measured in
//! the background after each add or recalculation.

use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;

use project_bookmarks::core::{AppSettings, NewProject, Project, ProjectId, ProjectUpdate};
use project_bookmarks::logging;
use project_bookmarks::sizing::ProjectSizeUpdated;
use project_bookmarks::storage::ProjectStore;
use project_bookmarks::ProjectService;

#[derive(Parser, Debug)]
#[command(name = "project-bookmarks", version, about = "Bookmark project folders and track their sizes")]
struct Cli {
    /// Use this database file instead of the configured one
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Show debug logging on the terminal
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bookmark a folder and wait for its size
    Add {
        path: PathBuf,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List bookmarked projects
    List {
        #[arg(long)]
        json: bool,
        /// Show archived projects instead of active ones
        #[arg(long)]
        archived: bool,
    },
    /// Change a project's name, tags, or flags
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        favorite: Option<bool>,
        #[arg(long)]
        archived: Option<bool>,
    },
    /// Remove a bookmark
    Remove { id: i64 },
    /// Mark a project as opened and print its path
    Open { id: i64 },
    /// Measure a folder now
    Size {
        path: PathBuf,
        /// Only count files with this extension
        #[arg(long = "ext")]
        extensions: Vec<String>,
    },
    /// Re-measure one project, or all of them
    Recalc { id: Option<i64> },
    /// Show the effective settings, optionally writing them to the settings file
    Settings {
        #[arg(long)]
        save: bool,
    },
    /// Print a byte count in human-readable form
    Format {
        #[arg(allow_negative_numbers = true)]
        bytes: i64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    logging::init_logging(level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    // Formatting needs no database
    if let Command::Format { bytes } = cli.command {
        println!("{}", project_bookmarks::core::format_size(bytes));
        return Ok(());
    }

    let mut settings = AppSettings::load();
    if let Some(db) = cli.db {
        settings.database_path = Some(db);
    }

    if let Command::Settings { save } = cli.command {
        let json = serde_json::to_string_pretty(&settings)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;
        println!("{}", json);
        if save {
            settings.save()?;
        }
        return Ok(());
    }

    let db_path = settings.resolved_database_path()?;
    let store = ProjectStore::open(&db_path).map_err(|e| e.to_string())?;
    log::debug!("Using database {}", db_path.display());

    let (service, mut events) = ProjectService::new(Arc::new(store), settings);

    match cli.command {
        Command::Add { path, name, tags } => {
            if !service.is_directory(&path) {
                log::warn!("{} is not a directory", path.display());
            }
            let project = service
                .add_project(NewProject { name, path, tags })
                .map_err(|e| e.to_string())?;
            println!("Added {} as #{}", project.path.display(), project.id);
            print_events(&service, &mut events, 1).await;
        }
        Command::List { json, archived } => {
            let projects: Vec<Project> = service
                .projects()
                .map_err(|e| e.to_string())?
                .into_iter()
                .filter(|p| p.is_archived == archived)
                .collect();
            if json {
                let out = serde_json::to_string_pretty(&projects)
                    .map_err(|e| format!("Failed to serialize projects: {}", e))?;
                println!("{}", out);
            } else {
                for project in &projects {
                    print_project(project);
                }
            }
        }
        Command::Update {
            id,
            name,
            tags,
            favorite,
            archived,
        } => {
            let update = ProjectUpdate {
                name,
                tags: (!tags.is_empty()).then_some(tags),
                is_favorite: favorite,
                is_archived: archived,
            };
            if update.is_empty() {
                return Err("Nothing to update".to_string());
            }
            let project = service
                .update_project(ProjectId(id), &update)
                .map_err(|e| e.to_string())?;
            print_project(&project);
        }
        Command::Remove { id } => {
            service
                .delete_project(ProjectId(id))
                .map_err(|e| e.to_string())?;
            println!("Removed #{}", id);
        }
        Command::Open { id } => {
            let project = service
                .mark_opened(ProjectId(id))
                .map_err(|e| e.to_string())?;
            println!("{}", project.path.display());
        }
        Command::Size { path, extensions } => {
            let report = service
                .calculate_size(&path, &extensions)
                .await
                .map_err(|e| e.to_string())?;
            println!("{} ({} bytes)", report.human_readable_size, report.size);
        }
        Command::Recalc { id: Some(id) } => {
            let project = service
                .project(ProjectId(id))
                .map_err(|e| e.to_string())?;
            service.recalculate_size(project.id, project.path).wait().await;
            print_events(&service, &mut events, 1).await;
        }
        Command::Recalc { id: None } => {
            let bulk = service.recalculate_all_sizes().map_err(|e| e.to_string())?;
            let expected = bulk.len();
            bulk.wait_all().await;
            print_events(&service, &mut events, expected).await;
        }
        Command::Format { .. } | Command::Settings { .. } => {}
    }

    Ok(())
}

/// Print `count` size events as they arrive
async fn print_events(
    service: &ProjectService,
    events: &mut mpsc::UnboundedReceiver<ProjectSizeUpdated>,
    count: usize,
) {
    for _ in 0..count {
        let Some(event) = events.recv().await else {
            break;
        };
        println!(
            "#{}: {}",
            event.id,
            service.formatted_size(event.folder_size.to_raw())
        );
    }
}

fn print_project(project: &Project) {
    let favorite = if project.is_favorite { "*" } else { " " };
    let tags = if project.tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", project.tags.join(", "))
    };
    println!(
        "{}#{:<4} {:<24} {:>10}  {}{}",
        favorite,
        project.id.to_string(),
        project.name,
        project.folder_size.label(),
        project.path.display(),
        tags
    );
}
