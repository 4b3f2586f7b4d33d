use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::path::PathBuf;
use tasktrack::{
    Backend, Config, Priority, Session, StatusFilter, Task, TaskDraft, TaskPatch, TaskQuery, TaskStore, demo,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tasktrack")]
#[command(about = "tasktrack - personal task tracker")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the store files
    #[arg(long)]
    store_path: Option<PathBuf>,

    /// Storage backend
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Act as this user
    #[arg(short, long)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a task
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        priority: Option<Priority>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
    },

    /// List tasks, newest first
    List {
        #[arg(short, long, default_value = "all")]
        category: String,
        #[arg(short, long, default_value = "all")]
        priority: String,
        /// all, completed or pending
        #[arg(short, long, default_value = "all")]
        status: StatusFilter,
        /// Case-insensitive text in title or description
        #[arg(short = 'q', long)]
        search: Option<String>,
    },

    /// Show one task
    Show { id: String },

    /// Change fields of a task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        #[arg(long)]
        clear_due: bool,
        #[arg(long)]
        completed: Option<bool>,
    },

    /// Mark a task completed, or pending again
    Toggle { id: String },

    /// Delete a task
    Delete { id: String },

    /// Count total, completed and pending tasks
    Stats,

    /// Add starter tasks when the list is empty
    Demo,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(store_path) = cli.store_path {
        config.store_path = store_path;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if cli.user.is_some() {
        config.user = cli.user;
    }

    let session = Session::from_user(config.user.as_deref());
    let mut store = TaskStore::open(config.open_provider()?, session)?;

    match cli.command {
        Commands::Add {
            title,
            description,
            category,
            priority,
            due,
        } => {
            let draft = TaskDraft {
                title,
                description,
                category: category.map(Into::into),
                priority,
                due_date: due,
            };
            let task = store.create(draft)?;
            println!("{} {}", "Created".green(), task.id);
        }
        Commands::List {
            category,
            priority,
            status,
            search,
        } => {
            let query = TaskQuery {
                category: TaskQuery::category_selector(&category),
                priority: TaskQuery::priority_selector(&priority).map_err(|e| eyre!(e))?,
                status,
                search,
            };
            let tasks = store.query(&query);
            if tasks.is_empty() {
                println!("No tasks found. Create your first task!");
            }
            for task in &tasks {
                print_task(task);
            }
        }
        Commands::Show { id } => {
            let task = store.get(&id)?;
            print_task(&task);
            if !task.description.is_empty() {
                println!("    {}", task.description);
            }
            println!("    created {}", task.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
        }
        Commands::Edit {
            id,
            title,
            description,
            category,
            priority,
            due,
            clear_due,
            completed,
        } => {
            let patch = TaskPatch {
                title,
                description,
                category: category.map(Into::into),
                priority,
                due_date: if clear_due { Some(None) } else { due.map(Some) },
                completed,
            };
            if patch.is_empty() {
                println!("Nothing to change");
                return Ok(());
            }
            let task = store.update(&id, patch)?;
            print_task(&task);
        }
        Commands::Toggle { id } => {
            let task = store.toggle_completion(&id)?;
            print_task(&task);
        }
        Commands::Delete { id } => {
            store.delete(&id)?;
            println!("{} {}", "Deleted".red(), id);
        }
        Commands::Stats => {
            let counts = store.counts();
            println!("Total:     {}", counts.total);
            println!("Completed: {}", counts.completed.to_string().green());
            println!("Pending:   {}", counts.pending.to_string().yellow());
        }
        Commands::Demo => {
            if store.counts().total > 0 {
                println!("You already have tasks; demo tasks are only added to an empty list");
                return Ok(());
            }
            let today = Local::now().date_naive();
            for draft in demo::drafts(today) {
                store.create(draft)?;
            }
            println!("{}", "Demo tasks added successfully!".green());
        }
    }

    Ok(())
}

fn print_task(task: &Task) {
    let mark = if task.completed { "[x]".green() } else { "[ ]".normal() };
    let title = if task.completed {
        task.title.dimmed()
    } else {
        task.title.bold()
    };
    let priority = match task.priority {
        Priority::High => task.priority.as_str().red(),
        Priority::Medium => task.priority.as_str().yellow(),
        Priority::Low => task.priority.as_str().green(),
    };
    let due = task
        .due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "No due date".to_string());

    println!(
        "{} {}  {} {} {}  {}",
        mark,
        title,
        task.category.as_str().cyan(),
        priority,
        due,
        task.id.dimmed()
    );
}
