use anyhow::Result;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use std::path::PathBuf;

use blog::config::BlogConfig;
use blog::contract::model::{PageRequest, UserAccount, UserClass};
use blog::BlogModule;
use runtime::{AppConfig, CliArgs};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Blog Admin - operator tooling for the blog core
#[derive(Parser)]
#[command(name = "blog-admin")]
#[command(about = "Blog Admin - operator tooling for the blog core")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check configuration
    Check,
    /// Apply database migrations
    Migrate,
    /// Register or refresh a user record
    AddUser {
        id: String,
        name: String,
        /// Account class tag; only "default" accounts can write posts
        #[arg(long, default_value = UserClass::STANDARD_TAG)]
        auth: String,
    },
    /// List projects with their members
    ListProjects,
    /// List live posts, newest first
    ListPosts {
        /// Restrict to one project, by name
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        limit: Option<String>,
        #[arg(long)]
        offset: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, &config.home_dir());
    tracing::info!("blog-admin starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Check) {
        Commands::Check => check_config(&config),
        Commands::Migrate => migrate(&config).await,
        Commands::AddUser { id, name, auth } => add_user(&config, id, name, auth).await,
        Commands::ListProjects => list_projects(&config).await,
        Commands::ListPosts {
            project,
            limit,
            offset,
        } => list_posts(&config, project, limit, offset).await,
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    let blog_cfg: BlogConfig = config.module_config(BlogModule::NAME)?;
    if config.database.is_none() {
        anyhow::bail!("No database configured");
    }
    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!(
        "Blog config: default_page_size={}, max_page_size={}, provision_profiles={}",
        blog_cfg.default_page_size, blog_cfg.max_page_size, blog_cfg.provision_profiles
    );
    println!("{}", config.to_yaml()?);
    Ok(())
}

async fn open(config: &AppConfig) -> Result<BlogModule> {
    let db_cfg = config
        .database
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("No database configured"))?;
    let blog_cfg: BlogConfig = config.module_config(BlogModule::NAME)?;
    let db = runtime::db::connect(db_cfg, &config.home_dir()).await?;
    BlogModule::init(db, &blog_cfg).await
}

async fn migrate(config: &AppConfig) -> Result<()> {
    open(config).await?;
    println!("Migrations applied");
    Ok(())
}

async fn add_user(config: &AppConfig, id: String, name: String, auth: String) -> Result<()> {
    let module = open(config).await?;
    module
        .register_account(UserAccount {
            id: id.clone(),
            name,
            auth: auth.clone(),
        })
        .await?;
    println!("Registered user {id} ({auth})");
    Ok(())
}

async fn list_projects(config: &AppConfig) -> Result<()> {
    let module = open(config).await?;
    let projects = module.client().list_projects().await?;
    if projects.is_empty() {
        println!("No projects");
    }
    for p in projects {
        let members: Vec<&str> = p.members.iter().map(String::as_str).collect();
        println!(
            "{}\t{}\towner={}\tposts={}\tmembers={}",
            p.id,
            p.name,
            p.owner_id,
            p.post_count,
            members.join(",")
        );
    }
    Ok(())
}

async fn list_posts(
    config: &AppConfig,
    project: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
) -> Result<()> {
    let blog_cfg: BlogConfig = config.module_config(BlogModule::NAME)?;
    let page = PageRequest::parse(limit.as_deref(), offset.as_deref(), blog_cfg.default_page_size)?;
    let page = PageRequest::new(page.limit.min(blog_cfg.max_page_size), page.offset);
    let api = open(config).await?.client();
    let posts = match project {
        Some(name) => {
            let project = api.get_project_by_name(&name).await?;
            api.list_project_posts(project.id, page).await?
        }
        None => api.list_posts(page).await?,
    };
    if posts.is_empty() {
        println!("No posts");
    }
    for p in posts {
        println!(
            "{}\t#{}\t{}\tby={}\tcomments={}",
            p.id, p.number, p.title, p.author_id, p.comment_count
        );
    }
    Ok(())
}
