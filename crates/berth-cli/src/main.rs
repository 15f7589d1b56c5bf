//! berth - app lifecycle CLI
//!
//! サブコマンドを解析して berth-core の AppManager に渡すだけの薄い層。
//! 設定は環境変数から読む（berth_core::config）。

use std::process::ExitCode;
use std::time::Duration;

use berth_core::app::{AppManager, PlatformBuilder, ReportArgs};
use berth_core::config::Config;
use berth_core::domain::{AppName, BerthError, GLOBAL_APP};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "berth", about = "Manage apps on a berth host", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new app
    #[command(name = "apps:create")]
    AppsCreate { app: String },

    /// Permanently destroy an app
    #[command(name = "apps:destroy")]
    AppsDestroy {
        app: String,
        /// Destroy without confirmation
        #[arg(long)]
        force: bool,
    },

    /// Clone an app
    #[command(name = "apps:clone")]
    AppsClone {
        old_app: String,
        new_app: String,
        /// Skip deploying the new app
        #[arg(long)]
        skip_deploy: bool,
        /// Exit 0 if the new app already exists
        #[arg(long)]
        ignore_existing: bool,
    },

    /// Rename an app
    #[command(name = "apps:rename")]
    AppsRename {
        old_app: String,
        new_app: String,
        #[arg(long)]
        skip_deploy: bool,
    },

    /// Lock an app for deployment
    #[command(name = "apps:lock")]
    AppsLock { app: String },

    /// Unlock an app for deployment
    #[command(name = "apps:unlock")]
    AppsUnlock { app: String },

    /// Check if an app is locked for deployment
    #[command(name = "apps:locked")]
    AppsLocked { app: String },

    /// Check if an app exists
    #[command(name = "apps:exists")]
    AppsExists { app: String },

    /// List your apps
    #[command(name = "apps:list")]
    AppsList,

    /// Display report about an app: [<app>] [--format stdout|json] [<flag>]
    #[command(name = "apps:report")]
    AppsReport {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Print the scheduler for an app, or the global one
    #[command(name = "scheduler-detect")]
    SchedulerDetect {
        #[arg(default_value = GLOBAL_APP, allow_hyphen_values = true)]
        app: String,
    },

    /// Exit 0 when the app is deployed
    #[command(name = "is-deployed")]
    IsDeployed { app: String },

    /// Validate an app name without touching anything
    #[command(name = "verify-app-name")]
    VerifyAppName { app: String },

    /// Remove stopped containers and unused images
    #[command(name = "docker-cleanup")]
    DockerCleanup {
        #[arg(default_value = GLOBAL_APP, allow_hyphen_values = true)]
        app: String,
        #[arg(long)]
        force: bool,
    },

    /// Print the image of the app's current deployment
    Image {
        app: String,
        #[arg(long, default_value = "")]
        tag: String,
        #[arg(long, default_value = "")]
        repo: String,
    },

    /// Print an app's image name without consulting deployment triggers
    #[command(name = "app-image-name")]
    AppImageName {
        app: String,
        #[arg(long, default_value = "")]
        tag: String,
        #[arg(long, default_value = "")]
        repo: String,
    },

    /// Wait once, then fail unless the container is running
    #[command(name = "container-ready")]
    ContainerReady {
        container_id: String,
        /// Seconds to wait before the check
        #[arg(long, default_value_t = 10)]
        wait: u64,
    },

    /// Run one of the core trigger reactions
    #[command(hide = true)]
    Trigger {
        name: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn init_tracing(trace: bool) {
    let default = if trace { "warn,berth=debug,berth_core=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(manager: &AppManager, command: Command) -> Result<(), BerthError> {
    match command {
        Command::AppsCreate { app } => manager.create_command(&app).await,
        Command::AppsDestroy { app, force } => manager.destroy_command(&app, force).await,
        Command::AppsClone {
            old_app,
            new_app,
            skip_deploy,
            ignore_existing,
        } => {
            manager
                .clone_command(&old_app, &new_app, skip_deploy, ignore_existing)
                .await
        }
        Command::AppsRename {
            old_app,
            new_app,
            skip_deploy,
        } => manager.rename_command(&old_app, &new_app, skip_deploy).await,
        Command::AppsLock { app } => manager.lock_command(&app).await,
        Command::AppsUnlock { app } => manager.unlock_command(&app).await,
        Command::AppsLocked { app } => manager.locked_command(&app).await,
        Command::AppsExists { app } => manager.exists_command(&app).await,
        Command::AppsList => manager.list_command().await,
        Command::AppsReport { args } => manager.report(&ReportArgs::parse(&args)?).await,
        Command::SchedulerDetect { app } => {
            let scheduler = manager.scheduler_resolver().resolve(&app).await;
            println!("{scheduler}");
            Ok(())
        }
        Command::IsDeployed { app } => {
            if manager.is_deployed(&app).await? {
                Ok(())
            } else {
                Err(BerthError::Validation(format!("App {app} is not deployed")))
            }
        }
        Command::VerifyAppName { app } => AppName::parse(&app).map(|_| ()),
        Command::DockerCleanup { app, force } => manager.docker_cleanup(&app, force).await,
        Command::Image { app, tag, repo } => {
            let app = manager.verify_app(&app).await?;
            let image = manager
                .image_resolver()
                .resolve_deploy_image(app.name(), &tag, &repo)
                .await?;
            println!("{image}");
            Ok(())
        }
        Command::AppImageName { app, tag, repo } => {
            let image = manager.app_image_name(&app, &tag, &repo).await?;
            println!("{image}");
            Ok(())
        }
        Command::ContainerReady { container_id, wait } => {
            manager
                .wait_for_container(&container_id, Duration::from_secs(wait))
                .await
        }
        Command::Trigger { name, args } => manager.handle_trigger(&name, &args).await,
    }
}

fn fail(message: impl std::fmt::Display, code: i32) -> ExitCode {
    eprintln!(" !     {message}");
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => return fail(err, 1),
    };
    init_tracing(config.trace);

    let manager = match PlatformBuilder::from_config(&config).and_then(PlatformBuilder::build) {
        Ok(manager) => manager,
        Err(err) => return fail(err, 1),
    };

    match run(&manager, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err @ BerthError::ConfirmationDeclined(_)) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            fail(&err, err.exit_code())
        }
    }
}
