use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::PathBuf;

use dockhand::core::config::{self, CliOverrides};
use dockhand::tui;

#[derive(Parser)]
#[command(name = "dockhand", about = "Terminal UI for the repo's docker dev environment")]
struct Args {
    /// Stack profile: default, arch, or alpine
    #[arg(short, long)]
    stack: Option<String>,

    /// Repository root (discovered from the working directory when omitted)
    #[arg(long)]
    repo_root: Option<PathBuf>,

    /// Setup script path, relative to the repository root
    #[arg(long)]
    setup_script: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to dockhand.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Ok(log_file) = File::create("dockhand.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let cwd = std::env::current_dir()?;
    // The CLI flag overrides root discovery here; resolution takes the final
    // root as a parameter rather than re-deciding it.
    let repo_root = args
        .repo_root
        .unwrap_or_else(|| config::discover_repo_root(&cwd));

    let file_config = match config::load_config(&repo_root) {
        Ok(file_config) => file_config,
        Err(e) => {
            eprintln!("dockhand: {e}");
            std::process::exit(1);
        }
    };

    let cli = CliOverrides {
        stack: args.stack,
        setup_script: args.setup_script,
    };
    let resolved = config::resolve(&file_config, &cli, &repo_root);

    // Pre-flight: refuse to start when the setup script is missing, rather
    // than failing on the first keypress
    let script = resolved.setup_script_path();
    if !script.is_file() {
        eprintln!("dockhand: setup script not found: {}", script.display());
        std::process::exit(1);
    }

    log::info!("Dockhand starting in {}", repo_root.display());

    tui::run(resolved)
}
