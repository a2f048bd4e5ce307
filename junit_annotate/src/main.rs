use clap::Parser;

use junit_annotate::args::{AnnotateCli, derive_settings, merge_cli_into_config};
use junit_annotate::config::{find_repo_root, load_annotate_config, load_annotate_config_from_path};
use junit_annotate::logging::init_logging;

fn main() {
    let cli = AnnotateCli::parse();
    let cwd = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
    let repo_root = find_repo_root(&cwd);

    let loaded = match &cli.config {
        Some(path) => load_annotate_config_from_path(path),
        None => load_annotate_config(&repo_root),
    };
    let file_cfg = match loaded {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("junit-annotate: {err}");
            std::process::exit(2);
        }
    };
    let cfg = merge_cli_into_config(&file_cfg, &cli);
    init_logging(cfg.verbose.unwrap_or(false));

    let workspace = cli.workspace.clone().unwrap_or_else(|| repo_root.clone());
    let settings = derive_settings(&cfg, &workspace, cli.json);
    tracing::debug!(
        "repo_root={} workspace={} checks={}",
        repo_root.display(),
        workspace.display(),
        settings.checks.len()
    );

    let step_summary = std::env::var_os("GITHUB_STEP_SUMMARY")
        .filter(|v| !v.is_empty() && !cli.json)
        .map(std::path::PathBuf::from);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match junit_annotate::run::run(&settings, step_summary.as_deref(), &mut out) {
        Ok(outcome) => std::process::exit(outcome.exit_code),
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(2);
        }
    }
}
