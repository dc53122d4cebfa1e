// arbor: Branch Workflow Automation
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Logging --> Config --> Session --> Command Dispatch
//!   Append | Hack | Sync | Ship | RenameBranch | SetParent
//!   Continue | Skip | Undo | Discard | Status | Config
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use arbor::cli::global::GlobalOptions;
use arbor::cli::{self, Command};
use arbor::cmd::append::{run_append_command, run_hack_command};
use arbor::cmd::config::run_config_command;
use arbor::cmd::rename::run_rename_branch_command;
use arbor::cmd::resume::{
    run_continue_command, run_discard_command, run_skip_command, run_status_command,
    run_undo_command,
};
use arbor::cmd::set_parent::run_set_parent_command;
use arbor::cmd::ship::run_ship_command;
use arbor::cmd::sync::run_sync_command;
use arbor::cmd::{Context, Session};
use arbor::config::loader::ConfigLoader;
use arbor::config::{CONFIG_FILE_NAME, Config, ENV_PREFIX};
use arbor::error::{ExitClass, Result};
use arbor::git::discovery;
use arbor::logging::init_logging;
use arbor::logging::{LogConfig, LogLevel};
use arbor::vm::interpreter::Outcome;
use arbor::vm::resume::{FixedResponse, ResumePrompt, TerminalPrompt};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> ExitCode {
    let cli = cli::parse();

    let log_config = build_log_config(&cli.global);
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    dispatch_command(&cli)
}

fn build_log_config(global: &GlobalOptions) -> LogConfig {
    let console_level = global
        .log_level
        .and_then(LogLevel::from_u8)
        .unwrap_or(LogLevel::WARN);

    let file_level = global
        .file_log_level
        .and_then(LogLevel::from_u8)
        .unwrap_or(LogLevel::DEBUG);

    LogConfig::builder()
        .with_console_level(console_level)
        .with_file_level(file_level)
        .maybe_with_log_file(global.log_file.as_ref().map(|p| p.display().to_string()))
        .build()
}

fn dispatch_command(cli: &cli::Cli) -> ExitCode {
    let Some(command) = &cli.command else {
        eprintln!("No command specified. Use --help for usage information.");
        return ExitCode::FAILURE;
    };

    let result = match command {
        Command::Config => show_config(&cli.global).map(|()| Outcome::Finished),
        _ => run_workflow(command, &cli.global),
    };

    let class = match result {
        Ok(outcome) => outcome.exit_class(),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitClass::of_error(&e)
        }
    };
    ExitCode::from(class.code())
}

fn run_workflow(command: &Command, global: &GlobalOptions) -> Result<Outcome> {
    let cwd = std::env::current_dir()?;
    let session = Session::open(&cwd, |root| load_config(global, root))?;

    let fixed;
    let terminal = TerminalPrompt;
    let prompt: &dyn ResumePrompt = match &global.on_unfinished {
        Some(answer) => {
            fixed = FixedResponse(answer.clone());
            &fixed
        }
        None => &terminal,
    };
    let ctx = session.context(prompt, None);
    dispatch_workflow(command, &ctx)
}

fn dispatch_workflow(command: &Command, ctx: &Context<'_>) -> Result<Outcome> {
    match command {
        Command::Append(args) => run_append_command(args, ctx),
        Command::Hack(args) => run_hack_command(args, ctx),
        Command::Sync(args) => run_sync_command(args, ctx),
        Command::Ship(args) => run_ship_command(args, ctx),
        Command::RenameBranch(args) => run_rename_branch_command(args, ctx),
        Command::SetParent(args) => run_set_parent_command(args, ctx),
        Command::Continue => run_continue_command(ctx),
        Command::Skip => run_skip_command(ctx),
        Command::Undo => run_undo_command(ctx),
        Command::Discard => run_discard_command(ctx),
        Command::Status => run_status_command(ctx),
        Command::Config => Ok(Outcome::Finished),
    }
}

/// Repository root if `cwd` is inside one, else `cwd` itself.
fn config_root(cwd: &Path) -> PathBuf {
    discovery::discover(cwd).map_or_else(|_| cwd.to_path_buf(), |paths| paths.root)
}

fn show_config(global: &GlobalOptions) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let root = config_root(&cwd);
    let loader = build_config_loader(global, &root)?;
    let files = loader.format_loaded_files();
    let config = loader.build()?;
    run_config_command(&config, &files);
    Ok(())
}

fn build_config_loader(global: &GlobalOptions, root: &Path) -> Result<ConfigLoader> {
    let mut loader = ConfigLoader::new().add_toml_file_optional(root.join(CONFIG_FILE_NAME));
    for path in &global.configs {
        loader = loader.add_toml_file(path);
    }
    loader
        .with_env_prefix(ENV_PREFIX)
        .apply_overrides(&global.to_config_overrides())
}

fn load_config(global: &GlobalOptions, root: &Path) -> Result<Config> {
    build_config_loader(global, root)?.build().map_err(|e| {
        eprintln!("Failed to load config: {e}");
        e
    })
}
