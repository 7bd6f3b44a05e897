use crate::options;
use bumpcalver::{
    BumpCalver,
    config::{self, Config, ConfigFile},
    diagnostics::{Printer, StderrPrinter},
    handlers::Registry,
    vcs::{VersionControlSystem, git::GitRepository},
};
use color_eyre::eyre::{self, WrapErr};
use std::path::Path;

/// Load the config from `config_file` or the default locations of `dir`.
///
/// Diagnostics are printed to stderr.
fn load_config(
    dir: &Path,
    config_file: Option<&Path>,
    printer: &StderrPrinter,
) -> eyre::Result<Option<Config>> {
    let config = match config_file {
        Some(path) => {
            let config_file = ConfigFile::from_path(dir.join(path));
            config::load_config(&config_file, printer)?.map(|config| (config_file, config))
        }
        None => config::find_config(dir, printer)?,
    };
    match config {
        Some((config_file, config)) => {
            tracing::info!(path = ?config_file.path(), "using config file");
            Ok(Some(config))
        }
        None => Ok(None),
    }
}

pub fn bumpcalver(options: options::Options) -> eyre::Result<()> {
    let start = std::time::Instant::now();

    let color_choice = options.color_choice.unwrap_or(termcolor::ColorChoice::Auto);
    let (_, use_color) =
        crate::logging::setup(options.log_level, options.log_format, color_choice)?;
    colored::control::set_override(use_color);

    let cwd = std::env::current_dir().wrap_err("could not determine current working dir")?;
    let dir = options.dir.as_deref().unwrap_or(&cwd);
    let dir = dir
        .canonicalize()
        .wrap_err_with(|| format!("directory {} does not exist", dir.display()))?;

    let printer = Printer::stderr(Some(color_choice));
    let mut config = load_config(&dir, options.config_file.as_deref(), &printer)
        .wrap_err("failed to load config")?
        .unwrap_or_default();
    config.merge_with(&options.config_overrides());
    let config = config.finalize();

    let verbosity = options.verbosity.verbosity();
    let quiet = verbosity == bumpcalver::logging::Verbosity::Off;

    if config.files.is_empty() {
        if !quiet {
            println!("No files specified in the configuration.");
        }
        return Ok(());
    }

    let manager = BumpCalver {
        repo: GitRepository::open(&dir)?,
        config,
        registry: Registry::default(),
        logger: crate::verbose::Logger::new(verbosity),
        dry_run: options.dry_run,
    };
    let bumped = manager.bump(options.mode(), options.pre_release())?;

    if !quiet {
        if bumped.updated.is_empty() {
            println!("No files were updated.");
        } else if options.dry_run {
            println!(
                "Would update version to {} in specified files.",
                bumped.new_version
            );
        } else {
            println!(
                "Updated version to {} in specified files.",
                bumped.new_version
            );
        }
    }

    tracing::info!(
        elapsed = ?start.elapsed(),
        path = ?manager.working_dir(),
        "done"
    );
    Ok(())
}
