// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, bail};
use config::Config;
use logging::LogTarget;
use runtime::{BrowserRuntime, BudgetRuntime};
use std::env;
use std::path::{Path, PathBuf};
use tabula_app::{GridController, GridView, MatchMode, SettingKey, SettingValue};
use tabula_db::{
    Database, ImportJob, ImportReport, SettingsStore, import_log_grid, inventory_relations,
};
use tabula_testkit::{SeedSize, sample_budget_snapshot, seed_inventory};
use tabula_tui::UiPreferences;

const DEMO_SEED: u64 = 2026;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `tabula --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let target = if options.command.is_interactive() && !options.check_only {
        LogTarget::File(config.log_file()?)
    } else {
        LogTarget::Stderr
    };
    let _log_guard = logging::init(config.log_filter(), target)?;

    match &options.command {
        Command::Budget => run_budget(&config, &options),
        Command::Totals => {
            let runtime = load_budget(&config, options.demo)?;
            println!("{}", runtime.totals_text());
            Ok(())
        }
        Command::Browse { admin } => run_browse(&config, &options, *admin),
        Command::Import {
            dest,
            delete_originals,
            files,
        } => run_import(&config, &options, dest.as_deref(), *delete_originals, files),
        Command::Settings { assignment } => {
            print!("{}", run_settings(&config, assignment.as_ref())?);
            Ok(())
        }
    }
}

fn load_budget(config: &Config, demo: bool) -> Result<BudgetRuntime> {
    if demo {
        return BudgetRuntime::demo(&sample_budget_snapshot());
    }
    let path = config.budget_path()?;
    BudgetRuntime::load(&path).with_context(|| {
        format!(
            "load budget {}; set [storage].budget_path or TABULA_BUDGET_PATH",
            path.display()
        )
    })
}

fn run_budget(config: &Config, options: &CliOptions) -> Result<()> {
    let mut runtime = load_budget(config, options.demo)?;
    if options.check_only {
        return Ok(());
    }

    let mut settings = SettingsStore::load(&config.settings_path()?)?;
    let mut preferences = ui_preferences(config, &settings);
    let result = tabula_tui::run_app(&mut runtime, &mut preferences);
    // saved whether or not the loop errored
    let saved = runtime.save_if_dirty();
    remember_preferences(&mut settings, preferences)?;
    result?;
    if saved? {
        tracing::info!("budget saved on exit");
    }
    Ok(())
}

fn open_database(config: &Config, demo: bool) -> Result<Database> {
    if demo {
        let db = Database::open_memory()?;
        let summary = seed_inventory(db.raw_connection(), DEMO_SEED, SeedSize::demo())
            .context("seed demo inventory")?;
        tracing::info!(
            customers = summary.customers,
            orders = summary.orders,
            "seeded demo inventory"
        );
        return Ok(db);
    }

    let db_path = config.db_path()?;
    Database::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or TABULA_DB_PATH",
            db_path.display()
        )
    })
}

fn run_browse(config: &Config, options: &CliOptions, admin: bool) -> Result<()> {
    let db = open_database(config, options.demo)?;
    for spec in inventory_relations(admin) {
        db.verify_relation(&spec)
            .with_context(|| format!("database {} is not an inventory database", db.label()))?;
    }
    if options.check_only {
        return db.close();
    }

    let mut settings = SettingsStore::load(&config.settings_path()?)?;
    let mut preferences = ui_preferences(config, &settings);
    let mut runtime = BrowserRuntime::open(&db, admin)?;
    let result = tabula_tui::run_app(&mut runtime, &mut preferences);
    drop(runtime);
    db.close()?;
    remember_preferences(&mut settings, preferences)?;
    result
}

fn ui_preferences(config: &Config, settings: &SettingsStore) -> UiPreferences {
    let preferences = UiPreferences::new(config.case_sensitive_filter());
    match settings.get(SettingKey::FilterSyntax) {
        SettingValue::Text(label) => match MatchMode::parse(&label) {
            Some(mode) => preferences.with_match_mode(mode),
            None => preferences,
        },
        SettingValue::Bool(_) => preferences,
    }
}

fn remember_preferences(settings: &mut SettingsStore, preferences: UiPreferences) -> Result<()> {
    settings.set(
        SettingKey::FilterSyntax,
        SettingValue::Text(preferences.match_mode.label().to_owned()),
    )?;
    settings.flush()
}

/// Lists every setting, or writes one and lists the result.
fn run_settings(config: &Config, assignment: Option<&(String, String)>) -> Result<String> {
    let mut settings = SettingsStore::load(&config.settings_path()?)?;
    if let Some((name, raw)) = assignment {
        let key = SettingKey::parse(name).with_context(|| {
            let known = SettingKey::ALL.map(SettingKey::as_str).join(", ");
            format!("unknown setting {name:?}; expected one of {known}")
        })?;
        let value = SettingValue::parse_for_key(key, raw)
            .with_context(|| format!("invalid value {raw:?} for setting {name}"))?;
        settings.set(key, value)?;
        settings.flush()?;
        tracing::info!(key = key.as_str(), path = %settings.path().display(), "setting saved");
    }

    let mut out = String::new();
    for key in SettingKey::ALL {
        let value = settings.get(key);
        let shown = value.to_storage(key).unwrap_or_default();
        out.push_str(&format!("{} = {shown}\n", key.as_str()));
    }
    Ok(out)
}

fn run_import(
    config: &Config,
    options: &CliOptions,
    dest: Option<&Path>,
    delete_flag: bool,
    files: &[PathBuf],
) -> Result<()> {
    if files.is_empty() {
        bail!("import needs at least one file; run with --help to see usage");
    }
    let dest = match dest {
        Some(dest) => dest.to_path_buf(),
        None => config.image_dir()?,
    };
    let settings = SettingsStore::load(&config.settings_path()?)?;
    let delete_originals = delete_flag || settings.get_bool(SettingKey::DeleteOriginalsAfterImport);
    if options.check_only {
        return Ok(());
    }

    let report = ImportJob::spawn(files.to_vec(), dest.clone(), delete_originals)?.wait()?;
    let mut log = import_log_grid()?;
    log.apply_batch(report.rows())?;
    print!("{}", render_import_log(&log));
    println!("{}", import_summary(&report, &dest));
    if !report.failed.is_empty() {
        bail!("{} file(s) failed to import", report.failed.len());
    }
    Ok(())
}

fn render_import_log(log: &GridController) -> String {
    let mut out = String::new();
    for row in 0..log.row_count() {
        let cells = (0..log.columns().len())
            .map(|column| log.display_at(row, column).unwrap_or_default())
            .collect::<Vec<_>>();
        if cells.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let cell = |index: usize| cells.get(index).map(String::as_str).unwrap_or_default();
        out.push_str(&format!("{:<32} {:<28} {:>10}\n", cell(0), cell(1), cell(2)));
    }
    out
}

fn import_summary(report: &ImportReport, dest: &Path) -> String {
    format!(
        "imported {}, duplicates {}, failed {} into {}",
        report.imported.len(),
        report.duplicates.len(),
        report.failed.len(),
        dest.display()
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Budget,
    Browse {
        admin: bool,
    },
    Import {
        dest: Option<PathBuf>,
        delete_originals: bool,
        files: Vec<PathBuf>,
    },
    Totals,
    Settings {
        assignment: Option<(String, String)>,
    },
}

impl Command {
    fn is_interactive(&self) -> bool {
        matches!(self, Self::Budget | Self::Browse { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Browse { .. } => "browse",
            Self::Import { .. } => "import",
            Self::Totals => "totals",
            Self::Settings { .. } => "settings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    command: Command,
    config_path: PathBuf,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        command: Command::Budget,
        config_path: default_config_path,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };
    let mut command_seen = false;
    let mut settings_words = Vec::new();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            "--admin" => match &mut options.command {
                Command::Browse { admin } => *admin = true,
                other => bail!("--admin only applies to `tabula browse`, not `{}`", other.name()),
            },
            "--dest" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--dest requires a directory"))?;
                match &mut options.command {
                    Command::Import { dest, .. } => *dest = Some(PathBuf::from(value.as_ref())),
                    other => {
                        bail!("--dest only applies to `tabula import`, not `{}`", other.name())
                    }
                }
            }
            "--delete-originals" => match &mut options.command {
                Command::Import {
                    delete_originals, ..
                } => *delete_originals = true,
                other => bail!(
                    "--delete-originals only applies to `tabula import`, not `{}`",
                    other.name()
                ),
            },
            flag if flag.starts_with('-') => {
                bail!("unknown argument {flag:?}; run with --help to see supported options");
            }
            word if !command_seen => {
                options.command = match word {
                    "budget" => Command::Budget,
                    "browse" => Command::Browse { admin: false },
                    "import" => Command::Import {
                        dest: None,
                        delete_originals: false,
                        files: Vec::new(),
                    },
                    "totals" => Command::Totals,
                    "settings" => Command::Settings { assignment: None },
                    unknown => bail!(
                        "unknown command {unknown:?}; expected budget, browse, import, totals, or settings"
                    ),
                };
                command_seen = true;
            }
            word => match &mut options.command {
                Command::Import { files, .. } => files.push(PathBuf::from(word)),
                Command::Settings { .. } => settings_words.push(word.to_owned()),
                other => bail!(
                    "unexpected argument {word:?} for `tabula {}`; run with --help",
                    other.name()
                ),
            },
        }
    }

    if let Command::Settings { assignment } = &mut options.command {
        *assignment = match settings_words.as_slice() {
            [] => None,
            [verb, key, value] if verb == "set" => Some((key.clone(), value.clone())),
            _ => bail!("usage: tabula settings [set <key> <value>]"),
        };
    }

    Ok(options)
}

fn print_help() {
    println!("tabula");
    println!("  budget                   Edit the income and expense ledgers (default)");
    println!("  browse [--admin]         Browse the inventory database; --admin shows Staff");
    println!("  import [--dest <dir>] [--delete-originals] <files...>");
    println!("                           Copy image files into the image directory");
    println!("  totals                   Print income, expenses, and the remainder");
    println!("  settings [set <key> <value>]");
    println!("                           List user settings, or change one");
    println!();
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Use seeded demo data (in-memory)");
    println!("  --check                  Validate config and data files, then exit");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{
        CliOptions, Command, Config, import_summary, parse_cli_args, remember_preferences,
        render_import_log, run_settings, ui_preferences,
    };
    use anyhow::Result;
    use std::path::{Path, PathBuf};
    use tabula_app::{MatchMode, SettingKey};
    use tabula_db::{SettingsStore, import_files, import_log_grid};
    use tabula_tui::UiPreferences;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/tabula-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_budget_with_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                command: Command::Budget,
                config_path: default_options_path(),
                print_config_path: false,
                demo: false,
                print_example: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["totals", "--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.command, Command::Totals);
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_config_value() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));

        let error = parse_cli_args(vec!["report"], default_options_path())
            .expect_err("unknown command should fail");
        assert!(error.to_string().contains("unknown command"));
    }

    #[test]
    fn parse_cli_args_reads_browse_admin() -> Result<()> {
        let options = parse_cli_args(vec!["browse", "--admin", "--demo"], default_options_path())?;
        assert_eq!(options.command, Command::Browse { admin: true });
        assert!(options.demo);

        let error = parse_cli_args(vec!["--admin"], default_options_path())
            .expect_err("admin without browse should fail");
        assert!(error.to_string().contains("only applies to `tabula browse`"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_collects_import_files() -> Result<()> {
        let options = parse_cli_args(
            vec!["import", "a.png", "--dest", "/photos", "b.jpg", "--delete-originals"],
            default_options_path(),
        )?;
        assert_eq!(
            options.command,
            Command::Import {
                dest: Some(PathBuf::from("/photos")),
                delete_originals: true,
                files: vec![PathBuf::from("a.png"), PathBuf::from("b.jpg")],
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_rejects_stray_words() {
        let error = parse_cli_args(vec!["totals", "extra"], default_options_path())
            .expect_err("totals takes no arguments");
        assert!(error.to_string().contains("unexpected argument"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(!options.demo);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }

    #[test]
    fn only_terminal_commands_are_interactive() {
        assert!(Command::Budget.is_interactive());
        assert!(Command::Browse { admin: false }.is_interactive());
        assert!(!Command::Totals.is_interactive());
    }

    #[test]
    fn import_log_skips_the_placeholder_row() -> Result<()> {
        let source = tempfile::tempdir()?;
        let dest = tempfile::tempdir()?;
        let path = source.path().join("cat.png");
        std::fs::write(&path, "meow")?;

        let report = import_files(&[path], dest.path(), false)?;
        let mut log = import_log_grid()?;
        log.apply_batch(report.rows())?;

        let printed = render_import_log(&log);
        let lines = printed.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2, "{printed}");
        assert!(lines[0].starts_with("cat.png"));
        assert!(lines[0].contains("imported"));
        assert!(lines[1].starts_with("Total Bytes"));

        let summary = import_summary(&report, Path::new("/photos"));
        assert_eq!(summary, "imported 1, duplicates 0, failed 0 into /photos");
        Ok(())
    }

    #[test]
    fn parse_cli_args_reads_settings_assignment() -> Result<()> {
        let options = parse_cli_args(vec!["settings"], default_options_path())?;
        assert_eq!(options.command, Command::Settings { assignment: None });

        let options = parse_cli_args(
            vec!["settings", "set", "import.delete_originals", "true"],
            default_options_path(),
        )?;
        assert_eq!(
            options.command,
            Command::Settings {
                assignment: Some(("import.delete_originals".to_owned(), "true".to_owned())),
            }
        );

        let error = parse_cli_args(vec!["settings", "set", "ui.filter_syntax"], default_options_path())
            .expect_err("a missing value should fail");
        assert!(error.to_string().contains("usage: tabula settings"));
        Ok(())
    }

    fn config_with_settings(dir: &Path) -> Result<(Config, PathBuf)> {
        let settings_path = dir.join("settings.toml");
        let config_path = dir.join("config.toml");
        std::fs::write(
            &config_path,
            format!(
                "version = 1\n[storage]\nsettings_path = {:?}\n",
                settings_path.display().to_string()
            ),
        )?;
        Ok((Config::load(&config_path)?, settings_path))
    }

    #[test]
    fn settings_command_writes_and_lists_values() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let (config, settings_path) = config_with_settings(temp.path())?;

        let listed = run_settings(&config, None)?;
        assert!(listed.contains("import.delete_originals = false"), "{listed}");
        assert!(!settings_path.exists(), "listing never writes");

        let assignment = ("import.delete_originals".to_owned(), "yes".to_owned());
        let listed = run_settings(&config, Some(&assignment))?;
        assert!(listed.contains("import.delete_originals = true"), "{listed}");

        let stored = SettingsStore::load(&settings_path)?;
        assert!(stored.get_bool(SettingKey::DeleteOriginalsAfterImport));
        Ok(())
    }

    #[test]
    fn settings_command_rejects_unknown_keys_and_values() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let (config, settings_path) = config_with_settings(temp.path())?;

        let unknown = ("window.geometry".to_owned(), "800x600".to_owned());
        let error = run_settings(&config, Some(&unknown)).expect_err("unknown key");
        assert!(error.to_string().contains("unknown setting"));

        let bad = ("ui.filter_syntax".to_owned(), "glob".to_owned());
        let error = run_settings(&config, Some(&bad)).expect_err("unknown syntax");
        assert!(error.to_string().contains("invalid value"));
        assert!(!settings_path.exists());
        Ok(())
    }

    #[test]
    fn session_filter_syntax_is_restored_next_time() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let (config, settings_path) = config_with_settings(temp.path())?;

        let mut settings = SettingsStore::load(&settings_path)?;
        let start = ui_preferences(&config, &settings);
        assert_eq!(start, UiPreferences::new(true));

        remember_preferences(&mut settings, start.with_match_mode(MatchMode::RegularExpression))?;
        drop(settings);

        let settings = SettingsStore::load(&settings_path)?;
        assert_eq!(
            ui_preferences(&config, &settings).match_mode,
            MatchMode::RegularExpression
        );
        Ok(())
    }
}
