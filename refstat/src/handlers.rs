use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::ArgMatches;
use colored::Colorize;
use refstat_core::config::{CONFIG_FILE_NAME, DATABASE_FILE_NAME, starter_config};
use refstat_core::report::{self, ReportData, ReportFormat};
use refstat_core::sync::SyncOutcome;
use refstat_core::{Database, Error, LogStore, RequestContext, Settings, Tracker, VisitFilter};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Settings and paths resolved from the global `--config` / `--database` flags.
pub struct Environment {
    pub settings: Settings,
    pub config_path: PathBuf,
    pub database_path: PathBuf,
}

impl Environment {
    pub fn load(config: Option<&PathBuf>, database: Option<&PathBuf>) -> Result<Self> {
        let config_path = config.cloned().unwrap_or_else(Settings::default_path);
        let settings = Settings::load(&config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?;
        let database_path = match database {
            Some(path) => expand_path(path),
            None => settings.database_path(),
        };

        Ok(Self {
            settings,
            config_path,
            database_path,
        })
    }

    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        Self::load(
            matches.get_one::<PathBuf>("config"),
            matches.get_one::<PathBuf>("database"),
        )
    }

    /// Opens the log for commands that write visits, creating it if needed.
    pub fn open_database(&self) -> Result<Database> {
        Database::new(&self.database_path)
            .with_context(|| format!("Failed to open database {}", self.database_path.display()))
    }

    /// Opens an existing log. A missing file is an error rather than a new empty log.
    pub fn open_existing_database(&self) -> Result<Database> {
        if !Database::exists(&self.database_path) {
            bail!(
                "No database at {} (run `refstat init` or check --database)",
                self.database_path.display()
            );
        }
        self.open_database()
    }

    pub fn tracker(&self) -> Tracker {
        Tracker::new(&self.settings)
    }
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

/// Writes the starter config, recording `db_path` so later commands that read
/// this config use the same database.
pub fn write_starter_config(config_path: &Path, db_path: &Path) -> Result<()> {
    fs::write(config_path, starter_config(db_path))
        .with_context(|| format!("Failed to write {}", config_path.display()))
}

// Helper functions for import handler

/// Parse one tab-separated visit line: referrer, destination[, ip[, user_id]].
/// A referrer of `-` means the visit had none.
pub fn parse_visit_line(line: &str) -> Option<RequestContext> {
    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    if fields.len() < 2 || fields[1].is_empty() {
        warn!("Skipping malformed visit line '{}'", line);
        return None;
    }

    let referrer = match fields[0] {
        "" | "-" => None,
        referrer => Some(referrer),
    };
    let ip = fields.get(2).copied().unwrap_or("");
    let user_id = match fields.get(3).copied().filter(|id| !id.is_empty()) {
        Some(id) => match id.parse::<i64>() {
            Ok(id) => id,
            Err(_) => {
                warn!("Skipping visit line with invalid user id '{}'", id);
                return None;
            }
        },
        None => 0,
    };

    Some(RequestContext::new(referrer, fields[1]).with_visitor(ip, user_id))
}

/// Load visits from a tab-separated file, skipping blank and `#` lines
pub fn load_visits_from_file(path: &Path) -> refstat_core::Result<Vec<RequestContext>> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::InvalidInput(format!(
            "Failed to read visits file {}: {}",
            path.display(),
            e
        ))
    })?;

    let visits: Vec<RequestContext> = content
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .filter_map(parse_visit_line)
        .collect();

    if visits.is_empty() {
        return Err(Error::InvalidInput(format!(
            "No valid visits found in {}",
            path.display()
        )));
    }

    Ok(visits)
}

pub fn parse_date(value: &str) -> refstat_core::Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        Error::InvalidInput(format!(
            "Invalid date '{}' (expected YYYY-MM-DD): {}",
            value, e
        ))
    })
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> io::Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

fn confirmed(response: &str) -> bool {
    response == "y" || response == "yes"
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    print_divider();
    println!("{}", "  REFSTAT INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let dir = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or("~/.config/refstat/");
    let force = args.get_flag("force");
    let expanded_dir = shellexpand::tilde(dir);
    let config_dir = Path::new(expanded_dir.as_ref());
    let config_path = config_dir.join(CONFIG_FILE_NAME);
    let db_path = match args.get_one::<PathBuf>("database") {
        Some(path) => expand_path(path),
        None => config_dir.join(DATABASE_FILE_NAME),
    };

    println!(
        "{} Target: {}",
        "→".blue(),
        config_dir.display().to_string().bright_white()
    );
    println!();

    let config_exists = config_path.exists();
    let db_exists = Database::exists(&db_path);

    if (config_exists || db_exists) && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("An existing installation was found:");
        if config_exists {
            println!(
                "  {} {}",
                "•".yellow(),
                config_path.display().to_string().bright_white()
            );
        }
        if db_exists {
            println!(
                "  {} {}",
                "•".yellow(),
                db_path.display().to_string().bright_white()
            );
        }
        println!();
        println!(
            "{}",
            "This operation will overwrite the config and erase all logged visits.".yellow()
        );

        let response = print_prompt("Do you want to continue? [y/N]:")?;
        println!();

        if !confirmed(&response) {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return Ok(());
        }
    }

    fs::create_dir_all(config_dir)
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;

    write_starter_config(&config_path, &db_path)?;
    println!(
        "{} Config written: {}",
        "✓".green().bold(),
        config_path.display().to_string().bright_white()
    );

    if Database::exists(&db_path) {
        Database::drop(&db_path)
            .with_context(|| format!("Failed to remove {}", db_path.display()))?;
        println!("{} Existing database removed", "✓".green().bold());
    }

    Database::new(&db_path)
        .with_context(|| format!("Failed to create database {}", db_path.display()))?;
    println!(
        "{} Database initialized: {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );

    println!();
    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!();
    Ok(())
}

pub fn handle_record(env: &Environment, args: &ArgMatches) -> Result<()> {
    let referrer = args.get_one::<String>("referrer").map(String::as_str);
    let Some(url) = args.get_one::<String>("url") else {
        bail!("--url is required");
    };
    let ip = args.get_one::<String>("ip").map(String::as_str).unwrap_or("");
    let user_id = args.get_one::<i64>("user-id").copied().unwrap_or(0);

    let ctx = RequestContext::new(referrer, url).with_visitor(ip, user_id);
    let db = env.open_database()?;

    match env.tracker().record(&db, &ctx)? {
        Some(id) => println!("{} Logged visit #{}", "✓".green().bold(), id),
        None => println!("{} Visit not logged (no referrer or untracked host)", "→".blue()),
    }
    Ok(())
}

pub fn handle_import(env: &Environment, args: &ArgMatches) -> Result<()> {
    let Some(path) = args.get_one::<PathBuf>("file") else {
        bail!("--file is required");
    };

    let visits = load_visits_from_file(path)?;
    let db = env.open_database()?;
    let tracker = env.tracker();

    let mut logged = 0;
    for ctx in &visits {
        if tracker.record(&db, ctx)?.is_some() {
            logged += 1;
        }
    }

    println!(
        "{} Imported {} of {} visits from {}",
        "✓".green().bold(),
        logged.to_string().cyan(),
        visits.len().to_string().cyan(),
        path.display().to_string().bright_white()
    );
    Ok(())
}

pub fn handle_sync(env: &Environment) -> Result<()> {
    let db = env.open_existing_database()?;

    match env.tracker().sync(&db)? {
        SyncOutcome::Skipped => {
            println!("{} Sync skipped: no referrers defined", "→".yellow().bold());
        }
        SyncOutcome::Completed(stats) => {
            println!(
                "{} Sync complete: {} examined, {} updated, {} cleared",
                "✓".green().bold(),
                stats.examined.to_string().cyan(),
                stats.updated.to_string().cyan(),
                stats.cleared.to_string().cyan()
            );
        }
    }
    Ok(())
}

pub fn handle_clear(env: &Environment, args: &ArgMatches) -> Result<()> {
    let db = env.open_existing_database()?;
    let count = db.count()?;

    if !args.get_flag("yes") {
        println!(
            "{} This will delete {} logged visits from {}",
            "⚠".yellow().bold(),
            count,
            env.database_path.display().to_string().bright_white()
        );
        let response = print_prompt("Do you want to continue? [y/N]:")?;
        if !confirmed(&response) {
            println!("{} Clear cancelled.", "✗".red().bold());
            return Ok(());
        }
    }

    let removed = db.clear()?;
    println!("{} Removed {} visits", "✓".green().bold(), removed);
    Ok(())
}

pub fn handle_report(env: &Environment, args: &ArgMatches) -> Result<()> {
    let format_name = args
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");
    let Some(format) = ReportFormat::from_str(format_name) else {
        bail!("Unknown report format '{}'", format_name);
    };
    let top = args
        .get_one::<u64>("top")
        .map(|n| *n as usize)
        .unwrap_or(100);
    let filter = VisitFilter {
        since: args.get_one::<NaiveDate>("since").copied(),
        until: args.get_one::<NaiveDate>("until").copied(),
        ..Default::default()
    };

    let db = env.open_existing_database()?;
    let data: ReportData = report::gather_report_data(&db, &filter, top)?;
    let content = report::generate_report(&data, &format)?;

    match args.get_one::<PathBuf>("output") {
        Some(path) => {
            report::save_report(&content, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!(
                "{} Report saved: {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", content),
    }
    Ok(())
}

pub fn handle_referrers(env: &Environment) -> Result<()> {
    let tracker = env.tracker();
    let Some(map) = tracker.referrers() else {
        println!(
            "{} No referrers defined. Enable track_all_referrers or add [[hosts]] to {}",
            "→".yellow().bold(),
            env.config_path.display()
        );
        return Ok(());
    };

    let overridden: Vec<&str> = env.settings.hosts.iter().map(|h| h.host.as_str()).collect();

    for definition in map.iter() {
        let source = if overridden.contains(&definition.host.as_str()) {
            "override".magenta()
        } else {
            "built-in".bright_black()
        };
        let flag = if definition.flagged {
            " [FLAGGED]".red().bold().to_string()
        } else {
            String::new()
        };
        println!(
            "{:<28} {:<9} {:<26} {}{}",
            definition.host.bright_white(),
            definition.referrer_type.as_str(),
            definition.name,
            source,
            flag
        );
    }
    println!();
    println!(
        "{} {} hosts (track all: {})",
        "ℹ".blue(),
        map.len(),
        tracker.track_all()
    );
    Ok(())
}

pub fn handle_log(env: &Environment, args: &ArgMatches) -> Result<()> {
    let limit = args.get_one::<usize>("limit").copied();
    let db = env.open_existing_database()?;
    let visits = db.visits(&VisitFilter {
        limit,
        newest_first: true,
        ..Default::default()
    })?;

    if visits.is_empty() {
        println!("{}", report::EMPTY_REPORT_MESSAGE);
        return Ok(());
    }

    for visit in visits {
        let referrer_type = visit.referrer_type.map(|t| t.as_str()).unwrap_or("-");
        println!(
            "{:>6} {} {:<28} {:<9} {} {}",
            visit.id,
            visit.recorded_at.bright_black(),
            report::referrer_key(&visit),
            referrer_type,
            "→".blue(),
            visit.destination_url
        );
    }
    Ok(())
}
