use colored::Colorize;
use commands::command_argument_builder;
use refstat::handlers::{
    Environment, handle_clear, handle_import, handle_init, handle_log, handle_record,
    handle_referrers, handle_report, handle_sync,
};
use refstat_core::print_banner;
use tracing_subscriber::EnvFilter;

mod commands;

fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    let verbose = chosen_command.get_flag("verbose");

    // Logs go to stderr so reports on stdout stay pipeable
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    let result = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command),
        Some((name, primary_command)) => Environment::from_matches(primary_command)
            .and_then(|env| match name {
                "record" => handle_record(&env, primary_command),
                "import" => handle_import(&env, primary_command),
                "sync" => handle_sync(&env),
                "clear" => handle_clear(&env, primary_command),
                "report" => handle_report(&env, primary_command),
                "referrers" => handle_referrers(&env),
                "log" => handle_log(&env, primary_command),
                _ => unreachable!("clap should ensure we don't get here"),
            }),
        None => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
