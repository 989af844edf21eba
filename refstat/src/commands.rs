use crate::CLAP_STYLING;
use clap::{arg, command};
use refstat::handlers::parse_date;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("refstat")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("refstat")
        .about("Records, classifies and reports on the referrers of your site's visitors")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(arg!(-v --"verbose" "Enable debug logging (RUST_LOG overrides)").required(false))
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .global(true)
                .help("Path to config.toml (default: ~/.config/refstat/config.toml)")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            arg!(-d --"database" <PATH>)
                .required(false)
                .global(true)
                .help("Path to the visit log database (overrides the config file)")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the refstat config and database on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Directory to store the config and database")
                        .default_value("~/.config/refstat/"),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrites any existing config and database without asking.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("record")
                .about("Classifies a single visit and logs it if it qualifies")
                .arg(
                    arg!(-r --"referrer" <URL>)
                        .required(false)
                        .help("The visitor's Referer header (omit for direct visits)"),
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The URL of the page that was visited"),
                )
                .arg(
                    arg!(--"ip" <IP>)
                        .required(false)
                        .help("The visitor's IP address"),
                )
                .arg(
                    arg!(--"user-id" <ID>)
                        .required(false)
                        .help("Authenticated user id (0 for anonymous)")
                        .value_parser(clap::value_parser!(i64))
                        .default_value("0"),
                ),
        )
        .subcommand(
            command!("import")
                .about(
                    "Logs visits from a tab-separated file: referrer, destination, and optionally \
                ip and user id",
                )
                .arg(
                    arg!(-f --"file" <PATH>)
                        .required(true)
                        .help("Path to the tab-separated visits file")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("sync")
                .about("Re-classifies logged visits against the current referrer definitions"),
        )
        .subcommand(
            command!("clear")
                .about("Deletes every logged visit")
                .arg(
                    arg!(-y --"yes")
                        .required(false)
                        .help("Don't ask for confirmation"),
                ),
        )
        .subcommand(
            command!("report")
                .about("Summarizes logged visits by referrer, type and destination")
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, csv, markdown")
                        .value_parser(["text", "json", "csv", "markdown"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-t --"top" <N>)
                        .required(false)
                        .help("Rows to show per section (at least 1)")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("100"),
                )
                .arg(
                    arg!(--"since" <DATE>)
                        .required(false)
                        .help("Only include visits on or after this date (YYYY-MM-DD)")
                        .value_parser(parse_date),
                )
                .arg(
                    arg!(--"until" <DATE>)
                        .required(false)
                        .help("Only include visits on or before this date (YYYY-MM-DD)")
                        .value_parser(parse_date),
                ),
        )
        .subcommand(command!("referrers").about("Lists the known referrer hosts in effect"))
        .subcommand(
            command!("log").about("Lists logged visits").arg(
                arg!(-l --"limit" <N>)
                    .required(false)
                    .help("Maximum number of visits to show")
                    .value_parser(clap::value_parser!(usize))
                    .default_value("50"),
            ),
        )
}
