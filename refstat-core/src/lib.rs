pub mod catalog;
pub mod classifier;
pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod report;
pub mod resolver;
pub mod sync;
pub mod tracker;

use colored::Colorize;

pub use classifier::RequestContext;
pub use config::Settings;
pub use data::{Database, LogStore, VisitFilter};
pub use error::{Error, Result};
pub use tracker::Tracker;

pub fn print_banner() {
    eprintln!(
        "{} {}",
        "refstat".bright_cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
    eprintln!("{}", "where your visitors come from".bright_black());
    eprintln!();
}
