//! adquery - Command-line client for the AD query engine
//!
//! Runs one directory search and prints the consolidated entries as JSON
//! lines on stdout. Diagnostics and search warnings go to stderr.

use clap::Parser;
use tracing::{info, warn};

use adquery_ldap::{CancellationToken, DirectoryQuery, LdapConnector};

mod args;
mod error;
mod logging;
mod output;

use args::Cli;
use error::{CliError, CliResult};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.log_format);

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let (spec, options) = cli.resolve()?;
    spec.validate().map_err(CliError::from)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling search");
            on_signal.cancel();
        }
    });

    let query = DirectoryQuery::new(LdapConnector::new()).with_options(options);
    let results = query.search(&spec, &cancel).await?;

    for warning in &results.warnings {
        warn!(query_id = %results.query_id, "{}", warning);
    }

    output::write_entries(std::io::stdout().lock(), &results.entries)?;
    info!(
        query_id = %results.query_id,
        entries = results.entries.len(),
        warnings = results.warnings.len(),
        "Done"
    );

    Ok(())
}
