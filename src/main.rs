/*!
Boot entry point: bring the stores up and report what they hold.

The interactive presentation layer ships separately; running this
binary directly is a way to check a data directory's health and seed
the default admin on a fresh one.
*/
use simplelog::{ColorChoice, TerminalMode, TermLogger};

use uniaid::config::{Cfg, Glob, load_configuration};
use uniaid::log_level_from_env;

fn main() -> Result<(), String> {
    let log_cfg = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("uniaid")
        .build();
    TermLogger::init(
        log_level_from_env(),
        log_cfg,
        TerminalMode::Stdout,
        ColorChoice::Auto,
    ).map_err(|e| format!("Error initializing logging: {}", &e))?;

    let glob = match std::env::args().nth(1) {
        Some(cfg_path) => load_configuration(&cfg_path)?,
        None => Glob::from_cfg(Cfg::default())?,
    };

    log::info!(
        "Stores up: {} admins, {} students, {} guidance, {} head admins.",
        glob.accounts.admins().len(),
        glob.accounts.students().len(),
        glob.accounts.guidance().len(),
        glob.accounts.head_admins().len(),
    );

    let summary = glob.requests.summary_counts();
    println!(
        "Aid requests: {} total | {} pending | {} accepted | {} declined",
        summary.total, summary.pending, summary.accepted, summary.declined
    );

    Ok(())
}
