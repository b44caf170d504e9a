// Entry point: loads config, installs logging, and runs the headless frame loop.
mod app;
mod cli;

use clap::Parser;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use fluidsim::config::AppConfig;

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    // tracing events are forwarded through `log`; RUST_LOG filters by target.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut cfg = AppConfig::load_or_default(&args.config);
    args.apply(&mut cfg);

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_for_ctrlc = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_for_ctrlc.store(true, Ordering::SeqCst);
    })?;

    let mut app = app::App::new(&cfg, stop_flag);
    app.run();
    Ok(())
}
