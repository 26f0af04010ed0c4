mod args;
mod cdev;
mod delay;

use anyhow::{Context, Result};
use clap::Parser;
use gpiod_monitor::{Callback, Engine, LineId};
use gpiod_monitor_config::MonitorTomlConfig;
use log::info;

use crate::args::Args;
use crate::cdev::CdevBackend;
use crate::delay::TokioDelay;

/// Exit status of a process stopped by SIGINT
const INTERRUPTED: i32 = 130;

fn print_event(event: &'static str) -> Callback {
    Callback::new(move |line: LineId| println!("{}: {}", line, event))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::builder().filter_level(args.log_level()).init();

    let file = match &args.config {
        Some(path) => MonitorTomlConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => MonitorTomlConfig::default(),
    };
    let config = args.debounce_config(&file);

    let mut engine = Engine::new(args.chip.as_str(), config, CdevBackend);
    for &line in args.lines.iter() {
        engine.register(line, Some(print_event("1")), Some(print_event("0")));
        for seconds in args.long_holds(line, &file) {
            let message = format!("held {}s", seconds);
            let callback = Callback::new(move |line: LineId| println!("{}: {}", line, message));
            engine.register_long_hold(line, callback, seconds);
        }
        for seconds in args.pulses(line, &config, &file) {
            engine.register_pulse(line, print_event("pulse"), seconds);
        }
    }

    let mut delay = TokioDelay;
    tokio::select! {
        result = engine.run(&mut delay) => {
            result.with_context(|| format!("Monitoring chip {} failed", args.chip))?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
        }
    }

    // The run future is gone at this point, so the lines are released
    drop(engine);
    info!("Interrupted");
    std::process::exit(INTERRUPTED);
}
