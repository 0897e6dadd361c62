use std::process::ExitCode;
use std::str::FromStr;

use clap::Parser;
use zkvc_bench_report::config::ReportConfig;
use zkvc_bench_report::logging::{LogContext, LogLevel};
use zkvc_bench_report::{pipeline, Experiment};

#[derive(Parser, Debug)]
#[command(name = "zkvc-bench-report")]
#[command(about = "Aggregate zkVC benchmark results into a summary table and charts")]
struct Args {
    /// Experiment to report on: offchain-verify, onchain-verify or offchain-prove.
    #[arg(long, value_parser = Experiment::from_str)]
    exp: Experiment,

    /// Log level: d|debug|10, i|info|20, w|warning|30, e|error|40.
    #[arg(long, default_value = "info")]
    log: LogLevel,

    /// Open each chart with the system opener as soon as it is saved.
    #[arg(long, default_value_t = false)]
    show: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let log = LogContext::new(args.log);

    let mut cfg = ReportConfig::new(args.exp);
    cfg.show = args.show;

    match pipeline::run(&log, &cfg) {
        Ok(outcome) => {
            log.scope(|| {
                tracing::info!(
                    "done: {} ({} charts)",
                    outcome.table.display(),
                    outcome.charts.len()
                )
            });
            ExitCode::SUCCESS
        }
        Err(e) => {
            log.scope(|| tracing::error!("{}: {e}", args.exp));
            ExitCode::FAILURE
        }
    }
}
