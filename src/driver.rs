//! Driver for the scheduler.
use crate::cmdline::Opts;
use std::io::Write;
use wiresched_ir::from_json;
use wiresched_opt::sched::TableScheduler;
use wiresched_utils::SchedResult;

/// Run the scheduler from the command line.
pub fn run_scheduler() -> SchedResult<()> {
    let opts = Opts::get_opts();

    env_logger::Builder::new()
        .format_timestamp(None)
        .filter_level(opts.log_level)
        .target(env_logger::Target::Stderr)
        .init();

    let config = opts.sched_config()?;
    let table = from_json::parse_file(&opts.file)?;
    let delay = config.delay_info();
    let scheduler = TableScheduler::new(&table, &delay, config);
    let (result, plans) = scheduler.explore();

    if opts.dump_data_path {
        if let Some(plan) = plans.accepted() {
            eprint!("{}", scheduler.data_paths(plan));
        }
    }

    log::info!("writing schedule to {}", opts.output.as_path_string());
    let mut out = opts.output.get_write()?;
    serde_json::to_writer_pretty(&mut out, &result)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
