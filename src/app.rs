//! Run composition: config → source → pipeline → optional live view.

use crate::config::Config;
use crate::device::open_board;
use crate::error::Result;
use crate::pipeline::orchestrator::Pipeline;
use crate::pipeline::schema::REDUCED_FIELD_NAMES;
use crate::pipeline::types::{ReducedView, RunReport};
use crate::pipeline::worker::Worker;
use crate::source::{FrameSource, LiveSource, ReplaySource};
use crossbeam_channel::{Receiver, bounded};
use std::io::{self, Write};
use std::path::Path;

/// Run a live capture with the board and duration from `config`.
///
/// # Arguments
/// * `config` - Effective configuration (CLI overrides already applied)
/// * `show` - Print the reduced view to stdout as it arrives
///
/// # Returns
/// The run report, or the root-cause error of a failed run
pub fn run_capture(config: &Config, show: bool) -> Result<RunReport> {
    config.validate()?;
    let kind = config.board_kind()?;
    let board = open_board(kind)?;
    log::info!(
        "capture: board {} for {:.1}s",
        kind,
        config.capture.duration_secs
    );

    let source = LiveSource::new(
        board,
        config.connection_params(),
        config.capture_duration()?,
    )
    .with_poll_strategy(config.poll_strategy());

    run_source(config, Box::new(source), show)
}

/// Replay a recorded stream at its original pace.
pub fn run_replay(config: &Config, path: &Path, show: bool) -> Result<RunReport> {
    config.validate()?;
    log::info!("replay: {}", path.display());
    run_source(config, Box::new(ReplaySource::new(path)), show)
}

fn run_source(config: &Config, source: Box<dyn FrameSource>, show: bool) -> Result<RunReport> {
    run_with_view(config, source, show.then(io::stdout))
}

/// Runs `source`, printing the reduced view to `view_out` when one is given.
///
/// The printer starts only once the pipeline is running, so a source that
/// fails to open prints nothing.
fn run_with_view<W>(
    config: &Config,
    source: Box<dyn FrameSource>,
    view_out: Option<W>,
) -> Result<RunReport>
where
    W: Write + Send + 'static,
{
    let mut pipeline_config = config.to_pipeline_config();
    let destination = config.output.destination.clone();

    let Some(out) = view_out else {
        return Pipeline::new(pipeline_config).run(source, destination);
    };

    let (view_tx, view_rx) = bounded(config.pipeline.view_buffer);
    pipeline_config.view_tx = Some(view_tx);

    let handle = Pipeline::new(pipeline_config).start(source, destination)?;
    let printer = Worker::spawn("view", move || Ok(print_views(&view_rx, out)?));
    let report = handle.wait();

    // The sink's sender is gone once the pipeline returns, so the printer drains and exits.
    match printer.map(Worker::join) {
        Ok(Ok(Ok(lines))) => log::debug!("view: printed {} lines", lines),
        Ok(Ok(Err(e))) => log::debug!("view: stopped early: {}", e),
        Ok(Err(panic)) => log::warn!("view printer panicked: {}", panic),
        Err(e) => log::warn!("view printer not started: {}", e),
    }

    report
}

/// Writes the reduced header, then one line per view until the channel closes.
///
/// Returns the number of view lines written.
pub fn print_views<W: Write>(rx: &Receiver<Vec<ReducedView>>, mut out: W) -> io::Result<u64> {
    writeln!(out, "{}", REDUCED_FIELD_NAMES.join(","))?;
    let mut lines = 0;
    for batch in rx {
        for view in &batch {
            writeln!(out, "{}", view)?;
            lines += 1;
        }
        out.flush()?;
    }
    Ok(lines)
}

/// One-line human summary of a finished run.
pub fn summary_line(report: &RunReport) -> String {
    let mut line = format!(
        "{} records in {} frames ({:.2}s)",
        report.consumption.records,
        report.consumption.frames,
        report.elapsed.as_secs_f64()
    );
    if report.consumption.views_dropped > 0 {
        line.push_str(&format!(
            ", {} view batches dropped",
            report.consumption.views_dropped
        ));
    }
    line
}
