// Example usage of the timing-run API

use tracing::{debug, info, warn, Level};
use watchtrack::{concat_runs, resample, ConcatOptions, Result, SampleStore, TimingRun};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    // Open a WatchTracker file
    let mut run = TimingRun::open("data/sample_run.csv")?;

    let meta = run.info();
    info!("Watch: {}", meta.watch);
    info!("Start: {}", meta.start.unwrap_or_default());
    info!("Duration: {} days, {} points", meta.duration, meta.data_points);

    // Drift rate between neighbouring samples
    let rate = run.rate()?;
    for (t, r) in rate.pairs() {
        debug!("  day {:6.2}: {:+.2} s/day", t, r);
    }

    // Edit one point, then undo everything
    run.set_cursor(2)?;
    run.set_offset(3.0)?;
    run.shift_offset(-1.2)?;
    info!("Offset after edit and shift: {:.2}", run.point().offset);
    run.reset();

    // Stitch the run to itself, offsets joined at the seam
    let merged = concat_runs(&[run.clone(), run.clone()], ConcatOptions::default())?;
    info!("Merged run: {} points over {} days", merged.len(), merged.duration_days());

    // Uniform grid, three points per original sample
    match resample(&run, 3) {
        Ok(grid) => info!("Resampled onto {} points", grid.len()),
        Err(e) => warn!("Resampling failed: {}", e),
    }

    Ok(())
}
