// Resampling a timing run onto a uniform time grid

use tracing::{debug, warn};

use crate::core::constants::*;
use crate::core::error::{shift_timestamp, Coarseness, Result, TimingError};
use crate::core::format::Sample;
use crate::core::run::{nearest_index, TimingRun};
use crate::core::store::{SampleColumns, SampleStore};

/// `count` evenly spaced points from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Maps `run` onto `len * density` evenly spaced points spanning its first
/// and last time.
///
/// Every original sample keeps its offset, comment and error values on its
/// nearest grid slot. Slots in between get a linearly interpolated offset,
/// the interpolation comment and zero errors. Device timestamps of all
/// slots are derived from the grid time and the first sample's timestamp.
///
/// Fails with [`TimingError::TooCoarse`] when two samples share a slot or
/// sit on neighbouring slots; a higher density is needed then.
pub fn resample<S: SampleStore>(run: &S, density: usize) -> Result<TimingRun> {
    if density == 0 {
        return Err(TimingError::InvalidValue(
            "density multiplier must be a positive integer".to_string(),
        ));
    }
    let columns = run.columns();
    if columns.len() < 2 {
        return Err(TimingError::TooFewSamples {
            needed: 2,
            got: columns.len(),
        });
    }

    let time = columns.time();
    let count = columns.len().checked_mul(density).ok_or_else(|| {
        TimingError::InvalidValue(format!(
            "density multiplier {density} is too large for {} samples",
            columns.len()
        ))
    })?;
    let grid = linspace(time[0], time[time.len() - 1], count);

    // slot -> original sample
    let mut owner: Vec<Option<usize>> = vec![None; count];
    for (i, &t) in time.iter().enumerate() {
        let slot = nearest_index(&grid, t);
        if owner[slot].is_some() {
            warn!("resample x{} rejected: slot {} taken twice", density, slot);
            return Err(TimingError::TooCoarse(Coarseness::Collision { slot }));
        }
        owner[slot] = Some(i);
    }

    let anchors: Vec<(usize, usize)> = owner
        .iter()
        .enumerate()
        .filter_map(|(slot, o)| o.map(|i| (slot, i)))
        .collect();
    if let Some(w) = anchors.windows(2).find(|w| w[1].0 - w[0].0 < 2) {
        warn!("resample x{} rejected: slots {} and {} adjacent", density, w[0].0, w[1].0);
        return Err(TimingError::TooCoarse(Coarseness::NoGap { slot: w[1].0 }));
    }

    let offset = columns.offset();
    let base_time = time[0];
    let base_timestamp = columns.device_timestamp()[0];
    let timestamp_at = |t: f64| shift_timestamp(base_timestamp, t - base_time);

    let mut out = SampleColumns::with_capacity(count);
    for w in anchors.windows(2) {
        let (s1, i1) = w[0];
        let (s2, i2) = w[1];
        let slope = (offset[i2] - offset[i1]) / (grid[s2] - grid[s1]);

        let anchor = columns.sample_at(i1);
        out.push(Sample {
            time: grid[s1],
            device_timestamp: timestamp_at(grid[s1])?,
            ..anchor
        });
        for &t in &grid[s1 + 1..s2] {
            out.push(Sample {
                time: t,
                offset: offset[i1] + slope * (t - grid[s1]),
                comment: INTERPOLATED_COMMENT.to_string(),
                device_timestamp: timestamp_at(t)?,
                error_a: 0.0,
                error_b: 0.0,
            });
        }
    }
    // the final anchor always owns the last slot
    if let Some(&(slot, i)) = anchors.last() {
        out.push(Sample {
            time: grid[slot],
            device_timestamp: timestamp_at(grid[slot])?,
            ..columns.sample_at(i)
        });
    }

    debug!("resampled {} samples onto {} grid points", columns.len(), out.len());
    let resampled = TimingRun::new(run.header().clone(), out)?;
    Ok(resampled)
}
