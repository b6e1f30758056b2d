//! Reporting artifact corrections.
//!
//! Every correction is a pure function from one series to a new one.
//! Missing values never match a pattern and are excluded from every mean.

use tracing::debug;

use super::config::RepairConfig;
use super::dataset::{EntityDataset,Feature,TimeSeries};


/// Zero days preceding the catch-up report in a weekly batch.
pub const WEEKLY_ZEROS: usize = 6;
const WEEKLY_WINDOW: usize = WEEKLY_ZEROS + 1;


/// Spreads weekly batched reports (six zero days, then one non-zero day
/// carrying the whole week) evenly over the seven days. Matches are taken
/// from the input sequence, and a window running past the end is left
/// alone.
pub fn weekly_reporting(values: &[Option<f64>]) -> Vec<Option<f64>> {

    let mut result = values.to_vec();
    let mut j = 0;

    while j + WEEKLY_WINDOW <= values.len() {
	let window = &values[j..j + WEEKLY_WINDOW];
	match is_weekly_batch(window) {
	    true => {
		let mean = window.iter().flatten().sum::<f64>() / WEEKLY_WINDOW as f64;
		for v in &mut result[j..j + WEEKLY_WINDOW] {
		    *v = Some(mean.round());
		}
		j += WEEKLY_WINDOW;
	    },
	    false => j += 1,
	}
    }

    result

}

fn is_weekly_batch(window: &[Option<f64>]) -> bool {
    let (zeros, last) = window.split_at(WEEKLY_ZEROS);
    zeros.iter().all(|v| *v == Some(0.0))
	&& matches!(last, [Some(v)] if *v != 0.0)
}


/// Mean of the `n` largest present values, or of all of them when there
/// are fewer than `n`.
pub fn top_mean(values: &[Option<f64>], n: usize) -> Option<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied()
	.filter(|v| v.is_finite()).collect();
    present.sort_by(|a,b| b.total_cmp(a));
    present.truncate(n);
    match present.is_empty() {
	true => None,
	false => Some(present.iter().sum::<f64>() / present.len() as f64),
    }
}


/// Clamps values above `scalar` times the top-n mean down to the rounded
/// top-n mean. Nothing is clamped unless that mean is positive. Clamping lowers the top-n mean, so passes repeat until no
/// value is above the ceiling any more; the result is a fixed point.
pub fn spikes(values: &[Option<f64>], scalar: f64, top_n: usize) -> Vec<Option<f64>> {
    let mut result = values.to_vec();
    for _ in 0..values.len() + 32 {
	match clamp_spikes(&result, scalar, top_n) {
	    Some(next) => result = next,
	    None => break,
	}
    }
    result
}

fn clamp_spikes(values: &[Option<f64>], scalar: f64, top_n: usize) -> Option<Vec<Option<f64>>> {
    let mean = top_mean(values, top_n).filter(|mean| *mean > 0.0)?;
    let ceiling = scalar * mean;
    let replacement = mean.round();
    let is_spike = |v: f64| v > ceiling && replacement < v;
    match values.iter().flatten().any(|v| is_spike(*v)) {
	false => None,
	true => Some(values.iter().map(
	    |v| v.map(|v| if is_spike(v) { replacement } else { v })
	).collect()),
    }
}


/// Zeroes everything before the first drop below the running maximum of a
/// cumulative series. Values reported before the real rollout show up as a
/// later decrease. Without any decrease the series is kept as is.
pub fn nonzero_prefix(values: &[Option<f64>]) -> Vec<Option<f64>> {
    match first_decrease(values) {
	None => values.to_vec(),
	Some(i) => std::iter::repeat(Some(0.0)).take(i)
	    .chain(values[i..].iter().copied()).collect(),
    }
}

pub fn first_decrease(values: &[Option<f64>]) -> Option<usize> {
    let mut running_max: Option<f64> = None;
    values.iter().position(|v| match v {
	None => false,
	Some(v) => {
	    let drop = running_max.map_or(false, |max| *v < max);
	    running_max = Some(running_max.map_or(*v, |max| max.max(*v)));
	    drop
	}
    })
}


/// Corrections for one feature: batched weekly reports then spikes for
/// daily counts, the non-zero prefix for cumulative percentages.
pub fn repair_series(feature: Feature, series: &TimeSeries, config: &RepairConfig) -> TimeSeries {
    if feature.is_daily_count() {
	let weekly = weekly_reporting(series.values());
	series.with_values(spikes(&weekly, config.spike_scalar, config.top_n))
    } else if feature.is_cumulative_percentage() {
	series.with_values(nonzero_prefix(series.values()))
    } else {
	series.clone()
    }
}


pub fn repair(dataset: &EntityDataset, config: &RepairConfig) -> EntityDataset {
    dataset.map_series(|entity, feature, series| {
	let repaired = repair_series(feature, series, config);
	let changed = repaired.values().iter().zip(series.values())
	    .filter(|(a,b)| a != b).count();
	if changed > 0 {
	    debug!(entity, %feature, changed, days = series.len(), "repaired series");
	}
	repaired
    })
}
