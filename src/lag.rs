//! Lagged Pearson correlation between two daily series.

use std::ops::RangeInclusive;

use serde::{Serialize,Deserialize};
use tracing::warn;

use super::dataset::{EntityDataset,Feature,TimeSeries};
use super::error::{Result,Error};


#[derive(Serialize,Deserialize,Clone,Copy,Debug,PartialEq,Eq)]
#[serde(rename_all = "snake_case")]
pub enum LagMode {
    /// `0..=max_lag`
    OneSided,
    /// `-max_lag..=max_lag`
    TwoSided,
}

impl LagMode {
    pub fn lags(&self, max_lag: usize) -> RangeInclusive<i64> {
	let max_lag = max_lag as i64;
	match self {
	    Self::OneSided => 0..=max_lag,
	    Self::TwoSided => -max_lag..=max_lag,
	}
    }
}


/// Correlation per lag, in increasing lag order.
#[derive(Serialize,Clone,Debug,Default,PartialEq)]
pub struct LaggedCorrelation {
    pub correlations: Vec<(i64,f64)>,
}

impl LaggedCorrelation {

    /// Lag with the highest correlation; the smallest such lag on ties.
    pub fn best(&self) -> Option<(i64,f64)> {
	self.correlations.iter().copied().fold(None, |best,(lag,corr)| match best {
	    Some((_,max)) if max >= corr => best,
	    _ => Some((lag, corr)),
	})
    }

    pub fn get(&self, lag: i64) -> Option<f64> {
	self.correlations.iter().find(|(l,_)| *l == lag).map(|(_,c)| *c)
    }

    /// Every `n`th point, starting from the first lag.
    pub fn every_nth(&self, n: usize) -> Vec<(i64,f64)> {
	self.correlations.iter().step_by(n.max(1)).copied().collect()
    }

}


/// Pearson correlation, or `None` with fewer than two pairs or without
/// variance on either side.
pub fn pearson<I>(pairs: I) -> Option<f64>
where I: IntoIterator<Item = (f64,f64)> {

    let pairs: Vec<(f64,f64)> = pairs.into_iter()
	.filter(|(x,y)| x.is_finite() && y.is_finite()).collect();
    if pairs.len() < 2 {
	return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x,_)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_,y)| y).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    let (mut scale_x, mut scale_y) = (0.0, 0.0);
    for (x,y) in &pairs {
	let (dx, dy) = (x - mean_x, y - mean_y);
	sxy += dx * dy;
	sxx += dx * dx;
	syy += dy * dy;
	scale_x += x * x;
	scale_y += y * y;
    }

    // rounding in the mean leaves a residue on constant input
    if sxx <= scale_x * 1e-12 || syy <= scale_y * 1e-12 {
	return None;
    }

    let r = sxy / (sxx * syy).sqrt();
    match r.is_finite() {
	true => Some(r.max(-1.0).min(1.0)),
	false => None,
    }

}


/// Correlation of `reference` shifted forward by `lag` days against
/// `target`, over the dates where both are present.
pub fn correlation_at(reference: &TimeSeries, target: &TimeSeries, lag: i64) -> Option<f64> {
    let offset = (target.start() - reference.start()).num_days();
    let target_values = target.values();
    pearson(reference.values().iter().enumerate().filter_map(|(i,x)| {
	let j = i as i64 + lag - offset;
	match j >= 0 && (j as usize) < target_values.len() {
	    true => Some(((*x)?, target_values[j as usize]?)),
	    false => None,
	}
    }))
}


/// Correlation for every lag of the window. Undefined correlations (no
/// overlap, no variance) are recorded as 0, and small overlaps near the
/// window edges are taken at face value.
pub fn lag_search(reference: &TimeSeries, target: &TimeSeries,
		  max_lag: usize, mode: LagMode) -> Result<LaggedCorrelation> {

    if !reference.overlaps(target) {
	return Err(Error::Misaligned {
	    reference: reference.describe_range(),
	    target: target.describe_range(),
	});
    }

    Ok(LaggedCorrelation {
	correlations: mode.lags(max_lag).map(
	    |lag| (lag, correlation_at(reference, target, lag).unwrap_or(0.0))
	).collect()
    })

}


/// How many days new cases lead new deaths within one entity.
pub fn cases_deaths(dataset: &EntityDataset, entity: &str, max_lag: usize) -> Result<LaggedCorrelation> {
    lag_search(dataset.series(entity, Feature::NewCases)?,
	       dataset.series(entity, Feature::NewDeaths)?,
	       max_lag, LagMode::OneSided)
}


/// Zero-lag correlation of one feature for every pair of entities.
#[derive(Serialize,Clone,Debug,PartialEq)]
pub struct CorrelationMatrix {
    pub entities: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

pub fn correlation_matrix(dataset: &EntityDataset, feature: Feature,
			  entities: &[String]) -> CorrelationMatrix {

    let series: Vec<(&String,&TimeSeries)> = entities.iter().filter_map(
	|entity| match dataset.series(entity, feature) {
	    Ok(s) => Some((entity, s)),
	    Err(err) => { warn!(%err, "skipping in correlation matrix"); None }
	}
    ).collect();

    CorrelationMatrix {
	entities: series.iter().map(|(e,_)| e.to_string()).collect(),
	values: series.iter().map(
	    |(_,a)| series.iter().map(
		|(_,b)| correlation_at(a, b, 0).unwrap_or(0.0)
	    ).collect()
	).collect()
    }

}
