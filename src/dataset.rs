use std::fmt;
use std::collections::{BTreeMap,HashSet};

use chrono::naive::NaiveDate;
use serde::{Serialize,Deserialize};
use tracing::debug;

use super::error::{Result,Error};
use super::owid::Record;


#[derive(Serialize,Deserialize,Clone,Copy,Debug,PartialEq,Eq,PartialOrd,Ord,Hash)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    NewCases,
    NewDeaths,
    DailyPeopleVaccinatedSmoothedPerHundred,
    PeopleFullyVaccinatedPerHundred,
    TotalBoostersPerHundred,
    TotalDeathsPerMillion,
}

impl Feature {

    pub const ALL: [Feature; 6] = [
	Feature::NewCases,
	Feature::NewDeaths,
	Feature::DailyPeopleVaccinatedSmoothedPerHundred,
	Feature::PeopleFullyVaccinatedPerHundred,
	Feature::TotalBoostersPerHundred,
	Feature::TotalDeathsPerMillion,
    ];

    pub fn name(&self) -> &'static str {
	match self {
	    Self::NewCases => "new_cases",
	    Self::NewDeaths => "new_deaths",
	    Self::DailyPeopleVaccinatedSmoothedPerHundred => "daily_people_vaccinated_smoothed_per_hundred",
	    Self::PeopleFullyVaccinatedPerHundred => "people_fully_vaccinated_per_hundred",
	    Self::TotalBoostersPerHundred => "total_boosters_per_hundred",
	    Self::TotalDeathsPerMillion => "total_deaths_per_million",
	}
    }

    pub fn title(&self) -> &'static str {
	match self {
	    Self::NewCases => "daily new COVID-19 cases",
	    Self::NewDeaths => "daily COVID-19 deaths",
	    Self::DailyPeopleVaccinatedSmoothedPerHundred => "daily vaccinations per 100",
	    Self::PeopleFullyVaccinatedPerHundred => "people fully vaccinated (%)",
	    Self::TotalBoostersPerHundred => "boosters (%)",
	    Self::TotalDeathsPerMillion => "total COVID-19 deaths per million",
	}
    }

    /// Cumulative percentages must never decrease.
    pub fn is_cumulative_percentage(&self) -> bool {
	matches!(self, Self::PeopleFullyVaccinatedPerHundred | Self::TotalBoostersPerHundred)
    }

    /// Daily counts subject to batched reporting and spikes.
    pub fn is_daily_count(&self) -> bool {
	matches!(self, Self::NewCases | Self::NewDeaths)
    }

    pub fn value(&self, record: &Record) -> Option<f64> {
	match self {
	    Self::NewCases => record.new_cases,
	    Self::NewDeaths => record.new_deaths,
	    Self::DailyPeopleVaccinatedSmoothedPerHundred => record.daily_people_vaccinated_smoothed_per_hundred,
	    Self::PeopleFullyVaccinatedPerHundred => record.people_fully_vaccinated_per_hundred,
	    Self::TotalBoostersPerHundred => record.total_boosters_per_hundred,
	    Self::TotalDeathsPerMillion => record.total_deaths_per_million,
	}.filter(|v| v.is_finite())
    }

}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
	write!(f, "{}", self.name())
    }
}


/// Daily series for one (entity, feature). Stored densely from `start`,
/// so dates are contiguous and strictly increasing by construction.
#[derive(Clone,Debug,PartialEq)]
pub struct TimeSeries {
    start: NaiveDate,
    values: Vec<Option<f64>>,
}

impl TimeSeries {

    pub fn new(start: NaiveDate, values: Vec<Option<f64>>) -> Self {
	Self { start, values }
    }

    /// Builds a contiguous series spanning the first to the last given
    /// date. Dates without a point are missing; a repeated date keeps the
    /// last value.
    pub fn from_points<I>(points: I) -> Option<Self>
    where I: IntoIterator<Item = (NaiveDate,Option<f64>)> {
	let points: BTreeMap<_,_> = points.into_iter().collect();
	let start = *points.keys().next()?;
	let end = *points.keys().next_back()?;
	let values = NaiveDateRange(start, Some(end))
	    .map(|date| points.get(&date).copied().flatten())
	    .collect();
	Some(Self { start, values })
    }

    pub fn start(&self) -> NaiveDate {
	self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
	self.dates().last()
    }

    pub fn len(&self) -> usize {
	self.values.len()
    }

    pub fn is_empty(&self) -> bool {
	self.values.is_empty()
    }

    pub fn values(&self) -> &[Option<f64>] {
	&self.values
    }

    pub fn dates(&self) -> std::iter::Take<NaiveDateRange> {
	NaiveDateRange(self.start, None).take(self.values.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate,Option<f64>)> + '_ {
	self.dates().zip(self.values.iter().copied())
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
	let offset = (date - self.start).num_days();
	match offset < 0 {
	    true => None,
	    false => self.values.get(offset as usize).copied().flatten(),
	}
    }

    /// Same dates, new values.
    pub fn with_values(&self, values: Vec<Option<f64>>) -> Self {
	debug_assert_eq!(values.len(), self.values.len());
	Self { start: self.start, values }
    }

    /// Missing values take the most recent prior value. Leading gaps stay
    /// missing.
    pub fn forward_filled(&self) -> Self {
	let mut last = None;
	self.with_values(self.values.iter().map(|v| {
	    if v.is_some() {
		last = *v;
	    }
	    last
	}).collect())
    }

    pub fn overlaps(&self, other: &TimeSeries) -> bool {
	match (self.end(), other.end()) {
	    (Some(end),Some(other_end)) => self.start <= other_end && other.start <= end,
	    _ => false,
	}
    }

    pub fn max(&self) -> Option<f64> {
	self.values.iter().flatten().copied().fold(None, |a,b| match a {
	    Some(a) if a >= b => Some(a),
	    _ => Some(b),
	})
    }

    pub fn describe_range(&self) -> String {
	match self.end() {
	    Some(end) => format!("{} to {}", self.start, end),
	    None => "empty".to_string(),
	}
    }

}


pub type FeatureSet = BTreeMap<Feature,TimeSeries>;

/// Per-entity feature series, keyed and iterated in entity name order.
#[derive(Clone,Debug,Default,PartialEq)]
pub struct EntityDataset {
    entities: BTreeMap<String,FeatureSet>,
}

/// Wide table of one feature: one row per date, one column per entity.
#[derive(Clone,Debug,PartialEq)]
pub struct Wide {
    pub feature: Feature,
    pub columns: Vec<String>,
    pub rows: Vec<(NaiveDate,Vec<Option<f64>>)>,
}

impl EntityDataset {

    pub fn new() -> Self {
	Self::default()
    }

    /// Pivots long-format rows into per-entity series, leaving out every
    /// name on the denylist.
    pub fn from_records(records: &[Record], denylist: &[String]) -> Self {

	let denied: HashSet<&str> = denylist.iter().map(|s| s.as_str()).collect();
	let mut points: BTreeMap<&str,BTreeMap<Feature,Vec<(NaiveDate,Option<f64>)>>> = BTreeMap::new();
	let mut skipped = 0;

	for record in records {
	    if denied.contains(record.country.as_str()) {
		skipped += 1;
		continue;
	    }
	    let features = points.entry(record.country.as_str()).or_insert_with(BTreeMap::new);
	    for feature in Feature::ALL.iter() {
		features.entry(*feature).or_insert_with(Vec::new)
		    .push((record.date, feature.value(record)));
	    }
	}

	debug!(skipped, entities = points.len(), "built dataset from records");

	Self {
	    entities: points.into_iter().map(
		|(entity,features)| (entity.to_string(), features.into_iter().filter_map(
		    |(feature,points)| TimeSeries::from_points(points).map(|s| (feature, s))
		).collect())
	    ).collect()
	}

    }

    pub fn insert(&mut self, entity: &str, feature: Feature, series: TimeSeries) {
	self.entities.entry(entity.to_string()).or_insert_with(BTreeMap::new)
	    .insert(feature, series);
    }

    pub fn len(&self) -> usize {
	self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
	self.entities.is_empty()
    }

    pub fn contains(&self, entity: &str) -> bool {
	self.entities.contains_key(entity)
    }

    pub fn entities(&self) -> impl Iterator<Item = &str> {
	self.entities.keys().map(|k| k.as_str())
    }

    pub fn series(&self, entity: &str, feature: Feature) -> Result<&TimeSeries> {
	self.entities.get(entity).ok_or_else(|| Error::MissingEntity(entity.to_string()))?
	    .get(&feature).ok_or_else(|| Error::MissingFeature {
		entity: entity.to_string(), feature
	    })
    }

    /// New dataset with every series replaced by `f(entity, feature, series)`.
    pub fn map_series<F>(&self, f: F) -> Self
    where F: Fn(&str,Feature,&TimeSeries) -> TimeSeries {
	Self {
	    entities: self.entities.iter().map(
		|(entity,features)| (entity.clone(), features.iter().map(
		    |(feature,series)| (*feature, f(entity.as_str(), *feature, series))
		).collect())
	    ).collect()
	}
    }

    pub fn forward_filled(&self) -> Self {
	self.map_series(|_,_,series| series.forward_filled())
    }

    /// Pivots one feature into a table on the union of the entities' date
    /// ranges. Entities without the feature are left out.
    pub fn pivot(&self, feature: Feature, entities: &[String]) -> Wide {

	let columns: Vec<(&String,&TimeSeries)> = entities.iter().filter_map(
	    |entity| self.series(entity, feature).ok().map(|s| (entity, s))
	).filter(|(_,s)| !s.is_empty()).collect();

	let start = columns.iter().map(|(_,s)| s.start()).min();
	let end = columns.iter().filter_map(|(_,s)| s.end()).max();

	let rows = match (start, end) {
	    (Some(start),Some(end)) => NaiveDateRange(start, Some(end)).map(
		|date| (date, columns.iter().map(|(_,s)| s.get(date)).collect())
	    ).collect(),
	    _ => vec![],
	};

	Wide {
	    feature,
	    columns: columns.iter().map(|(entity,_)| entity.to_string()).collect(),
	    rows
	}

    }

}


#[derive(Clone,Debug)]
pub struct NaiveDateRange(pub NaiveDate,pub Option<NaiveDate>);

impl Iterator for NaiveDateRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<NaiveDate> {
	match self.1.map_or(true, |end| self.0 <= end) {
	    false => None,
	    true => {
		let current = self.0;
		match current.succ_opt() {
		    Some(next) => self.0 = next,
		    None => self.1 = current.pred_opt(),
		}
		Some(current)
	    }
	}
    }
}
