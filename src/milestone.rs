use chrono::naive::NaiveDate;
use serde::Serialize;
use tracing::warn;

use super::dataset::{EntityDataset,Feature};


/// When a country got past a vaccination level, and how many deaths per
/// million it had in total.
#[derive(Serialize,Clone,Debug,PartialEq)]
pub struct Milestone {
    pub country: String,
    pub reached: Option<NaiveDate>,
    pub total_deaths_per_million: Option<f64>,
}


pub fn milestones(dataset: &EntityDataset, entities: &[String], threshold: f64) -> Vec<Milestone> {
    entities.iter().filter_map(|country| {
	if !dataset.contains(country) {
	    warn!(country = country.as_str(), "no data for milestone");
	    return None;
	}
	Some(Milestone {
	    country: country.clone(),
	    reached: dataset.series(country, Feature::PeopleFullyVaccinatedPerHundred).ok()
		.and_then(|s| s.iter().find(|(_,v)| v.map_or(false, |v| v > threshold)))
		.map(|(date,_)| date),
	    total_deaths_per_million: dataset.series(country, Feature::TotalDeathsPerMillion).ok()
		.and_then(|s| s.max()),
	})
    }).collect()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TimeSeries;

    fn day(d: u32) -> NaiveDate {
	NaiveDate::from_ymd_opt(2021, 6, d).unwrap()
    }

    #[test]
    fn first_date_above_threshold() {
	let mut dataset = EntityDataset::new();
	dataset.insert("Portugal", Feature::PeopleFullyVaccinatedPerHundred,
		       TimeSeries::new(day(1), vec![Some(70.0), None, Some(80.0), Some(81.5), Some(83.0)]));
	dataset.insert("Portugal", Feature::TotalDeathsPerMillion,
		       TimeSeries::new(day(1), vec![Some(1700.0), Some(1701.0), None]));
	dataset.insert("Bulgaria", Feature::PeopleFullyVaccinatedPerHundred,
		       TimeSeries::new(day(1), vec![Some(20.0), Some(21.0)]));

	let result = milestones(&dataset, &["Portugal".to_string(), "Bulgaria".to_string(),
					    "Atlantis".to_string()], 80.0);
	assert_eq!(result, vec![
	    Milestone { country: "Portugal".to_string(), reached: Some(day(4)),
			total_deaths_per_million: Some(1701.0) },
	    Milestone { country: "Bulgaria".to_string(), reached: None,
			total_deaths_per_million: None },
	]);
    }
}
