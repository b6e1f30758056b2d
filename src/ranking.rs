//! Cross-country lead/lag ranking.

use serde::Serialize;
use tracing::{debug,warn};

use super::dataset::{EntityDataset,Feature};
use super::error::Result;
use super::lag::{lag_search,LagMode};


/// Best lag of one compared entity against a reference.
#[derive(Serialize,Clone,Debug,PartialEq)]
pub struct Ranked {
    pub entity: String,
    pub lag: i64,
    pub max_corr: f64,
}

/// All compared entities for one reference, ordered by lag.
#[derive(Serialize,Clone,Debug,PartialEq)]
pub struct Relation {
    pub reference: String,
    pub ranking: Vec<Ranked>,
}

/// `from` leads `to` by `lag` days.
#[derive(Serialize,Clone,Debug,PartialEq)]
pub struct LeadLagRelation {
    pub from: String,
    pub to: String,
    pub lag: i64,
    pub correlation: f64,
    pub weight: f64,
}

#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Search {
    pub feature: Feature,
    pub max_lag: usize,
    pub mode: LagMode,
}


/// Runs the lag search of `reference` against every other listed entity
/// and sorts the results by best lag. The sort is stable, so equal lags
/// keep the order of `entities`. Entities missing from the dataset are
/// skipped.
pub fn rank_against(dataset: &EntityDataset, reference: &str,
		    entities: &[String], search: Search) -> Result<Vec<Ranked>> {

    let reference_series = dataset.series(reference, search.feature)?;
    let mut ranked = Vec::new();

    for entity in entities.iter().filter(|e| e.as_str() != reference) {
	let target = match dataset.series(entity, search.feature) {
	    Ok(target) => target,
	    Err(err) => {
		warn!(reference, %err, "skipping entity");
		continue;
	    }
	};
	let lags = lag_search(reference_series, target, search.max_lag, search.mode)?;
	if let Some((lag,max_corr)) = lags.best() {
	    ranked.push(Ranked { entity: entity.clone(), lag, max_corr });
	}
    }

    ranked.sort_by_key(|r| r.lag);
    Ok(ranked)

}


/// Ranking with every listed entity in turn as the reference.
pub fn all_pairs(dataset: &EntityDataset, entities: &[String],
		 search: Search) -> Result<Vec<Relation>> {
    entities.iter().filter(|reference| match dataset.contains(reference) {
	true => true,
	false => { warn!(reference = reference.as_str(), "reference not in dataset"); false }
    }).map(|reference| {
	debug!(reference = reference.as_str(), "ranking");
	Ok(Relation {
	    reference: reference.clone(),
	    ranking: rank_against(dataset, reference, entities, search)?
	})
    }).collect()
}


/// Directed edges for the pairs where the reference leads by a displayable
/// number of days (`0 < lag <= display_threshold`). Weights are
/// `1 - lag / max_lag` with `max_lag` taken over the retained edges, so
/// shorter lags weigh more.
pub fn lead_lag_edges(relations: &[Relation], display_threshold: i64) -> Vec<LeadLagRelation> {

    let retained: Vec<(&str,&Ranked)> = relations.iter().flat_map(
	|relation| relation.ranking.iter()
	    .filter(|r| r.lag > 0 && r.lag <= display_threshold)
	    .map(move |r| (relation.reference.as_str(), r))
    ).collect();

    let max_lag = match retained.iter().map(|(_,r)| r.lag).max() {
	Some(max_lag) => max_lag as f64,
	None => return vec![],
    };

    retained.into_iter().map(|(from,r)| LeadLagRelation {
	from: from.to_string(),
	to: r.entity.clone(),
	lag: r.lag,
	correlation: r.max_corr,
	weight: 1.0 - r.lag as f64 / max_lag,
    }).collect()

}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    use crate::dataset::TimeSeries;
    use crate::error::Error;
    use crate::owid::Record;

    fn signal(n: usize) -> Vec<f64> {
	(0..n).map(|i| {
	    let t = i as f64;
	    50.0 + 20.0 * (t / 6.0).sin() + 9.0 * (t / 2.3).cos() + (t * 0.7) % 5.0
	}).collect()
    }

    fn delayed(base: &[f64], k: usize) -> TimeSeries {
	let mut values = vec![None; k];
	values.extend(base[..base.len() - k].iter().map(|v| Some(*v)));
	TimeSeries::new(NaiveDate::from_ymd_opt(2020, 4, 1).unwrap(), values)
    }

    fn dataset() -> EntityDataset {
	let base = signal(150);
	let mut dataset = EntityDataset::new();
	dataset.insert("A", Feature::NewCases, delayed(&base, 0));
	dataset.insert("C", Feature::NewCases, delayed(&base, 7));
	dataset.insert("B", Feature::NewCases, delayed(&base, 3));
	dataset
    }

    fn names(names: &[&str]) -> Vec<String> {
	names.iter().map(|s| s.to_string()).collect()
    }

    const SEARCH: Search = Search { feature: Feature::NewCases, max_lag: 10, mode: LagMode::TwoSided };

    #[test]
    fn ranking_is_sorted_by_lag() {
	let ranked = rank_against(&dataset(), "A", &names(&["C", "A", "B"]), SEARCH).unwrap();
	assert_eq!(ranked.iter().map(|r| (r.entity.as_str(), r.lag)).collect::<Vec<_>>(),
		   vec![("B", 3), ("C", 7)]);
	assert_relative_eq!(ranked[0].max_corr, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn missing_reference_is_an_error() {
	assert!(rank_against(&dataset(), "Z", &names(&["A", "B"]), SEARCH).is_err());
    }

    #[test]
    fn unknown_and_denylisted_entities_are_skipped() {
	let records = vec![
	    Record { country: "World".to_string(), date: NaiveDate::from_ymd_opt(2020, 4, 1).unwrap(),
		     new_cases: Some(1.0), ..Record::default() },
	];
	let denied = EntityDataset::from_records(&records, &names(&["World"]));
	assert!(denied.is_empty());

	let ranked = rank_against(&dataset(), "A", &names(&["World", "B"]), SEARCH).unwrap();
	assert_eq!(ranked.len(), 1);
	assert_eq!(ranked[0].entity, "B");

	let relations = all_pairs(&dataset(), &names(&["World", "A", "B"]), SEARCH).unwrap();
	assert_eq!(relations.iter().map(|r| r.reference.as_str()).collect::<Vec<_>>(), vec!["A", "B"]);
	assert!(relations.iter().all(|r| r.ranking.iter().all(|x| x.entity != "World")));
    }

    #[test]
    fn non_overlapping_entity_fails_the_ranking() {
	let mut dataset = dataset();
	dataset.insert("Late", Feature::NewCases,
		       TimeSeries::new(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), vec![Some(1.0), Some(2.0)]));
	assert!(matches!(rank_against(&dataset, "A", &names(&["B", "Late"]), SEARCH),
			 Err(Error::Misaligned { .. })));
	assert!(matches!(all_pairs(&dataset, &names(&["A", "B", "Late"]), SEARCH),
			 Err(Error::Misaligned { .. })));
    }

    #[test]
    fn all_pairs_are_antisymmetric() {
	let relations = all_pairs(&dataset(), &names(&["A", "B", "C"]), SEARCH).unwrap();
	assert_eq!(relations.len(), 3);
	let lag = |from: &str, to: &str| relations.iter()
	    .find(|r| r.reference == from).unwrap()
	    .ranking.iter().find(|r| r.entity == to).unwrap().lag;
	assert_eq!(lag("A", "C"), 7);
	assert_eq!(lag("C", "A"), -7);
	assert_eq!(lag("B", "C"), 4);
	assert_eq!(lag("C", "B"), -4);
    }

    #[test]
    fn edges_keep_positive_displayable_lags() {
	let relations = all_pairs(&dataset(), &names(&["A", "B", "C"]), SEARCH).unwrap();
	let edges = lead_lag_edges(&relations, 5);
	assert_eq!(edges.iter().map(|e| (e.from.as_str(), e.to.as_str(), e.lag)).collect::<Vec<_>>(),
		   vec![("A", "B", 3), ("B", "C", 4)]);
	assert_relative_eq!(edges[0].weight, 1.0 - 3.0 / 4.0);
	assert_relative_eq!(edges[1].weight, 0.0);
    }

    #[test]
    fn edge_weights_are_normalised_over_the_batch() {
	let ranked = |entity: &str, lag| Ranked { entity: entity.to_string(), lag, max_corr: 0.9 };
	let relations = vec![
	    Relation { reference: "A".to_string(), ranking: vec![ranked("B", 0), ranked("C", 2)] },
	    Relation { reference: "D".to_string(), ranking: vec![ranked("E", -3), ranked("F", 8), ranked("G", 20)] },
	];
	let edges = lead_lag_edges(&relations, 14);
	assert_eq!(edges.len(), 2);
	assert_relative_eq!(edges[0].weight, 0.75);
	assert_relative_eq!(edges[1].weight, 0.0);
	assert!(lead_lag_edges(&relations[..1], 1).is_empty());
    }
}
