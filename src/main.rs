mod config;
mod dataset;
mod error;
mod graph;
mod lag;
mod milestone;
mod owid;
mod ranking;
mod repair;
mod table;

use std::env;
use std::path::PathBuf;

use tracing::{error,info,warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use dataset::{EntityDataset,Feature};
use error::{Result,Error};
use ranking::Search;


fn main() -> Result<()> {

    tracing_subscriber::fmt()
	.with_target(false)
	.with_env_filter(EnvFilter::try_from_default_env()
			 .unwrap_or_else(|_| EnvFilter::new("info")))
	.init();

    let config_path = env::args().nth(1).map(PathBuf::from)
	.unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_FILE));
    let config = Config::load(&config_path)?;

    let records = owid::records(&config.data)?;
    let raw = EntityDataset::from_records(&records, &config.entities.denylist);
    info!(records = records.len(), entities = raw.len(), "Loaded dataset");

    let corrected = repair::repair(&raw, &config.repair);
    let filled = corrected.forward_filled();
    let countries = config.countries(filled.entities());

    if let Err(err) = series_outputs(&config, &corrected, &countries) {
	error!(%err, "corrected series");
    }

    if let Err(err) = country_outputs(&config, &corrected, &countries) {
	error!(%err, "country graphs");
    }

    if let Err(err) = map_outputs(&config, &corrected) {
	error!(%err, "world map");
    }

    if let Err(err) = cases_deaths_outputs(&config, &filled, &countries) {
	error!(%err, "cases & deaths lags");
    }

    if let Err(err) = cross_country_outputs(&config, &filled, &countries) {
	error!(%err, "cross-country lags");
    }

    if let Err(err) = vaccination_outputs(&config, &corrected, &countries) {
	error!(%err, "vaccination milestones");
    }

    Ok(())

}


fn series_outputs(config: &Config, corrected: &EntityDataset, countries: &[String]) -> Result<()> {

    let all: Vec<String> = corrected.entities().map(|s| s.to_string()).collect();

    for feature in Feature::ALL.iter() {
	table::write_wide(&config.output.table_dir.join("corrected"),
			  &corrected.pivot(*feature, &all))?;
	graph::series_graph(&config.output.graph_dir, "selection", *feature,
			    &countries.iter().filter_map(
				|country| corrected.series(country, *feature).ok()
				    .map(|series| (country.clone(), series))
			    ).collect())?;
    }

    Ok(())

}


const COUNTRY_VIEWS: [(&str, &[Feature]); 2] = [
    ("cases-deaths", &[Feature::NewCases, Feature::NewDeaths]),
    ("vaccination", &[Feature::DailyPeopleVaccinatedSmoothedPerHundred,
		      Feature::PeopleFullyVaccinatedPerHundred,
		      Feature::TotalBoostersPerHundred]),
];

fn country_outputs(config: &Config, corrected: &EntityDataset, countries: &[String]) -> Result<()> {
    for country in countries {
	for (view,features) in COUNTRY_VIEWS.iter() {
	    let series: Vec<_> = features.iter().filter_map(
		|feature| corrected.series(country, *feature).ok().map(|s| (*feature, s))
	    ).collect();
	    match series.is_empty() {
		true => warn!(country = country.as_str(), view, "no data"),
		false => graph::country_graph(&config.output.graph_dir, country, view, &series)?,
	    }
	}
    }
    Ok(())
}


fn map_outputs(config: &Config, corrected: &EntityDataset) -> Result<()> {
    graph::world_map_graph(&config.output.graph_dir, &config.map,
			   &corrected.entities().filter_map(
			       |entity| corrected.series(entity, Feature::NewCases).ok()
				   .map(|series| (entity.to_string(), series))
			   ).collect())
}


fn cases_deaths_outputs(config: &Config, filled: &EntityDataset, countries: &[String]) -> Result<()> {

    let max_lag = config.lag.cases_deaths_max_lag;
    let rows: Vec<_> = countries.iter().filter_map(
	|country| match lag::cases_deaths(filled, country, max_lag) {
	    Ok(lags) => Some((country.clone(), lags)),
	    Err(err) => { warn!(country = country.as_str(), %err, "skipping"); None }
	}
    ).collect();

    if rows.is_empty() {
	return Err(Error::MissingData);
    }

    for (country,lags) in &rows {
	if let Some((lag,corr)) = lags.best() {
	    info!(country = country.as_str(), lag, corr, "Cases lead deaths");
	}
	graph::lag_graph(&config.output.graph_dir, country, lags)?;
    }

    graph::heatmap_graph(&config.output.graph_dir, "cases-deaths-heatmap",
			 "Heatmap of cases & deaths correlation over lag days", &rows)?;
    table::write_summaries(&config.output.table_dir, "cases-deaths", &rows)?;

    Ok(())

}


fn cross_country_outputs(config: &Config, filled: &EntityDataset, countries: &[String]) -> Result<()> {

    let search = Search {
	feature: config.lag.cross_feature,
	max_lag: config.lag.cross_max_lag,
	mode: config.lag.cross_mode,
    };

    graph::matrix_graph(&config.output.graph_dir, search.feature,
			&lag::correlation_matrix(filled, search.feature, countries))?;

    if let Some(reference) = &config.entities.reference {
	let ranked = ranking::rank_against(filled, reference, countries, search)?;
	for r in &ranked {
	    info!(reference = reference.as_str(), entity = r.entity.as_str(),
		  lag = r.lag, max_corr = r.max_corr, "Ranked");
	}
	table::write_ranking(&config.output.table_dir, reference, &ranked)?;
    }

    let relations = ranking::all_pairs(filled, countries, search)?;
    let edges = ranking::lead_lag_edges(&relations, config.lag.display_threshold);
    info!(edges = edges.len(), "Lead/lag network");

    table::write_edges(&config.output.table_dir, &edges)?;
    graph::network_graph(&config.output.graph_dir, search.feature, &edges)?;

    Ok(())

}


fn vaccination_outputs(config: &Config, corrected: &EntityDataset, countries: &[String]) -> Result<()> {
    let threshold = config.milestone.vaccination_threshold;
    let milestones = milestone::milestones(corrected, countries, threshold);
    table::write_milestones(&config.output.table_dir, &milestones)?;
    graph::milestone_graph(&config.output.graph_dir, threshold, &milestones)
}
