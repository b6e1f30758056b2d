use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::naive::NaiveDate;
use serde::{Serialize,Deserialize};
use tracing::info;

use super::config::DataConfig;
use super::error::{Result,Error};


/// One long-format row of the Our World in Data COVID-19 export. Columns
/// not listed here are ignored; empty cells and absent feature columns are
/// missing. `country` and `date` are required.
#[derive(Serialize,Deserialize,Clone,Debug,Default,PartialEq)]
pub struct Record {
    pub country: String,
    pub date: NaiveDate,
    pub new_cases: Option<f64>,
    pub new_deaths: Option<f64>,
    pub daily_people_vaccinated_smoothed_per_hundred: Option<f64>,
    pub people_fully_vaccinated_per_hundred: Option<f64>,
    pub total_boosters_per_hundred: Option<f64>,
    pub total_deaths_per_million: Option<f64>,
}


pub fn records(config: &DataConfig) -> Result<Vec<Record>> {
    let bytes = match &config.path {
	Some(path) => {
	    info!(path = %path.display(), "Reading local data");
	    fs::read(path)?
	},
	None => cached(config)?,
    };
    parse(&bytes)
}


pub fn parse(bytes: &[u8]) -> Result<Vec<Record>> {
    let (text, _) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
    let records = csv::Reader::from_reader(text.as_bytes()).into_deserialize()
	.collect::<std::result::Result<Vec<Record>,_>>()?;
    match records.is_empty() {
	true => Err(Error::MissingData),
	false => Ok(records),
    }
}


fn cached(config: &DataConfig) -> Result<Vec<u8>> {

    let cache_path = config.cache_dir.join("owid");
    let cache_file = cache_path.join("compact.csv");

    if is_fresh(&cache_file, Duration::from_secs(config.cache_max_age_secs))? {
	info!(path = %cache_file.display(), "Using cached data");
	return Ok(fs::read(&cache_file)?);
    }

    let data = download(&config.url)?;
    fs::create_dir_all(&cache_path)?;
    fs::write(&cache_file, &data)?;
    Ok(data)

}


fn is_fresh(cache_file: &Path, max_age: Duration) -> Result<bool> {
    Ok(cache_file.exists() && fs::metadata(cache_file)?.modified()?.elapsed()? < max_age)
}


fn download(url: &str) -> Result<Vec<u8>> {
    info!(url, "Downloading");
    let res = reqwest::blocking::get(url)?;
    match res.status().is_success() {
	true => Ok(res.bytes()?.to_vec()),
	false => Err(Error::HttpError(res.status())),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SAMPLE: &str = "\u{feff}country,date,new_cases,new_deaths,continent,people_fully_vaccinated_per_hundred\n\
			  Belgium,2021-03-01,2000,30,Europe,4.5\n\
			  Belgium,2021-03-02,,31,Europe,\n\
			  World,2021-03-01,400000,9000,,3.1\n";

    #[test]
    fn parses_sparse_rows_and_ignores_extra_columns() {
	let records = parse(SAMPLE.as_bytes()).unwrap();
	assert_eq!(records.len(), 3);
	assert_eq!(records[0].country, "Belgium");
	assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2021, 3, 1).unwrap());
	assert_eq!(records[0].new_cases, Some(2000.0));
	assert_eq!(records[0].people_fully_vaccinated_per_hundred, Some(4.5));
	assert_eq!(records[1].new_cases, None);
	assert_eq!(records[1].people_fully_vaccinated_per_hundred, None);
	assert_eq!(records[1].total_boosters_per_hundred, None);
    }

    #[test]
    fn absent_feature_columns_are_missing() {
	let records = parse(b"country,date\nBelgium,2021-03-01\n").unwrap();
	assert_eq!(records[0].new_cases, None);
	assert_eq!(records[0].total_deaths_per_million, None);
    }

    #[test]
    fn key_columns_are_required() {
	let renamed = "location,date,new_cases\nBelgium,2021-03-01,10\nFrance,2021-03-01,500\n";
	assert!(matches!(parse(renamed.as_bytes()), Err(Error::CSV(_))));
	let undated = "country,new_cases\nBelgium,10\n";
	assert!(matches!(parse(undated.as_bytes()), Err(Error::CSV(_))));
    }

    #[test]
    fn empty_input_is_missing_data() {
	assert!(matches!(parse(b"country,date,new_cases\n"), Err(Error::MissingData)));
    }

    #[test]
    fn reads_local_file_without_network() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("compact.csv");
	fs::write(&path, SAMPLE).unwrap();
	let config = DataConfig {
	    path: Some(path),
	    cache_dir: PathBuf::from(dir.path()),
	    ..DataConfig::default()
	};
	assert_eq!(records(&config).unwrap().len(), 3);
    }

    #[test]
    fn fresh_cache_is_reused() {
	let dir = tempfile::tempdir().unwrap();
	let cache_path = dir.path().join("owid");
	fs::create_dir_all(&cache_path).unwrap();
	fs::write(cache_path.join("compact.csv"), SAMPLE).unwrap();
	let config = DataConfig {
	    url: "http://127.0.0.1:9/unreachable.csv".to_string(),
	    path: None,
	    cache_dir: dir.path().to_path_buf(),
	    cache_max_age_secs: 3600,
	};
	assert_eq!(records(&config).unwrap().len(), 3);
    }

    #[test]
    fn missing_cache_file_is_stale() {
	let dir = tempfile::tempdir().unwrap();
	assert!(!is_fresh(&dir.path().join("nope.csv"), Duration::from_secs(60)).unwrap());
    }
}
