//! Analysis configuration.
//!
//! Layered with `figment`: built-in defaults, then a TOML file, then
//! `COVID19_LAG_` environment variables (`__` separates sections, e.g.
//! `COVID19_LAG_LAG__CROSS_MAX_LAG=21`).

use std::path::{Path,PathBuf};

use chrono::naive::NaiveDate;
use figment::Figment;
use figment::providers::{Env,Format,Serialized,Toml};
use serde::{Serialize,Deserialize};

use super::dataset::Feature;
use super::error::Result;
use super::lag::LagMode;


pub const DEFAULT_CONFIG_FILE: &str = "covid19-lag.toml";

#[derive(Serialize,Deserialize,Clone,Debug,Default,PartialEq)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub output: OutputConfig,
    pub entities: EntitiesConfig,
    pub repair: RepairConfig,
    pub lag: LagConfig,
    pub milestone: MilestoneConfig,
    pub map: MapConfig,
}

#[derive(Serialize,Deserialize,Clone,Debug,PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub url: String,
    /// Local CSV export; takes precedence over `url`.
    pub path: Option<PathBuf>,
    pub cache_dir: PathBuf,
    pub cache_max_age_secs: u64,
}

#[derive(Serialize,Deserialize,Clone,Debug,PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub graph_dir: PathBuf,
    pub table_dir: PathBuf,
}

#[derive(Serialize,Deserialize,Clone,Debug,PartialEq)]
#[serde(default)]
pub struct EntitiesConfig {
    /// Aggregates and territories that are not countries.
    pub denylist: Vec<String>,
    /// Countries analysed in the correlation stages. Empty means all.
    pub countries: Vec<String>,
    /// Country the cross-country ranking is computed against.
    pub reference: Option<String>,
}

#[derive(Serialize,Deserialize,Clone,Debug,PartialEq)]
#[serde(default)]
pub struct RepairConfig {
    pub spike_scalar: f64,
    pub top_n: usize,
}

#[derive(Serialize,Deserialize,Clone,Debug,PartialEq)]
#[serde(default)]
pub struct LagConfig {
    pub cases_deaths_max_lag: usize,
    pub cross_max_lag: usize,
    pub cross_mode: LagMode,
    pub cross_feature: Feature,
    /// Largest lag drawn as an edge in the lead/lag network.
    pub display_threshold: i64,
}

#[derive(Serialize,Deserialize,Clone,Debug,PartialEq)]
#[serde(default)]
pub struct MilestoneConfig {
    pub vaccination_threshold: f64,
}

#[derive(Serialize,Deserialize,Clone,Debug,PartialEq)]
#[serde(default)]
pub struct MapConfig {
    /// World TopoJSON with a `countries` object named by `properties.name`.
    pub topology_url: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Circles above this many cases get a country label.
    pub label_threshold: f64,
}


impl Default for DataConfig {
    fn default() -> Self {
	Self {
	    url: "https://catalog.ourworldindata.org/garden/covid/latest/compact/compact.csv".to_string(),
	    path: None,
	    cache_dir: PathBuf::from("cache"),
	    cache_max_age_secs: 1800,
	}
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
	Self {
	    graph_dir: PathBuf::from("graphs"),
	    table_dir: PathBuf::from("tables"),
	}
    }
}

impl Default for EntitiesConfig {
    fn default() -> Self {
	Self {
	    denylist: [
		"World", "World excl. China", "World excl. China and South Korea",
		"World excl. China, South Korea, Japan and Singapore",
		"Africa", "Asia", "Europe", "North America", "South America", "Oceania",
		"European Union (27)", "International",
		"High-income countries", "Upper-middle-income countries",
		"Lower-middle-income countries", "Low-income countries",
		"Asia excl. China", "Summer Olympics 2020", "Winter Olympics 2022",
		"England", "Scotland", "Wales", "Northern Ireland",
		"Northern Cyprus", "Kosovo", "Hong Kong", "Macao",
		"Guernsey", "Jersey", "Isle of Man", "Faroe Islands", "Greenland",
		"Gibraltar", "Bermuda", "Cayman Islands", "Falkland Islands",
		"Puerto Rico", "Guam", "United States Virgin Islands",
		"British Virgin Islands", "American Samoa", "Northern Mariana Islands",
		"French Polynesia", "New Caledonia", "Wallis and Futuna",
		"Saint Pierre and Miquelon", "Aruba", "Curacao", "Sint Maarten (Dutch part)",
		"Bonaire Sint Eustatius and Saba", "Anguilla", "Montserrat",
		"Turks and Caicos Islands", "Saint Helena", "Pitcairn", "Tokelau",
		"Niue", "Cook Islands",
	    ].iter().map(|s| s.to_string()).collect(),
	    countries: [
		"Austria", "Belgium", "Denmark", "Finland", "France", "Germany",
		"Ireland", "Italy", "Netherlands", "Norway", "Portugal", "Spain",
		"Sweden", "Switzerland", "United Kingdom",
	    ].iter().map(|s| s.to_string()).collect(),
	    reference: Some("Italy".to_string()),
	}
    }
}

impl Default for RepairConfig {
    fn default() -> Self {
	Self {
	    spike_scalar: 5.0,
	    top_n: 10,
	}
    }
}

impl Default for LagConfig {
    fn default() -> Self {
	Self {
	    cases_deaths_max_lag: 30,
	    cross_max_lag: 28,
	    cross_mode: LagMode::TwoSided,
	    cross_feature: Feature::NewCases,
	    display_threshold: 14,
	}
    }
}

impl Default for MilestoneConfig {
    fn default() -> Self {
	Self {
	    vaccination_threshold: 80.0,
	}
    }
}


impl Default for MapConfig {
    fn default() -> Self {
	Self {
	    topology_url: "https://cdn.jsdelivr.net/npm/world-atlas@2/countries-110m.json".to_string(),
	    start: None,
	    end: None,
	    label_threshold: 10000.0,
	}
    }
}


impl Config {

    /// Loads the layered configuration. A missing file is not an error:
    /// the defaults and the environment still apply.
    pub fn load(path: &Path) -> Result<Self> {
	Ok(Figment::from(Serialized::defaults(Config::default()))
	   .merge(Toml::file(path))
	   .merge(Env::prefixed("COVID19_LAG_").split("__"))
	   .extract()?)
    }

    /// Countries for the correlation stages, in configured order.
    pub fn countries<'a>(&self, available: impl Iterator<Item = &'a str>) -> Vec<String> {
	match self.entities.countries.is_empty() {
	    true => available.map(|s| s.to_string()).collect(),
	    false => self.entities.countries.clone(),
	}
    }

}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
	figment::Jail::expect_with(|jail| {
	    let config = Config::load(&jail.directory().join("absent.toml"))
		.map_err(|e| e.to_string())?;
	    assert_eq!(config, Config::default());
	    assert_eq!(config.repair.spike_scalar, 5.0);
	    assert_eq!(config.repair.top_n, 10);
	    assert!(config.entities.denylist.iter().any(|s| s == "World"));
	    Ok(())
	});
    }

    #[test]
    fn file_and_environment_override_defaults() {
	figment::Jail::expect_with(|jail| {
	    jail.create_file("covid19-lag.toml", r#"
		[lag]
		cross_max_lag = 10
		cross_mode = "one_sided"
		cross_feature = "new_deaths"

		[map]
		start = "2021-12-01"

		[entities]
		countries = ["Belgium", "France"]
		reference = "France"
	    "#)?;
	    jail.set_env("COVID19_LAG_REPAIR__SPIKE_SCALAR", "3.5");
	    let config = Config::load(Path::new(DEFAULT_CONFIG_FILE))
		.map_err(|e| e.to_string())?;
	    assert_eq!(config.lag.cross_max_lag, 10);
	    assert_eq!(config.lag.cross_mode, LagMode::OneSided);
	    assert_eq!(config.lag.cross_feature, Feature::NewDeaths);
	    assert_eq!(config.lag.display_threshold, 14);
	    assert_eq!(config.entities.countries, vec!["Belgium", "France"]);
	    assert_eq!(config.entities.reference.as_deref(), Some("France"));
	    assert_eq!(config.repair.spike_scalar, 3.5);
	    assert_eq!(config.map.start, NaiveDate::from_ymd_opt(2021, 12, 1));
	    assert_eq!(config.map.end, None);
	    Ok(())
	});
    }

    #[test]
    fn empty_country_list_means_all() {
	let mut config = Config::default();
	config.entities.countries.clear();
	assert_eq!(config.countries(vec!["A", "B"].into_iter()), vec!["A", "B"]);
    }
}
