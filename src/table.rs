use std::fs;
use std::path::Path;

use serde::Serialize;

use super::dataset::Wide;
use super::error::Result;
use super::lag::LaggedCorrelation;
use super::milestone::Milestone;
use super::ranking::{LeadLagRelation,Ranked};


#[derive(Serialize)]
struct Summary<'a> {
    country: &'a str,
    best_lag: Option<i64>,
    max_corr: Option<f64>,
    same_day_corr: Option<f64>,
}

#[derive(Serialize)]
struct RankingRow<'a> {
    reference: &'a str,
    entity: &'a str,
    lag: i64,
    max_corr: f64,
}


/// Date × entity table; missing values are empty cells.
pub fn write_wide(table_path: &Path, wide: &Wide) -> Result<()> {
    fs::create_dir_all(table_path)?;
    let mut out = csv::Writer::from_path(table_path.join(format!("{}.csv", wide.feature.name())))?;
    out.write_record(std::iter::once("date").chain(wide.columns.iter().map(|c| c.as_str())))?;
    for (date,values) in &wide.rows {
	out.write_record(std::iter::once(format!("{}", date.format("%Y-%m-%d"))).chain(
	    values.iter().map(|v| v.map_or(String::new(), |v| v.to_string()))))?;
    }
    out.flush()?;
    Ok(())
}


pub fn write_summaries(table_path: &Path, name: &str,
		       rows: &[(String,LaggedCorrelation)]) -> Result<()> {
    fs::create_dir_all(table_path)?;
    let mut out = csv::Writer::from_path(table_path.join(format!("{}.csv", name)))?;
    for (country,lags) in rows {
	let best = lags.best();
	out.serialize(Summary {
	    country,
	    best_lag: best.map(|(lag,_)| lag),
	    max_corr: best.map(|(_,corr)| corr),
	    same_day_corr: lags.get(0),
	})?;
    }
    out.flush()?;
    Ok(())
}


pub fn write_ranking(table_path: &Path, reference: &str, ranked: &[Ranked]) -> Result<()> {
    fs::create_dir_all(table_path)?;
    let mut out = csv::Writer::from_path(table_path.join("ranking.csv"))?;
    for ranked in ranked {
	out.serialize(RankingRow {
	    reference,
	    entity: &ranked.entity,
	    lag: ranked.lag,
	    max_corr: ranked.max_corr,
	})?;
    }
    out.flush()?;
    Ok(())
}


pub fn write_edges(table_path: &Path, edges: &[LeadLagRelation]) -> Result<()> {
    write_rows(&table_path.join("lead-lag-edges.csv"), edges)
}


pub fn write_milestones(table_path: &Path, milestones: &[Milestone]) -> Result<()> {
    write_rows(&table_path.join("vaccination-milestones.csv"), milestones)
}


fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
	fs::create_dir_all(parent)?;
    }
    let mut out = csv::Writer::from_path(path)?;
    for row in rows {
	out.serialize(row)?;
    }
    out.flush()?;
    Ok(())
}
