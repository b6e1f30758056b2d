use std::{io,fs};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::naive::NaiveDate;
use serde_json::{Value,json};
use unidecode::unidecode;

use super::config::MapConfig;
use super::dataset::{Feature,NaiveDateRange,TimeSeries};
use super::error::{Result,Error};
use super::lag::{CorrelationMatrix,LaggedCorrelation};
use super::milestone::Milestone;
use super::ranking::LeadLagRelation;


pub type SeriesData<'a> = Vec<(String,&'a TimeSeries)>;


/// Lowercase ASCII file name for a country or group name.
pub fn slug(name: &str) -> String {
    unidecode(name).to_lowercase().split(|c: char| !c.is_ascii_alphanumeric())
	.filter(|s| !s.is_empty()).collect::<Vec<_>>().join("-")
}


pub fn series_graph(graph_path: &Path, group: &str, feature: Feature,
		    data: &SeriesData) -> Result<()> {
    let graph_path = graph_path.join("series").join(slug(group));
    let title = format!("Corrected {} by country", feature.title());
    page(&graph_path, &format!("{}.html", feature.name()), &title,
	 &lines_spec(&title, feature.title(), data))
}


/// Several features of one country over time. The first feature is drawn
/// against the left axis, the others share the right one.
pub fn country_graph(graph_path: &Path, country: &str, view: &str,
		     features: &[(Feature,&TimeSeries)]) -> Result<()> {

    let (first, rest) = features.split_first().ok_or(Error::MissingData)?;
    let graph_path = graph_path.join("countries").join(slug(country));
    let title = format!("{} in {}", features.iter().map(|(f,_)| f.title())
			.collect::<Vec<_>>().join(" & "), country);
    let domain: Vec<&str> = features.iter().map(|(f,_)| f.title()).collect();

    let layer = |group: &[(Feature,&TimeSeries)], orient: &str| {
	let series: SeriesData = group.iter().map(|(f,s)| (f.title().to_string(), *s)).collect();
	json!({
	    "data": {"values": line_values(&series)},
	    "mark": "line",
	    "encoding": {
		"x": {
		    "field": "Date",
		    "timeUnit": "utcyearmonthdate",
		    "title": "Date",
		    "type": "temporal"
		},
		"y": {
		    "field": "Value",
		    "type": "quantitative",
		    "title": group.iter().map(|(f,_)| f.title()).collect::<Vec<_>>().join(" / "),
		    "axis": {"orient": orient}
		},
		"color": {
		    "field": "Region",
		    "type": "nominal",
		    "title": "Series",
		    "scale": {"domain": domain}
		},
		"tooltip": [
		    {"field": "Region", "type": "nominal", "title": "Series"},
		    {"field": "Date", "type": "temporal"},
		    {"field": "Value", "type": "quantitative", "format": ".1f"}
		]
	    }
	})
    };

    let mut layers = vec![layer(std::slice::from_ref(first), "left")];
    if !rest.is_empty() {
	layers.push(layer(rest, "right"));
    }

    page(&graph_path, &format!("{}.html", view), &title, &json!({
	"$schema": "https://vega.github.io/schema/vega-lite/v4.json",
	"height": "container",
	"width": "container",
	"title": title,
	"layer": layers,
	"resolve": {"scale": {"y": "independent"}}
    }))

}


pub fn lag_graph(graph_path: &Path, entity: &str, lags: &LaggedCorrelation) -> Result<()> {

    let graph_path = graph_path.join("cases-deaths");
    let title = format!("Lagged correlation of cases & deaths in {}", entity);
    let points = |points: &[(i64,f64)], series: &str| points.iter().map(
	|(lag,corr)| json!({"Lag": lag, "Correlation": corr, "Series": series})
    ).collect::<Vec<_>>();
    let (best_lag, best_corr) = lags.best().unwrap_or((0, 0.0));

    page(&graph_path, &format!("{}.html", slug(entity)), &title, &json!({
	"$schema": "https://vega.github.io/schema/vega-lite/v4.json",
	"height": "container",
	"width": "container",
	"title": title,
	"layer": [
	    {
		"data": {
		    "values": points(&lags.correlations[..], "Correlation").into_iter().chain(
			points(&lags.every_nth(7)[..], "Every 7th lag")).collect::<Vec<_>>()
		},
		"mark": {"type": "line", "point": true},
		"encoding": {
		    "x": {"field": "Lag", "type": "quantitative", "title": "Lag (days)"},
		    "y": {"field": "Correlation", "type": "quantitative", "title": "Correlation"},
		    "color": {
			"field": "Series",
			"type": "nominal",
			"scale": {"range": ["gray", "blue"]}
		    },
		    "opacity": {
			"field": "Series",
			"type": "nominal",
			"scale": {"range": [0.5, 1.0]},
			"legend": null
		    },
		    "tooltip": [
			{"field": "Lag", "type": "quantitative"},
			{"field": "Correlation", "type": "quantitative", "format": ".3f"}
		    ]
		}
	    },
	    {
		"data": {
		    "values": [{
			"Lag": best_lag,
			"Name": format!("Maximum correlation: {:.3} at {} days lag.", best_corr, best_lag)
		    }]
		},
		"encoding": {
		    "x": {"field": "Lag", "type": "quantitative"}
		},
		"layer": [
		    {
			"mark": {"type": "rule", "color": "red", "strokeDash": [4, 4]}
		    },
		    {
			"mark": {"type": "text", "color": "red", "align": "left", "dx": 4, "y": 10},
			"encoding": {"text": {"field": "Name"}}
		    }
		]
	    }
	]
    }))

}


pub fn heatmap_graph(graph_path: &Path, name: &str, title: &str,
		     rows: &[(String,LaggedCorrelation)]) -> Result<()> {
    page(graph_path, &format!("{}.html", name), title, &rect_spec(
	title, "Lag (days)", "Country",
	rows.iter().flat_map(|(entity,lags)| lags.correlations.iter().map(
	    move |(lag,corr)| json!({"X": lag, "Y": entity, "Value": corr})
	)).collect(),
	&rows.iter().map(|(entity,_)| entity.clone()).collect::<Vec<_>>()))
}


pub fn matrix_graph(graph_path: &Path, feature: Feature, matrix: &CorrelationMatrix) -> Result<()> {
    let title = format!("Correlation of {} between countries", feature.title());
    page(graph_path, &format!("correlation-{}.html", feature.name()), &title, &rect_spec(
	&title, "Country", "Country",
	matrix.entities.iter().zip(&matrix.values).flat_map(
	    |(a,row)| matrix.entities.iter().zip(row).map(
		move |(b,corr)| json!({"X": b, "Y": a, "Value": corr})
	    )).collect(),
	&matrix.entities))
}


pub fn milestone_graph(graph_path: &Path, threshold: f64, milestones: &[Milestone]) -> Result<()> {

    let title = format!("Total deaths per million vs. date of {}% vaccination", threshold);
    let values: Vec<Value> = milestones.iter().filter_map(|m| {
	let (reached, deaths) = (m.reached?, m.total_deaths_per_million?);
	Some(json!({
	    "Country": m.country,
	    "Date": format!("{}", reached.format("%Y-%m-%d")),
	    "Deaths": deaths
	}))
    }).collect();

    page(graph_path, "vaccination-deaths.html", &title, &json!({
	"$schema": "https://vega.github.io/schema/vega-lite/v4.json",
	"height": "container",
	"width": "container",
	"title": title,
	"data": {"values": values},
	"encoding": {
	    "x": {"field": "Date", "type": "temporal", "title": format!("Date of {}% vaccination", threshold)},
	    "y": {"field": "Deaths", "type": "quantitative", "title": "Total deaths per million"}
	},
	"layer": [
	    {
		"mark": {"type": "point", "filled": true, "opacity": 0.7},
		"encoding": {
		    "tooltip": [
			{"field": "Country", "type": "nominal"},
			{"field": "Date", "type": "temporal"},
			{"field": "Deaths", "type": "quantitative", "format": ".1f"}
		    ]
		}
	    },
	    {
		"mark": {"type": "text", "align": "left", "dx": 5, "fontSize": 9, "opacity": 0.7},
		"encoding": {"text": {"field": "Country"}}
	    }
	]
    }))

}


/// Force-directed network of lead/lag edges. Heavier edges (shorter lags)
/// pull harder and draw thicker.
pub fn network_graph(graph_path: &Path, feature: Feature, edges: &[LeadLagRelation]) -> Result<()> {

    let mut nodes: Vec<&str> = edges.iter()
	.flat_map(|e| vec![e.from.as_str(), e.to.as_str()]).collect();
    nodes.sort();
    nodes.dedup();
    let index = |name: &str| nodes.binary_search(&name).unwrap_or(0);

    let title = format!("Countries leading {} of other countries", feature.title());

    page(graph_path, &format!("network-{}.html", feature.name()), &title, &json!({
	"$schema": "https://vega.github.io/schema/vega/v5.json",
	"width": 900,
	"height": 700,
	"autosize": "none",
	"title": title,
	"data": [
	    {
		"name": "node-data",
		"values": nodes.iter().map(|n| json!({"name": n})).collect::<Vec<_>>()
	    },
	    {
		"name": "link-data",
		"values": edges.iter().map(|e| json!({
		    "source": index(&e.from),
		    "target": index(&e.to),
		    "lag": e.lag,
		    "correlation": e.correlation,
		    "weight": e.weight
		})).collect::<Vec<_>>()
	    }
	],
	"marks": [
	    {
		"name": "nodes",
		"type": "symbol",
		"zindex": 1,
		"from": {"data": "node-data"},
		"encode": {
		    "enter": {
			"fill": {"value": "steelblue"},
			"stroke": {"value": "white"},
			"size": {"value": 300},
			"tooltip": {"field": "name"}
		    }
		},
		"transform": [
		    {
			"type": "force",
			"iterations": 300,
			"static": true,
			"forces": [
			    {"force": "center", "x": 450, "y": 350},
			    {"force": "collide", "radius": 20},
			    {"force": "nbody", "strength": -120},
			    {"force": "link", "links": "link-data", "distance": 120}
			]
		    }
		]
	    },
	    {
		"type": "text",
		"zindex": 2,
		"from": {"data": "nodes"},
		"encode": {
		    "update": {
			"x": {"field": "x"},
			"y": {"field": "y", "offset": -12},
			"text": {"field": "datum.name"},
			"align": {"value": "center"},
			"fontSize": {"value": 10}
		    }
		}
	    },
	    {
		"type": "path",
		"from": {"data": "link-data"},
		"interactive": false,
		"encode": {
		    "update": {
			"stroke": {"value": "gray"},
			"strokeOpacity": {"signal": "0.3 + 0.7 * datum.weight"},
			"strokeWidth": {"signal": "0.5 + 4 * datum.weight"}
		    }
		},
		"transform": [
		    {
			"type": "linkpath",
			"shape": "line",
			"sourceX": "datum.source.x", "sourceY": "datum.source.y",
			"targetX": "datum.target.x", "targetY": "datum.target.y"
		    }
		]
	    }
	]
    }))

}


/// Daily cases as drawn on the map. A zero report shows the mean of the
/// week ending that day instead, so batched reporting does not blank a
/// country out. Missing days are left out.
pub fn displayed_cases(series: &TimeSeries) -> Vec<(NaiveDate,f64)> {
    let values = series.values();
    series.iter().enumerate().filter_map(|(i,(date,val))| match val? {
	v if v == 0.0 => {
	    let week: Vec<f64> = values[i.saturating_sub(6)..=i].iter().flatten().copied().collect();
	    Some((date, week.iter().sum::<f64>() / week.len() as f64))
	},
	v => Some((date, v)),
    }).collect()
}

fn map_name(country: &str) -> &str {
    match country {
	"United States" => "United States of America",
	_ => country,
    }
}


/// Cases per country as circles on a world map, one frame per day picked
/// with a slider.
pub fn world_map_graph(graph_path: &Path, config: &MapConfig, data: &SeriesData) -> Result<()> {

    let (start, end) = (config.start, config.end);
    let points: Vec<(&str,NaiveDate,f64)> = data.iter().flat_map(
	|(country,series)| displayed_cases(series).into_iter()
	    .filter(move |(date,cases)| *cases > 0.0
		    && start.map_or(true, |start| *date >= start)
		    && end.map_or(true, |end| *date <= end))
	    .map(move |(date,cases)| (map_name(country), date, cases))
    ).collect();

    let first = points.iter().map(|(_,date,_)| *date).min().ok_or(Error::MissingData)?;
    let last = points.iter().map(|(_,date,_)| *date).max().ok_or(Error::MissingData)?;
    let dates: Vec<String> = NaiveDateRange(first, Some(last))
	.map(|date| format!("{}", date.format("%Y-%m-%d"))).collect();

    page(graph_path, "world-map-cases.html", "COVID-19 cases by country", &json!({
	"$schema": "https://vega.github.io/schema/vega/v5.json",
	"width": 900,
	"height": 480,
	"autosize": "none",
	"title": {"text": {"signal": "'COVID-19 cases by country on ' + dates[day]"}},
	"signals": [
	    {"name": "dates", "value": dates},
	    {"name": "label_threshold", "value": config.label_threshold},
	    {
		"name": "day",
		"value": dates.len() - 1,
		"bind": {"input": "range", "min": 0, "max": dates.len() - 1, "step": 1}
	    }
	],
	"projections": [
	    {
		"name": "projection",
		"type": "naturalEarth1",
		"scale": 160,
		"translate": [{"signal": "width / 2"}, {"signal": "height / 2"}]
	    }
	],
	"data": [
	    {
		"name": "world",
		"url": config.topology_url,
		"format": {"type": "topojson", "feature": "countries"}
	    },
	    {
		"name": "cases",
		"values": points.iter().map(|(country,date,cases)| json!({
		    "country": country,
		    "day": (*date - first).num_days(),
		    "cases": cases
		})).collect::<Vec<_>>()
	    },
	    {
		"name": "today",
		"source": "cases",
		"transform": [{"type": "filter", "expr": "datum.day == day"}]
	    },
	    {
		"name": "circles",
		"source": "world",
		"transform": [
		    {
			"type": "lookup",
			"from": "today",
			"key": "country",
			"fields": ["properties.name"],
			"values": ["cases"],
			"as": ["cases"]
		    },
		    {"type": "filter", "expr": "datum.cases != null"},
		    {"type": "formula", "as": "centroid", "expr": "geoCentroid('projection', datum)"}
		]
	    }
	],
	"scales": [
	    {
		"name": "size",
		"type": "linear",
		"zero": true,
		"domain": {"data": "cases", "field": "cases"},
		"range": [0, 2500]
	    }
	],
	"marks": [
	    {
		"type": "shape",
		"from": {"data": "world"},
		"encode": {
		    "update": {
			"fill": {"value": "lightgray"},
			"stroke": {"value": "white"},
			"strokeWidth": {"value": 0.5}
		    }
		},
		"transform": [{"type": "geoshape", "projection": "projection"}]
	    },
	    {
		"type": "symbol",
		"from": {"data": "circles"},
		"encode": {
		    "update": {
			"x": {"field": "centroid[0]"},
			"y": {"field": "centroid[1]"},
			"size": {"scale": "size", "field": "cases"},
			"fill": {"value": "red"},
			"fillOpacity": {"value": 0.5},
			"tooltip": {"signal": "datum.properties.name + ': ' + format(datum.cases, ',.0f')"}
		    }
		}
	    },
	    {
		"type": "text",
		"from": {"data": "circles"},
		"encode": {
		    "update": {
			"x": {"field": "centroid[0]"},
			"y": {"field": "centroid[1]", "offset": -10},
			"text": {"field": "properties.name"},
			"align": {"value": "center"},
			"fontSize": {"value": 8},
			"opacity": {"signal": "datum.cases > label_threshold ? 1 : 0"}
		    }
		}
	    }
	]
    }))

}


fn lines_spec(title: &str, ytitle: &str, data: &SeriesData) -> Value {
    json!({
	"$schema": "https://vega.github.io/schema/vega-lite/v4.json",
	"height": "container",
	"width": "container",
	"title": title,
	"data": {"values": line_values(data)},
	"layer": [
	    {
		"encoding": {
		    "color": {
			"field": "Region",
			"type":"nominal"
		    },
		    "x": {
			"field":"Date",
			"timeUnit": "utcyearmonthdate",
			"title":"Date",
			"type":"temporal"
		    },
		    "y": {
			"field":"Value",
			"title": ytitle,
			"type":"quantitative"
		    }
		},
		"layer": [
		    {
			"mark":"line",
			"selection": {
			    "Highlight": {"bind":"legend","type":"multi","fields":["Region"]},
			    "Grid": {"bind":"scales","type":"interval"}
			},
			"encoding":{
			    "opacity":{"value":0.1,"condition":{"value":1,"selection":"Highlight"}}
			}
		    },
		    {
			"mark":"point",
			"encoding": {
			    "opacity": {
				"value":0,
				"condition": [
				    {"value":1,"test":{"and":[{"selection":"Highlight"},{"selection":"Hover"}]}},
				    {"value":0.2,"selection":"Hover"}
				]
			    }
			}
		    }
		]
	    },
	    {
		"transform": [
		    {
			"groupby": ["Date"],
			"value": "Value",
			"pivot": "Region"
		    }
		],
		"mark": {
		    "color": "gray",
		    "tooltip": {"content":"data"},
		    "type": "rule"
		},
		"selection": {
		    "Hover": {
			"nearest":true,
			"empty":"none",
			"clear":"mouseout",
			"type":"single",
			"on":"mouseover",
			"fields":["Date"]
		    }
		},
		"encoding": {
		    "opacity": {
			"value": 0,
			"condition": {
			    "value": 1,
			    "selection": "Hover"
			}
		    },
		    "x": {
			"field":"Date",
			"type":"temporal"
		    },
		    "tooltip": vec![
			json!({"field":"Date","type":"temporal"})
		    ].into_iter().chain(data.iter().map(
			|(region,_)| json!({"field":region,"format":".1f","type":"quantitative"})
		    )).collect::<Vec<_>>()
		}
	    }
	]
    })
}


fn line_values(data: &[(String,&TimeSeries)]) -> Vec<Value> {
    data.iter().flat_map(
	|(region,series)| series.iter().filter_map(
	    move |(date,val)| match val.filter(|v| v.is_finite()) {
		None => None,
		Some(val) => Some(json!({
		    "Date": format!("{}", date.format("%Y-%m-%d")),
		    "Region": region.to_string(),
		    "Value": val
		}))
	    })
    ).collect()
}


fn rect_spec(title: &str, xtitle: &str, ytitle: &str, values: Vec<Value>, order: &[String]) -> Value {
    json!({
	"$schema": "https://vega.github.io/schema/vega-lite/v4.json",
	"height": "container",
	"width": "container",
	"title": title,
	"data": {"values": values},
	"mark": "rect",
	"encoding": {
	    "x": {"field": "X", "type": "ordinal", "title": xtitle},
	    "y": {"field": "Y", "type": "nominal", "title": ytitle, "sort": order},
	    "color": {
		"field": "Value",
		"type": "quantitative",
		"title": "Correlation",
		"scale": {"scheme": "redblue", "reverse": true, "domainMid": 0}
	    },
	    "tooltip": [
		{"field": "Y", "type": "nominal", "title": ytitle},
		{"field": "X", "type": "ordinal", "title": xtitle},
		{"field": "Value", "type": "quantitative", "format": ".3f"}
	    ]
	}
    })
}


fn page(graph_path: &Path, path: &str, title: &str, spec: &Value) -> Result<()> {

    fs::create_dir_all(graph_path)?;
    let mut out = io::BufWriter::new(File::create(graph_path.join(path))?);

    write!(out, "<!DOCTYPE html><html><head>")?;
    write!(out, "<meta charset=\"UTF-8\">")?;
    write!(out, "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">")?;
    write!(out, "<title>{}</title>", title)?;
    write!(out, "<script src=\"https://cdn.jsdelivr.net/npm/vega@5\"></script>")?;
    write!(out, "<script src=\"https://cdn.jsdelivr.net/npm/vega-lite@4\"></script>")?;
    write!(out, "<script src=\"https://cdn.jsdelivr.net/npm/vega-embed\"></script>")?;
    write!(out, "</head>")?;
    write!(out, "<body>")?;
    write!(out, "<div id=\"vis\" style=\"overflow: hidden; position: absolute;top: 0; left: 0; right: 0; bottom: 0;\"></div>")?;
    write!(out, "<script type=\"text/javascript\">")?;
    write!(out, "var spec = ")?;

    serde_json::to_writer_pretty(out.by_ref(), spec)?;

    write!(out, ";vegaEmbed('#vis', spec,{{}}).then(function(result) {{")?;
    write!(out, "}}).catch(console.error);")?;
    write!(out, "</script>")?;
    write!(out, "</body></html>")?;

    out.flush()?;
    Ok(())

}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn spec_of(path: &Path) -> Value {
	let html = fs::read_to_string(path).unwrap();
	let start = html.find("var spec = ").unwrap() + "var spec = ".len();
	let end = html.rfind(";vegaEmbed").unwrap();
	serde_json::from_str(&html[start..end]).unwrap()
    }

    #[test]
    fn slugs_are_ascii() {
	assert_eq!(slug("Côte d'Ivoire"), "cote-d-ivoire");
	assert_eq!(slug("United Kingdom"), "united-kingdom");
	assert_eq!(slug("Curaçao"), "curacao");
    }

    #[test]
    fn series_page_skips_missing_values() {
	let dir = tempfile::tempdir().unwrap();
	let series = TimeSeries::new(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
				     vec![Some(1.0), None, Some(3.0)]);
	series_graph(dir.path(), "Europe", Feature::NewCases,
		     &vec![("Belgium".to_string(), &series)]).unwrap();
	let spec = spec_of(&dir.path().join("series/europe/new_cases.html"));
	let values = spec["data"]["values"].as_array().unwrap();
	assert_eq!(values.len(), 2);
	assert_eq!(values[1]["Date"], "2021-01-03");
    }

    #[test]
    fn country_page_splits_axes() {
	let dir = tempfile::tempdir().unwrap();
	let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
	let cases = TimeSeries::new(start, vec![Some(100.0), Some(120.0)]);
	let deaths = TimeSeries::new(start, vec![Some(2.0), None]);
	country_graph(dir.path(), "Côte d'Ivoire", "cases-deaths",
		      &[(Feature::NewCases, &cases), (Feature::NewDeaths, &deaths)]).unwrap();
	let spec = spec_of(&dir.path().join("countries/cote-d-ivoire/cases-deaths.html"));
	assert_eq!(spec["resolve"]["scale"]["y"], "independent");
	assert_eq!(spec["layer"].as_array().unwrap().len(), 2);
	assert_eq!(spec["layer"][0]["encoding"]["y"]["axis"]["orient"], "left");
	assert_eq!(spec["layer"][0]["data"]["values"].as_array().unwrap().len(), 2);
	assert_eq!(spec["layer"][1]["data"]["values"].as_array().unwrap().len(), 1);
	assert_eq!(spec["layer"][1]["data"]["values"][0]["Region"], Feature::NewDeaths.title());
	assert!(country_graph(dir.path(), "Belgium", "empty", &[]).is_err());
    }

    #[test]
    fn zero_reports_show_the_weekly_mean() {
	let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
	let series = TimeSeries::new(start, vec![Some(7.0), Some(0.0), None, Some(14.0), Some(0.0)]);
	let day = |d: u32| NaiveDate::from_ymd_opt(2021, 1, d).unwrap();
	assert_eq!(displayed_cases(&series), vec![
	    (day(1), 7.0), (day(2), 3.5), (day(4), 14.0), (day(5), 21.0 / 4.0)
	]);
    }

    #[test]
    fn world_map_indexes_days_from_first_date() {
	let dir = tempfile::tempdir().unwrap();
	let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
	let us = TimeSeries::new(start, vec![Some(7.0), Some(0.0), None, Some(14.0)]);
	let quiet = TimeSeries::new(start, vec![Some(0.0), Some(0.0)]);
	let config = MapConfig {
	    start: NaiveDate::from_ymd_opt(2021, 1, 2),
	    ..MapConfig::default()
	};
	world_map_graph(dir.path(), &config, &vec![
	    ("United States".to_string(), &us), ("Tuvalu".to_string(), &quiet)
	]).unwrap();
	let spec = spec_of(&dir.path().join("world-map-cases.html"));
	assert_eq!(spec["signals"][0]["value"], json!(["2021-01-02", "2021-01-03", "2021-01-04"]));
	assert_eq!(spec["signals"][2]["bind"]["max"], 2);
	assert_eq!(spec["data"][1]["values"], json!([
	    {"country": "United States of America", "day": 0, "cases": 3.5},
	    {"country": "United States of America", "day": 2, "cases": 14.0}
	]));

	let empty = MapConfig { end: NaiveDate::from_ymd_opt(2020, 1, 1), ..MapConfig::default() };
	assert!(world_map_graph(dir.path(), &empty, &vec![("Tuvalu".to_string(), &us)]).is_err());
    }

    #[test]
    fn lag_page_marks_best_lag() {
	let dir = tempfile::tempdir().unwrap();
	let lags = LaggedCorrelation { correlations: vec![(0, 0.1), (1, 0.7), (2, 0.4)] };
	lag_graph(dir.path(), "Belgium", &lags).unwrap();
	let spec = spec_of(&dir.path().join("cases-deaths/belgium.html"));
	assert_eq!(spec["layer"][1]["data"]["values"][0]["Lag"], 1);
	assert_eq!(spec["layer"][0]["data"]["values"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn network_links_reference_node_indices() {
	let dir = tempfile::tempdir().unwrap();
	let edges = vec![LeadLagRelation {
	    from: "Spain".to_string(), to: "France".to_string(),
	    lag: 3, correlation: 0.9, weight: 0.5
	}];
	network_graph(dir.path(), Feature::NewCases, &edges).unwrap();
	let spec = spec_of(&dir.path().join("network-new_cases.html"));
	assert_eq!(spec["data"][0]["values"][0]["name"], "France");
	assert_eq!(spec["data"][1]["values"][0]["source"], 1);
	assert_eq!(spec["data"][1]["values"][0]["target"], 0);
    }
}
