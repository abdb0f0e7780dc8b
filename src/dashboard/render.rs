//! Builds the dashboard view model and renders it to a single HTML page.

use crate::dashboard::filter::{
    filter_records, FilterOptions, Selection, PARAM_APPLIED, PARAM_CITY, PARAM_TYPE,
};
use crate::dashboard::summary::{
    series_by_city, summarize, table_rows, type_counts, CitySeries, Metric, Summary, TypeCount,
    TABLE_HEADERS,
};
use crate::types::anomaly::AnomalyRecord;
use plotly::common::Mode;
use plotly::{Bar, Layout, Plot, Scatter};
use std::fmt::Write;

pub const PAGE_TITLE: &str = "Weather Anomaly Tracker";
pub const PAGE_CAPTION: &str = "Monitoring extreme weather across global cities every few hours.";
pub const EMPTY_DATASET_MESSAGE: &str =
    "No weather anomalies have been recorded yet. The pipeline checks every 6 hours.";
pub const NO_MATCHES_MESSAGE: &str =
    "No anomalies match your filters. Try adjusting the sidebar selections.";

const REFRESH_SECONDS: u32 = 600;
const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const CHART_HEIGHT: usize = 420;

/// Everything the page shows for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    /// Nothing recorded yet (or the dataset could not be read).
    Empty,
    /// Data exists but the selection excludes all of it.
    NoMatches {
        options: FilterOptions,
        selection: Selection,
    },
    Populated {
        options: FilterOptions,
        selection: Selection,
        summary: Summary,
        temperature: Vec<CitySeries>,
        wind: Vec<CitySeries>,
        type_counts: Vec<TypeCount>,
        records: Vec<AnomalyRecord>,
    },
}

impl DashboardView {
    pub fn build<'a>(
        records: &[AnomalyRecord],
        registry: impl IntoIterator<Item = &'a str>,
        query: Option<&str>,
    ) -> Self {
        if records.is_empty() {
            return DashboardView::Empty;
        }
        let options = FilterOptions::from_records(records, registry);
        let selection = Selection::from_query(query, &options);
        let filtered = filter_records(records, &selection);
        if filtered.is_empty() {
            return DashboardView::NoMatches { options, selection };
        }

        DashboardView::Populated {
            summary: summarize(&filtered),
            temperature: series_by_city(&filtered, Metric::Temperature),
            wind: series_by_city(&filtered, Metric::WindSpeed),
            type_counts: type_counts(&filtered),
            records: filtered,
            options,
            selection,
        }
    }
}

pub fn render_page(view: &DashboardView) -> String {
    let mut body = String::new();
    let _ = write!(
        body,
        "<header><h1>{}</h1><p class=\"caption\">{}</p></header>",
        escape(PAGE_TITLE),
        escape(PAGE_CAPTION)
    );

    match view {
        DashboardView::Empty => {
            let _ = write!(
                body,
                "<main><div class=\"notice info\">{}</div></main>",
                escape(EMPTY_DATASET_MESSAGE)
            );
        }
        DashboardView::NoMatches { options, selection } => {
            body.push_str(&render_sidebar(options, selection));
            let _ = write!(
                body,
                "<main><div class=\"notice warning\">{}</div></main>",
                escape(NO_MATCHES_MESSAGE)
            );
        }
        DashboardView::Populated {
            options,
            selection,
            summary,
            temperature,
            wind,
            type_counts,
            records,
        } => {
            body.push_str(&render_sidebar(options, selection));
            body.push_str("<main>");
            body.push_str(&render_metrics(summary));
            body.push_str("<hr>");
            body.push_str(&render_tabs(&[
                (
                    "Temperature",
                    scatter_chart(temperature, Metric::Temperature, "chart-temperature"),
                ),
                (
                    "Wind Speed",
                    scatter_chart(wind, Metric::WindSpeed, "chart-wind"),
                ),
                ("Anomaly Types", bar_chart(type_counts, "chart-types")),
            ]));
            body.push_str("<hr>");
            body.push_str(&render_table(records));
            body.push_str("</main>");
        }
    }

    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta http-equiv=\"refresh\" content=\"{REFRESH_SECONDS}\">\
         <title>{title}</title><script src=\"{PLOTLY_JS}\"></script>\
         <style>{STYLE}</style></head><body>{body}</body></html>",
        title = escape(PAGE_TITLE),
    )
}

fn render_sidebar(options: &FilterOptions, selection: &Selection) -> String {
    let mut html = String::from("<aside><h2>Filters</h2><form method=\"get\" action=\"/\">");
    let _ = write!(html, "<input type=\"hidden\" name=\"{PARAM_APPLIED}\" value=\"1\">");
    html.push_str(&multi_select("City", PARAM_CITY, &options.cities, |v| {
        selection.cities.contains(v)
    }));
    html.push_str(&multi_select("Type", PARAM_TYPE, &options.types, |v| {
        selection.types.contains(v)
    }));
    html.push_str("<button type=\"submit\">Apply</button></form></aside>");
    html
}

fn multi_select(
    label: &str,
    name: &str,
    values: &[String],
    is_selected: impl Fn(&str) -> bool,
) -> String {
    let mut html = format!(
        "<label for=\"{name}\">{}</label><select id=\"{name}\" name=\"{name}\" multiple size=\"{}\">",
        escape(label),
        values.len().clamp(3, 8)
    );
    for value in values {
        let _ = write!(
            html,
            "<option value=\"{v}\"{selected}>{v}</option>",
            v = escape(value),
            selected = if is_selected(value) { " selected" } else { "" }
        );
    }
    html.push_str("</select>");
    html
}

fn render_metrics(summary: &Summary) -> String {
    let mean = summary
        .mean_temperature_c
        .map(|t| format!("{t:.1} °C"))
        .unwrap_or_else(|| "n/a".to_string());
    let metric = |label: &str, value: &str| {
        format!(
            "<div class=\"metric\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>",
            escape(label),
            escape(value)
        )
    };
    format!(
        "<section class=\"metrics\">{}{}{}</section>",
        metric("Total Anomalies", &summary.total.to_string()),
        metric("Cities Affected", &summary.cities_affected.to_string()),
        metric("Avg Temperature", &mean)
    )
}

/// CSS-only tabs; the first one is open.
fn render_tabs(tabs: &[(&str, String)]) -> String {
    let mut html = String::from("<section class=\"tabs\">");
    for (idx, (label, content)) in tabs.iter().enumerate() {
        let _ = write!(
            html,
            "<input type=\"radio\" name=\"tabs\" id=\"tab-{idx}\"{checked}>\
             <label for=\"tab-{idx}\">{label}</label>\
             <div class=\"tab-panel\">{content}</div>",
            checked = if idx == 0 { " checked" } else { "" },
            label = escape(label),
        );
    }
    html.push_str("</section>");
    html
}

fn scatter_chart(series: &[CitySeries], metric: Metric, div_id: &str) -> String {
    let mut plot = Plot::new();
    for city in series {
        let times: Vec<String> = city.times.iter().map(|t| t.to_rfc3339()).collect();
        let trace = Scatter::new(times, city.values.clone())
            .name(city.city.as_str())
            .mode(Mode::Markers);
        plot.add_trace(trace);
    }
    plot.set_layout(Layout::new().height(CHART_HEIGHT));
    format!(
        "<p class=\"axis\">{}</p>{}",
        escape(metric.axis_label()),
        plot.to_inline_html(Some(div_id))
    )
}

fn bar_chart(counts: &[TypeCount], div_id: &str) -> String {
    let labels: Vec<String> = counts.iter().map(|c| c.label.clone()).collect();
    let values: Vec<usize> = counts.iter().map(|c| c.count).collect();
    let mut plot = Plot::new();
    plot.add_trace(Bar::new(labels, values).name("Count"));
    plot.set_layout(Layout::new().height(CHART_HEIGHT));
    format!(
        "<p class=\"axis\">Count per type</p>{}",
        plot.to_inline_html(Some(div_id))
    )
}

fn render_table(records: &[AnomalyRecord]) -> String {
    let mut html = String::from("<details><summary>View raw data</summary><table><thead><tr>");
    for header in TABLE_HEADERS {
        let _ = write!(html, "<th>{}</th>", escape(header));
    }
    html.push_str("</tr></thead><tbody>");
    for record in table_rows(records) {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{:.1}</td><td>{:.1}</td><td>{}</td><td>{}</td></tr>",
            escape(&record.city),
            record.temperature_c,
            record.wind_speed_kmh,
            record.processed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            escape(&record.anomaly_type.label())
        );
    }
    html.push_str("</tbody></table></details>");
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:0;display:grid;grid-template-columns:260px 1fr;grid-template-rows:auto 1fr}\
header{grid-column:1/3;padding:1rem 2rem;border-bottom:1px solid #ddd}\
header h1{margin:0}.caption{color:#666;margin:.25rem 0 0}\
aside{padding:1rem;background:#f6f7f9}aside label{display:block;margin-top:1rem;font-weight:600}\
aside select{width:100%}aside button{margin-top:1rem}\
main{padding:1rem 2rem;grid-column:2}\
.notice{padding:1rem;border-radius:6px}.info{background:#e8f1fb;color:#124}.warning{background:#fff4e0;color:#540}\
.metrics{display:flex;gap:2rem}.metric .label{color:#666}.metric .value{font-size:2rem}\
.tabs{display:flex;flex-wrap:wrap}.tabs>input{display:none}\
.tabs>label{padding:.5rem 1rem;cursor:pointer;border-bottom:2px solid transparent}\
.tabs>input:checked+label{border-color:#e44}\
.tab-panel{order:1;width:100%;display:none}.tabs>input:checked+label+.tab-panel{display:block}\
.axis{color:#666;margin:.5rem 0}\
table{border-collapse:collapse;width:100%}th,td{text-align:left;padding:.25rem .5rem;border-bottom:1px solid #eee}";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::anomaly::AnomalyType;
    use chrono::{TimeZone, Utc};

    fn record(city: &str, temp: f64, hour: u32, label: &str) -> AnomalyRecord {
        AnomalyRecord {
            city: city.to_string(),
            temperature_c: temp,
            wind_speed_kmh: 12.0,
            processed_at: Utc.with_ymd_and_hms(2026, 10, 18, hour, 0, 0).unwrap(),
            anomaly_type: label.parse::<AnomalyType>().expect("valid label"),
        }
    }

    fn dataset() -> Vec<AnomalyRecord> {
        vec![
            record("Tokyo", 38.2, 0, "High Temp"),
            record("Sydney", -7.0, 2, "Low Temp + High Wind"),
        ]
    }

    const REGISTRY: [&str; 3] = ["Tokyo", "Sydney", "Athens"];

    #[test]
    fn test_empty_dataset_shows_info_only() {
        let view = DashboardView::build(&[], REGISTRY, None);
        assert_eq!(view, DashboardView::Empty);

        let html = render_page(&view);
        assert!(html.contains(EMPTY_DATASET_MESSAGE));
        assert!(!html.contains("Total Anomalies"));
        assert!(!html.contains("<table"));
        assert!(!html.contains("chart-temperature"));
        assert!(!html.contains("<form"));
    }

    #[test]
    fn test_no_matches_shows_warning_only() {
        let view = DashboardView::build(&dataset(), REGISTRY, Some("city=Athens"));
        assert!(matches!(view, DashboardView::NoMatches { .. }));

        let html = render_page(&view);
        assert!(html.contains(NO_MATCHES_MESSAGE));
        assert!(html.contains("<form"));
        assert!(!html.contains("Total Anomalies"));
        assert!(!html.contains("<table"));
        assert!(!html.contains("chart-wind"));
    }

    #[test]
    fn test_populated_page() {
        let view = DashboardView::build(&dataset(), REGISTRY, None);
        let DashboardView::Populated { summary, records, .. } = &view else {
            panic!("expected populated view");
        };
        assert_eq!(summary.total, 2);
        assert_eq!(records.len(), 2);

        let html = render_page(&view);
        assert!(html.contains("Total Anomalies"));
        assert!(html.contains("Cities Affected"));
        assert!(html.contains("15.6 °C"));
        for id in ["chart-temperature", "chart-wind", "chart-types"] {
            assert!(html.contains(id), "missing {id}");
        }
        for header in TABLE_HEADERS {
            assert!(html.contains(&escape(header)), "missing {header}");
        }
        assert!(html.contains("View raw data"));
        assert!(html.contains("http-equiv=\"refresh\" content=\"600\""));
        // Registry city without data is still offered
        assert!(html.contains("<option value=\"Athens\""));
    }

    #[test]
    fn test_filtered_view_uses_selection() {
        let view = DashboardView::build(
            &dataset(),
            REGISTRY,
            Some("type=Low+Temp+%2B+High+Wind"),
        );
        let DashboardView::Populated { summary, type_counts, .. } = view else {
            panic!("expected populated view");
        };
        assert_eq!(summary.total, 1);
        assert_eq!(summary.mean_temperature_c, Some(-7.0));
        assert_eq!(type_counts.len(), 1);
        assert_eq!(type_counts[0].label, "Low Temp + High Wind");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }
}
