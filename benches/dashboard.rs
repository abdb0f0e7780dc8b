use chrono::{TimeDelta, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use weather_anomalies::{
    filter_records, summarize, type_counts, AnomalyKind, AnomalyRecord, AnomalyType,
    DashboardView, FilterOptions, Selection,
};

const CITIES: [&str; 6] = ["New York", "Tokyo", "London", "Cairo", "Sydney", "Athens"];

fn synthetic_dataset(rows: usize) -> Vec<AnomalyRecord> {
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let kinds = [
        vec![AnomalyKind::HighTemp],
        vec![AnomalyKind::HighWind],
        vec![AnomalyKind::LowTemp, AnomalyKind::HighWind],
        vec![AnomalyKind::HighTemp, AnomalyKind::HighWind],
    ];
    (0..rows)
        .map(|i| AnomalyRecord {
            city: CITIES[i % CITIES.len()].to_string(),
            temperature_c: -10.0 + (i % 50) as f64,
            wind_speed_kmh: 20.0 + (i % 30) as f64,
            processed_at: start + TimeDelta::hours(6 * (i / CITIES.len()) as i64),
            anomaly_type: AnomalyType::from_kinds(kinds[i % kinds.len()].clone()).unwrap(),
        })
        .collect()
}

fn bench_dashboard(c: &mut Criterion) {
    let records = synthetic_dataset(10_000);
    let options = FilterOptions::from_records(&records, CITIES);
    let selection = Selection::from_query(Some("city=Tokyo&city=Cairo&city=Sydney"), &options);

    c.bench_function("filter_records", |b| {
        b.iter(|| filter_records(black_box(&records), black_box(&selection)))
    });
    c.bench_function("summarize", |b| b.iter(|| summarize(black_box(&records))));
    c.bench_function("type_counts", |b| b.iter(|| type_counts(black_box(&records))));
    c.bench_function("build_view", |b| {
        b.iter(|| DashboardView::build(black_box(&records), CITIES, Some("type=High+Temp")))
    });
}

criterion_group!(benches, bench_dashboard);
criterion_main!(benches);
