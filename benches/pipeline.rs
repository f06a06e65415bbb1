//! Benchmark for a full pipeline run

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use issue_insights::models::{ClientLookup, Selection};
use issue_insights::pipeline::{self, ingest};
use serde_json::json;

const ISSUES: usize = 5_000;

fn document() -> Vec<u8> {
    let start = Utc.with_ymd_and_hms(2023, 1, 1, 9, 0, 0).unwrap();
    let statuses = ["resolved", "inprogress", "unassigned"];
    let modules = ["Fees", "Exams", "Attendance", "Timetable", "Library"];

    let issues: Vec<_> = (0..ISSUES)
        .map(|i| {
            json!({
                "id": i,
                "module_name": modules[i % modules.len()],
                "reported_by": format!("user{}", i % 97),
                "reported_date": (start + Duration::hours(i as i64 * 3)).to_rfc3339(),
                "status": statuses[i % statuses.len()],
                "assigned_to": if i % 2 == 0 { "dev" } else { "" },
                "host": (i % 12) as i64,
                "additional_data": format!("{{\"user_id\": {}}}", i),
            })
        })
        .collect();

    serde_json::to_vec(&json!({ "issues": issues })).unwrap()
}

fn lookup() -> ClientLookup {
    (0..10).map(|h| (h, format!("school-{}", h))).collect()
}

fn bench_ingest(c: &mut Criterion) {
    let body = document();
    let mut group = c.benchmark_group("pipeline_ingest");
    group.throughput(Throughput::Elements(ISSUES as u64));

    group.bench_function("parse_document_5000", |b| {
        b.iter(|| black_box(ingest::parse_document(black_box(&body)).unwrap()));
    });

    group.finish();
}

fn bench_report(c: &mut Criterion) {
    let snapshot = ingest::parse_document(&document()).unwrap();
    let lookup = lookup();
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let mut group = c.benchmark_group("pipeline_report");
    group.throughput(Throughput::Elements(ISSUES as u64));

    group.bench_function("report_all_clients", |b| {
        b.iter(|| black_box(pipeline::run_pipeline(&snapshot, &lookup, &Selection::All, now)));
    });

    let selection = Selection::clients(["school-1", "school-2", "Unknown"]);
    group.bench_function("report_three_clients", |b| {
        b.iter(|| black_box(pipeline::run_pipeline(&snapshot, &lookup, &selection, now)));
    });

    group.finish();
}

criterion_group!(benches, bench_ingest, bench_report);
criterion_main!(benches);
