//! Performance benchmarks for triage queue estimation

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use triage_desk::service::{CheckInRequest, TriageService};
use triage_desk::store::InMemoryPatientStore;
use triage_desk::triage::{tier_for_pain, TriageQueueEstimator};
use triage_desk::types::{PatientRecord, PatientStatus};

fn waiting_room(size: usize) -> Vec<PatientRecord> {
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();

    (0..size)
        .map(|i| {
            let tier = tier_for_pain((i * 7 % 11) as f64);
            PatientRecord {
                id: i as i64,
                name: format!("patient_{}", i),
                injury_type: Some("fall".to_string()),
                pain_level: (i * 7 % 11) as i64,
                date_of_birth: None,
                gender: None,
                code: format!("{}", 1000 + i),
                priority_id: tier.priority_id().unwrap_or(0),
                approx_service_minutes: Some(10 + (i % 3) as u32 * 10),
                priority_tier: tier,
                // Arrivals out of order so the sort has work to do
                arrival_time: t0 + Duration::seconds(((i * 7919) % size) as i64),
                status: if i % 10 == 0 {
                    PatientStatus::Treated
                } else {
                    PatientStatus::Waiting
                },
                room_id: None,
            }
        })
        .collect()
}

fn bench_queue_estimation(c: &mut Criterion) {
    let estimator = TriageQueueEstimator::new();
    let mut group = c.benchmark_group("queue_estimation");

    for size in [10usize, 100, 1_000, 10_000] {
        let patients = waiting_room(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &patients, |b, patients| {
            b.iter(|| black_box(estimator.estimate(patients.clone())))
        });
    }

    group.finish();
}

fn bench_check_in_and_lookup(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("check_in_and_lookup", |b| {
        b.iter(|| {
            rt.block_on(async {
                let service = TriageService::new(Arc::new(InMemoryPatientStore::default()));

                for i in 0..20 {
                    let request = CheckInRequest {
                        name: format!("patient_{}", i),
                        injury_type: "fall".to_string(),
                        pain_score: (i % 11) as f64,
                        date_of_birth: None,
                        gender: None,
                        code: Some(format!("{}", 1000 + i)),
                    };
                    let _ = service.check_in(request).await;
                }

                black_box(service.lookup_status("patient_7", "1007").await)
            })
        })
    });
}

criterion_group!(benches, bench_queue_estimation, bench_check_in_and_lookup);
criterion_main!(benches);
