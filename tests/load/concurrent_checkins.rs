//! High concurrency stress tests for check-in and queue processing
//!
//! These tests validate that concurrent check-ins, lookups and treatments
//! keep the ranked queue consistent.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use triage_desk::service::{CheckInRequest, StatusOutcome, TriageService};
use triage_desk::store::InMemoryPatientStore;

fn check_in_request(i: usize) -> CheckInRequest {
    CheckInRequest {
        name: format!("load_test_patient_{}", i),
        injury_type: "fall".to_string(),
        // Spread pain across all three tiers
        pain_score: (i % 11) as f64,
        date_of_birth: None,
        gender: None,
        code: Some(format!("{}", 1000 + i)),
    }
}

fn create_load_test_service() -> Arc<TriageService> {
    Arc::new(TriageService::new(Arc::new(InMemoryPatientStore::default())))
}

#[tokio::test]
async fn test_200_concurrent_check_ins() {
    let service = create_load_test_service();
    let concurrent_requests = 200;

    let start_time = Instant::now();

    let handles: Vec<_> = (0..concurrent_requests)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move { service.check_in(check_in_request(i)).await })
        })
        .collect();

    let results = futures::future::join_all(handles).await;
    let duration = start_time.elapsed();

    let mut ids = HashSet::new();
    for result in results {
        match result {
            Ok(Ok(receipt)) => {
                ids.insert(receipt.patient_id);
            }
            Ok(Err(e)) => panic!("Check-in failed: {}", e),
            Err(e) => panic!("Task failed: {}", e),
        }
    }

    assert_eq!(ids.len(), concurrent_requests, "Patient ids must be unique");
    assert!(
        duration < Duration::from_secs(10),
        "200 check-ins should complete within 10 seconds, took: {:?}",
        duration
    );

    let queue = service.waiting_queue().await.unwrap();
    assert_eq!(queue.len(), concurrent_requests);
    for (i, pair) in queue.windows(2).enumerate() {
        assert_eq!(pair[0].position, i + 1);
        assert!(pair[0].patient.priority_tier.rank() <= pair[1].patient.priority_tier.rank());
        assert_eq!(
            pair[1].estimated_wait_minutes,
            pair[0].estimated_wait_minutes + pair[0].patient.service_minutes()
        );
    }

    let throughput = concurrent_requests as f64 / duration.as_secs_f64();
    println!(
        "✅ 200 concurrent check-ins passed - Throughput: {:.1} requests/sec",
        throughput
    );
}

#[tokio::test]
async fn test_concurrent_treatment_and_lookups() {
    let service = create_load_test_service();
    let patients = 100;

    let mut ids = Vec::new();
    for i in 0..patients {
        ids.push(service.check_in(check_in_request(i)).await.unwrap().patient_id);
    }

    // Treat every even id while other tasks look up status
    let treat_handles: Vec<_> = ids
        .iter()
        .copied()
        .filter(|id| id % 2 == 0)
        .map(|id| {
            let service = service.clone();
            tokio::spawn(async move { service.mark_treated(id).await })
        })
        .collect();

    let lookup_handles: Vec<_> = (0..patients)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .lookup_status(&format!("load_test_patient_{}", i), &format!("{}", 1000 + i))
                    .await
            })
        })
        .collect();

    for result in futures::future::join_all(treat_handles).await {
        result.unwrap().unwrap();
    }
    for result in futures::future::join_all(lookup_handles).await {
        let outcome = result.unwrap().unwrap();
        assert!(matches!(
            outcome,
            StatusOutcome::Waiting(_) | StatusOutcome::Treated { .. }
        ));
    }

    let queue = service.waiting_queue().await.unwrap();
    assert_eq!(queue.len(), patients / 2);
    assert!(queue.iter().all(|entry| entry.patient.id % 2 == 1));
    assert_eq!(queue[0].estimated_wait_minutes, 0);
}
