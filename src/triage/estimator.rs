//! Triage queue ordering and wait estimation
//!
//! The waiting set is ranked by priority tier and then by arrival time, and each
//! patient is annotated with the service minutes of everyone ahead of them.
//! Nothing is persisted: the ranking is rebuilt from a fresh snapshot on every query.

use crate::types::{PatientId, PatientRecord, PriorityTier, RankedPatient};
use serde::{Deserialize, Serialize};

/// Orders waiting patients and projects their wait in minutes
#[derive(Debug, Clone, Copy, Default)]
pub struct TriageQueueEstimator;

impl TriageQueueEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Rank the waiting records in `patients`.
    ///
    /// Records that are not waiting are dropped. The sort is stable, so patients
    /// with the same tier and arrival time keep their input order.
    pub fn estimate(&self, patients: Vec<PatientRecord>) -> Vec<RankedPatient> {
        let mut waiting: Vec<PatientRecord> =
            patients.into_iter().filter(|p| p.is_waiting()).collect();

        waiting.sort_by_key(|p| (p.priority_tier.rank(), p.arrival_time));

        let mut accumulated: u64 = 0;
        waiting
            .into_iter()
            .enumerate()
            .map(|(index, patient)| {
                let estimated_wait_minutes = accumulated;
                accumulated = accumulated.saturating_add(patient.service_minutes());

                RankedPatient {
                    patient,
                    position: index + 1,
                    estimated_wait_minutes,
                }
            })
            .collect()
    }
}

/// Find one patient's entry in a ranked queue
pub fn locate(ranked: &[RankedPatient], id: PatientId) -> Option<&RankedPatient> {
    ranked.iter().find(|entry| entry.patient.id == id)
}

/// Summary of a ranked queue for health reporting and metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub waiting: usize,
    pub critical: usize,
    pub urgent: usize,
    pub non_urgent: usize,
    pub unrecognized: usize,
    /// Minutes until the whole current queue is seen
    pub total_projected_minutes: u64,
    /// Projected wait of the last patient in line
    pub longest_wait_minutes: u64,
}

impl QueueSnapshot {
    pub fn from_ranked(ranked: &[RankedPatient]) -> Self {
        let mut snapshot = QueueSnapshot {
            waiting: ranked.len(),
            ..Default::default()
        };

        for entry in ranked {
            match entry.patient.priority_tier {
                PriorityTier::Critical => snapshot.critical += 1,
                PriorityTier::Urgent => snapshot.urgent += 1,
                PriorityTier::NonUrgent => snapshot.non_urgent += 1,
                PriorityTier::Unrecognized(_) => snapshot.unrecognized += 1,
            }
        }

        if let Some(last) = ranked.last() {
            snapshot.longest_wait_minutes = last.estimated_wait_minutes;
            snapshot.total_projected_minutes = last
                .estimated_wait_minutes
                .saturating_add(last.patient.service_minutes());
        }

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PatientStatus;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn record(
        id: i64,
        tier: PriorityTier,
        arrival: DateTime<Utc>,
        minutes: Option<u32>,
    ) -> PatientRecord {
        PatientRecord {
            id,
            name: format!("patient-{}", id),
            injury_type: Some("sprain".to_string()),
            pain_level: 5,
            date_of_birth: None,
            gender: None,
            code: format!("{}", 1000 + id),
            priority_id: tier.priority_id().unwrap_or(0),
            priority_tier: tier,
            approx_service_minutes: minutes,
            arrival_time: arrival,
            status: PatientStatus::Waiting,
            room_id: None,
        }
    }

    fn ids(ranked: &[RankedPatient]) -> Vec<i64> {
        ranked.iter().map(|r| r.patient.id).collect()
    }

    fn waits(ranked: &[RankedPatient]) -> Vec<u64> {
        ranked.iter().map(|r| r.estimated_wait_minutes).collect()
    }

    #[test]
    fn test_reference_example() {
        let patients = vec![
            record(1, PriorityTier::Urgent, t0(), Some(15)),
            record(2, PriorityTier::Critical, t0() + Duration::minutes(1), Some(5)),
            record(3, PriorityTier::Urgent, t0() + Duration::minutes(2), Some(10)),
        ];

        let ranked = TriageQueueEstimator::new().estimate(patients);

        assert_eq!(ids(&ranked), vec![2, 1, 3]);
        assert_eq!(waits(&ranked), vec![0, 5, 20]);
        assert_eq!(
            ranked.iter().map(|r| r.position).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_empty_queue() {
        assert!(TriageQueueEstimator::new().estimate(Vec::new()).is_empty());
    }

    #[test]
    fn test_missing_service_minutes_count_as_zero() {
        let patients = vec![
            record(1, PriorityTier::Critical, t0(), None),
            record(2, PriorityTier::Critical, t0() + Duration::minutes(1), Some(0)),
            record(3, PriorityTier::Critical, t0() + Duration::minutes(2), Some(7)),
        ];

        let ranked = TriageQueueEstimator::new().estimate(patients);
        assert_eq!(waits(&ranked), vec![0, 0, 0]);
        assert_eq!(ranked[2].position, 3);
    }

    #[test]
    fn test_unrecognized_tier_sorts_last() {
        let patients = vec![
            record(1, PriorityTier::Unrecognized("resus".into()), t0(), Some(3)),
            record(2, PriorityTier::NonUrgent, t0() + Duration::hours(2), Some(10)),
        ];

        let ranked = TriageQueueEstimator::new().estimate(patients);
        assert_eq!(ids(&ranked), vec![2, 1]);
        assert_eq!(waits(&ranked), vec![0, 10]);
    }

    #[test]
    fn test_treated_patients_are_not_ranked() {
        let mut treated = record(1, PriorityTier::Critical, t0(), Some(30));
        treated.status = PatientStatus::Treated;
        let patients = vec![
            treated,
            record(2, PriorityTier::Urgent, t0() + Duration::minutes(5), Some(20)),
        ];

        let ranked = TriageQueueEstimator::new().estimate(patients);
        assert_eq!(ids(&ranked), vec![2]);
        assert_eq!(ranked[0].estimated_wait_minutes, 0);
    }

    #[test]
    fn test_equal_keys_keep_input_order() {
        let patients = vec![
            record(9, PriorityTier::Urgent, t0(), Some(10)),
            record(4, PriorityTier::Urgent, t0(), Some(10)),
            record(7, PriorityTier::Urgent, t0(), Some(10)),
        ];

        let ranked = TriageQueueEstimator::new().estimate(patients);
        assert_eq!(ids(&ranked), vec![9, 4, 7]);
    }

    #[test]
    fn test_locate() {
        let ranked = TriageQueueEstimator::new().estimate(vec![
            record(1, PriorityTier::NonUrgent, t0(), Some(10)),
            record(2, PriorityTier::Critical, t0(), Some(30)),
        ]);

        let found = locate(&ranked, 1).unwrap();
        assert_eq!(found.position, 2);
        assert_eq!(found.estimated_wait_minutes, 30);
        assert!(locate(&ranked, 99).is_none());
    }

    #[test]
    fn test_snapshot() {
        let ranked = TriageQueueEstimator::new().estimate(vec![
            record(1, PriorityTier::NonUrgent, t0(), Some(10)),
            record(2, PriorityTier::Critical, t0(), Some(30)),
            record(3, PriorityTier::Urgent, t0(), Some(20)),
            record(4, PriorityTier::Unrecognized("x".into()), t0(), None),
        ]);

        let snapshot = QueueSnapshot::from_ranked(&ranked);
        assert_eq!(snapshot.waiting, 4);
        assert_eq!(snapshot.critical, 1);
        assert_eq!(snapshot.urgent, 1);
        assert_eq!(snapshot.non_urgent, 1);
        assert_eq!(snapshot.unrecognized, 1);
        assert_eq!(snapshot.longest_wait_minutes, 60);
        assert_eq!(snapshot.total_projected_minutes, 60);

        assert_eq!(QueueSnapshot::from_ranked(&[]), QueueSnapshot::default());
    }

    fn tier_strategy() -> impl Strategy<Value = PriorityTier> {
        prop_oneof![
            Just(PriorityTier::Critical),
            Just(PriorityTier::Urgent),
            Just(PriorityTier::NonUrgent),
            Just(PriorityTier::Unrecognized("other".to_string())),
        ]
    }

    fn patients_strategy() -> impl Strategy<Value = Vec<PatientRecord>> {
        prop::collection::vec(
            (
                tier_strategy(),
                0i64..20,
                prop::option::of(0u32..60),
                any::<bool>(),
            ),
            0..40,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (tier, offset, minutes, treated))| {
                    let mut p = record(i as i64, tier, t0() + Duration::minutes(offset), minutes);
                    if treated {
                        p.status = PatientStatus::Treated;
                    }
                    p
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_waits_accumulate(patients in patients_strategy()) {
            let waiting = patients.iter().filter(|p| p.is_waiting()).count();
            let ranked = TriageQueueEstimator::new().estimate(patients);

            prop_assert_eq!(ranked.len(), waiting);
            if let Some(first) = ranked.first() {
                prop_assert_eq!(first.estimated_wait_minutes, 0);
            }
            for (i, pair) in ranked.windows(2).enumerate() {
                prop_assert_eq!(pair[0].position, i + 1);
                prop_assert_eq!(
                    pair[1].estimated_wait_minutes,
                    pair[0].estimated_wait_minutes + pair[0].patient.service_minutes()
                );
            }
        }

        #[test]
        fn prop_order_is_tier_then_arrival_then_input(patients in patients_strategy()) {
            let ranked = TriageQueueEstimator::new().estimate(patients);

            for pair in ranked.windows(2) {
                let (a, b) = (&pair[0].patient, &pair[1].patient);
                prop_assert!(a.priority_tier.rank() <= b.priority_tier.rank());
                if a.priority_tier.rank() == b.priority_tier.rank() {
                    prop_assert!(a.arrival_time <= b.arrival_time);
                    if a.arrival_time == b.arrival_time {
                        // ids were assigned in input order
                        prop_assert!(a.id < b.id);
                    }
                }
                prop_assert!(a.is_waiting());
            }
        }
    }
}
