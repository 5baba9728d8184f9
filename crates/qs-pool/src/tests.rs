//! Unit tests for qs-pool.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use qs_core::{
    Client, ClientId, OverflowPolicy, RequestIdGenerator, ServiceTime, ServiceTimeModel, SimRng, SpecialistId,
};
use qs_queue::AdmissionBuffer;

use crate::{CompletionSink, Dispatcher, ServiceRecord, Specialist};

// ── Helpers ───────────────────────────────────────────────────────────────────

type Log = Arc<Mutex<Vec<ServiceRecord>>>;

fn constant(ms: u64) -> Arc<ServiceTime> {
    Arc::new(ServiceTime::Constant { ms })
}

fn lone_specialist(ms: u64) -> Specialist {
    Specialist::new(SpecialistId(0), 1.0, constant(ms))
}

/// `n` specialists with a constant service time, a capacity-8 buffer, and a
/// sink that records every completion.
fn pool(n: u32, ms: u64) -> (Dispatcher, Arc<AdmissionBuffer>, Log) {
    let buffer = Arc::new(AdmissionBuffer::new(8, OverflowPolicy::ReplaceNewest).unwrap());
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let sink: Arc<dyn CompletionSink> = {
        let log = Arc::clone(&log);
        Arc::new(move |r: &ServiceRecord| log.lock().push(r.clone()))
    };
    let specialists = (0..n).map(|i| Specialist::new(SpecialistId(i), 1.0, constant(ms))).collect();
    let d = Dispatcher::start(specialists, Arc::clone(&buffer), sink, &mut SimRng::new(7)).unwrap();
    (d, buffer, log)
}

/// Service-time model whose every sample panics.
#[derive(Debug)]
struct Exploding;

impl ServiceTimeModel for Exploding {
    fn sample(&self, _lambda: f64, _processed: u64, _rng: &mut SimRng) -> Duration {
        panic!("service-time model failed");
    }
}

/// Completion sink that panics on every record.
struct FailingSink;

impl CompletionSink for FailingSink {
    fn on_complete(&self, _record: &ServiceRecord) {
        panic!("completion sink failed");
    }
}

// ── Specialist ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod specialist {
    use qs_core::RequestStatus;

    use super::*;
    use crate::{PoolError, SpecialistState};

    #[test]
    fn starts_available_and_idle() {
        let s = lone_specialist(1);
        assert_eq!(s.state(), SpecialistState::Available);
        assert!(s.current_request().is_none());
        assert_eq!(s.processed_count(), 0);
    }

    #[test]
    fn take_request_marks_busy_and_processing() {
        let ids = RequestIdGenerator::new();
        let s = lone_specialist(1);
        let r = Client::new(ClientId(0)).submit(&ids);
        s.take_request(Arc::clone(&r)).unwrap();
        assert_eq!(s.state(), SpecialistState::Busy);
        assert_eq!(s.current_request(), Some(r.id));
        assert_eq!(r.status(), RequestStatus::Processing);
    }

    #[test]
    fn busy_specialist_refuses_and_returns_request() {
        let ids = RequestIdGenerator::new();
        let client = Client::new(ClientId(0));
        let s = lone_specialist(1);
        let first = client.submit(&ids);
        let second = client.submit(&ids);
        s.take_request(Arc::clone(&first)).unwrap();

        let err = s.take_request(Arc::clone(&second)).unwrap_err();
        assert!(matches!(err, PoolError::AlreadyBusy { .. }));
        assert_eq!(err.into_request().unwrap().id, second.id);
        // The held request is untouched.
        assert_eq!(s.current_request(), Some(first.id));
        assert_eq!(second.status(), qs_core::RequestStatus::New);
    }

    #[test]
    fn run_service_completes_and_frees() {
        let ids = RequestIdGenerator::new();
        let s = lone_specialist(5);
        let r = Client::new(ClientId(2)).submit(&ids);
        s.take_request(Arc::clone(&r)).unwrap();

        let record = s.run_service(&mut SimRng::new(1)).unwrap();
        assert_eq!(record.request, r.id);
        assert_eq!(record.client, ClientId(2));
        assert_eq!(record.work, Duration::from_millis(5));
        assert!(record.sojourn >= record.work);

        assert_eq!(r.status(), RequestStatus::Completed);
        assert_eq!(s.state(), SpecialistState::Available);
        assert!(s.current_request().is_none());
        let stats = s.stats();
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.last_work, Duration::from_millis(5));
        assert_eq!(stats.busy_total, Duration::from_millis(5));
    }

    #[test]
    fn run_service_on_empty_slot_is_an_error() {
        let s = lone_specialist(5);
        let err = s.run_service(&mut SimRng::new(1)).unwrap_err();
        assert!(matches!(err, PoolError::EmptySlot(SpecialistId(0))));
        assert_eq!(s.processed_count(), 0);
        assert_eq!(s.state(), SpecialistState::Available);
    }

    #[test]
    fn escalating_service_grows_with_processed() {
        let ids = RequestIdGenerator::new();
        let client = Client::new(ClientId(0));
        let s = Specialist::new(SpecialistId(0), 1.0, Arc::new(ServiceTime::Escalating { base_ms: 1.0 }));
        let mut rng = SimRng::new(3);
        let mut works = Vec::new();
        for _ in 0..3 {
            s.take_request(client.submit(&ids)).unwrap();
            works.push(s.run_service(&mut rng).unwrap().work);
        }
        // 1ms, e ms, e² ms
        let ms: Vec<f64> = works.iter().map(|w| w.as_secs_f64() * 1_000.0).collect();
        assert!((ms[0] - 1.0).abs() < 1e-6);
        assert!((ms[1] - std::f64::consts::E).abs() < 1e-6);
        assert!((ms[2] - std::f64::consts::E.powi(2)).abs() < 1e-6);
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod dispatcher {
    use qs_core::{RequestStatus, SpecialistGroup};

    use super::*;
    use crate::{NoopCompletion, PoolError};

    #[test]
    fn empty_pool_is_an_error() {
        let buffer = Arc::new(AdmissionBuffer::new(1, OverflowPolicy::ReplaceNewest).unwrap());
        let res = Dispatcher::start(Vec::new(), buffer, Arc::new(NoopCompletion), &mut SimRng::new(0));
        assert!(matches!(res, Err(PoolError::Empty)));
    }

    #[test]
    fn select_available_rotates() {
        let (d, _, _) = pool(3, 1);
        let picks: Vec<_> = (0..4).map(|_| d.select_available().unwrap().0).collect();
        assert_eq!(picks, vec![0, 1, 2, 0]);
        d.shutdown().unwrap();
    }

    #[test]
    fn claim_round_robin_then_all_busy() {
        let ids = RequestIdGenerator::new();
        let client = Client::new(ClientId(0));
        let (d, _, log) = pool(3, 80);

        let got: Vec<_> = (0..3).map(|_| d.claim(client.submit(&ids)).unwrap().0).collect();
        assert_eq!(got, vec![0, 1, 2]);
        assert!(!d.any_available());
        assert_eq!(d.busy_count(), 3);

        let extra = client.submit(&ids);
        let back = d.claim(Arc::clone(&extra)).unwrap_err();
        assert_eq!(back.id, extra.id);
        assert_eq!(extra.status(), RequestStatus::New);

        d.wait_idle();
        assert!(d.any_available());
        // Cursor wrapped back to the first specialist.
        assert_eq!(d.claim(extra).unwrap(), SpecialistId(0));
        d.shutdown().unwrap();
        assert_eq!(log.lock().len(), 4);
    }

    #[test]
    fn claim_removes_request_from_buffer() {
        let ids = RequestIdGenerator::new();
        let client = Client::new(ClientId(0));
        let (d, buffer, _) = pool(1, 1);
        let r = client.submit(&ids);
        buffer.add(Arc::clone(&r));
        assert_eq!(buffer.len(), 1);
        d.claim(r).unwrap();
        assert!(buffer.is_empty());
        d.shutdown().unwrap();
    }

    #[test]
    fn dispatch_to_busy_specialist_is_refused_and_counted() {
        let ids = RequestIdGenerator::new();
        let client = Client::new(ClientId(0));
        let (d, _, _) = pool(2, 80);

        let a = client.submit(&ids);
        let b = client.submit(&ids);
        d.dispatch(Arc::clone(&a), SpecialistId(1)).unwrap();
        let err = d.dispatch(Arc::clone(&b), SpecialistId(1)).unwrap_err();
        assert!(matches!(err, PoolError::AlreadyBusy { specialist: SpecialistId(1), .. }));
        assert_eq!(d.anomalies(), 1);
        assert_eq!(d.specialist(SpecialistId(1)).unwrap().current_request(), Some(a.id));

        // The refused request can still go elsewhere.
        d.dispatch(err.into_request().unwrap(), SpecialistId(0)).unwrap();
        d.wait_idle();
        assert_eq!(a.status(), RequestStatus::Completed);
        assert_eq!(b.status(), RequestStatus::Completed);
        d.shutdown().unwrap();
    }

    #[test]
    fn dispatch_unknown_specialist() {
        let ids = RequestIdGenerator::new();
        let (d, _, _) = pool(1, 1);
        let r = Client::new(ClientId(0)).submit(&ids);
        assert!(matches!(
            d.dispatch(r, SpecialistId(5)),
            Err(PoolError::UnknownSpecialist(SpecialistId(5)))
        ));
        d.shutdown().unwrap();
    }

    #[test]
    fn concurrent_claims_never_double_assign() {
        let ids = Arc::new(RequestIdGenerator::new());
        let (d, _, log) = pool(3, 1);
        let d = Arc::new(d);

        let claimers: Vec<_> = (0..4)
            .map(|c| {
                let d = Arc::clone(&d);
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || {
                    let client = Client::new(ClientId(c));
                    let mut placed = 0u64;
                    for _ in 0..100 {
                        if d.claim(client.submit(&ids)).is_ok() {
                            placed += 1;
                        }
                    }
                    placed
                })
            })
            .collect();
        let placed: u64 = claimers.into_iter().map(|h| h.join().unwrap()).sum();
        d.wait_idle();
        d.shutdown().unwrap();

        let processed: u64 = d.stats().iter().map(|s| s.processed).sum();
        assert_eq!(processed, placed);
        assert_eq!(log.lock().len() as u64, placed);
        assert_eq!(d.anomalies(), 0);
        // Each request completed exactly once.
        let mut seen: Vec<_> = log.lock().iter().map(|r| r.request).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len() as u64, placed);
    }

    #[test]
    fn shutdown_finishes_in_flight_and_refuses_new_work() {
        let ids = RequestIdGenerator::new();
        let client = Client::new(ClientId(0));
        let (d, _, log) = pool(1, 30);
        let r = client.submit(&ids);
        d.claim(Arc::clone(&r)).unwrap();

        d.shutdown().unwrap();
        assert_eq!(r.status(), RequestStatus::Completed);
        assert_eq!(log.lock().len(), 1);

        let late = client.submit(&ids);
        assert!(d.claim(Arc::clone(&late)).is_err());
        assert!(matches!(d.dispatch(late, SpecialistId(0)), Err(PoolError::Closed { .. })));
        // Second shutdown is a no-op.
        d.shutdown().unwrap();
    }

    #[test]
    fn from_groups_assigns_dense_ids() {
        let buffer = Arc::new(AdmissionBuffer::new(1, OverflowPolicy::ReplaceNewest).unwrap());
        let groups = vec![
            SpecialistGroup::new(2, 1.901, ServiceTime::Exponential),
            SpecialistGroup::new(1, 1.005, ServiceTime::Constant { ms: 1 }),
        ];
        let d = Dispatcher::from_groups(&groups, buffer, Arc::new(NoopCompletion), &mut SimRng::new(0)).unwrap();
        let stats = d.stats();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats.iter().map(|s| s.id.0).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(stats[1].lambda, 1.901);
        assert_eq!(stats[2].lambda, 1.005);
        d.shutdown().unwrap();
    }

    #[test]
    fn completion_is_recorded_before_wait_idle_returns() {
        let ids = RequestIdGenerator::new();
        let buffer = Arc::new(AdmissionBuffer::new(1, OverflowPolicy::ReplaceNewest).unwrap());
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let sink: Arc<dyn CompletionSink> = {
            let log = Arc::clone(&log);
            Arc::new(move |r: &ServiceRecord| {
                std::thread::sleep(Duration::from_millis(40));
                log.lock().push(r.clone());
            })
        };
        let d = Dispatcher::start(vec![lone_specialist(1)], buffer, sink, &mut SimRng::new(0)).unwrap();

        d.claim(Client::new(ClientId(0)).submit(&ids)).unwrap();
        d.wait_idle();
        assert_eq!(log.lock().len(), 1);
        d.shutdown().unwrap();
    }

    #[test]
    fn panicking_service_model_closes_specialist() {
        let ids = RequestIdGenerator::new();
        let client = Client::new(ClientId(0));
        let buffer = Arc::new(AdmissionBuffer::new(1, OverflowPolicy::ReplaceNewest).unwrap());
        let specialists = vec![
            Specialist::new(SpecialistId(0), 1.0, Arc::new(Exploding)),
            Specialist::new(SpecialistId(1), 1.0, constant(1)),
        ];
        let d = Dispatcher::start(specialists, buffer, Arc::new(NoopCompletion), &mut SimRng::new(0)).unwrap();

        let doomed = client.submit(&ids);
        assert_eq!(d.claim(Arc::clone(&doomed)).unwrap(), SpecialistId(0));
        d.wait_idle();
        assert_eq!(doomed.status(), RequestStatus::Dropped);
        assert_eq!(d.anomalies(), 1);

        // The dead specialist is skipped from now on.
        let next = client.submit(&ids);
        assert_eq!(d.claim(Arc::clone(&next)).unwrap(), SpecialistId(1));
        d.wait_idle();
        assert_eq!(next.status(), RequestStatus::Completed);
        let retry = client.submit(&ids);
        assert_eq!(d.claim(retry).unwrap(), SpecialistId(1));

        assert!(matches!(d.shutdown(), Err(PoolError::WorkerPanicked(SpecialistId(0)))));
    }

    #[test]
    fn panicking_sink_releases_specialist() {
        let ids = RequestIdGenerator::new();
        let buffer = Arc::new(AdmissionBuffer::new(1, OverflowPolicy::ReplaceNewest).unwrap());
        let d = Dispatcher::start(vec![lone_specialist(1)], buffer, Arc::new(FailingSink), &mut SimRng::new(0)).unwrap();

        let r = Client::new(ClientId(0)).submit(&ids);
        d.claim(Arc::clone(&r)).unwrap();
        d.wait_idle();
        assert_eq!(r.status(), RequestStatus::Completed);
        assert!(d.specialist(SpecialistId(0)).unwrap().current_request().is_none());

        let late = Client::new(ClientId(0)).submit(&ids);
        assert!(d.claim(late).is_err());
        assert!(matches!(d.shutdown(), Err(PoolError::WorkerPanicked(SpecialistId(0)))));
    }
}
