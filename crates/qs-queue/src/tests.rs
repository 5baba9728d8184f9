//! Unit tests for qs-queue.

use qs_core::OverflowPolicy;

use crate::{Admission, RingBuffer};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn ring(cap: usize) -> RingBuffer<u32> {
    RingBuffer::new(cap).unwrap()
}

fn drain(r: &mut RingBuffer<u32>) -> Vec<u32> {
    std::iter::from_fn(|| r.pop()).collect()
}

// ── RingBuffer ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod ring_basics {
    use super::*;

    #[test]
    fn zero_capacity_rejected() {
        assert!(RingBuffer::<u32>::new(0).is_err());
    }

    #[test]
    fn new_ring_is_empty() {
        let r = ring(3);
        assert!(r.is_empty());
        assert!(!r.is_full());
        assert_eq!(r.len(), 0);
        assert!(r.front().is_none());
    }

    #[test]
    fn pop_empty_is_none() {
        let mut r = ring(2);
        assert_eq!(r.pop(), None);
    }

    #[test]
    fn fifo_without_overflow() {
        let mut r = ring(4);
        for i in 1..=4 {
            assert!(r.push(i, OverflowPolicy::ReplaceNewest).is_enqueued());
        }
        assert!(r.is_full());
        assert_eq!(drain(&mut r), vec![1, 2, 3, 4]);
        assert!(r.is_empty());
    }

    #[test]
    fn fifo_across_wraparound() {
        let mut r = ring(3);
        r.push(1, OverflowPolicy::ReplaceNewest);
        r.push(2, OverflowPolicy::ReplaceNewest);
        assert_eq!(r.pop(), Some(1));
        r.push(3, OverflowPolicy::ReplaceNewest);
        r.push(4, OverflowPolicy::ReplaceNewest); // wraps into slot 0
        assert!(r.is_full());
        assert_eq!(r.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(drain(&mut r), vec![2, 3, 4]);
    }

    #[test]
    fn full_and_empty_never_both_true() {
        // Deterministic pseudo-random walk over push/pop.
        let mut rng = qs_core::SimRng::new(99);
        for cap in 1..=5 {
            let mut r = ring(cap);
            for step in 0..2_000u32 {
                if rng.gen_range(0..3) == 0 {
                    r.pop();
                } else {
                    r.push(step, OverflowPolicy::ReplaceNewest);
                }
                assert!(!(r.is_full() && r.is_empty()));
                assert!(r.len() <= cap);
                assert_eq!(r.iter().count(), r.len());
            }
        }
    }
}

#[cfg(test)]
mod overflow {
    use super::*;

    #[test]
    fn replace_newest_keeps_oldest_at_front() {
        // Capacity 2 holding A, B; adding C displaces B.
        let mut r = ring(2);
        r.push(b'A' as u32, OverflowPolicy::ReplaceNewest);
        r.push(b'B' as u32, OverflowPolicy::ReplaceNewest);
        let outcome = r.push(b'C' as u32, OverflowPolicy::ReplaceNewest);
        assert_eq!(outcome, Admission::Displaced(b'B' as u32));
        assert!(r.is_full());
        assert_eq!(r.len(), 2);
        assert_eq!(drain(&mut r), vec![b'A' as u32, b'C' as u32]);
    }

    #[test]
    fn replace_newest_repeatedly_overwrites_same_slot() {
        let mut r = ring(3);
        for i in 1..=3 {
            r.push(i, OverflowPolicy::ReplaceNewest);
        }
        assert_eq!(r.push(4, OverflowPolicy::ReplaceNewest), Admission::Displaced(3));
        assert_eq!(r.push(5, OverflowPolicy::ReplaceNewest), Admission::Displaced(4));
        assert_eq!(drain(&mut r), vec![1, 2, 5]);
    }

    #[test]
    fn replace_newest_capacity_one() {
        let mut r = ring(1);
        assert!(r.push(2, OverflowPolicy::ReplaceNewest).is_enqueued());
        assert_eq!(r.push(3, OverflowPolicy::ReplaceNewest), Admission::Displaced(2));
        assert_eq!(drain(&mut r), vec![3]);
    }

    #[test]
    fn evict_oldest_drops_front() {
        let mut r = ring(2);
        r.push(1, OverflowPolicy::EvictOldest);
        r.push(2, OverflowPolicy::EvictOldest);
        assert_eq!(r.push(3, OverflowPolicy::EvictOldest), Admission::Displaced(1));
        assert!(r.is_full());
        assert_eq!(drain(&mut r), vec![2, 3]);
    }

    #[test]
    fn reject_incoming_leaves_ring_untouched() {
        let mut r = ring(2);
        r.push(1, OverflowPolicy::RejectIncoming);
        r.push(2, OverflowPolicy::RejectIncoming);
        let outcome = r.push(3, OverflowPolicy::RejectIncoming);
        assert_eq!(outcome, Admission::Refused(3));
        assert_eq!(outcome.lost(), Some(&3));
        assert_eq!(drain(&mut r), vec![1, 2]);
    }
}

#[cfg(test)]
mod removal {
    use super::*;

    #[test]
    fn remove_middle_preserves_order() {
        let mut r = ring(4);
        for i in 1..=3 {
            r.push(i, OverflowPolicy::ReplaceNewest);
        }
        assert_eq!(r.remove_where(|&x| x == 2), Some(2));
        assert_eq!(r.len(), 2);
        r.push(4, OverflowPolicy::ReplaceNewest);
        assert_eq!(drain(&mut r), vec![1, 3, 4]);
    }

    #[test]
    fn remove_from_full_ring_clears_full() {
        let mut r = ring(3);
        for i in 1..=3 {
            r.push(i, OverflowPolicy::ReplaceNewest);
        }
        assert_eq!(r.remove_where(|&x| x == 1), Some(1));
        assert!(!r.is_full());
        assert_eq!(r.len(), 2);
        assert!(r.push(4, OverflowPolicy::ReplaceNewest).is_enqueued());
        assert_eq!(drain(&mut r), vec![2, 3, 4]);
    }

    #[test]
    fn remove_across_wraparound() {
        let mut r = ring(3);
        r.push(1, OverflowPolicy::ReplaceNewest);
        r.push(2, OverflowPolicy::ReplaceNewest);
        r.pop();
        r.pop();
        // tail = head = 2; next writes land in slots 2, 0, 1.
        r.push(3, OverflowPolicy::ReplaceNewest);
        r.push(4, OverflowPolicy::ReplaceNewest);
        r.push(5, OverflowPolicy::ReplaceNewest);
        assert_eq!(r.remove_where(|&x| x == 4), Some(4));
        assert_eq!(drain(&mut r), vec![3, 5]);
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut r = ring(2);
        r.push(1, OverflowPolicy::ReplaceNewest);
        assert_eq!(r.remove_where(|&x| x == 9), None);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn remove_only_entry_empties_ring() {
        let mut r = ring(1);
        r.push(7, OverflowPolicy::ReplaceNewest);
        assert_eq!(r.remove_where(|&x| x == 7), Some(7));
        assert!(r.is_empty());
        assert!(!r.is_full());
    }
}

// ── AdmissionBuffer ───────────────────────────────────────────────────────────

#[cfg(test)]
mod admission_buffer {
    use std::sync::Arc;
    use std::thread;

    use qs_core::{Client, ClientId, OverflowPolicy, RequestIdGenerator, RequestStatus};

    use crate::{Admission, AdmissionBuffer};

    fn buffer(cap: usize, policy: OverflowPolicy) -> AdmissionBuffer {
        AdmissionBuffer::new(cap, policy).unwrap()
    }

    #[test]
    fn add_marks_queued_and_displacement_marks_dropped() {
        let ids = RequestIdGenerator::new();
        let client = Client::new(ClientId(0));
        let buf = buffer(1, OverflowPolicy::ReplaceNewest);

        let a = client.submit(&ids);
        let b = client.submit(&ids);
        assert!(buf.add(Arc::clone(&a)).is_enqueued());
        assert_eq!(a.status(), RequestStatus::Queued);

        match buf.add(Arc::clone(&b)) {
            Admission::Displaced(victim) => assert_eq!(victim.id, a.id),
            other => panic!("expected displacement, got {other:?}"),
        }
        assert_eq!(a.status(), RequestStatus::Dropped);
        assert_eq!(b.status(), RequestStatus::Queued);
        assert_eq!(buf.contents(), vec![b.id]);
    }

    #[test]
    fn refused_newcomer_is_dropped() {
        let ids = RequestIdGenerator::new();
        let client = Client::new(ClientId(0));
        let buf = buffer(1, OverflowPolicy::RejectIncoming);
        let a = client.submit(&ids);
        let b = client.submit(&ids);
        buf.add(Arc::clone(&a));
        assert!(matches!(buf.add(Arc::clone(&b)), Admission::Refused(_)));
        assert_eq!(a.status(), RequestStatus::Queued);
        assert_eq!(b.status(), RequestStatus::Dropped);
    }

    #[test]
    fn remove_by_id() {
        let ids = RequestIdGenerator::new();
        let client = Client::new(ClientId(1));
        let buf = buffer(3, OverflowPolicy::ReplaceNewest);
        let reqs: Vec<_> = (0..3).map(|_| client.submit(&ids)).collect();
        for r in &reqs {
            buf.add(Arc::clone(r));
        }
        assert!(buf.remove(reqs[1].id).is_some());
        assert!(buf.remove(reqs[1].id).is_none());
        assert_eq!(buf.contents(), vec![reqs[0].id, reqs[2].id]);
        assert_eq!(buf.next().unwrap().id, reqs[0].id);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn concurrent_adds_and_nexts_respect_capacity() {
        let ids = Arc::new(RequestIdGenerator::new());
        let buf = Arc::new(buffer(4, OverflowPolicy::ReplaceNewest));

        let producers: Vec<_> = (0..3)
            .map(|c| {
                let ids = Arc::clone(&ids);
                let buf = Arc::clone(&buf);
                thread::spawn(move || {
                    let client = Client::new(ClientId(c));
                    let mut lost = 0;
                    for _ in 0..200 {
                        if !buf.add(client.submit(&ids)).is_enqueued() {
                            lost += 1;
                        }
                        assert!(buf.len() <= 4);
                    }
                    lost
                })
            })
            .collect();
        let consumer = {
            let buf = Arc::clone(&buf);
            thread::spawn(move || {
                let mut taken = 0;
                for _ in 0..400 {
                    if buf.next().is_some() {
                        taken += 1;
                    }
                }
                taken
            })
        };

        let lost: usize = producers.into_iter().map(|h| h.join().unwrap()).sum();
        let taken = consumer.join().unwrap();
        // Every request is accounted for exactly once.
        assert_eq!(lost + taken + buf.len(), 600);
        assert!(!(buf.is_full() && buf.is_empty()));
    }
}
