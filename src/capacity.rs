use std::sync::{Condvar, Mutex};

/// Advisory bound on the number of edges in flight between the workers and
/// the writer.
///
/// Producers claim their batch size before generating and the writer releases
/// it after serializing, so aggregate buffered edges stay under the ceiling.
pub struct CapacityGate {
    ceiling: i64,
    in_flight: Mutex<i64>,
    drained: Condvar,
}

impl CapacityGate {
    pub fn new(ceiling: u64) -> Self {
        CapacityGate {
            ceiling: ceiling as i64,
            in_flight: Mutex::new(0),
            drained: Condvar::new(),
        }
    }

    /// Block until `amount` more edges fit under the ceiling, then claim
    /// them. A claim that alone exceeds the ceiling is admitted once nothing
    /// else is in flight, so one oversized batch cannot wedge the pipeline.
    pub fn accumulate(&self, amount: u64) {
        let amount = amount as i64;
        let mut held = self.in_flight.lock().expect("capacity gate poisoned");
        while *held + amount >= self.ceiling && *held != 0 {
            held = self.drained.wait(held).expect("capacity gate poisoned");
        }
        *held += amount;
    }

    /// Release `amount` edges and wake every blocked producer.
    pub fn dissipate(&self, amount: u64) {
        {
            let mut held = self.in_flight.lock().expect("capacity gate poisoned");
            *held -= amount as i64;
        }
        self.drained.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_claims_within_ceiling_pass_straight_through() {
        let gate = CapacityGate::new(100);
        gate.accumulate(40);
        gate.accumulate(30);
        gate.dissipate(70);
    }

    #[test]
    fn test_oversized_claim_admitted_when_idle() {
        let gate = CapacityGate::new(10);
        // Larger than the ceiling; must not block with nothing in flight.
        gate.accumulate(50);
        gate.dissipate(50);
    }

    #[test]
    fn test_blocked_producer_resumes_after_drain() {
        let gate = Arc::new(CapacityGate::new(100));
        let resumed = Arc::new(AtomicBool::new(false));

        gate.accumulate(80);

        let waiter = {
            let gate = Arc::clone(&gate);
            let resumed = Arc::clone(&resumed);
            thread::spawn(move || {
                gate.accumulate(60);
                resumed.store(true, Ordering::SeqCst);
                gate.dissipate(60);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!resumed.load(Ordering::SeqCst));

        gate.dissipate(80);
        waiter.join().unwrap();
        assert!(resumed.load(Ordering::SeqCst));
    }
}
