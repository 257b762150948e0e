use std::sync::{Arc, Mutex, MutexGuard};

/// Allows at most one AI breakdown at a time, remembering which task it is
/// running for.
#[derive(Debug, Default)]
pub struct BreakdownGuard {
    in_flight: Mutex<Option<String>>,
}

/// Held while a breakdown runs; releases the guard on drop.
#[derive(Debug)]
pub struct BreakdownTicket {
    guard: Arc<BreakdownGuard>,
}

impl BreakdownGuard {
    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Id of the task currently being analyzed.
    pub fn current(&self) -> Option<String> {
        self.slot().clone()
    }

    pub fn try_begin(self: &Arc<Self>, task_id: &str) -> Option<BreakdownTicket> {
        let mut slot = self.slot();
        if slot.is_some() {
            return None;
        }
        *slot = Some(task_id.to_string());
        Some(BreakdownTicket {
            guard: Arc::clone(self),
        })
    }
}

impl Drop for BreakdownTicket {
    fn drop(&mut self) {
        *self.guard.slot() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_breakdown_runs_at_a_time() {
        let guard = Arc::new(BreakdownGuard::default());

        let ticket = guard.try_begin("a").expect("first breakdown starts");
        assert_eq!(guard.current().as_deref(), Some("a"));
        assert!(guard.try_begin("b").is_none());

        drop(ticket);
        assert_eq!(guard.current(), None);
        assert!(guard.try_begin("b").is_some());
    }
}
