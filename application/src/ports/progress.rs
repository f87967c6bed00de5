//! Progress notification port
//!
//! Defines how a council run reports stage transitions.

use council_domain::StageEvent;

/// Receives [`StageEvent`]s while a run progresses
///
/// Implementations live in the presentation layer (console progress) and
/// the infrastructure layer (JSONL event log). Calls happen on the
/// orchestrating task and must not block for long.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &StageEvent);
}

/// No-op observer for when progress reporting is not needed
pub struct NoObserver;

impl PipelineObserver for NoObserver {
    fn on_event(&self, _event: &StageEvent) {}
}

/// An observer that forwards every event to several inner observers.
///
/// Uses borrowed references so both owned and borrowed observers can be
/// composed without wrapper types.
pub struct CompositeObserver<'a> {
    delegates: Vec<&'a dyn PipelineObserver>,
}

impl<'a> CompositeObserver<'a> {
    pub fn new(delegates: Vec<&'a dyn PipelineObserver>) -> Self {
        Self { delegates }
    }
}

impl PipelineObserver for CompositeObserver<'_> {
    fn on_event(&self, event: &StageEvent) {
        for d in &self.delegates {
            d.on_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::Stage;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl PipelineObserver for Recorder {
        fn on_event(&self, event: &StageEvent) {
            self.events.lock().unwrap().push(event.event_type().to_string());
        }
    }

    #[test]
    fn test_composite_forwards_to_all() {
        let a = Recorder::default();
        let b = Recorder::default();
        let composite = CompositeObserver::new(vec![&a, &b, &NoObserver]);
        composite.on_event(&StageEvent::StageStarted {
            stage: Stage::Execute,
            total_tasks: 2,
        });
        assert_eq!(a.events.lock().unwrap().len(), 1);
        assert_eq!(b.events.lock().unwrap().len(), 1);
    }
}
