//! Ingest Loop
//!
//! read line -> pipeline.process, tuần tự, cho tới khi `stop` được set.
//! Timeout / skipped line / store failure: tiếp tục. Transport error (kể cả EOF): dừng.

use std::sync::atomic::{AtomicBool, Ordering};

use super::pipeline::{EnrichmentPipeline, ProcessOutcome, StatsSnapshot};
use super::store::ReadingStore;
use super::transport::{LineSource, TransportError};

/// Run until `stop` is set or the transport fails
pub fn run<S: ReadingStore>(
    source: &mut dyn LineSource,
    pipeline: &EnrichmentPipeline<S>,
    stop: &AtomicBool,
) -> Result<StatsSnapshot, TransportError> {
    while !stop.load(Ordering::SeqCst) {
        let line = match source.next_line()? {
            Some(line) => line,
            None => continue,
        };

        match pipeline.process(&line) {
            Ok(ProcessOutcome::Stored(doc)) => log::debug!("Stored reading {}", doc.id),
            Ok(ProcessOutcome::Skipped(reason)) => log::trace!("Skipped line: {}", reason),
            // no retry, the reading is lost
            Err(e) => log::error!("Store write failed: {}", e),
        }
    }

    log::info!("Stopped by user");
    Ok(pipeline.stats())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;

    use super::*;
    use crate::logic::features::FeatureVector;
    use crate::logic::model::inference::{Classifier, InferenceError, ModelOutput};
    use crate::logic::model::{LabelMap, RiskClassifier};
    use crate::logic::store::memory::MemoryReadingStore;

    struct NoPest;

    impl Classifier for NoPest {
        fn predict(&self, _features: &FeatureVector) -> Result<ModelOutput, InferenceError> {
            Ok(ModelOutput {
                label_index: 0,
                probabilities: Some(vec![0.9, 0.1]),
            })
        }
    }

    enum Step {
        Line(&'static str),
        Timeout,
        Fail,
        Eof,
    }

    /// Scripted source; raises the stop flag once the script runs out
    struct ScriptedSource<'a> {
        steps: VecDeque<Step>,
        stop: &'a AtomicBool,
    }

    impl LineSource for ScriptedSource<'_> {
        fn next_line(&mut self) -> Result<Option<String>, TransportError> {
            match self.steps.pop_front() {
                Some(Step::Line(line)) => Ok(Some(line.to_string())),
                Some(Step::Timeout) => Ok(None),
                Some(Step::Fail) => Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged").into()),
                Some(Step::Eof) => Err(TransportError::Closed),
                None => {
                    self.stop.store(true, Ordering::SeqCst);
                    Ok(None)
                }
            }
        }
    }

    fn pipeline() -> EnrichmentPipeline<MemoryReadingStore> {
        let classifier = RiskClassifier::new(Box::new(NoPest), LabelMap::from_labels(["No Pest", "Aphids"]));
        EnrichmentPipeline::new(classifier, MemoryReadingStore::new())
    }

    #[test]
    fn test_runs_until_stopped() {
        let stop = AtomicBool::new(false);
        let mut source = ScriptedSource {
            steps: VecDeque::from([
                Step::Line(r#"{"node":"Tomato","temp":24.5}"#),
                Step::Timeout,
                Step::Line("garbage-not-json"),
                Step::Line(r#"Received: {"node":"Corn","gas":80}"#),
            ]),
            stop: &stop,
        };
        let pipeline = pipeline();

        let stats = run(&mut source, &pipeline, &stop).unwrap();

        assert_eq!(stats.lines_seen, 3);
        assert_eq!(stats.stored, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(pipeline.store().len(), 2);
    }

    #[test]
    fn test_store_failure_does_not_stop_loop() {
        let stop = AtomicBool::new(false);
        let mut source = ScriptedSource {
            steps: VecDeque::from([Step::Line(r#"{"temp":1}"#), Step::Line(r#"{"temp":2}"#)]),
            stop: &stop,
        };
        let pipeline = pipeline();
        pipeline.store().set_unavailable(true);

        let stats = run(&mut source, &pipeline, &stop).unwrap();

        assert_eq!(stats.lines_seen, 2);
        assert_eq!(stats.store_failures, 2);
        assert_eq!(stats.stored, 0);
    }

    #[test]
    fn test_transport_error_ends_loop() {
        let stop = AtomicBool::new(false);
        let mut source = ScriptedSource {
            steps: VecDeque::from([Step::Line(r#"{"temp":1}"#), Step::Fail, Step::Line(r#"{"temp":2}"#)]),
            stop: &stop,
        };
        let pipeline = pipeline();

        let result = run(&mut source, &pipeline, &stop);

        assert!(matches!(result, Err(TransportError::Read(_))));
        assert_eq!(pipeline.store().len(), 1);
    }

    #[test]
    fn test_closed_port_ends_loop_without_spinning() {
        let stop = AtomicBool::new(false);
        let mut source = ScriptedSource {
            steps: VecDeque::from([Step::Line(r#"{"temp":1}"#), Step::Eof, Step::Line(r#"{"temp":2}"#)]),
            stop: &stop,
        };
        let pipeline = pipeline();

        let result = run(&mut source, &pipeline, &stop);

        assert!(matches!(result, Err(TransportError::Closed)));
        assert_eq!(pipeline.store().len(), 1);
        assert_eq!(source.steps.len(), 1);
        assert!(!stop.load(Ordering::SeqCst));
    }

    #[test]
    fn test_preset_stop_flag_reads_nothing() {
        let stop = AtomicBool::new(true);
        let mut source = ScriptedSource {
            steps: VecDeque::from([Step::Line(r#"{"temp":1}"#)]),
            stop: &stop,
        };
        let pipeline = pipeline();

        let stats = run(&mut source, &pipeline, &stop).unwrap();
        assert_eq!(stats.lines_seen, 0);
        assert_eq!(source.steps.len(), 1);
    }
}
