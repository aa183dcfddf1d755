//! Full-resolution batch denoising over a slice range.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::backend::ComputeContext;
use crate::events::DeliveryEvent;
use crate::image::{ImageStack, PixelBuffer, SliceRange};
use crate::params::DenoiseParams;
use crate::queue::ExecutionQueue;
use crate::source::SliceSource;

/// Cooperative cancellation flag, checked between slices. Once a slice's
/// compute has started it runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Denoise `range` of `source` slice by slice on a driver thread.
///
/// Every slice goes through the shared execution queue under the same backend
/// contract as the previews, so batch and preview work stays totally ordered.
/// Progress is published per slice as its 1-based position. Any per-slice
/// failure aborts the whole job and discards the accumulated output; nothing
/// partial is ever delivered. On success the output slices are assembled in
/// source order into a stack titled `"<source> [<algorithm>]"`.
pub fn run_batch(
    queue: Arc<ExecutionQueue<ComputeContext>>,
    events: Sender<DeliveryEvent>,
    source: Arc<dyn SliceSource>,
    params: DenoiseParams,
    range: SliceRange,
    cancel: CancelFlag,
) -> JoinHandle<()> {
    thread::spawn(move || {
        if range.last() > source.slice_count() {
            let _ = events.send(DeliveryEvent::BatchFailed {
                message: format!(
                    "slice range [{}, {}] exceeds source with {} slices",
                    range.first(),
                    range.last(),
                    source.slice_count()
                ),
            });
            return;
        }

        info!(
            first = range.first(),
            last = range.last(),
            algorithm = params.algorithm().readable_name(),
            "starting batch denoise"
        );
        let _ = events.send(DeliveryEvent::BatchStarted { total: range.len() });

        let mut outputs: Vec<PixelBuffer> = Vec::with_capacity(range.len());
        for slice_number in range.iter() {
            if cancel.is_cancelled() {
                info!(slice = slice_number, "batch cancelled between slices");
                let _ = events.send(DeliveryEvent::BatchCancelled);
                return;
            }

            let Some(input) = source.slice(slice_number - 1) else {
                let _ = events.send(DeliveryEvent::BatchFailed {
                    message: format!("slice {} unavailable", slice_number),
                });
                return;
            };

            let job_params = params;
            let handle = queue
                .submit(move |context: &mut ComputeContext| context.denoise(&job_params, &input));

            match handle.wait() {
                Ok(Ok(output)) => {
                    outputs.push(output);
                    let _ = events.send(DeliveryEvent::BatchProgress {
                        slice: slice_number,
                        last: range.last(),
                    });
                }
                Ok(Err(error)) => {
                    warn!(slice = slice_number, %error, "batch aborted");
                    let _ = events.send(DeliveryEvent::BatchFailed {
                        message: format!("slice {}: {}", slice_number, error),
                    });
                    return;
                }
                Err(error) => {
                    // Queue shut down underneath us.
                    let _ = events.send(DeliveryEvent::BatchFailed {
                        message: format!("slice {}: {}", slice_number, error),
                    });
                    return;
                }
            }
        }

        let title = format!(
            "{} [{}]",
            source.title(),
            params.algorithm().readable_name()
        );
        match ImageStack::from_slices(title, outputs) {
            Ok(stack) => {
                info!(slices = stack.slice_count(), "batch denoise finished");
                let _ = events.send(DeliveryEvent::BatchFinished { stack });
            }
            Err(message) => {
                let _ = events.send(DeliveryEvent::BatchFailed { message });
            }
        }
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DenoiseBackend;
    use crate::error::PipelineError;
    use crate::params::AlgorithmId;
    use std::sync::mpsc::channel;

    /// Backend double that inverts pixels and can be scripted to fail on a
    /// specific slice, recognized by the slice number encoded in pixel (0,0).
    struct MockBackend {
        fail_on_marker: Option<u8>,
    }

    impl DenoiseBackend for MockBackend {
        fn ensure_loaded(&mut self, _algorithm: AlgorithmId) -> Result<(), PipelineError> {
            Ok(())
        }

        fn compute(
            &mut self,
            _params: &DenoiseParams,
            input: &PixelBuffer,
        ) -> Result<PixelBuffer, PipelineError> {
            if self.fail_on_marker == Some(input.get(0, 0)) {
                return Err(PipelineError::BackendCompute("scripted slice failure".into()));
            }
            let data: Vec<u8> = input.data().iter().map(|v| 255 - v).collect();
            PixelBuffer::new(input.width(), input.height(), data)
                .map_err(PipelineError::BackendCompute)
        }
    }

    /// Ten slices, each marked with its 1-based number in every pixel.
    fn ten_slice_source() -> Arc<ImageStack> {
        let slices = (1..=10u8).map(|n| PixelBuffer::filled(4, 3, n)).collect();
        Arc::new(ImageStack::from_slices("noisy".to_string(), slices).unwrap())
    }

    fn queue_with(fail_on_marker: Option<u8>) -> Arc<ExecutionQueue<ComputeContext>> {
        Arc::new(ExecutionQueue::new(move || {
            ComputeContext::new(Box::new(MockBackend { fail_on_marker }), 8)
        }))
    }

    #[test]
    fn test_batch_over_middle_range() {
        let queue = queue_with(None);
        let (tx, rx) = channel();
        let range = SliceRange::new(3, 5).unwrap();

        run_batch(
            queue,
            tx,
            ten_slice_source(),
            DenoiseParams::default(),
            range,
            CancelFlag::new(),
        )
        .join()
        .unwrap();

        let events: Vec<DeliveryEvent> = rx.try_iter().collect();
        assert!(matches!(events[0], DeliveryEvent::BatchStarted { total: 3 }));

        let progress: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                DeliveryEvent::BatchProgress { slice, .. } => Some(*slice),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![3, 4, 5]);

        match events.last().unwrap() {
            DeliveryEvent::BatchFinished { stack } => {
                assert_eq!(stack.slice_count(), 3);
                assert_eq!(stack.title(), "noisy [Gaussian]");
                // Slices arrive in source order: inverted markers 3, 4, 5.
                for (i, marker) in (3u8..=5).enumerate() {
                    assert_eq!(stack.get(i).unwrap().get(0, 0), 255 - marker);
                }
            }
            other => panic!("unexpected final event {:?}", other),
        }
    }

    #[test]
    fn test_failure_mid_range_discards_partial_output() {
        let queue = queue_with(Some(4));
        let (tx, rx) = channel();
        let range = SliceRange::new(3, 5).unwrap();

        run_batch(
            queue,
            tx,
            ten_slice_source(),
            DenoiseParams::default(),
            range,
            CancelFlag::new(),
        )
        .join()
        .unwrap();

        let events: Vec<DeliveryEvent> = rx.try_iter().collect();

        // Slice 3 progressed, slice 4 failed, slice 5 never ran.
        let progress: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                DeliveryEvent::BatchProgress { slice, .. } => Some(*slice),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![3]);

        assert!(events
            .iter()
            .any(|e| matches!(e, DeliveryEvent::BatchFailed { .. })));
        assert!(!events
            .iter()
            .any(|e| matches!(e, DeliveryEvent::BatchFinished { .. })));
    }

    #[test]
    fn test_range_exceeding_source_fails_upfront() {
        let queue = queue_with(None);
        let (tx, rx) = channel();
        let range = SliceRange::new(8, 12).unwrap();

        run_batch(
            queue,
            tx,
            ten_slice_source(),
            DenoiseParams::default(),
            range,
            CancelFlag::new(),
        )
        .join()
        .unwrap();

        let events: Vec<DeliveryEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DeliveryEvent::BatchFailed { .. }));
    }

    #[test]
    fn test_cancel_before_start_sends_cancelled() {
        let queue = queue_with(None);
        let (tx, rx) = channel();
        let cancel = CancelFlag::new();
        cancel.cancel();

        run_batch(
            queue,
            tx,
            ten_slice_source(),
            DenoiseParams::default(),
            SliceRange::new(1, 10).unwrap(),
            cancel,
        )
        .join()
        .unwrap();

        let events: Vec<DeliveryEvent> = rx.try_iter().collect();
        assert!(matches!(events.last(), Some(DeliveryEvent::BatchCancelled)));
        assert!(!events
            .iter()
            .any(|e| matches!(e, DeliveryEvent::BatchProgress { .. })));
    }

    #[test]
    fn test_single_slice_range() {
        let queue = queue_with(None);
        let (tx, rx) = channel();

        run_batch(
            queue,
            tx,
            ten_slice_source(),
            DenoiseParams::default(),
            SliceRange::new(7, 7).unwrap(),
            CancelFlag::new(),
        )
        .join()
        .unwrap();

        let events: Vec<DeliveryEvent> = rx.try_iter().collect();
        match events.last().unwrap() {
            DeliveryEvent::BatchFinished { stack } => {
                assert_eq!(stack.slice_count(), 1);
                assert_eq!(stack.get(0).unwrap().get(0, 0), 255 - 7);
            }
            other => panic!("unexpected final event {:?}", other),
        }
    }
}
