//! Preview request scheduling.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::backend::ComputeContext;
use crate::events::DeliveryEvent;
use crate::fingerprint::ParameterFingerprint;
use crate::image::PixelBuffer;
use crate::params::DenoiseParams;
use crate::queue::ExecutionQueue;

/// Reacts to parameter-change events: snapshots a fingerprint, consults the
/// cache, and enqueues compute-or-deliver work on the execution queue.
///
/// Requests may arrive at slider-tick frequency. Two mechanisms keep the
/// backlog and the display consistent:
/// - coalescing: a queued-but-unstarted request whose generation has been
///   superseded returns without calling the backend;
/// - freshness gate: right before an image is handed to the delivery channel,
///   its fingerprint is compared against the currently active one, so a slow
///   stale compute can never overwrite a newer preview. Its cache write is
///   kept for possible reuse.
pub struct PreviewScheduler {
    queue: Arc<ExecutionQueue<ComputeContext>>,
    events: Sender<DeliveryEvent>,
    active: Arc<Mutex<Option<ParameterFingerprint>>>,
    latest_request: Arc<AtomicU64>,
    epoch: AtomicU64,
}

impl PreviewScheduler {
    pub fn new(queue: Arc<ExecutionQueue<ComputeContext>>, events: Sender<DeliveryEvent>) -> Self {
        Self {
            queue,
            events,
            active: Arc::new(Mutex::new(None)),
            latest_request: Arc::new(AtomicU64::new(0)),
            epoch: AtomicU64::new(0),
        }
    }

    /// The current invalidation epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Invalidate every cached preview: called when the source image or the
    /// region of interest changes. Fingerprints taken before the bump can no
    /// longer match anything, and the cache itself is cleared wholesale.
    pub fn bump_epoch(&self) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        *self.active.lock().unwrap() = None;
        self.queue.submit(|context: &mut ComputeContext| {
            context.cache.clear();
        });
        debug!(epoch, "epoch bumped, preview cache cleared");
        epoch
    }

    /// Schedule a preview for the given parameters over `roi_input`.
    ///
    /// The parameters and the input are snapshotted here, on the caller's
    /// thread; nothing the submitted job touches can be mutated by later UI
    /// edits. Returns the fingerprint the eventual delivery will carry.
    pub fn request_preview(
        &self,
        params: &DenoiseParams,
        roi_input: &PixelBuffer,
    ) -> ParameterFingerprint {
        let fingerprint = ParameterFingerprint::new(params, self.epoch());
        *self.active.lock().unwrap() = Some(fingerprint.clone());
        let generation = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;

        let job_fingerprint = fingerprint.clone();
        let job_params = *params;
        let input = roi_input.clone();
        let latest = Arc::clone(&self.latest_request);
        let active = Arc::clone(&self.active);
        let events = self.events.clone();

        self.queue.submit(move |context: &mut ComputeContext| {
            // Coalescing: if a newer request is already waiting, this one's
            // delivery would be dropped at the gate anyway. Skip the backend
            // call entirely.
            if latest.load(Ordering::SeqCst) != generation {
                debug!("preview request superseded before start, skipping");
                return;
            }

            if let Some(cached) = context.cache.get(&job_fingerprint) {
                let image = cached.clone();
                deliver(&active, &events, job_fingerprint, image);
                return;
            }

            match context.denoise(&job_params, &input) {
                Ok(image) => {
                    context.cache.put(job_fingerprint.clone(), image.clone());
                    deliver(&active, &events, job_fingerprint, image);
                }
                Err(error) => {
                    // Non-fatal: never cached, previous preview stays up.
                    warn!(%error, "preview compute failed");
                    let _ = events.send(DeliveryEvent::PreviewFailed {
                        message: error.to_string(),
                    });
                }
            }
        });

        fingerprint
    }
}

/// Freshness gate: hand the image to the delivery channel only if its
/// fingerprint still equals the currently active one.
fn deliver(
    active: &Mutex<Option<ParameterFingerprint>>,
    events: &Sender<DeliveryEvent>,
    fingerprint: ParameterFingerprint,
    image: PixelBuffer,
) {
    let is_active = active.lock().unwrap().as_ref() == Some(&fingerprint);
    if is_active {
        let _ = events.send(DeliveryEvent::PreviewReady { fingerprint, image });
    } else {
        debug!("dropping stale preview delivery");
    }
}

// =============================================================================
// Tests
// =============================================================================
