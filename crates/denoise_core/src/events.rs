//! Delivery events from the pipeline to the UI.

use crate::fingerprint::ParameterFingerprint;
use crate::image::{ImageStack, PixelBuffer};

/// Result/delivery messages, drained by the UI's own event loop.
///
/// The pipeline never touches UI state directly; everything it wants shown
/// crosses this channel and is applied on the UI thread.
#[derive(Debug, Clone)]
pub enum DeliveryEvent {
    /// A preview passed the freshness gate and should replace the denoised
    /// preview pane.
    PreviewReady {
        fingerprint: ParameterFingerprint,
        image: PixelBuffer,
    },
    /// A preview compute failed. The previously displayed preview should be
    /// left untouched.
    PreviewFailed { message: String },
    /// A batch run started over `total` slices.
    BatchStarted { total: usize },
    /// A slice finished. `slice` is its 1-based position in the source;
    /// `last` is the final slice of the range, so a consumer can scale a
    /// progress bar the way the original slice-numbered bar did.
    BatchProgress { slice: usize, last: usize },
    /// The whole range was denoised; the assembled stack is ready to show.
    BatchFinished { stack: ImageStack },
    /// A slice failed; the job was aborted and its partial output discarded.
    BatchFailed { message: String },
    /// The job was cancelled between slices.
    BatchCancelled,
}
