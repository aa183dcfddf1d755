//! Denoising Pipeline Core
//!
//! Scheduling, caching, and delivery around an interactive image-denoising
//! backend: parameter fingerprinting, a bounded LRU preview cache, a strictly
//! serialized execution queue in front of the non-reentrant backend, and a
//! batch runner with per-slice progress. The GUI lives in a separate crate
//! and talks to this one exclusively through owned messages.

pub mod backend;
pub mod batch;
pub mod cache;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod image;
pub mod kernels;
pub mod params;
pub mod queue;
pub mod scheduler;
pub mod source;

// Re-export commonly used types at the crate root
pub use backend::{ComputeContext, DenoiseBackend, NativeBackend};
pub use batch::{run_batch, CancelFlag};
pub use cache::{PreviewCache, DEFAULT_PREVIEW_CACHE_CAPACITY};
pub use error::PipelineError;
pub use events::DeliveryEvent;
pub use fingerprint::ParameterFingerprint;
pub use image::{ImageStack, PixelBuffer, RoiRect, SliceRange};
pub use params::{
    AlgorithmId, DenoiseParams, DiffusionParams, GaussianParams, NonLocalMeansParams,
    WaveletParams,
};
pub use queue::{ExecutionQueue, JobHandle};
pub use scheduler::PreviewScheduler;
pub use source::SliceSource;
