mod data;
mod ui;

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use eframe::egui;
use tracing_subscriber::EnvFilter;

use data::load_tiff_stack;
use denoise_core::{
    run_batch, CancelFlag, ComputeContext, DeliveryEvent, ExecutionQueue, ImageStack,
    NativeBackend, PixelBuffer, PreviewScheduler, RoiRect, SliceRange,
    DEFAULT_PREVIEW_CACHE_CAPACITY,
};
use ui::ParameterPanel;

/// Preview region side length. A 256 px square keeps every slider tick
/// interactive even for the non-local means kernel.
const MAX_PREVIEW_SIZE: usize = 256;

fn main() -> eframe::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Denoise Studio",
        options,
        Box::new(|_cc| Ok(Box::new(App::default()))),
    )
}

/// Which stack the full-slice view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ViewMode {
    #[default]
    Original,
    Denoised,
}

/// Batch run state for the UI.
#[derive(Debug, Clone, PartialEq, Default)]
enum BatchState {
    #[default]
    Idle,
    Running { done: usize, total: usize },
    Completed,
    Cancelled,
    Failed(String),
}

struct App {
    // Pipeline
    queue: Arc<ExecutionQueue<ComputeContext>>,
    scheduler: PreviewScheduler,
    events: Receiver<DeliveryEvent>,
    event_sender: Sender<DeliveryEvent>,

    // Data state
    stack: Option<Arc<ImageStack>>,
    denoised: Option<ImageStack>,
    file_path: Option<PathBuf>,
    current_slice: usize,
    preview_input: Option<PixelBuffer>,

    // Parameters
    params_panel: ParameterPanel,

    // Batch state
    batch_state: BatchState,
    batch_first: usize,
    batch_last: usize,
    active_range: Option<SliceRange>,
    cancel: CancelFlag,

    // Display
    view_mode: ViewMode,
    original_roi_tex: Option<egui::TextureHandle>,
    denoised_roi_tex: Option<egui::TextureHandle>,
    full_slice_tex: Option<egui::TextureHandle>,
    full_view_dirty: bool,

    // Error handling
    error_message: Option<String>,
}

impl Default for App {
    fn default() -> Self {
        let queue = Arc::new(ExecutionQueue::new(|| {
            ComputeContext::new(
                Box::new(NativeBackend::new()),
                DEFAULT_PREVIEW_CACHE_CAPACITY,
            )
        }));
        let (event_tx, event_rx) = channel();
        let scheduler = PreviewScheduler::new(Arc::clone(&queue), event_tx.clone());

        Self {
            queue,
            scheduler,
            events: event_rx,
            event_sender: event_tx,
            stack: None,
            denoised: None,
            file_path: None,
            current_slice: 0,
            preview_input: None,
            params_panel: ParameterPanel::default(),
            batch_state: BatchState::default(),
            batch_first: 1,
            batch_last: 1,
            active_range: None,
            cancel: CancelFlag::new(),
            view_mode: ViewMode::default(),
            original_roi_tex: None,
            denoised_roi_tex: None,
            full_slice_tex: None,
            full_view_dirty: false,
            error_message: None,
        }
    }
}

impl App {
    fn open_file_dialog(&mut self, ctx: &egui::Context) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("TIFF files", &["tif", "tiff"])
            .pick_file()
        {
            self.load_file(ctx, path);
        }
    }

    fn load_file(&mut self, ctx: &egui::Context, path: PathBuf) {
        self.error_message = None;
        match load_tiff_stack(&path) {
            Ok(stack) => {
                self.batch_first = 1;
                self.batch_last = stack.slice_count();
                self.current_slice = 0;
                self.stack = Some(Arc::new(stack));
                self.denoised = None;
                self.view_mode = ViewMode::Original;
                self.batch_state = BatchState::Idle;
                self.file_path = Some(path);
                self.refresh_preview_input(ctx);
            }
            Err(e) => {
                self.error_message = Some(format!("Failed to load TIFF: {}", e));
            }
        }
    }

    /// Rebuild the preview input after the source slice changed: bump the
    /// epoch (cached previews belong to the old region), crop the centered
    /// region of interest, seed both panes with the noisy crop, and schedule
    /// a fresh denoised preview.
    fn refresh_preview_input(&mut self, ctx: &egui::Context) {
        self.full_view_dirty = true;

        let Some(stack) = &self.stack else {
            return;
        };
        let Some(slice) = stack.get(self.current_slice) else {
            return;
        };

        let roi = RoiRect::centered(slice.width(), slice.height(), MAX_PREVIEW_SIZE);
        let Some(input) = slice.crop(&roi) else {
            return;
        };

        self.scheduler.bump_epoch();

        self.original_roi_tex = Some(gray_texture(ctx, "original_roi", &input));
        // Show the noisy crop until the denoised one arrives
        self.denoised_roi_tex = Some(gray_texture(ctx, "denoised_roi", &input));

        self.scheduler
            .request_preview(&self.params_panel.params(), &input);
        self.preview_input = Some(input);
    }

    fn request_preview(&mut self) {
        if let Some(input) = &self.preview_input {
            self.scheduler
                .request_preview(&self.params_panel.params(), input);
        }
    }

    fn start_batch(&mut self) {
        let Some(stack) = &self.stack else {
            return;
        };

        let range = match SliceRange::new(self.batch_first, self.batch_last) {
            Ok(range) => range,
            Err(message) => {
                self.error_message = Some(message);
                return;
            }
        };

        self.error_message = None;
        self.denoised = None;
        self.cancel = CancelFlag::new();
        self.active_range = Some(range);
        self.batch_state = BatchState::Running {
            done: 0,
            total: range.len(),
        };

        // The batch runner publishes into the same delivery channel the
        // scheduler uses, so the UI drains a single receiver.
        let _ = run_batch(
            Arc::clone(&self.queue),
            self.event_sender.clone(),
            Arc::clone(stack) as Arc<dyn denoise_core::SliceSource>,
            self.params_panel.params(),
            range,
            self.cancel.clone(),
        );
    }

    /// Drain the delivery channel. Called once per frame.
    fn poll_events(&mut self, ctx: &egui::Context) {
        let mut messages = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            messages.push(event);
        }

        for event in messages {
            match event {
                DeliveryEvent::PreviewReady { image, .. } => {
                    self.denoised_roi_tex = Some(gray_texture(ctx, "denoised_roi", &image));
                }
                DeliveryEvent::PreviewFailed { message } => {
                    self.error_message = Some(message);
                }
                DeliveryEvent::BatchStarted { total } => {
                    self.batch_state = BatchState::Running { done: 0, total };
                }
                DeliveryEvent::BatchProgress { slice, .. } => {
                    let total = match &self.batch_state {
                        BatchState::Running { total, .. } => Some(*total),
                        _ => None,
                    };
                    if let (Some(total), Some(range)) = (total, self.active_range) {
                        self.batch_state = BatchState::Running {
                            done: slice - range.first() + 1,
                            total,
                        };
                    }
                }
                DeliveryEvent::BatchFinished { stack } => {
                    self.denoised = Some(stack);
                    self.batch_state = BatchState::Completed;
                    self.view_mode = ViewMode::Denoised;
                    self.full_view_dirty = true;
                }
                DeliveryEvent::BatchFailed { message } => {
                    self.error_message = Some(message.clone());
                    self.batch_state = BatchState::Failed(message);
                }
                DeliveryEvent::BatchCancelled => {
                    self.batch_state = BatchState::Cancelled;
                }
            }
        }
    }

    fn show_processing_panel(&mut self, ui: &mut egui::Ui) {
        if self.params_panel.show(ui) {
            self.request_preview();
        }

        ui.add_space(10.0);
        ui.separator();
        ui.heading("Denoise Stack");

        let slice_count = self.stack.as_ref().map_or(0, |s| s.slice_count());

        ui.horizontal(|ui| {
            ui.label("Slices:")
                .on_hover_text("Inclusive slice range to denoise, numbered from 1");
            ui.add(egui::DragValue::new(&mut self.batch_first).range(1..=slice_count.max(1)));
            ui.label("to");
            ui.add(egui::DragValue::new(&mut self.batch_last).range(1..=slice_count.max(1)));
        });

        let state = self.batch_state.clone();
        match &state {
            BatchState::Running { done, total } => {
                let progress = if *total > 0 {
                    *done as f32 / *total as f32
                } else {
                    0.0
                };
                ui.add(
                    egui::ProgressBar::new(progress)
                        .show_percentage()
                        .text(format!("Slice {} / {}", done, total)),
                );
                if ui
                    .button("Cancel")
                    .on_hover_text("Stop after the current slice")
                    .clicked()
                {
                    self.cancel.cancel();
                }
            }
            _ => {
                if let BatchState::Completed = &state {
                    ui.colored_label(egui::Color32::GREEN, "Denoising complete");
                } else if let BatchState::Cancelled = &state {
                    ui.colored_label(egui::Color32::YELLOW, "Denoising cancelled");
                } else if let BatchState::Failed(message) = &state {
                    ui.colored_label(egui::Color32::RED, format!("Failed: {}", message));
                }

                let can_run = self.stack.is_some();
                ui.add_enabled_ui(can_run, |ui| {
                    if ui
                        .button("Denoise")
                        .on_hover_text("Run the selected algorithm over the slice range")
                        .clicked()
                    {
                        self.start_batch();
                    }
                });
            }
        }
    }

    fn show_central_panel(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let Some(stack) = self.stack.clone() else {
            ui.vertical_centered(|ui| {
                ui.add_space(100.0);
                ui.heading("No stack loaded");
                ui.add_space(20.0);
                ui.label("Click 'Open File' to load a multi-page grayscale TIFF");
            });
            return;
        };

        // Slice navigation and view selection
        ui.horizontal(|ui| {
            let max_slice = stack.slice_count() - 1;
            if ui
                .add(egui::Slider::new(&mut self.current_slice, 0..=max_slice).text("Slice"))
                .changed()
            {
                self.refresh_preview_input(ctx);
            }

            ui.separator();
            ui.label("View:");
            if ui
                .selectable_value(&mut self.view_mode, ViewMode::Original, "Original")
                .clicked()
            {
                self.full_view_dirty = true;
            }
            ui.add_enabled_ui(self.denoised.is_some(), |ui| {
                if ui
                    .selectable_value(&mut self.view_mode, ViewMode::Denoised, "Denoised")
                    .clicked()
                {
                    self.full_view_dirty = true;
                }
            });
        });

        ui.separator();

        // Interactive preview pair
        ui.horizontal(|ui| {
            if let Some(texture) = &self.original_roi_tex {
                ui.vertical(|ui| {
                    ui.label("Original ROI");
                    ui.image(texture);
                });
            }
            ui.add_space(20.0);
            if let Some(texture) = &self.denoised_roi_tex {
                ui.vertical(|ui| {
                    ui.label("Denoised ROI");
                    ui.image(texture);
                });
            }
        });

        ui.separator();

        // Full-slice view of the selected stack
        if self.full_view_dirty {
            let source = match self.view_mode {
                ViewMode::Original => Some(stack.as_ref()),
                ViewMode::Denoised => self.denoised.as_ref(),
            };
            self.full_slice_tex = source
                .and_then(|s| s.get(self.current_slice.min(s.slice_count() - 1)))
                .map(|slice| gray_texture(ctx, "full_slice", slice));
            self.full_view_dirty = false;
        }

        if let Some(texture) = &self.full_slice_tex {
            let label = match self.view_mode {
                ViewMode::Original => stack.title().to_string(),
                ViewMode::Denoised => self
                    .denoised
                    .as_ref()
                    .map(|s| s.title().to_string())
                    .unwrap_or_default(),
            };
            ui.label(label);
            ui.add(egui::Image::new(texture).max_size(egui::vec2(512.0, 512.0)));
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events(ctx);

        // Keep repainting while a batch is in flight so progress stays live
        if matches!(self.batch_state, BatchState::Running { .. }) {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Denoise Studio");
                ui.separator();

                if ui
                    .button("Open File")
                    .on_hover_text("Load a multi-page grayscale TIFF stack")
                    .clicked()
                {
                    self.open_file_dialog(ctx);
                }

                if let Some(path) = &self.file_path {
                    ui.separator();
                    ui.label(format!(
                        "File: {}",
                        path.file_name().and_then(|n| n.to_str()).unwrap_or("unknown")
                    ));
                }

                if let Some(stack) = &self.stack {
                    ui.separator();
                    ui.label(format!(
                        "{} slices, {}x{}",
                        stack.slice_count(),
                        stack.width(),
                        stack.height()
                    ));
                }
            });

            if let Some(error) = &self.error_message {
                ui.colored_label(egui::Color32::RED, format!("⚠ {}", error));
            }
        });

        if self.stack.is_some() {
            egui::SidePanel::right("processing_panel")
                .resizable(true)
                .default_width(280.0)
                .show(ctx, |ui| {
                    self.show_processing_panel(ui);
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_central_panel(ctx, ui);
        });
    }
}

/// Upload a grayscale buffer as an egui texture.
fn gray_texture(ctx: &egui::Context, name: &str, buffer: &PixelBuffer) -> egui::TextureHandle {
    let image = egui::ColorImage::from_gray([buffer.width(), buffer.height()], buffer.data());
    ctx.load_texture(name, image, egui::TextureOptions::NEAREST)
}
