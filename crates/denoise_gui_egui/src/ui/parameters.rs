use eframe::egui;

use denoise_core::{
    AlgorithmId, DenoiseParams, DiffusionParams, GaussianParams, NonLocalMeansParams,
    WaveletParams,
};

/// Denoising parameter controls with per-algorithm panels.
///
/// Each algorithm keeps its own edited values, so switching back and forth
/// does not lose adjustments. Slider bounds come from the core's declared
/// parameter ranges.
pub struct ParameterPanel {
    algorithm: AlgorithmId,
    gaussian: GaussianParams,
    diffusion: DiffusionParams,
    nlmeans: NonLocalMeansParams,
    wavelet: WaveletParams,
}

impl Default for ParameterPanel {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmId::default(),
            gaussian: GaussianParams::default(),
            diffusion: DiffusionParams::default(),
            nlmeans: NonLocalMeansParams::default(),
            wavelet: WaveletParams::default(),
        }
    }
}

impl ParameterPanel {
    /// Snapshot of the currently selected algorithm's parameters.
    pub fn params(&self) -> DenoiseParams {
        match self.algorithm {
            AlgorithmId::Gaussian => DenoiseParams::Gaussian(self.gaussian),
            AlgorithmId::AnisotropicDiffusion => {
                DenoiseParams::AnisotropicDiffusion(self.diffusion)
            }
            AlgorithmId::NonLocalMeans => DenoiseParams::NonLocalMeans(self.nlmeans),
            AlgorithmId::WaveletThresholding => DenoiseParams::WaveletThresholding(self.wavelet),
        }
    }

    /// Show the algorithm selector and the active parameter panel.
    /// Returns true if any parameter or the algorithm changed.
    pub fn show(&mut self, ui: &mut egui::Ui) -> bool {
        let mut changed = false;

        ui.heading("Denoising Algorithm");

        ui.horizontal(|ui| {
            ui.label("Method:").on_hover_text(
                "Gaussian: fast uniform smoothing\n\
                 Anisotropic Diffusion: edge-preserving smoothing\n\
                 Non-Local Means: patch-based averaging, best quality\n\
                 Wavelet Thresholding: frequency-domain shrinkage",
            );

            egui::ComboBox::from_id_salt("denoise_algorithm")
                .selected_text(self.algorithm.readable_name())
                .show_ui(ui, |ui| {
                    for algorithm in AlgorithmId::ALL {
                        if ui
                            .selectable_value(
                                &mut self.algorithm,
                                algorithm,
                                algorithm.readable_name(),
                            )
                            .changed()
                        {
                            changed = true;
                        }
                    }
                });
        });

        ui.add_space(4.0);
        ui.separator();
        ui.add_space(4.0);

        match self.algorithm {
            AlgorithmId::Gaussian => changed |= self.show_gaussian(ui),
            AlgorithmId::AnisotropicDiffusion => changed |= self.show_diffusion(ui),
            AlgorithmId::NonLocalMeans => changed |= self.show_nlmeans(ui),
            AlgorithmId::WaveletThresholding => changed |= self.show_wavelet(ui),
        }

        ui.add_space(4.0);
        if ui
            .button("Reset to Defaults")
            .on_hover_text("Reset the current algorithm's parameters to their defaults")
            .clicked()
        {
            match self.algorithm {
                AlgorithmId::Gaussian => self.gaussian = GaussianParams::default(),
                AlgorithmId::AnisotropicDiffusion => self.diffusion = DiffusionParams::default(),
                AlgorithmId::NonLocalMeans => self.nlmeans = NonLocalMeansParams::default(),
                AlgorithmId::WaveletThresholding => self.wavelet = WaveletParams::default(),
            }
            changed = true;
        }

        changed
    }

    fn show_gaussian(&mut self, ui: &mut egui::Ui) -> bool {
        let mut changed = false;

        ui.horizontal(|ui| {
            ui.label("Sigma:").on_hover_text(
                "Blur standard deviation in pixels.\n\
                 Higher values smooth more aggressively.",
            );
            if ui
                .add(
                    egui::Slider::new(
                        &mut self.gaussian.sigma,
                        GaussianParams::SIGMA_MIN..=GaussianParams::SIGMA_MAX,
                    )
                    .step_by(0.1),
                )
                .changed()
            {
                changed = true;
            }
        });

        changed
    }

    fn show_diffusion(&mut self, ui: &mut egui::Ui) -> bool {
        let mut changed = false;

        ui.horizontal(|ui| {
            ui.label("Iterations:").on_hover_text(
                "Number of diffusion steps.\n\
                 More iterations smooth larger structures.",
            );
            if ui
                .add(egui::Slider::new(
                    &mut self.diffusion.iterations,
                    DiffusionParams::ITERATIONS_MIN..=DiffusionParams::ITERATIONS_MAX,
                ))
                .changed()
            {
                changed = true;
            }
        });

        ui.horizontal(|ui| {
            ui.label("Time Step:").on_hover_text(
                "Integration step per iteration.\n\
                 Values above 0.25 would be unstable.",
            );
            if ui
                .add(
                    egui::Slider::new(
                        &mut self.diffusion.time_step,
                        DiffusionParams::TIME_STEP_MIN..=DiffusionParams::TIME_STEP_MAX,
                    )
                    .step_by(0.01),
                )
                .changed()
            {
                changed = true;
            }
        });

        ui.horizontal(|ui| {
            ui.label("Conductance:").on_hover_text(
                "Edge threshold. Gradients above this value\n\
                 are treated as edges and preserved.",
            );
            if ui
                .add(
                    egui::Slider::new(
                        &mut self.diffusion.conductance,
                        DiffusionParams::CONDUCTANCE_MIN..=DiffusionParams::CONDUCTANCE_MAX,
                    )
                    .step_by(0.01),
                )
                .changed()
            {
                changed = true;
            }
        });

        changed
    }

    fn show_nlmeans(&mut self, ui: &mut egui::Ui) -> bool {
        let mut changed = false;

        ui.horizontal(|ui| {
            ui.label("Strength:").on_hover_text(
                "Filter strength h.\n\
                 Higher values average patches more aggressively.",
            );
            if ui
                .add(
                    egui::Slider::new(
                        &mut self.nlmeans.strength,
                        NonLocalMeansParams::STRENGTH_MIN..=NonLocalMeansParams::STRENGTH_MAX,
                    )
                    .step_by(0.01),
                )
                .changed()
            {
                changed = true;
            }
        });

        ui.horizontal(|ui| {
            ui.label("Half Block:").on_hover_text(
                "Half size of the comparison patch.\n\
                 Larger patches match structure more strictly but run slower.",
            );
            if ui
                .add(
                    egui::DragValue::new(&mut self.nlmeans.half_block)
                        .range(NonLocalMeansParams::HALF_BLOCK_MIN..=NonLocalMeansParams::HALF_BLOCK_MAX),
                )
                .changed()
            {
                changed = true;
            }
        });

        ui.horizontal(|ui| {
            ui.label("Half Search:").on_hover_text(
                "Half size of the search window.\n\
                 Larger windows find more candidates but run slower.",
            );
            if ui
                .add(
                    egui::DragValue::new(&mut self.nlmeans.half_search)
                        .range(NonLocalMeansParams::HALF_SEARCH_MIN..=NonLocalMeansParams::HALF_SEARCH_MAX),
                )
                .changed()
            {
                changed = true;
            }
        });

        changed
    }

    fn show_wavelet(&mut self, ui: &mut egui::Ui) -> bool {
        let mut changed = false;

        ui.horizontal(|ui| {
            ui.label("Threshold:").on_hover_text(
                "Soft threshold applied to detail coefficients.\n\
                 Higher values remove more texture along with the noise.",
            );
            if ui
                .add(
                    egui::Slider::new(
                        &mut self.wavelet.threshold,
                        WaveletParams::THRESHOLD_MIN..=WaveletParams::THRESHOLD_MAX,
                    )
                    .step_by(0.01),
                )
                .changed()
            {
                changed = true;
            }
        });

        ui.horizontal(|ui| {
            ui.label("Levels:").on_hover_text(
                "Decomposition depth.\n\
                 Deeper decompositions reach coarser noise.",
            );
            if ui
                .add(
                    egui::DragValue::new(&mut self.wavelet.levels)
                        .range(WaveletParams::LEVELS_MIN..=WaveletParams::LEVELS_MAX),
                )
                .changed()
            {
                changed = true;
            }
        });

        changed
    }
}
