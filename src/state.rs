use crate::config::ViewerConfig;
use crate::data::loader::load_source;
use crate::data::model::ProfileDataset;
use crate::data::series::plottable_variables;
use crate::figure::{build_figure, Figure, FigureSpec};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<ProfileDataset>,

    /// Axes, cycle and panel presets.
    pub config: ViewerConfig,

    /// Figure built from the dataset and config (None when the build failed).
    pub figure: Option<Figure>,

    /// Text of the path / URL field in the top bar.
    pub location_input: String,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            dataset: None,
            config,
            figure: None,
            location_input: String::new(),
            status_message: None,
        }
    }

    /// Open `location` and make it the current dataset. On failure the
    /// previous dataset and figure are dropped and the error is shown.
    pub fn open(&mut self, location: &str) {
        self.location_input = location.trim().to_string();
        match load_source(location) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} variables ({} dive cycles) from {}",
                    dataset.len(),
                    dataset.cycles(),
                    dataset.location
                );
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load dataset: {e}");
                self.dataset = None;
                self.figure = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a newly loaded dataset and build its figure.
    pub fn set_dataset(&mut self, dataset: ProfileDataset) {
        if self.config.cycle >= dataset.cycles().max(1) {
            self.config.cycle = 0;
        }
        self.dataset = Some(dataset);
        self.status_message = None;
        self.rebuild_figure();
    }

    /// Replace the configuration and rebuild.
    pub fn set_config(&mut self, config: ViewerConfig) {
        self.config = config;
        self.rebuild_figure();
    }

    /// Rebuild the figure from the current dataset and config. A failed
    /// build leaves no figure, only the error message.
    pub fn rebuild_figure(&mut self) {
        let Some(dataset) = &self.dataset else {
            self.figure = None;
            return;
        };
        let spec = FigureSpec::from_config(&self.config);
        match build_figure(dataset, &spec) {
            Ok(figure) => {
                self.figure = Some(figure);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Cannot build figure: {e}");
                self.figure = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Variables that can colour a panel for the current x variable and cycle.
    pub fn colour_candidates(&self) -> Vec<String> {
        match &self.dataset {
            Some(ds) => plottable_variables(ds, &self.config.x_variable, self.config.cycle)
                .into_iter()
                .filter(|name| *name != self.config.x_variable && *name != self.config.depth_variable)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Toggle the panel coloured by `variable`.
    pub fn toggle_panel(&mut self, variable: &str) {
        let enabled = self
            .config
            .preset(variable)
            .map(|p| p.enabled)
            .unwrap_or(false);
        self.config.set_panel_enabled(variable, !enabled);
        self.rebuild_figure();
    }

    pub fn set_cycle(&mut self, cycle: usize) {
        self.config.cycle = cycle;
        self.rebuild_figure();
    }

    pub fn set_x_variable(&mut self, variable: String) {
        self.config.x_variable = variable;
        self.rebuild_figure();
    }

    /// Whether the last load or figure build failed.
    pub fn has_error(&self) -> bool {
        self.status_message.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Variable;

    fn dataset(with_chlorophyll: bool) -> ProfileDataset {
        let mut vars = vec![
            Variable::from_series("time", vec![0.0, 1.0, 2.0]),
            Variable::from_series("depth", vec![0.0, 5.0, 10.0]),
            Variable::from_series("dissolved_nitrate", vec![1.0, 2.0, 3.0]),
            Variable::from_series("salinity", vec![33.0, 33.5, 34.0]),
        ];
        if with_chlorophyll {
            vars.push(Variable::from_series("chlorophyll_a", vec![0.1, 0.4, 0.2]));
        }
        ProfileDataset::from_variables("mem", vars)
    }

    #[test]
    fn default_panels_render_side_by_side() {
        let mut state = AppState::default();
        state.set_dataset(dataset(true));
        let figure = state.figure.as_ref().unwrap();
        assert_eq!(figure.panels.len(), 2);
        assert!(!state.has_error());
    }

    #[test]
    fn missing_variable_leaves_no_figure() {
        let mut state = AppState::default();
        state.set_dataset(dataset(false));
        assert!(state.figure.is_none());
        let msg = state.status_message.as_deref().unwrap();
        assert!(msg.contains("chlorophyll_a"), "{msg}");

        // Dropping the missing panel recovers.
        state.toggle_panel("chlorophyll_a");
        assert!(state.figure.is_some());
        assert!(!state.has_error());
    }

    #[test]
    fn failed_open_clears_dataset() {
        let mut state = AppState::default();
        state.set_dataset(dataset(true));
        state.open("/no/such/deployment.nc");
        assert!(state.dataset.is_none());
        assert!(state.figure.is_none());
        assert!(state.status_message.unwrap().contains("cannot access dataset"));
    }

    #[test]
    fn candidates_exclude_axes() {
        let mut state = AppState::default();
        state.set_dataset(dataset(true));
        assert_eq!(
            state.colour_candidates(),
            vec!["chlorophyll_a", "dissolved_nitrate", "salinity"]
        );
    }

    #[test]
    fn out_of_range_cycle_is_an_error() {
        let mut state = AppState::default();
        state.set_dataset(dataset(true));
        state.set_cycle(3);
        assert!(state.figure.is_none());
        assert!(state.status_message.unwrap().contains("dive cycle 3"));
    }
}
