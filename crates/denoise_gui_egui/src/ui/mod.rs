mod parameters;

pub use parameters::ParameterPanel;
