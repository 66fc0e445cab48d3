//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod json_report_adapter;
pub mod simulated_adapter;

use crate::domain::config::AppConfig;
use crate::domain::config::DataSource;
use crate::ports::data_port::DataPort;
use std::path::PathBuf;

/// Select the bar source named by the configuration.
pub fn data_port_for(config: &AppConfig) -> Box<dyn DataPort> {
    match &config.data {
        DataSource::Simulated { bars, seed } => Box::new(simulated_adapter::SimulatedAdapter::new(
            *bars,
            config.timeframe,
            *seed,
        )),
        DataSource::Csv { path } => Box::new(csv_adapter::CsvAdapter::new(PathBuf::from(path))),
    }
}
