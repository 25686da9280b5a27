pub mod aggregate;
pub mod config;
pub mod render;
pub mod report;
pub mod rules;
pub mod template;

pub use aggregate::{ItemTotals, ReportData, SectionTotals};
pub use config::{Config, ConfigError};
pub use report::{Report, ReportError};
pub use rules::{Ruleset, Section};
