use std::fmt::Display;

use itertools::Itertools;

use super::log_statistic;

/// Logs statistics under a common name prefix, e.g. the name of the propagator they belong to.
#[derive(Debug, Default, Clone)]
pub struct StatisticLogger {
    name_prefix: String,
}

impl StatisticLogger {
    pub fn new<Input: IntoIterator<Item = impl Display>>(name_prefix: Input) -> Self {
        StatisticLogger {
            name_prefix: name_prefix.into_iter().join("_"),
        }
    }

    /// A logger whose prefix is extended with `addition`.
    pub fn attach_to_prefix(&self, addition: impl Display) -> Self {
        let name_prefix = if self.name_prefix.is_empty() {
            addition.to_string()
        } else {
            format!("{}_{addition}", self.name_prefix)
        };
        StatisticLogger { name_prefix }
    }

    pub fn log_statistic(&self, value: impl Display) {
        log_statistic(&self.name_prefix, value);
    }

    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }
}
