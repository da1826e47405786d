//! Process-wide output of statistics as `{prefix} {name}={value}` lines.
//!
//! Nothing is written until [`configure_statistic_logging`] is called, so the engine can log its
//! statistics unconditionally.

use std::fmt::Display;
use std::io::stdout;
use std::io::Write;
use std::sync::Mutex;
use std::sync::OnceLock;

use convert_case::Case;
use convert_case::Casing;

/// How a statistic line looks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatisticFormat {
    pub prefix: &'static str,
    /// Written by [`log_statistic_postfix`] to close a block of statistics.
    pub closing_line: Option<&'static str>,
    /// The statistic names are converted to this casing; `None` keeps them as they are logged.
    pub casing: Option<Case>,
}

impl Default for StatisticFormat {
    fn default() -> Self {
        StatisticFormat {
            prefix: "%%%trellis",
            closing_line: None,
            casing: None,
        }
    }
}

impl StatisticFormat {
    fn line(&self, name: impl Display, value: impl Display) -> String {
        let name = name.to_string();
        let name = match self.casing {
            Some(casing) => name.to_case(casing),
            None => name,
        };
        format!("{} {name}={value}", self.prefix)
    }
}

struct StatisticOutput {
    format: StatisticFormat,
    writer: Box<dyn Write + Send>,
}

static STATISTIC_OUTPUT: OnceLock<Mutex<StatisticOutput>> = OnceLock::new();

/// Enables statistic logging. Only the first call has an effect; `writer` defaults to stdout.
pub fn configure_statistic_logging(format: StatisticFormat, writer: Option<Box<dyn Write + Send>>) {
    let _ = STATISTIC_OUTPUT.get_or_init(|| {
        Mutex::new(StatisticOutput {
            format,
            writer: writer.unwrap_or_else(|| Box::new(stdout())),
        })
    });
}

fn with_output(write: impl FnOnce(&mut StatisticOutput)) {
    let Some(output) = STATISTIC_OUTPUT.get() else {
        return;
    };
    if let Ok(mut output) = output.lock() {
        write(&mut output);
    }
}

pub fn log_statistic(name: impl Display, value: impl Display) {
    with_output(|output| {
        let line = output.format.line(name, value);
        let _ = writeln!(output.writer, "{line}");
    });
}

pub fn log_statistic_postfix() {
    with_output(|output| {
        if let Some(closing_line) = output.format.closing_line {
            let _ = writeln!(output.writer, "{closing_line}");
        }
    });
}

pub fn should_log_statistics() -> bool {
    STATISTIC_OUTPUT.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_converted_to_the_configured_casing() {
        let format = StatisticFormat {
            prefix: "%%%mzn-stat:",
            closing_line: Some("%%%mzn-stat-end"),
            casing: Some(Case::Camel),
        };

        assert_eq!("%%%mzn-stat: engineNumDecisions=3", format.line("engine_num_decisions", 3));
        assert_eq!(
            "%%%trellis engine_num_decisions=3",
            StatisticFormat::default().line("engine_num_decisions", 3)
        );
    }
}
