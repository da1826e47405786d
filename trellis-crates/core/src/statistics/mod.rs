//! Statistics collected by the engine, and the means to log them.
mod cumulative_moving_average;
mod engine_statistics;
mod statistic_logger;
pub mod statistic_logging;

pub use cumulative_moving_average::CumulativeMovingAverage;
pub use engine_statistics::EngineStatistics;
pub use statistic_logger::StatisticLogger;
pub use statistic_logging::configure_statistic_logging;
pub use statistic_logging::log_statistic;
pub use statistic_logging::log_statistic_postfix;
pub use statistic_logging::should_log_statistics;
pub use statistic_logging::StatisticFormat;
