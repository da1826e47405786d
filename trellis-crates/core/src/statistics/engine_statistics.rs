use enum_map::EnumMap;

use super::CumulativeMovingAverage;
use super::StatisticLogger;
use crate::propagation::Priority;

/// Counters updated by the engine and the search.
#[derive(Debug, Default, Clone)]
pub struct EngineStatistics {
    /// The number of calls to propagators
    pub num_propagator_calls: u64,
    /// The number of calls to propagators, per priority class
    pub num_calls_per_priority: EnumMap<Priority, u64>,
    /// The number of times a fixpoint computation ended in a contradiction
    pub num_contradictions: u64,
    /// The number of decisions taken by the search
    pub num_decisions: u64,
    /// The number of times the search undid a decision
    pub num_backtracks: u64,
    /// The peak depth of the search tree
    pub peak_depth: u64,
    /// The average number of propagator calls needed to reach a fixpoint
    pub average_calls_per_fixpoint: CumulativeMovingAverage<u64>,
}

impl EngineStatistics {
    pub fn log(&self, statistic_logger: StatisticLogger) {
        statistic_logger
            .attach_to_prefix("propagatorCalls")
            .log_statistic(self.num_propagator_calls);
        for (priority, num_calls) in self.num_calls_per_priority.iter() {
            statistic_logger
                .attach_to_prefix(format!("propagatorCalls{priority:?}"))
                .log_statistic(num_calls);
        }
        statistic_logger
            .attach_to_prefix("contradictions")
            .log_statistic(self.num_contradictions);
        statistic_logger
            .attach_to_prefix("decisions")
            .log_statistic(self.num_decisions);
        statistic_logger
            .attach_to_prefix("backtracks")
            .log_statistic(self.num_backtracks);
        statistic_logger
            .attach_to_prefix("peakDepth")
            .log_statistic(self.peak_depth);
        statistic_logger
            .attach_to_prefix("averageCallsPerFixpoint")
            .log_statistic(self.average_calls_per_fixpoint);
    }
}
