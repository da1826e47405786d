//! Options which determine how the engine behaves.

/// Options for the [`State`](crate::State) which determine how it schedules and represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// The number of queues of the scheduler. [`Priority`](crate::propagation::Priority) classes
    /// beyond the last queue share that queue.
    pub num_priority_levels: u32,
    /// Whether a propagator is woken by the changes it made itself.
    pub self_notification: SelfNotification,
    /// Domains with at most this many values are represented with an explicit set of values;
    /// larger domains only track their bounds.
    pub max_enumerated_domain_size: u32,
    /// The dominator algorithm used by the graph propagators.
    pub dominator_algorithm: DominatorAlgorithm,
    /// The seed for propagators which make randomised choices.
    pub random_seed: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            num_priority_levels: 4,
            self_notification: SelfNotification::default(),
            max_enumerated_domain_size: 1 << 16,
            dominator_algorithm: DominatorAlgorithm::default(),
            random_seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum SelfNotification {
    /// Changes made by a propagator do not wake the propagator itself.
    #[default]
    Exclude,
    /// Every change wakes every subscribed propagator, including the one which made the change.
    Include,
}

/// The variant of the Lengauer-Tarjan algorithm used to compute dominator trees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum DominatorAlgorithm {
    /// Path compression only.
    Simple,
    /// Path compression with balanced linking.
    #[default]
    Balanced,
}
