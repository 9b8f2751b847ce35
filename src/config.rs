//! Engine configuration (`SPEC_FULL.md` §6, §9 "balancing strategy as policy").
//!
//! The engine holds no mutable global state; every operation takes a
//! [`Configuration`] explicitly. The balancing strategy is a trait object
//! so the three built-ins and caller-supplied strategies are
//! interchangeable without generics infecting [`crate::engine::SpatialIndex`].

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Which partition scheme an index uses: cubic (Morton) or tetrahedral.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    Octree,
    Tetree,
}

/// Per-node occupancy snapshot handed to [`BalancingStrategy::should_rebalance`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TreeStats {
    pub node_count: usize,
    pub entity_count: usize,
    pub max_entities_in_node: usize,
    pub mean_entities_per_node: f64,
}

/// Pure policy object queried at split/merge/rebalance decision points
/// (`SPEC_FULL.md` §4.4, §9). No inheritance required; this is exactly the
/// "function record" the design notes describe, expressed as a trait so
/// three built-ins and caller-supplied strategies share one object type.
pub trait BalancingStrategy: Send + Sync + std::fmt::Debug {
    /// Whether a node with `entity_count` entities at `level`, against a
    /// configured `max_entities_per_node`, should split.
    fn should_split(&self, entity_count: usize, max_entities_per_node: u16, level: u8) -> bool;

    /// Whether a node and its siblings, holding `combined_count` entities
    /// together, should merge back into their parent.
    fn should_merge(&self, combined_count: usize, max_entities_per_node: u16) -> bool;

    /// Whether a full-tree rebalance pass is warranted given current stats.
    fn should_rebalance(&self, stats: &TreeStats) -> bool;

    /// Minimum wall-clock interval between two full rebalances this
    /// strategy will permit. `None` means no throttling.
    fn min_rebalance_interval(&self) -> Option<Duration> {
        None
    }
}

/// 80% split / 20% merge, no rebalance throttling. The strategy used when
/// a [`Configuration`] doesn't name one explicitly.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultStrategy;

impl BalancingStrategy for DefaultStrategy {
    fn should_split(&self, entity_count: usize, max_entities_per_node: u16, _level: u8) -> bool {
        entity_count > max_entities_per_node as usize
    }

    fn should_merge(&self, combined_count: usize, max_entities_per_node: u16) -> bool {
        combined_count < (max_entities_per_node as usize * 20) / 100
    }

    fn should_rebalance(&self, stats: &TreeStats) -> bool {
        stats.max_entities_in_node as f64 > stats.mean_entities_per_node * 3.0
    }
}

/// Splits earlier (60% of threshold) and rebalances more eagerly, trading
/// steady-state overhead for flatter, more uniform trees.
#[derive(Clone, Copy, Debug, Default)]
pub struct AggressiveStrategy;

impl BalancingStrategy for AggressiveStrategy {
    fn should_split(&self, entity_count: usize, max_entities_per_node: u16, _level: u8) -> bool {
        entity_count as f64 > max_entities_per_node as f64 * 0.6
    }

    fn should_merge(&self, combined_count: usize, max_entities_per_node: u16) -> bool {
        combined_count < (max_entities_per_node as usize * 30) / 100
    }

    fn should_rebalance(&self, stats: &TreeStats) -> bool {
        stats.max_entities_in_node as f64 > stats.mean_entities_per_node * 1.5
    }
}

/// Hysteresis-heavy: splits only once well past threshold, merges only when
/// nearly empty, and throttles full rebalances to avoid churn on bursty
/// workloads.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConservativeStrategy;

impl BalancingStrategy for ConservativeStrategy {
    fn should_split(&self, entity_count: usize, max_entities_per_node: u16, _level: u8) -> bool {
        entity_count as f64 > max_entities_per_node as f64 * 1.25
    }

    fn should_merge(&self, combined_count: usize, max_entities_per_node: u16) -> bool {
        combined_count < (max_entities_per_node as usize * 10) / 100
    }

    fn should_rebalance(&self, stats: &TreeStats) -> bool {
        stats.max_entities_in_node as f64 > stats.mean_entities_per_node * 5.0
    }

    fn min_rebalance_interval(&self) -> Option<Duration> {
        Some(Duration::from_secs(1))
    }
}

/// Wraps a strategy with the last-rebalance timestamp so the engine can
/// honor `min_rebalance_interval` without the strategy itself needing
/// mutable state (`SPEC_FULL.md` §9, third open question).
#[derive(Debug)]
pub struct RebalanceThrottle {
    strategy: Arc<dyn BalancingStrategy>,
    last: parking_lot::Mutex<Option<Instant>>,
}

impl RebalanceThrottle {
    pub fn new(strategy: Arc<dyn BalancingStrategy>) -> Self {
        RebalanceThrottle {
            strategy,
            last: parking_lot::Mutex::new(None),
        }
    }

    pub fn strategy(&self) -> &Arc<dyn BalancingStrategy> {
        &self.strategy
    }

    /// Whether a rebalance is both strategy-warranted and not throttled.
    /// Records the attempt's timestamp when it allows one through.
    pub fn try_rebalance(&self, stats: &TreeStats) -> bool {
        if !self.strategy.should_rebalance(stats) {
            return false;
        }
        let Some(interval) = self.strategy.min_rebalance_interval() else {
            return true;
        };
        let mut last = self.last.lock();
        let now = Instant::now();
        if let Some(prev) = *last {
            if now.duration_since(prev) < interval {
                return false;
            }
        }
        *last = Some(now);
        true
    }
}

/// Explicit engine configuration (`SPEC_FULL.md` §6). No mutable global
/// state lives on the engine itself; every call site threads one of these
/// through.
#[derive(Clone)]
pub struct Configuration {
    pub scheme: Scheme,
    pub max_entities_per_node: u16,
    pub max_level: u8,
    pub balancing_strategy: Arc<dyn BalancingStrategy>,
    pub auto_balance: bool,
    pub use_bulk_lazy_keys: bool,
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("scheme", &self.scheme)
            .field("max_entities_per_node", &self.max_entities_per_node)
            .field("max_level", &self.max_level)
            .field("auto_balance", &self.auto_balance)
            .field("use_bulk_lazy_keys", &self.use_bulk_lazy_keys)
            .finish()
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            scheme: Scheme::Octree,
            max_entities_per_node: 16,
            max_level: crate::MAX_LEVEL,
            balancing_strategy: Arc::new(DefaultStrategy),
            auto_balance: true,
            use_bulk_lazy_keys: true,
        }
    }
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }
}

/// Named-field-setter builder, the same explicit-construction idiom as
/// `regular_octree_with_bounding_box`-style constructors elsewhere in this
/// corpus.
#[derive(Clone)]
pub struct ConfigurationBuilder {
    inner: Configuration,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        ConfigurationBuilder {
            inner: Configuration::default(),
        }
    }
}

impl ConfigurationBuilder {
    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.inner.scheme = scheme;
        self
    }

    pub fn max_entities_per_node(mut self, value: u16) -> Self {
        self.inner.max_entities_per_node = value;
        self
    }

    pub fn max_level(mut self, value: u8) -> Self {
        self.inner.max_level = value;
        self
    }

    pub fn balancing_strategy(mut self, strategy: Arc<dyn BalancingStrategy>) -> Self {
        self.inner.balancing_strategy = strategy;
        self
    }

    pub fn auto_balance(mut self, value: bool) -> Self {
        self.inner.auto_balance = value;
        self
    }

    pub fn use_bulk_lazy_keys(mut self, value: bool) -> Self {
        self.inner.use_bulk_lazy_keys = value;
        self
    }

    pub fn build(self) -> Configuration {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_matches_spec_defaults() {
        let config = Configuration::default();
        assert_eq!(config.max_entities_per_node, 16);
        assert_eq!(config.max_level, 21);
        assert!(config.auto_balance);
        assert!(config.use_bulk_lazy_keys);
    }

    #[test]
    fn builder_overrides_fields() {
        let config = Configuration::builder()
            .scheme(Scheme::Tetree)
            .max_entities_per_node(4)
            .auto_balance(false)
            .build();
        assert_eq!(config.scheme, Scheme::Tetree);
        assert_eq!(config.max_entities_per_node, 4);
        assert!(!config.auto_balance);
    }

    #[test]
    fn default_strategy_split_threshold() {
        let s = DefaultStrategy;
        assert!(!s.should_split(16, 16, 0));
        assert!(s.should_split(17, 16, 0));
    }

    #[test]
    fn aggressive_splits_earlier_than_conservative() {
        let aggressive = AggressiveStrategy;
        let conservative = ConservativeStrategy;
        assert!(aggressive.should_split(10, 16, 0));
        assert!(!conservative.should_split(10, 16, 0));
    }

    #[test]
    fn throttle_blocks_rapid_rebalances() {
        let throttle = RebalanceThrottle::new(Arc::new(ConservativeStrategy));
        let stats = TreeStats {
            node_count: 10,
            entity_count: 1000,
            max_entities_in_node: 500,
            mean_entities_per_node: 10.0,
        };
        assert!(throttle.try_rebalance(&stats));
        assert!(!throttle.try_rebalance(&stats));
    }
}
