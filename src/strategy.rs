//! Ordered "first success wins" strategy lists
//!
//! Capture and clipboard export both degrade through a ranked list of
//! alternatives. A [`StrategyChain`] holds those alternatives, each with an
//! availability probe, an invoke function and the timeout it is granted, and
//! runs them strictly one after another.

use std::fmt::Display;
use std::time::Duration;

type Probe<'a> = Box<dyn Fn() -> bool + 'a>;
type Invoke<'a, T, E> = Box<dyn Fn(Duration) -> Result<T, E> + 'a>;

/// One alternative in a chain
pub struct Strategy<'a, T, E> {
    name: String,
    timeout: Duration,
    probe: Probe<'a>,
    invoke: Invoke<'a, T, E>,
}

impl<'a, T, E> Strategy<'a, T, E> {
    pub fn new(
        name: impl Into<String>,
        timeout: Duration,
        probe: impl Fn() -> bool + 'a,
        invoke: impl Fn(Duration) -> Result<T, E> + 'a,
    ) -> Self {
        Self {
            name: name.into(),
            timeout,
            probe: Box::new(probe),
            invoke: Box::new(invoke),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// The strategy that produced a value
#[derive(Debug)]
pub struct ChainSuccess<T> {
    pub strategy: String,
    pub value: T,
}

/// Every strategy was unavailable or failed
#[derive(Debug)]
pub struct ChainExhausted<E> {
    /// Strategies whose probe reported them unavailable
    pub unavailable: Vec<String>,
    /// Strategies that ran, with the error each returned
    pub failures: Vec<(String, E)>,
}

impl<E> ChainExhausted<E> {
    /// Names of the strategies that actually ran
    pub fn attempted(&self) -> Vec<String> {
        self.failures.iter().map(|(name, _)| name.clone()).collect()
    }
}

/// Ranked list of strategies, evaluated in insertion order
pub struct StrategyChain<'a, T, E> {
    label: &'static str,
    strategies: Vec<Strategy<'a, T, E>>,
}

impl<'a, T, E: Display> StrategyChain<'a, T, E> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            strategies: Vec::new(),
        }
    }

    pub fn push(&mut self, strategy: Strategy<'a, T, E>) {
        self.strategies.push(strategy);
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(Strategy::name).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Upper bound on how long [`run`](Self::run) may block
    pub fn time_budget(&self) -> Duration {
        self.strategies.iter().map(Strategy::timeout).sum()
    }

    /// Run strategies in order until one succeeds
    pub fn run(&self) -> Result<ChainSuccess<T>, ChainExhausted<E>> {
        let mut exhausted = ChainExhausted {
            unavailable: Vec::new(),
            failures: Vec::new(),
        };

        for strategy in &self.strategies {
            if !(strategy.probe)() {
                log::debug!("{}: {} unavailable, skipping", self.label, strategy.name);
                exhausted.unavailable.push(strategy.name.clone());
                continue;
            }

            log::debug!(
                "{}: trying {} (timeout {:?})",
                self.label,
                strategy.name,
                strategy.timeout
            );
            match (strategy.invoke)(strategy.timeout) {
                Ok(value) => {
                    log::info!("{}: {} succeeded", self.label, strategy.name);
                    return Ok(ChainSuccess {
                        strategy: strategy.name.clone(),
                        value,
                    });
                }
                Err(err) => {
                    log::warn!("{}: {} failed: {}", self.label, strategy.name, err);
                    exhausted.failures.push((strategy.name.clone(), err));
                }
            }
        }

        Err(exhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn first_success_wins_and_later_strategies_never_run() {
        let later_calls = Cell::new(0);
        let mut chain: StrategyChain<'_, u32, String> = StrategyChain::new("test");
        chain.push(Strategy::new(
            "broken",
            Duration::from_secs(1),
            || true,
            |_| Err("boom".to_string()),
        ));
        chain.push(Strategy::new("works", Duration::from_secs(2), || true, |_| Ok(7)));
        chain.push(Strategy::new("later", Duration::from_secs(3), || true, |_| {
            later_calls.set(later_calls.get() + 1);
            Ok(9)
        }));

        let success = chain.run().unwrap();
        assert_eq!(success.strategy, "works");
        assert_eq!(success.value, 7);
        assert_eq!(later_calls.get(), 0);
    }

    #[test]
    fn unavailable_strategies_are_skipped_not_failed() {
        let mut chain: StrategyChain<'_, (), String> = StrategyChain::new("test");
        chain.push(Strategy::new("missing", Duration::from_secs(1), || false, |_| {
            panic!("probe said unavailable")
        }));
        chain.push(Strategy::new(
            "fails",
            Duration::from_secs(1),
            || true,
            |_| Err("nope".to_string()),
        ));

        let exhausted = chain.run().unwrap_err();
        assert_eq!(exhausted.unavailable, vec!["missing".to_string()]);
        assert_eq!(exhausted.attempted(), vec!["fails".to_string()]);
    }

    #[test]
    fn invoke_receives_its_own_timeout_and_budget_is_the_sum() {
        let mut chain: StrategyChain<'_, Duration, String> = StrategyChain::new("test");
        chain.push(Strategy::new(
            "slow",
            Duration::from_millis(10_000),
            || true,
            Ok,
        ));
        chain.push(Strategy::new("fast", Duration::from_millis(5_000), || true, Ok));

        assert_eq!(chain.time_budget(), Duration::from_millis(15_000));
        assert_eq!(chain.names(), vec!["slow", "fast"]);
        assert_eq!(chain.run().unwrap().value, Duration::from_millis(10_000));
    }
}
