//! Run driver.
//!
//! Repeats [`Machine::step`] until cancelled. The instruction set has no
//! halt, so a run only ends when a stop is requested, the observer
//! breaks, or an optional cycle limit is reached. State is only ever
//! observed between whole cycles.

use std::ops::ControlFlow;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::cpu::{Cycle, Machine};

/// Default pause between cycles: 5 Hz.
pub const DEFAULT_CYCLE_DELAY_MS: u64 = 200;

/// Run driver settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Pause between cycles, for visual pacing. Zero disables it.
    pub cycle_delay_ms: u64,
    /// Stop after this many cycles. `None` runs until cancelled.
    pub max_cycles: Option<u64>,
    /// Set the clock to 0 before the first cycle.
    pub rewind: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cycle_delay_ms: DEFAULT_CYCLE_DELAY_MS,
            max_cycles: None,
            rewind: true,
        }
    }
}

impl RunConfig {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.cycle_delay_ms)
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// A stop was requested through the stop flag.
    Cancelled,
    /// The observer returned `ControlFlow::Break`.
    Observer,
    /// `max_cycles` was reached.
    CycleLimit,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Cycles executed by this run.
    pub cycles: u64,
    /// Cycles whose instruction reported an error.
    pub faults: u64,
    pub reason: StopReason,
}

/// Drives a [`Machine`] through repeated cycles.
#[derive(Debug, Clone)]
pub struct Runner {
    config: RunConfig,
    running: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
}

impl Runner {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Flag that is `true` while a run is in progress.
    pub fn running_flag(&self) -> &Arc<AtomicBool> {
        &self.running
    }

    /// Stop request. Storing `true` from another thread stops the run before
    /// its next cycle. A request made before the run starts is kept until a
    /// run observes it.
    pub fn stop_flag(&self) -> &Arc<AtomicBool> {
        &self.stop
    }

    /// Request that the current (or next) run stop before its next cycle.
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Run without observing cycles.
    pub fn run(&self, machine: &mut Machine) -> RunSummary {
        self.run_with(machine, |_, _| ControlFlow::Continue(()))
    }

    /// Run, calling `observer` after every cycle with that cycle's report and
    /// a read-only view of the machine.
    pub fn run_with<F>(&self, machine: &mut Machine, mut observer: F) -> RunSummary
    where
        F: FnMut(&Cycle, &Machine) -> ControlFlow<()>,
    {
        if self.config.rewind {
            machine.rewind();
        }
        self.running.store(true, Ordering::Release);
        info!(max_cycles = ?self.config.max_cycles, delay_ms = self.config.cycle_delay_ms, "run started");

        let delay = self.config.cycle_delay();
        let mut cycles = 0u64;
        let mut faults = 0u64;

        let reason = loop {
            if self.stop.swap(false, Ordering::AcqRel) {
                break StopReason::Cancelled;
            }
            if self.config.max_cycles.is_some_and(|max| cycles >= max) {
                break StopReason::CycleLimit;
            }

            let cycle = machine.step();
            cycles += 1;
            if cycle.fault.is_some() {
                faults += 1;
            }

            if observer(&cycle, machine).is_break() {
                break StopReason::Observer;
            }

            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
        };

        self.running.store(false, Ordering::Release);
        debug!(cycles, faults, ?reason, "run finished");
        RunSummary { cycles, faults, reason }
    }
}

/// Errors loading run settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::{Instruction, Opcode};

    fn fast(max_cycles: Option<u64>) -> RunConfig {
        RunConfig { cycle_delay_ms: 0, max_cycles, rewind: true }
    }

    #[test]
    fn test_config_defaults() {
        let config = RunConfig::from_json("{}").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.cycle_delay(), Duration::from_millis(200));
    }

    #[test]
    fn test_config_partial_json() {
        let config = RunConfig::from_json(r#"{"cycle_delay_ms": 0, "max_cycles": 32}"#).unwrap();
        assert_eq!(config.max_cycles, Some(32));
        assert!(config.rewind);
        assert!(RunConfig::from_json("{").is_err());
    }

    #[test]
    fn test_cycle_limit() {
        let mut machine = Machine::new();
        let summary = Runner::new(fast(Some(20))).run(&mut machine);

        assert_eq!(summary, RunSummary { cycles: 20, faults: 0, reason: StopReason::CycleLimit });
        assert_eq!(machine.cycles(), 20);
        // 20 advances from 0 wrap to 4
        assert_eq!(machine.clock().value().to_u32(), 4);
    }

    #[test]
    fn test_observer_break() {
        let mut machine = Machine::new();
        let mut seen = Vec::new();
        let summary = Runner::new(fast(None)).run_with(&mut machine, |cycle, _| {
            seen.push(cycle.address);
            if seen.len() == 3 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
        });

        assert_eq!(summary.reason, StopReason::Observer);
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn test_cancel_from_observer() {
        let mut machine = Machine::new();
        let runner = Runner::new(fast(None));
        let flag = Arc::clone(runner.stop_flag());

        let summary = runner.run_with(&mut machine, |_, m| {
            if m.cycles() == 5 {
                flag.store(true, Ordering::Release);
            }
            ControlFlow::Continue(())
        });

        assert_eq!(summary.reason, StopReason::Cancelled);
        assert_eq!(summary.cycles, 5);
        assert!(!runner.running_flag().load(Ordering::Acquire));
        assert!(!runner.stop_flag().load(Ordering::Acquire));
    }

    #[test]
    fn test_cancel_before_run() {
        let mut machine = Machine::new();
        let runner = Runner::new(fast(Some(50)));
        runner.cancel();

        let summary = runner.run(&mut machine);
        assert_eq!(summary, RunSummary { cycles: 0, faults: 0, reason: StopReason::Cancelled });
        assert_eq!(machine.cycles(), 0);

        // the request is consumed by the run that saw it
        let summary = runner.run(&mut machine);
        assert_eq!(summary.reason, StopReason::CycleLimit);
        assert_eq!(summary.cycles, 50);
    }

    #[test]
    fn test_cancel_from_other_thread_before_start() {
        let runner = Runner::new(fast(None));
        let remote = runner.clone();
        std::thread::spawn(move || remote.cancel()).join().unwrap();

        let mut machine = Machine::new();
        let summary = runner.run(&mut machine);
        assert_eq!(summary.reason, StopReason::Cancelled);
    }

    #[test]
    fn test_rewind() {
        let mut machine = Machine::new();
        machine.step_direct(Instruction::zero());
        machine.step_direct(Instruction::zero());
        assert_eq!(machine.clock().value().to_u32(), 2);

        let mut first = None;
        Runner::new(fast(Some(1))).run_with(&mut machine, |cycle, _| {
            first = Some(cycle.address);
            ControlFlow::Continue(())
        });
        assert_eq!(first, Some(0));

        let mut config = fast(Some(1));
        config.rewind = false;
        let mut first = None;
        Runner::new(config).run_with(&mut machine, |cycle, _| {
            first = Some(cycle.address);
            ControlFlow::Continue(())
        });
        assert_eq!(first, Some(1));
    }

    #[test]
    fn test_faults_counted() {
        let mut machine = Machine::new();
        machine.load(&[Instruction::with(Opcode::Mov, 15, 0).unwrap()]).unwrap();
        let summary = Runner::new(fast(Some(16))).run(&mut machine);
        assert_eq!(summary.faults, 1);
    }
}
