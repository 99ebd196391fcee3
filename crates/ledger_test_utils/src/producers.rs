//! Producer test doubles.
//!
//! [`RecordingProducer`]s share a [`CallLog`] so a test can assert the exact
//! order in which the scheduler called every producer in a pass.
//! [`ScriptedProducer`] changes its declarations from tick to tick, which
//! checks that the scheduler asks again every pass rather than caching.

use std::cell::RefCell;
use std::rc::Rc;

use ledger_core::producer::{Producer, ProducerId};
use ledger_core::resource::ResourceAmounts;

/// One call the scheduler made on a recording producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `resource_production` was queried.
    Production(ProducerId),
    /// `resource_needs` was queried.
    Needs(ProducerId),
    /// A coverage report was delivered.
    Coverage(ProducerId, ResourceAmounts),
    /// The admission result was delivered.
    Tick(ProducerId, bool),
}

/// Shared, ordered record of calls across producers.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    /// Copy of every call so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    /// Only the admission results, in delivery order.
    #[must_use]
    pub fn ticks(&self) -> Vec<(ProducerId, bool)> {
        self.0
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Tick(id, ok) => Some((*id, *ok)),
                _ => None,
            })
            .collect()
    }

    /// Forget every recorded call.
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Producer that records every call the scheduler makes on it.
#[derive(Debug, Clone)]
pub struct RecordingProducer {
    id: ProducerId,
    needs: ResourceAmounts,
    production: ResourceAmounts,
    log: CallLog,
}

impl RecordingProducer {
    /// Create a recording producer writing to `log`.
    #[must_use]
    pub fn new(
        id: ProducerId,
        needs: ResourceAmounts,
        production: ResourceAmounts,
        log: &CallLog,
    ) -> Self {
        Self {
            id,
            needs,
            production,
            log: log.clone(),
        }
    }

    /// Identity this producer logs under.
    #[must_use]
    pub const fn id(&self) -> ProducerId {
        self.id
    }
}

impl Producer for RecordingProducer {
    fn resource_needs(&self) -> ResourceAmounts {
        self.log.push(Call::Needs(self.id));
        self.needs.clone()
    }

    fn resource_production(&self) -> ResourceAmounts {
        self.log.push(Call::Production(self.id));
        self.production.clone()
    }

    fn on_production_tick(&mut self, can_produce: bool) {
        self.log.push(Call::Tick(self.id, can_produce));
    }

    fn set_needs_coverage(&mut self, coverage: &ResourceAmounts) {
        self.log.push(Call::Coverage(self.id, coverage.clone()));
    }
}

/// Producer whose needs and production follow a per-tick script.
///
/// Tick `n` uses entry `n % len` of each script; an empty script means
/// nothing needed or produced.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProducer {
    needs: Vec<ResourceAmounts>,
    production: Vec<ResourceAmounts>,
    ticks_seen: usize,
    /// Every admission result received, in order.
    pub results: Vec<bool>,
}

impl ScriptedProducer {
    /// Create a scripted producer.
    #[must_use]
    pub fn new(needs: Vec<ResourceAmounts>, production: Vec<ResourceAmounts>) -> Self {
        Self {
            needs,
            production,
            ..Self::default()
        }
    }

    fn current(script: &[ResourceAmounts], tick: usize) -> ResourceAmounts {
        if script.is_empty() {
            ResourceAmounts::new()
        } else {
            script[tick % script.len()].clone()
        }
    }
}

impl Producer for ScriptedProducer {
    fn resource_needs(&self) -> ResourceAmounts {
        Self::current(&self.needs, self.ticks_seen)
    }

    fn resource_production(&self) -> ResourceAmounts {
        Self::current(&self.production, self.ticks_seen)
    }

    fn on_production_tick(&mut self, can_produce: bool) {
        self.results.push(can_produce);
        self.ticks_seen += 1;
    }
}
