//! Line-oriented runner that drives a [`ProductionScheduler`] from JSON
//! commands.

use std::io::{self, BufRead, Write};

use ledger_core::producer::{ProducerId, StaticProducer};
use ledger_core::scheduler::ProductionScheduler;

use crate::protocol::{Command, Response};
use crate::scenario::Scenario;

/// Headless runner state.
#[derive(Debug)]
pub struct HeadlessRunner {
    scheduler: ProductionScheduler<StaticProducer>,
    scenario: Option<Scenario>,
    /// Tick whose scenario events have already been applied.
    events_fired_at: Option<u64>,
}

impl Default for HeadlessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessRunner {
    /// Runner with an empty engine at default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scheduler: ProductionScheduler::new(),
            scenario: None,
            events_fired_at: None,
        }
    }

    /// Runner preloaded from a scenario. Its timed events fire once, right
    /// before the pass they name, whether that pass comes from `tick` or
    /// from `advance`.
    #[must_use]
    pub fn with_scenario(scenario: Scenario) -> Self {
        Self {
            scheduler: scenario.build(),
            scenario: Some(scenario),
            events_fired_at: None,
        }
    }

    /// The engine being driven.
    #[must_use]
    pub const fn scheduler(&self) -> &ProductionScheduler<StaticProducer> {
        &self.scheduler
    }

    /// Handle one command. The flag is `true` when the runner should stop.
    pub fn handle(&mut self, command: Command) -> (Vec<Response>, bool) {
        let name = command.name();
        let responses = match command {
            Command::Tick { count } => (0..count)
                .map(|_| {
                    self.apply_due_events();
                    Response::Tick {
                        report: self.scheduler.process_production_tick(),
                    }
                })
                .collect(),
            Command::Advance { delta } => {
                let scenario = self.scenario.as_ref();
                let fired_at = &mut self.events_fired_at;
                self.scheduler
                    .advance_with(delta, |scheduler| {
                        fire_due_events(scenario, fired_at, scheduler);
                    })
                    .into_iter()
                    .map(|report| Response::Tick { report })
                    .collect()
            }
            Command::Query => vec![self.state()],
            Command::Register {
                id,
                needs,
                production,
            } => {
                if self
                    .scheduler
                    .register(ProducerId(id), StaticProducer::new(needs, production))
                {
                    vec![Response::ack(name)]
                } else {
                    vec![Response::error(
                        format!("producer {} is already registered", ProducerId(id)),
                        Some(name),
                    )]
                }
            }
            Command::Unregister { id } => match self.scheduler.unregister(ProducerId(id)) {
                Some(_) => vec![Response::ack(name)],
                None => vec![Response::error(
                    format!("producer {} is not registered", ProducerId(id)),
                    Some(name),
                )],
            },
            Command::Producer { id } => match self.scheduler.require_producer(ProducerId(id)) {
                Ok(producer) => vec![Response::Producer {
                    id,
                    last_result: producer.last_result,
                    coverage: producer.last_coverage.clone(),
                    ticks_produced: producer.ticks_produced,
                    ticks_starved: producer.ticks_starved,
                }],
                Err(e) => vec![Response::error(e.to_string(), Some(name))],
            },
            Command::SetTickRate { rate } => {
                if rate.is_nan() {
                    vec![Response::error("tick rate must be a number", Some(name))]
                } else {
                    self.scheduler.set_tick_rate(rate);
                    vec![Response::ack(name)]
                }
            }
            Command::SetMode { mode } => {
                self.scheduler.set_aggregation_mode(mode);
                vec![Response::ack(name)]
            }
            Command::Clear => {
                // The scenario's timeline no longer matches the engine.
                self.scheduler.clear_all_data();
                self.scenario = None;
                self.events_fired_at = None;
                vec![Response::ack(name)]
            }
            Command::Hash => vec![Response::StateHash {
                tick: self.scheduler.current_tick(),
                hash: self.scheduler.state_hash(),
            }],
            Command::Quit => return (vec![Response::Bye], true),
        };
        (responses, false)
    }

    /// Serve commands from `input` until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, output: &mut W) -> io::Result<()> {
        write_line(output, &Response::ready(self.scheduler.current_tick()))?;

        for line in input.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let (responses, quit) = match serde_json::from_str::<Command>(trimmed) {
                Ok(command) => self.handle(command),
                Err(e) => {
                    tracing::warn!(error = %e, "Rejected malformed command");
                    (vec![Response::error(format!("invalid command: {e}"), None)], false)
                }
            };
            for response in &responses {
                write_line(output, response)?;
            }
            output.flush()?;
            if quit {
                return Ok(());
            }
        }

        tracing::info!(tick = self.scheduler.current_tick(), "Input closed");
        Ok(())
    }

    fn state(&self) -> Response {
        Response::State {
            tick: self.scheduler.current_tick(),
            producers: self.scheduler.producer_ids().iter().map(|id| id.0).collect(),
            resources: self.scheduler.ledger().snapshot(),
            hash: self.scheduler.state_hash(),
        }
    }

    fn apply_due_events(&mut self) {
        fire_due_events(
            self.scenario.as_ref(),
            &mut self.events_fired_at,
            &mut self.scheduler,
        );
    }
}

/// Apply the events due before the next pass, unless they already fired.
fn fire_due_events(
    scenario: Option<&Scenario>,
    fired_at: &mut Option<u64>,
    scheduler: &mut ProductionScheduler<StaticProducer>,
) {
    let Some(scenario) = scenario else {
        return;
    };
    let tick = scheduler.current_tick();
    if *fired_at == Some(tick) {
        return;
    }
    *fired_at = Some(tick);
    scenario.apply_due_events(scheduler);
}

fn write_line<W: Write>(output: &mut W, response: &Response) -> io::Result<()> {
    writeln!(output, "{}", response.to_json_line())
}
