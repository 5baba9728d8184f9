//! Fluent builder for constructing a [`Sim`].

use std::sync::Arc;

use tracing::debug;

use qs_core::{RequestIdGenerator, ServiceTimeModel, SimConfig, SimRng, SpecialistId, Client};
use qs_pool::Specialist;
use qs_queue::AdmissionBuffer;
use qs_stats::{Aggregator, CsvSink, MetricsSink, SnapshotEmitter};

use crate::{Sim, SimResult};

/// Fluent builder for [`Sim`].
///
/// # Optional inputs (have defaults)
///
/// | Method                 | Default                                       |
/// |------------------------|-----------------------------------------------|
/// | `.sink(s)`             | `CsvSink` at `config.metrics_path`            |
/// | `.service_model(m)`    | each group's configured `ServiceTime`         |
///
/// # Example
///
/// ```rust,ignore
/// let sim = SimBuilder::new(config)
///     .sink(Box::new(CsvSink::from_writer(std::io::stdout())))
///     .build()?;
/// ```
pub struct SimBuilder {
    config:  SimConfig,
    sink:    Option<Box<dyn MetricsSink>>,
    service: Option<Arc<dyn ServiceTimeModel>>,
}

impl SimBuilder {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            sink: None,
            service: None,
        }
    }

    /// Write the metrics log to `sink` instead of a CSV file.
    pub fn sink(mut self, sink: Box<dyn MetricsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Use `model` for every specialist, ignoring the groups' `service`
    /// settings.  Each specialist still keeps its group's `lambda`.
    pub fn service_model(mut self, model: Arc<dyn ServiceTimeModel>) -> Self {
        self.service = Some(model);
        self
    }

    /// Validate the config, open the metrics sink and write its header, and
    /// return a ready-to-run [`Sim`].
    ///
    /// Any failure here happens before a single request is generated.
    pub fn build(self) -> SimResult<Sim> {
        self.config.validate()?;
        let config = self.config;

        let buffer = Arc::new(AdmissionBuffer::new(config.buffer_capacity, config.overflow)?);

        let mut specialists = Vec::with_capacity(config.specialist_count());
        for group in &config.groups {
            let model: Arc<dyn ServiceTimeModel> = match &self.service {
                Some(m) => Arc::clone(m),
                None => Arc::new(group.service.clone()),
            };
            for _ in 0..group.count {
                let id = SpecialistId(specialists.len() as u32);
                specialists.push(Specialist::new(id, group.lambda, Arc::clone(&model)));
            }
        }

        let sink = match self.sink {
            Some(s) => s,
            None => Box::new(CsvSink::from_path(&config.metrics_path)?),
        };
        let emitter = SnapshotEmitter::spawn(sink, specialists.len())?;
        let stats = Arc::new(Aggregator::new(specialists.len(), config.snapshot_interval()));

        let clients = Client::population(config.client_count);
        let rng = SimRng::seeded_or_entropy(config.seed);
        debug!(
            specialists = specialists.len(),
            clients = clients.len(),
            capacity = config.buffer_capacity,
            "sim built"
        );

        Ok(Sim {
            config,
            buffer,
            specialists,
            stats,
            emitter,
            clients,
            ids: RequestIdGenerator::new(),
            rng,
        })
    }
}
