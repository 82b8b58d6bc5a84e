use prometheus::{
    register_counter_with_registry, register_gauge_with_registry,
    register_histogram_with_registry, Counter, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;
use crate::{KakuhoError, Result};

/// Metrics collector for the Kakuho client
#[derive(Clone)]
pub struct ClientMetrics {
    registry: Arc<Registry>,

    // Snapshot loading
    pub loads_started: Counter,
    pub load_failures: Counter,
    pub stale_loads_discarded: Counter,
    pub load_duration: Histogram,
    pub snapshot_reservations: Gauge,
    pub snapshot_generation: Gauge,

    // Mutations
    pub mutations: Counter,
    pub mutation_failures: Counter,
    pub reservations_rolled_back: Counter,
    pub reservations_lost: Counter,
    pub check_ins: Counter,
}

impl ClientMetrics {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let loads_started = register_counter_with_registry!(
            Opts::new("kakuho_loads_total", "Total number of snapshot loads started"),
            registry
        )?;

        let load_failures = register_counter_with_registry!(
            Opts::new("kakuho_load_failures_total", "Total number of snapshot loads that failed"),
            registry
        )?;

        let stale_loads_discarded = register_counter_with_registry!(
            Opts::new(
                "kakuho_stale_loads_discarded_total",
                "Loads whose result was dropped because a newer load had already been applied"
            ),
            registry
        )?;

        let load_duration = register_histogram_with_registry!(
            HistogramOpts::new("kakuho_load_duration_seconds", "Time spent fetching and joining a snapshot")
                .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            registry
        )?;

        let snapshot_reservations = register_gauge_with_registry!(
            Opts::new("kakuho_snapshot_reservations", "Reservations in the current snapshot"),
            registry
        )?;

        let snapshot_generation = register_gauge_with_registry!(
            Opts::new("kakuho_snapshot_generation", "Generation of the current snapshot"),
            registry
        )?;

        let mutations = register_counter_with_registry!(
            Opts::new("kakuho_mutations_total", "Total number of mutations sent to the server"),
            registry
        )?;

        let mutation_failures = register_counter_with_registry!(
            Opts::new("kakuho_mutation_failures_total", "Total number of failed mutations"),
            registry
        )?;

        let reservations_rolled_back = register_counter_with_registry!(
            Opts::new(
                "kakuho_reservations_rolled_back_total",
                "Ticket type changes undone by re-creating the original reservation"
            ),
            registry
        )?;

        let reservations_lost = register_counter_with_registry!(
            Opts::new(
                "kakuho_reservations_lost_total",
                "Reservations deleted during a ticket type change and not restored"
            ),
            registry
        )?;

        let check_ins = register_counter_with_registry!(
            Opts::new("kakuho_check_ins_total", "Reservations marked paid at the check-in desk"),
            registry
        )?;

        Ok(Self {
            registry,
            loads_started,
            load_failures,
            stale_loads_discarded,
            load_duration,
            snapshot_reservations,
            snapshot_generation,
            mutations,
            mutation_failures,
            reservations_rolled_back,
            reservations_lost,
            check_ins,
        })
    }

    /// Export metrics in Prometheus format
    pub fn export(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| KakuhoError::InvalidArgument(format!("Metrics are not UTF-8: {}", e)))
    }

    pub fn record_load(&self, duration: std::time::Duration, success: bool) {
        self.load_duration.observe(duration.as_secs_f64());
        if !success {
            self.load_failures.inc();
        }
    }

    pub fn record_snapshot(&self, generation: u64, reservations: usize) {
        self.snapshot_generation.set(generation as f64);
        self.snapshot_reservations.set(reservations as f64);
    }

    pub fn record_mutation(&self, success: bool) {
        self.mutations.inc();
        if !success {
            self.mutation_failures.inc();
        }
    }
}
