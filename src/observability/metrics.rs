use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub bookings_total: IntCounterVec,
    pub status_transitions_total: IntCounterVec,
    pub assignments_total: IntCounterVec,
    pub assignment_latency_seconds: HistogramVec,
    pub bookings_in_queue: IntGauge,
    pub notifications_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let bookings_total = IntCounterVec::new(
            Opts::new("bookings_total", "Bookings created by vehicle class"),
            &["vehicle"],
        )
        .expect("valid bookings_total metric");

        let status_transitions_total = IntCounterVec::new(
            Opts::new(
                "status_transitions_total",
                "Booking lifecycle transitions by resulting status",
            ),
            &["status"],
        )
        .expect("valid status_transitions_total metric");

        let assignments_total = IntCounterVec::new(
            Opts::new("assignments_total", "Driver assignments by outcome"),
            &["outcome"],
        )
        .expect("valid assignments_total metric");

        let assignment_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "assignment_latency_seconds",
                "Latency of automatic driver assignment in seconds",
            ),
            &["outcome"],
        )
        .expect("valid assignment_latency_seconds metric");

        let bookings_in_queue = IntGauge::new(
            "bookings_in_queue",
            "Bookings waiting for automatic assignment",
        )
        .expect("valid bookings_in_queue metric");

        let notifications_total = IntCounterVec::new(
            Opts::new("notifications_total", "Notifications by outcome"),
            &["outcome"],
        )
        .expect("valid notifications_total metric");

        registry
            .register(Box::new(bookings_total.clone()))
            .expect("register bookings_total");
        registry
            .register(Box::new(status_transitions_total.clone()))
            .expect("register status_transitions_total");
        registry
            .register(Box::new(assignments_total.clone()))
            .expect("register assignments_total");
        registry
            .register(Box::new(assignment_latency_seconds.clone()))
            .expect("register assignment_latency_seconds");
        registry
            .register(Box::new(bookings_in_queue.clone()))
            .expect("register bookings_in_queue");
        registry
            .register(Box::new(notifications_total.clone()))
            .expect("register notifications_total");

        Self {
            registry,
            bookings_total,
            status_transitions_total,
            assignments_total,
            assignment_latency_seconds,
            bookings_in_queue,
            notifications_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
