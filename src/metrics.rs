use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("gateway_requests_total", "Total number of rate limited route requests")
            .expect("register gateway_requests_total");
    pub static ref RATE_LIMITED: Counter =
        register_counter!("gateway_rate_limited_total", "Requests rejected with 429")
            .expect("register gateway_rate_limited_total");
    pub static ref TRACKED_CLIENTS: Gauge =
        register_gauge!("gateway_tracked_clients", "Client identifiers currently holding a limiter")
            .expect("register gateway_tracked_clients");
    pub static ref EVICTED_CLIENTS: Counter =
        register_counter!("gateway_evicted_clients_total", "Idle limiters removed by the sweeper")
            .expect("register gateway_evicted_clients_total");
    pub static ref UPSTREAM_LATENCY: Histogram = register_histogram!(
        "gateway_upstream_latency_seconds",
        "Upstream podcast request latency in seconds"
    )
    .expect("register gateway_upstream_latency_seconds");
}
