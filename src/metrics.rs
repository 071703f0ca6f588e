use std::{
    collections::HashMap,
    sync::{Mutex, OnceLock},
};

static METRICS: OnceLock<Mutex<MetricsState>> = OnceLock::new();

struct MetricsState {
    total: u64,
    errors: u64,
    per_endpoint: HashMap<&'static str, u64>,
    per_endpoint_err: HashMap<&'static str, u64>,
    // 汇率抓取成功/失败与时延统计（毫秒）
    rate_fetch_ok: u64,
    rate_fetch_err: u64,
    rate_fetch_latency_sum_ms: u128,
    // 简易直方图分桶（毫秒）：<50, <100, <250, <500, <1000, >=1000
    rate_fetch_hist_buckets: [u64; 6],
}

fn state() -> &'static Mutex<MetricsState> {
    METRICS.get_or_init(|| {
        Mutex::new(MetricsState {
            total: 0,
            errors: 0,
            per_endpoint: HashMap::new(),
            per_endpoint_err: HashMap::new(),
            rate_fetch_ok: 0,
            rate_fetch_err: 0,
            rate_fetch_latency_sum_ms: 0,
            rate_fetch_hist_buckets: [0; 6],
        })
    })
}

fn lock() -> std::sync::MutexGuard<'static, MetricsState> {
    match state().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(), // 避免因锁污染导致 panic
    }
}

pub fn count_ok(endpoint: &'static str) {
    let mut s = lock();
    s.total += 1;
    *s.per_endpoint.entry(endpoint).or_insert(0) += 1;
}

pub fn count_err(endpoint: &'static str) {
    let mut s = lock();
    s.total += 1;
    s.errors += 1;
    *s.per_endpoint_err.entry(endpoint).or_insert(0) += 1;
}

pub fn rate_fetch_ok(latency_ms: u128) {
    let mut s = lock();
    s.rate_fetch_ok += 1;
    s.rate_fetch_latency_sum_ms += latency_ms;
    let bucket = match latency_ms {
        0..=49 => 0,
        50..=99 => 1,
        100..=249 => 2,
        250..=499 => 3,
        500..=999 => 4,
        _ => 5,
    };
    s.rate_fetch_hist_buckets[bucket] += 1;
}

pub fn rate_fetch_err() {
    let mut s = lock();
    s.rate_fetch_err += 1;
}

/// Prometheus 文本格式输出
pub fn render_prometheus() -> String {
    let s = lock();
    let mut out = String::new();

    out.push_str("# TYPE fiatvault_requests_total counter\n");
    out.push_str(&format!("fiatvault_requests_total {}\n", s.total));
    out.push_str("# TYPE fiatvault_request_errors_total counter\n");
    out.push_str(&format!("fiatvault_request_errors_total {}\n", s.errors));

    out.push_str("# TYPE fiatvault_endpoint_requests_total counter\n");
    for (endpoint, count) in &s.per_endpoint {
        out.push_str(&format!(
            "fiatvault_endpoint_requests_total{{endpoint=\"{}\"}} {}\n",
            endpoint, count
        ));
    }
    out.push_str("# TYPE fiatvault_endpoint_errors_total counter\n");
    for (endpoint, count) in &s.per_endpoint_err {
        out.push_str(&format!(
            "fiatvault_endpoint_errors_total{{endpoint=\"{}\"}} {}\n",
            endpoint, count
        ));
    }

    out.push_str("# TYPE fiatvault_rate_fetch_ok_total counter\n");
    out.push_str(&format!("fiatvault_rate_fetch_ok_total {}\n", s.rate_fetch_ok));
    out.push_str("# TYPE fiatvault_rate_fetch_err_total counter\n");
    out.push_str(&format!("fiatvault_rate_fetch_err_total {}\n", s.rate_fetch_err));
    out.push_str("# TYPE fiatvault_rate_fetch_latency_ms_sum counter\n");
    out.push_str(&format!(
        "fiatvault_rate_fetch_latency_ms_sum {}\n",
        s.rate_fetch_latency_sum_ms
    ));

    let labels = ["50", "100", "250", "500", "1000", "+Inf"];
    out.push_str("# TYPE fiatvault_rate_fetch_latency_ms_bucket counter\n");
    let mut cumulative = 0u64;
    for (label, count) in labels.iter().zip(s.rate_fetch_hist_buckets.iter()) {
        cumulative += count;
        out.push_str(&format!(
            "fiatvault_rate_fetch_latency_ms_bucket{{le=\"{}\"}} {}\n",
            label, cumulative
        ));
    }

    out
}
