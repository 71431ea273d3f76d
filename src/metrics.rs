use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{
    Counter, CounterVec, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry,
};
use std::sync::Once;
use std::time::{Duration, Instant};

use crate::cpu::CPU;
use crate::status::Flag;

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Counter for total CPU instructions executed by opcode
    pub static ref CPU_INSTRUCTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("cpu_instructions_total", "Total number of CPU instructions executed by opcode"),
        &["opcode", "instruction"]
    ).expect("Failed to create CPU instructions counter");

    /// Counter for CPU clock cycles, charged per instruction at fetch and per reset
    pub static ref CPU_CYCLES_TOTAL: Counter = Counter::new(
        "cpu_cycles_total", "Total number of CPU cycles executed"
    ).expect("Failed to create CPU cycles counter");

    /// Histogram for instruction execution time
    pub static ref INSTRUCTION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new("instruction_duration_seconds", "Time spent executing instructions")
            .buckets(vec![0.000001, 0.000005, 0.00001, 0.00005, 0.0001, 0.0005, 0.001]),
        &["instruction"]
    ).expect("Failed to create instruction duration histogram");

    /// Counter for API requests by endpoint and method
    pub static ref API_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("api_requests_total", "Total number of API requests"),
        &["method", "endpoint", "status"]
    ).expect("Failed to create API requests counter");

    /// Histogram for API request duration
    pub static ref API_REQUEST_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new("api_request_duration_seconds", "API request duration")
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["method", "endpoint"]
    ).expect("Failed to create API request duration histogram");

    /// Gauge for live processor instances
    pub static ref ACTIVE_EMULATORS: Gauge = Gauge::new(
        "active_emulators_total", "Number of active emulator instances"
    ).expect("Failed to create active emulators gauge");

    /// Gauge for CPU register values by emulator ID
    pub static ref CPU_REGISTER_VALUES: GaugeVec = GaugeVec::new(
        Opts::new("cpu_register_value", "Current CPU register values"),
        &["emulator_id", "register"]
    ).expect("Failed to create CPU register values gauge");

    /// Gauge for CPU flags by emulator ID
    pub static ref CPU_FLAGS: GaugeVec = GaugeVec::new(
        Opts::new("cpu_flags", "Current CPU flag states (0 or 1)"),
        &["emulator_id", "flag"]
    ).expect("Failed to create CPU flags gauge");

    /// Counter for inspector memory reads
    pub static ref MEMORY_OPERATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("memory_operations_total", "Total memory inspection operations"),
        &["operation", "emulator_id"]
    ).expect("Failed to create memory operations counter");

    /// Counter for emulator resets
    pub static ref EMULATOR_RESETS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("emulator_resets_total", "Total number of emulator resets"),
        &["emulator_id"]
    ).expect("Failed to create emulator resets counter");

    /// Counter for program loads
    pub static ref PROGRAM_LOADS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("program_loads_total", "Total number of programs loaded"),
        &["emulator_id"]
    ).expect("Failed to create program loads counter");

    /// Counter for snapshot captures and restores
    pub static ref SNAPSHOT_OPERATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("snapshot_operations_total", "Total snapshot captures and restores"),
        &["operation"]
    ).expect("Failed to create snapshot operations counter");
}

static INIT: Once = Once::new();

fn register<C: Collector + Clone + 'static>(collector: &C, name: &str) {
    if let Err(e) = REGISTRY.register(Box::new(collector.clone())) {
        eprintln!("Failed to register {} metric: {}", name, e);
    }
}

/// Registers every metric with the global registry. Safe to call more than
/// once.
pub fn init_metrics() {
    INIT.call_once(|| {
        register(&*CPU_INSTRUCTIONS_TOTAL, "cpu_instructions_total");
        register(&*CPU_CYCLES_TOTAL, "cpu_cycles_total");
        register(&*INSTRUCTION_DURATION, "instruction_duration_seconds");
        register(&*API_REQUESTS_TOTAL, "api_requests_total");
        register(&*API_REQUEST_DURATION, "api_request_duration_seconds");
        register(&*ACTIVE_EMULATORS, "active_emulators_total");
        register(&*CPU_REGISTER_VALUES, "cpu_register_value");
        register(&*CPU_FLAGS, "cpu_flags");
        register(&*MEMORY_OPERATIONS_TOTAL, "memory_operations_total");
        register(&*EMULATOR_RESETS_TOTAL, "emulator_resets_total");
        register(&*PROGRAM_LOADS_TOTAL, "program_loads_total");
        register(&*SNAPSHOT_OPERATIONS_TOTAL, "snapshot_operations_total");
    });
}

/// Record a fetched-and-executed instruction
pub fn record_instruction(opcode: u8, instruction_name: &str, duration: Duration) {
    let opcode_label = format!("0x{:02X}", opcode);
    CPU_INSTRUCTIONS_TOTAL
        .with_label_values(&[opcode_label.as_str(), instruction_name])
        .inc();

    INSTRUCTION_DURATION
        .with_label_values(&[instruction_name])
        .observe(duration.as_secs_f64());
}

/// Record clock cycles owed by a fetched instruction or a reset
pub fn record_cycles(count: u64) {
    if count > 0 {
        CPU_CYCLES_TOTAL.inc_by(count as f64);
    }
}

/// Record an API request
pub fn record_api_request(method: &str, endpoint: &str, status: u16, duration: Duration) {
    let status_label = status.to_string();
    API_REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, status_label.as_str()])
        .inc();

    API_REQUEST_DURATION
        .with_label_values(&[method, endpoint])
        .observe(duration.as_secs_f64());
}

/// Update emulator count
pub fn set_active_emulators(count: usize) {
    ACTIVE_EMULATORS.set(count as f64);
}

/// Update register and flag gauges for an emulator
pub fn update_cpu_registers(emulator_id: &str, cpu: &CPU) {
    let registers: [(&str, f64); 6] = [
        ("A", cpu.get_register_a() as f64),
        ("X", cpu.get_register_x() as f64),
        ("Y", cpu.get_register_y() as f64),
        ("PC", cpu.get_pc() as f64),
        ("SP", cpu.get_sp() as f64),
        ("STATUS", cpu.get_status() as f64),
    ];

    for (register, value) in registers {
        CPU_REGISTER_VALUES
            .with_label_values(&[emulator_id, register])
            .set(value);
    }

    update_cpu_flags(emulator_id, cpu);
}

/// Update CPU flag metrics for an emulator
pub fn update_cpu_flags(emulator_id: &str, cpu: &CPU) {
    for flag in Flag::ALL.iter().filter(|flag| **flag != Flag::Unused) {
        CPU_FLAGS
            .with_label_values(&[emulator_id, flag.name()])
            .set(if cpu.get_flag(*flag) { 1.0 } else { 0.0 });
    }
}

/// Drop the per-emulator gauges of a deleted emulator
pub fn forget_emulator(emulator_id: &str) {
    for register in ["A", "X", "Y", "PC", "SP", "STATUS"] {
        let _ = CPU_REGISTER_VALUES.remove_label_values(&[emulator_id, register]);
    }
    for flag in Flag::ALL {
        let _ = CPU_FLAGS.remove_label_values(&[emulator_id, flag.name()]);
    }
}

/// Record a memory inspection
pub fn record_memory_operation(operation: &str, emulator_id: &str) {
    MEMORY_OPERATIONS_TOTAL
        .with_label_values(&[operation, emulator_id])
        .inc();
}

/// Record an emulator reset
pub fn record_emulator_reset(emulator_id: &str) {
    EMULATOR_RESETS_TOTAL
        .with_label_values(&[emulator_id])
        .inc();
}

/// Record a program load
pub fn record_program_load(emulator_id: &str) {
    PROGRAM_LOADS_TOTAL
        .with_label_values(&[emulator_id])
        .inc();
}

/// Record a snapshot capture or restore
pub fn record_snapshot_operation(operation: &str) {
    SNAPSHOT_OPERATIONS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

/// Helper struct for timing operations
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
