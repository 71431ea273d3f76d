//! HTTP inspection service: drives processor instances (reset, tick, step)
//! and exposes their registers, memory and disassembly as JSON.

use chrono::{DateTime, Utc};
use prometheus::Encoder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::Filter;

use crate::cpu::CPU;
use crate::disassembler::{disassemble, disassemble_range, DisassembledInstruction};
use crate::loader::Image;
use crate::metrics::{
    forget_emulator, init_metrics, record_api_request, record_emulator_reset,
    record_memory_operation, record_program_load, record_snapshot_operation,
    set_active_emulators, update_cpu_registers, Timer, REGISTRY,
};
use crate::opcodes::lookup;
use crate::snapshots::{Snapshot, SnapshotError, SnapshotStore, SnapshotSummary};
use crate::status::Flag;

/// Upper bound on ticks or instructions run by a single request.
pub const MAX_RUN_PER_REQUEST: u32 = 1_000_000;
const DEFAULT_DISASSEMBLY_LINES: usize = 16;
const MAX_DISASSEMBLY_LINES: usize = 256;
const MAX_BODY_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, Serialize)]
pub struct FlagState {
    pub carry: bool,
    pub zero: bool,
    pub interrupt_disable: bool,
    pub decimal: bool,
    pub break_command: bool,
    pub overflow: bool,
    pub negative: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CpuState {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub pc: u16,
    pub sp: u8,
    pub status: u8,
    pub flags: FlagState,
    pub opcode: u8,
    pub instruction: &'static str,
    pub next_instruction: String,
    pub wait_cycles: u8,
    pub cycles: u64,
    pub instructions: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmulatorState {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub cpu: CpuState,
}

#[derive(Debug, Deserialize)]
pub struct TickRequest {
    pub ticks: u32,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteSteps {
    pub steps: u32,
}

#[derive(Debug, Serialize)]
pub struct StepResult {
    pub cycles: u8,
    pub state: CpuState,
}

#[derive(Debug, Serialize)]
pub struct ExecutionResult {
    pub steps_executed: u32,
    pub cycles: u64,
    pub final_state: CpuState,
}

#[derive(Debug, Deserialize)]
pub struct ProgramLoad {
    pub address: u16,
    pub data: Vec<u8>,
}

#[derive(Debug, Deserialize)]
pub struct MemoryRead {
    pub address: u16,
    pub length: Option<u16>,
}

#[derive(Debug, Serialize)]
pub struct MemoryData {
    pub address: u16,
    pub data: Vec<u8>,
}

#[derive(Debug, Deserialize)]
pub struct DisassemblyQuery {
    pub address: Option<u16>,
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DisassemblyLine {
    pub address: u16,
    pub bytes: Vec<u8>,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSnapshotRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RestoreSnapshotRequest {
    pub snapshot_id: String,
}

#[derive(Debug, Serialize)]
pub struct SnapshotListResponse {
    pub snapshots: Vec<SnapshotSummary>,
    pub total_count: usize,
    pub total_size_bytes: u64,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    EmulatorNotFound(String),
    SnapshotNotFound(String),
    TooMuchWork(u32),
    BadSnapshot(SnapshotError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::EmulatorNotFound(_) | Self::SnapshotNotFound(_) => StatusCode::NOT_FOUND,
            Self::TooMuchWork(_) => StatusCode::BAD_REQUEST,
            Self::BadSnapshot(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmulatorNotFound(id) => write!(f, "Emulator {} not found", id),
            Self::SnapshotNotFound(id) => write!(f, "Snapshot {} not found", id),
            Self::TooMuchWork(requested) => write!(
                f,
                "Requested {} iterations, limit is {}",
                requested, MAX_RUN_PER_REQUEST
            ),
            Self::BadSnapshot(e) => write!(f, "Snapshot cannot be restored: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

/// One processor instance owned by the service.
pub struct Emulator {
    pub cpu: CPU,
    pub created_at: DateTime<Utc>,
}

impl Emulator {
    /// New processor with the boot image (if any) loaded and reset applied.
    pub fn boot(image: Option<&Image>) -> Self {
        let mut cpu = CPU::new();
        if let Some(image) = image {
            image.load_into(&mut cpu);
        }
        cpu.reset();

        Self {
            cpu,
            created_at: Utc::now(),
        }
    }

    pub fn get_state(&self) -> CpuState {
        let cpu = &self.cpu;
        CpuState {
            a: cpu.get_register_a(),
            x: cpu.get_register_x(),
            y: cpu.get_register_y(),
            pc: cpu.get_pc(),
            sp: cpu.get_sp(),
            status: cpu.get_status(),
            flags: FlagState {
                carry: cpu.get_flag(Flag::Carry),
                zero: cpu.get_flag(Flag::Zero),
                interrupt_disable: cpu.get_flag(Flag::InterruptDisable),
                decimal: cpu.get_flag(Flag::Decimal),
                break_command: cpu.get_flag(Flag::Break),
                overflow: cpu.get_flag(Flag::Overflow),
                negative: cpu.get_flag(Flag::Negative),
            },
            opcode: cpu.opcode(),
            instruction: lookup(cpu.opcode()).operation.mnemonic(),
            next_instruction: disassemble(cpu.memory(), cpu.get_pc()).text(),
            wait_cycles: cpu.wait_cycles(),
            cycles: cpu.cycles(),
            instructions: cpu.instructions(),
        }
    }

    fn describe(&self, id: &str) -> EmulatorState {
        EmulatorState {
            id: id.to_string(),
            created_at: self.created_at,
            cpu: self.get_state(),
        }
    }

    pub fn tick(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.cpu.tick();
        }
    }

    pub fn execute_steps(&mut self, steps: u32) -> ExecutionResult {
        let mut cycles = 0u64;
        for _ in 0..steps {
            cycles += self.cpu.step() as u64;
        }

        ExecutionResult {
            steps_executed: steps,
            cycles,
            final_state: self.get_state(),
        }
    }
}

type EmulatorMap = Arc<Mutex<HashMap<String, Emulator>>>;

/// Everything the handlers share.
#[derive(Clone)]
pub struct AppState {
    emulators: EmulatorMap,
    snapshots: SnapshotStore,
    boot_image: Option<Arc<Image>>,
}

impl AppState {
    pub fn new(boot_image: Option<Image>) -> Self {
        Self {
            emulators: Arc::new(Mutex::new(HashMap::new())),
            snapshots: Arc::new(Mutex::new(HashMap::new())),
            boot_image: boot_image.map(Arc::new),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn with_emulator<T>(
    state: &AppState,
    id: &str,
    f: impl FnOnce(&mut Emulator) -> T,
) -> Result<T, ApiError> {
    let mut emulators = lock(&state.emulators);
    let emulator = emulators
        .get_mut(id)
        .ok_or_else(|| ApiError::EmulatorNotFound(id.to_string()))?;

    let result = f(emulator);
    update_cpu_registers(id, &emulator.cpu);
    Ok(result)
}

fn check_budget(requested: u32) -> Result<(), ApiError> {
    if requested > MAX_RUN_PER_REQUEST {
        return Err(ApiError::TooMuchWork(requested));
    }
    Ok(())
}

fn finish<T: Serialize>(
    method: &str,
    endpoint: &str,
    timer: Timer,
    result: Result<T, ApiError>,
) -> WithStatus<Json> {
    let (reply, status) = match result {
        Ok(data) => (warp::reply::json(&ApiResponse::success(data)), StatusCode::OK),
        Err(e) => (
            warp::reply::json(&ApiResponse::<T>::error(e.to_string())),
            e.status(),
        ),
    };

    record_api_request(method, endpoint, status.as_u16(), timer.elapsed());
    warp::reply::with_status(reply, status)
}

fn with_state(
    state: AppState,
) -> impl Filter<Extract = (AppState,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// All routes of the service.
pub fn routes(
    state: AppState,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let json_body = || warp::body::content_length_limit(MAX_BODY_BYTES);

    // Create new emulator instance
    let create_emulator = warp::path("emulator")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(create_emulator_handler);

    // List emulators
    let list_emulators = warp::path("emulators")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(list_emulators_handler);

    // Get emulator state
    let get_state = warp::path!("emulator" / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(get_state_handler);

    // Delete emulator
    let delete_emulator = warp::path!("emulator" / String)
        .and(warp::delete())
        .and(with_state(state.clone()))
        .and_then(delete_emulator_handler);

    let reset_emulator = warp::path!("emulator" / String / "reset")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(reset_handler);

    // Cycle-granular progress
    let tick_emulator = warp::path!("emulator" / String / "tick")
        .and(warp::post())
        .and(json_body())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(tick_handler);

    // Instruction-granular progress
    let step_emulator = warp::path!("emulator" / String / "step")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(step_handler);

    let execute_steps = warp::path!("emulator" / String / "execute")
        .and(warp::post())
        .and(json_body())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(execute_handler);

    let load_program = warp::path!("emulator" / String / "program")
        .and(warp::post())
        .and(json_body())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(load_program_handler);

    let read_memory = warp::path!("emulator" / String / "memory")
        .and(warp::get())
        .and(warp::query::<MemoryRead>())
        .and(with_state(state.clone()))
        .and_then(read_memory_handler);

    let disassembly = warp::path!("emulator" / String / "disassembly")
        .and(warp::get())
        .and(warp::query::<DisassemblyQuery>())
        .and(with_state(state.clone()))
        .and_then(disassembly_handler);

    let create_snapshot = warp::path!("emulator" / String / "snapshots")
        .and(warp::post())
        .and(json_body())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(create_snapshot_handler);

    let list_snapshots = warp::path("snapshots")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(list_snapshots_handler);

    let restore_snapshot = warp::path!("emulator" / String / "restore")
        .and(warp::post())
        .and(json_body())
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(restore_snapshot_handler);

    // Metrics endpoint
    let metrics = warp::path("metrics")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(metrics_handler);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST", "DELETE"]);

    create_emulator
        .or(list_emulators)
        .or(get_state)
        .or(delete_emulator)
        .or(reset_emulator)
        .or(tick_emulator)
        .or(step_emulator)
        .or(execute_steps)
        .or(load_program)
        .or(read_memory)
        .or(disassembly)
        .or(create_snapshot)
        .or(list_snapshots)
        .or(restore_snapshot)
        .or(metrics)
        .with(cors)
}

pub async fn run_server(state: AppState, port: u16) {
    init_metrics();

    println!("=== step6502 inspection service ===");
    if let Some(image) = &state.boot_image {
        println!(
            "Boot image: {} bytes at ${:04X}",
            image.bytes.len(),
            image.offset
        );
    }

    println!("Listening on http://localhost:{}", port);
    println!("API:");
    println!("  POST   /emulator                  - Create processor (boot image loaded, reset)");
    println!("  GET    /emulators                 - List processors");
    println!("  GET    /emulator/:id              - Registers, flags and timing state");
    println!("  DELETE /emulator/:id              - Delete processor");
    println!("  POST   /emulator/:id/reset        - Reset");
    println!("  POST   /emulator/:id/tick         - Run clock cycles {{\"ticks\": n}}");
    println!("  POST   /emulator/:id/step         - Run one full instruction");
    println!("  POST   /emulator/:id/execute      - Run instructions {{\"steps\": n}}");
    println!("  POST   /emulator/:id/program      - Load bytes {{\"address\", \"data\"}}");
    println!("  GET    /emulator/:id/memory       - Read memory ?address=&length=");
    println!("  GET    /emulator/:id/disassembly  - Disassemble ?address=&count=");
    println!("  POST   /emulator/:id/snapshots    - Capture snapshot");
    println!("  GET    /snapshots                 - List snapshots");
    println!("  POST   /emulator/:id/restore      - Restore snapshot {{\"snapshot_id\"}}");
    println!("  GET    /metrics                   - Prometheus metrics");

    warp::serve(routes(state)).run(([127, 0, 0, 1], port)).await;
}

async fn create_emulator_handler(state: AppState) -> Result<impl warp::Reply, warp::Rejection> {
    let timer = Timer::new();
    let id = Uuid::new_v4().to_string();
    let emulator = Emulator::boot(state.boot_image.as_deref());
    let description = emulator.describe(&id);

    update_cpu_registers(&id, &emulator.cpu);
    {
        let mut emulators = lock(&state.emulators);
        emulators.insert(id, emulator);
        set_active_emulators(emulators.len());
    }

    Ok(finish("POST", "/emulator", timer, Ok(description)))
}

async fn list_emulators_handler(state: AppState) -> Result<impl warp::Reply, warp::Rejection> {
    let timer = Timer::new();
    let emulators = lock(&state.emulators);

    let emulator_list: Vec<EmulatorState> = emulators
        .iter()
        .map(|(id, emulator)| emulator.describe(id))
        .collect();

    Ok(finish("GET", "/emulators", timer, Ok(emulator_list)))
}

async fn get_state_handler(id: String, state: AppState) -> Result<impl warp::Reply, warp::Rejection> {
    let timer = Timer::new();
    let result = with_emulator(&state, &id, |emulator| emulator.describe(&id));

    Ok(finish("GET", "/emulator/:id", timer, result))
}

async fn delete_emulator_handler(id: String, state: AppState) -> Result<impl warp::Reply, warp::Rejection> {
    let timer = Timer::new();
    let mut emulators = lock(&state.emulators);

    let result = match emulators.remove(&id) {
        Some(_) => {
            set_active_emulators(emulators.len());
            forget_emulator(&id);
            Ok(format!("Emulator {} deleted", id))
        }
        None => Err(ApiError::EmulatorNotFound(id)),
    };

    Ok(finish("DELETE", "/emulator/:id", timer, result))
}

async fn reset_handler(id: String, state: AppState) -> Result<impl warp::Reply, warp::Rejection> {
    let timer = Timer::new();
    let result = with_emulator(&state, &id, |emulator| {
        emulator.cpu.reset();
        emulator.describe(&id)
    });
    if result.is_ok() {
        record_emulator_reset(&id);
    }

    Ok(finish("POST", "/emulator/:id/reset", timer, result))
}

async fn tick_handler(
    id: String,
    request: TickRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let timer = Timer::new();
    let result = check_budget(request.ticks).and_then(|_| {
        with_emulator(&state, &id, |emulator| {
            emulator.tick(request.ticks);
            emulator.get_state()
        })
    });

    Ok(finish("POST", "/emulator/:id/tick", timer, result))
}

async fn step_handler(id: String, state: AppState) -> Result<impl warp::Reply, warp::Rejection> {
    let timer = Timer::new();
    let result = with_emulator(&state, &id, |emulator| {
        let cycles = emulator.cpu.step();
        StepResult {
            cycles,
            state: emulator.get_state(),
        }
    });

    Ok(finish("POST", "/emulator/:id/step", timer, result))
}

async fn execute_handler(
    id: String,
    request: ExecuteSteps,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let timer = Timer::new();
    let result = check_budget(request.steps).and_then(|_| {
        with_emulator(&state, &id, |emulator| emulator.execute_steps(request.steps))
    });

    Ok(finish("POST", "/emulator/:id/execute", timer, result))
}

async fn load_program_handler(
    id: String,
    request: ProgramLoad,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let timer = Timer::new();
    let result = with_emulator(&state, &id, |emulator| {
        let written = emulator.cpu.load(request.address, &request.data);
        format!("Loaded {} bytes at address ${:04X}", written, request.address)
    });
    if result.is_ok() {
        record_program_load(&id);
    }

    Ok(finish("POST", "/emulator/:id/program", timer, result))
}

async fn read_memory_handler(
    id: String,
    query: MemoryRead,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let timer = Timer::new();
    let length = query.length.unwrap_or(1) as usize;
    let result = with_emulator(&state, &id, |emulator| MemoryData {
        address: query.address,
        data: emulator.cpu.read_range(query.address, length),
    });
    if result.is_ok() {
        record_memory_operation("read", &id);
    }

    Ok(finish("GET", "/emulator/:id/memory", timer, result))
}

async fn disassembly_handler(
    id: String,
    query: DisassemblyQuery,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let timer = Timer::new();
    let count = query
        .count
        .unwrap_or(DEFAULT_DISASSEMBLY_LINES)
        .min(MAX_DISASSEMBLY_LINES);

    let result = with_emulator(&state, &id, |emulator| {
        let address = query.address.unwrap_or_else(|| emulator.cpu.get_pc());
        disassemble_range(emulator.cpu.memory(), address, count)
            .into_iter()
            .map(|instruction: DisassembledInstruction| DisassemblyLine {
                address: instruction.address,
                text: instruction.text(),
                bytes: instruction.bytes,
            })
            .collect::<Vec<_>>()
    });
    if result.is_ok() {
        record_memory_operation("disassemble", &id);
    }

    Ok(finish("GET", "/emulator/:id/disassembly", timer, result))
}

async fn create_snapshot_handler(
    id: String,
    request: CreateSnapshotRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let timer = Timer::new();
    let name = request.name.unwrap_or_else(|| format!("{} @ {}", id, Utc::now()));

    let result = with_emulator(&state, &id, |emulator| Snapshot::capture(name, &emulator.cpu))
        .map(|snapshot| {
            let summary = snapshot.summary();
            lock(&state.snapshots).insert(snapshot.id.clone(), snapshot);
            record_snapshot_operation("capture");
            summary
        });

    Ok(finish("POST", "/emulator/:id/snapshots", timer, result))
}

async fn list_snapshots_handler(state: AppState) -> Result<impl warp::Reply, warp::Rejection> {
    let timer = Timer::new();
    let snapshots = lock(&state.snapshots);

    let mut summaries: Vec<SnapshotSummary> = snapshots.values().map(Snapshot::summary).collect();
    summaries.sort_by_key(|summary| summary.created_at);

    let response = SnapshotListResponse {
        total_count: summaries.len(),
        total_size_bytes: summaries.iter().map(|summary| summary.size_bytes).sum(),
        snapshots: summaries,
    };

    Ok(finish("GET", "/snapshots", timer, Ok(response)))
}

async fn restore_snapshot_handler(
    id: String,
    request: RestoreSnapshotRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let timer = Timer::new();
    let snapshot = lock(&state.snapshots).get(&request.snapshot_id).cloned();

    let result = match snapshot {
        Some(snapshot) => with_emulator(&state, &id, |emulator| {
            snapshot
                .restore_into(&mut emulator.cpu)
                .map(|_| emulator.describe(&id))
        })
        .and_then(|restored| restored.map_err(ApiError::BadSnapshot)),
        None => Err(ApiError::SnapshotNotFound(request.snapshot_id)),
    };
    if result.is_ok() {
        record_snapshot_operation("restore");
    }

    Ok(finish("POST", "/emulator/:id/restore", timer, result))
}

async fn metrics_handler() -> Result<impl warp::Reply, warp::Rejection> {
    let timer = Timer::new();
    let encoder = prometheus::TextEncoder::new();
    let metric_families = REGISTRY.gather();

    match encoder.encode_to_string(&metric_families) {
        Ok(metrics_text) => {
            record_api_request("GET", "/metrics", 200, timer.elapsed());
            Ok(warp::reply::with_header(
                metrics_text,
                "content-type",
                "text/plain; version=0.0.4",
            ))
        }
        Err(e) => {
            eprintln!("Error encoding metrics: {}", e);
            record_api_request("GET", "/metrics", 500, timer.elapsed());
            Ok(warp::reply::with_header(
                "Error encoding metrics".to_string(),
                "content-type",
                "text/plain",
            ))
        }
    }
}
