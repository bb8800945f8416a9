//! Kernel trace simulator CLI.
//!
//! Replays a trace of kernel-visible activities against a vector table and
//! a device delay table, writing the timed execution log and the
//! process-table status log to flat files.
//!
//! # Output
//!
//! - execution log (default `execution.txt`): one `<time>, <cost>,
//!   <description>` line per simulated step.
//! - status log (default `system_status.txt`): a process-table snapshot
//!   block per successful fork/exec.
//! - a summary line and any diagnostics on stderr.
//!
//! # Exit codes
//!
//! - `0`: simulation completed (in-simulation failures are logged, not
//!   fatal).
//! - `2`: invalid arguments or a malformed setup file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ksim_rs::{
    parse_trace, DeviceTable, DirTraceSource, ProgramDirectory, RunReport, SimConfig, Simulation,
};

fn print_usage(exe: &std::ffi::OsStr) {
    eprintln!(
        "usage: {} [OPTIONS] <trace> <vector_table> <device_table>

ARGS:
    <trace>            Trace file driving the simulation
    <vector_table>     One ISR entry label per line, index = device number
    <device_table>     One I/O delay (ms) per line, index = device number

OPTIONS:
    --programs=<file>       Program manifest (\"name, size\" per line)
    --trace-dir=<dir>       Directory holding <program>.txt exec traces
                            (default: the trace file's directory)
    --execution-out=<file>  Execution log destination (default: execution.txt)
    --status-out=<file>     Status log destination (default: system_status.txt)
    --report=<file>         Also write a JSON run report
    --cpu-speed=<f>         CPU speed multiplier (default: $CPU_SPEED or 1.0)
    --help, -h              Show this help message",
        exe.to_string_lossy()
    );
}

struct Args {
    trace: PathBuf,
    vectors: PathBuf,
    devices: PathBuf,
    programs: Option<PathBuf>,
    trace_dir: Option<PathBuf>,
    execution_out: PathBuf,
    status_out: PathBuf,
    report: Option<PathBuf>,
    cpu_speed: Option<f64>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = env::args_os();
    let exe = args.next().unwrap_or_else(|| "ksim".into());

    let mut positional: Vec<PathBuf> = Vec::new();
    let mut programs = None;
    let mut trace_dir = None;
    let mut execution_out = PathBuf::from("execution.txt");
    let mut status_out = PathBuf::from("system_status.txt");
    let mut report = None;
    let mut cpu_speed = None;

    for arg in args {
        let Some(flag) = arg.to_str() else {
            positional.push(PathBuf::from(arg));
            continue;
        };
        if let Some(value) = flag.strip_prefix("--programs=") {
            programs = Some(PathBuf::from(value));
        } else if let Some(value) = flag.strip_prefix("--trace-dir=") {
            trace_dir = Some(PathBuf::from(value));
        } else if let Some(value) = flag.strip_prefix("--execution-out=") {
            execution_out = PathBuf::from(value);
        } else if let Some(value) = flag.strip_prefix("--status-out=") {
            status_out = PathBuf::from(value);
        } else if let Some(value) = flag.strip_prefix("--report=") {
            report = Some(PathBuf::from(value));
        } else if let Some(value) = flag.strip_prefix("--cpu-speed=") {
            let speed: f64 = value
                .parse()
                .map_err(|_| format!("invalid --cpu-speed value: {value}"))?;
            if !(speed.is_finite() && speed > 0.0) {
                return Err(format!("--cpu-speed must be positive, got {value}"));
            }
            cpu_speed = Some(speed);
        } else {
            match flag {
                "--help" | "-h" => {
                    print_usage(&exe);
                    std::process::exit(0);
                }
                _ if flag.starts_with("--") => {
                    return Err(format!("unknown flag: {flag}"));
                }
                _ => positional.push(PathBuf::from(flag)),
            }
        }
    }

    if positional.len() != 3 {
        return Err(format!(
            "expected 3 positional arguments, got {}",
            positional.len()
        ));
    }
    let mut it = positional.into_iter();
    Ok(Args {
        trace: it.next().unwrap_or_default(),
        vectors: it.next().unwrap_or_default(),
        devices: it.next().unwrap_or_default(),
        programs,
        trace_dir,
        execution_out,
        status_out,
        report,
        cpu_speed,
    })
}

/// Explicit flag, then the CPU_SPEED environment variable, then 1.0.
/// Unparsable or non-positive values fall back to 1.0.
fn resolve_cpu_speed(flag: Option<f64>) -> f64 {
    if let Some(speed) = flag {
        return speed;
    }
    match env::var("CPU_SPEED") {
        Ok(text) => match text.parse::<f64>() {
            Ok(speed) if speed.is_finite() && speed > 0.0 => speed,
            _ => 1.0,
        },
        Err(_) => 1.0,
    }
}

fn run() -> Result<(), String> {
    let args = parse_args()?;

    let devices = DeviceTable::from_files(&args.vectors, &args.devices)
        .map_err(|e| e.to_string())?;

    let programs = match &args.programs {
        Some(path) => ProgramDirectory::from_file(path).map_err(|e| e.to_string())?,
        None => ProgramDirectory::new(),
    };

    let trace_dir = args
        .trace_dir
        .clone()
        .or_else(|| args.trace.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    let traces = DirTraceSource::new(trace_dir);

    let trace_text = fs::read_to_string(&args.trace)
        .map_err(|e| format!("cannot read {}: {e}", args.trace.display()))?;
    let trace = parse_trace(&trace_text)
        .map_err(|e| format!("{}: {e}", args.trace.display()))?;

    let cfg = SimConfig::with_cpu_speed(resolve_cpu_speed(args.cpu_speed));
    let out = Simulation::new(&cfg, &devices, &programs, &traces)
        .run(&trace)
        .map_err(|e| e.to_string())?;

    fs::write(&args.execution_out, &out.execution)
        .map_err(|e| format!("cannot write {}: {e}", args.execution_out.display()))?;
    fs::write(&args.status_out, &out.status)
        .map_err(|e| format!("cannot write {}: {e}", args.status_out.display()))?;

    if let Some(path) = &args.report {
        let report = RunReport::new(&cfg, &out);
        let json = report.to_json().map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| format!("cannot write {}: {e}", path.display()))?;
    }

    for diag in &out.diagnostics {
        eprintln!("warning: {diag}");
    }
    eprintln!(
        "end_time_ms={} processes={} partitions_used={} diagnostics={}",
        out.end_time,
        out.directory.len(),
        out.memory
            .partitions()
            .iter()
            .filter(|p| p.occupant.is_some())
            .count(),
        out.diagnostics.len()
    );
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!("run with --help for usage");
            ExitCode::from(2)
        }
    }
}
