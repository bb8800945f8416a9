//! Property tests for the replay engine's time accounting.
//!
//! Regardless of trace content, the clock must stay monotonic, every step
//! must advance time by exactly its logged cost, and the final clock must
//! equal the sum of all logged costs.

use proptest::prelude::*;

use ksim_rs::{parse_trace, DeviceTable, MapTraceSource, ProgramDirectory, SimConfig, Simulation};

#[derive(Clone, Debug)]
enum Op {
    Cpu(u64),
    Syscall(usize),
    EndIo(usize),
    Unknown,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..500).prop_map(Op::Cpu),
        (0usize..4).prop_map(Op::Syscall),
        (0usize..4).prop_map(Op::EndIo),
        Just(Op::Unknown),
    ]
}

fn devices() -> DeviceTable {
    DeviceTable::new(
        vec![
            "0x01A0".to_string(),
            "0x02C4".to_string(),
            "0x0424".to_string(),
            "0x0506".to_string(),
        ],
        vec![100, 110, 120, 130],
    )
}

fn render(ops: &[Op]) -> String {
    let mut text = String::new();
    for op in ops {
        match op {
            Op::Cpu(d) => text.push_str(&format!("CPU, {d}\n")),
            Op::Syscall(dev) => text.push_str(&format!("SYSCALL, {dev}\n")),
            Op::EndIo(dev) => text.push_str(&format!("END_IO, {dev}\n")),
            Op::Unknown => text.push_str("NOP, 1\n"),
        }
    }
    text
}

/// Dispatch entry cost with default step costs: switch + lookup + load +
/// context save.
const ENTRY_COST: u64 = 1 + 1 + 1 + 10;

fn expected_end_time(ops: &[Op], devices: &DeviceTable) -> u64 {
    ops.iter()
        .map(|op| match op {
            Op::Cpu(d) => *d,
            Op::Syscall(dev) | Op::EndIo(dev) => ENTRY_COST + devices.delay(*dev) + 1,
            Op::Unknown => 0,
        })
        .sum()
}

proptest! {
    #[test]
    fn end_time_equals_sum_of_logged_costs(ops in proptest::collection::vec(op_strategy(), 0..40)) {
        let cfg = SimConfig::new();
        let devices = devices();
        let programs = ProgramDirectory::new();
        let traces = MapTraceSource::new();
        let trace = parse_trace(&render(&ops)).expect("generated traces parse");

        let out = Simulation::new(&cfg, &devices, &programs, &traces)
            .run(&trace)
            .expect("boot succeeds");

        prop_assert_eq!(out.end_time, expected_end_time(&ops, &devices));
    }

    #[test]
    fn steps_are_contiguous_and_monotonic(ops in proptest::collection::vec(op_strategy(), 0..40)) {
        let cfg = SimConfig::new();
        let devices = devices();
        let programs = ProgramDirectory::new();
        let traces = MapTraceSource::new();
        let trace = parse_trace(&render(&ops)).expect("generated traces parse");

        let out = Simulation::new(&cfg, &devices, &programs, &traces)
            .run(&trace)
            .expect("boot succeeds");

        let mut expected_next = 0u64;
        for line in out.execution.lines() {
            let mut fields = line.splitn(3, ',');
            let Some(time) = fields.next().and_then(|f| f.trim().parse::<u64>().ok()) else {
                continue; // blank separators and echo lines carry no time
            };
            let Some(cost) = fields.next().and_then(|f| f.trim().parse::<u64>().ok()) else {
                continue;
            };
            prop_assert_eq!(time, expected_next, "each step starts when the previous ends");
            expected_next = time + cost;
        }
        prop_assert_eq!(expected_next, out.end_time);
    }

    #[test]
    fn unknown_activities_never_advance_time(n in 1usize..20) {
        let cfg = SimConfig::new();
        let devices = devices();
        let programs = ProgramDirectory::new();
        let traces = MapTraceSource::new();
        let text = "WAT, 7\n".repeat(n);
        let trace = parse_trace(&text).expect("parses");

        let out = Simulation::new(&cfg, &devices, &programs, &traces)
            .run(&trace)
            .expect("boot succeeds");

        prop_assert_eq!(out.end_time, 0);
        let echoes = out
            .execution
            .lines()
            .filter(|l| l.contains("not recognized as a valid input"))
            .count();
        prop_assert_eq!(echoes, n);
    }
}
