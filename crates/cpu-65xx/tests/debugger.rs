//! Breakpoints, step conditions, history, paths and fetch hooks.

use std::cell::Cell;
use std::rc::Rc;

use cpu_65xx::{
    Cpu65xx, CpuConfig, CpuMode, Host, StepCondition, StepDecision, StepResult,
};
use emu_core::{Bus, CycleClock, Observable, SimpleBus, Ticks, Value};

fn step(cpu: &mut Cpu65xx, bus: &mut SimpleBus) -> StepResult {
    let result = cpu.advance(bus);
    bus.tick(result == StepResult::Held);
    result
}

/// Step until something other than a plain cycle comes back.
fn run_until_stop(cpu: &mut Cpu65xx, bus: &mut SimpleBus) -> StepResult {
    for _ in 0..1000 {
        let result = step(cpu, bus);
        if result != StepResult::Cycle {
            return result;
        }
    }
    panic!("no stop within 1000 cycles");
}

fn run_instruction(cpu: &mut Cpu65xx, bus: &mut SimpleBus) {
    assert_eq!(step(cpu, bus), StepResult::Cycle);
    while cpu.is_instruction_in_progress() {
        assert_eq!(step(cpu, bus), StepResult::Cycle);
    }
}

fn setup(program: &[u8]) -> (Cpu65xx, SimpleBus) {
    let mut bus = SimpleBus::new();
    bus.load(0x0200, program);
    let mut cpu = Cpu65xx::new(CpuMode::Nmos6502);
    cpu.set_pc(0x0200);
    (cpu, bus)
}

// ============================================================================
// Breakpoints
// ============================================================================

#[test]
fn breakpoint_stops_before_fetch() {
    // LDA #$01; INX; INX
    let (mut cpu, mut bus) = setup(&[0xA9, 0x01, 0xE8, 0xE8]);
    cpu.set_breakpoint(0x0202);
    assert!(cpu.is_breakpoint_set(0x0202));

    assert_eq!(
        run_until_stop(&mut cpu, &mut bus),
        StepResult::Breakpoint { address: 0x0202 }
    );
    assert_eq!(cpu.total_cycles(), 2);
    assert_eq!(cpu.regs.x, 0, "INX not executed yet");

    // Resuming executes the instruction under the breakpoint.
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.x, 1);
    assert_eq!(cpu.breakpoints(), vec![0x0202]);

    assert!(cpu.clear_breakpoint(0x0202));
    assert!(!cpu.clear_breakpoint(0x0202));
    assert!(cpu.breakpoints().is_empty());
}

#[test]
fn breakpoint_fires_on_every_pass() {
    // loop: INX; JMP loop
    let (mut cpu, mut bus) = setup(&[0xE8, 0x4C, 0x00, 0x02]);
    cpu.set_breakpoint(0x0200);

    assert_eq!(
        run_until_stop(&mut cpu, &mut bus),
        StepResult::Breakpoint { address: 0x0200 }
    );
    for pass in 1..=3 {
        assert_eq!(
            run_until_stop(&mut cpu, &mut bus),
            StepResult::Breakpoint { address: 0x0200 }
        );
        assert_eq!(cpu.regs.x, pass);
    }
}

#[test]
fn one_shot_breakpoint_removes_itself() {
    let (mut cpu, mut bus) = setup(&[0xE8, 0x4C, 0x00, 0x02]);
    cpu.set_one_shot_breakpoint(0x0201);

    assert_eq!(
        run_until_stop(&mut cpu, &mut bus),
        StepResult::Breakpoint { address: 0x0201 }
    );
    assert!(!cpu.is_breakpoint_set(0x0201));

    for _ in 0..50 {
        assert_eq!(step(&mut cpu, &mut bus), StepResult::Cycle);
    }
}

#[test]
fn clear_all_breakpoints() {
    let (mut cpu, mut bus) = setup(&[0xEA, 0xEA, 0xEA]);
    cpu.set_breakpoint(0x0201);
    cpu.set_breakpoint(0x0202);
    cpu.clear_all_breakpoints();
    for _ in 0..6 {
        assert_eq!(step(&mut cpu, &mut bus), StepResult::Cycle);
    }
}

// ============================================================================
// Step conditions
// ============================================================================

/// JSR $0300; INX at $0200, INY; RTS at $0300.
fn subroutine_program() -> (Cpu65xx, SimpleBus) {
    let (cpu, mut bus) = setup(&[0x20, 0x00, 0x03, 0xE8]);
    bus.load(0x0300, &[0xC8, 0x60]);
    (cpu, bus)
}

#[test]
fn single_step_stops_after_one_instruction() {
    let (mut cpu, mut bus) = setup(&[0xA9, 0x01, 0xEA]);
    let id = cpu.add_step_condition(StepCondition::single_step());

    assert_eq!(
        run_until_stop(&mut cpu, &mut bus),
        StepResult::StepStop { id, address: 0x0202 }
    );
    assert_eq!(cpu.regs.a, 0x01);
    assert_eq!(cpu.debugger().step_count(), 0, "conditions are one-shot");
}

#[test]
fn step_over_runs_the_call() {
    let (mut cpu, mut bus) = subroutine_program();
    let id = cpu.add_step_condition(StepCondition::step_over(cpu.regs.s16()));

    assert_eq!(
        run_until_stop(&mut cpu, &mut bus),
        StepResult::StepStop { id, address: 0x0203 }
    );
    assert_eq!(cpu.regs.y, 1, "subroutine body ran");
    assert_eq!(cpu.regs.x, 0);
}

#[test]
fn step_out_stops_after_return() {
    let (mut cpu, mut bus) = subroutine_program();
    let caller_s = cpu.regs.s16();
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc(), 0x0300);

    let id = cpu.add_step_condition(StepCondition::step_out(caller_s));
    assert_eq!(
        run_until_stop(&mut cpu, &mut bus),
        StepResult::StepStop { id, address: 0x0203 }
    );
    assert_eq!(cpu.regs.s16(), caller_s);
}

#[test]
fn step_callback_decides() {
    let (mut cpu, mut bus) = setup(&[0xEA; 8]);
    let seen = Rc::new(Cell::new(0));
    let counter = Rc::clone(&seen);
    let id = cpu.add_step_condition(StepCondition::single_step().with_callback(move |ctx| {
        counter.set(counter.get() + 1);
        if ctx.pc == 0x0204 {
            StepDecision::Stop
        } else {
            StepDecision::Continue
        }
    }));

    assert_eq!(
        run_until_stop(&mut cpu, &mut bus),
        StepResult::StepStop { id, address: 0x0204 }
    );
    assert_eq!(seen.get(), 4);
}

#[test]
fn removed_step_condition_never_fires() {
    let (mut cpu, mut bus) = setup(&[0xEA; 8]);
    let id = cpu.add_step_condition(StepCondition::single_step());
    assert!(cpu.remove_step_condition(id).is_some());
    assert!(cpu.remove_step_condition(id).is_none());

    cpu.add_step_condition(StepCondition::single_step());
    cpu.clear_step_conditions();
    for _ in 0..10 {
        assert_eq!(step(&mut cpu, &mut bus), StepResult::Cycle);
    }
}

#[test]
fn wait_for_nmi_stops_in_handler() {
    let (mut cpu, mut bus) = setup(&[0xEA; 8]);
    bus.load(0xFFFA, &[0x00, 0x04]);
    bus.load(0x0400, &[0xEA]);
    let id = cpu.add_step_condition(StepCondition::wait_for_nmi());

    for _ in 0..6 {
        assert_eq!(step(&mut cpu, &mut bus), StepResult::Cycle);
    }
    cpu.assert_nmi(bus.cycle());
    assert_eq!(
        run_until_stop(&mut cpu, &mut bus),
        StepResult::StepStop { id, address: 0x0400 }
    );
}

// ============================================================================
// Stop on BRK
// ============================================================================

#[test]
fn stop_on_brk_can_be_toggled() {
    let (mut cpu, mut bus) = setup(&[0xEA, 0x00]);
    bus.load(0xFFFE, &[0x00, 0x03]);
    bus.load(0x0300, &[0xEA; 4]);
    cpu.set_stop_on_brk(true);

    assert_eq!(
        run_until_stop(&mut cpu, &mut bus),
        StepResult::BrkStop { address: 0x0201 }
    );
    cpu.set_stop_on_brk(false);
    for _ in 0..10 {
        assert_eq!(step(&mut cpu, &mut bus), StepResult::Cycle);
    }
    assert!(cpu.pc() >= 0x0300);
}

// ============================================================================
// History
// ============================================================================

#[test]
fn history_records_each_instruction() {
    let config = CpuConfig {
        history: true,
        history_capacity: 16,
        ..CpuConfig::for_mode(CpuMode::Nmos6502)
    };
    let mut cpu = Cpu65xx::with_config(config).unwrap();
    let mut bus = SimpleBus::new();
    // LDA #$42; STA $1234; INX
    bus.load(0x0200, &[0xA9, 0x42, 0x8D, 0x34, 0x12, 0xE8]);
    cpu.set_pc(0x0200);

    for _ in 0..3 {
        run_instruction(&mut cpu, &mut bus);
    }

    let history = cpu.history().expect("history enabled");
    assert_eq!(history.len(), 3);
    assert_eq!(history.counter(), 3);

    let sta = history.latest(1).unwrap();
    assert_eq!(sta.pc, 0x0202);
    assert_eq!(sta.cycle, 2);
    assert_eq!(sta.a, 0x42);
    assert_eq!(sta.ea, Some(0x1234));
    assert_eq!(sta.opcode, [0x8D, 0x34, 0x12, 0xE8]);

    let pcs: Vec<u16> = history.iter().map(|e| e.pc).collect();
    assert_eq!(pcs, [0x0200, 0x0202, 0x0205]);

    assert_eq!(cpu.query("history.len"), Some(Value::U64(3)));
}

#[test]
fn history_ring_keeps_newest() {
    let config = CpuConfig {
        history: true,
        history_capacity: 4,
        ..CpuConfig::for_mode(CpuMode::Nmos6502)
    };
    let mut cpu = Cpu65xx::with_config(config).unwrap();
    let mut bus = SimpleBus::new();
    bus.load(0x0200, &[0xEA; 10]);
    cpu.set_pc(0x0200);

    for _ in 0..10 {
        run_instruction(&mut cpu, &mut bus);
    }
    let history = cpu.history().unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history.counter(), 10);
    assert!(history.get(5).is_none(), "overwritten");
    assert_eq!(history.get(6).unwrap().pc, 0x0206);
    assert_eq!(history.latest(0).unwrap().pc, 0x0209);
}

#[test]
fn history_marks_interrupt_handler_entry() {
    let (mut cpu, mut bus) = setup(&[0xEA; 4]);
    bus.load(0xFFFE, &[0x00, 0x03]);
    bus.load(0x0300, &[0xEA; 4]);
    cpu.set_history_enabled(true).unwrap();
    cpu.set_p(0x00);
    cpu.assert_irq(Ticks::new(0));

    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    cpu.negate_irq();
    run_instruction(&mut cpu, &mut bus);

    let history = cpu.history().unwrap();
    let flags: Vec<(u16, bool)> = history.iter().map(|e| (e.pc, e.irq)).collect();
    assert_eq!(flags, [(0x0200, false), (0x0300, true), (0x0301, false)]);
}

#[test]
fn history_disabled_by_default() {
    let cpu = Cpu65xx::new(CpuMode::Cmos65C02);
    assert!(cpu.history().is_none());
}

// ============================================================================
// Paths
// ============================================================================

#[test]
fn pathfinding_marks_targets_and_executed_code() {
    // JMP $0300
    let (mut cpu, mut bus) = setup(&[0x4C, 0x00, 0x03]);
    bus.load(0x0300, &[0xEA, 0xEA, 0xEA]);
    cpu.set_pathfinding(true);

    for _ in 0..3 {
        run_instruction(&mut cpu, &mut bus);
    }
    assert!(cpu.is_path_start(0x0300));
    assert!(!cpu.is_path_start(0x0200));
    assert!(cpu.is_in_path(0x0200));
    assert!(cpu.is_in_path(0x0301));
    assert!(!cpu.is_in_path(0x0201), "operand bytes are not instructions");
    assert_eq!(cpu.next_path_instruction(0x0200), Some(0x0300));
    assert_eq!(cpu.next_path_instruction(0x0300), Some(0x0301));

    cpu.reset_paths();
    assert!(!cpu.is_in_path(0x0200));
    assert!(!cpu.is_path_start(0x0300));
}

// ============================================================================
// Hooks
// ============================================================================

/// Bus that replaces hooked fetches with INX and remembers where.
struct HookedBus {
    bus: SimpleBus,
    hooked: Vec<u32>,
}

impl Bus for HookedBus {
    fn read(&mut self, address: u32) -> u8 {
        self.bus.read(address)
    }

    fn write(&mut self, address: u32, value: u8) {
        self.bus.write(address, value);
    }

    fn peek(&self, address: u32) -> u8 {
        self.bus.peek(address)
    }
}

impl CycleClock for HookedBus {
    fn cycle(&self) -> Ticks {
        self.bus.cycle()
    }
}

impl Host for HookedBus {
    fn hook(&mut self, pc: u32) -> Option<u8> {
        self.hooked.push(pc);
        (pc == 0x0201).then_some(0xE8)
    }
}

#[test]
fn hook_replaces_fetched_opcode() {
    let mut host = HookedBus {
        bus: SimpleBus::new(),
        hooked: Vec::new(),
    };
    host.bus.load(0x0200, &[0xEA; 4]);
    let mut cpu = Cpu65xx::new(CpuMode::Nmos6502);
    cpu.set_pc(0x0200);
    cpu.set_hook(0x0201, true);
    cpu.set_hook(0x0202, true);

    for _ in 0..6 {
        assert_eq!(cpu.advance(&mut host), StepResult::Cycle);
        host.bus.tick(false);
    }
    assert_eq!(cpu.regs.x, 1, "only $0201 was replaced");
    assert_eq!(host.hooked, [0x0201, 0x0202]);

    cpu.set_hook(0x0201, false);
    cpu.set_hook(0x0202, false);
    cpu.set_pc(0x0201);
    for _ in 0..2 {
        cpu.advance(&mut host);
        host.bus.tick(false);
    }
    assert_eq!(cpu.regs.x, 1);
    assert_eq!(host.hooked.len(), 2, "no hook calls once cleared");
}
