//! Whole-instruction behaviour across the three families.

use cpu_65xx::flags::{C, D, I};
use cpu_65xx::{Cpu65xx, CpuConfig, CpuMode, StepResult, SubMode};
use emu_core::{Bus, Cpu, CycleClock, SimpleBus};

/// Advance one cycle and move the host clock with it.
fn step(cpu: &mut Cpu65xx, bus: &mut SimpleBus) -> StepResult {
    let result = cpu.advance(bus);
    bus.tick(result == StepResult::Held);
    result
}

/// Run one complete instruction and return the number of cycles it took.
fn run_instruction(cpu: &mut Cpu65xx, bus: &mut SimpleBus) -> u32 {
    assert_eq!(step(cpu, bus), StepResult::Cycle, "opcode fetch");
    let mut cycles = 1;
    while cpu.is_instruction_in_progress() {
        assert_eq!(step(cpu, bus), StepResult::Cycle);
        cycles += 1;
        assert!(cycles <= 20, "instruction did not complete within 20 cycles");
    }
    cycles
}

/// Load a program at $0200 and set PC there.
fn setup_program(bus: &mut SimpleBus, cpu: &mut Cpu65xx, program: &[u8]) {
    bus.load(0x0200, program);
    cpu.set_pc(0x0200);
}

#[test]
fn test_store_then_stop_on_brk() {
    let mut bus = SimpleBus::new();
    let config = CpuConfig {
        stop_on_brk: true,
        ..CpuConfig::for_mode(CpuMode::Nmos6502)
    };
    let mut cpu = Cpu65xx::with_config(config).unwrap();

    // LDA #$05; STA $0200; BRK
    bus.load(0x0400, &[0xA9, 0x05, 0x8D, 0x00, 0x02, 0x00]);
    bus.load(0xFFFE, &[0x00, 0x06]);
    cpu.set_pc(0x0400);

    let mut result = StepResult::Cycle;
    for _ in 0..20 {
        result = step(&mut cpu, &mut bus);
        if result != StepResult::Cycle {
            break;
        }
    }
    assert_eq!(result, StepResult::BrkStop { address: 0x0405 });
    assert_eq!(bus.peek(0x0200), 0x05);
    assert_eq!(cpu.total_cycles(), 6);

    // Continuing executes the BRK.
    assert_eq!(run_instruction(&mut cpu, &mut bus), 7);
    assert_eq!(cpu.pc(), 0x0600);
    assert_eq!(bus.peek(0x01FD), 0x04, "PCH");
    assert_eq!(bus.peek(0x01FC), 0x07, "PCL skips the signature byte");
    assert_eq!(bus.peek(0x01FB) & 0x30, 0x30, "BRK pushes B and U set");
}

#[test]
fn test_reset_sequence() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu65xx::new(CpuMode::Nmos6502);
    bus.load(0xFFFC, &[0x00, 0x80]);

    cpu.reset();
    for _ in 0..7 {
        assert_eq!(step(&mut cpu, &mut bus), StepResult::Cycle);
    }
    assert!(!cpu.is_instruction_in_progress());
    assert_eq!(cpu.pc(), 0x8000);
    assert_eq!(cpu.regs.s, 0xFA, "reset decrements S three times without writing");
    assert!(cpu.regs.p.is_set(I));
    assert_eq!(bus.peek(0x01FD), 0x00, "reset never writes the stack");
}

#[test]
fn test_cmos_reset_clears_decimal() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu65xx::new(CpuMode::Cmos65C02);
    bus.load(0xFFFC, &[0x00, 0x80]);
    cpu.set_p(0x34 | D);

    cpu.reset();
    for _ in 0..7 {
        step(&mut cpu, &mut bus);
    }
    assert!(!cpu.regs.p.is_set(D));
}

#[test]
fn test_816_register_width_round_trip() {
    let mut bus = SimpleBus::with_size(0x100_0000);
    let mut cpu = Cpu65xx::new(CpuMode::W65C816);

    let program = [
        0x18, // CLC
        0xFB, // XCE
        0xC2, 0x30, // REP #$30
        0xA9, 0x34, 0x12, // LDA #$1234
        0xA2, 0x78, 0x56, // LDX #$5678
        0xE2, 0x20, // SEP #$20
        0xE2, 0x10, // SEP #$10
        0x38, // SEC
        0xFB, // XCE
        0xEA, // NOP
    ];
    setup_program(&mut bus, &mut cpu, &program);

    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    assert!(!cpu.regs.e, "XCE with carry clear enters native mode");
    assert!(cpu.regs.p.is_set(C), "old E lands in carry");

    assert_eq!(run_instruction(&mut cpu, &mut bus), 3, "REP");
    assert_eq!(run_instruction(&mut cpu, &mut bus), 3, "LDA #imm16");
    assert_eq!(cpu.submode(), SubMode::NativeM16X16);
    assert_eq!(cpu.regs.c(), 0x1234);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 3, "LDX #imm16");
    assert_eq!(cpu.regs.x16(), 0x5678);

    // Each width change selects its table on its own.
    assert_eq!(run_instruction(&mut cpu, &mut bus), 3, "SEP #$20");
    assert_eq!(cpu.submode(), SubMode::NativeM8X16);
    assert_eq!(cpu.regs.c(), 0x1234, "8-bit A keeps the hidden B byte");
    assert_eq!(cpu.regs.x16(), 0x5678);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 3, "SEP #$10");
    assert_eq!(cpu.submode(), SubMode::NativeM8X8);
    assert_eq!(cpu.regs.x16(), 0x0078, "8-bit index zeroes XH");
    assert_eq!(cpu.regs.c(), 0x1234);

    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    assert!(cpu.regs.e);
    assert!(!cpu.regs.p.is_set(C));
    assert_eq!(cpu.submode(), SubMode::Emulation);
    assert_eq!(cpu.regs.sh, 0x01);
}

#[test]
fn test_wai_resumes_on_masked_irq() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu65xx::new(CpuMode::Cmos65C02);

    // SEI; WAI; INX
    setup_program(&mut bus, &mut cpu, &[0x78, 0xCB, 0xE8]);
    run_instruction(&mut cpu, &mut bus);

    for _ in 0..3 {
        assert_eq!(step(&mut cpu, &mut bus), StepResult::Cycle);
    }
    for _ in 0..5 {
        assert_eq!(step(&mut cpu, &mut bus), StepResult::Idle);
        assert!(cpu.is_instruction_in_progress());
    }

    cpu.assert_irq(bus.cycle());
    // With I set the IRQ wakes the CPU but is not taken.
    assert_eq!(run_instruction(&mut cpu, &mut bus), 2);
    assert_eq!(cpu.regs.x, 1);
    assert_eq!(cpu.pc(), 0x0203);
}

#[test]
fn test_stp_halts_until_reset() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu65xx::new(CpuMode::Cmos65C02);
    bus.load(0xFFFC, &[0x00, 0x90]);
    setup_program(&mut bus, &mut cpu, &[0xDB]);

    for _ in 0..3 {
        assert_eq!(step(&mut cpu, &mut bus), StepResult::Cycle);
    }
    assert_eq!(step(&mut cpu, &mut bus), StepResult::Idle);
    assert!(cpu.is_halted());
    assert_eq!(step(&mut cpu, &mut bus), StepResult::Idle);

    cpu.reset();
    assert!(!cpu.is_halted());
    for _ in 0..7 {
        step(&mut cpu, &mut bus);
    }
    assert_eq!(cpu.pc(), 0x9000);
}

#[test]
fn test_nmos_jam_halts() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu65xx::new(CpuMode::Nmos6502);
    setup_program(&mut bus, &mut cpu, &[0x02]);

    assert_eq!(step(&mut cpu, &mut bus), StepResult::Cycle);
    let mut halted = false;
    for _ in 0..4 {
        if step(&mut cpu, &mut bus) == StepResult::Idle {
            halted = true;
            break;
        }
    }
    assert!(halted);
    assert!(cpu.is_halted());
}

#[test]
fn test_lax_undocumented() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu65xx::new(CpuMode::Nmos6502);
    bus.write(0x0010, 0x5A);

    // LAX $10
    setup_program(&mut bus, &mut cpu, &[0xA7, 0x10]);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 3);
    assert_eq!(cpu.regs.a, 0x5A);
    assert_eq!(cpu.regs.x, 0x5A);
}

#[test]
fn test_undocumented_disabled_reports_illegal_opcode() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu65xx::new(CpuMode::Nmos6502);
    cpu.set_illegal_opcodes(false);

    // LAX $10; NOP
    setup_program(&mut bus, &mut cpu, &[0xA7, 0xEA]);
    assert_eq!(step(&mut cpu, &mut bus), StepResult::Cycle);
    assert_eq!(
        step(&mut cpu, &mut bus),
        StepResult::IllegalOpcode {
            address: 0x0200,
            opcode: 0xA7
        }
    );
    assert_eq!(cpu.pc(), 0x0201, "treated as a one-byte NOP");
    assert_eq!(run_instruction(&mut cpu, &mut bus), 2);
}

#[test]
fn test_nmos_decimal_adc() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu65xx::new(CpuMode::Nmos6502);

    // SED; CLC; LDA #$19; ADC #$28
    setup_program(&mut bus, &mut cpu, &[0xF8, 0x18, 0xA9, 0x19, 0x69, 0x28]);
    for _ in 0..3 {
        run_instruction(&mut cpu, &mut bus);
    }
    assert_eq!(run_instruction(&mut cpu, &mut bus), 2, "no decimal penalty on NMOS");
    assert_eq!(cpu.regs.a, 0x47);
    assert!(!cpu.regs.p.is_set(C));
}

#[test]
fn test_jmp_indirect_page_wrap() {
    // JMP ($10FF)
    let program = [0x6C, 0xFF, 0x10];

    let mut bus = SimpleBus::new();
    bus.load(0x10FF, &[0x34]);
    bus.load(0x1000, &[0x12]);
    bus.load(0x1100, &[0x56]);

    let mut nmos = Cpu65xx::new(CpuMode::Nmos6502);
    setup_program(&mut bus, &mut nmos, &program);
    assert_eq!(run_instruction(&mut nmos, &mut bus), 5);
    assert_eq!(nmos.pc(), 0x1234, "NMOS wraps inside the pointer's page");

    let mut cmos = Cpu65xx::new(CpuMode::Cmos65C02);
    setup_program(&mut bus, &mut cmos, &program);
    assert_eq!(run_instruction(&mut cmos, &mut bus), 6);
    assert_eq!(cmos.pc(), 0x5634);
}

#[test]
fn test_stack_php_plp() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu65xx::new(CpuMode::Nmos6502);

    // LDX #$FF; TXS; SEC; PHP; CLC; PLP
    setup_program(&mut bus, &mut cpu, &[0xA2, 0xFF, 0x9A, 0x38, 0x08, 0x18, 0x28]);
    let cycles: Vec<u32> = (0..6).map(|_| run_instruction(&mut cpu, &mut bus)).collect();
    assert_eq!(cycles, [2, 2, 2, 3, 2, 4]);
    assert!(cpu.regs.p.is_set(C), "PLP should restore carry");
    assert_eq!(cpu.regs.s, 0xFF);
}

#[test]
fn test_driven_through_cpu_trait() {
    fn run_cycles<C: Cpu<SimpleBus>>(cpu: &mut C, bus: &mut SimpleBus, n: usize) {
        for _ in 0..n {
            cpu.advance(bus);
            bus.tick(false);
        }
    }

    let mut bus = SimpleBus::new();
    let mut cpu = Cpu65xx::new(CpuMode::Nmos6502);
    // LDY #$07; INY
    setup_program(&mut bus, &mut cpu, &[0xA0, 0x07, 0xC8]);
    run_cycles(&mut cpu, &mut bus, 4);

    let regs = Cpu::<SimpleBus>::registers(&cpu);
    assert_eq!(regs.y, 0x08);
    assert_eq!(Cpu::<SimpleBus>::pc(&cpu), 0x0203);
}
