//! Minimal CP/M harness for ZEXDOC/ZEXALL, the classic Z80 flag-exactness
//! exerciser programs. Binaries are not vendored in this repository; point
//! `ZEXDOC_COM`/`ZEXALL_COM` at a `.com` build to run these (both `#[ignore]`
//! by default since they take minutes to complete).
//!
//! CP/M memory layout:
//! - 0x0000: warm boot (we treat reaching it as "program finished")
//! - 0x0005: BDOS entry point, intercepted before the CPU ever executes it
//! - 0x0006-0x0007: top of the transient program area (programs read this
//!   to initialise their own stack)
//! - 0x0100: program load address

mod support;

use emu_z80::Z80;
use support::TestBus;

fn run_zex(binary: &[u8]) -> bool {
    let mut bus = TestBus::new();
    bus.load(0x0100, binary);
    bus.load(0x0000, &[0x76]); // HALT stands in for warm boot
    bus.load(0x0005, &[0xC9]); // RET; BDOS calls are intercepted below
    bus.load(0x0006, &[0x00, 0xFE]); // top of TPA = 0xFE00

    let mut cpu = Z80::new();
    cpu.prefetch(0x0100);

    let mut output = String::new();
    let mut instructions: u64 = 0;

    loop {
        let regs = cpu.registers();

        // `opdone` fires right after the overlapped fetch's T1: the opcode
        // byte at `pc - 1` has just been latched, PC already points past it.
        if cpu.opdone() {
            let fetched_at = regs.pc.wrapping_sub(1);

            if fetched_at == 0x0000 {
                eprintln!("Warm boot after {instructions} instructions");
                break;
            }

            if fetched_at == 0x0005 {
                // BDOS dispatch: handle the call, then let the pre-loaded
                // RET at 0x0005 execute normally on the next few ticks.
                match regs.c {
                    2 => output.push(regs.e as char),
                    9 => {
                        let mut addr = regs.de();
                        loop {
                            let ch = bus.peek(addr);
                            if ch == b'$' {
                                break;
                            }
                            output.push(ch as char);
                            addr = addr.wrapping_add(1);
                        }
                    }
                    other => eprintln!("unknown BDOS function: {other}"),
                }
            }

            instructions += 1;
            if instructions % 1_000_000 == 0 {
                eprintln!("[{instructions} instructions]");
            }
        }

        if cpu.is_halted() {
            eprintln!("HALT after {instructions} instructions");
            break;
        }

        let pins_in = bus.respond(cpu.pins());
        cpu.tick(pins_in);
    }

    eprintln!("Total: {instructions} instructions, {} chars of output", output.len());
    !output.contains("ERROR")
}

#[test]
#[ignore = "requires a ZEXDOC.COM build — set ZEXDOC_COM and run with --ignored"]
fn zexdoc() {
    let path = std::env::var("ZEXDOC_COM").unwrap_or_else(|_| "tests/data/zexdoc.com".to_string());
    let binary = std::fs::read(&path).unwrap_or_else(|e| panic!("{path}: {e}"));
    assert!(run_zex(&binary), "ZEXDOC reported a flag mismatch");
}

#[test]
#[ignore = "requires a ZEXALL.COM build — set ZEXALL_COM and run with --ignored"]
fn zexall() {
    let path = std::env::var("ZEXALL_COM").unwrap_or_else(|_| "tests/data/zexall.com".to_string());
    let binary = std::fs::read(&path).unwrap_or_else(|e| panic!("{path}: {e}"));
    assert!(run_zex(&binary), "ZEXALL reported a flag mismatch");
}
