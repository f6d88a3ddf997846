//! Shared host-side pin bus harness for the integration tests.
//!
//! Plays the role of the "bus owner" described in the crate's external
//! interface: a flat 64KB RAM plus 64KB I/O space, wired up to react to the
//! pin word exactly as the host contract specifies (respond to MREQ|RD,
//! MREQ|WR, IORQ|RD, IORQ|WR, and M1|IORQ before calling `tick` again).

use emu_z80::{get_addr, get_data, set_addr_data, IORQ, MREQ, M1, RD, WR};
use emu_z80::Z80;

pub struct TestBus {
    pub ram: [u8; 65536],
    pub io: [u8; 65536],
    /// Vector byte placed on the data bus during IM 0/2 interrupt acknowledge.
    pub int_vector: u8,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            ram: [0; 65536],
            io: [0; 65536],
            int_vector: 0xFF,
        }
    }

    pub fn load(&mut self, addr: u16, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            self.ram[addr.wrapping_add(i as u16) as usize] = b;
        }
    }

    pub fn peek(&self, addr: u16) -> u8 {
        self.ram[addr as usize]
    }

    /// Respond to whatever the CPU asserted on `pins_out`, producing the pin
    /// word to feed into the next `tick`.
    pub fn respond(&mut self, pins_out: u64) -> u64 {
        let mut next_in = pins_out;

        if pins_out & MREQ != 0 && pins_out & RD != 0 {
            let addr = get_addr(pins_out);
            next_in = set_addr_data(next_in, addr, self.ram[addr as usize]);
        } else if pins_out & MREQ != 0 && pins_out & WR != 0 {
            let addr = get_addr(pins_out);
            self.ram[addr as usize] = get_data(pins_out);
        } else if pins_out & IORQ != 0 && pins_out & RD != 0 {
            let port = get_addr(pins_out);
            next_in = set_addr_data(next_in, port, self.io[port as usize]);
        } else if pins_out & IORQ != 0 && pins_out & WR != 0 {
            let port = get_addr(pins_out);
            self.io[port as usize] = get_data(pins_out);
        } else if pins_out & M1 != 0 && pins_out & IORQ != 0 {
            next_in = set_addr_data(next_in, get_addr(pins_out), self.int_vector);
        }

        next_in
    }
}

impl Default for TestBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive one T-state: feed the CPU's last output pins through the bus, then
/// tick. `extra_in` ORs in host-driven input pins (WAIT/INT/NMI/RESET) that
/// the bus itself doesn't own.
pub fn step(cpu: &mut Z80, bus: &mut TestBus, extra_in: u64) -> u64 {
    let pins_in = bus.respond(cpu.pins()) | extra_in;
    cpu.tick(pins_in)
}

/// Run until the CPU halts or `max_ticks` elapses, whichever comes first.
pub fn run_until_halt(cpu: &mut Z80, bus: &mut TestBus, max_ticks: u64) -> u64 {
    let mut count = 0;
    while !cpu.is_halted() && count < max_ticks {
        step(cpu, bus, 0);
        count += 1;
    }
    count
}

pub fn run_ticks(cpu: &mut Z80, bus: &mut TestBus, ticks: u64) {
    for _ in 0..ticks {
        step(cpu, bus, 0);
    }
}

/// Start the CPU executing at `pc`: `init` then redirect via `prefetch`.
pub fn boot_at(pc: u16) -> Z80 {
    let mut cpu = Z80::new();
    cpu.prefetch(pc);
    cpu
}
