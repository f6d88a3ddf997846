//! The cycle-accurate Z80 tick engine.
//!
//! `Z80` owns nothing but its own register and decoder state. Memory, I/O,
//! and interrupt daisy-chain peers live on the host side of the pin bus;
//! this module's only public surface is [`Z80::init`], [`Z80::tick`],
//! [`Z80::prefetch`], [`Z80::opdone`], and read/write access to the
//! register file for debugger integration.

mod access;
mod execute;

use emu_core::{Observable, Ticks, Value};

use crate::flags::{CF, SF, ZF};
use crate::microcode::{MicroOp, MicroOpQueue};
use crate::pins;
use crate::registers::Registers;

/// Which opcode table is currently being decoded.
///
/// `DdCb`/`FdCb` are reached only via `DD CB d op` / `FD CB d op` — the
/// displacement-then-opcode form that never re-enters the plain CB table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Prefix {
    #[default]
    None,
    Cb,
    Ed,
    Dd,
    Fd,
    DdCb,
    FdCb,
}

/// What the current overlapped fetch will do once it lands: decode a plain
/// opcode, or complete a pending interrupt/NMI acknowledge sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingVector {
    Nmi,
    Int,
    /// The INT return address has been pushed; still needs to dispatch
    /// per IM 0/1/2.
    IntVector,
    /// IM 2 only: the two-byte table address has been read into
    /// `data_lo`/`data_hi` and PC still needs setting from them.
    IntTable,
}

/// A cycle-accurate, pin-level Zilog Z80 core.
///
/// All state transitions happen inside [`Z80::tick`]; there is no other way
/// to advance time. See the crate documentation for the pin word layout.
#[derive(Debug, Clone)]
pub struct Z80 {
    pub(crate) regs: Registers,
    pins: u64,

    pub(crate) opcode: u8,
    pub(crate) prefix: Prefix,
    /// Which opcode table the in-flight followup belongs to. Set at the
    /// moment an opcode is dispatched; unlike `prefix` (which is reset to
    /// `None` immediately so the *next* opcode byte accumulates cleanly),
    /// this stays put until the followup chain for the current instruction
    /// finishes draining.
    pub(crate) active_table: Prefix,
    pub(crate) addr: u16,
    pub(crate) data_lo: u8,
    pub(crate) data_hi: u8,
    pub(crate) displacement: u8,
    /// Disambiguates the Nth re-entry into a multi-stage followup for the
    /// same opcode byte (e.g. `LD HL,(nn)` reads the pointer, then the value).
    pub(crate) stage: u8,
    /// PC as it stood before the in-flight overlapped fetch's T1 advanced
    /// it. `check_interrupt_boundary` restores `regs.pc` from this when it
    /// discards the just-issued fetch to take NMI/INT, since the opcode
    /// that fetch solicited never actually executes.
    boundary_pc: u16,

    micro_ops: MicroOpQueue,
    sub_tick: u8,

    /// Set for exactly one instruction after `EI`: real hardware never
    /// accepts an interrupt until the instruction following `EI` retires.
    ei_delay: bool,
    pending_vector: Option<PendingVector>,
    /// Vector byte solicited during interrupt acknowledge (IM 0 instruction,
    /// or IM 2 table index low byte).
    int_vector: u8,
    reti_pulse: bool,

    total_ticks: Ticks,
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl Z80 {
    /// Construct a CPU and immediately `init` it.
    #[must_use]
    pub fn new() -> Self {
        let mut cpu = Self {
            regs: Registers::default(),
            pins: 0,
            opcode: 0,
            prefix: Prefix::None,
            active_table: Prefix::None,
            addr: 0,
            data_lo: 0,
            data_hi: 0,
            displacement: 0,
            stage: 0,
            boundary_pc: 0,
            micro_ops: MicroOpQueue::new(),
            sub_tick: 0,
            ei_delay: false,
            pending_vector: None,
            int_vector: 0,
            reti_pulse: false,
            total_ticks: Ticks::ZERO,
        };
        cpu.init();
        cpu
    }

    /// Reset the CPU and return the pin word for the first M1 fetch.
    ///
    /// Per the Visual-Z80 trace the reference implementation cites, every
    /// 16-bit register except PC is set to `0x5555` rather than zero — PC
    /// is forced to `0x0000` by the RESET pin logic, independent of the
    /// otherwise-indeterminate register contents. IFF1/IFF2/IM are cleared
    /// per the Zilog datasheet (the reference leaves these `FIXME`).
    #[must_use]
    pub fn init(&mut self) -> u64 {
        self.regs = Registers::default();
        self.regs.set_af(0x5555);
        self.regs.set_bc(0x5555);
        self.regs.set_de(0x5555);
        self.regs.set_hl(0x5555);
        self.regs.a_alt = 0x55;
        self.regs.f_alt = 0x55;
        self.regs.b_alt = 0x55;
        self.regs.c_alt = 0x55;
        self.regs.d_alt = 0x55;
        self.regs.e_alt = 0x55;
        self.regs.h_alt = 0x55;
        self.regs.l_alt = 0x55;
        self.regs.ix = 0x5555;
        self.regs.iy = 0x5555;
        self.regs.sp = 0x5555;
        self.regs.wz = 0x5555;
        self.regs.pc = 0x0000;
        self.regs.i = 0;
        self.regs.r = 0;
        self.regs.iff1 = false;
        self.regs.iff2 = false;
        self.regs.im = 0;
        self.regs.halted = false;

        self.opcode = 0;
        self.prefix = Prefix::None;
        self.active_table = Prefix::None;
        self.addr = 0;
        self.data_lo = 0;
        self.data_hi = 0;
        self.displacement = 0;
        self.stage = 0;
        self.boundary_pc = 0;
        self.ei_delay = false;
        self.pending_vector = None;
        self.int_vector = 0;
        self.reti_pulse = false;
        self.total_ticks = Ticks::ZERO;

        self.micro_ops.clear();
        self.micro_ops.push(MicroOp::FetchOpcode);
        let pins = self.fetch_t1(0);
        self.sub_tick = 1;
        self.pins = pins;
        pins
    }

    /// Redirect the next tick to act as the overlapped first T-state of a
    /// fetch at `new_pc`, abandoning whatever was in flight.
    #[must_use]
    pub fn prefetch(&mut self, new_pc: u16) -> u64 {
        self.regs.pc = new_pc;
        self.prefix = Prefix::None;
        self.active_table = Prefix::None;
        self.stage = 0;
        self.boundary_pc = new_pc;
        self.micro_ops.clear();
        self.micro_ops.push(MicroOp::FetchOpcode);
        self.sub_tick = 0;
        self.pins = 0;
        0
    }

    /// True exactly between the overlapped fetch's first T-state and the
    /// tick that latches the opcode — i.e. at an instruction boundary.
    #[must_use]
    pub fn opdone(&self) -> bool {
        self.sub_tick == 1 && self.micro_ops.current() == Some(MicroOp::FetchOpcode)
    }

    /// The last pin word returned from (or stored by) a tick.
    #[must_use]
    pub const fn pins(&self) -> u64 {
        self.pins
    }

    /// True while the CPU is halted (re-fetching NOPs at a frozen PC).
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.regs.halted
    }

    /// Total T-states executed since the last `init`.
    #[must_use]
    pub const fn total_ticks(&self) -> Ticks {
        self.total_ticks
    }

    /// Snapshot of the register file.
    #[must_use]
    pub const fn registers(&self) -> Registers {
        self.regs
    }

    /// Overwrite the register file directly (debugger "set register" support).
    pub fn set_registers(&mut self, regs: Registers) {
        self.regs = regs;
    }

    /// Advance the CPU by exactly one T-state.
    pub fn tick(&mut self, pins_in: u64) -> u64 {
        self.total_ticks += Ticks::new(1);

        if self.micro_ops.is_empty() {
            self.micro_ops.push(MicroOp::FetchOpcode);
            self.sub_tick = 0;
        }
        let op = self.micro_ops.current().expect("queue primed above");

        if let Some(wait_at) = op.wait_sample_at() {
            if self.sub_tick == wait_at && pins_in & pins::WAIT != 0 {
                let held = pins::clear_ctrl(pins_in);
                self.pins = held;
                return held;
            }
        }

        let mut pins = pins::clear_ctrl(pins_in);
        self.drive(op, self.sub_tick, pins_in, &mut pins);

        let last = op.t_states().saturating_sub(1);
        if self.sub_tick >= last {
            self.micro_ops.advance();
            self.sub_tick = 0;
            self.drain_execute_ops();
            if self.micro_ops.is_empty() {
                // Overlap: the same tick that finished op N is T1 of op N+1's fetch.
                self.micro_ops.push(MicroOp::FetchOpcode);
                pins = self.fetch_t1_into(pins);
                self.sub_tick = 1;
            }
        } else {
            self.sub_tick += 1;
        }

        pins |= pins_in & (pins::WAIT | pins::INT | pins::NMI | pins::RESET | pins::IEIO);
        if self.regs.halted {
            pins |= pins::HALT;
        }
        if self.reti_pulse {
            pins |= pins::RETI;
            self.reti_pulse = false;
        }

        self.pins = pins;
        pins
    }

    /// Zero-duration `MicroOp::Execute` entries run immediately and may push
    /// more micro-ops (including more `Execute`s), so drain them in a loop
    /// before returning control to the tick-driven bus state machine.
    fn drain_execute_ops(&mut self) {
        while self.micro_ops.current() == Some(MicroOp::Execute) {
            self.micro_ops.advance();
            self.run_followup();
        }
    }

    /// T1 of an opcode fetch, expressed as the ctrl+addr bits to OR in.
    fn fetch_t1(&mut self, _sub: u8) -> u64 {
        self.fetch_t1_into(0)
    }

    fn fetch_t1_into(&mut self, pins: u64) -> u64 {
        let addr = self.regs.pc;
        self.boundary_pc = addr;
        if !self.regs.halted {
            self.regs.pc = self.regs.pc.wrapping_add(1);
        }
        pins::set_addr_ctrl(pins, addr, pins::M1 | pins::MREQ | pins::RD)
    }

    /// Perform the work for T-state `sub` of `op`, writing into `pins`.
    fn drive(&mut self, op: MicroOp, sub: u8, pins_in: u64, pins: &mut u64) {
        match op {
            MicroOp::FetchOpcode => self.drive_fetch(sub, pins_in, pins),
            MicroOp::IntAck => self.drive_intack(sub, pins_in, pins),
            MicroOp::Internal(_) | MicroOp::Execute => {}
            MicroOp::FetchDisplacement => {
                // Unlike FetchOpcode this is a plain memory read at PC, not
                // an M1 cycle: real hardware does not refresh for it.
                if sub == 0 {
                    *pins = pins::set_addr_ctrl(*pins, self.regs.pc, pins::MREQ | pins::RD);
                }
                if sub == 2 {
                    self.displacement = pins::get_data(pins_in);
                    self.regs.pc = self.regs.pc.wrapping_add(1);
                }
            }
            MicroOp::FetchDdcbOpcode => {
                if sub == 0 {
                    *pins = pins::set_addr_ctrl(*pins, self.regs.pc, pins::MREQ | pins::RD);
                }
                if sub == op.t_states() - 1 {
                    self.opcode = pins::get_data(pins_in);
                    self.regs.pc = self.regs.pc.wrapping_add(1);
                }
            }
            MicroOp::ReadImm8 | MicroOp::ReadImm16Lo => {
                if sub == 0 {
                    *pins = pins::set_addr_ctrl(*pins, self.regs.pc, pins::MREQ | pins::RD);
                }
                if sub == op.t_states() - 1 {
                    self.data_lo = pins::get_data(pins_in);
                    self.regs.pc = self.regs.pc.wrapping_add(1);
                }
            }
            MicroOp::ReadImm16Hi => {
                if sub == 0 {
                    *pins = pins::set_addr_ctrl(*pins, self.regs.pc, pins::MREQ | pins::RD);
                }
                if sub == op.t_states() - 1 {
                    self.data_hi = pins::get_data(pins_in);
                    self.regs.pc = self.regs.pc.wrapping_add(1);
                }
            }
            MicroOp::ReadMem => self.drive_mem_read(sub, pins_in, pins),
            MicroOp::ReadMem16Lo => {
                if sub == 0 {
                    *pins = pins::set_addr_ctrl(*pins, self.addr, pins::MREQ | pins::RD);
                }
                if sub == op.t_states() - 1 {
                    self.data_lo = pins::get_data(pins_in);
                    self.addr = self.addr.wrapping_add(1);
                }
            }
            MicroOp::ReadMem16Hi => {
                if sub == 0 {
                    *pins = pins::set_addr_ctrl(*pins, self.addr, pins::MREQ | pins::RD);
                }
                if sub == op.t_states() - 1 {
                    self.data_hi = pins::get_data(pins_in);
                }
            }
            MicroOp::WriteMem => {
                if sub == 0 {
                    *pins = pins::set_addr_data_ctrl(
                        *pins,
                        self.addr,
                        self.data_lo,
                        pins::MREQ | pins::WR,
                    );
                }
            }
            MicroOp::WriteMem16Lo => {
                if sub == 0 {
                    *pins = pins::set_addr_data_ctrl(
                        *pins,
                        self.addr,
                        self.data_lo,
                        pins::MREQ | pins::WR,
                    );
                    self.addr = self.addr.wrapping_add(1);
                }
            }
            MicroOp::WriteMem16Hi => {
                if sub == 0 {
                    *pins = pins::set_addr_data_ctrl(
                        *pins,
                        self.addr,
                        self.data_hi,
                        pins::MREQ | pins::WR,
                    );
                }
            }
            MicroOp::WriteMemHiFirst => {
                if sub == 0 {
                    self.regs.sp = self.regs.sp.wrapping_sub(1);
                    *pins = pins::set_addr_data_ctrl(
                        *pins,
                        self.regs.sp,
                        self.data_hi,
                        pins::MREQ | pins::WR,
                    );
                }
            }
            MicroOp::WriteMemLoSecond => {
                if sub == 0 {
                    self.regs.sp = self.regs.sp.wrapping_sub(1);
                    *pins = pins::set_addr_data_ctrl(
                        *pins,
                        self.regs.sp,
                        self.data_lo,
                        pins::MREQ | pins::WR,
                    );
                }
            }
            MicroOp::IoRead => {
                if sub == 0 {
                    *pins = pins::set_addr_ctrl(*pins, self.addr, pins::IORQ | pins::RD);
                }
                if sub == op.t_states() - 1 {
                    self.data_lo = pins::get_data(pins_in);
                }
            }
            MicroOp::IoWrite => {
                if sub == 0 {
                    *pins = pins::set_addr_data_ctrl(
                        *pins,
                        self.addr,
                        self.data_lo,
                        pins::IORQ | pins::WR,
                    );
                }
            }
        }
    }

    fn drive_mem_read(&mut self, sub: u8, pins_in: u64, pins: &mut u64) {
        if sub == 0 {
            *pins = pins::set_addr_ctrl(*pins, self.addr, pins::MREQ | pins::RD);
        }
        if sub == 2 {
            self.data_lo = pins::get_data(pins_in);
        }
    }

    fn drive_fetch(&mut self, sub: u8, pins_in: u64, pins: &mut u64) {
        match sub {
            0 => {
                *pins = self.fetch_t1_into(*pins);
            }
            1 => {}
            2 => {
                let fetched = pins::get_data(pins_in);
                // Refresh cycle: address = R, assert MREQ|RFSH, then increment R.
                *pins = pins::set_addr_ctrl(*pins, u16::from(self.regs.r), pins::MREQ | pins::RFSH);
                self.regs.r = (self.regs.r & 0x80) | (self.regs.r.wrapping_add(1) & 0x7F);

                if self.regs.halted {
                    // Keep re-fetching NOPs; check for a release first.
                    if self.check_interrupt_boundary(pins_in) {
                        self.regs.halted = false;
                    } else {
                        self.opcode = 0x00;
                        self.prefix = Prefix::None;
                        self.active_table = Prefix::None;
                        self.stage = 0;
                    }
                    return;
                }

                if self.check_interrupt_boundary(pins_in) {
                    return;
                }

                self.opcode = fetched;
                self.latch_and_dispatch();
            }
            _ => {}
        }
    }

    /// Sample RESET/NMI/INT at an instruction boundary. Returns true if a
    /// vector sequence was queued (i.e. the normal opcode dispatch must be
    /// skipped this time).
    fn check_interrupt_boundary(&mut self, pins_in: u64) -> bool {
        if pins_in & pins::RESET != 0 {
            self.init();
            return true;
        }
        if pins_in & pins::NMI != 0 {
            // The overlapped fetch already advanced PC past the opcode it
            // solicited; that opcode is discarded, not executed, so PC must
            // go back to the instruction boundary before it's pushed.
            self.regs.pc = self.boundary_pc;
            self.regs.halted = false;
            self.pending_vector = Some(PendingVector::Nmi);
            self.stage = 0;
            self.queue_internal(1);
            self.push_return_address_and_followup();
            return true;
        }
        if pins_in & pins::INT != 0 && self.regs.iff1 && !self.ei_delay {
            self.regs.pc = self.boundary_pc;
            self.regs.halted = false;
            self.pending_vector = Some(PendingVector::Int);
            self.regs.iff1 = false;
            self.regs.iff2 = false;
            self.stage = 0;
            self.micro_ops.push(MicroOp::IntAck);
            self.queue_execute_followup();
            return true;
        }
        self.ei_delay = false;
        false
    }

    fn push_return_address_and_followup(&mut self) {
        self.data_hi = (self.regs.pc >> 8) as u8;
        self.data_lo = self.regs.pc as u8;
        self.micro_ops.push(MicroOp::WriteMemHiFirst);
        self.micro_ops.push(MicroOp::WriteMemLoSecond);
        self.queue_execute_followup();
    }

    fn drive_intack(&mut self, sub: u8, pins_in: u64, pins: &mut u64) {
        if sub == 0 {
            *pins = pins::set_addr_ctrl(*pins, self.regs.pc, pins::M1 | pins::IORQ);
        }
        if sub == 6 {
            self.int_vector = pins::get_data(pins_in);
        }
    }

    /// Decode `self.opcode` under the current prefix state, latching
    /// prefix bytes and re-priming the queue for the following fetch.
    ///
    /// Every arm that actually dispatches an instruction snapshots which
    /// table it belongs to into `active_table` and resets `prefix` to
    /// `None` before doing so: `active_table` is what the followup chain
    /// and the register/index-selection helpers in `access.rs` consult for
    /// the rest of this instruction's (possibly multi-tick) lifetime, while
    /// `prefix` reverts immediately so the opcode byte the *next*
    /// instruction's overlapped fetch latches is read as a fresh start
    /// rather than a continuation of this one.
    fn latch_and_dispatch(&mut self) {
        match self.prefix {
            Prefix::None => match self.opcode {
                0xCB => self.prefix = Prefix::Cb,
                0xED => self.prefix = Prefix::Ed,
                0xDD => self.prefix = Prefix::Dd,
                0xFD => self.prefix = Prefix::Fd,
                _ => {
                    self.active_table = Prefix::None;
                    self.stage = 0;
                    self.execute_unprefixed();
                    return;
                }
            },
            Prefix::Dd | Prefix::Fd if self.opcode == 0xCB => {
                // `DD CB d op` / `FD CB d op`: the displacement and the real
                // operation byte are both plain memory reads, never M1
                // cycles, so queue them explicitly instead of falling back
                // to the auto-overlap mechanism (which would wrongly
                // M1-fetch the displacement byte as if it were the next
                // opcode).
                self.active_table = if self.prefix == Prefix::Dd {
                    Prefix::DdCb
                } else {
                    Prefix::FdCb
                };
                self.prefix = Prefix::None;
                self.stage = 0;
                self.micro_ops.push(MicroOp::FetchDisplacement);
                self.micro_ops.push(MicroOp::FetchDdcbOpcode);
                self.queue_execute_followup();
                return;
            }
            Prefix::Dd | Prefix::Fd => {
                self.active_table = self.prefix;
                self.prefix = Prefix::None;
                self.stage = 0;
                self.execute_dd_fd();
                return;
            }
            Prefix::Cb => {
                self.active_table = Prefix::Cb;
                self.prefix = Prefix::None;
                self.stage = 0;
                self.execute_cb();
                return;
            }
            Prefix::Ed => {
                self.active_table = Prefix::Ed;
                self.prefix = Prefix::None;
                self.stage = 0;
                self.execute_ed();
                return;
            }
            Prefix::DdCb | Prefix::FdCb => {
                unreachable!(
                    "DdCb/FdCb resolves via FetchDisplacement+FetchDdcbOpcode \
                     and never re-enters latch_and_dispatch"
                );
            }
        }
    }

    fn queue_internal(&mut self, t_states: u8) {
        self.micro_ops.push(MicroOp::Internal(t_states));
    }

    fn queue_execute_followup(&mut self) {
        self.micro_ops.push(MicroOp::Execute);
    }

    /// Dispatch a completed bus transaction's side effect: either a pending
    /// interrupt/NMI vector, or a prefix-aware instruction followup.
    fn run_followup(&mut self) {
        if let Some(vector) = self.pending_vector {
            self.run_vector_followup(vector);
            return;
        }
        match self.active_table {
            Prefix::None => self.followup_unprefixed(),
            Prefix::Cb => self.followup_cb(),
            Prefix::Ed => self.followup_ed(),
            Prefix::Dd | Prefix::Fd => self.followup_dd_fd(),
            Prefix::DdCb | Prefix::FdCb => self.followup_ddcb_fdcb(),
        }
    }

    fn run_vector_followup(&mut self, vector: PendingVector) {
        match vector {
            PendingVector::Nmi => {
                // SP was already decremented by the WriteMemHiFirst/LoSecond
                // ops queued in `check_interrupt_boundary`.
                self.regs.iff1 = false;
                self.regs.pc = 0x0066;
                self.pending_vector = None;
            }
            PendingVector::Int => {
                // Push the return address the same way the NMI path does,
                // then come back through `IntVector` to dispatch per IM.
                self.pending_vector = Some(PendingVector::IntVector);
                self.push_return_address_and_followup();
            }
            PendingVector::IntVector => {
                // SP was already decremented by the push above.
                match self.regs.im {
                    0 => {
                        // Simplification: treat the solicited byte as the
                        // next opcode to execute directly.
                        self.pending_vector = None;
                        self.opcode = self.int_vector;
                        self.prefix = Prefix::None;
                        self.active_table = Prefix::None;
                        self.stage = 0;
                        self.execute_unprefixed();
                    }
                    1 => {
                        self.pending_vector = None;
                        self.regs.pc = 0x0038;
                    }
                    _ => {
                        // IM 2: vector table entry at (I:vector), little-endian.
                        self.addr = (u16::from(self.regs.i) << 8) | u16::from(self.int_vector);
                        self.micro_ops.push(MicroOp::ReadMem16Lo);
                        self.micro_ops.push(MicroOp::ReadMem16Hi);
                        self.pending_vector = Some(PendingVector::IntTable);
                        self.queue_execute_followup();
                    }
                }
            }
            PendingVector::IntTable => {
                self.regs.pc = u16::from_le_bytes([self.data_lo, self.data_hi]);
                self.pending_vector = None;
            }
        }
    }
}

impl Observable for Z80 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pc" => Some(self.regs.pc.into()),
            "sp" => Some(self.regs.sp.into()),
            "af" => Some(self.regs.af().into()),
            "bc" => Some(self.regs.bc().into()),
            "de" => Some(self.regs.de().into()),
            "hl" => Some(self.regs.hl().into()),
            "ix" => Some(self.regs.ix.into()),
            "iy" => Some(self.regs.iy.into()),
            "a" => Some(self.regs.a.into()),
            "f" => Some(self.regs.f.into()),
            "i" => Some(self.regs.i.into()),
            "r" => Some(self.regs.r.into()),
            "im" => Some(self.regs.im.into()),
            "iff1" => Some(self.regs.iff1.into()),
            "iff2" => Some(self.regs.iff2.into()),
            "wz" => Some(self.regs.wz.into()),
            "flags.s" => Some((self.regs.f & SF != 0).into()),
            "flags.z" => Some((self.regs.f & ZF != 0).into()),
            "flags.c" => Some((self.regs.f & CF != 0).into()),
            "halted" => Some(self.regs.halted.into()),
            "cycle" => Some(Value::U64(self.total_ticks.get())),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc", "sp", "af", "bc", "de", "hl", "ix", "iy", "a", "f", "i", "r", "im", "iff1",
            "iff2", "wz", "flags.s", "flags.z", "flags.c", "halted", "cycle",
        ]
    }
}
