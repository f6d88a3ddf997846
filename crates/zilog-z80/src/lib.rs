//! Cycle-accurate Z80 CPU emulator.
//!
//! Each call to `tick()` advances exactly one T-state.

mod alu;
mod cpu;
mod flags;
mod microcode;
mod pins;
mod registers;

pub use cpu::Z80;
pub use flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
pub use pins::{
    clear_ctrl, get_addr, get_data, set_addr, set_addr_ctrl, set_addr_data, set_addr_data_ctrl,
    set_data, CTRL_PIN_MASK, HALT, IEIO, INT, IORQ, M1, MREQ, NMI, PIN_ADDR_MASK, PIN_DATA_MASK,
    PIN_DATA_SHIFT, RD, RESET, RETI, RFSH, WAIT, WR,
};
pub use registers::Registers;
