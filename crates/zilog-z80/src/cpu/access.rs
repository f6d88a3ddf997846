//! Register-index decoding shared by every opcode table.
//!
//! The Z80 encodes its 8-bit register operand as a 3-bit field with a fixed
//! meaning (`B C D E H L (HL) A`) across the unprefixed, CB, and ED tables;
//! DD/FD prefixes additionally remap `H`/`L` to the high/low half of
//! whichever index register is active. Keeping that mapping in one place
//! means every opcode table handler can read it without re-deriving it.

use crate::flags::{CF, PF, SF, ZF};

use super::{Prefix, Z80};

impl Z80 {
    /// Decode the 3-bit register field `r` against B/C/D/E/H/L/A, honoring
    /// an active DD/FD prefix (H/L become IXH/IXL or IYH/IYL). `r == 6`
    /// (the `(HL)`/`(IX+d)`/`(IY+d)` slot) is never valid here; callers
    /// special-case it before reaching this.
    #[must_use]
    pub(super) fn get_reg8(&self, r: u8) -> u8 {
        if matches!(self.active_table, Prefix::Dd | Prefix::Fd) && (r == 4 || r == 5) {
            return self.get_reg8_indexed(r);
        }
        match r {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            7 => self.regs.a,
            _ => unreachable!("r=6 ((HL)) must be handled by the caller"),
        }
    }

    pub(super) fn set_reg8(&mut self, r: u8, value: u8) {
        if matches!(self.active_table, Prefix::Dd | Prefix::Fd) && (r == 4 || r == 5) {
            self.set_reg8_indexed(r, value);
            return;
        }
        match r {
            0 => self.regs.b = value,
            1 => self.regs.c = value,
            2 => self.regs.d = value,
            3 => self.regs.e = value,
            4 => self.regs.h = value,
            5 => self.regs.l = value,
            7 => self.regs.a = value,
            _ => unreachable!("r=6 ((HL)) must be handled by the caller"),
        }
    }

    /// Decode the 2-bit register-pair field used by `ADC/SBC HL,rr` and
    /// similar ED opcodes: `BC DE HL SP`.
    #[must_use]
    pub(super) fn get_reg16(&self, rp: u8) -> u16 {
        match rp {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            3 => self.regs.sp,
            _ => unreachable!("rp is a 2-bit field"),
        }
    }

    pub(super) fn set_reg16(&mut self, rp: u8, value: u16) {
        match rp {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            3 => self.regs.sp = value,
            _ => unreachable!("rp is a 2-bit field"),
        }
    }

    /// Decode `r` against the plain B/C/D/E/H/L/A register file, ignoring
    /// any active DD/FD prefix. Displacement instructions (`LD r,(IX+d)`,
    /// `LD (IX+d),r`) address memory through the index register but every
    /// other register operand in the same byte stays the real H/L, never
    /// IXH/IXL — only the standalone `r`/`r'` and ALU forms get the
    /// prefix substitution.
    #[must_use]
    pub(super) fn get_reg8_plain(&self, r: u8) -> u8 {
        match r {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            7 => self.regs.a,
            _ => unreachable!("r=6 ((HL)) must be handled by the caller"),
        }
    }

    pub(super) fn set_reg8_plain(&mut self, r: u8, value: u8) {
        match r {
            0 => self.regs.b = value,
            1 => self.regs.c = value,
            2 => self.regs.d = value,
            3 => self.regs.e = value,
            4 => self.regs.h = value,
            5 => self.regs.l = value,
            7 => self.regs.a = value,
            _ => unreachable!("r=6 ((HL)) must be handled by the caller"),
        }
    }

    /// The index register (IX or IY) selected by the active prefix.
    #[must_use]
    pub(super) fn get_index_reg(&self) -> u16 {
        if self.active_table == Prefix::Fd || self.active_table == Prefix::FdCb {
            self.regs.iy
        } else {
            self.regs.ix
        }
    }

    pub(super) fn set_index_reg(&mut self, value: u16) {
        if self.active_table == Prefix::Fd || self.active_table == Prefix::FdCb {
            self.regs.iy = value;
        } else {
            self.regs.ix = value;
        }
    }

    /// `r == 4` is the high half (IXH/IYH), `r == 5` the low half (IXL/IYL).
    #[must_use]
    pub(super) fn get_reg8_indexed(&self, r: u8) -> u8 {
        let idx = self.get_index_reg();
        if r == 4 {
            (idx >> 8) as u8
        } else {
            idx as u8
        }
    }

    pub(super) fn set_reg8_indexed(&mut self, r: u8, value: u8) {
        let idx = self.get_index_reg();
        let updated = if r == 4 {
            (idx & 0x00FF) | (u16::from(value) << 8)
        } else {
            (idx & 0xFF00) | u16::from(value)
        };
        self.set_index_reg(updated);
    }

    /// Decode the 3-bit condition field: `NZ Z NC C PO PE P M`.
    #[must_use]
    pub(super) fn condition(&self, cc: u8) -> bool {
        match cc {
            0 => self.regs.f & ZF == 0,
            1 => self.regs.f & ZF != 0,
            2 => self.regs.f & CF == 0,
            3 => self.regs.f & CF != 0,
            4 => self.regs.f & PF == 0,
            5 => self.regs.f & PF != 0,
            6 => self.regs.f & SF == 0,
            7 => self.regs.f & SF != 0,
            _ => unreachable!("cc is a 3-bit field"),
        }
    }
}
