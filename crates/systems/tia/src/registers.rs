//! TIA register map
//!
//! Write registers are decoded from the low six bits of the address, read
//! registers from the low four.

use serde::{Deserialize, Serialize};

use crate::TiaError;

/// Write registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    Vsync = 0x00,
    Vblank = 0x01,
    Wsync = 0x02,
    Rsync = 0x03,
    Nusiz0 = 0x04,
    Nusiz1 = 0x05,
    Colup0 = 0x06,
    Colup1 = 0x07,
    Colupf = 0x08,
    Colubk = 0x09,
    Ctrlpf = 0x0a,
    Refp0 = 0x0b,
    Refp1 = 0x0c,
    Pf0 = 0x0d,
    Pf1 = 0x0e,
    Pf2 = 0x0f,
    Resp0 = 0x10,
    Resp1 = 0x11,
    Resm0 = 0x12,
    Resm1 = 0x13,
    Resbl = 0x14,
    Audc0 = 0x15,
    Audc1 = 0x16,
    Audf0 = 0x17,
    Audf1 = 0x18,
    Audv0 = 0x19,
    Audv1 = 0x1a,
    Grp0 = 0x1b,
    Grp1 = 0x1c,
    Enam0 = 0x1d,
    Enam1 = 0x1e,
    Enabl = 0x1f,
    Hmp0 = 0x20,
    Hmp1 = 0x21,
    Hmm0 = 0x22,
    Hmm1 = 0x23,
    Hmbl = 0x24,
    Vdelp0 = 0x25,
    Vdelp1 = 0x26,
    Vdelbl = 0x27,
    Resmp0 = 0x28,
    Resmp1 = 0x29,
    Hmove = 0x2a,
    Hmclr = 0x2b,
    Cxclr = 0x2c,
}

const WRITE_REGISTERS: [Register; 45] = [
    Register::Vsync,
    Register::Vblank,
    Register::Wsync,
    Register::Rsync,
    Register::Nusiz0,
    Register::Nusiz1,
    Register::Colup0,
    Register::Colup1,
    Register::Colupf,
    Register::Colubk,
    Register::Ctrlpf,
    Register::Refp0,
    Register::Refp1,
    Register::Pf0,
    Register::Pf1,
    Register::Pf2,
    Register::Resp0,
    Register::Resp1,
    Register::Resm0,
    Register::Resm1,
    Register::Resbl,
    Register::Audc0,
    Register::Audc1,
    Register::Audf0,
    Register::Audf1,
    Register::Audv0,
    Register::Audv1,
    Register::Grp0,
    Register::Grp1,
    Register::Enam0,
    Register::Enam1,
    Register::Enabl,
    Register::Hmp0,
    Register::Hmp1,
    Register::Hmm0,
    Register::Hmm1,
    Register::Hmbl,
    Register::Vdelp0,
    Register::Vdelp1,
    Register::Vdelbl,
    Register::Resmp0,
    Register::Resmp1,
    Register::Hmove,
    Register::Hmclr,
    Register::Cxclr,
];

impl TryFrom<u8> for Register {
    type Error = TiaError;

    fn try_from(addr: u8) -> Result<Self, Self::Error> {
        WRITE_REGISTERS
            .get((addr & 0x3f) as usize)
            .copied()
            .ok_or(TiaError::UnknownRegister(addr))
    }
}

impl Register {
    pub fn address(self) -> u8 {
        self as u8
    }

    /// Audio registers are accepted but do nothing
    pub fn is_audio(self) -> bool {
        (0x15..=0x1a).contains(&self.address())
    }
}

// Read registers
pub const CXM0P: u8 = 0x00;
pub const CXM1P: u8 = 0x01;
pub const CXP0FB: u8 = 0x02;
pub const CXP1FB: u8 = 0x03;
pub const CXM0FB: u8 = 0x04;
pub const CXM1FB: u8 = 0x05;
pub const CXBLPF: u8 = 0x06;
pub const CXPPMM: u8 = 0x07;
pub const INPT0: u8 = 0x08;
pub const INPT5: u8 = 0x0d;

/// NUSIZx: missile size in bits 4-5, copies/player size in bits 0-2
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nusiz {
    pub size: u8,
    pub copies: u8,
}

impl Nusiz {
    /// Unused bits are ignored
    pub fn decode(value: u8) -> Self {
        Self {
            size: (value & 0x30) >> 4,
            copies: value & 0x07,
        }
    }

    pub fn encode(self) -> u8 {
        (self.size & 0x03) << 4 | (self.copies & 0x07)
    }
}

/// CTRLPF: reflect, score, priority and the ball size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ctrlpf {
    pub reflect: bool,
    pub score: bool,
    pub priority: bool,
    pub ball_size: u8,
}

impl Ctrlpf {
    pub fn decode(value: u8) -> Self {
        Self {
            reflect: value & 0x01 == 0x01,
            score: value & 0x02 == 0x02,
            priority: value & 0x04 == 0x04,
            ball_size: (value & 0x30) >> 4,
        }
    }

    pub fn encode(self) -> u8 {
        u8::from(self.reflect)
            | u8::from(self.score) << 1
            | u8::from(self.priority) << 2
            | (self.ball_size & 0x03) << 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_decode() {
        assert_eq!(Register::try_from(0x00).unwrap(), Register::Vsync);
        assert_eq!(Register::try_from(0x2a).unwrap(), Register::Hmove);
        assert_eq!(Register::try_from(0x2c).unwrap(), Register::Cxclr);
        // mirrored above 0x40
        assert_eq!(Register::try_from(0x6a).unwrap(), Register::Hmove);

        assert!(matches!(
            Register::try_from(0x2d),
            Err(TiaError::UnknownRegister(0x2d))
        ));
        assert!(Register::try_from(0x3f).is_err());
    }

    #[test]
    fn test_table_matches_discriminants() {
        for (i, reg) in WRITE_REGISTERS.iter().enumerate() {
            assert_eq!(reg.address() as usize, i, "{:?}", reg);
        }
    }

    #[test]
    fn test_audio_registers() {
        assert!(Register::Audc0.is_audio());
        assert!(Register::Audv1.is_audio());
        assert!(!Register::Grp0.is_audio());
        assert!(!Register::Resbl.is_audio());
    }

    #[test]
    fn test_nusiz_decode_encode_idempotent() {
        for v in 0..=255u8 {
            let once = Nusiz::decode(v);
            assert_eq!(Nusiz::decode(once.encode()), once, "value {:#04x}", v);
        }
        assert_eq!(Nusiz::decode(0x35), Nusiz { size: 3, copies: 5 });
        // stray bits fall away
        assert_eq!(Nusiz::decode(0xc8), Nusiz::default());
    }

    #[test]
    fn test_ctrlpf_decode_encode_idempotent() {
        for v in 0..=255u8 {
            let once = Ctrlpf::decode(v);
            assert_eq!(Ctrlpf::decode(once.encode()), once, "value {:#04x}", v);
        }

        let c = Ctrlpf::decode(0x25);
        assert!(c.reflect);
        assert!(!c.score);
        assert!(c.priority);
        assert_eq!(c.ball_size, 2);
    }
}
