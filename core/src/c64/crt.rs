//! CRT cartridge-image file parsing: a 0x40-byte (or longer) header,
//! big-endian 16/32-bit fields, followed by zero or more "CHIP" packets.

use super::cartridge::{Cartridge, CartridgeKind, RomPacket, kind_from_crt_type};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrtError {
    FileTypeMismatch,
    UnsupportedCartridge(u16),
    Truncated,
}

impl std::fmt::Display for CrtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileTypeMismatch => write!(f, "not a CRT file (bad magic)"),
            Self::UnsupportedCartridge(code) => {
                write!(f, "unsupported cartridge hardware type {code}")
            }
            Self::Truncated => write!(f, "CRT file truncated before a declared field or CHIP packet ended"),
        }
    }
}

impl std::error::Error for CrtError {}

const MAGIC: &[u8; 16] = b"C64 CARTRIDGE   ";
const MIN_HEADER_LEN: u32 = 0x40;

pub struct ParsedCrt {
    pub kind: CartridgeKind,
    pub exrom: bool,
    pub game: bool,
    pub name: String,
    pub packets: Vec<RomPacket>,
}

fn be16(b: &[u8], off: usize) -> Option<u16> {
    Some(u16::from_be_bytes(b.get(off..off + 2)?.try_into().ok()?))
}

fn be32(b: &[u8], off: usize) -> Option<u32> {
    Some(u32::from_be_bytes(b.get(off..off + 4)?.try_into().ok()?))
}

/// Parse a CRT file's bytes into cartridge-kind + ROM packets. Does not
/// allocate on-cart RAM or wire up flash state — the caller (expansion
/// port) builds the live `Cartridge` from the returned data, since sizing
/// on-cart RAM is a per-kind policy decision.
pub fn parse(bytes: &[u8]) -> Result<ParsedCrt, CrtError> {
    if bytes.len() < 0x20 || &bytes[0..16] != MAGIC {
        return Err(CrtError::FileTypeMismatch);
    }
    let header_len = be32(bytes, 0x10).ok_or(CrtError::Truncated)?;
    // Some files lie about the header length (commonly claiming 0x20);
    // clamp to the real minimum.
    let header_len = header_len.max(MIN_HEADER_LEN) as usize;
    if bytes.len() < header_len {
        return Err(CrtError::Truncated);
    }
    let type_code = be16(bytes, 0x16).ok_or(CrtError::Truncated)?;
    let exrom = bytes.get(0x18).copied().unwrap_or(0) == 0;
    let game = bytes.get(0x19).copied().unwrap_or(0) == 0;

    let name_bytes = &bytes[0x20..0x40.min(bytes.len())];
    let name_end = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
    let name = String::from_utf8_lossy(&name_bytes[..name_end]).into_owned();

    let kind = kind_from_crt_type(type_code).ok_or(CrtError::UnsupportedCartridge(type_code))?;

    let mut packets = Vec::new();
    let mut pos = header_len;
    while pos + 16 <= bytes.len() {
        if &bytes[pos..pos + 4] != b"CHIP" {
            break;
        }
        let packet_len = be32(bytes, pos + 4).ok_or(CrtError::Truncated)? as usize;
        let bank = be16(bytes, pos + 0x0A).ok_or(CrtError::Truncated)?;
        let load_address = be16(bytes, pos + 0x0C).ok_or(CrtError::Truncated)?;
        let data_size = be16(bytes, pos + 0x0E).ok_or(CrtError::Truncated)? as usize;
        let data_start = pos + 0x10;
        let data_end = data_start + data_size;
        if data_end > bytes.len() {
            return Err(CrtError::Truncated);
        }
        packets.push(RomPacket {
            bank,
            load_address,
            data: bytes[data_start..data_end].to_vec(),
        });
        pos += packet_len.max(16);
    }

    Ok(ParsedCrt { kind, exrom, game, name, packets })
}

/// Build a live `Cartridge` from a parsed CRT, wiring GAME/EXROM from the
/// header and giving EasyFlash its flash-array preload.
pub fn build_cartridge(parsed: &ParsedCrt) -> Cartridge {
    // `Cartridge::new` sizes on-cart RAM from `kind` alone and `reset()`
    // (called internally) re-derives GAME/EXROM for every variant except
    // the plain-ROM group, which keeps whatever is passed here — exactly
    // the CRT header's initial lines.
    let mut cart = Cartridge::new(parsed.kind, parsed.packets.clone(), parsed.game, parsed.exrom);
    if parsed.kind == CartridgeKind::EasyFlash {
        for packet in &parsed.packets {
            cart.load_easyflash_packet(packet);
        }
    }
    cart
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_crt(type_code: u16, exrom: u8, game: u8, chip: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0u8; 0x40];
        bytes[0..16].copy_from_slice(MAGIC);
        bytes[0x10..0x14].copy_from_slice(&0x40u32.to_be_bytes());
        bytes[0x16..0x18].copy_from_slice(&type_code.to_be_bytes());
        bytes[0x18] = exrom;
        bytes[0x19] = game;
        bytes.extend_from_slice(chip);
        bytes
    }

    fn make_chip(bank: u16, load_address: u16, data: &[u8]) -> Vec<u8> {
        let mut chip = Vec::new();
        chip.extend_from_slice(b"CHIP");
        let total_len = 0x10 + data.len();
        chip.extend_from_slice(&(total_len as u32).to_be_bytes());
        chip.extend_from_slice(&0u16.to_be_bytes()); // chip type: ROM
        chip.extend_from_slice(&bank.to_be_bytes());
        chip.extend_from_slice(&load_address.to_be_bytes());
        chip.extend_from_slice(&(data.len() as u16).to_be_bytes());
        chip.extend_from_slice(data);
        chip
    }

    #[test]
    fn rejects_wrong_magic() {
        let bytes = vec![0u8; 64];
        assert_eq!(parse(&bytes), Err(CrtError::FileTypeMismatch));
    }

    #[test]
    fn clamps_lying_header_length() {
        let mut bytes = make_crt(0, 0, 0, &make_chip(0, 0x8000, &[0x42]));
        bytes[0x10..0x14].copy_from_slice(&0x20u32.to_be_bytes());
        let parsed = parse(&bytes).unwrap();
        assert_eq!(parsed.packets.len(), 1);
    }

    #[test]
    fn parses_normal_cartridge_single_packet() {
        let bytes = make_crt(0, 1, 0, &make_chip(0, 0x8000, &[0xDE, 0xAD]));
        let parsed = parse(&bytes).unwrap();
        assert_eq!(parsed.kind, CartridgeKind::Normal);
        assert!(parsed.exrom);
        assert!(!parsed.game);
        assert_eq!(parsed.packets[0].data, vec![0xDE, 0xAD]);
    }

    #[test]
    fn unsupported_type_code_reported_not_aborted_on_partial_parse() {
        let bytes = make_crt(9999, 0, 0, &[]);
        assert_eq!(parse(&bytes), Err(CrtError::UnsupportedCartridge(9999)));
    }

    #[test]
    fn build_cartridge_wires_game_exrom_from_header() {
        let bytes = make_crt(32, 0, 0, &make_chip(0, 0x8000, &[0x01]));
        let parsed = parse(&bytes).unwrap();
        let cart = build_cartridge(&parsed);
        assert!(cart.exrom);
        assert!(cart.game);
    }

    #[test]
    fn build_cartridge_preloads_easyflash_bank_into_flash_array() {
        let bytes = make_crt(32, 0, 0, &make_chip(0, 0x8000, &[0xAB, 0xCD]));
        let parsed = parse(&bytes).unwrap();
        let cart = build_cartridge(&parsed);
        assert_eq!(cart.peek(0x8000), 0xAB);
        assert_eq!(cart.peek(0x8001), 0xCD);
    }
}
