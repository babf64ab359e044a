//! CPU identity adapter
//!
//! The brand string comes from the extended CPUID leaves
//! `0x8000_0002..=0x8000_0004` on x86. Each leaf returns four 32-bit
//! registers holding 16 bytes of ASCII, so the whole string fits in a
//! 48-byte buffer. Vendors right-justify it with leading spaces.
//!
//! Where CPUID has no brand leaves (non-x86 targets, or hypervisors that cap
//! the extended range) or they hold only zeros, the brand reported by sysinfo
//! is used instead.

use sysinfo::System;
use tracing::debug;

use super::{CpuSource, Field};
use crate::error::FieldUnavailable;

/// Extended CPUID leaves that carry the processor brand string
pub const BRAND_LEAVES: [u32; 3] = [0x8000_0002, 0x8000_0003, 0x8000_0004];

/// Size of the brand string buffer: 3 leaves × 4 registers × 4 bytes
pub const BRAND_LEN: usize = 48;

/// Registers (eax, ebx, ecx, edx) for each of the three brand leaves
pub type BrandRegisters = [[u32; 4]; 3];

/// CPU adapter for the build target
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCpu;

impl CpuSource for NativeCpu {
    fn cpu_model(&self) -> Field<String> {
        let model = match read_brand_registers() {
            Some(registers) => decode_brand(&brand_bytes(&registers)),
            None => Field::Unavailable(FieldUnavailable::Unsupported),
        };

        let model = or_fallback(model, sysinfo_brand);

        debug!(model = ?model, "cpu model queried");
        model
    }
}

/// Try `fallback` when CPUID has no brand leaves or they came back blank.
/// Unreadable bytes are kept as they are.
fn or_fallback(model: Field<String>, fallback: impl FnOnce() -> Field<String>) -> Field<String> {
    let unusable = matches!(
        model,
        Field::Unavailable(FieldUnavailable::Unsupported | FieldUnavailable::Empty { .. })
    );
    if !unusable {
        return model;
    }

    debug!(reason = ?model.reason(), "CPUID brand unusable, asking sysinfo");
    fallback()
}

/// Lay the brand registers out as bytes, in leaf then eax/ebx/ecx/edx order
pub fn brand_bytes(registers: &BrandRegisters) -> [u8; BRAND_LEN] {
    let mut buffer = [0u8; BRAND_LEN];
    let words = registers.iter().flatten();

    for (chunk, word) in buffer.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }

    buffer
}

/// Turn the raw brand buffer into display text.
///
/// The buffer is cut at the first NUL (or used whole if it has none), must
/// be printable UTF-8, and is trimmed of its padding.
pub fn decode_brand(buffer: &[u8; BRAND_LEN]) -> Field<String> {
    let end = buffer.iter().position(|&b| b == 0).unwrap_or(BRAND_LEN);

    let text = match std::str::from_utf8(&buffer[..end]) {
        Ok(text) if !text.chars().any(char::is_control) => text,
        _ => {
            return Field::Unavailable(FieldUnavailable::InvalidText {
                source_name: "cpuid",
            })
        }
    };

    Field::from_text("cpuid", text)
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[allow(unused_unsafe)]
fn read_brand_registers() -> Option<BrandRegisters> {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::__cpuid;
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::__cpuid;

    // SAFETY: CPUID is available on every x86 target Rust supports; leaf
    // 0x8000_0000 reports the highest extended leaf.
    let max_extended = unsafe { __cpuid(0x8000_0000) }.eax;
    if max_extended < BRAND_LEAVES[2] {
        return None;
    }

    let mut registers = [[0u32; 4]; 3];
    for (slot, leaf) in registers.iter_mut().zip(BRAND_LEAVES) {
        let result = unsafe { __cpuid(leaf) };
        *slot = [result.eax, result.ebx, result.ecx, result.edx];
    }

    Some(registers)
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn read_brand_registers() -> Option<BrandRegisters> {
    None
}

fn sysinfo_brand() -> Field<String> {
    let mut sys = System::new();
    sys.refresh_cpu_all();

    match sys.cpus().first() {
        Some(cpu) => Field::from_text("sysinfo", cpu.brand()),
        None => Field::Unavailable(FieldUnavailable::Unsupported),
    }
}
