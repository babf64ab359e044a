//! Hardware and OS probing
//!
//! Each data domain (memory, CPU identity, OS identity, graphics identity)
//! sits behind a small source trait. The native implementation for the
//! build target is picked with `cfg`; callers only see the traits and the
//! [`Snapshot`] the [`Probe`] assembles from them.

pub mod cpu;
pub mod gpu;
pub mod os;
pub mod ram;
mod system;
pub mod windows_version;

use serde::{Serialize, Serializer};

use crate::error::FieldUnavailable;

pub use cpu::NativeCpu;
pub use gpu::{GlContext, GraphicsIdentity};
pub use os::{NativeOs, OsIdentity};
pub use ram::{MemoryReading, NativeMemory};
pub use system::{capture_snapshot, Availability, FieldValue, Probe, Snapshot, SnapshotField};

/// A single probed value, or the reason it could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Available(T),
    Unavailable(FieldUnavailable),
}

impl<T> Field<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Field::Available(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Available(value) => Some(value),
            Field::Unavailable(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&FieldUnavailable> {
        match self {
            Field::Available(_) => None,
            Field::Unavailable(reason) => Some(reason),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Field<U> {
        match self {
            Field::Available(value) => Field::Available(f(value)),
            Field::Unavailable(reason) => Field::Unavailable(reason),
        }
    }
}

impl Field<String> {
    /// Build a text field from raw source output.
    ///
    /// Surrounding whitespace is dropped; nothing left means the source gave
    /// us no usable value, which is reported as unavailable rather than `""`.
    pub fn from_text(source_name: &'static str, raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Field::Unavailable(FieldUnavailable::Empty { source_name })
        } else {
            Field::Available(trimmed.to_string())
        }
    }
}

impl<T> From<Result<T, FieldUnavailable>> for Field<T> {
    fn from(result: Result<T, FieldUnavailable>) -> Self {
        match result {
            Ok(value) => Field::Available(value),
            Err(reason) => Field::Unavailable(reason),
        }
    }
}

/// Unavailable fields serialize as `null`
impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Available(value) => serializer.serialize_some(value),
            Field::Unavailable(_) => serializer.serialize_none(),
        }
    }
}

/// Physical memory figures, in MiB
pub trait MemorySource {
    fn memory(&self) -> MemoryReading;
}

/// Display-ready CPU brand string
pub trait CpuSource {
    fn cpu_model(&self) -> Field<String>;
}

/// OS family, version and instruction-set architecture
pub trait OsSource {
    fn os_identity(&self) -> OsIdentity;
}

/// Vendor, renderer and driver strings of the active rendering context
pub trait GraphicsSource {
    fn graphics(&self) -> GraphicsIdentity;
}
