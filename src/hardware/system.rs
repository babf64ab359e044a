//! Snapshot aggregator

use serde::Serialize;
use tracing::{debug, info};

use super::cpu::NativeCpu;
use super::gpu::GlContext;
use super::os::NativeOs;
use super::ram::NativeMemory;
use super::{CpuSource, Field, GraphicsSource, MemorySource, OsSource};
use crate::error::FieldUnavailable;

/// Fields of a [`Snapshot`], in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotField {
    CpuModel,
    OsArchitecture,
    GpuVendor,
    GpuRenderer,
    OsName,
    OsVersion,
    GpuDriverVersion,
    TotalMemory,
    AvailableMemory,
}

impl SnapshotField {
    pub const ALL: [SnapshotField; 9] = [
        SnapshotField::CpuModel,
        SnapshotField::OsArchitecture,
        SnapshotField::GpuVendor,
        SnapshotField::GpuRenderer,
        SnapshotField::OsName,
        SnapshotField::OsVersion,
        SnapshotField::GpuDriverVersion,
        SnapshotField::TotalMemory,
        SnapshotField::AvailableMemory,
    ];

    /// Report label
    pub fn label(self) -> &'static str {
        match self {
            SnapshotField::CpuModel => "CPU Model",
            SnapshotField::OsArchitecture => "CPU Arch",
            SnapshotField::GpuVendor => "GPU Vendor",
            SnapshotField::GpuRenderer => "GPU Renderer",
            SnapshotField::OsName => "OS Name",
            SnapshotField::OsVersion => "OS Version",
            SnapshotField::GpuDriverVersion => "GPU Driver",
            SnapshotField::TotalMemory => "Total Memory",
            SnapshotField::AvailableMemory => "Avail Memory",
        }
    }
}

/// Everything probed in one capture.
///
/// Built once by [`Probe::capture`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    total_memory_mib: Field<u64>,
    available_memory_mib: Field<u64>,
    cpu_model: Field<String>,
    os_name: Field<String>,
    os_version: Field<String>,
    os_architecture: Field<String>,
    gpu_vendor: Field<String>,
    gpu_renderer: Field<String>,
    gpu_driver_version: Field<String>,
}

/// A field's value prepared for display, or the reason it is missing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Mebibytes(u64),
    Unavailable(&'a FieldUnavailable),
}

impl Snapshot {
    pub fn total_memory_mib(&self) -> &Field<u64> {
        &self.total_memory_mib
    }

    pub fn available_memory_mib(&self) -> &Field<u64> {
        &self.available_memory_mib
    }

    pub fn cpu_model(&self) -> &Field<String> {
        &self.cpu_model
    }

    pub fn os_name(&self) -> &Field<String> {
        &self.os_name
    }

    pub fn os_version(&self) -> &Field<String> {
        &self.os_version
    }

    pub fn os_architecture(&self) -> &Field<String> {
        &self.os_architecture
    }

    pub fn gpu_vendor(&self) -> &Field<String> {
        &self.gpu_vendor
    }

    pub fn gpu_renderer(&self) -> &Field<String> {
        &self.gpu_renderer
    }

    pub fn gpu_driver_version(&self) -> &Field<String> {
        &self.gpu_driver_version
    }

    /// Look a field up by name
    pub fn get(&self, field: SnapshotField) -> FieldValue<'_> {
        match field {
            SnapshotField::CpuModel => text_value(&self.cpu_model),
            SnapshotField::OsArchitecture => text_value(&self.os_architecture),
            SnapshotField::GpuVendor => text_value(&self.gpu_vendor),
            SnapshotField::GpuRenderer => text_value(&self.gpu_renderer),
            SnapshotField::OsName => text_value(&self.os_name),
            SnapshotField::OsVersion => text_value(&self.os_version),
            SnapshotField::GpuDriverVersion => text_value(&self.gpu_driver_version),
            SnapshotField::TotalMemory => mib_value(&self.total_memory_mib),
            SnapshotField::AvailableMemory => mib_value(&self.available_memory_mib),
        }
    }

    pub fn is_available(&self, field: SnapshotField) -> bool {
        !matches!(self.get(field), FieldValue::Unavailable(_))
    }

    /// Which fields were read and which were not
    pub fn availability(&self) -> Availability {
        let unavailable: Vec<SnapshotField> = SnapshotField::ALL
            .into_iter()
            .filter(|field| !self.is_available(*field))
            .collect();

        Availability {
            available_count: SnapshotField::ALL.len() - unavailable.len(),
            unavailable_fields: unavailable,
        }
    }
}

fn text_value(field: &Field<String>) -> FieldValue<'_> {
    match field {
        Field::Available(value) => FieldValue::Text(value),
        Field::Unavailable(reason) => FieldValue::Unavailable(reason),
    }
}

fn mib_value(field: &Field<u64>) -> FieldValue<'_> {
    match field {
        Field::Available(value) => FieldValue::Mebibytes(*value),
        Field::Unavailable(reason) => FieldValue::Unavailable(reason),
    }
}

/// Summary of a snapshot's per-field outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub available_count: usize,
    pub unavailable_fields: Vec<SnapshotField>,
}

/// The set of sources a snapshot is captured from
pub struct Probe {
    memory: Box<dyn MemorySource>,
    cpu: Box<dyn CpuSource>,
    os: Box<dyn OsSource>,
    graphics: Box<dyn GraphicsSource>,
}

impl Probe {
    pub fn new(
        memory: impl MemorySource + 'static,
        cpu: impl CpuSource + 'static,
        os: impl OsSource + 'static,
        graphics: impl GraphicsSource + 'static,
    ) -> Self {
        Self {
            memory: Box::new(memory),
            cpu: Box::new(cpu),
            os: Box::new(os),
            graphics: Box::new(graphics),
        }
    }

    /// Native sources for the build target.
    ///
    /// No rendering context is attached; use [`Probe::with_graphics`] to
    /// read graphics strings from one.
    pub fn native() -> Self {
        Self::new(NativeMemory, NativeCpu, NativeOs, GlContext::none())
    }

    /// Swap in a different graphics source
    pub fn with_graphics(mut self, graphics: impl GraphicsSource + 'static) -> Self {
        self.graphics = Box::new(graphics);
        self
    }

    /// Query every source once and assemble the results.
    ///
    /// Never fails: a source that cannot be read leaves its fields
    /// unavailable and the rest of the capture goes on.
    pub fn capture(&self) -> Snapshot {
        let memory = self.memory.memory();
        let cpu_model = self.cpu.cpu_model();
        let os = self.os.os_identity();
        let graphics = self.graphics.graphics();

        let snapshot = Snapshot {
            total_memory_mib: memory.total_mib,
            available_memory_mib: memory.available_mib,
            cpu_model,
            os_name: os.name,
            os_version: os.version,
            os_architecture: os.architecture,
            gpu_vendor: graphics.vendor,
            gpu_renderer: graphics.renderer,
            gpu_driver_version: graphics.driver_version,
        };

        for field in SnapshotField::ALL {
            if let FieldValue::Unavailable(reason) = snapshot.get(field) {
                debug!(field = field.label(), reason = %reason, "field unavailable");
            }
        }

        let availability = snapshot.availability();
        info!(
            available = availability.available_count,
            unavailable = availability.unavailable_fields.len(),
            "snapshot captured"
        );

        snapshot
    }
}

impl Default for Probe {
    fn default() -> Self {
        Self::native()
    }
}

/// Capture a snapshot from the native sources
pub fn capture_snapshot() -> Snapshot {
    Probe::native().capture()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::hardware::gpu::GraphicsIdentity;
    use crate::hardware::os::OsIdentity;
    use crate::hardware::ram::MemoryReading;

    struct FixedMemory(u64, u64);

    impl MemorySource for FixedMemory {
        fn memory(&self) -> MemoryReading {
            MemoryReading {
                total_mib: Field::Available(self.0),
                available_mib: Field::Available(self.1),
            }
        }
    }

    struct FixedCpu(&'static str);

    impl CpuSource for FixedCpu {
        fn cpu_model(&self) -> Field<String> {
            Field::from_text("test", self.0)
        }
    }

    struct FixedOs;

    impl OsSource for FixedOs {
        fn os_identity(&self) -> OsIdentity {
            OsIdentity {
                name: Field::Available("Linux".to_string()),
                version: Field::Available("6.8.0".to_string()),
                architecture: Field::Available("x86_64".to_string()),
            }
        }
    }

    struct MissingOs;

    impl OsSource for MissingOs {
        fn os_identity(&self) -> OsIdentity {
            OsIdentity::unavailable(FieldUnavailable::Unsupported)
        }
    }

    struct FixedGraphics;

    impl GraphicsSource for FixedGraphics {
        fn graphics(&self) -> GraphicsIdentity {
            GraphicsIdentity {
                vendor: Field::Available("Acme".to_string()),
                renderer: Field::Available("Acme RX 9000".to_string()),
                driver_version: Field::Available("4.6.0".to_string()),
            }
        }
    }

    /// Counts how often it is queried
    struct CountingCpu(Rc<Cell<u32>>);

    impl CpuSource for CountingCpu {
        fn cpu_model(&self) -> Field<String> {
            self.0.set(self.0.get() + 1);
            Field::Available("Counted".to_string())
        }
    }

    fn full_probe() -> Probe {
        Probe::new(
            FixedMemory(16384, 8192),
            FixedCpu("   Example CPU X9"),
            FixedOs,
            FixedGraphics,
        )
    }

    #[test]
    fn test_capture_collects_every_source() {
        let snapshot = full_probe().capture();

        assert_eq!(snapshot.total_memory_mib(), &Field::Available(16384));
        assert_eq!(snapshot.available_memory_mib(), &Field::Available(8192));
        assert_eq!(
            snapshot.cpu_model(),
            &Field::Available("Example CPU X9".to_string())
        );
        assert_eq!(snapshot.os_name(), &Field::Available("Linux".to_string()));
        assert_eq!(
            snapshot.gpu_renderer(),
            &Field::Available("Acme RX 9000".to_string())
        );
        assert_eq!(snapshot.availability().available_count, 9);
        assert!(snapshot.availability().unavailable_fields.is_empty());
    }

    #[test]
    fn test_failure_is_per_field() {
        let snapshot = Probe::new(
            FixedMemory(4096, 1024),
            FixedCpu(""),
            MissingOs,
            GlContext::none(),
        )
        .capture();

        let availability = snapshot.availability();
        assert_eq!(availability.available_count, 2);
        assert_eq!(
            availability.unavailable_fields,
            vec![
                SnapshotField::CpuModel,
                SnapshotField::OsArchitecture,
                SnapshotField::GpuVendor,
                SnapshotField::GpuRenderer,
                SnapshotField::OsName,
                SnapshotField::OsVersion,
                SnapshotField::GpuDriverVersion,
            ]
        );
        assert_eq!(
            snapshot.gpu_vendor().reason(),
            Some(&FieldUnavailable::NoRenderContext)
        );
        assert_eq!(snapshot.os_version().reason(), Some(&FieldUnavailable::Unsupported));
    }

    #[test]
    fn test_unavailable_is_never_empty_text() {
        let snapshot = Probe::new(FixedMemory(1, 1), FixedCpu("  "), MissingOs, GlContext::none())
            .capture();

        for field in SnapshotField::ALL {
            if let FieldValue::Text(text) = snapshot.get(field) {
                assert!(!text.is_empty(), "{:?} held empty text", field);
            }
        }
        assert!(!snapshot.is_available(SnapshotField::CpuModel));
    }

    #[test]
    fn test_each_source_queried_once() {
        let calls = Rc::new(Cell::new(0));
        let probe = Probe::new(
            FixedMemory(1, 1),
            CountingCpu(Rc::clone(&calls)),
            FixedOs,
            FixedGraphics,
        );

        probe.capture();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_with_graphics_replaces_source() {
        let snapshot = Probe::new(FixedMemory(1, 1), FixedCpu("x"), FixedOs, GlContext::none())
            .with_graphics(FixedGraphics)
            .capture();
        assert!(snapshot.gpu_vendor().is_available());
    }

    #[test]
    fn test_snapshot_json_uses_null_for_unavailable() {
        let snapshot = Probe::new(FixedMemory(2048, 512), FixedCpu("CPU"), FixedOs, GlContext::none())
            .capture();
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["total_memory_mib"], 2048);
        assert_eq!(json["cpu_model"], "CPU");
        assert!(json["gpu_vendor"].is_null());
        assert_eq!(json.as_object().unwrap().len(), 9);
    }

    #[test]
    fn test_total_memory_stable_across_captures() {
        let first = capture_snapshot();
        let second = capture_snapshot();
        assert_eq!(first.total_memory_mib(), second.total_memory_mib());
        assert_eq!(first.cpu_model(), second.cpu_model());
        assert_eq!(first.os_name(), second.os_name());
    }
}
