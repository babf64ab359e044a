//! OS identity adapter
//!
//! - Unix: a single `uname` call gives sysname, release and machine
//! - Windows: kernel numbers from `RtlGetVersion` (resolved at run time
//!   from ntdll.dll) named through [`super::windows_version`], and the
//!   native architecture from `GetNativeSystemInfo`

use serde::Serialize;
use tracing::debug;

use super::{Field, OsSource};
use crate::error::FieldUnavailable;

/// OS family, version and instruction-set architecture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OsIdentity {
    pub name: Field<String>,
    pub version: Field<String>,
    pub architecture: Field<String>,
}

impl OsIdentity {
    /// All three fields unavailable for the same reason
    pub fn unavailable(reason: FieldUnavailable) -> Self {
        Self {
            name: Field::Unavailable(reason.clone()),
            version: Field::Unavailable(reason.clone()),
            architecture: Field::Unavailable(reason),
        }
    }
}

/// OS adapter for the build target
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeOs;

impl OsSource for NativeOs {
    fn os_identity(&self) -> OsIdentity {
        let identity = read_identity();
        debug!(
            name = ?identity.name,
            version = ?identity.version,
            architecture = ?identity.architecture,
            "os identity queried"
        );
        identity
    }
}

/// Decode a fixed-size, NUL-terminated C string field.
///
/// Reading stops at the first NUL or at the end of the slice, whichever
/// comes first.
pub fn c_chars_field(source_name: &'static str, raw: &[u8]) -> Field<String> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    match std::str::from_utf8(&raw[..end]) {
        Ok(text) => Field::from_text(source_name, text),
        Err(_) => Field::Unavailable(FieldUnavailable::InvalidText { source_name }),
    }
}

#[cfg(unix)]
fn read_identity() -> OsIdentity {
    // SAFETY: utsname is plain data and uname fills it in place.
    let mut uts: libc::utsname = unsafe { std::mem::zeroed() };
    if unsafe { libc::uname(&mut uts) } == -1 {
        let err = std::io::Error::last_os_error();
        return OsIdentity::unavailable(FieldUnavailable::query("uname", err.to_string()));
    }

    OsIdentity {
        name: utsname_field(&uts.sysname),
        version: utsname_field(&uts.release),
        architecture: utsname_field(&uts.machine),
    }
}

#[cfg(unix)]
fn utsname_field(raw: &[libc::c_char]) -> Field<String> {
    let bytes: Vec<u8> = raw.iter().map(|&c| c as u8).collect();
    c_chars_field("uname", &bytes)
}

#[cfg(target_os = "windows")]
fn read_identity() -> OsIdentity {
    OsIdentity {
        name: Field::Available("Windows".to_string()),
        version: windows::kernel_version()
            .map(|version| super::windows_version::marketing_name(&version))
            .into(),
        architecture: windows::native_architecture(),
    }
}

#[cfg(not(any(unix, target_os = "windows")))]
fn read_identity() -> OsIdentity {
    OsIdentity::unavailable(FieldUnavailable::Unsupported)
}

#[cfg(target_os = "windows")]
mod windows {
    use windows_sys::Win32::Foundation::FreeLibrary;
    use windows_sys::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryA};
    use windows_sys::Win32::System::SystemInformation::{
        GetNativeSystemInfo, OSVERSIONINFOEXW, SYSTEM_INFO,
    };
    use windows_sys::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_SERVERR2};

    use super::super::windows_version::{architecture_label, KernelVersion, Platform, ProductType};
    use super::Field;
    use crate::error::FieldUnavailable;

    type RtlGetVersionFn = unsafe extern "system" fn(*mut OSVERSIONINFOEXW) -> i32;

    const AMD64: u16 = 9;

    fn native_architecture_code() -> u16 {
        // SAFETY: SYSTEM_INFO is plain data filled by the call.
        unsafe {
            let mut info: SYSTEM_INFO = std::mem::zeroed();
            GetNativeSystemInfo(&mut info);
            info.Anonymous.Anonymous.wProcessorArchitecture
        }
    }

    pub(super) fn native_architecture() -> Field<String> {
        let code = native_architecture_code();
        match architecture_label(code) {
            Some(label) => Field::Available(label.to_string()),
            None => Field::Unavailable(FieldUnavailable::query(
                "GetNativeSystemInfo",
                format!("unknown processor architecture {code}"),
            )),
        }
    }

    /// Kernel version straight from ntdll, which unlike `GetVersionEx` is
    /// not subject to manifest-based version lies.
    pub(super) fn kernel_version() -> Result<KernelVersion, FieldUnavailable> {
        let info = rtl_get_version()?;

        let csd_len = info
            .szCSDVersion
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(info.szCSDVersion.len());
        let service_pack = String::from_utf16_lossy(&info.szCSDVersion[..csd_len]);

        // SAFETY: GetSystemMetrics has no preconditions.
        let server_r2 = unsafe { GetSystemMetrics(SM_SERVERR2) } != 0;

        Ok(KernelVersion {
            major: info.dwMajorVersion,
            minor: info.dwMinorVersion,
            build: info.dwBuildNumber,
            product_type: ProductType::from_raw(info.wProductType),
            platform: Platform::from_raw(info.dwPlatformId),
            server_r2,
            amd64: native_architecture_code() == AMD64,
            service_pack: (!service_pack.trim().is_empty()).then_some(service_pack),
        })
    }

    fn rtl_get_version() -> Result<OSVERSIONINFOEXW, FieldUnavailable> {
        // SAFETY: both names are NUL-terminated; the module handle is
        // released once the entry point has been called.
        unsafe {
            let module = LoadLibraryA(b"ntdll.dll\0".as_ptr());
            if module.is_null() {
                return Err(FieldUnavailable::query(
                    "ntdll.dll",
                    std::io::Error::last_os_error().to_string(),
                ));
            }

            let result = match GetProcAddress(module, b"RtlGetVersion\0".as_ptr()) {
                Some(entry) => {
                    let rtl_get_version: RtlGetVersionFn = std::mem::transmute(entry);
                    let mut info: OSVERSIONINFOEXW = std::mem::zeroed();
                    info.dwOSVersionInfoSize = std::mem::size_of::<OSVERSIONINFOEXW>() as u32;

                    match rtl_get_version(&mut info) {
                        0 => Ok(info),
                        status => Err(FieldUnavailable::query(
                            "RtlGetVersion",
                            format!("NTSTATUS {status:#010x}"),
                        )),
                    }
                }
                None => Err(FieldUnavailable::query(
                    "RtlGetVersion",
                    "entry point not found in ntdll.dll",
                )),
            };

            FreeLibrary(module);
            result
        }
    }
}
