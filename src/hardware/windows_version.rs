//! Windows version naming
//!
//! Maps kernel version numbers to marketing names with an ordered rule
//! table: the first rule whose predicate holds wins. Pure data, so it is
//! compiled and tested on every host.

/// `wProductType` as reported in `OSVERSIONINFOEXW`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductType {
    Workstation,
    DomainController,
    Server,
}

impl ProductType {
    /// Decode `VER_NT_*`; unknown values are treated as a server build
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => ProductType::Workstation,
            2 => ProductType::DomainController,
            _ => ProductType::Server,
        }
    }
}

/// `dwPlatformId`: 9x kernel or NT kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Win32Windows,
    Win32Nt,
}

impl Platform {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Platform::Win32Windows,
            _ => Platform::Win32Nt,
        }
    }
}

/// Everything the naming rules look at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub product_type: ProductType,
    pub platform: Platform,
    /// `GetSystemMetrics(SM_SERVERR2) != 0`
    pub server_r2: bool,
    /// Native architecture is x86_64
    pub amd64: bool,
    /// e.g. "Service Pack 1"
    pub service_pack: Option<String>,
}

impl KernelVersion {
    /// NT kernel, no service pack, no R2 flag
    pub fn new(major: u32, minor: u32, build: u32, product_type: ProductType) -> Self {
        Self {
            major,
            minor,
            build,
            product_type,
            platform: Platform::Win32Nt,
            server_r2: false,
            amd64: false,
            service_pack: None,
        }
    }

    fn is(&self, major: u32, minor: u32) -> bool {
        self.major == major && self.minor == minor
    }

    fn workstation(&self) -> bool {
        self.product_type == ProductType::Workstation
    }
}

struct VersionRule {
    matches: fn(&KernelVersion) -> bool,
    label: &'static str,
}

const RULES: &[VersionRule] = &[
    VersionRule {
        matches: |v| v.is(10, 0) && v.workstation() && v.build >= 22000,
        label: "Microsoft Windows 11",
    },
    VersionRule {
        matches: |v| v.is(10, 0) && v.workstation(),
        label: "Microsoft Windows 10",
    },
    VersionRule {
        matches: |v| v.is(10, 0) && v.build >= 26100,
        label: "Microsoft Windows Server 2025",
    },
    VersionRule {
        matches: |v| v.is(10, 0) && v.build >= 20348,
        label: "Microsoft Windows Server 2022",
    },
    VersionRule {
        matches: |v| v.is(10, 0) && v.build >= 17763,
        label: "Microsoft Windows Server 2019",
    },
    VersionRule {
        matches: |v| v.is(10, 0),
        label: "Microsoft Windows Server 2016",
    },
    VersionRule {
        matches: |v| v.is(6, 3) && v.workstation(),
        label: "Microsoft Windows 8.1",
    },
    VersionRule {
        matches: |v| v.is(6, 3),
        label: "Microsoft Windows Server 2012 R2",
    },
    VersionRule {
        matches: |v| v.is(6, 2) && v.workstation(),
        label: "Microsoft Windows 8",
    },
    VersionRule {
        matches: |v| v.is(6, 2),
        label: "Microsoft Windows Server 2012",
    },
    VersionRule {
        matches: |v| v.is(6, 1) && v.workstation(),
        label: "Microsoft Windows 7",
    },
    VersionRule {
        matches: |v| v.is(6, 1),
        label: "Microsoft Windows Server 2008 R2",
    },
    VersionRule {
        matches: |v| v.is(6, 0) && v.workstation(),
        label: "Microsoft Windows Vista",
    },
    VersionRule {
        matches: |v| v.is(6, 0),
        label: "Microsoft Windows Server 2008",
    },
    VersionRule {
        matches: |v| v.is(5, 2) && v.workstation() && v.amd64,
        label: "Microsoft Windows XP Professional x64 Edition",
    },
    VersionRule {
        matches: |v| v.is(5, 2) && !v.server_r2,
        label: "Microsoft Windows Server 2003",
    },
    VersionRule {
        matches: |v| v.is(5, 2),
        label: "Microsoft Windows Server 2003 R2",
    },
    VersionRule {
        matches: |v| v.is(5, 1),
        label: "Microsoft Windows XP",
    },
    VersionRule {
        matches: |v| v.is(5, 0),
        label: "Microsoft Windows 2000",
    },
    VersionRule {
        matches: |v| v.is(4, 90),
        label: "Microsoft Windows Me",
    },
    VersionRule {
        matches: |v| v.is(4, 10),
        label: "Microsoft Windows 98",
    },
    VersionRule {
        matches: |v| v.is(4, 0) && v.platform == Platform::Win32Nt,
        label: "Microsoft Windows NT 4.0",
    },
    VersionRule {
        matches: |v| v.is(4, 0),
        label: "Microsoft Windows 95",
    },
];

/// Marketing name for a kernel version, with the service pack appended.
///
/// Versions no rule knows about are named by their raw numbers.
pub fn marketing_name(version: &KernelVersion) -> String {
    let base = RULES
        .iter()
        .find(|rule| (rule.matches)(version))
        .map(|rule| rule.label.to_string())
        .unwrap_or_else(|| {
            format!(
                "Microsoft Windows {}.{} (build {})",
                version.major, version.minor, version.build
            )
        });

    match version.service_pack.as_deref().map(str::trim) {
        Some(sp) if !sp.is_empty() => format!("{} {}", base, sp),
        _ => base,
    }
}

/// Architecture label for a `PROCESSOR_ARCHITECTURE_*` code
pub fn architecture_label(code: u16) -> Option<&'static str> {
    match code {
        0 => Some("x86"),
        5 => Some("arm"),
        6 => Some("ia64"),
        9 => Some("x86_64"),
        12 => Some("aarch64"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_10_workstation() {
        let v = KernelVersion::new(10, 0, 19045, ProductType::Workstation);
        assert!(marketing_name(&v).contains("Windows 10"));
    }

    #[test]
    fn test_windows_7_workstation() {
        let v = KernelVersion::new(6, 1, 7601, ProductType::Workstation);
        assert!(marketing_name(&v).contains("Windows 7"));
    }

    #[test]
    fn test_windows_11_by_build() {
        let v = KernelVersion::new(10, 0, 22631, ProductType::Workstation);
        assert_eq!(marketing_name(&v), "Microsoft Windows 11");
    }

    #[test]
    fn test_server_builds() {
        let cases = [
            (14393, "Microsoft Windows Server 2016"),
            (17763, "Microsoft Windows Server 2019"),
            (20348, "Microsoft Windows Server 2022"),
            (26100, "Microsoft Windows Server 2025"),
        ];
        for (build, expected) in cases {
            let v = KernelVersion::new(10, 0, build, ProductType::Server);
            assert_eq!(marketing_name(&v), expected, "build {}", build);
        }

        let dc = KernelVersion::new(6, 1, 7601, ProductType::DomainController);
        assert_eq!(marketing_name(&dc), "Microsoft Windows Server 2008 R2");
    }

    #[test]
    fn test_service_pack_suffix() {
        let mut v = KernelVersion::new(6, 1, 7601, ProductType::Workstation);
        v.service_pack = Some("Service Pack 1".to_string());
        assert_eq!(marketing_name(&v), "Microsoft Windows 7 Service Pack 1");

        v.service_pack = Some("  ".to_string());
        assert_eq!(marketing_name(&v), "Microsoft Windows 7");
    }

    #[test]
    fn test_server_2003_variants() {
        let mut v = KernelVersion::new(5, 2, 3790, ProductType::Workstation);
        v.amd64 = true;
        assert_eq!(
            marketing_name(&v),
            "Microsoft Windows XP Professional x64 Edition"
        );

        let mut v = KernelVersion::new(5, 2, 3790, ProductType::Server);
        assert_eq!(marketing_name(&v), "Microsoft Windows Server 2003");
        v.server_r2 = true;
        assert_eq!(marketing_name(&v), "Microsoft Windows Server 2003 R2");
    }

    #[test]
    fn test_9x_platform() {
        let mut v = KernelVersion::new(4, 0, 950, ProductType::Workstation);
        assert_eq!(marketing_name(&v), "Microsoft Windows NT 4.0");
        v.platform = Platform::Win32Windows;
        assert_eq!(marketing_name(&v), "Microsoft Windows 95");
    }

    #[test]
    fn test_unknown_version_falls_back_to_numbers() {
        let v = KernelVersion::new(11, 2, 30000, ProductType::Workstation);
        assert_eq!(
            marketing_name(&v),
            "Microsoft Windows 11.2 (build 30000)"
        );
    }

    #[test]
    fn test_architecture_labels() {
        assert_eq!(architecture_label(9), Some("x86_64"));
        assert_eq!(architecture_label(12), Some("aarch64"));
        assert_eq!(architecture_label(0), Some("x86"));
        assert_eq!(architecture_label(0xffff), None);
    }
}
