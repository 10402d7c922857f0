use std::path::Path;

/// Paths that must NEVER be deleted under any circumstances.
/// Deletion targets are single files, so these only matter if a scan
/// somehow reports one of them, but the executor checks every target.
const PROTECTED_PATHS: &[&str] = &[
    "/",
    "/System",
    "/Applications",
    "/Users",
    "/Library",
    "/home",
    "/root",
    "/usr",
    "/bin",
    "/sbin",
    "/boot",
    "/var",
    "/etc",
    "/opt",
    "/private",
    "/Volumes",
];

/// Prefixes whose contents are never deleted, even as single files
const PROTECTED_PREFIXES: &[&str] = &[
    "/System/",
    "/usr/bin/",
    "/usr/sbin/",
    "/usr/lib/",
    "/bin/",
    "/sbin/",
    "/boot/",
    "/etc/",
];

/// Paths under home that must never be deleted entirely
const PROTECTED_HOME_ENTRIES: &[&str] = &[
    "", // home dir itself
    ".ssh",
    ".gnupg",
    ".bashrc",
    ".zshrc",
    ".profile",
];

/// Pseudo-filesystems and runtime trees a deep scan never descends into
pub const DEFAULT_DEEP_EXCLUDES: &[&str] = &[
    "/proc",
    "/sys",
    "/dev",
    "/run",
    "/snap",
    "/System/Volumes",
    "/private/var/vm",
];

/// Check if a path is protected and should NEVER be deleted
pub fn is_protected(path: &Path) -> bool {
    let path_str = path.to_string_lossy();

    if PROTECTED_PATHS.iter().any(|p| path_str == *p) {
        return true;
    }
    if PROTECTED_PREFIXES.iter().any(|p| path_str.starts_with(p)) {
        return true;
    }

    if let Some(home) = dirs::home_dir() {
        for entry in PROTECTED_HOME_ENTRIES {
            let protected = if entry.is_empty() {
                home.clone()
            } else {
                home.join(entry)
            };
            if path == protected {
                return true;
            }
        }
        // Keys and credentials are protected file by file as well
        if path.starts_with(home.join(".ssh")) || path.starts_with(home.join(".gnupg")) {
            return true;
        }
    }

    false
}
