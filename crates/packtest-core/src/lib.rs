mod diff;
mod fingerprint;
mod scan;

pub use diff::{diff_manifests, FsDiff};
pub use fingerprint::{sha256_hex, Fingerprint};
pub use scan::{normalize_path_for_display, scan_tree, Manifest};
