pub mod env_vars;
mod manifest;

pub use manifest::{PackageManifest, PackageOption};
