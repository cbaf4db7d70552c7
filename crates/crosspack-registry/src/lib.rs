mod registry_index;
mod renames;
mod taps;

pub use registry_index::RegistryIndex;
pub use renames::{read_renames, resolve_renamed_name, write_renames, RENAMES_FILE_NAME};
pub use taps::{PackageRef, TapName, TapStore};
