mod install;
mod layout;
mod receipts;
mod uninstall;

pub use install::{current_unix_timestamp, install_package, installed_receipt};
pub use layout::{default_user_prefix, PrefixLayout};
pub use receipts::{
    read_install_receipts, write_install_receipt, InstallReason, InstallReceipt,
    InstalledDependency,
};
pub use uninstall::{uninstall_package, UninstallResult, UninstallStatus};
