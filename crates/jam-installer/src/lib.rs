mod extract;
mod fs_utils;
mod index;
mod inspect;
mod layout;
mod lifecycle;
mod shell;
mod summary;
mod types;

pub use extract::{extract_zip, strip_wrapper_dir};
pub use fs_utils::{remove_dir_if_exists, remove_file_if_exists};
pub use index::{ApplicationIndex, IndexEntry, IndexStore};
pub use inspect::{check_installation, read_local_manifest, HealthIssue};
pub use layout::{ApplicationsLayout, DEFAULT_APPLICATIONS_ROOT, DEFAULT_SHELL_ALIAS_FILE};
pub use lifecycle::{plan_install, InstallPlan, Lifecycle};
pub use shell::{
    drop_include_lines_under, ensure_include_line, include_line, register_shell_contributions,
    unregister_shell_contributions,
};
pub use summary::{format_elapsed, run_batch, BatchRun, BatchSummary};
pub use types::{CleanupPolicy, FailurePolicy, LifecycleOptions, OperationReport, Outcome};
