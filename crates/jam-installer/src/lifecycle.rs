use std::fs;

use jam_core::{is_valid_version, AppId, JamError, Manifest, ReleaseSource, Result};
use log::{debug, info, warn};

use crate::extract::{extract_zip, strip_wrapper_dir};
use crate::fs_utils::remove_dir_if_exists;
use crate::index::{ApplicationIndex, IndexEntry, IndexStore};
use crate::shell::{register_shell_contributions, unregister_shell_contributions};
use crate::{
    ApplicationsLayout, CleanupPolicy, LifecycleOptions, OperationReport, Outcome,
};

/// How an install request relates to what the index already records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallPlan {
    Skip { entry: IndexEntry },
    Install,
    Update { previous: IndexEntry },
}

pub fn plan_install(index: &ApplicationIndex, short_id: &str, target_version: &str) -> InstallPlan {
    match index.get(short_id) {
        Some(entry) if entry.version == target_version => InstallPlan::Skip {
            entry: entry.clone(),
        },
        Some(entry) => InstallPlan::Update {
            previous: entry.clone(),
        },
        None => InstallPlan::Install,
    }
}

/// Drives install, update and remove for one applications root against one
/// release source. Operations are sequential; each one loads the index,
/// mutates it and saves it before returning.
pub struct Lifecycle<'a, S: ReleaseSource + ?Sized> {
    layout: &'a ApplicationsLayout,
    source: &'a S,
    store: IndexStore,
    options: LifecycleOptions,
}

impl<'a, S: ReleaseSource + ?Sized> Lifecycle<'a, S> {
    pub fn new(layout: &'a ApplicationsLayout, source: &'a S) -> Self {
        Self {
            layout,
            source,
            store: IndexStore::new(layout.index_path()),
            options: LifecycleOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LifecycleOptions) -> Self {
        self.options = options;
        self
    }

    pub fn layout(&self) -> &ApplicationsLayout {
        self.layout
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Installs `app` at its requested version, or at the latest release when
    /// none is given. The latest release is always resolved so that a pinned
    /// older version is reported through `OperationReport::stale_latest`.
    pub fn install(&self, app: &AppId) -> Result<OperationReport> {
        let short_id = app.short_id();
        debug!("{app}: requested");

        let latest = self.source.latest_release(app.owner(), app.package())?;
        if !is_valid_version(&latest) {
            return Err(JamError::RepositoryQueryFailed {
                message: format!("latest release of {short_id} has an unusable name '{latest}'"),
            });
        }
        let version = app.version().unwrap_or(&latest).to_string();
        debug!("{short_id}: resolved version {version} (latest {latest})");

        let index = self.store.load()?;
        let plan = plan_install(&index, &short_id, &version);

        let mut report = OperationReport::new(&short_id, Outcome::Skipped);
        report.version = Some(version.clone());
        report.latest_version = Some(latest);

        let previous = match plan {
            InstallPlan::Skip { entry } => {
                info!("{short_id}@{version} is already installed");
                report.kind = Some(entry.kind);
                report.package_dir =
                    Some(self.layout.package_dir(entry.kind, &short_id, &entry.version));
                return Ok(report);
            }
            InstallPlan::Install => None,
            InstallPlan::Update { previous } => Some(previous),
        };

        let manifest = self
            .source
            .fetch_manifest(app.owner(), app.package(), &version)?;
        let kind = manifest.kind();
        debug!("{short_id}: fetched manifest ({})", kind.as_str());

        let archive = self
            .source
            .fetch_archive(app.owner(), app.package(), &version)?;
        debug!("{short_id}: fetched archive ({} bytes)", archive.len());

        self.layout.ensure_base_dirs()?;
        let package_dir = self.layout.package_dir(kind, &short_id, &version);
        fs::create_dir_all(&package_dir).map_err(|source| JamError::ExtractionIo {
            path: package_dir.clone(),
            source,
        })?;
        extract_zip(&archive, &package_dir, strip_wrapper_dir)?;
        let sidecar = self.layout.version_sidecar_path(kind, &short_id, &version);
        fs::write(&sidecar, &version).map_err(|source| JamError::ExtractionIo {
            path: sidecar.clone(),
            source,
        })?;
        debug!("{short_id}: extracted into {}", package_dir.display());

        if let Manifest::Cli(cli) = &manifest {
            register_shell_contributions(
                self.layout,
                &package_dir.join(&cli.shell_contributions_file),
            )?;
        }

        let mut index = self.store.load()?;
        index.insert(
            short_id.clone(),
            IndexEntry {
                kind,
                version: version.clone(),
            },
        );
        self.store.save(&index)?;
        debug!("{short_id}: index updated");

        report.kind = Some(kind);
        report.package_dir = Some(package_dir.clone());
        match previous {
            None => {
                report.outcome = Outcome::Installed;
                info!("installed {short_id}@{version}");
            }
            Some(previous) => {
                report.outcome = Outcome::Updated;
                info!("updated {short_id} {} -> {version}", previous.version);
                let previous_dir =
                    self.layout
                        .package_dir(previous.kind, &short_id, &previous.version);
                if previous_dir != package_dir {
                    unregister_shell_contributions(self.layout, &previous_dir)?;
                }
                if self.options.cleanup == CleanupPolicy::RemovePrevious
                    && previous_dir != package_dir
                    && remove_dir_if_exists(&previous_dir)?
                {
                    debug!("{short_id}: pruned {}", previous_dir.display());
                    report.pruned_dir = Some(previous_dir);
                }
                report.previous_version = Some(previous.version);
            }
        }
        Ok(report)
    }

    /// Removes whatever version of `app` is installed. A version in the
    /// identifier is ignored.
    pub fn remove(&self, app: &AppId) -> Result<OperationReport> {
        let short_id = app.short_id();
        debug!("{app}: requested removal");

        let mut index = self.store.load()?;
        let Some(entry) = index.remove(&short_id) else {
            info!("{short_id} is not installed");
            return Ok(OperationReport::new(short_id, Outcome::Skipped));
        };
        self.store.save(&index)?;
        debug!("{short_id}: index updated");

        let package_dir = self.layout.package_dir(entry.kind, &short_id, &entry.version);
        unregister_shell_contributions(self.layout, &package_dir)?;
        if !remove_dir_if_exists(&package_dir)? {
            warn!(
                "{short_id}: package directory {} was already missing",
                package_dir.display()
            );
        }
        info!("removed {short_id}@{}", entry.version);

        let mut report = OperationReport::new(short_id, Outcome::Removed);
        report.kind = Some(entry.kind);
        report.version = Some(entry.version);
        report.package_dir = Some(package_dir);
        Ok(report)
    }

    /// Moves an installed application to its latest release. Applications
    /// that are not installed are skipped.
    pub fn upgrade(&self, app: &AppId) -> Result<OperationReport> {
        let short_id = app.short_id();
        if self.store.load()?.get(&short_id).is_none() {
            info!("{short_id} is not installed; nothing to upgrade");
            return Ok(OperationReport::new(short_id, Outcome::Skipped));
        }
        self.install(&app.without_version())
    }

    /// Every installed application, for an upgrade with no explicit targets.
    pub fn upgrade_targets(&self) -> Result<Vec<AppId>> {
        self.store
            .load()?
            .short_ids()
            .map(AppId::parse)
            .collect()
    }
}
