use crate::error::Result;
use crate::manifest::Manifest;

/// The remote side of the lifecycle: anything that can name the latest
/// release of a repository, serve its manifest at a ref, and hand out the
/// packaged archive for a version.
pub trait ReleaseSource {
    fn latest_release(&self, owner: &str, package: &str) -> Result<String>;

    fn fetch_manifest(&self, owner: &str, package: &str, version: &str) -> Result<Manifest>;

    fn fetch_archive(&self, owner: &str, package: &str, version: &str) -> Result<Vec<u8>>;
}
