//! Publisher - incremental sync of the build cache and static assets
//!
//! A destination file is rewritten only when the source is newer than it.
//! Every write goes to `<dest>.tmp` first and is renamed into place, so a
//! reader of the publish directory never sees a half-written file.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{BuildError, Result};

/// Outcome of one directory sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub written: usize,
    pub skipped: usize,
}

impl std::ops::AddAssign for SyncStats {
    fn add_assign(&mut self, other: Self) {
        self.written += other.written;
        self.skipped += other.skipped;
    }
}

/// Moves a finished build into the publish directory
pub struct Publisher {
    cache_dir: PathBuf,
    static_dir: PathBuf,
    publish_dir: PathBuf,
    clean_build: bool,
}

impl Publisher {
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        static_dir: impl Into<PathBuf>,
        publish_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            static_dir: static_dir.into(),
            publish_dir: publish_dir.into(),
            clean_build: false,
        }
    }

    /// Wipe the publish directory before syncing
    pub fn clean_build(mut self, clean: bool) -> Self {
        self.clean_build = clean;
        self
    }

    /// Sync rendered pages, drop the cache, then sync static assets
    pub fn publish(&self) -> Result<SyncStats> {
        if self.clean_build {
            tracing::info!("Cleaning publish directory {:?}", self.publish_dir);
            match fs::remove_dir_all(&self.publish_dir) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!("Publish directory {:?} does not exist yet", self.publish_dir);
                }
                Err(e) => tracing::warn!("Could not remove {:?}: {}", self.publish_dir, e),
            }
        }

        let mut stats = sync_dir(&self.cache_dir, &self.publish_dir)?;

        fs::remove_dir_all(&self.cache_dir).map_err(|e| BuildError::publish(&self.cache_dir, e))?;
        tracing::debug!("Removed build cache {:?}", self.cache_dir);

        if self.static_dir.is_dir() {
            stats += sync_dir(&self.static_dir, &self.publish_dir)?;
        } else {
            tracing::info!("No static directory at {:?}, skipping", self.static_dir);
        }

        tracing::info!(
            "Published {} files ({} unchanged)",
            stats.written,
            stats.skipped
        );
        Ok(stats)
    }
}

/// Mirror `src` into `dst`, copying only files newer than their destination
pub fn sync_dir(src: &Path, dst: &Path) -> Result<SyncStats> {
    let mut stats = SyncStats::default();

    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            BuildError::publish(path, e.into())
        })?;
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(rel);
        let meta = entry
            .metadata()
            .map_err(|e| BuildError::publish(entry.path(), e.into()))?;

        if meta.is_dir() {
            fs::create_dir_all(&target).map_err(|e| BuildError::publish(&target, e))?;
            fs::set_permissions(&target, meta.permissions())
                .map_err(|e| BuildError::publish(&target, e))?;
            continue;
        }

        if is_up_to_date(&meta, &target) {
            stats.skipped += 1;
            continue;
        }

        copy_atomic(entry.path(), &target, meta.permissions())?;
        tracing::debug!("Synced {:?}", target);
        stats.written += 1;
    }

    Ok(stats)
}

/// Destination exists and is at least as new as the source
fn is_up_to_date(src_meta: &fs::Metadata, target: &Path) -> bool {
    let Ok(dst_meta) = fs::metadata(target) else {
        return false;
    };
    match (src_meta.modified(), dst_meta.modified()) {
        (Ok(src), Ok(dst)) => dst >= src,
        _ => false,
    }
}

fn copy_atomic(src: &Path, dst: &Path, permissions: fs::Permissions) -> Result<()> {
    let tmp = TempFile::new(tmp_path(dst));

    fs::copy(src, tmp.path()).map_err(|e| BuildError::publish(dst, e))?;
    fs::set_permissions(tmp.path(), permissions).map_err(|e| BuildError::publish(dst, e))?;
    fs::rename(tmp.path(), dst).map_err(|e| BuildError::publish(dst, e))?;

    tmp.persist();
    Ok(())
}

/// Write `contents` to `dst` through a sibling temp file
pub fn write_atomic(dst: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::publish(parent, e))?;
    }
    let tmp = TempFile::new(tmp_path(dst));
    fs::write(tmp.path(), contents).map_err(|e| BuildError::publish(dst, e))?;
    fs::rename(tmp.path(), dst).map_err(|e| BuildError::publish(dst, e))?;
    tmp.persist();
    Ok(())
}

fn tmp_path(dst: &Path) -> PathBuf {
    let mut name = OsString::from(dst.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Removes the temp file on drop unless it was renamed into place
struct TempFile {
    path: PathBuf,
    armed: bool,
}

impl TempFile {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn persist(mut self) {
        self.armed = false;
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.armed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, body: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        path
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn test_sync_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write(&src, "index.html", "home");
        write(&src, "writing/a/index.html", "a");
        write(&src, "writing/b/index.html", "b");

        let first = sync_dir(&src, &dst).unwrap();
        assert_eq!(first, SyncStats { written: 3, skipped: 0 });
        assert_eq!(fs::read_to_string(dst.join("writing/a/index.html")).unwrap(), "a");

        let second = sync_dir(&src, &dst).unwrap();
        assert_eq!(second, SyncStats { written: 0, skipped: 3 });
    }

    #[test]
    fn test_sync_rewrites_only_newer_sources() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write(&src, "a.css", "a");
        let b = write(&src, "b.css", "b");
        sync_dir(&src, &dst).unwrap();

        fs::write(&b, "b2").unwrap();
        set_mtime(&b, SystemTime::now() + Duration::from_secs(60));

        let stats = sync_dir(&src, &dst).unwrap();
        assert_eq!(stats, SyncStats { written: 1, skipped: 1 });
        assert_eq!(fs::read_to_string(dst.join("b.css")).unwrap(), "b2");
    }

    #[test]
    fn test_stale_source_does_not_overwrite() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        let a = write(&src, "a.txt", "old");
        write(&dst, "a.txt", "newer");
        set_mtime(&a, SystemTime::now() - Duration::from_secs(3600));

        let stats = sync_dir(&src, &dst).unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "newer");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write(&src, "x/y.txt", "y");
        sync_dir(&src, &dst).unwrap();
        write_atomic(&dst.join("rss.xml"), b"<rss/>").unwrap();

        let leftovers: Vec<_> = WalkDir::new(&dst)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
        assert_eq!(fs::read_to_string(dst.join("rss.xml")).unwrap(), "<rss/>");
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_are_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        let script = write(&src, "run.sh", "#!/bin/sh\n");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o750)).unwrap();

        sync_dir(&src, &dst).unwrap();
        let mode = fs::metadata(dst.join("run.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }

    #[test]
    fn test_publish_pipeline() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("build");
        let static_dir = tmp.path().join("static");
        let public = tmp.path().join("public");
        write(&cache, "index.html", "home");
        write(&static_dir, "css/site.css", "body{}");
        write(&public, "stale.html", "old");

        let stats = Publisher::new(&cache, &static_dir, &public).publish().unwrap();
        assert_eq!(stats.written, 2);
        assert!(!cache.exists());
        assert!(public.join("css/site.css").exists());
        assert!(public.join("stale.html").exists());
    }

    #[test]
    fn test_clean_build_and_missing_static_dir() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("build");
        let public = tmp.path().join("public");
        write(&cache, "index.html", "home");
        write(&public, "stale.html", "old");

        Publisher::new(&cache, tmp.path().join("no-static"), &public)
            .clean_build(true)
            .publish()
            .unwrap();
        assert!(public.join("index.html").exists());
        assert!(!public.join("stale.html").exists());
    }

    #[test]
    fn test_clean_build_into_absent_publish_dir() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("build");
        let public = tmp.path().join("public");
        write(&cache, "writing/a/index.html", "a");
        write(&tmp.path().join("static"), "site.css", "body {}");

        let stats = Publisher::new(&cache, tmp.path().join("static"), &public)
            .clean_build(true)
            .publish()
            .unwrap();
        assert_eq!(stats.written, 2);
        assert_eq!(fs::read_to_string(public.join("writing/a/index.html")).unwrap(), "a");
        assert!(public.join("site.css").exists());
        assert!(!cache.exists());
    }
}
