//! Live filesystem adapter using `std::fs` and `walkdir`.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::ports::filesystem::FileSystem;

/// Live filesystem adapter backed by real disk I/O.
pub struct LiveFileSystem;

impl FileSystem for LiveFileSystem {
    fn read_to_string(
        &self,
        path: &Path,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn write(
        &self,
        path: &Path,
        contents: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        // Write beside the target and rename over it so a crash mid-write
        // leaves the previous store intact.
        let file_name = path
            .file_name()
            .ok_or_else(|| format!("Not a file path: {}", path.display()))?
            .to_string_lossy();
        let tmp = path.with_file_name(format!(".{file_name}.tmp"));
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(std::fs::create_dir_all(path)?)
    }

    fn create_link(
        &self,
        target: &Path,
        link: &Path,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        platform_link(target, link)
    }

    fn is_link(&self, path: &Path) -> bool {
        std::fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink())
    }

    fn is_live_link(&self, path: &Path) -> bool {
        self.is_link(path) && std::fs::metadata(path).is_ok()
    }

    fn read_link(&self, path: &Path) -> Result<PathBuf, Box<dyn std::error::Error + Send + Sync>> {
        Ok(std::fs::read_link(path)?)
    }

    fn remove_link(&self, path: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        platform_unlink(path)
    }

    fn find_links(
        &self,
        root: &Path,
    ) -> Result<Vec<PathBuf>, Box<dyn std::error::Error + Send + Sync>> {
        if std::fs::symlink_metadata(root).is_err() {
            return Ok(Vec::new());
        }
        let mut links = Vec::new();
        for entry in WalkDir::new(root).min_depth(1).follow_links(false).sort_by_file_name() {
            let entry = entry?;
            if entry.path_is_symlink() {
                links.push(entry.into_path());
            }
        }
        links.sort();
        Ok(links)
    }
}

#[cfg(unix)]
fn platform_link(
    target: &Path,
    link: &Path,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    Ok(std::os::unix::fs::symlink(target, link)?)
}

#[cfg(windows)]
fn platform_link(
    target: &Path,
    link: &Path,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match std::os::windows::fs::symlink_dir(target, link) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => Err(err.into()),
        Err(err) => {
            // Symlinks need Developer Mode or elevation; junctions do not.
            tracing::debug!(link = %link.display(), error = %err, "symlink refused, creating junction");
            create_junction(target, link)
        }
    }
}

#[cfg(windows)]
fn create_junction(
    target: &Path,
    link: &Path,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let output = std::process::Command::new("cmd")
        .arg("/c")
        .arg("mklink")
        .arg("/J")
        .arg(link)
        .arg(target)
        .output()?;
    if output.status.success() {
        Ok(())
    } else {
        Err(format!("mklink /J failed: {}", String::from_utf8_lossy(&output.stderr).trim()).into())
    }
}

#[cfg(unix)]
fn platform_unlink(path: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    Ok(std::fs::remove_file(path)?)
}

#[cfg(windows)]
fn platform_unlink(path: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Directory symlinks and junctions are both removed as directories.
    Ok(std::fs::remove_dir(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("trendlink_livefs_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn write_replaces_whole_file_and_leaves_no_temp() {
        let dir = scratch("write");
        let path = dir.join("nested").join("store.json");
        let fs = LiveFileSystem;

        fs.write(&path, "{\"a\":\"1\"}").unwrap();
        fs.write(&path, "{}").unwrap();

        assert_eq!(fs.read_to_string(&path).unwrap(), "{}");
        assert!(!dir.join("nested").join(".store.json.tmp").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn find_links_on_missing_root_is_empty() {
        let fs = LiveFileSystem;
        let links = fs.find_links(Path::new("/nonexistent/trendlink/links")).unwrap();
        assert!(links.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn creates_detects_and_removes_links() {
        let dir = scratch("links");
        let target = dir.join("library").join("Heat (1995)");
        std::fs::create_dir_all(&target).unwrap();
        let link = dir.join("links").join("Heat (1995)");
        let fs = LiveFileSystem;

        fs.create_dir_all(link.parent().unwrap()).unwrap();
        fs.create_link(&target, &link).unwrap();
        assert!(fs.is_link(&link));
        assert!(!fs.is_link(&target));
        assert_eq!(fs.read_link(&link).unwrap(), target);
        assert!(fs.create_link(&target, &link).is_err());

        fs.remove_link(&link).unwrap();
        assert!(!fs.is_link(&link));
        assert!(target.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_link_is_a_link_but_not_live() {
        let dir = scratch("dangling");
        let target = dir.join("library").join("Moved");
        std::fs::create_dir_all(&target).unwrap();
        let link = dir.join("Moved");
        let fs = LiveFileSystem;

        fs.create_link(&target, &link).unwrap();
        assert!(fs.is_live_link(&link));
        std::fs::remove_dir(&target).unwrap();
        assert!(fs.is_link(&link));
        assert!(!fs.is_live_link(&link));
        assert!(!fs.is_live_link(&dir.join("absent")));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn find_links_does_not_descend_into_links() {
        let dir = scratch("walk");
        let library = dir.join("library");
        std::fs::create_dir_all(library.join("Show").join("Season 1")).unwrap();
        let root = dir.join("links");
        std::fs::create_dir_all(root.join("nested")).unwrap();
        std::fs::create_dir_all(root.join("plain")).unwrap();
        std::os::unix::fs::symlink(library.join("Show"), root.join("nested").join("Show"))
            .unwrap();
        std::os::unix::fs::symlink(library.join("Show"), root.join("Alias")).unwrap();

        let links = LiveFileSystem.find_links(&root).unwrap();
        assert_eq!(links, vec![root.join("Alias"), root.join("nested").join("Show")]);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
