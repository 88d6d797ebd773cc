use {
    crate::RecordError,
    std::{
        fmt, fs, io,
        path::{Path, PathBuf},
        time::SystemTime,
    },
};

const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mkv", "mov"];

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Usage of the recordings directory at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageSnapshot {
    pub bytes_used: u64,
    pub file_count: usize,
    pub cap_bytes: u64,
    /// `bytes_used` as a percentage of `cap_bytes`.
    pub percentage: f64,
}

impl StorageSnapshot {
    fn new(bytes_used: u64, file_count: usize, cap_bytes: u64) -> Self {
        let percentage = if cap_bytes > 0 {
            bytes_used as f64 / cap_bytes as f64 * 100.0
        } else if bytes_used > 0 {
            100.0
        } else {
            0.0
        };
        Self {
            bytes_used,
            file_count,
            cap_bytes,
            percentage,
        }
    }

    pub fn is_over_cap(&self) -> bool {
        self.bytes_used >= self.cap_bytes
    }

    pub fn used_gb(&self) -> f64 {
        self.bytes_used as f64 / BYTES_PER_GB
    }

    pub fn cap_gb(&self) -> f64 {
        self.cap_bytes as f64 / BYTES_PER_GB
    }
}

impl fmt::Display for StorageSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3}GB/{:.1}GB ({:.1}%) - {} files",
            self.used_gb(),
            self.cap_gb(),
            self.percentage,
            self.file_count
        )
    }
}

/// A recording found in the recordings directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

#[derive(Debug, Default)]
pub struct EvictionReport {
    /// Removed files, oldest first.
    pub removed: Vec<PathBuf>,
    pub freed_bytes: u64,
    /// Files that were selected but could not be removed.
    pub failures: Vec<RecordError>,
}

/// Scans the recordings directory and evicts old recordings. Nothing is
/// cached; every call reads the directory again.
#[derive(Debug, Clone)]
pub struct StorageAccountant {
    dir: PathBuf,
    cap_bytes: u64,
}

impl StorageAccountant {
    pub fn new(dir: impl Into<PathBuf>, cap_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            cap_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn cap_bytes(&self) -> u64 {
        self.cap_bytes
    }

    /// Create the recordings directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<(), RecordError> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Video files in the directory, oldest modification time first. A
    /// missing directory has no recordings.
    pub fn recordings(&self) -> Result<Vec<RecordingFile>, RecordError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !is_video_file(&path) {
                continue;
            }
            // the file may vanish between listing and stat
            let metadata = match entry.metadata() {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    log::debug!("storage: skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            files.push(RecordingFile {
                path,
                size: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }
        files.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
        Ok(files)
    }

    pub fn snapshot(&self) -> Result<StorageSnapshot, RecordError> {
        let files = self.recordings()?;
        let bytes_used = files.iter().map(|f| f.size).sum();
        Ok(StorageSnapshot::new(bytes_used, files.len(), self.cap_bytes))
    }

    pub fn is_over_cap(&self) -> Result<bool, RecordError> {
        Ok(self.snapshot()?.is_over_cap())
    }

    /// Remove the oldest `fraction` of the recordings (rounded up, at least
    /// one), but never the last remaining one. Files that cannot be removed
    /// are logged and reported; they do not stop the eviction.
    pub fn evict_oldest(&self, fraction: f64) -> Result<EvictionReport, RecordError> {
        let files = self.recordings()?;
        let count = eviction_count(files.len(), fraction);
        Ok(remove_files(files.into_iter().take(count)))
    }
}

fn remove_files(files: impl IntoIterator<Item = RecordingFile>) -> EvictionReport {
    let mut report = EvictionReport::default();
    for file in files {
        match fs::remove_file(&file.path) {
            Ok(()) => {
                log::info!(
                    "storage: removed old recording {} ({} bytes)",
                    file.path.display(),
                    file.size
                );
                report.freed_bytes += file.size;
                report.removed.push(file.path);
            }
            Err(e) => {
                log::error!("storage: failed to remove {}: {}", file.path.display(), e);
                report.failures.push(RecordError::Eviction {
                    path: file.path,
                    reason: e.to_string(),
                });
            }
        }
    }
    report
}

/// Whether `path` has one of the recognized video extensions.
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(ext)))
}

// ceil(count * fraction), at least 1, keeping at least one file
fn eviction_count(count: usize, fraction: f64) -> usize {
    if count <= 1 {
        return 0;
    }
    let wanted = (count as f64 * fraction.clamp(0.0, 1.0)).ceil() as usize;
    wanted.max(1).min(count - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eviction_count() {
        assert_eq!(eviction_count(0, 0.2), 0);
        assert_eq!(eviction_count(1, 0.2), 0);
        assert_eq!(eviction_count(2, 0.2), 1);
        assert_eq!(eviction_count(5, 0.2), 1);
        assert_eq!(eviction_count(6, 0.2), 2);
        assert_eq!(eviction_count(10, 0.2), 2);
        assert_eq!(eviction_count(11, 0.2), 3);
        assert_eq!(eviction_count(3, 1.0), 2);
        assert_eq!(eviction_count(4, 0.0), 1);
    }

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("a/motion_1.mp4")));
        assert!(is_video_file(Path::new("CLIP.MOV")));
        assert!(is_video_file(Path::new("x.Avi")));
        assert!(is_video_file(Path::new("x.mkv")));
        assert!(!is_video_file(Path::new("notes.txt")));
        assert!(!is_video_file(Path::new("mp4")));
        assert!(!is_video_file(Path::new("archive.mp4.gz")));
    }

    #[test]
    fn test_snapshot_percentage() {
        let half = StorageSnapshot::new(50, 1, 100);
        assert_eq!(half.percentage, 50.0);
        assert!(!half.is_over_cap());
        assert!(StorageSnapshot::new(100, 1, 100).is_over_cap());
        assert_eq!(StorageSnapshot::new(1, 1, 0).percentage, 100.0);
        assert_eq!(StorageSnapshot::new(0, 0, 0).percentage, 0.0);
        assert!(StorageSnapshot::new(0, 0, 0).is_over_cap());
    }

    #[test]
    fn test_remove_files_continues_past_failures() {
        let dir = std::env::temp_dir()
            .join(format!("sentinel-storage-remove-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let file = |name: &str| {
            let path = dir.join(name);
            fs::write(&path, [0u8; 7]).unwrap();
            RecordingFile {
                path,
                size: 7,
                modified: SystemTime::now(),
            }
        };
        let first = file("a.mp4");
        let gone = file("b.mp4");
        let third = file("c.mp4");
        // removed behind our back after listing
        fs::remove_file(&gone.path).unwrap();

        let report = remove_files(vec![first.clone(), gone.clone(), third.clone()]);
        assert_eq!(report.removed, vec![first.path.clone(), third.path.clone()]);
        assert_eq!(report.freed_bytes, 14);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            &report.failures[0],
            RecordError::Eviction { path, .. } if *path == gone.path
        ));
        assert!(!first.path.exists());
        assert!(!third.path.exists());

        fs::remove_dir_all(&dir).ok();
    }
}
