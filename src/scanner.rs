//! Directory ingestion: turns text files under a root into indexable documents

use crate::error::{NgramError, Result};
use crate::index::{DocId, IndexConfig};
use crate::shared::SharedIndex;
use globset::{Glob, GlobMatcher};
use memmap2::Mmap;
use rayon::prelude::*;
use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Bytes inspected when sniffing for binary content
const BINARY_SNIFF_LEN: usize = 8192;

/// Configuration for scanning
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// File extensions to include (empty = all files)
    pub extensions: Vec<String>,

    /// File or directory names below the root to exclude
    pub exclude_patterns: Vec<String>,

    /// Glob matched against file names (e.g. `*.md`)
    pub include_glob: Option<String>,

    /// Maximum file size to index (in bytes)
    pub max_file_size: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec![],
            exclude_patterns: vec![
                ".git".to_string(),
                "node_modules".to_string(),
                "target".to_string(),
                ".cache".to_string(),
                "__pycache__".to_string(),
            ],
            include_glob: None,
            max_file_size: 10 * 1024 * 1024, // 10 MB
        }
    }
}

/// Documents read from disk, with ids assigned in walk order
#[derive(Debug, Clone)]
pub struct Corpus {
    pub root: PathBuf,
    paths: Vec<PathBuf>,
    documents: Vec<(DocId, String)>,
}

impl Corpus {
    /// Path of the file a document was read from
    pub fn path(&self, doc_id: DocId) -> Option<&Path> {
        self.paths.get(doc_id as usize).map(PathBuf::as_path)
    }

    pub fn documents(&self) -> &[(DocId, String)] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Build a trigram index over the corpus
    pub fn index(&self) -> SharedIndex {
        let index = SharedIndex::new();
        index.add_batch(&self.documents);
        index
    }

    /// Build an index over the corpus with a custom configuration
    pub fn index_with_config(&self, config: IndexConfig) -> Result<SharedIndex> {
        let index = SharedIndex::with_config(config)?;
        index.add_batch(&self.documents);
        Ok(index)
    }
}

/// Walk `root` and read every matching text file as a document
pub fn scan_documents(root: &Path, config: &ScanConfig) -> Result<Corpus> {
    let files = collect_files(root, config)?;
    let candidates = files.len();

    // Read in parallel; rayon keeps the results in walk order
    let texts: Vec<(PathBuf, Option<String>)> = files
        .into_par_iter()
        .map(|path| {
            let text = read_text_file(&path).unwrap_or_else(|err| {
                debug!(path = %path.display(), %err, "skipping unreadable file");
                None
            });
            (path, text)
        })
        .collect();

    let mut paths = Vec::new();
    let mut documents = Vec::new();

    for (path, text) in texts {
        let Some(text) = text else {
            continue;
        };
        let doc_id = paths.len() as DocId;
        paths.push(path);
        documents.push((doc_id, text));
    }

    info!(
        root = %root.display(),
        candidates,
        documents = documents.len(),
        "scanned directory"
    );

    Ok(Corpus {
        root: root.to_path_buf(),
        paths,
        documents,
    })
}

/// Collect all files matching the configuration
fn collect_files(root: &Path, config: &ScanConfig) -> Result<Vec<PathBuf>> {
    let matcher = config
        .include_glob
        .as_deref()
        .map(compile_glob)
        .transpose()?;

    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || !is_excluded(e.file_name(), &config.exclude_patterns)
        })
    {
        let entry = entry.map_err(|e| NgramError::WalkDir(e.to_string()))?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();

        // Check extension filter
        if !config.extensions.is_empty() {
            match path.extension().and_then(|e| e.to_str()) {
                Some(ext) if config.extensions.iter().any(|e| e == ext) => {}
                _ => continue,
            }
        }

        if let Some(matcher) = &matcher {
            if !matcher.is_match(entry.file_name()) {
                continue;
            }
        }

        // Check file size
        if let Ok(metadata) = entry.metadata() {
            if metadata.len() > config.max_file_size {
                continue;
            }
        }

        files.push(path.to_path_buf());
    }

    Ok(files)
}

fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|e| NgramError::InvalidPattern(e.to_string()))
}

/// Check if an entry name below the scan root is excluded.
/// The root itself and its ancestors are never tested.
fn is_excluded(name: &OsStr, patterns: &[String]) -> bool {
    name.to_str()
        .is_some_and(|name| patterns.iter().any(|p| name == p))
}

/// Read a file as text. Returns `None` for binary files.
fn read_text_file(path: &Path) -> Result<Option<String>> {
    let file = File::open(path)?;
    let metadata = file.metadata()?;

    if metadata.len() == 0 {
        return Ok(Some(String::new()));
    }

    let mmap = unsafe { Mmap::map(&file)? };

    // Check for binary file (null bytes in first 8KB)
    let check_len = std::cmp::min(BINARY_SNIFF_LEN, mmap.len());
    if mmap[..check_len].contains(&0) {
        return Ok(None);
    }

    Ok(Some(String::from_utf8_lossy(&mmap).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_scan_and_search() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "a.txt", b"mazerunner");
        write(temp_dir.path(), "b.txt", b"amazing");
        write(temp_dir.path(), "c.txt", b"running");

        let corpus = scan_documents(temp_dir.path(), &ScanConfig::default()).unwrap();
        assert_eq!(corpus.len(), 3);

        // Ids follow sorted walk order
        assert_eq!(corpus.path(0).unwrap().file_name().unwrap(), "a.txt");
        assert_eq!(corpus.path(2).unwrap().file_name().unwrap(), "c.txt");

        let index = corpus.index();
        let hits = index.search("amaz");
        assert_eq!(hits.len(), 2);
        let best = hits
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .unwrap();
        assert_eq!(corpus.path(best.doc_id).unwrap().file_name().unwrap(), "b.txt");
    }

    #[test]
    fn test_skips_binary_and_excluded() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "text.txt", b"hello world");
        write(temp_dir.path(), "blob.bin", b"abc\0def");
        write(temp_dir.path(), ".git/config", b"hello git");
        write(temp_dir.path(), "empty.txt", b"");

        let corpus = scan_documents(temp_dir.path(), &ScanConfig::default()).unwrap();
        let names: Vec<_> = (0..corpus.len() as DocId)
            .map(|id| corpus.path(id).unwrap().file_name().unwrap().to_owned())
            .collect();

        assert_eq!(names, vec!["empty.txt", "text.txt"]);
    }

    #[test]
    fn test_extension_and_glob_filters() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "notes.md", b"alpha");
        write(temp_dir.path(), "readme.txt", b"beta");
        write(temp_dir.path(), "sub/todo.md", b"gamma");

        let config = ScanConfig {
            extensions: vec!["md".to_string()],
            ..ScanConfig::default()
        };
        let corpus = scan_documents(temp_dir.path(), &config).unwrap();
        assert_eq!(corpus.len(), 2);

        let config = ScanConfig {
            include_glob: Some("todo*".to_string()),
            ..ScanConfig::default()
        };
        let corpus = scan_documents(temp_dir.path(), &config).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.documents()[0].1, "gamma");
    }

    #[test]
    fn test_max_file_size() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "small.txt", b"tiny");
        write(temp_dir.path(), "large.txt", &[b'x'; 64]);

        let config = ScanConfig {
            max_file_size: 16,
            ..ScanConfig::default()
        };
        let corpus = scan_documents(temp_dir.path(), &config).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.documents()[0].1, "tiny");
    }

    #[test]
    fn test_invalid_glob() {
        let temp_dir = TempDir::new().unwrap();
        let config = ScanConfig {
            include_glob: Some("[".to_string()),
            ..ScanConfig::default()
        };
        let result = scan_documents(temp_dir.path(), &config);
        assert!(matches!(result, Err(NgramError::InvalidPattern(_))));
    }

    #[test]
    fn test_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let result = scan_documents(&temp_dir.path().join("missing"), &ScanConfig::default());
        assert!(matches!(result, Err(NgramError::WalkDir(_))));
    }

    #[test]
    fn test_is_excluded() {
        let patterns = vec![".git".to_string(), "node_modules".to_string()];

        assert!(is_excluded(OsStr::new(".git"), &patterns));
        assert!(is_excluded(OsStr::new("node_modules"), &patterns));
        assert!(!is_excluded(OsStr::new("src"), &patterns));
    }

    #[test]
    fn test_root_inside_excluded_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("target").join("docs");
        write(&root, "a.txt", b"mazerunner");
        write(&root, "target/b.txt", b"amazing");

        let corpus = scan_documents(&root, &ScanConfig::default()).unwrap();

        // Excluded names above the root are ignored, those below still apply
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.documents()[0].1, "mazerunner");
    }

    #[test]
    fn test_root_named_like_excluded_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join(".cache");
        write(&root, "notes.txt", b"running");

        let corpus = scan_documents(&root, &ScanConfig::default()).unwrap();
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert!(config.extensions.is_empty());
        assert!(config.include_glob.is_none());
        assert!(config.exclude_patterns.contains(&".git".to_string()));
    }
}
