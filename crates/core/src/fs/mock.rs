use super::{DirEntry, FileSystem, FileType};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct MockEntry {
    pub content: Option<String>,
    pub file_type: FileType,
}

pub struct MockFileSystem {
    files: RwLock<HashMap<PathBuf, MockEntry>>,
    root: PathBuf,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        let fs = Self {
            files: RwLock::new(HashMap::new()),
            root: root.clone(),
        };
        fs.add_dir(root);
        fs
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.files.write().unwrap();

        if let Some(parent) = path.parent() {
            Self::ensure_parents(&mut files, parent);
        }

        files.insert(
            path,
            MockEntry {
                content: Some(content.to_string()),
                file_type: FileType::File,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.files.write().unwrap();

        Self::ensure_parents(&mut files, &path);
    }

    /// Contents of a file, for asserting on what the pipeline wrote
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let path = self.normalize_path(path.as_ref());
        self.files
            .read()
            .unwrap()
            .get(&path)
            .and_then(|e| e.content.clone())
    }

    /// Relative paths resolve against the mock root; `.` and `..` are folded lexically.
    fn normalize_path(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let mut normalized = PathBuf::new();
        for component in joined.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    normalized.pop();
                }
                other => normalized.push(other),
            }
        }
        normalized
    }

    fn ensure_parents(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            files.entry(current.clone()).or_insert(MockEntry {
                content: None,
                file_type: FileType::Directory,
            });
        }
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let path = self.normalize_path(path);
        self.files.read().unwrap().contains_key(&path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let path = self.normalize_path(path);
        self.files
            .read()
            .unwrap()
            .get(&path)
            .map(|e| e.file_type == FileType::Directory)
            .unwrap_or(false)
    }

    fn is_file(&self, path: &Path) -> bool {
        let path = self.normalize_path(path);
        self.files
            .read()
            .unwrap()
            .get(&path)
            .map(|e| e.file_type == FileType::File)
            .unwrap_or(false)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap();
        let entry = files
            .get(&path)
            .ok_or_else(|| anyhow!("File not found: {:?}", path))?;

        entry
            .content
            .clone()
            .ok_or_else(|| anyhow!("Not a file: {:?}", path))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<()> {
        let path = self.normalize_path(path);
        let mut files = self.files.write().unwrap();

        let parent_is_dir = path
            .parent()
            .and_then(|p| files.get(p))
            .map(|e| e.file_type == FileType::Directory)
            .unwrap_or(false);
        if !parent_is_dir {
            return Err(anyhow!("Parent directory not found: {:?}", path));
        }
        if matches!(files.get(&path), Some(e) if e.file_type == FileType::Directory) {
            return Err(anyhow!("Is a directory: {:?}", path));
        }

        files.insert(
            path,
            MockEntry {
                content: Some(contents.to_string()),
                file_type: FileType::File,
            },
        );
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap();

        if !files.contains_key(&path) {
            return Err(anyhow!("Directory not found: {:?}", path));
        }

        let mut entries = Vec::new();
        for (file_path, entry) in files.iter() {
            if file_path.parent() == Some(path.as_path()) {
                let name = file_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("")
                    .to_string();

                entries.push(DirEntry {
                    path: file_path.clone(),
                    name,
                    file_type: entry.file_type,
                });
            }
        }

        Ok(entries)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        let normalized = self.normalize_path(path);
        if self.files.read().unwrap().contains_key(&normalized) {
            Ok(normalized)
        } else {
            Err(anyhow!("Path not found: {:?}", path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_file() {
        let fs = MockFileSystem::new();
        fs.add_file("metadata/org.example.app.yml", "Repo: x\n");

        assert!(fs.exists(Path::new("/mock/metadata/org.example.app.yml")));
        assert!(fs.is_file(Path::new("/mock/metadata/org.example.app.yml")));
        assert!(fs.is_dir(Path::new("/mock/metadata")));
    }

    #[test]
    fn test_relative_paths_with_parent_components() {
        let fs = MockFileSystem::with_root(PathBuf::from("/builds/fdroid/fdroiddata"));
        fs.add_file("../app/build.gradle", "versionCode 3\n");

        assert!(fs.is_file(Path::new("/builds/fdroid/app/build.gradle")));
        let content = fs.read_to_string(Path::new("../app/build.gradle")).unwrap();
        assert_eq!(content, "versionCode 3\n");
    }

    #[test]
    fn test_write_string_replaces_content() {
        let fs = MockFileSystem::new();
        fs.add_file("metadata/a.yml", "old");

        fs.write_string(Path::new("metadata/a.yml"), "new").unwrap();
        assert_eq!(fs.contents("metadata/a.yml").as_deref(), Some("new"));
    }

    #[test]
    fn test_write_string_requires_parent() {
        let fs = MockFileSystem::new();
        let result = fs.write_string(Path::new("missing/a.yml"), "x");
        assert!(result.is_err());
    }

    #[test]
    fn test_read_dir_lists_direct_children() {
        let fs = MockFileSystem::new();
        fs.add_file("metadata/a.yml", "x");
        fs.add_file("metadata/b.yml", "y");
        fs.add_file("metadata/a/en-US/summary.txt", "z");

        let entries = fs.read_dir(Path::new("metadata")).unwrap();
        let mut names: Vec<&str> = entries.iter().map(|e| e.file_name()).collect();
        names.sort();

        assert_eq!(names, vec!["a", "a.yml", "b.yml"]);
    }

    #[test]
    fn test_canonicalize() {
        let fs = MockFileSystem::with_root(PathBuf::from("/builds/fdroid/fdroiddata"));

        let path = fs.canonicalize(Path::new("..")).unwrap();
        assert_eq!(path, PathBuf::from("/builds/fdroid"));
        assert!(fs.canonicalize(Path::new("nowhere")).is_err());
    }
}
