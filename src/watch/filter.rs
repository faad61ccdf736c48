// src/watch/filter.rs

//! Pure path predicates deciding what is watched and what is relevant.
//!
//! All comparisons are exact and case-sensitive; there is no glob support.

use std::path::Path;

use crate::config::WatchConfig;

#[derive(Debug, Clone)]
pub struct PathFilter {
    extensions: Vec<String>,
    exclude_dirs: Vec<String>,
    exclude_files: Vec<String>,
}

impl PathFilter {
    pub fn new(
        extensions: Vec<String>,
        exclude_dirs: Vec<String>,
        exclude_files: Vec<String>,
    ) -> Self {
        Self {
            extensions,
            exclude_dirs,
            exclude_files,
        }
    }

    pub fn from_config(cfg: &WatchConfig) -> Self {
        Self::new(
            cfg.extensions().to_vec(),
            cfg.exclude_dirs().to_vec(),
            cfg.exclude_files().to_vec(),
        )
    }

    /// Hidden directories (`.git`, `.idea`, ...) and configured names are
    /// excluded. A lone `.` is not considered hidden.
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        if name.len() > 1 && name.starts_with('.') {
            return true;
        }
        self.exclude_dirs.iter().any(|d| d == name)
    }

    pub fn is_excluded_file(&self, name: &str) -> bool {
        self.exclude_files.iter().any(|f| f == name)
    }

    /// True iff the text after the last `.` of the file name is a
    /// configured extension. Names without a `.` never match; a leading dot
    /// counts, so `.env` has the extension `env`.
    pub fn matches_extension(&self, path: &Path) -> bool {
        let name = base_name(path);
        match name.rfind('.') {
            Some(idx) => {
                let ext = &name[idx + 1..];
                self.extensions.iter().any(|e| e == ext)
            }
            None => false,
        }
    }
}

/// Final path component as UTF-8, or an empty string when there is none.
pub fn base_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> PathFilter {
        PathFilter::new(
            vec!["go".into(), "html".into()],
            vec!["vendor".into(), "node_modules".into()],
            vec!["generated.go".into()],
        )
    }

    #[test]
    fn hidden_dirs_are_excluded() {
        let f = filter();
        assert!(f.is_excluded_dir(".git"));
        assert!(f.is_excluded_dir(".idea"));
        assert!(!f.is_excluded_dir("."));
        assert!(!f.is_excluded_dir("src"));
    }

    #[test]
    fn configured_dirs_match_exactly() {
        let f = filter();
        assert!(f.is_excluded_dir("vendor"));
        assert!(!f.is_excluded_dir("Vendor"));
        assert!(!f.is_excluded_dir("vendor2"));
        assert!(!f.is_excluded_dir("vend*"));
    }

    #[test]
    fn excluded_files_match_exactly() {
        let f = filter();
        assert!(f.is_excluded_file("generated.go"));
        assert!(!f.is_excluded_file("Generated.go"));
        assert!(!f.is_excluded_file("main.go"));
    }

    #[test]
    fn extension_matching() {
        let f = filter();
        assert!(f.matches_extension(Path::new("/p/main.go")));
        assert!(f.matches_extension(Path::new("/p/views/index.html")));
        assert!(!f.matches_extension(Path::new("/p/README.md")));
        assert!(!f.matches_extension(Path::new("/p/Makefile")));
        assert!(!f.matches_extension(Path::new("/p/main.GO")));
        assert!(!f.matches_extension(Path::new("/p/main.go.orig")));
    }

    #[test]
    fn leading_dot_counts_as_extension() {
        let f = PathFilter::new(vec!["env".into()], vec![], vec![]);
        assert!(f.matches_extension(Path::new("/p/.env")));
        assert!(f.matches_extension(Path::new("/p/local.env")));
        assert!(!f.matches_extension(Path::new("/p/env")));
    }

    #[test]
    fn trailing_dot_is_an_empty_extension() {
        let f = filter();
        assert!(!f.matches_extension(Path::new("/p/main.")));
    }
}
