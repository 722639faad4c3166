//! The task list: every sheet the user works on, one path per line.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::line::{Line, classify};
use crate::sheet::{self, SheetError};

/// Sheet paths read from a task-list file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    sheets: Vec<PathBuf>,
}

impl TaskList {
    /// Reads the task list at `path`. A missing file is an empty list.
    ///
    /// Blank lines are skipped. Relative entries are taken relative to the
    /// directory holding the task list.
    pub fn load(path: &Path) -> Result<Self, SheetError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "task list not found");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SheetError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let list = Self::parse(&text, base);
        tracing::debug!(path = %path.display(), sheets = list.sheets.len(), "loaded task list");
        Ok(list)
    }

    /// Parses task-list text, resolving relative entries against `base`.
    pub fn parse(text: &str, base: &Path) -> Self {
        let sheets = text
            .lines()
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| base.join(entry))
            .collect();
        Self { sheets }
    }

    pub fn sheets(&self) -> &[PathBuf] {
        &self.sheets
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Project names mapped to the sheets that declare them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectIndex {
    projects: BTreeMap<String, PathBuf>,
}

impl ProjectIndex {
    /// Indexes every readable sheet in the task list.
    ///
    /// A sheet is known by the last project it declares, or by its file stem
    /// when it declares none. Unreadable sheets are skipped with a warning.
    pub fn build(tasks: &TaskList) -> Self {
        let mut index = Self::default();
        for path in tasks.sheets() {
            match declared_project(path) {
                Ok(name) => index.insert(name, path.clone()),
                Err(err) => tracing::warn!(error = %err, "skipping sheet in task list"),
            }
        }
        index
    }

    /// Adds a project. A later sheet with the same name replaces the earlier one.
    pub fn insert(&mut self, name: String, path: PathBuf) {
        if let Some(previous) = self.projects.insert(name.clone(), path) {
            tracing::warn!(project = name, previous = %previous.display(), "project declared by two sheets");
        }
    }

    /// Looks up a project by exact name, then ignoring ASCII case.
    pub fn lookup(&self, name: &str) -> Option<&Path> {
        self.projects
            .get(name)
            .or_else(|| {
                self.projects
                    .iter()
                    .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
                    .map(|(_, path)| path)
            })
            .map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.projects
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

/// The last non-empty project name a sheet declares.
fn declared_project(path: &Path) -> Result<String, SheetError> {
    let mut project = None;
    sheet::for_each_line(path, |text| {
        // Consistency errors are reported by the commands that total a sheet.
        match classify(text) {
            Ok(Line::Project(name)) if !name.is_empty() => project = Some(name),
            _ => {}
        }
        Ok(())
    })?;
    Ok(project.unwrap_or_else(|| {
        path.file_stem()
            .map_or_else(|| path.display().to_string(), |stem| stem.to_string_lossy().into_owned())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_blank_lines_and_trims() {
        let list = TaskList::parse("a.txt\n\n  /abs/b.txt  \r\n", Path::new("/home/u"));
        assert_eq!(
            list.sheets(),
            &[PathBuf::from("/home/u/a.txt"), PathBuf::from("/abs/b.txt")]
        );
    }

    #[test]
    fn missing_task_list_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let list = TaskList::load(&dir.path().join(".xtimesheet")).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn index_uses_declared_project_or_stem() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("alpha.txt"), "Project: Old\nProject: Alpha Corp\n").unwrap();
        std::fs::write(dir.path().join("beta.txt"), "2024/01/15 090000 -- 100000\n").unwrap();
        let list_path = dir.path().join(".xtimesheet");
        std::fs::write(&list_path, "alpha.txt\nbeta.txt\nmissing.txt\n").unwrap();

        let index = ProjectIndex::build(&TaskList::load(&list_path).unwrap());

        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup("Alpha Corp"), Some(dir.path().join("alpha.txt").as_path()));
        assert_eq!(index.lookup("beta"), Some(dir.path().join("beta.txt").as_path()));
        assert_eq!(index.lookup("Old"), None);
    }

    #[test]
    fn lookup_falls_back_to_case_insensitive() {
        let mut index = ProjectIndex::default();
        index.insert("Acme".to_string(), PathBuf::from("acme.txt"));
        index.insert("acme".to_string(), PathBuf::from("other.txt"));

        assert_eq!(index.lookup("acme"), Some(Path::new("other.txt")));
        assert_eq!(index.lookup("ACME"), Some(Path::new("acme.txt")));
        assert_eq!(index.lookup("nope"), None);
    }
}
