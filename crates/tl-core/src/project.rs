//! Display-label to project id mapping.

use crate::types::{Project, ProjectId};

/// Projects in display order with case-insensitive label lookup.
///
/// Matching follows the store's `COLLATE NOCASE` rules, which fold ASCII only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectList {
    projects: Vec<Project>,
}

impl ProjectList {
    /// Builds the list, sorting by name without regard to ASCII case.
    pub fn new(mut projects: Vec<Project>) -> Self {
        projects.sort_by(|a, b| {
            a.name
                .to_ascii_lowercase()
                .cmp(&b.name.to_ascii_lowercase())
                .then(a.id.cmp(&b.id))
        });
        Self { projects }
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter()
    }

    /// Resolves a display label to a project.
    pub fn find(&self, label: &str) -> Option<&Project> {
        let label = label.trim();
        self.projects
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(label))
    }

    /// Looks up a project by id.
    pub fn get(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: ProjectId) -> bool {
        self.get(id).is_some()
    }

    /// The first project in display order.
    pub fn first(&self) -> Option<&Project> {
        self.projects.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: i64, name: &str) -> Project {
        Project {
            id: ProjectId(id),
            name: name.to_string(),
        }
    }

    #[test]
    fn sorts_case_insensitively() {
        let list = ProjectList::new(vec![
            project(1, "zeta"),
            project(2, "Alpha"),
            project(3, "beta"),
        ]);
        let names: Vec<&str> = list.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta", "zeta"]);
        assert_eq!(list.first().map(|p| p.id), Some(ProjectId(2)));
    }

    #[test]
    fn find_ignores_case_and_whitespace() {
        let list = ProjectList::new(vec![project(7, "Work")]);
        assert_eq!(list.find("work").map(|p| p.id), Some(ProjectId(7)));
        assert_eq!(list.find(" WORK ").map(|p| p.id), Some(ProjectId(7)));
        assert!(list.find("home").is_none());
    }

    #[test]
    fn lookup_by_id() {
        let list = ProjectList::new(vec![project(1, "a"), project(2, "b")]);
        assert_eq!(list.get(ProjectId(2)).map(|p| p.name.as_str()), Some("b"));
        assert!(list.contains(ProjectId(1)));
        assert!(!list.contains(ProjectId(3)));
        assert_eq!(list.len(), 2);
    }
}
