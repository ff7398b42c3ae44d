use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGES_DOMAIN: &str = "github.io";

/// Owner/name pair addressing a repository on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Public static-site URL for this repository.
    pub fn pages_url(&self, pages_domain: &str) -> String {
        format!(
            "https://{}.{}/{}/",
            self.owner.to_lowercase(),
            pages_domain,
            self.name
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRepoRequest {
    pub name: String,
    pub description: String,
    pub private: bool,
}

impl CreateRepoRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            private: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn as_private(mut self) -> Self {
        self.private = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRepository {
    pub repo: RepoRef,
    pub html_url: String,
    pub default_branch: String,
}

/// Branch and directory served as the static site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagesSource {
    pub branch: String,
    pub path: String,
}

impl PagesSource {
    pub fn root_of(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            path: "/".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_ref_full_name() {
        let repo = RepoRef::new("owner", "repo");
        assert_eq!(repo.full_name(), "owner/repo");
    }

    #[test]
    fn test_pages_url_template() {
        let repo = RepoRef::new("OctoCat", "calculator-20250101120000-ab12");
        assert_eq!(
            repo.pages_url(DEFAULT_PAGES_DOMAIN),
            "https://octocat.github.io/calculator-20250101120000-ab12/"
        );
    }

    #[test]
    fn test_create_repo_request_builder() {
        let req = CreateRepoRequest::new("app")
            .with_description("Calculator")
            .as_private();

        assert_eq!(req.name, "app");
        assert_eq!(req.description, "Calculator");
        assert!(req.private);
    }

    #[test]
    fn test_pages_source_serves_branch_root() {
        let source = PagesSource::root_of("master");
        assert_eq!(source.branch, "master");
        assert_eq!(source.path, "/");
    }
}
