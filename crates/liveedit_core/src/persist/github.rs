//! GitHub contents-API backend used when running on the hosting platform.
//!
//! Loading fetches the file and its blob sha from the configured branch;
//! saving commits the full new content against that sha, so a file changed
//! upstream in the meantime is rejected by GitHub instead of being blindly
//! overwritten.

use super::local::validate_relative_path;
use super::Document;
use crate::config::GitHubConfig;
use crate::AppError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{header, Client, Response, Url};
use serde::{Deserialize, Serialize};

const USER_AGENT: &str = concat!("liveedit/", env!("CARGO_PKG_VERSION"));
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Remote store committing documents to a GitHub branch.
#[derive(Debug, Clone)]
pub struct GitHubStore {
    client: Client,
    api_url: Url,
    owner: String,
    name: String,
    token: String,
    branch: String,
}

/// Identifier of the commit created by [`GitHubStore::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdateContentsBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct UpdateContentsResponse {
    commit: Option<CommitRef>,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: Option<String>,
}

impl GitHubStore {
    /// Build a store from configuration.
    ///
    /// # Errors
    /// Returns [`AppError::ConfigurationMissing`] when the token or repository
    /// is absent, and [`AppError::Remote`] for a malformed repository or API
    /// URL.
    pub fn from_config(config: &GitHubConfig) -> Result<Self, AppError> {
        let missing = config.missing();
        match (config.repo.as_deref(), config.token.as_deref()) {
            (Some(repo), Some(token)) if missing.is_empty() => {
                Self::new(repo, token, &config.branch, &config.api_url)
            }
            _ => Err(AppError::ConfigurationMissing(missing)),
        }
    }

    /// Build a store for `repo` (`owner/name`).
    ///
    /// # Errors
    /// Returns [`AppError::Remote`] when `repo` or `api_url` is malformed or
    /// the HTTP client cannot be created.
    pub fn new(repo: &str, token: &str, branch: &str, api_url: &str) -> Result<Self, AppError> {
        let (owner, name) = match repo.trim().split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                (owner.to_string(), name.to_string())
            }
            _ => {
                return Err(AppError::Remote(format!(
                    "GITHUB_REPO must look like owner/name, got '{}'",
                    repo
                )))
            }
        };
        let api_url = Url::parse(api_url)
            .map_err(|err| AppError::Remote(format!("invalid GitHub API URL '{}': {}", api_url, err)))?;
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            api_url,
            owner,
            name,
            token: token.to_string(),
            branch: branch.to_string(),
        })
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Fetch the latest content and blob sha of `path` on the branch.
    ///
    /// # Errors
    /// Returns [`AppError::Remote`] for transport failures, non-success
    /// responses and undecodable content.
    pub async fn load(&self, path: &str) -> Result<Document, AppError> {
        let mut url = self.contents_url(path)?;
        url.query_pairs_mut().append_pair("ref", &self.branch);

        let response = self.authorized(self.client.get(url)).send().await?;
        let response = ensure_success(response, path).await?;
        let body: ContentsResponse = response.json().await?;

        if let Some(encoding) = body.encoding.as_deref() {
            if encoding != "base64" {
                return Err(AppError::Remote(format!(
                    "unsupported content encoding '{}' for {}",
                    encoding, path
                )));
            }
        }
        let text = decode_content(&body.content)
            .map_err(|message| AppError::Remote(format!("{} for {}", message, path)))?;

        tracing::debug!("Fetched {} at blob {} from GitHub", path, body.sha);
        Ok(Document {
            path: path.to_string(),
            text,
            version: Some(body.sha),
        })
    }

    /// Commit `text` as the new content of `path`.
    ///
    /// # Arguments
    /// - `path`: Repository-relative document path.
    /// - `text`: Full new file content.
    /// - `version`: Blob sha the edit was based on (`None` creates the file).
    /// - `message`: Commit message.
    ///
    /// # Errors
    /// Returns [`AppError::Remote`] on transport failures or when GitHub
    /// rejects the commit (auth, stale sha, branch protection).
    pub async fn save(
        &self,
        path: &str,
        text: &str,
        version: Option<&str>,
        message: &str,
    ) -> Result<CommitInfo, AppError> {
        let url = self.contents_url(path)?;
        let body = UpdateContentsBody {
            message,
            content: STANDARD.encode(text.as_bytes()),
            branch: &self.branch,
            sha: version,
        };

        let response = self
            .authorized(self.client.put(url))
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response, path).await?;
        let sha = match response.json::<UpdateContentsResponse>().await {
            Ok(body) => body.commit.and_then(|commit| commit.sha),
            Err(err) => {
                tracing::debug!("Unreadable commit response for {}: {}", path, err);
                None
            }
        };

        tracing::info!(
            "Committed {} to {}/{}@{} ({})",
            path,
            self.owner,
            self.name,
            self.branch,
            sha.as_deref().unwrap_or("unknown commit")
        );
        Ok(CommitInfo { sha })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
    }

    fn contents_url(&self, path: &str) -> Result<Url, AppError> {
        let relative = validate_relative_path(path)?;
        let mut url = self.api_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                AppError::Remote(format!("GitHub API URL '{}' cannot be a base", self.api_url))
            })?;
            segments
                .pop_if_empty()
                .extend(["repos", self.owner.as_str(), self.name.as_str(), "contents"]);
            for component in relative.components() {
                if let std::path::Component::Normal(part) = component {
                    segments.push(&part.to_string_lossy());
                }
            }
        }
        Ok(url)
    }
}

async fn ensure_success(response: Response, path: &str) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let raw = match response.text().await {
        Ok(raw) => raw,
        Err(err) => {
            tracing::debug!("Failed to read GitHub error body for {}: {}", path, err);
            String::new()
        }
    };
    let detail = serde_json::from_str::<GitHubErrorBody>(&raw)
        .ok()
        .and_then(|body| body.message)
        .unwrap_or(raw);
    Err(AppError::Remote(format!(
        "GitHub returned {} for {}: {}",
        status,
        path,
        detail.trim()
    )))
}

/// Decode the base64 `content` field; GitHub wraps it at 60 columns.
fn decode_content(content: &str) -> Result<String, String> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|err| format!("invalid base64 content: {}", err))?;
    String::from_utf8(bytes).map_err(|_| "content is not valid UTF-8".to_string())
}

#[cfg(test)]
mod tests {
    use super::{decode_content, GitHubStore};
    use crate::config::GitHubConfig;
    use crate::AppError;

    fn store(api_url: &str) -> GitHubStore {
        GitHubStore::new("helivex/storefront", "token", "main", api_url).expect("store")
    }

    #[test]
    fn decode_content_ignores_line_wrapping() {
        let wrapped = "Y29uc3Qg\nSEVSTyA9\nICJoaSI7\n";
        assert_eq!(decode_content(wrapped).expect("decode"), "const HERO = \"hi\";");
        assert!(decode_content("!!!").is_err());
    }

    #[test]
    fn contents_url_encodes_repo_and_path_segments() {
        let url = store("https://api.github.com")
            .contents_url("src/app/page.tsx")
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/helivex/storefront/contents/src/app/page.tsx"
        );

        let enterprise = store("https://git.example.com/api/v3/")
            .contents_url("./src/components/Medical Core.tsx")
            .expect("url");
        assert_eq!(
            enterprise.as_str(),
            "https://git.example.com/api/v3/repos/helivex/storefront/contents/src/components/Medical%20Core.tsx"
        );

        assert!(matches!(
            store("https://api.github.com").contents_url("../outside"),
            Err(AppError::InvalidPath(_))
        ));
    }

    #[test]
    fn from_config_reports_missing_credentials() {
        let config = GitHubConfig::default();
        match GitHubStore::from_config(&config) {
            Err(AppError::ConfigurationMissing(missing)) => {
                assert_eq!(missing, vec!["GITHUB_TOKEN", "GITHUB_REPO"]);
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn malformed_repo_is_rejected() {
        for repo in ["storefront", "/storefront", "a/b/c"] {
            assert!(
                matches!(
                    GitHubStore::new(repo, "t", "main", "https://api.github.com"),
                    Err(AppError::Remote(_))
                ),
                "repo: {}",
                repo
            );
        }
    }
}
