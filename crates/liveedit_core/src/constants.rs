//! Shared constants used across LiveEdit crates.

/// Default API port for the LiveEdit server.
pub const DEFAULT_PORT: u16 = 38480;

/// Default maximum request body accepted by the action endpoints.
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

/// Default base URL for CLI/API clients.
pub const DEFAULT_CLI_SERVER_URL: &str = "http://localhost:38480";

/// Environment flag set by the hosting platform. Its presence selects the
/// GitHub persistence backend.
pub const HOSTED_ENV_FLAG: &str = "VERCEL";

/// Repository identifier (`owner/name`) for the GitHub backend.
pub const GITHUB_REPO_ENV: &str = "GITHUB_REPO";
/// Access token for the GitHub backend.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
/// Branch the GitHub backend reads from and commits to.
pub const GITHUB_BRANCH_ENV: &str = "GITHUB_BRANCH";
/// GitHub REST API base URL override.
pub const GITHUB_API_URL_ENV: &str = "GITHUB_API_URL";

/// Default branch for remote commits.
pub const DEFAULT_GITHUB_BRANCH: &str = "main";
/// Default GitHub REST API base URL.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Bearer token required by action endpoints when set.
pub const ADMIN_TOKEN_ENV: &str = "ADMIN_TOKEN";

/// Message reported after a successful remote commit.
pub const REMOTE_SUCCESS_MESSAGE: &str =
    "Changes pushed to GitHub. Re-deployment will start shortly.";

/// Query parameter used to bust caches when reloading after a save.
pub const CACHE_BUST_PARAM: &str = "t";
