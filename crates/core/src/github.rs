use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

const MAX_LINES: usize = 10_000;

static RE_BLOB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"github\.com/([^/]+)/([^/]+)/blob/([^/]+)/(.+)").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubBlob {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub path: String,
}

impl GithubBlob {
    pub fn parse(url: &str) -> anyhow::Result<Self> {
        let cap = RE_BLOB
            .captures(url)
            .context("Invalid GitHub URL. Must be a file URL (blob).")?;
        Ok(Self {
            owner: cap[1].to_string(),
            repo: cap[2].to_string(),
            branch: cap[3].to_string(),
            path: cap[4].to_string(),
        })
    }

    pub fn raw_url(&self) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}/{}",
            self.owner, self.repo, self.branch, self.path
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GithubFile {
    pub code: String,
    pub language: String,
    pub filename: String,
}

pub fn language_for_path(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "js" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "py" => "python",
        "rb" => "ruby",
        "go" => "go",
        "rs" => "rust",
        "java" => "java",
        "cpp" => "cpp",
        "c" | "h" => "c",
        "css" => "css",
        "html" => "html",
        "json" => "json",
        "sql" => "sql",
        "php" => "php",
        _ => "plaintext",
    }
}

pub fn fetch_file(url: &str, timeout: Duration) -> anyhow::Result<GithubFile> {
    let blob = GithubBlob::parse(url)?;
    let raw = blob.raw_url();
    tracing::debug!(%raw, "fetching github file");

    let resp = match ureq::get(&raw).timeout(timeout).call() {
        Ok(r) => r,
        Err(ureq::Error::Status(404, _)) => {
            anyhow::bail!("File not found. Check the URL or repo visibility.")
        }
        Err(ureq::Error::Status(code, r)) => {
            anyhow::bail!("Failed to fetch file: {code} {}", r.status_text())
        }
        Err(e) => return Err(e).with_context(|| format!("fetch {raw}")),
    };

    let code = resp.into_string().context("read file body")?;
    if code.lines().count() > MAX_LINES {
        anyhow::bail!("File is too large (>10,000 lines). Please use a smaller file or snippet.");
    }

    Ok(GithubFile {
        code,
        language: language_for_path(&blob.path).to_string(),
        filename: blob.path,
    })
}
