//! GitHub integration for fetching the raw case archive.
//!
//! The case archive lives in a public GitHub repository as a folder of CSV
//! files. We list that folder through the contents API, then download each
//! CSV through its raw URL. An optional `GITHUB_TOKEN` (read via `.env`)
//! raises the API rate limit; anonymous access works fine for occasional
//! runs.

use std::fs;
use std::path::Path;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::AppError;

/// Contents-API URL of the default archive folder (JHU CSSE time series).
pub const DEFAULT_ARCHIVE_URL: &str = "https://api.github.com/repos/CSSEGISandData/COVID-19/contents/csse_covid_19_data/csse_covid_19_time_series";

// GitHub rejects requests without a user agent.
const USER_AGENT: &str = concat!("covfeat/", env!("CARGO_PKG_VERSION"));

/// One entry from a GitHub contents-API folder listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoFile {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub download_url: Option<String>,
}

pub struct GithubClient {
    client: Client,
    token: Option<String>,
}

impl GithubClient {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let token = std::env::var("GITHUB_TOKEN").ok();
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::remote(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, token })
    }

    /// List the CSV files of a repository folder.
    pub fn list_csv_files(&self, contents_url: &str) -> Result<Vec<RepoFile>, AppError> {
        let mut request = self
            .client
            .get(contents_url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| AppError::remote(format!("GitHub listing request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(AppError::remote(format!(
                "GitHub listing failed with status {} for {contents_url}.",
                response.status()
            )));
        }

        let entries: Vec<RepoFile> = response
            .json()
            .map_err(|e| AppError::remote(format!("Invalid GitHub listing response: {e}")))?;
        Ok(csv_entries(entries))
    }

    /// Download one raw CSV into `dest`, replacing any stale local copy so a
    /// refetch always yields the latest revision.
    pub fn download_csv(&self, url: &str, dest: &Path) -> Result<(), AppError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::input(format!(
                    "Failed to create folder '{}': {e}",
                    parent.display()
                ))
            })?;
        }
        if dest.exists() {
            fs::remove_file(dest).map_err(|e| {
                AppError::input(format!(
                    "Failed to remove stale file '{}': {e}",
                    dest.display()
                ))
            })?;
        }

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| AppError::remote(format!("Download request failed for {url}: {e}")))?;
        if !response.status().is_success() {
            return Err(AppError::remote(format!(
                "Download failed with status {} for {url}.",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .map_err(|e| AppError::remote(format!("Failed to read download body for {url}: {e}")))?;

        fs::write(dest, &bytes).map_err(|e| {
            AppError::input(format!("Failed to write '{}': {e}", dest.display()))
        })
    }

    /// Download every CSV of the archive folder into `raw_dir`.
    ///
    /// Returns the number of files fetched.
    pub fn fetch_case_archive(&self, contents_url: &str, raw_dir: &Path) -> Result<usize, AppError> {
        let files = self.list_csv_files(contents_url)?;
        if files.is_empty() {
            return Err(AppError::remote(format!(
                "No CSV files found in the archive folder {contents_url}."
            )));
        }

        for file in &files {
            let url = file.download_url.as_deref().ok_or_else(|| {
                AppError::remote(format!("No download URL for '{}'.", file.name))
            })?;
            self.download_csv(url, &raw_dir.join(&file.name))?;
        }

        Ok(files.len())
    }
}

fn csv_entries(entries: Vec<RepoFile>) -> Vec<RepoFile> {
    entries
        .into_iter()
        .filter(|e| e.kind == "file" && e.name.ends_with(".csv"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_entries_keeps_only_csv_files() {
        let entries = vec![
            RepoFile {
                name: "time_series_covid19_confirmed_global.csv".to_string(),
                kind: "file".to_string(),
                download_url: Some("https://example.test/confirmed.csv".to_string()),
            },
            RepoFile {
                name: "README.md".to_string(),
                kind: "file".to_string(),
                download_url: Some("https://example.test/README.md".to_string()),
            },
            RepoFile {
                name: "archive".to_string(),
                kind: "dir".to_string(),
                download_url: None,
            },
        ];

        let kept = csv_entries(entries);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "time_series_covid19_confirmed_global.csv");
    }

    #[test]
    fn repo_file_deserializes_from_contents_api_json() {
        let json = r#"{
            "name": "time_series_covid19_deaths_global.csv",
            "path": "csse_covid_19_data/csse_covid_19_time_series/time_series_covid19_deaths_global.csv",
            "type": "file",
            "download_url": "https://raw.example.test/deaths.csv"
        }"#;
        let file: RepoFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.kind, "file");
        assert_eq!(
            file.download_url.as_deref(),
            Some("https://raw.example.test/deaths.csv")
        );
    }
}
