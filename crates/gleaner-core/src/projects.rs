//! Project catalog and project inference.
//!
//! The catalog is an ordered list of projects with their keywords. Order is
//! significant: every lookup returns the first project that matches.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::{extract_override_token, normalize};
use crate::defaults::{FALLBACK_CONFIDENCE, KEYWORD_CONFIDENCE, OVERRIDE_CONFIDENCE};
use crate::error::{Error, Result};
use crate::keywords::{DEFAULT_PROJECTS, FALLBACK_PROJECT};
use crate::models::{ContentNode, InferenceSource, ProjectInference};

/// Environment variable pointing at a JSON project catalog.
pub const PROJECTS_FILE_ENV: &str = "GLEANER_PROJECTS_FILE";

/// One known project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl ProjectEntry {
    pub fn new(name: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| normalize(k)).collect(),
        }
    }

    fn matches_text(&self, lower: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && lower.contains(k.as_str()))
    }
}

/// Ordered project catalog plus the fallback project name.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectCatalog {
    projects: Vec<ProjectEntry>,
    fallback: String,
}

impl Default for ProjectCatalog {
    fn default() -> Self {
        Self {
            projects: DEFAULT_PROJECTS
                .iter()
                .map(|p| ProjectEntry::new(p.name, p.keywords))
                .collect(),
            fallback: FALLBACK_PROJECT.to_string(),
        }
    }
}

impl ProjectCatalog {
    pub fn new(projects: Vec<ProjectEntry>) -> Self {
        Self {
            projects: projects
                .into_iter()
                .map(|p| ProjectEntry {
                    keywords: p.keywords.iter().map(|k| normalize(k)).collect(),
                    name: p.name,
                })
                .collect(),
            fallback: FALLBACK_PROJECT.to_string(),
        }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// Parse a JSON array of `{ "name": ..., "keywords": [...] }`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let projects: Vec<ProjectEntry> = serde_json::from_str(json)?;
        if projects.is_empty() {
            return Err(Error::Config("project catalog is empty".to_string()));
        }
        Ok(Self::new(projects))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Load from `GLEANER_PROJECTS_FILE` when set, built-in table otherwise.
    pub fn from_env() -> Result<Self> {
        match std::env::var(PROJECTS_FILE_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                debug!(path = %path, "Loading project catalog from file");
                Self::from_file(path.trim())
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn projects(&self) -> &[ProjectEntry] {
        &self.projects
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Canonical spelling of a project name, matched case-insensitively.
    pub fn canonical(&self, name: &str) -> Option<&str> {
        let wanted = normalize(name);
        self.projects
            .iter()
            .find(|p| normalize(&p.name) == wanted)
            .map(|p| p.name.as_str())
    }

    /// First project with a keyword contained in `text`.
    pub fn match_keywords(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.projects
            .iter()
            .find(|p| p.matches_text(&lower))
            .map(|p| p.name.as_str())
    }

    /// First project whose name or a keyword matches the override token
    /// by substring in either direction, case-insensitively.
    pub fn resolve_override_token(&self, token: &str) -> Option<&str> {
        let token = normalize(token);
        if token.is_empty() {
            return None;
        }
        let related = |candidate: &str| {
            let candidate = normalize(candidate);
            !candidate.is_empty() && (candidate.contains(&token) || token.contains(&candidate))
        };
        self.projects
            .iter()
            .find(|p| related(&p.name) || p.keywords.iter().any(|k| related(k)))
            .map(|p| p.name.as_str())
    }

    /// Project detected from free-text lines, checking projects in catalog
    /// order against all lines. Returns the fallback and `false` on a miss.
    pub fn detect_from_lines<'a, I>(&self, lines: I) -> (String, bool)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let haystack = lines
            .into_iter()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("\n");

        match self.match_keywords(&haystack) {
            Some(name) => (name.to_string(), true),
            None => {
                warn!(fallback = %self.fallback, "No project keyword matched, using fallback project");
                (self.fallback.clone(), false)
            }
        }
    }

    /// Infer the project of a document.
    ///
    /// An override tag naming a known project wins with full confidence.
    /// Otherwise the title is tested against the keyword table. Nothing
    /// matching yields the fallback with zero confidence.
    pub fn infer(&self, title: &str, nodes: &[ContentNode]) -> ProjectInference {
        let overridden = nodes
            .iter()
            .filter(|n| !n.kind.is_heading())
            .filter_map(|n| n.kind.text())
            .filter_map(extract_override_token)
            .find_map(|token| self.resolve_override_token(&token).map(str::to_string));

        if let Some(project) = overridden {
            debug!(project = %project, "Project resolved from override tag");
            return ProjectInference {
                project,
                confidence: OVERRIDE_CONFIDENCE,
                source: InferenceSource::Override,
            };
        }

        if let Some(project) = self.match_keywords(title) {
            debug!(project = %project, title = %title, "Project resolved from title keyword");
            return ProjectInference {
                project: project.to_string(),
                confidence: KEYWORD_CONFIDENCE,
                source: InferenceSource::Keyword,
            };
        }

        debug!(title = %title, fallback = %self.fallback, "No project matched");
        ProjectInference {
            project: self.fallback.clone(),
            confidence: FALLBACK_CONFIDENCE,
            source: InferenceSource::Fallback,
        }
    }
}

/// True when an inferred project is too uncertain to trust unreviewed.
pub fn needs_review(confidence: f32, threshold: f32) -> bool {
    confidence < threshold
}
