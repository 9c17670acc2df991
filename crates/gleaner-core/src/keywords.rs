//! Keyword tables used by the text classifiers.
//!
//! Tables are plain data; the matching logic lives in [`crate::classify`]
//! and [`crate::projects`]. Order matters wherever "first match wins".

/// A project and the lowercase keywords that identify it.
#[derive(Debug, Clone, Copy)]
pub struct ProjectKeywords {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

/// Built-in project catalog, in match order.
pub const DEFAULT_PROJECTS: &[ProjectKeywords] = &[
    ProjectKeywords {
        name: "ClickUp",
        keywords: &["clickup", "click up"],
    },
    ProjectKeywords {
        name: "HubSpot",
        keywords: &["hubspot", "hub spot", "crm"],
    },
    ProjectKeywords {
        name: "Website",
        keywords: &["website", "landing page", "webflow", "seo"],
    },
    ProjectKeywords {
        name: "Finance",
        keywords: &["invoice", "budget", "quickbooks", "payroll", "expense"],
    },
    ProjectKeywords {
        name: "Hiring",
        keywords: &["hiring", "candidate", "interview", "recruit"],
    },
];

/// Project assigned when nothing matches.
pub const FALLBACK_PROJECT: &str = "General";

/// Prefix of the explicit project override tag, e.g. `#proj:hubspot`.
pub const OVERRIDE_TAG_PREFIX: &str = "#proj:";

/// Phrases that raise a task to high priority.
pub const HIGH_PRIORITY: &[&str] = &[
    "urgent",
    "asap",
    "critical",
    "important",
    "high priority",
    "!!",
];

/// Phrases that lower a task to low priority.
pub const LOW_PRIORITY: &[&str] = &["low priority", "someday", "eventually", "nice to have"];

/// Phrases marking a line as a credential.
pub const CREDENTIAL_TERMS: &[&str] = &[
    "password",
    "passcode",
    "api key",
    "apikey",
    "token",
    "secret",
    "username",
    "login",
    "credential",
];

/// Phrases marking a line as a decision.
pub const DECISION_TERMS: &[&str] = &["decided", "decision", "agreed", "we will"];

/// Glyphs users type in place of real list items.
pub const BULLET_GLYPHS: &[char] = &['-', '*', '•', '–', '—', '·', '◦', '▪', '‣'];

/// Block types whose children may be owned by someone else; a failed
/// children fetch under one of these is skipped instead of propagated.
pub const FOREIGN_OWNED_KINDS: &[&str] = &["synced_block", "link_to_page", "unsupported"];
