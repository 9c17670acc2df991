//! Prompt templates for the classification model.

use chrono::NaiveDate;

/// System prompt for sorting bullets into knowledge categories.
pub const CATEGORIZE_SYSTEM: &str = "\
You sort short notes from meeting documents into project knowledge categories.
Reply with a single JSON object with exactly these keys: \
\"credentials\", \"contacts\", \"links\", \"decisions\", \"other\". \
Each value is an array of strings.
- credentials: logins, passwords, API keys, account ids. Format as \"service: detail\".
- contacts: people with an email, phone or role. Format as \"Name - detail\".
- links: URLs and references to documents. Keep the URL intact.
- decisions: things that were decided or agreed.
- other: anything else worth keeping.
Every input line must appear in exactly one array. Keep the original wording. \
Do not invent content.";

/// System prompt for splitting free text into tasks.
pub const PARSE_TASKS_SYSTEM: &str = "\
You turn free-form to-do text into structured tasks.
Reply with a single JSON object of the form {\"tasks\": [...]}. Each task has:
- \"title\": short imperative title (required)
- \"project\": project name if one is clearly mentioned, else null
- \"priority\": \"High\", \"Medium\" or \"Low\", or null if not implied
- \"due\": due date as YYYY-MM-DD, or null
- \"context\": any remaining detail, or an empty string
Return at least one task.";

/// User prompt for categorization: one bullet per line.
pub fn categorize_prompt(bullets: &[String]) -> String {
    let mut prompt = String::from("Notes:\n");
    for bullet in bullets {
        prompt.push_str("- ");
        prompt.push_str(bullet);
        prompt.push('\n');
    }
    prompt
}

/// User prompt for task parsing, anchored to `today` for relative dates.
pub fn parse_tasks_prompt(text: &str, today: NaiveDate, projects: &[String]) -> String {
    let mut prompt = format!("Today is {} ({}).\n", today.format("%Y-%m-%d"), today.format("%A"));
    if !projects.is_empty() {
        prompt.push_str(&format!("Known projects: {}.\n", projects.join(", ")));
    }
    prompt.push_str("Text:\n");
    prompt.push_str(text.trim());
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_prompt_lists_bullets() {
        let prompt = categorize_prompt(&["a".to_string(), "b".to_string()]);
        assert_eq!(prompt, "Notes:\n- a\n- b\n");
    }

    #[test]
    fn test_parse_tasks_prompt_includes_date_and_projects() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let prompt = parse_tasks_prompt("  call bank ", today, &["HubSpot".to_string()]);
        assert!(prompt.starts_with("Today is 2026-10-17 (Saturday)."));
        assert!(prompt.contains("Known projects: HubSpot."));
        assert!(prompt.ends_with("Text:\ncall bank"));
    }

    #[test]
    fn test_system_prompts_name_every_category() {
        for key in ["credentials", "contacts", "links", "decisions", "other"] {
            assert!(CATEGORIZE_SYSTEM.contains(key));
        }
    }
}
