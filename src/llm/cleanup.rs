use std::sync::OnceLock;

use regex::Regex;

fn leading_fence() -> &'static Regex {
    static LEADING_FENCE: OnceLock<Regex> = OnceLock::new();
    LEADING_FENCE.get_or_init(|| {
        // tag followed by a newline, or a bare `json` tag glued to the payload
        Regex::new(r"^```(?:[\w+.-]*[ \t]*\r?\n|json)?").expect("fence pattern is valid")
    })
}

/// Normalizes raw model text: trims it and removes one enclosing code fence.
///
/// Applied by every generator so callers never see fences or padding.
pub fn clean_model_output(raw: &str) -> String {
    let mut cleaned = raw.trim();

    if let Some(found) = leading_fence().find(cleaned) {
        cleaned = &cleaned[found.end()..];
    }
    if let Some(stripped) = cleaned.strip_suffix("```") {
        cleaned = stripped;
    }

    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n[\"a?\", \"b?\", \"c?\"]\n```";
        assert_eq!(clean_model_output(raw), "[\"a?\", \"b?\", \"c?\"]");
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(clean_model_output("```\nhello\n```"), "hello");
    }

    #[test]
    fn strips_glued_json_tag() {
        assert_eq!(clean_model_output("```json[\"x\"]```"), "[\"x\"]");
    }

    #[test]
    fn strips_other_language_tags() {
        assert_eq!(clean_model_output("```text\nIce the burn? No.\n```"), "Ice the burn? No.");
    }

    #[test]
    fn trims_whitespace_without_fences() {
        assert_eq!(clean_model_output("  What should I do?\n\n"), "What should I do?");
    }

    #[test]
    fn only_one_pair_is_removed() {
        assert_eq!(clean_model_output("```\n```inner```\n```"), "```inner```");
    }

    #[test]
    fn trailing_fence_alone_is_removed() {
        assert_eq!(clean_model_output("answer text```"), "answer text");
    }
}
