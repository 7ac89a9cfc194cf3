//! Brainstorm instruction building and candidate extraction.
//!
//! Model output arrives as free text in whatever shape the model chose,
//! so [`parse_candidates`] tries a fixed ladder of layouts:
//!
//! 1. numbered list (`1.` / `1)`)
//! 2. bullet list (`-`, `*`, `•`)
//! 3. blank-line separated paragraphs
//! 4. individual lines longer than 20 characters
//!
//! The first layout that yields at least the requested count wins and is
//! truncated to that count. If none does, the whole reply becomes a single
//! candidate rather than losing the text.

use std::sync::OnceLock;

use regex::Regex;

fn numbered_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*\d+[.)]\s+").unwrap())
}

fn bullet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*[-*•]\s+").unwrap())
}

/// System and user instructions for a brainstorm request.
///
/// The system half pins the register (concise, print-poster-ready prompt
/// lines); the user half carries the concept, optional style, and optional
/// keyword list.
pub fn brainstorm_instructions(
    concept: &str,
    style: Option<&str>,
    keywords: &[String],
    count: usize,
) -> (String, String) {
    let system = format!(
        "You are a creative assistant for poster design. \
         Produce exactly {count} distinct image-generation prompts, \
         one per line as a numbered list. Each prompt must describe a \
         single printable poster composition in vivid, concrete language."
    );

    let mut user = format!("Concept: {concept}");
    if let Some(style) = style {
        user.push_str(&format!("\nStyle: {style}"));
    }
    if !keywords.is_empty() {
        user.push_str(&format!("\nKeywords: {}", keywords.join(", ")));
    }
    (system, user)
}

/// Extract up to `requested` candidate prompts from a model reply.
///
/// Never returns an empty vector for non-blank input: the whole-reply
/// fallback guarantees at least one candidate.
pub fn parse_candidates(text: &str, requested: usize) -> Vec<String> {
    let strategies: [fn(&str) -> Vec<String>; 4] = [
        split_numbered,
        split_bullets,
        split_paragraphs,
        long_lines,
    ];
    for strategy in strategies {
        let found = strategy(text);
        if found.len() >= requested && requested > 0 {
            return found.into_iter().take(requested).collect();
        }
    }

    let whole = text.trim();
    if whole.is_empty() {
        Vec::new()
    } else {
        vec![whole.to_string()]
    }
}

fn clean_fragments<I: IntoIterator<Item = S>, S: AsRef<str>>(parts: I) -> Vec<String> {
    parts
        .into_iter()
        .map(|p| p.as_ref().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn split_numbered(text: &str) -> Vec<String> {
    // Only treat the reply as a numbered list if a marker actually occurs;
    // Regex::split would otherwise return the whole text as one fragment.
    if !numbered_re().is_match(text) {
        return Vec::new();
    }
    clean_fragments(numbered_re().split(text))
}

fn split_bullets(text: &str) -> Vec<String> {
    if !bullet_re().is_match(text) {
        return Vec::new();
    }
    clean_fragments(bullet_re().split(text))
}

fn split_paragraphs(text: &str) -> Vec<String> {
    clean_fragments(text.split("\n\n"))
}

fn long_lines(text: &str) -> Vec<String> {
    clean_fragments(text.lines().filter(|line| line.trim().len() > 20))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_list_is_preferred() {
        let text = "1. A fox under neon rain\n2) A lighthouse at dawn\n3. Paper cranes in flight";
        let candidates = parse_candidates(text, 3);
        assert_eq!(
            candidates,
            vec![
                "A fox under neon rain",
                "A lighthouse at dawn",
                "Paper cranes in flight",
            ]
        );
    }

    #[test]
    fn result_is_truncated_to_requested_count() {
        let text = "1. one\n2. two\n3. three\n4. four";
        assert_eq!(parse_candidates(text, 2), vec!["one", "two"]);
    }

    #[test]
    fn bullets_are_used_when_numbering_is_absent() {
        let text = "- misty mountain ridge\n* koi pond at night\n• desert highway sunset";
        let candidates = parse_candidates(text, 3);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[1], "koi pond at night");
    }

    #[test]
    fn paragraphs_are_used_when_lists_are_absent() {
        let text = "A quiet harbor scene.\n\nAn alpine meadow in spring.";
        assert_eq!(
            parse_candidates(text, 2),
            vec!["A quiet harbor scene.", "An alpine meadow in spring."]
        );
    }

    #[test]
    fn long_lines_rescue_single_paragraph_replies() {
        // One paragraph, but two lines each over 20 chars
        let text = "a poster of a crimson maple tree\nan art deco city skyline at dusk";
        let candidates = parse_candidates(text, 2);
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn short_unstructured_reply_falls_back_to_whole_text() {
        let candidates = parse_candidates("just one idea", 3);
        assert_eq!(candidates, vec!["just one idea"]);
    }

    #[test]
    fn blank_reply_yields_nothing() {
        assert!(parse_candidates("   \n  ", 3).is_empty());
    }

    #[test]
    fn underfull_numbered_list_falls_through() {
        // Two numbered items but three requested: the ladder keeps going
        // and ends at the whole-reply fallback.
        let text = "1. one idea\n2. two idea";
        let candidates = parse_candidates(text, 3);
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].contains("one idea"));
    }

    #[test]
    fn instructions_carry_concept_style_and_keywords() {
        let (system, user) = brainstorm_instructions(
            "autumn forest",
            Some("watercolor"),
            &["maple".to_string(), "fog".to_string()],
            5,
        );
        assert!(system.contains("exactly 5"));
        assert!(user.contains("Concept: autumn forest"));
        assert!(user.contains("Style: watercolor"));
        assert!(user.contains("maple, fog"));
    }

    #[test]
    fn instructions_omit_absent_optionals() {
        let (_, user) = brainstorm_instructions("ocean", None, &[], 3);
        assert!(!user.contains("Style:"));
        assert!(!user.contains("Keywords:"));
    }
}
