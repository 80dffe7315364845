use engine::DialogueDef;
use rand::Rng;

pub(crate) const HARD_FALLBACK_LINE: &str = "Hmm. I'm not sure what to say to that.";
pub(crate) const HARD_GREETING_LINE: &str = "Hello there.";

/// Uniformly random line from the pool.
pub(crate) fn ambient_line<'a>(dialogue: Option<&'a DialogueDef>, rng: &mut impl Rng) -> &'a str {
    match dialogue {
        Some(def) if !def.lines.is_empty() => {
            let index = rng.gen_range(0..def.lines.len());
            &def.lines[index]
        }
        _ => HARD_GREETING_LINE,
    }
}

/// Reply to already-lowercased free text. The first rule with a keyword
/// contained in the input wins; otherwise the table's fallback. Never empty.
pub(crate) fn respond<'a>(dialogue: Option<&'a DialogueDef>, lowercased_input: &str) -> &'a str {
    let Some(def) = dialogue else {
        return HARD_FALLBACK_LINE;
    };
    def.replies
        .iter()
        .find(|rule| {
            rule.keywords
                .iter()
                .any(|keyword| !keyword.is_empty() && lowercased_input.contains(keyword.as_str()))
        })
        .map(|rule| rule.response.as_str())
        .or(def.fallback.as_deref())
        .filter(|line| !line.trim().is_empty())
        .unwrap_or(HARD_FALLBACK_LINE)
}
