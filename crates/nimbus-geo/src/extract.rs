use once_cell::sync::Lazy;
use regex::Regex;

/// A location candidate pulled out of a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Cleaned candidate text, lowercased.
    pub text: String,
    /// True when only the whole-message fallback matched, not one of the
    /// explicit phrasing templates. Bare candidates are weaker evidence
    /// and do not suppress the educational classification.
    pub bare: bool,
}

// Phrasing templates in decreasing order of confidence. The first capture
// that survives cleanup wins.
static TEMPLATES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // "weather in boston", "alerts for denver"
        r"^(?:weather|forecast|temperature|temp|conditions?|alerts?|warnings?)\s+(?:in|for|at|near)\s+([a-z\s,.-]+?)\s*[?.!]*\s*$",
        // "show me the weather in tokyo"
        r"(?:show|give|tell)\s+me\s+(?:the\s+)?(?:weather|forecast|conditions?)\s+(?:in|for|at|near)\s+([a-z\s,.-]+?)\s*[?.!;]*\s*$",
        // "what's the weather like in paris"
        r"(?:what'?s|how'?s)\s+(?:the\s+)?(?:weather|forecast|conditions?)\s+(?:like\s+)?(?:in|for|at|near)\s+([a-z\s,.-]+?)\s*[?.!;]*\s*$",
        // "the forecast for san diego"
        r"(?:weather|forecast|conditions?|temperature|temp)\s+(?:for|in|at|near)\s+([a-z\s,.-]+?)\s*[?.!;]*\s*$",
        // "london weather"
        r"^([a-z\s,.-]+?)\s+(?:weather|forecast|conditions?|temperature|temp)(?:\s|[?.!;]|$)",
        // "in seattle, how's the weather"
        r"^(?:in|at|for|near)\s+([a-z\s,.-]+?)(?:\s*,?\s*(?:weather|forecast|how|what|is|are|show|tell))",
        // "how is chicago today"
        r"how\s+(?:is|are)\s+(?:the\s+)?(?:weather\s+(?:in|at|for)\s+)?([a-z\s,.-]+?)\s*[?.!;]*\s*$",
        // "does miami have any storms"
        r"does\s+([a-z\s,.-]+?)\s+have\s+(?:any\s+)?(?:weather|storms?|rain|snow)",
        // "any alerts in denver", "tornado watch for denver"
        r"(?:alerts?|warnings?|watch(?:es)?|advisor(?:y|ies))\s+(?:in|for|at|near)\s+([a-z\s,.-]+?)\s*[?.!;]*\s*$",
        // "switch to miami", "now check boston"
        r"(?:now\s+(?:check|show)|switch\s+to|change\s+to)\s+([a-z\s,.-]+?)\s*[?.!;]*\s*$",
        // "update for boston"
        r"update\s+(?:for|in|at)\s+([a-z\s,.-]+?)\s*[?.!;]*\s*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("hardcoded template"))
    .collect()
});

// Whole-message fallback for bare place names like "tokyo" or
// "denver, colorado". Gated further by MAX_CANDIDATE_WORDS.
static BARE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z][a-z\s,.-]{2,}?)\s*[?.!]*\s*$").expect("hardcoded template"));

static FILLER_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(the|this|that|please|also|too|today|tonight|tomorrow|now|currently|right|how|what|when|where|why|is|are|it|like)\b",
    )
    .expect("hardcoded template")
});

static TRAILING_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?.!;]+$").expect("hardcoded template"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("hardcoded template"));

// Candidates rejected outright: conversational fillers, greetings, and
// weather vocabulary that survive a template capture but never name a
// place.
const EXCLUDED_WORDS: &[&str] = &[
    "here",
    "there",
    "good",
    "bad",
    "like",
    "going",
    "doing",
    "fine",
    "nice",
    "great",
    "awful",
    "terrible",
    "outside",
    "inside",
    "home",
    "work",
    "office",
    "weather",
    "forecast",
    "conditions",
    "condition",
    "temperature",
    "temp",
    "alert",
    "alerts",
    "warning",
    "warnings",
    "hot",
    "cold",
    "warm",
    "cool",
    "thanks",
    "thank you",
    "hello",
    "hi",
    "hey",
    "ok",
    "okay",
    "yes",
    "no",
    "maybe",
    "sure",
    "sorry",
    "bye",
    "goodbye",
    "help",
    "good morning",
    "good afternoon",
    "good evening",
    "good night",
];

// Real place names run at most a few words; anything longer is sentence
// fragments the templates picked up by accident.
const MAX_CANDIDATE_WORDS: usize = 4;

/// Pulls a location candidate out of a chat message, if any phrasing
/// template matches. Pure and deterministic: the same message always
/// yields the same candidate.
pub fn extract_location(message: &str) -> Option<Extraction> {
    let lower = message.to_lowercase();
    let lower = lower.trim();

    for template in TEMPLATES.iter() {
        if let Some(caps) = template.captures(lower) {
            // A capture that cleanup rejects falls through to the next
            // template, same as a non-match.
            if let Some(text) = clean_candidate(&caps[1]) {
                return Some(Extraction { text, bare: false });
            }
        }
    }

    let caps = BARE_NAME.captures(lower)?;
    let raw = caps.get(1)?.as_str();
    if raw.split_whitespace().count() > MAX_CANDIDATE_WORDS {
        return None;
    }
    let text = clean_candidate(raw)?;
    Some(Extraction { text, bare: true })
}

fn clean_candidate(raw: &str) -> Option<String> {
    let cleaned = FILLER_WORDS.replace_all(raw, "");
    let cleaned = TRAILING_PUNCT.replace(&cleaned, "");
    let cleaned = WHITESPACE.replace_all(&cleaned, " ");
    let cleaned = cleaned
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string();

    if cleaned.len() <= 1 {
        return None;
    }
    if cleaned.split_whitespace().count() > MAX_CANDIDATE_WORDS {
        return None;
    }
    if EXCLUDED_WORDS.iter().any(|w| *w == cleaned) {
        return None;
    }
    Some(cleaned)
}
