//! Reply post-processing.
//!
//! Generated text arrives with artifacts the style guide forbids:
//! asterisk emphasis, stalling phrases, and emoji whose variation
//! selector was lost in transit, leaving a base symbol followed by a
//! literal question mark. `Sanitizer::polish` repairs all of that and
//! decorates the reply from the orchestration context.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use crate::context::OrchestrationContext;

static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").expect("hardcoded pattern"));

static STALLING: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)let me (?:check|gather|look up|find|get|fetch).*?information",
        r"(?i)i'll (?:check|gather|look up|find|get|fetch).*?for you",
        r"(?i)hold on while i.*?",
        r"(?i)checking.*?data.*?",
        r"(?i)gathering.*?information.*?",
        r"(?i)looking up.*?",
        r"(?i)fetching.*?data.*?",
        r"(?i)please wait while.*?",
        r"(?i)one moment while.*?",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("hardcoded pattern"))
    .collect()
});

static EXTRA_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\n\n+").expect("hardcoded pattern"));

static SENTENCE_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.([A-Z])").expect("hardcoded pattern"));

// Substitutions in application order. The left side is a base symbol
// followed by a literal '?', which is what a dropped U+FE0F variation
// selector renders as; the right side restores the selector only where
// the fully qualified form carries one. The bare '?' rules at the end
// catch symbols whose base character was lost entirely and must run
// after the specific rules.
const DEFAULT_PAIRS: &[(&str, &str)] = &[
    ("☀?", "☀\u{fe0f}"),
    ("⛅?", "⛅"),
    ("☁?", "☁\u{fe0f}"),
    ("🌧?", "🌧\u{fe0f}"),
    ("⛈?", "⛈\u{fe0f}"),
    ("❄?", "❄\u{fe0f}"),
    ("🌫?", "🌫\u{fe0f}"),
    ("💨?", "💨"),
    ("🔥?", "🔥"),
    ("🧊?", "🧊"),
    ("☂?", "☂\u{fe0f}"),
    ("🌡?", "🌡\u{fe0f}"),
    ("📚?", "📚"),
    ("🔍?", "🔍"),
    ("📡?", "📡"),
    ("🛰?", "🛰\u{fe0f}"),
    ("🌪?", "🌪\u{fe0f}"),
    ("🌀?", "🌀"),
    ("⚡?", "⚡"),
    ("⚠?", "⚠\u{fe0f}"),
    ("📍?", "📍"),
    ("⭐?", "⭐"),
    ("✨?", "✨"),
    ("✅?", "✅"),
    ("❌?", "❌"),
    ("➡?", "➡\u{fe0f}"),
    ("??", "☀\u{fe0f}"),
    ("? ", "☀\u{fe0f} "),
    ("?\n", "☀\u{fe0f}\n"),
    ("?\t", "☀\u{fe0f}\t"),
];

const EDUCATIONAL_CLOSINGS: [&str; 4] = [
    "\n\n📚 Keep exploring the fascinating world of weather! Feel free to ask more questions.",
    "\n\n⭐ Weather science is amazing when you understand it! What else would you like to learn?",
    "\n\n✅ Great question! Understanding weather patterns helps you stay safe and informed.",
    "\n\n📚 Weather education is so important! Ask me anything else you're curious about.",
];

const WEATHER_CLOSINGS: [&str; 4] = [
    "\n\n⭐ Stay weather-aware and have a great day!",
    "\n\n✅ Hope this helps with your weather planning!",
    "\n\n☀\u{fe0f} Anything else you'd like to know about the weather?",
    "\n\n⭐ Stay safe out there!",
];

const NEEDS_LOCATION_NOTE: &str = "\n\n📍 To get specific weather information, please allow \
                                   location access or tell me which city you'd like weather for!";

const UNAVAILABLE_NOTE: &str = "\n\n⚠\u{fe0f} Weather data is temporarily unavailable. Please \
                                try again in a few moments.";

const READY_FALLBACK: &str = "☀\u{fe0f} I'm ready to help with weather information or answer \
                              your weather questions! What would you like to know?";

/// Picks an index into a closing list of the given length.
pub type ClosingChooser = fn(usize) -> usize;

fn random_index(len: usize) -> usize {
    rand::thread_rng().gen_range(0..len)
}

/// Ordered symbol substitutions applied to every reply.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    pairs: Vec<(String, String)>,
}

impl SymbolTable {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Applies every substitution in table order.
    pub fn apply(&self, text: &str) -> String {
        self.pairs
            .iter()
            .fold(text.to_string(), |acc, (broken, fixed)| {
                acc.replace(broken.as_str(), fixed)
            })
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self {
            pairs: DEFAULT_PAIRS
                .iter()
                .map(|(broken, fixed)| ((*broken).to_string(), (*fixed).to_string()))
                .collect(),
        }
    }
}

/// Cleans up a generated reply and decorates it from the context.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    symbols: SymbolTable,
    pick: ClosingChooser,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self {
            symbols: SymbolTable::default(),
            pick: random_index,
        }
    }
}

impl Sanitizer {
    pub fn new(symbols: SymbolTable) -> Self {
        Self {
            symbols,
            pick: random_index,
        }
    }

    /// Replaces the pseudo-random closing chooser, mainly so tests can
    /// pin which closing line is appended.
    pub fn with_chooser(mut self, pick: ClosingChooser) -> Self {
        self.pick = pick;
        self
    }

    /// Polishes one generated reply.
    ///
    /// Steps, in order: strip emphasis and stalling phrases, repair
    /// symbols, prepend the alert and location banners, append the
    /// closing line and service notes, normalize whitespace, and fall
    /// back to a canned line when almost nothing is left.
    pub fn polish(&self, raw: &str, context: &OrchestrationContext) -> String {
        let mut text = EMPHASIS.replace_all(raw, "$1").into_owned();
        text = text.replace("**", "");
        for phrase in STALLING.iter() {
            text = phrase.replace_all(&text, "").into_owned();
        }

        text = self.symbols.apply(&text);

        if context.weather.as_ref().is_some_and(|w| w.alert_count() > 0) {
            text = format!("⚠\u{fe0f} WEATHER ALERT ⚠\u{fe0f}\n\n{text}");
        }
        if context.has_location_switch {
            if let Some(used) = &context.location_used {
                text = format!("📍 Showing weather for {used}\n\n{text}");
            }
        }

        if context.intent.is_educational {
            text.push_str(EDUCATIONAL_CLOSINGS[(self.pick)(EDUCATIONAL_CLOSINGS.len())]);
        } else if context.weather.as_ref().is_some_and(|w| w.has_conditions()) {
            text.push_str(WEATHER_CLOSINGS[(self.pick)(WEATHER_CLOSINGS.len())]);
        }
        if context.needs_location {
            text.push_str(NEEDS_LOCATION_NOTE);
        }
        if context.weather.as_ref().is_some_and(|w| w.unavailable.is_some()) {
            text.push_str(UNAVAILABLE_NOTE);
        }

        text = EXTRA_NEWLINES.replace_all(&text, "\n\n").into_owned();
        text = SENTENCE_GAP.replace_all(&text, ". $1").into_owned();
        let text = text.trim();

        if text.chars().count() < 10 {
            return READY_FALLBACK.to_string();
        }
        text.to_string()
    }
}
