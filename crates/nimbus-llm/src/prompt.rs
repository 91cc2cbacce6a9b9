use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::ChatMessage;

/// How many trailing history turns ride along with each request.
pub const HISTORY_TURNS: usize = 4;

/// Everything the prompt builder needs to know about one request.
#[derive(Debug, Clone)]
pub struct PromptInputs<'a> {
    pub user_message: &'a str,
    /// What the user literally asked for, when a place was extracted.
    pub searched_location: Option<&'a str>,
    /// Display name of the place the data describes.
    pub location_used: Option<&'a str>,
    /// True when text-derived coordinates overrode the device location.
    pub location_switched: bool,
    /// Number of active alerts, when alerts were fetched.
    pub alert_count: Option<usize>,
    /// True when the user asked about alerts and a fetch was attempted.
    pub alerts_requested: bool,
    /// Educational topic when the message asks how weather works.
    pub educational_topic: Option<&'a str>,
    /// Full orchestration context, serialized verbatim into the prompt.
    pub context: serde_json::Value,
}

const STYLE_GUIDE: &str = r#"RESPONSE STYLE REQUIREMENTS:
✨ Be conversational, friendly, and enthusiastic about weather
🎯 Use emojis strategically to break up text and add visual interest
📝 Write in short, digestible paragraphs (2-3 sentences max per paragraph)
🚫 NEVER use asterisks (*) for emphasis - use emojis instead
📋 Use bullet points or numbered lists when explaining multiple concepts
💬 Sound like you're talking to a friend, not writing a textbook
🎨 Make complex topics feel approachable and exciting

FORMATTING GUIDELINES:
• Start responses with a relevant emoji
• Break long explanations into short paragraphs
• Use emojis as visual separators between topics
• End with encouragement or next steps
• Replace technical jargon with friendly explanations

EDUCATIONAL INSTRUCTIONS:
🎓 If this is an educational query, act as an excited weather teacher
📚 Break down complex concepts into bite-sized, easy chunks
🔍 Tell users exactly what to look for in weather imagery
⚡ Use analogies and real-world comparisons to make concepts stick
🎯 Focus on practical, useful knowledge they can apply

WEATHER REPORTING INSTRUCTIONS:
🌡️ If reporting current weather, be descriptive and paint a picture
⚠️ If there are weather alerts, lead with safety first (use warning emojis)
📍 If user asked about a specific location, acknowledge it clearly
🔄 If location was switched, briefly mention the change

Examples of friendly formatting:
❌ BAD: "The temperature is 75°F with humidity at 60% and wind speeds of 15 mph."
✅ GOOD: "It's a lovely 75°F out there! 🌤️ The humidity is sitting at a comfortable 60%, and there's a nice 15 mph breeze to keep things fresh. Perfect weather for being outside! ☀️"

❌ BAD: "*Radar reflectivity shows precipitation intensity*"
✅ GOOD: "🌧️ Let me break down radar reflectivity for you! This colorful display shows how heavy the precipitation is..."

Remember: Weather should be exciting and approachable, not intimidating! 🎉"#;

/// Builds the full system prompt: persona, per-request context lines,
/// the serialized data context, and the static style guide.
pub fn system_prompt(inputs: &PromptInputs<'_>) -> String {
    let context_info = context_lines(inputs);
    let weather_json =
        serde_json::to_string_pretty(&inputs.context).unwrap_or_else(|_| "{}".to_string());

    format!(
        "You are a friendly, enthusiastic weather assistant and meteorology educator! 🌤️\n\n{context_info}\n\nWeather Data Context: {weather_json}\n\n{STYLE_GUIDE}"
    )
}

/// Assembles the transcript for one attempt: system prompt, the last few
/// history turns, then the new user message.
pub fn build_messages(
    system_prompt: &str,
    history: &[ChatMessage],
    user_message: &str,
) -> Vec<ChatMessage> {
    let recent = &history[history.len().saturating_sub(HISTORY_TURNS)..];

    let mut messages = Vec::with_capacity(recent.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(recent.iter().cloned());
    messages.push(ChatMessage::user(user_message));
    messages
}

fn context_lines(inputs: &PromptInputs<'_>) -> String {
    let mut info = String::new();

    if let Some(searched) = inputs.searched_location {
        info.push_str(&format!("\nUser asked about: \"{searched}\""));
    }
    if let Some(used) = inputs.location_used {
        info.push_str(&format!("\nProviding data for: {used}"));
    }
    if inputs.location_switched {
        info.push_str(
            "\nNote: User switched from their current location to search for a specific place.",
        );
    }

    match inputs.alert_count {
        Some(count) if count > 0 => {
            info.push_str(&format!(
                "\nIMPORTANT: There are {count} active weather alerts for this location!"
            ));
        }
        _ if inputs.alerts_requested => {
            info.push_str("\nNote: User asked about alerts/warnings, but none are currently active.");
        }
        _ => {}
    }

    if let Some(topic) = inputs.educational_topic {
        info.push_str(&format!(
            "\nEDUCATIONAL QUERY: This is a weather education question about {topic}."
        ));
        if let Some(guidance) = educational_guidance(topic, inputs.user_message) {
            info.push_str(&format!("\nEDUCATIONAL GUIDANCE: {guidance}"));
        }
    }

    info
}

struct TopicGuidance {
    topic: &'static str,
    patterns: Vec<Regex>,
    guidance: &'static str,
}

static TOPIC_GUIDANCE: Lazy<Vec<TopicGuidance>> = Lazy::new(|| {
    let compile = |patterns: &[&str]| -> Vec<Regex> {
        patterns
            .iter()
            .map(|p| Regex::new(p).expect("hardcoded pattern"))
            .collect()
    };

    vec![
        TopicGuidance {
            topic: "tornado",
            patterns: compile(&[
                r"(?i)how.*read.*radar",
                r"(?i)radar.*tornado",
                r"(?i)hook.*echo",
                r"(?i)velocity.*couplet",
            ]),
            guidance: "Make this exciting! Focus on the detective work of tornado spotting. Use emojis like 🌪️🔍📡 and break down radar signatures into simple, visual terms. Compare patterns to everyday objects they'd recognize.",
        },
        TopicGuidance {
            topic: "hurricane",
            patterns: compile(&[
                r"(?i)hurricane.*structure",
                r"(?i)eye.*wall",
                r"(?i)satellite.*image",
                r"(?i)spiral.*band",
            ]),
            guidance: "Hurricane structure is like nature's architecture! Use emojis like 🌀👁️⛈️ and compare parts to familiar things (eye = calm center of a sports stadium, eyewall = walls of the stadium with the loudest fans). Make it visual and memorable.",
        },
        TopicGuidance {
            topic: "radar_reading",
            patterns: compile(&[
                r"(?i)how.*read.*radar",
                r"(?i)radar.*color",
                r"(?i)reflectivity",
                r"(?i)velocity",
            ]),
            guidance: "Radar is like weather vision! Use color emojis 🟢🟡🔴 and relate colors to everyday intensity levels (green = light sprinkle, yellow = steady rain you'd need an umbrella for, red = stay inside weather). Make it practical and relatable.",
        },
        TopicGuidance {
            topic: "thunderstorm",
            patterns: compile(&[
                r"(?i)supercell",
                r"(?i)storm.*structure",
                r"(?i)updraft",
                r"(?i)downdraft",
            ]),
            guidance: "Storms are like atmospheric skyscrapers! Use building emojis 🏗️⛈️💨 and compare updrafts/downdrafts to elevators. Make storm types sound like different personalities or characters.",
        },
        TopicGuidance {
            topic: "winter_weather",
            patterns: compile(&[
                r"(?i)snow.*radar",
                r"(?i)ice.*storm",
                r"(?i)winter.*weather",
            ]),
            guidance: "Winter weather is nature's art! Use seasonal emojis ❄️🌨️🧊 and explain how different temperatures create different 'flavors' of winter precipitation. Make temperature profiles relatable to cooking or baking analogies.",
        },
    ]
});

/// Topic-specific coaching for the model, only when the message drills
/// into that topic's specifics.
fn educational_guidance(topic: &str, user_message: &str) -> Option<&'static str> {
    let entry = TOPIC_GUIDANCE.iter().find(|g| g.topic == topic)?;
    entry
        .patterns
        .iter()
        .any(|p| p.is_match(user_message))
        .then_some(entry.guidance)
}
