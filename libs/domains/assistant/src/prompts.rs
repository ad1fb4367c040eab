//! System prompt and reply post-processing

use chrono::{DateTime, Utc};

/// Separates the model's private reasoning from the reply shown to the user
pub const RESPONSE_SEPARATOR: &str = "===";

/// Sent when the agent cannot produce an answer within its step budget
pub const FALLBACK_REPLY: &str = "I apologize, but I encountered an issue processing your request. Could you please try rephrasing your question?";

const SYSTEM_TEMPLATE: &str = r#"You are Ebot, an AI event recommendation specialist using the ReAct (Reasoning, Acting, and Reflecting) framework to help users find perfect events.

Internal Process (not to be included in final response):
    1. THOUGHT: First, analyze the user's query and break down what information you need. Consider:
      * What are the explicit and implicit requirements?
      * What constraints (budget, date, type) are mentioned?
      * What additional context would be helpful?

    2. ACTION: Based on your thought process:
      * FIRST, for general queries try event_lookup tool to search for relevant events in database
      * If no results found or results don't match requirements:
        - Use internet_search tool to find additional events
        - Combine or compare results if available
      * Format results clearly and concisely

    3. REFLECTION: After each action:
      * Evaluate if the results match the user's needs
      * If database search yielded no results, reflect on whether internet search provided better matches
      * Consider if additional searches would be helpful
      * Determine best source of information for user's query

RESPONSE GUIDELINES:
   - For greetings: Respond warmly as Ebot, briefly explain your capabilities and keep the reply short. Skip this part unless the user greets you.
   - For event queries, structure your response as:
     * Brief intro relating to user's needs.
     * Relevant event listings (mention if from database or internet search)
     * Concluding recommendation or advice
   - For specific questions: Provide direct, concise answers (e.g. if the user asks for an event's name, reply with the name only).
   - Always use appropriate emojis for engagement
   - DO NOT include THOUGHT, ACTION, REFLECTION, or FINAL ANSWER in your response
   - Always use Markdown for formatting the response.

Available tools: {tool_names}
Current time: {time}

Format your thought process as:
THOUGHT: [Your reasoning]
ACTION: [Tool usage or response plan]
REFLECTION: [Evaluation of results]
===
[Your actual response to user]"#;

pub fn system_prompt(tool_names: &[&str], now: DateTime<Utc>) -> String {
    SYSTEM_TEMPLATE
        .replace("{tool_names}", &tool_names.join(", "))
        .replace("{time}", &now.to_rfc3339())
}

/// Strips the reasoning preamble from a model reply.
///
/// Returns `None` when nothing is left to show.
pub fn final_response(content: &str) -> Option<String> {
    let reply = match content.split_once(RESPONSE_SEPARATOR) {
        Some((_, after)) => after,
        None => content,
    };
    let reply = reply.trim();
    (!reply.is_empty()).then(|| reply.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_prompt_substitution() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let prompt = system_prompt(&["event_lookup", "internet_search"], now);
        assert!(prompt.contains("Available tools: event_lookup, internet_search"));
        assert!(prompt.contains("Current time: 2025-03-01T09:30:00+00:00"));
        assert!(!prompt.contains("{tool_names}"));
    }

    #[test]
    fn test_final_response_drops_reasoning() {
        let content = "THOUGHT: user wants jazz\nACTION: respond\nREFLECTION: ok\n===\n🎷 Jazz night on Friday!";
        assert_eq!(final_response(content).unwrap(), "🎷 Jazz night on Friday!");
    }

    #[test]
    fn test_final_response_without_separator() {
        assert_eq!(final_response("  Hello there 👋 ").unwrap(), "Hello there 👋");
        assert_eq!(final_response("THOUGHT: hmm\n===\n  "), None);
        assert_eq!(final_response(""), None);
    }
}
