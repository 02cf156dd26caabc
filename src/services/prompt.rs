// src/services/prompt.rs
use serde_json::Value;

const BASE_PROMPT: &str = "I need you to do some risk analysis for a bank. To do this, I need you to output several hypothetical future events with significant economic impact, for each of which I will then analyse their impact on the bank (myself). All of the scenarios should be completely independent of each other, so I can analyse each one of them by itself. Here are some examples:

**Pandemic**
A pandemic originates in Indonesia and quickly spreads around the world. Shops and manufacturing first shut down in Indonesia, but the virus spreads around the world quickly and causes a global lockdown. The lockdowns last for at least a year in most regions, until a vaccine is developed and distributed. The pandemic eventually ends, and the world returns to normal.

**Situation in Middle East escalates**
After Israel attacks Iran, a full-out war begins. Saudi Arabia backs Iran, which leads to Sanctions put on Saudi Arabia by the US. The fighting goes on for 2 years, and the war eventually ends with a ceasefire. The Sanctions are lifted.

Each object in the array that you output should be completely independent, and describe its own scenario from start to finish.
The scenario should read a bit like a newspaper article, and include details like names of banks, peoples, viruses, natural disasters etc.

Your events should all have a global impact, and should have an economic impact on at least the US.

An important thing is: NEVER state any economic consequences or impact in your scenario descriptions - since the economic impact is what I will analyse after that.
";

const CONTEXT_PROMPT: &str = "

Additionally, here is some context which serves as a rough direction in which your events should go. In case the context specifies a certain event, your first output object should detail that event from start to finish, and the subsequent objects should describe a completely independent event, that also involves the context but is different in the outcome. E.g. if the context is \"pandemic\", the output objects should all describe a completely different pandemic, with different speeds of spreading, different government measures etc.. As another example, if the context is \"credit suisse default\", you may describe several different events that involve a default of credit suisse, with the details being different. The first generated event should describe a standard issue bank bankruptcy, like lehman brothers. Never include the phrase \"vanilla scenario or lehman brothers\" in your output.

In the case of the prompt being \"war between israel and iran\", all events should different wars between israel and iran, with different outcomes.


The context is: ";

/// Builds the scenario-generation prompt, optionally steered by user context.
pub fn build_prompt(context: Option<&str>) -> String {
    let mut prompt = String::from(BASE_PROMPT);
    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str(CONTEXT_PROMPT);
        prompt.push_str(context);
    }
    prompt
}

/// Pulls the user context out of a `/api/chat` request body.
///
/// Accepts a bare JSON string, `null`, or an object carrying a `prompt` or
/// `context` field (the shape streaming-object clients send).
pub fn context_from_body(body: &Value) -> Option<String> {
    match body {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("context")
            .or_else(|| map.get("prompt"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
