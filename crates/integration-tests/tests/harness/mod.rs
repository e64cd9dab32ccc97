#![allow(dead_code)]

pub mod config;
pub mod mock_gateway;
pub mod server;

/// Parse SSE `data:` payloads from raw response text
pub fn parse_sse_data(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| line.starts_with("data: "))
        .map(|line| line.trim_start_matches("data: ").to_owned())
        .collect()
}

/// Decode every frame except the `[DONE]` terminator
pub fn sse_events(frames: &[String]) -> Vec<serde_json::Value> {
    frames
        .iter()
        .filter(|data| *data != "[DONE]")
        .map(|data| serde_json::from_str(data).expect("frame must be JSON"))
        .collect()
}
