pub mod openai {
    pub const DEFAULT_MODEL: &str = "gpt-4o";
    pub const API_BASE: &str = "https://api.openai.com/v1";
    pub const CHAT_COMPLETIONS_ENDPOINT: &str = "/chat/completions";
}
