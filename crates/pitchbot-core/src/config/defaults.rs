//! Default value functions used by serde for config deserialization.

pub fn default_name() -> String {
    "PitchBot".to_string()
}

pub fn default_data_dir() -> String {
    "~/.pitchbot".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_planner() -> String {
    "openai".to_string()
}

pub fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

pub fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

pub fn default_max_tokens() -> u32 {
    200
}

pub fn default_temperature() -> f32 {
    0.7
}

pub fn default_db_path() -> String {
    "~/.pitchbot/data/users.db".to_string()
}
