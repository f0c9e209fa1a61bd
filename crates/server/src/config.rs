use std::{collections::HashMap, fs};

/// Relay settings. The upstream credential deliberately has no default and
/// no config-file key: it is supplied through the environment on the relay
/// host only, never in client-side code or checked-in files.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub upstream_url: String,
    pub upstream_api_key: Option<String>,
    pub upstream_model: String,
    pub system_prompt: String,
    pub http_referer: String,
    pub app_title: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8787".into(),
            upstream_url: "https://openrouter.ai/api/v1".into(),
            upstream_api_key: None,
            upstream_model: "deepseek/deepseek-chat-v3-0324:free".into(),
            system_prompt: "You are a helpful medical assistant for PulseCheck. \
                            Provide accurate health information but always recommend \
                            consulting a doctor for serious concerns. Be friendly and \
                            professional."
                .into(),
            http_referer: "https://pulsecheck.local/".into(),
            app_title: "PulseCheck".into(),
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("relay.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            apply_file_overrides(&mut settings, &file_cfg);
        }
    }

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());

    settings
}

fn apply_file_overrides(settings: &mut Settings, file_cfg: &HashMap<String, String>) {
    if let Some(v) = file_cfg.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = file_cfg.get("upstream_url") {
        settings.upstream_url = v.clone();
    }
    if let Some(v) = file_cfg.get("upstream_model") {
        settings.upstream_model = v.clone();
    }
    if let Some(v) = file_cfg.get("system_prompt") {
        settings.system_prompt = v.clone();
    }
    if let Some(v) = file_cfg.get("http_referer") {
        settings.http_referer = v.clone();
    }
    if let Some(v) = file_cfg.get("app_title") {
        settings.app_title = v.clone();
    }
}

fn apply_env_overrides(settings: &mut Settings, get: impl Fn(&str) -> Option<String>) {
    if let Some(v) = get("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = get("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = get("UPSTREAM_URL") {
        settings.upstream_url = v;
    }
    if let Some(v) = get("APP__UPSTREAM_URL") {
        settings.upstream_url = v;
    }

    if let Some(v) = get("OPENROUTER_API_KEY") {
        settings.upstream_api_key = Some(v);
    }
    if let Some(v) = get("APP__UPSTREAM_API_KEY") {
        settings.upstream_api_key = Some(v);
    }

    if let Some(v) = get("UPSTREAM_MODEL") {
        settings.upstream_model = v;
    }
    if let Some(v) = get("APP__UPSTREAM_MODEL") {
        settings.upstream_model = v;
    }

    if let Some(v) = get("APP__SYSTEM_PROMPT") {
        settings.system_prompt = v;
    }
    if let Some(v) = get("APP__HTTP_REFERER") {
        settings.http_referer = v;
    }
    if let Some(v) = get("APP__APP_TITLE") {
        settings.app_title = v;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_carry_no_credential() {
        let settings = Settings::default();
        assert!(settings.upstream_api_key.is_none());
        assert_eq!(settings.upstream_url, "https://openrouter.ai/api/v1");
        assert_eq!(settings.upstream_model, "deepseek/deepseek-chat-v3-0324:free");
        assert!(settings.system_prompt.contains("consulting a doctor"));
    }

    #[test]
    fn file_overrides_apply_but_cannot_set_the_credential() {
        let mut settings = Settings::default();
        let mut file_cfg = HashMap::new();
        file_cfg.insert("bind_addr".to_string(), "0.0.0.0:9000".to_string());
        file_cfg.insert("upstream_model".to_string(), "test/model".to_string());
        file_cfg.insert("api_key".to_string(), "sk-should-be-ignored".to_string());

        apply_file_overrides(&mut settings, &file_cfg);

        assert_eq!(settings.server_bind, "0.0.0.0:9000");
        assert_eq!(settings.upstream_model, "test/model");
        assert!(settings.upstream_api_key.is_none());
    }

    #[test]
    fn env_overrides_take_precedence_and_supply_the_credential() {
        let mut settings = Settings::default();
        let env: HashMap<&str, &str> = HashMap::from([
            ("APP__BIND_ADDR", "127.0.0.1:9999"),
            ("OPENROUTER_API_KEY", "sk-test"),
            ("APP__UPSTREAM_URL", "http://127.0.0.1:1234"),
        ]);

        apply_env_overrides(&mut settings, |name| {
            env.get(name).map(|v| v.to_string())
        });

        assert_eq!(settings.server_bind, "127.0.0.1:9999");
        assert_eq!(settings.upstream_api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.upstream_url, "http://127.0.0.1:1234");
    }
}
