use std::{collections::HashMap, fs, path::Path};

use client_core::SupabaseConfig;
use serde::Deserialize;
use tracing::warn;

pub const CONFIG_FILE: &str = "console.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub supabase_service_role_key: Option<String>,
    pub database_url: String,
    pub identity_page_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_anon_key: None,
            supabase_service_role_key: None,
            database_url: "sqlite://./data/console.db".into(),
            identity_page_size: 100,
        }
    }
}

impl Settings {
    /// Hosted backend settings, when a backend URL is configured.
    pub fn supabase_config(&self) -> Option<SupabaseConfig> {
        let url = self.supabase_url.clone()?;
        Some(SupabaseConfig {
            url,
            anon_key: self.supabase_anon_key.clone().unwrap_or_default(),
            service_role_key: self.supabase_service_role_key.clone(),
        })
    }
}

pub fn load_settings() -> Settings {
    let raw = fs::read_to_string(Path::new(CONFIG_FILE)).ok();
    resolve_settings(raw.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then the flat `console.toml` table, then environment
/// overrides. `APP__`-prefixed variables win over the bare names.
pub fn resolve_settings(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file_contents {
        match toml::from_str::<HashMap<String, String>>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("supabase_url") {
                    settings.supabase_url = non_empty(v.clone());
                }
                if let Some(v) = file_cfg.get("supabase_anon_key") {
                    settings.supabase_anon_key = non_empty(v.clone());
                }
                if let Some(v) = file_cfg.get("supabase_service_role_key") {
                    settings.supabase_service_role_key = non_empty(v.clone());
                }
                if let Some(v) = file_cfg.get("database_url") {
                    settings.database_url = v.clone();
                }
                if let Some(v) = file_cfg.get("identity_page_size") {
                    apply_page_size(&mut settings, v);
                }
            }
            Err(err) => warn!(error = %err, "ignoring unreadable {CONFIG_FILE}"),
        }
    }

    for key in ["SUPABASE_URL", "APP__SUPABASE_URL"] {
        if let Some(v) = env(key) {
            settings.supabase_url = non_empty(v);
        }
    }
    for key in ["SUPABASE_ANON_KEY", "APP__SUPABASE_ANON_KEY"] {
        if let Some(v) = env(key) {
            settings.supabase_anon_key = non_empty(v);
        }
    }
    for key in ["SUPABASE_SERVICE_ROLE_KEY", "APP__SUPABASE_SERVICE_ROLE_KEY"] {
        if let Some(v) = env(key) {
            settings.supabase_service_role_key = non_empty(v);
        }
    }
    for key in ["DATABASE_URL", "APP__DATABASE_URL"] {
        if let Some(v) = env(key) {
            settings.database_url = v;
        }
    }
    if let Some(v) = env("APP__IDENTITY_PAGE_SIZE") {
        apply_page_size(&mut settings, &v);
    }

    settings
}

fn apply_page_size(settings: &mut Settings, raw: &str) {
    match raw.trim().parse::<u32>() {
        Ok(parsed) if parsed > 0 => settings.identity_page_size = parsed,
        _ => warn!(value = raw, "ignoring invalid identity page size"),
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}
