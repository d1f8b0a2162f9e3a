use std::{collections::HashMap, fs, path::PathBuf};

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub data_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8750".into(),
            data_dir: PathBuf::from("./data"),
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("chartfolio.toml") {
        apply_file_config(&mut settings, &raw);
    }

    if let Ok(v) = std::env::var("CHARTFOLIO_BIND_ADDR") {
        settings.bind_addr = v;
    }
    if let Ok(v) = std::env::var("CHARTFOLIO_DATA_DIR") {
        settings.data_dir = PathBuf::from(v);
    }

    settings
}

fn apply_file_config(settings: &mut Settings, raw: &str) {
    if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
        if let Some(v) = file_cfg.get("bind_addr") {
            settings.bind_addr = v.clone();
        }
        if let Some(v) = file_cfg.get("data_dir") {
            settings.data_dir = PathBuf::from(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_overrides_defaults() {
        let mut settings = Settings::default();
        apply_file_config(
            &mut settings,
            "bind_addr = \"0.0.0.0:9000\"\ndata_dir = \"/srv/chartfolio\"\n",
        );
        assert_eq!(settings.bind_addr, "0.0.0.0:9000");
        assert_eq!(settings.data_dir, PathBuf::from("/srv/chartfolio"));
    }

    #[test]
    fn unknown_keys_and_invalid_toml_are_ignored() {
        let mut settings = Settings::default();
        apply_file_config(&mut settings, "unrelated = \"x\"\n");
        apply_file_config(&mut settings, "not toml at all [");
        assert_eq!(settings.bind_addr, Settings::default().bind_addr);
        assert_eq!(settings.data_dir, Settings::default().data_dir);
    }
}
