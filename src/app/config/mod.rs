use reqwest::Url;
use std::fs;
use std::path::{Path, PathBuf};

pub mod schema;

pub use schema::{
    AnimateFrom, BackgroundStyle, ConfigError, ConfigIssue, Flavour, Justify, Keyword,
    OverlayConfig, Params, ThemeColor, KNOWN_KEYS,
};

pub struct AppConfig; // Namespace only

impl AppConfig {
    pub fn get_config_dir() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("tunacard")
    }

    pub fn get_config_path() -> PathBuf {
        Self::get_config_dir().join("config.toml")
    }

    pub fn get_log_dir() -> PathBuf {
        let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("tunacard").join("logs")
    }

    /// Merge all parameter sources (file, then query string, then `--set`
    /// overrides; later wins) and validate the result in one go.
    ///
    /// An explicit `file` must exist; the default location is optional.
    pub fn load(
        file: Option<&Path>,
        query: Option<&str>,
        overrides: &[String],
    ) -> Result<OverlayConfig, ConfigError> {
        let mut params = Params::new();
        let mut issues = Vec::new();

        // 1. Config file
        let (path, required) = match file {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::get_config_path(), false),
        };
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => merge(&mut params, &mut issues, params_from_toml(&content, &path)),
                Err(e) => issues.push(ConfigIssue::new(&path.display().to_string(), e.to_string())),
            }
        } else if required {
            issues.push(ConfigIssue::new(
                &path.display().to_string(),
                "Config file does not exist",
            ));
        }

        // 2. Query string
        if let Some(q) = query {
            merge(&mut params, &mut issues, params_from_query(q));
        }

        // 3. Single overrides
        merge(&mut params, &mut issues, params_from_overrides(overrides));

        match OverlayConfig::from_params(&params) {
            Ok(config) if issues.is_empty() => Ok(config),
            Ok(_) => Err(ConfigError { issues }),
            Err(mut e) => {
                issues.append(&mut e.issues);
                Err(ConfigError { issues })
            }
        }
    }

    /// Starter `config.toml` holding every parameter at its default.
    pub fn generate_default() -> String {
        toml::to_string(&OverlayConfig::default().to_params()).unwrap_or_default()
    }
}

fn merge(params: &mut Params, issues: &mut Vec<ConfigIssue>, layer: Result<Params, Vec<ConfigIssue>>) {
    match layer {
        Ok(layer) => params.extend(layer),
        Err(mut errs) => issues.append(&mut errs),
    }
}

/// Flat TOML table; scalar values are stringified like query parameters.
pub fn params_from_toml(content: &str, origin: &Path) -> Result<Params, Vec<ConfigIssue>> {
    let table = toml::from_str::<toml::Table>(content)
        .map_err(|e| vec![ConfigIssue::new(&origin.display().to_string(), e.to_string())])?;

    let mut params = Params::new();
    let mut issues = Vec::new();
    for (key, value) in table {
        let text = match value {
            toml::Value::String(s) => s,
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            toml::Value::Boolean(b) => b.to_string(),
            _ => {
                issues.push(ConfigIssue::new(&key, "Expected a string, number or boolean"));
                continue;
            }
        };
        params.insert(key, text);
    }

    if issues.is_empty() {
        Ok(params)
    } else {
        Err(issues)
    }
}

/// `a=b&c=d`, with or without the leading `?`.
pub fn params_from_query(query: &str) -> Result<Params, Vec<ConfigIssue>> {
    let query = query.trim().trim_start_matches('?');
    let url = Url::parse(&format!("http://localhost/?{}", query))
        .map_err(|e| vec![ConfigIssue::new("query", e.to_string())])?;

    Ok(url
        .query_pairs()
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect())
}

/// Repeated `key=value` arguments.
pub fn params_from_overrides(pairs: &[String]) -> Result<Params, Vec<ConfigIssue>> {
    let mut params = Params::new();
    let mut issues = Vec::new();

    for pair in pairs {
        match pair.split_once('=') {
            Some((k, v)) if !k.trim().is_empty() => {
                params.insert(k.trim().to_string(), v.to_string());
            }
            _ => issues.push(ConfigIssue::new(pair, "Expected key=value")),
        }
    }

    if issues.is_empty() {
        Ok(params)
    } else {
        Err(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_toml_scalars_are_stringified() {
        let content = r#"
theme = "latte"
transitionTime = 750
alwaysShow = true
"#;
        let params = params_from_toml(content, Path::new("config.toml")).unwrap();
        assert_eq!(params["theme"], "latte");
        assert_eq!(params["transitionTime"], "750");
        assert_eq!(params["alwaysShow"], "true");
    }

    #[test]
    fn test_toml_rejects_tables() {
        let issues = params_from_toml("[colors]\nsong = \"red\"\n", Path::new("c.toml")).unwrap_err();
        assert_eq!(issues[0].path, "colors");
    }

    #[test]
    fn test_query_string() {
        let params = params_from_query("?theme=frappe&host=http%3A%2F%2F10.0.0.2&alwaysShow=true").unwrap();
        assert_eq!(params["theme"], "frappe");
        assert_eq!(params["host"], "http://10.0.0.2");
        assert_eq!(params["alwaysShow"], "true");
    }

    #[test]
    fn test_overrides() {
        let ok = params_from_overrides(&["port=9000".to_string(), "host=http://a=b".to_string()]).unwrap();
        assert_eq!(ok["port"], "9000");
        assert_eq!(ok["host"], "http://a=b");

        let err = params_from_overrides(&["nonsense".to_string()]).unwrap_err();
        assert_eq!(err[0].message, "Expected key=value");
    }

    #[test]
    fn test_load_layers_later_wins() {
        let dir = std::env::temp_dir().join(format!("tunacard-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("config.toml");
        fs::write(&file, "displayTime = 3000\ntheme = \"latte\"\n").unwrap();

        let config = AppConfig::load(
            Some(&file),
            Some("theme=macchiato"),
            &["displayTime=4000".to_string()],
        )
        .unwrap();
        assert_eq!(config.theme, Flavour::Macchiato);
        assert_eq!(config.display_time, Duration::from_millis(4000));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = AppConfig::load(Some(Path::new("/definitely/not/here.toml")), None, &[]).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].message, "Config file does not exist");
    }

    #[test]
    fn test_generated_default_parses_back() {
        let text = AppConfig::generate_default();
        let params = params_from_toml(&text, Path::new("generated")).unwrap();
        assert_eq!(OverlayConfig::from_params(&params).unwrap(), OverlayConfig::default());
    }
}
