use reqwest::Url;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Flat, string-typed parameter mapping (query-string style).
pub type Params = BTreeMap<String, String>;

/// One problem found while validating parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigIssue {
    pub path: String,
    pub message: String,
}

impl ConfigIssue {
    pub fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Configuration was rejected. Always carries at least one issue.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("There are {} error(s) with your configuration", .issues.len())]
pub struct ConfigError {
    pub issues: Vec<ConfigIssue>,
}

/// Enum-like parameter with a fixed set of string spellings.
pub trait Keyword: Sized + Copy + PartialEq + 'static {
    const VARIANTS: &'static [(&'static str, Self)];

    fn from_keyword(s: &str) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .find(|(k, _)| *k == s)
            .map(|(_, v)| *v)
    }

    fn keyword(&self) -> &'static str {
        Self::VARIANTS
            .iter()
            .find(|(_, v)| v == self)
            .map(|(k, _)| *k)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flavour {
    Latte,
    Frappe,
    Macchiato,
    #[default]
    Mocha,
}

impl Keyword for Flavour {
    const VARIANTS: &'static [(&'static str, Self)] = &[
        ("latte", Flavour::Latte),
        ("frappe", Flavour::Frappe),
        ("macchiato", Flavour::Macchiato),
        ("mocha", Flavour::Mocha),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundStyle {
    #[default]
    Blur,
    Solid,
}

impl Keyword for BackgroundStyle {
    const VARIANTS: &'static [(&'static str, Self)] =
        &[("blur", BackgroundStyle::Blur), ("solid", BackgroundStyle::Solid)];
}

/// Accent roles a user can pick for text, ring and glow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeColor {
    Rosewater,
    Flamingo,
    Pink,
    Mauve,
    Red,
    Maroon,
    Peach,
    Yellow,
    Green,
    Teal,
    Sky,
    Sapphire,
    Blue,
    Lavender,
    Text,
}

impl Keyword for ThemeColor {
    const VARIANTS: &'static [(&'static str, Self)] = &[
        ("rosewater", ThemeColor::Rosewater),
        ("flamingo", ThemeColor::Flamingo),
        ("pink", ThemeColor::Pink),
        ("mauve", ThemeColor::Mauve),
        ("red", ThemeColor::Red),
        ("maroon", ThemeColor::Maroon),
        ("peach", ThemeColor::Peach),
        ("yellow", ThemeColor::Yellow),
        ("green", ThemeColor::Green),
        ("teal", ThemeColor::Teal),
        ("sky", ThemeColor::Sky),
        ("sapphire", ThemeColor::Sapphire),
        ("blue", ThemeColor::Blue),
        ("lavender", ThemeColor::Lavender),
        ("text", ThemeColor::Text),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimateFrom {
    #[default]
    Top,
    Bottom,
}

impl Keyword for AnimateFrom {
    const VARIANTS: &'static [(&'static str, Self)] =
        &[("top", AnimateFrom::Top), ("bottom", AnimateFrom::Bottom)];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    Left,
    #[default]
    Center,
    Right,
}

impl Keyword for Justify {
    const VARIANTS: &'static [(&'static str, Self)] = &[
        ("left", Justify::Left),
        ("center", Justify::Center),
        ("right", Justify::Right),
    ];
}

/// Every accepted parameter name, in display order.
pub const KNOWN_KEYS: &[&str] = &[
    "theme",
    "backgroundStyle",
    "artistColor",
    "songColor",
    "accentColor",
    "albumColor",
    "transitionTime",
    "textFadeTime",
    "displayTime",
    "animateFrom",
    "justify",
    "alwaysShow",
    "refreshInterval",
    "host",
    "port",
    "useLocalFile",
    "viewportWidth",
];

/// Validated overlay settings, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    pub theme: Flavour,
    pub background_style: BackgroundStyle,
    pub artist_color: ThemeColor,
    pub song_color: ThemeColor,
    pub accent_color: ThemeColor,
    pub album_color: ThemeColor,
    /// Container slide/resize duration
    pub transition_time: Duration,
    /// Text and artwork crossfade duration
    pub text_fade_time: Duration,
    /// How long the card holds on screen
    pub display_time: Duration,
    pub animate_from: AnimateFrom,
    pub justify: Justify,
    pub always_show: bool,
    pub refresh_interval: Duration,
    pub host: String,
    pub port: u16,
    pub use_local_file: bool,
    pub viewport_width: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            theme: Flavour::Mocha,
            background_style: BackgroundStyle::Blur,
            artist_color: ThemeColor::Mauve,
            song_color: ThemeColor::Text,
            accent_color: ThemeColor::Mauve,
            album_color: ThemeColor::Mauve,
            transition_time: Duration::from_millis(1000),
            text_fade_time: Duration::from_millis(200),
            display_time: Duration::from_millis(5000),
            animate_from: AnimateFrom::Top,
            justify: Justify::Center,
            always_show: false,
            refresh_interval: Duration::from_millis(1000),
            host: "http://localhost".to_string(),
            port: 1608,
            use_local_file: false,
            viewport_width: 1920,
        }
    }
}

struct Validator<'a> {
    params: &'a Params,
    issues: Vec<ConfigIssue>,
}

impl<'a> Validator<'a> {
    fn raw(&self, key: &str) -> Option<&'a str> {
        let params: &'a Params = self.params;
        params.get(key).map(|v| v.trim())
    }

    fn keyword<T: Keyword>(&mut self, key: &str, default: T) -> T {
        let Some(raw) = self.raw(key) else {
            return default;
        };
        match T::from_keyword(raw) {
            Some(v) => v,
            None => {
                let expected = T::VARIANTS
                    .iter()
                    .map(|(k, _)| format!("'{}'", k))
                    .collect::<Vec<_>>()
                    .join(" | ");
                self.issues.push(ConfigIssue::new(
                    key,
                    format!("Invalid enum value. Expected {}, received '{}'", expected, raw),
                ));
                default
            }
        }
    }

    fn positive(&mut self, key: &str, default: u64) -> u64 {
        let Some(raw) = self.raw(key) else {
            return default;
        };
        match raw.parse::<u64>() {
            Ok(0) => {
                self.issues
                    .push(ConfigIssue::new(key, "Number must be greater than 0"));
                default
            }
            Ok(n) => n,
            Err(_) => {
                self.issues.push(ConfigIssue::new(
                    key,
                    format!("Expected a positive whole number, received '{}'", raw),
                ));
                default
            }
        }
    }

    fn millis(&mut self, key: &str, default: Duration) -> Duration {
        Duration::from_millis(self.positive(key, default.as_millis() as u64))
    }

    fn flag(&mut self, key: &str, default: bool) -> bool {
        match self.raw(key) {
            None => default,
            Some("true") => true,
            Some("false") => false,
            Some(raw) => {
                self.issues.push(ConfigIssue::new(
                    key,
                    format!("Expected 'true' | 'false', received '{}'", raw),
                ));
                default
            }
        }
    }

    fn url(&mut self, key: &str, default: &str) -> String {
        let Some(raw) = self.raw(key) else {
            return default.to_string();
        };
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
                // The port is appended later, so only scheme and host may be given
                if url.port().is_some()
                    || url.path() != "/"
                    || url.query().is_some()
                    || url.fragment().is_some()
                {
                    self.issues.push(ConfigIssue::new(
                        key,
                        "Url must not contain a port, path, query or fragment",
                    ));
                    return default.to_string();
                }
                // Drops a default port and the trailing slash
                url.origin().ascii_serialization()
            }
            _ => {
                self.issues.push(ConfigIssue::new(key, "Invalid url"));
                default.to_string()
            }
        }
    }

    fn port(&mut self, key: &str, default: u16) -> u16 {
        let n = self.positive(key, default as u64);
        match u16::try_from(n) {
            Ok(port) => port,
            Err(_) => {
                self.issues.push(ConfigIssue::new(
                    key,
                    "Number must be less than or equal to 65535",
                ));
                default
            }
        }
    }
}

impl OverlayConfig {
    /// Validate a whole parameter mapping. Either every value is usable or the
    /// full list of issues comes back; there is no partial result.
    pub fn from_params(params: &Params) -> Result<Self, ConfigError> {
        let d = Self::default();
        let mut v = Validator {
            params,
            issues: Vec::new(),
        };

        for key in params.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                v.issues.push(ConfigIssue::new(
                    key,
                    format!("Unrecognized key '{}'", key),
                ));
            }
        }

        let viewport = v.positive("viewportWidth", d.viewport_width as u64);
        let config = Self {
            theme: v.keyword("theme", d.theme),
            background_style: v.keyword("backgroundStyle", d.background_style),
            artist_color: v.keyword("artistColor", d.artist_color),
            song_color: v.keyword("songColor", d.song_color),
            accent_color: v.keyword("accentColor", d.accent_color),
            album_color: v.keyword("albumColor", d.album_color),
            transition_time: v.millis("transitionTime", d.transition_time),
            text_fade_time: v.millis("textFadeTime", d.text_fade_time),
            display_time: v.millis("displayTime", d.display_time),
            animate_from: v.keyword("animateFrom", d.animate_from),
            justify: v.keyword("justify", d.justify),
            always_show: v.flag("alwaysShow", d.always_show),
            refresh_interval: v.millis("refreshInterval", d.refresh_interval),
            host: v.url("host", &d.host),
            port: v.port("port", d.port),
            use_local_file: v.flag("useLocalFile", d.use_local_file),
            viewport_width: u32::try_from(viewport).unwrap_or(u32::MAX),
        };

        if v.issues.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError { issues: v.issues })
        }
    }

    /// Inverse of [`OverlayConfig::from_params`]; used to print a starter file.
    pub fn to_params(&self) -> Params {
        let ms = |d: Duration| d.as_millis().to_string();
        [
            ("theme", self.theme.keyword().to_string()),
            ("backgroundStyle", self.background_style.keyword().to_string()),
            ("artistColor", self.artist_color.keyword().to_string()),
            ("songColor", self.song_color.keyword().to_string()),
            ("accentColor", self.accent_color.keyword().to_string()),
            ("albumColor", self.album_color.keyword().to_string()),
            ("transitionTime", ms(self.transition_time)),
            ("textFadeTime", ms(self.text_fade_time)),
            ("displayTime", ms(self.display_time)),
            ("animateFrom", self.animate_from.keyword().to_string()),
            ("justify", self.justify.keyword().to_string()),
            ("alwaysShow", self.always_show.to_string()),
            ("refreshInterval", ms(self.refresh_interval)),
            ("host", self.host.clone()),
            ("port", self.port.to_string()),
            ("useLocalFile", self.use_local_file.to_string()),
            ("viewportWidth", self.viewport_width.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    /// Poll target, `{host}:{port}` with no path.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_params_give_defaults() {
        let config = OverlayConfig::from_params(&Params::new()).unwrap();
        assert_eq!(config, OverlayConfig::default());
        assert_eq!(config.endpoint(), "http://localhost:1608");
    }

    #[test]
    fn test_typed_values() {
        let config = OverlayConfig::from_params(&params(&[
            ("theme", "latte"),
            ("alwaysShow", "true"),
            ("animateFrom", "bottom"),
            ("justify", "right"),
            ("transitionTime", "750"),
            ("host", "http://192.168.1.20/"),
            ("port", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.theme, Flavour::Latte);
        assert!(config.always_show);
        assert_eq!(config.animate_from, AnimateFrom::Bottom);
        assert_eq!(config.justify, Justify::Right);
        assert_eq!(config.transition_time, Duration::from_millis(750));
        assert_eq!(config.endpoint(), "http://192.168.1.20:8080");
    }

    #[test]
    fn test_all_issues_reported_together() {
        let err = OverlayConfig::from_params(&params(&[
            ("theme", "espresso"),
            ("displayTime", "0"),
            ("refreshInterval", "soon"),
            ("host", "localhost"),
            ("port", "70000"),
            ("alwaysShow", "yes"),
            ("colour", "red"),
        ]))
        .unwrap_err();

        let paths: Vec<&str> = err.issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(err.issues.len(), 7);
        for p in ["theme", "displayTime", "refreshInterval", "host", "port", "alwaysShow", "colour"] {
            assert!(paths.contains(&p), "missing issue for {}", p);
        }
        assert_eq!(err.to_string(), "There are 7 error(s) with your configuration");
    }

    #[test]
    fn test_host_is_scheme_and_host_only() {
        for host in ["http://h/x", "http://h/?a=b", "http://h/#top", "http://h:9000"] {
            let err = OverlayConfig::from_params(&params(&[("host", host)])).unwrap_err();
            assert_eq!(err.issues.len(), 1, "{} accepted", host);
            assert_eq!(err.issues[0].path, "host");
        }

        let config = OverlayConfig::from_params(&params(&[("host", "https://tuna.lan")])).unwrap();
        assert_eq!(config.endpoint(), "https://tuna.lan:1608");
        let config = OverlayConfig::from_params(&params(&[("host", "http://tuna.lan:80/")])).unwrap();
        assert_eq!(config.endpoint(), "http://tuna.lan:1608");
    }

    #[test]
    fn test_enum_message_lists_choices() {
        let err = OverlayConfig::from_params(&params(&[("backgroundStyle", "glass")])).unwrap_err();
        assert_eq!(
            err.issues[0].message,
            "Invalid enum value. Expected 'blur' | 'solid', received 'glass'"
        );
    }

    #[test]
    fn test_to_params_round_trip() {
        let config = OverlayConfig {
            theme: Flavour::Frappe,
            song_color: ThemeColor::Sapphire,
            always_show: true,
            ..OverlayConfig::default()
        };
        let back = OverlayConfig::from_params(&config.to_params()).unwrap();
        assert_eq!(back, config);
        assert_eq!(config.to_params().len(), KNOWN_KEYS.len());
    }
}
