// Run configuration
// Loaded from a TOML file passed on the command line

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// SQLite file; defaults to the per-user data directory.
    #[serde(default)]
    pub database: Option<PathBuf>,
    pub inputs: InputConfig,
    #[serde(default)]
    pub csv: CsvConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_name() -> String {
    "idealfit".into()
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Training curves; only used for the chart.
    #[serde(default)]
    pub train: Option<PathBuf>,
    pub ideal: PathBuf,
    pub test: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CsvConfig {
    /// Single-character field delimiter. Omit to detect from the file.
    #[serde(default)]
    pub delimiter: Option<String>,
}

impl CsvConfig {
    pub fn delimiter_byte(&self) -> Result<Option<u8>, ConfigError> {
        match self.delimiter.as_deref() {
            None => Ok(None),
            Some("\\t") | Some("tab") => Ok(Some(b'\t')),
            Some(d) if d.len() == 1 && d.is_ascii() => Ok(Some(d.as_bytes()[0])),
            Some(d) => Err(ConfigError::Validation(format!(
                "csv.delimiter must be a single ASCII character, got \"{d}\""
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// SVG chart of train, test and mapped points.
    #[serde(default)]
    pub chart: Option<PathBuf>,
    /// JSON run report.
    #[serde(default)]
    pub json: Option<PathBuf>,
    #[serde(default = "default_chart_width")]
    pub chart_width: u32,
    #[serde(default = "default_chart_height")]
    pub chart_height: u32,
}

fn default_chart_width() -> u32 {
    1024
}

fn default_chart_height() -> u32 {
    768
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            chart: None,
            json: None,
            chart_width: default_chart_width(),
            chart_height: default_chart_height(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

/// `<data dir>/idealfit/idealfit.db`, or the working directory if the
/// platform has no data dir.
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("idealfit")
        .join("idealfit.db")
}

impl RunConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file; relative paths inside it are resolved against
    /// the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        let mut config = Self::from_toml(&text)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Validation("name must not be empty".into()));
        }
        if self.inputs.ideal.as_os_str().is_empty() {
            return Err(ConfigError::Validation("inputs.ideal must not be empty".into()));
        }
        if self.inputs.test.as_os_str().is_empty() {
            return Err(ConfigError::Validation("inputs.test must not be empty".into()));
        }
        if self.output.chart_width == 0 || self.output.chart_height == 0 {
            return Err(ConfigError::Validation("chart size must be non-zero".into()));
        }
        if self.output.chart.is_some() && self.inputs.train.is_none() {
            return Err(ConfigError::Validation(
                "output.chart requires inputs.train".into(),
            ));
        }
        self.csv.delimiter_byte()?;
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.inputs.ideal);
        resolve(&mut self.inputs.test);
        let optional = [
            &mut self.inputs.train,
            &mut self.database,
            &mut self.output.chart,
            &mut self.output.json,
        ];
        for p in optional.into_iter().flatten() {
            resolve(p);
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(default_database_path)
    }

    pub fn chart_size(&self) -> (u32, u32) {
        (self.output.chart_width, self.output.chart_height)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
name = "Assignment"
database = "out/functions.db"

[inputs]
train = "train.csv"
ideal = "ideal.csv"
test  = "test.csv"

[csv]
delimiter = ";"

[output]
chart = "mapping.svg"
json = "mapping.json"
chart_width = 800
"#;

    #[test]
    fn parse_full_config() {
        let config = RunConfig::from_toml(FULL).unwrap();
        assert_eq!(config.name, "Assignment");
        assert_eq!(config.csv.delimiter_byte().unwrap(), Some(b';'));
        assert_eq!(config.chart_size(), (800, 768));
        assert_eq!(config.database_path(), PathBuf::from("out/functions.db"));
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = RunConfig::from_toml(
            r#"
[inputs]
ideal = "ideal.csv"
test = "test.csv"
"#,
        )
        .unwrap();
        assert_eq!(config.name, "idealfit");
        assert!(config.inputs.train.is_none());
        assert_eq!(config.csv.delimiter_byte().unwrap(), None);
        assert!(config.database_path().ends_with("idealfit/idealfit.db"));
    }

    #[test]
    fn missing_inputs_is_parse_error() {
        let err = RunConfig::from_toml("name = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn bad_delimiter_rejected() {
        let err = RunConfig::from_toml(
            r#"
[inputs]
ideal = "i.csv"
test = "t.csv"
[csv]
delimiter = "::"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn tab_delimiter_spelled_out() {
        let csv = CsvConfig { delimiter: Some("tab".into()) };
        assert_eq!(csv.delimiter_byte().unwrap(), Some(b'\t'));
    }

    #[test]
    fn chart_without_train_rejected() {
        let err = RunConfig::from_toml(
            r#"
[inputs]
ideal = "i.csv"
test = "t.csv"
[output]
chart = "c.svg"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("inputs.train")));
    }

    #[test]
    fn load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(&path, FULL).unwrap();

        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.inputs.ideal, dir.path().join("ideal.csv"));
        assert_eq!(config.inputs.train, Some(dir.path().join("train.csv")));
        assert_eq!(config.database_path(), dir.path().join("out/functions.db"));
        assert_eq!(config.output.chart, Some(dir.path().join("mapping.svg")));
    }

    #[test]
    fn load_missing_file() {
        let err = RunConfig::load(Path::new("/nonexistent/run.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
