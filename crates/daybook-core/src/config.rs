use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

use crate::persistence::DEFAULT_STORAGE_KEY;

const CONFIG_ENV_VAR: &str =
  "DAYBOOK_CONFIG";
const CONFIG_FILE: &str =
  "daybook.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSection {
  pub location: String,
  pub key:      String,
  pub seed:     bool
}

impl Default for DataSection {
  fn default() -> Self {
    Self {
      location: "~/.daybook".to_string(),
      key:      DEFAULT_STORAGE_KEY
        .to_string(),
      seed:     true
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplaySection {
  pub color: bool
}

impl Default for DisplaySection {
  fn default() -> Self {
    Self {
      color: true
    }
  }
}

#[derive(
  Debug, Clone, Default, Deserialize,
)]
#[serde(default)]
pub struct Config {
  pub data:         DataSection,
  pub display:      DisplaySection,
  #[serde(skip)]
  pub loaded_files: Vec<PathBuf>
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) =
      resolve_config_path(
        config_override
      )?
    else {
      warn!(
        "no daybook.toml found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    if !path.exists() {
      if config_override.is_some() {
        return Err(anyhow!(
          "config file {} does not \
           exist",
          path.display()
        ));
      }
      warn!(file = %path.display(), "config file not found; using defaults");
      return Ok(Self::default());
    }

    info!(file = %path.display(), "loading config");
    let mut cfg = Self::parse(
      &fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?
    )
    .with_context(|| {
      format!(
        "failed to parse {}",
        path.display()
      )
    })?;
    cfg.loaded_files.push(path);
    Ok(cfg)
  }

  pub fn parse(
    raw: &str
  ) -> anyhow::Result<Self> {
    Ok(toml::from_str(raw)?)
  }

  /// Applies `key=value` pairs on top
  /// of the loaded file. A leading
  /// `rc.` is accepted and ignored.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      match key.as_str() {
        | "data.location" => {
          self.data.location = v
        }
        | "data.key" => {
          self.data.key = v
        }
        | "data.seed" => {
          self.data.seed =
            parse_bool(&v)
        }
        | "display.color" => {
          self.display.color =
            parse_bool(&v)
        }
        | _ => {
          warn!(key = %key, "ignoring unknown config override")
        }
      }
    }

    if self.data.key.trim().is_empty() {
      return Err(anyhow!(
        "data.key cannot be empty"
      ));
    }
    Ok(())
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = if let Some(path) =
    override_dir
  {
    path.to_path_buf()
  } else {
    expand_tilde(Path::new(
      &cfg.data.location
    ))
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(expand_tilde(path)));
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if trimmed == "/dev/null" {
      return Ok(None);
    }
    if !trimmed.is_empty() {
      return Ok(Some(expand_tilde(
        Path::new(trimmed)
      )));
    }
  }

  let Some(base) = dirs::config_dir()
  else {
    return Ok(None);
  };
  Ok(Some(
    base
      .join("daybook")
      .join(CONFIG_FILE)
  ))
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}
