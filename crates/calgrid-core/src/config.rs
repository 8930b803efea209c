use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

use crate::datetime::resolve_timezone;
use crate::overflow::DEFAULT_VISIBLE_LIMIT;

pub const CONFIG_ENV_VAR: &str =
  "CALGRID_CONFIG";
const CONFIG_FILE_NAME: &str =
  "calgrid.toml";

fn default_visible_limit() -> usize {
  DEFAULT_VISIBLE_LIMIT
}

fn default_hour_end() -> u32 {
  23
}

fn default_true() -> bool {
  true
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct CalendarConfig {
  #[serde(default)]
  pub version:      u32,
  pub timezone:     Option<String>,
  #[serde(default)]
  pub policies:     CalendarPolicies,
  #[serde(default)]
  pub day_view:     DayViewConfig,
  #[serde(skip)]
  pub loaded_files: Vec<PathBuf>
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct CalendarPolicies {
  #[serde(
    default = "default_visible_limit"
  )]
  pub visible_limit: usize,
  #[serde(default = "default_true")]
  pub color:         bool
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct DayViewConfig {
  #[serde(default)]
  pub hour_start: u32,
  #[serde(default = "default_hour_end")]
  pub hour_end:   u32
}

impl Default for CalendarConfig {
  fn default() -> Self {
    Self {
      version:      1,
      timezone:     None,
      policies:
        CalendarPolicies::default(),
      day_view:
        DayViewConfig::default(),
      loaded_files: vec![]
    }
  }
}

impl Default for CalendarPolicies {
  fn default() -> Self {
    Self {
      visible_limit:
        default_visible_limit(),
      color:         true
    }
  }
}

impl Default for DayViewConfig {
  fn default() -> Self {
    Self {
      hour_start: 0,
      hour_end:   default_hour_end()
    }
  }
}

impl CalendarConfig {
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
        "no calgrid.toml found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    info!(config = %path.display(), "loading calendar config");
    Self::from_file(&path)
  }

  pub fn from_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    let mut cfg =
      Self::from_toml_str(&text)
        .with_context(|| {
          format!(
            "failed to parse {}",
            path.display()
          )
        })?;
    cfg.loaded_files.push(path);
    Ok(cfg)
  }

  pub fn from_toml_str(
    text: &str
  ) -> anyhow::Result<Self> {
    let mut cfg =
      toml::from_str::<Self>(text)?;
    cfg.sanitize();
    Ok(cfg)
  }

  /// Applies `key=value` pairs, with or
  /// without an `rc.` prefix.
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
      let value = v.trim();
      debug!(key = %key, value = %value, "applying override");

      match key.as_str() {
        | "timezone" => {
          self.timezone =
            Some(value.to_string());
        }
        | "visible_limit"
        | "policies.visible_limit" => {
          self.policies.visible_limit =
            parse_number(&key, value)?;
        }
        | "color" | "policies.color" => {
          self.policies.color =
            parse_bool(value);
        }
        | "day.hour_start"
        | "day_view.hour_start" => {
          self.day_view.hour_start =
            parse_number(&key, value)?;
        }
        | "day.hour_end"
        | "day_view.hour_end" => {
          self.day_view.hour_end =
            parse_number(&key, value)?;
        }
        | _ => {
          return Err(anyhow!(
            "unknown config key: {key}"
          ));
        }
      }
    }

    self.sanitize();
    Ok(())
  }

  pub fn timezone(&self) -> Tz {
    resolve_timezone(
      self.timezone.as_deref()
    )
  }

  fn sanitize(&mut self) {
    if self.policies.visible_limit == 0
    {
      self.policies.visible_limit =
        default_visible_limit();
    }

    if self.day_view.hour_start > 23 {
      self.day_view.hour_start = 23;
    }
    if self.day_view.hour_end > 23 {
      self.day_view.hour_end = 23;
    }
    if self.day_view.hour_end
      < self.day_view.hour_start
    {
      self.day_view.hour_end =
        self.day_view.hour_start;
    }
  }
}

fn parse_number<T>(
  key: &str,
  value: &str
) -> anyhow::Result<T>
where
  T: std::str::FromStr,
  T::Err: std::error::Error
    + Send
    + Sync
    + 'static
{
  value.parse::<T>().with_context(|| {
    format!(
      "invalid numeric value for \
       {key}: {value}"
    )
  })
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    if raw == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(raw)));
  }

  let Some(config_dir) =
    dirs::config_dir()
  else {
    debug!(
      "cannot determine config \
       directory"
    );
    return Ok(None);
  };
  let candidate = config_dir
    .join("calgrid")
    .join(CONFIG_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
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
