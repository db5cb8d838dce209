use crate::application::display::DEFAULT_TIME_FORMAT;
use crate::domain::baseline::NormalValues;
use crate::domain::sensor::Channel;
use crate::domain::series::{DEFAULT_MAX_POINTS, MAX_POINTS_LIMIT};
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub firebase: FirebaseSettings,
    #[serde(default)]
    pub buffer: BufferSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub normal: NormalValues,
    #[serde(default = "default_charts")]
    pub charts: Vec<ChartConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FirebaseSettings {
    pub database_url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_current_path")]
    pub current_path: String,
    #[serde(default = "default_normal_path")]
    pub normal_path: String,
    #[serde(default = "default_history_path")]
    pub history_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BufferSettings {
    pub max_points: usize,
    pub history_limit: usize,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            max_points: DEFAULT_MAX_POINTS,
            history_limit: DEFAULT_MAX_POINTS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplaySettings {
    pub time_format: String,
    /// Points per series in snapshot responses; 0 disables decimation.
    pub decimation_samples: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            decimation_samples: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChartConfig {
    pub channel: Channel,
    pub label: String,
    pub color: Option<String>,
    pub baseline_color: Option<String>,
}

fn default_current_path() -> String {
    "sensor/current".to_string()
}

fn default_normal_path() -> String {
    "sensor/normal".to_string()
}

fn default_history_path() -> String {
    "sensor/history".to_string()
}

pub fn default_charts() -> Vec<ChartConfig> {
    let chart = |channel, label: &str, color: &str| ChartConfig {
        channel,
        label: label.to_string(),
        color: Some(color.to_string()),
        baseline_color: Some("rgb(220, 53, 69)".to_string()),
    };
    vec![
        chart(Channel::Distance, "Distance (cm)", "rgba(108, 133, 241, 1)"),
        chart(Channel::Light, "Light (Inverted)", "rgb(255, 206, 86)"),
        chart(Channel::Sound, "Sound", "rgba(88, 223, 223, 1)"),
    ]
}

impl DashboardConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.firebase.database_url.trim().is_empty() {
            anyhow::bail!("firebase.database_url must be set");
        }
        if !(1..=MAX_POINTS_LIMIT).contains(&self.buffer.max_points) {
            anyhow::bail!(
                "buffer.max_points must be between 1 and {}, got {}",
                MAX_POINTS_LIMIT,
                self.buffer.max_points
            );
        }
        if self.buffer.history_limit == 0 {
            anyhow::bail!("buffer.history_limit must be at least 1");
        }
        if StrftimeItems::new(&self.display.time_format).any(|item| matches!(item, Item::Error)) {
            anyhow::bail!("display.time_format {:?} is not a valid format", self.display.time_format);
        }
        Ok(())
    }
}

/// `DASHBOARD__SECTION__KEY` overrides.
fn environment() -> config::Environment {
    config::Environment::with_prefix("DASHBOARD")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

fn build_config<F>(file: F, env: config::Environment) -> anyhow::Result<DashboardConfig>
where
    F: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .add_source(file)
        .add_source(env)
        .build()?;

    let dashboard: DashboardConfig = settings.try_deserialize()?;
    dashboard.validate()?;
    Ok(dashboard)
}

/// Load `config/dashboard.*`, then apply environment overrides.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    build_config(
        config::File::with_name("config/dashboard").required(false),
        environment(),
    )
}
