#![forbid(unsafe_code)]

//! Page configuration.
//!
//! Every field has a default matching the stock page markup, so an empty
//! JSON object (or no options at all) is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::timing::FadeTiming;

/// Ids of the pre-existing page elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementIds {
    pub input_form: String,
    pub channel_input: String,
    pub start_page: String,
    pub content: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            input_form: "input-form".to_owned(),
            channel_input: "channelNameInput".to_owned(),
            start_page: "startpage-container".to_owned(),
            content: "content".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Analysis endpoint, absolute or relative to `base_url`.
    pub endpoint_url: String,
    /// Base for a relative `endpoint_url`. The browser host falls back to
    /// the page origin.
    pub base_url: Option<String>,
    pub ids: ElementIds,
    pub fade_delay_ms: u64,
    pub fade_settle_ms: u64,
    /// Text shown under the loading spinner.
    pub loading_caption: String,
    /// Record a transition trace on the controller.
    pub trace: bool,
    /// `tracing` filter directive for hosts that install a subscriber.
    pub log_filter: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            endpoint_url: "/analyze".to_owned(),
            base_url: None,
            ids: ElementIds::default(),
            fade_delay_ms: 250,
            fade_settle_ms: 250,
            loading_caption: "Analyzing... BERT is analyzing human emotions...".to_owned(),
            trace: false,
            log_filter: "info".to_owned(),
        }
    }
}

impl PageConfig {
    /// Parse and validate.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("endpoint_url", &self.endpoint_url),
            ("ids.input_form", &self.ids.input_form),
            ("ids.channel_input", &self.ids.channel_input),
            ("ids.start_page", &self.ids.start_page),
            ("ids.content", &self.ids.content),
        ];
        if let Some(&(name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::EmptyField(name));
        }
        if self.fade_delay_ms == 0 {
            return Err(ConfigError::ZeroFadeDelay);
        }
        Ok(())
    }

    #[must_use]
    pub const fn fade_timing(&self) -> FadeTiming {
        FadeTiming::from_millis(self.fade_delay_ms, self.fade_settle_ms)
    }
}
