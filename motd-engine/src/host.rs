//! Boundary to the server host: capability flags, directives, icon lookup.
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde_json::Value;

use crate::engine::RenderResult;

/// Optional features a host can apply to a status response.
pub trait HostCapabilities {
    fn supports_rich_text(&self) -> bool;
    fn supports_hide_player_count(&self) -> bool;
    fn supports_disable_hover(&self) -> bool;
}

/// Icon loading collaborator. The engine only hands it a path.
pub trait IconSource {
    type Icon;
    type Error: Display;

    /// Load (or fetch from cache) the icon stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the icon cannot be produced.
    fn load_icon(&self, path: &str) -> Result<Self::Icon, Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum MotdPayload {
    /// Chat-component JSON.
    Rich(Value),
    /// Markup-free text for hosts without rich text.
    Plain(String),
}

/// What the host should put into its status response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostDirectives {
    pub motd: MotdPayload,
    pub online: u32,
    pub max: u32,
    pub hide_player_count: bool,
    pub clear_player_sample: bool,
    pub icon: Option<String>,
}

/// Maps render results onto a host, warning once per missing capability.
#[derive(Debug, Default)]
pub struct HostAdapter {
    warned_rich_text: AtomicBool,
    warned_hide_count: AtomicBool,
    warned_hover: AtomicBool,
    warned_icon: AtomicBool,
}

impl HostAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn apply(&self, result: &RenderResult, host: &impl HostCapabilities) -> HostDirectives {
        let motd = if host.supports_rich_text() {
            MotdPayload::Rich(result.rich.to_component())
        } else {
            warn_once(
                &self.warned_rich_text,
                "Host cannot apply rich-text MOTDs. Sending plain text.",
            );
            MotdPayload::Plain(result.plain.clone())
        };

        let counts = result.counts;
        let hide_player_count = counts.hidden && host.supports_hide_player_count();
        if counts.hidden && !hide_player_count {
            warn_once(
                &self.warned_hide_count,
                "Host cannot hide the player count. hide_player_count is ignored.",
            );
        }
        let clear_player_sample = counts.hover_disabled && host.supports_disable_hover();
        if counts.hover_disabled && !clear_player_sample {
            warn_once(
                &self.warned_hover,
                "Host cannot clear the player sample. disable_hover is ignored.",
            );
        }

        HostDirectives {
            motd,
            online: counts.display_online,
            max: counts.display_max,
            hide_player_count,
            clear_player_sample,
            icon: result.icon.clone(),
        }
    }

    /// Load the icon at `path`. Failures, including panics inside the
    /// source, yield `None` and are logged once.
    pub fn resolve_icon<S: IconSource>(&self, source: &S, path: Option<&str>) -> Option<S::Icon> {
        let path = path.filter(|path| !path.trim().is_empty())?;
        match panic::catch_unwind(AssertUnwindSafe(|| source.load_icon(path))) {
            Ok(Ok(icon)) => Some(icon),
            Ok(Err(err)) => {
                warn_once(&self.warned_icon, &format!("Failed to load icon '{path}': {err}"));
                None
            }
            Err(_) => {
                log::error!("icon source panicked while loading '{path}'");
                None
            }
        }
    }
}

fn warn_once(flag: &AtomicBool, message: &str) {
    if flag
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
    {
        log::warn!("{message}");
    }
}
