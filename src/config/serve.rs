//! `[serve]` section configuration.
//!
//! Development server settings (interface, port, watch).

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[serve]` section in folio.toml.
///
/// # Example
/// ```toml
/// [serve]
/// interface = "127.0.0.1"
/// port = 4280
/// watch = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Interface to bind on.
    #[serde(default = "defaults::serve::interface")]
    #[educe(Default = defaults::serve::interface())]
    pub interface: String,

    /// Port to listen on. Incremented automatically when in use.
    #[serde(default = "defaults::serve::port")]
    #[educe(Default = defaults::serve::port())]
    pub port: u16,

    /// Watch content/assets and rebuild on change.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub watch: bool,
}
