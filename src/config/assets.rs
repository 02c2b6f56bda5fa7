//! Static asset configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AssetsConfig {
    /// Directory served for non-relay paths. Unset disables asset serving.
    #[serde(default)]
    pub www_path: Option<String>,
}
