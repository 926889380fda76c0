use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// One of the two independent settings namespaces.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SettingsScope {
    /// User-wide settings under the agent directory.
    Global,
    /// Repository-local settings under `<project>/.pi/`.
    Project,
}
