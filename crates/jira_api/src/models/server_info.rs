use serde::Deserialize;

use crate::config::ApiFlavor;

/// Subset of `serverInfo` used to pick the API flavor.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub deployment_type: Option<String>,
}

impl ServerInfo {
    pub fn flavor(&self) -> ApiFlavor {
        ApiFlavor::from_deployment_type(self.deployment_type.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::ServerInfo;
    use crate::config::ApiFlavor;

    #[test]
    fn missing_deployment_type_means_server() {
        let info: ServerInfo = serde_json::from_str(r#"{"version":"8.20.1"}"#).unwrap();
        assert_eq!(info.flavor(), ApiFlavor::Server);

        let info: ServerInfo = serde_json::from_str(r#"{"deploymentType":"Cloud"}"#).unwrap();
        assert_eq!(info.flavor(), ApiFlavor::Cloud);
    }
}
