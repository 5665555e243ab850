use serde::Deserialize;

use crate::models::ProjectKey;
use crate::pagination::PageState;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<String>,
    pub key: ProjectKey,
    #[serde(default)]
    pub name: String,
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<ProjectKey>::deserialize(deserializer)?.map(|id| id.as_str().to_string()))
}

/// One page of `project/search`.
#[derive(Debug, Deserialize)]
pub struct ProjectPage {
    #[serde(flatten)]
    pub state: PageState,
    #[serde(default)]
    pub values: Vec<Project>,
}
