use serde::{Deserialize, Serialize};

/// Organization/team pair that namespaces metrics and persisted history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub organization: String,
    #[serde(default)]
    pub team: Option<String>,
}

impl Scope {
    pub fn organization<O: Into<String>>(organization: O) -> Self {
        Self {
            organization: organization.into(),
            team: None,
        }
    }

    pub fn team<O: Into<String>, T: Into<String>>(organization: O, team: T) -> Self {
        Self {
            organization: organization.into(),
            team: Some(team.into()),
        }
    }

    /// Team name if one is set; an empty string counts as no team.
    pub fn team_name(&self) -> Option<&str> {
        self.team.as_deref().filter(|t| !t.is_empty())
    }

    pub fn api_prefix(&self) -> String {
        match self.team_name() {
            Some(team) => format!("/organizations/{}/teams/{}", self.organization, team),
            None => format!("/organizations/{}", self.organization),
        }
    }
}

/// Immutable view context handed to every component: which metric is graphed
/// and under which scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphContext {
    pub scope: Scope,
    pub metric: String,
}

impl GraphContext {
    pub fn new<M: Into<String>>(scope: Scope, metric: M) -> Self {
        Self {
            scope,
            metric: metric.into(),
        }
    }

    pub fn storage_key(&self, field_id: &str) -> String {
        format!(
            "{}|{}|{}|{}",
            self.scope.organization,
            self.scope.team_name().unwrap_or(""),
            self.metric,
            field_id
        )
    }
}
