//! Per-run decomposition input

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Subject area of the goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    #[default]
    General,
    Tech,
    Business,
    Research,
    Education,
    Personal,
}

impl Domain {
    pub const ALL: [Domain; 6] = [
        Domain::General,
        Domain::Tech,
        Domain::Business,
        Domain::Research,
        Domain::Education,
        Domain::Personal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Tech => "tech",
            Self::Business => "business",
            Self::Research => "research",
            Self::Education => "education",
            Self::Personal => "personal",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "Domain::from_str: called");
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == needle)
            .ok_or_else(|| format!("unknown domain '{}' (expected one of: general, tech, business, research, education, personal)", s))
    }
}

/// How hard the user thinks the goal is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLevel {
    #[default]
    Simple,
    Medium,
    Complex,
}

impl ComplexityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
        }
    }
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ComplexityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "ComplexityLevel::from_str: called");
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "medium" => Ok(Self::Medium),
            "complex" => Ok(Self::Complex),
            other => Err(format!(
                "unknown complexity '{}' (expected one of: simple, medium, complex)",
                other
            )),
        }
    }
}

/// The user's goal plus the constraints around it
///
/// Built once per decomposition request and shared read-only by every stage.
/// Serializes with the field names the prompts present to the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub task: String,
    pub constraints: String,
    pub domain: Domain,
    pub complexity: ComplexityLevel,
    pub time_constraint: String,
}

impl Context {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            ..Default::default()
        }
    }

    pub fn with_constraints(mut self, constraints: impl Into<String>) -> Self {
        self.constraints = constraints.into();
        self
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_complexity(mut self, complexity: ComplexityLevel) -> Self {
        self.complexity = complexity;
        self
    }

    pub fn with_time_constraint(mut self, time_constraint: impl Into<String>) -> Self {
        self.time_constraint = time_constraint.into();
        self
    }

    /// True when there is no task description to decompose
    pub fn is_blank(&self) -> bool {
        self.task.trim().is_empty()
    }

    /// Pretty JSON for embedding in prompts
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.task.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_parse_is_case_insensitive() {
        assert_eq!("Tech".parse::<Domain>().unwrap(), Domain::Tech);
        assert_eq!(" research ".parse::<Domain>().unwrap(), Domain::Research);
        assert!("astrology".parse::<Domain>().is_err());
    }

    #[test]
    fn test_complexity_roundtrip_through_display() {
        for level in [ComplexityLevel::Simple, ComplexityLevel::Medium, ComplexityLevel::Complex] {
            assert_eq!(level.to_string().parse::<ComplexityLevel>().unwrap(), level);
        }
    }

    #[test]
    fn test_context_serializes_camel_case() {
        let ctx = Context::new("Ship v2")
            .with_domain(Domain::Tech)
            .with_time_constraint("2 weeks");
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["task"], "Ship v2");
        assert_eq!(json["domain"], "tech");
        assert_eq!(json["complexity"], "simple");
        assert_eq!(json["timeConstraint"], "2 weeks");
    }

    #[test]
    fn test_blank_context() {
        assert!(Context::new("   \n").is_blank());
        assert!(!Context::new("x").is_blank());
    }
}
