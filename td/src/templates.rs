//! Built-in project templates
//!
//! Each template prefills the form: its description becomes the task text.

use tracing::debug;

use crate::domain::{ComplexityLevel, Context, Domain};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectTemplate {
    pub id: &'static str,
    pub category: &'static str,
    pub domain: Domain,
    pub complexity: ComplexityLevel,
    pub time_constraint: &'static str,
    pub description: &'static str,
    pub constraints: &'static str,
}

impl ProjectTemplate {
    /// Form inputs this template produces
    pub fn to_context(&self) -> Context {
        Context::new(self.description)
            .with_constraints(self.constraints)
            .with_domain(self.domain)
            .with_complexity(self.complexity)
            .with_time_constraint(self.time_constraint)
    }
}

pub const TEMPLATES: [ProjectTemplate; 13] = [
    ProjectTemplate {
        id: "agile",
        category: "Software development",
        domain: Domain::Tech,
        complexity: ComplexityLevel::Medium,
        time_constraint: "2 weeks",
        description: "Agile project using Scrum: sprint planning, daily stand-ups and retrospectives.",
        constraints: "Follow the Scrum framework with 2-week sprints; the whole team takes part.",
    },
    ProjectTemplate {
        id: "waterfall",
        category: "Software development",
        domain: Domain::Tech,
        complexity: ComplexityLevel::Complex,
        time_constraint: "3 months",
        description: "Waterfall project covering requirements, design, development, testing and deployment phases.",
        constraints: "Detailed documentation is required and every phase must pass review.",
    },
    ProjectTemplate {
        id: "microservice",
        category: "Software development",
        domain: Domain::Tech,
        complexity: ComplexityLevel::Complex,
        time_constraint: "6 months",
        description: "Design and build a microservice architecture: service boundaries, API design and deployment layout.",
        constraints: "Account for inter-service communication, data consistency and fault tolerance.",
    },
    ProjectTemplate {
        id: "mobile",
        category: "Software development",
        domain: Domain::Tech,
        complexity: ComplexityLevel::Medium,
        time_constraint: "3 months",
        description: "Mobile app development: UI design, feature work and performance tuning.",
        constraints: "Support a range of devices and OS versions with a focus on user experience.",
    },
    ProjectTemplate {
        id: "research",
        category: "Project management",
        domain: Domain::Research,
        complexity: ComplexityLevel::Complex,
        time_constraint: "6 months",
        description: "Research project plan: literature review, method design, experiments and result analysis.",
        constraints: "Use rigorous experimental methods and review results regularly.",
    },
    ProjectTemplate {
        id: "product",
        category: "Project management",
        domain: Domain::Business,
        complexity: ComplexityLevel::Medium,
        time_constraint: "4 months",
        description: "Product development: market research, requirements, prototyping, development and testing.",
        constraints: "Stay in close contact with the market and users; product experience comes first.",
    },
    ProjectTemplate {
        id: "integration",
        category: "Project management",
        domain: Domain::Tech,
        complexity: ComplexityLevel::Complex,
        time_constraint: "3 months",
        description: "System integration: current-state assessment, solution design, system hookup and acceptance testing.",
        constraints: "Ensure compatibility between systems and keep data secure.",
    },
    ProjectTemplate {
        id: "marketing",
        category: "Business operations",
        domain: Domain::Business,
        complexity: ComplexityLevel::Medium,
        time_constraint: "1 month",
        description: "Marketing campaign: goal setting, plan, resource coordination and results review.",
        constraints: "Keep within budget and track ROI.",
    },
    ProjectTemplate {
        id: "event",
        category: "Business operations",
        domain: Domain::Business,
        complexity: ComplexityLevel::Medium,
        time_constraint: "2 weeks",
        description: "Event planning and execution: preparation, on-site management and wrap-up.",
        constraints: "Prepare a detailed contingency plan so the event runs smoothly.",
    },
    ProjectTemplate {
        id: "operation",
        category: "Business operations",
        domain: Domain::Business,
        complexity: ComplexityLevel::Medium,
        time_constraint: "3 months",
        description: "Operations improvement: current-state analysis, plan, process optimisation and follow-up.",
        constraints: "Needs cooperation across departments and attention to feedback during rollout.",
    },
    ProjectTemplate {
        id: "dataAnalysis",
        category: "Data analysis",
        domain: Domain::Research,
        complexity: ComplexityLevel::Complex,
        time_constraint: "1 month",
        description: "Data analysis project: collection, cleaning, analysis, visualisation and reporting.",
        constraints: "Ensure data quality and use sound analysis methods.",
    },
    ProjectTemplate {
        id: "marketResearch",
        category: "Data analysis",
        domain: Domain::Business,
        complexity: ComplexityLevel::Medium,
        time_constraint: "2 months",
        description: "Market research project: survey design, data collection and analysis report.",
        constraints: "Keep the sample representative and control research costs.",
    },
    ProjectTemplate {
        id: "userResearch",
        category: "Data analysis",
        domain: Domain::Research,
        complexity: ComplexityLevel::Medium,
        time_constraint: "1 month",
        description: "User research project: interviews, behaviour analysis and needs extraction.",
        constraints: "Cover different user groups and use sound research methods.",
    },
];

/// Look up a template by id, ignoring case
pub fn find_template(id: &str) -> Option<&'static ProjectTemplate> {
    debug!(%id, "find_template: called");
    TEMPLATES.iter().find(|t| t.id.eq_ignore_ascii_case(id.trim()))
}
