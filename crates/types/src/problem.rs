//! Structured configuration cache problems

use std::fmt;

use cfgcache_errors::ProblemCause;
use serde::{Deserialize, Serialize};

/// A configuration cache problem reported by the build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyProblem {
    /// Where in the build the problem was found
    pub trace: PropertyTrace,
    /// What is wrong, in one sentence
    pub message: String,
    /// Underlying fault, when the problem was raised by one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<ProblemCause>,
    /// Documentation section explaining the requirement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<DocumentationSection>,
}

impl PropertyProblem {
    #[must_use]
    pub fn new(trace: PropertyTrace, message: impl Into<String>) -> Self {
        Self {
            trace,
            message: message.into(),
            cause: None,
            documentation: None,
        }
    }

    #[must_use]
    pub fn with_cause(mut self, cause: ProblemCause) -> Self {
        self.cause = Some(cause);
        self
    }

    #[must_use]
    pub fn with_documentation(mut self, section: DocumentationSection) -> Self {
        self.documentation = Some(section);
        self
    }
}

/// Kind of member a property trace points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Field,
    InputProperty,
    OutputProperty,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field => write!(f, "field"),
            Self::InputProperty => write!(f, "input property"),
            Self::OutputProperty => write!(f, "output property"),
        }
    }
}

/// Path from a problematic value back to the build logic that produced it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyTrace {
    Unknown,
    BuildLogic {
        source: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        line: Option<u32>,
    },
    Task {
        path: String,
        type_name: String,
    },
    Project {
        path: String,
    },
    Bean {
        type_name: String,
        trace: Box<PropertyTrace>,
    },
    Property {
        property: PropertyKind,
        name: String,
        trace: Box<PropertyTrace>,
    },
}

impl PropertyTrace {
    /// Outermost piece of user code the trace is anchored to
    #[must_use]
    pub fn user_code_location(&self) -> &PropertyTrace {
        match self {
            Self::Bean { trace, .. } | Self::Property { trace, .. } => trace.user_code_location(),
            _ => self,
        }
    }

    /// Wrap this trace in a member of the given kind
    #[must_use]
    pub fn property(self, property: PropertyKind, name: impl Into<String>) -> Self {
        Self::Property {
            property,
            name: name.into(),
            trace: Box::new(self),
        }
    }

    /// Wrap this trace in a bean of the given type
    #[must_use]
    pub fn bean(self, type_name: impl Into<String>) -> Self {
        Self::Bean {
            type_name: type_name.into(),
            trace: Box::new(self),
        }
    }
}

impl fmt::Display for PropertyTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown location"),
            Self::BuildLogic {
                source,
                line: Some(line),
            } => write!(f, "{source}: line {line}"),
            Self::BuildLogic { source, line: None } => f.write_str(source),
            Self::Task { path, type_name } => write!(f, "task `{path}` of type `{type_name}`"),
            Self::Project { path } => write!(f, "project `{path}`"),
            Self::Bean { type_name, trace } => write!(f, "`{type_name}` bean found in {trace}"),
            Self::Property {
                property,
                name,
                trace,
            } => write!(f, "{property} `{name}` of {trace}"),
        }
    }
}

/// Documentation sections problems can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentationSection {
    NotYetImplemented,
    RequirementsBuildListeners,
    RequirementsDisallowedTypes,
    RequirementsExternalProcess,
    RequirementsEnvironmentRead,
    RequirementsTaskAccess,
    RequirementsUseProjectDuringExecution,
}

impl DocumentationSection {
    /// Anchor of the section inside the configuration cache guide
    #[must_use]
    pub fn anchor(self) -> &'static str {
        match self {
            Self::NotYetImplemented => "config_cache:not_yet_implemented",
            Self::RequirementsBuildListeners => "config_cache:requirements:build_listeners",
            Self::RequirementsDisallowedTypes => "config_cache:requirements:disallowed_types",
            Self::RequirementsExternalProcess => "config_cache:requirements:external_processes",
            Self::RequirementsEnvironmentRead => {
                "config_cache:requirements:reading_sys_props_and_env_vars"
            }
            Self::RequirementsTaskAccess => "config_cache:requirements:task_access",
            Self::RequirementsUseProjectDuringExecution => {
                "config_cache:requirements:use_project_during_execution"
            }
        }
    }

    /// Full link to the section below the given guide URL
    #[must_use]
    pub fn link(self, guide_url: &str) -> String {
        format!("{guide_url}#{}", self.anchor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> PropertyTrace {
        PropertyTrace::Task {
            path: ":app:compile".to_string(),
            type_name: "CompileTask".to_string(),
        }
    }

    #[test]
    fn nested_trace_reads_inside_out() {
        let trace = task()
            .property(PropertyKind::Field, "settings")
            .bean("Settings")
            .property(PropertyKind::Field, "thread");

        assert_eq!(
            trace.to_string(),
            "field `thread` of `Settings` bean found in field `settings` of task `:app:compile` of type `CompileTask`"
        );
        assert_eq!(trace.user_code_location(), &task());
    }

    #[test]
    fn build_logic_location_includes_line() {
        let trace = PropertyTrace::BuildLogic {
            source: "build file 'build.toml'".to_string(),
            line: Some(12),
        };
        assert_eq!(trace.to_string(), "build file 'build.toml': line 12");
        assert_eq!(trace.user_code_location(), &trace);
    }

    #[test]
    fn documentation_link_appends_anchor() {
        let link = DocumentationSection::RequirementsTaskAccess.link("https://docs.example/cc");
        assert_eq!(
            link,
            "https://docs.example/cc#config_cache:requirements:task_access"
        );
    }
}
