//! Descriptor languages and content validity checks.

use crate::source_file::FileType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow descriptor languages understood by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DescriptorType {
    /// Common Workflow Language.
    Cwl,
    /// Workflow Description Language.
    Wdl,
    /// Nextflow.
    Nextflow,
}

impl DescriptorType {
    /// Short name used in API paths and registration requests.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Cwl => "cwl",
            Self::Wdl => "wdl",
            Self::Nextflow => "nfl",
        }
    }

    /// Parses a short name, case-insensitively.
    #[must_use]
    pub fn from_short_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "cwl" => Some(Self::Cwl),
            "wdl" => Some(Self::Wdl),
            "nfl" | "nextflow" => Some(Self::Nextflow),
            _ => None,
        }
    }

    /// The source-file type of this language's primary descriptor.
    #[must_use]
    pub const fn file_type(self) -> FileType {
        match self {
            Self::Cwl => FileType::Cwl,
            Self::Wdl => FileType::Wdl,
            Self::Nextflow => FileType::NextflowConfig,
        }
    }

    /// The source-file type of this language's test parameter files, when
    /// the language has one.
    #[must_use]
    pub const fn test_parameter_file_type(self) -> Option<FileType> {
        match self {
            Self::Cwl => Some(FileType::CwlTestJson),
            Self::Wdl => Some(FileType::WdlTestJson),
            Self::Nextflow => None,
        }
    }

    /// Checks whether content is a plausible primary descriptor for this
    /// language. Version validity during refresh is computed from this.
    ///
    /// CWL must parse as YAML and carry `class` and `cwlVersion` keys. WDL
    /// must declare a workflow or task. Nextflow configs only need to be
    /// non-blank.
    #[must_use]
    pub fn validate_content(self, content: &str) -> bool {
        match self {
            Self::Cwl => match serde_yaml::from_str::<serde_yaml::Value>(content) {
                Ok(serde_yaml::Value::Mapping(mapping)) => {
                    mapping.contains_key("class") && mapping.contains_key("cwlVersion")
                }
                _ => false,
            },
            Self::Wdl => content.lines().any(|line| {
                let line = line.trim_start();
                line.starts_with("workflow ") || line.starts_with("task ")
            }),
            Self::Nextflow => !content.trim().is_empty(),
        }
    }
}

impl fmt::Display for DescriptorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cwl => write!(f, "CWL"),
            Self::Wdl => write!(f, "WDL"),
            Self::Nextflow => write!(f, "NFL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name_roundtrip() {
        for descriptor in [DescriptorType::Cwl, DescriptorType::Wdl, DescriptorType::Nextflow] {
            assert_eq!(
                DescriptorType::from_short_name(descriptor.short_name()),
                Some(descriptor)
            );
        }
        assert_eq!(DescriptorType::from_short_name("garbage type"), None);
    }

    #[test]
    fn test_cwl_validity() {
        assert!(DescriptorType::Cwl.validate_content("cwlVersion: v1.0\nclass: Workflow"));
        // missing cwlVersion
        assert!(!DescriptorType::Cwl.validate_content("class: Workflow"));
        // not YAML at all
        assert!(!DescriptorType::Cwl.validate_content("task hello {\n}"));
        assert!(!DescriptorType::Cwl.validate_content(""));
    }

    #[test]
    fn test_wdl_validity() {
        assert!(DescriptorType::Wdl.validate_content("version 1.0\nworkflow hello {\n}"));
        assert!(DescriptorType::Wdl.validate_content("task sort {\n  command { sort }\n}"));
        assert!(!DescriptorType::Wdl.validate_content("cwlVersion: v1.0\nclass: Workflow"));
    }

    #[test]
    fn test_nextflow_validity() {
        assert!(DescriptorType::Nextflow.validate_content("manifest { mainScript = 'main.nf' }"));
        assert!(!DescriptorType::Nextflow.validate_content("   \n"));
    }

    #[test]
    fn test_test_parameter_file_types() {
        assert_eq!(
            DescriptorType::Cwl.test_parameter_file_type(),
            Some(FileType::CwlTestJson)
        );
        assert_eq!(
            DescriptorType::Wdl.test_parameter_file_type(),
            Some(FileType::WdlTestJson)
        );
        assert_eq!(DescriptorType::Nextflow.test_parameter_file_type(), None);
    }
}
