//! Build-type agnostic representation of a provenance and the mapping into it.

use endorse_types::intoto::{DigestSet, Subject};
use serde::Deserialize;
use serde_json::Value;

use crate::document::ValidatedProvenance;
use crate::error::MappingError;

pub const SLSA_V02_PREDICATE_TYPE: &str = "https://slsa.dev/provenance/v0.2";
pub const SLSA_V1_PREDICATE_TYPE: &str = "https://slsa.dev/provenance/v1";

pub const CONTAINER_BASED_BUILD_TYPE: &str = "https://slsa.dev/container-based-build/v0.1?draft";
pub const GENERIC_GENERATOR_BUILD_TYPE: &str =
    "https://github.com/slsa-framework/slsa-github-generator/generic@v1";
pub const GO_GENERATOR_BUILD_TYPE: &str =
    "https://github.com/slsa-framework/slsa-github-generator/go@v1";

/// Canonical form of a single provenance, independent of its predicate and
/// build type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProvenanceIR {
    binary_name: String,
    binary_sha256_digest: String,
    build_type: String,
    build_cmd: Option<Vec<String>>,
    builder_image_sha256_digest: Option<String>,
    repo_uris: Vec<String>,
    commit_sha1_digest: Option<String>,
    trusted_builder: Option<String>,
}

impl ProvenanceIR {
    pub fn new(
        binary_name: impl Into<String>,
        binary_sha256_digest: impl Into<String>,
        build_type: impl Into<String>,
    ) -> Self {
        Self {
            binary_name: binary_name.into(),
            binary_sha256_digest: binary_sha256_digest.into(),
            build_type: build_type.into(),
            ..Self::default()
        }
    }

    pub fn with_build_cmd(mut self, build_cmd: Vec<String>) -> Self {
        self.build_cmd = Some(build_cmd);
        self
    }

    pub fn with_builder_image_sha256_digest(mut self, digest: impl Into<String>) -> Self {
        self.builder_image_sha256_digest = Some(digest.into());
        self
    }

    pub fn with_repo_uri(mut self, repo_uri: impl Into<String>) -> Self {
        self.repo_uris.push(repo_uri.into());
        self
    }

    pub fn with_commit_sha1_digest(mut self, digest: impl Into<String>) -> Self {
        self.commit_sha1_digest = Some(digest.into());
        self
    }

    pub fn with_trusted_builder(mut self, builder: impl Into<String>) -> Self {
        self.trusted_builder = Some(builder.into());
        self
    }

    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    pub fn binary_sha256_digest(&self) -> &str {
        &self.binary_sha256_digest
    }

    pub fn build_type(&self) -> &str {
        &self.build_type
    }

    pub fn build_cmd(&self) -> Option<&[String]> {
        self.build_cmd.as_deref()
    }

    pub fn builder_image_sha256_digest(&self) -> Option<&str> {
        self.builder_image_sha256_digest.as_deref()
    }

    pub fn repo_uris(&self) -> &[String] {
        &self.repo_uris
    }

    pub fn commit_sha1_digest(&self) -> Option<&str> {
        self.commit_sha1_digest.as_deref()
    }

    pub fn trusted_builder(&self) -> Option<&str> {
        self.trusted_builder.as_deref()
    }
}

/// Map a validated provenance to a [`ProvenanceIR`] based on its predicate
/// and build type.
pub fn from_validated_provenance(
    validated: &ValidatedProvenance,
) -> Result<ProvenanceIR, MappingError> {
    let statement = validated.statement();
    let subject = single_subject(&statement.subject)?;
    let digest = subject
        .digest
        .get("sha256")
        .ok_or_else(|| MappingError::MissingSha256Digest(subject.name.clone()))?;

    match statement.predicate_type.as_str() {
        SLSA_V02_PREDICATE_TYPE => {
            let predicate: SlsaV02Predicate = serde_json::from_value(statement.predicate.clone())?;
            from_slsa_v02(&subject.name, digest, predicate)
        }
        SLSA_V1_PREDICATE_TYPE => {
            let predicate: SlsaV1Predicate = serde_json::from_value(statement.predicate.clone())?;
            from_slsa_v1(&subject.name, digest, predicate)
        }
        other => Err(MappingError::UnsupportedPredicateType(other.to_string())),
    }
}

fn single_subject(subjects: &[Subject]) -> Result<&Subject, MappingError> {
    match subjects {
        [subject] => Ok(subject),
        _ => Err(MappingError::SubjectCount(subjects.len())),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlsaV02Predicate {
    builder: Builder,
    build_type: String,
    #[serde(default)]
    invocation: Option<Invocation>,
    #[serde(default)]
    build_config: Option<Value>,
    #[serde(default)]
    materials: Vec<ResourceDescriptor>,
}

#[derive(Debug, Deserialize)]
struct Builder {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Invocation {
    #[serde(default)]
    config_source: Option<ResourceDescriptor>,
}

#[derive(Debug, Default, Deserialize)]
struct ResourceDescriptor {
    #[serde(default)]
    uri: String,
    #[serde(default)]
    digest: DigestSet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContainerBuildConfig {
    command: Vec<String>,
}

fn from_slsa_v02(
    name: &str,
    digest: &str,
    predicate: SlsaV02Predicate,
) -> Result<ProvenanceIR, MappingError> {
    let mut ir = ProvenanceIR::new(name, digest, predicate.build_type.as_str())
        .with_trusted_builder(predicate.builder.id);

    match predicate.build_type.as_str() {
        CONTAINER_BASED_BUILD_TYPE => {
            let config = predicate
                .build_config
                .ok_or(MappingError::MissingField("buildConfig"))?;
            let config: ContainerBuildConfig = serde_json::from_value(config)?;
            if config.command.is_empty() {
                return Err(MappingError::MissingField("buildConfig.command"));
            }
            ir = ir.with_build_cmd(config.command);

            for material in predicate.materials {
                if let Some(image) = material.digest.get("sha256") {
                    ir = ir.with_builder_image_sha256_digest(image);
                } else if let Some(commit) = material.digest.get("sha1") {
                    ir = ir
                        .with_repo_uri(material.uri)
                        .with_commit_sha1_digest(commit);
                }
            }
            Ok(ir)
        }
        GENERIC_GENERATOR_BUILD_TYPE | GO_GENERATOR_BUILD_TYPE => {
            let source = predicate
                .invocation
                .and_then(|invocation| invocation.config_source)
                .ok_or(MappingError::MissingField("invocation.configSource"))?;
            if let Some(commit) = source.digest.get("sha1") {
                ir = ir.with_commit_sha1_digest(commit);
            }
            if !source.uri.is_empty() {
                ir = ir.with_repo_uri(normalize_repo_uri(&source.uri));
            }
            Ok(ir)
        }
        other => Err(MappingError::UnsupportedBuildType {
            predicate_type: SLSA_V02_PREDICATE_TYPE.to_string(),
            build_type: other.to_string(),
        }),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlsaV1Predicate {
    build_definition: BuildDefinition,
    run_details: RunDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildDefinition {
    build_type: String,
    #[serde(default)]
    resolved_dependencies: Vec<ResourceDescriptor>,
}

#[derive(Debug, Deserialize)]
struct RunDetails {
    builder: Builder,
}

fn from_slsa_v1(
    name: &str,
    digest: &str,
    predicate: SlsaV1Predicate,
) -> Result<ProvenanceIR, MappingError> {
    let definition = predicate.build_definition;
    if definition.build_type.is_empty() {
        return Err(MappingError::MissingField("buildDefinition.buildType"));
    }

    let mut ir = ProvenanceIR::new(name, digest, definition.build_type)
        .with_trusted_builder(predicate.run_details.builder.id);

    for dependency in definition.resolved_dependencies {
        let commit = dependency
            .digest
            .get("gitCommit")
            .or_else(|| dependency.digest.get("sha1"));
        if let Some(commit) = commit {
            ir = ir
                .with_commit_sha1_digest(commit.as_str())
                .with_repo_uri(normalize_repo_uri(&dependency.uri));
        }
    }
    Ok(ir)
}

/// `git+https://github.com/org/repo@refs/heads/main` -> `https://github.com/org/repo`
fn normalize_repo_uri(uri: &str) -> String {
    let uri = uri.strip_prefix("git+").unwrap_or(uri);
    match uri.rsplit_once('@') {
        Some((repo, _)) if repo.contains("://") => repo.to_string(),
        _ => uri.to_string(),
    }
}
