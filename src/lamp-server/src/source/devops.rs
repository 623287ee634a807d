// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Azure DevOps build source.
//!
//! Project and definition ids are looked up lazily by name and cached once
//! every configured build resolves. Any failure drops the cache, so the next
//! fetch resolves again. Each fetch
//! reports the latest build of every resolved definition.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use lamp_core::build::source::EventsFuture;
use lamp_core::{BuildData, BuildEventRecord, BuildStatus, DynResult, EventSource};

use crate::config::BuildRef;

const PROJECTS_API_VERSION: &str = "1.0";
const BUILD_API_VERSION: &str = "2.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ResponseList<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ProjectDto {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct DefinitionDto {
    id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildDto {
    id: u64,
    result: Option<String>,
    status: Option<String>,
    requested_for: Option<PersonDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonDto {
    display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedDefinition {
    project_id: String,
    definition_id: u64,
    name: String,
}

pub struct DevOpsSource {
    client: reqwest::Client,
    base_url: String,
    token: String,
    builds: Vec<BuildRef>,
    resolved: Option<Vec<ResolvedDefinition>>,
}

impl DevOpsSource {
    pub fn new(url: String, token: String, builds: Vec<BuildRef>) -> DynResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            token,
            builds,
            resolved: None,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> DynResult<T> {
        let response = self
            .client
            .get(&url)
            .basic_auth("", Some(&self.token))
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<T>().await?)
    }

    async fn resolve(&self) -> DynResult<Vec<ResolvedDefinition>> {
        let projects: ResponseList<ProjectDto> = self
            .get_json(
                format!("{}/_apis/projects", self.base_url),
                &[
                    ("stateFilter", "All"),
                    ("api-version", PROJECTS_API_VERSION),
                ],
            )
            .await?;

        let mut resolved = Vec::new();
        for build in &self.builds {
            let Some(project_id) = find_project(&projects.value, &build.project) else {
                warn!("DevOps project '{}' not found", build.project);
                continue;
            };
            let definitions: ResponseList<DefinitionDto> = self
                .get_json(
                    format!(
                        "{}/{}/_apis/build/definitions",
                        self.base_url, project_id
                    ),
                    &[
                        ("api-version", BUILD_API_VERSION),
                        ("name", build.definition.as_str()),
                        ("$top", "1"),
                    ],
                )
                .await?;
            match definitions.value.first() {
                Some(definition) => resolved.push(ResolvedDefinition {
                    project_id: project_id.to_string(),
                    definition_id: definition.id,
                    name: build.definition.clone(),
                }),
                None => warn!(
                    "DevOps definition '{}' not found in '{}'",
                    build.definition, build.project
                ),
            }
        }
        if resolved.len() < self.builds.len() {
            warn!(
                "Watching {} of {} DevOps definition(s), retrying the rest next cycle",
                resolved.len(),
                self.builds.len()
            );
        } else {
            info!("Watching {} DevOps definition(s)", resolved.len());
        }
        Ok(resolved)
    }

    async fn latest_builds(
        &self,
        definitions: &[ResolvedDefinition],
    ) -> DynResult<Vec<BuildEventRecord>> {
        let mut records = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let definition_id = definition.definition_id.to_string();
            let builds: ResponseList<BuildDto> = self
                .get_json(
                    format!(
                        "{}/{}/_apis/build/builds",
                        self.base_url, definition.project_id
                    ),
                    &[
                        ("api-version", BUILD_API_VERSION),
                        ("definitions", definition_id.as_str()),
                        ("$top", "1"),
                    ],
                )
                .await?;
            match builds.value.into_iter().next() {
                Some(build) => records.push(build_record(&definition.name, build)),
                None => debug!("No builds yet for {}", definition.name),
            }
        }
        Ok(records)
    }

    async fn fetch(&mut self) -> DynResult<Vec<BuildEventRecord>> {
        let definitions = match self.resolved.take() {
            Some(definitions) => definitions,
            None => self.resolve().await?,
        };
        let records = self.latest_builds(&definitions).await?;
        if is_complete(&definitions, &self.builds) {
            self.resolved = Some(definitions);
        }
        Ok(records)
    }
}

fn find_project<'a>(projects: &'a [ProjectDto], name: &str) -> Option<&'a str> {
    projects
        .iter()
        .find(|p| p.name == name)
        .map(|p| p.id.as_str())
}

/// Only a resolution covering every configured build is cached; a missing
/// project or definition is looked up again on the next fetch.
fn is_complete(resolved: &[ResolvedDefinition], builds: &[BuildRef]) -> bool {
    resolved.len() == builds.len()
}

fn build_record(definition_name: &str, build: BuildDto) -> BuildEventRecord {
    BuildEventRecord {
        kind: "build".to_string(),
        data: BuildData {
            build_id: build.id.to_string(),
            build_name: definition_name.to_string(),
            status: BuildStatus::from_result_or_status(
                build.result.as_deref(),
                build.status.as_deref(),
            ),
            quality: String::new(),
            requested_for: build
                .requested_for
                .map(|p| p.display_name)
                .unwrap_or_default(),
        },
    }
}

impl EventSource for DevOpsSource {
    fn name(&self) -> &str {
        &self.base_url
    }

    fn fetch_events<'a>(&'a mut self) -> EventsFuture<'a> {
        Box::pin(self.fetch())
    }
}
