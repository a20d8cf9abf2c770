//! Static GitLab CI document for Node.js projects.
//!
//! Nothing here is parameterized: [`pipeline`] always yields the same document,
//! which [`GitlabCi::to_yaml`] renders as `.gitlab-ci.yml`.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::path::Path;

use crate::error::{Error, Result};
use crate::utils::io;

const HEADER: &str = "# Do not edit this file directly. It is generated by nodeci\n\n";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Job {
    pub script: Vec<String>,
}

impl Job {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a script line.
    pub fn script(mut self, line: impl Into<String>) -> Self {
        self.script.push(line.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cache {
    pub paths: Vec<String>,
}

/// A GitLab CI document. Jobs keep insertion order when rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitlabCi {
    image: Option<String>,
    cache: Option<Cache>,
    jobs: Vec<(String, Job)>,
}

impl GitlabCi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn cache<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cache = Some(Cache {
            paths: paths.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Add a job; re-adding a name replaces the job in place.
    pub fn add_job(mut self, name: impl Into<String>, job: Job) -> Self {
        let name = name.into();
        match self.jobs.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = job,
            None => self.jobs.push((name, job)),
        }
        self
    }

    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|(n, _)| n == name).map(|(_, job)| job)
    }

    pub fn job_names(&self) -> Vec<&str> {
        self.jobs.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn to_yaml(&self) -> Result<String> {
        let body = serde_yml::to_string(self).map_err(|e| {
            Error::internal_json(e.to_string(), Some("serialize .gitlab-ci.yml".to_string()))
        })?;
        Ok(format!("{}{}", HEADER, body))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml()?;
        io::write_file_atomic(path, &yaml, &format!("write {}", path.display()))
    }
}

impl Serialize for GitlabCi {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = self.jobs.len()
            + usize::from(self.image.is_some())
            + usize::from(self.cache.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(image) = &self.image {
            map.serialize_entry("image", image)?;
        }
        if let Some(cache) = &self.cache {
            map.serialize_entry("cache", cache)?;
        }
        for (name, job) in &self.jobs {
            map.serialize_entry(name, job)?;
        }
        map.end()
    }
}

pub fn npm_install() -> Job {
    Job::new().script("npm install")
}

pub fn yarn_install() -> Job {
    Job::new().script("yarn install")
}

pub fn npm_build() -> Job {
    Job::new().script("npm run build")
}

pub fn npm_test() -> Job {
    Job::new().script("npm run test")
}

/// The fixed Node.js pipeline document.
pub fn pipeline() -> GitlabCi {
    GitlabCi::new()
        .image("node:latest")
        .cache(["node_modules/"])
        .add_job("npm_install", npm_install())
        .add_job("npm_build", npm_build())
        .add_job("npm_test", npm_test())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_has_fixed_shape() {
        let ci = pipeline();
        assert_eq!(ci.job_names(), vec!["npm_install", "npm_build", "npm_test"]);
        assert_eq!(ci.job("npm_build").unwrap().script, vec!["npm run build"]);
        assert!(ci.job("yarn_install").is_none());
    }

    #[test]
    fn yaml_keeps_job_order_and_header() {
        let yaml = pipeline().to_yaml().unwrap();
        assert!(yaml.starts_with("# Do not edit this file directly"));

        let image = yaml.find("image: node:latest").unwrap();
        let install = yaml.find("npm_install:").unwrap();
        let build = yaml.find("npm_build:").unwrap();
        let test = yaml.find("npm_test:").unwrap();
        assert!(image < install && install < build && build < test);
    }

    #[test]
    fn yaml_parses_back() {
        let yaml = pipeline().to_yaml().unwrap();
        let value: serde_yml::Value = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(value["image"].as_str(), Some("node:latest"));
        assert_eq!(value["cache"]["paths"][0].as_str(), Some("node_modules/"));
        assert_eq!(value["npm_test"]["script"][0].as_str(), Some("npm run test"));
        assert_eq!(value["npm_test"].as_mapping().unwrap().len(), 1);
    }

    #[test]
    fn add_job_replaces_in_place() {
        let ci = GitlabCi::new()
            .add_job("a", Job::new().script("one"))
            .add_job("b", yarn_install())
            .add_job("a", Job::new().script("two"));
        assert_eq!(ci.job_names(), vec!["a", "b"]);
        assert_eq!(ci.job("a").unwrap().script, vec!["two"]);
    }

    #[test]
    fn write_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".gitlab-ci.yml");
        pipeline().write(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("npm_install:"));
    }
}
