//! Named point-in-time counters shown alongside a leak check
//! (cache sizes, loaded entities, open sessions).

use serde::Serialize;

use crate::utils::error::SourceError;

pub trait CountProbe: Send + Sync {
    fn name(&self) -> &str;
    fn read(&self) -> Result<u64, SourceError>;
}

/// Probe backed by a closure
pub struct NamedProbe<F> {
    name: String,
    read: F,
}

impl<F> NamedProbe<F>
where
    F: Fn() -> Result<u64, SourceError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, read: F) -> Self {
        Self {
            name: name.into(),
            read,
        }
    }
}

impl<F> CountProbe for NamedProbe<F>
where
    F: Fn() -> Result<u64, SourceError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<u64, SourceError> {
        (self.read)()
    }
}

/// Outcome of reading one probe; a failure stays local to its line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeReading {
    pub name: String,
    #[serde(flatten)]
    pub value: Section<u64>,
}

/// A report section that either produced a value or failed on its own
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section<T> {
    Value(T),
    Error(String),
}

impl<T> Section<T> {
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Section::Value(v),
            Err(e) => Section::Error(e.to_string()),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Section::Value(v) => Some(v),
            Section::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Section::Error(_))
    }
}

/// Read every probe independently
pub fn read_probes(probes: &[Box<dyn CountProbe>]) -> Vec<ProbeReading> {
    probes
        .iter()
        .map(|p| ProbeReading {
            name: p.name().to_string(),
            value: Section::from_result(p.read()),
        })
        .collect()
}
