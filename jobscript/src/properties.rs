use combine::parser::char::{char, spaces, string};
use combine::parser::range::take_while;
use combine::Parser;
use serde::Deserialize;
use serde_json::Value;

use util::HashMap;

use crate::MalformedDescriptor;

/// Job metadata as serialized by the workflow engine into the job script.
///
/// Only the keys we consume are typed; everything else in the JSON object is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct JobProperties {
    /// Rule name of a single job.
    #[serde(default, alias = "name")]
    pub rule: Option<String>,
    /// "single" or "group".
    #[serde(default, rename = "type")]
    pub job_type: Option<String>,
    /// Group jobs carry a group id instead of a rule name.
    #[serde(default)]
    pub groupid: Option<String>,
    #[serde(default)]
    pub threads: Option<Value>,
    #[serde(default)]
    pub resources: HashMap<String, Value>,
}

impl JobProperties {
    /// Find the first properties line in a job script and decode its JSON payload.
    pub fn extract(script_text: &str) -> Result<Self, MalformedDescriptor> {
        let json = script_text
            .lines()
            .find_map(|line| properties_line().parse(line).ok().map(|(json, _)| json))
            .ok_or(MalformedDescriptor::MissingProperties)?;
        Ok(serde_json::from_str(json)?)
    }

    /// Name to submit the job under: the rule for single jobs, the group id for group jobs.
    pub fn job_name(&self) -> Option<&str> {
        match (&self.rule, self.job_type.as_deref()) {
            (Some(rule), _) => Some(rule.as_str()),
            (None, Some("group")) => self.groupid.as_deref(),
            (None, _) => None,
        }
    }

    /// First resource value found among `keys`, in order of preference.
    pub fn resource(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .filter_map(|k| self.resources.get(*k))
            .find(|v| !v.is_null())
    }
}

// matches `# properties = <json>`, returning the json:
fn properties_line<'a>() -> impl Parser<&'a str, Output = &'a str> {
    spaces()
        .with(char('#'))
        .skip(spaces())
        .with(string("properties"))
        .skip(spaces())
        .with(char('='))
        .skip(spaces())
        .with(take_while(|_: char| true))
}
