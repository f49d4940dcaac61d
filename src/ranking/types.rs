// types.rs - Catalog records, user profile, and score explanations.
//
// Opportunities arrive as loose JSON objects from the UI. Required fields are
// validated here; optional ones get their documented defaults.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::error::{RankError, Result};
use crate::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OpportunityType {
    Internship,
    Scholarship,
    Fellowship,
    Research,
    Program,
}

impl OpportunityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internship => "internship",
            Self::Scholarship => "scholarship",
            Self::Fellowship => "fellowship",
            Self::Research => "research",
            Self::Program => "program",
        }
    }
}

impl FromStr for OpportunityType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "internship" => Ok(Self::Internship),
            "scholarship" => Ok(Self::Scholarship),
            "fellowship" => Ok(Self::Fellowship),
            "research" => Ok(Self::Research),
            "program" => Ok(Self::Program),
            other => Err(format!("unknown opportunity type '{other}'")),
        }
    }
}

impl TryFrom<String> for OpportunityType {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<OpportunityType> for String {
    fn from(t: OpportunityType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for OpportunityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work mode of an opportunity. Anything that is not one of the three known
/// modes is kept as a free-form (lowercased) place name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Location {
    Remote,
    Onsite,
    Hybrid,
    Other(String),
}

impl Location {
    pub fn parse(s: &str) -> Self {
        let norm = s.trim().to_lowercase();
        match norm.as_str() {
            "remote" => Self::Remote,
            "onsite" => Self::Onsite,
            "hybrid" => Self::Hybrid,
            _ => Self::Other(norm),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Remote => "remote",
            Self::Onsite => "onsite",
            Self::Hybrid => "hybrid",
            Self::Other(s) => s,
        }
    }

    /// Remote and hybrid are close enough to partially satisfy each other.
    pub fn is_flexible(&self) -> bool {
        matches!(self, Self::Remote | Self::Hybrid)
    }
}

impl From<String> for Location {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Location> for String {
    fn from(l: Location) -> Self {
        l.as_str().to_string()
    }
}

/// One catalog entry, validated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    pub id: String,
    pub title: String,
    pub organization: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: OpportunityType,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    pub stipend: bool,
    pub year_min: i64,
    pub year_max: i64,
    pub tags: Vec<String>,
    pub inclusive_flags: Vec<String>,
    pub link: String,
}

/// Raw shape of a catalog record before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpportunityRecord {
    id: Option<Value>,
    title: Option<String>,
    organization: Option<String>,
    description: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    location: Option<String>,
    deadline: Option<String>,
    stipend: Option<bool>,
    year_min: Option<i64>,
    year_max: Option<i64>,
    tags: Option<Vec<String>>,
    inclusive_flags: Option<Vec<String>>,
    link: Option<String>,
}

impl Opportunity {
    /// Validate a JSON record at `index` in the catalog.
    pub fn from_value(index: usize, value: &Value) -> Result<Self> {
        let rec: OpportunityRecord = serde_json::from_value(value.clone())
            .map_err(|e| RankError::malformed(index, e.to_string()))?;

        // Ids show up as strings or numbers depending on who wrote the catalog.
        let id = match rec.id {
            Some(Value::String(s)) if !s.trim().is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => return Err(RankError::malformed(index, "invalid field: id")),
            None => return Err(RankError::malformed(index, "missing field: id")),
        };

        let title = required(index, "title", rec.title)?;
        let description = required(index, "description", rec.description)?;
        let kind = required(index, "type", rec.kind)?
            .parse::<OpportunityType>()
            .map_err(|e| RankError::malformed(index, e))?;
        let location = Location::parse(&required(index, "location", rec.location)?);
        let stipend = rec
            .stipend
            .ok_or_else(|| RankError::malformed(index, "missing field: stipend"))?;
        let link = required(index, "link", rec.link)?;

        let year_min = rec.year_min.unwrap_or(config::scoring::DEFAULT_YEAR_MIN);
        let year_max = rec.year_max.unwrap_or(config::scoring::DEFAULT_YEAR_MAX);
        if year_min > year_max {
            return Err(RankError::malformed(
                index,
                format!("invalid year range: {year_min}..{year_max}"),
            ));
        }

        Ok(Self {
            id,
            title,
            organization: rec.organization.unwrap_or_default(),
            description,
            kind,
            location,
            deadline: rec.deadline.filter(|d| !d.trim().is_empty()),
            stipend,
            year_min,
            year_max,
            tags: rec.tags.unwrap_or_default(),
            inclusive_flags: rec.inclusive_flags.unwrap_or_default(),
            link,
        })
    }

    /// Deadline as a calendar date, if it is written as `YYYY-MM-DD`.
    pub fn deadline_date(&self) -> Option<NaiveDate> {
        let raw = self.deadline.as_deref()?;
        NaiveDate::parse_from_str(raw.trim(), config::scoring::DEADLINE_FORMAT).ok()
    }

    /// Unparseable or missing deadlines never expire.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.deadline_date().map(|d| d < today).unwrap_or(false)
    }
}

fn required(index: usize, field: &str, v: Option<String>) -> Result<String> {
    match v {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(RankError::malformed(index, format!("missing field: {field}"))),
    }
}

/// The ranking query. Built fresh per request, never stored.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub country: String,
    pub branch: String,
    pub year: i64,
    pub cgpa: String,
    pub interests: String,
    pub goals: String,
    pub location_pref: String,
    pub duration_pref: String,
    pub needs_stipend: bool,
    pub is_female: bool,
    pub low_income: bool,
    pub opportunity_filter: Vec<OpportunityType>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: String::new(),
            country: String::new(),
            branch: String::new(),
            year: config::scoring::DEFAULT_YEAR_MIN,
            cgpa: String::new(),
            interests: String::new(),
            goals: String::new(),
            location_pref: config::scoring::NO_PREFERENCE.to_string(),
            duration_pref: String::new(),
            needs_stipend: false,
            is_female: false,
            low_income: false,
            opportunity_filter: Vec::new(),
        }
    }
}

impl Profile {
    /// `None` means the user has no location preference.
    pub fn location_preference(&self) -> Option<Location> {
        let pref = self.location_pref.trim().to_lowercase();
        if pref.is_empty() || pref == config::scoring::NO_PREFERENCE {
            None
        } else {
            Some(Location::parse(&pref))
        }
    }

    /// Lowercased whitespace tokens of the interests text, deduplicated in
    /// first-seen order.
    pub fn interest_tokens(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for tok in self.interests.to_lowercase().split_whitespace() {
            if !out.iter().any(|t| t == tok) {
                out.push(tok.to_string());
            }
        }
        out
    }

    /// Caller-side validation. The engine still scores an empty profile.
    pub fn validate(&self) -> Result<()> {
        if self.interests.trim().is_empty() && self.goals.trim().is_empty() {
            return Err(RankError::EmptyInput);
        }
        Ok(())
    }

    pub fn wants(&self, kind: OpportunityType) -> bool {
        self.opportunity_filter.is_empty() || self.opportunity_filter.contains(&kind)
    }
}

/// Per-rule breakdown of one final score, in pipeline order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreExplanation {
    entries: Vec<(&'static str, f64)>,
}

impl ScoreExplanation {
    pub fn push(&mut self, name: &'static str, value: f64) {
        self.entries.push((name, value));
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[(&'static str, f64)] {
        &self.entries
    }
}

impl Serialize for ScoreExplanation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
