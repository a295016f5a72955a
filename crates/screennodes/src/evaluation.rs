//! Structured scoring result produced by the aggregator agent.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

pub const MAX_SCORE: u32 = 100;

/// Points per scoring category (skills 30, experience 50, education 10,
/// extras 10).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    #[serde(default)]
    pub skills: u32,
    #[serde(default)]
    pub experience: u32,
    #[serde(default)]
    pub education: u32,
    #[serde(default)]
    pub extras: u32,
}

impl CategoryScores {
    pub fn total(&self) -> u32 {
        self.skills
            .saturating_add(self.experience)
            .saturating_add(self.education)
            .saturating_add(self.extras)
    }

    /// Cap each category at its maximum.
    pub fn clamped(self) -> Self {
        Self {
            skills: self.skills.min(30),
            experience: self.experience.min(50),
            education: self.education.min(10),
            extras: self.extras.min(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<CategoryScores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl Evaluation {
    /// Read a model response.
    ///
    /// The first `{`..last `}` span is tried as JSON. Otherwise the score is
    /// pulled out of the prose and the prose becomes the summary.
    pub fn parse(response: &str) -> Self {
        Self::from_json(response).unwrap_or_else(|| Self::from_prose(response))
    }

    /// Structured form only: `None` when the response holds no valid JSON
    /// evaluation.
    pub fn from_json(response: &str) -> Option<Self> {
        json_span(response)
            .and_then(|json| serde_json::from_str::<Evaluation>(json).ok())
            .map(Self::clamped)
    }

    /// Score pulled out of free text, with the text as the summary.
    pub fn from_prose(response: &str) -> Self {
        let text = response.trim();
        Self {
            score: extract_score(text),
            breakdown: None,
            summary: (!text.is_empty()).then(|| text.to_string()),
            recommendation: None,
        }
        .clamped()
    }

    pub fn from_payload(payload: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(payload.clone()).ok()
    }

    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn verdict(&self, threshold: u32) -> Verdict {
        Verdict {
            score: self.score,
            threshold,
            shortlisted: self.score >= threshold,
        }
    }

    fn clamped(mut self) -> Self {
        self.score = self.score.min(MAX_SCORE);
        self.breakdown = self.breakdown.map(CategoryScores::clamped);
        self
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Score: {}/{}", self.score, MAX_SCORE)?;
        if let Some(b) = &self.breakdown {
            write!(
                f,
                " (skills {}/30, experience {}/50, education {}/10, extras {}/10)",
                b.skills, b.experience, b.education, b.extras
            )?;
        }
        if let Some(summary) = &self.summary {
            write!(f, "\n{}", summary)?;
        }
        if let Some(recommendation) = &self.recommendation {
            write!(f, "\n{}", recommendation)?;
        }
        Ok(())
    }
}

/// Shortlist decision against a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub score: u32,
    pub threshold: u32,
    pub shortlisted: bool,
}

/// Pull a score out of free text: `82/100` first, then `Score: 82`, else 0.
pub fn extract_score(text: &str) -> u32 {
    static OUT_OF_HUNDRED: OnceLock<Regex> = OnceLock::new();
    static LABELLED: OnceLock<Regex> = OnceLock::new();

    let out_of_hundred = OUT_OF_HUNDRED.get_or_init(|| Regex::new(r"(\d+)\s*/\s*100").unwrap());
    let labelled = LABELLED.get_or_init(|| Regex::new(r"[Ss]core[^0-9]*(\d+)").unwrap());

    [out_of_hundred, labelled]
        .iter()
        .find_map(|re| re.captures(text).and_then(|c| c[1].parse::<u32>().ok()))
        .unwrap_or(0)
}

fn json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
