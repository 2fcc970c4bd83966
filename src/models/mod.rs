use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub id: String,
    pub name: String,
    pub number: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub number: u32,
    pub party_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllianceType {
    Coalition,
    Federation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectoralAlliance {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub alliance_type: AllianceType,
    pub member_party_ids: Vec<String>,
}

// Votes for one calculation request.
// `party_votes` holds the votes cast for the party label alone; a party's
// total is its label votes plus the nominal votes of its candidates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub valid_votes: u64,
    pub available_seats: u32,
    #[serde(default)]
    pub party_votes: HashMap<String, u64>,
    #[serde(default)]
    pub candidate_votes: HashMap<String, u64>,
}

// Read-only registry of the electoral actors taking part in a contest.
// The order of `parties` is the registration order used for deterministic
// tie-breaking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    pub parties: Vec<Party>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub alliances: Vec<ElectoralAlliance>,
}

impl Registry {
    pub fn candidates_of<'a>(&'a self, party_id: &'a str) -> impl Iterator<Item = &'a Candidate> + 'a {
        self.candidates
            .iter()
            .filter(move |candidate| candidate.party_id == party_id)
    }

    // The federation a party belongs to, if any. Coalitions are not returned.
    pub fn federation_of(&self, party_id: &str) -> Option<&ElectoralAlliance> {
        self.alliances.iter().find(|alliance| {
            alliance.alliance_type == AllianceType::Federation
                && alliance.member_party_ids.iter().any(|id| id == party_id)
        })
    }
}

// One party's totals for one year, state and position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalVoteRecord {
    pub year: i32,
    pub party: String,
    pub state: String,
    pub position: String,
    pub total_votes: u64,
    #[serde(default)]
    pub candidate_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollingPoint {
    pub party: String,
    pub percent: f64,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyAdjustment {
    // Percentage points added to the party's latest share.
    #[serde(default)]
    pub vote_share_adjust: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorImpact {
    Positive,
    Negative,
    Neutral,
}

impl FactorImpact {
    pub fn sign(self) -> f64 {
        match self {
            FactorImpact::Positive => 1.0,
            FactorImpact::Negative => -1.0,
            FactorImpact::Neutral => 0.0,
        }
    }
}

// A qualitative event (scandal, economic shock, ...) scored by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalFactor {
    pub description: String,
    pub impact: FactorImpact,
    // Strength on a 0-100 scale.
    pub magnitude: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioAdjustment {
    #[serde(default)]
    pub polling_data: Vec<PollingPoint>,
    #[serde(default)]
    pub party_adjustments: HashMap<String, PartyAdjustment>,
    #[serde(default)]
    pub external_factors: Vec<ExternalFactor>,
}

impl ScenarioAdjustment {
    pub fn is_empty(&self) -> bool {
        self.polling_data.is_empty()
            && self.party_adjustments.is_empty()
            && self.external_factors.is_empty()
    }
}
