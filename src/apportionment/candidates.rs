use crate::models::Candidate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResult {
    pub candidate_id: String,
    pub name: String,
    pub number: u32,
    pub party_id: String,
    pub votes: u64,
    // 1-based position in the entity's ranking.
    pub position: usize,
    // Reached the individual minimum vote threshold.
    pub eligible: bool,
    pub elected: bool,
}

// Rank an entity's candidates and mark the top `seats` eligible ones elected.
// Candidates are ordered by votes descending, ties broken by id. Anyone
// below `min_votes` keeps their ranking position but is never elected.
pub fn rank_and_elect(
    candidates: &[&Candidate],
    candidate_votes: &HashMap<String, u64>,
    min_votes: u64,
    seats: u32,
) -> Vec<CandidateResult> {
    let mut ranked: Vec<(&Candidate, u64)> = candidates
        .iter()
        .map(|candidate| {
            let votes = candidate_votes.get(&candidate.id).copied().unwrap_or(0);
            (*candidate, votes)
        })
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));

    let mut elected_count = 0u32;
    ranked
        .into_iter()
        .enumerate()
        .map(|(i, (candidate, votes))| {
            let eligible = votes >= min_votes;
            let elected = eligible && elected_count < seats;
            if elected {
                elected_count += 1;
            }
            CandidateResult {
                candidate_id: candidate.id.clone(),
                name: candidate.name.clone(),
                number: candidate.number,
                party_id: candidate.party_id.clone(),
                votes,
                position: i + 1,
                eligible,
                elected,
            }
        })
        .collect()
}
