use crate::models::Candidate;

/// Geometric limits a candidate must satisfy to be treated as a card
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateLimits {
    pub min_area: f32,
    pub min_aspect: f32,
    pub max_aspect: f32,
}

impl Default for CandidateLimits {
    fn default() -> Self {
        Self {
            min_area: 500.0,
            min_aspect: 0.4,
            max_aspect: 1.0,
        }
    }
}

impl CandidateLimits {
    pub fn accepts(&self, candidate: &Candidate, frame_width: u32, frame_height: u32) -> bool {
        let aspect = candidate.aspect_ratio();
        candidate.area >= self.min_area
            && aspect >= self.min_aspect
            && aspect <= self.max_aspect
            && candidate.bbox.fits_within(frame_width, frame_height)
    }
}

/// Keep card-shaped candidates, preserving discovery order
pub fn filter_candidates(
    candidates: Vec<Candidate>,
    limits: &CandidateLimits,
    frame_width: u32,
    frame_height: u32,
) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| limits.accepts(c, frame_width, frame_height))
        .collect()
}
