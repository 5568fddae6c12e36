//! Professional selection: an ordered list of candidate strategies, a load
//! filter, and a final pick.

use crate::domain::entities::{GeoPoint, Professional};
use crate::domain::ports::lead_repository::LeadRepository;
use crate::domain::ports::professional_repository::ProfessionalRepository;
use crate::domain::services::geo::{distance_km, normalize_place, resolve_place, MATCH_RADIUS_KM};
use crate::infrastructure::http::middleware::error::ApiResult;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// Leads in a load-bearing status a professional may hold before being skipped.
pub const MAX_PRO_LOAD: i64 = 3;

/// Candidate sources, tried in this order; the first non-empty set wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    Geo,
    ServiceArea,
    ReverseServiceArea,
    CatchAll,
}

impl MatchStrategy {
    pub const ORDER: [MatchStrategy; 4] = [
        MatchStrategy::Geo,
        MatchStrategy::ServiceArea,
        MatchStrategy::ReverseServiceArea,
        MatchStrategy::CatchAll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::Geo => "geo",
            MatchStrategy::ServiceArea => "service_area",
            MatchStrategy::ReverseServiceArea => "reverse_service_area",
            MatchStrategy::CatchAll => "catch_all",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CandidateSet {
    pub strategy: MatchStrategy,
    pub candidates: Vec<Professional>,
}

#[derive(Clone)]
pub struct MatchingService {
    professional_repo: Arc<dyn ProfessionalRepository>,
    lead_repo: Arc<dyn LeadRepository>,
}

impl MatchingService {
    pub fn new(
        professional_repo: Arc<dyn ProfessionalRepository>,
        lead_repo: Arc<dyn LeadRepository>,
    ) -> Self {
        Self {
            professional_repo,
            lead_repo,
        }
    }

    /// Best eligible professional, or `None` when nobody can be found right
    /// now. Storage errors are logged and reported as `None`.
    pub async fn find_professional(
        &self,
        issue_type: &str,
        location_text: &str,
        exclude: &[String],
    ) -> Option<Professional> {
        match self.try_find(location_text, exclude).await {
            Ok(Some(pro)) => {
                tracing::info!(
                    "Matched professional {} for '{}' in '{}'",
                    pro.id,
                    issue_type,
                    location_text
                );
                Some(pro)
            }
            Ok(None) => {
                tracing::warn!(
                    "No professional available for '{}' in '{}'",
                    issue_type,
                    location_text
                );
                None
            }
            Err(e) => {
                tracing::error!("Matching failed for '{}': {}", location_text, e);
                None
            }
        }
    }

    async fn try_find(&self, location_text: &str, exclude: &[String]) -> ApiResult<Option<Professional>> {
        let Some(set) = self.candidates(location_text, exclude).await? else {
            return Ok(None);
        };
        let loads = self.lead_repo.count_open_leads_by_professional().await?;
        tracing::debug!(
            "Strategy {} produced {} candidates",
            set.strategy.as_str(),
            set.candidates.len()
        );
        Ok(select(set, &loads))
    }

    /// First non-empty candidate set in strategy order.
    pub async fn candidates(
        &self,
        location_text: &str,
        exclude: &[String],
    ) -> ApiResult<Option<CandidateSet>> {
        let origin = resolve_place(location_text);

        for strategy in MatchStrategy::ORDER {
            let candidates = match strategy {
                MatchStrategy::Geo => match origin {
                    Some(point) => {
                        let active = self.professional_repo.list_active_professionals().await?;
                        geo_candidates(point, active, exclude)
                    }
                    None => continue,
                },
                MatchStrategy::ServiceArea => {
                    let found = self
                        .professional_repo
                        .list_active_by_service_area(location_text)
                        .await?;
                    without_excluded(found, exclude)
                }
                MatchStrategy::ReverseServiceArea => {
                    let active = self.professional_repo.list_active_professionals().await?;
                    reverse_area_candidates(location_text, active, exclude)
                }
                MatchStrategy::CatchAll => {
                    let active = self.professional_repo.list_active_professionals().await?;
                    without_excluded(active, exclude)
                }
            };

            if !candidates.is_empty() {
                return Ok(Some(CandidateSet {
                    strategy,
                    candidates,
                }));
            }
        }

        Ok(None)
    }
}

fn without_excluded(candidates: Vec<Professional>, exclude: &[String]) -> Vec<Professional> {
    candidates
        .into_iter()
        .filter(|p| p.is_active && !exclude.contains(&p.id))
        .collect()
}

/// Professionals with a location inside the match radius, nearest first.
pub fn geo_candidates(
    origin: GeoPoint,
    active: Vec<Professional>,
    exclude: &[String],
) -> Vec<Professional> {
    let mut nearby: Vec<(f64, Professional)> = without_excluded(active, exclude)
        .into_iter()
        .filter_map(|p| {
            let distance = distance_km(origin, p.location?);
            (distance <= MATCH_RADIUS_KM).then_some((distance, p))
        })
        .collect();
    nearby.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    nearby.into_iter().map(|(_, p)| p).collect()
}

/// Professionals with any service area that appears inside `location_text`.
pub fn reverse_area_candidates(
    location_text: &str,
    active: Vec<Professional>,
    exclude: &[String],
) -> Vec<Professional> {
    let haystack = normalize_place(location_text);
    without_excluded(active, exclude)
        .into_iter()
        .filter(|p| {
            p.service_areas.iter().any(|area| {
                let area = normalize_place(area);
                !area.is_empty() && haystack.contains(&area)
            })
        })
        .collect()
}

/// Load filter plus final pick. Geo candidates keep distance order; the
/// others go by rating. If every candidate is overloaded the highest-rated
/// one is returned anyway.
pub fn select(set: CandidateSet, loads: &HashMap<String, i64>) -> Option<Professional> {
    let load_of = |p: &Professional| loads.get(&p.id).copied().unwrap_or(0);
    let (available, overloaded): (Vec<Professional>, Vec<Professional>) = set
        .candidates
        .into_iter()
        .partition(|p| load_of(p) < MAX_PRO_LOAD);

    if available.is_empty() {
        tracing::warn!("All candidates at load limit, falling back to highest rating");
        return highest_rated(overloaded);
    }

    match set.strategy {
        MatchStrategy::Geo => available.into_iter().next(),
        _ => highest_rated(available),
    }
}

/// Highest rating wins; equal ratings keep input order.
fn highest_rated(mut candidates: Vec<Professional>) -> Option<Professional> {
    candidates.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal));
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pro(id: &str, rating: f64, location: Option<GeoPoint>, areas: &[&str]) -> Professional {
        let mut p = Professional::new(
            id.to_string(),
            format!("phone-{}", id),
            areas.iter().map(|a| a.to_string()).collect(),
            vec![],
            location,
        )
        .unwrap();
        p.id = id.to_string();
        p.rating = rating;
        p
    }

    fn loads(entries: &[(&str, i64)]) -> HashMap<String, i64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_geo_candidates_sorted_by_distance_within_radius() {
        let tel_aviv = resolve_place("tel aviv").unwrap();
        let ramat_gan = resolve_place("ramat gan").unwrap();
        let haifa = resolve_place("haifa").unwrap();
        let active = vec![
            pro("far", 5.0, Some(haifa), &[]),
            pro("near", 3.0, Some(ramat_gan), &[]),
            pro("here", 4.0, Some(tel_aviv), &[]),
            pro("nowhere", 5.0, None, &[]),
        ];

        let ids: Vec<String> = geo_candidates(tel_aviv, active, &[])
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["here", "near"]);
    }

    #[test]
    fn test_geo_candidates_respect_exclusion() {
        let tel_aviv = resolve_place("tel aviv").unwrap();
        let active = vec![pro("here", 4.0, Some(tel_aviv), &[])];
        assert!(geo_candidates(tel_aviv, active, &["here".to_string()]).is_empty());
    }

    #[test]
    fn test_reverse_area_matches_area_inside_text() {
        let active = vec![
            pro("a", 4.0, None, &["Kiryat Ono"]),
            pro("b", 4.0, None, &["Eilat"]),
        ];
        let found = reverse_area_candidates("Herzl 5, kiryat  ono", active, &[]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");
    }

    #[test]
    fn test_load_filter_skips_busy_professionals() {
        let set = CandidateSet {
            strategy: MatchStrategy::ServiceArea,
            candidates: vec![
                pro("busy-1", 5.0, None, &[]),
                pro("busy-2", 4.8, None, &[]),
                pro("free", 3.0, None, &[]),
            ],
        };
        let chosen = select(set, &loads(&[("busy-1", 3), ("busy-2", 4), ("free", 2)])).unwrap();
        assert_eq!(chosen.id, "free");
    }

    #[test]
    fn test_all_overloaded_returns_highest_rated() {
        let set = CandidateSet {
            strategy: MatchStrategy::Geo,
            candidates: vec![
                pro("a", 4.1, None, &[]),
                pro("b", 4.9, None, &[]),
                pro("c", 4.5, None, &[]),
            ],
        };
        let chosen = select(set, &loads(&[("a", 3), ("b", 3), ("c", 5)])).unwrap();
        assert_eq!(chosen.id, "b");
    }

    #[test]
    fn test_geo_path_prefers_distance_over_rating() {
        let set = CandidateSet {
            strategy: MatchStrategy::Geo,
            candidates: vec![pro("nearest", 3.0, None, &[]), pro("best", 5.0, None, &[])],
        };
        assert_eq!(select(set, &HashMap::new()).unwrap().id, "nearest");
    }

    #[test]
    fn test_equal_ratings_keep_input_order() {
        let set = CandidateSet {
            strategy: MatchStrategy::CatchAll,
            candidates: vec![pro("first", 4.0, None, &[]), pro("second", 4.0, None, &[])],
        };
        assert_eq!(select(set, &HashMap::new()).unwrap().id, "first");
    }

    #[test]
    fn test_empty_set_selects_nobody() {
        let set = CandidateSet {
            strategy: MatchStrategy::CatchAll,
            candidates: vec![],
        };
        assert!(select(set, &HashMap::new()).is_none());
    }
}
