use crate::{
    error::AppError,
    store::{Candidate, Store},
};

/// Admin overview, recomputed from the store on every view.
#[derive(Debug)]
pub struct DashboardSummary {
    pub login_count: u64,
    pub candidate_count: usize,
    /// All stored candidates, in submission order.
    pub recent_candidates: Vec<Candidate>,
}

pub async fn summary(store: &Store) -> Result<DashboardSummary, AppError> {
    let login_count = store.login_count().await?;
    let recent_candidates = store.load_candidates().await?;
    Ok(DashboardSummary {
        login_count,
        candidate_count: recent_candidates.len(),
        recent_candidates,
    })
}
