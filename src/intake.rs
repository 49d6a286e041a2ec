//! Candidate intake: validates the screening form, stores the optional
//! resume and appends the candidate.

use serde::Deserialize;
use std::{fmt, ops::RangeInclusive, path::Path};

use crate::{
    error::AppError,
    store::{Candidate, Store},
};

/// Resume formats accepted by the upload field.
pub const RESUME_EXTENSIONS: &[&str] = &["pdf", "docx"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CandidateForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub experience: String,
    pub position: String,
    pub location: String,
    pub tech_stack: String,
}

impl CandidateForm {
    /// Every field must hold something other than whitespace.
    pub fn is_complete(&self) -> bool {
        [
            &self.full_name,
            &self.email,
            &self.phone,
            &self.experience,
            &self.position,
            &self.location,
            &self.tech_stack,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }

    fn into_candidate(self, resume_path: Option<String>) -> Candidate {
        Candidate {
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            experience: self.experience,
            position: self.position,
            location: self.location,
            tech_stack: self.tech_stack,
            resume_path,
        }
    }
}

pub struct ResumeUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A random number shown after submission for display only.
///
/// This is NOT a suitability score: nothing about the candidate goes into
/// it and it is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderScore(u8);

impl PlaceholderScore {
    pub const RANGE: RangeInclusive<u8> = 60..=95;

    pub fn draw() -> Self {
        use rand::Rng;
        Self(rand::rng().random_range(Self::RANGE))
    }
}

impl fmt::Display for PlaceholderScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[derive(Debug)]
pub struct Submission {
    pub candidate: Candidate,
    pub score: PlaceholderScore,
    /// Stored candidates after this one was appended.
    pub total: usize,
}

/// Validate and store a candidate. Nothing is written when the form is
/// incomplete or the resume has an unsupported type.
pub async fn submit(
    store: &Store,
    form: CandidateForm,
    resume: Option<ResumeUpload>,
) -> Result<Submission, AppError> {
    if !form.is_complete() {
        return Err(AppError::IncompleteForm);
    }

    let saved_resume = match resume {
        Some(upload) => {
            ensure_resume_type(&upload.file_name)?;
            Some(store.save_resume(&upload.file_name, &upload.bytes).await?)
        }
        None => None,
    };

    let candidate = form.into_candidate(saved_resume.as_ref().map(|p| p.display().to_string()));
    let total = match store.append_candidate(candidate.clone()).await {
        Ok(total) => total,
        Err(e) => {
            // No record points at the file, so do not leave it behind.
            if let Some(path) = &saved_resume {
                if let Err(rm) = tokio::fs::remove_file(path).await {
                    tracing::warn!("Cannot remove orphaned resume {}: {}", path.display(), rm);
                }
            }
            return Err(e);
        }
    };

    tracing::info!(
        position = %candidate.position,
        resume = candidate.resume_path.is_some(),
        total,
        "Stored candidate"
    );

    Ok(Submission {
        candidate,
        score: PlaceholderScore::draw(),
        total,
    })
}

fn ensure_resume_type(file_name: &str) -> Result<(), AppError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some(e) if RESUME_EXTENSIONS.contains(&e) => Ok(()),
        _ => Err(AppError::UnsupportedResume(file_name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_form(email: &str) -> CandidateForm {
        CandidateForm {
            full_name: "Ada Lovelace".to_string(),
            email: email.to_string(),
            phone: "555-0100".to_string(),
            experience: "5".to_string(),
            position: "Engineer".to_string(),
            location: "London".to_string(),
            tech_stack: "Rust, SQL".to_string(),
        }
    }

    async fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_incomplete_form_stores_nothing() {
        let (_dir, store) = temp_store().await;
        let mut form = complete_form("ada@example.com");
        form.tech_stack = "   ".to_string();
        assert!(matches!(
            submit(&store, form, None).await,
            Err(AppError::IncompleteForm)
        ));

        let mut form = complete_form("ada@example.com");
        form.phone.clear();
        let resume = ResumeUpload {
            file_name: "cv.pdf".to_string(),
            bytes: b"%PDF".to_vec(),
        };
        assert!(submit(&store, form, Some(resume)).await.is_err());

        assert!(store.load_candidates().await.unwrap().is_empty());
        assert!(store.open_resume("cv.pdf").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_same_email_twice_gives_two_records() {
        let (_dir, store) = temp_store().await;
        submit(&store, complete_form("ada@example.com"), None)
            .await
            .unwrap();
        let mut second = complete_form("ada@example.com");
        second.position = "Lead".to_string();
        let submission = submit(&store, second, None).await.unwrap();
        assert_eq!(submission.total, 2);

        let stored = store.load_candidates().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].position, "Engineer");
        assert_eq!(stored[1].position, "Lead");
        assert_eq!(stored[1].email, "ada@example.com");
        assert_eq!(stored[1].tech_stack, "Rust, SQL");
    }

    #[tokio::test]
    async fn test_resume_is_saved_and_recorded() {
        let (_dir, store) = temp_store().await;
        let resume = ResumeUpload {
            file_name: "Ada CV.PDF".to_string(),
            bytes: b"%PDF-1.7".to_vec(),
        };
        let submission = submit(&store, complete_form("ada@example.com"), Some(resume))
            .await
            .unwrap();

        let expected = store.resume_dir().join("Ada CV.PDF");
        assert_eq!(
            submission.candidate.resume_path.as_deref(),
            Some(expected.display().to_string().as_str())
        );
        assert_eq!(tokio::fs::read(&expected).await.unwrap(), b"%PDF-1.7");
        assert_eq!(store.load_candidates().await.unwrap()[0], submission.candidate);
    }

    #[tokio::test]
    async fn test_unsupported_resume_type() {
        let (_dir, store) = temp_store().await;
        let resume = ResumeUpload {
            file_name: "cv.exe".to_string(),
            bytes: vec![0x4d, 0x5a],
        };
        assert!(matches!(
            submit(&store, complete_form("ada@example.com"), Some(resume)).await,
            Err(AppError::UnsupportedResume(_))
        ));
        assert!(store.load_candidates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_append_removes_resume() {
        let (_dir, store) = temp_store().await;
        // A directory where the candidates file should be makes the append fail.
        tokio::fs::create_dir(store.root().join("candidates.json"))
            .await
            .unwrap();
        let resume = ResumeUpload {
            file_name: "cv.pdf".to_string(),
            bytes: b"%PDF".to_vec(),
        };
        assert!(matches!(
            submit(&store, complete_form("ada@example.com"), Some(resume)).await,
            Err(AppError::Io(_))
        ));
        assert!(store.open_resume("cv.pdf").await.unwrap().is_none());
    }

    #[test]
    fn test_placeholder_score_range() {
        for _ in 0..500 {
            let score = PlaceholderScore::draw();
            assert!(PlaceholderScore::RANGE.contains(&score.0));
        }
        assert_eq!(PlaceholderScore(72).to_string(), "72%");
    }
}
