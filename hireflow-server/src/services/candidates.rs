//! Candidate service

use hireflow_db::{Db, DbError, InsertRequest, Queries, Result, SelectRequest};
use serde::Serialize;
use sqlx::FromRow;
use tracing::info;
use uuid::Uuid;

use super::tasks::insert_task;
use crate::models::candidate::{APPLICANTS, SKILLS};
use crate::models::dashboard::{HISTORY, PROCESSES};
use crate::models::{Candidate, CandidateDetails, NewCandidate, NewTask, Process, Skill};

/// Result of putting an applicant on a dashboard
#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutcome {
    pub task: Uuid,
    /// First column of the dashboard, when it has any
    pub column: Option<Uuid>,
}

fn linked_skills(applicant: Uuid, tag: bool) -> SelectRequest {
    SelectRequest::new(SKILLS)
        .filter("id IN (SELECT skill FROM service.abilities WHERE applicant = $1 AND tag = $2)")
        .value(applicant)
        .value(tag)
        .order_by("name")
}

fn first_column(dashboard: Uuid) -> SelectRequest {
    SelectRequest::new(PROCESSES)
        .filter("dashboard = $1 AND \"order\" = $2")
        .value(dashboard)
        .value(0)
        .limit(1)
}

pub struct CandidateService<'a> {
    db: &'a Db,
}

impl<'a> CandidateService<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<Candidate>> {
        self.db
            .select_as(&SelectRequest::new(APPLICANTS).order_by("created"))
            .await
    }

    /// Insert the applicant and its skill/tag links in one transaction.
    pub async fn create(&self, candidate: NewCandidate) -> Result<Uuid> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    let id = conn.insert_row(&candidate.insert_request()).await?;
                    for ability in candidate.ability_requests(id) {
                        conn.insert(&ability).await?;
                    }
                    info!(
                        applicant = %id,
                        skills = candidate.skills.len(),
                        tags = candidate.tags.len(),
                        "Candidate created"
                    );
                    Ok(id)
                })
            })
            .await
    }

    pub async fn by_id(&self, id: Uuid) -> Result<CandidateDetails> {
        let row = self
            .db
            .select_row(&SelectRequest::new(APPLICANTS).filter("id = $1").value(id))
            .await?
            .ok_or_else(|| DbError::not_found("candidate", id))?;
        let candidate = Candidate::from_row(&row).map_err(DbError::Decode)?;

        let skills = self.db.select_as::<Skill>(&linked_skills(id, false)).await?;
        let tags = self.db.select_as::<Skill>(&linked_skills(id, true)).await?;

        Ok(CandidateDetails {
            candidate,
            skills,
            tags,
        })
    }

    /// Applicants that have at least one live task.
    pub async fn in_process(&self) -> Result<Vec<Candidate>> {
        self.db
            .select_as(
                &SelectRequest::new(APPLICANTS)
                    .filter("id IN (SELECT applicant FROM flow.tasks WHERE NOT removed)")
                    .order_by("created"),
            )
            .await
    }

    /// Open a task for the applicant on `dashboard` and place it on the
    /// dashboard's first column (`order = 0`) when there is one.
    pub async fn apply(&self, applicant: Uuid, dashboard: Uuid) -> Result<ApplyOutcome> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    let task = insert_task(conn, &NewTask { applicant, dashboard }).await?;

                    let column = conn
                        .select_as::<Process>(&first_column(dashboard))
                        .await?
                        .into_iter()
                        .next()
                        .map(|process| process.id);

                    if let Some(column) = column {
                        conn.insert(
                            &InsertRequest::new(HISTORY)
                                .field("task", task)
                                .field("to", column),
                        )
                        .await?;
                    }

                    Ok(ApplyOutcome { task, column })
                })
            })
            .await
    }
}
