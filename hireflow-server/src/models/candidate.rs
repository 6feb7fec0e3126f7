//! Applicants and the skills attached to them

use chrono::{DateTime, NaiveDate, Utc};
use hireflow_db::InsertRequest;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::validation::{required_text, ValidationError};

pub const APPLICANTS: &str = "service.applicants";
pub const ABILITIES: &str = "service.abilities";
pub const SKILLS: &str = "service.skills";

/// Applicant row from `service.applicants`
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Candidate {
    pub id: Uuid,
    pub vacancy: Option<String>,
    pub name: String,
    pub birthdate: Option<NaiveDate>,
    pub description: Option<String>,
    pub email: Option<String>,
    pub experience: Option<String>,
    pub file: Option<String>,
    pub link: Option<String>,
    pub notes: Option<String>,
    pub phone: Option<String>,
    pub photo: Option<String>,
    pub position: Option<String>,
    pub salary: Option<i32>,
    pub sex: Option<String>,
    pub telegram: Option<String>,
    pub vk: Option<String>,
    pub grade: Option<String>,
    pub removed: bool,
    pub created: DateTime<Utc>,
}

/// Skill or tag from `service.skills`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub tag: bool,
}

/// Applicant with skills and tags resolved
#[derive(Debug, Clone, Serialize)]
pub struct CandidateDetails {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub skills: Vec<Skill>,
    pub tags: Vec<Skill>,
}

/// Create candidate request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewCandidate {
    pub vacancy: Option<String>,
    pub name: String,
    pub birthdate: Option<NaiveDate>,
    pub description: Option<String>,
    pub email: Option<String>,
    pub experience: Option<String>,
    pub file: Option<String>,
    pub link: Option<String>,
    pub notes: Option<String>,
    pub phone: Option<String>,
    pub photo: Option<String>,
    pub position: Option<String>,
    pub salary: Option<i32>,
    pub sex: Option<String>,
    pub telegram: Option<String>,
    pub vk: Option<String>,
    pub grade: Option<String>,
    /// Skill ids
    pub skills: Vec<Uuid>,
    /// Skill ids used as tags
    pub tags: Vec<Uuid>,
}

impl NewCandidate {
    /// Normalize the name; every other field is stored as given.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.name = required_text("name", &self.name)?;
        Ok(self)
    }

    /// INSERT for the applicant row. Skills and tags go to `service.abilities`.
    pub fn insert_request(&self) -> InsertRequest {
        InsertRequest::new(APPLICANTS)
            .field("vacancy", self.vacancy.clone())
            .field("name", self.name.clone())
            .field("birthdate", self.birthdate)
            .field("description", self.description.clone())
            .field("email", self.email.clone())
            .field("experience", self.experience.clone())
            .field("file", self.file.clone())
            .field("link", self.link.clone())
            .field("notes", self.notes.clone())
            .field("phone", self.phone.clone())
            .field("photo", self.photo.clone())
            .field("position", self.position.clone())
            .field("salary", self.salary)
            .field("sex", self.sex.clone())
            .field("telegram", self.telegram.clone())
            .field("vk", self.vk.clone())
            .field("grade", self.grade.clone())
    }

    /// One `service.abilities` INSERT per skill, then one per tag.
    pub fn ability_requests(&self, applicant: Uuid) -> Vec<InsertRequest> {
        let skills = self.skills.iter().map(|skill| (skill, false));
        let tags = self.tags.iter().map(|tag| (tag, true));
        skills
            .chain(tags)
            .map(|(skill, tag)| {
                InsertRequest::new(ABILITIES)
                    .field("applicant", applicant)
                    .field("skill", *skill)
                    .field("tag", tag)
            })
            .collect()
    }
}
