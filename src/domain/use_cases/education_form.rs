use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use validator::Validate;

use crate::{
    constants::EDUCATION_LIST_PATH,
    date_codec::{self, split_year_month, DateRange, YearMonth},
    entities::{
        education::{EducationForm, EducationLevel, EducationPayload, EducationRecord, RecordId},
        profile::OwnerMode,
    },
    errors::AppError,
    level::{may_adopt, suggest_level},
    repositories::{education_api::EducationApi, local_cache::LocalEducationStore},
    storage::key_value::KeyValueStorage,
    use_cases::fallback::{FallbackAdapter, Persisted, StatusFallbackPolicy},
};

static GPA_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?").expect("gpa pattern is valid")
});

// ───── Form state helpers ───────────────────────────────────────────

impl EducationForm {
    /// Populates form state from a stored record, whatever date spelling it uses.
    pub fn from_record(record: &EducationRecord) -> Self {
        let dates = date_codec::decode(&record.dates);
        let text = |value: &Option<String>| value.clone().unwrap_or_default();

        let mut form = EducationForm {
            school: text(&record.school),
            level: record
                .level
                .as_deref()
                .filter(|l| !l.trim().is_empty())
                .map(EducationLevel::from_label),
            degree: text(&record.degree),
            field: text(&record.field),
            start_ym: dates.start_ym,
            end_ym: dates.end_ym,
            gpa: record
                .gpa
                .or(record.grade)
                .map(|g| g.to_string())
                .unwrap_or_default(),
            thesis: text(&record.thesis),
            description: text(&record.description),
            details: text(&record.details),
            current: dates.current,
        };
        form.adopt_level_suggestion();
        form
    }

    pub fn level_suggestion(&self) -> Option<EducationLevel> {
        suggest_level(&self.degree)
    }

    /// Takes the degree-derived level when the selection is unset or `Other`.
    pub fn adopt_level_suggestion(&mut self) {
        if let Some(suggested) = self.level_suggestion() {
            if may_adopt(self.level.as_ref()) {
                self.level = Some(suggested);
            }
        }
    }

    pub fn set_degree(&mut self, degree: impl Into<String>) {
        self.degree = degree.into();
        self.adopt_level_suggestion();
    }

    pub fn date_error(&self) -> Option<&'static str> {
        date_codec::date_order_error(&self.start_ym, &self.end_ym, self.current)
    }

    /// School filled in, a well-formed start date and no date conflict.
    pub fn can_submit(&self) -> bool {
        !self.school.trim().is_empty()
            && YearMonth::parse(&self.start_ym).is_ok()
            && self.date_error().is_none()
    }

    pub fn check(&self) -> FormCheck {
        FormCheck {
            valid: self.can_submit(),
            date_error: self.date_error().map(str::to_string),
            level_suggestion: self.level_suggestion(),
        }
    }

    /// Final submit-time validation and encoding into the multi-key payload.
    pub fn to_payload(&self, range: &DateRange) -> Result<EducationPayload, AppError> {
        let start_text = self.start_ym.trim();
        let (start_year, start_month) = split_year_month(start_text);
        let (Some(start_year), Some(start_month)) = (start_year, start_month) else {
            return Err(AppError::invalid_field("startYM", "Please select a valid Start Date (YYYY-MM)."));
        };
        if !date_codec::is_combined(start_text) {
            return Err(AppError::invalid_field("startYM", "Please select a valid Start Date (YYYY-MM)."));
        }

        let (end_year, end_month) = split_year_month(self.end_ym.trim());
        if !self.current && end_year.is_some() && end_month.is_none() {
            return Err(AppError::invalid_field(
                "endYM",
                "Please complete End Date (YYYY-MM), or mark as Currently studying.",
            ));
        }

        let start = YearMonth::new(start_year, start_month as i32)
            .map_err(|e| AppError::invalid_field("startYM", e.to_string()))?;
        let end = match (self.current, end_year, end_month) {
            (false, Some(year), Some(month)) => Some(
                YearMonth::new(year, month as i32)
                    .map_err(|e| AppError::invalid_field("endYM", e.to_string()))?,
            ),
            _ => None,
        };

        if !range.contains(start.year) {
            return Err(AppError::invalid_field(
                "startYM",
                format!("Start date must be between {} and {}.", range.min_year, range.max_year),
            ));
        }
        if let Some(end) = end {
            if !range.contains(end.year) {
                return Err(AppError::invalid_field(
                    "endYM",
                    format!("End date must be between {} and {}.", range.min_year, range.max_year),
                ));
            }
            if end < start {
                return Err(AppError::invalid_field("endYM", "End Date must be after Start Date."));
            }
        }

        Ok(EducationPayload {
            school: self.school.trim().to_string(),
            level: self.level.clone(),
            degree: non_empty(&self.degree),
            field: non_empty(&self.field),
            dates: date_codec::encode(start, end),
            gpa: parse_gpa(&self.gpa),
            thesis: non_empty(&self.thesis),
            description: non_empty(&self.description),
            details: self.details.clone(),
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Leading-number parse: `"3.8 / 4.0"` → `3.8`, blank or non-numeric → `None`.
pub fn parse_gpa(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    GPA_PREFIX
        .find(trimmed)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|g| g.is_finite())
}

// ───── Views ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormCheck {
    pub valid: bool,
    pub date_error: Option<String>,
    pub level_suggestion: Option<EducationLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    pub allowed: bool,
    pub editing: bool,
    pub id: Option<RecordId>,
    pub form: EducationForm,
    /// Thesis, details or description present: open the optional section.
    pub show_advanced: bool,
    pub used_local: bool,
    pub check: FormCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitOutcome {
    pub record: EducationRecord,
    pub used_local: bool,
    pub redirect_to: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Create,
    Edit(RecordId),
}

struct SavingGuard<'a>(&'a AtomicBool);

impl<'a> SavingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SavingGuard(flag))
    }
}

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ───── Controller ───────────────────────────────────────────────────

/// Drives the education form over the remote API and the local cache.
///
/// The saving flag belongs to the handler, not to a record or a client: the
/// service holds one handler, so at most one save runs at a time across every
/// caller, and any submit issued meanwhile gets `Conflict`. That mirrors the
/// single-owner portfolio it backs, where the local cache is rewritten whole
/// on each save.
pub struct EducationFormHandler<A, S>
where
    A: EducationApi,
    S: KeyValueStorage,
{
    pub api: A,
    pub local: LocalEducationStore<S>,
    fallback: FallbackAdapter<StatusFallbackPolicy>,
    owner_mode: OwnerMode,
    date_range: DateRange,
    saving: AtomicBool,
}

impl<A, S> EducationFormHandler<A, S>
where
    A: EducationApi,
    S: KeyValueStorage,
{
    pub fn new(
        api: A,
        local: LocalEducationStore<S>,
        policy: StatusFallbackPolicy,
        owner_mode: OwnerMode,
        date_range: DateRange,
    ) -> Self {
        EducationFormHandler {
            api,
            local,
            fallback: FallbackAdapter::new(policy),
            owner_mode,
            date_range,
            saving: AtomicBool::new(false),
        }
    }

    pub fn owner_mode(&self) -> OwnerMode {
        self.owner_mode
    }

    pub fn date_range(&self) -> DateRange {
        self.date_range
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Owner permission. A failed profile fetch counts as "not owner" unless
    /// the toggle forces a mode.
    pub async fn resolve_owner(&self) -> bool {
        if self.owner_mode != OwnerMode::Deferred {
            return self.owner_mode.resolve(None);
        }
        match self.api.get_profile().await {
            Ok(profile) => self.owner_mode.resolve(Some(&profile)),
            Err(e) => {
                tracing::warn!("Profile unavailable, continuing as viewer: {}", e);
                false
            }
        }
    }

    /// Lists every record from the remote API, or the local cache when the API is unavailable.
    pub async fn list(&self) -> Result<Persisted<Vec<EducationRecord>>, AppError> {
        let listed = self
            .fallback
            .execute(
                |_: ()| async move { self.api.list_education().await },
                |_| self.local.read_all(),
                (),
            )
            .await?;
        Ok(listed)
    }

    /// Empty form for a new record.
    pub async fn new_form(&self) -> FormView {
        let form = EducationForm::default();
        FormView {
            allowed: self.resolve_owner().await,
            editing: false,
            id: None,
            check: form.check(),
            form,
            show_advanced: false,
            used_local: false,
        }
    }

    /// Loads an existing record into form state.
    pub async fn load(&self, id: &RecordId) -> Result<FormView, AppError> {
        let allowed = self.resolve_owner().await;
        if !allowed {
            return Ok(FormView {
                allowed,
                editing: true,
                id: Some(id.clone()),
                check: EducationForm::default().check(),
                form: EducationForm::default(),
                show_advanced: false,
                used_local: false,
            });
        }

        let listed = self.list().await?;
        let record = listed
            .data
            .into_iter()
            .find(|r| r.has_id(id))
            .or_else(|| self.local.find_by_id(id))
            .ok_or_else(|| AppError::NotFound("Education record not found".to_string()))?;

        let form = EducationForm::from_record(&record);
        tracing::info!(%id, used_local = listed.used_local, "Loaded education record");

        Ok(FormView {
            allowed,
            editing: true,
            id: Some(id.clone()),
            check: form.check(),
            show_advanced: record.has_extended_fields(),
            form,
            used_local: listed.used_local,
        })
    }

    /// Validates, encodes and persists the form. Nothing is written when any
    /// check fails, and only one save may be outstanding at a time.
    pub async fn submit(&self, mode: FormMode, mut form: EducationForm) -> Result<SubmitOutcome, AppError> {
        let _saving = SavingGuard::acquire(&self.saving)
            .ok_or_else(|| AppError::Conflict("A save is already in progress".to_string()))?;

        form.adopt_level_suggestion();
        form.validate()?;
        if let Some(msg) = form.date_error() {
            return Err(AppError::invalid_field("endYM", msg));
        }
        let payload = form.to_payload(&self.date_range)?;

        if !self.resolve_owner().await {
            return Err(AppError::ForbiddenAccess);
        }

        let persisted = match mode {
            FormMode::Create => {
                self.fallback
                    .execute(
                        |body: EducationPayload| async move { self.api.create_education(&body).await },
                        |body| self.local.insert(&body, None),
                        payload,
                    )
                    .await?
            }
            FormMode::Edit(id) => {
                self.fallback
                    .execute(
                        |(id, body): (RecordId, EducationPayload)| async move {
                            self.api.update_education(&id, &body).await
                        },
                        |(id, body)| self.local.upsert(&id, &body),
                        (id, payload),
                    )
                    .await?
            }
        };

        tracing::info!(
            id = ?persisted.data.id,
            used_local = persisted.used_local,
            "Education record saved"
        );

        Ok(SubmitOutcome {
            record: persisted.data,
            used_local: persisted.used_local,
            redirect_to: EDUCATION_LIST_PATH.to_string(),
        })
    }
}
