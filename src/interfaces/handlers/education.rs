use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::{
    date_codec::{month_options, MonthOption},
    entities::education::{EducationForm, EducationLevel, EducationRecord, RecordId},
    errors::AppError,
    suggestions::{filter_suggestions, SuggestionKind},
    use_cases::education_form::FormMode,
    AppState,
};

#[derive(Serialize)]
struct RecordList {
    records: Vec<EducationRecord>,
    used_local: bool,
}

pub async fn list_education(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let listed = state.form_handler.list().await?;
    Ok(HttpResponse::Ok().json(RecordList {
        records: listed.data,
        used_local: listed.used_local,
    }))
}

pub async fn new_form(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let view = state.form_handler.new_form().await;
    if !view.allowed {
        return Err(AppError::ForbiddenAccess);
    }
    Ok(HttpResponse::Ok().json(view))
}

pub async fn load_form(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let id = RecordId::from(id.into_inner());
    let view = state.form_handler.load(&id).await?;
    if !view.allowed {
        return Err(AppError::ForbiddenAccess);
    }
    Ok(HttpResponse::Ok().json(view))
}

pub async fn check_form(form: web::Json<EducationForm>) -> impl Responder {
    let mut form = form.into_inner();
    form.adopt_level_suggestion();
    HttpResponse::Ok().json(form.check())
}

pub async fn create_education(
    state: web::Data<AppState>,
    form: web::Json<EducationForm>,
) -> Result<impl Responder, AppError> {
    let outcome = state
        .form_handler
        .submit(FormMode::Create, form.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(outcome))
}

pub async fn update_education(
    state: web::Data<AppState>,
    id: web::Path<String>,
    form: web::Json<EducationForm>,
) -> Result<impl Responder, AppError> {
    let mode = FormMode::Edit(RecordId::from(id.into_inner()));
    let outcome = state.form_handler.submit(mode, form.into_inner()).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[derive(Deserialize)]
pub struct LevelQuery {
    #[serde(default)]
    degree: String,
}

#[derive(Serialize)]
struct LevelSuggestion {
    degree: String,
    suggestion: Option<EducationLevel>,
}

pub async fn suggest_level(query: web::Query<LevelQuery>) -> impl Responder {
    let degree = query.into_inner().degree;
    let suggestion = crate::level::suggest_level(&degree);
    HttpResponse::Ok().json(LevelSuggestion { degree, suggestion })
}

#[derive(Deserialize)]
pub struct SuggestionQuery {
    kind: SuggestionKind,
    #[serde(default)]
    q: String,
}

pub async fn suggestions(query: web::Query<SuggestionQuery>) -> impl Responder {
    let matches = filter_suggestions(&query.q, query.kind.catalogue());
    HttpResponse::Ok().json(matches)
}

#[derive(Serialize)]
struct PickerOptions {
    years: Vec<i32>,
    months: Vec<MonthOption>,
    levels: Vec<String>,
}

pub async fn picker_options(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(PickerOptions {
        years: state.form_handler.date_range().years_desc(),
        months: month_options(),
        levels: EducationLevel::ALL.iter().map(|l| l.label().to_string()).collect(),
    })
}
