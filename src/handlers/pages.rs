//! Minimal server-rendered experience pages. They read the caller only
//! from the trusted principal headers.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::middleware::TrustedPrincipal;
use crate::server::AppState;
use crate::types::Role;

/// GET /experiences/:experienceId
pub async fn landing(
    State(state): State<AppState>,
    TrustedPrincipal(ctx): TrustedPrincipal,
) -> Result<Response, ApiError> {
    let status = state.profiles.check(&ctx).await?;
    let base = experience_base(&ctx.experience_id);

    if status.is_complete {
        return Ok(Redirect::to(&format!("{}/discovery", base)).into_response());
    }

    let (lead, link, label) = match status.role {
        Some(role) => (
            "Your profile is saved as a draft.",
            format!("{}/profile/create?role={}", base, role_param(role)),
            "Finish your profile",
        ),
        None => (
            "Let's get you set up with a profile to start matching.",
            format!("{}/onboarding", base),
            "Get started",
        ),
    };

    Ok(page(
        "Welcome",
        &format!(
            "<h1>Welcome</h1><p>{}</p><p><a href=\"{}\">{}</a></p>",
            lead,
            escape(&link),
            label
        ),
    )
    .into_response())
}

/// GET /experiences/:experienceId/onboarding
pub async fn onboarding(TrustedPrincipal(ctx): TrustedPrincipal) -> Html<String> {
    let base = escape(&experience_base(&ctx.experience_id));
    page(
        "Choose your role",
        &format!(
            "<h1>Choose your role</h1>\
             <ul>\
             <li><a href=\"{base}/profile/create?role=founder\">I'm a founder raising capital</a></li>\
             <li><a href=\"{base}/profile/create?role=investor\">I'm an investor looking for deals</a></li>\
             </ul>",
            base = base
        ),
    )
}

#[derive(Debug, Deserialize)]
pub struct CreatePageQuery {
    pub role: Option<String>,
}

/// GET /experiences/:experienceId/profile/create
pub async fn profile_create(
    TrustedPrincipal(ctx): TrustedPrincipal,
    Query(query): Query<CreatePageQuery>,
) -> Response {
    let base = experience_base(&ctx.experience_id);
    let role = match query.role.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("founder") => Role::Founder,
        Some("investor") => Role::Investor,
        _ => return Redirect::to(&format!("{}/onboarding", base)).into_response(),
    };

    let fields = match role {
        Role::Founder => "startupName, industry, stage, fundingAsk, briefPitch, website, location",
        Role::Investor => "sectors, stages, geography, checkSize, introNote",
    };

    page(
        "Create your profile",
        &format!(
            "<h1>Create your {} profile</h1>\
             <p>Required fields: {}</p>\
             <form data-endpoint=\"/api/profile/create\" data-experience-id=\"{}\" data-user-id=\"{}\" data-role=\"{}\"></form>",
            role_param(role),
            fields,
            escape(&ctx.experience_id),
            escape(&ctx.user_id),
            role,
        ),
    )
    .into_response()
}

/// GET /experiences/:experienceId/discovery
pub async fn discovery(
    State(state): State<AppState>,
    TrustedPrincipal(ctx): TrustedPrincipal,
) -> Result<Html<String>, ApiError> {
    let status = state.profiles.check(&ctx).await?;
    let base = escape(&experience_base(&ctx.experience_id));

    if !status.is_complete {
        return Ok(page(
            "Complete your profile",
            &format!(
                "<h1>Complete your profile</h1>\
                 <p>You need to complete your profile before you can start matching.</p>\
                 <p><a href=\"{}/onboarding\">Complete Profile</a></p>",
                base
            ),
        ));
    }

    let audience = match status.role {
        Some(Role::Investor) => "founders",
        _ => "investors",
    };
    Ok(page(
        "Discovery",
        &format!("<h1>Discovery</h1><p>Matching with {} opens soon.</p>", audience),
    ))
}

fn experience_base(experience_id: &str) -> String {
    format!("/experiences/{}", experience_id)
}

fn role_param(role: Role) -> &'static str {
    match role {
        Role::Founder => "founder",
        Role::Investor => "investor",
    }
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{}</title></head><body>{}</body></html>",
        escape(title),
        body
    ))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
