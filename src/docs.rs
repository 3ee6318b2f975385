use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{authz, models, routes};

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::plans::list_plans,
		routes::auth::register,
		routes::auth::login,
		routes::auth::me,
		routes::auth::logout,
		routes::auth::change_password,
		routes::weddings::save_wedding,
		routes::weddings::my_wedding,
		routes::weddings::change_plan,
		routes::weddings::toggle_upload,
		routes::weddings::share_link,
		routes::weddings::public_wedding,
		routes::uploads::guest_upload,
		routes::uploads::my_uploads,
		routes::uploads::download,
		routes::uploads::delete_upload,
		routes::uploads::upload_cover,
		routes::uploads::cover_image,
		routes::superadmin::stats,
		routes::superadmin::list_weddings,
		routes::superadmin::disable_wedding,
		routes::superadmin::enable_wedding,
		routes::superadmin::extend_plan,
		routes::superadmin::delete_upload,
		routes::superadmin::list_users
	),
	components(
		schemas(
			authz::PlanId,
			authz::Role,
			authz::MediaKind,
			authz::Lifecycle,
			routes::health::HealthResponse,
			models::user::User,
			models::user::AuthResponse,
			models::user::LoginRequest,
			models::user::RegisterRequest,
			models::user::PasswordChangeRequest,
			models::plan::PlanView,
			models::wedding::Wedding,
			models::wedding::WeddingSaveRequest,
			models::wedding::PlanChangeRequest,
			models::wedding::WeddingDetail,
			models::wedding::MyWeddingResponse,
			models::wedding::UploadToggleResponse,
			models::wedding::ShareLinkResponse,
			models::wedding::PublicWedding,
			models::upload::Upload,
			models::upload::UploadStats,
			models::upload::UploadPage,
			models::upload::UploadAccepted,
			models::upload::CoverAccepted,
			models::admin::PlanCount,
			models::admin::PlatformStats,
			models::admin::AdminWeddingRow,
			models::admin::AdminWeddingPage,
			models::admin::AdminUserRow,
			models::admin::AdminUserPage,
			models::admin::ExtendPlanRequest,
			models::admin::MessageResponse
		)
	),
	tags(
		(name = "Health", description = "Liveness"),
		(name = "Plans", description = "Plan catalogue"),
		(name = "Auth", description = "Owner accounts and tokens"),
		(name = "Weddings", description = "Owner event management and the guest page"),
		(name = "Uploads", description = "Guest media, downloads and cover images"),
		(name = "Super Admin", description = "Platform console")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;

	ensure_security_components(&mut doc);
	ensure_error_schema(&mut doc);
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);

	let json_route = get(move || {
		let doc_json = Arc::clone(&doc_json);
		async move { Json((*doc_json).clone()) }
	});

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

fn components(doc: &mut Value) -> Option<&mut Map<String, Value>> {
	let root = doc.as_object_mut()?;
	root.entry("components")
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
}

fn ensure_security_components(doc: &mut Value) {
	let Some(components) = components(doc) else {
		return;
	};

	let schemes = components
		.entry("securitySchemes")
		.or_insert_with(|| Value::Object(Map::new()));
	merge_values(
		schemes,
		&json!({
			"bearerAuth": {
				"type": "http",
				"scheme": "bearer",
				"bearerFormat": "JWT",
				"description": "Token from /api/auth/login or /api/auth/register"
			}
		}),
	);
}

/// Every failure renders as `{error, message}`.
fn ensure_error_schema(doc: &mut Value) {
	let Some(components) = components(doc) else {
		return;
	};

	let schemas = components
		.entry("schemas")
		.or_insert_with(|| Value::Object(Map::new()));
	merge_values(
		schemas,
		&json!({
			"ErrorBody": {
				"type": "object",
				"required": ["error", "message"],
				"properties": {
					"error": {"type": "string", "example": "uploads_closed"},
					"message": {"type": "string", "example": "uploads are closed for this wedding"}
				}
			}
		}),
	);
}

fn ensure_servers(doc: &mut Value, port: u16) {
	let server_url = std::env::var("PUBLIC_BASE_URL")
		.ok()
		.filter(|url| !url.trim().is_empty())
		.unwrap_or_else(|| format!("http://localhost:{}", port));

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr.iter().any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}

fn merge_values(target: &mut Value, addition: &Value) {
	match (target, addition) {
		(Value::Object(dest), Value::Object(src)) => {
			for (key, value) in src {
				if let Some(existing) = dest.get_mut(key) {
					merge_values(existing, value);
				} else {
					dest.insert(key.clone(), value.clone());
				}
			}
		}
		(Value::Array(dest), Value::Array(src)) => {
			for item in src {
				if !dest.contains(item) {
					dest.push(item.clone());
				}
			}
		}
		_ => {}
	}
}
