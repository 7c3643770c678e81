// crates/fleetgate-appwrite/src/request.rs
// ============================================================================
// Module: Appwrite Request Building
// Description: Pure translation from action and params to a request spec.
// Purpose: Validate every required parameter before any network traffic.
// Dependencies: fleetgate-core, serde_json
// ============================================================================

//! ## Overview
//! `build_request` maps each action to its Appwrite endpoint, method, body,
//! and header policy. The function is pure and fail-closed: a missing or
//! malformed required parameter yields `VALIDATION_ERROR` and no request
//! spec. Query strings only ever carry scalar parameter values; nested
//! values are ignored. The `project.*` namespace omits the project header.

// ============================================================================
// SECTION: Imports
// ============================================================================

use fleetgate_core::Action;
use fleetgate_core::ErrorCode;
use fleetgate_core::StandardError;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Request Model
// ============================================================================

/// HTTP method for an upstream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
    /// HTTP PUT.
    Put,
    /// HTTP PATCH.
    Patch,
    /// HTTP DELETE.
    Delete,
}

impl Method {
    /// Returns the method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// Body carried by an upstream request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// JSON body.
    Json(Value),
    /// Multipart form-data body of text fields.
    Multipart(Vec<(String, String)>),
}

/// Fully built upstream request, ready for execution.
///
/// # Invariants
/// - `path` starts with `/` and contains only validated segments.
/// - `project_header` is false exactly for `project.*` actions.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    /// HTTP method.
    pub method: Method,
    /// Endpoint-relative path.
    pub path: String,
    /// Scalar query parameters, in params order.
    pub query: Vec<(String, String)>,
    /// Request body.
    pub body: RequestBody,
    /// Whether to send the `X-Appwrite-Project` header.
    pub project_header: bool,
}

// ============================================================================
// SECTION: User Update Fields
// ============================================================================

/// Updatable auth-user fields and their wire mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UserField {
    Email,
    Name,
    Status,
    Password,
    Phone,
    EmailVerification,
    PhoneVerification,
    Mfa,
    Labels,
    Prefs,
}

/// Inference order for the legacy `auth.users.update` alias.
const USER_FIELDS: &[UserField] = &[
    UserField::Email,
    UserField::Name,
    UserField::Status,
    UserField::Password,
    UserField::Phone,
    UserField::EmailVerification,
    UserField::PhoneVerification,
    UserField::Mfa,
    UserField::Labels,
    UserField::Prefs,
];

impl UserField {
    /// Parameter key carrying the field value.
    const fn param_key(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Name => "name",
            Self::Status => "status",
            Self::Password => "password",
            Self::Phone => "phone",
            Self::EmailVerification => "email_verification",
            Self::PhoneVerification => "phone_verification",
            Self::Mfa => "mfa",
            Self::Labels => "labels",
            Self::Prefs => "prefs",
        }
    }

    /// Path suffix under `/users/{id}`.
    const fn path_suffix(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Name => "name",
            Self::Status => "status",
            Self::Password => "password",
            Self::Phone => "phone",
            Self::EmailVerification => "verification",
            Self::PhoneVerification => "verification/phone",
            Self::Mfa => "mfa",
            Self::Labels => "labels",
            Self::Prefs => "prefs",
        }
    }

    /// Body key for the one-field payload.
    const fn body_key(self) -> &'static str {
        match self {
            Self::Phone => "number",
            other => other.param_key(),
        }
    }

    /// HTTP method for the update.
    const fn method(self) -> Method {
        match self {
            Self::Labels => Method::Put,
            _ => Method::Patch,
        }
    }
}

// ============================================================================
// SECTION: Request Building
// ============================================================================

/// Builds the upstream request for an action.
///
/// # Errors
///
/// Returns `VALIDATION_ERROR` when a required parameter is missing or
/// malformed, or when the legacy user-update alias is disabled.
pub fn build_request(
    action: Action,
    params: &Value,
    allow_legacy_user_update: bool,
) -> Result<RequestSpec, StandardError> {
    let params = params_object(action, params)?;
    match action {
        Action::ProjectCreate => {
            require_string(action, &params, "project_id")?;
            require_string(action, &params, "name")?;
            Ok(spec(Method::Post, "/projects".to_string())
                .with_body(RequestBody::Json(Value::Object(params.clone())))
                .without_project_header())
        }
        Action::ProjectDelete => {
            let project_id = require_segment(action, &params, "project_id")?;
            Ok(spec(Method::Delete, format!("/projects/{project_id}")).without_project_header())
        }
        Action::DatabaseList => {
            Ok(spec(Method::Get, "/databases".to_string()).with_query(scalar_query(&params)))
        }
        Action::DatabaseCreate => {
            require_string(action, &params, "database_id")?;
            require_string(action, &params, "name")?;
            Ok(spec(Method::Post, "/databases".to_string())
                .with_body(RequestBody::Json(Value::Object(params.clone()))))
        }
        Action::DatabaseUpsertCollection => {
            let database_id = require_segment(action, &params, "database_id")?;
            let body = RequestBody::Json(Value::Object(params.clone()));
            if params.contains_key("collection_id") {
                let collection_id = require_segment(action, &params, "collection_id")?;
                Ok(spec(
                    Method::Put,
                    format!("/databases/{database_id}/collections/{collection_id}"),
                )
                .with_body(body))
            } else {
                require_string(action, &params, "name")?;
                Ok(spec(Method::Post, format!("/databases/{database_id}/collections"))
                    .with_body(body))
            }
        }
        Action::DatabaseDeleteCollection => {
            let database_id = require_segment(action, &params, "database_id")?;
            let collection_id = require_segment(action, &params, "collection_id")?;
            Ok(spec(
                Method::Delete,
                format!("/databases/{database_id}/collections/{collection_id}"),
            ))
        }
        Action::AuthUsersList => {
            Ok(spec(Method::Get, "/users".to_string()).with_query(scalar_query(&params)))
        }
        Action::AuthUsersCreate => {
            require_string(action, &params, "user_id")?;
            Ok(spec(Method::Post, "/users".to_string())
                .with_body(RequestBody::Json(Value::Object(params.clone()))))
        }
        Action::AuthUsersUpdate => {
            if !allow_legacy_user_update {
                return Err(validation_error(
                    action,
                    "legacy auth.users.update is disabled; use auth.users.update.<field>",
                ));
            }
            let field = infer_user_field(&params).ok_or_else(|| {
                validation_error(action, "params carry no recognized user field")
            })?;
            user_update_request(action, &params, field)
        }
        Action::AuthUsersUpdateEmail => user_update_request(action, &params, UserField::Email),
        Action::AuthUsersUpdateName => user_update_request(action, &params, UserField::Name),
        Action::AuthUsersUpdateStatus => user_update_request(action, &params, UserField::Status),
        Action::AuthUsersUpdatePassword => {
            user_update_request(action, &params, UserField::Password)
        }
        Action::AuthUsersUpdatePhone => user_update_request(action, &params, UserField::Phone),
        Action::AuthUsersUpdateEmailVerification => {
            user_update_request(action, &params, UserField::EmailVerification)
        }
        Action::AuthUsersUpdatePhoneVerification => {
            user_update_request(action, &params, UserField::PhoneVerification)
        }
        Action::AuthUsersUpdateMfa => user_update_request(action, &params, UserField::Mfa),
        Action::AuthUsersUpdateLabels => user_update_request(action, &params, UserField::Labels),
        Action::AuthUsersUpdatePrefs => user_update_request(action, &params, UserField::Prefs),
        Action::FunctionList => {
            Ok(spec(Method::Get, "/functions".to_string()).with_query(scalar_query(&params)))
        }
        Action::FunctionCreate => {
            require_string(action, &params, "function_id")?;
            require_string(action, &params, "name")?;
            Ok(spec(Method::Post, "/functions".to_string())
                .with_body(RequestBody::Json(Value::Object(params.clone()))))
        }
        Action::FunctionUpdate => {
            let function_id = require_segment(action, &params, "function_id")?;
            Ok(spec(Method::Put, format!("/functions/{function_id}"))
                .with_body(RequestBody::Json(Value::Object(params.clone()))))
        }
        Action::FunctionDeploymentTrigger => {
            let function_id = require_segment(action, &params, "function_id")?;
            let code = require_string(action, &params, "code")?;
            let mut fields = vec![("code".to_string(), code)];
            for key in ["activate", "entrypoint", "commands"] {
                if let Some(value) = params.get(key)
                    && let Some(text) = scalar_text(value)
                {
                    fields.push((key.to_string(), text));
                }
            }
            Ok(spec(Method::Post, format!("/functions/{function_id}/deployments"))
                .with_body(RequestBody::Multipart(fields)))
        }
        Action::FunctionExecutionTrigger => {
            let function_id = require_segment(action, &params, "function_id")?;
            Ok(spec(Method::Post, format!("/functions/{function_id}/executions"))
                .with_body(RequestBody::Json(Value::Object(params.clone()))))
        }
        Action::FunctionExecutionStatus => {
            let function_id = require_segment(action, &params, "function_id")?;
            let execution_id = require_segment(action, &params, "execution_id")?;
            Ok(spec(
                Method::Get,
                format!("/functions/{function_id}/executions/{execution_id}"),
            ))
        }
    }
}

/// Builds a one-field user update request.
fn user_update_request(
    action: Action,
    params: &Map<String, Value>,
    field: UserField,
) -> Result<RequestSpec, StandardError> {
    let user_id = require_segment(action, &params, "user_id")?;
    let value = params
        .get(field.param_key())
        .ok_or_else(|| missing_param(action, field.param_key()))?;
    let mut body = Map::new();
    body.insert(field.body_key().to_string(), value.clone());
    Ok(spec(field.method(), format!("/users/{user_id}/{}", field.path_suffix()))
        .with_body(RequestBody::Json(Value::Object(body))))
}

/// Infers the legacy alias's target field from parameter presence.
fn infer_user_field(params: &Map<String, Value>) -> Option<UserField> {
    USER_FIELDS.iter().copied().find(|field| params.contains_key(field.param_key()))
}

// ============================================================================
// SECTION: Parameter Extraction
// ============================================================================

/// Interprets params as an object; `null` counts as empty.
fn params_object(
    action: Action,
    params: &Value,
) -> Result<Map<String, Value>, StandardError> {
    match params {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        _ => Err(validation_error(action, "params must be an object")),
    }
}

/// Extracts a required non-empty string parameter.
fn require_string(
    action: Action,
    params: &Map<String, Value>,
    key: &str,
) -> Result<String, StandardError> {
    match params.get(key) {
        Some(Value::String(value)) if !value.trim().is_empty() => Ok(value.clone()),
        Some(_) => Err(validation_error(action, format!("param '{key}' must be a string"))),
        None => Err(missing_param(action, key)),
    }
}

/// Extracts a required string parameter destined for a path segment.
///
/// Path segments must not carry separators or whitespace; anything else is
/// treated as an injection attempt and rejected.
fn require_segment(
    action: Action,
    params: &Map<String, Value>,
    key: &str,
) -> Result<String, StandardError> {
    let value = require_string(action, &params, key)?;
    let safe = value != "." && value != ".."
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'));
    if !safe {
        return Err(validation_error(
            action,
            format!("param '{key}' contains characters not allowed in a path segment"),
        ));
    }
    Ok(value)
}

/// Collects scalar parameters as query pairs, ignoring nested values.
fn scalar_query(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| scalar_text(value).map(|text| (key.clone(), text)))
        .collect()
}

/// Renders a scalar value as query text; nested values yield `None`.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Starts a request spec with defaults.
fn spec(method: Method, path: String) -> RequestSpec {
    RequestSpec {
        method,
        path,
        query: Vec::new(),
        body: RequestBody::Empty,
        project_header: true,
    }
}

impl RequestSpec {
    /// Returns a copy with the given body.
    fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Returns a copy with the given query pairs.
    fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Returns a copy that omits the project header.
    fn without_project_header(mut self) -> Self {
        self.project_header = false;
        self
    }
}

/// Builds a `VALIDATION_ERROR` for this adapter.
fn validation_error(action: Action, message: impl Into<String>) -> StandardError {
    StandardError::new(
        ErrorCode::ValidationError,
        format!("{action}: {}", message.into()),
    )
}

/// Builds the missing-parameter validation error.
fn missing_param(action: Action, key: &str) -> StandardError {
    validation_error(action, format!("required param '{key}' is missing"))
}
