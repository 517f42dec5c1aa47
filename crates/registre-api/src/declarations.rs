//! Handlers for `/declarations` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/declarations` | `?field=&query=&status=&limit=&offset=` |
//! | `POST`   | `/declarations` | Content plus base64 documents; 201 |
//! | `GET`    | `/declarations/{id}` | With hospital and mairie |
//! | `PATCH`  | `/declarations/{id}` | Partial content, optional new documents |
//! | `DELETE` | `/declarations/{id}` | 204 |
//! | `POST`   | `/declarations/{id}/submit` | |
//! | `POST`   | `/declarations/{id}/validate` | |
//! | `POST`   | `/declarations/{id}/reject` | Body: `{"motif_rejet":"…"}` |
//! | `GET`    | `/declarations/{id}/download` | Attachment |
//! | `GET`    | `/declarations/{id}/documents/{kind}` | Inline; `kind` is `mere` or `pere` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use bytes::Bytes;
use registre_core::{
  ValidationErrors,
  blob::{BlobStore, Upload},
  declaration::{
    Declaration, DeclarationContent, DeclarationPatch, DocumentKind, DocumentUploads,
  },
  query::{DeclarationQuery, DeclarationView},
  service::Registry,
  store::RegistryStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{CurrentActor, JsonBody, error::ApiError};

type Reg<S, B> = State<Arc<Registry<S, B>>>;

// ─── Uploads ─────────────────────────────────────────────────────────────────

/// A document carried inline in a JSON body.
#[derive(Debug, Deserialize)]
pub struct UploadBody {
  pub file_name:  String,
  pub media_type: String,
  /// Standard base64 of the file content.
  pub data:       String,
}

fn decode_uploads(
  mere: Option<UploadBody>,
  pere: Option<UploadBody>,
) -> Result<DocumentUploads, ApiError> {
  let mut errors = ValidationErrors::new();
  let mut decode = |kind: DocumentKind, body: Option<UploadBody>| {
    let body = body?;
    match B64.decode(body.data.trim()) {
      Ok(data) => Some(Upload {
        file_name:  body.file_name,
        media_type: body.media_type,
        data:       Bytes::from(data),
      }),
      Err(_) => {
        errors.push(kind.field(), "not valid base64");
        None
      }
    }
  };
  let uploads = DocumentUploads {
    mere: decode(DocumentKind::Mere, mere),
    pere: decode(DocumentKind::Pere, pere),
  };
  errors.into_result()?;
  Ok(uploads)
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  /// Search column; defaults to the child's name.
  pub field:  Option<String>,
  #[serde(alias = "q")]
  pub query:  Option<String>,
  pub status: Option<String>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /declarations`
pub async fn list<S, B>(
  State(registry): Reg<S, B>,
  CurrentActor(actor): CurrentActor,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Declaration>>, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  let mut query =
    DeclarationQuery::parse(params.field.as_deref(), params.query, params.status.as_deref())?;
  query.limit = params.limit;
  query.offset = params.offset;
  Ok(Json(registry.list(&actor, query).await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(flatten)]
  pub content:             DeclarationContent,
  pub acte_naissance_mere: Option<UploadBody>,
  pub acte_naissance_pere: Option<UploadBody>,
}

/// `POST /declarations`
pub async fn create<S, B>(
  State(registry): Reg<S, B>,
  CurrentActor(actor): CurrentActor,
  JsonBody(body): JsonBody<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  let uploads = decode_uploads(body.acte_naissance_mere, body.acte_naissance_pere)?;
  let declaration = registry.create(&actor, body.content, uploads).await?;
  Ok((StatusCode::CREATED, Json(declaration)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /declarations/{id}`
pub async fn get_one<S, B>(
  State(registry): Reg<S, B>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<Json<DeclarationView>, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  Ok(Json(registry.get(&actor, id).await?))
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  #[serde(flatten)]
  pub patch:               DeclarationPatch,
  pub acte_naissance_mere: Option<UploadBody>,
  pub acte_naissance_pere: Option<UploadBody>,
}

/// `PATCH /declarations/{id}`
pub async fn update<S, B>(
  State(registry): Reg<S, B>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
  JsonBody(body): JsonBody<UpdateBody>,
) -> Result<Json<Declaration>, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  let uploads = decode_uploads(body.acte_naissance_mere, body.acte_naissance_pere)?;
  Ok(Json(registry.update(&actor, id, body.patch, uploads).await?))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /declarations/{id}`
pub async fn delete_one<S, B>(
  State(registry): Reg<S, B>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  registry.delete(&actor, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// `POST /declarations/{id}/submit`
pub async fn submit<S, B>(
  State(registry): Reg<S, B>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<Json<Declaration>, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  Ok(Json(registry.submit(&actor, id).await?))
}

/// `POST /declarations/{id}/validate`
pub async fn validate<S, B>(
  State(registry): Reg<S, B>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<Json<Declaration>, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  Ok(Json(registry.validate(&actor, id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectBody {
  #[serde(default)]
  pub motif_rejet: String,
}

/// `POST /declarations/{id}/reject`
pub async fn reject<S, B>(
  State(registry): Reg<S, B>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
  body: Option<JsonBody<RejectBody>>,
) -> Result<Json<Declaration>, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  let motif = body.map(|JsonBody(b)| b.motif_rejet).unwrap_or_default();
  Ok(Json(registry.reject(&actor, id, motif).await?))
}

// ─── Documents ───────────────────────────────────────────────────────────────

/// `GET /declarations/{id}/download`
pub async fn download<S, B>(
  State(registry): Reg<S, B>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<Response, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  let doc = registry.download(&actor, id).await?;
  let headers = [
    (header::CONTENT_TYPE, doc.media_type.to_owned()),
    (
      header::CONTENT_DISPOSITION,
      format!("attachment; filename=\"{}\"", doc.filename),
    ),
  ];
  Ok((headers, doc.bytes).into_response())
}

/// `GET /declarations/{id}/documents/{kind}`
pub async fn preview<S, B>(
  State(registry): Reg<S, B>,
  CurrentActor(actor): CurrentActor,
  Path((id, kind)): Path<(Uuid, String)>,
) -> Result<Response, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  let kind: DocumentKind = kind
    .parse()
    .map_err(|_| ApiError::BadRequest(format!("unknown document kind {kind:?}")))?;
  let blob = registry.preview(&actor, id, kind).await?;
  let media_type = blob.reference.media_type;
  let headers = [
    (header::CONTENT_TYPE, media_type.mime().to_owned()),
    (
      header::CONTENT_DISPOSITION,
      format!("inline; filename=\"{}.{}\"", kind.field(), media_type.extension()),
    ),
  ];
  Ok((headers, blob.data).into_response())
}

