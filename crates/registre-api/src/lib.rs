//! JSON REST API for the birth-declaration registry.
//!
//! Exposes an axum [`Router`] backed by a [`Registry`] over any
//! [`RegistryStore`] and [`BlobStore`]. Authentication is the caller's
//! responsibility: an outer layer must insert the authenticated [`Actor`]
//! into the request extensions.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", registre_api::api_router(registry.clone()))
//! ```

pub mod admin;
pub mod dashboard;
pub mod declarations;
pub mod error;
pub mod geo;
pub mod password;

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::{DefaultBodyLimit, FromRequest, FromRequestParts, OptionalFromRequest, Request},
  http::request::Parts,
  routing::{get, patch, post},
};
use registre_core::{
  actor::Actor, blob::BlobStore, service::Registry, store::RegistryStore,
};
use serde::de::DeserializeOwned;

pub use error::ApiError;

/// Largest accepted request body: two base64-encoded documents plus content.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

// ─── Actor extractor ─────────────────────────────────────────────────────────

/// The authenticated caller, taken from the request extensions.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

impl<St> FromRequestParts<St> for CurrentActor
where
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _: &St) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Actor>()
      .copied()
      .map(CurrentActor)
      .ok_or(ApiError::Unauthenticated)
  }
}

// ─── JSON body extractor ─────────────────────────────────────────────────────

/// [`Json`] whose rejections render as [`ApiError`] JSON bodies.
///
/// As `Option<JsonBody<T>>` a request without a `Content-Type` header yields
/// `None`.
#[derive(Debug, Clone, Copy)]
pub struct JsonBody<T>(pub T);

impl<T, St> FromRequest<St> for JsonBody<T>
where
  T: DeserializeOwned,
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &St) -> Result<Self, Self::Rejection> {
    let Json(value) = <Json<T> as FromRequest<St>>::from_request(req, state).await?;
    Ok(Self(value))
  }
}

impl<T, St> OptionalFromRequest<St> for JsonBody<T>
where
  T: DeserializeOwned,
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &St) -> Result<Option<Self>, Self::Rejection> {
    let value = <Json<T> as OptionalFromRequest<St>>::from_request(req, state).await?;
    Ok(value.map(|Json(v)| Self(v)))
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `registry`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, B>(registry: Arc<Registry<S, B>>) -> Router<()>
where
  S: RegistryStore + 'static,
  B: BlobStore + 'static,
{
  use declarations as d;

  Router::new()
    // Declarations
    .route("/declarations", get(d::list::<S, B>).post(d::create::<S, B>))
    .route(
      "/declarations/{id}",
      get(d::get_one::<S, B>)
        .patch(d::update::<S, B>)
        .delete(d::delete_one::<S, B>),
    )
    .route("/declarations/{id}/submit", post(d::submit::<S, B>))
    .route("/declarations/{id}/validate", post(d::validate::<S, B>))
    .route("/declarations/{id}/reject", post(d::reject::<S, B>))
    .route("/declarations/{id}/download", get(d::download::<S, B>))
    .route("/declarations/{id}/documents/{kind}", get(d::preview::<S, B>))
    // Dashboard
    .route("/dashboard", get(dashboard::handler::<S, B>))
    // Geography
    .route("/geo/provinces", get(geo::provinces::<S, B>))
    .route("/geo/provinces/{id}/communes", get(geo::communes::<S, B>))
    .route(
      "/geo/communes/{id}/arrondissements",
      get(geo::arrondissements::<S, B>),
    )
    // Administration
    .route(
      "/admin/mairies",
      get(admin::list_mairies::<S, B>).post(admin::create_mairie::<S, B>),
    )
    .route(
      "/admin/hopitaux",
      get(admin::list_hopitaux::<S, B>).post(admin::create_hopital::<S, B>),
    )
    .route("/admin/hopitaux/{id}", patch(admin::reassign_hopital::<S, B>))
    .route(
      "/admin/actors",
      get(admin::list_actors::<S, B>).post(admin::create_actor::<S, B>),
    )
    .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
    .with_state(registry)
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    Extension,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use registre_core::{
    actor::{NewActor, Role},
    org::{NewHopital, NewMairie},
  };
  use registre_store_fs::FsBlobStore;
  use registre_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  type Reg = Arc<Registry<SqliteStore, FsBlobStore>>;

  struct Fixture {
    registry: Reg,
    author:   Actor,
    outsider: Actor,
    agent:    Actor,
    admin:    Actor,
    _blobs:   TempDir,
  }

  /// Document directory removed when the fixture is dropped.
  struct TempDir(std::path::PathBuf);

  impl Drop for TempDir {
    fn drop(&mut self) { let _ = std::fs::remove_dir_all(&self.0); }
  }

  async fn fixture() -> Fixture {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let dir = TempDir(std::env::temp_dir().join(format!("registre-api-{}", Uuid::new_v4())));
    let blobs = Arc::new(FsBlobStore::new(dir.0.clone()));
    let registry = Arc::new(Registry::new(Arc::clone(&store), blobs));

    let province = store.add_province("Estuaire".into()).await.unwrap();
    let commune = store
      .add_commune(province.province_id, "Libreville".into())
      .await
      .unwrap();
    let arr = store
      .add_arrondissement(commune.commune_id, "1er".into())
      .await
      .unwrap();

    let admin = Actor::Admin { id: Uuid::new_v4() };
    let mairie = registry
      .create_mairie(
        &admin,
        NewMairie {
          nom:                 "Mairie de Libreville".into(),
          description_courte:  None,
          email:               "mairie@example.org".into(),
          telephone_principal: "+241 01 00 00 00".into(),
          adresse_complete:    "Boulevard Triomphal".into(),
          code_postal:         None,
          province_id:         province.province_id,
          commune_id:          commune.commune_id,
          arrondissement_id:   arr.arrondissement_id,
        },
      )
      .await
      .unwrap();
    let hopital = |nom: &str| NewHopital {
      nom:                 nom.into(),
      description_courte:  None,
      type_etablissement:  None,
      email:               "hopital@example.org".into(),
      telephone_principal: "+241 01 11 11 11".into(),
      adresse_complete:    "Avenue de l'Indépendance".into(),
      code_postal:         None,
      mairie_id:           mairie.mairie_id,
    };
    let chu = registry.create_hopital(&admin, hopital("CHU")).await.unwrap();
    let clinique = registry.create_hopital(&admin, hopital("Clinique")).await.unwrap();

    let actor = |role, mairie_id, hopital_id| NewActor {
      name: "Agent".into(),
      email: format!("{}@example.org", Uuid::new_v4().simple()),
      role,
      mairie_id,
      hopital_id,
      password_hash: "$argon2id$stub".into(),
    };
    let mut agents = Vec::new();
    for input in [
      actor(Role::Hopital, None, Some(chu.hopital_id)),
      actor(Role::Hopital, None, Some(clinique.hopital_id)),
      actor(Role::Mairie, Some(mairie.mairie_id), None),
    ] {
      agents.push(
        registry
          .create_actor(&admin, input)
          .await
          .unwrap()
          .actor()
          .unwrap(),
      );
    }

    Fixture {
      registry,
      author: agents[0],
      outsider: agents[1],
      agent: agents[2],
      admin,
      _blobs: dir,
    }
  }

  async fn call(
    registry: &Reg,
    actor: Option<Actor>,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> Response {
    let mut router = api_router(Arc::clone(registry));
    if let Some(actor) = actor {
      router = router.layer(Extension(actor));
    }
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    router.oneshot(builder.body(body).unwrap()).await.unwrap()
  }

  /// `POST` an arbitrary body with the given content type.
  async fn call_raw(
    registry: &Reg,
    actor: Actor,
    uri: &str,
    content_type: &str,
    body: &'static str,
  ) -> Response {
    let req = Request::builder()
      .method("POST")
      .uri(uri)
      .header(header::CONTENT_TYPE, content_type)
      .body(Body::from(body))
      .unwrap();
    api_router(Arc::clone(registry))
      .layer(Extension(actor))
      .oneshot(req)
      .await
      .unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn declaration_body(nom: &str, prenom: &str) -> Value {
    json!({
      "nom_enfant": nom,
      "prenom_enfant": prenom,
      "code_nuin": format!("NUIN-{}", Uuid::new_v4().simple()),
      "date_naissance": "2024-03-14",
      "sexe": "feminin",
      "lieu_naissance": "Libreville",
      "nom_pere": "Obame",
      "prenom_pere": "Jean",
      "profession_pere": null,
      "nationalite_pere": "Gabonaise",
      "nom_mere": "Nze",
      "prenom_mere": "Clarisse",
      "profession_mere": "Infirmière",
      "nationalite_mere": null,
      "email_parent": "parents@example.org",
      "acte_naissance_mere": {
        "file_name": "acte.pdf",
        "media_type": "application/pdf",
        "data": B64.encode(b"%PDF-1.7\n% acte\n"),
      },
    })
  }

  async fn create(f: &Fixture, nom: &str, prenom: &str) -> String {
    let resp = call(
      &f.registry,
      Some(f.author),
      "POST",
      "/declarations",
      Some(declaration_body(nom, prenom)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_body(resp).await["declaration_id"]
      .as_str()
      .unwrap()
      .to_owned()
  }

  #[tokio::test]
  async fn missing_actor_is_401() {
    let f = fixture().await;
    let resp = call(&f.registry, None, "GET", "/declarations", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn create_then_get() {
    let f = fixture().await;
    let id = create(&f, "Mba", "Anatole").await;

    let resp = call(&f.registry, Some(f.author), "GET", &format!("/declarations/{id}"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let view = json_body(resp).await;
    assert_eq!(view["declaration"]["status"], "brouillon");
    assert_eq!(view["declaration"]["prenom_enfant"], "Anatole");
    assert_eq!(view["hopital"]["nom"], "CHU");
    assert_eq!(view["mairie"]["nom"], "Mairie de Libreville");
  }

  #[tokio::test]
  async fn invalid_body_is_422_with_fields() {
    let f = fixture().await;
    let mut body = declaration_body("", "Anatole");
    body["acte_naissance_mere"]["data"] = json!("@@not base64@@");
    let resp = call(&f.registry, Some(f.author), "POST", "/declarations", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let fields = json_body(resp).await["fields"].clone();
    let names: Vec<_> = fields
      .as_array()
      .unwrap()
      .iter()
      .map(|f| f["field"].as_str().unwrap().to_owned())
      .collect();
    assert_eq!(names, ["acte_naissance_mere"]);
  }

  #[tokio::test]
  async fn malformed_bodies_get_json_errors() {
    let f = fixture().await;

    let mut body = declaration_body("Mba", "Anatole");
    body.as_object_mut().unwrap().remove("nom_pere");
    let resp = call(&f.registry, Some(f.author), "POST", "/declarations", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(resp).await["error"].as_str().unwrap().contains("nom_pere"));

    let resp =
      call_raw(&f.registry, f.author, "/declarations", "application/json", "{not json").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["error"].is_string());

    let resp = call_raw(&f.registry, f.author, "/declarations", "text/plain", "{}").await;
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(json_body(resp).await["error"].is_string());
  }

  #[tokio::test]
  async fn other_hospital_is_403_and_unknown_is_404() {
    let f = fixture().await;
    let id = create(&f, "Mba", "Anatole").await;

    let resp =
      call(&f.registry, Some(f.outsider), "GET", &format!("/declarations/{id}"), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = call(
      &f.registry,
      Some(f.author),
      "GET",
      &format!("/declarations/{}", Uuid::new_v4()),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn second_submit_is_409() {
    let f = fixture().await;
    let id = create(&f, "Mba", "Anatole").await;
    let uri = format!("/declarations/{id}/submit");

    let resp = call(&f.registry, Some(f.author), "POST", &uri, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["status"], "envoyee");

    let resp = call(&f.registry, Some(f.author), "POST", &uri, None).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(resp).await["status"], "envoyee");
  }

  #[tokio::test]
  async fn reject_needs_a_reason() {
    let f = fixture().await;
    let id = create(&f, "Mba", "Anatole").await;
    call(&f.registry, Some(f.author), "POST", &format!("/declarations/{id}/submit"), None).await;

    let uri = format!("/declarations/{id}/reject");
    for body in [Some(json!({})), None] {
      let resp = call(&f.registry, Some(f.agent), "POST", &uri, body).await;
      assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
      assert_eq!(json_body(resp).await["fields"][0]["field"], "motif_rejet");
    }

    let resp = call(
      &f.registry,
      Some(f.agent),
      "POST",
      &uri,
      Some(json!({ "motif_rejet": "acte illisible" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "rejetee");
    assert_eq!(body["motif_rejet"], "acte illisible");
  }

  #[tokio::test]
  async fn search_and_bad_field() {
    let f = fixture().await;
    create(&f, "Ana", "Lucie").await;
    create(&f, "Mba", "Anatole").await;
    create(&f, "Obiang", "Paul").await;

    let resp = call(&f.registry, Some(f.agent), "GET", "/declarations?q=ana", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 2);

    let resp = call(
      &f.registry,
      Some(f.agent),
      "GET",
      "/declarations?field=password&query=x",
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  }

  #[tokio::test]
  async fn update_patch_and_delete() {
    let f = fixture().await;
    let id = create(&f, "Mba", "Anatole").await;
    let uri = format!("/declarations/{id}");

    let resp = call(
      &f.registry,
      Some(f.author),
      "PATCH",
      &uri,
      Some(json!({ "lieu_naissance": "Franceville", "nationalite_pere": null })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["lieu_naissance"], "Franceville");
    assert!(body["nationalite_pere"].is_null());
    assert_eq!(body["prenom_enfant"], "Anatole");

    let resp = call(&f.registry, Some(f.author), "DELETE", &uri, None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = call(&f.registry, Some(f.author), "GET", &uri, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn download_and_preview_headers() {
    let f = fixture().await;
    let id = create(&f, "Mba", "Anatole").await;

    let resp = call(
      &f.registry,
      Some(f.agent),
      "GET",
      &format!("/declarations/{id}/download"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert_eq!(disposition, "attachment; filename=\"declaration_hopital_mba-anatole.txt\"");

    let resp = call(
      &f.registry,
      Some(f.author),
      "GET",
      &format!("/declarations/{id}/documents/mere"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"%PDF-"));

    let resp = call(
      &f.registry,
      Some(f.author),
      "GET",
      &format!("/declarations/{id}/documents/pere"),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn dashboard_is_role_tagged() {
    let f = fixture().await;
    create(&f, "Mba", "Anatole").await;

    let resp = call(&f.registry, Some(f.author), "GET", "/dashboard", None).await;
    let body = json_body(resp).await;
    assert_eq!(body["role"], "hopital");
    assert_eq!(body["total"], 1);

    let resp = call(&f.registry, Some(f.admin), "GET", "/dashboard", None).await;
    let body = json_body(resp).await;
    assert_eq!(body["role"], "admin");
    assert_eq!(body["hopitaux"], 2);
    let recent = body["recent_entities"].as_array().unwrap();
    let organisations = body["mairies"].as_u64().unwrap() + 2;
    assert_eq!(recent.len() as u64, organisations.min(5));
    assert!(recent.iter().all(|e| e["type"] == "mairie" || e["type"] == "hopital"));
    assert!(recent.iter().all(|e| e["nom"].is_string() && e["created_at"].is_string()));
  }

  #[tokio::test]
  async fn admin_creates_actor_with_hashed_password() {
    let f = fixture().await;
    let body = json!({
      "name": "Officier",
      "email": "officier@example.org",
      "role": "admin",
      "password": "correct horse",
    });
    let resp = call(&f.registry, Some(f.admin), "POST", "/admin/actors", Some(body.clone())).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = json_body(resp).await;
    assert!(created.get("password_hash").is_none());

    let record = f
      .registry
      .store()
      .find_actor_by_email("officier@example.org".into())
      .await
      .unwrap()
      .unwrap();
    assert!(password::verify_password("correct horse", &record.password_hash));

    let resp = call(&f.registry, Some(f.agent), "POST", "/admin/actors", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn geography_lookups() {
    let f = fixture().await;
    let resp = call(&f.registry, Some(f.author), "GET", "/geo/provinces", None).await;
    let provinces = json_body(resp).await;
    let id = provinces[0]["province_id"].as_str().unwrap().to_owned();

    let resp = call(
      &f.registry,
      Some(f.author),
      "GET",
      &format!("/geo/provinces/{id}/communes"),
      None,
    )
    .await;
    assert_eq!(json_body(resp).await[0]["nom"], "Libreville");
  }
}
