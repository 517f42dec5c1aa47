//! [`SqliteStore`]: the SQLite implementation of [`RegistryStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use registre_core::{
  actor::{ActorRecord, NewActor},
  declaration::Declaration,
  lifecycle::Status,
  org::{Arrondissement, Commune, Hopital, Mairie, NewHopital, NewMairie, Province},
  query::{DeclarationQuery, Scope},
  store::{ContentUpdate, RegistryStore, StatusChange, StatusCounts},
};

use crate::{
  Result,
  encode::{
    ACTOR_COLUMNS, ARRONDISSEMENT_COLUMNS, COMMUNE_COLUMNS, DECLARATION_COLUMNS,
    HOPITAL_COLUMNS, MAIRIE_COLUMNS, PROVINCE_COLUMNS, RawActor, RawArrondissement, RawCommune,
    RawDeclaration, RawHopital, RawMairie, RawProvince, decode_status, encode_blob, encode_date,
    encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

/// Column a [`Scope`] restricts on, and the bound id.
fn scope_filter(scope: Scope) -> (&'static str, String) {
  match scope {
    Scope::Hopital(id) => ("hopital_id", encode_uuid(id)),
    Scope::Mairie(id) => ("mairie_id", encode_uuid(id)),
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A registry store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run raw SQL against the connection, e.g. to install failing triggers.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Single-row lookup by primary key.
  async fn fetch_one<R, F>(&self, sql: String, id: Uuid, read: F) -> Result<Option<R>>
  where
    R: Send + 'static,
    F: Fn(&rusqlite::Row<'_>) -> rusqlite::Result<R> + Send + 'static,
  {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, rusqlite::params![id_str], read).optional()?))
      .await?;
    Ok(raw)
  }

  /// All rows of a query with at most one bound text parameter.
  async fn fetch_all<R, F>(&self, sql: String, param: Option<String>, read: F) -> Result<Vec<R>>
  where
    R: Send + 'static,
    F: Fn(&rusqlite::Row<'_>) -> rusqlite::Result<R> + Send + 'static,
  {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = match param {
          Some(p) => stmt
            .query_map(rusqlite::params![p], &read)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
          None => stmt
            .query_map([], &read)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn count(&self, sql: String, params: Vec<String>) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, rusqlite::params_from_iter(params), |r| r.get(0))?)
      })
      .await?;
    Ok(n.max(0) as u64)
  }
}

// ─── RegistryStore impl ──────────────────────────────────────────────────────

impl RegistryStore for SqliteStore {
  type Error = crate::Error;

  // ── Geography ─────────────────────────────────────────────────────────────

  async fn add_province(&self, nom: String) -> Result<Province> {
    let province = Province {
      province_id: Uuid::new_v4(),
      nom,
    };
    let id_str = encode_uuid(province.province_id);
    let nom = province.nom.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO provinces (province_id, nom) VALUES (?1, ?2)",
          rusqlite::params![id_str, nom],
        )?;
        Ok(())
      })
      .await?;
    Ok(province)
  }

  async fn add_commune(&self, province_id: Uuid, nom: String) -> Result<Commune> {
    let commune = Commune {
      commune_id: Uuid::new_v4(),
      province_id,
      nom,
    };
    let id_str = encode_uuid(commune.commune_id);
    let province_str = encode_uuid(province_id);
    let nom = commune.nom.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO communes (commune_id, province_id, nom) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, province_str, nom],
        )?;
        Ok(())
      })
      .await?;
    Ok(commune)
  }

  async fn add_arrondissement(&self, commune_id: Uuid, nom: String) -> Result<Arrondissement> {
    let arrondissement = Arrondissement {
      arrondissement_id: Uuid::new_v4(),
      commune_id,
      nom,
    };
    let id_str = encode_uuid(arrondissement.arrondissement_id);
    let commune_str = encode_uuid(commune_id);
    let nom = arrondissement.nom.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO arrondissements (arrondissement_id, commune_id, nom) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, commune_str, nom],
        )?;
        Ok(())
      })
      .await?;
    Ok(arrondissement)
  }

  async fn list_provinces(&self) -> Result<Vec<Province>> {
    let sql = format!("SELECT {PROVINCE_COLUMNS} FROM provinces ORDER BY nom");
    let raws = self.fetch_all(sql, None, RawProvince::from_row).await?;
    raws.into_iter().map(RawProvince::into_province).collect()
  }

  async fn list_communes(&self, province_id: Uuid) -> Result<Vec<Commune>> {
    let sql = format!("SELECT {COMMUNE_COLUMNS} FROM communes WHERE province_id = ?1 ORDER BY nom");
    let raws = self
      .fetch_all(sql, Some(encode_uuid(province_id)), RawCommune::from_row)
      .await?;
    raws.into_iter().map(RawCommune::into_commune).collect()
  }

  async fn list_arrondissements(&self, commune_id: Uuid) -> Result<Vec<Arrondissement>> {
    let sql = format!(
      "SELECT {ARRONDISSEMENT_COLUMNS} FROM arrondissements WHERE commune_id = ?1 ORDER BY nom"
    );
    let raws = self
      .fetch_all(sql, Some(encode_uuid(commune_id)), RawArrondissement::from_row)
      .await?;
    raws
      .into_iter()
      .map(RawArrondissement::into_arrondissement)
      .collect()
  }

  async fn get_commune(&self, id: Uuid) -> Result<Option<Commune>> {
    let sql = format!("SELECT {COMMUNE_COLUMNS} FROM communes WHERE commune_id = ?1");
    let raw = self.fetch_one(sql, id, RawCommune::from_row).await?;
    raw.map(RawCommune::into_commune).transpose()
  }

  async fn get_arrondissement(&self, id: Uuid) -> Result<Option<Arrondissement>> {
    let sql =
      format!("SELECT {ARRONDISSEMENT_COLUMNS} FROM arrondissements WHERE arrondissement_id = ?1");
    let raw = self.fetch_one(sql, id, RawArrondissement::from_row).await?;
    raw.map(RawArrondissement::into_arrondissement).transpose()
  }

  // ── Mairies and hospitals ─────────────────────────────────────────────────

  async fn add_mairie(&self, input: NewMairie) -> Result<Mairie> {
    let mairie = Mairie {
      mairie_id:  Uuid::new_v4(),
      details:    input,
      created_at: Utc::now(),
    };

    let id_str    = encode_uuid(mairie.mairie_id);
    let d         = mairie.details.clone();
    let province  = encode_uuid(d.province_id);
    let commune   = encode_uuid(d.commune_id);
    let arrond    = encode_uuid(d.arrondissement_id);
    let at_str    = encode_dt(mairie.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO mairies (
             mairie_id, nom, description_courte, email, telephone_principal,
             adresse_complete, code_postal, province_id, commune_id, arrondissement_id,
             created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            id_str,
            d.nom,
            d.description_courte,
            d.email,
            d.telephone_principal,
            d.adresse_complete,
            d.code_postal,
            province,
            commune,
            arrond,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(mairie)
  }

  async fn get_mairie(&self, id: Uuid) -> Result<Option<Mairie>> {
    let sql = format!("SELECT {MAIRIE_COLUMNS} FROM mairies WHERE mairie_id = ?1");
    let raw = self.fetch_one(sql, id, RawMairie::from_row).await?;
    raw.map(RawMairie::into_mairie).transpose()
  }

  async fn list_mairies(&self) -> Result<Vec<Mairie>> {
    let sql = format!("SELECT {MAIRIE_COLUMNS} FROM mairies ORDER BY nom");
    let raws = self.fetch_all(sql, None, RawMairie::from_row).await?;
    raws.into_iter().map(RawMairie::into_mairie).collect()
  }

  async fn recent_mairies(&self, limit: usize) -> Result<Vec<Mairie>> {
    let sql = format!(
      "SELECT {MAIRIE_COLUMNS} FROM mairies ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
    );
    let raws = self.fetch_all(sql, None, RawMairie::from_row).await?;
    raws.into_iter().map(RawMairie::into_mairie).collect()
  }

  async fn count_mairies(&self) -> Result<u64> {
    self
      .count("SELECT COUNT(*) FROM mairies".to_owned(), Vec::new())
      .await
  }

  async fn add_hopital(&self, input: NewHopital) -> Result<Hopital> {
    let hopital = Hopital {
      hopital_id: Uuid::new_v4(),
      details:    input,
      created_at: Utc::now(),
    };

    let id_str     = encode_uuid(hopital.hopital_id);
    let d          = hopital.details.clone();
    let mairie_str = encode_uuid(d.mairie_id);
    let at_str     = encode_dt(hopital.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO hopitaux (
             hopital_id, nom, description_courte, type_etablissement, email,
             telephone_principal, adresse_complete, code_postal, mairie_id, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            d.nom,
            d.description_courte,
            d.type_etablissement,
            d.email,
            d.telephone_principal,
            d.adresse_complete,
            d.code_postal,
            mairie_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(hopital)
  }

  async fn get_hopital(&self, id: Uuid) -> Result<Option<Hopital>> {
    let sql = format!("SELECT {HOPITAL_COLUMNS} FROM hopitaux WHERE hopital_id = ?1");
    let raw = self.fetch_one(sql, id, RawHopital::from_row).await?;
    raw.map(RawHopital::into_hopital).transpose()
  }

  async fn list_hopitaux(&self, mairie_id: Option<Uuid>) -> Result<Vec<Hopital>> {
    let raws = match mairie_id {
      Some(m) => {
        let sql =
          format!("SELECT {HOPITAL_COLUMNS} FROM hopitaux WHERE mairie_id = ?1 ORDER BY nom");
        self
          .fetch_all(sql, Some(encode_uuid(m)), RawHopital::from_row)
          .await?
      }
      None => {
        let sql = format!("SELECT {HOPITAL_COLUMNS} FROM hopitaux ORDER BY nom");
        self.fetch_all(sql, None, RawHopital::from_row).await?
      }
    };
    raws.into_iter().map(RawHopital::into_hopital).collect()
  }

  async fn recent_hopitaux(&self, limit: usize) -> Result<Vec<Hopital>> {
    let sql = format!(
      "SELECT {HOPITAL_COLUMNS} FROM hopitaux ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
    );
    let raws = self.fetch_all(sql, None, RawHopital::from_row).await?;
    raws.into_iter().map(RawHopital::into_hopital).collect()
  }

  async fn count_hopitaux(&self) -> Result<u64> {
    self
      .count("SELECT COUNT(*) FROM hopitaux".to_owned(), Vec::new())
      .await
  }

  async fn reassign_hopital(&self, hopital_id: Uuid, mairie_id: Uuid) -> Result<bool> {
    let hopital_str = encode_uuid(hopital_id);
    let mairie_str = encode_uuid(mairie_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE hopitaux SET mairie_id = ?2 WHERE hopital_id = ?1",
          rusqlite::params![hopital_str, mairie_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  // ── Actors ────────────────────────────────────────────────────────────────

  async fn add_actor(&self, input: NewActor) -> Result<ActorRecord> {
    let record = ActorRecord {
      actor_id:      Uuid::new_v4(),
      name:          input.name,
      email:         input.email.trim().to_owned(),
      role:          input.role,
      mairie_id:     input.mairie_id,
      hopital_id:    input.hopital_id,
      password_hash: input.password_hash,
      created_at:    Utc::now(),
    };

    let id_str      = encode_uuid(record.actor_id);
    let name        = record.name.clone();
    let email       = record.email.clone();
    let role: &str  = record.role.into();
    let mairie_str  = record.mairie_id.map(encode_uuid);
    let hopital_str = record.hopital_id.map(encode_uuid);
    let hash        = record.password_hash.clone();
    let at_str      = encode_dt(record.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO actors (
             actor_id, name, email, role, mairie_id, hopital_id, password_hash, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![id_str, name, email, role, mairie_str, hopital_str, hash, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(record)
  }

  async fn get_actor(&self, id: Uuid) -> Result<Option<ActorRecord>> {
    let sql = format!("SELECT {ACTOR_COLUMNS} FROM actors WHERE actor_id = ?1");
    let raw = self.fetch_one(sql, id, RawActor::from_row).await?;
    raw.map(RawActor::into_record).transpose()
  }

  async fn find_actor_by_email(&self, email: String) -> Result<Option<ActorRecord>> {
    let sql = format!("SELECT {ACTOR_COLUMNS} FROM actors WHERE email = ?1");
    let email = email.trim().to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(&sql, rusqlite::params![email], RawActor::from_row)
          .optional()?)
      })
      .await?;
    raw.map(RawActor::into_record).transpose()
  }

  async fn list_actors(&self) -> Result<Vec<ActorRecord>> {
    let sql = format!("SELECT {ACTOR_COLUMNS} FROM actors ORDER BY created_at, rowid");
    let raws = self.fetch_all(sql, None, RawActor::from_row).await?;
    raws.into_iter().map(RawActor::into_record).collect()
  }

  async fn count_actors(&self) -> Result<u64> {
    self
      .count("SELECT COUNT(*) FROM actors".to_owned(), Vec::new())
      .await
  }

  // ── Declarations ──────────────────────────────────────────────────────────

  async fn insert_declaration(&self, declaration: Declaration) -> Result<()> {
    let mere_str = encode_blob(&declaration.acte_naissance_mere)?;
    let pere_str = encode_blob(&declaration.acte_naissance_pere)?;
    let d = declaration;

    self
      .conn
      .call(move |conn| {
        let c = &d.content;
        conn.execute(
          &format!(
            "INSERT INTO declarations ({DECLARATION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                     ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)"
          ),
          rusqlite::params![
            encode_uuid(d.declaration_id),
            c.nom_enfant,
            c.prenom_enfant,
            c.code_nuin,
            encode_date(c.date_naissance),
            c.sexe.to_string(),
            c.lieu_naissance,
            c.nom_pere,
            c.prenom_pere,
            c.profession_pere,
            c.nationalite_pere,
            c.nom_mere,
            c.prenom_mere,
            c.profession_mere,
            c.nationalite_mere,
            c.email_parent,
            mere_str,
            pere_str,
            d.motif_rejet,
            d.status.as_str(),
            encode_uuid(d.agent_hopital_id),
            encode_uuid(d.hopital_id),
            encode_uuid(d.mairie_id),
            d.agent_mairie_id.map(encode_uuid),
            encode_dt(d.created_at),
            encode_dt(d.updated_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_declaration(&self, id: Uuid) -> Result<Option<Declaration>> {
    let sql = format!("SELECT {DECLARATION_COLUMNS} FROM declarations WHERE declaration_id = ?1");
    let raw = self.fetch_one(sql, id, RawDeclaration::from_row).await?;
    raw.map(RawDeclaration::into_declaration).transpose()
  }

  async fn update_declaration(&self, update: ContentUpdate) -> Result<bool> {
    let mere_str = encode_blob(&update.acte_naissance_mere)?;
    let pere_str = encode_blob(&update.acte_naissance_pere)?;
    let [editable_a, editable_b] = Status::EDITABLE;
    let id = update.declaration_id;
    let u = update;

    let changed = self
      .conn
      .call(move |conn| {
        let c = &u.content;
        Ok(conn.execute(
          "UPDATE declarations SET
             nom_enfant = ?2, prenom_enfant = ?3, date_naissance = ?4, sexe = ?5,
             lieu_naissance = ?6, nom_pere = ?7, prenom_pere = ?8, profession_pere = ?9,
             nationalite_pere = ?10, nom_mere = ?11, prenom_mere = ?12,
             profession_mere = ?13, nationalite_mere = ?14, email_parent = ?15,
             acte_naissance_mere = ?16, acte_naissance_pere = ?17, updated_at = ?18
           WHERE declaration_id = ?1 AND statut IN (?19, ?20) AND updated_at = ?21",
          rusqlite::params![
            encode_uuid(u.declaration_id),
            c.nom_enfant,
            c.prenom_enfant,
            encode_date(c.date_naissance),
            c.sexe.to_string(),
            c.lieu_naissance,
            c.nom_pere,
            c.prenom_pere,
            c.profession_pere,
            c.nationalite_pere,
            c.nom_mere,
            c.prenom_mere,
            c.profession_mere,
            c.nationalite_mere,
            c.email_parent,
            mere_str,
            pere_str,
            encode_dt(u.updated_at),
            editable_a.as_str(),
            editable_b.as_str(),
            encode_dt(u.read_at),
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      debug!(declaration_id = %id, "content update not applied");
    }
    Ok(changed > 0)
  }

  async fn transition_declaration(&self, change: StatusChange) -> Result<bool> {
    let id_str     = encode_uuid(change.declaration_id);
    let from       = change.from.as_str();
    let to         = change.to.as_str();
    let agent_str  = change.agent_mairie_id.map(encode_uuid);
    let motif      = change.motif_rejet;
    let at_str     = encode_dt(change.at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE declarations SET
             statut          = ?3,
             agent_mairie_id = COALESCE(?4, agent_mairie_id),
             motif_rejet     = COALESCE(?5, motif_rejet),
             updated_at      = ?6
           WHERE declaration_id = ?1 AND statut = ?2",
          rusqlite::params![id_str, from, to, agent_str, motif, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      debug!(declaration_id = %change.declaration_id, %from, %to, "status change not applied");
    }
    Ok(changed > 0)
  }

  async fn delete_declaration(&self, id: Uuid, read_at: DateTime<Utc>) -> Result<bool> {
    let id_str = encode_uuid(id);
    let read_str = encode_dt(read_at);
    let [editable_a, editable_b] = Status::EDITABLE;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM declarations
           WHERE declaration_id = ?1 AND statut IN (?2, ?3) AND updated_at = ?4",
          rusqlite::params![id_str, editable_a.as_str(), editable_b.as_str(), read_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn list_declarations(
    &self,
    scope: Scope,
    query: DeclarationQuery,
  ) -> Result<Vec<Declaration>> {
    let (column, scope_id) = scope_filter(scope);
    let status = query.status.status().map(Status::as_str);

    // Scope and status are applied in SQL; the text search runs on decoded
    // rows so its case folding matches `DeclarationQuery::matches_text`.
    let raws: Vec<RawDeclaration> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DECLARATION_COLUMNS} FROM declarations
           WHERE {column} = ?1 AND (?2 IS NULL OR statut = ?2)
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![scope_id, status], RawDeclaration::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut out = Vec::new();
    let mut skipped = 0;
    let offset = query.offset.unwrap_or(0);
    for raw in raws {
      let declaration = raw.into_declaration()?;
      if !query.matches_text(&declaration.content) {
        continue;
      }
      if skipped < offset {
        skipped += 1;
        continue;
      }
      out.push(declaration);
      if query.limit.is_some_and(|l| out.len() >= l) {
        break;
      }
    }
    Ok(out)
  }

  async fn status_counts(&self, scope: Scope) -> Result<StatusCounts> {
    let (column, scope_id) = scope_filter(scope);

    let rows: Vec<(String, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT statut, COUNT(*) FROM declarations WHERE {column} = ?1 GROUP BY statut"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![scope_id], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut counts = StatusCounts::default();
    for (statut, n) in rows {
      counts.add(decode_status(&statut)?, n.max(0) as u64);
    }
    Ok(counts)
  }

  async fn count_created_since(&self, scope: Scope, since: DateTime<Utc>) -> Result<u64> {
    let (column, scope_id) = scope_filter(scope);
    self
      .count(
        format!("SELECT COUNT(*) FROM declarations WHERE {column} = ?1 AND created_at >= ?2"),
        vec![scope_id, encode_dt(since)],
      )
      .await
  }

  async fn count_declarations(&self) -> Result<u64> {
    self
      .count("SELECT COUNT(*) FROM declarations".to_owned(), Vec::new())
      .await
  }
}
