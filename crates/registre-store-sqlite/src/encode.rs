//! Encoding and decoding helpers between registry types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 UTC strings with a fixed microsecond precision so
//! that lexical order equals chronological order. Blob references are compact
//! JSON. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use registre_core::{
  actor::{ActorRecord, Role},
  blob::BlobRef,
  declaration::{Declaration, DeclarationContent, Sexe},
  lifecycle::Status,
  org::{Arrondissement, Commune, Hopital, Mairie, NewHopital, NewMairie, Province},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

/// Parse a strum-backed enumeration column.
fn decode_enum<T: std::str::FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::InvalidValue {
    column,
    value: s.to_owned(),
  })
}

pub fn decode_status(s: &str) -> Result<Status> { decode_enum("statut", s) }

// ─── Blob references ─────────────────────────────────────────────────────────

pub fn encode_blob(r: &Option<BlobRef>) -> Result<Option<String>> {
  r.as_ref().map(serde_json::to_string).transpose().map_err(Error::from)
}

fn decode_blob(s: Option<String>) -> Result<Option<BlobRef>> {
  s.as_deref()
    .map(serde_json::from_str)
    .transpose()
    .map_err(Error::from)
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

pub const PROVINCE_COLUMNS: &str = "province_id, nom";

pub struct RawProvince {
  pub province_id: String,
  pub nom:         String,
}

impl RawProvince {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      province_id: row.get(0)?,
      nom:         row.get(1)?,
    })
  }

  pub fn into_province(self) -> Result<Province> {
    Ok(Province {
      province_id: decode_uuid(&self.province_id)?,
      nom:         self.nom,
    })
  }
}

pub const COMMUNE_COLUMNS: &str = "commune_id, province_id, nom";

pub struct RawCommune {
  pub commune_id:  String,
  pub province_id: String,
  pub nom:         String,
}

impl RawCommune {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      commune_id:  row.get(0)?,
      province_id: row.get(1)?,
      nom:         row.get(2)?,
    })
  }

  pub fn into_commune(self) -> Result<Commune> {
    Ok(Commune {
      commune_id:  decode_uuid(&self.commune_id)?,
      province_id: decode_uuid(&self.province_id)?,
      nom:         self.nom,
    })
  }
}

pub const ARRONDISSEMENT_COLUMNS: &str = "arrondissement_id, commune_id, nom";

pub struct RawArrondissement {
  pub arrondissement_id: String,
  pub commune_id:        String,
  pub nom:               String,
}

impl RawArrondissement {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      arrondissement_id: row.get(0)?,
      commune_id:        row.get(1)?,
      nom:               row.get(2)?,
    })
  }

  pub fn into_arrondissement(self) -> Result<Arrondissement> {
    Ok(Arrondissement {
      arrondissement_id: decode_uuid(&self.arrondissement_id)?,
      commune_id:        decode_uuid(&self.commune_id)?,
      nom:               self.nom,
    })
  }
}

pub const MAIRIE_COLUMNS: &str = "mairie_id, nom, description_courte, email, telephone_principal,
   adresse_complete, code_postal, province_id, commune_id, arrondissement_id, created_at";

pub struct RawMairie {
  pub mairie_id:           String,
  pub nom:                 String,
  pub description_courte:  Option<String>,
  pub email:               String,
  pub telephone_principal: String,
  pub adresse_complete:    String,
  pub code_postal:         Option<String>,
  pub province_id:         String,
  pub commune_id:          String,
  pub arrondissement_id:   String,
  pub created_at:          String,
}

impl RawMairie {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      mairie_id:           row.get(0)?,
      nom:                 row.get(1)?,
      description_courte:  row.get(2)?,
      email:               row.get(3)?,
      telephone_principal: row.get(4)?,
      adresse_complete:    row.get(5)?,
      code_postal:         row.get(6)?,
      province_id:         row.get(7)?,
      commune_id:          row.get(8)?,
      arrondissement_id:   row.get(9)?,
      created_at:          row.get(10)?,
    })
  }

  pub fn into_mairie(self) -> Result<Mairie> {
    Ok(Mairie {
      mairie_id:  decode_uuid(&self.mairie_id)?,
      details:    NewMairie {
        nom:                 self.nom,
        description_courte:  self.description_courte,
        email:               self.email,
        telephone_principal: self.telephone_principal,
        adresse_complete:    self.adresse_complete,
        code_postal:         self.code_postal,
        province_id:         decode_uuid(&self.province_id)?,
        commune_id:          decode_uuid(&self.commune_id)?,
        arrondissement_id:   decode_uuid(&self.arrondissement_id)?,
      },
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const HOPITAL_COLUMNS: &str = "hopital_id, nom, description_courte, type_etablissement, email,
   telephone_principal, adresse_complete, code_postal, mairie_id, created_at";

pub struct RawHopital {
  pub hopital_id:          String,
  pub nom:                 String,
  pub description_courte:  Option<String>,
  pub type_etablissement:  Option<String>,
  pub email:               String,
  pub telephone_principal: String,
  pub adresse_complete:    String,
  pub code_postal:         Option<String>,
  pub mairie_id:           String,
  pub created_at:          String,
}

impl RawHopital {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      hopital_id:          row.get(0)?,
      nom:                 row.get(1)?,
      description_courte:  row.get(2)?,
      type_etablissement:  row.get(3)?,
      email:               row.get(4)?,
      telephone_principal: row.get(5)?,
      adresse_complete:    row.get(6)?,
      code_postal:         row.get(7)?,
      mairie_id:           row.get(8)?,
      created_at:          row.get(9)?,
    })
  }

  pub fn into_hopital(self) -> Result<Hopital> {
    Ok(Hopital {
      hopital_id: decode_uuid(&self.hopital_id)?,
      details:    NewHopital {
        nom:                 self.nom,
        description_courte:  self.description_courte,
        type_etablissement:  self.type_etablissement,
        email:               self.email,
        telephone_principal: self.telephone_principal,
        adresse_complete:    self.adresse_complete,
        code_postal:         self.code_postal,
        mairie_id:           decode_uuid(&self.mairie_id)?,
      },
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const ACTOR_COLUMNS: &str =
  "actor_id, name, email, role, mairie_id, hopital_id, password_hash, created_at";

pub struct RawActor {
  pub actor_id:      String,
  pub name:          String,
  pub email:         String,
  pub role:          String,
  pub mairie_id:     Option<String>,
  pub hopital_id:    Option<String>,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawActor {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      actor_id:      row.get(0)?,
      name:          row.get(1)?,
      email:         row.get(2)?,
      role:          row.get(3)?,
      mairie_id:     row.get(4)?,
      hopital_id:    row.get(5)?,
      password_hash: row.get(6)?,
      created_at:    row.get(7)?,
    })
  }

  pub fn into_record(self) -> Result<ActorRecord> {
    Ok(ActorRecord {
      actor_id:      decode_uuid(&self.actor_id)?,
      name:          self.name,
      email:         self.email,
      role:          decode_enum::<Role>("role", &self.role)?,
      mairie_id:     decode_opt_uuid(self.mairie_id)?,
      hopital_id:    decode_opt_uuid(self.hopital_id)?,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub const DECLARATION_COLUMNS: &str = "declaration_id,
   nom_enfant, prenom_enfant, code_nuin, date_naissance, sexe, lieu_naissance,
   nom_pere, prenom_pere, profession_pere, nationalite_pere,
   nom_mere, prenom_mere, profession_mere, nationalite_mere,
   email_parent, acte_naissance_mere, acte_naissance_pere, motif_rejet, statut,
   agent_hopital_id, hopital_id, mairie_id, agent_mairie_id, created_at, updated_at";

pub struct RawDeclaration {
  pub declaration_id:      String,
  pub nom_enfant:          String,
  pub prenom_enfant:       String,
  pub code_nuin:           String,
  pub date_naissance:      String,
  pub sexe:                String,
  pub lieu_naissance:      String,
  pub nom_pere:            String,
  pub prenom_pere:         String,
  pub profession_pere:     Option<String>,
  pub nationalite_pere:    Option<String>,
  pub nom_mere:            String,
  pub prenom_mere:         String,
  pub profession_mere:     Option<String>,
  pub nationalite_mere:    Option<String>,
  pub email_parent:        String,
  pub acte_naissance_mere: Option<String>,
  pub acte_naissance_pere: Option<String>,
  pub motif_rejet:         Option<String>,
  pub statut:              String,
  pub agent_hopital_id:    String,
  pub hopital_id:          String,
  pub mairie_id:           String,
  pub agent_mairie_id:     Option<String>,
  pub created_at:          String,
  pub updated_at:          String,
}

impl RawDeclaration {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      declaration_id:      row.get(0)?,
      nom_enfant:          row.get(1)?,
      prenom_enfant:       row.get(2)?,
      code_nuin:           row.get(3)?,
      date_naissance:      row.get(4)?,
      sexe:                row.get(5)?,
      lieu_naissance:      row.get(6)?,
      nom_pere:            row.get(7)?,
      prenom_pere:         row.get(8)?,
      profession_pere:     row.get(9)?,
      nationalite_pere:    row.get(10)?,
      nom_mere:            row.get(11)?,
      prenom_mere:         row.get(12)?,
      profession_mere:     row.get(13)?,
      nationalite_mere:    row.get(14)?,
      email_parent:        row.get(15)?,
      acte_naissance_mere: row.get(16)?,
      acte_naissance_pere: row.get(17)?,
      motif_rejet:         row.get(18)?,
      statut:              row.get(19)?,
      agent_hopital_id:    row.get(20)?,
      hopital_id:          row.get(21)?,
      mairie_id:           row.get(22)?,
      agent_mairie_id:     row.get(23)?,
      created_at:          row.get(24)?,
      updated_at:          row.get(25)?,
    })
  }

  pub fn into_declaration(self) -> Result<Declaration> {
    Ok(Declaration {
      declaration_id:      decode_uuid(&self.declaration_id)?,
      content:             DeclarationContent {
        nom_enfant:       self.nom_enfant,
        prenom_enfant:    self.prenom_enfant,
        code_nuin:        self.code_nuin,
        date_naissance:   decode_date(&self.date_naissance)?,
        sexe:             decode_enum::<Sexe>("sexe", &self.sexe)?,
        lieu_naissance:   self.lieu_naissance,
        nom_pere:         self.nom_pere,
        prenom_pere:      self.prenom_pere,
        profession_pere:  self.profession_pere,
        nationalite_pere: self.nationalite_pere,
        nom_mere:         self.nom_mere,
        prenom_mere:      self.prenom_mere,
        profession_mere:  self.profession_mere,
        nationalite_mere: self.nationalite_mere,
        email_parent:     self.email_parent,
      },
      acte_naissance_mere: decode_blob(self.acte_naissance_mere)?,
      acte_naissance_pere: decode_blob(self.acte_naissance_pere)?,
      motif_rejet:         self.motif_rejet,
      status:              decode_status(&self.statut)?,
      agent_hopital_id:    decode_uuid(&self.agent_hopital_id)?,
      hopital_id:          decode_uuid(&self.hopital_id)?,
      mairie_id:           decode_uuid(&self.mairie_id)?,
      agent_mairie_id:     decode_opt_uuid(self.agent_mairie_id)?,
      created_at:          decode_dt(&self.created_at)?,
      updated_at:          decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let b = a + chrono::Duration::microseconds(1);
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn unknown_status_is_an_error() {
    assert!(matches!(
      decode_status("archivee"),
      Err(Error::InvalidValue { column: "statut", .. })
    ));
  }
}
