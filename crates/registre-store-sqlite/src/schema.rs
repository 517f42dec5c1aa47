//! SQL schema for the registry's SQLite store.
//!
//! Executed once at connection startup; the version is recorded with
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS provinces (
    province_id TEXT PRIMARY KEY,
    nom         TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS communes (
    commune_id  TEXT PRIMARY KEY,
    province_id TEXT NOT NULL REFERENCES provinces(province_id),
    nom         TEXT NOT NULL,
    UNIQUE (province_id, nom)
);

CREATE TABLE IF NOT EXISTS arrondissements (
    arrondissement_id TEXT PRIMARY KEY,
    commune_id        TEXT NOT NULL REFERENCES communes(commune_id),
    nom               TEXT NOT NULL,
    UNIQUE (commune_id, nom)
);

CREATE TABLE IF NOT EXISTS mairies (
    mairie_id           TEXT PRIMARY KEY,
    nom                 TEXT NOT NULL,
    description_courte  TEXT,
    email               TEXT NOT NULL,
    telephone_principal TEXT NOT NULL,
    adresse_complete    TEXT NOT NULL,
    code_postal         TEXT,
    province_id         TEXT NOT NULL REFERENCES provinces(province_id),
    commune_id          TEXT NOT NULL REFERENCES communes(commune_id),
    arrondissement_id   TEXT NOT NULL REFERENCES arrondissements(arrondissement_id),
    created_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS hopitaux (
    hopital_id          TEXT PRIMARY KEY,
    nom                 TEXT NOT NULL,
    description_courte  TEXT,
    type_etablissement  TEXT,
    email               TEXT NOT NULL,
    telephone_principal TEXT NOT NULL,
    adresse_complete    TEXT NOT NULL,
    code_postal         TEXT,
    mairie_id           TEXT NOT NULL REFERENCES mairies(mairie_id),
    created_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS actors (
    actor_id      TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    role          TEXT NOT NULL CHECK (role IN ('admin', 'mairie', 'hopital')),
    mairie_id     TEXT REFERENCES mairies(mairie_id),
    hopital_id    TEXT REFERENCES hopitaux(hopital_id),
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

-- Documents are referenced, never stored inline: acte_naissance_* hold a
-- JSON-encoded blob reference or NULL.
CREATE TABLE IF NOT EXISTS declarations (
    declaration_id      TEXT PRIMARY KEY,
    nom_enfant          TEXT NOT NULL,
    prenom_enfant       TEXT NOT NULL,
    code_nuin           TEXT NOT NULL,
    date_naissance      TEXT NOT NULL,   -- YYYY-MM-DD
    sexe                TEXT NOT NULL,
    lieu_naissance      TEXT NOT NULL,
    nom_pere            TEXT NOT NULL,
    prenom_pere         TEXT NOT NULL,
    profession_pere     TEXT,
    nationalite_pere    TEXT,
    nom_mere            TEXT NOT NULL,
    prenom_mere         TEXT NOT NULL,
    profession_mere     TEXT,
    nationalite_mere    TEXT,
    email_parent        TEXT NOT NULL,
    acte_naissance_mere TEXT,
    acte_naissance_pere TEXT,
    motif_rejet         TEXT,
    statut              TEXT NOT NULL DEFAULT 'brouillon'
                        CHECK (statut IN ('brouillon', 'envoyee', 'validee', 'rejetee')),
    agent_hopital_id    TEXT NOT NULL,   -- actors(actor_id)
    hopital_id          TEXT NOT NULL REFERENCES hopitaux(hopital_id),
    mairie_id           TEXT NOT NULL REFERENCES mairies(mairie_id),
    agent_mairie_id     TEXT,            -- actors(actor_id)
    created_at          TEXT NOT NULL,   -- RFC 3339 UTC, microseconds
    updated_at          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS declarations_hopital_idx ON declarations(hopital_id, created_at);
CREATE INDEX IF NOT EXISTS declarations_mairie_idx  ON declarations(mairie_id, created_at);
CREATE INDEX IF NOT EXISTS declarations_statut_idx  ON declarations(statut);

PRAGMA user_version = 1;
";
