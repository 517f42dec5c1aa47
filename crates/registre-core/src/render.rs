//! Turning a declaration into a downloadable document.

use crate::{Result, query::DeclarationView};

/// A rendered, downloadable document.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
  pub filename:   String,
  pub media_type: &'static str,
  pub bytes:      Vec<u8>,
}

/// Produces the downloadable form of a fully loaded declaration.
pub trait DocumentRenderer: Send + Sync {
  fn render(&self, view: &DeclarationView) -> Result<RenderedDocument>;
}

/// `declaration_hopital_<slug>.<extension>`, where the slug comes from the
/// child's names, else the NUIN code, else the declaration id.
pub fn download_filename(view: &DeclarationView, extension: &str) -> String {
  let c = &view.declaration.content;
  let stem = if !c.nom_enfant.trim().is_empty() && !c.prenom_enfant.trim().is_empty() {
    slugify(&format!("{}_{}", c.nom_enfant, c.prenom_enfant))
  } else if !c.code_nuin.trim().is_empty() {
    slugify(&c.code_nuin)
  } else {
    String::new()
  };
  let stem = if stem.is_empty() {
    view.declaration.declaration_id.to_string()
  } else {
    stem
  };
  format!("declaration_hopital_{stem}.{extension}")
}

/// Lower-case ASCII slug with `-` separators; accented Latin letters are
/// folded to their base letter.
pub fn slugify(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  let mut pending_dash = false;
  for ch in input.chars().flat_map(char::to_lowercase) {
    let mut buf = [0u8; 4];
    let piece: &str = if ch.is_ascii_alphanumeric() {
      ch.encode_utf8(&mut buf)
    } else {
      fold(ch)
    };
    if piece.is_empty() {
      pending_dash = !out.is_empty();
      continue;
    }
    if pending_dash {
      out.push('-');
      pending_dash = false;
    }
    out.push_str(piece);
  }
  out
}

/// ASCII replacement for a lower-case non-ASCII letter; empty for anything
/// else, which then acts as a separator.
fn fold(ch: char) -> &'static str {
  match ch {
    'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
    'æ' => "ae",
    'ç' => "c",
    'è' | 'é' | 'ê' | 'ë' => "e",
    'ì' | 'í' | 'î' | 'ï' => "i",
    'ñ' => "n",
    'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
    'œ' => "oe",
    'ù' | 'ú' | 'û' | 'ü' => "u",
    'ý' | 'ÿ' => "y",
    'ß' => "ss",
    _ => "",
  }
}

// ─── Plain-text renderer ─────────────────────────────────────────────────────

/// Default renderer: a UTF-8 text summary of the declaration.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextRenderer;

impl DocumentRenderer for PlainTextRenderer {
  fn render(&self, view: &DeclarationView) -> Result<RenderedDocument> {
    let d = &view.declaration;
    let c = &d.content;
    let or_dash = |v: &Option<String>| v.as_deref().unwrap_or("-").to_owned();

    let mut text = String::new();
    line(&mut text, "DÉCLARATION DE NAISSANCE");
    line(&mut text, &format!("Référence : {}", d.declaration_id));
    line(&mut text, &format!("Statut : {}", d.status));
    if let Some(h) = &view.hopital {
      line(&mut text, &format!("Hôpital : {}", h.details.nom));
    }
    if let Some(m) = &view.mairie {
      line(&mut text, &format!("Mairie : {}", m.details.nom));
    }
    line(&mut text, "");
    line(&mut text, "ENFANT");
    line(&mut text, &format!("Nom : {}", c.nom_enfant));
    line(&mut text, &format!("Prénom : {}", c.prenom_enfant));
    line(&mut text, &format!("Code NUIN : {}", c.code_nuin));
    line(&mut text, &format!("Né(e) le : {}", c.date_naissance.format("%d/%m/%Y")));
    line(&mut text, &format!("Sexe : {}", c.sexe));
    line(&mut text, &format!("Lieu de naissance : {}", c.lieu_naissance));
    line(&mut text, "");
    line(&mut text, "PÈRE");
    line(&mut text, &format!("{} {}", c.prenom_pere, c.nom_pere));
    line(&mut text, &format!("Profession : {}", or_dash(&c.profession_pere)));
    line(&mut text, &format!("Nationalité : {}", or_dash(&c.nationalite_pere)));
    line(&mut text, "");
    line(&mut text, "MÈRE");
    line(&mut text, &format!("{} {}", c.prenom_mere, c.nom_mere));
    line(&mut text, &format!("Profession : {}", or_dash(&c.profession_mere)));
    line(&mut text, &format!("Nationalité : {}", or_dash(&c.nationalite_mere)));
    line(&mut text, "");
    line(&mut text, &format!("Contact : {}", c.email_parent));
    if let Some(motif) = &d.motif_rejet {
      line(&mut text, &format!("Motif de rejet : {motif}"));
    }

    Ok(RenderedDocument {
      filename:   download_filename(view, "txt"),
      media_type: "text/plain; charset=utf-8",
      bytes:      text.into_bytes(),
    })
  }
}

fn line(out: &mut String, text: &str) {
  out.push_str(text);
  out.push('\n');
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;
  use crate::{
    declaration::{Declaration, tests::content},
    lifecycle::Status,
  };

  fn view(nom: &str, prenom: &str, nuin: &str) -> DeclarationView {
    let now = Utc::now();
    let mut c = content();
    c.nom_enfant = nom.into();
    c.prenom_enfant = prenom.into();
    c.code_nuin = nuin.into();
    DeclarationView {
      declaration: Declaration {
        declaration_id: Uuid::nil(),
        content: c,
        acte_naissance_mere: None,
        acte_naissance_pere: None,
        motif_rejet: None,
        status: Status::Validee,
        agent_hopital_id: Uuid::nil(),
        hopital_id: Uuid::nil(),
        mairie_id: Uuid::nil(),
        agent_mairie_id: None,
        created_at: now,
        updated_at: now,
      },
      hopital: None,
      mairie: None,
    }
  }

  #[test]
  fn slug_folds_accents_and_separators() {
    assert_eq!(slugify("Ndong_Hélène"), "ndong-helene");
    assert_eq!(slugify("  Jean--Éric  "), "jean-eric");
    assert_eq!(slugify("NUIN/2024 001"), "nuin-2024-001");
    assert_eq!(slugify("***"), "");
  }

  #[test]
  fn filename_from_child_names() {
    assert_eq!(
      download_filename(&view("Mba", "Anatole", "X1"), "pdf"),
      "declaration_hopital_mba-anatole.pdf"
    );
  }

  #[test]
  fn filename_falls_back_to_nuin_then_id() {
    assert_eq!(
      download_filename(&view("", "Anatole", "NUIN 42"), "pdf"),
      "declaration_hopital_nuin-42.pdf"
    );
    assert_eq!(
      download_filename(&view("", "", ""), "txt"),
      format!("declaration_hopital_{}.txt", Uuid::nil())
    );
  }

  #[test]
  fn plain_text_contains_child() {
    let doc = PlainTextRenderer.render(&view("Mba", "Anatole", "NUIN-1")).unwrap();
    let text = String::from_utf8(doc.bytes).unwrap();
    assert!(text.contains("Anatole"));
    assert!(text.contains("NUIN-1"));
    assert_eq!(doc.filename, "declaration_hopital_mba-anatole.txt");
  }

  #[test]
  fn plain_text_is_one_field_per_line() {
    let mut v = view("Mba", "Anatole", "NUIN-1");
    v.declaration.motif_rejet = Some("Acte illisible".into());
    let doc = PlainTextRenderer.render(&v).unwrap();
    let text = String::from_utf8(doc.bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "DÉCLARATION DE NAISSANCE");
    assert!(lines.contains(&"Nom : Mba"));
    assert!(lines.contains(&"Profession : -"));
    assert_eq!(lines.last(), Some(&"Motif de rejet : Acte illisible"));
    assert!(text.ends_with('\n'));
  }
}
