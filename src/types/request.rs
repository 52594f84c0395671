//! Request and Record Types
//!
//! Domain types shared by every pipeline stage: the document-type tag, the
//! immutable per-request context, and the generated record returned to the
//! template-filling collaborator.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::constants::content;
use crate::types::LicitaError;

// =============================================================================
// Document Type
// =============================================================================

/// Supported procurement document kinds.
///
/// Selects the field catalog entry, the prompt template and the declared
/// schema for a generation request. Set once at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentType {
    /// Municipal/institutional header data (authority, address, dates).
    Institutional,
    /// Estudo Técnico Preliminar (ETP).
    PreliminaryStudy,
    /// Termo de Referência (TR).
    ReferenceTerms,
    /// Documento de Formalização da Demanda (DFD).
    Demand,
    /// Matriz de Risco.
    RiskMatrix,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::Institutional,
        DocumentType::PreliminaryStudy,
        DocumentType::ReferenceTerms,
        DocumentType::Demand,
        DocumentType::RiskMatrix,
    ];

    /// Stable identifier used in cache keys, config and the JSON API.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Institutional => "institutional",
            Self::PreliminaryStudy => "preliminaryStudy",
            Self::ReferenceTerms => "referenceTerms",
            Self::Demand => "demand",
            Self::RiskMatrix => "riskMatrix",
        }
    }

    /// Official document title, used in prompts and filenames.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Institutional => "Dados Institucionais",
            Self::PreliminaryStudy => "Estudo Técnico Preliminar",
            Self::ReferenceTerms => "Termo de Referência",
            Self::Demand => "Documento de Formalização da Demanda",
            Self::RiskMatrix => "Matriz de Risco",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for DocumentType {
    type Err = LicitaError;

    /// Accepts the canonical slug plus the short endpoint aliases used by
    /// older clients (`etp`, `tr`, `demanda`, `risco`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "institutional" | "institucional" => Ok(Self::Institutional),
            "preliminarystudy" | "preliminary-study" | "etp" => Ok(Self::PreliminaryStudy),
            "referenceterms" | "reference-terms" | "tr" => Ok(Self::ReferenceTerms),
            "demand" | "demanda" | "dfd" => Ok(Self::Demand),
            "riskmatrix" | "risk-matrix" | "risco" => Ok(Self::RiskMatrix),
            _ => Err(LicitaError::InvalidDocumentType(s.to_string())),
        }
    }
}

// =============================================================================
// Request Context
// =============================================================================

/// Inbound generation request data. Immutable once captured; only the
/// content-relevant subset participates in the cache fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub municipality: String,
    pub institution: String,
    #[serde(default)]
    pub address: String,
    pub object_description: String,
    /// Estimated contract value, pre-formatted ("150.000,00").
    #[serde(rename = "valor", default)]
    pub value: String,
    /// Long-form pt-BR date ("26 de abril de 2025"). Filled by the caller;
    /// excluded from the cache fingerprint.
    #[serde(default)]
    pub date: String,
}

impl RequestContext {
    /// Contract value with the legacy `00` fallback applied.
    pub fn value_or_default(&self) -> &str {
        if self.value.trim().is_empty() {
            content::DEFAULT_VALUE
        } else {
            &self.value
        }
    }
}

/// Long-form pt-BR date: "07 de agosto de 2026".
pub fn data_por_extenso(date: NaiveDate) -> String {
    const MESES: [&str; 12] = [
        "janeiro",
        "fevereiro",
        "março",
        "abril",
        "maio",
        "junho",
        "julho",
        "agosto",
        "setembro",
        "outubro",
        "novembro",
        "dezembro",
    ];
    format!(
        "{:02} de {} de {}",
        date.day(),
        MESES[date.month0() as usize],
        date.year()
    )
}

/// Fold Latin-1 accented characters to their ASCII base letter. Used by the
/// risk-level normalizer and the coat-of-arms filename lookup.
pub(crate) fn strip_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'ç' => 'c',
            'Ç' => 'C',
            'ñ' => 'n',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}

// =============================================================================
// Generated Record
// =============================================================================

/// A single field value: free text for every document type, or the nested
/// risk list for the risk matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Risks(Vec<RiskItem>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Risks(_) => None,
        }
    }

    pub fn as_risks(&self) -> Option<&[RiskItem]> {
        match self {
            Self::Risks(items) => Some(items),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// The complete record handed to the template filler: every field name the
/// catalog lists for the document type is present, always.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneratedRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl GeneratedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Text value of a field, if present and textual.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(FieldValue::as_text)
    }

    /// Risk list of a field, if present and a list.
    pub fn risks(&self, name: &str) -> Option<&[RiskItem]> {
        self.fields.get(name).and_then(FieldValue::as_risks)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Flat name → text view for the mail-merge collaborator. Nested risk
    /// lists are rendered by the caller as a table and are skipped here.
    pub fn flat_fields(&self) -> BTreeMap<&str, &str> {
        self.fields
            .iter()
            .filter_map(|(name, value)| value.as_text().map(|text| (name.as_str(), text)))
            .collect()
    }
}

impl FromIterator<(String, FieldValue)> for GeneratedRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// Risk Matrix Items
// =============================================================================

/// One row of the risk matrix table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskItem {
    pub seq: String,
    pub evento: String,
    pub dano: String,
    pub impacto: String,
    pub probabilidade: String,
    pub acao_preventiva: String,
    pub responsavel_preventiva: String,
    pub acao_contingencia: String,
    pub responsavel_contingencia: String,
}

impl RiskItem {
    /// Fully placeholdered row, used when the model output carries no usable
    /// risk list. Keeps the "non-empty risk list" shape contract for the
    /// downstream table renderer.
    pub fn placeholder(seq: usize) -> Self {
        let mark = || content::PLACEHOLDER.to_string();
        Self {
            seq: seq.to_string(),
            evento: mark(),
            dano: mark(),
            impacto: mark(),
            probabilidade: mark(),
            acao_preventiva: mark(),
            responsavel_preventiva: mark(),
            acao_contingencia: mark(),
            responsavel_contingencia: mark(),
        }
    }
}

/// Closed three-level ordinal for risk impact and probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Baixo,
    Medio,
    Alto,
}

impl RiskLevel {
    /// Canonical accented form used in the generated documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Baixo => "baixo",
            Self::Medio => "médio",
            Self::Alto => "alto",
        }
    }

    /// Lenient parse: case-insensitive, accent-insensitive, accepts the
    /// feminine forms and the English synonyms models occasionally emit.
    /// Anything else is rejected (`None`), never passed through.
    pub fn parse(raw: &str) -> Option<Self> {
        let folded = strip_accents(raw.trim()).to_lowercase();
        match folded.as_str() {
            "baixo" | "baixa" | "low" => Some(Self::Baixo),
            "medio" | "media" | "medium" | "moderado" | "moderada" => Some(Self::Medio),
            "alto" | "alta" | "high" => Some(Self::Alto),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
