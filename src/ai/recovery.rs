//! JSON Recovery Engine
//!
//! Turns possibly-malformed model output into a complete record, always.
//!
//! The ladder tries increasingly permissive strategies in order, stopping at
//! the first one that yields a non-empty JSON object:
//!
//! 1. strict parse of the raw text;
//! 2. parse after re-applying the extractor cleanup (fences, trailing
//!    commas, doubled quotes);
//! 3. parse of the first balanced `{…}` span found in the text;
//! 4. give up with an empty object.
//!
//! Whatever rung succeeded, field completion then walks the catalog and
//! substitutes the placeholder marker for every expected field the parse did
//! not deliver, so the returned record is total even under complete parse
//! failure. Risk matrices additionally keep their non-empty `riscos` shape
//! and the closed baixo/médio/alto ordinal.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::ai::extract;
use crate::catalog::{self, FieldKind};
use crate::constants::content;
use crate::types::{DocumentType, FieldValue, GeneratedRecord, RiskItem, RiskLevel};

// =============================================================================
// Entry Points
// =============================================================================

/// Recover a complete record from raw model output. Total: never fails,
/// never returns a record missing an expected field.
pub fn recover(raw: &str, doc_type: DocumentType) -> GeneratedRecord {
    let parsed = parse_ladder(raw).unwrap_or_default();
    complete_fields(doc_type, &parsed)
}

/// Fully-placeholdered record for a type, used when the LLM call itself
/// failed and there is nothing to parse.
pub fn placeholder_record(doc_type: DocumentType) -> GeneratedRecord {
    complete_fields(doc_type, &Map::new())
}

/// Defensive re-walk of the expected field list. Fills anything still
/// missing and restores the non-empty risk-list shape if it was lost.
pub fn ensure_complete(doc_type: DocumentType, record: &mut GeneratedRecord) {
    for def in catalog::defs(doc_type) {
        match def.kind {
            FieldKind::Text => {
                if record.get(def.name).is_none() {
                    record.insert(def.name, content::PLACEHOLDER);
                }
            }
            FieldKind::RiskList => {
                if record.risks(def.name).is_none_or(|risks| risks.is_empty()) {
                    record.insert(def.name, FieldValue::Risks(vec![RiskItem::placeholder(1)]));
                }
            }
        }
    }
}

// =============================================================================
// Parse Ladder
// =============================================================================

fn parse_ladder(raw: &str) -> Option<Map<String, Value>> {
    if raw.trim().is_empty() {
        return None;
    }

    if let Some(map) = parse_object(raw)
        && !map.is_empty()
    {
        return Some(map);
    }

    let cleaned = extract::clean_raw(raw);
    if let Some(map) = parse_object(&cleaned)
        && !map.is_empty()
    {
        debug!("record parsed after cleanup pass");
        return Some(map);
    }

    if let Some(span) = balanced_object_span(&cleaned)
        && let Some(map) = parse_object(span)
        && !map.is_empty()
    {
        warn!("record recovered from embedded JSON span");
        return Some(map);
    }

    warn!("all parse strategies failed; record will be placeholdered");
    None
}

fn parse_object(s: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(s) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// First balanced `{…}` span in the text, nested braces supported. Brace
/// characters inside string literals are ignored.
fn balanced_object_span(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (offset, ch) in s[start..].char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

// =============================================================================
// Field Completion
// =============================================================================

fn complete_fields(doc_type: DocumentType, parsed: &Map<String, Value>) -> GeneratedRecord {
    let mut record = GeneratedRecord::new();

    for def in catalog::defs(doc_type) {
        match def.kind {
            FieldKind::Text => {
                let value = parsed
                    .get(def.name)
                    .and_then(value_to_text)
                    .unwrap_or_else(|| content::PLACEHOLDER.to_string());
                record.insert(def.name, value);
            }
            FieldKind::RiskList => {
                record.insert(def.name, FieldValue::Risks(risk_items(parsed.get(def.name))));
            }
        }
    }

    // Unanticipated textual fields ride along; the catalog's generic
    // fallback spec covers them downstream.
    for (name, value) in parsed {
        if !record.contains(name)
            && let Some(text) = value_to_text(value)
        {
            record.insert(name.clone(), text);
        }
    }

    record
}

/// Scalar-to-text conversion. Empty strings count as absent; objects and
/// arrays never coerce to text.
fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn risk_items(value: Option<&Value>) -> Vec<RiskItem> {
    let items: Vec<RiskItem> = value
        .and_then(Value::as_array)
        .map(|array| {
            array
                .iter()
                .filter_map(Value::as_object)
                .enumerate()
                .map(|(index, item)| risk_item(item, index))
                .collect()
        })
        .unwrap_or_default();

    if items.is_empty() {
        vec![RiskItem::placeholder(1)]
    } else {
        items
    }
}

fn risk_item(item: &Map<String, Value>, index: usize) -> RiskItem {
    let text = |name: &str| {
        item.get(name)
            .and_then(value_to_text)
            .unwrap_or_else(|| content::PLACEHOLDER.to_string())
    };
    // Hard ordinal constraint: unrecognized classifications are remapped to
    // the placeholder, never passed through.
    let level = |name: &str| {
        item.get(name)
            .and_then(value_to_text)
            .and_then(|s| RiskLevel::parse(&s))
            .map(|level| level.as_str().to_string())
            .unwrap_or_else(|| content::PLACEHOLDER.to_string())
    };

    RiskItem {
        // The table renderer numbers rows itself, so the model's own seq is
        // ignored and rows are renumbered 1..n.
        seq: (index + 1).to_string(),
        evento: text("evento"),
        dano: text("dano"),
        impacto: level("impacto"),
        probabilidade: level("probabilidade"),
        acao_preventiva: text("acao_preventiva"),
        responsavel_preventiva: text("responsavel_preventiva"),
        acao_contingencia: text("acao_contingencia"),
        responsavel_contingencia: text("responsavel_contingencia"),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const MARK: &str = content::PLACEHOLDER;

    fn assert_complete(record: &GeneratedRecord, doc_type: DocumentType) {
        for field in catalog::fields(doc_type) {
            assert!(record.contains(field), "{doc_type} record misses {field}");
        }
    }

    #[test]
    fn valid_json_is_copied_and_completed() {
        let raw = r#"{"cidade": "Curitiba", "cep": "80000"}"#;
        let record = recover(raw, DocumentType::Institutional);

        assert_complete(&record, DocumentType::Institutional);
        assert_eq!(record.text("cidade"), Some("Curitiba"));
        assert_eq!(record.text("cep"), Some("80000"));
        assert_eq!(record.text("nome_autoridade"), Some(MARK));
        assert_eq!(record.text("data_extenso"), Some(MARK));
    }

    #[test]
    fn fenced_json_parses_on_the_second_rung() {
        let raw = "```json\n{\"cidade\": \"Curitiba\"}\n```";
        let record = recover(raw, DocumentType::Institutional);
        assert_eq!(record.text("cidade"), Some("Curitiba"));
        assert_complete(&record, DocumentType::Institutional);
    }

    #[test]
    fn trailing_comma_is_repaired() {
        let raw = r#"{"cidade": "Curitiba", "cep": "80000",}"#;
        let record = recover(raw, DocumentType::Institutional);
        assert_eq!(record.text("cep"), Some("80000"));
    }

    #[test]
    fn embedded_span_is_extracted_from_prose() {
        let raw = "Segue o resultado solicitado:\n{\"cidade\": \"Curitiba\", \
                   \"obs\": \"chaves {internas} preservadas\"}\nEspero ter ajudado!";
        let record = recover(raw, DocumentType::Institutional);
        assert_eq!(record.text("cidade"), Some("Curitiba"));
        assert_eq!(record.text("obs"), Some("chaves {internas} preservadas"));
    }

    #[test]
    fn garbage_and_empty_inputs_placeholder_everything() {
        for raw in ["not json at all", "", "   ", "{\"truncated\": \"valu", "[1, 2, 3]", "42"] {
            let record = recover(raw, DocumentType::ReferenceTerms);
            assert_complete(&record, DocumentType::ReferenceTerms);
            assert_eq!(record.text("descricao_tecnica"), Some(MARK), "input: {raw:?}");
        }
    }

    #[test]
    fn placeholder_record_covers_every_type() {
        for doc_type in DocumentType::ALL {
            let record = placeholder_record(doc_type);
            assert_complete(&record, doc_type);
        }
    }

    #[test]
    fn missing_riscos_becomes_a_single_placeholder_row() {
        let raw = r#"{"processo_administrativo": "001/2025"}"#;
        let record = recover(raw, DocumentType::RiskMatrix);

        let risks = record.risks("riscos").unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].seq, "1");
        assert_eq!(risks[0].evento, MARK);
        assert_eq!(risks[0].impacto, MARK);
        assert_eq!(risks[0].responsavel_contingencia, MARK);
    }

    #[test]
    fn risk_rows_are_renumbered_and_levels_normalized() {
        let raw = r#"{
            "objeto_matriz": "Serviços contínuos",
            "riscos": [
                {"seq": "10", "evento": "Atraso na coleta", "impacto": "Alta",
                 "probabilidade": "MEDIO", "dano": "Acúmulo de resíduos"},
                {"seq": "99", "evento": "Vazamento de dados", "impacto": "critical",
                 "probabilidade": "low"}
            ]
        }"#;
        let record = recover(raw, DocumentType::RiskMatrix);

        let risks = record.risks("riscos").unwrap();
        assert_eq!(risks.len(), 2);
        assert_eq!(risks[0].seq, "1");
        assert_eq!(risks[1].seq, "2");
        assert_eq!(risks[0].impacto, "alto");
        assert_eq!(risks[0].probabilidade, "médio");
        // Out-of-ordinal value is remapped, not passed through.
        assert_eq!(risks[1].impacto, MARK);
        assert_eq!(risks[1].probabilidade, "baixo");
        // Sub-fields the model skipped are placeholdered.
        assert_eq!(risks[1].dano, MARK);
    }

    #[test]
    fn riscos_with_wrong_shape_keeps_the_list_contract() {
        let raw = r#"{"riscos": "nenhum risco identificado"}"#;
        let record = recover(raw, DocumentType::RiskMatrix);
        let risks = record.risks("riscos").unwrap();
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].evento, MARK);
    }

    #[test]
    fn numbers_coerce_to_text_and_empty_strings_do_not() {
        let raw = r#"{"prazo_publicacao": 5, "nome_elaborador": "  "}"#;
        let record = recover(raw, DocumentType::ReferenceTerms);
        assert_eq!(record.text("prazo_publicacao"), Some("5"));
        assert_eq!(record.text("nome_elaborador"), Some(MARK));
    }

    #[test]
    fn unanticipated_fields_ride_along() {
        let raw = r#"{"cidade": "Curitiba", "campo_novo": "valor extra"}"#;
        let record = recover(raw, DocumentType::Institutional);
        assert_eq!(record.text("campo_novo"), Some("valor extra"));
        assert_complete(&record, DocumentType::Institutional);
    }

    #[test]
    fn ensure_complete_restores_lost_fields() {
        let mut record = GeneratedRecord::new();
        record.insert("cidade", "Curitiba");
        ensure_complete(DocumentType::Institutional, &mut record);
        assert_complete(&record, DocumentType::Institutional);
        assert_eq!(record.text("cidade"), Some("Curitiba"));

        let mut record = GeneratedRecord::new();
        record.insert("riscos", FieldValue::Risks(vec![]));
        ensure_complete(DocumentType::RiskMatrix, &mut record);
        assert_eq!(record.risks("riscos").unwrap().len(), 1);
    }

    #[test]
    fn balanced_span_scanner_handles_braces_in_strings() {
        let s = r#"prefix {"a": "x } y", "b": {"c": 1}} suffix"#;
        let span = balanced_object_span(s).unwrap();
        assert_eq!(span, r#"{"a": "x } y", "b": {"c": 1}}"#);
    }

    #[test]
    fn unbalanced_text_has_no_span() {
        assert!(balanced_object_span("{\"a\": 1").is_none());
        assert!(balanced_object_span("no braces here").is_none());
    }
}
