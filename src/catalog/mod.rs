//! Field Catalog
//!
//! Static per-document-type registries: the ordered list of expected field
//! names, a schema-like description per field and the minimum-length policy.
//! Pure lookup, no side effects.
//!
//! Unknown fields of a known type fall back to a generic free-text spec so
//! the catalog never blocks record completion for an unanticipated field.
//! Unknown *types* do not exist here: [`crate::types::DocumentType`] is closed
//! and its string boundary rejects anything else.

use serde_json::{Map, Value, json};

use crate::constants::content;
use crate::types::DocumentType;

// =============================================================================
// Field Specs
// =============================================================================

/// Field value shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free-text field.
    Text,
    /// Nested sequence of risk items (risk matrix only).
    RiskList,
}

/// Runtime view of one catalog entry.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub min_len: usize,
    pub enum_values: Option<&'static [&'static str]>,
    pub description: String,
}

/// Catalog row. Tables below are the registry; everything else derives from
/// them.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub min_len: usize,
    pub enum_values: Option<&'static [&'static str]>,
    pub description: &'static str,
}

impl FieldDef {
    fn spec(&self) -> FieldSpec {
        FieldSpec {
            name: self.name.to_string(),
            kind: self.kind,
            min_len: self.min_len,
            enum_values: self.enum_values,
            description: self.description.to_string(),
        }
    }
}

const fn long(name: &'static str, description: &'static str) -> FieldDef {
    FieldDef {
        name,
        kind: FieldKind::Text,
        min_len: content::LONG_FIELD_MIN_CHARS,
        enum_values: None,
        description,
    }
}

const fn short(name: &'static str, description: &'static str) -> FieldDef {
    FieldDef {
        name,
        kind: FieldKind::Text,
        min_len: content::SHORT_FIELD_MIN_CHARS,
        enum_values: None,
        description,
    }
}

const fn level(name: &'static str, description: &'static str) -> FieldDef {
    FieldDef {
        name,
        kind: FieldKind::Text,
        min_len: content::SHORT_FIELD_MIN_CHARS,
        enum_values: Some(&RISK_LEVELS),
        description,
    }
}

/// Closed ordinal for risk impact and probability.
pub const RISK_LEVELS: [&str; 3] = ["baixo", "médio", "alto"];

// =============================================================================
// Registries
// =============================================================================

const INSTITUTIONAL: &[FieldDef] = &[
    short("cidade", "nome do município"),
    short("cidade_maiusculo", "nome do município em letras maiúsculas"),
    short("endereco", "endereço da instituição, sem a cidade"),
    short("cep", "CEP do município"),
    short(
        "nome_autoridade",
        "nome do principal representante legal da instituição",
    ),
    short("cargo_autoridade", "cargo do representante legal"),
    short("data_extenso", "data por extenso, ex: '26 de abril de 2025'"),
    short("data_aprovacao", "data de aprovação por extenso"),
];

const PRELIMINARY_STUDY: &[FieldDef] = &[
    long("etp_objeto", "descrição detalhada do objeto"),
    long("etp_justificativa", "justificativa técnica e legal"),
    long("etp_plano_contratacao", "plano de contratação"),
    long(
        "etp_requisitos_linguagens",
        "linguagens de programação necessárias",
    ),
    long("etp_requisitos_banco", "requisitos de banco de dados"),
    long("etp_requisitos_api", "requisitos de API"),
    long("etp_experiencia_publica", "experiência com o setor público"),
    long("etp_prazo_execucao", "prazo estimado de execução em meses"),
    long("etp_forma_pagamento", "forma de pagamento"),
    long("etp_criterios_selecao", "critérios de seleção do fornecedor"),
    long("etp_estimativa_quantidades", "quantidades estimadas"),
    long("etp_alternativa_a", "primeira alternativa de solução"),
    long("etp_alternativa_b", "segunda alternativa de solução"),
    long("etp_alternativa_c", "terceira alternativa de solução"),
    long(
        "etp_analise_comparativa",
        "análise comparativa das alternativas",
    ),
    long("etp_estimativa_precos", "estimativa de preços"),
    long("etp_solucao_total", "solução total proposta"),
    long("etp_parcelamento", "possibilidade de parcelamento do objeto"),
    long("etp_resultados_esperados", "resultados esperados"),
    long("etp_providencias_previas", "providências prévias à contratação"),
    long("etp_contratacoes_correlatas", "contratações correlatas"),
    long("etp_impactos_ambientais", "impactos ambientais e mitigação"),
    long("etp_viabilidade_contratacao", "viabilidade da contratação"),
    long(
        "etp_previsao_dotacao",
        "previsão de dotação orçamentária e programa orçamentário vinculado",
    ),
    long(
        "etp_plano_implantacao",
        "fases e cronograma de implantação da solução",
    ),
    long("etp_conformidade_lgpd", "medidas de conformidade com a LGPD"),
    long(
        "etp_riscos_tecnicos",
        "riscos técnicos envolvidos na contratação",
    ),
    long(
        "etp_riscos_mitigacao",
        "estratégias de mitigação dos riscos identificados",
    ),
    long(
        "etp_beneficios_qualitativos",
        "benefícios não mensuráveis diretamente em reais, como transparência, atendimento ao cidadão e automação",
    ),
];

const REFERENCE_TERMS: &[FieldDef] = &[
    long("descricao_tecnica", "descrição técnica detalhada do objeto"),
    long("justificativa_demanda", "justificativa da necessidade"),
    long("base_legal", "base legal da contratação"),
    long("normas_aplicaveis", "normas técnicas e regulamentadoras aplicáveis"),
    long("execucao_etapas", "etapas de execução"),
    long("tolerancia_tecnica", "tolerância técnica admitida"),
    long("materiais_sustentaveis", "materiais sustentáveis exigidos"),
    long("execucao_similar", "registros de execução similar"),
    long("certificacoes", "certificações necessárias"),
    long("pgr_pcmso", "exigências de PGR e PCMSO"),
    long("criterio_julgamento", "critério de julgamento das propostas"),
    long("garantia_qualidade", "garantia de qualidade"),
    long("painel_fiscalizacao", "painel de fiscalização da execução"),
    long("kpis_operacionais", "KPIs operacionais monitorados"),
    long(
        "designacao_formal_fiscal",
        "designação formal do fiscal do contrato",
    ),
    long("penalidades", "penalidades por descumprimento"),
    long("alertas_ia", "alertas de preenchimento gerados pela IA"),
    long("anexos_obrigatorios", "anexos obrigatórios do termo"),
    long("transparencia_resumo", "resumo para o portal da transparência"),
    long("faq_juridico", "FAQ jurídico da contratação"),
    short(
        "assinatura_formato",
        "formato exigido para assinatura, ex: assinatura digital ICP-Brasil com carimbo do tempo",
    ),
    short(
        "prazo_publicacao",
        "número de dias úteis para publicação do contrato no Portal da Transparência",
    ),
    short(
        "transparencia_contato",
        "canal de atendimento ao cidadão: e-mail, telefone ou formulário eletrônico",
    ),
    short("nome_elaborador", "nome do responsável técnico pela elaboração"),
    short("cargo_elaborador", "cargo do responsável técnico"),
    short(
        "nome_autoridade_aprovacao",
        "nome da autoridade competente que aprova o termo",
    ),
    short("cargo_autoridade_aprovacao", "cargo da autoridade competente"),
];

const DEMAND: &[FieldDef] = &[
    short("setor", "setor solicitante"),
    short("departamento", "departamento solicitante"),
    short("responsavel", "responsável pela demanda"),
    long("descricaoObjeto", "descrição do objeto demandado"),
    short("valor", "valor estimado da contratação"),
    short("origem_fonte", "origem da fonte de recursos"),
    short("unidade_nome", "nome da unidade requisitante"),
    long("justificativa", "justificativa da demanda"),
    long("impacto_meta", "impacto nas metas institucionais"),
    long("criterio", "critério de seleção adotado"),
    long("priorizacao_justificativa", "justificativa da priorização"),
    long("escopo", "escopo do projeto"),
    long("requisitos_tecnicos", "requisitos técnicos"),
    long("riscos_ocupacionais", "riscos ocupacionais envolvidos"),
    long("riscos_normas", "normas de segurança aplicáveis aos riscos"),
    long("riscos_justificativa", "justificativa da análise de riscos"),
    long("alternativa_a", "primeira alternativa analisada"),
    long("alternativa_b", "segunda alternativa analisada"),
    long("alternativa_conclusao", "conclusão da análise de alternativas"),
    long("inerciarisco", "risco da inércia administrativa"),
    long("inerciaplano", "plano de resposta à inércia"),
    short("prazo_execucao", "prazo de execução"),
    long("forma_pagamento", "forma de pagamento"),
    short("prazo_vigencia", "prazo de vigência contratual"),
    long("condicoes_pagamento", "condições de pagamento"),
    short("ods_vinculados", "Objetivos de Desenvolvimento Sustentável vinculados"),
    long("acao_sustentavel", "ação sustentável associada"),
    long("ia_duplicidade", "verificação de duplicidade de demandas"),
    long("ia_validacao", "validação automática da instrução"),
    long("transparencia_resumo", "resumo para o portal da transparência"),
    long("transparencia_faq", "FAQ para o portal da transparência"),
    short("transparencia_prazo", "prazo de publicação na transparência"),
    short("assinatura_formato", "formato exigido para assinatura"),
];

const RISK_MATRIX: &[FieldDef] = &[
    short("processo_administrativo", "número do processo administrativo"),
    long("objeto_matriz", "objeto analisado pela matriz de risco"),
    short("data_inicio_contratacao", "data de início da contratação"),
    short("unidade_responsavel", "unidade responsável pela análise"),
    short("fase_analise", "fase da análise de risco"),
    short("data_aprovacao", "data de aprovação da matriz"),
    FieldDef {
        name: "riscos",
        kind: FieldKind::RiskList,
        min_len: 0,
        enum_values: None,
        description: "lista de riscos relevantes da contratação",
    },
];

/// Sub-fields of one risk-matrix row, in table-column order.
pub(crate) const RISK_ITEM_DEFS: &[FieldDef] = &[
    short("seq", "número sequencial do risco"),
    long("evento", "descrição do evento de risco"),
    long("dano", "descrição do dano decorrente"),
    level("impacto", "impacto do risco"),
    level("probabilidade", "probabilidade de ocorrência"),
    long("acao_preventiva", "ação preventiva detalhada"),
    short("responsavel_preventiva", "responsável pela ação preventiva"),
    long("acao_contingencia", "ação de contingência detalhada"),
    short(
        "responsavel_contingencia",
        "responsável pela ação de contingência",
    ),
];

// =============================================================================
// Lookup API
// =============================================================================

pub(crate) fn defs(doc_type: DocumentType) -> &'static [FieldDef] {
    match doc_type {
        DocumentType::Institutional => INSTITUTIONAL,
        DocumentType::PreliminaryStudy => PRELIMINARY_STUDY,
        DocumentType::ReferenceTerms => REFERENCE_TERMS,
        DocumentType::Demand => DEMAND,
        DocumentType::RiskMatrix => RISK_MATRIX,
    }
}

/// Ordered expected field names for a document type.
pub fn fields(doc_type: DocumentType) -> impl Iterator<Item = &'static str> {
    defs(doc_type).iter().map(|def| def.name)
}

/// Spec for one (type, field) pair. Unknown fields of a known type get a
/// generic free-text spec instead of an error.
pub fn describe(doc_type: DocumentType, field: &str) -> FieldSpec {
    defs(doc_type)
        .iter()
        .find(|def| def.name == field)
        .map(FieldDef::spec)
        .unwrap_or_else(|| FieldSpec {
            name: field.to_string(),
            kind: FieldKind::Text,
            min_len: content::SHORT_FIELD_MIN_CHARS,
            enum_values: None,
            description: "campo textual livre".to_string(),
        })
}

/// JSON-Schema declaration for a document type, sent to the LLM as the
/// structured-output contract.
pub fn schema(doc_type: DocumentType) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for def in defs(doc_type) {
        required.push(Value::String(def.name.to_string()));
        properties.insert(def.name.to_string(), property_schema(def));
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn property_schema(def: &FieldDef) -> Value {
    match def.kind {
        FieldKind::Text => match def.enum_values {
            Some(values) => json!({
                "type": "string",
                "enum": values,
                "description": def.description,
            }),
            None => json!({
                "type": "string",
                "minLength": def.min_len,
                "description": def.description,
            }),
        },
        FieldKind::RiskList => {
            let mut item_properties = Map::new();
            let mut item_required = Vec::new();
            for item in RISK_ITEM_DEFS {
                item_required.push(Value::String(item.name.to_string()));
                item_properties.insert(item.name.to_string(), property_schema(item));
            }
            json!({
                "type": "array",
                "minItems": content::MIN_RISK_ITEMS,
                "description": def.description,
                "items": {
                    "type": "object",
                    "properties": item_properties,
                    "required": item_required,
                },
            })
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_has_fields() {
        for doc_type in DocumentType::ALL {
            assert!(fields(doc_type).count() > 0, "{doc_type} has no fields");
        }
    }

    #[test]
    fn institutional_fields_are_ordered() {
        let names: Vec<_> = fields(DocumentType::Institutional).collect();
        assert_eq!(names.first(), Some(&"cidade"));
        assert_eq!(names.last(), Some(&"data_aprovacao"));
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn risk_matrix_declares_the_nested_list() {
        let spec = describe(DocumentType::RiskMatrix, "riscos");
        assert_eq!(spec.kind, FieldKind::RiskList);
        assert!(fields(DocumentType::RiskMatrix).any(|f| f == "riscos"));
    }

    #[test]
    fn known_field_keeps_its_registry_spec() {
        let spec = describe(DocumentType::PreliminaryStudy, "etp_justificativa");
        assert_eq!(spec.kind, FieldKind::Text);
        assert_eq!(spec.min_len, content::LONG_FIELD_MIN_CHARS);
        assert!(spec.description.contains("justificativa"));
    }

    #[test]
    fn unknown_field_falls_back_to_generic_spec() {
        let spec = describe(DocumentType::Institutional, "campo_inesperado");
        assert_eq!(spec.name, "campo_inesperado");
        assert_eq!(spec.kind, FieldKind::Text);
        assert_eq!(spec.min_len, content::SHORT_FIELD_MIN_CHARS);
    }

    #[test]
    fn schema_requires_every_catalog_field() {
        for doc_type in DocumentType::ALL {
            let schema = schema(doc_type);
            let required: Vec<_> = schema["required"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap().to_string())
                .collect();
            let expected: Vec<_> = fields(doc_type).map(str::to_string).collect();
            assert_eq!(required, expected);
        }
    }

    #[test]
    fn risk_schema_pins_the_ordinal_and_minimum_rows() {
        let schema = schema(DocumentType::RiskMatrix);
        let riscos = &schema["properties"]["riscos"];
        assert_eq!(riscos["minItems"], json!(content::MIN_RISK_ITEMS));
        let impacto = &riscos["items"]["properties"]["impacto"];
        assert_eq!(impacto["enum"], json!(["baixo", "médio", "alto"]));
    }
}
