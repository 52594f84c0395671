//! Prompt Builder
//!
//! Composes the system role and user prompt for a document type from the
//! request parameters. Pure string production: no network, no file I/O.
//!
//! Per-type prompt text lives in the static [`PromptTemplate`] table, not in
//! control flow; the JSON skeleton each prompt shows the model is derived
//! from the field catalog, so adding a type or a field never touches this
//! module's logic.

use std::fmt::Write;

use crate::catalog::{self, FieldKind};
use crate::types::{DocumentType, RequestContext};

// =============================================================================
// Template Table
// =============================================================================

struct PromptTemplate {
    /// Persona and legal grounding appended to the shared system role.
    persona: &'static str,
    /// Instruction bullets for the user prompt.
    directives: &'static [&'static str],
    /// Content checklist appended after the instructions.
    checklist: &'static [&'static str],
    /// Include municipality/institution/address/date in the context block.
    institutional_context: bool,
    /// Include the estimated contract value in the context block.
    wants_value: bool,
    /// Minimum characters demanded per narrative field, when enforced.
    min_chars: Option<usize>,
}

const INSTITUTIONAL: PromptTemplate = PromptTemplate {
    persona: "Os dados institucionais devem refletir um município brasileiro real, \
              preenchidos como em documentos oficiais de prefeituras.",
    directives: &[
        "O endereço deve ser o informado, complementado se necessário para realismo",
        "O nome da autoridade pode ser fictício, mas típico (ex: Maria Souza, João Silva)",
        "O cargo deve ser condizente com a instituição (ex: Prefeito Municipal, Secretário de Administração)",
    ],
    checklist: &[],
    institutional_context: true,
    wants_value: false,
    min_chars: None,
};

const PRELIMINARY_STUDY: PromptTemplate = PromptTemplate {
    persona: "Você é especializado em contratações públicas com base na Lei nº 14.133/2021, \
              IN SEGES nº 5/2017 e nº 65/2021. Sua tarefa é gerar um Estudo Técnico Preliminar \
              (ETP) compatível com o modelo institucional adotado pela Administração Pública.",
    directives: &[
        "Use linguagem formal, precisa e técnica",
        "Fundamente as justificativas conforme os princípios da legalidade, eficiência, \
         economicidade, interesse público e inovação",
        "Todos os campos devem estar presentes, mesmo que vazios; use \"\" ou \"–\" para \
         indicar ausência de valor",
        "Sempre que possível, cite normas legais ou regulamentadoras",
    ],
    checklist: &[],
    institutional_context: false,
    wants_value: true,
    min_chars: Some(crate::constants::content::LONG_FIELD_MIN_CHARS),
};

const REFERENCE_TERMS: PromptTemplate = PromptTemplate {
    persona: "Você é especializado em contratações públicas conforme a Lei nº 14.133/2021 e \
              sua tarefa é gerar um Termo de Referência (TR) técnico e completo com base no \
              template institucional da Administração Pública.",
    directives: &[
        "Preencha todos os campos, mesmo que com \"\" ou \"–\" quando não houver informação",
        "Use linguagem técnica e formal, como um parecer emitido por equipe de planejamento \
         e engenharia",
        "Fundamente tudo com base na Lei nº 14.133/2021, IN SEGES nº 5/2017 e boas práticas \
         administrativas",
        "Evite jargões vagos como \"melhorar o serviço\" sem descrição técnica clara",
        "Inclua os anexos necessários para assegurar a completude do documento",
    ],
    checklist: &[],
    institutional_context: false,
    wants_value: true,
    min_chars: Some(crate::constants::content::LONG_FIELD_MIN_CHARS),
};

const DEMAND: PromptTemplate = PromptTemplate {
    persona: "Você é especializado em licitações públicas e contratos administrativos, com \
              profundo conhecimento da Lei nº 14.133/2021. Sua tarefa é gerar um Documento de \
              Formalização da Demanda (DFD) com todos os dados necessários para instruir uma \
              contratação pública.",
    directives: &[
        "Não utilize valores simulados ou fictícios",
        "Se alguma informação não estiver disponível, insira \"–\" para indicar que deverá \
         ser preenchida manualmente",
        "Não invente dados para completar o documento",
        "Todos os campos devem estar presentes no JSON",
        "Utilize termos da administração pública, com foco em justificar tecnicamente a demanda",
    ],
    checklist: &[],
    institutional_context: false,
    wants_value: true,
    min_chars: Some(crate::constants::content::LONG_FIELD_MIN_CHARS),
};

const RISK_MATRIX: PromptTemplate = PromptTemplate {
    persona: "Você é especialista em contratações públicas e gestão de riscos, com base na \
              Lei nº 14.133/2021. Sua tarefa é gerar uma matriz de risco a partir do objeto \
              da contratação informado.",
    directives: &[
        "Use linguagem formal, técnica e precisa",
        "As ações devem ser detalhadas: o quê, como, por quem e quando",
        "Mantenha a estrutura exata do JSON, incluindo todos os campos de cada risco",
        "Não modifique a estrutura do JSON nem adicione campos extras",
    ],
    checklist: &[
        "Liste pelo menos 5 riscos reais e prováveis ao tipo de contratação",
        "Considere pelo menos um risco de descumprimento contratual",
        "Considere pelo menos um risco relacionado à LGPD se o objeto envolver dados pessoais",
        "Classifique impacto e probabilidade usando somente os valores padronizados: \
         baixo | médio | alto",
    ],
    institutional_context: false,
    wants_value: false,
    min_chars: Some(crate::constants::content::LONG_FIELD_MIN_CHARS),
};

fn template(doc_type: DocumentType) -> &'static PromptTemplate {
    match doc_type {
        DocumentType::Institutional => &INSTITUTIONAL,
        DocumentType::PreliminaryStudy => &PRELIMINARY_STUDY,
        DocumentType::ReferenceTerms => &REFERENCE_TERMS,
        DocumentType::Demand => &DEMAND,
        DocumentType::RiskMatrix => &RISK_MATRIX,
    }
}

// =============================================================================
// Prompt Assembly
// =============================================================================

/// System role for a document type: shared persona, per-type legal grounding,
/// the JSON-only output contract and the minimum-length policy.
pub fn system_prompt(doc_type: DocumentType) -> String {
    let template = template(doc_type);
    let mut prompt = String::with_capacity(1024);

    prompt.push_str(
        "Você é um assistente especialista em licitações públicas brasileiras. \
         Gere APENAS JSON válido, sem texto adicional, sem comentários e sem cercas de \
         código. O JSON deve conter todos os campos solicitados, com descrições completas, \
         detalhadas e específicas. Use como referência modelos técnicos robustos como \
         pregões e termos de referência municipais. NUNCA retorne campos com respostas \
         genéricas ou rasas.",
    );
    prompt.push_str("\n\n");
    prompt.push_str(template.persona);

    if let Some(min) = template.min_chars {
        let _ = write!(
            prompt,
            "\n\nCada campo textual do JSON deve conter no mínimo {min} caracteres. \
             Use linguagem técnica e, sempre que possível, cite normas legais ou \
             regulamentadoras."
        );
    }

    prompt
}

/// User prompt for a document type: the concrete request values, the exact
/// JSON structure expected (from the catalog) and the per-type checklist.
pub fn user_prompt(doc_type: DocumentType, ctx: &RequestContext) -> String {
    let template = template(doc_type);
    let mut prompt = String::with_capacity(2048);

    let _ = writeln!(
        prompt,
        "Gere os dados para um documento do tipo {}, considerando as seguintes \
         informações fornecidas:",
        doc_type.display_name()
    );
    prompt.push('\n');

    if template.institutional_context {
        let _ = writeln!(prompt, "- Município: {}", ctx.municipality);
        let _ = writeln!(prompt, "- Instituição: {}", ctx.institution);
        let _ = writeln!(prompt, "- Endereço: {}", ctx.address);
    }
    let _ = writeln!(
        prompt,
        "- Descrição do objeto da contratação: {}",
        ctx.object_description
    );
    if template.wants_value {
        let _ = writeln!(prompt, "- Valor: R$ {}", ctx.value_or_default());
    }
    if template.institutional_context && !ctx.date.is_empty() {
        let _ = writeln!(prompt, "- Data atual: {}", ctx.date);
    }

    prompt.push('\n');
    prompt.push_str(
        "Retorne os dados exclusivamente no formato JSON, obedecendo exatamente esta \
         estrutura:\n\n",
    );
    prompt.push_str(&json_skeleton(doc_type));
    prompt.push('\n');

    prompt.push_str("\nInstruções importantes:\n");
    for directive in template.directives {
        let _ = writeln!(prompt, "- {directive}");
    }
    for item in template.checklist {
        let _ = writeln!(prompt, "- {item}");
    }
    prompt.push_str("- Não adicione textos explicativos\n");
    prompt.push_str("- Apenas o JSON puro como resposta\n");

    prompt
}

/// Example structure shown to the model, derived from the catalog so prompts
/// and field completion can never drift apart.
fn json_skeleton(doc_type: DocumentType) -> String {
    let mut out = String::from("{\n");
    let defs = catalog::defs(doc_type);

    for (i, def) in defs.iter().enumerate() {
        let comma = if i + 1 < defs.len() { "," } else { "" };
        match def.kind {
            FieldKind::Text => {
                let _ = writeln!(out, "    \"{}\": \"<{}>\"{comma}", def.name, def.description);
            }
            FieldKind::RiskList => {
                let _ = writeln!(out, "    \"{}\": [", def.name);
                out.push_str("        {\n");
                let items = catalog::RISK_ITEM_DEFS;
                for (j, item) in items.iter().enumerate() {
                    let item_comma = if j + 1 < items.len() { "," } else { "" };
                    let _ = writeln!(
                        out,
                        "            \"{}\": \"<{}>\"{item_comma}",
                        item.name, item.description
                    );
                }
                out.push_str("        }\n");
                let _ = writeln!(out, "    ]{comma}");
            }
        }
    }

    out.push('}');
    out
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RequestContext {
        RequestContext {
            municipality: "Curitiba".into(),
            institution: "Prefeitura Municipal de Curitiba".into(),
            address: "Av. Cândido de Abreu, 817".into(),
            object_description: "Aquisição de notebooks para a rede municipal".into(),
            value: "150.000,00".into(),
            date: "26 de abril de 2025".into(),
        }
    }

    #[test]
    fn system_prompt_fixes_the_output_contract() {
        for doc_type in DocumentType::ALL {
            let prompt = system_prompt(doc_type);
            assert!(prompt.contains("APENAS JSON válido"), "{doc_type}");
            assert!(prompt.contains("licitações públicas"), "{doc_type}");
        }
    }

    #[test]
    fn system_prompt_cites_the_statute_and_length_policy() {
        let prompt = system_prompt(DocumentType::PreliminaryStudy);
        assert!(prompt.contains("Lei nº 14.133/2021"));
        assert!(prompt.contains("no mínimo 300 caracteres"));

        // Institutional fields are short; no length demand there.
        let prompt = system_prompt(DocumentType::Institutional);
        assert!(!prompt.contains("no mínimo"));
    }

    #[test]
    fn user_prompt_injects_request_values() {
        let prompt = user_prompt(DocumentType::Institutional, &ctx());
        assert!(prompt.contains("- Município: Curitiba"));
        assert!(prompt.contains("Av. Cândido de Abreu"));
        assert!(prompt.contains("- Data atual: 26 de abril de 2025"));

        let prompt = user_prompt(DocumentType::ReferenceTerms, &ctx());
        assert!(prompt.contains("- Valor: R$ 150.000,00"));
        assert!(prompt.contains("Aquisição de notebooks"));
        // TR carries no municipal header block.
        assert!(!prompt.contains("- Município:"));
    }

    #[test]
    fn missing_value_uses_the_legacy_fallback() {
        let mut request = ctx();
        request.value.clear();
        let prompt = user_prompt(DocumentType::Demand, &request);
        assert!(prompt.contains("- Valor: R$ 00"));
    }

    #[test]
    fn skeleton_lists_every_catalog_field() {
        for doc_type in DocumentType::ALL {
            let prompt = user_prompt(doc_type, &ctx());
            for field in crate::catalog::fields(doc_type) {
                assert!(
                    prompt.contains(&format!("\"{field}\"")),
                    "{doc_type} prompt misses {field}"
                );
            }
        }
    }

    #[test]
    fn risk_prompt_carries_the_checklist() {
        let prompt = user_prompt(DocumentType::RiskMatrix, &ctx());
        assert!(prompt.contains("pelo menos 5 riscos"));
        assert!(prompt.contains("descumprimento contratual"));
        assert!(prompt.contains("LGPD"));
        assert!(prompt.contains("baixo | médio | alto"));
        assert!(prompt.contains("\"acao_preventiva\""));
    }

    #[test]
    fn prompts_are_deterministic() {
        let a = user_prompt(DocumentType::RiskMatrix, &ctx());
        let b = user_prompt(DocumentType::RiskMatrix, &ctx());
        assert_eq!(a, b);
    }
}
