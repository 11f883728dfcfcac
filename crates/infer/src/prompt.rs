// Prompt construction for the equivalence analysis

/// Per-document character cap; settings may only lower it.
pub const MAX_INPUT_CHARS: usize = creditmap_config::settings::DEFAULT_MAX_INPUT_CHARS;

/// Longest prefix of `text` holding at most `max_chars` characters.
///
/// Counts chars, not bytes, so the cut never splits a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

const INSTRUCTIONS: &str = r#"Você é um coordenador acadêmico especialista em análise curricular e aproveitamento de estudos.
Cruze as disciplinas do histórico escolar do estudante com a matriz curricular de destino.

CRITÉRIOS:
1. Compare nomes e conteúdos das disciplinas.
2. Considere equivalência semântica (ex.: "Cálculo I" e "Cálculo Diferencial e Integral I").
3. DEFERIDO: correspondência clara (similaridade >= 0.70) e carga horária não drasticamente menor.
4. INDEFERIDO: sem correspondência, ou carga horária drasticamente menor.
5. "Disciplina_Destino" deve repetir exatamente o nome da disciplina como aparece na matriz."#;

const SCHEMA: &str = r#"Responda SOMENTE com JSON neste formato:
{
  "nome_aluno": "Nome do estudante extraído do histórico",
  "analise": [
    {
      "Disciplina_Origem": "Disciplina cursada no histórico",
      "Disciplina_Destino": "Disciplina equivalente na matriz de destino",
      "Similaridade": 0.0,
      "Veredito": "DEFERIDO",
      "Justificativa": "Racional técnico da decisão"
    }
  ]
}
"Similaridade" é um número entre 0.0 e 1.0; "Veredito" é "DEFERIDO" ou "INDEFERIDO"."#;

/// Full prompt: instructions, both documents (each truncated), response schema.
pub fn build_prompt(student_text: &str, matrix_text: &str, max_chars: usize) -> String {
    let student = truncate_chars(student_text, max_chars);
    let matrix = truncate_chars(matrix_text, max_chars);

    let mut prompt =
        String::with_capacity(INSTRUCTIONS.len() + SCHEMA.len() + student.len() + matrix.len() + 128);
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str("\n\nHISTÓRICO ESCOLAR DO ESTUDANTE:\n");
    prompt.push_str(student);
    prompt.push_str("\n\nMATRIZ CURRICULAR DE DESTINO:\n");
    prompt.push_str(matrix);
    prompt.push_str("\n\n");
    prompt.push_str(SCHEMA);
    prompt
}
