//! Grounding-context assembly.
//!
//! Merges the retrieved entries and the reference month's aggregate metrics
//! into the single document the generation step is restricted to. The
//! document is the only permitted source of numeric truth: it embeds an
//! explicit rule that no figure outside it may be stated.

use fiscus_core::dates::month_name_pt;
use fiscus_embeddings::EmbeddingRecord;
use fiscus_store::types::{CategoryTotal, MonthMetrics};

/// Render retrieved records as the numbered source list.
pub fn format_sources(records: &[EmbeddingRecord]) -> String {
    if records.is_empty() {
        return "Nenhum histórico ou dado financeiro encontrado.".to_string();
    }
    let mut out = String::new();
    for (index, record) in records.iter().enumerate() {
        out.push_str(&format!(
            "[{}] Data de Registro: {} - Detalhe: {}\n",
            index + 1,
            registration_date_br(record),
            record.content,
        ));
    }
    out
}

/// dd/mm/yyyy view of a record's creation timestamp.
pub fn registration_date_br(record: &EmbeddingRecord) -> String {
    // Timestamps are stored as ISO 8601; the date is the first 10 bytes.
    let iso_date = record.created_at.get(..10).unwrap_or("");
    match iso_date.split('-').collect::<Vec<_>>().as_slice() {
        [year, month, day] => format!("{day}/{month}/{year}"),
        _ => record.created_at.clone(),
    }
}

fn format_breakdown(label: &str, totals: &[CategoryTotal]) -> String {
    if totals.is_empty() {
        return String::new();
    }
    let mut out = format!("{label}:\n");
    for total in totals {
        out.push_str(&format!("  - {}: {}\n", total.name, total.total.format_brl()));
    }
    out
}

/// Build the grounding document for one exchange.
///
/// Month metrics cover every entry due in the reference month, paid or not
/// (billed figures, not cash-settled).
pub fn build_grounding_document(metrics: &MonthMetrics, records: &[EmbeddingRecord]) -> String {
    let month_label = format!("{} de {}", month_name_pt(metrics.month), metrics.year);
    let sources = format_sources(records);
    let income_breakdown = format_breakdown("Receitas por categoria", &metrics.income_by_category);
    let expense_breakdown =
        format_breakdown("Despesas por categoria", &metrics.expense_by_category);

    format!(
        "Você é um assistente financeiro pessoal inteligente e empático chamado \"Fiscus\".\n\
         Você tem acesso aos dados financeiros reais do usuário indexados abaixo.\n\
         \n\
         CONTEXTO CÁLCULOS DO MÊS:\n\
         - Mês de referência: {month_label}\n\
         - Receita total faturada ou a receber: {}\n\
         - Despesa total lançada: {}\n\
         - Saldo atual/projetado: {}\n\
         {income_breakdown}{expense_breakdown}\
         \n\
         LANÇAMENTOS E INFORMAÇÕES RELEVANTES RECUPERADAS:\n\
         {sources}\n\
         REGRAS ESTABELECIDAS:\n\
         - Responda sempre em português brasileiro de forma educada e objetiva.\n\
         - Nunca invente transações ou valores que não estejam neste contexto.\n\
         - Se um número não aparece acima, diga que não tem esse dado.\n\
         - Formate valores monetários no padrão brasileiro (Ex: R$ 1.500,00).\n\
         - Se a pergunta não for sobre as finanças do usuário, redirecione para \
           o seu papel de assistente financeiro.",
        metrics.income.format_brl(),
        metrics.expense.format_brl(),
        metrics.balance().format_brl(),
    )
}
