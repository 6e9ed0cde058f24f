//! Canonical embedding text for ledger entries.
//!
//! The rendered string is what gets embedded and what retrieval surfaces back
//! to the grounding document, so it carries every content-relevant field in a
//! fixed pt-BR shape:
//!
//! ```text
//! Lançamento Financeiro de DESPESA: 'Compra de Notebook' no valor de R$ 4500.00. \
//! Data de Vencimento: 2026-02-15. Status de Pagamento: Pago (Sim).
//! ```

use fiscus_store::types::LedgerEntry;

/// Render the canonical semantic text for one ledger entry.
pub fn render_entry_text(entry: &LedgerEntry) -> String {
    let paid = if entry.paid { "Sim" } else { "Não" };

    let note = entry
        .note
        .as_deref()
        .filter(|n| !n.is_empty())
        .map(|n| format!(" - Observações adicionais: {n}"))
        .unwrap_or_default();

    format!(
        "Lançamento Financeiro de {}: '{}' no valor de R$ {}. \
         Data de Vencimento: {}. Status de Pagamento: Pago ({paid}).{note}",
        entry.kind.label_pt(),
        entry.description,
        entry.amount,
        entry.due_date.format("%Y-%m-%d"),
    )
}
