//! Intent router — "create a ledger entry" vs "ask a question".
//!
//! The generative model's JSON output is never trusted: every field passes
//! schema validation with safe defaults, and any malformed result — provider
//! error, non-JSON payload, missing name, non-positive amount — silently
//! falls through to the query path. Extraction failure is invisible to the
//! user by design of the protocol.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use fiscus_core::dates::{format_date_br, month_name_pt};
use fiscus_core::{Amount, EntryKind};
use fiscus_llm::GenerationProvider;

use crate::types::{CreationIntent, Intent, MonthRef};

/// Classifies utterances via JSON-mode extraction.
pub struct IntentRouter {
    provider: Arc<dyn GenerationProvider>,
}

impl IntentRouter {
    /// Create a router over the given provider.
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self { provider }
    }

    /// Classify one utterance against a reference month.
    ///
    /// Never fails: every error path degrades to [`Intent::Query`].
    pub async fn classify(&self, utterance: &str, month: MonthRef) -> Intent {
        let system = extraction_system_prompt(month);
        match self.provider.generate_json(utterance, Some(&system)).await {
            Ok(value) => validate_intent(&value, month),
            Err(e) => {
                debug!(error = %e, "intent extraction failed, falling back to query");
                Intent::Query
            }
        }
    }
}

/// Extraction prompt carrying the resolved reference date.
fn extraction_system_prompt(month: MonthRef) -> String {
    let reference_day = month.first_day();
    format!(
        "Você é um extrator de intenções de um assistente financeiro. \
         Analise a mensagem do usuário e responda SOMENTE com um objeto JSON, sem texto extra.\n\
         Mês de referência: {} de {} (primeiro dia: {}).\n\
         Campos:\n\
         - \"creates\": true apenas se o usuário está registrando um gasto ou receita; \
           false para perguntas e qualquer outra coisa.\n\
         - \"name\": descrição curta do lançamento.\n\
         - \"amount\": valor numérico decimal simples (ex.: 1200.50). Normalize \
           abreviações como \"1,5k\" ou \"2 mil\".\n\
         - \"start_date\": data AAAA-MM-DD. Resolva expressões relativas \
           (\"hoje\", \"mês que vem\") contra o mês de referência.\n\
         - \"installment_count\": número de parcelas mensais; 1 quando não informado.\n\
         - \"kind\": \"expense\" para gasto, \"income\" para receita.",
        month_name_pt(month.month),
        month.year,
        format_date_br(reference_day),
    )
}

/// Schema-validate a raw extraction value into an intent.
///
/// Safe defaults per field; a missing name or non-positive amount rejects the
/// whole creation and falls back to [`Intent::Query`].
pub fn validate_intent(value: &serde_json::Value, month: MonthRef) -> Intent {
    if !value.get("creates").and_then(serde_json::Value::as_bool).unwrap_or(false) {
        return Intent::Query;
    }

    let Some(name) = value
        .get("name")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        return Intent::Query;
    };

    let Some(amount) = parse_amount(value.get("amount")) else {
        return Intent::Query;
    };
    if !amount.is_positive() {
        return Intent::Query;
    }

    let start_date = value
        .get("start_date")
        .and_then(serde_json::Value::as_str)
        .and_then(parse_date)
        .unwrap_or_else(|| month.first_day());

    let installment_count = parse_count(value.get("installment_count"));

    let kind = value
        .get("kind")
        .and_then(serde_json::Value::as_str)
        .and_then(parse_kind)
        .unwrap_or(EntryKind::Expense);

    Intent::Create(CreationIntent {
        name: name.to_string(),
        amount,
        start_date,
        installment_count,
        kind,
    })
}

#[allow(clippy::cast_possible_truncation)]
fn parse_amount(value: Option<&serde_json::Value>) -> Option<Amount> {
    match value? {
        serde_json::Value::Number(n) => {
            let cents = (n.as_f64()? * 100.0).round();
            if !cents.is_finite() || cents.abs() > 9e17 {
                return None;
            }
            Some(Amount::from_cents(cents as i64))
        }
        serde_json::Value::String(s) => Amount::parse(s).ok(),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
        .ok()
}

#[allow(clippy::cast_possible_truncation)]
fn parse_count(value: Option<&serde_json::Value>) -> u32 {
    let count = match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().unwrap_or(1),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(1),
        _ => 1,
    };
    count.clamp(1, 120) as u32
}

fn parse_kind(s: &str) -> Option<EntryKind> {
    match s.trim().to_lowercase().as_str() {
        "expense" | "despesa" | "gasto" => Some(EntryKind::Expense),
        "income" | "receita" | "renda" => Some(EntryKind::Income),
        _ => None,
    }
}
