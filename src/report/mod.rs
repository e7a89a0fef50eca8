//! Terminal output for `cvm run` and `cvm companies`.
//!
//! Formatting lives here so the pipeline stays free of presentation code.

use crate::domain::{Company, CompanyOutcome, OutcomeStatus};

/// Summarize a pipeline run: counts, then one line per company.
pub fn format_run_summary(outcomes: &[CompanyOutcome]) -> String {
    let ok = outcomes.iter().filter(|o| o.status == OutcomeStatus::Ok).count();
    let empty = outcomes.iter().filter(|o| o.status == OutcomeStatus::Empty).count();
    let failed = outcomes.len() - ok - empty;
    let rows: usize = outcomes.iter().map(|o| o.rows).sum();

    let mut out = String::new();
    out.push_str("=== cvm - indicator run ===\n");
    out.push_str(&format!(
        "Companies: {} | ok={ok} empty={empty} failed={failed} | rows written: {rows}\n\n",
        outcomes.len()
    ));

    out.push_str(&format!("{:>8}  {:<12} {:>5}  {:<8} {}\n", "cd_cvm", "ticker", "rows", "status", "name"));
    for o in outcomes {
        let status = match &o.status {
            OutcomeStatus::Ok => "ok".to_string(),
            OutcomeStatus::Empty => "empty".to_string(),
            OutcomeStatus::Failed { message } => format!("failed: {message}"),
        };
        out.push_str(&format!(
            "{:>8}  {:<12} {:>5}  {:<8} {}\n",
            o.company_id,
            o.ticker.as_deref().unwrap_or("-"),
            o.rows,
            status,
            truncate(&o.name, 40),
        ));
    }
    out
}

/// List companies with the ticker each would be priced under.
pub fn format_companies(companies: &[(Company, Option<String>)]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>8}  {:<12} {}\n", "cd_cvm", "ticker", "name"));
    for (company, ticker) in companies {
        out.push_str(&format!(
            "{:>8}  {:<12} {}\n",
            company.id,
            ticker.as_deref().unwrap_or("-"),
            company.name
        ));
    }
    out.push_str(&format!("\n{} companies\n", companies.len()));
    out
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut t: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    t.push('…');
    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_statuses() {
        let outcomes = vec![
            CompanyOutcome {
                company_id: 1,
                name: "ALFA".to_string(),
                ticker: Some("00013.SA".to_string()),
                rows: 4,
                status: OutcomeStatus::Ok,
            },
            CompanyOutcome {
                company_id: 2,
                name: "BETA".to_string(),
                ticker: None,
                rows: 0,
                status: OutcomeStatus::Empty,
            },
            CompanyOutcome {
                company_id: 3,
                name: "GAMA".to_string(),
                ticker: Some("00033.SA".to_string()),
                rows: 0,
                status: OutcomeStatus::Failed {
                    message: "duplicate".to_string(),
                },
            },
        ];

        let text = format_run_summary(&outcomes);
        assert!(text.contains("Companies: 3 | ok=1 empty=1 failed=1 | rows written: 4"));
        assert!(text.contains("failed: duplicate"));
    }

    #[test]
    fn long_names_are_truncated() {
        assert_eq!(truncate("ABCDEF", 4), "ABC…");
        assert_eq!(truncate("ÇÃO", 4), "ÇÃO");
    }
}
