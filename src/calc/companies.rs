//! Company enumeration from the filtered income statement.

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::{Company, StatementTable};

/// Distinct companies of `income`, ordered by id.
///
/// When one id appears with several names, the first occurrence in file order wins.
pub fn enumerate_companies(income: &StatementTable) -> Vec<Company> {
    let mut by_id: BTreeMap<u32, String> = BTreeMap::new();
    for record in &income.records {
        match by_id.get(&record.company_id) {
            None => {
                by_id.insert(record.company_id, record.company_name.clone());
            }
            Some(name) if *name != record.company_name => {
                debug!(
                    company_id = record.company_id,
                    kept = %name,
                    ignored = %record.company_name,
                    "company id maps to more than one name"
                );
            }
            Some(_) => {}
        }
    }

    by_id
        .into_iter()
        .map(|(id, name)| Company { id, name })
        .collect()
}
