use anyhow::Result;

use crate::db::{JobStore, GENERAL_UNIT};

/// Make sure the company's catch-all unit exists and return its id.
pub fn ensure_general_unit<S: JobStore>(store: &S, company_id: i64) -> Result<i64> {
    store.find_or_create_business_unit(company_id, GENERAL_UNIT)
}

/// The unit a job attaches to: the provider-named unit if the company already
/// has one by that exact name, otherwise "General".
pub fn resolve_business_unit<S: JobStore>(
    store: &S,
    company_id: i64,
    unit_name: Option<&str>,
) -> Result<i64> {
    if let Some(name) = unit_name.map(str::trim).filter(|n| !n.is_empty()) {
        if let Some(id) = store.find_business_unit(company_id, name)? {
            return Ok(id);
        }
    }
    ensure_general_unit(store, company_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        let company_id = db.create_company("acme", "Acme").unwrap();
        (db, company_id)
    }

    #[test]
    fn known_unit_is_used() {
        let (db, company_id) = setup();
        let platform = db.find_or_create_business_unit(company_id, "Platform").unwrap();
        assert_eq!(resolve_business_unit(&db, company_id, Some(" Platform ")).unwrap(), platform);
    }

    #[test]
    fn unknown_or_missing_unit_falls_back_to_general() {
        let (db, company_id) = setup();
        let general = resolve_business_unit(&db, company_id, Some("Marketing")).unwrap();
        assert_eq!(resolve_business_unit(&db, company_id, None).unwrap(), general);
        assert_eq!(resolve_business_unit(&db, company_id, Some("  ")).unwrap(), general);

        let units = db.list_business_units(company_id).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, GENERAL_UNIT);
        assert_eq!(units[0].applications, 0);
    }

    #[test]
    fn general_units_are_per_company() {
        let (db, acme) = setup();
        let globex = db.create_company("globex", "Globex").unwrap();
        assert_ne!(
            ensure_general_unit(&db, acme).unwrap(),
            ensure_general_unit(&db, globex).unwrap()
        );
    }
}
