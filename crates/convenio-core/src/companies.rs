//! Company registry: valid slugs, sector aliasing, quirks

/// Company slugs known to the system.
pub const VALID_COMPANIES: &[&str] = &[
    "azul",
    "azul-handling",
    "iberia",
    "groundforce",
    "swissport",
    "menzies",
    "wfs",
    "aviapartner",
    "easyjet",
    "convenio-sector",
    "jet2",
    "norwegian",
    "south",
];

/// Companies without their own agreement; they use the sector-wide tables.
pub const SECTOR_COMPANIES: &[&str] = &["jet2", "norwegian", "south"];

/// Slug of the sector-wide agreement tables.
pub const SECTOR_SLUG: &str = "convenio-sector";

/// Pseudo-company for fragments that apply to every company.
pub const GENERIC_COMPANY: &str = "general";

/// Company whose category/level ordering is swapped relative to the rest:
/// its tables key by level first and category second.
pub const INVERTED_LEVEL_COMPANY: &str = "easyjet";

/// Resolve the salary-table slug for a company, remapping sector adherents.
pub fn salary_table_slug(company_slug: &str) -> &str {
    if SECTOR_COMPANIES.contains(&company_slug) {
        SECTOR_SLUG
    } else {
        company_slug
    }
}

pub fn is_valid_company(slug: &str) -> bool {
    VALID_COMPANIES.contains(&slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_alias_remap() {
        assert_eq!(salary_table_slug("jet2"), SECTOR_SLUG);
        assert_eq!(salary_table_slug("norwegian"), SECTOR_SLUG);
        assert_eq!(salary_table_slug("azul"), "azul");
    }

    #[test]
    fn test_valid_companies() {
        assert!(is_valid_company("iberia"));
        assert!(!is_valid_company("acme"));
    }
}
