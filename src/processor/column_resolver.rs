use crate::models::{AREA_NUMERIC, PRICE_NUMERIC, PRICE_TEXT};

/// Dataset columns the estimator cannot work without
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Price,
    Area,
}

/// Where the values for a role come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSource {
    /// Already numeric, used as is
    Numeric(String),
    /// Free text that still has to go through a parser
    Text(String),
}

/// Picks dataset columns by exact name first, then by keyword.
pub struct ColumnResolver {
    area_label: String,
}

impl ColumnResolver {
    pub fn new(area_label: impl Into<String>) -> Self {
        Self {
            area_label: area_label.into(),
        }
    }

    pub fn target_column(role: ColumnRole) -> &'static str {
        match role {
            ColumnRole::Price => PRICE_NUMERIC,
            ColumnRole::Area => AREA_NUMERIC,
        }
    }

    pub fn resolve(&self, role: ColumnRole, columns: &[String]) -> Option<ColumnSource> {
        let has = |name: &str| columns.iter().any(|c| c == name);

        let target = Self::target_column(role);
        if has(target) {
            return Some(ColumnSource::Numeric(target.to_string()));
        }

        let text_column = match role {
            ColumnRole::Price => PRICE_TEXT,
            ColumnRole::Area => self.area_label.as_str(),
        };
        if has(text_column) {
            return Some(ColumnSource::Text(text_column.to_string()));
        }

        let keywords = self.keywords(role);
        columns
            .iter()
            .find(|column| {
                let lowered = column.to_lowercase();
                keywords.iter().any(|keyword| lowered.contains(keyword.as_str()))
            })
            .map(|column| ColumnSource::Text(column.clone()))
    }

    fn keywords(&self, role: ColumnRole) -> Vec<String> {
        match role {
            ColumnRole::Price => vec!["үнэ".to_string(), "price".to_string()],
            ColumnRole::Area => vec![self.area_label.to_lowercase(), "area".to_string()],
        }
    }
}

impl Default for ColumnResolver {
    fn default() -> Self {
        Self::new("Талбай")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_numeric_column_preferred() {
        let resolver = ColumnResolver::default();
        let cols = columns(&["price_text", "price_numeric", "Талбай", "area_numeric"]);

        assert_eq!(
            resolver.resolve(ColumnRole::Price, &cols),
            Some(ColumnSource::Numeric("price_numeric".to_string()))
        );
        assert_eq!(
            resolver.resolve(ColumnRole::Area, &cols),
            Some(ColumnSource::Numeric("area_numeric".to_string()))
        );
    }

    #[test]
    fn test_named_text_column() {
        let resolver = ColumnResolver::default();
        let cols = columns(&["Үнэ (₮)", "price_text", "Талбай"]);

        assert_eq!(
            resolver.resolve(ColumnRole::Price, &cols),
            Some(ColumnSource::Text("price_text".to_string()))
        );
        assert_eq!(
            resolver.resolve(ColumnRole::Area, &cols),
            Some(ColumnSource::Text("Талбай".to_string()))
        );
    }

    #[test]
    fn test_keyword_fallback_takes_first_match() {
        let resolver = ColumnResolver::default();
        let cols = columns(&["url", "Нийт ҮНЭ", "Sale Price", "Floor Area"]);

        assert_eq!(
            resolver.resolve(ColumnRole::Price, &cols),
            Some(ColumnSource::Text("Нийт ҮНЭ".to_string()))
        );
        assert_eq!(
            resolver.resolve(ColumnRole::Area, &cols),
            Some(ColumnSource::Text("Floor Area".to_string()))
        );
    }

    #[test]
    fn test_unresolvable() {
        let resolver = ColumnResolver::default();
        let cols = columns(&["url", "district"]);

        assert_eq!(resolver.resolve(ColumnRole::Price, &cols), None);
        assert_eq!(resolver.resolve(ColumnRole::Area, &cols), None);
    }
}
