use serde::ser::{Serialize, SerializeMap, Serializer};

pub const PRICE_TEXT: &str = "price_text";
pub const PRICE_NUMERIC: &str = "price_numeric";
pub const AREA_NUMERIC: &str = "area_numeric";
pub const ADDRESS_TEXT: &str = "address_text";
pub const DISTRICT: &str = "district";
pub const URL: &str = "url";

/// Ulaanbaatar districts used for location tagging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum District {
    Bayanzurkh,
    Sukhbaatar,
    Chingeltei,
    Bayangol,
    KhanUul,
    Songinokhairkhan,
    Nalaikh,
    Baganuur,
    Bagakhangai,
}

impl District {
    /// Match order for address lookups
    pub const ALL: [District; 9] = [
        District::Bayanzurkh,
        District::Sukhbaatar,
        District::Chingeltei,
        District::Bayangol,
        District::KhanUul,
        District::Songinokhairkhan,
        District::Nalaikh,
        District::Baganuur,
        District::Bagakhangai,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            District::Bayanzurkh => "Баянзүрх",
            District::Sukhbaatar => "Сүхбаатар",
            District::Chingeltei => "Чингэлтэй",
            District::Bayangol => "Баянгол",
            District::KhanUul => "Хан-Уул",
            District::Songinokhairkhan => "Сонгинохайрхан",
            District::Nalaikh => "Налайх",
            District::Baganuur => "Багануур",
            District::Bagakhangai => "Багахангай",
        }
    }

    /// First district whose name occurs anywhere in the address
    pub fn from_address(address: &str) -> Option<District> {
        District::ALL
            .into_iter()
            .find(|district| address.contains(district.as_str()))
    }
}

impl std::fmt::Display for District {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label/value pairs scraped from a listing, kept in page order.
///
/// Re-inserting a label replaces its value but keeps the original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    entries: Vec<(String, String)>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn merge(&mut self, other: PropertyMap) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = PropertyMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// A single cell of a flattened listing record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    Missing,
}

/// One scraped advertisement
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub properties: PropertyMap,
    pub price_text: String,
    pub price_numeric: Option<f64>,
    pub area_numeric: Option<f64>,
    pub address_text: Option<String>,
    pub district: Option<District>,
    pub url: String,
}

impl ListingRecord {
    /// Scraped labels in page order followed by the derived fields
    pub fn fields(&self) -> Vec<(&str, FieldValue<'_>)> {
        let number = |value: Option<f64>| value.map_or(FieldValue::Missing, FieldValue::Number);

        let mut fields: Vec<(&str, FieldValue<'_>)> = self
            .properties
            .iter()
            .filter(|(key, _)| !is_derived_field(key))
            .map(|(key, value)| (key, FieldValue::Text(value)))
            .collect();

        fields.push((PRICE_TEXT, FieldValue::Text(&self.price_text)));
        fields.push((PRICE_NUMERIC, number(self.price_numeric)));
        fields.push((AREA_NUMERIC, number(self.area_numeric)));
        fields.push((
            ADDRESS_TEXT,
            self.address_text
                .as_deref()
                .map_or(FieldValue::Missing, FieldValue::Text),
        ));
        fields.push((
            DISTRICT,
            self.district
                .map_or(FieldValue::Missing, |d| FieldValue::Text(d.as_str())),
        ));
        fields.push((URL, FieldValue::Text(&self.url)));

        fields
    }
}

/// Labels owned by the derived fields; a scraped label with one of these
/// names is shadowed by the derived value.
pub fn is_derived_field(name: &str) -> bool {
    matches!(
        name,
        PRICE_TEXT | PRICE_NUMERIC | AREA_NUMERIC | ADDRESS_TEXT | DISTRICT | URL
    )
}

impl Serialize for ListingRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (key, value) in fields {
            match value {
                FieldValue::Text(text) => map.serialize_entry(key, text)?,
                FieldValue::Number(number) => map.serialize_entry(key, &number)?,
                FieldValue::Missing => map.serialize_entry(key, &Option::<()>::None)?,
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ListingRecord {
        let properties: PropertyMap = [("Талбай", "80 м2"), ("Гараж", "Байхгүй")]
            .into_iter()
            .collect();

        ListingRecord {
            properties,
            price_text: "250,000,000₮".to_string(),
            price_numeric: Some(250_000_000.0),
            area_numeric: Some(80.0),
            address_text: Some("Баянзүрх, 26-р хороо".to_string()),
            district: Some(District::Bayanzurkh),
            url: "https://www.unegui.mn/adv/1/".to_string(),
        }
    }

    #[test]
    fn test_district_from_address() {
        assert_eq!(
            District::from_address("УБ хот, Баянзүрх дүүрэг, 13-р хороолол"),
            Some(District::Bayanzurkh)
        );
        assert_eq!(District::from_address("Дархан хот"), None);
        assert_eq!(District::from_address(""), None);
    }

    #[test]
    fn test_district_first_match_wins() {
        // Both names occur; enumeration order decides
        assert_eq!(
            District::from_address("Хан-Уул, Баянгол дүүргийн зааг"),
            Some(District::Bayangol)
        );
    }

    #[test]
    fn test_property_map_keeps_first_position() {
        let mut map = PropertyMap::new();
        map.insert("a", "1");
        map.insert("b", "2");
        map.insert("a", "3");

        let entries: Vec<_> = map.iter().collect();
        assert_eq!(entries, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_record_serializes_flat() {
        let json = serde_json::to_value(sample_record()).unwrap();

        assert_eq!(json["Талбай"], "80 м2");
        assert_eq!(json["price_numeric"], 250_000_000.0);
        assert_eq!(json["district"], "Баянзүрх");
        assert_eq!(json["url"], "https://www.unegui.mn/adv/1/");
    }

    #[test]
    fn test_missing_values_serialize_as_null() {
        let mut record = sample_record();
        record.area_numeric = None;
        record.district = None;
        record.address_text = None;

        let json = serde_json::to_value(record).unwrap();
        assert!(json["area_numeric"].is_null());
        assert!(json["district"].is_null());
        assert!(json["address_text"].is_null());
    }

    #[test]
    fn test_fields_order() {
        let record = sample_record();
        let names: Vec<&str> = record.fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            names,
            vec![
                "Талбай",
                "Гараж",
                PRICE_TEXT,
                PRICE_NUMERIC,
                AREA_NUMERIC,
                ADDRESS_TEXT,
                DISTRICT,
                URL
            ]
        );
    }
}
