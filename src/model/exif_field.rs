use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExifField {
    pub tag: String,
    pub value: String,
}

impl ExifField {
    pub fn new<T: Into<String>, V: Into<String>>(tag: T, value: V) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
        }
    }
}

/// Tags read from the primary image, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExifFields(Vec<ExifField>);

impl ExifFields {
    pub fn new(fields: Vec<ExifField>) -> Self {
        Self(fields)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExifField> {
        self.0.iter()
    }

    /// Case-insensitive tag lookup. Blank values count as missing.
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.0
            .iter()
            .filter(|field| field.tag.eq_ignore_ascii_case(tag))
            .map(|field| field.value.trim())
            .find(|value| !value.is_empty())
    }
}

impl FromIterator<ExifField> for ExifFields {
    fn from_iter<I: IntoIterator<Item = ExifField>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_tag_case() {
        let fields: ExifFields = [ExifField::new("make", "Canon"), ExifField::new("MODEL", "EOS R5")]
            .into_iter()
            .collect();

        assert_eq!(fields.get("Make"), Some("Canon"));
        assert_eq!(fields.get("Model"), Some("EOS R5"));
        assert_eq!(fields.get("Software"), None);
    }

    #[test]
    fn blank_values_are_skipped() {
        let fields: ExifFields = [ExifField::new("Make", "  "), ExifField::new("make", "Nikon")]
            .into_iter()
            .collect();

        assert_eq!(fields.get("Make"), Some("Nikon"));
    }

    #[test]
    fn serializes_as_plain_list() {
        let fields = ExifFields::new(vec![ExifField::new("Make", "Canon")]);

        assert_eq!(
            serde_json::to_string(&fields).unwrap(),
            r#"[{"tag":"Make","value":"Canon"}]"#
        );
    }
}
